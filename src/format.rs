//! Audio format description shared by the backend, filters, and chunks.

use std::fmt;

/// Sample encoding understood by the worker and its backend/filter plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    U8,
    S16,
    F32,
}

impl SampleFormat {
    /// Size in bytes of a single sample in this format.
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::F32 => 4,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleFormat::U8 => write!(f, "u8"),
            SampleFormat::S16 => write!(f, "s16"),
            SampleFormat::F32 => write!(f, "f32"),
        }
    }
}

/// Sample rate, sample format, and channel count for one side of the I/O
/// path (input, output, or the config-provided mask).
///
/// A format where any field is unset (`sample_rate == 0`, `format == None`,
/// `channels == 0`) is a *mask*: [`AudioFormat::apply_mask`] overlays the set
/// fields of one format onto another, which is how `config_audio_format`
/// narrows an otherwise fully negotiated format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub format: Option<SampleFormat>,
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, format: SampleFormat, channels: u16) -> Self {
        Self {
            sample_rate,
            format: Some(format),
            channels,
        }
    }

    /// An empty mask: no field constrains anything.
    pub fn mask() -> Self {
        Self::default()
    }

    /// True when every field is set to a usable, non-zero value.
    pub fn valid(&self) -> bool {
        self.sample_rate > 0 && self.format.is_some() && self.channels > 0
    }

    /// Alias for [`AudioFormat::valid`] used at OPEN/REOPEN preconditions
    /// where the spec speaks of a format being "fully defined" rather than
    /// "valid" (the two predicates coincide for this type).
    pub fn fully_defined(&self) -> bool {
        self.valid()
    }

    /// Overlay the set fields of `other` onto `self`, with `other` winning.
    ///
    /// This is how a config-provided mask (e.g. "force 44100 Hz, leave
    /// channels alone") narrows the format the filter chain negotiated.
    pub fn apply_mask(&self, other: &AudioFormat) -> AudioFormat {
        AudioFormat {
            sample_rate: if other.sample_rate > 0 {
                other.sample_rate
            } else {
                self.sample_rate
            },
            format: other.format.or(self.format),
            channels: if other.channels > 0 {
                other.channels
            } else {
                self.channels
            },
        }
    }

    /// Bytes per frame (one sample across all channels).
    ///
    /// Panics if the format is not [`AudioFormat::valid`]; callers are
    /// expected to have checked validity before deriving a frame size.
    pub fn frame_size(&self) -> usize {
        let format = self.format.expect("frame_size on a format with no sample format set");
        format.sample_size() * self.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_overlay_prefers_other_when_set() {
        let base = AudioFormat::new(44_100, SampleFormat::S16, 2);
        let mask = AudioFormat {
            sample_rate: 48_000,
            format: None,
            channels: 0,
        };
        let out = base.apply_mask(&mask);
        assert_eq!(out.sample_rate, 48_000);
        assert_eq!(out.format, Some(SampleFormat::S16));
        assert_eq!(out.channels, 2);
    }

    #[test]
    fn empty_mask_is_not_valid() {
        assert!(!AudioFormat::mask().valid());
    }

    #[test]
    fn frame_size_multiplies_sample_size_by_channels() {
        let format = AudioFormat::new(44_100, SampleFormat::F32, 2);
        assert_eq!(format.frame_size(), 8);
    }
}
