//! A concrete replay-gain filter applying a linear scalar derived from
//! `gain_db`, driven by [`ReplayGainInfo`] and restricted to the sample
//! formats this crate understands.

use std::borrow::Cow;

use super::{FilterPort, ReplayGainFilter};
use crate::chunk::ReplayGainInfo;
use crate::error::FilterError;
use crate::format::{AudioFormat, SampleFormat};

fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

#[derive(Debug, Default)]
pub struct LinearReplayGainFilter {
    format: Option<SampleFormat>,
    gain: Option<f32>,
    scratch: Vec<u8>,
}

impl LinearReplayGainFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilterPort for LinearReplayGainFilter {
    fn open(&mut self, in_format: &AudioFormat) -> Result<AudioFormat, FilterError> {
        self.format = in_format.format;
        Ok(*in_format)
    }

    fn close(&mut self) {
        self.format = None;
        self.gain = None;
    }

    fn filter_pcm<'a>(&mut self, data: &'a [u8]) -> Result<Cow<'a, [u8]>, FilterError> {
        let Some(gain) = self.gain else {
            return Ok(Cow::Borrowed(data));
        };
        let Some(format) = self.format else {
            return Err(FilterError::new("replay gain filter used before open()"));
        };

        self.scratch.clear();
        self.scratch.extend_from_slice(data);
        match format {
            SampleFormat::S16 => {
                for sample in self.scratch.chunks_exact_mut(2) {
                    let value = i16::from_le_bytes([sample[0], sample[1]]) as f32;
                    let scaled = (value * gain).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                    sample.copy_from_slice(&scaled.to_le_bytes());
                }
            }
            SampleFormat::F32 => {
                for sample in self.scratch.chunks_exact_mut(4) {
                    let value = f32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]);
                    sample.copy_from_slice(&(value * gain).to_le_bytes());
                }
            }
            SampleFormat::U8 => {
                for sample in self.scratch.iter_mut() {
                    let value = *sample as f32 - 128.0;
                    let scaled = (value * gain).round().clamp(-128.0, 127.0);
                    *sample = (scaled + 128.0) as u8;
                }
            }
        }

        Ok(Cow::Owned(std::mem::take(&mut self.scratch)))
    }
}

impl ReplayGainFilter for LinearReplayGainFilter {
    fn set_info(&mut self, info: Option<ReplayGainInfo>) {
        self.gain = info.map(|info| db_to_linear(info.gain_db));
    }
}
