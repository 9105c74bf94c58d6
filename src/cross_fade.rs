//! Cross-fade mixing of two overlapping chunks.
//!
//! `CrossFadeBuffer` is a growable scratch buffer, not a ring: each mix call
//! overwrites it in place and callers copy out (or borrow) the result
//! before the next call, reusing the same scratch `Vec` across calls
//! rather than allocating fresh on every chunk.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::format::SampleFormat;

/// Triangular-PDF dither generator.
///
/// One LSB of triangular dither is the sum of two independent uniform
/// variates on `[-0.5, 0.5)` LSB, which is what prevents quantization noise
/// from correlating with the signal when mixed PCM is requantized to an
/// integer sample format. State persists for the lifetime of the open
/// session, not reset between chunks that don't cross-fade, and only reset
/// when [`CrossFadeBuffer::new`] is called again on a fresh OPEN.
struct Dither {
    rng: StdRng,
}

impl Dither {
    fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// One dither sample scaled to `lsb` units.
    fn next(&mut self, lsb: f32) -> f32 {
        let r1: f32 = self.rng.gen_range(-0.5..0.5);
        let r2: f32 = self.rng.gen_range(-0.5..0.5);
        (r1 + r2) * lsb
    }
}

/// Growable scratch buffer used to mix a primary chunk with its cross-fade
/// partner.
pub struct CrossFadeBuffer {
    buffer: Vec<u8>,
    dither: Dither,
}

impl CrossFadeBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            dither: Dither::new(),
        }
    }

    /// Mix `primary` into `other` using the cross-fade rule: `other` is
    /// copied in at full weight, then the first `min(primary.len(),
    /// other.len())` bytes have `primary` added in at weight
    /// `1.0 - mix_ratio`. The result is always `other.len()` bytes.
    ///
    /// `sample_size % format` determines how bytes are grouped into samples
    /// for the mix (and whether dither is applied); any trailing partial
    /// sample at the end of the mixed region is copied through unmixed.
    pub fn mix(&mut self, format: SampleFormat, primary: &[u8], other: &[u8], mix_ratio: f32) -> &[u8] {
        let other_length = other.len();
        let mix_length = primary.len().min(other_length);
        let sample_size = format.sample_size();
        let mixed_len = mix_length - (mix_length % sample_size);

        self.buffer.clear();
        self.buffer.extend_from_slice(other);

        let weight_primary = 1.0 - mix_ratio;
        match format {
            SampleFormat::S16 => mix_s16(&mut self.buffer[..mixed_len], &primary[..mixed_len], weight_primary, &mut self.dither),
            SampleFormat::U8 => mix_u8(&mut self.buffer[..mixed_len], &primary[..mixed_len], weight_primary, &mut self.dither),
            SampleFormat::F32 => mix_f32(&mut self.buffer[..mixed_len], &primary[..mixed_len], weight_primary),
        }

        &self.buffer[..other_length]
    }
}

impl Default for CrossFadeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn mix_s16(dest: &mut [u8], primary: &[u8], weight_primary: f32, dither: &mut Dither) {
    for (dest_sample, primary_sample) in dest.chunks_exact_mut(2).zip(primary.chunks_exact(2)) {
        let other_value = i16::from_le_bytes([dest_sample[0], dest_sample[1]]) as f32;
        let primary_value = i16::from_le_bytes([primary_sample[0], primary_sample[1]]) as f32;
        let mixed = other_value + primary_value * weight_primary + dither.next(1.0);
        let quantized = mixed.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        dest_sample.copy_from_slice(&quantized.to_le_bytes());
    }
}

fn mix_u8(dest: &mut [u8], primary: &[u8], weight_primary: f32, dither: &mut Dither) {
    for (dest_sample, &primary_sample) in dest.iter_mut().zip(primary.iter()) {
        let other_value = *dest_sample as f32;
        let primary_value = primary_sample as f32;
        let mixed = other_value + primary_value * weight_primary + dither.next(1.0);
        *dest_sample = mixed.round().clamp(0.0, u8::MAX as f32) as u8;
    }
}

fn mix_f32(dest: &mut [u8], primary: &[u8], weight_primary: f32) {
    for (dest_sample, primary_sample) in dest.chunks_exact_mut(4).zip(primary.chunks_exact(4)) {
        let other_value = f32::from_le_bytes([dest_sample[0], dest_sample[1], dest_sample[2], dest_sample[3]]);
        let primary_value = f32::from_le_bytes([
            primary_sample[0],
            primary_sample[1],
            primary_sample[2],
            primary_sample[3],
        ]);
        let mixed = other_value + primary_value * weight_primary;
        dest_sample.copy_from_slice(&mixed.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s16_bytes(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn result_length_matches_other_length() {
        let mut buffer = CrossFadeBuffer::new();
        let primary = s16_bytes(&[1000; 50]);
        let other = s16_bytes(&[0; 30]);
        let out = buffer.mix(SampleFormat::S16, &primary, &other, 0.25);
        assert_eq!(out.len(), other.len());
    }

    #[test]
    fn other_only_region_passes_through_unmixed() {
        let mut buffer = CrossFadeBuffer::new();
        let primary = s16_bytes(&[0; 2]);
        let other = s16_bytes(&[1234, 5678, 9000]);
        let out = buffer.mix(SampleFormat::S16, &primary, &other, 0.0);
        let tail = i16::from_le_bytes([out[4], out[5]]);
        assert_eq!(tail, 9000);
    }

    #[test]
    fn f32_mix_is_additive_without_dither() {
        let mut buffer = CrossFadeBuffer::new();
        let primary = 0.4_f32.to_le_bytes().to_vec();
        let other = 0.2_f32.to_le_bytes().to_vec();
        let out = buffer.mix(SampleFormat::F32, &primary, &other, 0.25);
        let mixed = f32::from_le_bytes([out[0], out[1], out[2], out[3]]);
        // 0.2 (other, full weight) + 0.4 * 0.75 (primary weight)
        assert!((mixed - 0.5).abs() < 1e-6);
    }
}
