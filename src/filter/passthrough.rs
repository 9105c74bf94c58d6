//! Identity filter stages: useful as a default chain member and in tests.

use std::borrow::Cow;

use super::{ConvertFilter, FilterPort};
use crate::error::FilterError;
use crate::format::AudioFormat;

/// A filter that returns its input unchanged, borrowing rather than
/// copying since this stage never needs to own the bytes.
#[derive(Debug, Default)]
pub struct PassthroughFilter {
    opened: bool,
}

impl PassthroughFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilterPort for PassthroughFilter {
    fn open(&mut self, in_format: &AudioFormat) -> Result<AudioFormat, FilterError> {
        self.opened = true;
        Ok(*in_format)
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn filter_pcm<'a>(&mut self, data: &'a [u8]) -> Result<Cow<'a, [u8]>, FilterError> {
        Ok(Cow::Borrowed(data))
    }
}

/// A convert filter that performs no resampling or format change; it only
/// records and validates the negotiated output format.
#[derive(Debug, Default)]
pub struct IdentityConvertFilter {
    out_format: AudioFormat,
}

impl IdentityConvertFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FilterPort for IdentityConvertFilter {
    fn open(&mut self, in_format: &AudioFormat) -> Result<AudioFormat, FilterError> {
        Ok(*in_format)
    }

    fn close(&mut self) {}

    fn filter_pcm<'a>(&mut self, data: &'a [u8]) -> Result<Cow<'a, [u8]>, FilterError> {
        Ok(Cow::Borrowed(data))
    }
}

impl ConvertFilter for IdentityConvertFilter {
    fn set_out_format(&mut self, format: &AudioFormat) -> Result<(), FilterError> {
        if !format.valid() {
            return Err(FilterError::new("convert filter given an invalid output format"));
        }
        self.out_format = *format;
        Ok(())
    }
}
