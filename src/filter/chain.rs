//! The ordered stack of filter stages a chunk passes through before it
//! reaches the backend, held as a `Vec<Box<dyn FilterPort>>` since the
//! stage list is configured per output rather than fixed at compile time.

use std::borrow::Cow;

use super::FilterPort;
use crate::error::FilterError;
use crate::format::AudioFormat;

#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn FilterPort>>,
    opened: bool,
}

impl FilterChain {
    pub fn new() -> Self {
        Self { filters: Vec::new(), opened: false }
    }

    pub fn push(&mut self, filter: Box<dyn FilterPort>) {
        self.filters.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Open every stage in order, feeding each stage's negotiated output
    /// format to the next. Returns the format the last stage produces.
    pub fn open(&mut self, in_format: &AudioFormat) -> Result<AudioFormat, FilterError> {
        let mut format = *in_format;
        for filter in self.filters.iter_mut() {
            format = filter.open(&format)?;
        }
        self.opened = true;
        Ok(format)
    }

    /// Close every stage in reverse order. A no-op if the chain is not
    /// currently open (mirrors `FilterPort::close`'s own idempotence).
    pub fn close(&mut self) {
        if !self.opened {
            return;
        }
        for filter in self.filters.iter_mut().rev() {
            filter.close();
        }
        self.opened = false;
    }

    /// Push `data` through every stage in order. Returns a slice borrowed
    /// from `data` when the chain is empty or every stage passed its input
    /// through unchanged; otherwise a newly allocated buffer. Matches the
    /// per-stage contract of `FilterPort::filter_pcm`: a borrow is only
    /// ever valid until the caller's next `filter_pcm` call.
    pub fn filter_pcm<'a>(&mut self, data: &'a [u8]) -> Result<Cow<'a, [u8]>, FilterError> {
        let mut current: Cow<'a, [u8]> = Cow::Borrowed(data);
        for filter in self.filters.iter_mut() {
            let input: &[u8] = match &current {
                Cow::Borrowed(slice) => slice,
                Cow::Owned(vec) => vec.as_slice(),
            };
            let output = filter.filter_pcm(input)?;
            let is_passthrough = matches!(&output, Cow::Borrowed(slice) if std::ptr::eq(slice.as_ptr(), input.as_ptr()) && slice.len() == input.len());
            if !is_passthrough {
                current = Cow::Owned(output.into_owned());
            }
            if current.is_empty() {
                return Ok(current);
            }
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::PassthroughFilter;
    use crate::format::SampleFormat;

    fn some_format() -> AudioFormat {
        AudioFormat::new(44_100, SampleFormat::S16, 2)
    }

    #[test]
    fn empty_chain_borrows_input() {
        let mut chain = FilterChain::new();
        chain.open(&some_format()).unwrap();
        let data = vec![1u8, 2, 3, 4];
        match chain.filter_pcm(&data).unwrap() {
            Cow::Borrowed(slice) => assert_eq!(slice, &data[..]),
            Cow::Owned(_) => panic!("expected borrowed output from an empty chain"),
        }
    }

    #[test]
    fn all_passthrough_stages_borrow_input() {
        let mut chain = FilterChain::new();
        chain.push(Box::new(PassthroughFilter::new()));
        chain.push(Box::new(PassthroughFilter::new()));
        chain.open(&some_format()).unwrap();
        let data = vec![5u8, 6, 7, 8];
        match chain.filter_pcm(&data).unwrap() {
            Cow::Borrowed(slice) => assert_eq!(slice, &data[..]),
            Cow::Owned(_) => panic!("expected borrowed output through an all-passthrough chain"),
        }
    }

    #[test]
    fn close_is_idempotent_without_open() {
        let mut chain = FilterChain::new();
        chain.push(Box::new(PassthroughFilter::new()));
        chain.close();
        chain.close();
    }
}
