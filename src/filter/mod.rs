//! The filter plugin interface, consumed only by interface: replay-gain,
//! convert, and any user-configured chain stage are stateful transformers
//! behind [`FilterPort`].

mod chain;
mod gain;
mod passthrough;

pub use chain::FilterChain;
pub use gain::LinearReplayGainFilter;
pub use passthrough::{IdentityConvertFilter, PassthroughFilter};

use std::borrow::Cow;

use crate::chunk::ReplayGainInfo;
use crate::error::FilterError;
use crate::format::AudioFormat;

/// One stage of the filter chain.
///
/// `open`/`close` are idempotent per open session (calling either twice in
/// a row without an intervening counterpart is a no-op). `filter_pcm` may
/// return a borrowed slice (passthrough) or a newly-owned buffer
/// (transformed); either way, the borrow is only valid until the next
/// `filter_pcm` call, which `Cow`'s lifetime parameter enforces directly.
pub trait FilterPort: Send {
    fn open(&mut self, in_format: &AudioFormat) -> Result<AudioFormat, FilterError>;
    fn close(&mut self);
    fn filter_pcm<'a>(&mut self, data: &'a [u8]) -> Result<Cow<'a, [u8]>, FilterError>;
}

/// Extension implemented by the replay-gain filter stage: reconfigured
/// whenever a chunk's `replay_gain_serial` differs from the last-applied
/// serial. `None` means "no replay gain info", which is also what a
/// serial of zero maps to.
pub trait ReplayGainFilter: FilterPort {
    fn set_info(&mut self, info: Option<ReplayGainInfo>);
}

/// Extension implemented by the output-side convert filter: told the
/// final negotiated output format once OPEN completes.
pub trait ConvertFilter: FilterPort {
    fn set_out_format(&mut self, format: &AudioFormat) -> Result<(), FilterError>;
}
