//! The device plugin interface, consumed only by interface:
//! open/close/play/pause/drain/cancel/delay/send_tag/enable/disable.

mod rodio_backend;

pub use rodio_backend::RodioBackend;

use std::time::Duration;

use crate::chunk::Tag;
use crate::error::BackendError;
use crate::format::AudioFormat;

/// Abstract contract to one audio output device.
///
/// Every operation here is called by the worker with its mutex released;
/// the trait itself has no opinion on that, it is a property of how
/// [`crate::worker::OutputWorker`] calls it.
pub trait BackendPort: Send {
    /// Enable the device. Called at most once between a `disable()` and
    /// the next successful `enable()`.
    fn enable(&mut self) -> Result<(), BackendError>;

    /// Disable the device. Infallible by contract: a backend that cannot
    /// cleanly disable should still drop its resources.
    fn disable(&mut self);

    /// Open the device for I/O in `format`. On success the backend is
    /// ready to receive `play()` calls in that exact format.
    fn open(&mut self, format: &AudioFormat) -> Result<(), BackendError>;

    /// Close the device. Infallible by contract, mirroring `disable()`.
    fn close(&mut self);

    /// Write `data` to the device. Returns the number of bytes accepted;
    /// `0` means the open session has failed unrecoverably. A non-zero
    /// return is always `<= data.len()` and a multiple of the open
    /// format's frame size.
    fn play(&mut self, data: &[u8]) -> usize;

    /// Pause the device. Called repeatedly by the pause loop until a new
    /// command arrives.
    fn pause(&mut self) -> Result<(), BackendError>;

    /// Block until all previously written audio has been heard (graceful
    /// stop).
    fn drain(&mut self);

    /// Discard all previously written but not yet heard audio (abrupt
    /// stop).
    fn cancel(&mut self);

    /// Time until the device can accept more audio. Zero means "now".
    fn delay(&mut self) -> Duration;

    /// Deliver a tag (e.g. a stream title) ahead of the audio it applies
    /// to. Only called when tag delivery is enabled
    /// (`crate::options::WorkerOptions::tag_delivery_enabled`).
    fn send_tag(&mut self, tag: &Tag);
}
