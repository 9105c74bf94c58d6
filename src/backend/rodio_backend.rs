//! A minimal, concrete [`super::BackendPort`] backed by `rodio`.
//!
//! Opens the default output stream with a retry-friendly builder call, then
//! connects a `Sink` to the stream's mixer as the device queue, tracking how
//! far ahead of real time audio has been queued so the caller doesn't
//! overrun the device. This adapter exists so the worker is runnable
//! end-to-end without a mock; production embedders still supply their own
//! plugin.

use std::time::{Duration, Instant};

use log::warn;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::BackendPort;
use crate::chunk::Tag;
use crate::error::BackendError;
use crate::format::{AudioFormat, SampleFormat};

/// How far ahead of real time the backend lets the worker queue audio
/// before `delay()` starts reporting a nonzero wait. A larger window
/// tolerates more scheduling jitter from the caller at the cost of more
/// latency between a PAUSE/CANCEL and the device actually going quiet.
const TARGET_QUEUE_AHEAD: Duration = Duration::from_millis(150);

pub struct RodioBackend {
    stream: Option<OutputStream>,
    sink: Option<Sink>,
    format: AudioFormat,
    queued_until: Instant,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self {
            stream: None,
            sink: None,
            format: AudioFormat::mask(),
            queued_until: Instant::now(),
        }
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendPort for RodioBackend {
    fn enable(&mut self) -> Result<(), BackendError> {
        match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(err) => Err(BackendError::new(format!("failed to open default output stream: {err}"))),
        }
    }

    fn disable(&mut self) {
        self.sink = None;
        self.stream = None;
    }

    fn open(&mut self, format: &AudioFormat) -> Result<(), BackendError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| BackendError::new("open() called before enable()"))?;
        let sink = Sink::connect_new(stream.mixer());
        self.format = *format;
        self.queued_until = Instant::now();
        self.sink = Some(sink);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn play(&mut self, data: &[u8]) -> usize {
        let Some(sample_format) = self.format.format else {
            warn!("play() called with no sample format negotiated");
            return 0;
        };
        let Some(sink) = self.sink.as_ref() else {
            return 0;
        };
        let channels = self.format.channels;
        let sample_rate = self.format.sample_rate;

        let frames = match sample_format {
            SampleFormat::S16 => {
                let samples: Vec<i16> = data
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect();
                sink.append(rodio::buffer::SamplesBuffer::new(channels, sample_rate, samples));
                data.len() / 2
            }
            SampleFormat::F32 => {
                let samples: Vec<f32> = data
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect();
                sink.append(rodio::buffer::SamplesBuffer::new(channels, sample_rate, samples));
                data.len() / 4
            }
            SampleFormat::U8 => {
                warn!("RodioBackend does not support u8 sample playback");
                return 0;
            }
        };

        if frames == 0 {
            return 0;
        }

        let frame_size = self.format.frame_size();
        let seconds = (data.len() as f64 / frame_size as f64) / sample_rate as f64;
        let now = Instant::now();
        let base = if self.queued_until > now { self.queued_until } else { now };
        self.queued_until = base + Duration::from_secs_f64(seconds.max(0.0));

        data.len()
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        match self.sink.as_ref() {
            Some(sink) => {
                sink.pause();
                Ok(())
            }
            None => Err(BackendError::new("pause() called while closed")),
        }
    }

    fn drain(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.sleep_until_end();
        }
    }

    fn cancel(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.stop();
        }
        self.queued_until = Instant::now();
    }

    fn delay(&mut self) -> Duration {
        let now = Instant::now();
        if self.queued_until <= now {
            return Duration::ZERO;
        }
        let queued_ahead = self.queued_until - now;
        queued_ahead.saturating_sub(TARGET_QUEUE_AHEAD)
    }

    fn send_tag(&mut self, _tag: &Tag) {
        // No metadata channel on a plain rodio sink; the device plugin
        // interface allows a no-op implementation here.
    }
}
