// src/audio/mod.rs
// Microphone capture - yields a MediaSource for the pipeline

pub mod buffer;
pub mod capture;

pub use buffer::AudioBuffer;

use capture::AudioCapture;
use std::sync::{atomic::AtomicU32, Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no input device available")]
    NoInputDevice,

    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Owns the capture stream for the duration of a recording. The stream is
/// released exactly once, on stop, regardless of whether the recorded buffer
/// is subsequently transcribed.
pub struct AudioRecorder {
    capture: AudioCapture,
    is_recording: bool,
}

impl AudioRecorder {
    pub fn new() -> Self {
        Self {
            capture: AudioCapture::new(),
            is_recording: false,
        }
    }

    pub fn start_recording(&mut self) -> Result<(), AudioError> {
        if self.is_recording {
            return Err(AudioError::AlreadyRecording);
        }
        self.capture.start()?;
        self.is_recording = true;
        Ok(())
    }

    pub fn stop_recording(&mut self) -> Result<AudioBuffer, AudioError> {
        if !self.is_recording {
            return Err(AudioError::NotRecording);
        }
        let buffer = self.capture.stop()?;
        self.is_recording = false;
        Ok(buffer)
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn audio_level_handle(&self) -> Arc<AtomicU32> {
        self.capture.audio_level_handle()
    }

    pub fn list_input_devices(&self) -> Result<Vec<String>, AudioError> {
        self.capture.list_input_devices()
    }

    pub fn selected_input_device(&self) -> Option<String> {
        self.capture.selected_input_device()
    }

    pub fn set_selected_input_device(&mut self, name: Option<String>) {
        self.capture.set_selected_input_device(name);
    }
}

impl Default for AudioRecorder {
    fn default() -> Self {
        Self::new()
    }
}
