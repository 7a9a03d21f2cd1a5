// src/audio/capture.rs
// cpal input capture with an RMS level meter

use super::{AudioBuffer, AudioError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};
use tracing::{error, info};

const RMS_BOOST: f32 = 2.5;

pub struct AudioCapture {
    stream: Option<cpal::Stream>,
    is_recording: bool,
    buffer: Arc<Mutex<AudioBuffer>>,
    level: Arc<AtomicU32>,
    selected_input_device: Option<String>,
}

impl AudioCapture {
    pub fn new() -> Self {
        Self {
            stream: None,
            is_recording: false,
            buffer: Arc::new(Mutex::new(AudioBuffer::new(16000, 1))),
            level: Arc::new(AtomicU32::new(0.0f32.to_bits())),
            selected_input_device: None,
        }
    }

    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.is_recording {
            return Err(AudioError::AlreadyRecording);
        }

        let host = cpal::default_host();
        let device = Self::pick_input_device(&host, self.selected_input_device.as_deref())
            .ok_or(AudioError::NoInputDevice)?;

        info!("Input device: {}", Self::device_display_name(&device));

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        if let Ok(mut guard) = self.buffer.lock() {
            guard.sample_rate = config.sample_rate();
            guard.channels = config.channels();
            guard.clear();
        }

        let buffer_clone = self.buffer.clone();
        let level_clone = self.level.clone();
        let err_fn = |err| error!("an error occurred on stream: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| write_input_data(data, &buffer_clone, &level_clone),
                err_fn,
                None,
            ),
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| write_input_data_f32(data, &buffer_clone, &level_clone),
                err_fn,
                None,
            ),
            other => return Err(AudioError::Stream(format!("unsupported sample format {:?}", other))),
        }
        .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;
        self.stream = Some(stream);
        self.is_recording = true;

        Ok(())
    }

    /// Stop capturing and hand back the recorded buffer. The input stream is
    /// dropped here, exactly once, whether or not the buffer gets used.
    pub fn stop(&mut self) -> Result<AudioBuffer, AudioError> {
        if !self.is_recording {
            return Err(AudioError::NotRecording);
        }

        self.stream.take();
        self.is_recording = false;
        self.level.store(0.0f32.to_bits(), Ordering::Relaxed);

        let mut guard = self
            .buffer
            .lock()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        let out = guard.clone();
        guard.clear();
        Ok(out)
    }

    pub fn audio_level_handle(&self) -> Arc<AtomicU32> {
        self.level.clone()
    }

    pub fn list_input_devices(&self) -> Result<Vec<String>, AudioError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| AudioError::Stream(e.to_string()))?
            .map(|device| Self::device_display_name(&device))
            .collect::<Vec<_>>();
        Ok(devices)
    }

    pub fn selected_input_device(&self) -> Option<String> {
        self.selected_input_device.clone()
    }

    pub fn set_selected_input_device(&mut self, name: Option<String>) {
        self.selected_input_device = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
    }

    fn pick_input_device(host: &cpal::Host, preferred_name: Option<&str>) -> Option<cpal::Device> {
        if let Some(name) = preferred_name {
            if let Ok(mut devices) = host.input_devices() {
                if let Some(device) = devices.find(|d| Self::device_display_name(d) == name) {
                    return Some(device);
                }
            }
            tracing::warn!(
                "Preferred input device '{}' not found, falling back to default",
                name
            );
        }
        host.default_input_device()
    }

    fn device_display_name(device: &cpal::Device) -> String {
        device
            .name()
            .or_else(|_| device.description().map(|d| d.name().to_string()))
            .unwrap_or_else(|_| "Unknown input".to_string())
    }
}

fn write_input_data(input: &[i16], buffer: &Arc<Mutex<AudioBuffer>>, level: &Arc<AtomicU32>) {
    if let Ok(mut guard) = buffer.lock() {
        guard.append(input);
    }

    let rms = rms_i16(input);
    let normalized = (rms * RMS_BOOST).clamp(0.0, 1.0);
    level.store(normalized.to_bits(), Ordering::Relaxed);
}

fn write_input_data_f32(input: &[f32], buffer: &Arc<Mutex<AudioBuffer>>, level: &Arc<AtomicU32>) {
    let rms = rms_f32(input);
    let normalized = (rms * RMS_BOOST).clamp(0.0, 1.0);
    level.store(normalized.to_bits(), Ordering::Relaxed);

    let samples: Vec<i16> = input.iter().map(|&x| (x * i16::MAX as f32) as i16).collect();
    if let Ok(mut guard) = buffer.lock() {
        guard.append(&samples);
    }
}

fn rms_i16(input: &[i16]) -> f32 {
    if input.is_empty() {
        return 0.0;
    }
    let sum: f32 = input
        .iter()
        .map(|&s| {
            let v = s as f32 / i16::MAX as f32;
            v * v
        })
        .sum();
    (sum / input.len() as f32).sqrt()
}

fn rms_f32(input: &[f32]) -> f32 {
    if input.is_empty() {
        return 0.0;
    }
    let sum: f32 = input.iter().map(|&s| s * s).sum();
    (sum / input.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms_i16(&[0i16; 64]), 0.0);
        assert_eq!(rms_f32(&[]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_f32_is_one() {
        let rms = rms_f32(&[1.0f32; 32]);
        assert!((rms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let mut capture = AudioCapture::new();
        assert!(matches!(capture.stop(), Err(AudioError::NotRecording)));
    }
}
