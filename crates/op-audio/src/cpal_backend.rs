//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};
use op_player::{Mixer, SAMPLE_RATE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::pull::BlockPuller;
use crate::traits::{AudioError, AudioOutput};

/// CPAL-based audio output pulling from a [`Mixer`].
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Open the default output device, at the chip rate if it supports it.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let native = device
            .supported_output_configs()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?
            .find(|range| {
                range.channels() >= 2
                    && range.min_sample_rate().0 <= SAMPLE_RATE
                    && range.max_sample_rate().0 >= SAMPLE_RATE
            })
            .map(|range| range.with_sample_rate(SampleRate(SAMPLE_RATE)));

        let mut config: StreamConfig = match native {
            Some(supported) => supported.into(),
            None => device
                .default_output_config()
                .map_err(|e| AudioError::DeviceInit(e.to_string()))?
                .into(),
        };
        // Force stereo output, the callback writes 2-channel interleaving
        config.channels = 2;

        log::info!(
            "audio output: {} Hz, {} channels",
            config.sample_rate.0,
            config.channels
        );

        Ok(Self {
            device,
            config,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build and start the audio stream. The callback owns `mixer`.
    pub fn build_stream(&mut self, mixer: Mixer) -> Result<(), AudioError> {
        let running = self.running.clone();
        let channels = self.config.channels as usize;
        let mut puller = BlockPuller::new(mixer, self.config.sample_rate.0);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    puller.fill(data, channels);
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        self.running.store(true, Ordering::Relaxed);
        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        self.stream = Some(stream);

        Ok(())
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}
