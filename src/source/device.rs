//! CPAL-backed capture source.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, SupportedBufferSize, SupportedStreamConfigRange};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;

use crate::source::{negotiate, CaptureSource};
use crate::{CaptureBuffer, RecordConfig, RecordError};

/// Fallback minimum buffer size in frames when the backend does not
/// report one for an otherwise supported rate.
const DEFAULT_MIN_FRAMES: usize = 1024;

/// Ring buffer capacity, in capture buffers, absorbing scheduling jitter
/// between the audio callback and the capture loop.
const RING_CAPACITY_BUFFERS: usize = 32;

/// Symmetric i16 max for f32 conversion (avoids asymmetric clipping).
const I16_MAX_SYMMETRIC: f32 = i16::MAX as f32;

/// Microphone capture through the system's default input device.
///
/// The CPAL audio callback pushes samples into a lock-free SPSC ring
/// buffer; [`try_read`](CaptureSource::try_read) pops one negotiated
/// buffer's worth at a time. Dropping the source stops the CPAL stream
/// and releases the device.
#[must_use]
pub struct CpalSource {
    // Keep the stream alive - dropping it stops CPAL
    _stream: Stream,
    consumer: ringbuf::HeapCons<i16>,
    chunk_samples: usize,
    sample_rate: u32,
    channels: u16,
}

impl CpalSource {
    /// Opens the default input device at the config's rate and channel
    /// count, negotiating the working buffer size against the device's
    /// supported ranges.
    ///
    /// # Errors
    ///
    /// Returns a setup error when no default device exists, no probed
    /// rate is accepted, or the stream cannot be built.
    pub fn open(config: &RecordConfig) -> Result<Self, RecordError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(RecordError::NoDefaultDevice)?;

        let ranges: Vec<SupportedStreamConfigRange> = device
            .supported_input_configs()
            .map_err(|e| RecordError::Backend(e.to_string()))?
            .collect();

        let bytes_per_frame = usize::from(config.block_align().max(2));
        let negotiated = negotiate(config.sample_rate, |rate| {
            min_buffer_bytes(&ranges, rate, bytes_per_frame)
        })?;

        let chunk_samples = (negotiated.size / 2).max(1);
        let ring = HeapRb::<i16>::new(chunk_samples * RING_CAPACITY_BUFFERS);
        let (producer, consumer) = ring.split();

        let sample_format = device
            .default_input_config()
            .map_err(|e| RecordError::Backend(e.to_string()))?
            .sample_format();

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match sample_format {
            SampleFormat::I16 => build_i16_stream(&device, &stream_config, producer)?,
            SampleFormat::F32 => build_f32_stream(&device, &stream_config, producer)?,
            format => {
                return Err(RecordError::UnsupportedSampleFormat {
                    format: format!("{format:?}"),
                });
            }
        };

        stream
            .play()
            .map_err(|e| RecordError::Backend(e.to_string()))?;

        tracing::info!(
            rate = config.sample_rate,
            channels = config.channels,
            buffer_bytes = negotiated.size,
            "capture stream started"
        );

        Ok(Self {
            _stream: stream,
            consumer,
            chunk_samples,
            sample_rate: config.sample_rate,
            channels: config.channels,
        })
    }
}

impl CaptureSource for CpalSource {
    fn try_read(&mut self) -> Result<Option<CaptureBuffer>, RecordError> {
        if self.consumer.occupied_len() < self.chunk_samples {
            return Ok(None);
        }

        let mut bytes = Vec::with_capacity(self.chunk_samples * 2);
        for _ in 0..self.chunk_samples {
            match self.consumer.try_pop() {
                Some(sample) => bytes.extend_from_slice(&sample.to_le_bytes()),
                None => break,
            }
        }

        Ok(Some(CaptureBuffer::new(
            bytes,
            self.sample_rate,
            self.channels,
        )))
    }
}

/// Probes the supported ranges for a minimum buffer size at `rate`,
/// in bytes. `None` means the rate is not supported at all.
fn min_buffer_bytes(
    ranges: &[SupportedStreamConfigRange],
    rate: u32,
    bytes_per_frame: usize,
) -> Option<usize> {
    let rate = SampleRate(rate);
    let range = ranges
        .iter()
        .find(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())?;

    let frames = match *range.buffer_size() {
        SupportedBufferSize::Range { min, .. } if min > 0 => min as usize,
        _ => DEFAULT_MIN_FRAMES,
    };
    Some(frames * bytes_per_frame)
}

fn build_i16_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: ringbuf::HeapProd<i16>,
) -> Result<Stream, RecordError> {
    device
        .build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Non-blocking push - drops samples if the loop falls behind
                let _ = producer.push_slice(data);
            },
            |err| {
                tracing::error!("capture stream error: {err}");
            },
            None,
        )
        .map_err(|e| RecordError::Backend(e.to_string()))
}

fn build_f32_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: ringbuf::HeapProd<i16>,
) -> Result<Stream, RecordError> {
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    let converted = (sample * I16_MAX_SYMMETRIC)
                        .clamp(i16::MIN as f32, i16::MAX as f32)
                        as i16;
                    let _ = producer.try_push(converted);
                }
            },
            |err| {
                tracing::error!("capture stream error: {err}");
            },
            None,
        )
        .map_err(|e| RecordError::Backend(e.to_string()))
}
