//! Recording configuration types.

/// Output format for a recording session.
///
/// The format is fixed when [`RecordSession::start()`] is called and
/// selects which encode pipeline consumes the captured audio.
///
/// [`RecordSession::start()`]: crate::RecordSession::start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Raw PCM bytes, no container.
    Pcm,
    /// PCM with the canonical 44-byte RIFF/WAVE header.
    Wav,
    /// MPEG Layer III, produced by the configured [`Mp3Encoder`].
    ///
    /// [`Mp3Encoder`]: crate::Mp3Encoder
    Mp3,
    /// AAC-LC as a raw ADTS bytestream, produced by the configured
    /// [`AacEncoder`].
    ///
    /// [`AacEncoder`]: crate::AacEncoder
    Aac,
}

impl RecordFormat {
    /// Returns the conventional file extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
        }
    }
}

impl std::fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pcm => "PCM",
            Self::Wav => "WAV",
            Self::Mp3 => "MP3",
            Self::Aac => "AAC",
        };
        write!(f, "{name}")
    }
}

/// Immutable parameters for one recording session.
///
/// A `RecordConfig` is supplied to [`RecordSession::start()`] and never
/// changes while the session is active; pause/resume reuse the config the
/// session started with.
///
/// # Example
///
/// ```
/// use record_audio::{RecordConfig, RecordFormat};
///
/// let config = RecordConfig::new(RecordFormat::Wav);
/// assert_eq!(config.sample_rate, 16000);
/// assert_eq!(config.byte_rate(), 32000);
/// ```
///
/// [`RecordSession::start()`]: crate::RecordSession::start
#[derive(Debug, Clone)]
pub struct RecordConfig {
    /// Output format.
    pub format: RecordFormat,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample width in bits (16 for PCM 16-bit).
    pub bits_per_sample: u16,
}

impl RecordConfig {
    /// Creates a config for the given format with 16kHz mono 16-bit capture.
    #[must_use]
    pub fn new(format: RecordFormat) -> Self {
        Self {
            format,
            sample_rate: 16000,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    /// Sets the sample rate.
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Sets the channel count.
    #[must_use]
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Bytes of PCM produced per second at this config.
    #[must_use]
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.channels) * u32::from(self.bits_per_sample / 8)
    }

    /// Bytes per sample frame (one sample for every channel).
    #[must_use]
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self::new(RecordFormat::Wav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RecordConfig::default();
        assert_eq!(config.format, RecordFormat::Wav);
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.bits_per_sample, 16);
    }

    #[test]
    fn test_byte_rate_mono_16bit() {
        let config = RecordConfig::new(RecordFormat::Pcm);
        assert_eq!(config.byte_rate(), 32000); // 16000 * 1 * 2
    }

    #[test]
    fn test_byte_rate_stereo_44k() {
        let config = RecordConfig::new(RecordFormat::Wav)
            .with_sample_rate(44100)
            .with_channels(2);
        assert_eq!(config.byte_rate(), 176_400);
        assert_eq!(config.block_align(), 4);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(RecordFormat::Pcm.extension(), "pcm");
        assert_eq!(RecordFormat::Wav.extension(), "wav");
        assert_eq!(RecordFormat::Mp3.extension(), "mp3");
        assert_eq!(RecordFormat::Aac.extension(), "aac");
    }

    #[test]
    fn test_format_display() {
        assert_eq!(RecordFormat::Aac.to_string(), "AAC");
    }
}
