//! ADTS framing for AAC access units.
//!
//! Every encoded access unit gets a 7-byte header so the output file is
//! a self-delimiting raw ADTS bytestream (no container). The layout must
//! be bit-exact - downstream AAC decoders parse it.

/// Size of the ADTS header in bytes.
pub const ADTS_HEADER_LEN: usize = 7;

/// MPEG-4 audio object type for AAC-LC. The header's 2-bit profile
/// field stores this value minus one.
pub const PROFILE_AAC_LC: u8 = 2;

/// Largest payload representable in the 13-bit frame length field.
const MAX_PAYLOAD_LEN: usize = 0x1FFF - ADTS_HEADER_LEN;

/// Maps a sample rate to its 4-bit ADTS sampling-frequency index.
///
/// Returns `None` for rates outside the standard table; recording AAC
/// at such a rate is rejected at pipeline setup.
#[must_use]
pub fn sampling_frequency_index(sample_rate: u32) -> Option<u8> {
    let index = match sample_rate {
        96000 => 0,
        88200 => 1,
        64000 => 2,
        48000 => 3,
        44100 => 4,
        32000 => 5,
        24000 => 6,
        22050 => 7,
        16000 => 8,
        12000 => 9,
        11025 => 10,
        8000 => 11,
        7350 => 12,
        _ => return None,
    };
    Some(index)
}

/// Prepends a 7-byte ADTS header to an encoded access unit.
///
/// Header fields: 12-bit sync word 0xFFF, MPEG-2 ID with layer zero and
/// protection absent (byte 1 = 0xF9), `profile - 1` in two bits, the
/// sampling-frequency index, the channel configuration, a 13-bit frame
/// length covering header plus payload, and an all-ones buffer-fullness
/// field signalling VBR.
///
/// # Example
///
/// ```
/// use record_audio::encode::adts;
///
/// let framed = adts::frame(&[0u8; 100], adts::PROFILE_AAC_LC, 4, 1);
/// assert_eq!(framed.len(), 107);
/// assert_eq!(framed[0], 0xFF);
/// assert_eq!(framed[1], 0xF9);
/// ```
#[must_use]
pub fn frame(payload: &[u8], profile: u8, freq_index: u8, channels: u8) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);
    let frame_len = payload.len() + ADTS_HEADER_LEN;

    let mut out = Vec::with_capacity(frame_len);
    out.push(0xFF);
    out.push(0xF9);
    out.push(((profile - 1) << 6) | ((freq_index & 0x0F) << 2) | (channels >> 2));
    out.push(((channels & 0x03) << 6) | ((frame_len >> 11) as u8 & 0x03));
    out.push((frame_len >> 3) as u8);
    out.push((((frame_len & 0x07) as u8) << 5) | 0x1F);
    out.push(0xFC);
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decodes the 13-bit frame length field from a framed packet.
    fn decode_frame_len(framed: &[u8]) -> usize {
        (usize::from(framed[3] & 0x03) << 11)
            | (usize::from(framed[4]) << 3)
            | (usize::from(framed[5]) >> 5)
    }

    #[test]
    fn test_frame_length_is_payload_plus_seven() {
        for len in [0usize, 1, 100, 1000] {
            let framed = frame(&vec![0u8; len], PROFILE_AAC_LC, 4, 1);
            assert_eq!(framed.len(), len + ADTS_HEADER_LEN);
        }
    }

    #[test]
    fn test_sync_and_config_bytes() {
        let framed = frame(&[0u8; 64], PROFILE_AAC_LC, 4, 1);
        assert_eq!(framed[0], 0xFF);
        assert_eq!(framed[1], 0xF9);
        assert_eq!(framed[6], 0xFC);
    }

    #[test]
    fn test_length_field_decodes_to_payload_plus_seven() {
        for len in [0usize, 7, 255, 1024, 4000] {
            let framed = frame(&vec![0u8; len], PROFILE_AAC_LC, 8, 1);
            assert_eq!(decode_frame_len(&framed), len + ADTS_HEADER_LEN);
        }
    }

    #[test]
    fn test_profile_and_freq_index_bits() {
        // AAC-LC (profile 2), 44.1kHz (index 4), mono:
        // byte 2 = ((2-1) << 6) | (4 << 2) | 0 = 0x50
        let framed = frame(&[0u8; 10], PROFILE_AAC_LC, 4, 1);
        assert_eq!(framed[2], 0x50);
        // channel config 1 lands in the top bits of byte 3
        assert_eq!(framed[3] & 0xC0, 0x40);
    }

    #[test]
    fn test_payload_copied_after_header() {
        let payload = [0xAA, 0xBB, 0xCC];
        let framed = frame(&payload, PROFILE_AAC_LC, 4, 2);
        assert_eq!(&framed[ADTS_HEADER_LEN..], &payload);
    }

    #[test]
    fn test_sampling_frequency_index_table() {
        assert_eq!(sampling_frequency_index(96000), Some(0));
        assert_eq!(sampling_frequency_index(48000), Some(3));
        assert_eq!(sampling_frequency_index(44100), Some(4));
        assert_eq!(sampling_frequency_index(22050), Some(7));
        assert_eq!(sampling_frequency_index(16000), Some(8));
        assert_eq!(sampling_frequency_index(11025), Some(10));
        assert_eq!(sampling_frequency_index(8000), Some(11));
        assert_eq!(sampling_frequency_index(12345), None);
    }
}
