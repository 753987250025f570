//! WAV header synthesis and in-place insertion.
//!
//! See: <http://soundfile.sapp.org/doc/WaveFormat/>

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Size of the WAV header in bytes (RIFF + fmt + data chunk headers).
pub const WAV_HEADER_LEN: usize = 44;

/// Size of the fmt chunk data (16 bytes for PCM).
const FMT_CHUNK_LEN: u32 = 16;

/// Audio format code for PCM (uncompressed).
const FORMAT_PCM: u16 = 1;

/// Chunk size used when shifting file content to make room for the header.
const SHIFT_CHUNK_LEN: usize = 8192;

/// Builds the canonical 44-byte RIFF/WAVE header.
///
/// `data_len` is the PCM payload length in bytes, before the header is
/// inserted. The RIFF chunk size is `36 + data_len`.
///
/// # Example
///
/// ```
/// use record_audio::encode::wav;
///
/// let header = wav::build_header(1000, 16000, 1, 16);
/// assert_eq!(&header[0..4], b"RIFF");
/// assert_eq!(u32::from_le_bytes([header[4], header[5], header[6], header[7]]), 1036);
/// ```
#[must_use]
pub fn build_header(
    data_len: u32,
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> [u8; WAV_HEADER_LEN] {
    let bytes_per_sample = bits_per_sample / 8;
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bytes_per_sample);
    let block_align = channels * bytes_per_sample;

    let mut header = [0u8; WAV_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}

/// Inserts a header at the start of an existing file by shifting its
/// content in place.
///
/// The file is grown by the header size and its content moved tail-first
/// in fixed-size chunks, preserving byte order exactly without rewriting
/// the payload or using a temporary file.
///
/// # Errors
///
/// Any I/O error aborts the insertion; the file may be left with a
/// partially shifted tail.
pub fn insert_header(path: &Path, header: &[u8; WAV_HEADER_LEN]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let data_len = file.metadata()?.len();
    file.set_len(data_len + WAV_HEADER_LEN as u64)?;

    let mut buf = [0u8; SHIFT_CHUNK_LEN];
    let mut remaining = data_len;
    while remaining > 0 {
        let n = remaining.min(SHIFT_CHUNK_LEN as u64) as usize;
        let pos = remaining - n as u64;
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(&mut buf[..n])?;
        file.seek(SeekFrom::Start(pos + WAV_HEADER_LEN as u64))?;
        file.write_all(&buf[..n])?;
        remaining = pos;
    }

    file.seek(SeekFrom::Start(0))?;
    file.write_all(header)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn le_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_header_fields_for_16k_mono() {
        let header = build_header(1000, 16000, 1, 16);

        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(le_u32(&header, 4), 1036);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(le_u16(&header, 20), 1); // PCM
        assert_eq!(le_u16(&header, 22), 1); // mono
        assert_eq!(le_u32(&header, 24), 16000);
        assert_eq!(le_u32(&header, 28), 32000); // byte rate
        assert_eq!(le_u16(&header, 32), 2); // block align
        assert_eq!(le_u16(&header, 34), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(le_u32(&header, 40), 1000);
    }

    #[test]
    fn test_header_fields_for_stereo_44k() {
        let header = build_header(88200, 44100, 2, 16);
        assert_eq!(le_u32(&header, 28), 176_400);
        assert_eq!(le_u16(&header, 32), 4);
    }

    #[test]
    fn test_insert_header_small_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        std::fs::write(&path, b"hello").unwrap();

        let header = build_header(5, 16000, 1, 16);
        insert_header(&path, &header).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 44 + 5);
        assert_eq!(&data[0..44], &header);
        assert_eq!(&data[44..], b"hello");
    }

    #[test]
    fn test_insert_header_preserves_multi_chunk_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");

        // Larger than one shift chunk so the tail-first move is exercised.
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &payload).unwrap();

        let header = build_header(payload.len() as u32, 16000, 1, 16);
        insert_header(&path, &header).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 44 + payload.len());
        assert_eq!(&data[44..], &payload[..]);
    }

    #[test]
    fn test_insert_header_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        std::fs::write(&path, b"").unwrap();

        let header = build_header(0, 16000, 1, 16);
        insert_header(&path, &header).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 44);
    }
}
