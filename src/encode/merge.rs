//! Ordered merging of PCM segment files.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::EncodeError;

/// Copy buffer size for streaming segment content.
const COPY_BUF_LEN: usize = 1024;

/// Concatenates segment files into `result` in list order.
///
/// The result file is created fresh (existing content overwritten). Each
/// segment is streamed in fixed-size chunks and deleted immediately
/// after it has been fully copied, so segment order in the list is the
/// byte order of the output.
///
/// # Errors
///
/// Any I/O error aborts the merge with [`EncodeError::Merge`]. Segments
/// already copied have already been deleted and the result file may be
/// truncated; no later segment's bytes are ever written out of order.
pub fn merge_segments(result: &Path, segments: &[PathBuf]) -> Result<(), EncodeError> {
    let out = File::create(result).map_err(|e| EncodeError::merge(result, e))?;
    let mut writer = BufWriter::new(out);
    let mut buf = [0u8; COPY_BUF_LEN];

    for segment in segments {
        let mut reader = File::open(segment).map_err(|e| EncodeError::merge(segment, e))?;
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| EncodeError::merge(segment, e))?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buf[..n])
                .map_err(|e| EncodeError::merge(result, e))?;
        }
        writer.flush().map_err(|e| EncodeError::merge(result, e))?;

        drop(reader);
        if let Err(e) = std::fs::remove_file(segment) {
            tracing::warn!(segment = %segment.display(), "failed to delete merged segment: {e}");
        }
    }

    writer.flush().map_err(|e| EncodeError::merge(result, e))?;
    tracing::debug!(
        result = %result.display(),
        segments = segments.len(),
        "segments merged"
    );
    Ok(())
}
