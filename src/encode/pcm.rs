//! PCM/WAV segment recording.
//!
//! The capture task is the pipeline for these formats: every buffer is
//! appended (and flushed) to the current segment file synchronously with
//! respect to capture order. Finalize merges the ordered segment list
//! into the result file, then prepends the WAV header when asked for.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task;

use crate::encode::{merge, wav};
use crate::{EncodeError, RecordConfig, RecordFormat};

/// Segment recorder shared by the PCM and WAV formats.
///
/// Holds the writer for the currently open segment plus the ordered,
/// append-only list of closed segments. The list order matches capture
/// chronology and is what makes the merge correct.
pub(crate) struct SegmentPipeline {
    writer: Option<SegmentWriter>,
    segments: Vec<PathBuf>,
}

impl SegmentPipeline {
    /// Creates the pipeline with its first segment open.
    pub(crate) async fn create(first_segment: PathBuf) -> Result<Self, EncodeError> {
        Ok(Self {
            writer: Some(SegmentWriter::create(first_segment).await?),
            segments: Vec::new(),
        })
    }

    /// Appends one capture buffer to the open segment and flushes.
    pub(crate) async fn append(&mut self, bytes: Arc<Vec<u8>>) -> Result<(), EncodeError> {
        match &self.writer {
            Some(writer) => writer.append(bytes).await,
            None => {
                tracing::warn!("append with no open segment");
                Ok(())
            }
        }
    }

    /// Closes the open segment and records it in the merge list.
    pub(crate) async fn close_segment(&mut self) -> Result<(), EncodeError> {
        if let Some(writer) = self.writer.take() {
            let path = writer.close().await?;
            tracing::debug!(segment = %path.display(), "segment closed");
            self.segments.push(path);
        }
        Ok(())
    }

    /// Opens a fresh segment on resume.
    pub(crate) async fn open_segment(&mut self, path: PathBuf) -> Result<(), EncodeError> {
        self.writer = Some(SegmentWriter::create(path).await?);
        Ok(())
    }

    /// Merges all segments into `result` and, for WAV, prepends the
    /// header sized from the merged byte length.
    pub(crate) async fn finalize(
        mut self,
        result: &Path,
        config: &RecordConfig,
    ) -> Result<(), EncodeError> {
        self.close_segment().await?;

        let result = result.to_path_buf();
        let segments = std::mem::take(&mut self.segments);
        let config = config.clone();

        task::spawn_blocking(move || {
            merge::merge_segments(&result, &segments)?;

            if config.format == RecordFormat::Wav {
                let data_len = std::fs::metadata(&result)
                    .map_err(|e| EncodeError::file(result.clone(), e))?
                    .len();
                // A zero-byte recording gets no header (nothing to describe).
                if data_len > 0 {
                    let header = wav::build_header(
                        data_len as u32,
                        config.sample_rate,
                        config.channels,
                        config.bits_per_sample,
                    );
                    wav::insert_header(&result, &header)
                        .map_err(|e| EncodeError::file(result.clone(), e))?;
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| EncodeError::Task(e.to_string()))?
    }

    /// Failure-path teardown: close the open segment, skip the merge.
    /// Segment files stay on disk.
    pub(crate) async fn shutdown(mut self) {
        if let Err(e) = self.close_segment().await {
            tracing::warn!("segment close during teardown: {e}");
        }
    }
}

/// Writer for one open segment file.
///
/// File I/O runs in the blocking thread pool so the capture task never
/// blocks the runtime on disk latency.
struct SegmentWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl SegmentWriter {
    async fn create(path: PathBuf) -> Result<Self, EncodeError> {
        let create_path = path.clone();
        let file = task::spawn_blocking(move || {
            File::create(&create_path).map_err(|e| EncodeError::file(create_path.clone(), e))
        })
        .await
        .map_err(|e| EncodeError::Task(e.to_string()))??;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(Some(file))),
        })
    }

    async fn append(&self, bytes: Arc<Vec<u8>>) -> Result<(), EncodeError> {
        let file = Arc::clone(&self.file);
        let path = self.path.clone();

        task::spawn_blocking(move || {
            let mut guard = file.blocking_lock();
            match guard.as_mut() {
                Some(f) => f
                    .write_all(&bytes)
                    .and_then(|()| f.flush())
                    .map_err(|e| EncodeError::file(path, e)),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| EncodeError::Task(e.to_string()))?
    }

    async fn close(self) -> Result<PathBuf, EncodeError> {
        let file = self.file;
        let path = self.path.clone();

        task::spawn_blocking(move || {
            if let Some(mut f) = file.blocking_lock().take() {
                f.flush().map_err(|e| EncodeError::file(path.clone(), e))?;
            }
            Ok(path)
        })
        .await
        .map_err(|e| EncodeError::Task(e.to_string()))?
    }
}
