//! AAC encode pipeline.
//!
//! Two blocking workers decouple codec latency from file I/O latency:
//! the encode worker feeds the codec's input port, drains its output
//! port until nothing more is immediately available, and ADTS-frames
//! each access unit; the writer worker appends framed bytes to the
//! result file and flushes after every write. The finish sentinel flows
//! through both FIFOs, so stop completes only after both workers have
//! fully drained.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};

use crate::encode::{adts, AacEncoder};
use crate::{EncodeError, RecordConfig, RecordError};

enum AacJob {
    Pcm(Arc<Vec<u8>>),
    Finish,
}

enum WriteJob {
    Frame(Vec<u8>),
    /// The encode worker faulted; carries the reason for `finalize`.
    Fail(EncodeError),
    Finish,
}

pub(crate) struct AacPipeline {
    tx: mpsc::UnboundedSender<AacJob>,
    encode_worker: Option<JoinHandle<()>>,
    write_worker: Option<JoinHandle<()>>,
    done: Option<oneshot::Receiver<Result<(), EncodeError>>>,
}

impl AacPipeline {
    /// Validates the ADTS parameters, creates the result file, and
    /// spawns the encode and writer workers.
    pub(crate) async fn spawn(
        encoder: Box<dyn AacEncoder>,
        result: PathBuf,
        config: &RecordConfig,
    ) -> Result<Self, RecordError> {
        let freq_index = adts::sampling_frequency_index(config.sample_rate).ok_or(
            RecordError::UnsupportedAdtsRate {
                rate: config.sample_rate,
            },
        )?;
        let channels = config.channels as u8;

        let create_path = result.clone();
        let file = task::spawn_blocking(move || {
            File::create(&create_path).map_err(|e| RecordError::file(create_path.clone(), e))
        })
        .await
        .map_err(|e| RecordError::Backend(e.to_string()))??;

        let (tx, rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        let write_worker = task::spawn_blocking(move || {
            run_write_loop(file, &result, frame_rx, done_tx);
            tracing::debug!("aac writer exiting");
        });

        let encode_worker = task::spawn_blocking(move || {
            run_encode_loop(encoder, rx, &frame_tx, freq_index, channels);
            let _ = frame_tx.send(WriteJob::Finish);
            // codec drops here - released exactly once when the worker exits
            tracing::debug!("aac encoder exiting");
        });

        Ok(Self {
            tx,
            encode_worker: Some(encode_worker),
            write_worker: Some(write_worker),
            done: Some(done_rx),
        })
    }

    /// Queues one capture buffer for encoding.
    pub(crate) fn feed(&self, pcm: Arc<Vec<u8>>) -> Result<(), EncodeError> {
        self.tx
            .send(AacJob::Pcm(pcm))
            .map_err(|_| EncodeError::QueueClosed)
    }

    /// Sends the finish sentinel and waits for both workers to drain.
    pub(crate) async fn finalize(mut self) -> Result<(), EncodeError> {
        let _ = self.tx.send(AacJob::Finish);

        if let Some(worker) = self.encode_worker.take() {
            let _ = worker.await;
        }
        if let Some(worker) = self.write_worker.take() {
            let _ = worker.await;
        }

        match self.done.take() {
            Some(done) => done
                .await
                .unwrap_or_else(|_| Err(EncodeError::Task("aac writer dropped".to_string()))),
            None => Ok(()),
        }
    }
}

/// Encode worker: blocking FIFO pop, feed the codec, drain its output
/// port, frame each unit with ADTS, hand framed bytes to the writer.
fn run_encode_loop(
    mut encoder: Box<dyn AacEncoder>,
    mut rx: mpsc::UnboundedReceiver<AacJob>,
    frame_tx: &mpsc::UnboundedSender<WriteJob>,
    freq_index: u8,
    channels: u8,
) {
    while let Some(job) = rx.blocking_recv() {
        match job {
            AacJob::Pcm(pcm) => {
                if let Err(e) = encoder.feed(&pcm) {
                    tracing::error!("aac codec fault: {e}");
                    let _ = frame_tx.send(WriteJob::Fail(e));
                    return;
                }
                if drain_output(encoder.as_mut(), frame_tx, freq_index, channels).is_err() {
                    return;
                }
            }
            AacJob::Finish => {
                match encoder.finish() {
                    Ok(units) => {
                        for unit in units {
                            let framed =
                                adts::frame(&unit, adts::PROFILE_AAC_LC, freq_index, channels);
                            if frame_tx.send(WriteJob::Frame(framed)).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("aac codec flush fault: {e}");
                        let _ = frame_tx.send(WriteJob::Fail(e));
                    }
                }
                return;
            }
        }
    }
}

/// Drains access units until the codec has nothing immediately
/// available. Returns `Err` when the worker should stop.
fn drain_output(
    encoder: &mut dyn AacEncoder,
    frame_tx: &mpsc::UnboundedSender<WriteJob>,
    freq_index: u8,
    channels: u8,
) -> Result<(), ()> {
    loop {
        match encoder.next_frame() {
            Ok(Some(unit)) => {
                let framed = adts::frame(&unit, adts::PROFILE_AAC_LC, freq_index, channels);
                if frame_tx.send(WriteJob::Frame(framed)).is_err() {
                    return Err(());
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::error!("aac codec drain fault: {e}");
                let _ = frame_tx.send(WriteJob::Fail(e));
                return Err(());
            }
        }
    }
}

/// Writer worker: append each framed unit to the result file, flushing
/// after every write.
fn run_write_loop(
    mut file: File,
    result: &Path,
    mut rx: mpsc::UnboundedReceiver<WriteJob>,
    done_tx: oneshot::Sender<Result<(), EncodeError>>,
) {
    let mut outcome = Ok(());

    while let Some(job) = rx.blocking_recv() {
        match job {
            WriteJob::Frame(bytes) => {
                if let Err(e) = file.write_all(&bytes).and_then(|()| file.flush()) {
                    tracing::error!("aac writer fault: {}: {e}", result.display());
                    outcome = Err(EncodeError::file(result, e));
                    break;
                }
            }
            WriteJob::Fail(e) => {
                outcome = Err(e);
                break;
            }
            WriteJob::Finish => break,
        }
    }

    let _ = done_tx.send(outcome);
}
