//! Recording session state machine.
//!
//! A [`RecordSession`] owns the full recording lifecycle:
//! start/pause/resume/stop, one capture task per recording segment, the
//! active encode pipeline, and finalization. Control calls never return
//! errors; failures surface as [`RecordEvent`]s so a recording fault can
//! never crash the caller.
//!
//! The session state lives in an atomic cell shared with the capture
//! task, which polls it every loop iteration and exits the moment the
//! state leaves `Recording`. Whether that exit finalizes (stop) or
//! suspends (pause) depends on the state that caused it. Pipeline
//! ownership moves with the work: the capture task owns the pipeline
//! while recording and hands it back through its join handle on pause.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;

use crate::encode::{
    AacEncoderFactory, AacPipeline, EncodePipeline, Mp3EncoderFactory, Mp3Pipeline,
    SegmentPipeline,
};
use crate::event::EventHub;
use crate::source::{CaptureSource, CpalSource, SourceFactory};
use crate::state::StateCell;
use crate::{
    AacEncoder, EncodeError, EventCallback, Mp3Encoder, RecordConfig, RecordError, RecordEvent,
    RecordFormat, RecordState,
};

/// Default interval at which the capture task polls its source.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Subdirectory of the temp root holding PCM segment files.
const SEGMENT_DIR: &str = "Record";

/// Builder for a [`RecordSession`].
///
/// # Example
///
/// ```ignore
/// use record_audio::{RecordConfig, RecordEvent, RecordFormat, RecordSession};
///
/// let mut session = RecordSession::builder()
///     .temp_dir("/tmp/myapp")
///     .on_event(|event| {
///         if let RecordEvent::Complete(path) = event {
///             println!("saved {}", path.display());
///         }
///     })
///     .build();
///
/// session.start("take1.wav", RecordConfig::new(RecordFormat::Wav)).await;
/// // ...
/// session.stop().await;
/// ```
#[must_use]
pub struct RecordSessionBuilder {
    temp_dir: PathBuf,
    poll_interval: Duration,
    callback: Option<EventCallback>,
    source_factory: SourceFactory,
    mp3_factory: Option<Mp3EncoderFactory>,
    aac_factory: Option<AacEncoderFactory>,
}

impl RecordSessionBuilder {
    /// Creates a builder with the default capture source (the system's
    /// default input device) and the system temp directory.
    pub fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            callback: None,
            source_factory: Arc::new(|config| {
                CpalSource::open(config).map(|s| Box::new(s) as Box<dyn CaptureSource>)
            }),
            mp3_factory: None,
            aac_factory: None,
        }
    }

    /// Sets the directory under which the `Record/` segment
    /// subdirectory is created.
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Sets the capture task's source polling interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Registers the listener callback. Events are delivered one at a
    /// time, in emission order, on a dedicated dispatcher task.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(RecordEvent) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Replaces the capture source factory. Called once per recording
    /// segment (at start and at every resume).
    pub fn source<F>(mut self, factory: F) -> Self
    where
        F: Fn(&RecordConfig) -> Result<Box<dyn CaptureSource>, RecordError>
            + Send
            + Sync
            + 'static,
    {
        self.source_factory = Arc::new(factory);
        self
    }

    /// Supplies the MP3 encoder factory. Without one, starting an MP3
    /// recording is a setup error.
    pub fn mp3_encoder<F>(mut self, factory: F) -> Self
    where
        F: Fn(&RecordConfig) -> Result<Box<dyn Mp3Encoder>, RecordError> + Send + Sync + 'static,
    {
        self.mp3_factory = Some(Arc::new(factory));
        self
    }

    /// Supplies the AAC encoder factory. Without one, starting an AAC
    /// recording is a setup error.
    pub fn aac_encoder<F>(mut self, factory: F) -> Self
    where
        F: Fn(&RecordConfig) -> Result<Box<dyn AacEncoder>, RecordError> + Send + Sync + 'static,
    {
        self.aac_factory = Some(Arc::new(factory));
        self
    }

    /// Builds the session. Must be called within a tokio runtime (the
    /// event dispatcher task is spawned here).
    pub fn build(self) -> RecordSession {
        RecordSession {
            shared: Arc::new(StateCell::new()),
            events: EventHub::new(self.callback),
            source_factory: self.source_factory,
            mp3_factory: self.mp3_factory,
            aac_factory: self.aac_factory,
            temp_dir: self.temp_dir,
            poll_interval: self.poll_interval,
            active: None,
        }
    }
}

impl Default for RecordSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bookkeeping for the recording currently in progress.
struct ActiveRecording {
    result_path: PathBuf,
    config: RecordConfig,
    segment_seq: u32,
    capture: Option<JoinHandle<Option<EncodePipeline>>>,
    /// Held while paused; otherwise the capture task owns the pipeline.
    pipeline: Option<EncodePipeline>,
}

/// A microphone recording session.
///
/// Constructed explicitly via [`RecordSession::builder()`] and owned by
/// the caller - there is no shared global instance. The session is the
/// sole writer of its result file and the sole owner of its segment
/// list.
///
/// Control calls are async but cheap: `pause` and `stop` wait for the
/// capture task to drain so that, when they return, no audio is lost
/// and (for stop) the result file is complete.
pub struct RecordSession {
    shared: Arc<StateCell>,
    events: EventHub,
    source_factory: SourceFactory,
    mp3_factory: Option<Mp3EncoderFactory>,
    aac_factory: Option<AacEncoderFactory>,
    temp_dir: PathBuf,
    poll_interval: Duration,
    active: Option<ActiveRecording>,
}

impl RecordSession {
    /// Returns a builder for configuring a session.
    pub fn builder() -> RecordSessionBuilder {
        RecordSessionBuilder::new()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> RecordState {
        self.shared.get()
    }

    /// Starts recording to `result_path`.
    ///
    /// Ignored (logged) unless the session is idle. Setup failures - no
    /// capture device, no encoder for the format, unwritable paths -
    /// emit an error event and leave the session idle with no file
    /// created.
    pub async fn start(&mut self, result_path: impl Into<PathBuf>, config: RecordConfig) {
        if self.shared.get() != RecordState::Idle {
            tracing::warn!(state = %self.shared.get(), "start ignored");
            return;
        }
        let result_path = result_path.into();
        tracing::info!(
            format = %config.format,
            rate = config.sample_rate,
            result = %result_path.display(),
            "recording starting"
        );

        let source = match (self.source_factory)(&config) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("capture source setup failed: {e}");
                self.events.error(e.to_string());
                return;
            }
        };

        let pipeline = match self.build_pipeline(&result_path, &config).await {
            Ok(pipeline) => pipeline,
            Err(e) => {
                tracing::error!("pipeline setup failed: {e}");
                self.events.error(e.to_string());
                return;
            }
        };

        let mut active = ActiveRecording {
            result_path,
            config,
            segment_seq: 0,
            capture: None,
            pipeline: None,
        };

        self.shared.set(RecordState::Recording);
        self.events.state_changed(RecordState::Recording);
        active.capture = Some(self.spawn_capture(source, pipeline, &active));
        self.active = Some(active);
    }

    /// Suspends capture, closing the current segment.
    ///
    /// Ignored (logged) unless recording. Segment files and MP3/AAC
    /// workers are retained for [`resume()`](Self::resume).
    pub async fn pause(&mut self) {
        if !self
            .shared
            .transition(RecordState::Recording, RecordState::Pause)
        {
            tracing::warn!(state = %self.shared.get(), "pause ignored");
            return;
        }
        self.events.state_changed(RecordState::Pause);

        let Some(mut active) = self.active.take() else {
            return;
        };
        if let Some(handle) = active.capture.take() {
            match handle.await {
                Ok(Some(pipeline)) => {
                    active.pipeline = Some(pipeline);
                    self.active = Some(active);
                }
                // The capture task failed concurrently and already tore
                // the recording down.
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("capture task failed: {e}");
                    self.events.error("capture task failed");
                    self.shared.set(RecordState::Idle);
                    self.events.state_changed(RecordState::Idle);
                }
            }
        } else {
            self.active = Some(active);
        }
    }

    /// Resumes a paused recording with a fresh segment and capture
    /// source.
    ///
    /// Ignored (logged) unless paused. If the device or segment cannot
    /// be reopened, an error event fires and the session stays paused.
    pub async fn resume(&mut self) {
        if self.shared.get() != RecordState::Pause {
            tracing::warn!(state = %self.shared.get(), "resume ignored");
            return;
        }
        let Some(mut active) = self.active.take() else {
            tracing::warn!("resume with no active recording");
            return;
        };
        let Some(mut pipeline) = active.pipeline.take() else {
            tracing::warn!("resume with no suspended pipeline");
            self.active = Some(active);
            return;
        };

        if matches!(active.config.format, RecordFormat::Pcm | RecordFormat::Wav) {
            active.segment_seq += 1;
            let segment = match segment_path(&self.temp_dir, active.segment_seq) {
                Ok(path) => path,
                Err(e) => {
                    tracing::error!("segment setup failed: {e}");
                    self.events.error(e.to_string());
                    active.pipeline = Some(pipeline);
                    self.active = Some(active);
                    return;
                }
            };
            if let Err(e) = pipeline.resume_segment(segment).await {
                tracing::error!("segment setup failed: {e}");
                self.events.error(e.to_string());
                active.pipeline = Some(pipeline);
                self.active = Some(active);
                return;
            }
        }

        let source = match (self.source_factory)(&active.config) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("capture source setup failed: {e}");
                self.events.error(e.to_string());
                active.pipeline = Some(pipeline);
                self.active = Some(active);
                return;
            }
        };

        self.shared.set(RecordState::Recording);
        self.events.state_changed(RecordState::Recording);
        active.capture = Some(self.spawn_capture(source, pipeline, &active));
        self.active = Some(active);
    }

    /// Stops the recording and finalizes the result file.
    ///
    /// Ignored (logged) when idle. From `Recording` this signals the
    /// capture task and waits for it to drain and finalize; from `Pause`
    /// finalization runs directly. Either way, when the completion event
    /// fires all bytes are flushed.
    pub async fn stop(&mut self) {
        match self.shared.get() {
            RecordState::Idle => {
                tracing::warn!("stop ignored in idle state");
            }
            RecordState::Pause => {
                let Some(mut active) = self.active.take() else {
                    self.shared.set(RecordState::Idle);
                    return;
                };
                if let Some(pipeline) = active.pipeline.take() {
                    finalize_pipeline(
                        pipeline,
                        &active.result_path,
                        &active.config,
                        &self.shared,
                        &self.events,
                    )
                    .await;
                } else {
                    self.shared.set(RecordState::Idle);
                    self.events.state_changed(RecordState::Idle);
                }
            }
            RecordState::Recording => {
                if !self
                    .shared
                    .transition(RecordState::Recording, RecordState::Stop)
                {
                    tracing::warn!("stop raced a concurrent state change");
                    return;
                }
                self.events.state_changed(RecordState::Stop);

                if let Some(mut active) = self.active.take() {
                    if let Some(handle) = active.capture.take() {
                        if let Err(e) = handle.await {
                            tracing::error!("capture task failed: {e}");
                            self.events.error("capture task failed");
                            self.shared.set(RecordState::Idle);
                            self.events.state_changed(RecordState::Idle);
                        }
                    }
                }
            }
            state => {
                tracing::warn!(%state, "stop ignored");
            }
        }
    }

    /// Builds the pipeline for the configured format, including the
    /// first segment (PCM/WAV) or the worker(s) and result file
    /// (MP3/AAC).
    async fn build_pipeline(
        &self,
        result: &Path,
        config: &RecordConfig,
    ) -> Result<EncodePipeline, RecordError> {
        match config.format {
            RecordFormat::Pcm | RecordFormat::Wav => {
                let segment = segment_path(&self.temp_dir, 0)?;
                let pipeline = SegmentPipeline::create(segment)
                    .await
                    .map_err(encode_to_setup_error)?;
                Ok(EncodePipeline::Segment(pipeline))
            }
            RecordFormat::Mp3 => {
                let factory =
                    self.mp3_factory
                        .as_ref()
                        .ok_or(RecordError::EncoderUnavailable {
                            format: RecordFormat::Mp3,
                        })?;
                let encoder = factory(config)?;
                let pipeline = Mp3Pipeline::spawn(encoder, result.to_path_buf()).await?;
                Ok(EncodePipeline::Mp3(pipeline))
            }
            RecordFormat::Aac => {
                let factory =
                    self.aac_factory
                        .as_ref()
                        .ok_or(RecordError::EncoderUnavailable {
                            format: RecordFormat::Aac,
                        })?;
                let encoder = factory(config)?;
                let pipeline = AacPipeline::spawn(encoder, result.to_path_buf(), config).await?;
                Ok(EncodePipeline::Aac(pipeline))
            }
        }
    }

    fn spawn_capture(
        &self,
        source: Box<dyn CaptureSource>,
        pipeline: EncodePipeline,
        active: &ActiveRecording,
    ) -> JoinHandle<Option<EncodePipeline>> {
        let task = CaptureTask {
            source,
            pipeline,
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            result_path: active.result_path.clone(),
            config: active.config.clone(),
            poll_interval: self.poll_interval,
        };
        tokio::spawn(run_capture(task))
    }
}

impl Drop for RecordSession {
    fn drop(&mut self) {
        if self.shared.get() == RecordState::Recording {
            // Capture task finalizes on its own once it sees Stop.
            self.shared.set(RecordState::Stop);
            tracing::debug!("session dropped while recording; stop signaled");
        }
    }
}

/// Everything one recording segment's capture task owns.
struct CaptureTask {
    source: Box<dyn CaptureSource>,
    pipeline: EncodePipeline,
    shared: Arc<StateCell>,
    events: EventHub,
    result_path: PathBuf,
    config: RecordConfig,
    poll_interval: Duration,
}

/// The capture loop for one segment.
///
/// Polls the source on an interval, feeding each buffer to the pipeline
/// and emitting a data event, until the state leaves `Recording`. On
/// exit the source's remaining audio is drained (in-flight buffers are
/// completed, never discarded), the segment is closed, and the exit
/// cause decides what happens next: `Stop` finalizes here, `Pause`
/// hands the pipeline back through the join handle.
async fn run_capture(task: CaptureTask) -> Option<EncodePipeline> {
    let CaptureTask {
        mut source,
        mut pipeline,
        shared,
        events,
        result_path,
        config,
        poll_interval,
    } = task;

    let mut tick = tokio::time::interval(poll_interval);
    let mut failure: Option<String> = None;

    while shared.get() == RecordState::Recording {
        tick.tick().await;
        if let Err(reason) = drain_available(source.as_mut(), &mut pipeline, &events).await {
            failure = Some(reason);
            break;
        }
    }

    if failure.is_none() {
        if let Err(reason) = drain_available(source.as_mut(), &mut pipeline, &events).await {
            failure = Some(reason);
        }
    }
    // Stops capture and releases the device.
    drop(source);

    if failure.is_none() {
        if let Err(e) = pipeline.suspend().await {
            failure = Some(format!("capture failed: {e}"));
        }
    }

    if let Some(reason) = failure {
        tracing::error!("{reason}");
        events.error(reason);
        pipeline.shutdown().await;
        shared.set(RecordState::Idle);
        events.state_changed(RecordState::Idle);
        return None;
    }

    match shared.get() {
        RecordState::Stop => {
            finalize_pipeline(pipeline, &result_path, &config, &shared, &events).await;
            None
        }
        RecordState::Pause => {
            tracing::debug!("capture paused");
            Some(pipeline)
        }
        state => {
            tracing::warn!(%state, "capture loop exiting in unexpected state");
            pipeline.shutdown().await;
            None
        }
    }
}

/// Feeds everything the source currently has buffered to the pipeline.
async fn drain_available(
    source: &mut dyn CaptureSource,
    pipeline: &mut EncodePipeline,
    events: &EventHub,
) -> Result<(), String> {
    loop {
        match source.try_read() {
            Ok(Some(buffer)) => {
                events.emit(RecordEvent::Data(buffer.clone()));
                pipeline
                    .feed(&buffer)
                    .await
                    .map_err(|e| format!("capture failed: {e}"))?;
            }
            Ok(None) => return Ok(()),
            Err(e) => return Err(format!("capture failed: {e}")),
        }
    }
}

/// Finalizes the pipeline and emits the closing event sequence:
/// `Finish` + `Complete` on success, an error event on failure, then
/// `Idle` either way.
async fn finalize_pipeline(
    pipeline: EncodePipeline,
    result: &Path,
    config: &RecordConfig,
    shared: &StateCell,
    events: &EventHub,
) {
    match pipeline.finalize(result, config).await {
        Ok(()) => {
            tracing::info!(result = %result.display(), "recording finished");
            events.state_changed(RecordState::Finish);
            events.emit(RecordEvent::Complete(result.to_path_buf()));
        }
        Err(e) => {
            tracing::error!("finalize failed: {e}");
            events.error(e.to_string());
        }
    }
    shared.set(RecordState::Idle);
    events.state_changed(RecordState::Idle);
}

/// Timestamp-derived path for the next temp segment.
fn segment_path(temp_dir: &Path, seq: u32) -> Result<PathBuf, RecordError> {
    let dir = temp_dir.join(SEGMENT_DIR);
    std::fs::create_dir_all(&dir).map_err(|e| RecordError::file(dir.clone(), e))?;

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(dir.join(format!("record_tmp_{secs}_{seq:02}.pcm")))
}

fn encode_to_setup_error(e: EncodeError) -> RecordError {
    match e {
        EncodeError::File { path, source } => RecordError::File { path, source },
        other => RecordError::Backend(other.to_string()),
    }
}
