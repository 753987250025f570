//! End-to-end recording scenarios driven by mock sources and codecs.
//!
//! These exercise the full session -> capture task -> pipeline ->
//! finalize path without audio hardware or codec libraries.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use record_audio::encode::mock::{MockAacEncoder, MockMp3Encoder};
use record_audio::{
    event_callback, CaptureSource, EventCallback, MockSource, RecordConfig, RecordEvent,
    RecordFormat, RecordSession, RecordSessionBuilder, RecordState,
};

/// Collects every delivered event for later assertions.
fn collector() -> (EventCallback, Arc<Mutex<Vec<RecordEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    let callback = event_callback(move |event| {
        seen_cb.lock().unwrap().push(event);
    });
    (callback, seen)
}

/// Waits until the collector holds a `Complete` event (dispatcher
/// delivery is asynchronous).
async fn wait_for_complete(seen: &Arc<Mutex<Vec<RecordEvent>>>) {
    for _ in 0..200 {
        if seen
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, RecordEvent::Complete(_)))
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no Complete event delivered");
}

/// Builder preset: fast polling, mock codecs, and a source factory that
/// hands out one scripted source per recording segment.
fn session_with_sources(
    temp_dir: &Path,
    callback: EventCallback,
    sources: Vec<MockSource>,
) -> RecordSessionBuilder {
    let queue = Arc::new(Mutex::new(VecDeque::from(sources)));
    RecordSession::builder()
        .temp_dir(temp_dir)
        .poll_interval(Duration::from_millis(5))
        .on_event(move |e| callback(e))
        .source(move |config| {
            let source = queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| MockSource::new(config.sample_rate, config.channels));
            Ok(Box::new(source) as Box<dyn CaptureSource>)
        })
        .mp3_encoder(|_| Ok(Box::new(MockMp3Encoder::new())))
        .aac_encoder(|_| Ok(Box::new(MockAacEncoder::new(4))))
}

fn source_with_buffers(buffers: &[Vec<u8>]) -> MockSource {
    let mut source = MockSource::new(16000, 1);
    for buffer in buffers {
        source.push_buffer(buffer.clone());
    }
    source
}

#[tokio::test]
async fn test_pcm_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.pcm");
    let (callback, seen) = collector();

    let buffers: Vec<Vec<u8>> = (0u8..3).map(|i| vec![i; 100]).collect();
    let mut session =
        session_with_sources(dir.path(), callback, vec![source_with_buffers(&buffers)]).build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Pcm))
        .await;
    session.stop().await;
    wait_for_complete(&seen).await;

    let data = std::fs::read(&result).unwrap();
    assert_eq!(data.len(), 300);
    let expected: Vec<u8> = buffers.concat();
    assert_eq!(data, expected);
}

#[tokio::test]
async fn test_wav_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.wav");
    let (callback, seen) = collector();

    let buffers: Vec<Vec<u8>> = (0u8..3).map(|i| vec![i; 100]).collect();
    let mut session =
        session_with_sources(dir.path(), callback, vec![source_with_buffers(&buffers)]).build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Wav))
        .await;
    session.stop().await;
    wait_for_complete(&seen).await;

    let data = std::fs::read(&result).unwrap();
    assert_eq!(data.len(), 344); // 44-byte header + 300 data bytes
    assert_eq!(&data[0..4], b"RIFF");
    let riff_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    assert_eq!(riff_size, 336); // 36 + 300 data bytes, i.e. file length - 8
    assert_eq!(&data[44..], &buffers.concat()[..]);
}

#[tokio::test]
async fn test_pause_resume_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.pcm");
    let (callback, seen) = collector();

    let segment_a = source_with_buffers(&[vec![0xAA; 50]]);
    let segment_b = source_with_buffers(&[vec![0xBB; 70]]);
    let mut session =
        session_with_sources(dir.path(), callback, vec![segment_a, segment_b]).build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Pcm))
        .await;
    session.pause().await;
    assert_eq!(session.state(), RecordState::Pause);

    session.resume().await;
    assert_eq!(session.state(), RecordState::Recording);

    session.stop().await;
    wait_for_complete(&seen).await;

    let data = std::fs::read(&result).unwrap();
    assert_eq!(data.len(), 120);
    assert!(data[..50].iter().all(|&b| b == 0xAA));
    assert!(data[50..].iter().all(|&b| b == 0xBB));
}

#[tokio::test]
async fn test_stop_from_pause_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.pcm");
    let (callback, seen) = collector();

    let mut session = session_with_sources(
        dir.path(),
        callback,
        vec![source_with_buffers(&[vec![7; 30]])],
    )
    .build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Pcm))
        .await;
    session.pause().await;
    session.stop().await;
    wait_for_complete(&seen).await;

    assert_eq!(session.state(), RecordState::Idle);
    assert_eq!(std::fs::read(&result).unwrap(), vec![7; 30]);

    let seen = seen.lock().unwrap();
    assert!(seen
        .iter()
        .any(|e| matches!(e, RecordEvent::StateChanged(RecordState::Finish))));
}

#[tokio::test]
async fn test_segments_deleted_after_merge() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.pcm");
    let (callback, seen) = collector();

    let mut session = session_with_sources(
        dir.path(),
        callback,
        vec![
            source_with_buffers(&[vec![1; 10]]),
            source_with_buffers(&[vec![2; 10]]),
        ],
    )
    .build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Pcm))
        .await;
    session.pause().await;
    session.resume().await;
    session.stop().await;
    wait_for_complete(&seen).await;

    let record_dir = dir.path().join("Record");
    let leftovers: Vec<_> = std::fs::read_dir(&record_dir)
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert!(leftovers.is_empty(), "segments not deleted: {leftovers:?}");
}

#[tokio::test]
async fn test_mp3_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.mp3");
    let (callback, seen) = collector();

    // Little-endian sample bytes; the mock encoder passes samples through.
    let buffers = vec![vec![0x01, 0x02, 0x03, 0x04], vec![0x05, 0x06]];
    let mut session =
        session_with_sources(dir.path(), callback, vec![source_with_buffers(&buffers)]).build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Mp3))
        .await;
    session.stop().await;
    wait_for_complete(&seen).await;

    assert_eq!(std::fs::read(&result).unwrap(), buffers.concat());
}

#[tokio::test]
async fn test_mp3_survives_pause_resume() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.mp3");
    let (callback, seen) = collector();

    let mut session = session_with_sources(
        dir.path(),
        callback,
        vec![
            source_with_buffers(&[vec![0x11, 0x11]]),
            source_with_buffers(&[vec![0x22, 0x22]]),
        ],
    )
    .build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Mp3))
        .await;
    session.pause().await;
    session.resume().await;
    session.stop().await;
    wait_for_complete(&seen).await;

    // One continuous encoded stream across the pause boundary.
    assert_eq!(
        std::fs::read(&result).unwrap(),
        vec![0x11, 0x11, 0x22, 0x22]
    );
}

#[tokio::test]
async fn test_aac_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.aac");
    let (callback, seen) = collector();

    // Two 4-byte access units from the mock codec.
    let buffers = vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]];
    let mut session =
        session_with_sources(dir.path(), callback, vec![source_with_buffers(&buffers)]).build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Aac))
        .await;
    session.stop().await;
    wait_for_complete(&seen).await;

    let data = std::fs::read(&result).unwrap();
    assert_eq!(data.len(), 2 * (7 + 4));

    // Walk the ADTS stream: sync bytes and 13-bit length per frame.
    let mut pos = 0;
    let mut payloads = Vec::new();
    while pos < data.len() {
        assert_eq!(data[pos], 0xFF);
        assert_eq!(data[pos + 1], 0xF9);
        let frame_len = (usize::from(data[pos + 3] & 0x03) << 11)
            | (usize::from(data[pos + 4]) << 3)
            | (usize::from(data[pos + 5]) >> 5);
        payloads.push(data[pos + 7..pos + frame_len].to_vec());
        pos += frame_len;
    }
    assert_eq!(payloads, buffers);
}

#[tokio::test]
async fn test_data_events_carry_raw_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.pcm");
    let (callback, seen) = collector();

    let buffers = vec![vec![9u8; 40], vec![8u8; 40]];
    let mut session =
        session_with_sources(dir.path(), callback, vec![source_with_buffers(&buffers)]).build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Pcm))
        .await;
    session.stop().await;
    wait_for_complete(&seen).await;

    let seen = seen.lock().unwrap();
    let data_events: Vec<Vec<u8>> = seen
        .iter()
        .filter_map(|e| match e {
            RecordEvent::Data(buffer) => Some(buffer.bytes.as_ref().clone()),
            _ => None,
        })
        .collect();
    assert_eq!(data_events, buffers);
}

#[tokio::test]
async fn test_complete_fires_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("out.pcm");
    let (callback, seen) = collector();

    let mut session = session_with_sources(
        dir.path(),
        callback,
        vec![source_with_buffers(&[vec![3; 10]])],
    )
    .build();

    session
        .start(&result, RecordConfig::new(RecordFormat::Pcm))
        .await;
    session.stop().await;
    // A second stop while idle must not re-finalize.
    session.stop().await;
    wait_for_complete(&seen).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let seen = seen.lock().unwrap();
    let completions = seen
        .iter()
        .filter(|e| matches!(e, RecordEvent::Complete(_)))
        .count();
    assert_eq!(completions, 1);
}
