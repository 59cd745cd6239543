//! Integration tests for the resilience layer: retries, skips, watchdogs,
//! and stale-signal rejection.
//!
//! Scripted failures run on the `SimulatedPlatform`. Races that need exact
//! control over when a platform event arrives use `ManualPlatform`, which
//! hands every utterance sink back to the test.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::platform::ManualPlatform;
use common::{ARTICLE, drain, labels, progress_indices, spawn_reader, spawn_reader_with};
use readaloud_engine::{
    Outcome, PlatformErrorCode, PlatformKind, PlaybackState, ReaderError, ReaderEvent,
    ReaderSettings, ResilienceOverrides, SimulatedPlatform,
};
use tokio::time::sleep;

fn spoken_indices(platform: &SimulatedPlatform) -> Vec<usize> {
    platform.spoken().iter().map(|u| u.index).collect()
}

fn errors(events: &[ReaderEvent]) -> Vec<ReaderError> {
    events
        .iter()
        .filter_map(|e| match e {
            ReaderEvent::Error(err) => Some(err.clone()),
            _ => None,
        })
        .collect()
}

// ── Retry policy ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn spurious_cancel_is_retried_once_and_advances_once() {
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Desktop)
            .script(1, [Outcome::Fail(PlatformErrorCode::Canceled)]),
    );
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    // Sentence 1 is submitted at ~630ms, fails at ~680ms and is
    // re-submitted after the 250ms retry delay.
    sleep(Duration::from_millis(800)).await;
    let status = reader.status();
    assert_eq!(status.current_index, 1);
    assert_eq!(status.retry_count, 1);

    // Sentence 2 starts at ~1680ms with the retry count reset.
    sleep(Duration::from_millis(1000)).await;
    let status = reader.status();
    assert_eq!(status.current_index, 2);
    assert_eq!(status.retry_count, 0);

    reader.wait().await.unwrap();
    let events = drain(&mut rx);
    assert_eq!(progress_indices(&events), vec![0, 1, 2]);
    assert!(errors(&events).is_empty());
    assert_eq!(spoken_indices(&platform), vec![0, 1, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_skip_the_sentence_and_continue() {
    let canceled = Outcome::Fail(PlatformErrorCode::Canceled);
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Desktop)
            .script(1, [canceled.clone(), canceled.clone(), canceled]),
    );
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();
    reader.wait().await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(
        labels(&events),
        vec!["start", "progress:0", "progress:1", "error", "progress:2", "complete"]
    );
    match errors(&events).as_slice() {
        [ReaderError::FatalPlatform { index, attempts, source }] => {
            assert_eq!(*index, 1);
            assert_eq!(*attempts, 3);
            assert_eq!(source.code, PlatformErrorCode::Canceled);
        }
        other => panic!("expected one fatal error, got {other:?}"),
    }
    assert_eq!(spoken_indices(&platform), vec![0, 1, 1, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn permanent_error_skips_without_retry() {
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Desktop)
            .script(0, [Outcome::Fail(PlatformErrorCode::SynthesisFailed)]),
    );
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();
    reader.wait().await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(progress_indices(&events), vec![0, 1, 2]);
    assert!(matches!(
        errors(&events).as_slice(),
        [ReaderError::FatalPlatform { index: 0, attempts: 1, .. }]
    ));
    assert_eq!(spoken_indices(&platform), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn synchronous_rejection_is_handled_like_an_error_event() {
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Desktop)
            .script(0, [Outcome::Reject(PlatformErrorCode::AudioBusy)])
            .script(2, [Outcome::Reject(PlatformErrorCode::TextTooLong)]),
    );
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();
    reader.wait().await.unwrap();

    let events = drain(&mut rx);
    // audio-busy is retried; text-too-long on the last sentence is skipped
    // and the session still completes.
    assert_eq!(
        labels(&events),
        vec!["start", "progress:0", "progress:1", "progress:2", "error", "complete"]
    );
    assert_eq!(spoken_indices(&platform), vec![0, 0, 1, 2]);
    assert_eq!(reader.status().state, PlaybackState::Completed);
}

#[tokio::test(start_paused = true)]
async fn every_sentence_failing_still_completes() {
    let failed = || Outcome::Fail(PlatformErrorCode::LanguageUnavailable);
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Android)
            .script(0, [failed()])
            .script(1, [failed()])
            .script(2, [failed()]),
    );
    let (reader, mut rx) = spawn_reader(platform);
    reader.play(ARTICLE).await.unwrap();
    reader.wait().await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(errors(&events).len(), 3);
    assert_eq!(progress_indices(&events), vec![0, 1, 2]);
    assert!(matches!(events.last(), Some(ReaderEvent::Completed)));
}

// ── Watchdogs ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn backup_timer_advances_when_end_event_is_lost() {
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Desktop).script(0, [Outcome::Lost]),
    );
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    // 800ms estimate + 1000ms buffer.
    sleep(Duration::from_millis(1700)).await;
    assert_eq!(reader.status().current_index, 0);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(reader.status().current_index, 1);

    reader.wait().await.unwrap();
    let events = drain(&mut rx);
    assert_eq!(progress_indices(&events), vec![0, 1, 2]);
    assert!(errors(&events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_end_after_backup_advances_exactly_once() {
    let platform = Arc::new(ManualPlatform::new(PlatformKind::Desktop));
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    sleep(Duration::from_millis(10)).await;
    let first = platform.sink(0);
    first.started();

    // Backup fires at 1800ms; sentence 1 is submitted 100ms later.
    sleep(Duration::from_millis(2000)).await;
    assert_eq!(platform.submitted().len(), 2);

    // The superseded attempt finally reports its end, twice.
    first.ended();
    first.ended();
    sleep(Duration::from_millis(500)).await;

    let status = reader.status();
    assert_eq!(status.current_index, 1);
    assert_eq!(platform.submitted().len(), 2);
    assert_eq!(progress_indices(&drain(&mut rx)), vec![0, 1]);

    // The live attempt still drives playback.
    platform.last_sink().ended();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(reader.status().current_index, 2);
    assert_eq!(progress_indices(&drain(&mut rx)), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn end_and_error_for_same_attempt_resolve_once() {
    let platform = Arc::new(ManualPlatform::new(PlatformKind::Desktop));
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    sleep(Duration::from_millis(10)).await;
    let sink = platform.sink(0);
    sink.ended();
    sink.failed(PlatformErrorCode::SynthesisFailed);
    sleep(Duration::from_millis(200)).await;

    assert_eq!(reader.status().current_index, 1);
    assert_eq!(reader.status().retry_count, 0);
    let events = drain(&mut rx);
    assert!(errors(&events).is_empty());
    assert_eq!(progress_indices(&events), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn silent_start_on_ios_is_detected_and_retried() {
    let platform = Arc::new(
        SimulatedPlatform::new(PlatformKind::Ios).script(0, [Outcome::Silent]),
    );
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();
    reader.wait().await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(progress_indices(&events), vec![0, 1, 2]);
    assert!(errors(&events).is_empty());
    assert_eq!(spoken_indices(&platform), vec![0, 0, 1, 2]);
    // The voice list was empty for the first two polls.
    assert_eq!(platform.voice_polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn early_detection_is_satisfied_by_speaking_state() {
    let platform = Arc::new(ManualPlatform::new(PlatformKind::Ios));
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    sleep(Duration::from_millis(10)).await;
    // Audio is playing but the start event never arrives.
    platform.set_speaking(true);
    sleep(Duration::from_millis(2000)).await;

    assert_eq!(platform.submitted().len(), 1);
    assert_eq!(reader.status().retry_count, 0);
    assert!(errors(&drain(&mut rx)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn early_detection_can_be_disabled() {
    let settings = ReaderSettings {
        resilience: ResilienceOverrides {
            early_detection_ms: Some(0),
            ..ResilienceOverrides::default()
        },
        ..ReaderSettings::default()
    };
    let platform = Arc::new(ManualPlatform::new(PlatformKind::Ios));
    let (reader, _rx) = spawn_reader_with(platform.clone(), settings);
    reader.play(ARTICLE).await.unwrap();

    // Past the 1200ms iOS window, before the 2300ms backup.
    sleep(Duration::from_millis(2000)).await;
    assert_eq!(platform.submitted().len(), 1);
    assert_eq!(reader.status().retry_count, 0);
}

// ── Stale signals ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn events_after_stop_are_ignored() {
    let platform = Arc::new(ManualPlatform::new(PlatformKind::Desktop));
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    sleep(Duration::from_millis(10)).await;
    let sink = platform.sink(0);
    reader.stop().await.unwrap();
    drain(&mut rx);

    sink.started();
    sink.ended();
    sink.failed(PlatformErrorCode::Interrupted);
    sleep(Duration::from_secs(10)).await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(platform.submitted().len(), 1);
    assert_eq!(reader.status().state, PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn cancel_caused_by_speed_change_is_not_a_failure() {
    let platform = Arc::new(ManualPlatform::new(PlatformKind::Desktop));
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();

    sleep(Duration::from_millis(10)).await;
    let old = platform.sink(0);
    reader.set_speed(1.25).await.unwrap();
    old.failed(PlatformErrorCode::Canceled);
    sleep(Duration::from_millis(100)).await;

    let status = reader.status();
    assert_eq!(status.current_index, 0);
    assert_eq!(status.retry_count, 0);
    assert_eq!(platform.submitted().len(), 2);
    assert!(platform.cancel_count() >= 1);
    assert_eq!(progress_indices(&drain(&mut rx)), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn missing_voices_fall_back_to_platform_default() {
    let platform = Arc::new(SimulatedPlatform::new(PlatformKind::Desktop).with_voices(Vec::new()));
    let (reader, mut rx) = spawn_reader(platform.clone());
    reader.play(ARTICLE).await.unwrap();
    reader.wait().await.unwrap();

    assert!(errors(&drain(&mut rx)).is_empty());
    assert!(platform.spoken().iter().all(|u| u.voice.is_none()));
    assert_eq!(platform.voice_polls(), 3);
}
