//! End-to-end properties of the signal engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use journal_biometrics::collector::{generate, KeyEvent, TypingProfile, BACKSPACE};
use journal_biometrics::{replay_to_vec, BehavioralSignature, EngineConfig, SignalEngine};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap()
}

fn seeded_engine(seed: u64) -> SignalEngine {
    let mut config = EngineConfig::default();
    config.pressure.seed = Some(seed);
    SignalEngine::new(config)
}

fn feed(engine: &mut SignalEngine, keys: usize, interval_ms: i64) -> DateTime<Utc> {
    let mut at = start();
    for i in 0..keys {
        if i > 0 {
            at += Duration::milliseconds(interval_ms);
        }
        engine.on_key_event("a", at);
    }
    at
}

fn assert_unit(signature: &BehavioralSignature) {
    for score in [
        signature.flow_state.current,
        signature.flow_state.average,
        signature.cognitive_load.current,
        signature.confidence.current,
    ] {
        assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
    }
}

#[test]
fn buffers_never_exceed_capacity() {
    let mut engine = seeded_engine(1);
    engine.activate("writer");
    let mut at = start();
    for i in 0..500 {
        at += Duration::milliseconds(if i % 7 == 0 { 1500 } else { 120 });
        let key = if i % 4 == 0 { BACKSPACE } else { "e" };
        engine.on_key_event(key, at);
        if i % 20 == 0 {
            engine.aggregate(at);
        }
    }

    let buffers = engine.session().unwrap().buffers();
    assert_eq!(buffers.timestamps.len(), 100);
    assert!(buffers.pauses.len() <= 100);
    assert_eq!(buffers.rhythm.len(), 100);
    assert_eq!(buffers.pressure.len(), 100);
    assert!(buffers.revisions.len() <= 100);
    assert_eq!(buffers.total_keystrokes, 500);

    let signature = engine.aggregate(at).unwrap();
    assert_eq!(signature.keystroke_rhythm.len(), 100);
    assert_eq!(signature.typing_pressure.len(), 100);
}

#[test]
fn flow_is_zero_below_ten_timestamps() {
    let mut engine = seeded_engine(1);
    engine.activate("writer");
    let last = feed(&mut engine, 9, 100);

    let signature = engine.aggregate(last).unwrap();
    assert_eq!(signature.flow_state.current, 0.0);
}

#[test]
fn scores_stay_in_unit_interval() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut engine = seeded_engine(2);
    engine.activate("writer");

    let mut at = start();
    for i in 0..400 {
        at += Duration::milliseconds(rng.gen_range(0..6_000));
        let key = if rng.gen_bool(0.25) { BACKSPACE } else { "k" };
        engine.on_key_event(key, at);
        if i % 10 == 0 {
            assert_unit(&engine.aggregate(at).unwrap());
        }
    }
}

#[test]
fn periodic_stream_is_rhythmic() {
    let mut engine = seeded_engine(3);
    engine.activate("writer");
    let last = feed(&mut engine, 30, 100);

    let signature = engine.aggregate(last).unwrap();
    assert!((signature.flow_state.consistency - 1.0).abs() < 1e-9);
    assert!(signature.patterns.rhythmic_typing);
    assert!(!signature.patterns.burst_typing);
    assert!(signature.patterns.flow_state);
}

#[test]
fn long_pauses_break_sustainability_and_signal_hesitation() {
    let mut engine = seeded_engine(4);
    engine.activate("writer");
    let last = feed(&mut engine, 15, 4000);

    let signature = engine.aggregate(last).unwrap();
    assert!(signature.flow_state.sustainability.abs() < 1e-9);
    assert!(signature.patterns.hesitation_phase);
    assert!(!signature.patterns.flow_state);
}

#[test]
fn hesitation_after_first_long_pause() {
    let mut engine = seeded_engine(4);
    engine.activate("writer");
    engine.on_key_event("a", start());
    assert!(!engine.aggregate(start()).unwrap().patterns.hesitation_phase);

    let later = start() + Duration::milliseconds(4000);
    engine.on_key_event("b", later);
    assert!(engine.aggregate(later).unwrap().patterns.hesitation_phase);
}

#[test]
fn reactivation_starts_empty() {
    let mut engine = seeded_engine(5);
    engine.activate("first-writer");
    feed(&mut engine, 40, 150);
    engine.aggregate(start() + Duration::seconds(10));

    assert!(engine.deactivate().is_some());
    engine.on_key_event("a", start());
    assert!(engine.aggregate(start()).is_none());

    engine.activate("second-writer");
    let session = engine.session().unwrap();
    assert_eq!(session.user_id(), "second-writer");
    assert!(session.buffers().is_empty());

    let signature = engine.aggregate(start() + Duration::seconds(20)).unwrap();
    assert_eq!(signature.sequence, 1);
    assert_eq!(signature.keystroke_count, 0);
    assert_eq!(signature.flow_state.average, 0.0);
    assert!(signature.pause_patterns.is_empty());
}

#[test]
fn backspace_ratio_is_exact() {
    let mut engine = seeded_engine(6);
    engine.activate("writer");
    let keys = ["t", "h", BACKSPACE, "e", BACKSPACE, " ", "c", BACKSPACE, "a", "t"];
    for (i, key) in keys.iter().enumerate() {
        engine.on_key_event(key, start() + Duration::milliseconds(i as i64 * 200));
    }

    let signature = engine.aggregate(start() + Duration::seconds(2)).unwrap();
    assert_eq!(signature.cognitive_load.backspace_frequency, 0.3);
    assert_eq!(signature.backspace_count, 3);
    assert_eq!(
        signature.cognitive_load.revision_patterns,
        vec!["correction", "correction", "correction"]
    );
}

#[test]
fn heavy_deletion_with_long_pauses_is_overload() {
    let mut engine = seeded_engine(7);
    engine.activate("writer");
    let mut at = start();
    for i in 0..20 {
        if i > 0 {
            at += Duration::milliseconds(if i % 2 == 1 { 1100 } else { 5000 });
        }
        let key = if i % 5 == 4 { "w" } else { BACKSPACE };
        engine.on_key_event(key, at);
    }

    let signature = engine.aggregate(at).unwrap();
    assert!(signature.cognitive_load.current > 0.7);
    assert!(signature.patterns.cognitive_overload);
}

#[test]
fn identical_input_gives_identical_signatures() {
    let events: Vec<KeyEvent> = generate(TypingProfile::Revising, 150, 130, start());
    let session_id = Uuid::new_v4();

    let first = replay_to_vec(seeded_engine(42), "writer", session_id, &events).unwrap();
    let second = replay_to_vec(seeded_engine(42), "writer", session_id, &events).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn synthetic_profiles_classify_as_expected() {
    let bursty = replay_to_vec(
        seeded_engine(8),
        "writer",
        Uuid::nil(),
        &generate(TypingProfile::Bursty, 60, 80, start()),
    )
    .unwrap();
    assert!(bursty.last().unwrap().patterns.burst_typing);

    let hesitant = replay_to_vec(
        seeded_engine(8),
        "writer",
        Uuid::nil(),
        &generate(TypingProfile::Hesitant, 30, 150, start()),
    )
    .unwrap();
    assert!(hesitant.last().unwrap().patterns.hesitation_phase);
}
