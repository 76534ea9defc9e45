//! Engine behavior tests driven through the mock backend.
//!
//! The mock pump plays the role of the audio driver, so every scheduling
//! path (auto-assignment, late playback, pause/resume, streaming refill)
//! runs deterministically.

use resona_core::{CanonicalSound, Freq, SoundError, Time, fixed_to_f32};
use resona_dsp::{canonicalize, tone};
use resona_engine::mock::MockBackend;
use resona_engine::{AudioEngine, EngineConfig, EngineError};

const RATE: u32 = 44100;

fn test_config() -> EngineConfig {
    EngineConfig {
        rate: RATE,
        num_channels: 8,
        queue_size: 8,
        stream_unit: 2048,
    }
}

fn setup() -> (AudioEngine, resona_engine::mock::MockPump) {
    let backend = MockBackend::new();
    let pump = backend.pump();
    let engine = AudioEngine::setup_with_backend(&backend, test_config()).unwrap();
    (engine, pump)
}

fn short_tone() -> CanonicalSound {
    canonicalize(&tone(Freq::hz(440.0), Time::ms(50.0), RATE), RATE)
}

fn const_sound(frames: usize, value: i16) -> CanonicalSound {
    CanonicalSound::from_interleaved(vec![value; frames * 2], RATE).unwrap()
}

#[test]
fn test_play_auto_assigns_valid_channel() {
    let (mut engine, mut pump) = setup();
    let sound = short_tone();
    let channel = engine.play(&sound, 0.0, None).unwrap();
    assert!((1..=8).contains(&channel));

    pump.render(2048);
    let latency = engine.current_latency();
    let bound = 2.0 * 2048.0 / f64::from(RATE) + 0.05;
    assert!(latency > 0.0 && latency <= bound, "latency {latency}");
}

#[test]
fn test_play_rejects_rate_mismatch() {
    let (mut engine, _pump) = setup();
    let wrong = canonicalize(&tone(Freq::hz(440.0), Time::ms(50.0), 48000), 48000);
    let err = engine.play(&wrong, 0.0, None).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Sound(SoundError::RateMismatch {
            found: 48000,
            required: RATE
        })
    ));
}

#[test]
fn test_play_bad_channel() {
    let (mut engine, _pump) = setup();
    let sound = short_tone();
    assert!(matches!(
        engine.play(&sound, 0.0, Some(0)),
        Err(EngineError::BadChannel(0))
    ));
    assert!(matches!(
        engine.play(&sound, 0.0, Some(9)),
        Err(EngineError::BadChannel(9))
    ));
}

#[test]
fn test_asap_playback_mixes_immediately() {
    let (mut engine, mut pump) = setup();
    let sound = const_sound(100, 8000);
    engine.play(&sound, 0.0, Some(1)).unwrap();

    let out = pump.render(2048);
    let expected = fixed_to_f32(8000);
    for k in 0..100 {
        assert!((out[k * 2] - expected).abs() < 1e-6, "frame {k}");
    }
    assert!(out[200..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_scheduled_playback_waits() {
    let (mut engine, mut pump) = setup();
    let sound = const_sound(10, 8000);
    // One buffer is 2048/44100 ≈ 46.4 ms; schedule inside the second one.
    engine.play(&sound, 0.06, Some(1)).unwrap();

    let first = pump.render(2048);
    assert!(first.iter().all(|&s| s == 0.0), "played too early");

    let second = pump.render(2048);
    assert!(second.iter().any(|&s| s != 0.0), "never played");
}

#[test]
fn test_late_when_sets_warning() {
    let (mut engine, mut pump) = setup();
    pump.render(2048); // establish clock and latency
    let sound = short_tone();
    // now ≈ 46 ms, latency > 0, so 1 ms is unreachable.
    engine.play(&sound, 0.001, Some(1)).unwrap();
    let warning = engine.take_warning().expect("late play should warn");
    assert!(warning.contains("latency"), "unexpected warning: {warning}");
    assert!(engine.take_warning().is_none(), "warning must be one-shot");
}

#[test]
fn test_callback_lateness_is_warned_once() {
    let (mut engine, mut pump) = setup();
    pump.render(2048); // stream clock now at ~46 ms
    let sound = const_sound(10, 1000);
    // Scheduled in the past relative to the next buffer: mixed late.
    engine.play(&sound, 0.01, Some(1)).unwrap();
    engine.take_warning(); // clear the control-side horizon warning
    pump.render(2048);

    let warning = engine.take_warning().expect("lateness should surface");
    assert!(warning.contains("behind"), "unexpected warning: {warning}");
    assert!(engine.take_warning().is_none());
}

#[test]
fn test_auto_assign_prefers_idle_channel() {
    let (mut engine, mut pump) = setup();
    let long = const_sound(44100, 4000); // one full second
    let first = engine.play(&long, 0.0, None).unwrap();
    pump.render(2048);

    // The first channel is busy for ~1 s; a new sound must land elsewhere.
    let second = engine.play(&short_tone(), 0.0, None).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_no_channels_when_all_paused() {
    let (mut engine, _pump) = setup();
    engine.pause(None, false).unwrap();
    let err = engine.play(&short_tone(), 0.0, None).unwrap_err();
    assert!(matches!(err, EngineError::NoChannels));

    engine.resume(None, false).unwrap();
    assert!(engine.play(&short_tone(), 0.0, None).is_ok());
}

#[test]
fn test_explicit_channel_queue_full() {
    let backend = MockBackend::new();
    let _pump = backend.pump();
    let mut engine = AudioEngine::setup_with_backend(
        &backend,
        EngineConfig {
            queue_size: 2,
            ..test_config()
        },
    )
    .unwrap();

    let sound = short_tone();
    engine.play(&sound, 0.0, Some(1)).unwrap();
    engine.play(&sound, 0.0, Some(1)).unwrap();
    assert!(matches!(
        engine.play(&sound, 0.0, Some(1)),
        Err(EngineError::QueueFull)
    ));
}

#[test]
fn test_pause_and_resume_channel() {
    let (mut engine, mut pump) = setup();
    let sound = const_sound(100, 8000);
    engine.play(&sound, 0.0, Some(2)).unwrap();
    engine.pause(Some(2), false).unwrap();

    let out = pump.render(2048);
    assert!(out.iter().all(|&s| s == 0.0), "paused channel played");

    engine.resume(Some(2), false).unwrap();
    let out = pump.render(2048);
    assert!(out.iter().any(|&s| s != 0.0), "resumed channel silent");
}

#[test]
fn test_stop_releases_queued_sounds() {
    let (mut engine, mut pump) = setup();
    engine.play(&const_sound(4410, 8000), 0.0, Some(1)).unwrap();
    engine.play(&const_sound(4410, 4000), 0.0, Some(1)).unwrap();
    engine.stop(Some(1)).unwrap();

    let out = pump.render(2048);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn test_play_next_refill_cycle() {
    let (mut engine, mut pump) = setup();
    let unit = const_sound(2048, 5000);

    engine.play_next(&unit, 1).unwrap();
    engine.play_next(&unit, 1).unwrap();
    // Both slots taken: the caller must wait for a callback.
    assert!(matches!(
        engine.play_next(&unit, 1),
        Err(EngineError::QueueFull)
    ));

    let out = pump.render(2048);
    assert!(out.iter().all(|&s| (s - fixed_to_f32(5000)).abs() < 1e-6));

    // One slot drained; the refill goes through now.
    engine.play_next(&unit, 1).unwrap();
}

#[test]
fn test_play_next_splices_out_paused_stream() {
    let (mut engine, mut pump) = setup();
    engine.play_next(&const_sound(8192, 1000), 1).unwrap();
    pump.render(1024); // start mixing the first buffer
    engine.pause(Some(1), true).unwrap();
    pump.render(1024); // pause takes effect

    engine.play_next(&const_sound(1024, 7000), 1).unwrap();
    let out = pump.render(1024);
    // The interrupted buffer is gone; the new one plays and the channel is
    // unpaused.
    assert!(
        out.iter().all(|&s| (s - fixed_to_f32(7000)).abs() < 1e-6),
        "expected spliced-in stream data"
    );
}

#[test]
fn test_stream_clock_advances_with_pump() {
    let (engine, mut pump) = setup();
    assert_eq!(engine.now(), 0.0);
    pump.render(2048);
    pump.render(2048);
    let expected = 2.0 * 2048.0 / f64::from(RATE);
    assert!((engine.now() - expected).abs() < 1e-9);
}

#[test]
fn test_no_error_on_healthy_stream() {
    let (engine, mut pump) = setup();
    pump.render(2048);
    assert!(engine.take_error().is_none());
}

#[test]
fn test_setup_rejects_zero_channels() {
    let backend = MockBackend::new();
    let result = AudioEngine::setup_with_backend(
        &backend,
        EngineConfig {
            num_channels: 0,
            ..test_config()
        },
    );
    assert!(matches!(result, Err(EngineError::Device(_))));
}

#[test]
fn test_close_stops_engine() {
    let (engine, mut pump) = setup();
    engine.close();
    // The callback is still registered with the mock, but a real stream
    // would be torn down; rendering after close must not panic.
    pump.render(128);
}
