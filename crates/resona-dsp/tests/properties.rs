//! Property-based tests for the combination and envelope primitives.
//!
//! Uses proptest to verify the algebraic invariants stimulus scripts rely
//! on: mix/mult commutativity and associativity, envelope sustain
//! preservation, and attenuation linearity.

use proptest::prelude::*;
use resona_core::{Sound, Time};
use resona_dsp::{attenuate, mix, mult, ramp};

const RATE: u32 = 44100;

fn sound_strategy(max_len: usize) -> impl Strategy<Value = Sound> {
    prop::collection::vec(-1.0f32..=1.0, 1..max_len)
        .prop_map(|v| Sound::from_mono(v, RATE))
}

fn assert_sounds_eq(a: &Sound, b: &Sound) {
    assert_eq!(a.nframes(), b.nframes());
    for (x, y) in a.channel_f32(0).iter().zip(b.channel_f32(0)) {
        assert!((x - y).abs() < 1e-5, "{x} != {y}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn mix_commutes(a in sound_strategy(256), b in sound_strategy(256)) {
        let ab = mix(&[&a, &b]).unwrap();
        let ba = mix(&[&b, &a]).unwrap();
        assert_sounds_eq(&ab, &ba);
    }

    #[test]
    fn mult_commutes(a in sound_strategy(256), b in sound_strategy(256)) {
        let ab = mult(&[&a, &b]).unwrap();
        let ba = mult(&[&b, &a]).unwrap();
        assert_sounds_eq(&ab, &ba);
    }

    #[test]
    fn mix_associates_on_equal_lengths(
        data in prop::collection::vec((-1.0f32..=1.0, -1.0f32..=1.0, -1.0f32..=1.0), 1..256)
    ) {
        let a = Sound::from_mono(data.iter().map(|t| t.0).collect(), RATE);
        let b = Sound::from_mono(data.iter().map(|t| t.1).collect(), RATE);
        let c = Sound::from_mono(data.iter().map(|t| t.2).collect(), RATE);

        let left = mix(&[&mix(&[&a, &b]).unwrap(), &c]).unwrap();
        let right = mix(&[&a, &mix(&[&b, &c]).unwrap()]).unwrap();
        assert_sounds_eq(&left, &right);
    }

    #[test]
    fn mult_associates_on_equal_lengths(
        data in prop::collection::vec((-1.0f32..=1.0, -1.0f32..=1.0, -1.0f32..=1.0), 1..256)
    ) {
        let a = Sound::from_mono(data.iter().map(|t| t.0).collect(), RATE);
        let b = Sound::from_mono(data.iter().map(|t| t.1).collect(), RATE);
        let c = Sound::from_mono(data.iter().map(|t| t.2).collect(), RATE);

        let left = mult(&[&mult(&[&a, &b]).unwrap(), &c]).unwrap();
        let right = mult(&[&a, &mult(&[&b, &c]).unwrap()]).unwrap();
        assert_sounds_eq(&left, &right);
    }

    #[test]
    fn ramp_preserves_sustain(v in prop::collection::vec(-1.0f32..=1.0, 600..2048)) {
        let s = Sound::from_mono(v, RATE);
        // 2 ms ramps leave a sustain region for any input of 600+ frames.
        let r = ramp(&s, Time::ms(2.0)).unwrap();
        let ramp_frames = Time::ms(2.0).frames(RATE);
        let orig = s.channel_f32(0);
        let out = r.channel_f32(0);
        for k in ramp_frames..(s.nframes() - ramp_frames) {
            prop_assert_eq!(out[k], orig[k]);
        }
    }

    #[test]
    fn attenuate_scales_linearly(
        v in prop::collection::vec(-1.0f32..=1.0, 32..512),
        db in 0.0f32..60.0,
    ) {
        let s = Sound::from_mono(v, RATE);
        prop_assume!(s.rms() > 1e-3);

        let unit = attenuate(&s, 0.0);
        let down = attenuate(&s, db);
        let expected = 10.0f32.powf(-db / 20.0);
        let ratio = down.rms() / unit.rms();
        prop_assert!(
            (ratio - expected).abs() < 2e-3,
            "ratio {} != expected {}",
            ratio,
            expected
        );
    }
}
