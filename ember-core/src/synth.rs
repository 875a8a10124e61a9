// synth.rs — the waveform generator catalog.
//
// Eight pure functions of phase t in [0,1). The noise instrument is seeded
// from the phase bits so the same phase always produces the same sample.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instrument {
    Triangle = 0,
    TiltedSaw = 1,
    Saw = 2,
    Square = 3,
    Pulse = 4,
    Organ = 5,
    Noise = 6,
    Phaser = 7,
}

impl Instrument {
    pub fn from_u8(v: u8) -> Self {
        match v & 0x07 {
            0 => Instrument::Triangle,
            1 => Instrument::TiltedSaw,
            2 => Instrument::Saw,
            3 => Instrument::Square,
            4 => Instrument::Pulse,
            5 => Instrument::Organ,
            6 => Instrument::Noise,
            7 => Instrument::Phaser,
            _ => unreachable!(),
        }
    }
}

/// One amplitude sample in [-1, 1] for `instrument` at `phase`.
pub fn waveform(instrument: u8, phase: f32) -> f32 {
    let t = fract(phase);
    match instrument & 0x07 {
        0 => triangle(t),
        1 => tilted_saw(t),
        2 => 2.0 * t - 1.0,
        3 => {
            if t < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        4 => {
            if t < 1.0 / 3.0 {
                1.0
            } else {
                -1.0
            }
        }
        5 => 0.5 * (triangle(t) + triangle(fract(2.0 * t))),
        6 => noise(t),
        7 => 0.5 * (triangle(t) + triangle(fract(t * 127.0 / 128.0))),
        _ => unreachable!(),
    }
}

fn fract(t: f32) -> f32 {
    t - libm::floorf(t)
}

fn triangle(t: f32) -> f32 {
    libm::fabsf(2.0 * t - 1.0) - 0.5
}

fn tilted_saw(t: f32) -> f32 {
    let duty = 0.875;
    if t < duty {
        t / duty - 0.5
    } else {
        (1.0 - t) / (1.0 - duty) - 0.5
    }
}

fn noise(t: f32) -> f32 {
    // Phase-seeded hash so playback is reproducible across runs.
    let mut h = (t * 16384.0) as u32;
    h = h.wrapping_mul(0x9e37_79b9);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    (h as f32 / u32::MAX as f32) * 2.0 - 1.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_triangle_endpoints() {
        assert!((waveform(0, 0.0) - 0.5).abs() < EPS);
        assert!((waveform(0, 0.5) + 0.5).abs() < EPS);
        assert!((waveform(0, 0.25)).abs() < EPS);
    }

    #[test]
    fn test_saw_is_linear_ramp() {
        assert!((waveform(2, 0.0) + 1.0).abs() < EPS);
        assert!((waveform(2, 0.5)).abs() < EPS);
        assert!((waveform(2, 0.75) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_square_and_pulse_duty() {
        assert!((waveform(3, 0.25) - 1.0).abs() < EPS);
        assert!((waveform(3, 0.75) + 1.0).abs() < EPS);
        assert!((waveform(4, 0.1) - 1.0).abs() < EPS);
        assert!((waveform(4, 0.5) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_tilted_saw_peak_position() {
        // The peak sits at the duty point, not at mid-cycle.
        assert!((waveform(1, 0.875) - 0.5).abs() < EPS);
        assert!(waveform(1, 0.5) > waveform(0, 0.5));
    }

    #[test]
    fn test_phase_wraps() {
        for inst in 0..8u8 {
            assert!(
                (waveform(inst, 0.25) - waveform(inst, 1.25)).abs() < EPS,
                "instrument {} should be periodic",
                inst
            );
        }
    }

    #[test]
    fn test_all_instruments_stay_in_range() {
        for inst in 0..8u8 {
            for i in 0..256 {
                let t = i as f32 / 256.0;
                let v = waveform(inst, t);
                assert!(
                    (-1.0..=1.0).contains(&v),
                    "instrument {} out of range at t={}: {}",
                    inst,
                    t,
                    v
                );
            }
        }
    }

    #[test]
    fn test_noise_is_deterministic() {
        for i in 0..64 {
            let t = i as f32 / 64.0;
            assert_eq!(waveform(6, t), waveform(6, t));
        }
    }

    #[test]
    fn test_noise_varies_with_phase() {
        let a = waveform(6, 0.1);
        let b = waveform(6, 0.3);
        let c = waveform(6, 0.7);
        assert!(a != b || b != c, "noise should not be constant");
    }

    #[test]
    fn test_instrument_from_u8_masks() {
        assert_eq!(Instrument::from_u8(6), Instrument::Noise);
        assert_eq!(Instrument::from_u8(8), Instrument::Triangle);
        assert_eq!(Instrument::from_u8(15), Instrument::Phaser);
    }
}
