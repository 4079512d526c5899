// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Sine wave synthesis for the bells' voices.

use crate::note::Pitch;

/// The number of audio samples per second during playback (~48KHz).
pub const SAMPLE_RATE: usize = 48 * 1024;

/// Fixed measure length in seconds; a whole note fills one measure.
pub const MEASURE_LENGTH_SEC: usize = 1;

/// The standard pitch frequency for A4.
pub const FREQUENCY_A_HZ: f64 = 440.0;

/// How many samples of silence are written after every note so that
/// repeated strikes of the same bell remain distinguishable.
pub const REST_GAP_SAMPLES: usize = 50;

/// Peak amplitude of a synthesized voice in signed 8-bit samples.
const MAX_VOLUME: f64 = 127.0;

/// Synthesize one full measure of this pitch's voice as signed 8-bit mono
/// samples (stored in their two's complement byte representation). Rests
/// and the invalid sentinel yield silence.
pub fn sine_sample(pitch: Pitch) -> Vec<u8> {
    let mut sample = vec![0u8; MEASURE_LENGTH_SEC * SAMPLE_RATE];
    if let Some(freq) = pitch.frequency() {
        // Circumference of a circle divided by the number of samples.
        let step_alpha = 2.0 * std::f64::consts::PI / SAMPLE_RATE as f64;
        let sin_step = freq * step_alpha;
        for (i, byte) in sample.iter_mut().enumerate() {
            *byte = ((i as f64 * sin_step).sin() * MAX_VOLUME) as i8 as u8;
        }
    }
    sample
}

/// How many bytes of a measure sample cover the given playback time.
/// Times longer than a measure are truncated to the measure.
pub fn sample_len(time_ms: u64) -> usize {
    let ms = time_ms.min((MEASURE_LENGTH_SEC * 1000) as u64);
    (SAMPLE_RATE as u64 * ms / 1000) as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn samples_cover_one_measure() {
        assert_eq!(sine_sample(Pitch::A4).len(), SAMPLE_RATE * MEASURE_LENGTH_SEC);
    }

    #[test]
    fn rests_are_silent() {
        assert!(sine_sample(Pitch::Rest).iter().all(|&b| b == 0));
        assert!(sine_sample(Pitch::Invalid).iter().all(|&b| b == 0));
    }

    #[test]
    fn voices_make_sound() {
        assert!(sine_sample(Pitch::C4).iter().any(|&b| b != 0));
    }

    #[test]
    fn sample_len_matches_time() {
        assert_eq!(sample_len(1000), SAMPLE_RATE);
        assert_eq!(sample_len(500), SAMPLE_RATE / 2);
        assert_eq!(sample_len(0), 0);
        // Longer than a measure is clamped.
        assert_eq!(sample_len(5000), SAMPLE_RATE);
    }
}
