// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of the pitches and note lengths a bell choir can play.

use std::fmt;

use crate::tone;

/// A pitch on the choir's 13-tone scale, where
/// - 'middle A' (440Hz) is written `A4`, and the A an octave higher is `A5`,
/// - sharp notes append `S` to the plain note, so middle A sharp is `A4S`,
/// - flat notes are written as the sharp of the note below, so for B flat use `A4S`,
/// - a rest (nothing is played) is written `REST`.
///
/// The scale also carries an `Invalid` sentinel so that parsing unplayable
/// input has somewhere to go; a validated song never contains it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Pitch {
    Rest,
    A4,
    ASharp4,
    B4,
    C4,
    CSharp4,
    D4,
    DSharp4,
    E4,
    F4,
    FSharp4,
    G4,
    GSharp4,
    A5,
    Invalid,
}

impl Pitch {
    /// How many half-tone steps this pitch lies above A4 on the scale,
    /// or `None` for rests and the invalid sentinel.
    pub fn half_steps_above_a4(self) -> Option<i32> {
        match self {
            Pitch::Rest | Pitch::Invalid => None,
            Pitch::A4 => Some(0),
            Pitch::ASharp4 => Some(1),
            Pitch::B4 => Some(2),
            Pitch::C4 => Some(3),
            Pitch::CSharp4 => Some(4),
            Pitch::D4 => Some(5),
            Pitch::DSharp4 => Some(6),
            Pitch::E4 => Some(7),
            Pitch::F4 => Some(8),
            Pitch::FSharp4 => Some(9),
            Pitch::G4 => Some(10),
            Pitch::GSharp4 => Some(11),
            Pitch::A5 => Some(12),
        }
    }

    /// The frequency of this pitch in twelve-tone equal temperament,
    /// relative to A4 at 440 Hz. Rests and the invalid sentinel make no sound.
    ///
    /// # Examples
    ///
    /// ```
    /// use bellringer::note::Pitch;
    ///
    /// assert_eq!(Pitch::A4.frequency(), Some(440.0));
    /// assert_eq!(Pitch::A5.frequency(), Some(880.0));
    /// assert_eq!(Pitch::Rest.frequency(), None);
    /// ```
    pub fn frequency(self) -> Option<f64> {
        let half_steps = self.half_steps_above_a4()?;
        Some(tone::FREQUENCY_A_HZ * 2.0f64.powf(half_steps as f64 / 12.0))
    }

    /// Parse a pitch symbol as written in song files (case-insensitive).
    /// Anything outside the scale parses as [`Pitch::Invalid`].
    ///
    /// # Examples
    ///
    /// ```
    /// use bellringer::note::Pitch;
    ///
    /// assert_eq!(Pitch::parse("C4"), Pitch::C4);
    /// assert_eq!(Pitch::parse("a4s"), Pitch::ASharp4);
    /// assert_eq!(Pitch::parse("H3"), Pitch::Invalid);
    /// ```
    pub fn parse(symbol: &str) -> Pitch {
        match symbol.trim().to_ascii_uppercase().as_str() {
            "REST" => Pitch::Rest,
            "A4" => Pitch::A4,
            "A4S" => Pitch::ASharp4,
            "B4" => Pitch::B4,
            "C4" => Pitch::C4,
            "C4S" => Pitch::CSharp4,
            "D4" => Pitch::D4,
            "D4S" => Pitch::DSharp4,
            "E4" => Pitch::E4,
            "F4" => Pitch::F4,
            "F4S" => Pitch::FSharp4,
            "G4" => Pitch::G4,
            "G4S" => Pitch::GSharp4,
            "A5" => Pitch::A5,
            _ => Pitch::Invalid,
        }
    }

    /// The symbol this pitch is written as in song files.
    pub fn symbol(self) -> &'static str {
        match self {
            Pitch::Rest => "REST",
            Pitch::A4 => "A4",
            Pitch::ASharp4 => "A4S",
            Pitch::B4 => "B4",
            Pitch::C4 => "C4",
            Pitch::CSharp4 => "C4S",
            Pitch::D4 => "D4",
            Pitch::DSharp4 => "D4S",
            Pitch::E4 => "E4",
            Pitch::F4 => "F4",
            Pitch::FSharp4 => "F4S",
            Pitch::G4 => "G4",
            Pitch::GSharp4 => "G4S",
            Pitch::A5 => "A5",
            Pitch::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The length of a note as a fraction of a measure. Songs are assumed to be
/// written in 4/4 time, so a whole note takes up an entire measure.
///
/// In song files the common lengths are written as the reciprocal integers
/// 1, 2, 4 and 8. The mapping from length to playback time is fixed:
/// every valid length has exactly one time value, and the `Invalid`
/// sentinel takes no time at all.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NoteLength {
    Whole,
    Half,
    Quarter,
    Eighth,
    Invalid,
}

impl NoteLength {
    /// The fraction of a full measure this length occupies.
    pub fn fraction(self) -> f32 {
        match self {
            NoteLength::Whole => 1.0,
            NoteLength::Half => 0.5,
            NoteLength::Quarter => 0.25,
            NoteLength::Eighth => 0.125,
            NoteLength::Invalid => 0.0,
        }
    }

    /// Playback time in milliseconds at the fixed measure length.
    ///
    /// # Examples
    ///
    /// ```
    /// use bellringer::note::NoteLength;
    ///
    /// assert_eq!(NoteLength::Whole.time_ms(), 1000);
    /// assert_eq!(NoteLength::Eighth.time_ms(), 125);
    /// assert_eq!(NoteLength::Invalid.time_ms(), 0);
    /// ```
    pub fn time_ms(self) -> u64 {
        (self.fraction() * (tone::MEASURE_LENGTH_SEC * 1000) as f32) as u64
    }

    /// Parse a length as written in song files: the reciprocal of the
    /// fraction of a measure. Anything else parses as [`NoteLength::Invalid`].
    pub fn parse(symbol: &str) -> NoteLength {
        match symbol.trim().parse::<u32>() {
            Ok(1) => NoteLength::Whole,
            Ok(2) => NoteLength::Half,
            Ok(4) => NoteLength::Quarter,
            Ok(8) => NoteLength::Eighth,
            _ => NoteLength::Invalid,
        }
    }
}

impl fmt::Display for NoteLength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NoteLength::Whole => "whole",
            NoteLength::Half => "half",
            NoteLength::Quarter => "quarter",
            NoteLength::Eighth => "eighth",
            NoteLength::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pitch_symbols_round_trip() {
        let pitches = [
            Pitch::Rest,
            Pitch::A4,
            Pitch::ASharp4,
            Pitch::B4,
            Pitch::C4,
            Pitch::CSharp4,
            Pitch::D4,
            Pitch::DSharp4,
            Pitch::E4,
            Pitch::F4,
            Pitch::FSharp4,
            Pitch::G4,
            Pitch::GSharp4,
            Pitch::A5,
        ];
        for &pitch in &pitches {
            assert_eq!(Pitch::parse(pitch.symbol()), pitch);
        }
    }

    #[test]
    fn unknown_pitch_is_invalid() {
        assert_eq!(Pitch::parse("A6"), Pitch::Invalid);
        assert_eq!(Pitch::parse("do"), Pitch::Invalid);
        assert_eq!(Pitch::parse(""), Pitch::Invalid);
    }

    #[test]
    fn frequencies_follow_equal_temperament() {
        // One octave doubles the frequency.
        let a4 = Pitch::A4.frequency().unwrap();
        let a5 = Pitch::A5.frequency().unwrap();
        assert!((a5 - 2.0 * a4).abs() < 1e-9);

        // C4 sits three half steps above A4.
        let c4 = Pitch::C4.frequency().unwrap();
        let expected = 440.0 * 2.0f64.powf(3.0 / 12.0);
        assert!((c4 - expected).abs() < 1e-9);

        assert_eq!(Pitch::Rest.frequency(), None);
        assert_eq!(Pitch::Invalid.frequency(), None);
    }

    #[test]
    fn length_times_are_total() {
        assert_eq!(NoteLength::Whole.time_ms(), 1000);
        assert_eq!(NoteLength::Half.time_ms(), 500);
        assert_eq!(NoteLength::Quarter.time_ms(), 250);
        assert_eq!(NoteLength::Eighth.time_ms(), 125);
        assert_eq!(NoteLength::Invalid.time_ms(), 0);
    }

    #[test]
    fn length_parses_reciprocals() {
        assert_eq!(NoteLength::parse("1"), NoteLength::Whole);
        assert_eq!(NoteLength::parse("2"), NoteLength::Half);
        assert_eq!(NoteLength::parse("4"), NoteLength::Quarter);
        assert_eq!(NoteLength::parse("8"), NoteLength::Eighth);
        assert_eq!(NoteLength::parse("3"), NoteLength::Invalid);
        assert_eq!(NoteLength::parse("four"), NoteLength::Invalid);
    }
}
