// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The textual song format: one note per line, written as a pitch symbol
//! followed by a note length, e.g. `C4 4` for a quarter note on the C bell.

use std::path::Path;

use snafu::Snafu;

use crate::note::{NoteLength, Pitch};
use crate::song::{BellNote, Song};

#[derive(Debug, Snafu)]
pub enum ParseError {
    #[snafu(display("line {}: expected `<pitch> <length>`, found {:?}", line, text))]
    MalformedLine { line: usize, text: String },
    #[snafu(display("line {}: unknown pitch {:?}", line, symbol))]
    UnknownPitch { line: usize, symbol: String },
    #[snafu(display("line {}: unknown note length {:?}", line, symbol))]
    UnknownLength { line: usize, symbol: String },
    #[snafu(display("the song contains no notes"))]
    NoNotes,
    #[snafu(display("could not read the song file: {}", source))]
    Io { source: std::io::Error },
}

/// Parse a whole song. Every line must hold exactly one valid note;
/// a single malformed line rejects the entire song, so the choir never
/// starts on partially valid input.
pub fn parse_song(input: &str) -> Result<Song, ParseError> {
    let mut notes = Vec::new();
    for (number, raw) in input.lines().enumerate() {
        let line = number + 1;
        let text = raw.trim();

        let mut tokens = text.split_whitespace();
        let (pitch_sym, length_sym) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(pitch), Some(length), None) => (pitch, length),
            _ => {
                return Err(ParseError::MalformedLine {
                    line,
                    text: text.to_owned(),
                })
            }
        };

        let pitch = Pitch::parse(pitch_sym);
        if pitch == Pitch::Invalid {
            return Err(ParseError::UnknownPitch {
                line,
                symbol: pitch_sym.to_owned(),
            });
        }

        let length = NoteLength::parse(length_sym);
        if length == NoteLength::Invalid {
            return Err(ParseError::UnknownLength {
                line,
                symbol: length_sym.to_owned(),
            });
        }

        notes.push(BellNote { pitch, length });
    }

    Song::new(notes).map_err(|_| ParseError::NoNotes)
}

/// Read and parse a song file.
pub fn read_song_file<P: AsRef<Path>>(path: P) -> Result<Song, ParseError> {
    let input = std::fs::read_to_string(path).map_err(|source| ParseError::Io { source })?;
    parse_song(&input)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_valid_song() {
        let song = parse_song("C4 4\nE4 4\nC4 2\n").unwrap();
        assert_eq!(song.len(), 3);
        assert_eq!(
            song.notes()[0],
            BellNote {
                pitch: Pitch::C4,
                length: NoteLength::Quarter,
            }
        );
        assert_eq!(
            song.notes()[2],
            BellNote {
                pitch: Pitch::C4,
                length: NoteLength::Half,
            }
        );
    }

    #[test]
    fn accepts_rests_and_mixed_case() {
        let song = parse_song("rest 8\nc4s 1").unwrap();
        assert_eq!(song.notes()[0].pitch, Pitch::Rest);
        assert_eq!(song.notes()[1].pitch, Pitch::CSharp4);
        assert_eq!(song.notes()[1].length, NoteLength::Whole);
    }

    #[test]
    fn rejects_unknown_pitches() {
        match parse_song("C4 4\nX9 4") {
            Err(ParseError::UnknownPitch { line: 2, symbol }) => assert_eq!(symbol, "X9"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_lengths() {
        match parse_song("C4 3") {
            Err(ParseError::UnknownLength { line: 1, symbol }) => assert_eq!(symbol, "3"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse_song("C4"),
            Err(ParseError::MalformedLine { line: 1, .. })
        ));
        assert!(matches!(
            parse_song("C4 4 extra"),
            Err(ParseError::MalformedLine { line: 1, .. })
        ));
        // A blank line is not a note either.
        assert!(matches!(
            parse_song("C4 4\n\nE4 4"),
            Err(ParseError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn rejects_songs_without_notes() {
        assert!(matches!(parse_song(""), Err(ParseError::NoNotes)));
    }

    #[test]
    fn missing_files_are_io_errors() {
        assert!(matches!(
            read_song_file("does/not/exist.txt"),
            Err(ParseError::Io { .. })
        ));
    }
}
