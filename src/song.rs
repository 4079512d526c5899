// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A song as an ordered sequence of bell notes.

use std::fmt;
use std::time::Duration;

use snafu::Snafu;

use crate::note::{NoteLength, Pitch};

/// One note of a song: which bell is struck and for how long it rings.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BellNote {
    pub pitch: Pitch,
    pub length: NoteLength,
}

impl fmt::Display for BellNote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.pitch, self.length)
    }
}

#[derive(Debug, Snafu)]
pub enum SongError {
    #[snafu(display("a song must contain at least one note"))]
    Empty,
}

/// An ordered, immutable sequence of bell notes. Insertion order is
/// performance order, and a song is never empty.
#[derive(Clone, Debug)]
pub struct Song {
    notes: Vec<BellNote>,
}

impl Song {
    pub fn new(notes: Vec<BellNote>) -> Result<Song, SongError> {
        if notes.is_empty() {
            return Err(SongError::Empty);
        }
        Ok(Song { notes })
    }

    pub fn notes(&self) -> &[BellNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// The expected playback time of the whole song, the sum of all its
    /// note lengths. The watchdog budget is derived from this.
    pub fn total_time(&self) -> Duration {
        let ms: u64 = self.notes.iter().map(|note| note.length.time_ms()).sum();
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_songs_are_rejected() {
        assert!(Song::new(Vec::new()).is_err());
    }

    #[test]
    fn total_time_sums_note_lengths() {
        let song = Song::new(vec![
            BellNote {
                pitch: Pitch::C4,
                length: NoteLength::Quarter,
            },
            BellNote {
                pitch: Pitch::E4,
                length: NoteLength::Quarter,
            },
            BellNote {
                pitch: Pitch::C4,
                length: NoteLength::Half,
            },
        ])
        .unwrap();
        assert_eq!(song.len(), 3);
        assert_eq!(song.total_time(), Duration::from_millis(1000));
    }
}
