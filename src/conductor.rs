// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The conductor replays a song against a registry of performers, granting
//! turns in sequence order and enforcing the overall time budget.

use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};
use snafu::Snafu;

use crate::note::{NoteLength, Pitch};
use crate::output::SharedSink;
use crate::performer::{Baton, Performer, TurnError};
use crate::song::{BellNote, Song};

/// A song is allotted the sum of its note lengths times this multiplier
/// before the watchdog declares the run stuck.
pub const ALLOTTED_TIME_MULTIPLIER: u32 = 2;

#[derive(Debug, Snafu)]
pub enum PlayError {
    /// A validated song never contains invalid notes; finding one while
    /// assembling the choir means the input bypassed validation.
    #[snafu(display("{} is not a playable note", note))]
    InvalidNote { note: BellNote },
    /// The conductor granted a turn out of sequence. This is a programming
    /// logic error and aborts the run rather than corrupt the ordering.
    #[snafu(display("turn granted to {} before the previous turn finished", pitch))]
    TurnProtocol { pitch: Pitch },
    /// The run took more than its allotted time, which is indistinguishable
    /// from a hang and must not block forever.
    #[snafu(display("song exceeded its allotted time of {:?}", allotted))]
    AllottedTimeExceeded { allotted: Duration },
    #[snafu(display("no performer plays {}", pitch))]
    MissingPerformer { pitch: Pitch },
    #[snafu(display("could not spawn the conductor thread: {}", source))]
    Spawn { source: std::io::Error },
    #[snafu(display("the conductor thread panicked"))]
    ConductorPanicked,
    #[snafu(display("the audio sink failed to shut down: {}", source))]
    SinkShutdown { source: std::io::Error },
}

/// Coordinates the playback of a song by a choir of performer threads,
/// one per distinct pitch.
///
/// The conductor owns the registry mapping each pitch to its performer. It
/// replays the song on a dedicated thread, granting every performer its
/// turn in sequence order and blocking until the turn completes, so notes
/// sound strictly one after another. Intended use is `new`, `run`, `stop`.
pub struct Conductor {
    performers: HashMap<Pitch, Performer>,
    song: Song,
    sink: SharedSink,
    thread: Option<thread::JoinHandle<Result<(), PlayError>>>,
}

impl Conductor {
    /// Assemble the choir for a song: walk the sequence in order, create a
    /// performer the first time each pitch appears, and enqueue every note
    /// length with its performer. The registry is complete before any turn
    /// is taken.
    pub fn new(song: Song, sink: SharedSink) -> Result<Conductor, PlayError> {
        let mut performers: HashMap<Pitch, Performer> = HashMap::new();
        for note in song.notes() {
            if note.pitch == Pitch::Invalid || note.length == NoteLength::Invalid {
                return Err(PlayError::InvalidNote { note: *note });
            }
            let count = performers.len();
            let performer = performers
                .entry(note.pitch)
                .or_insert_with(|| Performer::new(count + 1, note.pitch, sink.clone()));
            performer.enqueue(note.length);
        }

        info!(
            "choir assembled: {} performers for {} notes",
            performers.len(),
            song.len()
        );

        Ok(Conductor {
            performers,
            song,
            sink,
            thread: None,
        })
    }

    /// Start every performer, then start replaying the song on the
    /// conductor's own thread. Must be called exactly once, followed by
    /// [`Conductor::stop`].
    pub fn run(&mut self) -> Result<(), PlayError> {
        assert!(self.thread.is_none(), "the conductor is already running");

        for performer in self.performers.values_mut() {
            performer.start();
        }

        let song = self.song.clone();
        let batons: HashMap<Pitch, Baton> = self
            .performers
            .iter()
            .map(|(pitch, performer)| (*pitch, performer.baton()))
            .collect();

        let handle = thread::Builder::new()
            .name("conductor".to_owned())
            .spawn(move || perform(song, batons))
            .map_err(|source| PlayError::Spawn { source })?;
        self.thread = Some(handle);
        Ok(())
    }

    /// Wait for the replay to finish, shut down every performer, and
    /// release the audio sink. Returns the verdict of the run; best-effort
    /// cleanup failures are reported but never mask it.
    pub fn stop(&mut self) -> Result<(), PlayError> {
        let verdict = match self.thread.take() {
            Some(handle) => match handle.join() {
                Ok(verdict) => verdict,
                Err(_) => {
                    error!("the conductor thread panicked before finishing the song");
                    Err(PlayError::ConductorPanicked)
                }
            },
            None => Ok(()),
        };

        for performer in self.performers.values_mut() {
            performer.stop();
        }

        let drained = self
            .sink
            .lock()
            .expect("audio sink lock poisoned")
            .finish();
        match (verdict, drained) {
            (Ok(()), Err(source)) => Err(PlayError::SinkShutdown { source }),
            (verdict, Err(source)) => {
                error!("the audio sink failed to shut down: {}", source);
                verdict
            }
            (verdict, Ok(())) => verdict,
        }
    }
}

/// The replay loop running on the conductor thread: iterate the song in
/// order and grant each note's performer exactly one turn, aborting when
/// the elapsed time exceeds the allotted budget.
fn perform(song: Song, batons: HashMap<Pitch, Baton>) -> Result<(), PlayError> {
    let allotted = song.total_time() * ALLOTTED_TIME_MULTIPLIER;
    let start = Instant::now();
    let deadline = start + allotted;

    info!(
        "playing song ({} notes, allotted {:?})...",
        song.len(),
        allotted
    );

    for note in song.notes() {
        if start.elapsed() > allotted {
            error!("song exceeded its allotted time, aborting the run");
            return Err(PlayError::AllottedTimeExceeded { allotted });
        }

        let baton = batons
            .get(&note.pitch)
            .ok_or(PlayError::MissingPerformer { pitch: note.pitch })?;
        match baton.take_turn(deadline) {
            Ok(()) => {}
            Err(TurnError::AlreadyPending { pitch }) => {
                return Err(PlayError::TurnProtocol { pitch })
            }
            Err(TurnError::TimedOut { pitch }) => {
                error!("{} never finished its turn, aborting the run", pitch);
                return Err(PlayError::AllottedTimeExceeded { allotted });
            }
        }
    }

    info!("song over");
    Ok(())
}
