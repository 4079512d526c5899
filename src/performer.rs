// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A performer owns one bell of the choir and all occurrences of its pitch.
//!
//! Each performer runs a dedicated worker thread that strictly alternates
//! between idling and rendering: it suspends on a condition variable until
//! the conductor grants it a turn, renders exactly one queued note length,
//! clears the turn flag and wakes the conductor again. The turn flag, the
//! pending queue and the running flag all live under one mutex, so granting
//! a turn and consuming it are atomic from either side's perspective.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use log::{debug, error, warn};
use snafu::Snafu;

use crate::note::{NoteLength, Pitch};
use crate::output::SharedSink;
use crate::song::BellNote;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum TurnError {
    /// The conductor tried to grant a second turn before the first one was
    /// consumed. This is a sequencing bug, never a recoverable condition.
    #[snafu(display("{} was granted a turn before completing the previous one", pitch))]
    AlreadyPending { pitch: Pitch },
    /// The turn was not completed before the watchdog deadline.
    #[snafu(display("{} did not complete its turn before the deadline", pitch))]
    TimedOut { pitch: Pitch },
}

struct State {
    /// Whether this performer currently holds an unconsumed turn.
    my_turn: bool,
    /// Cleared by `stop` to shut the worker down cooperatively.
    running: bool,
    /// Note lengths still to be rendered, in performance order.
    pending: VecDeque<NoteLength>,
}

struct Shared {
    index: usize,
    pitch: Pitch,
    state: Mutex<State>,
    turn: Condvar,
    sink: SharedSink,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<State> {
        self.state.lock().expect("performer state lock poisoned")
    }

    fn take_turn(&self, deadline: Instant) -> Result<(), TurnError> {
        let mut state = self.lock_state();
        if state.my_turn {
            return Err(TurnError::AlreadyPending { pitch: self.pitch });
        }
        state.my_turn = true;
        self.turn.notify_all();

        // Wait for the worker to finish rendering. The wait is bounded by
        // the watchdog deadline so a stalled render cannot block forever.
        while state.my_turn {
            let now = Instant::now();
            if now >= deadline {
                return Err(TurnError::TimedOut { pitch: self.pitch });
            }
            let (guard, _) = self
                .turn
                .wait_timeout(state, deadline - now)
                .expect("performer state lock poisoned");
            state = guard;
        }
        Ok(())
    }

    fn worker_loop(&self) {
        loop {
            let length = {
                let mut state = self.lock_state();
                while state.running && !state.my_turn {
                    state = self.turn.wait(state).expect("performer state lock poisoned");
                }
                if !state.running {
                    return;
                }
                state.pending.pop_front()
            };

            // The turn flag stays set while rendering, which is what lets a
            // misdirected second grant be detected instead of queued.
            match length {
                Some(length) => {
                    let note = BellNote {
                        pitch: self.pitch,
                        length,
                    };
                    debug!("performer {} plays {}", self.index, note);
                    let result = self
                        .sink
                        .lock()
                        .expect("audio sink lock poisoned")
                        .play(note);
                    if let Err(err) = result {
                        error!("performer {} could not sound {}: {}", self.index, note, err);
                    }
                }
                None => warn!(
                    "performer {} ({}) was granted a turn with nothing left to play",
                    self.index, self.pitch
                ),
            }

            let mut state = self.lock_state();
            state.my_turn = false;
            self.turn.notify_all();
        }
    }
}

/// A choir member owning a single pitch.
pub struct Performer {
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
}

/// Cheap cloneable handle for granting turns from the conductor thread.
#[derive(Clone)]
pub struct Baton {
    shared: Arc<Shared>,
}

impl Baton {
    /// See [`Performer::take_turn`].
    pub fn take_turn(&self, deadline: Instant) -> Result<(), TurnError> {
        self.shared.take_turn(deadline)
    }
}

impl Performer {
    /// Create an idle performer. `index` is the creation order within the
    /// choir and only serves as a human-readable identity in logs.
    pub fn new(index: usize, pitch: Pitch, sink: SharedSink) -> Performer {
        Performer {
            shared: Arc::new(Shared {
                index,
                pitch,
                state: Mutex::new(State {
                    my_turn: false,
                    running: false,
                    pending: VecDeque::new(),
                }),
                turn: Condvar::new(),
                sink,
            }),
            worker: None,
        }
    }

    pub fn pitch(&self) -> Pitch {
        self.shared.pitch
    }

    /// Append a note length to this performer's pending queue. Only the
    /// conductor enqueues, and always before the corresponding turn.
    pub fn enqueue(&self, length: NoteLength) {
        self.shared.lock_state().pending.push_back(length);
    }

    /// How many note lengths are still waiting to be rendered.
    pub fn pending(&self) -> usize {
        self.shared.lock_state().pending.len()
    }

    #[cfg(test)]
    pub(crate) fn pending_lengths(&self) -> Vec<NoteLength> {
        self.shared.lock_state().pending.iter().copied().collect()
    }

    /// Spawn the worker thread and mark the performer running. Called at
    /// most once; the worker idles until a turn is granted.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            warn!(
                "performer {} ({}) is already started",
                self.shared.index, self.shared.pitch
            );
            return;
        }

        self.shared.lock_state().running = true;

        let shared = self.shared.clone();
        let name = format!("performer-{}-{}", self.shared.index, self.shared.pitch);
        match thread::Builder::new()
            .name(name)
            .spawn(move || shared.worker_loop())
        {
            Ok(handle) => self.worker = Some(handle),
            Err(err) => {
                error!(
                    "performer {} ({}) could not spawn its worker: {}",
                    self.shared.index, self.shared.pitch, err
                );
                self.shared.lock_state().running = false;
            }
        }
    }

    /// Grant this performer its next turn and block until the note has been
    /// rendered. Called only by the conductor thread. Fails if a turn is
    /// already pending (a sequencing bug) or if the worker does not finish
    /// before `deadline` (the watchdog budget's end).
    pub fn take_turn(&self, deadline: Instant) -> Result<(), TurnError> {
        self.shared.take_turn(deadline)
    }

    /// A handle for granting turns without owning the performer.
    pub fn baton(&self) -> Baton {
        Baton {
            shared: self.shared.clone(),
        }
    }

    /// Whether the worker is supposed to be running.
    pub fn is_running(&self) -> bool {
        self.shared.lock_state().running
    }

    /// Shut the worker down and wait for it to terminate. A worker blocked
    /// waiting for a turn wakes up and exits promptly; one that is mid-render
    /// finishes the current note first. Safe to call repeatedly.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.lock_state();
            state.running = false;
            self.shared.turn.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!(
                    "performer {} ({}) panicked before shutting down",
                    self.shared.index, self.shared.pitch
                );
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::output::testing::{recording_sink, stalling_sink};
    use std::time::Duration;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[test]
    fn renders_one_queued_note_per_turn() {
        let (sink, played) = recording_sink();
        let mut performer = Performer::new(1, Pitch::C4, sink);
        performer.enqueue(NoteLength::Quarter);
        performer.enqueue(NoteLength::Half);
        performer.start();

        performer.take_turn(far_deadline()).unwrap();
        assert_eq!(
            played.lock().unwrap().as_slice(),
            &[BellNote {
                pitch: Pitch::C4,
                length: NoteLength::Quarter,
            }]
        );

        performer.take_turn(far_deadline()).unwrap();
        assert_eq!(played.lock().unwrap().len(), 2);
        assert_eq!(performer.pending(), 0);

        performer.stop();
        assert!(!performer.is_running());
    }

    #[test]
    fn empty_queue_still_unblocks_the_conductor() {
        let (sink, played) = recording_sink();
        let mut performer = Performer::new(1, Pitch::E4, sink);
        performer.start();

        // No note was enqueued, but the turn must still complete.
        performer.take_turn(far_deadline()).unwrap();
        assert!(played.lock().unwrap().is_empty());

        performer.stop();
    }

    #[test]
    fn second_turn_while_one_is_pending_is_rejected() {
        let (sink, _played) = stalling_sink(Duration::from_millis(400));
        let mut performer = Performer::new(1, Pitch::C4, sink);
        performer.enqueue(NoteLength::Quarter);
        performer.enqueue(NoteLength::Quarter);
        performer.start();

        let baton = performer.baton();
        let deadline = far_deadline();
        let first = thread::spawn(move || baton.take_turn(deadline));

        // Give the first turn time to start rendering, then collide with it.
        thread::sleep(Duration::from_millis(100));
        assert_eq!(
            performer.take_turn(far_deadline()),
            Err(TurnError::AlreadyPending { pitch: Pitch::C4 })
        );

        assert_eq!(first.join().unwrap(), Ok(()));
        performer.stop();
    }

    #[test]
    fn turn_times_out_when_never_consumed() {
        let (sink, _played) = recording_sink();
        let performer = Performer::new(1, Pitch::G4, sink);
        performer.enqueue(NoteLength::Quarter);

        // The worker was never started, so the turn can never complete.
        let deadline = Instant::now() + Duration::from_millis(50);
        assert_eq!(
            performer.take_turn(deadline),
            Err(TurnError::TimedOut { pitch: Pitch::G4 })
        );
    }

    #[test]
    fn stop_terminates_an_idle_worker() {
        let (sink, _played) = recording_sink();
        let mut performer = Performer::new(1, Pitch::A4, sink);
        performer.start();
        assert!(performer.is_running());

        performer.stop();
        assert!(!performer.is_running());

        // Stopping again is harmless.
        performer.stop();
        assert!(!performer.is_running());
    }
}
