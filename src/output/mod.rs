// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Where the rendered notes end up.

pub mod sox;

use std::io;
use std::sync::{Arc, Mutex};

use crate::song::BellNote;

/// A sink that turns bell notes into audible (or recorded) sound.
///
/// Exactly one performer writes to the sink at any time: the turn-passing
/// protocol serializes access, so implementations do not need their own
/// locking. One `play` call is one turn's worth of work.
pub trait NoteSink: Send {
    /// Render a single note, blocking until the sink has accepted it.
    fn play(&mut self, note: BellNote) -> io::Result<()>;

    /// Drain buffered audio and release the sink. Called once after the
    /// last note, on every exit path.
    fn finish(&mut self) -> io::Result<()>;
}

/// The sink handle shared between the conductor and all performers.
pub type SharedSink = Arc<Mutex<dyn NoteSink>>;

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::thread;
    use std::time::Duration;

    /// Sink that records every note it is asked to play.
    pub struct RecordingSink {
        played: Arc<Mutex<Vec<BellNote>>>,
        /// Injected render time per note, for exercising the watchdog.
        stall: Duration,
    }

    impl NoteSink for RecordingSink {
        fn play(&mut self, note: BellNote) -> io::Result<()> {
            if self.stall > Duration::from_millis(0) {
                thread::sleep(self.stall);
            }
            self.played.lock().unwrap().push(note);
            Ok(())
        }

        fn finish(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub fn recording_sink() -> (SharedSink, Arc<Mutex<Vec<BellNote>>>) {
        stalling_sink(Duration::from_millis(0))
    }

    pub fn stalling_sink(stall: Duration) -> (SharedSink, Arc<Mutex<Vec<BellNote>>>) {
        let played = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink {
            played: played.clone(),
            stall,
        };
        (Arc::new(Mutex::new(sink)), played)
    }
}
