// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Easy interface for getting sound to play using a sox subprocess.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::warn;

use crate::note::Pitch;
use crate::output::NoteSink;
use crate::song::BellNote;
use crate::tone;

/// How long to wait before the single retry when the sink cannot be acquired.
const RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Where the audio stream goes.
pub enum SoxTarget<'a> {
    /// Play directly on the default speakers.
    Play,
    /// Write to a file (any sox-supported format).
    File(&'a Path),
}

/// A sink backed by a sox subprocess consuming signed 8-bit mono samples
/// on its stdin. Closing the stream drains whatever sox has buffered.
pub struct SoxSink {
    child: Child,
    stream: Option<ChildStdin>,
    /// Synthesized one-measure samples, one per pitch struck so far.
    samples: HashMap<Pitch, Vec<u8>>,
}

impl SoxSink {
    /// Spawn the sox subprocess. If it cannot be spawned, wait a fixed
    /// backoff and try once more; the second failure is propagated.
    pub fn open(sample_rate: u32, target: SoxTarget) -> io::Result<SoxSink> {
        match SoxSink::spawn(sample_rate, &target) {
            Ok(sink) => Ok(sink),
            Err(err) => {
                warn!(
                    "audio sink unavailable ({}), retrying in {}s...",
                    err,
                    RETRY_BACKOFF.as_secs()
                );
                thread::sleep(RETRY_BACKOFF);
                SoxSink::spawn(sample_rate, &target)
            }
        }
    }

    fn spawn(sample_rate: u32, target: &SoxTarget) -> io::Result<SoxSink> {
        let mut command = match target {
            SoxTarget::Play => {
                let mut command = Command::new("play");
                command
                    .arg("--channels")
                    .arg("1")
                    .arg("--rate")
                    .arg(format!("{}", sample_rate))
                    .arg("--type")
                    .arg("s8")
                    .arg("/dev/stdin");
                command
            }
            SoxTarget::File(path) => {
                let mut command = Command::new("sox");
                command
                    .arg("--channels")
                    .arg("1")
                    .arg("--rate")
                    .arg(format!("{}", sample_rate))
                    .arg("--type")
                    .arg("s8")
                    .arg("/dev/stdin")
                    .arg(path);
                command
            }
        };

        let mut child = command.stdin(Stdio::piped()).spawn()?;
        let stream = child.stdin.take().expect("Used stdin(Stdio::piped())");
        Ok(SoxSink {
            child,
            stream: Some(stream),
            samples: HashMap::new(),
        })
    }
}

impl NoteSink for SoxSink {
    fn play(&mut self, note: BellNote) -> io::Result<()> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "audio sink is already shut down",
                ))
            }
        };

        let sample = self
            .samples
            .entry(note.pitch)
            .or_insert_with(|| tone::sine_sample(note.pitch));
        let len = tone::sample_len(note.length.time_ms());
        stream.write_all(&sample[..len])?;
        stream.write_all(&[0u8; tone::REST_GAP_SAMPLES])?;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        // Dropping stdin signals end of stream, letting sox drain and exit.
        drop(self.stream.take());
        self.child.wait()?;
        Ok(())
    }
}
