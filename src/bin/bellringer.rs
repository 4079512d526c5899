// bellringer -- a handbell choir played by one thread per bell
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `bellringer` reads a song file and plays it with one thread per bell.

use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};

use log::{error, info};
use structopt::StructOpt;

use bellringer::conductor::Conductor;
use bellringer::melody;
use bellringer::output::sox::{SoxSink, SoxTarget};
use bellringer::output::SharedSink;
use bellringer::tone;

#[derive(Debug, StructOpt)]
#[structopt(name = "bellringer", about = "Playing songs with a choir of bell threads")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The song to play, one `<pitch> <length>` pair per line.
    #[structopt(parse(from_os_str))]
    song: PathBuf,

    /// Output file (any sox-supported format). Music is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).unwrap();

    if let Err(err) = run(opt) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let song = melody::read_song_file(&opt.song)?;
    info!("successfully loaded {}", opt.song.display());

    let target = match &opt.output {
        None => SoxTarget::Play,
        Some(path) => SoxTarget::File(path),
    };
    let sink: SharedSink = Arc::new(Mutex::new(SoxSink::open(
        tone::SAMPLE_RATE as u32,
        target,
    )?));

    let mut conductor = Conductor::new(song, sink)?;
    conductor.run()?;
    conductor.stop()?;
    Ok(())
}
