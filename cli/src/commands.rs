//! Command implementations
//!
//! Each command writes to caller-supplied streams so the binary and the
//! tests drive the same code.

use crate::alphabet::{Alphabet, AlphabetError};
use seedsleuth_core::prng::{Limit, Prng, PrngError};
use seedsleuth_core::recovery::{
    CheckpointError, RecoveryCheckpoint, RecoveryEvent, RecoverySearch, DEFAULT_PROGRESS_INTERVAL,
};
use seedsleuth_core::registry;
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("The generator '{0}' does not exist")]
    UnknownGenerator(String),

    #[error("No pseudorandom output could be read")]
    EmptySample,

    #[error(transparent)]
    Prng(#[from] PrngError),

    #[error(transparent)]
    Alphabet(#[from] AlphabetError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn create(name: &str) -> Result<Box<dyn Prng>, CliError> {
    registry::create(name).ok_or_else(|| CliError::UnknownGenerator(name.to_string()))
}

/// Options of the `r` command
#[derive(Debug, Clone)]
pub struct RecoverOptions {
    pub generator: String,
    pub alphabet: Alphabet,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub interval: u64,
    pub json: bool,
    pub checkpoint: Option<PathBuf>,
    pub resume: Option<PathBuf>,
}

impl RecoverOptions {
    pub fn new(generator: &str, alphabet: Alphabet) -> Self {
        Self {
            generator: generator.to_string(),
            alphabet,
            start: None,
            end: None,
            interval: DEFAULT_PROGRESS_INTERVAL,
            json: false,
            checkpoint: None,
            resume: None,
        }
    }
}

/// Outcome of a recovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverSummary {
    pub discoveries: u64,
    pub completed: bool,
}

fn load_checkpoint(path: &Path) -> Result<RecoveryCheckpoint, CliError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn save_checkpoint(path: &Path, checkpoint: &RecoveryCheckpoint) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(checkpoint)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Recover seeds reproducing the symbols read from `input`
///
/// Discoveries go to `out` (one seed per line, or one JSON event per line
/// with `json`), progress ticks to `err` as dots.
pub fn recover(
    options: &RecoverOptions,
    input: &mut dyn Read,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<RecoverSummary, CliError> {
    let mut prng = create(&options.generator)?;
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let outputs = options.alphabet.decode(&text)?;
    if outputs.is_empty() {
        return Err(CliError::EmptySample);
    }

    let search = match &options.resume {
        Some(path) => {
            let search = load_checkpoint(path)?.resume(prng.name())?;
            if search.outputs != outputs || search.limit != options.alphabet.len() {
                return Err(CheckpointError::Mismatch(
                    "checkpoint was captured for a different sample".to_string(),
                )
                .into());
            }
            info!(resume_from = search.seed_start, "resuming seed search");
            search
        }
        None => RecoverySearch::new(outputs, options.alphabet.len())
            .with_range(options.start.unwrap_or(0), options.end.unwrap_or(u64::MAX))
            .with_progress_interval(options.interval),
    };

    let generator = prng.name();
    let mut failure: Option<CliError> = None;
    let mut discoveries = 0u64;
    let mut ticks = 0u64;
    let completed = {
        let mut handler = |event: &RecoveryEvent| {
            let result = report(options, &search, generator, event, out, err);
            match event {
                RecoveryEvent::SeedDiscovered { .. } => discoveries += 1,
                RecoveryEvent::Progress { .. } => ticks += 1,
            }
            match result {
                Ok(()) => ControlFlow::Continue(()),
                Err(error) => {
                    failure = Some(error);
                    ControlFlow::Break(())
                }
            }
        };
        prng.recover_seed(&search, &mut handler)
    };

    if ticks > 0 && !options.json {
        writeln!(err)?;
    }
    if let Some(error) = failure {
        return Err(error);
    }
    if !completed {
        warn!(generator, "seed search did not complete");
    }
    Ok(RecoverSummary {
        discoveries,
        completed,
    })
}

fn report(
    options: &RecoverOptions,
    search: &RecoverySearch,
    generator: &str,
    event: &RecoveryEvent,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if options.json {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)?;
    } else {
        match event {
            RecoveryEvent::SeedDiscovered { seed, .. } => writeln!(out, "{seed}")?,
            RecoveryEvent::Progress { .. } => {
                write!(err, ".")?;
                err.flush()?;
            }
        }
    }

    if let (Some(path), RecoveryEvent::Progress {
        resume_from: Some(resume_from),
        ..
    }) = (&options.checkpoint, event)
    {
        save_checkpoint(path, &RecoveryCheckpoint::capture(generator, search, *resume_from))?;
    }
    Ok(())
}

/// Reproduce `length` symbols from `seed`; a negative length reproduces the
/// symbols generated before reaching `seed`, in forward order
pub fn generate(
    generator: &str,
    alphabet: &Alphabet,
    seed: u64,
    length: i64,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut prng = create(generator)?;
    prng.seed(seed)?;
    let limit = Limit::new(alphabet.len())?;
    let count = length.unsigned_abs();

    let mut values = Vec::new();
    if length >= 0 {
        for _ in 0..count {
            values.push(prng.next_bounded(limit));
        }
    } else {
        for _ in 0..count {
            values.push(prng.previous_bounded(limit)?);
        }
        values.reverse();
    }
    writeln!(out, "{}", alphabet.encode(&values)?)?;
    Ok(())
}

/// Print the seed whose state is `offset` steps from `seed`'s
pub fn seek(generator: &str, seed: u64, offset: i64, out: &mut dyn Write) -> Result<(), CliError> {
    let mut prng = create(generator)?;
    prng.seed(seed)?;
    let target = if offset >= 0 {
        prng.seek_seed_ahead(seed, offset.unsigned_abs())?
    } else {
        prng.seek_seed_back(seed, offset.unsigned_abs())?
    };
    writeln!(out, "{target}")?;
    Ok(())
}

pub fn list(out: &mut dyn Write) -> Result<(), CliError> {
    for entry in registry::entries() {
        let caps = (entry.create)().capabilities();
        let flags = [
            (caps.can_reverse, 'r'),
            (caps.can_seek, 's'),
            (caps.can_seek_seed, 'S'),
        ]
        .iter()
        .map(|&(enabled, flag)| if enabled { flag } else { '-' })
        .collect::<String>();
        writeln!(out, "{:<14} {}  {}", entry.name, flags, entry.description)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn digits() -> Alphabet {
        Alphabet::new("0123456789").unwrap()
    }

    fn run_generate(generator: &str, seed: u64, length: i64) -> String {
        let mut out = Vec::new();
        generate(generator, &digits(), seed, length, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_generate_forward() {
        // msvcrt srand(1): 41, 18467, 6334, 26500, 19169
        assert_eq!(run_generate("msvcrt", 1, 5), "17409\n");
    }

    #[test]
    fn test_generate_backward_prints_forward_order() {
        let mut out = Vec::new();
        seek("msvcrt", 1, 5, &mut out).unwrap();
        let state: u64 = String::from_utf8(out).unwrap().trim().parse().unwrap();
        assert_eq!(run_generate("msvcrt", state, -5), "17409\n");
    }

    #[test]
    fn test_seek_round_trip() {
        let mut out = Vec::new();
        seek("bsd-libc", 1, 1000, &mut out).unwrap();
        let ahead: u64 = String::from_utf8(out).unwrap().trim().parse().unwrap();
        let mut out = Vec::new();
        seek("bsd-libc", ahead, -1000, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
    }

    #[test]
    fn test_generate_backward_unsupported() {
        let mut out = Vec::new();
        let result = generate("mysql", &digits(), 12345, -3, &mut out);
        assert!(matches!(
            result,
            Err(CliError::Prng(PrngError::UnsupportedOperation { .. }))
        ));
    }

    #[test]
    fn test_unknown_generator() {
        let mut out = Vec::new();
        assert!(matches!(
            seek("mt19937", 1, 1, &mut out),
            Err(CliError::UnknownGenerator(_))
        ));
    }

    #[test]
    fn test_recover_prints_seed() {
        let mut options = RecoverOptions::new("msvcrt", digits());
        options.end = Some(1000);
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let summary = recover(
            &options,
            &mut Cursor::new("1740 9\n"),
            &mut out,
            &mut err,
        )
        .unwrap();
        assert!(summary.completed);
        let seeds: Vec<u64> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| line.parse().unwrap())
            .collect();
        assert!(seeds.contains(&1));
        assert_eq!(seeds.len() as u64, summary.discoveries);
    }

    #[test]
    fn test_recover_json_events() {
        let mut options = RecoverOptions::new("msvcrt", digits());
        options.end = Some(999);
        options.interval = 100;
        options.json = true;
        let (mut out, mut err) = (Vec::new(), Vec::new());
        recover(&options, &mut Cursor::new("17409"), &mut out, &mut err).unwrap();
        let events: Vec<RecoveryEvent> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let progress = events
            .iter()
            .filter(|e| matches!(e, RecoveryEvent::Progress { .. }))
            .count();
        assert_eq!(progress, 10);
        assert!(events.contains(&RecoveryEvent::SeedDiscovered {
            seed: 1,
            attempts: 1,
            total: 1000,
        }));
        assert!(err.is_empty());
    }

    #[test]
    fn test_recover_rejects_empty_sample() {
        let options = RecoverOptions::new("msvcrt", digits());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        assert!(matches!(
            recover(&options, &mut Cursor::new(" \n"), &mut out, &mut err),
            Err(CliError::EmptySample)
        ));
    }

    #[test]
    fn test_checkpoint_then_resume() {
        let path = std::env::temp_dir().join(format!(
            "seedsleuth-checkpoint-{}.json",
            std::process::id()
        ));
        let mut options = RecoverOptions::new("msvcrt", digits());
        options.end = Some(2000);
        options.interval = 500;
        options.checkpoint = Some(path.clone());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        recover(&options, &mut Cursor::new("17409"), &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(err).unwrap(), "....\n");

        let saved = load_checkpoint(&path).unwrap();
        assert_eq!(saved.resume_from, 2000);

        let mut resumed = RecoverOptions::new("msvcrt", digits());
        resumed.resume = Some(path.clone());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let summary =
            recover(&resumed, &mut Cursor::new("17409"), &mut out, &mut err).unwrap();
        assert!(summary.completed);

        let other = recover(&resumed, &mut Cursor::new("17408"), &mut out, &mut err);
        assert!(matches!(other, Err(CliError::Checkpoint(_))));
        let _ = std::fs::remove_file(&path);
    }
}
