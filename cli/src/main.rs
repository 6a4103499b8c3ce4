mod alphabet;
mod commands;

use alphabet::Alphabet;
use commands::{CliError, RecoverOptions};
use seedsleuth_core::registry;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

enum Command {
    Recover(RecoverOptions),
    Generate {
        generator: String,
        alphabet: Alphabet,
        seed: u64,
        length: i64,
    },
    Seek {
        generator: String,
        seed: u64,
        offset: i64,
    },
    List,
}

fn main() -> ExitCode {
    setup_logging();

    let args: Vec<String> = std::env::args().collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(problem) => {
            eprintln!("{problem}");
            usage(&args);
            return ExitCode::from(2);
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Recover(options) => {
            let stderr = io::stderr();
            let mut err = stderr.lock();
            commands::recover(&options, &mut io::stdin().lock(), &mut out, &mut err)?;
            Ok(())
        }
        Command::Generate {
            generator,
            alphabet,
            seed,
            length,
        } => commands::generate(&generator, &alphabet, seed, length, &mut out),
        Command::Seek {
            generator,
            seed,
            offset,
        } => commands::seek(&generator, seed, offset, &mut out),
        Command::List => commands::list(&mut out),
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str) -> Result<T, String> {
    text.parse()
        .map_err(|_| format!("invalid {what}: '{text}'"))
}

fn parse_alphabet(text: &str) -> Result<Alphabet, String> {
    Alphabet::new(text).map_err(|e| e.to_string())
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some(verb) = args.get(1) else {
        return Err("missing command".to_string());
    };
    let rest = &args[2..];
    match verb.to_ascii_lowercase().as_str() {
        "r" | "recover" => parse_recover(rest).map(Command::Recover),
        "g" | "generate" => match rest {
            [generator, alphabet, seed, length] => {
                let length: i64 = parse_number(length, "length")?;
                if length == 0 {
                    return Err("length must not be zero".to_string());
                }
                Ok(Command::Generate {
                    generator: generator.clone(),
                    alphabet: parse_alphabet(alphabet)?,
                    seed: parse_number(seed, "seed")?,
                    length,
                })
            }
            _ => Err("generate takes <prng> <alphabet> <seed> <length>".to_string()),
        },
        "s" | "seek" => match rest {
            [generator, seed, offset] => Ok(Command::Seek {
                generator: generator.clone(),
                seed: parse_number(seed, "seed")?,
                offset: parse_number(offset, "offset")?,
            }),
            _ => Err("seek takes <prng> <seed> <offset>".to_string()),
        },
        "l" | "list" => Ok(Command::List),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn parse_recover(args: &[String]) -> Result<RecoverOptions, String> {
    let mut positional = Vec::new();
    let mut options: Vec<(&str, &str)> = Vec::new();
    let mut json = false;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--json" => json = true,
            "--start" | "--end" | "--interval" | "--checkpoint" | "--resume" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(format!("{arg} needs a value"));
                };
                options.push((arg, value.as_str()));
                i += 1;
            }
            _ => positional.push(arg),
        }
        i += 1;
    }

    let [generator, alphabet] = positional[..] else {
        return Err("recover takes <prng> <alphabet>".to_string());
    };
    let mut recover = RecoverOptions::new(generator, parse_alphabet(alphabet)?);
    recover.json = json;
    for (flag, value) in options {
        match flag {
            "--start" => recover.start = Some(parse_number(value, "start seed")?),
            "--end" => recover.end = Some(parse_number(value, "end seed")?),
            "--interval" => recover.interval = parse_number(value, "interval")?,
            "--checkpoint" => recover.checkpoint = Some(PathBuf::from(value)),
            _ => recover.resume = Some(PathBuf::from(value)),
        }
    }
    Ok(recover)
}

fn usage(args: &[String]) {
    let program = args.first().map(String::as_str).unwrap_or("seedsleuth");
    let names: Vec<&str> = registry::names().collect();
    eprintln!(
        "usage: {program} r <prng> <alphabet> [--start N] [--end N] [--interval N] [--json]
                          [--checkpoint FILE] [--resume FILE]
       {program} g <prng> <alphabet> <seed> <length>
       {program} s <prng> <seed> <offset>
       {program} l

  r  recovers seeds that generate the symbols read from stdin
  g  reproduces <length> symbols after seeding with <seed>; a negative
     length reproduces the symbols generated before reaching <seed>
  s  prints the seed <offset> states away from <seed>; negative seeks back
  l  lists the generators and their capabilities

<prng> is one of: {}",
        names.join(", ")
    );
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}
