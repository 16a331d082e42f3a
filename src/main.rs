//! Chancery snapshot tool.
//!
//! Reads a JSON snapshot from stdin, adjudicates the board's current phase
//! and writes the resulting board and report as JSON to stdout:
//!
//! ```text
//! {"board": {...}, "orders": {"vie": {"type": "hold"}, ...}}
//! ```
//!
//! `orders` is optional; orders already stored on the units are kept.
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use chancery::config::ConfigError;
use chancery::{adjudicate, assign_orders, AdjudicationError, Board, GameRules, Order, Report};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot read stdin: {0}")]
    Io(#[from] io::Error),

    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adjudication(#[from] AdjudicationError),

    #[error(transparent)]
    Map(#[from] chancery::board::MapError),
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    board: Board,
    #[serde(default)]
    orders: BTreeMap<String, Order>,
}

#[derive(Debug, Serialize)]
struct Outcome<'a> {
    board: &'a Board,
    report: &'a Report,
}

struct Args {
    standard: bool,
    rules: Option<String>,
}

fn parse_args() -> Result<Args, CliError> {
    let mut args = Args {
        standard: false,
        rules: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--standard" => args.standard = true,
            "--rules" => {
                let path = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--rules needs a file".into()))?;
                args.rules = Some(path);
            }
            other => return Err(CliError::Usage(format!("unknown argument '{other}'"))),
        }
    }
    Ok(args)
}

fn run() -> Result<(), CliError> {
    let args = parse_args()?;
    let rules = args.rules.as_deref().map(GameRules::load).transpose()?;
    let mut out = io::BufWriter::new(io::stdout().lock());

    if args.standard {
        let mut board = Board::standard()?;
        if let Some(rules) = rules {
            board.rules = rules;
        }
        serde_json::to_writer_pretty(&mut out, &board)?;
        writeln!(out)?;
        return Ok(());
    }

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let Snapshot { mut board, orders } = serde_json::from_str(&input)?;
    board.validate()?;
    if let Some(rules) = rules {
        board.rules = rules;
    }
    assign_orders(&mut board, orders.iter().map(|(at, &o)| (at.as_str(), o)))?;

    let report = adjudicate(&mut board)?;
    serde_json::to_writer_pretty(
        &mut out,
        &Outcome {
            board: &board,
            report: &report,
        },
    )?;
    writeln!(out)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
