//! `series` CLI — parse, validate, describe, and expand recurrence rules
//! from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Parse rule text into its JSON representation
//! series parse --rule "FREQ=WEEKLY;BYDAY=TU,TH"
//!
//! # Validate rule text (exit code 1 on violations)
//! series check --rule "FREQ=MONTHLY;BYSETPOS=1;BYMONTHDAY=15"
//!
//! # Human-readable description
//! series describe --rule "FREQ=MONTHLY;BYDAY=FR;BYSETPOS=-1"
//!
//! # Expand a series definition over a window (stdin → stdout)
//! series expand --from 2025-01-01 --to 2025-03-31 < series.json
//!
//! # Expand from file to file, with overrides applied
//! series expand -i series.json -o occurrences.json \
//!   --from 2025-01-01 --to 2025-03-31 --with-overrides
//! ```

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use series_engine::SeriesDefinition;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(
    name = "series",
    version,
    about = "Recurring-event series inspection and expansion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse rule text into its JSON representation
    Parse {
        /// Rule text (reads from stdin if omitted)
        #[arg(long)]
        rule: Option<String>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Validate rule text; lists violations and exits non-zero on any
    Check {
        /// Rule text (reads from stdin if omitted)
        #[arg(long)]
        rule: Option<String>,
    },
    /// Render a one-line human-readable description of rule text
    Describe {
        /// Rule text (reads from stdin if omitted)
        #[arg(long)]
        rule: Option<String>,
    },
    /// Expand a series definition (JSON) into concrete occurrences
    Expand {
        /// Input file with the series JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Window start, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Window end, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        /// Apply per-instance overrides to the expanded occurrences
        #[arg(long)]
        with_overrides: bool,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

/// Read rule text from the flag or, when omitted, from stdin.
fn rule_text(flag: Option<String>) -> Result<String> {
    match flag {
        Some(rule) => Ok(rule),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read rule text from stdin")?;
            Ok(buffer.trim().to_string())
        }
    }
}

fn read_input(input: Option<&str>) -> Result<String> {
    match input {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read series JSON from stdin")?;
            Ok(buffer)
        }
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path)),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn window_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("--{} must be a YYYY-MM-DD date, got '{}'", flag, value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { rule, pretty } => {
            let text = rule_text(rule)?;
            let parsed = match series_engine::parse(&text) {
                Ok(parsed) => parsed,
                Err(e) => bail!("{}", e),
            };
            let json = if pretty {
                serde_json::to_string_pretty(&parsed)?
            } else {
                serde_json::to_string(&parsed)?
            };
            println!("{}", json);
        }
        Commands::Check { rule } => {
            let text = rule_text(rule)?;
            let parsed = match series_engine::parse(&text) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            };
            let violations = series_engine::validate(&parsed);
            if violations.is_empty() {
                println!("OK");
            } else {
                for violation in &violations {
                    eprintln!("{}", violation);
                }
                process::exit(1);
            }
        }
        Commands::Describe { rule } => {
            let text = rule_text(rule)?;
            let parsed = match series_engine::parse(&text) {
                Ok(parsed) => parsed,
                Err(e) => bail!("{}", e),
            };
            println!("{}", series_engine::describe(&parsed));
        }
        Commands::Expand {
            input,
            output,
            from,
            to,
            with_overrides,
            pretty,
        } => {
            let window_start = window_date(&from, "from")?;
            let window_end = window_date(&to, "to")?;
            let raw = read_input(input.as_deref())?;
            let series: SeriesDefinition =
                serde_json::from_str(&raw).context("input is not a valid series definition")?;

            let occurrences = if with_overrides {
                series_engine::expand_with_overrides(&series, window_start, window_end)
            } else {
                series_engine::expand(&series, window_start, window_end)
            };

            let json = if pretty {
                serde_json::to_string_pretty(&occurrences)?
            } else {
                serde_json::to_string(&occurrences)?
            };
            write_output(output.as_deref(), &json)?;
        }
    }

    Ok(())
}
