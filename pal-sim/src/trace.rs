//! A plain-text command trace reader.
//!
//! Each non-empty, non-comment line is one [`pal_core::Command`] in the wire
//! format of spec.md §6: `ppn operation arrival_tick merge_snapshot`, e.g.
//!
//! ```text
//! # ppn  op     arrival  merge_snapshot
//! 0      read   0        0
//! 1      write  0        1
//! 4096   erase  50000    0
//! ```
//!
//! `operation` is `read`/`write`/`erase` (case-insensitive); `merge_snapshot`
//! is `0` or `1`. Lines starting with `#` and blank lines are skipped.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use pal_core::{Command, Operation};

fn parse_operation(token: &str) -> Result<Operation> {
    match token.to_ascii_lowercase().as_str() {
        "read" | "r" => Ok(Operation::Read),
        "write" | "w" => Ok(Operation::Write),
        "erase" | "e" => Ok(Operation::Erase),
        other => Err(anyhow!("unknown operation {other:?}")),
    }
}

fn parse_line(line: &str) -> Result<Command> {
    let mut fields = line.split_whitespace();
    let ppn: u64 = fields
        .next()
        .ok_or_else(|| anyhow!("missing ppn field"))?
        .parse()
        .context("ppn is not a number")?;
    let operation = parse_operation(fields.next().ok_or_else(|| anyhow!("missing operation field"))?)?;
    let arrival: u64 = fields
        .next()
        .ok_or_else(|| anyhow!("missing arrival_tick field"))?
        .parse()
        .context("arrival_tick is not a number")?;
    let merge_snapshot: u8 = fields
        .next()
        .unwrap_or("0")
        .parse()
        .context("merge_snapshot is not 0 or 1")?;
    Ok(Command::new(ppn, operation, arrival, merge_snapshot != 0))
}

/// Parses a trace held entirely in memory (used directly by tests; files are
/// read through [`read_file`]).
pub fn parse(trace: &str) -> Result<Vec<Command>> {
    trace
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_line)
        .collect()
}

/// Reads and parses a trace file.
pub fn read_file(path: &Path) -> Result<Vec<Command>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace file {}", path.display()))?;
    parse(&contents).with_context(|| format!("parsing trace file {}", path.display()))
}
