//! Trace-file ingestion: reads the four fixed-named per-processor trace files.
//!
//! Grounded on the teacher's `utils::read_testfiles`, which scanned a directory for files
//! sharing a prefix. Section 6 fixes the naming exactly (`{file_base}_0.data` .. `_3.data`), so
//! this reads those four paths directly rather than globbing, and rejects blank lines as an
//! `InputError` instead of the teacher's silent `unwrap()`-or-panic behavior.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::address::Addr;
use crate::error::SimError;
use crate::processor::TraceEntry;

/// Reads `{file_base}_0.data` through `{file_base}_3.data`, one trace per processor.
pub fn read_traces(file_base: &str) -> Result<Vec<VecDeque<TraceEntry>>, SimError> {
    (0..4)
        .map(|id| read_one(file_base, id))
        .collect::<Result<Vec<_>, _>>()
}

fn read_one(file_base: &str, id: usize) -> Result<VecDeque<TraceEntry>, SimError> {
    let path = PathBuf::from(format!("{file_base}_{id}.data"));
    let contents = fs::read_to_string(&path).map_err(|source| SimError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut entries = VecDeque::new();
    for (lineno, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            return Err(SimError::Input {
                file: path.display().to_string(),
                line: lineno + 1,
                message: "blank lines are not permitted in a trace file".into(),
            });
        }
        entries.push_back(parse_line(&path, lineno + 1, line)?);
    }
    Ok(entries)
}

fn parse_line(path: &PathBuf, lineno: usize, line: &str) -> Result<TraceEntry, SimError> {
    let input_err = |message: String| SimError::Input {
        file: path.display().to_string(),
        line: lineno,
        message,
    };

    let mut parts = line.split_whitespace();
    let op = parts
        .next()
        .ok_or_else(|| input_err("missing opcode".into()))?;
    let operand = parts
        .next()
        .ok_or_else(|| input_err("missing operand".into()))?;
    if parts.next().is_some() {
        warn!("{}:{}: trailing garbage after operand, ignoring", path.display(), lineno);
    }

    let operand_hex = operand.trim_start_matches("0x").trim_start_matches("0X");

    match op {
        "0" => {
            let addr = u32::from_str_radix(operand_hex, 16)
                .map_err(|_| input_err(format!("bad hex address '{operand}'")))?;
            Ok(TraceEntry::Load(Addr(addr)))
        }
        "1" => {
            let addr = u32::from_str_radix(operand_hex, 16)
                .map_err(|_| input_err(format!("bad hex address '{operand}'")))?;
            Ok(TraceEntry::Store(Addr(addr)))
        }
        "2" => {
            let cycles = operand
                .parse::<u32>()
                .or_else(|_| u32::from_str_radix(operand_hex, 16))
                .map_err(|_| input_err(format!("bad cycle count '{operand}'")))?;
            Ok(TraceEntry::Other(cycles))
        }
        other => Err(input_err(format!("unknown opcode '{other}', expected 0, 1, or 2"))),
    }
}
