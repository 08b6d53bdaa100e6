//! Encode command implementation.
//!
//! Scripts hold one operation per line:
//!
//! ```text
//! # comment
//! seq 100
//! put key value
//! put @3 key value
//! merge counter 0x0100000000000000
//! delete @3 key
//! log checkpoint-7
//! ```
//!
//! `@N` selects column family `N`. Tokens starting with `0x` are hex,
//! `""` is the empty string.

use batchlog_core::{ColumnFamilyId, CoreError, SequenceNumber, WriteBatch};
use std::path::Path;
use thiserror::Error;

/// A script line that could not be turned into a record.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The line does not follow the script grammar.
    #[error("line {line}: {message}")]
    Syntax {
        /// One-based line number.
        line: usize,
        /// What is wrong with it.
        message: String,
    },

    /// The batch rejected the record.
    #[error("line {line}: {source}")]
    Batch {
        /// One-based line number.
        line: usize,
        /// Underlying batch error.
        #[source]
        source: CoreError,
    },
}

impl ScriptError {
    fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Runs the encode command.
pub fn run(script: &Path, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(script)?;
    let batch = parse_script(&text)?;
    std::fs::write(out, batch.data())?;

    tracing::debug!(path = %out.display(), bytes = batch.data_size(), "wrote batch");
    println!(
        "Wrote {} records ({} bytes, sequence {}) to {}",
        batch.count(),
        batch.data_size(),
        batch.sequence().as_u64(),
        out.display()
    );
    Ok(())
}

/// Builds a batch from script text.
pub fn parse_script(text: &str) -> Result<WriteBatch, ScriptError> {
    let mut batch = WriteBatch::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let Some(op) = tokens.next() else {
            continue;
        };
        let mut args: Vec<&str> = tokens.collect();

        let cf = match args.first() {
            Some(first) if first.starts_with('@') => {
                let id = first[1..]
                    .parse::<u32>()
                    .map_err(|_| ScriptError::syntax(line, format!("bad column family {first}")))?;
                args.remove(0);
                Some(ColumnFamilyId::new(id))
            }
            _ => None,
        };
        let cf_id = cf.unwrap_or(ColumnFamilyId::DEFAULT);

        let batch_err = |source| ScriptError::Batch { line, source };
        match (op, args.as_slice()) {
            ("seq", [n]) if cf.is_none() => {
                let seq = n
                    .parse::<u64>()
                    .map_err(|_| ScriptError::syntax(line, format!("bad sequence {n}")))?;
                batch.set_sequence(SequenceNumber::new(seq));
            }
            ("put", [key, value]) => {
                let (key, value) = (bytes_arg(line, key)?, bytes_arg(line, value)?);
                batch.put_cf(cf_id, &key, &value).map_err(batch_err)?;
            }
            ("merge", [key, value]) => {
                let (key, value) = (bytes_arg(line, key)?, bytes_arg(line, value)?);
                batch.merge_cf(cf_id, &key, &value).map_err(batch_err)?;
            }
            ("delete", [key]) => {
                let key = bytes_arg(line, key)?;
                batch.delete_cf(cf_id, &key).map_err(batch_err)?;
            }
            ("log", [blob]) if cf.is_none() => {
                let blob = bytes_arg(line, blob)?;
                batch.put_log_data(&blob).map_err(batch_err)?;
            }
            ("seq" | "put" | "merge" | "delete" | "log", _) => {
                return Err(ScriptError::syntax(
                    line,
                    format!("wrong arguments for '{op}'"),
                ));
            }
            _ => return Err(ScriptError::syntax(line, format!("unknown operation '{op}'"))),
        }
    }

    Ok(batch)
}

fn bytes_arg(line: usize, token: &str) -> Result<Vec<u8>, ScriptError> {
    parse_bytes(token).ok_or_else(|| ScriptError::syntax(line, format!("bad hex literal {token}")))
}

/// Parses a script token into bytes.
///
/// Returns `None` for malformed hex.
pub fn parse_bytes(token: &str) -> Option<Vec<u8>> {
    if token == "\"\"" {
        return Some(Vec::new());
    }
    let Some(hex) = token.strip_prefix("0x") else {
        return Some(token.as_bytes().to_vec());
    };
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}
