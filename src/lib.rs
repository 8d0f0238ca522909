//! A byte-oriented differencing library: Myers' shortest-edit-script search over a trace arena,
//! and a bit-packed opcode format connecting it to an [`apply_into`] replay engine.
//!
//! The unit is always one byte - no line/token awareness, no Unicode handling, no similarity
//! heuristics. See [`compute_into`] and [`apply_into`] for the raw buffer API, or [`diff`] /
//! [`patch`] for owned convenience wrappers that size their own buffers.

mod apply;
mod error;
pub mod opcode;
mod script;
mod trace;

pub use apply::{apply_checked, apply_into, patch};
pub use error::DiffError;
pub use opcode::{DecodedOp, OpKind, Opcodes};

use bumpalo::Bump;

use opcode::encode_run;
use script::OpRun;

/// Computes an edit script transforming `old` into `new`, writing the packed opcode bytes into
/// `dest` and returning the number of bytes written.
///
/// Runs the Search Engine once per call over a trace arena sized by
/// [`trace::arena_capacity_hint`], which is released (via `Bump`'s `Drop`) on every exit path,
/// including early returns from [`DiffError::ScriptBufferTooSmall`].
pub fn compute_into(old: &[u8], new: &[u8], dest: &mut [u8]) -> Result<usize, DiffError> {
    let bump = Bump::new();
    let (entries, terminal) = trace::search(&bump, old, new, None)?;
    let runs = script::build_runs(&entries, terminal, new);
    encode_runs(&runs, dest)
}

fn encode_runs(runs: &[OpRun], dest: &mut [u8]) -> Result<usize, DiffError> {
    let mut offset = 0;
    for run in runs {
        offset = match run {
            OpRun::Keep(n) => encode_run(dest, offset, OpKind::Keep, *n, &[])?,
            OpRun::Delete(n) => encode_run(dest, offset, OpKind::Delete, *n, &[])?,
            OpRun::Insert(bytes) => encode_run(dest, offset, OpKind::Insert, bytes.len(), bytes)?,
        };
    }
    Ok(offset)
}

/// Upper bound on the script length [`compute_into`] can produce for inputs of the given lengths,
/// per the buffer-safety property: `|old| + |new| + 2` bytes always suffice.
pub fn max_script_len(old_len: usize, new_len: usize) -> usize {
    old_len + new_len + 2
}

/// Owned convenience wrapper over [`compute_into`]: allocates a buffer sized by
/// [`max_script_len`], computes the script, and truncates to the bytes actually written.
pub fn diff(old: &[u8], new: &[u8]) -> Result<Vec<u8>, DiffError> {
    let mut dest = vec![0u8; max_script_len(old.len(), new.len())];
    let len = compute_into(old, new, &mut dest)?;
    dest.truncate(len);
    Ok(dest)
}

/// A decoded edit script borrowed from its packed byte representation.
///
/// This is a thin, zero-copy view - it owns nothing and performs no validation on construction.
/// Call [`EditScript::opcodes`] to iterate its contents, or [`EditScript::apply`] /
/// [`EditScript::apply_checked`] to replay it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditScript<'a> {
    bytes: &'a [u8],
}

impl<'a> EditScript<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        EditScript { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterates the script's opcodes, validating bounds as it goes.
    pub fn opcodes(&self) -> Opcodes<'a> {
        Opcodes::new(self.bytes)
    }

    pub fn apply(&self, old: &[u8], dest: &mut [u8]) -> Result<usize, DiffError> {
        apply_into(old, self.bytes, dest)
    }

    pub fn apply_checked(&self, old: &[u8], dest: &mut [u8]) -> Result<usize, DiffError> {
        apply_checked(old, self.bytes, dest)
    }
}

#[cfg(feature = "debug-trace")]
impl<'a> std::fmt::Display for EditScript<'a> {
    /// A human-readable dump of the script's opcodes, one per line, in the spirit of the original
    /// implementation's `DebugPrintEditScript`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for op in self.opcodes() {
            match op {
                Ok((OpKind::Insert, count, payload)) => {
                    writeln!(f, "insert {count} {payload:?}")?;
                }
                Ok((OpKind::Delete, count, _)) => writeln!(f, "delete {count}")?,
                Ok((OpKind::Keep, count, _)) => writeln!(f, "keep {count}")?,
                Err(e) => writeln!(f, "<corrupt: {e}>")?,
            }
        }
        Ok(())
    }
}

/// A human-readable dump of the trace arena the Search Engine builds while diffing `old` against
/// `new`, one row per visited `(D, k)` entry, in the spirit of the original implementation's
/// `DebugPrintArray`. Re-runs the search; intended for debugging, not for use on a hot path.
#[cfg(feature = "debug-trace")]
pub fn trace_dump(old: &[u8], new: &[u8]) -> Result<String, DiffError> {
    let bump = Bump::new();
    let (entries, _terminal) = trace::search(&bump, old, new, None)?;
    let mut out = String::new();
    trace::fmt_entries(&entries, new, &mut out).expect("writing to a String never fails");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(old: &[u8], new: &[u8]) {
        let script = diff(old, new).unwrap();
        assert_eq!(patch(old, &script).unwrap(), new);
    }

    #[test]
    fn compute_empty_to_empty_is_zero_length() {
        let script = diff(b"", b"").unwrap();
        assert_eq!(script.len(), 0);
        assert_eq!(patch(b"", &script).unwrap(), b"");
    }

    #[test]
    fn compute_equal_strings_contains_no_insert_or_delete() {
        let script = diff(b"abc", b"abc").unwrap();
        for op in EditScript::new(&script).opcodes() {
            let (kind, _, _) = op.unwrap();
            assert_eq!(kind, OpKind::Keep);
        }
    }

    #[test]
    fn compute_reports_undersized_script_buffer() {
        let mut dest = vec![0u8; 1];
        assert_eq!(
            compute_into(b"abc", b"xyz", &mut dest),
            Err(DiffError::ScriptBufferTooSmall)
        );
    }

    #[test]
    fn worked_example_from_the_c_original() {
        roundtrip(
            b"quickfoxback!",
            b"The quick brown fox jumped over the lazy dog's back!",
        );
    }

    #[test]
    fn chunking_splits_runs_longer_than_64_bytes() {
        let old: Vec<u8> = (0u8..65).collect();
        let new: Vec<u8> = (0u8..65).rev().collect();
        let script = diff(&old, &new).unwrap();
        for op in EditScript::new(&script).opcodes() {
            let (_, count, _) = op.unwrap();
            assert!(count <= 64);
        }
        assert_eq!(patch(&old, &script).unwrap(), new);
    }

    #[test]
    fn edit_distance_matches_minimum_insert_plus_delete_bytes() {
        let script = diff(b"ac", b"abc").unwrap();
        let mut changed = 0;
        for op in EditScript::new(&script).opcodes() {
            match op.unwrap() {
                (OpKind::Insert, count, _) => changed += count,
                (OpKind::Delete, count, _) => changed += count,
                (OpKind::Keep, _, _) => {}
            }
        }
        assert_eq!(changed, 1);
    }

    #[test]
    fn max_script_len_bounds_the_worked_example() {
        let old = b"quickfoxback!";
        let new = b"The quick brown fox jumped over the lazy dog's back!";
        let script = diff(old, new).unwrap();
        assert!(script.len() <= max_script_len(old.len(), new.len()));
    }

    #[cfg(feature = "debug-trace")]
    #[test]
    fn trace_dump_prints_a_header_and_one_row_per_entry() {
        let bump = Bump::new();
        let (entries, _terminal) = trace::search(&bump, b"ac", b"abc", None).unwrap();

        let dump = trace_dump(b"ac", b"abc").unwrap();
        let mut lines = dump.lines();
        assert!(lines.next().unwrap().contains("SavedX")); // header row
        assert_eq!(lines.count(), entries.len());
        assert!(dump.contains('b')); // the inserted token shows up somewhere in the dump
    }
}
