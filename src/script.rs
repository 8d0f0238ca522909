//! The Script Builder: walks the trace arena's `Back` chain from the terminal entry to the
//! origin, then replays it forward to emit a run-length-merged sequence of [`OpRun`]s.

use rle::{AppendRle, SplitableSpan};

use crate::trace::TraceEntry;

/// One merged run of the edit script, before opcode encoding. `Insert` carries the literal bytes
/// pulled from `New` rather than just a count, since the encoder needs them for the opcode
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OpRun {
    Keep(usize),
    Delete(usize),
    Insert(Vec<u8>),
}

impl SplitableSpan for OpRun {
    fn len(&self) -> usize {
        match self {
            OpRun::Keep(n) => *n,
            OpRun::Delete(n) => *n,
            OpRun::Insert(bytes) => bytes.len(),
        }
    }

    fn truncate(&mut self, at: usize) -> Self {
        match self {
            OpRun::Keep(n) => {
                let rest = *n - at;
                *n = at;
                OpRun::Keep(rest)
            }
            OpRun::Delete(n) => {
                let rest = *n - at;
                *n = at;
                OpRun::Delete(rest)
            }
            OpRun::Insert(bytes) => OpRun::Insert(bytes.split_off(at)),
        }
    }

    fn can_append(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (OpRun::Keep(_), OpRun::Keep(_))
                | (OpRun::Delete(_), OpRun::Delete(_))
                | (OpRun::Insert(_), OpRun::Insert(_))
        )
    }

    fn append(&mut self, other: Self) {
        match (self, other) {
            (OpRun::Keep(n), OpRun::Keep(m)) => *n += m,
            (OpRun::Delete(n), OpRun::Delete(m)) => *n += m,
            (OpRun::Insert(bytes), OpRun::Insert(mut more)) => bytes.append(&mut more),
            _ => unreachable!("can_append guards this"),
        }
    }
}

/// Replays the trace arena's `Back` chain from `terminal` to the origin (entry `0`) and returns
/// the forward sequence of merged moves, each annotated with the common-prefix `Keep` run the
/// snake produced after it.
///
/// Entry `0` is never itself read as a move - only as the stopping point - because it doubles as
/// both the literal `D = 0, k = 0` trace entry and the search's origin sentinel.
pub(crate) fn build_runs(entries: &[TraceEntry], terminal: usize, new: &[u8]) -> Vec<OpRun> {
    let mut path = Vec::new();
    let mut cur = terminal;
    while cur != 0 {
        path.push(cur);
        cur = entries[cur].back as usize;
    }
    path.reverse();

    let mut runs: Vec<OpRun> = Vec::new();

    let prefix = entries[0].saved_x;
    if prefix > 0 {
        runs.push_rle(OpRun::Keep(prefix));
    }

    for idx in path {
        let e = &entries[idx];
        if e.is_delete {
            runs.push_rle(OpRun::Delete(1));
        } else {
            runs.push_rle(OpRun::Insert(vec![new[e.token_y]]));
        }

        let keep_len = e.saved_x - e.index;
        if keep_len > 0 {
            runs.push_rle(OpRun::Keep(keep_len));
        }
    }

    runs
}
