//! The Search Engine: Myers' greedy O(ND) diff, run over a dense trace arena.
//!
//! Entries are visited in the order `D = 0, 1, 2, ...` and, within a `D`, `k = -D, -D+2, ..., D`.
//! [`dk_index`] gives each visited `(D, k)` pair a position in that order, and because the visit
//! order above already enumerates indices `0, 1, 2, ...` without gaps, the arena is just a `Vec`
//! appended to as the search proceeds - no separate indexing step is needed to lay out the
//! triangular table.

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

use crate::error::DiffError;

/// One visited `(D, k)` pair.
///
/// `back` is the arena index of the predecessor this entry was reached from. Index `0` is always
/// the unique `D = 0` entry, which doubles as the search's origin: every path's `Back` chain
/// bottoms out there (see [`crate::script::build_runs`]), so its own `index` / `is_delete` /
/// `token_y` fields are written but never read as a move.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TraceEntry {
    pub d: u32,
    pub k: i32,
    pub saved_x: usize,
    pub saved_y: usize,
    pub is_delete: bool,
    /// Position in `Old` associated with the move: post-move X for deletes, pre-move X for inserts.
    pub index: usize,
    /// For inserts, the index into `New` of the inserted byte (`Y - 1`). Unused for deletes.
    pub token_y: usize,
    pub back: isize,
}

/// Unique index of `(D, k)` in the dense arena: `((D*D) + 2*D + k) / 2`.
pub(crate) fn dk_index(d: usize, k: isize) -> usize {
    let d = d as i64;
    let k = k as i64;
    (((d * d) + 2 * d + k) / 2) as usize
}

/// Conservative (but not the loosest possible) upper bound on the number of `(D, k)` entries the
/// search can visit for inputs of the given lengths: the triangular bound `((D_max+1)^2 + 1) / 2`
/// with `D_max = old_len + new_len`, tighter than the original's `(old_len+1)*(new_len+1)`.
pub(crate) fn arena_capacity_hint(old_len: usize, new_len: usize) -> usize {
    let n = (old_len as u128) + (new_len as u128) + 1;
    (((n * n) + 1) / 2) as usize
}

/// Run Myers' search to completion, returning the trace arena and the index of the terminal
/// (goal) entry.
///
/// `max_d`, if given, caps the edit distance the search is allowed to explore; exceeding it
/// surfaces as [`DiffError::ArenaAllocFailed`] rather than silently growing the arena without
/// bound. With `max_d = None` the search is bounded only by the mathematical guarantee that
/// `D <= old.len() + new.len()`; falling through that bound indicates an internal bug, not caller
/// misuse, and is reported as [`DiffError::SearchExhausted`].
pub(crate) fn search<'bump>(
    bump: &'bump Bump,
    old: &[u8],
    new: &[u8],
    max_d: Option<usize>,
) -> Result<(BumpVec<'bump, TraceEntry>, usize), DiffError> {
    let d_max = old.len() + new.len();
    let cap_hint = arena_capacity_hint(old.len(), new.len()).min(1 << 20);
    let mut entries = BumpVec::with_capacity_in(cap_hint, bump);

    // D = 0: k = 0 is the only valid diagonal, and per the guard below (`k == -D`) it is always
    // reached from the virtual origin (SavedX = 0, SavedY = -1), never from a stored entry.
    {
        let mut x = 0usize;
        let mut y = 0usize; // pred.saved_y (-1) + 1
        while x < old.len() && y < new.len() && old[x] == new[y] {
            x += 1;
            y += 1;
        }
        entries.push(TraceEntry {
            d: 0,
            k: 0,
            saved_x: x,
            saved_y: y,
            is_delete: false,
            index: 0,
            token_y: 0,
            back: 0, // placeholder; never read as a move, see the doc comment above
        });
        if x >= old.len() && y >= new.len() {
            return Ok((entries, 0));
        }
    }

    for d in 1..=d_max {
        if let Some(h) = max_d {
            if d > h {
                return Err(DiffError::ArenaAllocFailed);
            }
        }

        let d_i = d as isize;
        let mut k = -d_i;
        while k <= d_i {
            let take_insert = if k == -d_i {
                true
            } else if k == d_i {
                false
            } else {
                let bot = entries[dk_index(d - 1, k - 1)].saved_x;
                let top = entries[dk_index(d - 1, k + 1)].saved_x;
                bot < top
            };

            let (mut x, mut y, is_delete, back, token_y);
            if take_insert {
                let back_idx = dk_index(d - 1, k + 1);
                let pred = &entries[back_idx];
                x = pred.saved_x;
                y = pred.saved_y + 1;
                is_delete = false;
                token_y = y - 1;
                back = back_idx as isize;
            } else {
                let back_idx = dk_index(d - 1, k - 1);
                let pred = &entries[back_idx];
                x = pred.saved_x + 1;
                y = pred.saved_y;
                is_delete = true;
                token_y = 0;
                back = back_idx as isize;
            }
            let index = x;

            while x < old.len() && y < new.len() && old[x] == new[y] {
                x += 1;
                y += 1;
            }

            let idx = entries.len();
            debug_assert_eq!(idx, dk_index(d, k), "arena layout must match DkIndex's enumeration order");
            entries.push(TraceEntry {
                d: d as u32,
                k: k as i32,
                saved_x: x,
                saved_y: y,
                is_delete,
                index,
                token_y,
                back,
            });

            if x >= old.len() && y >= new.len() {
                return Ok((entries, idx));
            }

            k += 2;
        }
    }

    Err(DiffError::SearchExhausted)
}

/// Human-readable dump of the trace arena, one row per visited `(D, k)` entry, in the spirit of
/// the original C implementation's `DebugPrintArray`. `new` supplies the bytes `Token` indexes
/// into for insert rows; entry `0` has no move of its own (see [`TraceEntry`]) and is printed with
/// its move columns blank.
#[cfg(feature = "debug-trace")]
pub(crate) fn fmt_entries<W: std::fmt::Write>(
    entries: &[TraceEntry],
    new: &[u8],
    w: &mut W,
) -> std::fmt::Result {
    writeln!(w, "  V   D   k SavedX SavedY Del Ind Back Token")?;
    for (i, e) in entries.iter().enumerate() {
        if i == 0 {
            writeln!(
                w,
                "{i:3} {:3} {:3}    {:3}    {:3}   -   -    -    -",
                e.d, e.k, e.saved_x, e.saved_y
            )?;
            continue;
        }
        let del = e.is_delete as u8;
        let token = if e.is_delete {
            '-'
        } else {
            new.get(e.token_y).map(|b| *b as char).unwrap_or('?')
        };
        writeln!(
            w,
            "{i:3} {:3} {:3}    {:3}    {:3} {del:3} {:3} {:4} {token:>5}",
            e.d, e.k, e.saved_x, e.saved_y, e.index, e.back,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dk_index_matches_table_layout() {
        // D=0: k=0 -> 0. D=1: k=-1,1 -> 1,2. D=2: k=-2,0,2 -> 3,4,5.
        assert_eq!(dk_index(0, 0), 0);
        assert_eq!(dk_index(1, -1), 1);
        assert_eq!(dk_index(1, 1), 2);
        assert_eq!(dk_index(2, -2), 3);
        assert_eq!(dk_index(2, 0), 4);
        assert_eq!(dk_index(2, 2), 5);
    }

    #[test]
    fn search_terminates_immediately_on_equal_empty_inputs() {
        let bump = Bump::new();
        let (entries, terminal) = search(&bump, b"", b"", None).unwrap();
        assert_eq!(terminal, 0);
        assert_eq!(entries[0].saved_x, 0);
        assert_eq!(entries[0].saved_y, 0);
    }

    #[test]
    fn search_respects_max_d_cap() {
        let bump = Bump::new();
        // "" -> "abc" needs D=3; capping at 1 must fail cleanly rather than overrun the arena.
        let err = search(&bump, b"", b"abc", Some(1)).unwrap_err();
        assert_eq!(err, DiffError::ArenaAllocFailed);
    }

    #[cfg(feature = "debug-trace")]
    #[test]
    fn fmt_entries_prints_one_row_per_visited_entry() {
        let bump = Bump::new();
        let (entries, _terminal) = search(&bump, b"ac", b"abc", None).unwrap();
        let mut out = String::new();
        fmt_entries(&entries, b"abc", &mut out).unwrap();
        assert_eq!(out.lines().count(), entries.len() + 1); // +1 for the header row
        assert!(out.contains('b')); // the inserted token shows up somewhere in the dump
    }
}
