//! The Apply Engine: replays an edit script against `old` to reconstruct `new`.

use crate::error::DiffError;
use crate::opcode::Opcodes;

/// Bounds-checks a `[pos, pos+count)` write against `cap`, using the original's strict-inequality
/// policy: `pos + count >= cap` overflows, not `>`. Callers must size `dest` with at least one
/// byte of headroom above the expected output length; a `dest` sized to *exactly* that length is
/// rejected.
fn check_headroom(pos: usize, count: usize, cap: usize) -> Result<(), DiffError> {
    if pos + count >= cap {
        Err(DiffError::ApplyBufferTooSmall)
    } else {
        Ok(())
    }
}

/// Replays `script` against `old`, writing the reconstructed bytes into `dest` and returning how
/// many bytes were written.
///
/// This is the unchecked fast path: it trusts `script` to be well-formed (as produced by
/// [`crate::compute_into`]) and does not validate opcode tags or Insert payload bounds - a
/// malformed script can panic instead of returning [`DiffError::CorruptScript`]. Use
/// [`apply_checked`] for untrusted input.
///
/// Any `old` bytes left over once the script is exhausted are copied across verbatim, per the
/// tail rule: a script never needs a trailing `Keep` opcode for the common suffix.
pub fn apply_into(old: &[u8], script: &[u8], dest: &mut [u8]) -> Result<usize, DiffError> {
    let mut old_pos = 0usize;
    let mut script_pos = 0usize;
    let mut dest_pos = 0usize;

    while script_pos < script.len() {
        let byte = script[script_pos];
        let tag = byte >> 6;
        let count = (byte & 0x3f) as usize + 1;
        script_pos += 1;

        match tag {
            1 => {
                // Insert: count literal payload bytes follow the opcode.
                let payload = &script[script_pos..script_pos + count];
                script_pos += count;
                check_headroom(dest_pos, count, dest.len())?;
                dest[dest_pos..dest_pos + count].copy_from_slice(payload);
                dest_pos += count;
            }
            2 => {
                // Delete: skip count bytes of old.
                old_pos += count;
            }
            3 => {
                // Keep: copy count bytes from old to new.
                let src = &old[old_pos..old_pos + count];
                check_headroom(dest_pos, count, dest.len())?;
                dest[dest_pos..dest_pos + count].copy_from_slice(src);
                old_pos += count;
                dest_pos += count;
            }
            _ => unreachable!("apply_checked must be used to validate untrusted scripts"),
        }
    }

    // Tail rule: whatever's left of `old` is an implicit trailing Keep.
    if old_pos < old.len() {
        let remaining = old.len() - old_pos;
        check_headroom(dest_pos, remaining, dest.len())?;
        dest[dest_pos..dest_pos + remaining].copy_from_slice(&old[old_pos..]);
        dest_pos += remaining;
    }

    Ok(dest_pos)
}

/// Validates `script` before replaying it, returning [`DiffError::CorruptScript`] instead of
/// panicking or miscomputing on malformed input: a reserved `Noop` tag, or an `Insert` whose
/// declared payload runs past the end of the script.
pub fn apply_checked(old: &[u8], script: &[u8], dest: &mut [u8]) -> Result<usize, DiffError> {
    for op in Opcodes::new(script) {
        op?;
    }
    apply_into(old, script, dest)
}

/// Owned convenience wrapper over [`apply_checked`]: grows the destination buffer and retries on
/// [`DiffError::ApplyBufferTooSmall`], then truncates to the bytes actually written.
pub fn patch(old: &[u8], script: &[u8]) -> Result<Vec<u8>, DiffError> {
    let mut cap = old.len().max(script.len()).max(16);
    loop {
        let mut dest = vec![0u8; cap];
        match apply_checked(old, script, &mut dest) {
            Ok(len) => {
                dest.truncate(len);
                return Ok(dest);
            }
            Err(DiffError::ApplyBufferTooSmall) => cap *= 2,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_into;

    fn roundtrip(old: &[u8], new: &[u8]) {
        let mut script = vec![0u8; old.len() + new.len() + 16];
        let script_len = compute_into(old, new, &mut script).unwrap();
        script.truncate(script_len);

        let mut dest = vec![0u8; new.len() + 16];
        let dest_len = apply_into(old, &script, &mut dest).unwrap();
        dest.truncate(dest_len);
        assert_eq!(dest, new);

        assert_eq!(patch(old, &script).unwrap(), new);
    }

    #[test]
    fn roundtrips_the_worked_example() {
        roundtrip(b"The quick brown fox jumps over the lazy dog", b"The quick fox jumps over the lazy dog back");
    }

    #[test]
    fn roundtrips_empty_to_empty() {
        roundtrip(b"", b"");
    }

    #[test]
    fn roundtrips_pure_insert_and_delete() {
        roundtrip(b"", b"abc");
        roundtrip(b"abc", b"");
    }

    #[test]
    fn apply_into_reports_undersized_destination() {
        let mut script = vec![0u8; 32];
        let script_len = compute_into(b"abc", b"abcd", &mut script).unwrap();
        script.truncate(script_len);

        let mut dest = vec![0u8; 2];
        assert_eq!(
            apply_into(b"abc", &script, &mut dest),
            Err(DiffError::ApplyBufferTooSmall)
        );
    }

    #[test]
    fn apply_into_requires_one_byte_of_headroom_above_the_output_length() {
        let mut script = vec![0u8; 16];
        let script_len = compute_into(b"abc", b"abcd", &mut script).unwrap();
        script.truncate(script_len);

        // "abcd" is 4 bytes; a destination sized to exactly that must still be rejected per the
        // original's strict->= bounds check.
        let mut exact = vec![0u8; 4];
        assert_eq!(
            apply_into(b"abc", &script, &mut exact),
            Err(DiffError::ApplyBufferTooSmall)
        );

        let mut with_headroom = vec![0u8; 5];
        assert_eq!(apply_into(b"abc", &script, &mut with_headroom), Ok(4));
        assert_eq!(&with_headroom[..4], b"abcd");
    }

    #[test]
    fn apply_checked_rejects_truncated_insert_payload() {
        let script = [crate::opcode::pack(crate::opcode::OpKind::Insert, 3), b'a', b'b'];
        let mut dest = vec![0u8; 8];
        assert_eq!(
            apply_checked(b"", &script, &mut dest),
            Err(DiffError::CorruptScript)
        );
    }
}
