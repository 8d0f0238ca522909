//! The Opcode Encoder/Decoder: the bit-packed `(kind:2, count_minus_one:6)` byte, and the
//! chunking that splits runs longer than 64 across adjacent opcodes.

use crate::error::DiffError;

pub(crate) const MAX_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    Insert,
    Delete,
    Keep,
}

impl OpKind {
    fn tag(self) -> u8 {
        match self {
            OpKind::Insert => 1,
            OpKind::Delete => 2,
            OpKind::Keep => 3,
        }
    }
}

pub(crate) fn pack(kind: OpKind, count: usize) -> u8 {
    debug_assert!((1..=MAX_CHUNK).contains(&count));
    (kind.tag() << 6) | ((count - 1) as u8)
}

/// Splits an opcode byte into its `(tag, count)`, with count already biased back to `1..=64`.
fn unpack(byte: u8) -> (u8, usize) {
    let tag = byte >> 6;
    let count = (byte & 0x3f) as usize + 1;
    (tag, count)
}

/// Appends one logical opcode of `count` bytes (`count` may exceed 64) to `dest` starting at
/// `offset`, splitting into `ceil(count/64)` chunks. For `Insert`, `payload` must hold exactly
/// `count` bytes and is interleaved after each opcode byte in `0..chunk`, `64..64+chunk`, ...
/// windows.
pub(crate) fn encode_run(
    dest: &mut [u8],
    mut offset: usize,
    kind: OpKind,
    mut count: usize,
    payload: &[u8],
) -> Result<usize, DiffError> {
    let mut payload_pos = 0usize;
    while count > 0 {
        let chunk = count.min(MAX_CHUNK);
        let byte = dest.get_mut(offset).ok_or(DiffError::ScriptBufferTooSmall)?;
        *byte = pack(kind, chunk);
        offset += 1;

        if kind == OpKind::Insert {
            let dst = dest
                .get_mut(offset..offset + chunk)
                .ok_or(DiffError::ScriptBufferTooSmall)?;
            dst.copy_from_slice(&payload[payload_pos..payload_pos + chunk]);
            offset += chunk;
            payload_pos += chunk;
        }

        count -= chunk;
    }
    Ok(offset)
}

/// A decoded opcode: kind, run length, and (for `Insert` only) the inline payload slice.
pub type DecodedOp<'a> = (OpKind, usize, &'a [u8]);

/// Iterator over the opcodes in a script, performing the bounds checks the unchecked [`crate::apply_into`]
/// skips. Used by [`crate::apply_checked`] and by the `debug-trace` pretty-printer.
pub struct Opcodes<'a> {
    script: &'a [u8],
    pos: usize,
}

impl<'a> Opcodes<'a> {
    pub fn new(script: &'a [u8]) -> Self {
        Opcodes { script, pos: 0 }
    }
}

impl<'a> Iterator for Opcodes<'a> {
    type Item = Result<DecodedOp<'a>, DiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = *self.script.get(self.pos)?;
        let (tag, count) = unpack(byte);
        self.pos += 1;

        Some(match tag {
            1 => match self.script.get(self.pos..self.pos + count) {
                Some(payload) => {
                    self.pos += count;
                    Ok((OpKind::Insert, count, payload))
                }
                None => Err(DiffError::CorruptScript),
            },
            2 => Ok((OpKind::Delete, count, &[])),
            3 => Ok((OpKind::Keep, count, &[])),
            _ => Err(DiffError::CorruptScript), // tag 0 = Noop, reserved, never emitted
        })
    }
}
