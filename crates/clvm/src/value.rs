use crate::ClvmError;
use std::rc::Rc;

/// A CLVM value: either a byte-string atom or a cons pair.
///
/// This mirrors the two-shape universe every chialisp program and its data
/// are built from: everything is an atom (a byte string, possibly read as an
/// unsigned/twos-complement integer) or a `(first . rest)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Atom(Rc<[u8]>),
    Pair(Rc<Value>, Rc<Value>),
}

impl Value {
    #[must_use]
    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Atom(Rc::from(bytes.into().into_boxed_slice()))
    }

    #[must_use]
    pub fn nil() -> Self {
        Self::atom(Vec::new())
    }

    #[must_use]
    pub fn cons(first: Value, rest: Value) -> Self {
        Self::Pair(Rc::new(first), Rc::new(rest))
    }

    /// Builds a proper cons-list terminated by nil from a slice of values.
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        let mut acc = Self::nil();
        for item in items.into_iter().rev() {
            acc = Self::cons(item, acc);
        }
        acc
    }

    #[must_use]
    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Self::Atom(a) => Some(a),
            Self::Pair(..) => None,
        }
    }

    pub fn first(&self) -> Result<&Value, ClvmError> {
        match self {
            Self::Pair(f, _) => Ok(f),
            Self::Atom(_) => Err(ClvmError::Malformed("first of atom".into())),
        }
    }

    pub fn rest(&self) -> Result<&Value, ClvmError> {
        match self {
            Self::Pair(_, r) => Ok(r),
            Self::Atom(_) => Err(ClvmError::Malformed("rest of atom".into())),
        }
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Atom(a) if a.is_empty())
    }

    /// Interprets this atom as a big-endian unsigned integer. Errors on a pair.
    pub fn as_u64(&self) -> Result<u64, ClvmError> {
        let bytes = self
            .as_atom()
            .ok_or_else(|| ClvmError::Malformed("expected atom, got pair".into()))?;
        if bytes.len() > 8 {
            return Err(ClvmError::Malformed("integer atom too wide for u64".into()));
        }
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Interprets this atom as a big-endian unsigned integer of arbitrary width.
    pub fn as_u128(&self) -> Result<u128, ClvmError> {
        let bytes = self
            .as_atom()
            .ok_or_else(|| ClvmError::Malformed("expected atom, got pair".into()))?;
        if bytes.len() > 16 {
            return Err(ClvmError::Malformed("integer atom too wide for u128".into()));
        }
        let mut buf = [0u8; 16];
        buf[16 - bytes.len()..].copy_from_slice(bytes);
        Ok(u128::from_be_bytes(buf))
    }

    /// Walks a proper cons-list into a `Vec`, erroring if it's not nil-terminated.
    pub fn iter_list(&self) -> Result<Vec<&Value>, ClvmError> {
        let mut out = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                Self::Atom(a) if a.is_empty() => break,
                Self::Pair(f, r) => {
                    out.push(f.as_ref());
                    cur = r;
                }
                Self::Atom(_) => {
                    return Err(ClvmError::Malformed("improper list".into()));
                }
            }
        }
        Ok(out)
    }
}

/// Encodes `amount` as CLVM's canonical minimal big-endian integer atom:
/// empty for 0, no leading zero byte unless the high bit of the first
/// significant byte is set (which would otherwise read as a negative
/// twos-complement value).
#[must_use]
pub fn canonical_amount(amount: u64) -> Vec<u8> {
    if amount == 0 {
        return Vec::new();
    }
    let full = amount.to_be_bytes();
    let first_nonzero = full.iter().position(|&b| b != 0).unwrap_or(full.len() - 1);
    let mut bytes = full[first_nonzero..].to_vec();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}

/// Parses a CLVM-serialized program/atom from its canonical on-chain byte encoding.
///
/// Returns the parsed value and the number of bytes consumed.
pub fn parse_program(bytes: &[u8]) -> Result<(Value, usize), ClvmError> {
    parse_at(bytes, 0)
}

fn parse_at(bytes: &[u8], pos: usize) -> Result<(Value, usize), ClvmError> {
    let b = *bytes
        .get(pos)
        .ok_or_else(|| ClvmError::Malformed("unexpected end of program".into()))?;

    if b == 0xff {
        let (first, next) = parse_at(bytes, pos + 1)?;
        let (rest, after) = parse_at(bytes, next)?;
        return Ok((Value::cons(first, rest), after));
    }

    if b == 0x80 {
        return Ok((Value::nil(), pos + 1));
    }

    if b < 0x80 {
        return Ok((Value::atom(vec![b]), pos + 1));
    }

    // Multi-byte atom length prefix: up to 5 leading-one-bit tiers, matching
    // CLVM's serialization format (see chia-blockchain's `SExp.as_bin`).
    let (len, header_len) = if b & 0xC0 == 0x80 {
        ((b & 0x3F) as usize, 1)
    } else if b & 0xE0 == 0xC0 {
        let b1 = read_byte(bytes, pos + 1)?;
        (((b & 0x1F) as usize) << 8 | b1 as usize, 2)
    } else if b & 0xF0 == 0xE0 {
        let b1 = read_byte(bytes, pos + 1)?;
        let b2 = read_byte(bytes, pos + 2)?;
        (((b & 0x0F) as usize) << 16 | (b1 as usize) << 8 | b2 as usize, 3)
    } else if b & 0xF8 == 0xF0 {
        let b1 = read_byte(bytes, pos + 1)?;
        let b2 = read_byte(bytes, pos + 2)?;
        let b3 = read_byte(bytes, pos + 3)?;
        (
            ((b & 0x07) as usize) << 24 | (b1 as usize) << 16 | (b2 as usize) << 8 | b3 as usize,
            4,
        )
    } else {
        let b1 = read_byte(bytes, pos + 1)?;
        let b2 = read_byte(bytes, pos + 2)?;
        let b3 = read_byte(bytes, pos + 3)?;
        let b4 = read_byte(bytes, pos + 4)?;
        (
            (b1 as usize) << 24 | (b2 as usize) << 16 | (b3 as usize) << 8 | b4 as usize,
            5,
        )
    };

    let start = pos + header_len;
    let end = start
        .checked_add(len)
        .ok_or_else(|| ClvmError::Malformed("atom length overflow".into()))?;
    let data = bytes
        .get(start..end)
        .ok_or_else(|| ClvmError::Malformed("atom runs past end of program".into()))?;
    Ok((Value::atom(data.to_vec()), end))
}

fn read_byte(bytes: &[u8], pos: usize) -> Result<u8, ClvmError> {
    bytes
        .get(pos)
        .copied()
        .ok_or_else(|| ClvmError::Malformed("truncated atom length prefix".into()))
}

/// Serializes a value back into CLVM's canonical byte encoding (used by tests
/// to build fixture puzzle/solution programs).
#[must_use]
pub fn serialize(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    serialize_into(value, &mut out);
    out
}

fn serialize_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Pair(first, rest) => {
            out.push(0xff);
            serialize_into(first, out);
            serialize_into(rest, out);
        }
        Value::Atom(bytes) => {
            if bytes.is_empty() {
                out.push(0x80);
            } else if bytes.len() == 1 && bytes[0] < 0x80 {
                out.push(bytes[0]);
            } else if bytes.len() <= 0x3F {
                out.push(0x80 | bytes.len() as u8);
                out.extend_from_slice(bytes);
            } else if bytes.len() <= 0x1FFF {
                let len = bytes.len();
                out.push(0xC0 | (len >> 8) as u8);
                out.push((len & 0xFF) as u8);
                out.extend_from_slice(bytes);
            } else {
                let len = bytes.len();
                out.push(0xE0 | (len >> 16) as u8);
                out.push(((len >> 8) & 0xFF) as u8);
                out.push((len & 0xFF) as u8);
                out.extend_from_slice(bytes);
            }
        }
    }
}
