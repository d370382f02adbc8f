//! Binary codec for records and authorization payloads.
//!
//! The layout is fixed and platform independent:
//! - Fields are written in declared order with no padding
//! - Multi-byte integers are little-endian
//! - Fixed-width fields always occupy their full width
//! - Variable-length bytes are a `u32` little-endian length followed by the bytes
//!
//! **This layout is FROZEN.** Stored cells and signed digests depend on it.

use bytes::{Buf, BufMut};

use crate::error::{CoreError, Result};
use crate::types::{Identity, IDENTITY_LEN};

/// Width of the length prefix in front of variable-length byte fields.
pub const LEN_PREFIX: usize = 4;

/// Largest payload a length prefix can describe.
pub const MAX_VAR_BYTES: usize = u32::MAX as usize;

/// A value with a canonical binary encoding.
pub trait Encode {
    /// Append the encoding to `buf`.
    fn encode_to<B: BufMut>(&self, buf: &mut B);

    /// Exact number of bytes `encode_to` will write.
    fn encoded_len(&self) -> usize;

    /// Encode into a freshly allocated, exactly sized buffer.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_to(&mut buf);
        buf
    }
}

/// A value that can be read back from its canonical encoding.
pub trait Decode: Sized {
    /// Read one value from the front of `buf`, advancing it.
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self>;

    /// Decode a value that must occupy all of `bytes`.
    fn decode_exact(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let value = Self::decode_from(&mut cursor)?;
        if cursor.has_remaining() {
            return Err(CoreError::MalformedRecord(format!(
                "{} trailing bytes",
                cursor.remaining()
            )));
        }
        Ok(value)
    }
}

fn ensure<B: Buf>(buf: &B, needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(CoreError::MalformedRecord(format!(
            "{what}: need {needed} bytes, {} remaining",
            buf.remaining()
        )));
    }
    Ok(())
}

impl Encode for u32 {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(*self);
    }

    fn encoded_len(&self) -> usize {
        4
    }
}

impl Decode for u32 {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure(buf, 4, "u32")?;
        Ok(buf.get_u32_le())
    }
}

impl Encode for u64 {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(*self);
    }

    fn encoded_len(&self) -> usize {
        8
    }
}

impl Decode for u64 {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure(buf, 8, "u64")?;
        Ok(buf.get_u64_le())
    }
}

impl Encode for Identity {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.0);
    }

    fn encoded_len(&self) -> usize {
        IDENTITY_LEN
    }
}

impl Decode for Identity {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure(buf, IDENTITY_LEN, "identity")?;
        let mut arr = [0u8; IDENTITY_LEN];
        buf.copy_to_slice(&mut arr);
        Ok(Identity(arr))
    }
}

/// Fail with `MalformedRecord` if `len` bytes cannot carry a length prefix.
///
/// Callers accepting untrusted payloads check this before encoding.
pub fn check_var_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        CoreError::MalformedRecord(format!(
            "payload of {len} bytes exceeds the {MAX_VAR_BYTES} byte length prefix"
        ))
    })
}

/// Variable-length bytes.
///
/// # Panics
///
/// Panics if the payload is longer than [`MAX_VAR_BYTES`]; a truncated prefix
/// would corrupt the record. Use [`check_var_len`] to reject such payloads.
impl Encode for Vec<u8> {
    fn encode_to<B: BufMut>(&self, buf: &mut B) {
        let len = match check_var_len(self.len()) {
            Ok(len) => len,
            Err(e) => panic!("{e}"),
        };
        buf.put_u32_le(len);
        buf.put_slice(self);
    }

    fn encoded_len(&self) -> usize {
        LEN_PREFIX + self.len()
    }
}

impl Decode for Vec<u8> {
    fn decode_from<B: Buf>(buf: &mut B) -> Result<Self> {
        let len = u32::decode_from(buf)? as usize;
        ensure(buf, len, "length-prefixed bytes")?;
        let mut data = vec![0u8; len];
        buf.copy_to_slice(&mut data);
        Ok(data)
    }
}
