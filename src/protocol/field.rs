use std::convert::TryInto;

/// A decoded field value: fixed-width variants plus an opaque `Dyn`
/// fallback for anything that isn't 1/2/4/8/16 octets. This is the natural
/// shape for an RFC 7011 field -- the template declares a length and the
/// value's width follows from it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Dyn(Vec<u8>),
}

impl FieldValue {
    /// Decodes `len` octets at `buf[offset..]`, dispatching on the
    /// template-declared length the same way the field was described.
    pub fn decode(buf: &[u8], offset: usize, len: usize) -> Option<Self> {
        let slice = buf.get(offset..offset + len)?;
        Some(match len {
            1 => FieldValue::U8(slice[0]),
            2 => FieldValue::U16(u16::from_be_bytes(slice.try_into().unwrap())),
            4 => FieldValue::U32(u32::from_be_bytes(slice.try_into().unwrap())),
            8 => FieldValue::U64(u64::from_be_bytes(slice.try_into().unwrap())),
            16 => FieldValue::U128(u128::from_be_bytes(slice.try_into().unwrap())),
            _ => FieldValue::Dyn(slice.to_vec()),
        })
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::U8(v) => Some(*v as u64),
            FieldValue::U16(v) => Some(*v as u64),
            FieldValue::U32(v) => Some(*v as u64),
            FieldValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::U8(v) => Some(*v as u32),
            FieldValue::U16(v) => Some(*v as u32),
            FieldValue::U32(v) => Some(*v),
            _ => None,
        }
    }
}
