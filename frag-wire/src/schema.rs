//! Fixed-layout binary record descriptions.
//!
//! A [`Schema`] is an ordered list of fixed-width fields laid out in network
//! (big-endian) byte order. Schemas compose by concatenation, which is how a
//! runtime-sized payload field gets appended to a fixed header.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("schema has {expected} fields, got {got} values")]
    Arity { expected: usize, got: usize },
    #[error("value for field `{0}` does not match its declared kind")]
    Kind(&'static str),
    #[error("field `{field}` is {expected} bytes wide, value has {got}")]
    Width {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("record is {expected} bytes wide, input has {got}")]
    Length { expected: usize, got: usize },
}

/// Primitive type tag of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U16,
    I16,
    U32,
    /// Byte string of a fixed length.
    Bytes(usize),
}

impl FieldKind {
    /// Width of the field on the wire.
    #[inline]
    pub const fn width(&self) -> usize {
        match self {
            Self::U16 | Self::I16 => 2,
            Self::U32 => 4,
            Self::Bytes(len) => *len,
        }
    }
}

/// A named field inside a [`Schema`]. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// A value for one field, in the same order the schema declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U16(u16),
    I16(i16),
    U32(u32),
    Bytes(Bytes),
}

/// An ordered set of fixed-width fields with a fixed total byte width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
    byte_width: usize,
}

impl Schema {
    /// Defines a schema from an ordered list of fields. The total width is
    /// fixed at construction time.
    pub fn new(fields: Vec<Field>) -> Self {
        let byte_width = fields.iter().map(|f| f.kind.width()).sum();
        Self { fields, byte_width }
    }

    /// Returns a new schema whose fields are `self`'s followed by `other`'s.
    pub fn concat(&self, other: &Self) -> Self {
        let mut fields = Vec::with_capacity(self.fields.len() + other.fields.len());
        fields.extend_from_slice(&self.fields);
        fields.extend_from_slice(&other.fields);
        Self::new(fields)
    }

    /// Sum of the field widths.
    #[inline]
    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Serializes `values` in field order. Fails if the value count, a value's
    /// kind, or a byte string's width does not match the schema.
    pub fn pack(&self, values: &[Value]) -> Result<Bytes, Error> {
        if values.len() != self.fields.len() {
            return Err(Error::Arity {
                expected: self.fields.len(),
                got: values.len(),
            });
        }

        let mut dst = BytesMut::with_capacity(self.byte_width);
        for (field, value) in self.fields.iter().zip(values) {
            match (field.kind, value) {
                (FieldKind::U16, Value::U16(v)) => dst.put_u16(*v),
                (FieldKind::I16, Value::I16(v)) => dst.put_i16(*v),
                (FieldKind::U32, Value::U32(v)) => dst.put_u32(*v),
                (FieldKind::Bytes(len), Value::Bytes(v)) => {
                    if v.len() != len {
                        return Err(Error::Width {
                            field: field.name,
                            expected: len,
                            got: v.len(),
                        });
                    }
                    dst.put_slice(v);
                }
                _ => return Err(Error::Kind(field.name)),
            }
        }

        Ok(dst.freeze())
    }

    /// Deserializes a record into one value per field. Fails if the input
    /// length differs from [`Self::byte_width`].
    pub fn unpack(&self, mut src: Bytes) -> Result<Vec<Value>, Error> {
        if src.len() != self.byte_width {
            return Err(Error::Length {
                expected: self.byte_width,
                got: src.len(),
            });
        }

        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match field.kind {
                FieldKind::U16 => Value::U16(src.get_u16()),
                FieldKind::I16 => Value::I16(src.get_i16()),
                FieldKind::U32 => Value::U32(src.get_u32()),
                FieldKind::Bytes(len) => Value::Bytes(src.split_to(len)),
            };
            values.push(value);
        }

        Ok(values)
    }
}
