//! The fragment record and its binary codec.
//!
//! Every fragment carries a 10-byte fixed header followed by a variable
//! payload slice:
//!
//! | Field | Width | Meaning |
//! |---|---|---|
//! | `seq_no` | `u16` | message identifier |
//! | `ord_no` | `u16` | fragment index within the message |
//! | `parts_total` | `i16` | total fragment count for the message |
//! | `checksum` | `u32` | digest of this fragment's payload only |
//! | `payload` | variable | fragment data slice |
//!
//! The header carries no payload length: framing is the channel's job. One
//! datagram holds one fragment; byte-stream channels prepend a length prefix
//! (see [`crate::stream`]).

use std::sync::OnceLock;

use bytes::Bytes;
use thiserror::Error;

use crate::checksum::Checksum32;
use crate::schema::{Field, FieldKind, Schema, Value};

/// Number of bytes in the fixed fragment header.
pub const HEADER_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum Error {
    #[error("schema error: {0}")]
    Schema(#[from] crate::schema::Error),
    #[error("fragment record is {expected} bytes, input has {got}")]
    Length { expected: usize, got: usize },
}

/// The fixed header portion: `seq_no, ord_no, parts_total, checksum`.
fn header_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new(vec![
            Field::new("seq_no", FieldKind::U16),
            Field::new("ord_no", FieldKind::U16),
            Field::new("parts_total", FieldKind::I16),
            Field::new("checksum", FieldKind::U32),
        ])
    })
}

/// The header schema concatenated with a payload field of the given length.
fn wire_schema(payload_len: usize) -> Schema {
    let payload = Schema::new(vec![Field::new("payload", FieldKind::Bytes(payload_len))]);
    header_schema().concat(&payload)
}

/// One wire-sized piece of a larger message, self-contained with its own
/// checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    seq_no: u16,
    ord_no: u16,
    parts_total: i16,
    checksum: u32,
    payload: Bytes,
}

impl Fragment {
    /// Builds a fragment, computing the payload checksum with `digest`.
    pub fn new(
        seq_no: u16,
        ord_no: u16,
        parts_total: i16,
        payload: Bytes,
        digest: &dyn Checksum32,
    ) -> Self {
        let checksum = digest.digest(&payload);
        Self { seq_no, ord_no, parts_total, checksum, payload }
    }

    #[inline]
    pub fn seq_no(&self) -> u16 {
        self.seq_no
    }

    #[inline]
    pub fn ord_no(&self) -> u16 {
        self.ord_no
    }

    #[inline]
    pub fn parts_total(&self) -> i16 {
        self.parts_total
    }

    #[inline]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Recomputes the payload digest and compares it with the declared
    /// checksum.
    pub fn verify(&self, digest: &dyn Checksum32) -> bool {
        digest.digest(&self.payload) == self.checksum
    }

    /// Packs header and payload into one wire record.
    pub fn encode(&self) -> Result<Bytes, Error> {
        let packed = wire_schema(self.payload.len()).pack(&[
            Value::U16(self.seq_no),
            Value::U16(self.ord_no),
            Value::I16(self.parts_total),
            Value::U32(self.checksum),
            Value::Bytes(self.payload.clone()),
        ])?;
        Ok(packed)
    }

    /// Decodes one wire record. `payload_len` must come from the framing
    /// layer; the fixed header has no self-describing length field, and two
    /// fragments of the same message may carry different payload lengths.
    pub fn decode(src: Bytes, payload_len: usize) -> Result<Self, Error> {
        let expected = HEADER_LEN + payload_len;
        if src.len() != expected {
            return Err(Error::Length { expected, got: src.len() });
        }

        let values = wire_schema(payload_len).unpack(src)?;
        match <[Value; 5]>::try_from(values) {
            Ok(
                [Value::U16(seq_no), Value::U16(ord_no), Value::I16(parts_total), Value::U32(checksum), Value::Bytes(payload)],
            ) => Ok(Self { seq_no, ord_no, parts_total, checksum, payload }),
            _ => unreachable!("wire schema yields five values of fixed kinds"),
        }
    }
}
