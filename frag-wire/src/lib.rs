//! Wire formats for the frag protocol: fixed-layout binary schemas, the
//! fragment codec, pluggable checksums, length-prefixed stream framing and
//! whole-message compression.

pub mod checksum;
pub mod compression;
pub mod fragment;
pub mod schema;
pub mod stream;
