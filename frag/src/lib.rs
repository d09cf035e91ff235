//! Datagram fragmentation and reassembly framing for MTU-limited channels.
//!
//! A message is split into checksummed fragments no larger than the channel
//! can carry, transmitted as discrete units, and rebuilt on the far side
//! from fragments arriving in any order. See [`Channel`] for the assembled
//! surface, or use the pieces directly: `split`, [`Reassembler`], the
//! transports and the wire codecs.

mod channel;

pub use channel::{Channel, ChannelError, ChannelOptions};

pub use frag_assembly::*;
pub use frag_transport::*;
pub use frag_wire::{checksum, compression, fragment, schema, stream};
