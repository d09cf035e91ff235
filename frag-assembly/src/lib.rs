//! Splitting messages into checksummed fragments and reassembling them from
//! fragments arriving in arbitrary order.
//!
//! [`split`](split::split) is a pure function of its inputs and safe to call
//! from any number of tasks. A [`Reassembler`] owns its reassembly table
//! exclusively; callers that share one across tasks wrap it in a mutex.

pub mod reassemble;
pub mod split;
pub mod stats;

pub use reassemble::{Reassembler, ReassemblerOptions};
pub use split::SplitOptions;
pub use stats::AssemblyStats;
