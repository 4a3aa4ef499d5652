//! Node-based signal processing
//!
//! Decoders run as [`ProcessNode`](crate::runtime::ProcessNode)s on the
//! thread-per-node [`Scheduler`](crate::runtime::Scheduler):
//! - Upstream producers feed run-length [`Sample`]s over crossbeam channels
//! - Decoders walk those channels edge by edge and emit frames
//! - Sinks collect or forward completed packets

pub mod decoders;

// Re-export Sample from runtime
pub use crate::runtime::Sample;
