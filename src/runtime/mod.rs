//! Runtime support for streaming decoders

pub mod cursor;
pub mod errors;
pub mod node;
pub mod receiver;
pub mod sample;
pub mod scheduler;
pub mod sender;

pub use cursor::{ChannelCursor, EdgeCursor, EdgeSource};
pub use errors::{WorkError, WorkResult};
pub use node::ProcessNode;
pub use receiver::Receiver;
pub use sample::Sample;
pub use scheduler::Scheduler;
pub use sender::{ChannelMessage, Sender};

/// Create a bounded single-destination channel.
pub fn channel<T: Clone>(buffer_size: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(buffer_size);
    (Sender::new(vec![tx]), Receiver::new(rx))
}
