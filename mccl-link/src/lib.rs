//! MCCL Link Kernel
//!
//! This crate provides the link kernel for the MCCL system:
//! the byte-level transport interface, the incremental frame
//! listener and the command dispatch registry.

pub mod channel;
pub mod dispatcher;
pub mod listener;
pub mod noise;
pub mod sender;
pub mod transport;

pub use channel::MemoryChannel;
pub use dispatcher::{CommandDispatcher, CommandHandler};
pub use listener::{DropCallback, DropReason, FrameListener, LinkStats, DEFAULT_FRAME_TIMEOUT};
pub use noise::{NoiseConfig, NoisyChannel};
pub use sender::{send_command, send_raw};
pub use transport::Transport;
