//! MCCL Core Library
//!
//! This crate provides the core protocol definitions for the
//! MCCL (MicroController Command Link) system: the command table,
//! the typed payload model and the wire frame codec.

pub mod command;
pub mod error;
pub mod frame;
pub mod utils;

// 导出错误类型
pub use error::LinkError;

// 导出协议核心类型，便于其他模块使用
pub use command::{Command, Payload, PayloadKind};
pub use frame::{
    check_frame, decode_command, decode_frame, encode_command, encode_frame, FRAME_HEADER,
    FRAME_OVERHEAD, FRAME_PREFIX_LEN, MAX_DATA_LEN,
};
