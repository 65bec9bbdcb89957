//! 帧发送
//!
//! 入站解码器的镜像编码端：组帧（帧头+长度+数据+CRC）后
//! 一次性写入传输层

use mccl_core::{encode_command, encode_frame, Command, LinkError, Payload};

use crate::transport::Transport;

/// 组帧并发送原始数据区
///
/// # 参数
/// - `data`: 数据区（命令字节 + 载荷），长度1..=255
pub fn send_raw<T: Transport>(transport: &mut T, data: &[u8]) -> Result<(), LinkError> {
    let frame = encode_frame(data)?;
    transport.write_bytes(&frame)
}

/// 组帧并发送命令
///
/// 载荷形状须与命令的载荷约定一致
pub fn send_command<T: Transport>(
    transport: &mut T,
    cmd: Command,
    payload: &Payload,
) -> Result<(), LinkError> {
    let frame = encode_command(cmd, payload)?;
    transport.write_bytes(&frame)
}
