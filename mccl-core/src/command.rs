//! 命令标识与载荷模型
//!
//! 命令字节值是线上协议的一部分，新增命令只能追加新值，
//! 不能改动已有值

use serde::{Deserialize, Serialize};

/// 命令标识
///
/// 协议稳定的单字节命令码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// 启动
    Start = 0x00,
    /// 停止
    Stop = 0x01,
    /// 反转
    Reverse = 0x02,
    /// 设置速度（携带一个速度字节）
    SetSpeed = 0x03,
}

/// 载荷类型标识
///
/// 每个命令的载荷形状是协议静态约定的，解码端根据本表
/// 决定如何解释数据区，而不是在状态机里硬编码分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// 无载荷
    None,
    /// 单字节载荷
    Byte,
}

/// 命令载荷
///
/// 带标签的载荷值，由接收端按[`Command::payload_kind`]解码，
/// 由处理器按模式匹配取用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// 无载荷
    None,
    /// 单字节载荷
    Byte(u8),
}

impl Command {
    /// 从字节值解析命令
    ///
    /// # 返回
    /// - `Some(Command)`: 合法命令码
    /// - `None`: 未定义的命令字节
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Command::Start),
            0x01 => Some(Command::Stop),
            0x02 => Some(Command::Reverse),
            0x03 => Some(Command::SetSpeed),
            _ => None,
        }
    }

    /// 命令对应的字节值
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// 命令的载荷类型
    ///
    /// 新增携带载荷的命令时只需在此追加表项
    pub fn payload_kind(self) -> PayloadKind {
        match self {
            Command::SetSpeed => PayloadKind::Byte,
            _ => PayloadKind::None,
        }
    }

    /// 所有已定义的命令
    pub fn all() -> &'static [Command] {
        &[
            Command::Start,
            Command::Stop,
            Command::Reverse,
            Command::SetSpeed,
        ]
    }
}

impl Payload {
    /// 载荷的类型标识
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::None => PayloadKind::None,
            Payload::Byte(_) => PayloadKind::Byte,
        }
    }

    /// 取单字节载荷值
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Payload::Byte(value) => Some(*value),
            Payload::None => None,
        }
    }

    /// 载荷的线上字节表示
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Payload::None => Vec::new(),
            Payload::Byte(value) => vec![*value],
        }
    }
}
