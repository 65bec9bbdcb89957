//! 内存回环信道
//!
//! 以VecDeque模拟点对点串行链路，用于测试和纯软件演示

use std::collections::VecDeque;

use mccl_core::LinkError;

use crate::transport::Transport;

/// 内存信道
///
/// 读端从`incoming`队列取字节，写端把字节追加到`outgoing`，
/// 两个方向相互独立
#[derive(Debug, Default)]
pub struct MemoryChannel {
    /// 待接收字节队列
    incoming: VecDeque<u8>,
    /// 已发送字节
    outgoing: Vec<u8>,
    /// 信道容量上限（0表示不限）
    capacity: usize,
}

impl MemoryChannel {
    /// 创建不限容量的内存信道
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建限定接收队列容量的内存信道
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            incoming: VecDeque::new(),
            outgoing: Vec::new(),
            capacity,
        }
    }

    /// 向接收队列注入字节（模拟对端发送）
    ///
    /// # 返回
    /// - `Err(&'static str)`: 信道容量已满
    pub fn feed(&mut self, data: &[u8]) -> Result<(), &'static str> {
        if self.capacity != 0 && self.incoming.len() + data.len() > self.capacity {
            return Err("Channel buffer full");
        }
        self.incoming.extend(data);
        Ok(())
    }

    /// 取走所有已发送字节（模拟对端接收）
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outgoing)
    }

    /// 接收队列中待读字节数
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// 接收队列是否为空
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }
}

impl Transport for MemoryChannel {
    fn byte_available(&self) -> bool {
        !self.incoming.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.incoming.pop_front()
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.outgoing.extend_from_slice(data);
        Ok(())
    }
}
