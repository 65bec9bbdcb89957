//! 帧监听器
//!
//! 逐字节推进的帧重组状态机。每次`poll`至多消费一个传输
//! 字节，字节不可用时不阻塞；数据区和CRC阶段同样是可恢复
//! 的逐字节状态，配合每帧截止时间，把无限期停顿变成可观测
//! 的超时丢帧
//!
//! 噪声从不作为错误向调用方抛出：同步丢失、CRC不匹配、
//! 超时都在本地恢复并计入统计

use std::time::{Duration, Instant};

use mccl_core::{decode_command, Command, LinkError, FRAME_HEADER, FRAME_PREFIX_LEN};
use serde::Serialize;

use crate::dispatcher::CommandDispatcher;
use crate::transport::Transport;

/// 默认每帧截止时间
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_millis(500);

/// 重组状态机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenState {
    /// 扫描第一个帧头字节
    WaitHeader1,
    /// 等待第二个帧头字节
    WaitHeader2,
    /// 等待长度字节
    WaitLen,
    /// 逐字节收集数据区
    WaitData,
    /// 逐字节收集2字节CRC
    WaitCrc,
    /// 完整帧已校验通过，待分发
    Received,
}

/// 丢帧原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// 帧头假设失败（H0后未跟H1）
    SyncLoss,
    /// 长度字节非法（L必须计入命令字节）
    BadLength,
    /// CRC不匹配
    CrcMismatch,
    /// 帧中途超时
    Timeout,
    /// 命令字节未定义
    UnknownCommand,
    /// 载荷与命令约定不符
    BadPayload,
}

/// 丢帧回调
pub type DropCallback = fn(DropReason);

/// 链路统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkStats {
    /// 成功接收并分发的帧数
    pub frames_received: u64,
    /// 消费的传输字节总数
    pub bytes_consumed: u64,
    /// 帧头同步丢失次数
    pub sync_losses: u64,
    /// CRC校验失败次数
    pub crc_errors: u64,
    /// 帧中途超时次数
    pub frame_timeouts: u64,
    /// 解码失败次数（非法长度、未知命令、载荷不符）
    pub decode_errors: u64,
}

/// 帧监听器
///
/// 独占持有重组缓冲区，跨帧复用，每个完成或中止的帧之后
/// 截断回3字节的帧头+长度前缀
pub struct FrameListener {
    state: ListenState,
    /// 帧头哨兵（构造时可配置）
    header: [u8; 2],
    /// 重组缓冲区，始终以`[H0][H1][L]`前缀开头
    buffer: Vec<u8>,
    /// CRC收集区
    crc_buf: [u8; 2],
    crc_got: usize,
    /// 每帧截止时间，`None`表示禁用超时
    frame_timeout: Option<Duration>,
    deadline: Option<Instant>,
    stats: LinkStats,
    drop_callback: Option<DropCallback>,
}

impl Default for FrameListener {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameListener {
    /// 创建使用标准帧头和默认超时的监听器
    pub fn new() -> Self {
        Self::with_header(FRAME_HEADER)
    }

    /// 创建使用自定义帧头的监听器
    pub fn with_header(header: [u8; 2]) -> Self {
        Self {
            state: ListenState::WaitHeader1,
            header,
            buffer: vec![header[0], header[1], 0x00],
            crc_buf: [0; 2],
            crc_got: 0,
            frame_timeout: Some(DEFAULT_FRAME_TIMEOUT),
            deadline: None,
            stats: LinkStats::default(),
            drop_callback: None,
        }
    }

    /// 设置每帧截止时间，`None`禁用超时
    pub fn set_frame_timeout(&mut self, timeout: Option<Duration>) {
        self.frame_timeout = timeout;
    }

    /// 设置丢帧回调
    pub fn set_drop_callback(&mut self, callback: DropCallback) {
        self.drop_callback = Some(callback);
    }

    /// 链路统计信息
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// 清零统计信息
    pub fn reset_stats(&mut self) {
        self.stats = LinkStats::default();
    }

    /// 当前重组缓冲区长度
    ///
    /// 完成或中止一帧之后恒为3（帧头+长度前缀）
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// 是否处于帧中途（已通过帧头，尚未完成）
    pub fn is_mid_frame(&self) -> bool {
        !matches!(
            self.state,
            ListenState::WaitHeader1 | ListenState::WaitHeader2
        )
    }

    /// 推进状态机一步
    ///
    /// 至多消费一个传输字节；字节不可用时仅做超时检查。
    /// 完整帧校验通过并分发后返回命令，其余情况返回`None`
    /// （包括所有本地恢复的丢帧）
    pub fn poll<T: Transport>(
        &mut self,
        transport: &mut T,
        dispatcher: &CommandDispatcher,
    ) -> Option<Command> {
        // 停发的对端不再产生字节，超时检查必须先于取字节
        if self.deadline_expired() {
            self.abort_frame(DropReason::Timeout);
        }

        let byte = transport.read_byte()?;
        self.stats.bytes_consumed += 1;

        match self.state {
            ListenState::WaitHeader1 => {
                if byte == self.header[0] {
                    self.state = ListenState::WaitHeader2;
                }
                None
            }
            ListenState::WaitHeader2 => {
                if byte == self.header[1] {
                    self.state = ListenState::WaitLen;
                } else if byte == self.header[0] {
                    // H1校验失败但该字节本身是候选H0，立即重试，
                    // 避免帧头自重叠时丢失同步
                    self.count_drop(DropReason::SyncLoss);
                } else {
                    self.count_drop(DropReason::SyncLoss);
                    self.state = ListenState::WaitHeader1;
                }
                None
            }
            ListenState::WaitLen => {
                if byte == 0 {
                    // L计入命令字节，0是协议违规
                    self.count_drop(DropReason::BadLength);
                    self.state = ListenState::WaitHeader1;
                } else {
                    self.buffer[2] = byte;
                    self.crc_got = 0;
                    self.arm_deadline();
                    self.state = ListenState::WaitData;
                }
                None
            }
            ListenState::WaitData => {
                self.buffer.push(byte);
                if self.buffer.len() == FRAME_PREFIX_LEN + self.buffer[2] as usize {
                    self.state = ListenState::WaitCrc;
                }
                None
            }
            ListenState::WaitCrc => {
                self.crc_buf[self.crc_got] = byte;
                self.crc_got += 1;
                if self.crc_got < 2 {
                    return None;
                }

                if self.verify_crc() {
                    self.state = ListenState::Received;
                    self.complete_frame(dispatcher)
                } else {
                    self.abort_frame(DropReason::CrcMismatch);
                    None
                }
            }
            // Received在complete_frame中同步消解，poll不会停留在此
            ListenState::Received => None,
        }
    }

    /// 排空当前所有可用字节
    ///
    /// 无字节可读时仍至少推进一次超时检查
    ///
    /// # 返回
    /// 本次排空期间完成分发的帧数
    pub fn pump<T: Transport>(
        &mut self,
        transport: &mut T,
        dispatcher: &CommandDispatcher,
    ) -> usize {
        let mut frames = 0;
        loop {
            let had_byte = transport.byte_available();
            if self.poll(transport, dispatcher).is_some() {
                frames += 1;
            }
            if !had_byte {
                break;
            }
        }
        frames
    }

    /// 校验收集到的CRC
    ///
    /// CRC覆盖帧头+长度+数据区，不含CRC字节本身，大端序比较
    fn verify_crc(&self) -> bool {
        let expected = mccl_core::utils::calculate_crc16_xmodem(&self.buffer);
        let actual = ((self.crc_buf[0] as u16) << 8) | (self.crc_buf[1] as u16);
        expected == actual
    }

    /// 消解Received状态：解码、分发、复位
    fn complete_frame(&mut self, dispatcher: &CommandDispatcher) -> Option<Command> {
        debug_assert_eq!(self.state, ListenState::Received);

        let result = match decode_command(&self.buffer[FRAME_PREFIX_LEN..]) {
            Ok((cmd, payload)) => {
                dispatcher.trigger_with(cmd, &payload);
                self.stats.frames_received += 1;
                Some(cmd)
            }
            Err(LinkError::UnknownCommand(_)) => {
                self.count_drop(DropReason::UnknownCommand);
                None
            }
            Err(_) => {
                self.count_drop(DropReason::BadPayload);
                None
            }
        };

        self.reset_to_scan();
        result
    }

    /// 中止当前帧并回到扫描状态
    fn abort_frame(&mut self, reason: DropReason) {
        self.count_drop(reason);
        self.reset_to_scan();
    }

    /// 截断缓冲区回前缀，复位状态机
    fn reset_to_scan(&mut self) {
        self.buffer.truncate(FRAME_PREFIX_LEN);
        self.buffer[2] = 0x00;
        self.crc_got = 0;
        self.deadline = None;
        self.state = ListenState::WaitHeader1;
    }

    /// 记录丢帧原因并触发回调
    fn count_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::SyncLoss => self.stats.sync_losses += 1,
            DropReason::CrcMismatch => self.stats.crc_errors += 1,
            DropReason::Timeout => self.stats.frame_timeouts += 1,
            DropReason::BadLength | DropReason::UnknownCommand | DropReason::BadPayload => {
                self.stats.decode_errors += 1
            }
        }
        if let Some(callback) = self.drop_callback {
            callback(reason);
        }
    }

    fn arm_deadline(&mut self) {
        self.deadline = self.frame_timeout.map(|timeout| Instant::now() + timeout);
    }

    fn deadline_expired(&self) -> bool {
        matches!(self.state, ListenState::WaitData | ListenState::WaitCrc)
            && self
                .deadline
                .map(|deadline| Instant::now() > deadline)
                .unwrap_or(false)
    }
}
