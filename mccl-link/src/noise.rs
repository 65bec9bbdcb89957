//! 信道噪声注入
//!
//! 包装任意传输并按配置的概率注入比特错误/丢字节，
//! 用于验证链路在噪声下的自愈行为

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mccl_core::LinkError;

use crate::transport::Transport;

/// 噪声配置
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    /// 误码率（每个字节被翻转一位的概率）
    pub bit_error_rate: f64,
    /// 丢字节率
    pub drop_rate: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            bit_error_rate: 0.0,
            drop_rate: 0.0,
        }
    }
}

/// 噪声信道
///
/// 读方向注入噪声，写方向透明。使用可播种的RNG，
/// 同一种子下噪声序列可复现
pub struct NoisyChannel<T: Transport> {
    inner: T,
    config: NoiseConfig,
    rng: StdRng,
    /// 注入的比特错误计数
    bit_errors_injected: u64,
    /// 丢弃的字节计数
    bytes_dropped: u64,
}

impl<T: Transport> NoisyChannel<T> {
    /// 包装传输并设定噪声配置和随机种子
    pub fn new(inner: T, config: NoiseConfig, seed: u64) -> Self {
        Self {
            inner,
            config,
            rng: StdRng::seed_from_u64(seed),
            bit_errors_injected: 0,
            bytes_dropped: 0,
        }
    }

    /// 取回内层传输
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// 内层传输的可变引用
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// 已注入的比特错误数
    pub fn bit_errors_injected(&self) -> u64 {
        self.bit_errors_injected
    }

    /// 已丢弃的字节数
    pub fn bytes_dropped(&self) -> u64 {
        self.bytes_dropped
    }
}

impl<T: Transport> Transport for NoisyChannel<T> {
    fn byte_available(&self) -> bool {
        self.inner.byte_available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        loop {
            let byte = self.inner.read_byte()?;

            if self.config.drop_rate > 0.0 && self.rng.gen_bool(self.config.drop_rate) {
                self.bytes_dropped += 1;
                continue;
            }

            if self.config.bit_error_rate > 0.0 && self.rng.gen_bool(self.config.bit_error_rate) {
                self.bit_errors_injected += 1;
                let bit = self.rng.gen_range(0..8);
                return Some(byte ^ (1 << bit));
            }

            return Some(byte);
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), LinkError> {
        self.inner.write_bytes(data)
    }
}
