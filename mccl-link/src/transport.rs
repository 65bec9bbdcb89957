//! 传输层接口
//!
//! 定义串行传输的字节级接口，链路核心只消费该接口，
//! 不关心底层是UART、USB还是内存回环

use mccl_core::LinkError;

/// 字节传输接口
///
/// 语义约定：
/// - `read_byte`为非阻塞读，无字节可读时返回`None`
/// - `read_exact`为整块读，字节不足时返回传输错误
/// - `write_bytes`一次性写出整个缓冲区
pub trait Transport {
    /// 是否有字节可读
    fn byte_available(&self) -> bool;

    /// 非阻塞读取一个字节
    fn read_byte(&mut self) -> Option<u8>;

    /// 整块读取恰好`buf.len()`个字节
    ///
    /// # 返回
    /// - `Err(LinkError::TransportError)`: 可读字节不足
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), LinkError> {
        for slot in buf.iter_mut() {
            *slot = self.read_byte().ok_or_else(|| {
                LinkError::TransportError("Stream exhausted during bulk read".to_string())
            })?;
        }
        Ok(())
    }

    /// 写出整个缓冲区
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), LinkError>;
}
