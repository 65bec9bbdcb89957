//! 工具模块
//!
//! 提供MCCL系统中常用的工具函数

/// CRC-16/XMODEM校验算法
///
/// 多项式0x1021，初值0x0000，无输入/输出反射，无最终异或
pub fn calculate_crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0x0000;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// 将字节数组转换为十六进制字符串
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 将十六进制字符串转换为字节数组
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    let clean_str = hex_str.replace(" ", "");
    let mut bytes = Vec::new();
    for i in (0..clean_str.len()).step_by(2) {
        let byte_str = &clean_str[i..i + 2];
        let byte = u8::from_str_radix(byte_str, 16)?;
        bytes.push(byte);
    }
    Ok(bytes)
}
