//! 帧编解码模块
//!
//! 线上帧格式：
//! `[H0][H1][L][cmd][payload...(L-1字节)][CRC_hi][CRC_lo]`
//!
//! - 帧头固定为0x59 0x49
//! - L为数据区长度（命令字节 + 载荷字节数），取值1..=255
//! - CRC为CRC-16/XMODEM，覆盖帧头+长度+数据区，大端序传输

use crate::command::{Command, Payload, PayloadKind};
use crate::error::LinkError;
use crate::utils::calculate_crc16_xmodem;

/// 帧头哨兵字节
pub const FRAME_HEADER: [u8; 2] = [0x59, 0x49];

/// 帧头+长度字节的前缀长度
pub const FRAME_PREFIX_LEN: usize = 3;

/// 帧的固定开销（2字节帧头 + 1字节长度 + 2字节CRC）
pub const FRAME_OVERHEAD: usize = 5;

/// 数据区最大长度（受单字节长度字段限制）
pub const MAX_DATA_LEN: usize = 255;

/// 组装完整帧
///
/// # 参数
/// - `data`: 数据区（命令字节 + 载荷），长度1..=255
///
/// # 返回
/// - `Ok(Vec<u8>)`: 完整帧字节序列
/// - `Err(LinkError)`: 数据区长度非法
pub fn encode_frame(data: &[u8]) -> Result<Vec<u8>, LinkError> {
    if data.is_empty() {
        return Err(LinkError::LengthError(
            "Frame data must contain at least the command byte".to_string(),
        ));
    }
    if data.len() > MAX_DATA_LEN {
        return Err(LinkError::LengthError(format!(
            "Frame data length {} exceeds maximum {}",
            data.len(),
            MAX_DATA_LEN
        )));
    }

    let mut frame = Vec::with_capacity(data.len() + FRAME_OVERHEAD);
    frame.extend_from_slice(&FRAME_HEADER);
    frame.push(data.len() as u8);
    frame.extend_from_slice(data);

    let crc = calculate_crc16_xmodem(&frame);
    frame.push((crc >> 8) as u8);
    frame.push((crc & 0xFF) as u8);

    Ok(frame)
}

/// 组装携带命令和载荷的完整帧
///
/// # 返回
/// - `Err(LinkError::PayloadError)`: 载荷形状与命令约定不符
pub fn encode_command(cmd: Command, payload: &Payload) -> Result<Vec<u8>, LinkError> {
    if payload.kind() != cmd.payload_kind() {
        return Err(LinkError::PayloadError(format!(
            "Command {:?} expects payload kind {:?}, got {:?}",
            cmd,
            cmd.payload_kind(),
            payload.kind()
        )));
    }

    let mut data = vec![cmd.as_byte()];
    data.extend_from_slice(&payload.to_bytes());
    encode_frame(&data)
}

/// 校验完整帧并返回数据区
///
/// 检查帧头、长度一致性和CRC，全部通过后返回数据区切片
///
/// # 返回
/// - `Ok(&[u8])`: 数据区（命令字节 + 载荷）
/// - `Err(LinkError)`: 帧头错误、长度不符或CRC不匹配
pub fn check_frame(frame: &[u8]) -> Result<&[u8], LinkError> {
    if frame.len() < FRAME_OVERHEAD + 1 {
        return Err(LinkError::LengthError(format!(
            "Frame too short: {} bytes",
            frame.len()
        )));
    }
    if frame[0] != FRAME_HEADER[0] || frame[1] != FRAME_HEADER[1] {
        return Err(LinkError::InvalidFrameFormat(format!(
            "Bad header: expected {:02X} {:02X}, got {:02X} {:02X}",
            FRAME_HEADER[0], FRAME_HEADER[1], frame[0], frame[1]
        )));
    }

    let data_len = frame[2] as usize;
    if data_len == 0 {
        return Err(LinkError::LengthError(
            "Length field must count the command byte".to_string(),
        ));
    }
    if frame.len() != FRAME_PREFIX_LEN + data_len + 2 {
        return Err(LinkError::LengthError(format!(
            "Frame length {} does not match declared data length {}",
            frame.len(),
            data_len
        )));
    }

    let crc_offset = FRAME_PREFIX_LEN + data_len;
    let expected = calculate_crc16_xmodem(&frame[..crc_offset]);
    let actual = ((frame[crc_offset] as u16) << 8) | (frame[crc_offset + 1] as u16);
    if expected != actual {
        return Err(LinkError::ChecksumError(format!(
            "CRC mismatch: expected 0x{expected:04X}, got 0x{actual:04X}"
        )));
    }

    Ok(&frame[FRAME_PREFIX_LEN..crc_offset])
}

/// 按命令载荷表解码数据区
///
/// 数据区首字节为命令码，其余字节按[`Command::payload_kind`]
/// 解释。无载荷命令后跟多余字节时予以容忍（忽略多余部分）
///
/// # 返回
/// - `Ok((Command, Payload))`: 解码出的命令和载荷
/// - `Err(LinkError)`: 命令字节未定义或载荷不足
pub fn decode_command(data: &[u8]) -> Result<(Command, Payload), LinkError> {
    let cmd_byte = *data
        .first()
        .ok_or_else(|| LinkError::LengthError("Empty frame data".to_string()))?;
    let cmd = Command::from_byte(cmd_byte).ok_or(LinkError::UnknownCommand(cmd_byte))?;

    let payload = match cmd.payload_kind() {
        PayloadKind::None => Payload::None,
        PayloadKind::Byte => {
            let value = *data.get(1).ok_or_else(|| {
                LinkError::PayloadError(format!(
                    "Command {cmd:?} requires a payload byte, frame carries none"
                ))
            })?;
            Payload::Byte(value)
        }
    };

    Ok((cmd, payload))
}

/// 校验并解码完整帧
pub fn decode_frame(frame: &[u8]) -> Result<(Command, Payload), LinkError> {
    let data = check_frame(frame)?;
    decode_command(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_start_concrete_bytes() {
        // Start命令无载荷：59 49 01 00 + CRC
        let frame = encode_command(Command::Start, &Payload::None).unwrap();
        assert_eq!(&frame[..4], &[0x59, 0x49, 0x01, 0x00]);
        assert_eq!(frame.len(), 6);

        let crc = calculate_crc16_xmodem(&frame[..4]);
        assert_eq!(frame[4], (crc >> 8) as u8);
        assert_eq!(frame[5], (crc & 0xFF) as u8);
    }

    #[test]
    fn test_encode_set_speed_concrete_bytes() {
        // SetSpeed(0x2A)：59 49 02 03 2A + CRC
        let frame = encode_command(Command::SetSpeed, &Payload::Byte(0x2A)).unwrap();
        assert_eq!(&frame[..5], &[0x59, 0x49, 0x02, 0x03, 0x2A]);
        assert_eq!(frame.len(), 7);
    }

    #[test]
    fn test_encode_payload_kind_mismatch() {
        assert!(matches!(
            encode_command(Command::Start, &Payload::Byte(0x01)),
            Err(LinkError::PayloadError(_))
        ));
        assert!(matches!(
            encode_command(Command::SetSpeed, &Payload::None),
            Err(LinkError::PayloadError(_))
        ));
    }

    #[test]
    fn test_frame_round_trip_all_commands() {
        let cases = [
            (Command::Start, Payload::None),
            (Command::Stop, Payload::None),
            (Command::Reverse, Payload::None),
            (Command::SetSpeed, Payload::Byte(0x2A)),
            (Command::SetSpeed, Payload::Byte(0x00)),
            (Command::SetSpeed, Payload::Byte(0xFF)),
        ];
        for (cmd, payload) in cases {
            let frame = encode_command(cmd, &payload).unwrap();
            let (decoded_cmd, decoded_payload) = decode_frame(&frame).unwrap();
            assert_eq!(decoded_cmd, cmd);
            assert_eq!(decoded_payload, payload);
        }
    }

    #[test]
    fn test_raw_round_trip_all_lengths() {
        // 数据区长度1..=255全覆盖
        for len in 1..=MAX_DATA_LEN {
            let data: Vec<u8> = (0..len).map(|i| (i & 0xFF) as u8).collect();
            let frame = encode_frame(&data).unwrap();
            assert_eq!(frame.len(), len + FRAME_OVERHEAD);
            assert_eq!(check_frame(&frame).unwrap(), &data[..]);
        }
    }

    #[test]
    fn test_encode_rejects_bad_lengths() {
        assert!(matches!(
            encode_frame(&[]),
            Err(LinkError::LengthError(_))
        ));
        let oversized = vec![0u8; MAX_DATA_LEN + 1];
        assert!(matches!(
            encode_frame(&oversized),
            Err(LinkError::LengthError(_))
        ));
    }

    #[test]
    fn test_check_frame_detects_corruption() {
        let frame = encode_command(Command::SetSpeed, &Payload::Byte(0x2A)).unwrap();

        // 翻转CRC区任意一位都必须被检出
        for byte_idx in 0..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte_idx] ^= 1 << bit;
                assert!(
                    check_frame(&corrupted).is_err(),
                    "corruption at byte {byte_idx} bit {bit} not detected"
                );
            }
        }
    }

    #[test]
    fn test_check_frame_bad_header() {
        let mut frame = encode_command(Command::Start, &Payload::None).unwrap();
        frame[0] = 0xAA;
        assert!(matches!(
            check_frame(&frame),
            Err(LinkError::InvalidFrameFormat(_))
        ));
    }

    #[test]
    fn test_decode_unknown_command() {
        let frame = encode_frame(&[0x7F]).unwrap();
        assert!(matches!(
            decode_frame(&frame),
            Err(LinkError::UnknownCommand(0x7F))
        ));
    }

    #[test]
    fn test_decode_missing_payload_byte() {
        // SetSpeed命令但数据区只有命令字节
        let frame = encode_frame(&[Command::SetSpeed.as_byte()]).unwrap();
        assert!(matches!(
            decode_frame(&frame),
            Err(LinkError::PayloadError(_))
        ));
    }

    #[test]
    fn test_decode_tolerates_trailing_bytes() {
        // 无载荷命令后跟多余字节：容忍并忽略
        let frame = encode_frame(&[Command::Stop.as_byte(), 0xEE]).unwrap();
        let (cmd, payload) = decode_frame(&frame).unwrap();
        assert_eq!(cmd, Command::Stop);
        assert_eq!(payload, Payload::None);
    }
}
