//! # RMD-X8 Protocol
//!
//! RMD-X8 伺服电机 CAN 总线协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量定义（CAN ID 基址、标定系数）
//! - `value`: 数值编解码（物理量 ↔ 原始整数，按字段声明缩放/宽度/符号）
//! - `command`: 命令目录（CommandSet）与请求帧构建/应答关联校验
//! - `feedback`: 应答帧解析为带单位的类型化结构体
//!
//! ## 帧格式
//!
//! 所有帧固定 8 字节数据，`DATA[0]` 为命令字节，电机应答会原样回显。
//! 仲裁 ID 为 `0x140 + 电机编号`（标准帧，编号 1~32），应答使用同一 ID。
//!
//! ## 字节序
//!
//! 协议内多字节字段统一使用 Intel (LSB) 低位在前（小端字节序）。

pub mod command;
pub mod constants;
pub mod feedback;
pub mod value;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use feedback::*;
pub use value::*;

use thiserror::Error;

/// CAN 2.0 标准帧的统一抽象
///
/// `RmdFrame` 是协议层和硬件层之间的中间抽象：协议层通过
/// `build_request()` 构建、`TryFrom<RmdFrame>` 解析，硬件适配层
/// 负责与具体后端（SocketCAN 等）的帧类型互转。
///
/// RMD 协议总是发送 DLC = 8 的数据帧，未使用的负载字节填 0，
/// 因此这里直接使用固定 8 字节数组，不携带长度字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RmdFrame {
    /// CAN 仲裁 ID（标准帧，11-bit）
    pub id: u32,

    /// 帧数据（固定 8 字节，`data[0]` 为命令字节）
    pub data: [u8; 8],
}

impl RmdFrame {
    /// 总线上单帧的固定数据长度
    pub const WIRE_LEN: usize = 8;

    /// 由 ID 和完整 8 字节数据构建帧
    pub fn new(id: u32, data: [u8; 8]) -> Self {
        Self { id, data }
    }

    /// 从总线原始字节构建帧
    ///
    /// 协议是定宽而非自定界的：适配层每次必须交付恰好一帧的数据。
    /// 长度不等于 [`Self::WIRE_LEN`]（包括 0 和超长）一律拒绝。
    pub fn from_wire(id: u32, bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != Self::WIRE_LEN {
            return Err(ProtocolError::BadLength {
                expected: Self::WIRE_LEN,
                actual: bytes.len(),
            });
        }

        let mut data = [0u8; 8];
        data.copy_from_slice(bytes);
        Ok(Self { id, data })
    }

    /// 命令字节（`DATA[0]`，应答帧中为请求命令的回显）
    pub fn command_byte(&self) -> u8 {
        self.data[0]
    }
}

/// 电机在总线上的编号（1~32）
///
/// 一个 `MotorId` 对应一个物理电机；请求与应答共用仲裁 ID
/// `0x140 + 编号`，多电机共享总线时以此区分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorId(u8);

impl MotorId {
    /// 创建电机编号，范围 1~32
    pub fn new(id: u8) -> Result<Self, ProtocolError> {
        if (constants::MOTOR_ID_MIN..=constants::MOTOR_ID_MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(ProtocolError::InvalidMotorId { id })
        }
    }

    /// 原始编号
    pub fn get(self) -> u8 {
        self.0
    }

    /// 该电机请求/应答帧使用的 CAN 仲裁 ID
    pub fn can_id(self) -> u32 {
        constants::CAN_ID_BASE + self.0 as u32
    }
}

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 物理量超出字段宽度/缩放可表示的范围
    #[error("value {value} out of range for field (raw range {min}..={max})")]
    OutOfRange { value: f64, min: i64, max: i64 },

    /// 总线字节数不等于固定帧宽
    #[error("invalid frame length: expected {expected}, got {actual}")]
    BadLength { expected: usize, actual: usize },

    /// 应答命令字节与请求不一致（请求/应答关联失败）
    #[error("unexpected command byte: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedCommand { expected: u8, actual: u8 },

    /// 应答仲裁 ID 与电机不一致（共享总线串扰）
    #[error("unexpected CAN ID: expected 0x{expected:X}, got 0x{actual:X}")]
    UnexpectedCanId { expected: u32, actual: u32 },

    /// 命令字节不在命令目录中
    #[error("unknown command byte: 0x{id:02X}")]
    UnknownCommand { id: u8 },

    /// 电机编号越界
    #[error("invalid motor id {id} (valid range 1-32)")]
    InvalidMotorId { id: u8 },

    /// 构建请求时提供的字段数量与命令声明不符
    #[error("field count mismatch: command expects {expected}, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// 字段取值非法
    #[error("invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },
}

/// 字节序转换工具函数
///
/// RMD 协议使用 Intel (LSB) 低位在前（小端字节序）。
/// 小端字节序转 i32
pub fn bytes_to_i32_le(bytes: [u8; 4]) -> i32 {
    i32::from_le_bytes(bytes)
}

/// 小端字节序转 i16
pub fn bytes_to_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// i32 转小端字节序
pub fn i32_to_bytes_le(value: i32) -> [u8; 4] {
    value.to_le_bytes()
}

/// i16 转小端字节序
pub fn i16_to_bytes_le(value: i16) -> [u8; 2] {
    value.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_from_wire() {
        let frame = RmdFrame::from_wire(0x141, &[0x30, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(frame.id, 0x141);
        assert_eq!(frame.command_byte(), 0x30);
    }

    #[test]
    fn test_frame_from_wire_rejects_bad_lengths() {
        // 0、过短、过长全部拒绝
        for len in [0usize, 1, 7, 9, 16] {
            let bytes = vec![0u8; len];
            let err = RmdFrame::from_wire(0x141, &bytes).unwrap_err();
            match err {
                ProtocolError::BadLength { expected, actual } => {
                    assert_eq!(expected, 8);
                    assert_eq!(actual, len);
                },
                other => panic!("expected BadLength, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_motor_id_range() {
        assert!(MotorId::new(0).is_err());
        assert!(MotorId::new(1).is_ok());
        assert!(MotorId::new(32).is_ok());
        assert!(MotorId::new(33).is_err());
    }

    #[test]
    fn test_motor_id_can_id() {
        let motor = MotorId::new(1).unwrap();
        assert_eq!(motor.can_id(), 0x141);
        let motor = MotorId::new(32).unwrap();
        assert_eq!(motor.can_id(), 0x160);
    }

    #[test]
    fn test_bytes_to_i16_le_negative() {
        assert_eq!(bytes_to_i16_le([0xFF, 0xFF]), -1);
    }

    #[test]
    fn test_bytes_to_i32_le() {
        assert_eq!(bytes_to_i32_le([0x78, 0x56, 0x34, 0x12]), 0x12345678);
    }

    #[test]
    fn test_roundtrip_i32_le() {
        let original = -123_456;
        assert_eq!(bytes_to_i32_le(i32_to_bytes_le(original)), original);
    }

    #[test]
    fn test_roundtrip_i16_le() {
        let original = -1234;
        assert_eq!(bytes_to_i16_le(i16_to_bytes_le(original)), original);
    }
}
