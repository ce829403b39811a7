//! 应答帧结构体定义
//!
//! 包含所有电机应答帧的结构体，提供从 [`RmdFrame`] 解析的方法
//! 和物理量转换方法。解析统一经由命令目录中声明的字段描述完成，
//! 结构体存储原始整数，物理量通过访问方法按标定系数换算。

use crate::command::Command;
use crate::constants::*;
use crate::value::FieldSpec;
use crate::{ProtocolError, RmdFrame};
use bilge::prelude::*;

fn reply_fields(command: Command) -> &'static [FieldSpec] {
    command.spec().reply_fields
}

fn unexpected(expected: Command, frame: &RmdFrame) -> ProtocolError {
    ProtocolError::UnexpectedCommand {
        expected: expected.into(),
        actual: frame.command_byte(),
    }
}

// ============================================================================
// PID 参数
// ============================================================================

/// PID 参数（0x30 应答 / 0x31、0x32 负载）
///
/// 三个控制环各一对 Kp/Ki 增益，均为无量纲 u8。
/// 读取（0x30）与写入回显（0x31/0x32）共用本结构。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    pub position_kp: u8, // Byte 2
    pub position_ki: u8, // Byte 3
    pub speed_kp: u8,    // Byte 4
    pub speed_ki: u8,    // Byte 5
    pub torque_kp: u8,   // Byte 6
    pub torque_ki: u8,   // Byte 7
}

impl PidGains {
    /// 按命令目录声明的字段顺序展开为物理量序列（供请求编码）
    pub fn to_values(self) -> [f64; 6] {
        [
            self.position_kp as f64,
            self.position_ki as f64,
            self.speed_kp as f64,
            self.speed_ki as f64,
            self.torque_kp as f64,
            self.torque_ki as f64,
        ]
    }

    fn decode(data: &[u8; 8]) -> Self {
        let fields = reply_fields(Command::ReadPid);
        Self {
            position_kp: fields[0].decode_raw(data) as u8,
            position_ki: fields[1].decode_raw(data) as u8,
            speed_kp: fields[2].decode_raw(data) as u8,
            speed_ki: fields[3].decode_raw(data) as u8,
            torque_kp: fields[4].decode_raw(data) as u8,
            torque_ki: fields[5].decode_raw(data) as u8,
        }
    }
}

impl TryFrom<RmdFrame> for PidGains {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        match Command::from_byte(frame.command_byte()) {
            Ok(Command::ReadPid | Command::WritePidRam | Command::WritePidRom) => {
                Ok(Self::decode(&frame.data))
            },
            _ => Err(unexpected(Command::ReadPid, &frame)),
        }
    }
}

// ============================================================================
// 加速度
// ============================================================================

/// 加速度（0x33 应答 / 0x34 回显）
///
/// 原始值单位 1 dps/s。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Acceleration {
    pub raw: i32, // Byte 4-7，单位 1 dps/s
}

impl Acceleration {
    /// 加速度（°/s²）
    pub fn dps2(&self) -> f64 {
        self.raw as f64
    }
}

impl TryFrom<RmdFrame> for Acceleration {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        match Command::from_byte(frame.command_byte()) {
            Ok(Command::ReadAcceleration | Command::WriteAccelerationRam) => {
                let raw = reply_fields(Command::ReadAcceleration)[0].decode_raw(&frame.data) as i32;
                Ok(Self { raw })
            },
            _ => Err(unexpected(Command::ReadAcceleration, &frame)),
        }
    }
}

// ============================================================================
// 编码器
// ============================================================================

/// 编码器读取应答 (0x90)
///
/// `position = raw - offset`，三个值均为 14 位编码器的原始计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderReading {
    /// 扣除偏置后的当前位置（Byte 2-3）
    pub position: u16,
    /// 原始位置（Byte 4-5）
    pub raw: u16,
    /// 偏置（Byte 6-7）
    pub offset: u16,
}

impl TryFrom<RmdFrame> for EncoderReading {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        if frame.command_byte() != u8::from(Command::ReadEncoder) {
            return Err(unexpected(Command::ReadEncoder, &frame));
        }

        let fields = reply_fields(Command::ReadEncoder);
        Ok(Self {
            position: fields[0].decode_raw(&frame.data) as u16,
            raw: fields[1].decode_raw(&frame.data) as u16,
            offset: fields[2].decode_raw(&frame.data) as u16,
        })
    }
}

/// 编码器偏置写入回显 (0x91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderOffset {
    pub offset: u16, // Byte 6-7
}

impl TryFrom<RmdFrame> for EncoderOffset {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        if frame.command_byte() != u8::from(Command::WriteEncoderOffset) {
            return Err(unexpected(Command::WriteEncoderOffset, &frame));
        }

        let offset = reply_fields(Command::WriteEncoderOffset)[0].decode_raw(&frame.data) as u16;
        Ok(Self { offset })
    }
}

// ============================================================================
// 角度
// ============================================================================

/// 多圈角度应答 (0x92)
///
/// 7 字节补码整数，0.01°/LSB，累计旋转角不回绕。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiTurnAngle {
    pub raw: i64, // Byte 1-7，单位 0.01°
}

impl MultiTurnAngle {
    /// 累计角度（°）
    pub fn degrees(&self) -> f64 {
        self.raw as f64 * ANGLE_SCALE
    }
}

impl TryFrom<RmdFrame> for MultiTurnAngle {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        if frame.command_byte() != u8::from(Command::ReadMultiTurnAngle) {
            return Err(unexpected(Command::ReadMultiTurnAngle, &frame));
        }

        let raw = reply_fields(Command::ReadMultiTurnAngle)[0].decode_raw(&frame.data);
        Ok(Self { raw })
    }
}

/// 单圈角度应答 (0x94)
///
/// 以编码器零点为起点、顺时针增加的单圈角，0.01°/LSB，0~35999。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SingleTurnAngle {
    pub raw: u16, // Byte 6-7，单位 0.01°
}

impl SingleTurnAngle {
    /// 单圈角度（°），0.00~359.99
    pub fn degrees(&self) -> f64 {
        self.raw as f64 * ANGLE_SCALE
    }
}

impl TryFrom<RmdFrame> for SingleTurnAngle {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        if frame.command_byte() != u8::from(Command::ReadSingleTurnAngle) {
            return Err(unexpected(Command::ReadSingleTurnAngle, &frame));
        }

        let raw = reply_fields(Command::ReadSingleTurnAngle)[0].decode_raw(&frame.data) as u16;
        Ok(Self { raw })
    }
}

// ============================================================================
// 状态帧
// ============================================================================

/// 错误标志位域（状态 1 Byte 7）
///
/// - Bit 0: 低电压保护（0：正常 1：触发）
/// - Bit 1-2: 保留
/// - Bit 3: 过温保护（0：正常 1：触发）
/// - Bit 4-7: 保留
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct ErrorFlags {
    pub low_voltage: bool,      // Bit 0
    pub reserved0: u2,          // Bit 1-2
    pub over_temperature: bool, // Bit 3
    pub reserved1: u4,          // Bit 4-7
}

impl ErrorFlags {
    /// 是否有任一错误标志置位
    pub fn any(&self) -> bool {
        self.low_voltage() || self.over_temperature()
    }
}

/// 电机状态 1 (0x9A，清错 0x9B 共用布局)
///
/// 温度、母线电压与错误标志。
#[derive(Debug, Clone, Copy)]
pub struct Status1 {
    pub temperature: i8,       // Byte 1，单位 1℃
    pub voltage: u16,          // Byte 3-4，单位 0.1V
    pub error_flags: ErrorFlags, // Byte 7 (位域)
}

impl Status1 {
    /// 电机温度（℃）
    pub fn temperature(&self) -> f64 {
        self.temperature as f64
    }

    /// 母线电压（V）
    pub fn voltage(&self) -> f64 {
        self.voltage as f64 * VOLTAGE_SCALE
    }

    fn decode(data: &[u8; 8]) -> Self {
        let fields = reply_fields(Command::ReadStatus1);
        Self {
            temperature: fields[0].decode_raw(data) as i8,
            voltage: fields[1].decode_raw(data) as u16,
            error_flags: ErrorFlags::from(u8::new(fields[2].decode_raw(data) as u8)),
        }
    }
}

impl TryFrom<RmdFrame> for Status1 {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        match Command::from_byte(frame.command_byte()) {
            Ok(Command::ReadStatus1 | Command::ClearErrorFlag) => Ok(Self::decode(&frame.data)),
            _ => Err(unexpected(Command::ReadStatus1, &frame)),
        }
    }
}

/// 电机状态 2 (0x9C，闭环指令 0xA1~0xA6 的应答共用布局)
///
/// 温度、转矩电流、转速与编码器位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status2 {
    pub temperature: i8,    // Byte 1，单位 1℃
    pub torque_current: i16, // Byte 2-3，原始 -2048~2048 对应 ±33A
    pub speed: i16,         // Byte 4-5，单位 1 dps
    pub encoder: u16,       // Byte 6-7，编码器计数
}

impl Status2 {
    /// 电机温度（℃）
    pub fn temperature(&self) -> f64 {
        self.temperature as f64
    }

    /// 转矩电流（A），可为负（反向）
    pub fn torque_current(&self) -> f64 {
        self.torque_current as f64 * IQ_FEEDBACK_SCALE
    }

    /// 转速（°/s）
    pub fn speed(&self) -> f64 {
        self.speed as f64
    }

    /// 输出轴是否在转动
    pub fn is_rotating(&self) -> bool {
        self.speed != 0
    }

    fn decode(data: &[u8; 8]) -> Self {
        let fields = reply_fields(Command::ReadStatus2);
        Self {
            temperature: fields[0].decode_raw(data) as i8,
            torque_current: fields[1].decode_raw(data) as i16,
            speed: fields[2].decode_raw(data) as i16,
            encoder: fields[3].decode_raw(data) as u16,
        }
    }
}

impl TryFrom<RmdFrame> for Status2 {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        match Command::from_byte(frame.command_byte()) {
            Ok(
                Command::ReadStatus2
                | Command::TorqueClosedLoop
                | Command::SpeedClosedLoop
                | Command::PositionClosedLoop1
                | Command::PositionClosedLoop2
                | Command::PositionClosedLoop3
                | Command::PositionClosedLoop4,
            ) => Ok(Self::decode(&frame.data)),
            _ => Err(unexpected(Command::ReadStatus2, &frame)),
        }
    }
}

/// 电机状态 3 (0x9D)
///
/// 三相电流，1 A/64 LSB。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status3 {
    pub temperature: i8, // Byte 1，单位 1℃
    pub phase_a: i16,    // Byte 2-3
    pub phase_b: i16,    // Byte 4-5
    pub phase_c: i16,    // Byte 6-7
}

impl Status3 {
    /// A 相电流（A）
    pub fn phase_a(&self) -> f64 {
        self.phase_a as f64 * PHASE_CURRENT_SCALE
    }

    /// B 相电流（A）
    pub fn phase_b(&self) -> f64 {
        self.phase_b as f64 * PHASE_CURRENT_SCALE
    }

    /// C 相电流（A）
    pub fn phase_c(&self) -> f64 {
        self.phase_c as f64 * PHASE_CURRENT_SCALE
    }
}

impl TryFrom<RmdFrame> for Status3 {
    type Error = ProtocolError;

    fn try_from(frame: RmdFrame) -> Result<Self, Self::Error> {
        if frame.command_byte() != u8::from(Command::ReadStatus3) {
            return Err(unexpected(Command::ReadStatus3, &frame));
        }

        let fields = reply_fields(Command::ReadStatus3);
        Ok(Self {
            temperature: fields[0].decode_raw(&frame.data) as i8,
            phase_a: fields[1].decode_raw(&frame.data) as i16,
            phase_b: fields[2].decode_raw(&frame.data) as i16,
            phase_c: fields[3].decode_raw(&frame.data) as i16,
        })
    }
}
