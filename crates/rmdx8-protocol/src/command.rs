//! 命令目录（CommandSet）与请求帧构建
//!
//! RMD-X8 的每个操作对应一个固定命令字节；本模块以静态表的形式
//! 声明每个命令的出站负载布局与预期应答布局（[`CommandSpec`]），
//! 并提供请求帧构建（[`build_request`]）与应答关联校验
//! （[`expect_reply`]）。表数据来自设备寄存器表——目录本身的
//! 正确性是整个驱动正确性的关键。

use crate::value::{FieldSpec, FieldWidth, Unit};
use crate::{MotorId, ProtocolError, RmdFrame, constants::*};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 命令字节目录
///
/// 与设备文档中的命令表一一对应。RAM/ROM 写入变体负载布局相同，
/// 仅命令字节（断电持久性）不同。
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum Command {
    /// 将当前位置写入 ROM 作为电机零点（重新上电后生效）
    WriteZeroToRom = 0x19,
    /// 读取 PID 参数
    ReadPid = 0x30,
    /// 写 PID 参数到 RAM
    WritePidRam = 0x31,
    /// 写 PID 参数到 ROM
    WritePidRom = 0x32,
    /// 读取加速度
    ReadAcceleration = 0x33,
    /// 写加速度到 RAM
    WriteAccelerationRam = 0x34,
    /// 电机关闭（清除运行状态与已接收的控制指令）
    MotorOff = 0x80,
    /// 电机停止（保留运行状态与控制指令）
    MotorStop = 0x81,
    /// 从停止状态恢复运行
    MotorRunning = 0x88,
    /// 读取编码器位置
    ReadEncoder = 0x90,
    /// 写编码器偏置
    WriteEncoderOffset = 0x91,
    /// 读取多圈角度
    ReadMultiTurnAngle = 0x92,
    /// 读取单圈角度
    ReadSingleTurnAngle = 0x94,
    /// 读取状态 1（温度、电压、错误标志）
    ReadStatus1 = 0x9A,
    /// 清除错误标志（应答布局同状态 1）
    ClearErrorFlag = 0x9B,
    /// 读取状态 2（温度、转矩电流、转速、编码器位置）
    ReadStatus2 = 0x9C,
    /// 读取状态 3（相电流）
    ReadStatus3 = 0x9D,
    /// 转矩闭环
    TorqueClosedLoop = 0xA1,
    /// 速度闭环
    SpeedClosedLoop = 0xA2,
    /// 位置闭环 1（多圈角度）
    PositionClosedLoop1 = 0xA3,
    /// 位置闭环 2（多圈角度 + 限速）
    PositionClosedLoop2 = 0xA4,
    /// 位置闭环 3（单圈角度 + 方向）
    PositionClosedLoop3 = 0xA5,
    /// 位置闭环 4（单圈角度 + 方向 + 限速）
    PositionClosedLoop4 = 0xA6,
}

/// 单个命令的静态描述：出站负载布局 + 预期应答负载布局
///
/// 只读命令的 `request_fields` 为空（命令字节之外全部补零）；
/// 写入/闭环命令的应答为状态回报或对指令的回显，回显仅用于
/// 关联校验。
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub request_fields: &'static [FieldSpec],
    pub reply_fields: &'static [FieldSpec],
}

const NO_FIELDS: &[FieldSpec] = &[];

/// PID 参数：6 个 u8 增益，位于 DATA[2..8]
/// 顺序：位置环 Kp/Ki、速度环 Kp/Ki、转矩环 Kp/Ki
const PID_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(2, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(3, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(4, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(5, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(6, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(7, FieldWidth::U8, 1.0, Unit::Count),
];

/// 加速度：i32 于 DATA[4..8]，1 dps/s / LSB
const ACCEL_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    4,
    FieldWidth::I32,
    1.0,
    Unit::DegreesPerSecondSquared,
)];

/// 编码器读取应答：当前位置、原始值、偏置，各 u16
const ENCODER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(2, FieldWidth::U16, 1.0, Unit::Count),
    FieldSpec::new(4, FieldWidth::U16, 1.0, Unit::Count),
    FieldSpec::new(6, FieldWidth::U16, 1.0, Unit::Count),
];

/// 编码器偏置：u16 于 DATA[6..8]
const ENCODER_OFFSET_FIELDS: &[FieldSpec] =
    &[FieldSpec::new(6, FieldWidth::U16, 1.0, Unit::Count)];

/// 多圈角度：7 字节补码整数于 DATA[1..8]，0.01°/LSB
const MULTI_TURN_ANGLE_FIELDS: &[FieldSpec] =
    &[FieldSpec::new(1, FieldWidth::I56, ANGLE_SCALE, Unit::Degrees)];

/// 单圈角度：u16 于 DATA[6..8]，0.01°/LSB（0~35999）
const SINGLE_TURN_ANGLE_FIELDS: &[FieldSpec] =
    &[FieldSpec::new(6, FieldWidth::U16, ANGLE_SCALE, Unit::Degrees)];

/// 状态 1 / 清错应答：温度 i8、母线电压 u16（0.1 V）、错误标志 u8
const STATUS_1_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(1, FieldWidth::I8, 1.0, Unit::Celsius),
    FieldSpec::new(3, FieldWidth::U16, VOLTAGE_SCALE, Unit::Volts),
    FieldSpec::new(7, FieldWidth::U8, 1.0, Unit::Count),
];

/// 状态 2 / 闭环应答：温度 i8、转矩电流 i16、转速 i16（1 dps）、
/// 编码器位置 u16
const STATUS_2_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(1, FieldWidth::I8, 1.0, Unit::Celsius),
    FieldSpec::new(2, FieldWidth::I16, IQ_FEEDBACK_SCALE, Unit::Amperes),
    FieldSpec::new(4, FieldWidth::I16, 1.0, Unit::DegreesPerSecond),
    FieldSpec::new(6, FieldWidth::U16, 1.0, Unit::Count),
];

/// 状态 3：温度 i8、三相电流各 i16（1 A / 64 LSB）
const STATUS_3_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(1, FieldWidth::I8, 1.0, Unit::Celsius),
    FieldSpec::new(2, FieldWidth::I16, PHASE_CURRENT_SCALE, Unit::Amperes),
    FieldSpec::new(4, FieldWidth::I16, PHASE_CURRENT_SCALE, Unit::Amperes),
    FieldSpec::new(6, FieldWidth::I16, PHASE_CURRENT_SCALE, Unit::Amperes),
];

/// 转矩闭环：iq 指令 i16 于 DATA[4..6]，-2000~2000 对应 ±32 A
const TORQUE_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    4,
    FieldWidth::I16,
    TORQUE_COMMAND_SCALE,
    Unit::Amperes,
)];

/// 速度闭环：i32 于 DATA[4..8]，0.01 dps/LSB
const SPEED_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    4,
    FieldWidth::I32,
    SPEED_COMMAND_SCALE,
    Unit::DegreesPerSecond,
)];

/// 位置闭环 1：多圈目标角 i32 于 DATA[4..8]，0.01°/LSB
const POSITION_1_FIELDS: &[FieldSpec] =
    &[FieldSpec::new(4, FieldWidth::I32, ANGLE_SCALE, Unit::Degrees)];

/// 位置闭环 2：限速 u16（1 dps）+ 多圈目标角 i32
const POSITION_2_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(2, FieldWidth::U16, 1.0, Unit::DegreesPerSecond),
    FieldSpec::new(4, FieldWidth::I32, ANGLE_SCALE, Unit::Degrees),
];

/// 位置闭环 3：旋转方向 u8 + 单圈目标角 u16（0.01°）
const POSITION_3_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(1, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(4, FieldWidth::U16, ANGLE_SCALE, Unit::Degrees),
];

/// 位置闭环 4：旋转方向 u8 + 限速 u16 + 单圈目标角 u16
const POSITION_4_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(1, FieldWidth::U8, 1.0, Unit::Count),
    FieldSpec::new(2, FieldWidth::U16, 1.0, Unit::DegreesPerSecond),
    FieldSpec::new(4, FieldWidth::U16, ANGLE_SCALE, Unit::Degrees),
];

impl Command {
    /// 查询命令的静态描述
    pub const fn spec(self) -> &'static CommandSpec {
        macro_rules! spec {
            ($request:expr, $reply:expr) => {
                &CommandSpec {
                    request_fields: $request,
                    reply_fields: $reply,
                }
            };
        }

        match self {
            Command::WriteZeroToRom => spec!(NO_FIELDS, NO_FIELDS),
            Command::ReadPid => spec!(NO_FIELDS, PID_FIELDS),
            Command::WritePidRam => spec!(PID_FIELDS, PID_FIELDS),
            Command::WritePidRom => spec!(PID_FIELDS, PID_FIELDS),
            Command::ReadAcceleration => spec!(NO_FIELDS, ACCEL_FIELDS),
            Command::WriteAccelerationRam => spec!(ACCEL_FIELDS, ACCEL_FIELDS),
            Command::MotorOff => spec!(NO_FIELDS, NO_FIELDS),
            Command::MotorStop => spec!(NO_FIELDS, NO_FIELDS),
            Command::MotorRunning => spec!(NO_FIELDS, NO_FIELDS),
            Command::ReadEncoder => spec!(NO_FIELDS, ENCODER_FIELDS),
            Command::WriteEncoderOffset => spec!(ENCODER_OFFSET_FIELDS, ENCODER_OFFSET_FIELDS),
            Command::ReadMultiTurnAngle => spec!(NO_FIELDS, MULTI_TURN_ANGLE_FIELDS),
            Command::ReadSingleTurnAngle => spec!(NO_FIELDS, SINGLE_TURN_ANGLE_FIELDS),
            Command::ReadStatus1 => spec!(NO_FIELDS, STATUS_1_FIELDS),
            Command::ClearErrorFlag => spec!(NO_FIELDS, STATUS_1_FIELDS),
            Command::ReadStatus2 => spec!(NO_FIELDS, STATUS_2_FIELDS),
            Command::ReadStatus3 => spec!(NO_FIELDS, STATUS_3_FIELDS),
            Command::TorqueClosedLoop => spec!(TORQUE_FIELDS, STATUS_2_FIELDS),
            Command::SpeedClosedLoop => spec!(SPEED_FIELDS, STATUS_2_FIELDS),
            Command::PositionClosedLoop1 => spec!(POSITION_1_FIELDS, STATUS_2_FIELDS),
            Command::PositionClosedLoop2 => spec!(POSITION_2_FIELDS, STATUS_2_FIELDS),
            Command::PositionClosedLoop3 => spec!(POSITION_3_FIELDS, STATUS_2_FIELDS),
            Command::PositionClosedLoop4 => spec!(POSITION_4_FIELDS, STATUS_2_FIELDS),
        }
    }

    /// 从应答帧命令字节解析命令
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        Self::try_from(byte).map_err(|_| ProtocolError::UnknownCommand { id: byte })
    }
}

/// 单圈位置闭环（0xA5/0xA6）的旋转方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinDirection {
    /// 顺时针
    #[default]
    Clockwise = 0x00,
    /// 逆时针
    CounterClockwise = 0x01,
}

impl TryFrom<u8> for SpinDirection {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(SpinDirection::Clockwise),
            0x01 => Ok(SpinDirection::CounterClockwise),
            _ => Err(ProtocolError::InvalidValue {
                field: "SpinDirection".to_string(),
                value,
            }),
        }
    }
}

/// 构建一条出站请求帧
///
/// `values` 必须与命令声明的出站字段按序对应（物理量，编码由各
/// 字段的 [`FieldSpec`] 完成）；数量不符或任一字段越界都会在写入
/// 总线之前失败，不会产生部分填充的帧。
pub fn build_request(
    motor: MotorId,
    command: Command,
    values: &[f64],
) -> Result<RmdFrame, ProtocolError> {
    let spec = command.spec();
    if values.len() != spec.request_fields.len() {
        return Err(ProtocolError::FieldCount {
            expected: spec.request_fields.len(),
            actual: values.len(),
        });
    }

    let mut data = [0u8; 8];
    data[0] = command.into();
    for (field, value) in spec.request_fields.iter().zip(values) {
        field.encode(*value, &mut data)?;
    }

    Ok(RmdFrame::new(motor.can_id(), data))
}

/// 校验应答帧与未决请求的关联
///
/// 协议按到达顺序关联请求与应答：仲裁 ID 必须是该电机的 ID，
/// 命令字节必须回显请求命令。任一不符即判定为共享总线上的
/// 串扰/错位，拒绝解码。
pub fn expect_reply(
    motor: MotorId,
    command: Command,
    frame: &RmdFrame,
) -> Result<(), ProtocolError> {
    if frame.id != motor.can_id() {
        return Err(ProtocolError::UnexpectedCanId {
            expected: motor.can_id(),
            actual: frame.id,
        });
    }

    let expected: u8 = command.into();
    if frame.command_byte() != expected {
        return Err(ProtocolError::UnexpectedCommand {
            expected,
            actual: frame.command_byte(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motor() -> MotorId {
        MotorId::new(1).unwrap()
    }

    #[test]
    fn test_command_bytes_match_register_map() {
        assert_eq!(u8::from(Command::ReadPid), 0x30);
        assert_eq!(u8::from(Command::WritePidRam), 0x31);
        assert_eq!(u8::from(Command::WritePidRom), 0x32);
        assert_eq!(u8::from(Command::WriteZeroToRom), 0x19);
        assert_eq!(u8::from(Command::ReadMultiTurnAngle), 0x92);
        assert_eq!(u8::from(Command::ReadSingleTurnAngle), 0x94);
        assert_eq!(u8::from(Command::TorqueClosedLoop), 0xA1);
        assert_eq!(u8::from(Command::PositionClosedLoop4), 0xA6);
    }

    #[test]
    fn test_from_byte_unknown() {
        assert!(Command::from_byte(0x30).is_ok());
        let err = Command::from_byte(0x42).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand { id: 0x42 }));
    }

    #[test]
    fn test_ram_rom_variants_share_payload_shape() {
        let ram = Command::WritePidRam.spec();
        let rom = Command::WritePidRom.spec();
        assert_eq!(ram.request_fields.len(), rom.request_fields.len());
        for (a, b) in ram.request_fields.iter().zip(rom.request_fields) {
            assert_eq!(a.offset, b.offset);
            assert_eq!(a.width, b.width);
        }
    }

    #[test]
    fn test_build_request_read_is_zero_padded() {
        let frame = build_request(motor(), Command::ReadPid, &[]).unwrap();
        assert_eq!(frame.id, 0x141);
        assert_eq!(frame.data, [0x30, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_build_request_position_1() {
        // 90.00° → 9000 → 0x2328，小端在 DATA[4..8]
        let frame = build_request(motor(), Command::PositionClosedLoop1, &[90.0]).unwrap();
        assert_eq!(frame.data, [0xA3, 0, 0, 0, 0x28, 0x23, 0, 0]);
    }

    #[test]
    fn test_build_request_position_4_layout() {
        let frame = build_request(
            motor(),
            Command::PositionClosedLoop4,
            &[SpinDirection::CounterClockwise as u8 as f64, 500.0, 180.0],
        )
        .unwrap();
        assert_eq!(frame.data[0], 0xA6);
        assert_eq!(frame.data[1], 0x01); // 方向
        assert_eq!(&frame.data[2..4], &500u16.to_le_bytes()); // 限速
        assert_eq!(&frame.data[4..6], &18000u16.to_le_bytes()); // 180.00°
    }

    #[test]
    fn test_build_request_field_count_mismatch() {
        let err = build_request(motor(), Command::SpeedClosedLoop, &[]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FieldCount {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_build_request_out_of_range_produces_no_frame() {
        // 转矩指令上限 2000 × 0.016 A = 32 A
        let err = build_request(motor(), Command::TorqueClosedLoop, &[40.0]).unwrap_err();
        assert!(matches!(err, ProtocolError::OutOfRange { .. }));
    }

    #[test]
    fn test_expect_reply_accepts_echo() {
        let reply = RmdFrame::new(0x141, [0x30, 0, 0, 0, 0, 0, 0, 0]);
        assert!(expect_reply(motor(), Command::ReadPid, &reply).is_ok());
    }

    #[test]
    fn test_expect_reply_wrong_command() {
        let reply = RmdFrame::new(0x141, [0x9C, 0, 0, 0, 0, 0, 0, 0]);
        let err = expect_reply(motor(), Command::ReadPid, &reply).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedCommand {
                expected: 0x30,
                actual: 0x9C
            }
        ));
    }

    #[test]
    fn test_expect_reply_wrong_can_id() {
        // 另一台电机（0x142）的应答不得被归属到本电机
        let reply = RmdFrame::new(0x142, [0x30, 0, 0, 0, 0, 0, 0, 0]);
        let err = expect_reply(motor(), Command::ReadPid, &reply).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedCanId { .. }));
    }

    #[test]
    fn test_spin_direction() {
        assert_eq!(SpinDirection::try_from(0x00).unwrap(), SpinDirection::Clockwise);
        assert_eq!(
            SpinDirection::try_from(0x01).unwrap(),
            SpinDirection::CounterClockwise
        );
        assert!(SpinDirection::try_from(0x02).is_err());
    }

    #[test]
    fn test_closed_loop_replies_use_status_2_layout() {
        for command in [
            Command::TorqueClosedLoop,
            Command::SpeedClosedLoop,
            Command::PositionClosedLoop1,
            Command::PositionClosedLoop2,
            Command::PositionClosedLoop3,
            Command::PositionClosedLoop4,
        ] {
            assert_eq!(command.spec().reply_fields.len(), 4);
            assert_eq!(command.spec().reply_fields[0].offset, 1);
        }
    }
}
