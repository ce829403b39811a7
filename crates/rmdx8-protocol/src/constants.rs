//! 硬件相关常量定义
//!
//! 集中定义 RMD-X8 协议的常量，避免在代码中散落"魔法数"。
//! 标定系数来自设备寄存器表，命名遵循"原始值 × 系数 = 物理量"。

/// 请求/应答帧 CAN 仲裁 ID 基址（实际 ID = 基址 + 电机编号）
pub const CAN_ID_BASE: u32 = 0x140;

/// 电机编号下限
pub const MOTOR_ID_MIN: u8 = 1;

/// 电机编号上限
pub const MOTOR_ID_MAX: u8 = 32;

/// 角度标定：0.01°/LSB（多圈/单圈角度、位置闭环目标共用）
pub const ANGLE_SCALE: f64 = 0.01;

/// 速度闭环目标标定：0.01 dps/LSB
pub const SPEED_COMMAND_SCALE: f64 = 0.01;

/// 母线电压标定：0.1 V/LSB（状态 1）
pub const VOLTAGE_SCALE: f64 = 0.1;

/// 转矩电流指令标定：原始 -2000~2000 对应 -32 A~32 A（0xA1）
pub const TORQUE_COMMAND_SCALE: f64 = 32.0 / 2000.0;

/// 转矩电流反馈标定：原始 -2048~2048 对应 -33 A~33 A（状态 2）
pub const IQ_FEEDBACK_SCALE: f64 = 33.0 / 2048.0;

/// 相电流标定：1 A/64 LSB（状态 3）
pub const PHASE_CURRENT_SCALE: f64 = 1.0 / 64.0;

/// 单圈角度原始值上限（0~35999，即 0°~359.99°）
pub const SINGLE_TURN_RAW_MAX: u16 = 35999;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_constants() {
        // 1800 counts × 0.01°/LSB = 18.00°
        assert_eq!(1800.0 * ANGLE_SCALE, 18.0);
        // 满量程指令电流
        assert_eq!(2000.0 * TORQUE_COMMAND_SCALE, 32.0);
        // 满量程反馈电流
        assert_eq!(2048.0 * IQ_FEEDBACK_SCALE, 33.0);
    }

    #[test]
    fn test_can_id_base() {
        assert_eq!(CAN_ID_BASE + MOTOR_ID_MIN as u32, 0x141);
        assert_eq!(CAN_ID_BASE + MOTOR_ID_MAX as u32, 0x160);
    }
}
