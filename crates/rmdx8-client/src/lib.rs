//! # RMD-X8 Client
//!
//! 单电机请求/应答门面。每个公开方法对应命令目录中的一个操作：
//! 查目录 → 编码出站字段 → 构帧 → 经 [`CanAdapter`] 发送 → 接收
//! 应答 → 关联校验 → 解码为带单位的类型化结果。
//!
//! 本层每次调用同步完成一次请求/应答交换，不保存跨调用状态。
//! 多个 [`Motor`]（不同编号）共享一条物理总线时，由调用方保证
//! 同一时刻至多一个未决请求（协议按到达顺序关联应答）：
//!
//! ```no_run
//! use rmdx8_can::SocketCanAdapter;
//! use rmdx8_client::Motor;
//! use rmdx8_protocol::MotorId;
//!
//! let mut bus = SocketCanAdapter::new("can0").unwrap();
//! // &mut 借用同一适配器，顺序访问两台电机
//! let mut left = Motor::new(&mut bus, MotorId::new(1).unwrap());
//! let status = left.read_motor_status_1().unwrap();
//! println!("voltage: {:.1} V", status.voltage());
//! ```

mod error;

pub use error::MotorError;

// 重新导出下层常用类型
pub use rmdx8_can::{CanAdapter, CanError, RmdFrame};
pub use rmdx8_protocol::{
    Acceleration, Command, EncoderOffset, EncoderReading, ErrorFlags, MotorId, MultiTurnAngle,
    PidGains, ProtocolError, SingleTurnAngle, SpinDirection, Status1, Status2, Status3,
};

use rmdx8_protocol::{build_request, expect_reply};
use tracing::{debug, trace};

/// 单电机门面
///
/// 持有电机编号和一个 CAN 适配器（或其 `&mut` 借用），除此之外
/// 无任何状态。所有方法阻塞至应答到达或适配器超时。
pub struct Motor<B> {
    bus: B,
    id: MotorId,
}

impl<B: CanAdapter> Motor<B> {
    /// 创建电机门面
    pub fn new(bus: B, id: MotorId) -> Self {
        Self { bus, id }
    }

    /// 电机编号
    pub fn id(&self) -> MotorId {
        self.id
    }

    /// 取回适配器
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// 一次完整的请求/应答交换
    ///
    /// 应答帧先经关联校验（仲裁 ID + 命令字节回显）再交给调用方
    /// 解码；校验失败说明共享总线上应答错位，错误上抛、不重试。
    fn transact(&mut self, command: Command, values: &[f64]) -> Result<RmdFrame, MotorError> {
        let request = build_request(self.id, command, values)?;
        trace!(motor = self.id.get(), command = ?command, data = ?request.data, "tx");

        self.bus.send(request)?;
        let reply = self.bus.receive()?;

        trace!(motor = self.id.get(), data = ?reply.data, "rx");
        expect_reply(self.id, command, &reply)?;
        Ok(reply)
    }

    // ------------------------------------------------------------------
    // PID / 加速度
    // ------------------------------------------------------------------

    /// 读取当前 PID 参数 (0x30)
    pub fn read_pid(&mut self) -> Result<PidGains, MotorError> {
        let reply = self.transact(Command::ReadPid, &[])?;
        Ok(PidGains::try_from(reply)?)
    }

    /// 写 PID 参数到 RAM (0x31)，断电失效；返回设备回显
    pub fn write_pid_ram(&mut self, gains: PidGains) -> Result<PidGains, MotorError> {
        debug!(motor = self.id.get(), ?gains, "write PID to RAM");
        let reply = self.transact(Command::WritePidRam, &gains.to_values())?;
        Ok(PidGains::try_from(reply)?)
    }

    /// 写 PID 参数到 ROM (0x32)，断电保留；返回设备回显
    pub fn write_pid_rom(&mut self, gains: PidGains) -> Result<PidGains, MotorError> {
        debug!(motor = self.id.get(), ?gains, "write PID to ROM");
        let reply = self.transact(Command::WritePidRom, &gains.to_values())?;
        Ok(PidGains::try_from(reply)?)
    }

    /// 读取加速度 (0x33)
    pub fn read_acceleration(&mut self) -> Result<Acceleration, MotorError> {
        let reply = self.transact(Command::ReadAcceleration, &[])?;
        Ok(Acceleration::try_from(reply)?)
    }

    /// 写加速度到 RAM (0x34)，单位 °/s²；返回设备回显
    pub fn write_acceleration_ram(&mut self, dps2: f64) -> Result<Acceleration, MotorError> {
        debug!(motor = self.id.get(), dps2, "write acceleration to RAM");
        let reply = self.transact(Command::WriteAccelerationRam, &[dps2])?;
        Ok(Acceleration::try_from(reply)?)
    }

    // ------------------------------------------------------------------
    // 编码器 / 角度
    // ------------------------------------------------------------------

    /// 读取编码器位置 (0x90)
    pub fn read_encoder(&mut self) -> Result<EncoderReading, MotorError> {
        let reply = self.transact(Command::ReadEncoder, &[])?;
        Ok(EncoderReading::try_from(reply)?)
    }

    /// 写编码器偏置 (0x91)；返回设备回显的偏置
    pub fn write_encoder_offset(&mut self, offset: u16) -> Result<EncoderOffset, MotorError> {
        debug!(motor = self.id.get(), offset, "write encoder offset");
        let reply = self.transact(Command::WriteEncoderOffset, &[offset as f64])?;
        Ok(EncoderOffset::try_from(reply)?)
    }

    /// 将当前位置写入 ROM 作为零点 (0x19)
    ///
    /// ROM 写入有擦写寿命限制，不要高频调用；重新上电后生效。
    pub fn write_motor_zero_rom(&mut self) -> Result<(), MotorError> {
        debug!(motor = self.id.get(), "write current position to ROM as zero");
        self.transact(Command::WriteZeroToRom, &[])?;
        Ok(())
    }

    /// 读取多圈累计角度 (0x92)
    pub fn read_multi_turns_angle(&mut self) -> Result<MultiTurnAngle, MotorError> {
        let reply = self.transact(Command::ReadMultiTurnAngle, &[])?;
        Ok(MultiTurnAngle::try_from(reply)?)
    }

    /// 读取单圈角度 (0x94)
    pub fn read_single_turn_angle(&mut self) -> Result<SingleTurnAngle, MotorError> {
        let reply = self.transact(Command::ReadSingleTurnAngle, &[])?;
        Ok(SingleTurnAngle::try_from(reply)?)
    }

    // ------------------------------------------------------------------
    // 运行状态控制
    // ------------------------------------------------------------------

    /// 电机关闭 (0x80)：清除运行状态与已接收的控制指令
    pub fn motor_off(&mut self) -> Result<(), MotorError> {
        debug!(motor = self.id.get(), "motor off");
        self.transact(Command::MotorOff, &[])?;
        Ok(())
    }

    /// 电机停止 (0x81)：保留运行状态与控制指令
    pub fn motor_stop(&mut self) -> Result<(), MotorError> {
        debug!(motor = self.id.get(), "motor stop");
        self.transact(Command::MotorStop, &[])?;
        Ok(())
    }

    /// 从停止状态恢复运行 (0x88)，并返回输出轴当前是否在转动
    ///
    /// 0x88 的应答只是命令回显，不携带运动信息；恢复后紧接一次
    /// 状态 2 读取，以转速是否为零判断。
    pub fn motor_running(&mut self) -> Result<bool, MotorError> {
        debug!(motor = self.id.get(), "motor running");
        self.transact(Command::MotorRunning, &[])?;
        let status = self.read_motor_status_2()?;
        Ok(status.is_rotating())
    }

    // ------------------------------------------------------------------
    // 状态读取
    // ------------------------------------------------------------------

    /// 读取状态 1 (0x9A)：温度、母线电压、错误标志
    pub fn read_motor_status_1(&mut self) -> Result<Status1, MotorError> {
        let reply = self.transact(Command::ReadStatus1, &[])?;
        Ok(Status1::try_from(reply)?)
    }

    /// 读取状态 2 (0x9C)：温度、转矩电流、转速、编码器位置
    pub fn read_motor_status_2(&mut self) -> Result<Status2, MotorError> {
        let reply = self.transact(Command::ReadStatus2, &[])?;
        Ok(Status2::try_from(reply)?)
    }

    /// 读取状态 3 (0x9D)：三相电流
    pub fn read_motor_status_3(&mut self) -> Result<Status3, MotorError> {
        let reply = self.transact(Command::ReadStatus3, &[])?;
        Ok(Status3::try_from(reply)?)
    }

    /// 清除错误标志 (0x9B)；返回清除后的状态 1
    ///
    /// 故障条件未消除（如仍然低电压）时标志无法清除，调用方可由
    /// 返回值确认。
    pub fn clear_motor_error_flag(&mut self) -> Result<Status1, MotorError> {
        debug!(motor = self.id.get(), "clear error flag");
        let reply = self.transact(Command::ClearErrorFlag, &[])?;
        Ok(Status1::try_from(reply)?)
    }

    // ------------------------------------------------------------------
    // 闭环控制
    // ------------------------------------------------------------------

    /// 转矩闭环 (0xA1)：目标转矩电流（A），范围 ±32 A
    pub fn torque_closed_loop(&mut self, current_a: f64) -> Result<Status2, MotorError> {
        debug!(motor = self.id.get(), current_a, "torque closed loop");
        let reply = self.transact(Command::TorqueClosedLoop, &[current_a])?;
        Ok(Status2::try_from(reply)?)
    }

    /// 速度闭环 (0xA2)：目标转速（°/s）
    pub fn speed_closed_loop(&mut self, speed_dps: f64) -> Result<Status2, MotorError> {
        debug!(motor = self.id.get(), speed_dps, "speed closed loop");
        let reply = self.transact(Command::SpeedClosedLoop, &[speed_dps])?;
        Ok(Status2::try_from(reply)?)
    }

    /// 位置闭环 1 (0xA3)：多圈目标角（°），不限速
    pub fn position_closed_loop_1(&mut self, angle_deg: f64) -> Result<Status2, MotorError> {
        debug!(motor = self.id.get(), angle_deg, "position closed loop 1");
        let reply = self.transact(Command::PositionClosedLoop1, &[angle_deg])?;
        Ok(Status2::try_from(reply)?)
    }

    /// 位置闭环 2 (0xA4)：多圈目标角（°）+ 最大转速（°/s）
    pub fn position_closed_loop_2(
        &mut self,
        angle_deg: f64,
        max_speed_dps: f64,
    ) -> Result<Status2, MotorError> {
        debug!(motor = self.id.get(), angle_deg, max_speed_dps, "position closed loop 2");
        let reply = self.transact(Command::PositionClosedLoop2, &[max_speed_dps, angle_deg])?;
        Ok(Status2::try_from(reply)?)
    }

    /// 位置闭环 3 (0xA5)：单圈目标角（°，0~359.99）+ 旋转方向
    pub fn position_closed_loop_3(
        &mut self,
        angle_deg: f64,
        direction: SpinDirection,
    ) -> Result<Status2, MotorError> {
        debug!(motor = self.id.get(), angle_deg, ?direction, "position closed loop 3");
        let reply = self.transact(
            Command::PositionClosedLoop3,
            &[direction as u8 as f64, angle_deg],
        )?;
        Ok(Status2::try_from(reply)?)
    }

    /// 位置闭环 4 (0xA6)：单圈目标角（°）+ 旋转方向 + 最大转速（°/s）
    pub fn position_closed_loop_4(
        &mut self,
        angle_deg: f64,
        direction: SpinDirection,
        max_speed_dps: f64,
    ) -> Result<Status2, MotorError> {
        debug!(motor = self.id.get(), angle_deg, ?direction, max_speed_dps, "position closed loop 4");
        let reply = self.transact(
            Command::PositionClosedLoop4,
            &[direction as u8 as f64, max_speed_dps, angle_deg],
        )?;
        Ok(Status2::try_from(reply)?)
    }
}
