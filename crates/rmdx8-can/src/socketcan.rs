//! SocketCAN CAN 适配器实现
//!
//! 基于 Linux 内核 SocketCAN 子系统的后端。波特率等接口配置由
//! 系统工具（`ip link`）完成，不在应用层设置；RMD-X8 出厂默认
//! 1 Mbit/s。
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**：SocketCAN 是 Linux 内核特性
//! - **权限要求**：可能需要 `dialout` 组权限或 `sudo`

use crate::{CanAdapter, CanError, DEFAULT_RECEIVE_TIMEOUT, RmdFrame};
use socketcan::{
    BlockingCan, CanError as SocketCanError, CanFrame, CanSocket, EmbeddedFrame, Id, Socket,
    SocketOptions, StandardId,
};
use std::path::Path;
use std::time::Duration;
use tracing::{trace, warn};

/// SocketCAN 适配器
///
/// # 示例
///
/// ```no_run
/// use rmdx8_can::{CanAdapter, SocketCanAdapter, RmdFrame};
///
/// let mut adapter = SocketCanAdapter::new("can0").unwrap();
/// adapter.send(RmdFrame::new(0x141, [0x9C, 0, 0, 0, 0, 0, 0, 0])).unwrap();
/// let reply = adapter.receive().unwrap();
/// ```
#[derive(Debug)]
pub struct SocketCanAdapter {
    socket: CanSocket,
    /// 接口名称（如 "can0"）
    interface: String,
    /// 读超时时间（用于 receive 方法）
    read_timeout: Duration,
}

/// 检查 CAN 接口是否存在且处于 UP 状态
///
/// 仅检查，不自动配置；失败时的错误信息附带修复命令提示。
fn check_interface_status(interface: &str) -> Result<(), CanError> {
    let sysfs = Path::new("/sys/class/net").join(interface);
    if !sysfs.exists() {
        return Err(CanError::Device(format!(
            "CAN interface '{interface}' does not exist. Create it first, e.g.:\n  \
             sudo ip link add dev {interface} type vcan   (virtual)\n  \
             or plug in the CAN hardware"
        )));
    }

    let operstate = std::fs::read_to_string(sysfs.join("operstate")).map_err(CanError::Io)?;
    match operstate.trim() {
        // vcan 等虚拟接口上报 "unknown"
        "up" | "unknown" => Ok(()),
        state => Err(CanError::Device(format!(
            "CAN interface '{interface}' exists but is {state}. Start it first:\n  \
             sudo ip link set up {interface}"
        ))),
    }
}

impl SocketCanAdapter {
    /// 创建新的 SocketCAN 适配器
    ///
    /// 打开 socket 之前会检查接口是否存在且已启动（UP 状态）。
    ///
    /// # 错误
    /// - `CanError::Device`: 接口不存在 / 未启动 / 无法打开
    /// - `CanError::Io`: 系统调用失败（如权限不足）
    pub fn new(interface: impl Into<String>) -> Result<Self, CanError> {
        let interface = interface.into();

        check_interface_status(&interface)?;

        let socket = CanSocket::open(&interface).map_err(|e| {
            CanError::Device(format!("Failed to open CAN interface '{interface}': {e}"))
        })?;

        // 关闭本地回环：请求与应答共用仲裁 ID，回环帧会被误认成应答
        socket.set_loopback(false).map_err(CanError::Io)?;

        let read_timeout = DEFAULT_RECEIVE_TIMEOUT;
        socket.set_read_timeout(read_timeout).map_err(CanError::Io)?;

        trace!("SocketCAN interface '{}' opened", interface);

        Ok(Self {
            socket,
            interface,
            read_timeout,
        })
    }

    /// 获取接口名称
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// 获取读超时时间
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// 设置读超时
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), CanError> {
        self.socket.set_read_timeout(timeout).map_err(CanError::Io)?;
        self.read_timeout = timeout;
        Ok(())
    }
}

impl CanAdapter for SocketCanAdapter {
    /// 发送帧（Fire-and-Forget）
    fn send(&mut self, frame: RmdFrame) -> Result<(), CanError> {
        // RMD 仲裁 ID 均为 11-bit 标准帧
        let can_frame = StandardId::new(frame.id as u16)
            .and_then(|id| CanFrame::new(id, &frame.data))
            .ok_or_else(|| {
                CanError::Device(format!(
                    "Failed to create standard frame with ID 0x{:X}",
                    frame.id
                ))
            })?;

        self.socket.transmit(&can_frame).map_err(|e| {
            CanError::Io(std::io::Error::other(format!(
                "SocketCAN transmit error: {e}"
            )))
        })?;

        trace!("Sent CAN frame: ID=0x{:X}", frame.id);
        Ok(())
    }

    /// 接收一帧
    ///
    /// 错误帧不向上传递：Bus Off 转为 [`CanError::BusOff`]，其余
    /// 错误帧告警后继续等待下一帧；遥控帧忽略。
    fn receive(&mut self) -> Result<RmdFrame, CanError> {
        loop {
            let frame = self.socket.read_frame().map_err(|e| {
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) {
                    CanError::Timeout
                } else {
                    CanError::Io(e)
                }
            })?;

            match frame {
                CanFrame::Data(data) => {
                    let id = match data.id() {
                        Id::Standard(sid) => sid.as_raw() as u32,
                        Id::Extended(eid) => eid.as_raw(),
                    };
                    let rmd_frame = RmdFrame::from_wire(id, data.data())
                        .map_err(|e| CanError::Device(e.to_string()))?;
                    trace!("Received CAN frame: ID=0x{:X}", rmd_frame.id);
                    return Ok(rmd_frame);
                },
                CanFrame::Remote(_) => {
                    // RMD 协议不使用遥控帧
                    continue;
                },
                CanFrame::Error(error_frame) => {
                    let socketcan_error = SocketCanError::from(error_frame);
                    if matches!(socketcan_error, SocketCanError::BusOff) {
                        return Err(CanError::BusOff);
                    }
                    warn!("CAN error frame received: {}, ignoring", socketcan_error);
                },
            }
        }
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        if let Err(e) = Self::set_read_timeout(self, timeout) {
            warn!("Failed to set receive timeout: {}", e);
        }
    }
}
