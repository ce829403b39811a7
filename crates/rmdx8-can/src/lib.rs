//! # RMD-X8 CAN Adapter Layer
//!
//! CAN 硬件抽象层，提供统一的 CAN 接口抽象。
//!
//! 协议层只依赖 [`CanAdapter`] trait；后端（SocketCAN、mock）负责
//! 把 [`RmdFrame`] 与具体硬件帧互转。帧边界同步由后端保证：每次
//! `receive()` 交付恰好一帧。

use std::time::Duration;
use thiserror::Error;

// 重新导出 rmdx8-protocol 中的 RmdFrame
pub use rmdx8_protocol::RmdFrame;

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(target_os = "linux")]
pub use socketcan::SocketCanAdapter;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::MockAdapter;

/// 默认接收超时
///
/// RMD-X8 在收到命令后亚毫秒级应答；50ms 对坏总线留足余量，
/// 同时保证上层调用不会无限阻塞。
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(50);

/// CAN 适配层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(String),
    #[error("Read timeout")]
    Timeout,
    #[error("Bus off")]
    BusOff,
}

/// CAN 适配器统一接口
///
/// 发送与接收都是阻塞语义；`receive` 在超时窗口内没有帧到达时
/// 返回 [`CanError::Timeout`]。共享总线上的串行化（同一时刻至多
/// 一个未决请求）由调用方负责。
pub trait CanAdapter {
    fn send(&mut self, frame: RmdFrame) -> Result<(), CanError>;
    fn receive(&mut self) -> Result<RmdFrame, CanError>;
    fn set_receive_timeout(&mut self, _timeout: Duration) {}
    fn receive_timeout(&mut self, timeout: Duration) -> Result<RmdFrame, CanError> {
        self.set_receive_timeout(timeout);
        self.receive()
    }
}

// 允许多个 Motor 顺序借用同一个适配器
impl<A: CanAdapter + ?Sized> CanAdapter for &mut A {
    fn send(&mut self, frame: RmdFrame) -> Result<(), CanError> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> Result<RmdFrame, CanError> {
        (**self).receive()
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        (**self).set_receive_timeout(timeout)
    }
}
