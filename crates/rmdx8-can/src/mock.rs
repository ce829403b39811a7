//! Mock CAN 适配器（无硬件依赖）
//!
//! 记录发出的帧，应答来自预置队列或用户提供的响应闭包。
//! 队列取空后 `receive()` 返回 [`CanError::Timeout`]，与真实
//! 总线上无应答的表现一致。

use crate::{CanAdapter, CanError, RmdFrame};
use std::collections::VecDeque;
use std::time::Duration;

type Responder = Box<dyn FnMut(&RmdFrame) -> Option<RmdFrame> + Send>;

/// 测试用 CAN 适配器
pub struct MockAdapter {
    sent: Vec<RmdFrame>,
    replies: VecDeque<RmdFrame>,
    responder: Option<Responder>,
}

impl MockAdapter {
    /// 创建空适配器：不预置应答，`receive()` 直接超时
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            replies: VecDeque::new(),
            responder: None,
        }
    }

    /// 创建带响应闭包的适配器
    ///
    /// 每次 `send` 后用请求帧调用闭包，返回 `Some(frame)` 则入队
    /// 作为下一次 `receive()` 的应答；返回 `None` 模拟设备沉默。
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&RmdFrame) -> Option<RmdFrame> + Send + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// 创建回显适配器：每条请求原样弹回（写类命令的设备行为）
    pub fn echo() -> Self {
        Self::with_responder(|frame| Some(*frame))
    }

    /// 预置一条应答帧
    pub fn push_reply(&mut self, frame: RmdFrame) {
        self.replies.push_back(frame);
    }

    /// 已发送的帧（按发送顺序）
    pub fn sent(&self) -> &[RmdFrame] {
        &self.sent
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CanAdapter for MockAdapter {
    fn send(&mut self, frame: RmdFrame) -> Result<(), CanError> {
        self.sent.push(frame);
        if let Some(responder) = self.responder.as_mut()
            && let Some(reply) = responder(&frame)
        {
            self.replies.push_back(reply);
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<RmdFrame, CanError> {
        self.replies.pop_front().ok_or(CanError::Timeout)
    }

    fn set_receive_timeout(&mut self, _timeout: Duration) {}
}
