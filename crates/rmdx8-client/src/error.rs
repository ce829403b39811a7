//! 客户端错误类型定义

use rmdx8_can::CanError;
use rmdx8_protocol::ProtocolError;
use thiserror::Error;

/// 单电机操作的统一错误类型
///
/// 所有错误原样上抛给调用方；本层不做重试、不吞错误。
#[derive(Error, Debug)]
pub enum MotorError {
    /// CAN 适配层错误（含总线超时）
    #[error("CAN error: {0}")]
    Can(#[from] CanError),

    /// 协议编解码/关联错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl MotorError {
    /// 是否为总线超时（调用方常见的重试判据）
    pub fn is_timeout(&self) -> bool {
        matches!(self, MotorError::Can(CanError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_can_error() {
        let err: MotorError = CanError::Timeout.into();
        assert!(err.is_timeout());
        assert_eq!(format!("{err}"), "CAN error: Read timeout");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: MotorError = ProtocolError::BadLength {
            expected: 8,
            actual: 4,
        }
        .into();
        assert!(!err.is_timeout());
        match err {
            MotorError::Protocol(ProtocolError::BadLength { expected, actual }) => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 4);
            },
            other => panic!("expected Protocol variant, got {other:?}"),
        }
    }
}
