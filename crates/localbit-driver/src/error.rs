//! 驱动层错误类型定义

use localbit_hal::HalError;
use localbit_net::NetError;
use localbit_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 寄存器窗口获取失败（启动阶段，致命）
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),

    /// 网络错误（启动阶段致命；循环内只记录日志）
    #[error("Network error: {0}")]
    Net(#[from] NetError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use localbit_net::NetError;
    use localbit_protocol::ProtocolError;

    #[test]
    fn test_driver_error_display() {
        let driver_error = DriverError::from(ProtocolError::InvalidLength {
            expected: 10,
            actual: 4,
        });
        let msg = format!("{}", driver_error);
        assert!(msg.contains("Invalid frame length"), "{}", msg);

        let driver_error = DriverError::from(NetError::NoAddress {
            host: "controller.invalid".to_string(),
        });
        let msg = format!("{}", driver_error);
        assert!(msg.starts_with("Network error"), "{}", msg);
        assert!(msg.contains("controller.invalid"), "{}", msg);
    }

    #[test]
    fn test_hal_error_is_wrapped() {
        let err = localbit_hal::HalError::Open {
            path: "/dev/mem".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let driver_error: DriverError = err.into();
        assert!(matches!(driver_error, DriverError::Hal(_)));
        assert!(driver_error.to_string().contains("/dev/mem"));
    }
}
