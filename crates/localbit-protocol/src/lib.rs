//! # Localbit Protocol
//!
//! I/O 模块与远端控制器之间的 UDP 线协议（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧长度与字段偏移
//! - `identity`: 设备身份（6 字节）
//! - `feedback`: 上行帧构建（设备 → 控制器）
//! - `control`: 下行帧解析（控制器 → 设备）
//!
//! ## 帧格式
//!
//! 两个方向均为固定 10 字节：
//!
//! ```text
//! | 0..6 identity | 6 | 7 | 8..10 value (big-endian) |
//! ```
//!
//! 数值字段使用大端字节序（网络字节序）。

pub mod constants;
pub mod control;
pub mod feedback;
pub mod identity;

// 重新导出常用类型
pub use constants::*;
pub use control::{Color, InboundCommand};
pub use feedback::OutboundReport;
pub use identity::DeviceIdentity;

use thiserror::Error;

/// 线协议帧（固定长度，栈上分配）
pub type WireFrame = [u8; FRAME_LEN];

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Frame addressed to another device: {target}")]
    ForeignIdentity { target: DeviceIdentity },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),
}

/// 大端字节序转 u16
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// u16 转大端字节序
pub fn u16_to_bytes_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}
