//! 协议常量定义
//!
//! 帧长度、字段偏移和位掩码。

/// 设备身份长度（字节）
pub const IDENTITY_LEN: usize = 6;

/// 帧长度（两个方向一致）
pub const FRAME_LEN: usize = IDENTITY_LEN + 1 + 1 + 2;

// ============================================================================
// 字段偏移
// ============================================================================

pub const IDENTITY_OFFSET: usize = 0;

/// 上行：保留字节（恒为 0）；下行：指示灯字节
pub const BYTE6_OFFSET: usize = IDENTITY_LEN;

/// 上行：标志字节；下行：输出字节
pub const BYTE7_OFFSET: usize = IDENTITY_LEN + 1;

/// 16 位数值（大端）
pub const VALUE_OFFSET: usize = IDENTITY_LEN + 2;

// ============================================================================
// 默认端口
// ============================================================================

/// 上行报告目的端口
pub const DEFAULT_SEND_PORT: u16 = 2020;

/// 下行指令监听端口
pub const DEFAULT_RECEIVE_PORT: u16 = 2021;
