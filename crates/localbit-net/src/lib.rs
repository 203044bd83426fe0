//! # Localbit Network Transport
//!
//! 一个发送 socket（指向控制端）加一个独立的接收 socket（IPv6 通配地址）。
//!
//! 传输层只搬运字节：帧长度检查和身份过滤由上层的
//! [`Datagram::frame`] 与 `localbit_protocol` 完成。

use localbit_protocol::{
    DEFAULT_RECEIVE_PORT, DEFAULT_SEND_PORT, FRAME_LEN, ProtocolError, WireFrame,
};
use std::time::Duration;
use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod udp;

#[cfg(target_os = "linux")]
pub use udp::UdpTransport;

#[cfg(any(test, feature = "mock"))]
pub mod memory;

#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryTransport;

/// 网络层错误类型
#[derive(Error, Debug)]
pub enum NetError {
    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No address found for {host}")]
    NoAddress { host: String },

    #[cfg(target_os = "linux")]
    #[error("Socket {op} failed: {source}")]
    Socket {
        op: &'static str,
        #[source]
        source: nix::Error,
    },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// 控制端地址与端口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// 控制端主机名或地址
    pub server: String,
    /// 上报发往的端口
    pub send_port: u16,
    /// 本地接收命令的端口
    pub receive_port: u16,
}

impl Endpoint {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            send_port: DEFAULT_SEND_PORT,
            receive_port: DEFAULT_RECEIVE_PORT,
        }
    }
}

/// 一个接收到的数据报
///
/// `len` 是数据报的真实长度（可能大于缓冲区），`bytes` 只保存前 `FRAME_LEN` 字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram {
    bytes: WireFrame,
    len: usize,
}

impl Datagram {
    /// 从已截断的缓冲区和真实长度构造
    pub fn new(bytes: WireFrame, len: usize) -> Self {
        Self { bytes, len }
    }

    /// 从任意字节切片构造（超出部分被截断，长度如实记录）
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        let n = data.len().min(FRAME_LEN);
        bytes[..n].copy_from_slice(&data[..n]);
        Self {
            bytes,
            len: data.len(),
        }
    }

    /// 真实长度
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 长度恰好为一帧时返回帧内容
    pub fn frame(&self) -> Result<&WireFrame, ProtocolError> {
        if self.len != FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: FRAME_LEN,
                actual: self.len,
            });
        }
        Ok(&self.bytes)
    }
}

/// 数据报传输接口
///
/// 单线程使用：发送与接收各自只有一个调用点。
pub trait Transport {
    /// 等待接收端可读，最长 `timeout`
    ///
    /// 返回 `Ok(false)` 表示超时（或被信号打断），这也是控制循环的主要休眠点。
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, NetError>;

    /// 非阻塞地取出一个数据报；没有待处理数据时返回 `Ok(None)`
    fn receive(&mut self) -> Result<Option<Datagram>, NetError>;

    /// 发送一帧到控制端
    fn send(&mut self, frame: &WireFrame) -> Result<(), NetError>;
}
