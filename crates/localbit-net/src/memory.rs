//! 内存传输（测试用）
//!
//! 入站数据报按队列顺序交付；出站帧与每次等待的超时都被记录下来。

use crate::{Datagram, NetError, Transport};
use localbit_protocol::WireFrame;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Result<Datagram, std::io::ErrorKind>>,
    sent: Vec<WireFrame>,
    waits: Vec<Duration>,
    fail_sends: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排入一个入站数据报（任意长度）
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.push_back(Ok(Datagram::from_slice(data)));
    }

    /// 排入一次接收失败
    pub fn push_receive_error(&mut self, kind: std::io::ErrorKind) {
        self.inbound.push_back(Err(kind));
    }

    /// 之后所有发送都返回错误
    pub fn fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// 已发送的帧
    pub fn sent(&self) -> &[WireFrame] {
        &self.sent
    }

    /// 每次 `wait_readable` 收到的超时
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl Transport for MemoryTransport {
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, NetError> {
        self.waits.push(timeout);
        Ok(!self.inbound.is_empty())
    }

    fn receive(&mut self) -> Result<Option<Datagram>, NetError> {
        match self.inbound.pop_front() {
            Some(Ok(dgram)) => Ok(Some(dgram)),
            Some(Err(kind)) => Err(NetError::Io(std::io::Error::from(kind))),
            None => Ok(None),
        }
    }

    fn send(&mut self, frame: &WireFrame) -> Result<(), NetError> {
        if self.fail_sends {
            return Err(NetError::Io(std::io::Error::from(
                std::io::ErrorKind::NetworkUnreachable,
            )));
        }
        self.sent.push(*frame);
        Ok(())
    }
}
