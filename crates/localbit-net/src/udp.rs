//! UDP 传输
//!
//! - 发送 socket：按控制端地址族绑定到该族的通配地址（临时端口）
//! - 接收 socket：绑定 `[::]:receive_port`，开启 `SO_REUSEADDR`；
//!   双栈时 IPv4 数据报以 IPv4-mapped 地址到达

use crate::{Datagram, Endpoint, NetError, Transport};
use localbit_protocol::{FRAME_LEN, WireFrame};
use nix::errno::Errno;
use nix::ifaddrs::getifaddrs;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::socket::{
    AddressFamily, MsgFlags, SockFlag, SockType, SockaddrIn6, bind, recv, setsockopt, socket,
    sockopt,
};
use std::net::{
    IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV6, ToSocketAddrs, UdpSocket,
};
use std::os::fd::{AsFd, AsRawFd};
use std::time::Duration;
use tracing::{debug, info, trace};

/// 解析控制端地址
///
/// 优先返回本机已配置地址族的第一个结果（与 `AI_ADDRCONFIG` 一致），
/// 都不可用时退回第一个结果。
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr, NetError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| NetError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();
    let (has_ipv4, has_ipv6) = configured_families();
    let picked = pick_address(&addrs, has_ipv4, has_ipv6).ok_or_else(|| NetError::NoAddress {
        host: host.to_string(),
    })?;
    if addrs.first() != Some(&picked) {
        debug!(
            "{} resolved to {} addresses; skipping unconfigured families, using {}",
            host,
            addrs.len(),
            picked
        );
    }
    Ok(picked)
}

/// 按地址族过滤解析结果，保持解析器给出的顺序
pub fn pick_address(addrs: &[SocketAddr], has_ipv4: bool, has_ipv6: bool) -> Option<SocketAddr> {
    addrs
        .iter()
        .copied()
        .find(|addr| if addr.is_ipv4() { has_ipv4 } else { has_ipv6 })
        .or_else(|| addrs.first().copied())
}

/// 本机网卡上出现过的地址族 `(IPv4, IPv6)`
///
/// 无法枚举网卡时视为两族都可用。
fn configured_families() -> (bool, bool) {
    let Ok(interfaces) = getifaddrs() else {
        return (true, true);
    };
    let mut has_ipv4 = false;
    let mut has_ipv6 = false;
    for ifaddr in interfaces {
        if let Some(addr) = ifaddr.address {
            has_ipv4 |= addr.as_sockaddr_in().is_some();
            has_ipv6 |= addr.as_sockaddr_in6().is_some();
        }
    }
    (has_ipv4, has_ipv6)
}

/// 打开 IPv6 通配接收 socket
fn open_receive_socket(port: u16) -> Result<UdpSocket, NetError> {
    let fd = socket(
        AddressFamily::Inet6,
        SockType::Datagram,
        SockFlag::SOCK_CLOEXEC,
        None,
    )
    .map_err(|source| NetError::Socket {
        op: "socket",
        source,
    })?;

    setsockopt(&fd, sockopt::ReuseAddr, &true).map_err(|source| NetError::Socket {
        op: "setsockopt(SO_REUSEADDR)",
        source,
    })?;

    let addr = SockaddrIn6::from(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, port, 0, 0));
    bind(fd.as_raw_fd(), &addr).map_err(|source| NetError::Socket { op: "bind", source })?;

    Ok(UdpSocket::from(fd))
}

/// UDP 传输
#[derive(Debug)]
pub struct UdpTransport {
    send_socket: UdpSocket,
    receive_socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpTransport {
    /// 解析 `server` 并打开两个 socket
    ///
    /// `receive_port = 0` 时由内核分配端口（见 [`Self::local_receive_port`]）。
    ///
    /// # 错误
    /// - `NetError::Resolve` / `NetError::NoAddress`: 名称解析失败
    /// - `NetError::Socket` / `NetError::Io`: socket 创建或绑定失败
    pub fn open(server: &str, send_port: u16, receive_port: u16) -> Result<Self, NetError> {
        let destination = resolve(server, send_port)?;

        let unspecified = match destination.ip() {
            IpAddr::V4(ip) => {
                info!("Using IPv4; server {} is at {}", server, ip);
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            },
            IpAddr::V6(ip) => {
                info!("Using IPv6; server {} is at {}", server, ip);
                IpAddr::V6(Ipv6Addr::UNSPECIFIED)
            },
        };
        let send_socket = UdpSocket::bind(SocketAddr::new(unspecified, 0))?;
        let receive_socket = open_receive_socket(receive_port)?;

        trace!(
            "udp transport open: destination={}, receive={}",
            destination,
            receive_socket.local_addr()?
        );

        Ok(Self {
            send_socket,
            receive_socket,
            destination,
        })
    }

    /// 按 [`Endpoint`] 打开
    pub fn connect(endpoint: &Endpoint) -> Result<Self, NetError> {
        Self::open(&endpoint.server, endpoint.send_port, endpoint.receive_port)
    }

    /// 控制端地址
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// 接收 socket 实际绑定的端口
    pub fn local_receive_port(&self) -> Result<u16, NetError> {
        Ok(self.receive_socket.local_addr()?.port())
    }
}

impl Transport for UdpTransport {
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, NetError> {
        // PollTimeout 接受 u16 毫秒；pause 上限 2 秒，不会饱和
        let timeout_ms = timeout.as_millis().min(u128::from(u16::MAX)) as u16;
        let pollfd = PollFd::new(self.receive_socket.as_fd(), PollFlags::POLLIN);
        match poll(&mut [pollfd], PollTimeout::from(timeout_ms)) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(Errno::EINTR) => Ok(false),
            Err(source) => Err(NetError::Socket { op: "poll", source }),
        }
    }

    fn receive(&mut self) -> Result<Option<Datagram>, NetError> {
        let mut buf = [0u8; FRAME_LEN];
        // MSG_TRUNC: 返回数据报真实长度，即使大于缓冲区
        match recv(
            self.receive_socket.as_raw_fd(),
            &mut buf,
            MsgFlags::MSG_DONTWAIT | MsgFlags::MSG_TRUNC,
        ) {
            Ok(len) => Ok(Some(Datagram::new(buf, len))),
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(None),
            Err(source) => Err(NetError::Socket { op: "recv", source }),
        }
    }

    fn send(&mut self, frame: &WireFrame) -> Result<(), NetError> {
        let sent = self.send_socket.send_to(frame, self.destination)?;
        if sent != frame.len() {
            return Err(NetError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short send: {} of {} bytes", sent, frame.len()),
            )));
        }
        Ok(())
    }
}
