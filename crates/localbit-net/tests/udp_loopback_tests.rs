//! UDP 回环测试
//!
//! 控制端用普通 `UdpSocket` 模拟：IPv4 socket 接收上报，IPv6 或 IPv4 socket 发送命令。
//! 运行环境没有 IPv6 回环时跳过。

#![cfg(target_os = "linux")]

use localbit_net::{NetError, Transport, UdpTransport};
use localbit_protocol::FRAME_LEN;
use std::net::UdpSocket;
use std::time::Duration;

/// 控制端 socket 对，以及连到它的设备端传输
fn setup() -> Option<(UdpSocket, UdpSocket, UdpTransport, u16)> {
    let Ok(command_tx) = UdpSocket::bind("[::1]:0") else {
        eprintln!("Skipping test: IPv6 loopback not available");
        return None;
    };
    let report_rx = UdpSocket::bind("127.0.0.1:0").unwrap();
    report_rx
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let controller_port = report_rx.local_addr().unwrap().port();

    let transport = match UdpTransport::open("127.0.0.1", controller_port, 0) {
        Ok(t) => t,
        Err(NetError::Socket { .. }) => {
            eprintln!("Skipping test: IPv6 sockets not available");
            return None;
        },
        Err(e) => panic!("unexpected open failure: {}", e),
    };
    let receive_port = transport.local_receive_port().unwrap();
    Some((command_tx, report_rx, transport, receive_port))
}

#[test]
fn test_report_reaches_controller() {
    let Some((_command_tx, report_rx, mut transport, _)) = setup() else {
        return;
    };

    let frame = [1, 2, 3, 4, 5, 6, 0, 1, 0x12, 0x34];
    transport.send(&frame).unwrap();

    let mut buf = [0u8; 64];
    let (len, _) = report_rx.recv_from(&mut buf).unwrap();
    assert_eq!(&buf[..len], &frame);
}

#[test]
fn test_command_reaches_device() {
    let Some((command_tx, _report_rx, mut transport, port)) = setup() else {
        return;
    };

    let frame = [1, 2, 3, 4, 5, 6, 0x85, 0x80, 0x00, 0xFF];
    command_tx.send_to(&frame, ("::1", port)).unwrap();

    assert!(transport.wait_readable(Duration::from_secs(2)).unwrap());
    let dgram = transport.receive().unwrap().expect("datagram pending");
    assert_eq!(dgram.frame().unwrap(), &frame);
    // 队列已空：非阻塞接收立即返回
    assert!(transport.receive().unwrap().is_none());
}

#[test]
fn test_ipv4_command_reaches_device() {
    let Some((_command_tx, _report_rx, mut transport, port)) = setup() else {
        return;
    };

    // 双栈接收 socket 也要收到 IPv4 控制端发来的命令
    let command_tx_v4 = UdpSocket::bind("127.0.0.1:0").unwrap();
    let frame = [1, 2, 3, 4, 5, 6, 0x83, 0x80, 0x7F, 0x00];
    command_tx_v4.send_to(&frame, ("127.0.0.1", port)).unwrap();

    assert!(transport.wait_readable(Duration::from_secs(2)).unwrap());
    let dgram = transport.receive().unwrap().expect("datagram pending");
    assert_eq!(dgram.frame().unwrap(), &frame);
}

#[test]
fn test_oversized_datagram_reports_real_length() {
    let Some((command_tx, _report_rx, mut transport, port)) = setup() else {
        return;
    };

    command_tx.send_to(&[0xAB; 32], ("::1", port)).unwrap();

    assert!(transport.wait_readable(Duration::from_secs(2)).unwrap());
    let dgram = transport.receive().unwrap().expect("datagram pending");
    assert_eq!(dgram.len(), 32);
    assert!(dgram.frame().is_err());
}

#[test]
fn test_short_datagram_rejected() {
    let Some((command_tx, _report_rx, mut transport, port)) = setup() else {
        return;
    };

    command_tx.send_to(&[0x01; FRAME_LEN - 1], ("::1", port)).unwrap();

    assert!(transport.wait_readable(Duration::from_secs(2)).unwrap());
    let dgram = transport.receive().unwrap().expect("datagram pending");
    assert_eq!(dgram.len(), FRAME_LEN - 1);
    assert!(dgram.frame().is_err());
}

#[test]
fn test_wait_times_out_when_idle() {
    let Some((_command_tx, _report_rx, mut transport, _)) = setup() else {
        return;
    };

    assert!(!transport.wait_readable(Duration::from_millis(20)).unwrap());
    assert!(transport.receive().unwrap().is_none());
}
