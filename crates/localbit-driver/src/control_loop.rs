//! 控制循环
//!
//! 单线程、无取消。每次迭代：
//!
//! 1. 最多等待 `pause` 秒接收命令（也是循环的主要休眠点）
//! 2. 命令有效且身份匹配时执行（指示灯 / 模拟输出）
//! 3. 读按钮、读 ADC
//! 4. 上报（每次都发，不去重）
//! 5. 更新节拍
//! 6. 固定延时 `cycle_delay`，与 `pause` 无关
//!
//! 循环内的任何网络/协议错误只记录日志，不会中断循环。

use crate::error::DriverError;
use crate::pacing::{PaceAdjustment, Pacer};
use localbit_hal::{Board, DacWriteOutcome, HardwareLayout, MmapWindow, RegisterBus};
use localbit_net::{Endpoint, Transport};
#[cfg(target_os = "linux")]
use localbit_net::UdpTransport;
use localbit_protocol::{Color, DeviceIdentity, InboundCommand, OutboundReport, ProtocolError};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 循环配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// 每次迭代末尾的固定延时（循环频率上限）
    pub cycle_delay: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            cycle_delay: Duration::from_millis(10),
        }
    }
}

/// 单次迭代的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationOutcome {
    /// 本次执行的命令
    pub command: Option<InboundCommand>,
    /// 模拟输出写入结果（命令带 setOutput 时）
    pub dac: Option<DacWriteOutcome>,
    pub sample: u16,
    pub button_pressed: bool,
    /// 上报是否发送成功
    pub report_sent: bool,
    pub adjustment: PaceAdjustment,
    /// 更新后的监听窗口（秒）
    pub pause: f64,
}

/// 控制循环
pub struct ControlLoop<B, T> {
    board: Board<B>,
    transport: T,
    identity: DeviceIdentity,
    pacer: Pacer,
    config: LoopConfig,
}

#[cfg(target_os = "linux")]
impl ControlLoop<Rc<MmapWindow>, UdpTransport> {
    /// 映射硬件并打开网络
    ///
    /// 顺序与失败语义：先硬件后网络，任何一步失败都返回错误（调用方应视为致命）。
    pub fn open(
        layout: &HardwareLayout,
        endpoint: &Endpoint,
        identity: DeviceIdentity,
        config: LoopConfig,
    ) -> Result<Self, DriverError> {
        let board = Board::open(layout)?;
        let transport = UdpTransport::connect(endpoint)?;
        Ok(Self::new(board, transport, identity, config))
    }
}

impl<B: RegisterBus, T: Transport> ControlLoop<B, T> {
    pub fn new(board: Board<B>, transport: T, identity: DeviceIdentity, config: LoopConfig) -> Self {
        Self {
            board,
            transport,
            identity,
            pacer: Pacer::new(),
            config,
        }
    }

    /// 把执行器置于已知状态：指示灯熄灭、输出 0
    pub fn prepare(&mut self) {
        self.board.indicator.set_color(Color::Black);
        self.board.dac.write_sample(0x0000);
        info!("ready");
    }

    /// 永久运行
    pub fn run(mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// 执行一次迭代
    pub fn step(&mut self) -> IterationOutcome {
        let command = match self.receive_command() {
            Ok(command) => command,
            Err(DriverError::Protocol(ProtocolError::ForeignIdentity { target })) => {
                // 共享介质上的正常流量
                debug!("Ignoring message intended for another device ({})", target);
                None
            },
            Err(e) => {
                warn!("Dropping inbound message: {}", e);
                None
            },
        };

        let dac = command.and_then(|command| self.apply(command));

        let button_pressed = self.board.button.is_pressed();
        let sample = self.board.adc.read_sample();
        debug!("input: {:04x}  button: {}", sample, button_pressed);

        let report_sent = match self.send_report(sample, button_pressed) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send report: {}", e);
                false
            },
        };

        let adjustment = self.pacer.update(sample, button_pressed);

        spin_sleep::sleep(self.config.cycle_delay);

        IterationOutcome {
            command,
            dac,
            sample,
            button_pressed,
            report_sent,
            adjustment,
            pause: self.pacer.pause(),
        }
    }

    /// 等待并取出一个命令
    fn receive_command(&mut self) -> Result<Option<InboundCommand>, DriverError> {
        if !self.transport.wait_readable(self.pacer.pause_duration())? {
            return Ok(None);
        }
        let Some(datagram) = self.transport.receive()? else {
            return Ok(None);
        };
        let command = InboundCommand::decode(datagram.frame()?, &self.identity)?;
        Ok(Some(command))
    }

    fn apply(&mut self, command: InboundCommand) -> Option<DacWriteOutcome> {
        info!(
            "received message: set_indicator={} color={:?} set_output={} value={:04x}",
            command.set_indicator(),
            command.indicator,
            command.set_output(),
            command.output.unwrap_or_default()
        );

        if let Some(color) = command.indicator {
            self.board.indicator.set_color(color);
        }
        command
            .output
            .map(|value| self.board.dac.write_sample(value))
    }

    fn send_report(&mut self, sample: u16, button_pressed: bool) -> Result<(), DriverError> {
        let frame = OutboundReport::new(sample, button_pressed).encode(&self.identity);
        self.transport.send(&frame)?;
        Ok(())
    }

    pub fn board(&self) -> &Board<B> {
        &self.board
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }
}

impl<B, T> std::fmt::Debug for ControlLoop<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("identity", &self.identity)
            .field("pacer", &self.pacer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
