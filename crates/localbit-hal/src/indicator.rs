//! 三通道指示灯
//!
//! 颜色编码的每一位对应一个通道：A = bit 2，B = bit 1，C = bit 0。
//! 通道按 A、B、C 顺序写入；置位寄存器与清零寄存器都是"写 1 生效"。

use crate::RegisterBus;
use crate::regs::gpio::{CHANNEL_A, CHANNEL_B, CHANNEL_C, ChannelRegs};
use localbit_protocol::Color;
use tracing::trace;

#[derive(Debug)]
pub struct Indicator<B> {
    bus: B,
}

impl<B: RegisterBus> Indicator<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// 显示颜色（整体替换，不与旧颜色混合）
    pub fn set_color(&self, color: Color) {
        trace!("indicator -> {:?} (0b{:03b})", color, color.mask());
        self.drive(&CHANNEL_A, color.channel_a());
        self.drive(&CHANNEL_B, color.channel_b());
        self.drive(&CHANNEL_C, color.channel_c());
    }

    fn drive(&self, channel: &ChannelRegs, on: bool) {
        let offset = if on { channel.assert } else { channel.clear };
        self.bus.write32(offset, channel.bit);
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}
