//! ADC 驱动
//!
//! ## 握手协议
//!
//! 1. 读取采样值寄存器，记录最高位（相位位）
//! 2. 向 trigger-before 写 1，启动新一次转换
//! 3. 反复读取采样值寄存器，直到相位位相对第 1 步**翻转**
//!    （硬件每次转换完成翻转一次，而不是产生脉冲，所以必须做边沿检测）
//! 4. 向 trigger-after 写 1 确认
//! 5. 清除相位位，幅值钳位到 `[200, 1700]`，线性拉伸到 16 位
//!
//! ⚠️ 第 3 步没有超时：硬件不翻转相位位时整个循环会一直挂起。

use crate::RegisterBus;
use crate::regs::adc::{PHASE_BIT, TRIGGER, TRIGGER_AFTER, TRIGGER_BEFORE, VALUE};
use std::hint;
use tracing::trace;

/// 有效物理幅值下限
pub const ADC_MIN: u32 = 200;
/// 有效物理幅值上限
pub const ADC_MAX: u32 = 1700;

/// 钳位并线性拉伸到 `0..=0xFFFF`
///
/// `rescale(200) == 0`，`rescale(1700) == 0xFFFF`。
pub fn rescale(magnitude: u32) -> u16 {
    let clamped = magnitude.clamp(ADC_MIN, ADC_MAX);
    let scaled = (clamped - ADC_MIN) * 0xFFFF / (ADC_MAX - ADC_MIN);
    debug_assert!(scaled <= 0xFFFF);
    scaled as u16
}

/// ADC 驱动（无跨调用状态）
#[derive(Debug)]
pub struct Adc<B> {
    bus: B,
}

impl<B: RegisterBus> Adc<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// 执行初始化序列
    pub fn init(&self) {
        for (offset, value) in crate::regs::adc::INIT_SEQUENCE {
            self.bus.write32(offset, value);
        }
    }

    /// 触发一次转换并阻塞等待结果
    pub fn read_sample(&self) -> u16 {
        let was_high = self.bus.read32(VALUE) & PHASE_BIT != 0;
        self.bus.write32(TRIGGER_BEFORE, TRIGGER);

        let mut spins: u64 = 0;
        let raw = loop {
            let value = self.bus.read32(VALUE);
            if (value & PHASE_BIT != 0) != was_high {
                break value;
            }
            spins += 1;
            hint::spin_loop();
        };

        self.bus.write32(TRIGGER_AFTER, TRIGGER);

        let magnitude = raw & !PHASE_BIT;
        let sample = rescale(magnitude);
        trace!(
            "adc conversion: raw=0x{:08X} magnitude={} sample=0x{:04X} spins={}",
            raw, magnitude, sample, spins
        );
        sample
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}
