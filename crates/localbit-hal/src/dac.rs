//! DAC 驱动
//!
//! 尽力而为的握手：每次尝试先短暂轮询就绪翻转位，等待它与上一次写入后
//! 记录的基线不同；无论是否等到，都会写入数据并把新观测到的就绪位记为基线。
//!
//! 轮询计数在整个调用内累计（上限 100 次）。累计轮询达到 20 次，或已经写入
//! 20 次，调用结束。轮询预算耗尽后照样写入：活性优先于严格同步。

use crate::RegisterBus;
use crate::regs::dac::{DATA, READY_BIT, STATUS};
use std::time::Duration;
use tracing::{debug, trace};

/// 单次调用的最大写入次数
pub const DAC_MAX_ATTEMPTS: u32 = 20;
/// 单次调用的轮询上限
pub const DAC_POLL_LIMIT: u32 = 100;
/// 累计轮询达到该值后不再重复写入
pub const DAC_SETTLE_POLLS: u32 = 20;
/// 轮询间隔（亚微秒级）
pub const DAC_POLL_INTERVAL: Duration = Duration::from_nanos(100);

/// 单次写入的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DacWriteOutcome {
    /// 实际写入数据寄存器的次数
    pub attempts: u32,
    /// 累计轮询次数
    pub polls: u32,
    /// 每次写入前是否都观测到了就绪位翻转
    pub handshake_ok: bool,
}

/// DAC 驱动
///
/// 持有唯一一份跨调用的硬件状态：上一次观测到的就绪位。
#[derive(Debug)]
pub struct Dac<B> {
    bus: B,
    baseline: u32,
}

impl<B: RegisterBus> Dac<B> {
    /// 创建驱动，假设硬件当前就绪（基线取当前就绪位的反）
    pub fn new(bus: B) -> Self {
        let baseline = !bus.read32(STATUS) & READY_BIT;
        Self { bus, baseline }
    }

    /// 使用指定基线创建驱动
    pub fn with_baseline(bus: B, baseline: u32) -> Self {
        Self {
            bus,
            baseline: baseline & READY_BIT,
        }
    }

    /// 当前基线（`0` 或 `READY_BIT`）
    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    /// 直流偏置编码：`(value + 0x8000) mod 0x10000`
    pub fn encode(value: u16) -> u32 {
        (u32::from(value) + 0x8000) % 0x10000
    }

    fn ready_flag(&self) -> u32 {
        self.bus.read32(STATUS) & READY_BIT
    }

    /// 写入一个输出值
    pub fn write_sample(&mut self, value: u16) -> DacWriteOutcome {
        let word = Self::encode(value);
        let mut polls = 0u32;
        let mut attempts = 0u32;
        let mut handshake_ok = true;

        loop {
            let mut flag = self.ready_flag();
            while flag == self.baseline && polls < DAC_POLL_LIMIT {
                spin_sleep::sleep(DAC_POLL_INTERVAL);
                polls += 1;
                flag = self.ready_flag();
            }
            if flag == self.baseline {
                handshake_ok = false;
            }

            self.bus.write32(DATA, word);
            self.baseline = flag;
            attempts += 1;

            if polls >= DAC_SETTLE_POLLS || attempts >= DAC_MAX_ATTEMPTS {
                break;
            }
        }

        if handshake_ok {
            trace!(
                "dac write 0x{:04X} -> 0x{:04X}: attempts={} polls={}",
                value, word, attempts, polls
            );
        } else {
            debug!(
                "dac write 0x{:04X} without ready handshake (attempts={}, polls={})",
                value, attempts, polls
            );
        }

        DacWriteOutcome {
            attempts,
            polls,
            handshake_ok,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}
