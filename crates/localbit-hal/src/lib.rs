//! # Localbit HAL
//!
//! 寄存器访问层与设备驱动。
//!
//! ## 层次
//!
//! ```text
//! Board (adc / dac / indicator / button)
//!     ↓ 每个驱动封装一种硬件握手协议
//! RegisterBus (read32 / write32)
//!     ↓ MmapWindow: /dev/mem 映射窗口（volatile 访问）
//!     ↓ MockBus:    内存模拟（feature = "mock"）
//! Hardware
//! ```
//!
//! 寄存器访问不返回错误；唯一的失败点是映射窗口本身（见 [`HalError`]）。

pub mod adc;
pub mod board;
pub mod button;
pub mod dac;
pub mod indicator;
pub mod regs;
pub mod window;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use adc::Adc;
pub use board::{Board, HardwareLayout};
pub use button::Button;
pub use dac::{Dac, DacWriteOutcome};
pub use indicator::Indicator;
pub use window::MmapWindow;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockBus;

use std::rc::Rc;
use thiserror::Error;

/// HAL 错误类型
///
/// 仅在获取寄存器窗口时出现，调用方应视为致命错误。
#[derive(Error, Debug)]
pub enum HalError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to map {name} window at 0x{base:08X} (+0x{len:X}): {source}")]
    Map {
        name: &'static str,
        base: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },
}

/// 寄存器窗口访问接口
///
/// 偏移由驱动以常量形式给出（见 [`regs`]），不做运行时校验。
/// 写操作只需 `&self`：同一窗口可以被多个驱动共享（单线程）。
pub trait RegisterBus {
    fn read32(&self, offset: u32) -> u32;
    fn write32(&self, offset: u32, value: u32);
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn read32(&self, offset: u32) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&self, offset: u32, value: u32) {
        (**self).write32(offset, value)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Rc<B> {
    fn read32(&self, offset: u32) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&self, offset: u32, value: u32) {
        (**self).write32(offset, value)
    }
}
