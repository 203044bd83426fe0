//! 按钮（低电平有效，无消抖）

use crate::RegisterBus;
use crate::regs::gpio::{BUTTON_BIT, BUTTON_STATUS};

#[derive(Debug)]
pub struct Button<B> {
    bus: B,
}

impl<B: RegisterBus> Button<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// 状态位为 0 表示按下
    pub fn is_pressed(&self) -> bool {
        self.bus.read32(BUTTON_STATUS) & BUTTON_BIT == 0
    }
}
