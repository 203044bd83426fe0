//! 板级组装
//!
//! 映射 GPIO / DAC / ADC 三个寄存器窗口，执行初始化序列，并把驱动组装成 [`Board`]。

use crate::adc::Adc;
use crate::button::Button;
use crate::dac::Dac;
use crate::indicator::Indicator;
use crate::window::{MmapWindow, open_mem_device};
use crate::{HalError, RegisterBus, regs};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info};

/// 寄存器窗口布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareLayout {
    /// 内存设备路径
    pub mem_device: PathBuf,
    pub gpio_base: u64,
    pub dac_base: u64,
    pub adc_base: u64,
    /// 每个窗口的映射长度
    pub window_len: usize,
}

impl Default for HardwareLayout {
    fn default() -> Self {
        Self {
            mem_device: PathBuf::from(regs::MEM_DEVICE),
            gpio_base: regs::gpio::BASE,
            dac_base: regs::dac::BASE,
            adc_base: regs::adc::BASE,
            window_len: regs::WINDOW_LEN,
        }
    }
}

/// 全部设备驱动
///
/// 指示灯与按钮共用 GPIO 窗口，所以总线类型要求 `Clone`（通常是 `Rc<MmapWindow>`）。
#[derive(Debug)]
pub struct Board<B> {
    pub adc: Adc<B>,
    pub dac: Dac<B>,
    pub indicator: Indicator<B>,
    pub button: Button<B>,
}

impl<B: RegisterBus + Clone> Board<B> {
    /// 在已获取的窗口上执行初始化序列并创建驱动
    ///
    /// 顺序：GPIO 初始化 → ADC 初始化 → 读取 DAC 就绪位作为基线。
    pub fn initialize(gpio: B, dac: B, adc: B) -> Self {
        for (offset, value) in regs::gpio::INIT_SEQUENCE {
            gpio.write32(offset, value);
        }
        debug!("gpio initialized");

        let adc = Adc::new(adc);
        adc.init();
        debug!("adc initialized");

        let dac = Dac::new(dac);
        debug!("dac baseline ready flag = 0x{:X}", dac.baseline());

        Self {
            adc,
            dac,
            indicator: Indicator::new(gpio.clone()),
            button: Button::new(gpio),
        }
    }
}

impl Board<Rc<MmapWindow>> {
    /// 映射真实硬件
    ///
    /// # 错误
    /// - `HalError::Open`: 无法打开内存设备（通常是权限不足）
    /// - `HalError::Map`: 任一窗口映射失败
    pub fn open(layout: &HardwareLayout) -> Result<Self, HalError> {
        let file = open_mem_device(&layout.mem_device)?;
        let gpio = MmapWindow::map(&file, "gpio", layout.gpio_base, layout.window_len)?;
        let dac = MmapWindow::map(&file, "dac", layout.dac_base, layout.window_len)?;
        let adc = MmapWindow::map(&file, "adc", layout.adc_base, layout.window_len)?;
        info!(
            "mapped register windows from {} (gpio 0x{:08X}, dac 0x{:08X}, adc 0x{:08X})",
            layout.mem_device.display(),
            layout.gpio_base,
            layout.dac_base,
            layout.adc_base
        );

        Ok(Self::initialize(Rc::new(gpio), Rc::new(dac), Rc::new(adc)))
    }
}
