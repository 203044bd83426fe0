//! 寄存器偏移表
//!
//! 所有偏移均相对于各自窗口的基地址，数值由硬件决定。

/// 默认内存设备
pub const MEM_DEVICE: &str = "/dev/mem";

/// 窗口长度（8 KiB）
pub const WINDOW_LEN: usize = 0x2000;

// ============================================================================
// GPIO 窗口（指示灯 + 按钮）
// ============================================================================

pub mod gpio {
    /// 默认物理基地址
    pub const BASE: u64 = 0x8001_8000;

    /// 指示灯单个通道的置位/清零寄存器
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelRegs {
        pub assert: u32,
        pub clear: u32,
        pub bit: u32,
    }

    /// 通道 A（绿）
    pub const CHANNEL_A: ChannelRegs = ChannelRegs {
        assert: 0x0508,
        clear: 0x0504,
        bit: 0x4000_0000,
    };

    /// 通道 B（红）
    pub const CHANNEL_B: ChannelRegs = ChannelRegs {
        assert: 0x0508,
        clear: 0x0504,
        bit: 0x8000_0000,
    };

    /// 通道 C（蓝）
    pub const CHANNEL_C: ChannelRegs = ChannelRegs {
        assert: 0x0518,
        clear: 0x0514,
        bit: 0x1000_0000,
    };

    /// 按钮状态寄存器（低电平有效）
    pub const BUTTON_STATUS: u32 = 0x0610;
    pub const BUTTON_BIT: u32 = 0x0000_0080;

    /// 初始化序列（引脚复用与方向）
    pub const INIT_SEQUENCE: [(u32, u32); 6] = [
        (0x0114, 0xF000_0000), // LED
        (0x0124, 0x0000_C000), // button
        (0x0134, 0x0300_0000), // LED
        (0x0704, 0x4000_0000), // LED
        (0x0714, 0x1000_0000), // LED
        (0x0718, 0x0000_0080), // button
    ];
}

// ============================================================================
// DAC 窗口
// ============================================================================

pub mod dac {
    pub const BASE: u64 = 0x8004_8000;

    /// 状态寄存器
    pub const STATUS: u32 = 0x0040;
    /// 就绪翻转位
    pub const READY_BIT: u32 = 0x0000_0002;
    /// 数据寄存器
    pub const DATA: u32 = 0x00F0;
}

// ============================================================================
// ADC 窗口
// ============================================================================

pub mod adc {
    pub const BASE: u64 = 0x8005_0000;

    /// 转换前触发寄存器
    pub const TRIGGER_BEFORE: u32 = 0x0004;
    /// 转换后确认寄存器
    pub const TRIGGER_AFTER: u32 = 0x0018;
    /// 触发写入值
    pub const TRIGGER: u32 = 0x0000_0001;
    /// 采样值寄存器
    pub const VALUE: u32 = 0x0050;
    /// 相位位（每次转换完成后翻转）
    pub const PHASE_BIT: u32 = 0x8000_0000;

    pub const INIT_SEQUENCE: [(u32, u32); 7] = [
        (0x0008, 0x4000_0000),
        (0x0004, 0x0000_0001),
        (0x0028, 0x0100_0000),
        (0x0014, 0x0001_0000),
        (0x0034, 0x0000_0001),
        (0x0024, 0x0100_0000),
        (0x0144, 0x0000_0000),
    ];
}

// 所有偏移都必须位于窗口内且 4 字节对齐
#[cfg(test)]
mod tests {
    use super::*;

    fn check(offset: u32) {
        assert_eq!(offset % 4, 0, "offset 0x{:04X} misaligned", offset);
        assert!((offset as usize) + 4 <= WINDOW_LEN, "offset 0x{:04X} out of window", offset);
    }

    #[test]
    fn test_offsets_fit_window() {
        for ch in [gpio::CHANNEL_A, gpio::CHANNEL_B, gpio::CHANNEL_C] {
            check(ch.assert);
            check(ch.clear);
        }
        check(gpio::BUTTON_STATUS);
        for (offset, _) in gpio::INIT_SEQUENCE.iter().chain(adc::INIT_SEQUENCE.iter()) {
            check(*offset);
        }
        for offset in [dac::STATUS, dac::DATA, adc::TRIGGER_BEFORE, adc::TRIGGER_AFTER, adc::VALUE] {
            check(offset);
        }
    }

    #[test]
    fn test_bases_are_page_aligned() {
        for base in [gpio::BASE, dac::BASE, adc::BASE] {
            assert_eq!(base % 4096, 0);
        }
    }
}
