//! 上行报告帧（设备 → 控制器）
//!
//! 每个循环周期发送一次，不去重、不抑制未变化的值。
//!
//! ```text
//! Byte 0-5: 设备身份
//! Byte 6:   保留（恒为 0x00）
//! Byte 7:   标志位域（Bit 0: 按钮按下）
//! Byte 8-9: ADC 采样值（大端）
//! ```

use crate::{
    BYTE6_OFFSET, BYTE7_OFFSET, DeviceIdentity, FRAME_LEN, IDENTITY_LEN, IDENTITY_OFFSET,
    ProtocolError, VALUE_OFFSET, WireFrame, bytes_to_u16_be, u16_to_bytes_be,
};
use bilge::prelude::*;

/// 上行标志位域（Byte 7）
///
/// bilge 默认 LSB first，Bit 0 即按钮状态。
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct ReportFlags {
    pub button_pressed: bool, // Bit 0: 按钮按下
    pub reserved: u7,         // Bit 1-7: 保留
}

/// 上行报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutboundReport {
    /// 重标定后的 ADC 采样值（0..=0xFFFF）
    pub raw_value: u16,
    /// 按钮是否按下
    pub button_pressed: bool,
}

impl OutboundReport {
    pub fn new(raw_value: u16, button_pressed: bool) -> Self {
        Self {
            raw_value,
            button_pressed,
        }
    }

    /// 编码为固定长度帧
    pub fn encode(&self, identity: &DeviceIdentity) -> WireFrame {
        let mut frame = [0u8; FRAME_LEN];
        frame[IDENTITY_OFFSET..IDENTITY_OFFSET + IDENTITY_LEN].copy_from_slice(identity.as_bytes());
        frame[BYTE6_OFFSET] = 0x00;

        let mut flags = ReportFlags::from(u8::new(0));
        flags.set_button_pressed(self.button_pressed);
        frame[BYTE7_OFFSET] = u8::from(flags).value();

        frame[VALUE_OFFSET..VALUE_OFFSET + 2].copy_from_slice(&u16_to_bytes_be(self.raw_value));
        frame
    }

    /// 控制器侧解析（镜像设备侧的身份检查）
    pub fn parse(bytes: &[u8], identity: &DeviceIdentity) -> Result<Self, ProtocolError> {
        if bytes.len() != FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: FRAME_LEN,
                actual: bytes.len(),
            });
        }
        if !identity.matches(bytes) {
            return Err(ProtocolError::ForeignIdentity {
                target: target_identity(bytes),
            });
        }

        let flags = ReportFlags::from(u8::new(bytes[BYTE7_OFFSET]));
        Ok(Self {
            raw_value: bytes_to_u16_be([bytes[VALUE_OFFSET], bytes[VALUE_OFFSET + 1]]),
            button_pressed: flags.button_pressed(),
        })
    }
}

/// 取帧头部身份（调用方已保证长度）
pub(crate) fn target_identity(bytes: &[u8]) -> DeviceIdentity {
    let mut id = [0u8; IDENTITY_LEN];
    id.copy_from_slice(&bytes[IDENTITY_OFFSET..IDENTITY_OFFSET + IDENTITY_LEN]);
    DeviceIdentity::new(id)
}
