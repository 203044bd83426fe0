//! 下行指令帧（控制器 → 设备）
//!
//! ```text
//! Byte 0-5: 目标设备身份（不匹配则丢弃）
//! Byte 6:   Bit 7 设置指示灯；Bit 0-2 颜色
//! Byte 7:   Bit 7 设置模拟输出
//! Byte 8-9: 输出值（大端，仅当 Byte 7 Bit 7 置位时有效）
//! ```

use crate::feedback::target_identity;
use crate::{
    BYTE6_OFFSET, BYTE7_OFFSET, DeviceIdentity, FRAME_LEN, ProtocolError, VALUE_OFFSET, WireFrame,
    bytes_to_u16_be, u16_to_bytes_be,
};
use bilge::prelude::*;

// ============================================================================
// 指示灯颜色
// ============================================================================

/// 通道 A（绿）掩码
pub const CHANNEL_A: u8 = 0b100;
/// 通道 B（红）掩码
pub const CHANNEL_B: u8 = 0b010;
/// 通道 C（蓝）掩码
pub const CHANNEL_C: u8 = 0b001;

/// 指示灯颜色（3 位通道掩码的封闭集合）
///
/// 数值即通道掩码：Bit 2 = 通道 A（绿），Bit 1 = 通道 B（红），Bit 0 = 通道 C（蓝）。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    num_enum::IntoPrimitive,
    num_enum::TryFromPrimitive,
)]
#[repr(u8)]
pub enum Color {
    Black = 0b000,
    Blue = 0b001,
    Red = 0b010,
    Purple = 0b011,
    Green = 0b100,
    Teal = 0b101,
    Yellow = 0b110,
    White = 0b111,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Blue,
        Color::Red,
        Color::Purple,
        Color::Green,
        Color::Teal,
        Color::Yellow,
        Color::White,
    ];

    /// 通道掩码（0..=7）
    pub fn mask(self) -> u8 {
        u8::from(self)
    }

    pub fn channel_a(self) -> bool {
        self.mask() & CHANNEL_A != 0
    }

    pub fn channel_b(self) -> bool {
        self.mask() & CHANNEL_B != 0
    }

    pub fn channel_c(self) -> bool {
        self.mask() & CHANNEL_C != 0
    }
}

impl From<u3> for Color {
    fn from(bits: u3) -> Self {
        match bits.value() {
            0b000 => Color::Black,
            0b001 => Color::Blue,
            0b010 => Color::Red,
            0b011 => Color::Purple,
            0b100 => Color::Green,
            0b101 => Color::Teal,
            0b110 => Color::Yellow,
            _ => Color::White,
        }
    }
}

// ============================================================================
// 位域
// ============================================================================

/// 指示灯字段（Byte 6）
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct IndicatorField {
    pub color: u3,           // Bit 0-2: 颜色
    pub reserved: u4,        // Bit 3-6: 保留
    pub set_indicator: bool, // Bit 7: 设置指示灯
}

/// 输出字段（Byte 7）
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default)]
pub struct OutputField {
    pub reserved: u7,     // Bit 0-6: 保留
    pub set_output: bool, // Bit 7: 设置模拟输出
}

// ============================================================================
// 下行指令
// ============================================================================

/// 执行器指令
///
/// 未置位的字段为 `None`，不会把帧中的占位字节当作真实值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InboundCommand {
    /// 设置指示灯颜色（对应 setIndicator + color）
    pub indicator: Option<Color>,
    /// 设置模拟输出（对应 setOutput + outputValue）
    pub output: Option<u16>,
}

impl InboundCommand {
    pub fn set_indicator(&self) -> bool {
        self.indicator.is_some()
    }

    pub fn set_output(&self) -> bool {
        self.output.is_some()
    }

    /// 解析任意长度的数据报
    ///
    /// 长度不等于 10 字节视为畸形帧；身份不匹配视为发往其他设备。
    pub fn parse(bytes: &[u8], identity: &DeviceIdentity) -> Result<Self, ProtocolError> {
        let frame: &WireFrame = bytes
            .try_into()
            .map_err(|_| ProtocolError::InvalidLength {
                expected: FRAME_LEN,
                actual: bytes.len(),
            })?;
        Self::decode(frame, identity)
    }

    /// 按字段位置解析固定长度帧
    pub fn decode(frame: &WireFrame, identity: &DeviceIdentity) -> Result<Self, ProtocolError> {
        if !identity.matches(frame) {
            return Err(ProtocolError::ForeignIdentity {
                target: target_identity(frame),
            });
        }

        let indicator = IndicatorField::from(u8::new(frame[BYTE6_OFFSET]));
        let output = OutputField::from(u8::new(frame[BYTE7_OFFSET]));

        Ok(Self {
            indicator: indicator
                .set_indicator()
                .then(|| Color::from(indicator.color())),
            output: output
                .set_output()
                .then(|| bytes_to_u16_be([frame[VALUE_OFFSET], frame[VALUE_OFFSET + 1]])),
        })
    }

    /// 控制器侧构建指令帧
    pub fn encode(&self, identity: &DeviceIdentity) -> WireFrame {
        let mut frame = [0u8; FRAME_LEN];
        frame[..identity.as_bytes().len()].copy_from_slice(identity.as_bytes());

        let mut indicator = IndicatorField::from(u8::new(0));
        if let Some(color) = self.indicator {
            indicator.set_set_indicator(true);
            indicator.set_color(u3::new(color.mask()));
        }
        frame[BYTE6_OFFSET] = u8::from(indicator).value();

        let mut output = OutputField::from(u8::new(0));
        if let Some(value) = self.output {
            output.set_set_output(true);
            frame[VALUE_OFFSET..VALUE_OFFSET + 2].copy_from_slice(&u16_to_bytes_be(value));
        }
        frame[BYTE7_OFFSET] = u8::from(output).value();

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: [u8; 6] = [0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6];

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new(ID)
    }

    fn frame(byte6: u8, byte7: u8, value: [u8; 2]) -> WireFrame {
        let mut f = [0u8; FRAME_LEN];
        f[..6].copy_from_slice(&ID);
        f[6] = byte6;
        f[7] = byte7;
        f[8..].copy_from_slice(&value);
        f
    }

    #[test]
    fn test_decode_indicator_and_output() {
        let cmd = InboundCommand::decode(&frame(0x85, 0x80, [0x00, 0xFF]), &identity()).unwrap();
        assert!(cmd.set_indicator());
        assert_eq!(cmd.indicator, Some(Color::Teal));
        assert_eq!(cmd.indicator.map(Color::mask), Some(5));
        assert!(cmd.set_output());
        assert_eq!(cmd.output, Some(255));
    }

    #[test]
    fn test_decode_unset_fields_are_absent() {
        // 颜色位和数值字节存在，但设置位未置位
        let cmd = InboundCommand::decode(&frame(0x07, 0x00, [0x12, 0x34]), &identity()).unwrap();
        assert_eq!(cmd, InboundCommand::default());
        assert!(!cmd.set_indicator());
        assert!(!cmd.set_output());
    }

    #[test]
    fn test_decode_ignores_reserved_bits() {
        let cmd = InboundCommand::decode(&frame(0xFA, 0x7F, [0x00, 0x01]), &identity()).unwrap();
        assert_eq!(cmd.indicator, Some(Color::Red));
        assert_eq!(cmd.output, None);
    }

    #[test]
    fn test_decode_rejects_foreign_identity() {
        let mut f = frame(0x85, 0x80, [0x00, 0xFF]);
        f[0] = 0x00;
        let err = InboundCommand::decode(&f, &identity()).unwrap_err();
        match err {
            ProtocolError::ForeignIdentity { target } => {
                assert_eq!(target.as_bytes()[0], 0x00);
                assert_eq!(target.as_bytes()[1..], ID[1..]);
            },
            other => panic!("Expected ForeignIdentity, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let f = frame(0x85, 0x80, [0x00, 0xFF]);
        for len in [0usize, 6, 9] {
            assert_eq!(
                InboundCommand::parse(&f[..len], &identity()),
                Err(ProtocolError::InvalidLength {
                    expected: 10,
                    actual: len
                })
            );
        }
        let mut long = f.to_vec();
        long.push(0);
        assert!(matches!(
            InboundCommand::parse(&long, &identity()),
            Err(ProtocolError::InvalidLength { actual: 11, .. })
        ));
        assert!(InboundCommand::parse(&f, &identity()).is_ok());
    }

    #[test]
    fn test_encode_matches_decode_layout() {
        let cmd = InboundCommand {
            indicator: Some(Color::Teal),
            output: Some(0x00FF),
        };
        assert_eq!(cmd.encode(&identity()), frame(0x85, 0x80, [0x00, 0xFF]));
    }

    #[test]
    fn test_color_channels() {
        assert!(Color::Teal.channel_a());
        assert!(!Color::Teal.channel_b());
        assert!(Color::Teal.channel_c());
        for color in Color::ALL {
            assert_eq!(Color::from(u3::new(color.mask())), color);
            assert_eq!(Color::try_from(color.mask()).unwrap(), color);
        }
        assert!(Color::try_from(8u8).is_err());
    }
}
