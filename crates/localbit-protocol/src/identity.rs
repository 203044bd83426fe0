//! 设备身份
//!
//! 每台设备由 6 字节身份标识（通常取自 MAC 地址），启动后不可变。
//! 下行帧前 6 字节必须与本机身份一致，否则丢弃（共享介质过滤）。

use crate::{IDENTITY_LEN, ProtocolError};
use std::fmt;
use std::str::FromStr;

/// 6 字节设备身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity([u8; IDENTITY_LEN]);

impl DeviceIdentity {
    pub const fn new(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// 比较帧头部的身份字段
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes.len() >= IDENTITY_LEN && bytes[..IDENTITY_LEN] == self.0
    }

    /// 从十六进制文本解码
    ///
    /// 只取前 12 个字符（与身份文件格式一致，允许尾随换行等内容）。
    pub fn from_hex_prefix(text: &str) -> Result<Self, ProtocolError> {
        let digits = text.get(..IDENTITY_LEN * 2).ok_or_else(|| {
            ProtocolError::InvalidIdentity(format!(
                "need {} hex digits, got {}",
                IDENTITY_LEN * 2,
                text.len()
            ))
        })?;
        let mut bytes = [0u8; IDENTITY_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| ProtocolError::InvalidIdentity(format!("{:?}: {}", digits, e)))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; IDENTITY_LEN]> for DeviceIdentity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

/// 支持 `a1b2c3d4e5f6` 与 `a1:b2:c3:d4:e5:f6` 两种写法
impl FromStr for DeviceIdentity {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || {
            ProtocolError::InvalidIdentity(format!(
                "{:?} is neither aabbccddeeff nor aa:bb:cc:dd:ee:ff",
                s
            ))
        };

        if text.len() == IDENTITY_LEN * 2 {
            return Self::from_hex_prefix(text);
        }

        // 冒号只允许出现在字节边界上
        let groups: Vec<&str> = text.split(':').collect();
        if groups.len() != IDENTITY_LEN || groups.iter().any(|g| g.len() != 2) {
            return Err(invalid());
        }
        Self::from_hex_prefix(&groups.concat())
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: [u8; 6] = [0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6];

    #[test]
    fn test_parse_compact_and_colon_forms() {
        let a: DeviceIdentity = "a1b2c3d4e5f6".parse().unwrap();
        let b: DeviceIdentity = "A1:B2:C3:D4:E5:F6".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &ID);
    }

    #[test]
    fn test_display_is_colon_separated_lowercase() {
        assert_eq!(DeviceIdentity::new(ID).to_string(), "a1:b2:c3:d4:e5:f6");
    }

    #[test]
    fn test_hex_prefix_ignores_trailing_text() {
        let id = DeviceIdentity::from_hex_prefix("a1b2c3d4e5f6\n").unwrap();
        assert_eq!(id, DeviceIdentity::new(ID));
    }

    #[test]
    fn test_rejects_short_and_non_hex() {
        assert!(DeviceIdentity::from_hex_prefix("a1b2c3").is_err());
        assert!("a1b2c3d4e5fz".parse::<DeviceIdentity>().is_err());
        assert!("a1b2c3d4e5f6aa".parse::<DeviceIdentity>().is_err());
    }

    #[test]
    fn test_colons_only_at_byte_boundaries() {
        assert!("a1:b2:c3:d4:e5:f6".parse::<DeviceIdentity>().is_ok());
        assert!(" a1:b2:c3:d4:e5:f6\n".parse::<DeviceIdentity>().is_ok());
        for text in [
            "a1b2:c3d4e5f6",
            "a:1b2c3d4e5f6",
            "a1:b2:c3:d4:e5f6",
            "a1:b2:c3:d4:e5:f6:",
            "a1::b2:c3:d4:e5:f6",
            ":a1:b2:c3:d4:e5:f6",
            "a1:b2:c3:d4:e5:f",
        ] {
            assert!(text.parse::<DeviceIdentity>().is_err(), "{:?}", text);
        }
    }

    #[test]
    fn test_matches_prefix_only() {
        let id = DeviceIdentity::new(ID);
        let mut frame = [0u8; 10];
        frame[..6].copy_from_slice(&ID);
        assert!(id.matches(&frame));
        frame[5] ^= 0x01;
        assert!(!id.matches(&frame));
        assert!(!id.matches(&ID[..5]));
    }
}
