//! 配置加载
//!
//! 两种来源：
//! - `--config` 指定的 TOML 文件
//! - 传统部署的两个文本文件：服务器主机名、设备身份（十六进制）
//!
//! 命令行参数最后覆盖网络相关字段。

use anyhow::{Context, Result, bail};
use localbit_driver::LoopConfig;
use localbit_hal::{HardwareLayout, regs};
use localbit_net::Endpoint;
use localbit_protocol::{DEFAULT_RECEIVE_PORT, DEFAULT_SEND_PORT, DeviceIdentity};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 传统部署的服务器文件
pub const DEFAULT_SERVER_FILE: &str = "/root/localbit_server.cfg";
/// 传统部署的身份文件
pub const DEFAULT_IDENTITY_FILE: &str = "/root/mac_address.cfg";

/// 启动所需的全部配置
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: Endpoint,
    pub identity: DeviceIdentity,
    pub layout: HardwareLayout,
    pub loop_config: LoopConfig,
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub send_port: Option<u16>,
    pub receive_port: Option<u16>,
}

impl Settings {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(server) = &overrides.server {
            self.endpoint.server = server.clone();
        }
        if let Some(port) = overrides.send_port {
            self.endpoint.send_port = port;
        }
        if let Some(port) = overrides.receive_port {
            self.endpoint.receive_port = port;
        }
    }
}

// ============================================================================
// TOML 文件
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    network: NetworkSection,
    device: DeviceSection,
    #[serde(default)]
    hardware: HardwareSection,
    #[serde(default)]
    pacing: PacingSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkSection {
    server: String,
    #[serde(default = "default_send_port")]
    send_port: u16,
    #[serde(default = "default_receive_port")]
    receive_port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceSection {
    /// `aabbccddeeff` 或 `aa:bb:cc:dd:ee:ff`
    identity: String,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HardwareSection {
    mem_device: PathBuf,
    gpio_base: u64,
    dac_base: u64,
    adc_base: u64,
    window_len: usize,
}

impl Default for HardwareSection {
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

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PacingSection {
    cycle_delay_ms: u64,
}

impl Default for PacingSection {
    fn default() -> Self {
        Self { cycle_delay_ms: 10 }
    }
}

fn default_send_port() -> u16 {
    DEFAULT_SEND_PORT
}

fn default_receive_port() -> u16 {
    DEFAULT_RECEIVE_PORT
}

/// 解析 TOML 文本
pub fn parse_toml(content: &str) -> Result<Settings> {
    let file: FileConfig = toml::from_str(content).context("invalid configuration")?;

    let server = file.network.server.trim();
    if server.is_empty() {
        bail!("network.server must not be empty");
    }
    let identity: DeviceIdentity = file
        .device
        .identity
        .trim()
        .parse()
        .context("invalid device.identity")?;

    Ok(Settings {
        endpoint: Endpoint {
            server: server.to_string(),
            send_port: file.network.send_port,
            receive_port: file.network.receive_port,
        },
        identity,
        layout: HardwareLayout {
            mem_device: file.hardware.mem_device,
            gpio_base: file.hardware.gpio_base,
            dac_base: file.hardware.dac_base,
            adc_base: file.hardware.adc_base,
            window_len: file.hardware.window_len,
        },
        loop_config: LoopConfig {
            cycle_delay: Duration::from_millis(file.pacing.cycle_delay_ms),
        },
    })
}

/// 加载 TOML 配置文件
pub fn load_toml(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_toml(&content).with_context(|| format!("in {}", path.display()))
}

// ============================================================================
// 传统两文件布局
// ============================================================================

/// 服务器文件：第一个换行之前的文本
pub fn parse_server(content: &str) -> Result<String> {
    let line = content.split('\n').next().unwrap_or_default();
    let host = line.trim_end_matches('\r').trim();
    if host.is_empty() {
        bail!("server hostname is empty");
    }
    Ok(host.to_string())
}

/// 从传统文件加载
pub fn load_legacy(server_file: &Path, identity_file: &Path) -> Result<Settings> {
    let content = fs::read_to_string(server_file)
        .with_context(|| format!("Failed to read server file {}", server_file.display()))?;
    let server = parse_server(&content)
        .with_context(|| format!("in {}", server_file.display()))?;

    let content = fs::read_to_string(identity_file)
        .with_context(|| format!("Failed to read identity file {}", identity_file.display()))?;
    let identity = DeviceIdentity::from_hex_prefix(&content)
        .with_context(|| format!("in {}", identity_file.display()))?;

    Ok(Settings {
        endpoint: Endpoint::new(server),
        identity,
        layout: HardwareLayout::default(),
        loop_config: LoopConfig::default(),
    })
}
