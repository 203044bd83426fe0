//! localbitd 主入口
//!
//! 启动顺序：配置 → 硬件窗口 → 网络 → 执行器复位 → 永久循环。
//! 启动阶段任何失败都以状态码 1 退出。

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{DEFAULT_IDENTITY_FILE, DEFAULT_SERVER_FILE, Overrides, Settings};
use localbit_driver::ControlLoop;
use localbit_hal::MmapWindow;
use localbit_net::UdpTransport;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 未设置 `RUST_LOG` 时的日志过滤
const DEFAULT_LOG_FILTER: &str = "localbitd=info,localbit_driver=info,localbit_net=info,localbit_hal=info";

/// localbit I/O 模块守护进程
///
/// 采样模拟输入与按钮并上报控制端，执行控制端下发的指示灯与模拟输出命令
#[derive(Parser, Debug)]
#[command(name = "localbitd", version)]
#[command(about = "Bridge a localbit I/O module to its controller over UDP", long_about = None)]
struct Args {
    /// TOML 配置文件
    ///
    /// 指定后忽略 --server-file / --identity-file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 服务器主机名文件（第一行）
    #[arg(long, default_value = DEFAULT_SERVER_FILE)]
    server_file: PathBuf,

    /// 设备身份文件（前 12 个十六进制字符）
    #[arg(long, default_value = DEFAULT_IDENTITY_FILE)]
    identity_file: PathBuf,

    /// 覆盖控制端主机名
    #[arg(long)]
    server: Option<String>,

    /// 覆盖上报端口（默认 2020）
    #[arg(long)]
    send_port: Option<u16>,

    /// 覆盖命令接收端口（默认 2021）
    #[arg(long)]
    receive_port: Option<u16>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            send_port: self.send_port,
            receive_port: self.receive_port,
        }
    }

    fn load_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => config::load_toml(path)?,
            None => config::load_legacy(&self.server_file, &self.identity_file)?,
        };
        settings.apply(&self.overrides());
        Ok(settings)
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 执行启动序列，返回已复位、可运行的控制循环
fn start(args: &Args) -> Result<ControlLoop<Rc<MmapWindow>, UdpTransport>> {
    info!("initializing");

    let settings = args.load_settings()?;
    info!("server: {}", settings.endpoint.server);
    info!("identity: {}", settings.identity);

    let mut control = ControlLoop::open(
        &settings.layout,
        &settings.endpoint,
        settings.identity,
        settings.loop_config,
    )
    .context("startup failed")?;

    control.prepare();
    Ok(control)
}

fn main() {
    let args = Args::parse();
    init_logging();

    match start(&args) {
        Ok(control) => control.run(),
        Err(e) => {
            eprintln!("localbitd: {:#}", e);
            process::exit(1);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_default_legacy_paths() {
        let args = Args::parse_from(["localbitd"]);
        assert_eq!(args.config, None);
        assert_eq!(args.server_file, PathBuf::from("/root/localbit_server.cfg"));
        assert_eq!(args.identity_file, PathBuf::from("/root/mac_address.cfg"));
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = Args::parse_from([
            "localbitd",
            "--config",
            "/etc/localbit.toml",
            "--server",
            "10.0.0.7",
            "--receive-port",
            "4021",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.server.as_deref(), Some("10.0.0.7"));
        assert_eq!(overrides.send_port, None);
        assert_eq!(overrides.receive_port, Some(4021));
        assert_eq!(args.config, Some(PathBuf::from("/etc/localbit.toml")));
    }

    #[test]
    fn test_missing_legacy_files_fail() {
        let args = Args::parse_from([
            "localbitd",
            "--server-file",
            "/nonexistent/server.cfg",
            "--identity-file",
            "/nonexistent/mac.cfg",
        ]);
        let err = args.load_settings().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/server.cfg"));
    }
}
