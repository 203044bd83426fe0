//! # Localbit Driver
//!
//! 把设备驱动、线协议和网络传输组装成自适应的采样/上报/命令循环。
//!
//! ```text
//! Transport ──receive──▶ InboundCommand ──▶ Indicator / Dac
//! Button + Adc ──▶ OutboundReport ──send──▶ Transport
//!                   └──▶ Pacer（决定下一次监听多久）
//! ```

pub mod control_loop;
mod error;
pub mod pacing;

pub use control_loop::{ControlLoop, IterationOutcome, LoopConfig};
pub use error::DriverError;
pub use pacing::{PaceAdjustment, Pacer};
