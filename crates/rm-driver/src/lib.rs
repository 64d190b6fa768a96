//! 驱动层模块
//!
//! 在无状态的编解码之上提供有状态的设备对象：
//! - 裁判系统链路（ArcSwap 无锁发布状态快照）
//! - 本末电机与其总线句柄（驱动指令合并发送）
//! - 宇树电机（串口命令与遥测）
//! - 链路指标、帧回调钩子、TOML 通信配置
//!
//! 传输层只通过 `rm-can` 的 trait 接入，本 crate 不包含任何硬件驱动。

pub mod bus;
pub mod coalescer;
pub mod config;
pub mod directdrive;
mod error;
pub mod hooks;
pub mod metrics;
pub mod referee;
pub mod unitree;

pub use bus::{DirectDriveBus, flush_all};
pub use coalescer::TxCoalescer;
pub use config::{CommConfig, ConfigError, RefereeRevision};
pub use directdrive::{DirectDriveMotor, dispatch_feedback};
pub use error::DriverError;
pub use hooks::{FrameHook, HookManager};
pub use metrics::LinkMetrics;
pub use referee::{AnyRefereeLink, LastFrame, RefereeLink, RefereeReader};
pub use unitree::UnitreeMotor;
