//! RM SDK - RoboMaster 机器人通信库
//!
//! 分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 裁判系统帧、本末/宇树电机协议的编解码
//! - **传输层** (`can`): 总线收发与串口写原语的抽象
//! - **驱动层** (`driver`): 裁判系统链路、电机对象、指标与配置
//!
//! ```rust
//! use rm_sdk::prelude::*;
//!
//! rm_sdk::init_logger();
//! let mut link = AnyRefereeLink::new(RefereeRevision::V170);
//! link.feed(&[0xA5, 0x00]);
//! assert_eq!(link.metrics().snapshot().bytes, 2);
//! ```

pub use rm_can as can;
pub use rm_driver as driver;
pub use rm_protocol as protocol;

pub mod prelude;

pub use rm_can::{BusFrame, CanError, RxAdapter, SerialTx, TxAdapter};
pub use rm_driver::{
    AnyRefereeLink, CommConfig, DirectDriveBus, DirectDriveMotor, DriverError, RefereeLink,
    RefereeRevision, UnitreeMotor,
};
pub use rm_protocol::ProtocolError;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 过滤规则取自 `RUST_LOG`，未设置时为 `info`；`log` crate 的日志一并转发。
/// 可重复调用，只有第一次生效。
pub fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            let _ = tracing_log::LogTracer::init();
        }
    });
}
