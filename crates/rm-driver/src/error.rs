//! 驱动层错误类型定义

use crate::config::ConfigError;
use rm_can::CanError;
use rm_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 总线/串口写入错误
    #[error("CAN driver error: {0}")]
    Can(#[from] CanError),

    /// 协议编解码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 同一总线上的电机序号已被占用
    #[error("Motor {id} is already attached to bus {bus}")]
    MotorAlreadyAttached { bus: String, id: u8 },
}
