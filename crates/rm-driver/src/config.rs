//! 通信配置
//!
//! TOML 格式，例如：
//!
//! ```toml
//! [referee]
//! revision = "v1.7.0"
//!
//! [[direct_drive]]
//! bus = "can0"
//! id = 1
//! mode = "current"
//!
//! [[unitree]]
//! id = 0
//!
//! [quantization.speed]
//! limit = 120.0
//! scale = 10.0
//! ```

use crate::{DirectDriveBus, DirectDriveMotor, DriverError, UnitreeMotor};
use rm_can::{SerialTx, TxAdapter};
use rm_protocol::directdrive::{MAX_MOTORS_PER_BUS, Mode, ModeLimit, QuantizationTable};
use rm_protocol::unitree::{MAX_MOTOR_ID, UnitreeMode};
use rm_protocol::referee::{V164, V170};
use rm_protocol::Revision;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Duplicate motor {id} on bus {bus}")]
    DuplicateMotor { bus: String, id: u8 },

    #[error("Invalid {family} motor id {id}")]
    InvalidMotorId { family: &'static str, id: u8 },

    #[error("Invalid quantization for {mode:?}: {reason}")]
    InvalidQuantization { mode: Mode, reason: String },

    #[error("No bus named {bus}")]
    UnknownBus { bus: String },
}

/// 裁判系统协议版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefereeRevision {
    #[serde(rename = "v1.6.4")]
    V164,
    #[default]
    #[serde(rename = "v1.7.0")]
    V170,
}

impl FromStr for RefereeRevision {
    type Err = serde::de::value::Error;

    /// 按配置文件中的写法解析（`v1.6.4` / `v1.7.0`）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize(IntoDeserializer::<Self::Err>::into_deserializer(s))
    }
}

impl RefereeRevision {
    pub fn name(&self) -> &'static str {
        match self {
            RefereeRevision::V164 => V164::NAME,
            RefereeRevision::V170 => V170::NAME,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefereeConfig {
    #[serde(default)]
    pub revision: RefereeRevision,
}

fn default_mode() -> Mode {
    Mode::Current
}

/// 本末电机
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectDriveConfig {
    /// 总线名（如 `can0`）
    pub bus: String,
    /// 电机序号 1~8
    pub id: u8,
    #[serde(default = "default_mode")]
    pub mode: Mode,
}

/// 宇树电机
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitreeConfig {
    /// 电机 ID 0~14
    pub id: u8,
    #[serde(default)]
    pub mode: UnitreeMode,
}

/// 量化表覆盖项（未给出的模式使用出厂值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantizationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_open_loop: Option<ModeLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ModeLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<ModeLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ModeLimit>,
}

impl QuantizationOverrides {
    fn entries(&self) -> [(Mode, Option<ModeLimit>); 4] {
        [
            (Mode::VoltageOpenLoop, self.voltage_open_loop),
            (Mode::Current, self.current),
            (Mode::Speed, self.speed),
            (Mode::Position, self.position),
        ]
    }

    /// 出厂量化表叠加覆盖项
    pub fn table(&self) -> QuantizationTable {
        let mut table = QuantizationTable::default();
        for (mode, limit) in self.entries() {
            if let Some(limit) = limit {
                *table.get_mut(mode) = limit;
            }
        }
        table
    }
}

/// 通信配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommConfig {
    #[serde(default)]
    pub referee: RefereeConfig,
    #[serde(default)]
    pub direct_drive: Vec<DirectDriveConfig>,
    #[serde(default)]
    pub unitree: Vec<UnitreeConfig>,
    #[serde(default)]
    pub quantization: QuantizationOverrides,
}

impl CommConfig {
    /// 解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded config {}: referee {}, {} DirectDrive motor(s), {} Unitree motor(s)",
            path.as_ref().display(),
            config.referee.revision.name(),
            config.direct_drive.len(),
            config.unitree.len()
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 生效的量化表
    pub fn quantization_table(&self) -> QuantizationTable {
        self.quantization.table()
    }

    /// 按 `[[direct_drive]]` 在同名总线上创建电机，并下发各自的工作模式
    pub fn direct_drive_motors<T: TxAdapter>(
        &self,
        buses: &[Arc<DirectDriveBus<T>>],
    ) -> Result<Vec<DirectDriveMotor<T>>, DriverError> {
        let quantization = self.quantization_table();
        self.direct_drive
            .iter()
            .map(|motor| {
                let bus = buses.iter().find(|bus| bus.name() == motor.bus).ok_or_else(|| {
                    ConfigError::UnknownBus {
                        bus: motor.bus.clone(),
                    }
                })?;
                DirectDriveMotor::from_config(Arc::clone(bus), motor, quantization)
            })
            .collect()
    }

    /// 按 `[[unitree]]` 创建宇树电机，`serial` 为每个电机 ID 提供串口写端
    pub fn unitree_motors<S, F>(&self, mut serial: F) -> Result<Vec<UnitreeMotor<S>>, DriverError>
    where
        S: SerialTx,
        F: FnMut(u8) -> S,
    {
        self.unitree
            .iter()
            .map(|motor| UnitreeMotor::from_config(serial(motor.id), motor))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for motor in &self.direct_drive {
            if !(1..=MAX_MOTORS_PER_BUS).contains(&motor.id) {
                return Err(ConfigError::InvalidMotorId {
                    family: "DirectDrive",
                    id: motor.id,
                });
            }
            if !seen.insert((motor.bus.as_str(), motor.id)) {
                return Err(ConfigError::DuplicateMotor {
                    bus: motor.bus.clone(),
                    id: motor.id,
                });
            }
        }

        let mut unitree_ids = HashSet::new();
        for motor in &self.unitree {
            if motor.id > MAX_MOTOR_ID || !unitree_ids.insert(motor.id) {
                return Err(ConfigError::InvalidMotorId {
                    family: "Unitree",
                    id: motor.id,
                });
            }
        }

        for (mode, limit) in self.quantization.entries() {
            if let Some(limit) = limit {
                validate_limit(mode, &limit)?;
            }
        }
        Ok(())
    }
}

fn validate_limit(mode: Mode, limit: &ModeLimit) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidQuantization {
        mode,
        reason: reason.to_string(),
    };
    if !limit.limit.is_finite() || limit.limit <= 0.0 {
        return Err(invalid("limit must be positive and finite"));
    }
    if !limit.scale.is_finite() || limit.scale <= 0.0 {
        return Err(invalid("scale must be positive and finite"));
    }
    if limit.limit * limit.scale > i16::MAX as f32 {
        return Err(invalid("limit * scale exceeds the i16 range"));
    }
    Ok(())
}
