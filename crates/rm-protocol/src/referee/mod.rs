//! 裁判系统串口协议
//!
//! 帧格式（小端字节序）：
//!
//! ```text
//! SOF(0xA5) | LEN_LSB | LEN_MSB | SEQ | CRC8 | CMDID_LSB | CMDID_MSB | payload[LEN] | CRC16_LSB | CRC16_MSB
//! ```
//!
//! - CRC8 覆盖帧头前 4 字节
//! - CRC16 覆盖 SOF 到 payload 末尾的全部字节
//!
//! 每个协议版本（[`Revision`]）提供一张命令码 → 偏移量的字段表和一块扁平的状态镜像，
//! [`FrameDecoder`] 对版本泛型，新增版本无需改动解码逻辑。

pub mod cmd;
pub mod decoder;
pub mod records;
pub mod registry;
pub mod v164;
pub mod v170;

pub use decoder::{DecoderStats, FrameDecoder};
pub use registry::{FieldRegistry, FieldSlot};
pub use v164::{RefereeStateV164, V164};
pub use v170::{RefereeStateV170, V170};

use crate::ProtocolError;
use crate::crc::{CRC8_INIT, CRC16_INIT, crc8, crc16};
use thiserror::Error;

/// 帧起始字节
pub const SOF: u8 = 0xA5;

/// 单帧最大长度（含全部元数据）
pub const FRAME_MAX_LEN: usize = 128;

/// 帧头长度：SOF + LEN(2) + SEQ + CRC8
pub const HEADER_LEN: usize = 5;

/// 命令码长度
pub const CMD_ID_LEN: usize = 2;

/// 帧尾 CRC16 长度
pub const CRC16_LEN: usize = 2;

/// 全部元数据长度
pub const METADATA_LEN: usize = HEADER_LEN + CMD_ID_LEN + CRC16_LEN;

/// 允许的最大 payload 长度（LEN 必须严格小于 `FRAME_MAX_LEN - METADATA_LEN`）
pub const MAX_PAYLOAD_LEN: usize = FRAME_MAX_LEN - METADATA_LEN - 1;

/// 协议版本的状态镜像
///
/// 一块按线缆格式排布的扁平字节区，字段按 [`FieldSlot`] 的偏移量原样写入，
/// 读取时由各版本的访问方法按已知偏移解析，不依赖 Rust 结构体的内存布局。
pub trait StateImage: Clone + Default + Send + Sync + 'static {
    /// 只读字节视图
    fn as_bytes(&self) -> &[u8];

    /// 可写字节视图（只供解码器在校验通过后写入）
    fn as_bytes_mut(&mut self) -> &mut [u8];
}

/// 裁判系统协议版本
///
/// 版本通过标记类型在编译期选择：`FrameDecoder<V170>`。
pub trait Revision: Send + Sync + 'static {
    /// 版本号字符串，如 `"v1.7.0"`
    const NAME: &'static str;

    /// 该版本的状态镜像
    type State: StateImage;

    /// 该版本的命令码字段表
    fn registry() -> FieldRegistry;
}

/// 一帧成功写入状态后的元信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// 包序号
    pub seq: u8,
    /// 命令码
    pub cmd_id: u16,
    /// payload 长度
    pub len: usize,
}

/// 帧被丢弃的原因
///
/// 所有原因都是可恢复的：解码器丢弃当前帧，从下一个 SOF 继续。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// 声明长度越界（重同步）
    #[error("Declared length {len} out of range")]
    InvalidLength { len: usize },

    /// 帧头 CRC8 不匹配
    #[error("Header CRC8 mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    HeaderChecksum { computed: u8, received: u8 },

    /// 整帧 CRC16 不匹配
    #[error("Frame CRC16 mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    PayloadChecksum { computed: u16, received: u16 },

    /// 命令码不在当前版本的字段表中（帧完整，但无处写入）
    #[error("Unknown command id 0x{cmd_id:04X}")]
    UnknownCmdId { cmd_id: u16 },

    /// payload 比注册的字段长，写入会覆盖相邻字段
    #[error("Payload of {len} bytes overflows field 0x{cmd_id:04X} ({capacity} bytes)")]
    FieldOverflow {
        cmd_id: u16,
        len: usize,
        capacity: usize,
    },
}

/// 编码一帧裁判系统数据
///
/// 用于机器人间交互数据的发送和测试数据构造。
///
/// ```rust
/// use rm_protocol::referee::{FrameDecoder, V170, encode_frame, v170::cmd};
///
/// let frame = encode_frame(0, cmd::GAME_RESULT, &[2]).unwrap();
/// let mut decoder = FrameDecoder::<V170>::new();
/// decoder.extend(&frame);
/// assert_eq!(decoder.current_state().game_result().winner, 2);
/// ```
pub fn encode_frame(seq: u8, cmd_id: u16, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let len = payload.len() as u16;
    let mut frame = Vec::with_capacity(METADATA_LEN + payload.len());
    frame.push(SOF);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.push(seq);
    frame.push(crc8(&frame, CRC8_INIT));
    frame.extend_from_slice(&cmd_id.to_le_bytes());
    frame.extend_from_slice(payload);
    let crc = crc16(&frame, CRC16_INIT);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// 为版本状态镜像生成存储结构体及 [`StateImage`] 实现
macro_rules! state_image {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            raw: [u8; $len],
        }

        impl Default for $name {
            fn default() -> Self {
                Self { raw: [0u8; $len] }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("len", &self.raw.len())
                    .finish_non_exhaustive()
            }
        }

        impl $crate::referee::StateImage for $name {
            fn as_bytes(&self) -> &[u8] {
                &self.raw
            }

            fn as_bytes_mut(&mut self) -> &mut [u8] {
                &mut self.raw
            }
        }

        impl $name {
            fn field(&self, slot: $crate::referee::FieldSlot) -> &[u8] {
                &self.raw[slot.offset..slot.offset + slot.len]
            }
        }
    };
}

pub(crate) use state_image;

/// 为版本状态镜像生成各命令码的类型化访问方法
///
/// `$table` 为该版本的字段表常量；各记录按字段长度自适应版本差异。
macro_rules! record_accessors {
    (@get $table:expr, $fn_name:ident, $cmd:ident, $record:ident) => {
        pub fn $fn_name(&self) -> $crate::referee::records::$record {
            const SLOT: $crate::referee::FieldSlot =
                $crate::referee::registry::slot_of(&$table, $crate::referee::cmd::$cmd);
            $crate::referee::records::$record::parse(self.field(SLOT))
        }
    };
    ($name:ident, $table:expr) => {
        impl $name {
            record_accessors!(@get $table, game_status, GAME_STATUS, GameStatus);
            record_accessors!(@get $table, game_result, GAME_RESULT, GameResult);
            record_accessors!(@get $table, game_robot_hp, GAME_ROBOT_HP, GameRobotHp);
            record_accessors!(@get $table, event_data, EVENT_DATA, EventData);
            record_accessors!(@get $table, supply_projectile_action, SUPPLY_PROJECTILE_ACTION, SupplyProjectileAction);
            record_accessors!(@get $table, referee_warning, REFEREE_WARNING, RefereeWarning);
            record_accessors!(@get $table, dart_info, DART_INFO, DartInfo);
            record_accessors!(@get $table, robot_status, ROBOT_STATUS, RobotStatus);
            record_accessors!(@get $table, power_heat_data, POWER_HEAT_DATA, PowerHeatData);
            record_accessors!(@get $table, robot_pos, ROBOT_POS, RobotPos);
            record_accessors!(@get $table, buff, BUFF, Buff);
            record_accessors!(@get $table, air_support_data, AIR_SUPPORT_DATA, AirSupportData);
            record_accessors!(@get $table, hurt_data, HURT_DATA, HurtData);
            record_accessors!(@get $table, shoot_data, SHOOT_DATA, ShootData);
            record_accessors!(@get $table, projectile_allowance, PROJECTILE_ALLOWANCE, ProjectileAllowance);
            record_accessors!(@get $table, rfid_status, RFID_STATUS, RfidStatus);
            record_accessors!(@get $table, dart_client_cmd, DART_CLIENT_CMD, DartClientCmd);
            record_accessors!(@get $table, ground_robot_position, GROUND_ROBOT_POSITION, GroundRobotPosition);
            record_accessors!(@get $table, radar_mark_data, RADAR_MARK_DATA, RadarMarkData);
            record_accessors!(@get $table, sentry_info, SENTRY_INFO, SentryInfo);
            record_accessors!(@get $table, radar_info, RADAR_INFO, RadarInfo);
            record_accessors!(@get $table, map_command, MAP_COMMAND, MapCommand);
            record_accessors!(@get $table, remote_control, REMOTE_CONTROL, RemoteControl);
        }
    };
}

pub(crate) use record_accessors;
