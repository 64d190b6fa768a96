//! 裁判系统串口协议 V1.6.4

pub use super::cmd;
use super::records::*;
use super::registry::{FieldRegistry, FieldSlot, pack, packed_len};
use super::{Revision, record_accessors, state_image};

const FIELD_TABLE: [FieldSlot; 23] = pack([
    (cmd::GAME_STATUS, GameStatus::LEN),
    (cmd::GAME_RESULT, GameResult::LEN),
    (cmd::GAME_ROBOT_HP, GameRobotHp::LEN),
    (cmd::EVENT_DATA, EventData::LEN),
    (cmd::SUPPLY_PROJECTILE_ACTION, SupplyProjectileAction::LEN),
    (cmd::REFEREE_WARNING, RefereeWarning::LEN),
    (cmd::DART_INFO, DartInfo::LEN),
    (cmd::ROBOT_STATUS, RobotStatus::LEN),
    (cmd::POWER_HEAT_DATA, PowerHeatData::LEN),
    (cmd::ROBOT_POS, RobotPos::LEN),
    (cmd::BUFF, Buff::LEN_V164),
    (cmd::AIR_SUPPORT_DATA, AirSupportData::LEN),
    (cmd::HURT_DATA, HurtData::LEN),
    (cmd::SHOOT_DATA, ShootData::LEN),
    (cmd::PROJECTILE_ALLOWANCE, ProjectileAllowance::LEN),
    (cmd::RFID_STATUS, RfidStatus::LEN),
    (cmd::DART_CLIENT_CMD, DartClientCmd::LEN),
    (cmd::GROUND_ROBOT_POSITION, GroundRobotPosition::LEN),
    (cmd::RADAR_MARK_DATA, RadarMarkData::LEN),
    (cmd::SENTRY_INFO, SentryInfo::LEN_V164),
    (cmd::RADAR_INFO, RadarInfo::LEN),
    (cmd::MAP_COMMAND, MapCommand::LEN),
    (cmd::REMOTE_CONTROL, RemoteControl::LEN),
]);

static FIELDS: [FieldSlot; 23] = FIELD_TABLE;

/// 状态镜像长度
pub const STATE_LEN: usize = packed_len(&FIELD_TABLE);

/// V1.6.4 版本标记
#[derive(Debug, Clone, Copy, Default)]
pub struct V164;

impl Revision for V164 {
    const NAME: &'static str = "v1.6.4";
    type State = RefereeStateV164;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(&FIELDS)
    }
}

state_image!(
    /// V1.6.4 状态镜像
    RefereeStateV164,
    STATE_LEN
);

record_accessors!(RefereeStateV164, FIELD_TABLE);
