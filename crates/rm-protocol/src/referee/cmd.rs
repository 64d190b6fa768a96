//! 裁判系统命令码

pub const GAME_STATUS: u16 = 0x0001;
pub const GAME_RESULT: u16 = 0x0002;
pub const GAME_ROBOT_HP: u16 = 0x0003;
pub const EVENT_DATA: u16 = 0x0101;
pub const SUPPLY_PROJECTILE_ACTION: u16 = 0x0102;
pub const REFEREE_WARNING: u16 = 0x0104;
pub const DART_INFO: u16 = 0x0105;
pub const ROBOT_STATUS: u16 = 0x0201;
pub const POWER_HEAT_DATA: u16 = 0x0202;
pub const ROBOT_POS: u16 = 0x0203;
pub const BUFF: u16 = 0x0204;
pub const AIR_SUPPORT_DATA: u16 = 0x0205;
pub const HURT_DATA: u16 = 0x0206;
pub const SHOOT_DATA: u16 = 0x0207;
pub const PROJECTILE_ALLOWANCE: u16 = 0x0208;
pub const RFID_STATUS: u16 = 0x0209;
pub const DART_CLIENT_CMD: u16 = 0x020A;
pub const GROUND_ROBOT_POSITION: u16 = 0x020B;
pub const RADAR_MARK_DATA: u16 = 0x020C;
pub const SENTRY_INFO: u16 = 0x020D;
pub const RADAR_INFO: u16 = 0x020E;
/// 机器人交互数据（变长，不进入状态镜像）
pub const ROBOT_INTERACTION: u16 = 0x0301;
pub const MAP_COMMAND: u16 = 0x0303;
pub const REMOTE_CONTROL: u16 = 0x0304;
