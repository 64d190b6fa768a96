//! 裁判系统数据记录
//!
//! 每个记录对应一个命令码的 payload，按线缆偏移（小端）逐字段解析，
//! 与 Rust 结构体的内存布局无关。各版本共用同一套记录，版本差异体现在字段长度上。

use bilge::prelude::*;
use num_enum::TryFromPrimitive;

/// 小端顺序读取器
///
/// 越界读取返回 0：字段切片长度由字段表保证，这里不会真正越界。
struct LeReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> LeReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = self.bytes.get(self.pos..self.pos + N) {
            out.copy_from_slice(src);
        }
        self.pos += N;
        out
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn i8(&mut self) -> i8 {
        self.u8() as i8
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }
}

// ============================================================================
// 比赛状态 (0x0001)
// ============================================================================

/// 比赛类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum GameType {
    /// 超级对抗赛
    Rmuc = 1,
    /// 高校单项赛
    Rmut = 2,
    /// 人工智能挑战赛
    Rmua = 3,
    /// 联盟赛 3V3 对抗
    Rmul3v3 = 4,
    /// 联盟赛步兵对抗
    Rmul1v1 = 5,
}

/// 比赛阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum GameProgress {
    NotStarted = 0,
    Preparing = 1,
    SelfChecking = 2,
    Countdown = 3,
    InGame = 4,
    Settling = 5,
}

/// Byte 0 位域：低 4 位比赛类型，高 4 位比赛阶段
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq)]
pub struct GameTypeProgress {
    pub game_type: u4,
    pub game_progress: u4,
}

/// 比赛状态 (0x0001)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameStatus {
    pub type_progress: GameTypeProgress,
    /// 当前阶段剩余时间（s）
    pub stage_remain_time: u16,
    /// UNIX 时间戳
    pub sync_timestamp: u64,
}

impl GameStatus {
    pub const LEN: usize = 11;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            type_progress: GameTypeProgress::from(r.u8()),
            stage_remain_time: r.u16(),
            sync_timestamp: r.u64(),
        }
    }

    /// 比赛类型，未知值返回 `None`
    pub fn game_type(&self) -> Option<GameType> {
        GameType::try_from(self.type_progress.game_type().value()).ok()
    }

    /// 比赛阶段，未知值返回 `None`
    pub fn progress(&self) -> Option<GameProgress> {
        GameProgress::try_from(self.type_progress.game_progress().value()).ok()
    }
}

/// 比赛结果 (0x0002)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameResult {
    /// 0 平局，1 红方胜利，2 蓝方胜利
    pub winner: u8,
}

impl GameResult {
    pub const LEN: usize = 1;

    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            winner: LeReader::new(bytes).u8(),
        }
    }
}

/// 单方机器人血量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamHp {
    pub hero: u16,
    pub engineer: u16,
    pub infantry_3: u16,
    pub infantry_4: u16,
    pub infantry_5: u16,
    pub sentry: u16,
    pub outpost: u16,
    pub base: u16,
}

impl TeamHp {
    fn read(r: &mut LeReader<'_>) -> Self {
        Self {
            hero: r.u16(),
            engineer: r.u16(),
            infantry_3: r.u16(),
            infantry_4: r.u16(),
            infantry_5: r.u16(),
            sentry: r.u16(),
            outpost: r.u16(),
            base: r.u16(),
        }
    }
}

/// 机器人血量 (0x0003)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameRobotHp {
    pub red: TeamHp,
    pub blue: TeamHp,
}

impl GameRobotHp {
    pub const LEN: usize = 32;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        let red = TeamHp::read(&mut r);
        let blue = TeamHp::read(&mut r);
        Self { red, blue }
    }
}

// ============================================================================
// 场地事件 (0x0101 ~ 0x0105)
// ============================================================================

/// 场地事件 (0x0101)，位域原样保留
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventData {
    pub event: u32,
}

impl EventData {
    pub const LEN: usize = 4;

    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            event: LeReader::new(bytes).u32(),
        }
    }
}

/// 补给站动作 (0x0102)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupplyProjectileAction {
    pub supply_robot_id: u8,
    pub supply_projectile_step: u8,
    pub supply_projectile_num: u8,
}

impl SupplyProjectileAction {
    pub const LEN: usize = 4;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        let _reserved = r.u8();
        Self {
            supply_robot_id: r.u8(),
            supply_projectile_step: r.u8(),
            supply_projectile_num: r.u8(),
        }
    }
}

/// 裁判警告 (0x0104)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefereeWarning {
    /// 1 双方黄牌，2 黄牌，3 红牌，4 判负
    pub level: u8,
    pub offending_robot_id: u8,
    pub count: u8,
}

impl RefereeWarning {
    pub const LEN: usize = 3;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            level: r.u8(),
            offending_robot_id: r.u8(),
            count: r.u8(),
        }
    }
}

/// 飞镖发射相关 (0x0105)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DartInfo {
    pub dart_remaining_time: u8,
    pub dart_info: u16,
}

impl DartInfo {
    pub const LEN: usize = 3;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            dart_remaining_time: r.u8(),
            dart_info: r.u16(),
        }
    }
}

// ============================================================================
// 机器人状态 (0x0201 ~ 0x020E)
// ============================================================================

/// 电源管理模块输出状态
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq)]
pub struct PowerManagementOutput {
    pub gimbal: bool,
    pub chassis: bool,
    pub shooter: bool,
    pub reserved: u5,
}

/// 机器人性能体系数据 (0x0201)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobotStatus {
    pub robot_id: u8,
    pub robot_level: u8,
    pub current_hp: u16,
    pub maximum_hp: u16,
    pub shooter_barrel_cooling_value: u16,
    pub shooter_barrel_heat_limit: u16,
    pub chassis_power_limit: u16,
    pub power_output: PowerManagementOutput,
}

impl RobotStatus {
    pub const LEN: usize = 13;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            robot_id: r.u8(),
            robot_level: r.u8(),
            current_hp: r.u16(),
            maximum_hp: r.u16(),
            shooter_barrel_cooling_value: r.u16(),
            shooter_barrel_heat_limit: r.u16(),
            chassis_power_limit: r.u16(),
            power_output: PowerManagementOutput::from(r.u8()),
        }
    }

    /// 机器人 ID 大于 100 为蓝方
    pub fn is_blue(&self) -> bool {
        self.robot_id > 100
    }
}

/// 实时功率热量数据 (0x0202)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerHeatData {
    /// 底盘电压（mV）
    pub chassis_voltage: u16,
    /// 底盘电流（mA）
    pub chassis_current: u16,
    /// 底盘功率（W）
    pub chassis_power: f32,
    /// 缓冲能量（J）
    pub buffer_energy: u16,
    pub shooter_17mm_1_barrel_heat: u16,
    pub shooter_17mm_2_barrel_heat: u16,
    pub shooter_42mm_barrel_heat: u16,
}

impl PowerHeatData {
    pub const LEN: usize = 16;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            chassis_voltage: r.u16(),
            chassis_current: r.u16(),
            chassis_power: r.f32(),
            buffer_energy: r.u16(),
            shooter_17mm_1_barrel_heat: r.u16(),
            shooter_17mm_2_barrel_heat: r.u16(),
            shooter_42mm_barrel_heat: r.u16(),
        }
    }
}

/// 机器人位置 (0x0203)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RobotPos {
    pub x: f32,
    pub y: f32,
    /// 测速模块朝向（度，正北为 0）
    pub angle: f32,
}

impl RobotPos {
    pub const LEN: usize = 12;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            x: r.f32(),
            y: r.f32(),
            angle: r.f32(),
        }
    }
}

/// 机器人增益 (0x0204)
///
/// V1.6.4 为 6 字节；V1.7.0 追加 1 字节剩余能量。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buff {
    pub recovery_buff: u8,
    pub cooling_buff: u8,
    pub defence_buff: u8,
    pub vulnerability_buff: u8,
    pub attack_buff: u16,
    pub remaining_energy: Option<u8>,
}

impl Buff {
    pub const LEN_V164: usize = 6;
    pub const LEN_V170: usize = 7;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        let mut buff = Self {
            recovery_buff: r.u8(),
            cooling_buff: r.u8(),
            defence_buff: r.u8(),
            vulnerability_buff: r.u8(),
            attack_buff: r.u16(),
            remaining_energy: None,
        };
        if r.remaining() >= 1 {
            buff.remaining_energy = Some(r.u8());
        }
        buff
    }
}

/// 空中支援时间 (0x0205)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AirSupportData {
    pub airforce_status: u8,
    pub time_remain: u8,
}

impl AirSupportData {
    pub const LEN: usize = 2;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            airforce_status: r.u8(),
            time_remain: r.u8(),
        }
    }
}

/// 伤害状态 (0x0206)：低 4 位装甲 ID，高 4 位扣血原因
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq)]
pub struct HurtData {
    pub armor_id: u4,
    pub hp_deduction_reason: u4,
}

impl HurtData {
    pub const LEN: usize = 1;

    pub fn parse(bytes: &[u8]) -> Self {
        Self::from(LeReader::new(bytes).u8())
    }
}

/// 实时射击信息 (0x0207)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShootData {
    pub bullet_type: u8,
    pub shooter_number: u8,
    /// 射频（Hz）
    pub launching_frequency: u8,
    /// 弹丸初速度（m/s）
    pub initial_speed: f32,
}

impl ShootData {
    pub const LEN: usize = 7;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            bullet_type: r.u8(),
            shooter_number: r.u8(),
            launching_frequency: r.u8(),
            initial_speed: r.f32(),
        }
    }
}

/// 允许发弹量 (0x0208)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectileAllowance {
    pub projectile_allowance_17mm: u16,
    pub projectile_allowance_42mm: u16,
    pub remaining_gold_coin: u16,
}

impl ProjectileAllowance {
    pub const LEN: usize = 6;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            projectile_allowance_17mm: r.u16(),
            projectile_allowance_42mm: r.u16(),
            remaining_gold_coin: r.u16(),
        }
    }
}

/// RFID 状态 (0x0209)，位域原样保留
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RfidStatus {
    pub rfid_status: u32,
}

impl RfidStatus {
    pub const LEN: usize = 4;

    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            rfid_status: LeReader::new(bytes).u32(),
        }
    }

    /// 第 `bit` 个增益点是否被检测到
    pub fn detected(&self, bit: u32) -> bool {
        bit < 32 && self.rfid_status & (1 << bit) != 0
    }
}

/// 飞镖选手端指令 (0x020A)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DartClientCmd {
    pub dart_launch_opening_status: u8,
    pub target_change_time: u16,
    pub latest_launch_cmd_time: u16,
}

impl DartClientCmd {
    pub const LEN: usize = 6;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        let dart_launch_opening_status = r.u8();
        let _reserved = r.u8();
        Self {
            dart_launch_opening_status,
            target_change_time: r.u16(),
            latest_launch_cmd_time: r.u16(),
        }
    }
}

/// 平面坐标（m）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

/// 己方地面机器人位置 (0x020B)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundRobotPosition {
    pub hero: Point2,
    pub engineer: Point2,
    pub infantry_3: Point2,
    pub infantry_4: Point2,
    pub infantry_5: Point2,
}

impl GroundRobotPosition {
    pub const LEN: usize = 40;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        let mut point = || Point2 {
            x: r.f32(),
            y: r.f32(),
        };
        Self {
            hero: point(),
            engineer: point(),
            infantry_3: point(),
            infantry_4: point(),
            infantry_5: point(),
        }
    }
}

/// 雷达标记进度 (0x020C)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadarMarkData {
    pub mark_hero_progress: u8,
    pub mark_engineer_progress: u8,
    pub mark_standard_3_progress: u8,
    pub mark_standard_4_progress: u8,
    pub mark_standard_5_progress: u8,
    pub mark_sentry_progress: u8,
}

impl RadarMarkData {
    pub const LEN: usize = 6;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            mark_hero_progress: r.u8(),
            mark_engineer_progress: r.u8(),
            mark_standard_3_progress: r.u8(),
            mark_standard_4_progress: r.u8(),
            mark_standard_5_progress: r.u8(),
            mark_sentry_progress: r.u8(),
        }
    }
}

/// 哨兵自主决策信息 (0x020D)
///
/// V1.6.4 为 4 字节；V1.7.0 追加 2 字节 `sentry_info_2`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentryInfo {
    pub sentry_info: u32,
    pub sentry_info_2: Option<u16>,
}

impl SentryInfo {
    pub const LEN_V164: usize = 4;
    pub const LEN_V170: usize = 6;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        let sentry_info = r.u32();
        let sentry_info_2 = (r.remaining() >= 2).then(|| r.u16());
        Self {
            sentry_info,
            sentry_info_2,
        }
    }
}

/// 雷达自主决策信息 (0x020E)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadarInfo {
    pub radar_info: u8,
}

impl RadarInfo {
    pub const LEN: usize = 1;

    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            radar_info: LeReader::new(bytes).u8(),
        }
    }
}

// ============================================================================
// 选手端交互 (0x0303 ~ 0x0304)
// ============================================================================

/// 选手端小地图交互 (0x0303)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MapCommand {
    pub target_position_x: f32,
    pub target_position_y: f32,
    pub cmd_keyboard: u8,
    pub target_robot_id: u8,
    pub cmd_source: u16,
}

impl MapCommand {
    pub const LEN: usize = 15;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            target_position_x: r.f32(),
            target_position_y: r.f32(),
            cmd_keyboard: r.u8(),
            target_robot_id: r.u8(),
            cmd_source: r.u16(),
        }
    }
}

/// 图传链路键鼠遥控 (0x0304)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteControl {
    pub mouse_x: i16,
    pub mouse_y: i16,
    pub mouse_z: i16,
    pub left_button_down: i8,
    pub right_button_down: i8,
    pub keyboard_value: u16,
}

impl RemoteControl {
    pub const LEN: usize = 12;

    pub fn parse(bytes: &[u8]) -> Self {
        let mut r = LeReader::new(bytes);
        Self {
            mouse_x: r.i16(),
            mouse_y: r.i16(),
            mouse_z: r.i16(),
            left_button_down: r.i8(),
            right_button_down: r.i8(),
            keyboard_value: r.u16(),
        }
    }

    /// 键盘按键是否按下（bit 0 = W, 1 = S, 2 = A, 3 = D, 4 = Shift, 5 = Ctrl, 6 = Q, 7 = E, ...）
    pub fn key_down(&self, bit: u16) -> bool {
        bit < 16 && self.keyboard_value & (1 << bit) != 0
    }
}
