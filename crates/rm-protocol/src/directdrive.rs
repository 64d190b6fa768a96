//! 本末（DirectDrive）电机 CAN 协议
//!
//! - 驱动指令：8 字节帧携带 4 台电机的 16 位有符号控制量（大端），
//!   `0x32` 对应 1~4 号，`0x33` 对应 5~8 号；第 n 号电机占 `(n - 1) * 2` 起的两个字节
//! - 反馈：CAN ID = 反馈类别基址 + 电机 ID，基址 0x50 ~ 0xB0，
//!   默认只解析 0x50 类（转速 / 电流 / 编码器 / 母线电压）
//! - 控制量按模式限幅后乘以整数比例尺量化，超限饱和而非报错

use crate::{BusFrame, ProtocolError, bytes_to_i16_be, bytes_to_u16_be, i16_to_bytes_be};
use num_enum::{IntoPrimitive, TryFromPrimitive};

// ============================================================================
// CAN ID 常量
// ============================================================================

/// 1~4 号电机驱动指令
pub const ID_DRIVE_1234: u32 = 0x32;

/// 5~8 号电机驱动指令
pub const ID_DRIVE_5678: u32 = 0x33;

/// 使能/失能指令（每台电机 1 字节）
pub const ID_MODE_CONTROL: u32 = 0x105;

/// 工作模式设置指令（每台电机 1 字节）
pub const ID_SET_MODE: u32 = 0x106;

/// 软件复位指令
pub const ID_SOFTWARE_RESET: u32 = 0x107;

/// 使能字节
pub const ENABLE: u8 = 0x02;

/// 失能字节
pub const DISABLE: u8 = 0x01;

/// 单条总线最多挂载的电机数
pub const MAX_MOTORS_PER_BUS: u8 = 8;

/// 一帧驱动指令携带的电机数
pub const MOTORS_PER_FRAME: u8 = 4;

// ============================================================================
// 反馈类别
// ============================================================================

/// 反馈帧类别（按 CAN ID 基址区分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum FeedbackCategory {
    /// 转速、电流、编码器、母线电压
    Primary = 0x50,
    Category60 = 0x60,
    Category70 = 0x70,
    Category80 = 0x80,
    Category90 = 0x90,
    CategoryA0 = 0xA0,
    CategoryB0 = 0xB0,
}

impl FeedbackCategory {
    /// 根据 CAN ID 和电机 ID 判断反馈类别，不属于该电机时返回 `None`
    pub fn classify(can_id: u32, motor_id: u8) -> Option<Self> {
        let base = can_id.checked_sub(motor_id as u32)?;
        Self::try_from(base).ok()
    }
}

// ============================================================================
// 控制模式与量化
// ============================================================================

/// 电机工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum Mode {
    /// 开环电压（V）
    VoltageOpenLoop = 0x00,
    /// 电流环（A）
    Current = 0x01,
    /// 速度环（rpm）
    Speed = 0x02,
    /// 位置环
    Position = 0x03,
}

/// 单个模式的限幅与比例尺
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeLimit {
    /// 物理量绝对值上限
    pub limit: f32,
    /// 物理量 → 整数的比例尺
    pub scale: f32,
}

impl ModeLimit {
    pub const fn new(limit: f32, scale: f32) -> Self {
        Self { limit, scale }
    }

    /// 限幅并量化；NaN 量化为 0
    pub fn quantize(&self, value: f32) -> i16 {
        let clamped = value.clamp(-self.limit, self.limit);
        (clamped * self.scale) as i16
    }

    pub fn dequantize(&self, raw: i16) -> f32 {
        raw as f32 / self.scale
    }
}

/// 各模式的量化表
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizationTable {
    pub voltage_open_loop: ModeLimit,
    pub current: ModeLimit,
    pub speed: ModeLimit,
    pub position: ModeLimit,
}

impl QuantizationTable {
    /// 出厂量化表
    pub const DEFAULT: Self = Self {
        voltage_open_loop: ModeLimit::new(24.0, 100.0),
        current: ModeLimit::new(75.0, 100.0),
        speed: ModeLimit::new(160.0, 10.0),
        position: ModeLimit::new(50.0, 100.0),
    };

    pub fn get(&self, mode: Mode) -> ModeLimit {
        match mode {
            Mode::VoltageOpenLoop => self.voltage_open_loop,
            Mode::Current => self.current,
            Mode::Speed => self.speed,
            Mode::Position => self.position,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut ModeLimit {
        match mode {
            Mode::VoltageOpenLoop => &mut self.voltage_open_loop,
            Mode::Current => &mut self.current,
            Mode::Speed => &mut self.speed,
            Mode::Position => &mut self.position,
        }
    }

    pub fn quantize(&self, mode: Mode, value: f32) -> i16 {
        self.get(mode).quantize(value)
    }

    pub fn dequantize(&self, mode: Mode, raw: i16) -> f32 {
        self.get(mode).dequantize(raw)
    }
}

impl Default for QuantizationTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// 指令帧
// ============================================================================

/// 驱动指令帧的半区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxHalf {
    /// 1~4 号电机（`0x32`）
    Low,
    /// 5~8 号电机（`0x33`）
    High,
}

impl TxHalf {
    /// 电机序号所在半区
    pub fn of(ordinal: u8) -> Self {
        if ordinal <= MOTORS_PER_FRAME {
            TxHalf::Low
        } else {
            TxHalf::High
        }
    }

    pub fn can_id(&self) -> u32 {
        match self {
            TxHalf::Low => ID_DRIVE_1234,
            TxHalf::High => ID_DRIVE_5678,
        }
    }

    /// 半区在 16 字节暂存区中的起始偏移
    pub fn offset(&self) -> usize {
        match self {
            TxHalf::Low => 0,
            TxHalf::High => 8,
        }
    }
}

/// 校验电机序号（1~8）
pub fn check_ordinal(ordinal: u8) -> Result<u8, ProtocolError> {
    if (1..=MAX_MOTORS_PER_BUS).contains(&ordinal) {
        Ok(ordinal)
    } else {
        Err(ProtocolError::InvalidValue {
            field: "motor_id".to_string(),
            value: ordinal,
        })
    }
}

/// 电机控制量在 16 字节暂存区中的偏移
pub fn command_offset(ordinal: u8) -> usize {
    (ordinal as usize - 1) * 2
}

/// 控制量编码为大端 2 字节
pub fn encode_command(raw: i16) -> [u8; 2] {
    i16_to_bytes_be(raw)
}

/// 构建驱动指令帧
pub fn drive_frame(half: TxHalf, data: &[u8; 8]) -> BusFrame {
    BusFrame::new_standard(half.can_id() as u16, data)
}

/// 构建使能/失能帧，`data[n - 1]` 为第 n 号电机的 [`ENABLE`] / [`DISABLE`]
pub fn mode_control_frame(data: &[u8; 8]) -> BusFrame {
    BusFrame::new_standard(ID_MODE_CONTROL as u16, data)
}

/// 构建工作模式设置帧，`data[n - 1]` 为第 n 号电机的模式码
pub fn set_mode_frame(data: &[u8; 8]) -> BusFrame {
    BusFrame::new_standard(ID_SET_MODE as u16, data)
}

/// 构建软件复位帧（总线上所有电机）
pub fn software_reset_frame() -> BusFrame {
    BusFrame::new_standard(ID_SOFTWARE_RESET as u16, &[0x01, 0, 0, 0, 0, 0, 0, 0])
}

// ============================================================================
// 反馈帧
// ============================================================================

/// 主反馈 (0x50 + ID)
///
/// - Byte 0-1: 转速，单位 0.1rpm
/// - Byte 2-3: q 轴电流，单位 0.01A
/// - Byte 4-5: 编码器原始值
/// - Byte 6-7: 母线电压，单位 0.1V
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectDriveFeedback {
    pub rpm: f32,
    pub iq: f32,
    pub encoder: u16,
    pub bus_voltage: f32,
}

impl DirectDriveFeedback {
    /// 解析第 `motor_id` 号电机的主反馈帧
    pub fn parse(frame: &BusFrame, motor_id: u8) -> Result<Self, ProtocolError> {
        if FeedbackCategory::classify(frame.id, motor_id) != Some(FeedbackCategory::Primary) {
            return Err(ProtocolError::InvalidCanId { id: frame.id });
        }
        if frame.len < 8 {
            return Err(ProtocolError::InvalidLength {
                expected: 8,
                actual: frame.len as usize,
            });
        }

        let d = &frame.data;
        Ok(Self {
            rpm: bytes_to_i16_be([d[0], d[1]]) as f32 / 10.0,
            iq: bytes_to_i16_be([d[2], d[3]]) as f32 / 100.0,
            encoder: bytes_to_u16_be([d[4], d[5]]),
            bus_voltage: bytes_to_u16_be([d[6], d[7]]) as f32 / 10.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quantization_table() {
        let table = QuantizationTable::default();
        assert_eq!(table.get(Mode::VoltageOpenLoop), ModeLimit::new(24.0, 100.0));
        assert_eq!(table.get(Mode::Current), ModeLimit::new(75.0, 100.0));
        assert_eq!(table.get(Mode::Speed), ModeLimit::new(160.0, 10.0));
        assert_eq!(table.get(Mode::Position), ModeLimit::new(50.0, 100.0));
    }

    #[test]
    fn test_quantize_in_range() {
        let table = QuantizationTable::default();
        assert_eq!(table.quantize(Mode::Current, 1.5), 150);
        assert_eq!(table.quantize(Mode::Speed, -42.0), -420);
        assert_eq!(table.quantize(Mode::Position, 0.0), 0);
    }

    #[test]
    fn test_quantize_saturates() {
        let table = QuantizationTable::default();
        assert_eq!(table.quantize(Mode::VoltageOpenLoop, 100.0), 2400);
        assert_eq!(table.quantize(Mode::VoltageOpenLoop, -100.0), -2400);
        assert_eq!(table.quantize(Mode::Current, 75.01), 7500);
        assert_eq!(table.quantize(Mode::Speed, f32::INFINITY), 1600);
        assert_eq!(table.quantize(Mode::Position, f32::NEG_INFINITY), -5000);
    }

    #[test]
    fn test_quantize_nan_is_zero() {
        assert_eq!(QuantizationTable::default().quantize(Mode::Current, f32::NAN), 0);
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(u8::from(Mode::VoltageOpenLoop), 0x00);
        assert_eq!(u8::from(Mode::Position), 0x03);
        assert_eq!(Mode::try_from(0x02).unwrap(), Mode::Speed);
        assert!(Mode::try_from(0x04).is_err());
    }

    #[test]
    fn test_tx_half_and_offsets() {
        assert_eq!(TxHalf::of(1), TxHalf::Low);
        assert_eq!(TxHalf::of(4), TxHalf::Low);
        assert_eq!(TxHalf::of(5), TxHalf::High);
        assert_eq!(TxHalf::of(8), TxHalf::High);
        assert_eq!(command_offset(1), 0);
        assert_eq!(command_offset(3), 4);
        assert_eq!(command_offset(8), 14);
        assert_eq!(TxHalf::High.can_id(), 0x33);
    }

    #[test]
    fn test_check_ordinal() {
        assert!(check_ordinal(0).is_err());
        assert_eq!(check_ordinal(1), Ok(1));
        assert_eq!(check_ordinal(8), Ok(8));
        assert!(check_ordinal(9).is_err());
    }

    #[test]
    fn test_encode_command_big_endian() {
        assert_eq!(encode_command(7500), [0x1D, 0x4C]);
        assert_eq!(encode_command(-1), [0xFF, 0xFF]);
    }

    #[test]
    fn test_classify_feedback_categories() {
        assert_eq!(FeedbackCategory::classify(0x53, 3), Some(FeedbackCategory::Primary));
        assert_eq!(FeedbackCategory::classify(0xB3, 3), Some(FeedbackCategory::CategoryB0));
        assert_eq!(FeedbackCategory::classify(0x54, 3), None);
        assert_eq!(FeedbackCategory::classify(0x01, 3), None);
        assert_eq!(FeedbackCategory::classify(0x32, 2), None);
    }

    #[test]
    fn test_parse_primary_feedback() {
        let frame = BusFrame::new_standard(
            0x52,
            &[0xFF, 0x38, 0x01, 0xF4, 0x7F, 0xFF, 0x00, 0xF0],
        );
        let feedback = DirectDriveFeedback::parse(&frame, 2).unwrap();
        assert_eq!(feedback.rpm, -20.0);
        assert_eq!(feedback.iq, 5.0);
        assert_eq!(feedback.encoder, 0x7FFF);
        assert_eq!(feedback.bus_voltage, 24.0);
    }

    #[test]
    fn test_parse_rejects_other_motor() {
        let frame = BusFrame::new_standard(0x52, &[0; 8]);
        assert_eq!(
            DirectDriveFeedback::parse(&frame, 1),
            Err(ProtocolError::InvalidCanId { id: 0x52 })
        );
    }

    #[test]
    fn test_parse_rejects_short_frame() {
        let frame = BusFrame::new_standard(0x51, &[0; 6]);
        assert_eq!(
            DirectDriveFeedback::parse(&frame, 1),
            Err(ProtocolError::InvalidLength {
                expected: 8,
                actual: 6
            })
        );
    }

    #[test]
    fn test_command_frames() {
        let reset = software_reset_frame();
        assert_eq!(reset.id, ID_SOFTWARE_RESET);
        assert_eq!(reset.data[0], 0x01);

        let frame = drive_frame(TxHalf::Low, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(frame.id, ID_DRIVE_1234);
        assert_eq!(frame.len, 8);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_mode_serde_names() {
        assert_eq!(serde_json::to_string(&Mode::VoltageOpenLoop).unwrap(), "\"voltage_open_loop\"");
        let mode: Mode = serde_json::from_str("\"speed\"").unwrap();
        assert_eq!(mode, Mode::Speed);
    }
}
