//! 宇树（Unitree A1 系列）电机串口协议
//!
//! 点对点串口链路，电机 ID 写在帧头中。
//!
//! - 命令帧 34 字节：`FE EE | id | 保留 | 控制块 | CRC32`
//! - 遥测帧 78 字节：`FE EE | id | 保留 | 状态块 | CRC32`
//!
//! 多字节字段均为小端。CRC32 为按字校验（见 [`crate::crc::crc32_words`]），
//! 覆盖校验字之前的所有完整 32 位字。

use crate::crc::crc32_words;
use crate::{ProtocolError, array_at};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::f32::consts::TAU;

/// 帧头魔数
pub const MAGIC: [u8; 2] = [0xFE, 0xEE];

/// 命令帧长度
pub const COMMAND_LEN: usize = 34;

/// 遥测帧长度
pub const TELEMETRY_LEN: usize = 78;

/// 命令帧校验覆盖的字数
pub const COMMAND_CRC_WORDS: usize = 7;

/// 遥测帧校验覆盖的字数
pub const TELEMETRY_CRC_WORDS: usize = 18;

/// 广播 ID
pub const BROADCAST_ID: u8 = 0xBB;

/// 电机 ID 上限（含）
pub const MAX_MOTOR_ID: u8 = 14;

/// 位置：一圈对应的编码器计数
const TICKS_PER_TURN: f32 = 16384.0;

const TORQUE_SCALE: f32 = 256.0;
const VELOCITY_SCALE: f32 = 128.0;
const KP_SCALE: f32 = 2048.0;
const KD_SCALE: f32 = 1024.0;

/// 陀螺仪原始值 → rad/s
const GYRO_SCALE: f32 = 0.001_079_931_76;

/// 加速度计原始值 → m/s²
const ACCEL_SCALE: f32 = 0.002_391_113_2;

/// 电机工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum UnitreeMode {
    /// 停转
    Stop = 0,
    /// 开环
    OpenLoop = 5,
    /// FOC 闭环
    Foc = 10,
}

impl Default for UnitreeMode {
    fn default() -> Self {
        UnitreeMode::Foc
    }
}

/// 混合控制参数
///
/// 输出力矩 = tau + kp * (pos - 当前位置) + kd * (vel - 当前速度)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlParam {
    /// 前馈力矩（N·m）
    pub tau: f32,
    /// 期望速度（rad/s）
    pub vel: f32,
    /// 期望位置（rad）
    pub pos: f32,
    pub kp: f32,
    pub kd: f32,
}

impl ControlParam {
    /// 纯力矩控制
    pub fn torque(tau: f32) -> Self {
        Self {
            tau,
            ..Self::default()
        }
    }
}

/// 弧度 → 编码器计数
fn rad_to_ticks(rad: f32) -> i32 {
    (rad / TAU * TICKS_PER_TURN) as i32
}

/// 编码器计数 → 弧度
fn ticks_to_rad(ticks: i32) -> f32 {
    ticks as f32 * TAU / TICKS_PER_TURN
}

/// 校验电机 ID（0~14 或广播）
pub fn check_motor_id(id: u8) -> Result<u8, ProtocolError> {
    if id <= MAX_MOTOR_ID || id == BROADCAST_ID {
        Ok(id)
    } else {
        Err(ProtocolError::InvalidValue {
            field: "motor_id".to_string(),
            value: id,
        })
    }
}

/// 编码命令帧
///
/// 标定值按固定比例尺量化，超出 i16 / i32 范围时饱和。
///
/// | 偏移 | 长度 | 字段 |
/// |------|------|------|
/// | 0 | 2 | 魔数 FE EE |
/// | 2 | 1 | 电机 ID |
/// | 4 | 1 | 模式 |
/// | 5 | 1 | 修改位（0xFF） |
/// | 8 | 4 | 修改字 |
/// | 12 | 2 | tau × 256 |
/// | 14 | 2 | vel × 128 |
/// | 16 | 4 | pos（计数） |
/// | 20 | 2 | kp × 2048 |
/// | 22 | 2 | kd × 1024 |
/// | 24 | 2 | 低频命令索引/字节 |
/// | 26 | 4 | 保留 |
/// | 30 | 4 | CRC32 |
pub fn encode_command(motor_id: u8, mode: UnitreeMode, param: &ControlParam) -> [u8; COMMAND_LEN] {
    let mut frame = [0u8; COMMAND_LEN];
    frame[0..2].copy_from_slice(&MAGIC);
    frame[2] = motor_id;
    frame[4] = mode.into();
    frame[5] = 0xFF;

    frame[12..14].copy_from_slice(&((param.tau * TORQUE_SCALE) as i16).to_le_bytes());
    frame[14..16].copy_from_slice(&((param.vel * VELOCITY_SCALE) as i16).to_le_bytes());
    frame[16..20].copy_from_slice(&rad_to_ticks(param.pos).to_le_bytes());
    frame[20..22].copy_from_slice(&((param.kp * KP_SCALE) as i16).to_le_bytes());
    frame[22..24].copy_from_slice(&((param.kd * KD_SCALE) as i16).to_le_bytes());

    let crc = crc32_words(&frame[..COMMAND_CRC_WORDS * 4]);
    frame[30..34].copy_from_slice(&crc.to_le_bytes());
    frame
}

/// 足端传感器原始读数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FootSensor {
    pub gyro: [i16; 3],
    pub accel: [i16; 3],
    pub mag: [i16; 3],
    pub temperature: u8,
    pub force16: i16,
    pub force8: i8,
    pub error: u8,
}

/// 电机遥测
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitreeFeedback {
    pub motor_id: u8,
    /// 原始模式字节（电机可能回报未知模式）
    pub mode: u8,
    /// 温度（℃）
    pub temperature: i8,
    /// 错误码
    pub error: u8,
    /// 当前力矩（N·m）
    pub torque: f32,
    /// 当前速度（rad/s）
    pub velocity: f32,
    /// 低频速度（rad/s）
    pub velocity_lowrate: f32,
    /// 第二速度（rad/s）
    pub velocity2: f32,
    pub velocity2_lowrate: f32,
    /// 加速度原始值
    pub acceleration: i16,
    pub output_acceleration: i16,
    /// 当前位置（rad）
    pub position: f32,
    /// 第二位置（rad）
    pub position2: f32,
    /// 陀螺仪（rad/s）
    pub gyro: [f32; 3],
    /// 加速度计（m/s²）
    pub accel: [f32; 3],
    pub foot: FootSensor,
}

fn i16_at(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes(array_at(bytes, offset))
}

fn triplet_at(bytes: &[u8], offset: usize) -> [i16; 3] {
    [
        i16_at(bytes, offset),
        i16_at(bytes, offset + 2),
        i16_at(bytes, offset + 4),
    ]
}

impl UnitreeFeedback {
    /// 解析遥测帧
    ///
    /// 长度、魔数、校验和或电机 ID 任一不符即返回错误，不产出任何字段。
    pub fn decode(bytes: &[u8], expected_id: u8) -> Result<Self, ProtocolError> {
        if bytes.len() != TELEMETRY_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: TELEMETRY_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0..2] != MAGIC {
            return Err(ProtocolError::InvalidHeader([bytes[0], bytes[1]]));
        }

        let expected = crc32_words(&bytes[..TELEMETRY_CRC_WORDS * 4]);
        let actual = u32::from_le_bytes(array_at(bytes, TELEMETRY_LEN - 4));
        if expected != actual {
            return Err(ProtocolError::ChecksumMismatch { expected, actual });
        }

        if bytes[2] != expected_id {
            return Err(ProtocolError::MotorIdMismatch {
                expected: expected_id,
                actual: bytes[2],
            });
        }

        let gyro_raw = triplet_at(bytes, 38);
        let accel_raw = triplet_at(bytes, 44);

        Ok(Self {
            motor_id: bytes[2],
            mode: bytes[4],
            temperature: bytes[6] as i8,
            error: bytes[7],
            torque: i16_at(bytes, 12) as f32 / TORQUE_SCALE,
            velocity: i16_at(bytes, 14) as f32 / VELOCITY_SCALE,
            velocity_lowrate: f32::from_le_bytes(array_at(bytes, 16)),
            velocity2: i16_at(bytes, 20) as f32 / VELOCITY_SCALE,
            velocity2_lowrate: f32::from_le_bytes(array_at(bytes, 22)),
            acceleration: i16_at(bytes, 26),
            output_acceleration: i16_at(bytes, 28),
            position: ticks_to_rad(i32::from_le_bytes(array_at(bytes, 30))),
            position2: ticks_to_rad(i32::from_le_bytes(array_at(bytes, 34))),
            gyro: gyro_raw.map(|v| v as f32 * GYRO_SCALE),
            accel: accel_raw.map(|v| v as f32 * ACCEL_SCALE),
            foot: FootSensor {
                gyro: triplet_at(bytes, 50),
                accel: triplet_at(bytes, 56),
                mag: triplet_at(bytes, 62),
                temperature: bytes[68],
                force16: i16_at(bytes, 69),
                force8: bytes[71] as i8,
                error: bytes[72],
            },
        })
    }

    /// 工作模式（未知模式码返回 `None`）
    pub fn unitree_mode(&self) -> Option<UnitreeMode> {
        UnitreeMode::try_from(self.mode).ok()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构造一帧合法遥测
    pub(crate) fn telemetry_frame(id: u8, fill: impl Fn(&mut [u8; TELEMETRY_LEN])) -> [u8; TELEMETRY_LEN] {
        let mut frame = [0u8; TELEMETRY_LEN];
        frame[0..2].copy_from_slice(&MAGIC);
        frame[2] = id;
        fill(&mut frame);
        let crc = crc32_words(&frame[..TELEMETRY_CRC_WORDS * 4]);
        frame[74..78].copy_from_slice(&crc.to_le_bytes());
        frame
    }

    #[test]
    fn test_command_layout() {
        let param = ControlParam {
            tau: 1.0,
            vel: -2.0,
            pos: TAU,
            kp: 0.5,
            kd: 0.25,
        };
        let frame = encode_command(3, UnitreeMode::Foc, &param);

        assert_eq!(frame.len(), 34);
        assert_eq!(&frame[0..4], &[0xFE, 0xEE, 3, 0]);
        assert_eq!(&frame[4..8], &[10, 0xFF, 0, 0]);
        assert_eq!(&frame[8..12], &[0; 4]);
        assert_eq!(i16::from_le_bytes([frame[12], frame[13]]), 256);
        assert_eq!(i16::from_le_bytes([frame[14], frame[15]]), -256);
        assert_eq!(i32::from_le_bytes([frame[16], frame[17], frame[18], frame[19]]), 16384);
        assert_eq!(i16::from_le_bytes([frame[20], frame[21]]), 1024);
        assert_eq!(i16::from_le_bytes([frame[22], frame[23]]), 256);
        assert_eq!(&frame[24..30], &[0; 6]);

        let crc = u32::from_le_bytes([frame[30], frame[31], frame[32], frame[33]]);
        assert_eq!(crc, crc32_words(&frame[..28]));
    }

    #[test]
    fn test_torque_only_command() {
        let frame = encode_command(0, UnitreeMode::Foc, &ControlParam::torque(-0.5));
        assert_eq!(i16::from_le_bytes([frame[12], frame[13]]), -128);
        assert_eq!(&frame[14..24], &[0; 10]);
    }

    #[test]
    fn test_command_saturates() {
        let param = ControlParam {
            tau: 1.0e6,
            vel: -1.0e6,
            ..Default::default()
        };
        let frame = encode_command(1, UnitreeMode::Foc, &param);
        assert_eq!(i16::from_le_bytes([frame[12], frame[13]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([frame[14], frame[15]]), i16::MIN);
    }

    #[test]
    fn test_stop_mode_byte() {
        let frame = encode_command(1, UnitreeMode::Stop, &ControlParam::default());
        assert_eq!(frame[4], 0);
    }

    #[test]
    fn test_decode_telemetry() {
        let frame = telemetry_frame(2, |f| {
            f[4] = 10;
            f[6] = (-5i8) as u8;
            f[7] = 0x01;
            f[12..14].copy_from_slice(&512i16.to_le_bytes());
            f[14..16].copy_from_slice(&(-128i16).to_le_bytes());
            f[16..20].copy_from_slice(&1.5f32.to_le_bytes());
            f[26..28].copy_from_slice(&7i16.to_le_bytes());
            f[30..34].copy_from_slice(&(-8192i32).to_le_bytes());
            f[38..40].copy_from_slice(&1000i16.to_le_bytes());
            f[68] = 30;
            f[69..71].copy_from_slice(&(-3i16).to_le_bytes());
            f[72] = 0x04;
        });

        let feedback = UnitreeFeedback::decode(&frame, 2).unwrap();
        assert_eq!(feedback.motor_id, 2);
        assert_eq!(feedback.unitree_mode(), Some(UnitreeMode::Foc));
        assert_eq!(feedback.temperature, -5);
        assert_eq!(feedback.error, 0x01);
        assert_eq!(feedback.torque, 2.0);
        assert_eq!(feedback.velocity, -1.0);
        assert_eq!(feedback.velocity_lowrate, 1.5);
        assert_eq!(feedback.acceleration, 7);
        assert!((feedback.position + std::f32::consts::PI).abs() < 1e-6);
        assert!((feedback.gyro[0] - 1.079_931_76).abs() < 1e-5);
        assert_eq!(feedback.foot.temperature, 30);
        assert_eq!(feedback.foot.force16, -3);
        assert_eq!(feedback.foot.error, 0x04);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let frame = telemetry_frame(1, |_| {});
        assert_eq!(
            UnitreeFeedback::decode(&frame[..77], 1),
            Err(ProtocolError::InvalidLength {
                expected: 78,
                actual: 77
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut frame = telemetry_frame(1, |_| {});
        frame[1] = 0xEF;
        assert_eq!(
            UnitreeFeedback::decode(&frame, 1),
            Err(ProtocolError::InvalidHeader([0xFE, 0xEF]))
        );
    }

    #[test]
    fn test_decode_rejects_checksum_mismatch() {
        let mut frame = telemetry_frame(1, |f| f[12] = 0x10);
        frame[12] ^= 0x01;
        assert!(matches!(
            UnitreeFeedback::decode(&frame, 1),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_other_motor() {
        let frame = telemetry_frame(4, |_| {});
        assert_eq!(
            UnitreeFeedback::decode(&frame, 5),
            Err(ProtocolError::MotorIdMismatch {
                expected: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn test_check_motor_id() {
        assert_eq!(check_motor_id(0), Ok(0));
        assert_eq!(check_motor_id(14), Ok(14));
        assert_eq!(check_motor_id(BROADCAST_ID), Ok(BROADCAST_ID));
        assert!(check_motor_id(15).is_err());
    }
}
