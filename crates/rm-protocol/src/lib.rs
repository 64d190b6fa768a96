//! # RM Protocol
//!
//! 裁判系统串口协议与电机总线协议的编解码（无硬件依赖）
//!
//! ## 模块
//!
//! - `crc`: CRC8 / CRC16（裁判系统）与按字 CRC32（宇树电机）
//! - `referee`: 裁判系统帧解码状态机、协议版本字段表、帧编码
//! - `directdrive`: 本末（DirectDrive）电机 CAN 协议，量化与反馈解析
//! - `unitree`: 宇树电机串口协议，命令帧与遥测帧
//!
//! ## 字节序
//!
//! - 裁判系统与宇树电机：小端字节序
//! - 本末电机 CAN 帧：Motorola (MSB) 高位在前（大端字节序）

pub mod crc;
pub mod directdrive;
pub mod referee;
pub mod unitree;

pub use directdrive::{DirectDriveFeedback, Mode, QuantizationTable};
pub use referee::{FrameDecoder, FrameError, FrameInfo, Revision, StateImage};
pub use unitree::{ControlParam, UnitreeFeedback, UnitreeMode};

/// CAN 2.0 标准帧的统一抽象
///
/// 协议层和总线层之间的中间类型：协议层只构建/解析 `BusFrame`，
/// 不依赖任何具体的 CAN 实现。
///
/// - **Copy**：固定 8 字节，无堆分配，适合 1kHz 控制周期
/// - **仅 CAN 2.0**：本末电机协议不使用 CAN FD
///
/// ```rust
/// use rm_protocol::BusFrame;
///
/// let frame = BusFrame::new_standard(0x32, &[1, 2, 3, 4]);
/// assert_eq!(frame.id(), 0x32);
/// assert_eq!(frame.data_slice(), &[1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusFrame {
    /// CAN ID（标准帧或扩展帧）
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,

    /// 是否为扩展帧（29-bit ID）
    pub is_extended: bool,
}

impl BusFrame {
    /// 创建标准帧
    pub fn new_standard(id: u16, data: &[u8]) -> Self {
        Self::new(id as u32, data, false)
    }

    /// 创建扩展帧
    pub fn new_extended(id: u32, data: &[u8]) -> Self {
        Self::new(id, data, true)
    }

    fn new(id: u32, data: &[u8], is_extended: bool) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id,
            data: fixed_data,
            len: len as u8,
            is_extended,
        }
    }

    /// 获取数据切片（只包含有效数据）
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// 获取 CAN ID
    pub fn id(&self) -> u32 {
        self.id
    }
}

use thiserror::Error;

/// 协议编解码错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid CAN ID: 0x{id:X}")]
    InvalidCanId { id: u32 },

    #[error("Invalid frame header: {0:02X?}")]
    InvalidHeader([u8; 2]),

    #[error("Checksum mismatch: expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Motor id mismatch: expected {expected}, got {actual}")]
    MotorIdMismatch { expected: u8, actual: u8 },

    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },
}

/// 大端字节序转 i16（本末电机）
pub fn bytes_to_i16_be(bytes: [u8; 2]) -> i16 {
    i16::from_be_bytes(bytes)
}

/// 大端字节序转 u16（本末电机）
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// i16 转大端字节序
pub fn i16_to_bytes_be(value: i16) -> [u8; 2] {
    value.to_be_bytes()
}

/// 从切片的 `offset` 处读取 N 个字节
///
/// 调用方保证 `offset + N <= bytes.len()`（字段布局在编译期固定）。
#[inline]
pub(crate) fn array_at<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}
