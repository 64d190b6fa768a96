//! 校验算法
//!
//! - `crc8`：裁判系统帧头校验，反射多项式 0x31（表驱动，初值 0xFF）
//! - `crc16`：裁判系统整帧校验，反射多项式 0x1021（表驱动，初值 0xFFFF）
//! - `crc32_words`：宇树电机串口帧校验，多项式 0x04C11DB7，按 32 位小端字逐位计算
//!
//! 查找表在编译期生成。

/// 裁判系统 CRC8 初值
pub const CRC8_INIT: u8 = 0xFF;

/// 裁判系统 CRC16 初值
pub const CRC16_INIT: u16 = 0xFFFF;

const CRC32_POLY: u32 = 0x04C1_1DB7;

const CRC8_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0x8C } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

const CRC16_TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0x8408 } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// 计算 CRC8（从 `init` 开始累加）
pub fn crc8(data: &[u8], init: u8) -> u8 {
    data.iter()
        .fold(init, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}

/// 计算 CRC16（从 `init` 开始累加）
pub fn crc16(data: &[u8], init: u16) -> u16 {
    data.iter().fold(init, |crc, &byte| {
        (crc >> 8) ^ CRC16_TABLE[((crc ^ byte as u16) & 0xFF) as usize]
    })
}

/// 宇树电机按字 CRC32
///
/// 每 4 字节按小端组成一个 32 位字，高位先入。`data` 末尾不足 4 字节的部分不参与计算，
/// 因此调用方应传入字对齐的前缀。
pub fn crc32_words(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for chunk in data.chunks_exact(4) {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        for bit in (0..32).rev() {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ CRC32_POLY
            } else {
                crc << 1
            };
            if word & (1 << bit) != 0 {
                crc ^= CRC32_POLY;
            }
        }
    }
    crc
}
