//! 命令码 → 状态镜像偏移量的字段表
//!
//! 字段表在编译期由 [`pack`] 按声明顺序紧密排布生成，运行期只做查找。

/// 一个命令码在状态镜像中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    /// 命令码
    pub cmd_id: u16,
    /// 在状态镜像中的字节偏移
    pub offset: usize,
    /// 字段长度（该命令码 payload 的线缆长度）
    pub len: usize,
}

impl FieldSlot {
    /// 字段末尾（不含）
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// 某个协议版本的字段表
#[derive(Debug, Clone, Copy)]
pub struct FieldRegistry {
    slots: &'static [FieldSlot],
}

impl FieldRegistry {
    pub const fn new(slots: &'static [FieldSlot]) -> Self {
        Self { slots }
    }

    /// 查找命令码，未注册时返回 `None`
    pub fn lookup(&self, cmd_id: u16) -> Option<FieldSlot> {
        self.slots.iter().find(|slot| slot.cmd_id == cmd_id).copied()
    }

    /// 全部字段
    pub fn slots(&self) -> &'static [FieldSlot] {
        self.slots
    }

    /// 状态镜像所需的最小长度
    pub fn image_len(&self) -> usize {
        packed_len(self.slots)
    }
}

/// 把 (命令码, 长度) 列表按顺序紧密排布为字段表
pub const fn pack<const N: usize>(fields: [(u16, usize); N]) -> [FieldSlot; N] {
    let mut slots = [FieldSlot {
        cmd_id: 0,
        offset: 0,
        len: 0,
    }; N];
    let mut offset = 0;
    let mut i = 0;
    while i < N {
        slots[i] = FieldSlot {
            cmd_id: fields[i].0,
            offset,
            len: fields[i].1,
        };
        offset += fields[i].1;
        i += 1;
    }
    slots
}

/// 字段表覆盖的总长度
pub const fn packed_len(slots: &[FieldSlot]) -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < slots.len() {
        if slots[i].end() > len {
            len = slots[i].end();
        }
        i += 1;
    }
    len
}

/// 编译期取出命令码对应的字段；命令码不存在时编译失败
pub const fn slot_of(slots: &[FieldSlot], cmd_id: u16) -> FieldSlot {
    let mut i = 0;
    while i < slots.len() {
        if slots[i].cmd_id == cmd_id {
            return slots[i];
        }
        i += 1;
    }
    panic!("command id missing from field table");
}
