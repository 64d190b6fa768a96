//! 裁判系统链路
//!
//! [`RefereeLink`] 包装帧解码器：串口接收线程逐字节喂入，
//! 每写入一帧就把整块状态镜像的副本通过 ArcSwap 发布出去，
//! 其他线程经 [`RefereeReader`] 无锁读取，读到的总是某一帧写入之后的完整状态。

use crate::config::RefereeRevision;
use crate::hooks::{FrameHook, HookManager};
use crate::metrics::LinkMetrics;
use arc_swap::ArcSwap;
use rm_protocol::referee::records::{Buff, GameStatus, PowerHeatData, RobotStatus};
use rm_protocol::referee::{DecoderStats, FrameDecoder, V164, V170};
use rm_protocol::{FrameInfo, Revision};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// 裁判系统链路（协议版本在编译期选择）
pub struct RefereeLink<R: Revision> {
    decoder: FrameDecoder<R>,
    published: Arc<ArcSwap<R::State>>,
    metrics: Arc<LinkMetrics>,
    hooks: HookManager,
}

impl<R: Revision> Default for RefereeLink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Revision> std::fmt::Debug for RefereeLink<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefereeLink")
            .field("revision", &R::NAME)
            .field("metrics", &self.metrics.snapshot())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<R: Revision> RefereeLink<R> {
    pub fn new() -> Self {
        info!("Referee link created (protocol {})", R::NAME);
        Self {
            decoder: FrameDecoder::new(),
            published: Arc::new(ArcSwap::from_pointee(R::State::default())),
            metrics: Arc::new(LinkMetrics::new()),
            hooks: HookManager::new(),
        }
    }

    /// 输入一个字节
    pub fn push(&mut self, byte: u8) {
        let hooks = &self.hooks;
        let mut applied = false;

        self.decoder.push_with(byte, &mut |outcome| match outcome {
            Ok(info) => {
                trace!("Referee frame 0x{:04X} applied (seq {}, {} bytes)", info.cmd_id, info.seq, info.len);
                hooks.trigger_applied(&info);
                applied = true;
            },
            Err(error) => {
                debug!("Referee frame dropped: {}", error);
                hooks.trigger_rejected(&error);
            },
        });

        self.metrics.publish(&self.decoder.stats());
        if applied {
            self.published.store(Arc::new(self.decoder.current_state().clone()));
        }
    }

    /// 输入一段字节（串口一次读到的数据）
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// 当前状态（解码线程内读取）
    pub fn state(&self) -> &R::State {
        self.decoder.current_state()
    }

    /// 最近一次发布的状态快照
    pub fn snapshot(&self) -> Arc<R::State> {
        self.published.load_full()
    }

    /// 跨线程只读句柄
    pub fn reader(&self) -> RefereeReader<R> {
        RefereeReader {
            published: Arc::clone(&self.published),
        }
    }

    pub fn metrics(&self) -> Arc<LinkMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn add_hook(&mut self, hook: Arc<dyn FrameHook>) {
        self.hooks.add_callback(hook);
    }
}

/// 裁判系统状态的只读句柄，可克隆并发送到任意线程
pub struct RefereeReader<R: Revision> {
    published: Arc<ArcSwap<R::State>>,
}

impl<R: Revision> Clone for RefereeReader<R> {
    fn clone(&self) -> Self {
        Self {
            published: Arc::clone(&self.published),
        }
    }
}

impl<R: Revision> RefereeReader<R> {
    pub fn load(&self) -> Arc<R::State> {
        self.published.load_full()
    }
}

/// 运行期选择协议版本的裁判系统链路
#[derive(Debug)]
pub enum AnyRefereeLink {
    V164(RefereeLink<V164>),
    V170(RefereeLink<V170>),
}

macro_rules! dispatch {
    ($self:ident, $link:ident => $body:expr) => {
        match $self {
            AnyRefereeLink::V164($link) => $body,
            AnyRefereeLink::V170($link) => $body,
        }
    };
}

impl AnyRefereeLink {
    pub fn new(revision: RefereeRevision) -> Self {
        match revision {
            RefereeRevision::V164 => AnyRefereeLink::V164(RefereeLink::new()),
            RefereeRevision::V170 => AnyRefereeLink::V170(RefereeLink::new()),
        }
    }

    pub fn revision(&self) -> RefereeRevision {
        match self {
            AnyRefereeLink::V164(_) => RefereeRevision::V164,
            AnyRefereeLink::V170(_) => RefereeRevision::V170,
        }
    }

    pub fn push(&mut self, byte: u8) {
        dispatch!(self, link => link.push(byte))
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        dispatch!(self, link => link.feed(bytes))
    }

    pub fn metrics(&self) -> Arc<LinkMetrics> {
        dispatch!(self, link => link.metrics())
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        dispatch!(self, link => link.decoder_stats())
    }

    pub fn add_hook(&mut self, hook: Arc<dyn FrameHook>) {
        dispatch!(self, link => link.add_hook(hook))
    }

    pub fn game_status(&self) -> GameStatus {
        dispatch!(self, link => link.state().game_status())
    }

    pub fn robot_status(&self) -> RobotStatus {
        dispatch!(self, link => link.state().robot_status())
    }

    pub fn power_heat_data(&self) -> PowerHeatData {
        dispatch!(self, link => link.state().power_heat_data())
    }

    pub fn buff(&self) -> Buff {
        dispatch!(self, link => link.state().buff())
    }

    pub fn as_v164(&self) -> Option<&RefereeLink<V164>> {
        match self {
            AnyRefereeLink::V164(link) => Some(link),
            AnyRefereeLink::V170(_) => None,
        }
    }

    pub fn as_v170(&self) -> Option<&RefereeLink<V170>> {
        match self {
            AnyRefereeLink::V170(link) => Some(link),
            AnyRefereeLink::V164(_) => None,
        }
    }
}

/// 帧结果回调的简单实现：记录最近一帧的元信息
#[derive(Debug, Default)]
pub struct LastFrame(parking_lot::Mutex<Option<FrameInfo>>);

impl LastFrame {
    pub fn get(&self) -> Option<FrameInfo> {
        *self.0.lock()
    }
}

impl FrameHook for LastFrame {
    fn on_frame_applied(&self, info: &FrameInfo) {
        *self.0.lock() = Some(*info);
    }
}
