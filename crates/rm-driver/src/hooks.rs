//! 钩子系统
//!
//! 裁判系统链路每处理完一帧（写入或丢弃）都会触发已注册的回调。
//! 回调在解码线程中同步执行，必须足够快，耗时操作应转交给其他线程。
//!
//! ```rust
//! use rm_driver::hooks::{FrameHook, HookManager};
//! use rm_protocol::FrameInfo;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct CountHook(AtomicU64);
//!
//! impl FrameHook for CountHook {
//!     fn on_frame_applied(&self, _info: &FrameInfo) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let hook = Arc::new(CountHook(AtomicU64::new(0)));
//! let mut hooks = HookManager::new();
//! hooks.add_callback(hook.clone());
//! hooks.trigger_applied(&FrameInfo { seq: 0, cmd_id: 0x0001, len: 11 });
//! assert_eq!(hook.0.load(Ordering::Relaxed), 1);
//! ```

use rm_protocol::{FrameError, FrameInfo};
use std::sync::Arc;

/// 帧回调
pub trait FrameHook: Send + Sync {
    /// 一帧通过校验并写入状态
    fn on_frame_applied(&self, info: &FrameInfo);

    /// 一帧被丢弃
    fn on_frame_rejected(&self, error: &FrameError) {
        let _ = error;
    }
}

/// 回调管理器
#[derive(Default)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn FrameHook>>,
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager").field("callbacks", &self.callbacks.len()).finish()
    }
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn FrameHook>) {
        self.callbacks.push(callback);
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn trigger_applied(&self, info: &FrameInfo) {
        for callback in &self.callbacks {
            callback.on_frame_applied(info);
        }
    }

    pub fn trigger_rejected(&self, error: &FrameError) {
        for callback in &self.callbacks {
            callback.on_frame_rejected(error);
        }
    }
}
