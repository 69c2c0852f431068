//! ### English
//! Tick sources feeding the refresh clock thread.
//!
//! ### 中文
//! 为刷新时钟线程提供 tick 的来源。

use std::time::{Duration, Instant};

use crossbeam_channel as channel;

use super::DisplayBinding;
use crate::host::config::ClockSource;

pub(super) enum TickSource {
    /// ### English
    /// Timer paced at the bound display's refresh period; a fresh timer is opened per start.
    ///
    /// ### 中文
    /// 按绑定显示器刷新周期计时；每次启动都会打开新的定时器。
    Display { period: Duration },
    /// ### English
    /// Pulses forwarded by the embedder. Capacity 1, so bursts coalesce into one pending tick.
    ///
    /// ### 中文
    /// 由宿主转发的脉冲。容量为 1，突发脉冲会合并为一个待处理 tick。
    Embedder {
        tx: channel::Sender<Instant>,
        rx: channel::Receiver<Instant>,
    },
}

impl TickSource {
    pub(super) fn new(source: ClockSource, display: DisplayBinding) -> Self {
        match source {
            ClockSource::Display => Self::Display {
                period: display.frame_period(),
            },
            ClockSource::Embedder => {
                let (tx, rx) = channel::bounded(1);
                Self::Embedder { tx, rx }
            }
        }
    }

    /// ### English
    /// Returns the receiver a newly started clock thread waits on.
    ///
    /// Pulses that arrived while the clock was stopped are discarded.
    ///
    /// ### 中文
    /// 返回新启动的时钟线程所等待的 receiver。
    ///
    /// 时钟停止期间到达的脉冲会被丢弃。
    pub(super) fn open(&self) -> channel::Receiver<Instant> {
        match self {
            Self::Display { period } => channel::tick(*period),
            Self::Embedder { rx, .. } => {
                while rx.try_recv().is_ok() {}
                rx.clone()
            }
        }
    }

    pub(super) fn pulse(&self) -> Option<VsyncPulse> {
        match self {
            Self::Display { .. } => None,
            Self::Embedder { tx, .. } => Some(VsyncPulse { tx: tx.clone() }),
        }
    }
}

#[derive(Clone)]
/// ### English
/// Embedder-side sender for hardware vsync signals (e.g. from a display-link callback).
///
/// ### 中文
/// 宿主侧的硬件 vsync 信号发送端（例如来自 display-link 回调）。
pub struct VsyncPulse {
    tx: channel::Sender<Instant>,
}

impl VsyncPulse {
    /// ### English
    /// Signals one vertical refresh. Returns `false` when it coalesced into an already
    /// pending tick.
    ///
    /// ### 中文
    /// 发出一次垂直刷新信号。若与已有的待处理 tick 合并则返回 `false`。
    pub fn pulse(&self) -> bool {
        self.tx.try_send(Instant::now()).is_ok()
    }
}
