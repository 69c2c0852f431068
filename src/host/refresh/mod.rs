//! ### English
//! Display-synchronized refresh clock.
//!
//! Supports display-paced ticks on a dedicated thread and embedder-forwarded vsync pulses.
//!
//! ### 中文
//! 与显示器同步的刷新时钟。
//!
//! 支持在独立线程上按显示器节奏 tick，以及由宿主转发的 vsync 脉冲。
mod clock;
mod source;

use std::time::{Duration, Instant};

pub use clock::RefreshClock;
pub use source::VsyncPulse;

use crate::host::config::{DEFAULT_REFRESH_HZ, MAX_REFRESH_HZ, MIN_REFRESH_HZ};

/// ### English
/// Whether `hz` is a refresh rate the clock can pace itself by.
///
/// #### Parameters
/// - `hz`: Candidate rate in Hz.
///
/// ### 中文
/// `hz` 是否为时钟可用于定速的刷新率。
///
/// #### 参数
/// - `hz`：候选刷新率（Hz）。
pub fn is_plausible_refresh_hz(hz: f64) -> bool {
    (MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&hz)
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// ### English
/// Physical display a clock is synchronized against.
///
/// ### 中文
/// 时钟所同步的物理显示器。
pub struct DisplayBinding {
    pub display_id: u32,
    /// ### English
    /// Nominal refresh rate in Hz; anything outside `MIN_REFRESH_HZ..=MAX_REFRESH_HZ` (NaN
    /// included) means unknown.
    ///
    /// ### 中文
    /// 标称刷新率（Hz）；超出 `MIN_REFRESH_HZ..=MAX_REFRESH_HZ` 的值（包括 NaN）表示未知。
    pub refresh_hz: f64,
}

impl DisplayBinding {
    /// ### English
    /// Replaces an unknown refresh rate with `fallback_hz`, or with `DEFAULT_REFRESH_HZ` when
    /// the fallback is implausible too.
    ///
    /// #### Parameters
    /// - `fallback_hz`: Rate to assume when the platform reported none.
    ///
    /// ### 中文
    /// 用 `fallback_hz` 替换未知的刷新率；若 fallback 也不合理，则使用 `DEFAULT_REFRESH_HZ`。
    ///
    /// #### 参数
    /// - `fallback_hz`：平台未报告刷新率时假定的刷新率。
    pub fn normalized(self, fallback_hz: f64) -> Self {
        if is_plausible_refresh_hz(self.refresh_hz) {
            return self;
        }
        let refresh_hz = if is_plausible_refresh_hz(fallback_hz) {
            fallback_hz
        } else {
            DEFAULT_REFRESH_HZ
        };
        Self { refresh_hz, ..self }
    }

    /// ### English
    /// Duration of one vertical refresh. An implausible rate is paced at `DEFAULT_REFRESH_HZ`,
    /// so the result always fits a `Duration` and is never zero.
    ///
    /// ### 中文
    /// 一次垂直刷新的时长。不合理的刷新率按 `DEFAULT_REFRESH_HZ` 计时，因此结果总能放入
    /// `Duration` 且不为零。
    pub fn frame_period(&self) -> Duration {
        let hz = if is_plausible_refresh_hz(self.refresh_hz) {
            self.refresh_hz
        } else {
            DEFAULT_REFRESH_HZ
        };
        Duration::from_secs_f64(1.0 / hz)
    }
}

#[derive(Debug, Clone, Copy)]
/// ### English
/// One refresh signal delivered to the clock callback.
///
/// ### 中文
/// 传递给时钟回调的一次刷新信号。
pub struct FrameTick {
    /// ### English
    /// 1-based tick count since the clock was last started.
    ///
    /// ### 中文
    /// 自时钟最近一次启动以来的 tick 计数（从 1 开始）。
    pub sequence: u64,
    pub timestamp: Instant,
    pub display: DisplayBinding,
}
