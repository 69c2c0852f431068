//! ### English
//! Host configuration loaded once at startup (TOML).
//!
//! Every field has a default, so an empty document yields the stock screensaver setup:
//! accelerated, double-buffered, 32-bit color, 4.1 core profile, fixed 1000/60 ms stepping,
//! paced by the display's own refresh.
//!
//! ### 中文
//! 启动时加载一次的宿主配置（TOML）。
//!
//! 所有字段都有默认值，因此空文档即得到默认屏保配置：硬件加速、双缓冲、32 位色深、4.1 core
//! profile、固定 1000/60 ms 步进、由显示器自身刷新驱动。

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::surface::ProfileVersion;

/// ### English
/// Time step added to the accumulator per refresh in fixed mode (one 60 Hz frame).
///
/// ### 中文
/// 固定模式下每次刷新累加的时间步长（一个 60 Hz 帧）。
pub const DEFAULT_FRAME_QUANTUM_MS: f64 = 1000.0 / 60.0;

/// ### English
/// Refresh rate assumed when the platform cannot report one.
///
/// ### 中文
/// 平台无法报告刷新率时假定的刷新率。
pub const DEFAULT_REFRESH_HZ: f64 = 60.0;

/// ### English
/// Lowest refresh rate accepted from a platform or from config; anything below is treated as
/// unknown.
///
/// ### 中文
/// 平台或配置可接受的最低刷新率；低于该值视为未知。
pub const MIN_REFRESH_HZ: f64 = 1.0;

/// ### English
/// Highest refresh rate accepted from a platform or from config; anything above is treated as
/// unknown.
///
/// ### 中文
/// 平台或配置可接受的最高刷新率；高于该值视为未知。
pub const MAX_REFRESH_HZ: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// ### English
/// Top-level host configuration.
///
/// ### 中文
/// 顶层宿主配置。
pub struct HostConfig {
    pub surface: SurfaceConfig,
    pub timing: TimingConfig,
    pub clock: ClockConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// ### English
/// Requested pixel-format attributes. Negotiation never downgrades these.
///
/// The defaults are the required format: accelerated, double-buffered, 32-bit, 4.1 core.
/// Turning `accelerated` or `double_buffer` off is an explicit downgrade by the operator (for
/// example a software renderer in CI); the host logs a warning and the flag is simply left out
/// of the attribute list.
///
/// ### 中文
/// 请求的像素格式属性。协商过程不会对其降级。
///
/// 默认值即所需格式：硬件加速、双缓冲、32 位、4.1 core。关闭 `accelerated` 或 `double_buffer`
/// 属于运维方的显式降级（例如 CI 中的软件渲染器）；宿主会记录警告，并在属性列表中省略该项。
pub struct SurfaceConfig {
    /// ### English
    /// Require a hardware-accelerated renderer. `false` is an explicit downgrade.
    ///
    /// ### 中文
    /// 要求硬件加速渲染器。`false` 属于显式降级。
    pub accelerated: bool,
    /// ### English
    /// Require a double-buffered format. `false` is an explicit downgrade (tearing possible).
    ///
    /// ### 中文
    /// 要求双缓冲格式。`false` 属于显式降级（可能出现撕裂）。
    pub double_buffer: bool,
    pub color_size: u32,
    pub profile: ProfileVersion,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            accelerated: true,
            double_buffer: true,
            color_size: 32,
            profile: ProfileVersion::Gl4_1Core,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// ### English
/// How the elapsed-time accumulator advances per refresh tick.
///
/// ### 中文
/// 每次刷新 tick 时累计时间的推进方式。
pub enum TimingMode {
    /// ### English
    /// Add `frame_quantum_ms` on every tick regardless of wall-clock jitter.
    ///
    /// ### 中文
    /// 每次 tick 固定累加 `frame_quantum_ms`，不受实际时钟抖动影响。
    #[default]
    Fixed,
    /// ### English
    /// Add the measured time since the previous tick.
    ///
    /// ### 中文
    /// 累加距上一次 tick 的实测时间。
    Measured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub mode: TimingMode,
    pub frame_quantum_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode: TimingMode::Fixed,
            frame_quantum_ms: DEFAULT_FRAME_QUANTUM_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// ### English
/// Where refresh ticks come from.
///
/// ### 中文
/// 刷新 tick 的来源。
pub enum ClockSource {
    /// ### English
    /// A dedicated timer paced at the bound display's refresh period.
    ///
    /// ### 中文
    /// 按绑定显示器刷新周期计时的专用定时器。
    #[default]
    Display,
    /// ### English
    /// The embedder forwards its own hardware vsync signal via `VsyncPulse::pulse`.
    ///
    /// ### 中文
    /// 宿主通过 `VsyncPulse::pulse` 转发自身的硬件 vsync 信号。
    Embedder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    pub source: ClockSource,
    pub fallback_refresh_hz: f64,
    pub thread_name: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            source: ClockSource::Display,
            fallback_refresh_hz: DEFAULT_REFRESH_HZ,
            thread_name: "RefreshClock".to_string(),
        }
    }
}

impl HostConfig {
    /// ### English
    /// Parses and validates a TOML document. Missing sections take their defaults.
    ///
    /// #### Parameters
    /// - `source`: TOML document text.
    ///
    /// ### 中文
    /// 解析并校验 TOML 文档。缺失的段使用默认值。
    ///
    /// #### 参数
    /// - `source`：TOML 文档文本。
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// ### English
    /// Reads, parses and validates a TOML config file.
    ///
    /// #### Parameters
    /// - `path`: Path of the config file.
    ///
    /// ### 中文
    /// 读取、解析并校验 TOML 配置文件。
    ///
    /// #### 参数
    /// - `path`：配置文件路径。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// ### English
    /// Rejects values the host cannot run with.
    ///
    /// ### 中文
    /// 拒绝宿主无法运行的取值。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let quantum = self.timing.frame_quantum_ms;
        if !quantum.is_finite() || quantum <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timing.frame_quantum_ms must be finite and positive, got {quantum}"
            )));
        }
        let hz = self.clock.fallback_refresh_hz;
        if !(MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&hz) {
            return Err(ConfigError::Invalid(format!(
                "clock.fallback_refresh_hz must be within {MIN_REFRESH_HZ}..={MAX_REFRESH_HZ} Hz, got {hz}"
            )));
        }
        if self.surface.color_size == 0 {
            return Err(ConfigError::Invalid(
                "surface.color_size must be non-zero".to_string(),
            ));
        }
        if self.clock.thread_name.is_empty() || self.clock.thread_name.contains('\0') {
            return Err(ConfigError::Invalid(
                "clock.thread_name must be non-empty and contain no NUL".to_string(),
            ));
        }
        Ok(())
    }
}
