//! ### English
//! Error types for the rendering host.
//!
//! ### 中文
//! 渲染宿主的错误类型。

use thiserror::Error;

/// ### English
/// Errors raised while constructing or driving a `RenderingHost`.
///
/// Format/context errors are fatal at construction; size/engine errors are fatal only to the
/// `start`/`resize` call that raised them.
///
/// ### 中文
/// 构造或驱动 `RenderingHost` 时产生的错误。
///
/// 像素格式/上下文错误在构造阶段是致命的；尺寸/引擎错误只影响触发它的 `start`/`resize` 调用。
#[derive(Error, Debug)]
pub enum HostError {
    /// ### English
    /// The platform cannot satisfy the exact pixel-format attribute list.
    ///
    /// ### 中文
    /// 平台无法满足请求的像素格式属性列表。
    #[error("no compatible pixel format for attributes {attributes:?}")]
    NoCompatibleFormat {
        /// Encoded attribute words, zero terminator included.
        attributes: Vec<u32>,
    },

    /// ### English
    /// The platform refused to create a graphics context for the negotiated format.
    ///
    /// ### 中文
    /// 平台无法为协商得到的格式创建图形上下文。
    #[error("cannot create graphics context")]
    NoContext,

    /// ### English
    /// `make_current` was requested before any surface was attached.
    ///
    /// ### 中文
    /// 在绑定任何 surface 之前请求了 `make_current`。
    #[error("no surface attached to the graphics context")]
    NoSurface,

    /// ### English
    /// The created context reports a GL version below the requested profile.
    ///
    /// ### 中文
    /// 创建出的上下文报告的 GL 版本低于请求的 profile。
    #[error("context version {actual:?} is below required {required:?}")]
    UnsupportedContextVersion {
        /// Minimum (major, minor) implied by the profile.
        required: (u32, u32),
        /// Version reported by the context.
        actual: (u32, u32),
    },

    /// ### English
    /// The refresh clock callback cannot be replaced while the clock is running.
    ///
    /// ### 中文
    /// 刷新时钟运行期间不能替换回调。
    #[error("refresh clock is running")]
    ClockRunning,

    /// ### English
    /// The refresh clock was started without a callback.
    ///
    /// ### 中文
    /// 刷新时钟在未设置回调的情况下被启动。
    #[error("refresh clock has no callback")]
    MissingCallback,

    #[error("failed to spawn refresh clock thread: {0}")]
    ClockSpawn(#[source] std::io::Error),

    /// ### English
    /// The requested logical size is not finite and positive.
    ///
    /// ### 中文
    /// 请求的逻辑尺寸不是有限正数。
    #[error("invalid surface size {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// ### English
    /// The external engine failed to create a handle for the requested size.
    ///
    /// ### 中文
    /// 外部引擎无法为请求的尺寸创建句柄。
    #[error("engine failed to create a handle sized {width}x{height}")]
    EngineCreate {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },

    #[error("embedder platform API is not installed; call refresh_host_install_platform_api first")]
    PlatformNotInstalled,

    #[error("invalid embedder platform API: {0}")]
    PlatformApi(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// ### English
/// Errors raised while loading a `HostConfig`.
///
/// ### 中文
/// 加载 `HostConfig` 时产生的错误。
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
