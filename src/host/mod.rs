/// ### English
/// Rendering host core (surface negotiation, context, refresh clock, engine seam, lifecycle).
///
/// ### 中文
/// 渲染宿主核心（surface 协商、上下文、刷新时钟、引擎接缝、生命周期）。
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod platform;
pub mod refresh;
pub mod rendering_host;
pub mod sim;
pub mod surface;

pub use config::{ClockConfig, ClockSource, HostConfig, SurfaceConfig, TimingConfig, TimingMode};
pub use context::{ContextGuard, RenderContext, SWAP_INTERVAL};
pub use error::{ConfigError, HostError};
pub use platform::{Platform, SurfaceHandle};
pub use refresh::{DisplayBinding, FrameTick, RefreshClock, VsyncPulse};
pub use rendering_host::RenderingHost;
pub use sim::{Engine, EngineHandle, ForeignEngine, ForeignEngineApi};
pub use surface::{FormatDescriptor, GraphicsSurfaceConfig, ProfileVersion, SurfaceFormat};
