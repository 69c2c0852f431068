//! ### English
//! Process-wide `tracing` subscriber setup.
//!
//! ### 中文
//! 进程级 `tracing` subscriber 初始化。

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// ### English
/// Filter used when `RUST_LOG` is unset or unparsable.
///
/// ### 中文
/// 未设置 `RUST_LOG` 或无法解析时使用的过滤规则。
pub const DEFAULT_FILTER: &str = "refresh_host=info";

/// ### English
/// Builds the fmt subscriber used by `init`, without installing it.
///
/// Thread names are included so clock-thread lines stand out from the foreground thread.
///
/// #### Parameters
/// - `filter`: Directive filter applied to every event.
///
/// ### 中文
/// 构建 `init` 使用的 fmt subscriber，但不安装。
///
/// 日志会包含线程名，以区分时钟线程与前台线程。
///
/// #### 参数
/// - `filter`：应用于所有事件的过滤规则。
pub fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .finish()
}

/// ### English
/// Installs the global subscriber filtered by `RUST_LOG` (default `refresh_host=info`).
///
/// Returns `false` if a global subscriber was already installed (by this call or the embedder).
///
/// ### 中文
/// 安装按 `RUST_LOG` 过滤的全局 subscriber（默认 `refresh_host=info`）。
///
/// 若全局 subscriber 已被安装（本函数或宿主），返回 `false`。
pub fn init() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing::subscriber::set_global_default(subscriber(filter)).is_ok()
}
