//! ### English
//! C ABI bindings for the host lifecycle (create/start/stop/resize/attach/pulse/destroy).
//!
//! ### 中文
//! 宿主生命周期相关的 C ABI 绑定（create/start/stop/resize/attach/pulse/destroy）。

use std::ffi::{c_char, c_void};

use dpi::LogicalSize;
use tracing::error;

use super::RefreshHost;
use crate::host::platform::EmbedderPlatform;
use crate::host::{
    ForeignEngine, ForeignEngineApi, HostConfig, HostError, RenderingHost, SurfaceHandle,
    VsyncPulse,
};

/// ### English
/// Builds the host; every failure is reported as an `Err` and logged by the caller.
///
/// ### 中文
/// 构建宿主；所有失败都以 `Err` 返回，由调用方记录日志。
unsafe fn create_host(
    surface: *mut c_void,
    engine_api: *const ForeignEngineApi,
    config_toml: *const c_char,
) -> Result<RefreshHost, HostError> {
    let config = match unsafe { super::cstr_to_str(config_toml) } {
        Some(source) => HostConfig::from_toml_str(source)?,
        None => HostConfig::default(),
    };
    let engine = unsafe { ForeignEngine::from_api(*engine_api) }?;
    let platform = EmbedderPlatform::load()?;
    let host = RenderingHost::new(platform, engine, SurfaceHandle::from_ptr(surface), &config)?;
    let pulse = host.vsync_pulse();
    Ok(RefreshHost { host, pulse })
}

#[unsafe(no_mangle)]
/// ### English
/// Creates a rendering host presenting into the native view `surface`.
///
/// `engine_api` points to the engine's function table (copied; need not outlive the call).
/// `config_toml` is an optional NUL-terminated TOML document; NULL or an empty string means
/// defaults.
///
/// Returns NULL on any failure (no platform API installed, invalid config, no compatible pixel
/// format, context creation failure). The embedder should then leave the view blank.
///
/// #### Parameters
/// - `surface`: Native view pointer; must not be NULL.
/// - `engine_api`: Engine function table; must not be NULL.
/// - `config_toml`: Optional TOML config, may be NULL.
///
/// ### 中文
/// 创建一个呈现到原生 view `surface` 的渲染宿主。
///
/// `engine_api` 指向引擎的函数表（会被复制，无需在调用后继续存活）。
/// `config_toml` 为可选的 NUL 结尾 TOML 文档；传入 NULL 或空字符串表示使用默认配置。
///
/// 任何失败（未安装平台函数表、配置非法、无兼容像素格式、上下文创建失败）都返回 NULL；
/// 此时宿主应让 view 保持空白。
///
/// #### 参数
/// - `surface`：原生 view 指针，不可为 NULL。
/// - `engine_api`：引擎函数表，不可为 NULL。
/// - `config_toml`：可选的 TOML 配置，可为 NULL。
pub unsafe extern "C" fn refresh_host_create(
    surface: *mut c_void,
    engine_api: *const ForeignEngineApi,
    config_toml: *const c_char,
) -> *mut RefreshHost {
    if surface.is_null() || engine_api.is_null() {
        return std::ptr::null_mut();
    }

    match unsafe { create_host(surface, engine_api, config_toml) } {
        Ok(host) => Box::into_raw(Box::new(host)),
        Err(err) => {
            error!(%err, "failed to create rendering host");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Starts animating at the given logical size. No-op (returns `true`) when already running.
///
/// Returns `false` if the engine handle cannot be created; the host stays idle and the call may
/// be retried with another size.
///
/// #### Parameters
/// - `host`: Host from `refresh_host_create`; NULL returns `false`.
/// - `width`: Logical width of the view.
/// - `height`: Logical height of the view.
///
/// ### 中文
/// 以给定逻辑尺寸开始动画。已在运行时为 no-op（返回 `true`）。
///
/// 引擎句柄无法创建时返回 `false`；宿主保持 Idle，可用其他尺寸重试。
///
/// #### 参数
/// - `host`：由 `refresh_host_create` 返回的宿主；NULL 时返回 `false`。
/// - `width`：view 的逻辑宽度。
/// - `height`：view 的逻辑高度。
pub unsafe extern "C" fn refresh_host_start(host: *mut RefreshHost, width: f64, height: f64) -> bool {
    if host.is_null() {
        return false;
    }

    match unsafe { (*host).host.start(LogicalSize::new(width, height)) } {
        Ok(()) => true,
        Err(err) => {
            error!(%err, "failed to start rendering host");
            false
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Stops animating. Blocks until any in-flight frame completes; safe when not running.
///
/// ### 中文
/// 停止动画。阻塞直到正在执行的帧完成；未运行时调用也是安全的。
pub unsafe extern "C" fn refresh_host_stop(host: *mut RefreshHost) {
    if host.is_null() {
        return;
    }

    unsafe { (*host).host.stop() };
}

#[unsafe(no_mangle)]
/// ### English
/// Rebuilds the engine handle at the new logical size.
///
/// Returns `false` if the new handle cannot be created; frames keep presenting without
/// advancing until a later resize or start succeeds.
///
/// #### Parameters
/// - `host`: Host from `refresh_host_create`; NULL returns `false`.
/// - `width`: New logical width.
/// - `height`: New logical height.
///
/// ### 中文
/// 按新的逻辑尺寸重建引擎句柄。
///
/// 新句柄无法创建时返回 `false`；在之后的 resize 或 start 成功之前，帧只呈现不推进。
///
/// #### 参数
/// - `host`：由 `refresh_host_create` 返回的宿主；NULL 时返回 `false`。
/// - `width`：新的逻辑宽度。
/// - `height`：新的逻辑高度。
pub unsafe extern "C" fn refresh_host_resize(
    host: *mut RefreshHost,
    width: f64,
    height: f64,
) -> bool {
    if host.is_null() {
        return false;
    }

    unsafe { (*host).host.resize(LogicalSize::new(width, height)) }.is_ok()
}

#[unsafe(no_mangle)]
/// ### English
/// Points the host at another native view (e.g. after the window moved to another screen).
///
/// #### Parameters
/// - `host`: Host from `refresh_host_create`.
/// - `surface`: New native view; NULL is ignored.
///
/// ### 中文
/// 将宿主指向另一个原生 view（例如窗口移动到另一块屏幕之后）。
///
/// #### 参数
/// - `host`：由 `refresh_host_create` 返回的宿主。
/// - `surface`：新的原生 view；NULL 会被忽略。
pub unsafe extern "C" fn refresh_host_attach(host: *mut RefreshHost, surface: *mut c_void) {
    if host.is_null() || surface.is_null() {
        return;
    }

    unsafe { (*host).host.attach(SurfaceHandle::from_ptr(surface)) };
}

#[unsafe(no_mangle)]
/// ### English
/// Forwards one hardware vsync signal (only meaningful with `clock.source = "embedder"`).
///
/// Safe to call from the display-link thread. Returns `false` if the pulse coalesced with a
/// pending one or the clock is display driven.
///
/// ### 中文
/// 转发一次硬件 vsync 信号（仅在 `clock.source = "embedder"` 时有意义）。
///
/// 可在 display-link 线程上调用。若脉冲与待处理脉冲合并，或时钟由显示器驱动，返回 `false`。
pub unsafe extern "C" fn refresh_host_pulse(host: *const RefreshHost) -> bool {
    if host.is_null() {
        return false;
    }

    // Only the `pulse` field is borrowed; foreground calls borrow `host` alone.
    let pulse = unsafe { (*host).pulse.as_ref() };
    pulse.is_some_and(VsyncPulse::pulse)
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a host created by `refresh_host_create`.
///
/// Stops the refresh clock first, then destroys the engine handle and the context. Safe whether
/// or not the host was ever started.
///
/// ### 中文
/// 销毁由 `refresh_host_create` 创建的宿主。
///
/// 先停止刷新时钟，再销毁引擎句柄与上下文。无论宿主是否启动过都可以安全调用。
pub unsafe extern "C" fn refresh_host_destroy(host: *mut RefreshHost) {
    if host.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(host));
    }
}
