//! ### English
//! Platform backed by an embedder-provided function table.
//!
//! The OS shell (for example a screensaver view owning an `NSOpenGLContext`/`CGL` context, or a
//! GLFW host) installs the table once per process; the host never links a windowing library.
//!
//! ### 中文
//! 由宿主提供函数表实现的平台。
//!
//! 操作系统外壳（例如持有 `NSOpenGLContext`/`CGL` 上下文的屏保 view，或 GLFW 宿主）在每个进程中
//! 安装一次函数表；本 crate 不链接任何窗口库。

use std::ffi::{CString, c_char, c_int, c_void};
use std::ptr::NonNull;
use std::sync::OnceLock;

use glow::HasContext as _;
use tracing::warn;

use super::{Platform, SurfaceHandle, parse_gl_version};
use crate::host::error::HostError;
use crate::host::refresh::DisplayBinding;

type ChoosePixelFormat = unsafe extern "C" fn(*const u32) -> *mut c_void;
type ReleasePixelFormat = unsafe extern "C" fn(*mut c_void);
type CreateContext = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
type ReleaseContext = unsafe extern "C" fn(*mut c_void);
type SetSwapInterval = unsafe extern "C" fn(*mut c_void, c_int);
type SetView = unsafe extern "C" fn(*mut c_void, *mut c_void);
type MakeCurrent = unsafe extern "C" fn(*mut c_void);
type FlushBuffer = unsafe extern "C" fn(*mut c_void);
type DisplayRefresh = unsafe extern "C" fn(*mut c_void, *mut c_void, *mut u32, *mut f64) -> bool;
type GetProcAddress = unsafe extern "C" fn(*const c_char) -> *const c_void;

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// Function pointer table provided by the embedder.
///
/// All fields are raw addresses (`usize`). Every field except `get_proc_address` must be
/// non-zero when installing.
///
/// - `choose_pixel_format(attrs: *const u32) -> pixel_format` (NULL when unsatisfiable)
/// - `release_pixel_format(pixel_format)`
/// - `create_context(pixel_format) -> context` (no share context; NULL on failure)
/// - `release_context(context)`
/// - `set_swap_interval(context, interval)`
/// - `set_view(context, view)`
/// - `make_current(context)`
/// - `flush_buffer(context)`
/// - `display_refresh(context, pixel_format, *mut display_id, *mut refresh_hz) -> bool`
/// - `get_proc_address(name) -> fn` (optional; enables the context version check)
///
/// ### 中文
/// 由宿主提供的函数指针表。
///
/// 所有字段都是原始地址（`usize`）。安装时除 `get_proc_address` 外必须全部为非 0。
/// `get_proc_address` 为可选项，提供后会启用上下文版本检查。
pub struct EmbedderPlatformApi {
    pub choose_pixel_format: usize,
    pub release_pixel_format: usize,
    pub create_context: usize,
    pub release_context: usize,
    pub set_swap_interval: usize,
    pub set_view: usize,
    pub make_current: usize,
    pub flush_buffer: usize,
    pub display_refresh: usize,
    pub get_proc_address: usize,
}

#[derive(Clone, Copy)]
struct PlatformFns {
    choose_pixel_format: ChoosePixelFormat,
    release_pixel_format: ReleasePixelFormat,
    create_context: CreateContext,
    release_context: ReleaseContext,
    set_swap_interval: SetSwapInterval,
    set_view: SetView,
    make_current: MakeCurrent,
    flush_buffer: FlushBuffer,
    display_refresh: DisplayRefresh,
    get_proc_address: Option<GetProcAddress>,
}

static EMBEDDER_PLATFORM_API: OnceLock<PlatformFns> = OnceLock::new();

fn require(address: usize, name: &str) -> Result<usize, HostError> {
    if address == 0 {
        return Err(HostError::PlatformApi(format!(
            "EmbedderPlatformApi.{name} is NULL"
        )));
    }
    Ok(address)
}

/// ### English
/// Installs the embedder function table for this process.
///
/// One-time installation backed by `OnceLock`; repeated calls return an error.
///
/// #### Parameters
/// - `api`: Function table; every entry must be non-null.
///
/// ### 中文
/// 为当前进程安装宿主函数表。
///
/// 由 `OnceLock` 保证只安装一次；重复调用返回错误。
///
/// #### 参数
/// - `api`：函数表；所有条目都必须非空。
pub fn install_embedder_platform_api(api: EmbedderPlatformApi) -> Result<(), HostError> {
    let choose_pixel_format = require(api.choose_pixel_format, "choose_pixel_format")?;
    let release_pixel_format = require(api.release_pixel_format, "release_pixel_format")?;
    let create_context = require(api.create_context, "create_context")?;
    let release_context = require(api.release_context, "release_context")?;
    let set_swap_interval = require(api.set_swap_interval, "set_swap_interval")?;
    let set_view = require(api.set_view, "set_view")?;
    let make_current = require(api.make_current, "make_current")?;
    let flush_buffer = require(api.flush_buffer, "flush_buffer")?;
    let display_refresh = require(api.display_refresh, "display_refresh")?;

    let table = unsafe {
        PlatformFns {
            choose_pixel_format: std::mem::transmute::<usize, ChoosePixelFormat>(
                choose_pixel_format,
            ),
            release_pixel_format: std::mem::transmute::<usize, ReleasePixelFormat>(
                release_pixel_format,
            ),
            create_context: std::mem::transmute::<usize, CreateContext>(create_context),
            release_context: std::mem::transmute::<usize, ReleaseContext>(release_context),
            set_swap_interval: std::mem::transmute::<usize, SetSwapInterval>(set_swap_interval),
            set_view: std::mem::transmute::<usize, SetView>(set_view),
            make_current: std::mem::transmute::<usize, MakeCurrent>(make_current),
            flush_buffer: std::mem::transmute::<usize, FlushBuffer>(flush_buffer),
            display_refresh: std::mem::transmute::<usize, DisplayRefresh>(display_refresh),
            get_proc_address: (api.get_proc_address != 0).then(|| {
                std::mem::transmute::<usize, GetProcAddress>(api.get_proc_address)
            }),
        }
    };

    EMBEDDER_PLATFORM_API
        .set(table)
        .map_err(|_| HostError::PlatformApi("embedder platform API is already installed".into()))
}

/// ### English
/// Platform that forwards every call to the installed embedder table.
///
/// ### 中文
/// 将所有调用转发给已安装宿主函数表的平台。
#[derive(Clone, Copy)]
pub struct EmbedderPlatform {
    fns: PlatformFns,
}

impl EmbedderPlatform {
    /// ### English
    /// Loads the installed table; `refresh_host_install_platform_api` must have run first.
    ///
    /// ### 中文
    /// 加载已安装的函数表；调用前必须已执行 `refresh_host_install_platform_api`。
    pub fn load() -> Result<Self, HostError> {
        EMBEDDER_PLATFORM_API
            .get()
            .copied()
            .map(|fns| Self { fns })
            .ok_or(HostError::PlatformNotInstalled)
    }
}

/// ### English
/// Native pixel-format object, released through the table on drop.
///
/// ### 中文
/// 原生像素格式对象，drop 时通过函数表释放。
pub struct EmbedderPixelFormat {
    raw: NonNull<c_void>,
    release: ReleasePixelFormat,
}

// The embedder guarantees pixel-format objects are immutable and usable from any thread.
unsafe impl Send for EmbedderPixelFormat {}
unsafe impl Sync for EmbedderPixelFormat {}

impl Drop for EmbedderPixelFormat {
    fn drop(&mut self) {
        unsafe { (self.release)(self.raw.as_ptr()) };
    }
}

/// ### English
/// Native context object, released through the table on drop.
///
/// ### 中文
/// 原生上下文对象，drop 时通过函数表释放。
pub struct EmbedderContext {
    raw: NonNull<c_void>,
    release: ReleaseContext,
}

// Only ever touched under the host's context lock.
unsafe impl Send for EmbedderContext {}

impl Drop for EmbedderContext {
    fn drop(&mut self) {
        unsafe { (self.release)(self.raw.as_ptr()) };
    }
}

impl Platform for EmbedderPlatform {
    type PixelFormat = EmbedderPixelFormat;
    type Context = EmbedderContext;

    fn choose_pixel_format(&self, attributes: &[u32]) -> Option<EmbedderPixelFormat> {
        if attributes.last() != Some(&0) {
            return None;
        }
        let raw = unsafe { (self.fns.choose_pixel_format)(attributes.as_ptr()) };
        NonNull::new(raw).map(|raw| EmbedderPixelFormat {
            raw,
            release: self.fns.release_pixel_format,
        })
    }

    fn create_context(&self, format: &EmbedderPixelFormat) -> Option<EmbedderContext> {
        let raw = unsafe { (self.fns.create_context)(format.raw.as_ptr()) };
        NonNull::new(raw).map(|raw| EmbedderContext {
            raw,
            release: self.fns.release_context,
        })
    }

    fn set_swap_interval(&self, context: &mut EmbedderContext, interval: i32) {
        unsafe { (self.fns.set_swap_interval)(context.raw.as_ptr(), interval) };
    }

    fn set_surface(&self, context: &mut EmbedderContext, surface: SurfaceHandle) {
        unsafe { (self.fns.set_view)(context.raw.as_ptr(), surface.as_ptr()) };
    }

    fn make_current(&self, context: &mut EmbedderContext) {
        unsafe { (self.fns.make_current)(context.raw.as_ptr()) };
    }

    fn flush(&self, context: &mut EmbedderContext) {
        unsafe { (self.fns.flush_buffer)(context.raw.as_ptr()) };
    }

    fn display(&self, context: &EmbedderContext, format: &EmbedderPixelFormat) -> DisplayBinding {
        let mut display_id = 0u32;
        let mut refresh_hz = 0.0f64;
        let ok = unsafe {
            (self.fns.display_refresh)(
                context.raw.as_ptr(),
                format.raw.as_ptr(),
                &mut display_id,
                &mut refresh_hz,
            )
        };
        if !ok {
            warn!("embedder could not resolve the display for the context");
            refresh_hz = 0.0;
        }
        DisplayBinding {
            display_id,
            refresh_hz,
        }
    }

    fn context_version(&self, context: &mut EmbedderContext) -> Option<(u32, u32)> {
        let get_proc_address = self.fns.get_proc_address?;
        self.make_current(context);

        let gl = unsafe {
            glow::Context::from_loader_function(|name| match CString::new(name) {
                Ok(name) => get_proc_address(name.as_ptr()),
                Err(_) => std::ptr::null(),
            })
        };
        let version = unsafe { gl.get_parameter_string(glow::VERSION) };
        parse_gl_version(&version)
    }
}
