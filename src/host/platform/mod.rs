//! ### English
//! Native graphics platform seam.
//!
//! The host never talks to a windowing/GL API directly; it goes through `Platform`. Two
//! implementations ship with the crate:
//! - `EmbedderPlatform`: a C function table installed by the OS shell (the real path).
//! - `HeadlessPlatform`: a null backend that only records what was asked of it.
//!
//! ### 中文
//! 原生图形平台接缝。
//!
//! 宿主从不直接调用窗口/GL API，而是通过 `Platform`。crate 自带两种实现：
//! - `EmbedderPlatform`：由操作系统外壳安装的 C 函数表（真实路径）。
//! - `HeadlessPlatform`：只记录调用情况的空后端。

mod embedder;
mod gl_version;
mod headless;

use std::ffi::c_void;

pub use embedder::{EmbedderPlatform, EmbedderPlatformApi, install_embedder_platform_api};
pub use gl_version::parse_gl_version;
pub use headless::{HeadlessCapabilities, HeadlessPlatform, HeadlessStats};

use super::refresh::DisplayBinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// ### English
/// Identity of the view/surface a context presents into (a raw native view pointer).
///
/// Only identity matters to the host; it never dereferences the value.
///
/// ### 中文
/// 上下文呈现目标 view/surface 的标识（原生 view 裸指针）。
///
/// 宿主只关心其标识，从不解引用。
pub struct SurfaceHandle(usize);

impl SurfaceHandle {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Wraps a native view pointer; the pointer is never dereferenced.
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr as usize)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

/// ### English
/// Graphics platform operations the host needs.
///
/// Native objects are owned by the associated types and released in their `Drop`.
/// Every context operation is invoked with the host's context lock held.
///
/// ### 中文
/// 宿主所需的图形平台操作。
///
/// 原生对象由关联类型持有，并在其 `Drop` 中释放。
/// 所有上下文操作都在持有宿主上下文锁的情况下调用。
pub trait Platform: Send + Sync + 'static {
    type PixelFormat: Send + Sync + 'static;
    type Context: Send + 'static;

    /// ### English
    /// Chooses a pixel format for a zero-terminated attribute list, or `None` if the exact
    /// combination is unavailable.
    ///
    /// ### 中文
    /// 为以 0 结尾的属性列表选择像素格式；若无法精确满足则返回 `None`。
    fn choose_pixel_format(&self, attributes: &[u32]) -> Option<Self::PixelFormat>;

    /// ### English
    /// Creates a context for `format` that shares no resources with any other context.
    ///
    /// ### 中文
    /// 为 `format` 创建一个不与任何其他上下文共享资源的上下文。
    fn create_context(&self, format: &Self::PixelFormat) -> Option<Self::Context>;

    fn set_swap_interval(&self, context: &mut Self::Context, interval: i32);

    fn set_surface(&self, context: &mut Self::Context, surface: SurfaceHandle);

    fn make_current(&self, context: &mut Self::Context);

    /// ### English
    /// Presents the back buffer. With swap interval 1 this blocks until the next refresh.
    ///
    /// ### 中文
    /// 呈现后缓冲。swap interval 为 1 时会阻塞到下一次刷新。
    fn flush(&self, context: &mut Self::Context);

    /// ### English
    /// Physical display showing a surface rendered with this context/format pair.
    ///
    /// ### 中文
    /// 显示由该上下文/格式组合渲染的 surface 的物理显示器。
    fn display(&self, context: &Self::Context, format: &Self::PixelFormat) -> DisplayBinding;

    /// ### English
    /// Version (major, minor) the context actually provides, when the platform can tell.
    ///
    /// ### 中文
    /// 上下文实际提供的版本（major, minor）；平台无法得知时返回 `None`。
    fn context_version(&self, _context: &mut Self::Context) -> Option<(u32, u32)> {
        None
    }
}
