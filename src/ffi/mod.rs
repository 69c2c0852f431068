//! ### English
//! C ABI surface for `refresh_host`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Strings passed from the OS shell must be NUL-terminated UTF-8 (C string); they are validated
//! as UTF-8 and truncated at the first NUL byte.
//!
//! ### 中文
//! `refresh_host` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 操作系统外壳传入的字符串必须是以 NUL 结尾的 UTF-8（C 字符串）；Rust 会校验 UTF-8，
//! 且在遇到第一个 NUL 字节处截断。
mod abi;
mod host;
mod platform;

use std::ffi::{CStr, c_char};

use crate::host::platform::EmbedderPlatform;
use crate::host::{ForeignEngine, RenderingHost, VsyncPulse};

#[repr(C)]
/// ### English
/// Opaque host handle owning the context, the refresh clock thread and the engine handle.
///
/// ### 中文
/// 不透明宿主句柄，持有上下文、刷新时钟线程与引擎句柄。
pub struct RefreshHost {
    host: RenderingHost<EmbedderPlatform, ForeignEngine>,
    /// ### English
    /// Vsync sender cloned at creation, so the display-link thread never touches `host`.
    ///
    /// ### 中文
    /// 创建时克隆的 vsync 发送端，使 display-link 线程无需访问 `host`。
    pulse: Option<VsyncPulse>,
}

/// ### English
/// C ABI version for `refresh_host`.
///
/// ### 中文
/// `refresh_host` 的 C ABI 版本号。
const REFRESH_HOST_ABI_VERSION: u32 = 1;

/// ### English
/// Reads an optional NUL-terminated UTF-8 C string.
///
/// Returns `None` for NULL pointers, invalid UTF-8, or empty strings.
///
/// # Safety
/// `ptr` must be valid and point to a NUL-terminated string for the duration of the call.
///
/// ### 中文
/// 读取可选的 NUL 结尾 UTF-8 C 字符串。
///
/// 对 NULL 指针、UTF-8 非法或空字符串返回 `None`。
///
/// # Safety
/// `ptr` 在本次调用期间必须有效，并指向以 NUL 结尾的字符串。
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }

    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if value.is_empty() {
        return None;
    }

    Some(value)
}
