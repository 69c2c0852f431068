/// ### English
/// `refresh_host` crate root.
/// The core lives under `host`; the cdylib exposes it to an OS shell via the C ABI in `ffi`.
///
/// ### 中文
/// `refresh_host` 的 crate 根。
/// 核心实现位于 `host`；cdylib 通过 `ffi` 中的 C ABI 将其暴露给操作系统外壳。
pub mod host;
mod ffi;
