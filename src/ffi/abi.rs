#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn refresh_host_abi_version() -> u32 {
    super::REFRESH_HOST_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Installs the crate's `tracing` subscriber (filtered by `RUST_LOG`).
///
/// Returns `false` if a subscriber was already installed.
///
/// ### 中文
/// 安装本 crate 的 `tracing` subscriber（按 `RUST_LOG` 过滤）。
///
/// 若已安装过 subscriber，返回 `false`。
pub extern "C" fn refresh_host_init_logging() -> bool {
    crate::host::logging::init()
}
