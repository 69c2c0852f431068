use crate::host::platform::{EmbedderPlatformApi, install_embedder_platform_api};

#[unsafe(no_mangle)]
/// ### English
/// Installs the embedder-provided native platform function table.
///
/// Must be called once, before `refresh_host_create`. All function pointers must target the
/// same windowing/GL instance that owns the views passed to `refresh_host_create` and
/// `refresh_host_attach`.
///
/// Returns `true` on success; `false` for NULL, incomplete tables, or a second install.
///
/// #### Parameters
/// - `api`: Function table, copied during the call.
///
/// ### 中文
/// 安装由宿主提供的原生平台函数表。
///
/// 必须在 `refresh_host_create` 之前调用且只调用一次。所有函数指针必须来自同一个窗口/GL 实例，
/// 即拥有传给 `refresh_host_create` 与 `refresh_host_attach` 的 view 的那个实例。
///
/// 成功返回 `true`；NULL、不完整的函数表或重复安装返回 `false`。
///
/// #### 参数
/// - `api`：函数表，调用期间被复制。
pub unsafe extern "C" fn refresh_host_install_platform_api(
    api: *const EmbedderPlatformApi,
) -> bool {
    if api.is_null() {
        return false;
    }

    let api = unsafe { *api };
    match install_embedder_platform_api(api) {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(%err, "platform API rejected");
            false
        }
    }
}
