//! ### English
//! External simulation/rendering engine seam.
//!
//! The engine is opaque: the host only creates a handle sized to the view, advances it with an
//! elapsed time in milliseconds, and destroys it. `EngineHandle` owns one created handle and
//! destroys it exactly once, on drop.
//!
//! ### 中文
//! 外部模拟/渲染引擎接缝。
//!
//! 引擎对宿主不透明：宿主只负责按 view 尺寸创建句柄、以毫秒为单位推进时间、以及销毁句柄。
//! `EngineHandle` 持有一个已创建的句柄，并在 drop 时恰好销毁一次。

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use dpi::LogicalSize;
use tracing::debug;

use super::error::HostError;

/// ### English
/// Engine interface consumed by the host.
///
/// ### 中文
/// 宿主所使用的引擎接口。
pub trait Engine: Send + Sync + 'static {
    type Handle: Send + 'static;

    /// ### English
    /// Creates one engine handle for a surface of the given logical size.
    ///
    /// #### Parameters
    /// - `width`: Logical width, finite and positive.
    /// - `height`: Logical height, finite and positive.
    ///
    /// ### 中文
    /// 为给定逻辑尺寸的 surface 创建一个引擎句柄。
    ///
    /// #### 参数
    /// - `width`：逻辑宽度，有限正数。
    /// - `height`：逻辑高度，有限正数。
    fn create(&self, width: f32, height: f32) -> Result<Self::Handle, HostError>;

    /// ### English
    /// Advances the simulation to `elapsed_ms`. Engine-side failures stay on the engine's own
    /// error channel.
    ///
    /// #### Parameters
    /// - `handle`: Handle returned by `create` and not yet destroyed.
    /// - `elapsed_ms`: Accumulated time since the last start.
    ///
    /// ### 中文
    /// 将模拟推进到 `elapsed_ms`。引擎内部的失败由引擎自身的错误通道处理。
    ///
    /// #### 参数
    /// - `handle`：由 `create` 返回且尚未销毁的句柄。
    /// - `elapsed_ms`：自最近一次 start 以来的累计时间。
    fn advance(&self, handle: &mut Self::Handle, elapsed_ms: f32);

    /// Releases `handle`. Called exactly once per created handle.
    fn destroy(&self, handle: Self::Handle);
}

/// ### English
/// Owning, move-only token for one engine handle.
///
/// ### 中文
/// 单个引擎句柄的所有权令牌（只能移动）。
pub struct EngineHandle<E: Engine> {
    engine: Arc<E>,
    raw: Option<E::Handle>,
    size: LogicalSize<f32>,
}

impl<E: Engine> EngineHandle<E> {
    /// ### English
    /// Creates an engine handle sized to `size`.
    ///
    /// #### Parameters
    /// - `engine`: Engine the handle belongs to; kept alive until the handle drops.
    /// - `size`: Logical size passed to `Engine::create`.
    ///
    /// ### 中文
    /// 创建尺寸为 `size` 的引擎句柄。
    ///
    /// #### 参数
    /// - `engine`：句柄所属的引擎；在句柄 drop 前保持存活。
    /// - `size`：传给 `Engine::create` 的逻辑尺寸。
    pub fn create(engine: &Arc<E>, size: LogicalSize<f32>) -> Result<Self, HostError> {
        let raw = engine.create(size.width, size.height)?;
        debug!(width = size.width, height = size.height, "engine handle created");
        Ok(Self {
            engine: engine.clone(),
            raw: Some(raw),
            size,
        })
    }

    /// ### English
    /// Forwards one advance to the engine.
    ///
    /// #### Parameters
    /// - `elapsed_ms`: Accumulated time since the last start.
    ///
    /// ### 中文
    /// 向引擎转发一次推进。
    ///
    /// #### 参数
    /// - `elapsed_ms`：自最近一次 start 以来的累计时间。
    pub fn advance(&mut self, elapsed_ms: f32) {
        if let Some(raw) = self.raw.as_mut() {
            self.engine.advance(raw, elapsed_ms);
        }
    }

    /// Size the handle was created at.
    pub fn size(&self) -> LogicalSize<f32> {
        self.size
    }
}

impl<E: Engine> Drop for EngineHandle<E> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.engine.destroy(raw);
            debug!(
                width = self.size.width,
                height = self.size.height,
                "engine handle destroyed"
            );
        }
    }
}

type CreateFn = unsafe extern "C" fn(f32, f32) -> *mut c_void;
type AdvanceFn = unsafe extern "C" fn(*mut c_void, f32);
type DestroyFn = unsafe extern "C" fn(*mut c_void);

#[repr(C)]
#[derive(Clone, Copy, Default)]
/// ### English
/// C ABI engine function table (raw addresses, all non-zero):
/// - `create(width, height) -> handle` (NULL on failure)
/// - `advance(handle, elapsed_ms)`
/// - `destroy(handle)`
///
/// ### 中文
/// C ABI 引擎函数表（原始地址，必须全部非 0）：
/// - `create(width, height) -> handle`（失败时返回 NULL）
/// - `advance(handle, elapsed_ms)`
/// - `destroy(handle)`
pub struct ForeignEngineApi {
    pub create: usize,
    pub advance: usize,
    pub destroy: usize,
}

/// ### English
/// Engine exported over a C ABI.
///
/// ### 中文
/// 通过 C ABI 导出的引擎。
#[derive(Clone, Copy)]
pub struct ForeignEngine {
    create: CreateFn,
    advance: AdvanceFn,
    destroy: DestroyFn,
}

impl ForeignEngine {
    /// ### English
    /// Validates and adopts a C function table.
    ///
    /// # Safety
    /// Non-zero entries must be valid function pointers with the documented signatures, and
    /// the engine must tolerate `advance`/`destroy` being called from the clock thread.
    ///
    /// ### 中文
    /// 校验并采用一张 C 函数表。
    ///
    /// # Safety
    /// 非 0 项必须是签名符合文档的有效函数指针，且引擎必须允许在时钟线程上调用
    /// `advance`/`destroy`。
    pub unsafe fn from_api(api: ForeignEngineApi) -> Result<Self, HostError> {
        if api.create == 0 || api.advance == 0 || api.destroy == 0 {
            return Err(HostError::PlatformApi(
                "ForeignEngineApi entries must be non-NULL".to_string(),
            ));
        }
        Ok(unsafe {
            Self {
                create: std::mem::transmute::<usize, CreateFn>(api.create),
                advance: std::mem::transmute::<usize, AdvanceFn>(api.advance),
                destroy: std::mem::transmute::<usize, DestroyFn>(api.destroy),
            }
        })
    }
}

/// ### English
/// Opaque engine pointer returned by `ForeignEngineApi.create`.
///
/// ### 中文
/// `ForeignEngineApi.create` 返回的不透明引擎指针。
pub struct ForeignHandle(NonNull<c_void>);

// Only ever touched under the host's context lock.
unsafe impl Send for ForeignHandle {}

impl Engine for ForeignEngine {
    type Handle = ForeignHandle;

    fn create(&self, width: f32, height: f32) -> Result<ForeignHandle, HostError> {
        let raw = unsafe { (self.create)(width, height) };
        NonNull::new(raw)
            .map(ForeignHandle)
            .ok_or(HostError::EngineCreate { width, height })
    }

    fn advance(&self, handle: &mut ForeignHandle, elapsed_ms: f32) {
        unsafe { (self.advance)(handle.0.as_ptr(), elapsed_ms) };
    }

    fn destroy(&self, handle: ForeignHandle) {
        unsafe { (self.destroy)(handle.0.as_ptr()) };
    }
}
