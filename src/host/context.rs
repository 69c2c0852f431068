//! ### English
//! Graphics context wrapper with scoped locking.
//!
//! The refresh callback runs on the clock thread while the foreground thread may resize or tear
//! down the surface, so every touch of the native context goes through `RenderContext::lock`.
//! The lock also guards a caller-provided scene value `S`, which lets the host keep its engine
//! handle under the exact same mutual exclusion as the context.
//!
//! ### 中文
//! 带作用域锁的图形上下文封装。
//!
//! 刷新回调运行在时钟线程，而前台线程可能同时调整尺寸或销毁 surface，因此所有对原生上下文的访问
//! 都必须经过 `RenderContext::lock`。该锁同时保护调用方提供的场景值 `S`，使宿主的引擎句柄与上下文
//! 处于同一个互斥之下。

use std::ops::{Deref, DerefMut};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error};

use super::error::HostError;
use super::platform::{Platform, SurfaceHandle};
use super::refresh::DisplayBinding;
use super::surface::SurfaceFormat;

/// ### English
/// Presentation waits for one refresh per buffer swap (tear-free, bounded frame rate).
///
/// ### 中文
/// 每次交换缓冲等待一次刷新（无撕裂、帧率有上限）。
pub const SWAP_INTERVAL: i32 = 1;

struct ContextState<P: Platform, S> {
    native: P::Context,
    bound_surface: Option<SurfaceHandle>,
    current_thread: Option<ThreadId>,
    scene: S,
}

/// ### English
/// Graphics context built from a negotiated `SurfaceFormat`.
///
/// ### 中文
/// 基于协商所得 `SurfaceFormat` 创建的图形上下文。
pub struct RenderContext<P: Platform, S = ()> {
    platform: P,
    format: SurfaceFormat<P>,
    state: Mutex<ContextState<P, S>>,
}

impl<P: Platform, S> RenderContext<P, S> {
    /// ### English
    /// Creates a non-shared context for `format` and fixes its swap interval to 1.
    ///
    /// Fails with `NoContext` if the platform refuses, or `UnsupportedContextVersion` if the
    /// context reports a version below the negotiated profile.
    ///
    /// #### Parameters
    /// - `platform`: Backend that owns the native context.
    /// - `format`: Negotiated pixel format.
    /// - `scene`: State guarded by the same lock as the context.
    ///
    /// ### 中文
    /// 为 `format` 创建不共享资源的上下文，并将 swap interval 固定为 1。
    ///
    /// 平台拒绝时返回 `NoContext`；上下文报告的版本低于协商 profile 时返回
    /// `UnsupportedContextVersion`。
    ///
    /// #### 参数
    /// - `platform`：持有原生上下文的后端。
    /// - `format`：协商得到的像素格式。
    /// - `scene`：与上下文由同一把锁保护的状态。
    pub fn create(platform: P, format: SurfaceFormat<P>, scene: S) -> Result<Self, HostError> {
        let Some(mut native) = platform.create_context(format.native()) else {
            error!("cannot create graphics context");
            return Err(HostError::NoContext);
        };
        platform.set_swap_interval(&mut native, SWAP_INTERVAL);

        if let Some(actual) = platform.context_version(&mut native) {
            let required = format.descriptor().profile.min_version();
            if actual < required {
                error!(?actual, ?required, "graphics context version too old");
                return Err(HostError::UnsupportedContextVersion { required, actual });
            }
        }

        debug!(descriptor = ?format.descriptor(), "graphics context created");
        Ok(Self {
            platform,
            format,
            state: Mutex::new(ContextState {
                native,
                bound_surface: None,
                current_thread: None,
                scene,
            }),
        })
    }

    /// Pixel format the context was created for.
    pub fn format(&self) -> &SurfaceFormat<P> {
        &self.format
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// ### English
    /// Display the context's output is shown on, derived from the context + format pair.
    ///
    /// ### 中文
    /// 由上下文与格式组合推导出的、显示该上下文输出的显示器。
    pub fn display(&self) -> DisplayBinding {
        let state = self.state.lock();
        self.platform.display(&state.native, self.format.native())
    }

    /// ### English
    /// Surface currently bound, or `None` before the first attach.
    ///
    /// ### 中文
    /// 当前绑定的 surface；首次 attach 之前为 `None`。
    pub fn bound_surface(&self) -> Option<SurfaceHandle> {
        self.state.lock().bound_surface
    }

    /// ### English
    /// Acquires the context lock. Released when the guard drops, on every exit path.
    ///
    /// ### 中文
    /// 获取上下文锁。guard drop 时释放（任何退出路径都会释放）。
    pub fn lock(&self) -> ContextGuard<'_, P, S> {
        ContextGuard {
            platform: &self.platform,
            state: self.state.lock(),
        }
    }
}

/// ### English
/// Scoped exclusive access to the context and its scene value.
///
/// ### 中文
/// 对上下文及其场景值的作用域独占访问。
pub struct ContextGuard<'a, P: Platform, S> {
    platform: &'a P,
    state: MutexGuard<'a, ContextState<P, S>>,
}

impl<P: Platform, S> ContextGuard<'_, P, S> {
    /// ### English
    /// Binds `surface`, only if it differs by identity from the bound one. Returns whether a
    /// rebind happened.
    ///
    /// #### Parameters
    /// - `surface`: Surface to draw into.
    ///
    /// ### 中文
    /// 绑定 `surface`；仅当其标识与已绑定的不同时才重新绑定。返回是否发生了重新绑定。
    ///
    /// #### 参数
    /// - `surface`：要绘制到的 surface。
    pub fn attach(&mut self, surface: SurfaceHandle) -> bool {
        let state = &mut *self.state;
        if state.bound_surface == Some(surface) {
            return false;
        }
        self.platform.set_surface(&mut state.native, surface);
        state.bound_surface = Some(surface);
        debug!(surface = surface.raw(), "surface attached");
        true
    }

    /// ### English
    /// Makes the context current on the calling thread. A surface must be attached first.
    ///
    /// ### 中文
    /// 使上下文在调用线程上成为 current。必须先绑定 surface。
    pub fn make_current(&mut self) -> Result<(), HostError> {
        let state = &mut *self.state;
        if state.bound_surface.is_none() {
            return Err(HostError::NoSurface);
        }
        self.platform.make_current(&mut state.native);
        state.current_thread = Some(thread::current().id());
        Ok(())
    }

    /// ### English
    /// Presents the back buffer; blocks until the swap completes.
    ///
    /// ### 中文
    /// 呈现后缓冲；阻塞直到交换完成。
    pub fn flush(&mut self) -> Result<(), HostError> {
        let state = &mut *self.state;
        if state.bound_surface.is_none() {
            return Err(HostError::NoSurface);
        }
        self.platform.flush(&mut state.native);
        Ok(())
    }

    pub fn bound_surface(&self) -> Option<SurfaceHandle> {
        self.state.bound_surface
    }

    /// ### English
    /// Thread that last made this context current.
    ///
    /// ### 中文
    /// 最近一次使该上下文成为 current 的线程。
    pub fn current_thread(&self) -> Option<ThreadId> {
        self.state.current_thread
    }
}

impl<P: Platform, S> Deref for ContextGuard<'_, P, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state.scene
    }
}

impl<P: Platform, S> DerefMut for ContextGuard<'_, P, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.state.scene
    }
}
