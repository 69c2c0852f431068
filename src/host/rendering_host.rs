//! ### English
//! Rendering host: owns the context, the refresh clock and the engine handle, and drives the
//! `Idle -> Running -> Idle` lifecycle.
//!
//! Ordering guarantees:
//! - `start` finishes creating the engine handle before the clock can fire.
//! - Every tick runs `make_current -> advance -> flush` under the context lock, so advances are
//!   strictly serialized and never race a resize or teardown.
//! - `stop` blocks until the in-flight tick (if any) has completed.
//! - Teardown destroys the engine handle only after the clock has stopped.
//!
//! ### 中文
//! 渲染宿主：持有上下文、刷新时钟与引擎句柄，并驱动 `Idle -> Running -> Idle` 生命周期。
//!
//! 顺序保证：
//! - `start` 在时钟能够触发之前完成引擎句柄的创建。
//! - 每个 tick 都在上下文锁内执行 `make_current -> advance -> flush`，因此 advance 严格串行，
//!   且不会与 resize 或销毁发生竞争。
//! - `stop` 会阻塞直到正在执行的 tick（如有）完成。
//! - 销毁时只会在时钟停止之后才销毁引擎句柄。

use std::sync::Arc;
use std::time::Instant;

use dpi::LogicalSize;
use tracing::{debug, info, warn};

use super::config::{HostConfig, TimingConfig, TimingMode};
use super::context::{ContextGuard, RenderContext};
use super::error::HostError;
use super::platform::{Platform, SurfaceHandle};
use super::refresh::{DisplayBinding, FrameTick, RefreshClock, VsyncPulse};
use super::sim::{Engine, EngineHandle};
use super::surface::{FormatDescriptor, GraphicsSurfaceConfig};

/// ### English
/// Elapsed-time accumulator handed to the engine on every tick.
///
/// ### 中文
/// 每次 tick 传给引擎的累计时间。
struct FrameTimer {
    mode: TimingMode,
    quantum_ms: f64,
    elapsed_ms: f64,
    last_tick: Option<Instant>,
}

impl FrameTimer {
    fn new(config: &TimingConfig) -> Self {
        Self {
            mode: config.mode,
            quantum_ms: config.frame_quantum_ms,
            elapsed_ms: 0.0,
            last_tick: None,
        }
    }

    fn reset(&mut self) {
        self.elapsed_ms = 0.0;
        self.last_tick = None;
    }

    /// ### English
    /// Advances the accumulator for a tick observed at `at` and returns the new value.
    ///
    /// #### Parameters
    /// - `at`: Timestamp of the tick being handled.
    ///
    /// ### 中文
    /// 为在 `at` 时刻观察到的 tick 推进累计值，并返回新值。
    ///
    /// #### 参数
    /// - `at`：当前处理的 tick 的时间戳。
    fn step(&mut self, at: Instant) -> f64 {
        let delta = match (self.mode, self.last_tick) {
            (TimingMode::Measured, Some(previous)) => {
                at.saturating_duration_since(previous).as_secs_f64() * 1000.0
            }
            _ => self.quantum_ms,
        };
        self.last_tick = Some(at);
        self.elapsed_ms += delta;
        self.elapsed_ms
    }
}

/// ### English
/// Everything guarded by the context lock besides the native context itself.
///
/// ### 中文
/// 除原生上下文本身之外，由上下文锁保护的全部状态。
pub struct FrameState<E: Engine> {
    engine: Option<EngineHandle<E>>,
    timer: FrameTimer,
    frames: u64,
}

impl<E: Engine> FrameState<E> {
    fn new(timing: &TimingConfig) -> Self {
        Self {
            engine: None,
            timer: FrameTimer::new(timing),
            frames: 0,
        }
    }
}

type HostContext<P, E> = RenderContext<P, FrameState<E>>;

/// ### English
/// Display-synchronized rendering host.
///
/// ### 中文
/// 与显示器同步的渲染宿主。
pub struct RenderingHost<P: Platform, E: Engine> {
    context: Arc<HostContext<P, E>>,
    clock: RefreshClock,
    engine: Arc<E>,
    surface: SurfaceHandle,
    size: Option<LogicalSize<f64>>,
    running: bool,
}

impl<P: Platform, E: Engine> RenderingHost<P, E> {
    /// ### English
    /// Negotiates the pixel format, creates the context and binds the refresh clock.
    ///
    /// No engine handle exists until `start`. Any failure returns an error with nothing left
    /// allocated; the embedder should then leave the surface blank.
    ///
    /// #### Parameters
    /// - `platform`: Native graphics platform.
    /// - `engine`: External engine the host drives.
    /// - `surface`: View the context presents into (bound lazily on first start).
    /// - `config`: Host configuration.
    ///
    /// ### 中文
    /// 协商像素格式、创建上下文并绑定刷新时钟。
    ///
    /// 在 `start` 之前不存在引擎句柄。任何失败都会返回错误且不残留资源；此时宿主应让 surface 保持空白。
    ///
    /// #### 参数
    /// - `platform`：原生图形平台。
    /// - `engine`：宿主驱动的外部引擎。
    /// - `surface`：上下文呈现的目标 view（首次 start 时惰性绑定）。
    /// - `config`：宿主配置。
    pub fn new(
        platform: P,
        engine: E,
        surface: SurfaceHandle,
        config: &HostConfig,
    ) -> Result<Self, HostError> {
        config.validate()?;

        let format = GraphicsSurfaceConfig::from(&config.surface).negotiate(&platform)?;
        let context = Arc::new(RenderContext::create(
            platform,
            format,
            FrameState::new(&config.timing),
        )?);

        let mut clock = RefreshClock::bind(&context, &config.clock);
        let frame_context = context.clone();
        clock.set_callback(move |tick| render_frame(&frame_context, tick))?;

        info!(
            display_id = clock.display().display_id,
            refresh_hz = clock.display().refresh_hz,
            "rendering host created"
        );
        Ok(Self {
            context,
            clock,
            engine: Arc::new(engine),
            surface,
            size: None,
            running: false,
        })
    }

    /// ### English
    /// `Idle -> Running`: creates an engine handle sized to `size`, resets the accumulator and
    /// starts the clock. No-op when already running.
    ///
    /// On failure the host stays idle with no clock running and no handle alive, so the caller
    /// may retry with a corrected size.
    ///
    /// #### Parameters
    /// - `size`: Logical size of the surface; both dimensions must be finite and positive.
    ///
    /// ### 中文
    /// `Idle -> Running`：按 `size` 创建引擎句柄、重置累计时间并启动时钟。已在运行时为 no-op。
    ///
    /// 失败时宿主保持 Idle，不会有运行中的时钟或存活的句柄，调用方可以用修正后的尺寸重试。
    ///
    /// #### 参数
    /// - `size`：surface 的逻辑尺寸；两个维度都必须为有限正数。
    pub fn start(&mut self, size: LogicalSize<f64>) -> Result<(), HostError> {
        if self.running {
            debug!("start ignored: already running");
            return Ok(());
        }
        let engine_size = engine_size(size)?;

        {
            let mut frame = self.context.lock();
            frame.attach(self.surface);
            frame.make_current()?;
            // A handle left over from a previous run is replaced, keeping create/destroy paired.
            drop(frame.engine.take());
            frame.engine = Some(EngineHandle::create(&self.engine, engine_size)?);
            frame.timer.reset();
            frame.frames = 0;
        }

        if let Err(err) = self.clock.start() {
            let mut frame = self.context.lock();
            release_engine(&mut frame);
            return Err(err);
        }

        self.size = Some(size);
        self.running = true;
        info!(width = size.width, height = size.height, "animation started");
        Ok(())
    }

    /// ### English
    /// `Running -> Idle`: stops the clock, blocking until any in-flight tick completes.
    /// Safe to call when idle.
    ///
    /// ### 中文
    /// `Running -> Idle`：停止时钟，并阻塞直到正在执行的 tick 完成。Idle 状态下调用也是安全的。
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.clock.stop();
        self.running = false;
        info!(frames = self.frame_count(), "animation stopped");
    }

    /// ### English
    /// Rebuilds the engine handle at `size` under the context lock.
    ///
    /// The old handle is destroyed before the new one is created, and the next tick only ever
    /// sees the new handle. If creation fails the slot stays empty (ticks keep presenting) and
    /// the error is returned; a later `resize` or `start` recovers. With no live handle this
    /// only records the size.
    ///
    /// #### Parameters
    /// - `size`: New logical size of the surface.
    ///
    /// ### 中文
    /// 在上下文锁内按 `size` 重建引擎句柄。
    ///
    /// 旧句柄先于新句柄创建被销毁，下一次 tick 只会看到新句柄。若创建失败，槽位保持为空（tick 仍会
    /// 呈现）并返回错误；之后的 `resize` 或 `start` 可恢复。若没有存活句柄，则只记录尺寸。
    ///
    /// #### 参数
    /// - `size`：surface 的新逻辑尺寸。
    pub fn resize(&mut self, size: LogicalSize<f64>) -> Result<(), HostError> {
        let engine_size = engine_size(size)?;
        self.size = Some(size);

        let mut frame = self.context.lock();
        if frame.engine.is_none() && !self.running {
            return Ok(());
        }
        if frame
            .engine
            .as_ref()
            .is_some_and(|handle| handle.size() == engine_size)
        {
            return Ok(());
        }

        frame.make_current()?;
        drop(frame.engine.take());
        match EngineHandle::create(&self.engine, engine_size) {
            Ok(handle) => {
                frame.engine = Some(handle);
                debug!(width = size.width, height = size.height, "engine handle resized");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "engine handle could not be recreated after resize");
                Err(err)
            }
        }
    }

    /// ### English
    /// Points the context at `surface`. Rebinds immediately if a surface is already bound and
    /// differs by identity; otherwise binding happens on the next start.
    ///
    /// #### Parameters
    /// - `surface`: Embedder surface the context should draw into.
    ///
    /// ### 中文
    /// 将上下文指向 `surface`。若已有绑定且标识不同则立即重新绑定；否则在下一次 start 时绑定。
    ///
    /// #### 参数
    /// - `surface`：上下文应绘制到的宿主 surface。
    pub fn attach(&mut self, surface: SurfaceHandle) {
        self.surface = surface;
        let mut frame = self.context.lock();
        if frame.bound_surface().is_some() {
            frame.attach(surface);
        }
    }

    /// ### English
    /// Stops the clock, then destroys the engine handle. Idempotent; also run on drop.
    ///
    /// ### 中文
    /// 先停止时钟，再销毁引擎句柄。幂等；drop 时也会执行。
    pub fn shutdown(&mut self) {
        self.stop();
        self.clock.stop();
        let mut frame = self.context.lock();
        release_engine(&mut frame);
    }

    /// ### English
    /// Whether the host is in the `Running` state.
    ///
    /// ### 中文
    /// 宿主是否处于 `Running` 状态。
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// ### English
    /// Current accumulator value in milliseconds.
    ///
    /// ### 中文
    /// 当前累计时间（毫秒）。
    pub fn elapsed_ms(&self) -> f64 {
        self.context.lock().timer.elapsed_ms
    }

    /// ### English
    /// Ticks handled since the last start.
    ///
    /// ### 中文
    /// 自最近一次 start 以来处理的 tick 数。
    pub fn frame_count(&self) -> u64 {
        self.context.lock().frames
    }

    /// ### English
    /// Whether an engine handle is currently alive.
    ///
    /// ### 中文
    /// 当前是否存在存活的引擎句柄。
    pub fn has_engine_handle(&self) -> bool {
        self.context.lock().engine.is_some()
    }

    /// ### English
    /// Last size passed to `start` or `resize`, if any.
    ///
    /// ### 中文
    /// 最近一次传给 `start` 或 `resize` 的尺寸（若有）。
    pub fn size(&self) -> Option<LogicalSize<f64>> {
        self.size
    }

    /// Surface the next bind will target.
    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    /// ### English
    /// Pixel format negotiated at construction.
    ///
    /// ### 中文
    /// 构造时协商得到的像素格式。
    pub fn format(&self) -> &FormatDescriptor {
        self.context.format().descriptor()
    }

    /// ### English
    /// Display the clock is bound to, with its normalized refresh rate.
    ///
    /// ### 中文
    /// 时钟绑定的显示器及其规范化后的刷新率。
    pub fn display(&self) -> DisplayBinding {
        self.clock.display()
    }

    /// Platform backend owning the native context.
    pub fn platform(&self) -> &P {
        self.context.platform()
    }

    /// ### English
    /// Embedder-side vsync sender when the clock source is `embedder`.
    ///
    /// ### 中文
    /// 时钟来源为 `embedder` 时，宿主侧的 vsync 发送端。
    pub fn vsync_pulse(&self) -> Option<VsyncPulse> {
        self.clock.vsync_pulse()
    }
}

impl<P: Platform, E: Engine> Drop for RenderingHost<P, E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// ### English
/// Per-refresh work, run on the clock thread.
///
/// #### Parameters
/// - `context`: Shared context and frame state.
/// - `tick`: The refresh being handled.
///
/// ### 中文
/// 每次刷新执行的工作，运行在时钟线程上。
///
/// #### 参数
/// - `context`：共享的上下文与帧状态。
/// - `tick`：当前处理的刷新。
fn render_frame<P: Platform, E: Engine>(context: &HostContext<P, E>, tick: FrameTick) {
    let mut frame = context.lock();
    let elapsed_ms = frame.timer.step(tick.timestamp);
    frame.frames += 1;

    if let Err(err) = frame.make_current() {
        warn!(%err, sequence = tick.sequence, "skipping frame");
        return;
    }
    if let Some(handle) = frame.engine.as_mut() {
        handle.advance(elapsed_ms as f32);
    }
    if let Err(err) = frame.flush() {
        warn!(%err, sequence = tick.sequence, "present failed");
    }
}

/// ### English
/// Destroys the engine handle with the context current. Caller holds the context lock.
///
/// ### 中文
/// 在上下文为 current 的情况下销毁引擎句柄。调用方需持有上下文锁。
fn release_engine<P: Platform, E: Engine>(frame: &mut ContextGuard<'_, P, FrameState<E>>) {
    let Some(handle) = frame.engine.take() else {
        return;
    };
    if let Err(err) = frame.make_current() {
        warn!(%err, "destroying engine handle without a current context");
    }
    drop(handle);
}

/// Narrows a logical size for the engine ABI, rejecting sizes it cannot represent.
fn engine_size(size: LogicalSize<f64>) -> Result<LogicalSize<f32>, HostError> {
    let valid = |v: f64| v.is_finite() && v > 0.0 && v <= f32::MAX as f64;
    if !valid(size.width) || !valid(size.height) {
        return Err(HostError::InvalidSize {
            width: size.width,
            height: size.height,
        });
    }
    Ok(LogicalSize::new(size.width as f32, size.height as f32))
}
