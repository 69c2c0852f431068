//! ### English
//! Refresh clock: fires one callback per vertical refresh on a dedicated thread.
//!
//! ### 中文
//! 刷新时钟：在独立线程上每次垂直刷新触发一次回调。

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel as channel;
use tracing::{debug, info, warn};

use super::source::{TickSource, VsyncPulse};
use super::{DisplayBinding, FrameTick};
use crate::host::config::ClockConfig;
use crate::host::context::RenderContext;
use crate::host::error::HostError;
use crate::host::platform::Platform;

type FrameCallback = Arc<dyn Fn(FrameTick) + Send + Sync + 'static>;

enum ClockMsg {
    Stop,
}

/// ### English
/// A running clock thread and its control channel.
///
/// ### 中文
/// 正在运行的时钟线程及其控制通道。
struct ClockWorker {
    control: channel::Sender<ClockMsg>,
    join: thread::JoinHandle<()>,
}

/// ### English
/// Hardware-paced timer bound to the display showing the surface.
///
/// Invariants:
/// - The callback only fires between `start()` and the return of `stop()`.
/// - Invocations never overlap: a single thread runs them back to back.
/// - `stop()` returns only after any in-flight invocation has completed.
///
/// ### 中文
/// 绑定到显示该 surface 的显示器的硬件节奏定时器。
///
/// 不变量：
/// - 回调只会在 `start()` 与 `stop()` 返回之间触发。
/// - 调用永不重叠：由单个线程依次执行。
/// - `stop()` 只会在正在执行的调用完成后返回。
pub struct RefreshClock {
    display: DisplayBinding,
    source: TickSource,
    thread_name: String,
    callback: Option<FrameCallback>,
    worker: Option<ClockWorker>,
}

impl RefreshClock {
    /// ### English
    /// Binds a clock to the display derived from the context and its pixel format.
    ///
    /// #### Parameters
    /// - `context`: Context whose display the clock follows.
    /// - `config`: Tick source, fallback rate and thread name.
    ///
    /// ### 中文
    /// 将时钟绑定到由上下文及其像素格式推导出的显示器。
    ///
    /// #### 参数
    /// - `context`：时钟所跟随显示器对应的上下文。
    /// - `config`：tick 来源、回退刷新率与线程名。
    pub fn bind<P: Platform, S>(context: &RenderContext<P, S>, config: &ClockConfig) -> Self {
        let display = context.display().normalized(config.fallback_refresh_hz);
        Self::with_display(display, config)
    }

    /// ### English
    /// Creates a clock for an explicit display binding. An implausible rate is replaced by
    /// the configured fallback.
    ///
    /// #### Parameters
    /// - `display`: Display to tick for.
    /// - `config`: Tick source, fallback rate and thread name.
    ///
    /// ### 中文
    /// 为显式给定的显示器绑定创建时钟。不合理的刷新率会被替换为配置的回退值。
    ///
    /// #### 参数
    /// - `display`：要为之产生 tick 的显示器。
    /// - `config`：tick 来源、回退刷新率与线程名。
    pub fn with_display(display: DisplayBinding, config: &ClockConfig) -> Self {
        let binding = display.normalized(config.fallback_refresh_hz);
        debug!(
            display_id = binding.display_id,
            refresh_hz = binding.refresh_hz,
            source = ?config.source,
            "refresh clock bound"
        );
        Self {
            display: binding,
            source: TickSource::new(config.source, binding),
            thread_name: config.thread_name.clone(),
            callback: None,
            worker: None,
        }
    }

    /// Normalized display binding.
    pub fn display(&self) -> DisplayBinding {
        self.display
    }

    /// ### English
    /// Whether a clock thread is alive. Turns false as soon as `stop` is called, even from the
    /// clock thread itself.
    ///
    /// ### 中文
    /// 时钟线程是否存活。一旦调用 `stop`（即使在时钟线程内）即变为 false。
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// ### English
    /// Sender for embedder-forwarded vsync pulses, when the clock is embedder driven.
    ///
    /// ### 中文
    /// 时钟由宿主驱动时，返回用于转发 vsync 脉冲的发送端。
    pub fn vsync_pulse(&self) -> Option<VsyncPulse> {
        self.source.pulse()
    }

    /// ### English
    /// Registers the per-refresh callback. Refused while the clock is running.
    ///
    /// #### Parameters
    /// - `callback`: Invoked on the clock thread once per tick, never concurrently.
    ///
    /// ### 中文
    /// 注册每次刷新的回调。时钟运行期间拒绝替换。
    ///
    /// #### 参数
    /// - `callback`：每个 tick 在时钟线程上调用一次，不会并发执行。
    pub fn set_callback<F>(&mut self, callback: F) -> Result<(), HostError>
    where
        F: Fn(FrameTick) + Send + Sync + 'static,
    {
        if self.is_running() {
            return Err(HostError::ClockRunning);
        }
        self.callback = Some(Arc::new(callback));
        Ok(())
    }

    /// ### English
    /// Starts firing the callback once per refresh. No-op when already running.
    ///
    /// ### 中文
    /// 开始每次刷新触发一次回调。已在运行时为 no-op。
    pub fn start(&mut self) -> Result<(), HostError> {
        if self.is_running() {
            return Ok(());
        }
        let callback = self.callback.clone().ok_or(HostError::MissingCallback)?;
        let ticks = self.source.open();
        let (control, control_rx) = channel::bounded::<ClockMsg>(1);
        let binding = self.display;

        let join = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || run_clock(control_rx, ticks, callback, binding))
            .map_err(HostError::ClockSpawn)?;

        self.worker = Some(ClockWorker { control, join });
        info!(refresh_hz = binding.refresh_hz, "refresh clock started");
        Ok(())
    }

    /// ### English
    /// Halts future firings and blocks until any in-flight callback has completed.
    ///
    /// When called from the clock thread itself (from inside the callback) it only signals,
    /// since joining would deadlock; the thread exits once the callback returns.
    ///
    /// ### 中文
    /// 停止后续触发，并阻塞直到正在执行的回调完成。
    ///
    /// 若在时钟线程自身（回调内部）调用，则只发送停止信号（join 会死锁）；回调返回后线程退出。
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.control.send(ClockMsg::Stop);

        if thread::current().id() == worker.join.thread().id() {
            debug!("refresh clock stop requested from its own thread");
            return;
        }
        if worker.join.join().is_err() {
            warn!("refresh clock thread panicked");
        }
        info!("refresh clock stopped");
    }
}

impl Drop for RefreshClock {
    /// ### English
    /// Ensures the clock thread has exited when the clock is dropped.
    ///
    /// ### 中文
    /// 确保时钟 drop 时时钟线程已退出。
    fn drop(&mut self) {
        self.stop();
    }
}

/// ### English
/// Clock thread main loop. Control messages win over pending ticks, so no tick is started once
/// a stop has been observed.
///
/// ### 中文
/// 时钟线程主循环。控制消息优先于待处理的 tick，因此一旦收到停止信号便不会再开始新的 tick。
fn run_clock(
    control: channel::Receiver<ClockMsg>,
    ticks: channel::Receiver<Instant>,
    callback: FrameCallback,
    display: DisplayBinding,
) {
    let mut sequence = 0u64;
    loop {
        channel::select_biased! {
            recv(control) -> msg => match msg {
                Ok(ClockMsg::Stop) | Err(_) => return,
            },
            recv(ticks) -> tick => {
                let Ok(timestamp) = tick else {
                    return;
                };
                sequence += 1;
                callback(FrameTick {
                    sequence,
                    timestamp,
                    display,
                });
            }
        }
    }
}
