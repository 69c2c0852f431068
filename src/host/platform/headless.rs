//! ### English
//! Headless platform: performs no rendering, validates attribute lists against a configurable
//! capability set and counts every call so callers can check exactly what touched the platform.
//!
//! ### 中文
//! 无头平台：不做任何渲染，按可配置的能力集合校验属性列表，并统计每一次调用，
//! 便于调用方准确检查平台被如何使用。

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use super::{Platform, SurfaceHandle};
use crate::host::refresh::DisplayBinding;
use crate::host::surface::{ProfileVersion, attribute};

#[derive(Debug, Clone)]
/// ### English
/// What the simulated driver can provide.
///
/// ### 中文
/// 模拟驱动能够提供的能力。
pub struct HeadlessCapabilities {
    pub accelerated: bool,
    pub double_buffer: bool,
    pub max_color_size: u32,
    pub profiles: Vec<ProfileVersion>,
    /// ### English
    /// Reported refresh rate; `None` simulates a display that cannot report one.
    ///
    /// ### 中文
    /// 报告的刷新率；`None` 模拟无法报告刷新率的显示器。
    pub refresh_hz: Option<f64>,
    pub display_id: u32,
    pub context_version: Option<(u32, u32)>,
    pub fail_context: bool,
    /// ### English
    /// Time `flush` blocks for, standing in for waiting on the next refresh.
    ///
    /// ### 中文
    /// `flush` 阻塞的时长，用于模拟等待下一次刷新。
    pub present_delay: Duration,
}

impl Default for HeadlessCapabilities {
    fn default() -> Self {
        Self {
            accelerated: true,
            double_buffer: true,
            max_color_size: 32,
            profiles: vec![
                ProfileVersion::Legacy,
                ProfileVersion::Gl3_2Core,
                ProfileVersion::Gl4_1Core,
            ],
            refresh_hz: Some(60.0),
            display_id: 1,
            context_version: Some((4, 1)),
            fail_context: false,
            present_delay: Duration::ZERO,
        }
    }
}

/// ### English
/// Shared call counters for one `HeadlessPlatform`.
///
/// ### 中文
/// 单个 `HeadlessPlatform` 的共享调用计数器。
#[derive(Debug, Default)]
pub struct HeadlessStats {
    pixel_formats_chosen: AtomicUsize,
    contexts_created: AtomicUsize,
    contexts_destroyed: AtomicUsize,
    swap_interval: AtomicI32,
    surface_binds: AtomicUsize,
    make_current_calls: AtomicU64,
    flushes: AtomicU64,
    bound_surface: Mutex<Option<SurfaceHandle>>,
    current_thread: Mutex<Option<ThreadId>>,
}

impl HeadlessStats {
    pub fn pixel_formats_chosen(&self) -> usize {
        self.pixel_formats_chosen.load(Ordering::Acquire)
    }

    pub fn contexts_created(&self) -> usize {
        self.contexts_created.load(Ordering::Acquire)
    }

    pub fn contexts_destroyed(&self) -> usize {
        self.contexts_destroyed.load(Ordering::Acquire)
    }

    pub fn swap_interval(&self) -> i32 {
        self.swap_interval.load(Ordering::Acquire)
    }

    pub fn surface_binds(&self) -> usize {
        self.surface_binds.load(Ordering::Acquire)
    }

    pub fn make_current_calls(&self) -> u64 {
        self.make_current_calls.load(Ordering::Acquire)
    }

    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Acquire)
    }

    pub fn bound_surface(&self) -> Option<SurfaceHandle> {
        *self.bound_surface.lock()
    }

    /// ### English
    /// Thread that most recently made a context current.
    ///
    /// ### 中文
    /// 最近一次使上下文成为 current 的线程。
    pub fn current_thread(&self) -> Option<ThreadId> {
        *self.current_thread.lock()
    }
}

/// ### English
/// Null platform backend.
///
/// ### 中文
/// 空平台后端。
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    capabilities: HeadlessCapabilities,
    stats: Arc<HeadlessStats>,
}

impl HeadlessPlatform {
    pub fn new(capabilities: HeadlessCapabilities) -> Self {
        Self {
            capabilities,
            stats: Arc::new(HeadlessStats::default()),
        }
    }

    /// ### English
    /// Counters shared with every object this platform created.
    ///
    /// ### 中文
    /// 与该平台创建的所有对象共享的计数器。
    pub fn stats(&self) -> Arc<HeadlessStats> {
        self.stats.clone()
    }

    fn supports(&self, attributes: &[u32]) -> bool {
        let caps = &self.capabilities;
        let mut words = attributes.iter().copied();
        while let Some(word) = words.next() {
            let ok = match word {
                attribute::TERMINATOR => return true,
                attribute::ACCELERATED => caps.accelerated,
                attribute::DOUBLE_BUFFER => caps.double_buffer,
                attribute::COLOR_SIZE => words
                    .next()
                    .is_some_and(|bits| bits > 0 && bits <= caps.max_color_size),
                attribute::PROFILE => words.next().is_some_and(|value| {
                    caps.profiles
                        .iter()
                        .any(|profile| profile.attribute_value() == value)
                }),
                _ => false,
            };
            if !ok {
                return false;
            }
        }
        // Unterminated lists are malformed.
        false
    }
}

#[derive(Debug)]
pub struct HeadlessPixelFormat {
    attributes: Vec<u32>,
}

impl HeadlessPixelFormat {
    /// ### English
    /// The attribute words this format was chosen for.
    ///
    /// ### 中文
    /// 选择该格式时使用的属性字。
    pub fn attributes(&self) -> &[u32] {
        &self.attributes
    }
}

#[derive(Debug)]
pub struct HeadlessContext {
    surface: Option<SurfaceHandle>,
    stats: Arc<HeadlessStats>,
}

impl Drop for HeadlessContext {
    fn drop(&mut self) {
        self.stats.contexts_destroyed.fetch_add(1, Ordering::AcqRel);
    }
}

impl Platform for HeadlessPlatform {
    type PixelFormat = HeadlessPixelFormat;
    type Context = HeadlessContext;

    fn choose_pixel_format(&self, attributes: &[u32]) -> Option<HeadlessPixelFormat> {
        if !self.supports(attributes) {
            return None;
        }
        self.stats
            .pixel_formats_chosen
            .fetch_add(1, Ordering::AcqRel);
        Some(HeadlessPixelFormat {
            attributes: attributes.to_vec(),
        })
    }

    fn create_context(&self, _format: &HeadlessPixelFormat) -> Option<HeadlessContext> {
        if self.capabilities.fail_context {
            return None;
        }
        self.stats.contexts_created.fetch_add(1, Ordering::AcqRel);
        Some(HeadlessContext {
            surface: None,
            stats: self.stats.clone(),
        })
    }

    fn set_swap_interval(&self, _context: &mut HeadlessContext, interval: i32) {
        self.stats.swap_interval.store(interval, Ordering::Release);
    }

    fn set_surface(&self, context: &mut HeadlessContext, surface: SurfaceHandle) {
        context.surface = Some(surface);
        *self.stats.bound_surface.lock() = Some(surface);
        self.stats.surface_binds.fetch_add(1, Ordering::AcqRel);
    }

    fn make_current(&self, _context: &mut HeadlessContext) {
        *self.stats.current_thread.lock() = Some(thread::current().id());
        self.stats.make_current_calls.fetch_add(1, Ordering::AcqRel);
    }

    fn flush(&self, context: &mut HeadlessContext) {
        debug_assert!(context.surface.is_some(), "flush without a surface");
        if !self.capabilities.present_delay.is_zero() {
            thread::sleep(self.capabilities.present_delay);
        }
        self.stats.flushes.fetch_add(1, Ordering::AcqRel);
    }

    fn display(&self, _context: &HeadlessContext, _format: &HeadlessPixelFormat) -> DisplayBinding {
        DisplayBinding {
            display_id: self.capabilities.display_id,
            refresh_hz: self.capabilities.refresh_hz.unwrap_or(0.0),
        }
    }

    fn context_version(&self, _context: &mut HeadlessContext) -> Option<(u32, u32)> {
        self.capabilities.context_version
    }
}
