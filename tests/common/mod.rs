//! Shared doubles for host integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;
use parking_lot::Mutex;

use refresh_host::host::platform::{HeadlessCapabilities, HeadlessPlatform, HeadlessStats};
use refresh_host::host::{
    ClockConfig, ClockSource, HostConfig, HostError, RenderingHost, SurfaceHandle, VsyncPulse,
};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    Created { id: u64, width: f32, height: f32 },
    Advanced { id: u64, elapsed_ms: f32 },
    Destroyed { id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    pub id: u64,
    pub elapsed_ms: f32,
}

#[derive(Default)]
pub struct EngineLog {
    events: Mutex<Vec<EngineEvent>>,
    next_id: AtomicU64,
    in_advance: AtomicBool,
    overlaps: AtomicUsize,
}

impl EngineLog {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().clone()
    }

    pub fn created(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Created { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Destroyed { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn advances(&self) -> Vec<Advance> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Advanced { id, elapsed_ms } => Some(Advance { id, elapsed_ms }),
                _ => None,
            })
            .collect()
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::Acquire)
    }

    pub fn in_advance(&self) -> bool {
        self.in_advance.load(Ordering::Acquire)
    }

    /// Every created handle destroyed exactly once, and never advanced after its destroy.
    pub fn assert_lifecycle_paired(&self) {
        let events = self.events();
        for id in self.created() {
            let destroys: Vec<usize> = events
                .iter()
                .enumerate()
                .filter(|(_, event)| **event == EngineEvent::Destroyed { id })
                .map(|(index, _)| index)
                .collect();
            assert_eq!(destroys.len(), 1, "handle {id} destroyed {} times", destroys.len());

            let advanced_after_destroy = events[destroys[0]..].iter().any(
                |event| matches!(event, EngineEvent::Advanced { id: advanced, .. } if *advanced == id),
            );
            assert!(!advanced_after_destroy, "handle {id} advanced after destroy");
        }
        assert_eq!(self.destroyed().len(), self.created().len());
    }

    fn push(&self, event: EngineEvent) {
        self.events.lock().push(event);
    }
}

/// Engine double that records every call and reports advances over a channel.
pub struct RecordingEngine {
    log: Arc<EngineLog>,
    advances: channel::Sender<Advance>,
    max_width: f32,
    advance_delay: Duration,
}

pub struct EngineMonitor {
    pub log: Arc<EngineLog>,
    pub advances: channel::Receiver<Advance>,
}

impl EngineMonitor {
    pub fn next_advance(&self) -> Advance {
        self.advances
            .recv_timeout(WAIT)
            .expect("no advance within timeout")
    }

    pub fn no_advance_for(&self, window: Duration) -> bool {
        self.advances.recv_timeout(window).is_err()
    }
}

impl RecordingEngine {
    pub fn new() -> (Self, EngineMonitor) {
        let log = Arc::new(EngineLog::default());
        let (tx, rx) = channel::unbounded();
        (
            Self {
                log: log.clone(),
                advances: tx,
                max_width: f32::MAX,
                advance_delay: Duration::ZERO,
            },
            EngineMonitor { log, advances: rx },
        )
    }

    /// Creation fails for widths above `max_width`.
    pub fn with_max_width(mut self, max_width: f32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_advance_delay(mut self, delay: Duration) -> Self {
        self.advance_delay = delay;
        self
    }
}

impl refresh_host::host::Engine for RecordingEngine {
    type Handle = u64;

    fn create(&self, width: f32, height: f32) -> Result<u64, HostError> {
        if width > self.max_width {
            return Err(HostError::EngineCreate { width, height });
        }
        let id = self.log.next_id.fetch_add(1, Ordering::AcqRel) + 1;
        self.log.push(EngineEvent::Created { id, width, height });
        Ok(id)
    }

    fn advance(&self, handle: &mut u64, elapsed_ms: f32) {
        if self.log.in_advance.swap(true, Ordering::AcqRel) {
            self.log.overlaps.fetch_add(1, Ordering::AcqRel);
        }
        if !self.advance_delay.is_zero() {
            thread::sleep(self.advance_delay);
        }
        self.log.push(EngineEvent::Advanced {
            id: *handle,
            elapsed_ms,
        });
        self.log.in_advance.store(false, Ordering::Release);
        let _ = self.advances.send(Advance {
            id: *handle,
            elapsed_ms,
        });
    }

    fn destroy(&self, handle: u64) {
        self.log.push(EngineEvent::Destroyed { id: handle });
    }
}

pub type TestHost = RenderingHost<HeadlessPlatform, RecordingEngine>;

pub const SURFACE: SurfaceHandle = SurfaceHandle::new(0x51);

/// Config whose clock only ticks on explicit pulses.
pub fn pulsed_config() -> HostConfig {
    HostConfig {
        clock: ClockConfig {
            source: ClockSource::Embedder,
            ..ClockConfig::default()
        },
        ..HostConfig::default()
    }
}

pub fn build_host(
    capabilities: HeadlessCapabilities,
    engine: RecordingEngine,
    config: &HostConfig,
) -> Result<(TestHost, Arc<HeadlessStats>), HostError> {
    let platform = HeadlessPlatform::new(capabilities);
    let stats = platform.stats();
    let host = RenderingHost::new(platform, engine, SURFACE, config)?;
    Ok((host, stats))
}

pub fn pulsed_host(engine: RecordingEngine) -> (TestHost, Arc<HeadlessStats>, VsyncPulse) {
    let (host, stats) = build_host(HeadlessCapabilities::default(), engine, &pulsed_config())
        .expect("headless host");
    let pulse = host.vsync_pulse().expect("embedder clock source");
    (host, stats, pulse)
}

/// Fires one refresh and waits for the resulting advance.
pub fn tick(pulse: &VsyncPulse, monitor: &EngineMonitor) -> Advance {
    assert!(pulse.pulse(), "previous pulse still pending");
    monitor.next_advance()
}

pub fn approx(actual: f32, expected: f64) -> bool {
    (actual as f64 - expected).abs() < 1e-3
}
