//! Integration tests for the rendering host lifecycle on the headless platform.

mod common;

use std::thread;
use std::time::{Duration, Instant};

use dpi::LogicalSize;
use refresh_host::host::config::DEFAULT_FRAME_QUANTUM_MS;
use refresh_host::host::platform::HeadlessCapabilities;
use refresh_host::host::{HostConfig, HostError, ProfileVersion, SurfaceHandle};

use common::{
    EngineEvent, RecordingEngine, WAIT, approx, build_host, pulsed_config, pulsed_host, tick,
};

const Q: f64 = DEFAULT_FRAME_QUANTUM_MS;

fn size(width: f64, height: f64) -> LogicalSize<f64> {
    LogicalSize::new(width, height)
}

fn wait_for_flushes(stats: &refresh_host::host::platform::HeadlessStats, at_least: u64) {
    let deadline = Instant::now() + WAIT;
    while stats.flushes() < at_least {
        assert!(Instant::now() < deadline, "flush count stuck at {}", stats.flushes());
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn three_ticks_advance_by_the_fixed_quantum() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, stats, pulse) = pulsed_host(engine);

    host.start(size(800.0, 600.0)).unwrap();
    assert!(host.is_running());
    assert_eq!(
        monitor.log.events(),
        vec![EngineEvent::Created {
            id: 1,
            width: 800.0,
            height: 600.0
        }]
    );

    for n in 1..=3 {
        let advance = tick(&pulse, &monitor);
        assert_eq!(advance.id, 1);
        assert!(approx(advance.elapsed_ms, Q * n as f64), "tick {n}: {}", advance.elapsed_ms);
    }

    host.stop();
    assert_eq!(monitor.log.advances().len(), 3);
    assert_eq!(host.frame_count(), 3);
    assert_eq!(stats.flushes(), 3);
    assert!((host.elapsed_ms() - 3.0 * Q).abs() < 1e-9);
    assert_ne!(stats.current_thread(), Some(thread::current().id()));
}

#[test]
fn immediate_stop_never_advances_and_destroys_once() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, stats, _pulse) = pulsed_host(engine);

    host.start(size(800.0, 600.0)).unwrap();
    host.stop();
    assert!(!host.is_running());
    drop(host);

    assert!(monitor.log.advances().is_empty());
    assert_eq!(monitor.log.created(), vec![1]);
    assert_eq!(monitor.log.destroyed(), vec![1]);
    assert_eq!(stats.flushes(), 0);
    assert_eq!(stats.contexts_destroyed(), 1);
}

#[test]
fn stop_racing_a_tick_never_leaves_a_partial_frame() {
    let (engine, monitor) = RecordingEngine::new();
    let engine = engine.with_advance_delay(Duration::from_millis(20));
    let (mut host, stats, pulse) = pulsed_host(engine);

    for delay_us in [0u64, 100, 1_000, 10_000, 30_000] {
        host.start(size(800.0, 600.0)).unwrap();
        tick(&pulse, &monitor);

        pulse.pulse();
        thread::sleep(Duration::from_micros(delay_us));
        host.stop();

        assert!(!monitor.log.in_advance(), "advance still running after stop");
        let frames = host.frame_count();
        assert!(frames == 1 || frames == 2, "unexpected frame count {frames}");
        let flushes = stats.flushes();
        let advances = monitor.log.advances().len();
        while monitor.advances.try_recv().is_ok() {}

        pulse.pulse();
        assert!(monitor.no_advance_for(Duration::from_millis(50)));
        assert_eq!(stats.flushes(), flushes);
        assert_eq!(monitor.log.advances().len(), advances);
    }

    drop(host);
    assert_eq!(monitor.log.overlaps(), 0);
    monitor.log.assert_lifecycle_paired();
}

#[test]
fn impossible_format_fails_construction_without_context() {
    let (engine, monitor) = RecordingEngine::new();
    let mut config = pulsed_config();
    config.surface.color_size = 64;

    let result = build_host(HeadlessCapabilities::default(), engine, &config);
    let Err(HostError::NoCompatibleFormat { attributes }) = result else {
        panic!("expected NoCompatibleFormat");
    };
    assert_eq!(attributes, vec![73, 5, 8, 64, 99, 0x4100, 0]);
    assert!(monitor.log.events().is_empty());
}

#[test]
fn impossible_format_touches_no_platform_objects() {
    let (engine, _monitor) = RecordingEngine::new();
    let platform = refresh_host::host::platform::HeadlessPlatform::new(HeadlessCapabilities {
        profiles: vec![ProfileVersion::Legacy],
        ..HeadlessCapabilities::default()
    });
    let stats = platform.stats();

    let result = refresh_host::host::RenderingHost::new(
        platform,
        engine,
        common::SURFACE,
        &HostConfig::default(),
    );
    assert!(matches!(result, Err(HostError::NoCompatibleFormat { .. })));
    assert_eq!(stats.pixel_formats_chosen(), 0);
    assert_eq!(stats.contexts_created(), 0);
}

#[test]
fn resize_mid_run_replaces_the_handle_before_the_next_tick() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, _stats, pulse) = pulsed_host(engine);

    host.start(size(800.0, 600.0)).unwrap();
    assert_eq!(tick(&pulse, &monitor).id, 1);

    host.resize(size(1024.0, 768.0)).unwrap();
    let next = tick(&pulse, &monitor);
    assert_eq!(next.id, 2);
    assert!(approx(next.elapsed_ms, 2.0 * Q));
    host.stop();

    assert_eq!(
        monitor.log.events(),
        vec![
            EngineEvent::Created {
                id: 1,
                width: 800.0,
                height: 600.0
            },
            EngineEvent::Advanced {
                id: 1,
                elapsed_ms: Q as f32
            },
            EngineEvent::Destroyed { id: 1 },
            EngineEvent::Created {
                id: 2,
                width: 1024.0,
                height: 768.0
            },
            EngineEvent::Advanced {
                id: 2,
                elapsed_ms: (2.0 * Q) as f32
            },
        ]
    );
    assert_eq!(host.size(), Some(size(1024.0, 768.0)));
}

#[test]
fn advances_never_overlap_under_concurrent_resizes() {
    let (engine, monitor) = RecordingEngine::new();
    let engine = engine.with_advance_delay(Duration::from_millis(2));
    let capabilities = HeadlessCapabilities {
        refresh_hz: Some(240.0),
        ..HeadlessCapabilities::default()
    };
    let (mut host, _stats) = build_host(capabilities, engine, &HostConfig::default()).unwrap();
    assert!(host.vsync_pulse().is_none());
    assert_eq!(host.display().refresh_hz, 240.0);

    host.start(size(800.0, 600.0)).unwrap();
    for step in 0..10 {
        monitor.next_advance();
        host.resize(size(801.0 + step as f64, 600.0)).unwrap();
    }
    host.stop();
    drop(host);

    assert_eq!(monitor.log.overlaps(), 0);
    assert_eq!(monitor.log.created().len(), 11);
    monitor.log.assert_lifecycle_paired();
}

#[test]
fn fixed_timing_ignores_refresh_jitter() {
    let (engine, monitor) = RecordingEngine::new();
    let capabilities = HeadlessCapabilities {
        refresh_hz: Some(120.0),
        present_delay: Duration::from_millis(3),
        ..HeadlessCapabilities::default()
    };
    let (mut host, _stats) = build_host(capabilities, engine, &HostConfig::default()).unwrap();

    host.start(size(640.0, 480.0)).unwrap();
    let advances: Vec<_> = (0..8).map(|_| monitor.next_advance()).collect();
    host.stop();

    for (index, advance) in advances.iter().enumerate() {
        assert!(
            approx(advance.elapsed_ms, Q * (index + 1) as f64),
            "advance {index}: {}",
            advance.elapsed_ms
        );
    }
    assert!((host.elapsed_ms() - Q * host.frame_count() as f64).abs() < 1e-6);
}

#[test]
fn measured_timing_follows_tick_spacing() {
    let config = HostConfig::from_toml_str(
        r#"
        [timing]
        mode = "measured"

        [clock]
        source = "embedder"
        "#,
    )
    .unwrap();
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, _stats) = build_host(HeadlessCapabilities::default(), engine, &config).unwrap();
    let pulse = host.vsync_pulse().unwrap();

    host.start(size(800.0, 600.0)).unwrap();
    let first = tick(&pulse, &monitor);
    thread::sleep(Duration::from_millis(30));
    let second = tick(&pulse, &monitor);
    host.stop();

    assert!(approx(first.elapsed_ms, Q));
    assert!(second.elapsed_ms as f64 >= Q + 29.0, "second: {}", second.elapsed_ms);
}

#[test]
fn repeated_start_and_stop_have_no_extra_effect() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, stats, pulse) = pulsed_host(engine);

    host.stop();
    host.start(size(800.0, 600.0)).unwrap();
    host.start(size(800.0, 600.0)).unwrap();
    host.start(size(1920.0, 1080.0)).unwrap();
    assert_eq!(monitor.log.created(), vec![1]);
    assert_eq!(host.size(), Some(size(800.0, 600.0)));

    tick(&pulse, &monitor);
    host.stop();
    host.stop();
    assert!(!host.is_running());
    assert_eq!(stats.contexts_created(), 1);
    assert_eq!(host.frame_count(), 1);
    assert!(monitor.log.destroyed().is_empty());
}

#[test]
fn restart_replaces_the_previous_handle_and_resets_timing() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, _stats, pulse) = pulsed_host(engine);

    host.start(size(800.0, 600.0)).unwrap();
    tick(&pulse, &monitor);
    tick(&pulse, &monitor);
    host.stop();

    host.start(size(400.0, 300.0)).unwrap();
    assert_eq!(monitor.log.destroyed(), vec![1]);
    let advance = tick(&pulse, &monitor);
    assert_eq!(advance.id, 2);
    assert!(approx(advance.elapsed_ms, Q));
    assert_eq!(host.frame_count(), 1);

    drop(host);
    monitor.log.assert_lifecycle_paired();
}

#[test]
fn failed_start_stays_idle_and_can_be_retried() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, stats, pulse) = pulsed_host(engine.with_max_width(1000.0));

    let err = host.start(size(2000.0, 600.0)).unwrap_err();
    assert!(matches!(err, HostError::EngineCreate { .. }));
    assert!(!host.is_running());
    assert!(!host.has_engine_handle());

    pulse.pulse();
    assert!(monitor.no_advance_for(Duration::from_millis(50)));
    assert_eq!(stats.flushes(), 0);

    host.start(size(800.0, 600.0)).unwrap();
    let advance = tick(&pulse, &monitor);
    assert!(approx(advance.elapsed_ms, Q));
    assert_eq!(host.frame_count(), 1);
}

#[test]
fn invalid_sizes_are_rejected_before_creating_a_handle() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, _stats, _pulse) = pulsed_host(engine);

    for bad in [size(0.0, 600.0), size(800.0, -1.0), size(f64::NAN, 600.0)] {
        assert!(matches!(host.start(bad), Err(HostError::InvalidSize { .. })));
    }
    assert!(!host.is_running());
    assert!(monitor.log.events().is_empty());
}

#[test]
fn failed_resize_keeps_presenting_until_recovered() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, stats, pulse) = pulsed_host(engine.with_max_width(1000.0));

    host.start(size(800.0, 600.0)).unwrap();
    tick(&pulse, &monitor);

    let err = host.resize(size(2000.0, 600.0)).unwrap_err();
    assert!(matches!(err, HostError::EngineCreate { .. }));
    assert!(!host.has_engine_handle());
    assert_eq!(monitor.log.destroyed(), vec![1]);

    assert!(pulse.pulse());
    wait_for_flushes(&stats, 2);
    assert!(monitor.no_advance_for(Duration::from_millis(20)));

    host.resize(size(900.0, 600.0)).unwrap();
    let advance = tick(&pulse, &monitor);
    assert_eq!(advance.id, 2);
    assert!(approx(advance.elapsed_ms, 3.0 * Q));

    drop(host);
    monitor.log.assert_lifecycle_paired();
}

#[test]
fn resize_while_idle_only_records_the_size() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, _stats, _pulse) = pulsed_host(engine);

    host.resize(size(1024.0, 768.0)).unwrap();
    assert_eq!(host.size(), Some(size(1024.0, 768.0)));
    assert!(monitor.log.events().is_empty());
}

#[test]
fn resize_to_the_same_size_keeps_the_handle() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, _stats, _pulse) = pulsed_host(engine);

    host.start(size(800.0, 600.0)).unwrap();
    host.resize(size(800.0, 600.0)).unwrap();
    assert_eq!(monitor.log.created(), vec![1]);
    assert!(monitor.log.destroyed().is_empty());
}

#[test]
fn teardown_while_running_stops_before_destroying() {
    let (engine, monitor) = RecordingEngine::new();
    let engine = engine.with_advance_delay(Duration::from_millis(5));
    let (mut host, stats) =
        build_host(HeadlessCapabilities::default(), engine, &HostConfig::default()).unwrap();

    host.start(size(800.0, 600.0)).unwrap();
    monitor.next_advance();
    drop(host);

    assert!(!monitor.log.in_advance());
    assert_eq!(
        monitor.log.events().last(),
        Some(&EngineEvent::Destroyed { id: 1 })
    );
    monitor.log.assert_lifecycle_paired();
    assert_eq!(stats.contexts_destroyed(), 1);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(
        monitor.log.events().last(),
        Some(&EngineEvent::Destroyed { id: 1 })
    );
}

#[test]
fn teardown_without_start_is_clean() {
    let (engine, monitor) = RecordingEngine::new();
    let (host, stats, _pulse) = pulsed_host(engine);
    drop(host);

    assert!(monitor.log.events().is_empty());
    assert_eq!(stats.contexts_created(), 1);
    assert_eq!(stats.contexts_destroyed(), 1);
    assert_eq!(stats.surface_binds(), 0);
}

#[test]
fn surface_binds_lazily_and_rebinds_on_identity_change() {
    let (engine, monitor) = RecordingEngine::new();
    let (mut host, stats, pulse) = pulsed_host(engine);

    host.attach(SurfaceHandle::new(0x99));
    assert_eq!(stats.surface_binds(), 0);

    host.start(size(800.0, 600.0)).unwrap();
    assert_eq!(stats.bound_surface(), Some(SurfaceHandle::new(0x99)));
    assert_eq!(stats.surface_binds(), 1);

    host.attach(SurfaceHandle::new(0x77));
    host.attach(SurfaceHandle::new(0x77));
    assert_eq!(stats.surface_binds(), 2);
    assert_eq!(stats.bound_surface(), Some(SurfaceHandle::new(0x77)));
    assert_eq!(host.surface(), SurfaceHandle::new(0x77));

    tick(&pulse, &monitor);
    host.stop();
}

#[test]
fn construction_reports_context_and_config_failures() {
    let (engine, _monitor) = RecordingEngine::new();
    let result = build_host(
        HeadlessCapabilities {
            fail_context: true,
            ..HeadlessCapabilities::default()
        },
        engine,
        &HostConfig::default(),
    );
    assert!(matches!(result, Err(HostError::NoContext)));

    let (engine, monitor) = RecordingEngine::new();
    let mut config = HostConfig::default();
    config.timing.frame_quantum_ms = 0.0;
    let result = build_host(HeadlessCapabilities::default(), engine, &config);
    assert!(matches!(result, Err(HostError::Config(_))));
    assert!(monitor.log.events().is_empty());
}

#[test]
fn host_exposes_negotiated_format_and_display() {
    let (engine, _monitor) = RecordingEngine::new();
    let capabilities = HeadlessCapabilities {
        refresh_hz: None,
        display_id: 7,
        ..HeadlessCapabilities::default()
    };
    let (host, stats) = build_host(capabilities, engine, &HostConfig::default()).unwrap();

    let format = host.format();
    assert!(format.accelerated);
    assert!(format.double_buffer);
    assert_eq!(format.color_size, 32);
    assert_eq!(format.profile, ProfileVersion::Gl4_1Core);
    assert_eq!(host.display().display_id, 7);
    assert_eq!(host.display().refresh_hz, 60.0);
    assert_eq!(stats.swap_interval(), 1);
}

#[test]
fn implausible_platform_rate_uses_the_fallback() {
    let (engine, monitor) = RecordingEngine::new();
    let capabilities = HeadlessCapabilities {
        refresh_hz: Some(1e-30),
        ..HeadlessCapabilities::default()
    };
    let mut config = HostConfig::default();
    config.clock.fallback_refresh_hz = 120.0;
    let (mut host, _stats) = build_host(capabilities, engine, &config).unwrap();
    assert_eq!(host.display().refresh_hz, 120.0);

    host.start(size(800.0, 600.0)).unwrap();
    monitor.next_advance();
    host.stop();
}

#[test]
fn implausible_fallback_rate_is_a_construction_error() {
    let (engine, monitor) = RecordingEngine::new();
    let config = HostConfig::from_toml_str("[clock]\nfallback_refresh_hz = 1e-30");
    assert!(config.is_err());

    let mut config = HostConfig::default();
    config.clock.fallback_refresh_hz = 1e-30;
    let capabilities = HeadlessCapabilities {
        refresh_hz: None,
        ..HeadlessCapabilities::default()
    };
    let result = build_host(capabilities, engine, &config);
    assert!(matches!(result, Err(HostError::Config(_))));
    assert!(monitor.log.events().is_empty());
}
