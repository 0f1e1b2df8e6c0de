use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel as channel;
use dpi::{LogicalSize, PhysicalSize};
use parking_lot::Mutex;

use super::{BridgeServices, RenderBridge};
use crate::engine::config::BridgeConfig;
use crate::engine::decoder::{DecoderEvent, EndFileReason};
use crate::engine::dispatch::MainThreadQueue;
use crate::engine::error::BridgeError;
use crate::engine::rendering::{DrawOutcome, SurfaceMetrics};
use crate::engine::state::{LifecyclePhase, StreamState};
use crate::engine::testing::{FakeDecoderFactory, FakeDecoderProbe, FakeGpuFactory, FakeGpuProbe};
use crate::engine::vsync::{DisplayLink, ImmediateDisplayLink, VsyncRedrawQueue};

const LOCATOR: &str = "rtsp://example/stream";

struct Harness {
    bridge: Arc<RenderBridge>,
    decoder: Arc<FakeDecoderFactory>,
    gpu_factory: Arc<FakeGpuFactory>,
    gpu: FakeGpuProbe,
    metrics: Arc<SurfaceMetrics>,
    main_thread: MainThreadQueue,
    vsync: Arc<VsyncRedrawQueue>,
}

impl Harness {
    fn new() -> Self {
        let vsync = Arc::new(VsyncRedrawQueue::new());
        Self::with_display(vsync.clone(), vsync)
    }

    fn immediate() -> Self {
        Self::with_display(
            Arc::new(ImmediateDisplayLink),
            Arc::new(VsyncRedrawQueue::new()),
        )
    }

    fn with_display(display: Arc<dyn DisplayLink>, vsync: Arc<VsyncRedrawQueue>) -> Self {
        let decoder = Arc::new(FakeDecoderFactory::new());
        let gpu_factory = Arc::new(FakeGpuFactory::new());
        let main_thread = MainThreadQueue::new();
        let metrics = Arc::new(SurfaceMetrics::new(LogicalSize::new(640, 360), 1.0));
        let services = BridgeServices {
            decoder_factory: decoder.clone(),
            gpu_factory: gpu_factory.clone(),
            main_thread: main_thread.clone(),
            display,
        };
        let bridge = RenderBridge::new(7, BridgeConfig::default(), metrics.clone(), services);
        Self {
            bridge,
            gpu: gpu_factory.probe(),
            decoder,
            gpu_factory,
            metrics,
            main_thread,
            vsync,
        }
    }

    fn attached() -> Self {
        let harness = Self::new();
        harness.bridge.attach(LOCATOR).unwrap();
        harness
    }

    fn engine(&self) -> FakeDecoderProbe {
        self.decoder.last_probe().unwrap()
    }

    fn deliver_event(&self, event: DecoderEvent) {
        let engine = self.engine();
        engine.push_event(event);
        engine.fire_wakeup();
        self.main_thread.drain();
    }

    fn record_states(&self) -> Arc<Mutex<Vec<StreamState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        self.bridge
            .subscribe(move |state| sink.lock().push(state.clone()));
        seen
    }

    fn frame_capacity(&self) -> usize {
        let guard = self.bridge.lock.lock();
        let resources = guard.borrow();
        resources.frame.as_ref().map_or(0, |frame| frame.capacity())
    }

    fn texture_size(&self) -> Option<PhysicalSize<u32>> {
        let guard = self.bridge.lock.lock();
        let resources = guard.borrow();
        resources.uploader.texture_size()
    }
}

#[test]
fn attach_emits_connecting_and_opens_the_stream() {
    let harness = Harness::attached();

    assert_eq!(harness.bridge.stream_state(), StreamState::Connecting);
    assert_eq!(harness.bridge.phase(), LifecyclePhase::Attached);
    let engine = harness.engine();
    assert_eq!(
        engine.commands(),
        vec![vec!["loadfile", LOCATOR, "replace"]]
    );
    assert!(engine.has_wakeup_callback());
    assert!(engine.has_update_callback());
    assert_eq!(engine.render_contexts_created(), 1);
}

#[test]
fn file_loaded_moves_to_playing_exactly_once() {
    let harness = Harness::attached();
    let seen = harness.record_states();

    harness.deliver_event(DecoderEvent::FileLoaded);
    harness.deliver_event(DecoderEvent::FileLoaded);

    assert_eq!(*seen.lock(), vec![StreamState::Playing]);
    assert_eq!(harness.bridge.stream_state(), StreamState::Playing);
}

#[test]
fn end_file_error_embeds_code_and_pause_is_a_safe_no_op() {
    let harness = Harness::attached();

    harness.deliver_event(DecoderEvent::EndFile {
        reason: EndFileReason::Error,
        code: 5,
        detail: None,
    });
    let state = harness.bridge.stream_state();
    let StreamState::Error(message) = &state else {
        panic!("expected error state, got {state:?}");
    };
    assert!(message.contains('5'));

    let seen = harness.record_states();
    harness.bridge.pause();
    assert_eq!(harness.engine().command_count("set"), 0);
    assert_eq!(harness.bridge.stream_state(), state);
    assert!(seen.lock().is_empty());
}

#[test]
fn observer_can_stop_the_stream_when_it_fails() {
    let harness = Harness::attached();
    let seen = harness.record_states();
    let bridge = Arc::downgrade(&harness.bridge);
    harness.bridge.subscribe(move |state| {
        if !state.is_error() {
            return;
        }
        if let Some(bridge) = bridge.upgrade() {
            bridge.stop();
        }
    });

    harness.deliver_event(DecoderEvent::EndFile {
        reason: EndFileReason::Error,
        code: 5,
        detail: None,
    });

    assert_eq!(harness.engine().command_count("stop"), 1);
    assert_eq!(harness.bridge.stream_state(), StreamState::Idle);
    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].is_error());
    assert_eq!(seen[1], StreamState::Idle);
}

#[test]
fn end_of_stream_returns_to_idle() {
    let harness = Harness::attached();
    harness.deliver_event(DecoderEvent::FileLoaded);
    harness.deliver_event(DecoderEvent::EndFile {
        reason: EndFileReason::Eof,
        code: 0,
        detail: None,
    });
    assert_eq!(harness.bridge.stream_state(), StreamState::Idle);
}

#[test]
fn wakeups_coalesce_into_one_drain_task() {
    let harness = Harness::attached();
    let engine = harness.engine();

    engine.fire_wakeup();
    engine.fire_wakeup();
    engine.fire_wakeup();
    assert_eq!(harness.main_thread.pending(), 1);
    assert_eq!(harness.main_thread.drain(), 1);

    engine.fire_wakeup();
    assert_eq!(harness.main_thread.pending(), 1);
}

#[test]
fn pause_twice_issues_one_command() {
    let harness = Harness::attached();
    harness.deliver_event(DecoderEvent::FileLoaded);
    let engine = harness.engine();

    harness.bridge.pause();
    harness.bridge.pause();
    assert_eq!(engine.command_count("set"), 1);
    assert_eq!(harness.bridge.phase(), LifecyclePhase::Paused);

    harness.bridge.resume();
    harness.bridge.resume();
    assert_eq!(engine.command_count("set"), 2);
    assert_eq!(harness.bridge.phase(), LifecyclePhase::Active);
    assert_eq!(
        engine.commands()[1..],
        [vec!["set", "pause", "yes"], vec!["set", "pause", "no"]]
    );
}

#[test]
fn resume_while_attached_sends_nothing() {
    let harness = Harness::attached();
    harness.bridge.resume();
    assert_eq!(harness.engine().command_count("set"), 0);
    assert_eq!(harness.bridge.phase(), LifecyclePhase::Active);
}

#[test]
fn stop_sends_stop_and_goes_idle() {
    let harness = Harness::attached();
    harness.deliver_event(DecoderEvent::FileLoaded);

    harness.bridge.stop();
    assert_eq!(harness.engine().command_count("stop"), 1);
    assert_eq!(harness.bridge.stream_state(), StreamState::Idle);

    harness.bridge.pause();
    assert_eq!(harness.engine().command_count("set"), 0);
}

#[test]
fn render_resize_grows_buffer_and_replaces_texture() {
    let harness = Harness::attached();
    let engine = harness.engine();

    engine.fire_frame();
    assert_eq!(harness.texture_size(), Some(PhysicalSize::new(640, 360)));

    harness.metrics.set(LogicalSize::new(1280, 720), 1.0);
    engine.fire_frame();

    assert!(harness.frame_capacity() >= 1280 * 720 * 4);
    assert_eq!(harness.texture_size(), Some(PhysicalSize::new(1280, 720)));
    assert_eq!(
        engine.render_sizes(),
        vec![PhysicalSize::new(640, 360), PhysicalSize::new(1280, 720)]
    );
    assert_eq!(harness.gpu.textures_created(), 2);
    assert_eq!(harness.gpu.live_textures(), 1);
}

#[test]
fn render_never_shrinks_the_frame_buffer() {
    let harness = Harness::attached();
    let engine = harness.engine();

    harness.metrics.set(LogicalSize::new(1280, 720), 1.0);
    engine.fire_frame();
    let capacity = harness.frame_capacity();

    harness.metrics.set(LogicalSize::new(640, 360), 1.0);
    engine.fire_frame();
    assert_eq!(harness.frame_capacity(), capacity);

    harness.metrics.set(LogicalSize::new(1280, 720), 1.0);
    engine.fire_frame();
    assert_eq!(harness.frame_capacity(), capacity);

    let guard = harness.bridge.lock.lock();
    assert_eq!(guard.borrow().frame.as_ref().unwrap().reallocations(), 1);
}

#[test]
fn render_size_follows_the_scale_factor() {
    let harness = Harness::attached();
    harness.metrics.set(LogicalSize::new(320, 180), 2.0);
    harness.engine().fire_frame();
    assert_eq!(harness.texture_size(), Some(PhysicalSize::new(640, 360)));
}

#[test]
fn render_only_requests_a_redraw() {
    let harness = Harness::attached();
    let engine = harness.engine();

    engine.fire_frame();
    engine.fire_frame();
    assert_eq!(harness.gpu.uploads(), 2);
    assert_eq!(harness.gpu.draw_calls(), 0);
    assert_eq!(harness.vsync.pending(), 1);

    assert_eq!(harness.vsync.tick(), 1);
    assert_eq!(harness.gpu.draw_calls(), 1);
    assert_eq!(
        harness.gpu.last_draw().map(|(size, _)| size),
        Some(PhysicalSize::new(640, 360))
    );
}

#[test]
fn unchanged_frame_at_same_size_is_not_rendered_again() {
    let harness = Harness::attached();
    harness.engine().fire_frame();
    harness.bridge.render();
    assert_eq!(harness.gpu.uploads(), 1);
}

#[test]
fn first_uploaded_frame_moves_to_playing() {
    let harness = Harness::attached();
    let seen = harness.record_states();

    harness.engine().fire_frame();
    assert_eq!(harness.main_thread.drain(), 1);
    harness.deliver_event(DecoderEvent::FileLoaded);
    harness.engine().fire_frame();
    harness.main_thread.drain();

    assert_eq!(*seen.lock(), vec![StreamState::Playing]);
}

#[test]
fn draw_without_texture_clears_the_surface() {
    let harness = Harness::attached();
    assert_eq!(harness.bridge.draw(), DrawOutcome::Cleared);
    assert_eq!(harness.gpu.clears(), 1);
    assert_eq!(harness.bridge.texture_id(), 900);
}

#[test]
fn synchronous_display_link_reenters_draw_without_deadlock() {
    let harness = Harness::immediate();
    harness.bridge.attach(LOCATOR).unwrap();

    harness.engine().fire_frame();
    assert_eq!(harness.gpu.draw_calls(), 1);
    harness.engine().fire_frame();
    assert_eq!(harness.gpu.draw_calls(), 2);
}

#[test]
fn shutdown_tears_down_once_in_order() {
    let harness = Harness::attached();
    harness.engine().fire_frame();
    let engine = harness.engine();

    harness.bridge.shutdown();
    harness.bridge.shutdown();
    harness.bridge.shutdown();

    assert!(harness.bridge.is_shut_down());
    assert_eq!(harness.bridge.phase(), LifecyclePhase::ShutDown);
    assert_eq!(engine.destroy_count(), 1);
    assert_eq!(engine.render_context_frees(), 1);
    assert!(engine.update_cleared_before_free());
    assert!(engine.wakeup_cleared_before_destroy());
    assert_eq!(harness.gpu.live_textures(), 0);
    assert_eq!(harness.gpu.pipelines_destroyed(), 1);
    assert_eq!(harness.gpu.samplers_destroyed(), 1);
    assert_eq!(harness.gpu.backends_dropped(), 1);
    assert_eq!(harness.frame_capacity(), 0);
    assert_eq!(harness.bridge.texture_id(), 0);

    let Harness { bridge, .. } = harness;
    drop(bridge);
    assert_eq!(engine.destroy_count(), 1);
}

#[test]
fn shutdown_from_inside_a_draw_completes_when_the_draw_returns() {
    let harness = Harness::immediate();
    harness.bridge.attach(LOCATOR).unwrap();
    let engine = harness.engine();
    let bridge = Arc::downgrade(&harness.bridge);
    harness.gpu.on_draw(move || {
        if let Some(bridge) = bridge.upgrade() {
            bridge.shutdown();
        }
    });

    engine.fire_frame();

    assert_eq!(harness.gpu.draw_calls(), 1);
    assert!(harness.bridge.is_shut_down());
    assert_eq!(harness.bridge.phase(), LifecyclePhase::ShutDown);
    assert_eq!(engine.render_context_frees(), 1);
    assert_eq!(engine.destroy_count(), 1);
    assert!(engine.wakeup_cleared_before_destroy());
    assert_eq!(harness.gpu.live_textures(), 0);
    assert_eq!(harness.gpu.backends_dropped(), 1);
    assert_eq!(harness.frame_capacity(), 0);
}

#[test]
fn nothing_is_touched_after_shutdown() {
    let harness = Harness::attached();
    harness.deliver_event(DecoderEvent::FileLoaded);
    let engine = harness.engine();
    engine.fire_frame();
    let (wakeup, render_ready) = engine.retained_callbacks();

    harness.bridge.shutdown();
    let commands = engine.commands();
    let uploads = harness.gpu.uploads();
    let draws = harness.gpu.draw_calls() + harness.gpu.clears();

    harness.bridge.render();
    assert_eq!(harness.bridge.draw(), DrawOutcome::Skipped);
    harness.vsync.tick();
    harness.bridge.pause();
    harness.bridge.resume();
    harness.bridge.stop();
    if let Some(callback) = render_ready {
        callback();
    }
    if let Some(callback) = wakeup {
        callback();
    }
    harness.main_thread.drain();

    assert_eq!(engine.commands(), commands);
    assert_eq!(harness.gpu.uploads(), uploads);
    assert_eq!(harness.gpu.draw_calls() + harness.gpu.clears(), draws);
    assert_eq!(engine.render_sizes().len(), 1);
    assert_eq!(harness.frame_capacity(), 0);
}

#[test]
fn empty_locator_is_rejected_without_side_effects() {
    let harness = Harness::new();
    assert!(matches!(
        harness.bridge.attach("  "),
        Err(BridgeError::InvalidLocator(_))
    ));
    assert_eq!(harness.bridge.stream_state(), StreamState::Idle);
    assert_eq!(harness.bridge.phase(), LifecyclePhase::Uninitialized);
    assert_eq!(harness.decoder.created(), 0);
}

#[test]
fn non_url_locators_reach_the_decoder_unchanged() {
    for locator in ["rtp://239.0.0.1:5004", "tcp://10.0.0.7:9000", "/var/cam/clip.mkv"] {
        let harness = Harness::new();
        harness.bridge.attach(locator).unwrap();
        assert_eq!(harness.bridge.stream_state(), StreamState::Connecting);
        assert_eq!(
            harness.engine().commands(),
            vec![vec!["loadfile", locator, "replace"]]
        );
    }
}

#[test]
fn unplayable_locator_surfaces_through_the_decoder() {
    let harness = Harness::new();
    harness.bridge.attach("gopher://cam/live").unwrap();

    harness.deliver_event(DecoderEvent::EndFile {
        reason: EndFileReason::Error,
        code: -13,
        detail: Some("unrecognized file format".to_string()),
    });
    let state = harness.bridge.stream_state();
    let StreamState::Error(message) = &state else {
        panic!("expected error state, got {state:?}");
    };
    assert!(message.contains("-13"));
    assert!(message.contains("unrecognized file format"));
}

#[test]
fn second_attach_and_attach_after_shutdown_are_rejected() {
    let harness = Harness::attached();
    assert!(matches!(
        harness.bridge.attach(LOCATOR),
        Err(BridgeError::AlreadyAttached)
    ));
    assert_eq!(harness.decoder.created(), 1);

    let fresh = Harness::new();
    fresh.bridge.shutdown();
    assert!(matches!(
        fresh.bridge.attach(LOCATOR),
        Err(BridgeError::ShutDown)
    ));
}

#[test]
fn engine_initialization_failure_surfaces_as_error() {
    let harness = Harness::new();
    harness.decoder.fail_initialize(true);
    let seen = harness.record_states();

    harness.bridge.attach(LOCATOR).unwrap();
    assert!(harness.bridge.stream_state().is_error());
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(harness.engine().destroy_count(), 1);

    harness.bridge.pause();
    harness.bridge.shutdown();
    assert!(harness.bridge.is_shut_down());
    assert_eq!(harness.engine().destroy_count(), 1);
}

#[test]
fn missing_decoder_library_surfaces_as_error() {
    let harness = Harness::new();
    harness.decoder.fail_create(true);
    harness.bridge.attach(LOCATOR).unwrap();
    assert!(harness.bridge.stream_state().is_error());
    harness.bridge.shutdown();
    assert_eq!(harness.gpu.pipelines_destroyed(), 1);
}

#[test]
fn pipeline_failure_leaves_the_bridge_inert() {
    let harness = Harness::new();
    harness.gpu.fail_pipeline(true);

    harness.bridge.attach(LOCATOR).unwrap();
    assert!(harness.bridge.stream_state().is_error());
    assert_eq!(harness.decoder.created(), 0);

    harness.bridge.render();
    assert_eq!(harness.bridge.draw(), DrawOutcome::Skipped);
    harness.bridge.shutdown();
    assert!(harness.bridge.is_shut_down());
}

#[test]
fn gpu_context_failure_leaves_the_bridge_inert() {
    let harness = Harness::new();
    harness.gpu_factory.fail_create(true);
    harness.bridge.attach(LOCATOR).unwrap();
    assert!(harness.bridge.stream_state().is_error());
    assert_eq!(harness.gpu.backends_dropped(), 0);
}

#[test]
fn upload_failure_disables_the_render_path() {
    let harness = Harness::attached();
    let engine = harness.engine();
    harness.gpu.fail_uploads(true);

    engine.fire_frame();
    harness.main_thread.drain();
    let state = harness.bridge.stream_state();
    assert!(matches!(&state, StreamState::Error(message) if message.contains("GPU")));

    harness.gpu.fail_uploads(false);
    engine.fire_frame();
    assert_eq!(harness.gpu.uploads(), 0);
    assert_eq!(engine.render_sizes().len(), 1);

    harness.vsync.tick();
    assert_eq!(harness.gpu.clears(), 1);
}

#[test]
fn decoder_render_failure_is_skipped() {
    let harness = Harness::attached();
    let engine = harness.engine();
    engine.fail_render(true);
    engine.fire_frame();
    assert_eq!(harness.gpu.uploads(), 0);
    assert_eq!(harness.vsync.pending(), 0);
    assert_eq!(harness.bridge.stream_state(), StreamState::Connecting);
}

#[test]
fn concurrent_render_draw_and_shutdown_never_deadlock() {
    for _ in 0..8 {
        let harness = Harness::attached();
        let engine = harness.engine();
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = channel::unbounded::<&'static str>();
        let deadline = Instant::now() + Duration::from_millis(200);

        let render = {
            let bridge = harness.bridge.clone();
            let engine = engine.clone();
            let running = running.clone();
            let done = done_tx.clone();
            thread::spawn(move || {
                while running.load(Ordering::Acquire) && Instant::now() < deadline {
                    engine.fire_frame();
                    bridge.render();
                }
                let _ = done.send("render");
            })
        };
        let draw = {
            let bridge = harness.bridge.clone();
            let vsync = harness.vsync.clone();
            let running = running.clone();
            let done = done_tx.clone();
            thread::spawn(move || {
                while running.load(Ordering::Acquire) && Instant::now() < deadline {
                    vsync.tick();
                    bridge.draw();
                }
                let _ = done.send("draw");
            })
        };
        let racing_shutdown = {
            let bridge = harness.bridge.clone();
            let done = done_tx.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                bridge.shutdown();
                let _ = done.send("shutdown");
            })
        };

        thread::sleep(Duration::from_millis(5));
        harness.bridge.shutdown();
        running.store(false, Ordering::Release);

        for _ in 0..3 {
            let finished = done_rx.recv_timeout(Duration::from_secs(5));
            assert!(finished.is_ok(), "worker did not finish: deadlock");
        }
        render.join().unwrap();
        draw.join().unwrap();
        racing_shutdown.join().unwrap();

        assert!(harness.bridge.is_shut_down());
        assert_eq!(engine.destroy_count(), 1);
        assert_eq!(engine.render_context_frees(), 1);
        assert_eq!(harness.gpu.live_textures(), 0);
    }
}
