use modal_lifecycle::Surface;
use modal_lifecycle::dialog::headless::{Document, HeadlessFactory, SurfaceTiming};
use modal_lifecycle::dialog::{
    DialogController, DialogError, DialogEvent, DialogKind, DialogParams, DialogPhase,
    HookRegistry, HookSet, LifecycleEvent, PointerTarget, SurfaceHandle,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

fn setup(registry: HookRegistry, timing: SurfaceTiming) -> (DialogController, HeadlessFactory) {
    let factory = HeadlessFactory::new(Document::new(), timing);
    (DialogController::new(registry, factory.clone()), factory)
}

fn plain_registry() -> HookRegistry {
    HookRegistry::builder()
        .register("foo", HookSet::new())
        .register("baz", HookSet::new())
        .build()
}

/// Wait until the closing sequence has released the surface
async fn wait_released(controller: &DialogController) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while controller.surface().is_some() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("surface was never released");
}

fn drain(rx: &mut broadcast::Receiver<DialogEvent>) -> Vec<DialogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_every_registered_kind_opens() {
    let (controller, _factory) = setup(plain_registry(), SurfaceTiming::instant());

    for kind in controller.registry().kinds() {
        controller.open(kind.clone(), DialogParams::Null).await.unwrap();
        let surface = controller.opened().await.unwrap();
        assert_eq!(surface.phase(), Some(DialogPhase::Opened));
        assert!(controller.is_open());
        assert_eq!(controller.current_kind(), Some(kind));

        controller.close_programmatic();
        wait_released(&controller).await;
    }
}

#[tokio::test]
async fn test_unknown_kind_is_configuration_error() {
    let (controller, factory) = setup(plain_registry(), SurfaceTiming::instant());
    let mut events = controller.subscribe();

    let err = controller.open("missing", DialogParams::Null).await.unwrap_err();

    assert!(err.is_configuration());
    assert!(factory.created().is_empty());
    assert!(controller.current_kind().is_none());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_second_open_leaves_first_surface_untouched() {
    let (controller, factory) = setup(plain_registry(), SurfaceTiming::instant());
    controller.open("foo", DialogParams::Null).await.unwrap();
    let first = factory.last().unwrap();
    let history = first.phase_history();
    let mut events = controller.subscribe();

    controller.open("foo", DialogParams::Null).await.unwrap();

    assert_eq!(factory.created().len(), 1);
    assert_eq!(first.phase_history(), history);
    assert_eq!(first.phase(), Some(DialogPhase::Opened));
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_close_releases_surface() {
    let (controller, factory) = setup(plain_registry(), SurfaceTiming::instant());
    controller.open("foo", DialogParams::Null).await.unwrap();

    controller.close_programmatic();
    let surface = controller.closed().await.unwrap();
    wait_released(&controller).await;

    assert!(!surface.is_attached());
    assert!(!controller.is_open());
    assert!(controller.surface().is_none());
    assert!(!factory.document().scroll_suppressed());
    assert_eq!(surface.return_value().as_deref(), Some("programmatic"));
}

#[tokio::test]
async fn test_round_trip_creates_fresh_surfaces_and_signals() {
    let (controller, factory) = setup(plain_registry(), SurfaceTiming::instant());

    controller.open("foo", DialogParams::Null).await.unwrap();
    let first = controller.opened().await.unwrap();
    assert!(!controller.closed_signal().is_resolved());

    controller.close("first");
    let closed_first = controller.closed().await.unwrap();
    wait_released(&controller).await;
    assert_eq!(closed_first.id(), first.id());
    assert!(!controller.opened_signal().is_resolved());

    controller.open("foo", DialogParams::Null).await.unwrap();
    let second = controller.opened().await.unwrap();
    assert_ne!(first.id(), second.id());
    assert!(!controller.closed_signal().is_resolved());
    assert_eq!(controller.opened_signal().generation(), 2);

    controller.close("second");
    let closed_second = controller.closed().await.unwrap();
    assert_eq!(closed_second.id(), second.id());
    assert_eq!(controller.closed_signal().generation(), 2);
    assert_eq!(factory.created().len(), 2);
}

#[tokio::test]
async fn test_wait_next_opened_sees_next_cycle_only() {
    let (controller, _factory) = setup(plain_registry(), SurfaceTiming::instant());
    controller.open("foo", DialogParams::Null).await.unwrap();
    let first = controller.opened().await.unwrap();

    let waiter = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.opened_signal().wait_next().await })
    };

    controller.close_programmatic();
    wait_released(&controller).await;
    assert!(!waiter.is_finished());

    controller.open("foo", DialogParams::Null).await.unwrap();
    let next = waiter.await.unwrap().unwrap();
    assert_ne!(next.id(), first.id());
}

#[tokio::test]
async fn test_closing_hook_observes_custom_return_value() {
    let observed = Arc::new(Mutex::new(None));
    let recorder = observed.clone();
    let registry = HookRegistry::builder()
        .register(
            "foo",
            HookSet::new().on_closing(move |surface: SurfaceHandle| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = surface.return_value();
                    Ok(())
                }
            }),
        )
        .build();
    let (controller, _factory) = setup(registry, SurfaceTiming::instant());

    controller.open("foo", DialogParams::Null).await.unwrap();
    controller.opened().await.unwrap();
    controller.close("custom");
    controller.closed().await.unwrap();

    assert_eq!(observed.lock().unwrap().as_deref(), Some("custom"));
}

#[tokio::test]
async fn test_light_dismiss_closes_with_dismiss_reason() {
    let (controller, _factory) = setup(plain_registry(), SurfaceTiming::instant());
    let mut events = controller.subscribe();
    controller.open("foo", DialogParams::Null).await.unwrap();

    assert!(controller.pointer_down(PointerTarget::Surface));
    let surface = controller.closed().await.unwrap();
    wait_released(&controller).await;

    assert_eq!(surface.return_value().as_deref(), Some("dismiss"));
    let closing: Vec<_> = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event.kind, LifecycleEvent::Closing | LifecycleEvent::Closed))
        .collect();
    assert_eq!(closing.len(), 2);
    assert!(closing
        .iter()
        .all(|event| event.return_value.as_deref() == Some("dismiss")));
}

#[tokio::test]
async fn test_platform_dismissal_runs_same_closing_sequence() {
    let (controller, factory) = setup(plain_registry(), SurfaceTiming::instant());
    controller.open("foo", DialogParams::Null).await.unwrap();

    factory.last().unwrap().dismiss();
    let surface = controller.closed().await.unwrap();
    wait_released(&controller).await;

    assert_eq!(surface.phase(), Some(DialogPhase::Closed));
    assert_eq!(surface.return_value(), None);
    assert!(!controller.is_open());
}

#[tokio::test]
async fn test_failing_opening_hook_rejects_open() {
    let registry = HookRegistry::builder()
        .register(
            "bar",
            HookSet::new().on_opening(|_surface, _params| async {
                Err::<(), _>(anyhow::anyhow!("content failed to load"))
            }),
        )
        .build();
    let (controller, factory) = setup(registry, SurfaceTiming::instant());
    let mut events = controller.subscribe();

    let err = controller.open("bar", DialogParams::Null).await.unwrap_err();

    match &err {
        DialogError::Hook { kind, phase, source } => {
            assert_eq!(kind, &DialogKind::from("bar"));
            assert_eq!(*phase, DialogPhase::Opening);
            assert_eq!(source.to_string(), "content failed to load");
        }
        other => panic!("unexpected error: {other}"),
    }

    let kinds: Vec<_> = drain(&mut events).into_iter().map(|event| event.kind).collect();
    assert_eq!(kinds, vec![LifecycleEvent::Opening]);
    assert!(!controller.is_open());
    assert!(!controller.opened_signal().is_resolved());

    // The interrupted surface stays attached until the caller recovers
    let stalled = factory.last().unwrap();
    assert!(stalled.is_attached());
    assert!(!stalled.is_shown());
    assert!(controller.discard());
    assert!(!stalled.is_attached());
}

#[tokio::test]
async fn test_failing_closing_hook_still_detaches() {
    let closed_calls = Arc::new(AtomicUsize::new(0));
    let counter = closed_calls.clone();
    let registry = HookRegistry::builder()
        .register(
            "foo",
            HookSet::new()
                .on_closing(|_surface| async { Err::<(), _>(anyhow::anyhow!("save failed")) })
                .on_closed(move |_surface| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
        )
        .build();
    let (controller, factory) = setup(registry, SurfaceTiming::instant());

    controller.open("foo", DialogParams::Null).await.unwrap();
    controller.close_programmatic();
    let surface = controller.closed().await.unwrap();
    wait_released(&controller).await;

    assert!(!surface.is_attached());
    assert_eq!(factory.document().attached_count(), 0);
    assert_eq!(closed_calls.load(Ordering::SeqCst), 0);

    let err = controller.take_close_error().expect("close error recorded");
    assert_eq!(err.phase(), Some(DialogPhase::Closing));
    assert!(controller.take_close_error().is_none());

    // The controller is usable again
    controller.open("foo", DialogParams::Null).await.unwrap();
    assert!(controller.is_open());
}

#[tokio::test]
async fn test_failing_opened_hook_leaves_dialog_visible() {
    let registry = HookRegistry::builder()
        .register(
            "foo",
            HookSet::new().on_opened(|_surface, _params| async {
                Err::<(), _>(anyhow::anyhow!("focus failed"))
            }),
        )
        .build();
    let (controller, _factory) = setup(registry, SurfaceTiming::instant());

    let err = controller.open("foo", DialogParams::Null).await.unwrap_err();
    assert_eq!(err.phase(), Some(DialogPhase::Opened));
    assert!(controller.is_open());
    assert!(controller.opened_signal().is_resolved());

    controller.close_programmatic();
    controller.closed().await.unwrap();
    wait_released(&controller).await;
    assert!(!controller.is_open());
}

#[tokio::test]
async fn test_events_follow_phase_order() {
    let (controller, factory) = setup(plain_registry(), SurfaceTiming::instant());
    let mut events = controller.subscribe();

    controller.open("foo", serde_json::json!({"title": "Delete?"})).await.unwrap();
    controller.close("custom");
    wait_released(&controller).await;

    let events = drain(&mut events);
    let kinds: Vec<_> = events.iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LifecycleEvent::Opening,
            LifecycleEvent::Opened,
            LifecycleEvent::Closing,
            LifecycleEvent::Closed,
        ]
    );
    assert!(events.iter().all(|event| event.id.as_str() == "foo"));
    assert_eq!(events[1].return_value, None);
    assert_eq!(events[3].return_value.as_deref(), Some("custom"));
    assert_eq!(
        factory.last().unwrap().phase_history(),
        vec![
            DialogPhase::Opening,
            DialogPhase::Opened,
            DialogPhase::Closing,
            DialogPhase::Closed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_open_waits_for_every_animation_to_settle() {
    let timing = SurfaceTiming {
        frame: Duration::from_millis(16),
        entry_animation: Duration::from_millis(300),
        exit_animation: Duration::from_millis(200),
        failing_animation: None,
    }
    .with_failing_animation(Duration::from_millis(50));
    let (controller, _factory) = setup(plain_registry(), timing);

    let started = tokio::time::Instant::now();
    controller.open("foo", DialogParams::Null).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(316));
    assert!(controller.is_open());

    let closing_started = tokio::time::Instant::now();
    controller.close_programmatic();
    controller.closed().await.unwrap();
    assert!(closing_started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_hook_runs_before_first_frame_and_show() {
    let shown_during_opening = Arc::new(Mutex::new(None));
    let recorder = shown_during_opening.clone();
    let registry = HookRegistry::builder()
        .register(
            "foo",
            HookSet::new().on_opening(move |surface, _params| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(surface.is_shown());
                    Ok(())
                }
            }),
        )
        .build();
    let timing = SurfaceTiming {
        frame: Duration::from_millis(16),
        ..SurfaceTiming::instant()
    };
    let (controller, factory) = setup(registry, timing);

    controller.open("foo", DialogParams::Null).await.unwrap();

    assert_eq!(*shown_during_opening.lock().unwrap(), Some(false));
    assert_eq!(factory.last().unwrap().frames_painted(), 1);
    assert!(factory.document().scroll_suppressed());
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_during_entry_animation_waits_for_opened() {
    let timing = SurfaceTiming {
        frame: Duration::from_millis(16),
        entry_animation: Duration::from_millis(300),
        exit_animation: Duration::from_millis(500),
        failing_animation: None,
    };
    let (controller, factory) = setup(plain_registry(), timing);
    let mut events = controller.subscribe();

    let opening = tokio::spawn({
        let controller = controller.clone();
        async move { controller.open("foo", DialogParams::Null).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.phase(), Some(DialogPhase::Opening));
    assert!(controller.pointer_down(PointerTarget::Surface));

    opening.await.unwrap().unwrap();
    let surface = controller.closed().await.unwrap();
    wait_released(&controller).await;

    let kinds: Vec<_> = drain(&mut events).iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LifecycleEvent::Opening,
            LifecycleEvent::Opened,
            LifecycleEvent::Closing,
            LifecycleEvent::Closed,
        ]
    );
    assert_eq!(
        factory.last().unwrap().phase_history(),
        vec![
            DialogPhase::Opening,
            DialogPhase::Opened,
            DialogPhase::Closing,
            DialogPhase::Closed,
        ]
    );
    assert_eq!(surface.return_value().as_deref(), Some("dismiss"));
    assert!(!controller.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_close_during_opened_hook_still_resolves_closed() {
    let registry = HookRegistry::builder()
        .register(
            "foo",
            HookSet::new().on_opened(|_surface, _params| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }),
        )
        .build();
    let (controller, _factory) = setup(registry, SurfaceTiming::instant());
    let mut events = controller.subscribe();

    let opening = tokio::spawn({
        let controller = controller.clone();
        async move { controller.open("foo", DialogParams::Null).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.phase(), Some(DialogPhase::Opened));
    controller.close("x");

    opening.await.unwrap().unwrap();
    let surface = tokio::time::timeout(Duration::from_secs(5), controller.closed())
        .await
        .expect("closed never resolved")
        .unwrap();
    wait_released(&controller).await;

    assert_eq!(surface.return_value().as_deref(), Some("x"));
    assert!(controller.closed_signal().is_resolved());
    let kinds: Vec<_> = drain(&mut events).iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LifecycleEvent::Opening,
            LifecycleEvent::Opened,
            LifecycleEvent::Closing,
            LifecycleEvent::Closed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_pointer_down_before_show_reports_no_close() {
    let registry = HookRegistry::builder()
        .register(
            "foo",
            HookSet::new().on_opening(|_surface, _params| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            }),
        )
        .build();
    let (controller, factory) = setup(registry, SurfaceTiming::instant());

    let opening = tokio::spawn({
        let controller = controller.clone();
        async move { controller.open("foo", DialogParams::Null).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(controller.surface().is_some());
    assert!(!controller.pointer_down(PointerTarget::Surface));

    opening.await.unwrap().unwrap();
    assert!(controller.is_open());
    assert_eq!(factory.last().unwrap().close_notifications(), 0);
    assert!(controller.pointer_down(PointerTarget::Surface));
}
