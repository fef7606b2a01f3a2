use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use harpoon_core::StateEventKind;
use harpoon_event_bus::{BusError, Channel, EventRegistry, SceneScope};

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&count), count)
}

#[test]
fn independent_resolution_reaches_same_subscribers() {
    let registry = EventRegistry::new();
    let consumer: Channel<u32> = registry
        .channel("spawner", "mob_spawned")
        .expect("consumer resolves channel");
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let _subscription = consumer.subscribe("hud", move |value: &u32| {
        sink.lock().expect("sink lock").push(*value);
    });

    let producer: Channel<u32> = registry
        .channel("spawner", "mob_spawned")
        .expect("producer resolves channel");
    assert_eq!(producer.publish(&3), Ok(1));
    assert_eq!(producer.publish(&5), Ok(1));

    assert_eq!(*received.lock().expect("sink lock"), vec![3, 5]);
}

#[test]
fn duplicate_registrations_each_fire() {
    let registry = EventRegistry::new();
    let channel: Channel<()> = registry.channel("ui", "refresh").expect("channel");
    let (handle, count) = counter();
    let first_handle = Arc::clone(&handle);
    let first = channel.subscribe("panel", move |_| {
        let _ = first_handle.fetch_add(1, Ordering::SeqCst);
    });
    let second = channel.subscribe("panel", move |_| {
        let _ = handle.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(channel.publish(&()), Ok(2));
    assert_eq!(count.load(Ordering::SeqCst), 2);

    assert!(first.unsubscribe());
    assert!(second.is_active());
    assert_eq!(channel.subscriber_count(), 1);
    assert_eq!(channel.publish(&()), Ok(1));
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn detached_subscription_outlives_its_handle() {
    let registry = EventRegistry::new();
    let channel: Channel<u8> = registry.channel("audio", "cue").expect("channel");
    let (handle, count) = counter();
    channel
        .subscribe("mixer", move |_| {
            let _ = handle.fetch_add(1, Ordering::SeqCst);
        })
        .detach();

    assert_eq!(channel.publish(&1), Ok(1));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_subscriber_does_not_stop_delivery() {
    let registry = EventRegistry::new();
    let channel: Channel<u32> = registry.channel("player", "damaged").expect("channel");
    let (handle, count) = counter();
    let _faulty = channel.subscribe("faulty", |_| panic!("boom"));
    let _healthy = channel.subscribe("healthy", move |_| {
        let _ = handle.fetch_add(1, Ordering::SeqCst);
    });

    let error = channel.publish(&10).expect_err("panic is reported");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(error.delivered, 1);
    assert_eq!(error.target, "player.damaged");
    assert_eq!(error.failures.len(), 1);
    assert_eq!(error.failures[0].owner, "faulty");
    assert_eq!(error.failures[0].message, "boom");
}

#[test]
fn subscribing_during_publish_applies_to_next_publish() {
    let registry = EventRegistry::new();
    let channel: Channel<u32> = registry.channel("level", "tick").expect("channel");
    let late = Arc::new(Mutex::new(Vec::new()));
    let (handle, count) = counter();

    let inner_channel = channel.clone();
    let inner_late = Arc::clone(&late);
    let _outer = channel.subscribe("spawner", move |_| {
        let handle = Arc::clone(&handle);
        let subscription = inner_channel.subscribe("late", move |_| {
            let _ = handle.fetch_add(1, Ordering::SeqCst);
        });
        inner_late.lock().expect("late lock").push(subscription);
    });

    assert_eq!(channel.publish(&1), Ok(1));
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(channel.publish(&2), Ok(2));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn handles_become_inert_when_channel_is_gone() {
    let subscription = {
        let registry = EventRegistry::new();
        let channel: Channel<u32> = registry.channel("level", "ended").expect("channel");
        channel.subscribe("stats", |_| {})
    };
    assert!(!subscription.is_active());
    assert!(!subscription.unsubscribe());
}

#[test]
fn scene_keys_are_created_lazily_and_cleared_together() {
    let scene = SceneScope::new("harbour");
    let (handle, count) = counter();
    let subscription = scene.subscribe("boss_phase", StateEventKind::Entered, "music", move |kind| {
        assert_eq!(kind, StateEventKind::Entered);
        let _ = handle.fetch_add(1, Ordering::SeqCst);
    });

    assert!(scene.contains("boss_phase"));
    assert_eq!(scene.notify("boss_phase", StateEventKind::Entered), Ok(1));
    assert_eq!(scene.notify("boss_phase", StateEventKind::Exited), Ok(0));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert_eq!(scene.clear(), 1);
    assert!(scene.is_empty());
    assert!(!subscription.is_active());
}

#[test]
fn notifying_unknown_scene_key_is_an_error() {
    let scene = SceneScope::new("harbour");
    let error = scene
        .notify("missing", StateEventKind::Modified)
        .expect_err("unknown key");
    assert_eq!(
        error,
        BusError::KeyNotFound {
            scope: "harbour".to_owned(),
            key: "missing".to_owned(),
        }
    );
}
