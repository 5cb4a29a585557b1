//! Traffic light validation tests
//!
//! Runs real lights on background threads, mostly against a manual clock so
//! phase changes happen exactly when the test says.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use traffic_light::simulation::{
    FixedCycle, LightConfig, ManualClock, OverflowPolicy, Phase, ReceiveOrder, SimThreads,
    TrafficLight,
};

const SETTLE: Duration = Duration::from_millis(100);
const PATIENCE: Duration = Duration::from_secs(5);

/// Poll `check` until it holds or `timeout` runs out
fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    check()
}

fn manual_light(config: LightConfig) -> (TrafficLight, ManualClock) {
    let clock = ManualClock::new();
    let light = TrafficLight::with_clock(config, Arc::new(clock.clone())).unwrap();
    (light, clock)
}

/// Call wait_for_green on another thread, reporting whether it succeeded
fn spawn_waiter(light: &TrafficLight) -> (mpsc::Receiver<bool>, thread::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let light = light.clone();
    let handle = thread::spawn(move || {
        let _ = tx.send(light.wait_for_green().is_ok());
    });
    (rx, handle)
}

#[test]
fn test_new_light_starts_red_and_idle() {
    let light = TrafficLight::new();
    assert_eq!(light.current_phase(), Phase::Red);
    assert!(!light.is_running());
    assert!(!light.is_stopped());
    assert_eq!(light.flip_count(), 0);
    assert!(light.queue().is_empty());
    assert_eq!(light.queue().order(), ReceiveOrder::Lifo);
}

#[test]
fn test_turns_green_at_drawn_target() {
    let (light, clock) = manual_light(LightConfig::default());
    let mut threads = SimThreads::new();
    light
        .simulate_with(&mut threads, FixedCycle(Duration::from_micros(4_500_000)))
        .unwrap();
    assert!(light.is_running());

    // The loop has started measuring once it publishes
    assert!(eventually(PATIENCE, || !light.queue().is_empty()));

    clock.advance(Duration::from_micros(4_000_000));
    thread::sleep(SETTLE);
    assert_eq!(light.current_phase(), Phase::Red);
    assert_eq!(light.flip_count(), 0);

    clock.advance(Duration::from_micros(500_000));
    assert!(
        eventually(PATIENCE, || light.current_phase() == Phase::Green),
        "light did not turn green once the target was reached"
    );
    assert_eq!(light.flip_count(), 1);

    // Every tick publishes, so the newest entry is the green phase
    assert!(eventually(PATIENCE, || light.queue().try_receive()
        == Some(Phase::Green)));

    light.stop();
    threads.join_all().unwrap();
    assert!(!light.is_running());
}

#[test]
fn test_wait_for_green_returns_immediately_when_green() {
    let config = LightConfig::default().initial_phase(Phase::Green);
    let (light, _clock) = manual_light(config);
    let mut threads = SimThreads::new();
    light
        .simulate_with(&mut threads, FixedCycle(Duration::from_secs(5)))
        .unwrap();
    assert!(eventually(PATIENCE, || !light.queue().is_empty()));

    let (rx, waiter) = spawn_waiter(&light);
    assert!(rx.recv_timeout(PATIENCE).unwrap());
    waiter.join().unwrap();

    light.stop();
    threads.join_all().unwrap();
}

#[test]
fn test_wait_for_green_blocks_while_red() {
    let (light, clock) = manual_light(LightConfig::default());
    let mut threads = SimThreads::new();
    light
        .simulate_with(&mut threads, FixedCycle(Duration::from_micros(4_500_000)))
        .unwrap();
    assert!(eventually(PATIENCE, || !light.queue().is_empty()));

    let (rx, waiter) = spawn_waiter(&light);
    assert!(
        rx.recv_timeout(SETTLE).is_err(),
        "waiter returned while the light was red"
    );

    clock.advance(Duration::from_micros(4_500_000));
    assert!(rx.recv_timeout(PATIENCE).unwrap());
    assert_eq!(light.current_phase(), Phase::Green);
    waiter.join().unwrap();

    light.stop();
    threads.join_all().unwrap();
}

#[test]
fn test_phase_changes_within_simulated_six_seconds() {
    let clock = ManualClock::auto_advancing();
    let config = LightConfig::default().seed(99);
    let light = TrafficLight::with_clock(config, Arc::new(clock.clone())).unwrap();
    let mut threads = SimThreads::new();
    light.simulate(&mut threads).unwrap();

    assert!(
        eventually(Duration::from_secs(30), || clock.elapsed()
            >= Duration::from_secs(13)),
        "simulated time did not advance"
    );
    light.stop();
    threads.join_all().unwrap();

    let flips = light.flip_count();
    let elapsed = clock.elapsed();
    assert!(flips >= 2, "only {} flips in {:?}", flips, elapsed);
    assert!(
        flips <= elapsed.as_secs() / 4,
        "{} flips in {:?} is faster than one per 4s",
        flips,
        elapsed
    );

    let expected = if flips % 2 == 1 { Phase::Green } else { Phase::Red };
    assert_eq!(light.current_phase(), expected);
}

#[test]
fn test_simulate_twice_spawns_one_loop() {
    let (light, _clock) = manual_light(LightConfig::default());
    let mut threads = SimThreads::new();

    light.simulate(&mut threads).unwrap();
    light.simulate(&mut threads).unwrap();
    light.clone().simulate(&mut threads).unwrap();
    assert_eq!(threads.len(), 1);

    light.stop();
    threads.join_all().unwrap();
}

#[test]
fn test_stop_releases_waiters() {
    let light = TrafficLight::new();
    let (rx, waiter) = spawn_waiter(&light);
    assert!(rx.recv_timeout(SETTLE).is_err());

    light.stop();
    assert!(!rx.recv_timeout(PATIENCE).unwrap());
    waiter.join().unwrap();

    assert!(light.is_stopped());
    assert!(light.wait_for_green().is_err());
}

#[test]
fn test_stopped_light_cannot_simulate() {
    let light = TrafficLight::new();
    light.stop();

    let mut threads = SimThreads::new();
    assert!(light.simulate(&mut threads).is_err());
    assert!(threads.is_empty());
}

#[test]
fn test_real_clock_light_turns_green() {
    let config = LightConfig::default()
        .cycle_range(Duration::from_millis(20), Duration::from_millis(40))
        .receive_order(ReceiveOrder::Fifo);
    let light = TrafficLight::with_config(config).unwrap();
    assert_eq!(light.queue().order(), ReceiveOrder::Fifo);

    let mut threads = SimThreads::new();
    light.simulate(&mut threads).unwrap();

    let (rx, waiter) = spawn_waiter(&light);
    assert!(rx.recv_timeout(PATIENCE).unwrap());
    waiter.join().unwrap();

    light.stop();
    threads.join_all().unwrap();
    assert!(light.flip_count() >= 1);
}

#[test]
fn test_bounded_queue_caps_published_phases() {
    let config = LightConfig::default().queue_capacity(8, OverflowPolicy::DropOldest);
    let (light, _clock) = manual_light(config);
    assert_eq!(light.queue().capacity(), Some(8));

    let mut threads = SimThreads::new();
    light.simulate(&mut threads).unwrap();
    assert!(eventually(PATIENCE, || light.queue().len() == 8));
    thread::sleep(SETTLE);
    assert_eq!(light.queue().len(), 8);

    light.stop();
    threads.join_all().unwrap();
}

#[test]
fn test_blocking_queue_light_stops_cleanly() {
    let config = LightConfig::default().queue_capacity(4, OverflowPolicy::Block);
    let (light, _clock) = manual_light(config);
    let mut threads = SimThreads::new();
    light.simulate(&mut threads).unwrap();

    // With nobody receiving, the loop parks on the full queue
    assert!(eventually(PATIENCE, || light.queue().len() == 4));

    light.stop();
    threads.join_all().unwrap();
    assert!(!light.is_running());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let inverted = LightConfig::default()
        .cycle_range(Duration::from_secs(6), Duration::from_secs(4));
    assert!(TrafficLight::with_config(inverted).is_err());

    let zero_cycle = LightConfig::default().cycle_range(Duration::ZERO, Duration::from_secs(1));
    assert!(zero_cycle.validate().is_err());

    let zero_tick = LightConfig::default().tick_interval(Duration::ZERO);
    assert!(zero_tick.validate().is_err());

    let zero_capacity = LightConfig::default().queue_capacity(0, OverflowPolicy::DropNewest);
    assert!(zero_capacity.validate().is_err());

    assert!(LightConfig::default().validate().is_ok());
}

#[test]
fn test_join_all_reports_panicked_threads() {
    let mut threads = SimThreads::new();
    threads.spawn("fine", || {}).unwrap();
    threads.spawn("broken", || panic!("vehicle crashed")).unwrap();
    assert_eq!(threads.len(), 2);

    let err = threads.join_all().unwrap_err();
    assert!(err.to_string().contains("broken"));
    assert!(threads.is_empty());
}
