use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use super::*;

type FiredLog = Arc<Mutex<Vec<(TimerKind, TimerId)>>>;

fn recorder(log: &FiredLog, kind: TimerKind) -> impl FnOnce(TimerId) + Send + 'static {
    let log = Arc::clone(log);
    move |id| log.lock().expect("log").push((kind, id))
}

fn fired(log: &FiredLog) -> Vec<(TimerKind, TimerId)> {
    log.lock().expect("log").clone()
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[tokio::test(start_paused = true)]
async fn fires_once_after_deadline() {
    let log = FiredLog::default();
    let mut timers = TimerSet::new(Handle::current());
    let fire_at = Instant::now() + ms(100);

    let id = timers.schedule(TimerKind::Delay, fire_at, recorder(&log, TimerKind::Delay));
    assert_eq!(timers.fire_at(TimerKind::Delay), Some(fire_at));

    tokio::time::sleep(ms(99)).await;
    assert!(fired(&log).is_empty());

    tokio::time::sleep(ms(2)).await;
    assert_eq!(fired(&log), vec![(TimerKind::Delay, id)]);

    tokio::time::sleep(ms(500)).await;
    assert_eq!(fired(&log).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn rescheduling_a_kind_replaces_the_live_entry() {
    let log = FiredLog::default();
    let mut timers = TimerSet::new(Handle::current());
    let now = Instant::now();

    let first = timers.schedule(TimerKind::MinHold, now + ms(50), recorder(&log, TimerKind::MinHold));
    let second =
        timers.schedule(TimerKind::MinHold, now + ms(200), recorder(&log, TimerKind::MinHold));
    assert_ne!(first, second);
    assert_eq!(timers.len(), 1);

    tokio::time::sleep(ms(250)).await;
    assert_eq!(fired(&log), vec![(TimerKind::MinHold, second)]);
    assert!(!timers.claim(TimerKind::MinHold, first));
    assert!(timers.claim(TimerKind::MinHold, second));
}

#[tokio::test(start_paused = true)]
async fn kinds_are_independent() {
    let log = FiredLog::default();
    let mut timers = TimerSet::new(Handle::current());
    let now = Instant::now();

    timers.schedule(TimerKind::MinHold, now + ms(30), recorder(&log, TimerKind::MinHold));
    timers.schedule(TimerKind::MaxHold, now + ms(60), recorder(&log, TimerKind::MaxHold));
    assert_eq!(
        timers.live_kinds(),
        vec![TimerKind::MinHold, TimerKind::MaxHold]
    );

    tokio::time::sleep(ms(100)).await;
    let kinds: Vec<_> = fired(&log).into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![TimerKind::MinHold, TimerKind::MaxHold]);
}

#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent_and_prevents_firing() {
    let log = FiredLog::default();
    let mut timers = TimerSet::new(Handle::current());

    timers.schedule(
        TimerKind::Delay,
        Instant::now() + ms(10),
        recorder(&log, TimerKind::Delay),
    );
    assert!(timers.cancel(TimerKind::Delay));
    assert!(!timers.cancel(TimerKind::Delay));
    assert!(!timers.is_live(TimerKind::Delay));

    tokio::time::sleep(ms(50)).await;
    assert!(fired(&log).is_empty());
}

#[tokio::test(start_paused = true)]
async fn claim_succeeds_at_most_once() {
    let mut timers = TimerSet::new(Handle::current());
    let id = timers.schedule(TimerKind::MaxHold, Instant::now() + ms(10), |_| {});

    assert!(!timers.claim(TimerKind::MaxHold, TimerId(id.0 + 1)));
    assert!(!timers.claim(TimerKind::MinHold, id));
    assert!(timers.claim(TimerKind::MaxHold, id));
    assert!(!timers.claim(TimerKind::MaxHold, id));
    assert!(timers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_all_and_drop_abort_every_task() {
    let log = FiredLog::default();
    let mut timers = TimerSet::new(Handle::current());
    let now = Instant::now();
    for kind in TimerKind::ALL {
        timers.schedule(kind, now + ms(20), recorder(&log, kind));
    }
    assert_eq!(timers.cancel_all(), 3);
    assert_eq!(timers.cancel_all(), 0);

    let mut dropped = TimerSet::new(Handle::current());
    dropped.schedule(TimerKind::Delay, now + ms(20), recorder(&log, TimerKind::Delay));
    drop(dropped);

    tokio::time::sleep(ms(100)).await;
    assert!(fired(&log).is_empty());
}
