//! Wait-set contract tests: capacity, clearing, draining, and timeout
//! semantics.

mod common;

use common::Int64;
use rolink::{Capacities, EntityKind, Error, Timeout, WaitHandle, WaitResult};
use std::time::{Duration, Instant};

#[test]
fn capacity_is_a_hard_limit() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("test_capacity_node", None)?;

    let subscribers = [
        node.create_subscriber::<Int64>("cap_topic_a", None)?,
        node.create_subscriber::<Int64>("cap_topic_b", None)?,
        node.create_subscriber::<Int64>("cap_topic_c", None)?,
    ];

    let mut wait_set = ctx.create_wait_set(Capacities {
        subscriptions: 3,
        ..Default::default()
    })?;

    for (i, subscriber) in subscribers.iter().enumerate() {
        assert_eq!(wait_set.add(subscriber.handle())?, i);
    }

    let extra = node.create_subscriber::<Int64>("cap_topic_d", None)?;
    assert!(matches!(
        wait_set.add(extra.handle()),
        Err(Error::WaitSetFull(EntityKind::Subscription))
    ));
    Ok(())
}

#[test]
fn clear_is_idempotent() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("test_clear_node", None)?;
    let subscriber = node.create_subscriber::<Int64>("clear_topic", None)?;

    let mut wait_set = ctx.create_wait_set(Capacities {
        subscriptions: 2,
        ..Default::default()
    })?;

    // clearing an empty category is a no-op
    wait_set.clear(EntityKind::Subscription)?;
    assert!(wait_set.is_empty());

    wait_set.add(subscriber.handle())?;
    wait_set.clear(EntityKind::Subscription)?;
    wait_set.clear(EntityKind::Subscription)?;
    assert!(wait_set.is_empty());

    // the first slot is free again
    assert_eq!(wait_set.add(subscriber.handle())?, 0);
    Ok(())
}

#[test]
fn wait_on_empty_set_is_an_error() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let mut wait_set = ctx.create_wait_set(Capacities {
        subscriptions: 1,
        ..Default::default()
    })?;

    assert!(matches!(
        wait_set.wait(Timeout::Immediate),
        Err(Error::WaitSetEmpty)
    ));
    Ok(())
}

#[test]
fn drain_is_stable_until_recleared() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("test_drain_node", None)?;

    let publisher = node.create_publisher::<Int64>("drain_topic", None)?;
    let subscriber = node.create_subscriber::<Int64>("drain_topic", None)?;
    let idle = node.create_subscriber::<Int64>("drain_idle_topic", None)?;

    let mut wait_set = ctx.create_wait_set(Capacities {
        subscriptions: 2,
        ..Default::default()
    })?;
    wait_set.add(subscriber.handle())?;
    wait_set.add(idle.handle())?;

    publisher.send(&Int64 { data: 1 })?;

    assert_eq!(
        wait_set.wait(Timeout::After(Duration::from_secs(1)))?,
        WaitResult::Ready(1)
    );

    let first: Vec<WaitHandle> = wait_set.ready(EntityKind::Subscription).collect();
    let second: Vec<WaitHandle> = wait_set.ready(EntityKind::Subscription).collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![subscriber.handle()]);
    Ok(())
}

#[test]
fn poll_reports_timeout_immediately() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("test_poll_node", None)?;
    let subscriber = node.create_subscriber::<Int64>("poll_topic", None)?;

    let mut wait_set = ctx.create_wait_set(Capacities {
        subscriptions: 1,
        ..Default::default()
    })?;
    wait_set.add(subscriber.handle())?;

    let start = Instant::now();
    assert_eq!(wait_set.wait(Timeout::Immediate)?, WaitResult::TimedOut);
    assert!(start.elapsed() < Duration::from_millis(500));

    // every not-ready slot was forced to empty
    assert_eq!(wait_set.ready(EntityKind::Subscription).count(), 0);
    Ok(())
}

#[test]
fn forever_wait_wakes_on_publish() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("test_forever_node", None)?;

    let publisher = node.create_publisher::<Int64>("forever_topic", None)?;
    let subscriber = node.create_subscriber::<Int64>("forever_topic", None)?;

    let mut wait_set = ctx.create_wait_set(Capacities {
        subscriptions: 1,
        ..Default::default()
    })?;
    wait_set.add(subscriber.handle())?;

    let publisher_thread = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        publisher.send(&Int64 { data: 7 })
    });

    assert_eq!(wait_set.wait(Timeout::Forever)?, WaitResult::Ready(1));
    publisher_thread.join().expect("publisher thread")?;
    Ok(())
}

#[test]
fn guard_condition_wakes_wait_and_is_consumed() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let guard = ctx.create_guard_condition()?;

    let mut wait_set = ctx.create_wait_set(Capacities {
        guard_conditions: 1,
        ..Default::default()
    })?;
    wait_set.add(guard.handle())?;

    let trigger = guard.clone();
    let trigger_thread = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        trigger.trigger()
    });

    assert_eq!(wait_set.wait(Timeout::Forever)?, WaitResult::Ready(1));
    trigger_thread.join().expect("trigger thread")?;

    // the trigger was consumed by the observing wait cycle
    wait_set.clear_all();
    wait_set.add(guard.handle())?;
    assert_eq!(wait_set.wait(Timeout::Immediate)?, WaitResult::TimedOut);
    Ok(())
}
