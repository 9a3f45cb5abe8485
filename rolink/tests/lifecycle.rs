//! Context lifecycle and finalize-ordering tests.

mod common;

use common::Int64;
use rolink::Error;

#[test]
fn shutdown_is_an_idempotent_checked_transition() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    assert!(ctx.ok());

    ctx.shutdown()?;
    assert!(!ctx.ok());

    assert!(matches!(ctx.shutdown(), Err(Error::AlreadyShutdown)));
    assert!(matches!(
        ctx.create_node("late_node", None),
        Err(Error::AlreadyShutdown)
    ));
    Ok(())
}

#[test]
fn shutdown_wakes_a_blocked_selector() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let mut selector = ctx.create_selector()?;

    let remote = ctx.clone();
    let shutdown_thread = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        remote.shutdown()
    });

    // spurious wakes are possible (any context shutting down triggers the
    // shared shutdown guards), so wait until this context reports not-ok
    let start = std::time::Instant::now();
    while ctx.ok() && start.elapsed() < std::time::Duration::from_secs(5) {
        let _ = selector.wait_timeout(std::time::Duration::from_millis(200))?;
    }
    assert!(!ctx.ok());

    shutdown_thread.join().expect("shutdown thread")?;
    Ok(())
}

#[test]
fn invalid_names_are_rejected_at_creation() -> rolink::Result<()> {
    let ctx = common::new_context()?;

    assert!(matches!(
        ctx.create_node("", None),
        Err(Error::InvalidName { .. })
    ));
    assert!(matches!(
        ctx.create_node("2fast", None),
        Err(Error::InvalidName { .. })
    ));
    assert!(matches!(
        ctx.create_node("ok_node", Some("not/absolute")),
        Err(Error::InvalidName { .. })
    ));

    let node = ctx.create_node("ok_node", None)?;
    assert!(matches!(
        node.create_publisher::<Int64>("bad//topic", None),
        Err(Error::InvalidName { .. })
    ));
    Ok(())
}

#[test]
fn entities_are_finalized_before_their_node() -> rolink::Result<()> {
    let ctx = common::new_context()?;

    {
        let node = ctx.create_node("ordered_node", None)?;
        let publisher = node.create_publisher::<Int64>("ordered_topic", None)?;
        let subscriber = node.create_subscriber::<Int64>("ordered_topic", None)?;

        // entity handles keep the node alive; dropping them in any order is
        // fine, and the node is only finalized once the last one is gone
        drop(node);
        drop(publisher);
        drop(subscriber);
    }

    // the whole graph is gone
    let probe = ctx.create_node("probe_node", None)?;
    assert!(probe.topic_names_and_types()?.is_empty());
    Ok(())
}
