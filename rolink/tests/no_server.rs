//! Client behavior when no server is registered.

mod common;

use common::{AddTwoInts, AddTwoInts_Request};
use rolink::RecvResult;
use std::time::Duration;

#[test]
fn test_no_server() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("test_no_server_node", None)?;

    let client = node.create_client::<AddTwoInts>("absent_service", None)?;
    assert!(!client.is_service_available());

    // sending succeeds; the request simply never gets answered
    let (receiver, _seq) = client.send_ret_seq(&AddTwoInts_Request { a: 1, b: 2 })?;

    let mut selector = ctx.create_selector()?;
    match receiver.recv_timeout(Duration::from_millis(50), &mut selector) {
        RecvResult::RetryLater => Ok(()),
        RecvResult::Ok(_) => panic!("no server could have answered"),
        RecvResult::Err(e) => Err(e),
    }
}
