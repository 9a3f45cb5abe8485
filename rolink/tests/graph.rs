//! Graph introspection tests.

mod common;

use common::{AddTwoInts, Int64};
use rolink::TypeSupport;

#[test]
fn topics_reflect_creation_and_destruction() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("graph_node", Some("/robot1"))?;

    let publisher = node.create_publisher::<Int64>("chatter", None)?;
    let _subscriber = node.create_subscriber::<Int64>("chatter", None)?;

    assert_eq!(node.count_publishers("chatter")?, 1);
    assert_eq!(node.count_publishers("/robot1/chatter")?, 1);
    assert_eq!(node.count_subscribers("chatter")?, 1);

    let topics = node.topic_names_and_types()?;
    assert_eq!(
        topics,
        vec![(
            "/robot1/chatter".to_string(),
            <Int64 as TypeSupport>::type_name().to_string()
        )]
    );

    drop(publisher);
    assert_eq!(node.count_publishers("chatter")?, 0);
    // the subscription keeps the topic discoverable
    assert_eq!(node.topic_names_and_types()?.len(), 1);
    Ok(())
}

#[test]
fn service_availability_tracks_servers() -> rolink::Result<()> {
    let ctx = common::new_context()?;
    let node = ctx.create_node("graph_service_node", None)?;

    let client = node.create_client::<AddTwoInts>("graph_service", None)?;
    assert!(!client.is_service_available());

    let server = node.create_server::<AddTwoInts>("graph_service", None)?;
    assert!(client.is_service_available());

    drop(server);
    assert!(!client.is_service_available());
    Ok(())
}
