//! Fan-out strategies, failure policies, follow-ups, and cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use relay_core::action::{Action, ActionFlow, ActionGroup};
use relay_core::dispatch::{
    DispatchCoordinator, DispatchError, ErrorTransform, HandlerNode,
};
use relay_core::RelayConfig;

fn recovery_transform() -> Arc<dyn ErrorTransform> {
    Arc::new(|_action: &Action, _error: &DispatchError| {
        ActionFlow::single(Action::named("recover"))
    })
}

#[tokio::test]
async fn test_fail_fast_surfaces_the_original_error() {
    let engine = DispatchCoordinator::new();
    engine
        .register_handler_scoped(
            "exploder",
            ActionGroup::of(["doomed"]),
            HandlerNode::leaf(FailingHandler::new("exploder")),
        )
        .await;

    let result = engine.dispatch(Action::named("doomed")).await;

    match result {
        Err(DispatchError::HandlerFailed { action, handler, .. }) => {
            assert_eq!(action, "doomed");
            assert_eq!(handler, "exploder");
        }
        other => panic!("expected handler failure, got {other:?}"),
    }
    assert!(engine.history().is_empty());
}

#[tokio::test]
async fn test_catch_converts_failure_into_recovery_action() {
    let engine = DispatchCoordinator::new();
    let (recorder, seen) = RecordingHandler::new("recorder");
    engine
        .register_handler_scoped(
            "recorder",
            ActionGroup::of(["recover"]),
            HandlerNode::leaf(recorder),
        )
        .await;
    engine
        .register_handler_scoped(
            "exploder",
            ActionGroup::of(["flaky"]),
            HandlerNode::leaf(FailingHandler::new("exploder")).catching(recovery_transform()),
        )
        .await;

    // No error surfaces to the caller
    engine.dispatch(Action::named("flaky")).await.unwrap();

    // The recovery action completed (inline, before the caught branch's
    // action finished its own traversal)
    assert_eq!(history_names(&engine), vec!["recover", "flaky"]);
    assert_eq!(seen.lock().as_slice(), ["recover"]);
}

#[tokio::test]
async fn test_serial_fail_fast_aborts_remaining_siblings() {
    let engine = DispatchCoordinator::new();
    let (first, first_seen) = RecordingHandler::new("first");
    let (last, last_seen) = RecordingHandler::new("last");

    engine
        .register_handler(
            "pipeline",
            HandlerNode::serial(vec![
                HandlerNode::leaf(first),
                HandlerNode::leaf(FailingHandler::new("middle")),
                HandlerNode::leaf(last),
            ]),
        )
        .await;

    let result = engine.dispatch(Action::named("task")).await;

    assert!(result.is_err());
    assert_eq!(first_seen.lock().len(), 1);
    // The sibling after the failure never ran
    assert!(last_seen.lock().is_empty());
}

#[tokio::test]
async fn test_serial_catch_continues_with_remaining_siblings() {
    let engine = DispatchCoordinator::new();
    let (last, last_seen) = RecordingHandler::new("last");

    engine
        .register_handler_scoped(
            "pipeline",
            ActionGroup::of(["task"]),
            HandlerNode::serial(vec![
                HandlerNode::leaf(FailingHandler::new("middle")),
                HandlerNode::leaf(last),
            ])
            .catching(recovery_transform()),
        )
        .await;

    engine.dispatch(Action::named("task")).await.unwrap();

    // The failing sibling was converted, the next sibling still ran, and
    // both the recovery action and the original completed
    assert_eq!(last_seen.lock().len(), 1);
    assert_eq!(history_names(&engine), vec!["recover", "task"]);
}

#[tokio::test]
async fn test_concurrent_catch_leaves_healthy_siblings_alone() {
    let engine = DispatchCoordinator::new();
    let (healthy, healthy_seen) = RecordingHandler::new("healthy");

    engine
        .register_handler_scoped(
            "fanout",
            ActionGroup::of(["task"]),
            HandlerNode::concurrent(vec![
                HandlerNode::leaf(FailingHandler::new("broken")),
                HandlerNode::leaf(healthy),
            ])
            .catching(recovery_transform()),
        )
        .await;

    engine.dispatch(Action::named("task")).await.unwrap();

    assert_eq!(healthy_seen.lock().len(), 1);
    let names = history_names(&engine);
    assert!(names.contains(&"recover".to_string()));
    assert_eq!(names.last().unwrap(), "task");
}

#[tokio::test]
async fn test_handler_followup_flow_is_redispatched() {
    let engine = DispatchCoordinator::new();
    let (recorder, _seen) = RecordingHandler::new("recorder");
    engine
        .register_handler("recorder", HandlerNode::leaf(recorder))
        .await;
    engine
        .register_handler_scoped(
            "spawner",
            ActionGroup::of(["parent"]),
            HandlerNode::leaf(FollowupHandler::new(
                "parent",
                ActionFlow::single(Action::named("child")),
            )),
        )
        .await;

    engine.dispatch(Action::named("parent")).await.unwrap();

    // Follow-ups are fire-and-continue: the parent's dispatch resolved
    // without waiting, and the child completes on its own independent chain
    wait_for_history_len(&engine, 2).await;
    let names = history_names(&engine);
    assert!(names.contains(&"parent".to_string()));
    assert!(names.contains(&"child".to_string()));
}

#[tokio::test]
async fn test_slow_handler_times_out() {
    let config = RelayConfig {
        handler_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let engine = DispatchCoordinator::with_config(config);
    let (slow, _seen) = SlowHandler::new(Duration::from_secs(5));
    engine
        .register_handler("slow", HandlerNode::leaf(slow))
        .await;

    let result = engine.dispatch(Action::named("stuck")).await;

    assert!(matches!(result, Err(DispatchError::HandlerTimeout { .. })));
    assert!(engine.history().is_empty());
}

#[tokio::test]
async fn test_redispatch_supersedes_in_flight_action() {
    let engine = DispatchCoordinator::new();
    let (slow, _seen) = SlowHandler::new(Duration::from_millis(300));
    engine
        .register_handler("slow", HandlerNode::leaf(slow))
        .await;

    let racing_engine = engine.clone();
    let first = tokio::spawn(async move { racing_engine.dispatch(Action::named("job")).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Last writer wins: the newer dispatch completes, the older one is
    // cancelled before its handlers settle
    engine.dispatch(Action::named("job")).await.unwrap();

    let superseded = first.await.unwrap();
    assert!(matches!(superseded, Err(DispatchError::Superseded { .. })));
    assert_eq!(history_names(&engine), vec!["job"]);
}

#[tokio::test]
async fn test_unregistered_handler_no_longer_receives_actions() {
    let engine = DispatchCoordinator::new();
    let (recorder, seen) = RecordingHandler::new("recorder");
    engine
        .register_handler("recorder", HandlerNode::leaf(recorder))
        .await;

    engine.dispatch(Action::named("before")).await.unwrap();
    engine.unregister("recorder").await.unwrap();
    engine.dispatch(Action::named("after")).await.unwrap();

    assert_eq!(seen.lock().as_slice(), ["before"]);
    // Both actions still completed their traversals
    assert_eq!(history_names(&engine), vec!["before", "after"]);
}
