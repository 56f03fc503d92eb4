//! Property-based tests for live-channel frame handling

use proptest::prelude::*;
use serde_json::json;
use threadwatch::backend::realtime::{ActionRoutes, ConnectionDispatcher};

use crate::common::test_state;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_arbitrary_bytes_never_succeed(raw in prop::collection::vec(any::<u8>(), 0..256)) {
        let dispatcher = ConnectionDispatcher::new(ActionRoutes::new());
        let response = runtime().block_on(dispatcher.message(&raw, "c1"));

        prop_assert!(response.status == 400 || response.status == 404);
        prop_assert!(response.body["error"].is_string());
    }

    #[test]
    fn test_unregistered_actions_are_not_found(action in "[a-z]{1,10}(\\.[a-z]{1,10})?") {
        prop_assume!(!action.starts_with("forum."));
        let state = test_state();
        let frame = json!({ "action": action }).to_string();

        let response = runtime().block_on(state.dispatcher.message(frame.as_bytes(), "c1"));

        prop_assert_eq!(response.status, 404);
    }
}
