//! Integration tests for Store effect execution and action observation
//!
//! Uses a small lookup reducer: a request spawns an effect that resolves to a
//! result action, which is reduced and then broadcast to observers.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::time::Duration;
use ticketer_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use ticketer_runtime::{Store, StoreError};
use ticketer_testing::init_test_tracing;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum LookupAction {
    /// Look up `key` after `delay_ms`
    Lookup { key: u32, delay_ms: u64 },
    /// Effect that yields nothing
    Forget,
    /// A lookup finished
    Found { key: u32 },
}

#[derive(Debug, Clone, Default)]
struct LookupState {
    requested: u32,
    found: Vec<u32>,
}

#[derive(Clone)]
struct LookupEnvironment;

#[derive(Clone)]
struct LookupReducer;

fn lookup(key: u32, delay_ms: u64) -> Effect<LookupAction> {
    Effect::Future(Box::pin(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Some(LookupAction::Found { key })
    }))
}

impl Reducer for LookupReducer {
    type State = LookupState;
    type Action = LookupAction;
    type Environment = LookupEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            LookupAction::Lookup { key, delay_ms } => {
                state.requested += 1;
                smallvec![lookup(key, delay_ms)]
            },
            LookupAction::Forget => smallvec![Effect::Future(Box::pin(async { None }))],
            LookupAction::Found { key } => {
                state.found.push(key);
                smallvec![Effect::None]
            },
        }
    }
}

fn store() -> Store<LookupState, LookupAction, LookupEnvironment, LookupReducer> {
    init_test_tracing();
    Store::new(LookupState::default(), LookupReducer, LookupEnvironment)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn handle_waits_for_feedback_to_be_reduced() {
    let store = store();

    let mut handle = store
        .send(LookupAction::Lookup { key: 7, delay_ms: 10 })
        .await
        .unwrap();
    assert_eq!(store.state(|s| s.found.clone()).await, Vec::<u32>::new());

    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.state(|s| s.found.clone()).await, vec![7]);
}

#[tokio::test]
async fn send_and_wait_for_returns_matching_action() {
    let store = store();

    let action = store
        .send_and_wait_for(
            LookupAction::Lookup { key: 3, delay_ms: 5 },
            |action| matches!(action, LookupAction::Found { key: 3 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(action, LookupAction::Found { key: 3 });
    assert_eq!(store.state(|s| s.found.clone()).await, vec![3]);
}

#[tokio::test]
async fn send_and_wait_for_times_out() {
    let store = store();

    let result = store
        .send_and_wait_for(
            LookupAction::Lookup { key: 1, delay_ms: 5 },
            |action| matches!(action, LookupAction::Found { key: 2 }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn observers_see_applied_state() {
    let store = store();
    let mut actions = store.subscribe_actions();

    store
        .send(LookupAction::Lookup { key: 9, delay_ms: 0 })
        .await
        .unwrap();

    let action = tokio::time::timeout(Duration::from_secs(1), actions.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(action, LookupAction::Found { key: 9 });
    assert_eq!(store.state(|s| s.found.clone()).await, vec![9]);
}

#[tokio::test]
async fn sent_actions_are_not_broadcast() {
    let store = store();
    let mut actions = store.subscribe_actions();

    let mut handle = store.send(LookupAction::Forget).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    assert!(actions.try_recv().is_err());
}

#[tokio::test]
async fn overlapping_lookups_apply_in_completion_order() {
    let store = store();

    let mut slow = store
        .send(LookupAction::Lookup { key: 1, delay_ms: 40 })
        .await
        .unwrap();
    let mut fast = store
        .send(LookupAction::Lookup { key: 2, delay_ms: 0 })
        .await
        .unwrap();
    fast.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    slow.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    assert_eq!(store.state(|s| s.found.clone()).await, vec![2, 1]);
    assert_eq!(store.state(|s| s.requested).await, 2);
}

#[tokio::test]
async fn shutdown_waits_then_rejects() {
    let store = store();
    store
        .send(LookupAction::Lookup { key: 1, delay_ms: 20 })
        .await
        .unwrap();
    assert_eq!(store.pending_effects(), 1);

    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(store.pending_effects(), 0);
    assert!(matches!(
        store.send(LookupAction::Forget).await,
        Err(StoreError::ShutdownInProgress)
    ));
}

#[tokio::test]
async fn shutdown_times_out_on_slow_effects() {
    let store = store();
    store
        .send(LookupAction::Lookup { key: 1, delay_ms: 500 })
        .await
        .unwrap();

    let result = store.shutdown(Duration::from_millis(20)).await;

    assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
}
