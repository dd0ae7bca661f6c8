use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use redux_store::{Store, StoreOptions};

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Increment,
    Decrement,
    /// Counts down through the runoff path, emitting one increment per step
    Burst(u32),
}

fn reduce(state: i32, action: Action) -> i32 {
    match action {
        Action::Increment => state + 1,
        Action::Decrement => state - 1,
        Action::Burst(_) => state,
    }
}

#[tokio::test]
async fn test_runoff_actions_bypass_reducer() {
    let reduced = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&reduced);

    let (store, driver) = Store::reactive(
        move |state: i32, action: Action| {
            log.lock().unwrap().push(action.clone());
            reduce(state, action)
        },
        0,
    )
    .runoff(|action| matches!(action, Action::Burst(_)))
    .build();

    store.apply_middleware_fn(|store, next, action| match action {
        Action::Burst(0) => Ok(()),
        Action::Burst(n) => {
            store.dispatch(Action::Increment)?;
            next.run(Action::Burst(n - 1))
        }
        other => next.run(other),
    });

    let states = store.state_stream();
    tokio::spawn(driver.run());

    store.dispatch(Action::Burst(3)).unwrap();

    let seen: Vec<i32> = states.take(3).collect().await;
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(store.get_state(), 3);
    assert!(reduced
        .lock()
        .unwrap()
        .iter()
        .all(|action| *action == Action::Increment));
}

#[tokio::test]
async fn test_delayed_bottomware_keeps_emission_order() {
    let (store, driver) = Store::reactive(reduce, 0)
        .bottomware(|actions| {
            actions
                .then(|action| async move {
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    action
                })
                .boxed()
        })
        .options(StoreOptions::named("delayed"))
        .build();

    let states = store.state_stream();
    tokio::spawn(driver.run());

    for action in [Action::Increment, Action::Increment, Action::Decrement] {
        store.dispatch(action).unwrap();
    }
    assert_eq!(store.get_state(), 0);

    let seen: Vec<i32> = states.take(3).collect().await;
    assert_eq!(seen, vec![1, 2, 1]);
}

#[tokio::test]
async fn test_middleware_runs_before_bus() {
    let (store, driver) = Store::reactive(reduce, 0).build();
    store.apply_middleware_fn(|_store, next, action| match action {
        Action::Decrement => Ok(()),
        other => next.run(other),
    });

    let states = store.state_stream();
    tokio::spawn(driver.run());

    store.dispatch(Action::Decrement).unwrap();
    store.dispatch(Action::Increment).unwrap();

    let seen: Vec<i32> = states.take(1).collect().await;
    assert_eq!(seen, vec![1]);
}

#[tokio::test]
async fn test_driver_stops_when_store_dropped() {
    let (store, driver) = Store::reactive(reduce, 0).build();
    let driver = tokio::spawn(driver.run());

    store.dispatch(Action::Increment).unwrap();
    drop(store);

    assert!(driver.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_actions_in_flight_are_folded_after_store_dropped() {
    let (store, driver) = Store::reactive(reduce, 0)
        .bottomware(|actions| {
            actions
                .then(|action| async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    action
                })
                .boxed()
        })
        .runoff(|action| matches!(action, Action::Burst(_)))
        .build();
    let states = store.state_stream();

    for action in [Action::Increment, Action::Burst(2), Action::Increment] {
        store.dispatch(action).unwrap();
    }
    drop(store);

    driver.run().await.unwrap();

    let seen: Vec<i32> = states.collect().await;
    assert_eq!(seen, vec![1, 2]);
}
