use std::time::Duration;

use futures::StreamExt;
use redux_store::Store;
use redux_undoable::History;

mod config;
mod middleware;
mod reducer;

use config::DemoConfig;
use middleware::{CancelIfEmptyMiddleware, DispatchMoreMiddleware, LogStateMiddleware};
use reducer::{reduce, script, Action, State};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting redux-demo");
    let config = DemoConfig::load();

    run_synchronous(&config)?;
    run_reactive(&config).await?;
    run_undoable()?;

    log::info!("Exiting redux-demo");
    Ok(())
}

fn apply_demo_middleware(store: &Store<State, Action>) {
    store
        .apply_middleware(DispatchMoreMiddleware)
        .apply_middleware(LogStateMiddleware)
        .apply_middleware(CancelIfEmptyMiddleware);
}

/// Counter walkthrough on the synchronous backend
fn run_synchronous(config: &DemoConfig) -> anyhow::Result<()> {
    println!("== synchronous store");

    let store = Store::with_options(reduce, 0, config.store.clone());
    apply_demo_middleware(&store);
    store.subscribe(|state| println!("{}", state));

    for action in script() {
        store.dispatch(action)?;
    }

    log::info!("Synchronous store finished at {}", store.get_state());
    Ok(())
}

/// Same walkthrough with a delay bottomware in front of the reducer
async fn run_reactive(config: &DemoConfig) -> anyhow::Result<()> {
    println!("== reactive store ({}ms delay)", config.delay_ms);

    let delay = Duration::from_millis(config.delay_ms);
    let (store, driver) = Store::reactive(reduce, 0)
        .bottomware(move |actions| {
            actions
                .then(move |action| async move {
                    tokio::time::sleep(delay).await;
                    action
                })
                .boxed()
        })
        .build();
    let driver = tokio::spawn(driver.run());

    apply_demo_middleware(&store);
    store.subscribe(|state| println!("{}", state));
    let states = store.state_stream();

    let mut expected = 0;
    for action in script() {
        if matches!(action.as_str(), "Increment" | "Decrement") {
            expected += 1;
        }
        if action == "Dispatch" {
            expected += 2;
        }
        store.dispatch(action)?;
    }

    let committed: Vec<State> = states.take(expected).collect().await;
    log::info!(
        "Reactive store committed {} states, finished at {}",
        committed.len(),
        store.get_state()
    );

    drop(store);
    driver.await??;
    Ok(())
}

/// Undo/redo over a plain integer
fn run_undoable() -> anyhow::Result<()> {
    println!("== undoable history");

    let history = History::new(0);
    let history = history.advance(|n| n + 1).advance(|n| n + 1);
    println!("after two edits: {}", history.get());

    let history = history.undo()?;
    println!("after undo: {} (can redo: {})", history.get(), history.can_redo());

    let history = history.redo()?;
    println!("after redo: {} (can redo: {})", history.get(), history.can_redo());

    let branched = history.undo()?.advance(|n| n * 10);
    println!(
        "after undo + new edit: {} (can redo: {})",
        branched.get(),
        branched.can_redo()
    );

    Ok(())
}
