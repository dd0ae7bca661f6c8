//! Counter state and reducer shared by both demo backends

pub type State = i32;
pub type Action = String;

/// Reducer - pure function that produces new state from current state + action
pub fn reduce(state: State, action: Action) -> State {
    match action.as_str() {
        "Increment" => state + 1,
        "Decrement" => state - 1,
        _ => state,
    }
}

/// The action sequence both walkthroughs dispatch
pub fn script() -> Vec<Action> {
    [
        "Increment",
        "Log",
        "Increment",
        "Log",
        "Decrement",
        "Log",
        "Decrement",
        "Log",
        "Dispatch",
        "",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
