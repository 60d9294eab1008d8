use fetchkit_logging::runner_debug;

use crate::{Effect, Msg, RunnerState, TriggerPolicy, WatchMode};

/// Pure update function: applies a message to state and returns any effects.
pub fn update<T>(mut state: RunnerState<T>, msg: Msg<T>) -> (RunnerState<T>, Vec<Effect>) {
    let effects = match msg {
        Msg::Activated { watch } => {
            if !state.activate(watch) {
                return (state, Vec::new());
            }
            match state.policy() {
                TriggerPolicy::Manual => Vec::new(),
                TriggerPolicy::Once | TriggerPolicy::Reactive(_) => {
                    initiate(&mut state, "activation")
                }
            }
        }
        Msg::Deactivated => state
            .deactivate()
            .into_iter()
            .map(|generation| Effect::Cancel { generation })
            .collect(),
        Msg::FetchClicked => {
            if state.is_active() {
                initiate(&mut state, "explicit request")
            } else {
                Vec::new()
            }
        }
        Msg::StateChanged { watch } => {
            if !state.is_active() {
                return (state, Vec::new());
            }
            let changed = state.observe_watch(watch);
            match state.policy() {
                TriggerPolicy::Reactive(WatchMode::Every) => initiate(&mut state, "state change"),
                TriggerPolicy::Reactive(WatchMode::Changes) if changed => {
                    initiate(&mut state, "watch set changed")
                }
                _ => Vec::new(),
            }
        }
        Msg::FetchSettled {
            generation,
            outcome,
        } => {
            state.apply_settled(generation, outcome);
            Vec::new()
        }
        Msg::FetchCancelled { generation } => {
            state.apply_cancelled(generation);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn initiate<T>(state: &mut RunnerState<T>, reason: &str) -> Vec<Effect> {
    let (generation, superseded) = state.begin_fetch();
    runner_debug!(
        "Initiating fetch generation={} reason={} superseded={:?}",
        generation,
        reason,
        superseded
    );
    let mut effects = Vec::with_capacity(superseded.len() + 1);
    effects.extend(
        superseded
            .into_iter()
            .map(|generation| Effect::Cancel { generation }),
    );
    effects.push(Effect::Fetch {
        generation,
        url: state.url().to_string(),
    });
    effects
}
