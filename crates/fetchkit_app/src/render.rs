use chrono::{DateTime, Utc};
use fetchkit_core::{FetchResult, Lifecycle, RunnerView, TriggerPolicy, WatchMode};
use serde_json::Value;

/// Formats the visible runner state as terminal lines.
pub fn render(view: &RunnerView<Value>, now: DateTime<Utc>) -> String {
    let lifecycle = match view.lifecycle {
        Lifecycle::Active => "active",
        Lifecycle::Inactive => "inactive",
    };
    let generation = view
        .latest_generation
        .map(|generation| format!("#{generation}"))
        .unwrap_or_else(|| "-".to_string());

    let mut out = format!(
        "[{}] {} {} gen={} in_flight={} fetches={} discarded={}\n",
        now.format("%H:%M:%S"),
        lifecycle,
        policy_label(view.policy),
        generation,
        view.in_flight,
        view.invocations,
        view.discarded,
    );

    let body = match (&view.result, view.latest_generation) {
        (FetchResult::Pending, None) => "  idle".to_string(),
        (FetchResult::Pending, Some(_)) => "  loading...".to_string(),
        (FetchResult::Success { data }, _) => format!("  ok: {}", describe(data)),
        (FetchResult::Failure { error }, _) => format!("  error: {error}"),
    };
    out.push_str(&body);
    out
}

fn policy_label(policy: TriggerPolicy) -> &'static str {
    match policy {
        TriggerPolicy::Manual => "manual",
        TriggerPolicy::Once => "once",
        TriggerPolicy::Reactive(WatchMode::Changes) => "reactive",
        TriggerPolicy::Reactive(WatchMode::Every) => "reactive-every",
    }
}

/// Two-part jokes get a friendlier layout; anything else is shown as JSON.
fn describe(data: &Value) -> String {
    match (
        data.get("setup").and_then(Value::as_str),
        data.get("delivery").and_then(Value::as_str),
    ) {
        (Some(setup), Some(delivery)) => format!("{setup} / {delivery}"),
        _ => data.to_string(),
    }
}
