use crate::{FetchResult, Generation, Lifecycle, TriggerPolicy};

/// Render-ready snapshot of a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerView<T> {
    pub lifecycle: Lifecycle,
    pub policy: TriggerPolicy,
    pub url: String,
    pub result: FetchResult<T>,
    /// `None` until the first initiation.
    pub latest_generation: Option<Generation>,
    pub in_flight: usize,
    pub invocations: u64,
    /// Settlements that arrived for superseded or cancelled initiations.
    pub discarded: u64,
    pub dirty: bool,
}
