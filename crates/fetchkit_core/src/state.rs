use std::collections::BTreeSet;

use fetchkit_logging::{runner_debug, runner_warn};
use serde::{Deserialize, Serialize};

use crate::view_model::RunnerView;
use crate::{ErrorInfo, FetchResult, WatchSet};

/// Monotonic tag attached to every fetch initiation.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchMode {
    /// Re-fetch only when the watched snapshot changes.
    Changes,
    /// Re-fetch after every state change of the owner, without deduplication.
    Every,
}

/// When the runner initiates fetches on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerPolicy {
    Manual,
    Once,
    Reactive(WatchMode),
}

/// What happens to an in-flight request when a newer one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupersedePolicy {
    /// Let it finish and drop its result on arrival.
    #[default]
    DiscardStale,
    /// Ask the engine to abort it.
    CancelPrevious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Inactive,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerState<T> {
    url: String,
    policy: TriggerPolicy,
    supersede: SupersedePolicy,
    lifecycle: Lifecycle,
    result: FetchResult<T>,
    last_watch: Option<WatchSet>,
    next_generation: Generation,
    latest: Option<Generation>,
    in_flight: BTreeSet<Generation>,
    invocations: u64,
    discarded: u64,
    dirty: bool,
}

impl<T> RunnerState<T> {
    pub fn new(url: impl Into<String>, policy: TriggerPolicy) -> Self {
        if policy == TriggerPolicy::Reactive(WatchMode::Every) {
            runner_warn!(
                "Reactive runner without a watch set re-fetches on every state change; \
                 prefer Once or an explicit watch set"
            );
        }
        Self {
            url: url.into().trim().to_string(),
            policy,
            supersede: SupersedePolicy::default(),
            lifecycle: Lifecycle::Inactive,
            result: FetchResult::Pending,
            last_watch: None,
            next_generation: 1,
            latest: None,
            in_flight: BTreeSet::new(),
            invocations: 0,
            discarded: 0,
            dirty: false,
        }
    }

    pub fn with_supersede(mut self, supersede: SupersedePolicy) -> Self {
        self.supersede = supersede;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    pub fn supersede(&self) -> SupersedePolicy {
        self.supersede
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn result(&self) -> &FetchResult<T> {
        &self.result
    }

    pub fn latest_generation(&self) -> Option<Generation> {
        self.latest
    }

    pub fn in_flight(&self) -> impl Iterator<Item = Generation> + '_ {
        self.in_flight.iter().copied()
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns false when already active.
    pub(crate) fn activate(&mut self, watch: WatchSet) -> bool {
        if self.is_active() {
            return false;
        }
        self.lifecycle = Lifecycle::Active;
        self.last_watch = Some(watch);
        self.mark_dirty();
        true
    }

    /// Returns the generations that were still in flight.
    pub(crate) fn deactivate(&mut self) -> Vec<Generation> {
        if !self.is_active() {
            return Vec::new();
        }
        self.lifecycle = Lifecycle::Inactive;
        self.last_watch = None;
        self.mark_dirty();
        std::mem::take(&mut self.in_flight).into_iter().collect()
    }

    /// Records the new snapshot and reports whether it differs from the previous one.
    pub(crate) fn observe_watch(&mut self, watch: WatchSet) -> bool {
        let changed = match &self.last_watch {
            Some(previous) => watch.differs_from(previous),
            None => true,
        };
        self.last_watch = Some(watch);
        changed
    }

    /// Starts a new initiation; returns its generation and the generations to cancel.
    pub(crate) fn begin_fetch(&mut self) -> (Generation, Vec<Generation>) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.latest = Some(generation);
        self.invocations += 1;
        self.result = FetchResult::Pending;

        let superseded = match self.supersede {
            SupersedePolicy::CancelPrevious => {
                std::mem::take(&mut self.in_flight).into_iter().collect()
            }
            SupersedePolicy::DiscardStale => Vec::new(),
        };
        self.in_flight.insert(generation);
        self.mark_dirty();
        (generation, superseded)
    }

    /// Applies a settlement if it belongs to the latest live initiation.
    pub(crate) fn apply_settled(
        &mut self,
        generation: Generation,
        outcome: Result<T, ErrorInfo>,
    ) -> bool {
        let was_in_flight = self.in_flight.remove(&generation);
        let current = self.is_active() && self.latest == Some(generation);
        if !(was_in_flight && current) {
            runner_debug!(
                "Discarding result for generation {} (latest={:?}, in_flight={})",
                generation,
                self.latest,
                was_in_flight
            );
            self.discarded += 1;
            if was_in_flight {
                self.mark_dirty();
            }
            return false;
        }
        self.result = outcome.into();
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_cancelled(&mut self, generation: Generation) {
        if self.in_flight.remove(&generation) {
            self.mark_dirty();
        }
    }
}

impl<T: Clone> RunnerState<T> {
    pub fn view(&self) -> RunnerView<T> {
        RunnerView {
            lifecycle: self.lifecycle,
            policy: self.policy,
            url: self.url.clone(),
            result: self.result.clone(),
            latest_generation: self.latest,
            in_flight: self.in_flight.len(),
            invocations: self.invocations,
            discarded: self.discarded,
            dirty: self.dirty,
        }
    }
}
