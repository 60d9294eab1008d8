//! Fetchkit core: pure fetch-runner state machine and view-model helpers.
mod effect;
mod msg;
mod result;
mod state;
mod update;
mod view_model;
mod watch;

pub use effect::Effect;
pub use msg::Msg;
pub use result::{ErrorInfo, ErrorKind, FetchResult};
pub use state::{Generation, Lifecycle, RunnerState, SupersedePolicy, TriggerPolicy, WatchMode};
pub use update::update;
pub use view_model::RunnerView;
pub use watch::{WatchSet, WatchValue};
