use crate::{ErrorInfo, Generation, WatchSet};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg<T> {
    /// The embedding component became active; carries its watched inputs.
    Activated { watch: WatchSet },
    /// The embedding component is going away.
    Deactivated,
    /// User asked for a fetch (button click or equivalent).
    FetchClicked,
    /// Some state of the embedding component changed.
    StateChanged { watch: WatchSet },
    /// Engine finished a request.
    FetchSettled {
        generation: Generation,
        outcome: Result<T, ErrorInfo>,
    },
    /// Engine confirmed a request was aborted.
    FetchCancelled { generation: Generation },
    /// Fallback for placeholder wiring.
    NoOp,
}
