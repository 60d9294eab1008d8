use crate::Generation;

/// Side effects requested by [`crate::update`] and executed by the embedding loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue one GET request for `url`, tagged with `generation`.
    Fetch { generation: Generation, url: String },
    /// Abort the in-flight request tagged with `generation`.
    Cancel { generation: Generation },
}
