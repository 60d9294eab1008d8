//! Fetchkit engine: HTTP fetching, body decoding and effect execution.
mod decode;
mod engine;
mod fetch;
mod run;
mod types;

pub use decode::decode_json;
pub use engine::{EngineEvents, EngineHandle};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use run::{fetch_json, run};
pub use types::{
    EngineError, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput,
    Generation,
};
