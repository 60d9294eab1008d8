use fetchkit_core::{ErrorInfo, FetchResult};
use fetchkit_logging::{runner_debug, runner_warn};
use serde::de::DeserializeOwned;

use crate::{decode_json, FetchError, Fetcher};

/// Fetch `url` once and decode the body as JSON.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<T, FetchError> {
    let output = fetcher.fetch(url).await?;
    runner_debug!(
        "Fetched url={} status={} bytes={} redirects={}",
        output.metadata.final_url,
        output.metadata.status,
        output.metadata.byte_len,
        output.metadata.redirect_count
    );
    decode_json(&output.bytes)
}

/// Fetch `url` once, folding every outcome into a settled [`FetchResult`].
pub async fn run<T: DeserializeOwned>(fetcher: &dyn Fetcher, url: &str) -> FetchResult<T> {
    match fetch_json(fetcher, url).await {
        Ok(data) => FetchResult::Success { data },
        Err(err) => {
            runner_warn!("Fetch of {} failed: {}", url, err);
            FetchResult::Failure {
                error: ErrorInfo::from(err),
            }
        }
    }
}
