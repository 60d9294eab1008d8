use std::net::TcpListener;
use std::time::Duration;

use fetchkit_core::{ErrorKind, FetchResult};
use fetchkit_engine::{run, FailureKind, FetchSettings, Fetcher, ReqwestFetcher};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Joke {
    setup: String,
    delivery: String,
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn run_decodes_successful_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"setup":"Q","delivery":"A"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let result: FetchResult<Joke> = run(&fetcher, &format!("{}/ok", server.uri())).await;

    assert_eq!(
        result,
        FetchResult::Success {
            data: Joke {
                setup: "Q".to_string(),
                delivery: "A".to_string(),
            }
        }
    );
}

#[tokio::test]
async fn run_maps_404_to_status_failure() {
    let server = MockServer::start().await;
    mount(&server, "/missing", ResponseTemplate::new(404)).await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let result: FetchResult<Joke> = run(&fetcher, &format!("{}/missing", server.uri())).await;

    let error = result.error().expect("failure");
    assert_eq!(error.kind, ErrorKind::Status);
    assert_eq!(error.status, Some(404));
    assert!(result.data().is_none());
}

#[tokio::test]
async fn run_maps_server_error_to_status_failure() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/broken",
        ResponseTemplate::new(500).set_body_string(r#"{"setup":"Q","delivery":"A"}"#),
    )
    .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let result: FetchResult<Joke> = run(&fetcher, &format!("{}/broken", server.uri())).await;

    // A decodable body never turns a non-2xx response into success.
    assert_eq!(result.error().and_then(|e| e.status), Some(500));
}

#[tokio::test]
async fn run_maps_bad_body_to_parse_failure() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/html",
        ResponseTemplate::new(200).set_body_raw("<html>nope</html>", "text/html"),
    )
    .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let result: FetchResult<Joke> = run(&fetcher, &format!("{}/html", server.uri())).await;

    let error = result.error().expect("failure");
    assert_eq!(error.kind, ErrorKind::Parse);
    assert_eq!(error.status, None);
}

/// Binds an ephemeral port and releases it, leaving nothing listening there.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

#[tokio::test]
async fn run_maps_refused_connection_to_transport_failure() {
    let url = format!("http://127.0.0.1:{}/gone", closed_port());

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let result: FetchResult<Joke> = run(&fetcher, &url).await;

    let error = result.error().expect("failure");
    assert_eq!(error.kind, ErrorKind::Transport);
    assert_eq!(error.status, None);
    assert!(result.data().is_none());
}

#[tokio::test]
async fn fetcher_reports_refused_connection_as_network_error() {
    let url = format!("http://127.0.0.1:{}/gone", closed_port());

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Network);
}

#[tokio::test]
async fn empty_and_invalid_urls_fail_without_a_request() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default());

    let err = fetcher.fetch("   ").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);

    let err = fetcher.fetch("not a url").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);

    let result: FetchResult<Joke> = run(&fetcher, "").await;
    assert_eq!(
        result.error().map(|e| e.kind),
        Some(ErrorKind::Transport)
    );
}

#[tokio::test]
async fn fetcher_reports_metadata() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/doc",
        ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
    )
    .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/doc", server.uri());
    let output = fetcher.fetch(&url).await.expect("fetch ok");

    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, url);
    assert_eq!(output.metadata.status, 200);
    assert_eq!(output.metadata.redirect_count, 0);
    assert_eq!(output.metadata.byte_len, 2);
    assert_eq!(output.bytes, b"{}");
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "application/json")
                .set_body_string("\"0123456789\""),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings);
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(12)
        }
    );
}

#[tokio::test]
async fn each_run_issues_exactly_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let url = format!("{}/flaky", server.uri());
    let first: FetchResult<Joke> = run(&fetcher, &url).await;
    let second: FetchResult<Joke> = run(&fetcher, &url).await;

    assert_eq!(first, second);
    // `expect(2)` is verified when the server drops: no retries happened.
}
