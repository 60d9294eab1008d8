use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fetchkit_core::FetchResult;
use fetchkit_engine::{
    EngineError, EngineEvent, EngineEvents, EngineHandle, FailureKind, FetchError, FetchMetadata,
    FetchOutput, FetchSettings, Fetcher,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

async fn next_event<T: Send + 'static>(
    events: EngineEvents<T>,
) -> (EngineEvents<T>, EngineEvent<T>) {
    tokio::task::spawn_blocking(move || {
        let event = events.recv_timeout(WAIT).expect("engine event");
        (events, event)
    })
    .await
    .expect("join")
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_settles_fetch_with_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[1,2]", "application/json"))
        .mount(&server)
        .await;

    let (engine, events) = EngineHandle::spawn::<Vec<u32>>(FetchSettings::default()).expect("engine starts");
    engine.fetch(3, format!("{}/ok", server.uri())).expect("fetch queued");

    let (_events, event) = next_event(events).await;
    assert_eq!(
        event,
        EngineEvent::Settled {
            generation: 3,
            result: FetchResult::Success { data: vec![1, 2] },
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn engine_cancels_in_flight_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_string("[]"),
        )
        .mount(&server)
        .await;

    let (engine, events) = EngineHandle::spawn::<Vec<u32>>(FetchSettings::default()).expect("engine starts");
    engine.fetch(1, format!("{}/slow", server.uri())).expect("fetch queued");
    engine.cancel(1).expect("cancel queued");

    let (_events, event) = next_event(events).await;
    assert_eq!(event, EngineEvent::Cancelled { generation: 1 });
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_for_unknown_generation_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (engine, events) = EngineHandle::spawn::<Vec<u32>>(FetchSettings::default()).expect("engine starts");
    engine.cancel(99).expect("cancel queued");
    engine.fetch(1, format!("{}/ok", server.uri())).expect("fetch queued");

    let (events, event) = next_event(events).await;
    match event {
        EngineEvent::Settled { generation, result } => {
            assert_eq!(generation, 1);
            assert_eq!(result.error().and_then(|e| e.status), Some(404));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(events.try_recv().is_none());
}

struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.ends_with("/fail") {
            return Err(FetchError::new(FailureKind::Network, "connection reset"));
        }
        Ok(FetchOutput {
            bytes: b"7".to_vec(),
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                redirect_count: 0,
                content_type: Some("application/json".to_string()),
                byte_len: 1,
            },
        })
    }
}

#[test]
fn engine_runs_injected_fetcher_once_per_command() {
    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let (engine, events) = EngineHandle::spawn_with_fetcher::<u32>(fetcher.clone())
        .expect("engine starts");
    engine.fetch(1, "mem://value").expect("fetch queued");
    engine.fetch(2, "mem://fail").expect("fetch queued");

    let mut settled = vec![
        events.recv_timeout(WAIT).expect("first"),
        events.recv_timeout(WAIT).expect("second"),
    ];
    settled.sort_by_key(|event| match event {
        EngineEvent::Settled { generation, .. } | EngineEvent::Cancelled { generation } => {
            *generation
        }
    });

    assert_eq!(
        settled[0],
        EngineEvent::Settled {
            generation: 1,
            result: FetchResult::Success { data: 7 },
        }
    );
    match &settled[1] {
        EngineEvent::Settled { generation, result } => {
            assert_eq!(*generation, 2);
            assert!(result.error().is_some());
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn commands_after_shutdown_report_stopped() {
    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let (engine, events) =
        EngineHandle::spawn_with_fetcher::<u32>(fetcher.clone()).expect("engine starts");

    engine.shutdown().expect("shutdown accepted");

    assert!(matches!(
        engine.fetch(1, "mem://value"),
        Err(EngineError::Stopped)
    ));
    assert!(matches!(engine.cancel(1), Err(EngineError::Stopped)));
    assert!(matches!(engine.shutdown(), Err(EngineError::Stopped)));
    assert!(events.recv_timeout(WAIT).is_none());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}
