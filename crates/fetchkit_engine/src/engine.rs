use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use fetchkit_logging::{runner_debug, runner_error, runner_info};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::run::run;
use crate::{EngineError, EngineEvent, Generation};

enum EngineCommand {
    Fetch { generation: Generation, url: String },
    Cancel { generation: Generation },
    Shutdown { done: mpsc::Sender<()> },
}

type TokenMap = Arc<Mutex<HashMap<Generation, CancellationToken>>>;

/// Command side of the background fetch engine. Cheap to clone.
///
/// The engine thread exits on [`EngineHandle::shutdown`] or once every handle
/// is dropped; requests still in flight at that point are abandoned.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Event side of the background fetch engine.
pub struct EngineEvents<T> {
    event_rx: mpsc::Receiver<EngineEvent<T>>,
}

impl EngineHandle {
    pub fn spawn<T>(settings: FetchSettings) -> Result<(Self, EngineEvents<T>), EngineError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Self::spawn_with_fetcher(Arc::new(ReqwestFetcher::new(settings)))
    }

    /// Starts the engine thread and waits until its runtime is up.
    pub fn spawn_with_fetcher<T>(
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<(Self, EngineEvents<T>), EngineError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<io::Result<()>>(1);

        thread::Builder::new()
            .name("fetchkit-engine".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Runtime::new() {
                    Ok(runtime) => {
                        let _ = ready_tx.send(Ok(()));
                        runtime
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let tokens: TokenMap = Arc::new(Mutex::new(HashMap::new()));
                let mut shutdown_ack = None;
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::Fetch { generation, url } => {
                            let token = CancellationToken::new();
                            if let Ok(mut map) = tokens.lock() {
                                map.insert(generation, token.clone());
                            }
                            runtime.spawn(execute_fetch(
                                fetcher.clone(),
                                generation,
                                url,
                                token,
                                tokens.clone(),
                                event_tx.clone(),
                            ));
                        }
                        EngineCommand::Cancel { generation } => {
                            let token = tokens
                                .lock()
                                .ok()
                                .and_then(|mut map| map.remove(&generation));
                            match token {
                                Some(token) => token.cancel(),
                                None => runner_debug!(
                                    "Cancel for generation {} ignored; not in flight",
                                    generation
                                ),
                            }
                        }
                        EngineCommand::Shutdown { done } => {
                            shutdown_ack = Some(done);
                            break;
                        }
                    }
                }
                // Close the command side before the event side so callers see
                // `Stopped` as soon as events stop.
                drop(cmd_rx);
                drop(runtime);
                drop(event_tx);
                runner_info!("Fetch engine stopped");
                if let Some(done) = shutdown_ack {
                    let _ = done.send(());
                }
            })
            .map_err(EngineError::Start)?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok((Self { cmd_tx }, EngineEvents { event_rx })),
            Ok(Err(err)) => {
                runner_error!("Failed to start fetch runtime: {}", err);
                Err(EngineError::Start(err))
            }
            Err(_) => Err(EngineError::Stopped),
        }
    }

    pub fn fetch(&self, generation: Generation, url: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::Fetch {
            generation,
            url: url.into(),
        })
    }

    pub fn cancel(&self, generation: Generation) -> Result<(), EngineError> {
        self.send(EngineCommand::Cancel { generation })
    }

    /// Stops the engine and blocks until its thread has released the runtime.
    pub fn shutdown(&self) -> Result<(), EngineError> {
        let (done_tx, done_rx) = mpsc::channel();
        self.send(EngineCommand::Shutdown { done: done_tx })?;
        let _ = done_rx.recv();
        Ok(())
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.cmd_tx
            .send(command)
            .map_err(|_| EngineError::Stopped)
    }
}

impl<T> EngineEvents<T> {
    pub fn try_recv(&self) -> Option<EngineEvent<T>> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until an event arrives; `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent<T>> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent<T>> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn execute_fetch<T: DeserializeOwned>(
    fetcher: Arc<dyn Fetcher>,
    generation: Generation,
    url: String,
    token: CancellationToken,
    tokens: TokenMap,
    event_tx: mpsc::Sender<EngineEvent<T>>,
) {
    runner_info!("Fetch generation={} url={}", generation, url);
    let event = tokio::select! {
        biased;
        _ = token.cancelled() => {
            runner_info!("Fetch generation={} cancelled", generation);
            EngineEvent::Cancelled { generation }
        }
        result = run::<T>(fetcher.as_ref(), &url) => {
            EngineEvent::Settled { generation, result }
        }
    };
    if let Ok(mut map) = tokens.lock() {
        map.remove(&generation);
    }
    let _ = event_tx.send(event);
}
