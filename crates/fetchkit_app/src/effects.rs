use std::sync::mpsc;
use std::thread;

use fetchkit_core::{Effect, ErrorInfo, Msg};
use fetchkit_engine::{EngineError, EngineEvent, EngineEvents, EngineHandle, FetchSettings};
use fetchkit_logging::{runner_info, runner_warn};
use serde_json::Value;

use crate::app::Inbox;

/// Executes runner effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    inbox_tx: mpsc::Sender<Inbox>,
}

impl EffectRunner {
    pub fn new(
        settings: FetchSettings,
        inbox_tx: mpsc::Sender<Inbox>,
    ) -> Result<Self, EngineError> {
        let (engine, events) = EngineHandle::spawn::<Value>(settings)?;
        spawn_event_loop(events, inbox_tx.clone());
        Ok(Self { engine, inbox_tx })
    }

    /// Runs each effect. A command the engine cannot take is answered
    /// locally so the runner never waits on a generation that will not settle.
    pub fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch { generation, url } => {
                    runner_info!("Fetch generation={} url={}", generation, url);
                    if let Err(err) = self.engine.fetch(generation, url) {
                        runner_warn!("Fetch generation={} not started: {}", generation, err);
                        self.feed_back(Msg::FetchSettled {
                            generation,
                            outcome: Err(ErrorInfo::transport(err.to_string())),
                        });
                    }
                }
                Effect::Cancel { generation } => {
                    runner_info!("Cancel generation={}", generation);
                    if let Err(err) = self.engine.cancel(generation) {
                        runner_warn!("Cancel generation={} not delivered: {}", generation, err);
                        self.feed_back(Msg::FetchCancelled { generation });
                    }
                }
            }
        }
    }

    /// Stops the engine, aborting anything still in flight.
    pub fn shutdown(&self) {
        if let Err(err) = self.engine.shutdown() {
            runner_warn!("Engine shutdown: {}", err);
        }
    }

    fn feed_back(&self, msg: Msg<Value>) {
        if self.inbox_tx.send(Inbox::Runner(msg)).is_err() {
            runner_warn!("Inbox closed; dropping runner message");
        }
    }
}

fn spawn_event_loop(events: EngineEvents<Value>, inbox_tx: mpsc::Sender<Inbox>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if inbox_tx.send(Inbox::Runner(map_event(event))).is_err() {
                return;
            }
        }
    });
}

pub(crate) fn map_event<T>(event: EngineEvent<T>) -> Msg<T> {
    match event {
        EngineEvent::Settled { generation, result } => match result.into_outcome() {
            Some(outcome) => {
                if let Err(error) = &outcome {
                    runner_warn!("Fetch generation={} failed: {}", generation, error);
                }
                Msg::FetchSettled {
                    generation,
                    outcome,
                }
            }
            None => {
                runner_warn!("Engine settled generation={} without an outcome", generation);
                Msg::NoOp
            }
        },
        EngineEvent::Cancelled { generation } => Msg::FetchCancelled { generation },
    }
}
