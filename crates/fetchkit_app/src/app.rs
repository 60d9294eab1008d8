use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use chrono::Utc;
use fetchkit_core::{update, Msg, RunnerState};
use fetchkit_logging::{runner_info, runner_warn};
use serde_json::Value;

use crate::command::{Command, HELP};
use crate::config::AppConfig;
use crate::effects::EffectRunner;
use crate::render::render;

/// Everything the main loop reacts to, in arrival order.
#[derive(Debug)]
pub enum Inbox {
    Command(Command),
    Runner(Msg<Value>),
}

pub fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let (inbox_tx, inbox_rx) = mpsc::channel::<Inbox>();
    let effects = EffectRunner::new(config.fetch_settings(), inbox_tx.clone())?;

    let mut state: RunnerState<Value> =
        RunnerState::new(config.url.clone(), config.trigger_policy())
            .with_supersede(config.supersede);
    let mut watch = config.watch_set();

    runner_info!(
        "Runner starting url={} policy={:?} supersede={:?}",
        state.url(),
        state.policy(),
        state.supersede()
    );
    println!("{HELP}");

    let _ = inbox_tx.send(Inbox::Command(Command::Activate));
    spawn_input_reader(inbox_tx);

    while let Ok(item) = inbox_rx.recv() {
        let msg = match item {
            Inbox::Command(command) => match command.into_msg(&mut watch) {
                Some(msg) => msg,
                None => break,
            },
            Inbox::Runner(msg) => msg,
        };
        state = dispatch(state, msg, &effects);
    }

    // Teardown: abort anything still in flight.
    dispatch(state, Msg::Deactivated, &effects);
    effects.shutdown();
    runner_info!("Runner stopped");
    Ok(())
}

fn dispatch(
    state: RunnerState<Value>,
    msg: Msg<Value>,
    effects: &EffectRunner,
) -> RunnerState<Value> {
    let (mut state, pending) = update(state, msg);
    effects.execute(pending);
    if state.consume_dirty() {
        println!("{}", render(&state.view(), Utc::now()));
    }
    state
}

fn spawn_input_reader(inbox_tx: mpsc::Sender<Inbox>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    runner_warn!("Failed to read stdin: {}", err);
                    break;
                }
            };
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    let quit = command == Command::Quit;
                    if inbox_tx.send(Inbox::Command(command)).is_err() || quit {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => println!("{err}"),
            }
        }
        // EOF behaves like quit.
        let _ = inbox_tx.send(Inbox::Command(Command::Quit));
    });
}
