//! rigsync
//!
//! Drives a rig session from the console. Commands are read from stdin, one
//! per line; rig updates and failures are printed as they arrive.
//!
//! Usage: `rigsync [settings.json]`

mod commands;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use commands::{Command, HELP};
use rig_control::{SessionError, SessionEvent, SessionManager};
use settings::Settings;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "rigsync=info,rig_protocol=info,rig_control=info,rig_sim=info";

/// How long to wait for the backend to shut down on exit
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = match Settings::load(path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("rigsync: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let default_filter = settings
        .log_filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting rigsync with model {}", settings.rig.model);

    let mut session = SessionManager::default();
    if !session.open(settings.rig.clone()) {
        warn!("Could not open {}", settings.rig.model);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match commands::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Err(e) = run(&mut session, &settings, command) {
                            println!("error: {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin: {}", e);
                    break;
                }
            },

            event = session.next_event() => match event {
                Some(event) => print_event(&event),
                None => break,
            },
        }
    }

    shutdown(&mut session).await;
    ExitCode::SUCCESS
}

/// Apply one console command to the session
fn run(
    session: &mut SessionManager,
    settings: &Settings,
    command: Command,
) -> Result<(), SessionError> {
    match command {
        Command::Frequency(hz) => {
            session.set_frequency(hz)?;
        }
        Command::TxFrequency(hz) => {
            session.set_tx_frequency(hz)?;
        }
        Command::Mode(mode) => {
            session.set_mode(mode)?;
        }
        Command::Ptt(on) => {
            session.set_ptt(on)?;
        }
        Command::Online => {
            let mut desired = *session.state();
            desired.online = true;
            session.request(desired)?;
        }
        Command::Offline => {
            let mut desired = *session.state();
            desired.online = false;
            session.request(desired)?;
        }
        Command::Open(model) => {
            let mut params = session
                .params()
                .cloned()
                .unwrap_or_else(|| settings.rig.clone());
            if let Some(model) = model {
                params.model = model;
            }
            if !session.open(params) {
                println!("open failed");
            }
        }
        Command::Close => session.close(),
        Command::Sync => session.sync(true)?,
        Command::State => {
            let state = session.state();
            match session.resolution() {
                Some(resolution) => println!("{} ({:?})", state, resolution),
                None => println!("{}", state),
            }
        }
        Command::Models => {
            for model in session.registry().models() {
                let description = session.registry().description(model).unwrap_or_default();
                println!("{:<12} {}", model, description);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Update(update) => println!("#{} {}", update.sequence, update.state),
        SessionEvent::Failure { reason } => println!("rig failed: {}", reason),
        SessionEvent::Finished { sequence } => println!("#{} closed", sequence),
    }
}

/// Close the session and wait for the backend to finish
async fn shutdown(session: &mut SessionManager) {
    if !session.is_open() {
        return;
    }
    session.close();
    let sequence = session.sequence();
    let finished = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        while let Some(event) = session.next_event().await {
            if event == (SessionEvent::Finished { sequence }) {
                return;
            }
        }
    })
    .await;
    if finished.is_err() {
        warn!("Rig did not finish shutting down");
    }
}
