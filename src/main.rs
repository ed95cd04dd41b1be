//! Command-line entry point
//!
//! Starts one interview session, prints its progress, and cancels it on
//! Ctrl-C. Exits on its own when the session's channel closes.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;

use interview_session::channel::ChannelPayload;
use interview_session::session::ControllerOptions;
use interview_session::{
    ClientSettings, HttpSessionService, SessionConfig, SessionController, SessionError, SessionEvent,
    SessionPhase, WebSocketChannel,
};

#[derive(Parser, Debug)]
#[command(name = "interview-session", version, about = "Run a remote interview session")]
struct Args {
    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interview service root, overrides the settings file
    #[arg(long)]
    base_url: Option<String>,

    /// Agent identifier on the interview service
    #[arg(long, default_value = "")]
    agent_id: String,

    /// API key for the interview service
    #[arg(long, env = "INTERVIEW_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// File containing the candidate's resume
    #[arg(long)]
    resume_file: Option<PathBuf>,

    /// File containing the job description
    #[arg(long)]
    job_description_file: Option<PathBuf>,
}

fn load_settings(args: &Args) -> Result<ClientSettings> {
    let mut settings = match &args.config {
        Some(path) => ClientSettings::load(path)?,
        None => ClientSettings::default(),
    };
    settings.apply_env()?;
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    settings.validate()?;
    Ok(settings)
}

/// Missing files read as empty so validation names the field
fn read_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display())),
        None => Ok(String::new()),
    }
}

/// Status text for an event, worded like the web front end
fn status_line(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::PhaseChanged { old_phase, new_phase } => match (old_phase, new_phase) {
            (_, SessionPhase::Starting) => Some("Starting interview...".to_string()),
            (_, SessionPhase::Active) => Some("Interview started successfully".to_string()),
            (_, SessionPhase::Canceling) => Some("Canceling interview...".to_string()),
            (SessionPhase::Canceling, SessionPhase::Idle) => Some("Interview canceled".to_string()),
            _ => None,
        },
        SessionEvent::Error {
            error: SessionError::Validation { missing },
        } => Some(format!("Please fill in all fields (missing: {})", missing.join(", "))),
        SessionEvent::Error { error } => Some(format!("Error: {}", error)),
        SessionEvent::ChannelOpened { .. } => Some("Connected".to_string()),
        SessionEvent::ChannelMessage { payload, .. } => Some(match payload {
            ChannelPayload::Text(text) => text.clone(),
            ChannelPayload::Binary(data) => format!("<{} bytes>", data.len()),
        }),
        SessionEvent::ChannelClosed { code, reason, .. } if reason.is_empty() => {
            Some(format!("Connection closed ({})", code))
        }
        SessionEvent::ChannelClosed { code, reason, .. } => Some(format!("Connection closed ({}: {})", code, reason)),
    }
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!("Session event: {}", event.event_name());
                if let Some(line) = status_line(&event) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("Status printer skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Start the session, cancelling it if `interrupt` fires while the creation
/// request is still outstanding
async fn start_or_cancel(
    controller: &SessionController,
    config: SessionConfig,
    interrupt: impl Future<Output = ()>,
) -> Result<(), SessionError> {
    let start = controller.start_session(config);
    tokio::pin!(start);
    tokio::select! {
        result = &mut start => result,
        _ = interrupt => {
            info!("Interrupted while starting, cancelling");
            // Keep driving the start so it observes the cancel and unwinds
            let (_, result) = tokio::join!(controller.shutdown(), &mut start);
            result
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Resolves when the live session's channel closes
async fn channel_closed(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::ChannelClosed { .. }) | Err(broadcast::error::RecvError::Closed) => return,
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = load_settings(&args)?;
    let config = SessionConfig::new(
        args.agent_id.clone(),
        args.api_key.clone(),
        read_text(args.resume_file.as_deref())?,
        read_text(args.job_description_file.as_deref())?,
    );

    let service = HttpSessionService::with_timeouts(
        &settings.base_url,
        settings.request_timeout_ms,
        settings.connect_timeout_ms,
    )?;
    let (channel, channel_events) =
        WebSocketChannel::new(&settings.resolved_channel_url()?, settings.connect_timeout_ms)?;
    let controller = Arc::new(SessionController::with_options(
        Arc::new(service),
        Arc::new(channel),
        ControllerOptions::from(&settings),
    ));

    let pump = controller.spawn_channel_pump(channel_events);
    let printer = tokio::spawn(print_events(controller.subscribe()));
    let closed = channel_closed(controller.subscribe());

    match start_or_cancel(&controller, config, ctrl_c()).await {
        Ok(()) => {}
        Err(SessionError::Cancelled) => {
            tokio::task::yield_now().await;
            pump.abort();
            printer.abort();
            return Ok(());
        }
        Err(e) => {
            error!("Interview did not start: {}", e);
            tokio::task::yield_now().await;
            pump.abort();
            printer.abort();
            return Err(e).context("starting interview");
        }
    }

    tokio::select! {
        _ = ctrl_c() => {
            controller.shutdown().await;
        }
        _ = closed => {
            debug!("Channel closed, leaving");
            controller.shutdown().await;
        }
    }

    // Let the printer flush what the shutdown produced
    tokio::task::yield_now().await;
    pump.abort();
    printer.abort();
    Ok(())
}
