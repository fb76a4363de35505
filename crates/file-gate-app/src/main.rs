#![warn(missing_docs)]
//! # file-gate binary
//!
//! Terminal shell for the download gate: renders scenes on stdout, reads the
//! password and the download action from stdin, and logs to stderr.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use file_gate_app::{
    AppError, Portal, PortalEvent, app_version, config_from_env, redact_sensitive,
    state_dir_from_env,
};
use file_gate_auth::SubmitOutcome;
use file_gate_core::Scene;
use file_gate_download::HttpProbe;
use file_gate_session::FileStore;
use file_gate_timer::SystemClock;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROGRESS_WIDTH: usize = 20;

/// CLI entry point.
fn main() {
    init_tracing();

    if let Err(error) = run() {
        let message = redact_sensitive(&error.to_string());
        error!(error = %message, "file-gate stopped");
        eprintln!("file-gate: {message}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), AppError> {
    let config = config_from_env()?;
    let store = FileStore::open(state_dir_from_env())?;
    let probe = HttpProbe::new(PROBE_TIMEOUT)?;
    let mut portal = Portal::new(
        config,
        Arc::new(store),
        Arc::new(probe),
        Arc::new(SystemClock),
    )?;

    println!("file-gate {}", app_version());
    portal.load()?;
    render_scene(&portal, portal.scene());

    let input = spawn_stdin_reader();
    let mut input_open = true;

    loop {
        for event in portal.poll() {
            render_event(&portal, &event);
        }

        if input_open {
            match input.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    if !handle_line(&mut portal, line.trim_end_matches(['\r', '\n'])) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => input_open = false,
            }
        } else if portal.next_deadline().is_none() {
            break;
        } else {
            thread::sleep(POLL_INTERVAL);
        }
    }

    portal.unload();
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

/// Returns `false` when the shell should exit.
fn handle_line(portal: &mut Portal, line: &str) -> bool {
    if matches!(line.trim(), "q" | "quit") {
        return false;
    }

    match portal.scene() {
        Scene::Login => match portal.submit(line) {
            SubmitOutcome::Verifying { .. } => println!("Checking..."),
            SubmitOutcome::Ignored => println!("Please wait..."),
        },
        Scene::Waiting => println!("Still waiting: {}", portal.view().timer_text),
        Scene::Download => match portal.click_download() {
            Some(target) => println!("Download: {} (save as {})", target.href, target.filename),
            None => println!("The download is not ready yet."),
        },
        Scene::Busy => render_scene(portal, Scene::Busy),
    }
    true
}

fn render_scene(portal: &Portal, scene: Scene) {
    let view = portal.view();
    match scene {
        Scene::Login => println!("Enter the access password (q to quit):"),
        Scene::Waiting => {}
        Scene::Download => {
            let filename = view.download.filename.as_deref().unwrap_or_default();
            println!("Your file is ready. Press Enter to download {filename}.");
            if let Some(warning) = &view.download_error {
                println!("{warning}");
            }
        }
        Scene::Busy => println!(
            "A download session is already in progress elsewhere. Please try again later."
        ),
    }
}

fn render_event(portal: &Portal, event: &PortalEvent) {
    match event {
        PortalEvent::SceneEntered(scene) => render_scene(portal, *scene),
        PortalEvent::LoginRejected => {
            if let Some(error) = &portal.view().login.error {
                println!("{error}");
            }
        }
        PortalEvent::TimerTick {
            display,
            progress_permille,
        } => {
            let filled = usize::from(*progress_permille) * PROGRESS_WIDTH / 1_000;
            print!(
                "\r{display} [{}{}]",
                "#".repeat(filled),
                "-".repeat(PROGRESS_WIDTH - filled)
            );
            let _ = io::stdout().flush();
        }
        PortalEvent::DownloadPrepared { .. } => println!(),
        PortalEvent::LoginAccepted => {
            println!("Access granted. The download unlocks when the timer reaches 00:00.")
        }
        PortalEvent::LockCleared => println!("Session closed."),
    }
}
