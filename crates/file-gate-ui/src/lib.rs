#![warn(missing_docs)]
//! # file-gate-ui
//!
//! ## Purpose
//! Defines the UI-facing runtime state model for `file-gate`.
//!
//! ## Responsibilities
//! - Switch between the four scenes with a fade-out-then-fade-in sequence
//!   ([`SceneController`]).
//! - Hold the state of the login form, timer display, progress indicator,
//!   download control and error slots ([`UiState`]).
//!
//! ## Data flow
//! Portal events mutate [`UiState`] and request scene changes; the shell
//! renders from [`SceneController::presence`] and the [`UiState`] snapshot.
//!
//! ## Ownership and lifetimes
//! `UiState` owns all strings so it can be cloned into a render snapshot
//! without borrowing from the portal.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Scene requests
//! are always accepted; redundant requests are no-ops.
//!
//! ## Security and privacy notes
//! UI state never holds the shared secret or a submitted password.

use file_gate_core::Scene;
use tracing::debug;

/// Message shown when a submitted password does not match.
pub const LOGIN_ERROR_MESSAGE: &str = "Invalid password. Please try again.";

/// Visibility of one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Not displayed.
    Hidden,
    /// Fading out; still displayed but transparent.
    Leaving,
    /// Fully displayed.
    Shown,
}

/// Effect of a [`SceneController::show_scene`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Target is already current (or already pending); nothing changed.
    Unchanged,
    /// Current scene started fading out towards the target.
    Started,
    /// An in-progress transition now ends on a different target.
    Retargeted,
    /// The pending transition was dropped; the current scene stays.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    target: Scene,
    settles_at_ms: u64,
}

/// Finite-state switcher among the four scenes.
///
/// `current` only changes once a transition has settled, so callers querying
/// mid-transition still see the outgoing scene.
#[derive(Debug, Clone)]
pub struct SceneController {
    current: Scene,
    transition: Option<Transition>,
    transition_ms: u64,
}

impl SceneController {
    /// Creates a controller with `initial` already fully shown.
    pub fn new(initial: Scene, transition_ms: u64) -> Self {
        Self {
            current: initial,
            transition: None,
            transition_ms,
        }
    }

    /// Shows `scene` immediately, dropping any transition.
    pub fn reset_to(&mut self, scene: Scene) {
        self.current = scene;
        self.transition = None;
    }

    /// Scene that most recently finished its entrance.
    pub fn current(&self) -> Scene {
        self.current
    }

    /// Target of the transition in progress, if any.
    pub fn pending(&self) -> Option<Scene> {
        self.transition.map(|transition| transition.target)
    }

    /// Instant the transition in progress settles.
    pub fn settles_at(&self) -> Option<u64> {
        self.transition.map(|transition| transition.settles_at_ms)
    }

    /// Requests a switch to `target`.
    pub fn show_scene(&mut self, target: Scene, now_ms: u64) -> ShowOutcome {
        match self.transition {
            None if target == self.current => ShowOutcome::Unchanged,
            None => {
                debug!(from = %self.current, to = %target, "scene transition started");
                self.transition = Some(Transition {
                    target,
                    settles_at_ms: now_ms.saturating_add(self.transition_ms),
                });
                ShowOutcome::Started
            }
            Some(transition) if transition.target == target => ShowOutcome::Unchanged,
            Some(_) if target == self.current => {
                self.transition = None;
                ShowOutcome::Cancelled
            }
            Some(transition) => {
                self.transition = Some(Transition {
                    target,
                    settles_at_ms: transition.settles_at_ms,
                });
                ShowOutcome::Retargeted
            }
        }
    }

    /// Finishes the transition if it has settled at `now_ms`.
    ///
    /// Returns the newly current scene.
    pub fn poll(&mut self, now_ms: u64) -> Option<Scene> {
        let transition = self.transition?;
        if now_ms < transition.settles_at_ms {
            return None;
        }
        self.transition = None;
        self.current = transition.target;
        debug!(scene = %self.current, "scene transition settled");
        Some(self.current)
    }

    /// Visibility of `scene` right now.
    pub fn presence(&self, scene: Scene) -> Presence {
        if scene != self.current {
            return Presence::Hidden;
        }
        if self.transition.is_some() {
            Presence::Leaving
        } else {
            Presence::Shown
        }
    }
}

/// Password form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Whether the submit control accepts clicks.
    pub submit_enabled: bool,
    /// Inline error text; `None` hides the slot.
    pub error: Option<String>,
    /// Set when the password input must be emptied.
    pub input_cleared: bool,
    /// Set when focus should move to the password input.
    pub focus_password: bool,
}

/// Download control state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadControl {
    /// Whether clicking starts a download.
    pub enabled: bool,
    /// Target location once prepared.
    pub href: Option<String>,
    /// Suggested filename once prepared.
    pub filename: Option<String>,
    /// Rendered with the warning style.
    pub warning_style: bool,
}

/// Aggregate UI runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Password form.
    pub login: LoginForm,
    /// `MM:SS` countdown text.
    pub timer_text: String,
    /// Elapsed share of the wait, in per-mille.
    pub progress_permille: u16,
    /// Download control.
    pub download: DownloadControl,
    /// Non-blocking warning below the download control.
    pub download_error: Option<String>,
}

impl UiState {
    /// Creates default UI state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            login: LoginForm {
                submit_enabled: true,
                error: None,
                input_cleared: false,
                focus_password: false,
            },
            timer_text: "00:00".to_string(),
            progress_permille: 0,
            download: DownloadControl {
                enabled: false,
                href: None,
                filename: None,
                warning_style: false,
            },
            download_error: None,
        }
    }

    /// Hides the error slot and disables the submit control.
    pub fn begin_login_attempt(&mut self) {
        self.login.error = None;
        self.login.submit_enabled = false;
        self.login.input_cleared = false;
        self.login.focus_password = false;
    }

    /// Shows the mismatch error, clears the input and re-enables the form.
    pub fn reject_login(&mut self) {
        self.login.error = Some(LOGIN_ERROR_MESSAGE.to_string());
        self.login.input_cleared = true;
        self.login.focus_password = true;
        self.login.submit_enabled = true;
    }

    /// Records a countdown update.
    pub fn update_timer(&mut self, display: impl Into<String>, progress_permille: u16) {
        self.timer_text = display.into();
        self.progress_permille = progress_permille.min(1_000);
    }

    /// Enables the download control; a warning keeps it usable but styled.
    pub fn enable_download(
        &mut self,
        href: impl Into<String>,
        filename: impl Into<String>,
        warning: Option<String>,
    ) {
        self.download.enabled = true;
        self.download.href = Some(href.into());
        self.download.filename = Some(filename.into());
        self.download.warning_style = warning.is_some();
        self.download_error = warning;
    }
}
