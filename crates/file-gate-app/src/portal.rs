//! The portal: one tab's worth of gate state driven by an injected clock.

use std::sync::Arc;

use file_gate_auth::{LoginFlow, LoginVerdict, SharedSecret, SubmitOutcome};
use file_gate_core::{GateConfig, LockStatus, Scene};
use file_gate_download::{DownloadPreparer, FileProbe, validate_file_url};
use file_gate_session::{KeyValueStore, LockStore, SessionResolution, resolve_session};
use file_gate_timer::{Cadence, Clock, Countdown};
use file_gate_ui::{Presence, SceneController, UiState};
use tracing::{debug, info};

use crate::{AppError, app_version, redact_sensitive};

/// Observable change produced by [`Portal::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalEvent {
    /// A scene finished its entrance.
    SceneEntered(Scene),
    /// The submitted password matched; the wait started.
    LoginAccepted,
    /// The submitted password did not match.
    LoginRejected,
    /// The countdown display changed.
    TimerTick {
        /// `MM:SS` text.
        display: String,
        /// Elapsed share of the wait, in per-mille.
        progress_permille: u16,
    },
    /// The download control was enabled.
    DownloadPrepared {
        /// Suggested save name.
        filename: String,
        /// Whether the probe failed and a warning is shown.
        warning: bool,
    },
    /// The delayed post-download lock clear ran.
    LockCleared,
}

/// What a download click hands to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// File location.
    pub href: String,
    /// Suggested save name.
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    LoginVerdict,
    SceneSettle,
    CountdownTick,
    LockClear,
}

/// Single-threaded gate orchestrator for one tab.
///
/// All deferred work (login verdict, scene settle, countdown ticks, delayed
/// lock clear) is expressed as deadlines against the injected clock and runs
/// in [`Portal::poll`].
pub struct Portal {
    config: GateConfig,
    clock: Arc<dyn Clock>,
    locks: LockStore,
    preparer: DownloadPreparer,
    cadence: Cadence,
    login: LoginFlow,
    scenes: SceneController,
    countdown: Option<Countdown>,
    ui: UiState,
    lock_clear_at: Option<u64>,
    owns_lock: bool,
    loaded: bool,
}

impl Portal {
    /// Builds a portal over a shared store, a file probe and a clock.
    ///
    /// # Errors
    /// Returns [`AppError`] when the configuration is invalid.
    pub fn new(
        config: GateConfig,
        store: Arc<dyn KeyValueStore>,
        probe: Arc<dyn FileProbe>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        validate_file_url(&config.file_url)?;
        let secret = SharedSecret::new(config.secret.clone())?;
        let cadence = Cadence::new(config.tick_interval_ms)?;

        Ok(Self {
            locks: LockStore::new(store, config.lock_key.clone()),
            preparer: DownloadPreparer::new(
                config.file_url.clone(),
                config.default_filename.clone(),
                probe,
            ),
            login: LoginFlow::new(secret, config.login_delay_ms),
            scenes: SceneController::new(Scene::Login, config.transition_ms),
            cadence,
            clock,
            countdown: None,
            ui: UiState::new(app_version()),
            lock_clear_at: None,
            owns_lock: false,
            loaded: false,
            config,
        })
    }

    /// Runs the session resolver and shows the initial scene without a fade.
    ///
    /// # Errors
    /// Returns [`AppError::AlreadyLoaded`] on a second call.
    pub fn load(&mut self) -> Result<SessionResolution, AppError> {
        if self.loaded {
            return Err(AppError::AlreadyLoaded);
        }
        self.loaded = true;

        let now = self.clock.now_ms();
        let resolution = resolve_session(&mut self.locks, now, self.config.stale_threshold_ms());
        self.scenes.reset_to(resolution.scene);
        if resolution.scene == Scene::Login {
            self.ui.login.focus_password = true;
        }

        info!(
            scene = %resolution.scene,
            reason = ?resolution.reason,
            file_url = %redact_sensitive(&self.config.file_url),
            "portal loaded"
        );
        Ok(resolution)
    }

    /// Submits a password from the login form.
    ///
    /// Ignored before [`Self::load`], outside the login scene, or while a flow
    /// is already in flight.
    pub fn submit(&mut self, password: &str) -> SubmitOutcome {
        if !self.loaded || self.scenes.current() != Scene::Login || self.scenes.pending().is_some()
        {
            debug!(scene = %self.scenes.current(), "login submission ignored outside login scene");
            return SubmitOutcome::Ignored;
        }

        let outcome = self.login.submit(password, self.clock.now_ms());
        if matches!(outcome, SubmitOutcome::Verifying { .. }) {
            self.ui.begin_login_attempt();
        }
        outcome
    }

    /// Runs every deferred action due at the clock's current time.
    pub fn poll(&mut self) -> Vec<PortalEvent> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();

        while let Some(due) = self.next_due(now) {
            match due {
                Due::LoginVerdict => self.on_login_verdict(now, &mut events),
                Due::SceneSettle => self.on_scene_settled(now, &mut events),
                Due::CountdownTick => self.on_countdown_tick(now, &mut events),
                Due::LockClear => self.on_lock_clear(&mut events),
            }
        }
        events
    }

    /// Activates the download control.
    ///
    /// Returns `None` while the control is disabled. Otherwise returns what to
    /// download and, while this portal still holds the lock it armed,
    /// schedules the delayed lock clear.
    pub fn click_download(&mut self) -> Option<DownloadTarget> {
        if !self.ui.download.enabled {
            return None;
        }
        let href = self.ui.download.href.clone()?;
        let filename = self.ui.download.filename.clone()?;

        if self.owns_lock && self.lock_clear_at.is_none() {
            let clear_at = self
                .clock
                .now_ms()
                .saturating_add(self.config.download_clear_delay_ms);
            self.lock_clear_at = Some(clear_at);
        }
        info!(%filename, "download started");
        Some(DownloadTarget { href, filename })
    }

    /// Teardown hook; clears the lock this portal armed unless a flow is in
    /// flight.
    pub fn unload(&mut self) {
        if self.login.is_in_flight() || !self.owns_lock {
            return;
        }
        let _ = self.locks.clear_lock();
        self.owns_lock = false;
        self.lock_clear_at = None;
        info!("lock cleared on unload");
    }

    /// Scene that most recently finished its entrance.
    pub fn scene(&self) -> Scene {
        self.scenes.current()
    }

    /// Target of the scene transition in progress.
    pub fn pending_scene(&self) -> Option<Scene> {
        self.scenes.pending()
    }

    /// Visibility of `scene`.
    pub fn presence(&self, scene: Scene) -> Presence {
        self.scenes.presence(scene)
    }

    /// UI state snapshot.
    pub fn view(&self) -> &UiState {
        &self.ui
    }

    /// Whether a countdown is running in this portal.
    pub fn countdown_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// Whether the lock store fell back to memory-only coordination.
    pub fn lock_is_degraded(&self) -> bool {
        self.locks.is_degraded()
    }

    /// Earliest pending deadline, for shells that sleep between polls.
    pub fn next_deadline(&self) -> Option<u64> {
        self.deadlines().into_iter().filter_map(|(at, _)| at).min()
    }

    /// Active configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    fn deadlines(&self) -> [(Option<u64>, Due); 4] {
        [
            (self.login.resolves_at(), Due::LoginVerdict),
            (self.scenes.settles_at(), Due::SceneSettle),
            (
                self.countdown.as_ref().and_then(Countdown::next_tick_at),
                Due::CountdownTick,
            ),
            (self.lock_clear_at, Due::LockClear),
        ]
    }

    fn next_due(&self, now: u64) -> Option<Due> {
        self.deadlines()
            .into_iter()
            .filter_map(|(at, due)| at.filter(|at| *at <= now).map(|at| (at, due)))
            .min_by_key(|(at, _)| *at)
            .map(|(_, due)| due)
    }

    fn on_login_verdict(&mut self, now: u64, events: &mut Vec<PortalEvent>) {
        match self.login.poll(now) {
            Some(LoginVerdict::Accepted) => {
                info!("login accepted; wait started");
                let _ = self.locks.set_lock(LockStatus::Waiting, now);
                self.owns_lock = true;
                self.scenes.show_scene(Scene::Waiting, now);

                let (countdown, first) =
                    Countdown::start(self.config.wait_duration_ms, self.cadence, now);
                self.countdown = Some(countdown);
                self.ui.update_timer(first.display.clone(), first.progress_permille);

                events.push(PortalEvent::LoginAccepted);
                events.push(PortalEvent::TimerTick {
                    display: first.display,
                    progress_permille: first.progress_permille,
                });
            }
            Some(LoginVerdict::Rejected) => {
                info!("login rejected");
                self.ui.reject_login();
                events.push(PortalEvent::LoginRejected);
            }
            None => {}
        }
    }

    fn on_scene_settled(&mut self, now: u64, events: &mut Vec<PortalEvent>) {
        if let Some(scene) = self.scenes.poll(now) {
            if scene != Scene::Waiting {
                self.countdown = None;
            }
            events.push(PortalEvent::SceneEntered(scene));
        }
    }

    fn on_countdown_tick(&mut self, now: u64, events: &mut Vec<PortalEvent>) {
        let Some(report) = self.countdown.as_mut().and_then(|countdown| countdown.tick(now)) else {
            return;
        };

        self.ui.update_timer(report.display.clone(), report.progress_permille);
        events.push(PortalEvent::TimerTick {
            display: report.display,
            progress_permille: report.progress_permille,
        });

        if report.completed {
            self.countdown = None;
            info!("countdown complete; preparing download");

            let prepared = self.preparer.prepare(&mut self.locks, now);
            self.owns_lock = true;
            events.push(PortalEvent::DownloadPrepared {
                filename: prepared.filename.clone(),
                warning: prepared.warning.is_some(),
            });
            self.ui
                .enable_download(prepared.href, prepared.filename, prepared.warning);

            self.scenes.show_scene(Scene::Download, now);
            self.login.release();
        }
    }

    fn on_lock_clear(&mut self, events: &mut Vec<PortalEvent>) {
        self.lock_clear_at = None;
        let _ = self.locks.clear_lock();
        self.owns_lock = false;
        events.push(PortalEvent::LockCleared);
    }
}
