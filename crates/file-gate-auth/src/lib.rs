#![warn(missing_docs)]
//! # file-gate-auth
//!
//! ## Purpose
//! Implements the shared-secret check and the single-flight login flow.
//!
//! ## Responsibilities
//! - Hold the configured secret and compare submissions by exact match.
//! - Model the login lifecycle as an explicit state machine with an
//!   artificial verification delay.
//! - Reject re-entrant submissions while a flow is in flight.
//!
//! ## Data flow
//! UI collects a password -> [`LoginFlow::submit`] arms a verdict deadline ->
//! the portal calls [`LoginFlow::poll`] once the deadline passes -> an
//! accepted flow stays in flight until [`LoginFlow::release`].
//!
//! ## Ownership and lifetimes
//! The pending candidate is owned by the flow only until its verdict and is
//! dropped immediately afterwards.
//!
//! ## Error model
//! Construction rejects an empty secret with [`AuthError`]. A wrong password
//! is a normal [`LoginVerdict::Rejected`] outcome, not an error.
//!
//! ## Security and privacy notes
//! This is a deterrent, not an access-control boundary: the secret is fixed
//! configuration and nothing is verified server-side. Neither the secret nor
//! submitted candidates are logged.
//!
//! ## Example
//! ```rust
//! use file_gate_auth::{LoginFlow, LoginVerdict, SharedSecret, SubmitOutcome};
//!
//! let secret = SharedSecret::new("access2024").unwrap();
//! let mut flow = LoginFlow::new(secret, 500);
//! assert_eq!(flow.submit("access2024", 0), SubmitOutcome::Verifying { resolves_at_ms: 500 });
//! assert_eq!(flow.poll(499), None);
//! assert_eq!(flow.poll(500), Some(LoginVerdict::Accepted));
//! ```

use std::fmt;

use thiserror::Error;
use tracing::debug;

/// Shared secret guarding the download.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wraps a non-empty secret.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptySecret`] when `secret` is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        Ok(Self(secret))
    }

    /// Returns `true` when the trimmed candidate equals the secret exactly.
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.trim() == self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Result of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A flow is already in flight; the submission was dropped.
    Ignored,
    /// The candidate will be checked at `resolves_at_ms`.
    Verifying {
        /// Instant the verdict becomes available.
        resolves_at_ms: u64,
    },
}

/// Verdict produced once the verification delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginVerdict {
    /// Candidate matched; the flow stays in flight.
    Accepted,
    /// Candidate did not match; the guard is released.
    Rejected,
}

/// Login lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Ready for a submission.
    Idle,
    /// Waiting out the artificial delay.
    Verifying {
        /// Instant the verdict becomes available.
        resolves_at_ms: u64,
    },
    /// Accepted and still running the gated flow.
    Accepted,
}

/// Single-flight login state machine.
#[derive(Clone)]
pub struct LoginFlow {
    secret: SharedSecret,
    delay_ms: u64,
    state: LoginState,
    candidate: Option<String>,
}

impl LoginFlow {
    /// Creates an idle flow that answers `delay_ms` after each submission.
    pub fn new(secret: SharedSecret, delay_ms: u64) -> Self {
        Self {
            secret,
            delay_ms,
            state: LoginState::Idle,
            candidate: None,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Returns `true` from submission until rejection or [`Self::release`].
    pub fn is_in_flight(&self) -> bool {
        self.state != LoginState::Idle
    }

    /// Instant the pending verdict is due, if any.
    pub fn resolves_at(&self) -> Option<u64> {
        match self.state {
            LoginState::Verifying { resolves_at_ms } => Some(resolves_at_ms),
            _ => None,
        }
    }

    /// Accepts a candidate unless a flow is already in flight.
    pub fn submit(&mut self, candidate: &str, now_ms: u64) -> SubmitOutcome {
        if self.is_in_flight() {
            debug!("login submission ignored; flow already in flight");
            return SubmitOutcome::Ignored;
        }

        let resolves_at_ms = now_ms.saturating_add(self.delay_ms);
        self.candidate = Some(candidate.to_string());
        self.state = LoginState::Verifying { resolves_at_ms };
        SubmitOutcome::Verifying { resolves_at_ms }
    }

    /// Produces the verdict once the delay has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<LoginVerdict> {
        let resolves_at_ms = self.resolves_at()?;
        if now_ms < resolves_at_ms {
            return None;
        }

        let candidate = self.candidate.take().unwrap_or_default();
        if self.secret.matches(&candidate) {
            self.state = LoginState::Accepted;
            Some(LoginVerdict::Accepted)
        } else {
            self.state = LoginState::Idle;
            Some(LoginVerdict::Rejected)
        }
    }

    /// Ends an accepted flow so a new submission is possible.
    pub fn release(&mut self) {
        self.candidate = None;
        self.state = LoginState::Idle;
    }
}

impl fmt::Debug for LoginFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginFlow")
            .field("delay_ms", &self.delay_ms)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Errors produced by auth configuration.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Secret must be non-empty.
    #[error("shared secret must be non-empty")]
    EmptySecret,
}
