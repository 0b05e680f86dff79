//! Presentation state for the student record screen
//!
//! Every time the screen gains focus it calls [`StudentView::activate`].
//! Activations may overlap (the user switches away and back while a fetch is
//! in flight); each one takes a ticket from a monotonic counter and only the
//! holder of the newest ticket may commit its result. Older results are
//! dropped so a slow fetch for a previous user never overwrites a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::resolver::{Resolution, SessionResolver};
use crate::student::StudentRecord;

/// What the screen currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// An activation is in flight
    pub loading: bool,
    /// Message for the user, set for every terminal state except ready
    pub error: Option<String>,
    /// Terminal state of the last committed activation
    pub resolution: Option<Resolution>,
}

impl ViewState {
    /// The record on display, if any.
    pub fn record(&self) -> Option<&StudentRecord> {
        self.resolution.as_ref().and_then(Resolution::record)
    }
}

/// Result of one [`StudentView::activate`] call.
#[derive(Debug, Clone)]
pub struct Activation {
    /// Ticket this activation ran under
    pub ticket: u64,
    /// What this activation resolved to
    pub resolution: Resolution,
    /// Whether it was committed to the view state
    pub applied: bool,
}

/// Student record screen state driven by a [`SessionResolver`].
pub struct StudentView {
    resolver: Arc<SessionResolver>,
    sequence: AtomicU64,
    state: Mutex<ViewState>,
}

impl StudentView {
    /// Creates an idle view.
    pub fn new(resolver: Arc<SessionResolver>) -> Self {
        Self {
            resolver,
            sequence: AtomicU64::new(0),
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Runs one activation and commits it if no newer one has started.
    pub async fn activate(&self) -> Activation {
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.lock_state();
            state.loading = true;
            state.error = None;
        }

        let resolution = self.resolver.resolve().await;

        let applied = {
            let mut state = self.lock_state();
            if self.sequence.load(Ordering::SeqCst) == ticket {
                state.loading = false;
                state.error = resolution.message().map(str::to_string);
                state.resolution = Some(resolution.clone());
                true
            } else {
                false
            }
        };

        if applied {
            tracing::debug!(ticket, state = resolution.reason_code(), "Activation committed");
        } else {
            tracing::debug!(ticket, "Discarding stale activation");
        }

        Activation {
            ticket,
            resolution,
            applied,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
