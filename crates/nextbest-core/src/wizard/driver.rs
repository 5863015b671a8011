//! Async driver: feeds events into [`transition`] and runs the fetch effects.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{transition, RequestToken, WizardEffect, WizardEvent, WizardState};
use crate::api::{EnergyLevel, NextQuery, RecommendationSource, TimeWindow, DEFAULT_NEXT_LIMIT};

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The wizard now shows this fetch's result or error.
    Applied,
    /// A newer fetch, a back step or a close got there first.
    Superseded,
}

/// One wizard instance bound to a recommendation source.
///
/// Methods take `&self` so a retry can be issued while an earlier fetch is
/// still awaiting; the state lock is only held between awaits.
pub struct SuggestionWizard<S> {
    source: S,
    state: Mutex<WizardState>,
}

impl<S: RecommendationSource> SuggestionWizard<S> {
    pub fn new(source: S) -> Self {
        Self::with_limit(source, DEFAULT_NEXT_LIMIT)
    }

    pub fn with_limit(source: S, limit: u32) -> Self {
        Self {
            source,
            state: Mutex::new(WizardState::new(limit)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WizardState {
        self.lock().clone()
    }

    /// Apply one event and return its effect without running it.
    pub fn dispatch(&self, event: WizardEvent) -> Option<WizardEffect> {
        let mut state = self.lock();
        let (next, effect) = transition(std::mem::take(&mut *state), event);
        *state = next;
        effect
    }

    /// Execute a fetch and report its completion back to the state machine.
    pub async fn run_fetch(&self, token: RequestToken, query: NextQuery) -> FetchOutcome {
        let result = self.source.get_next_recommendations(&query).await;

        let mut state = self.lock();
        let current = state.in_flight() == Some(token);
        let event = match result {
            Ok(items) => WizardEvent::FetchSucceeded { token, items },
            Err(e) => {
                if current {
                    tracing::warn!(token = token.value(), error = %e, "suggestion fetch failed");
                }
                WizardEvent::FetchFailed {
                    token,
                    message: e.to_string(),
                }
            }
        };
        let (next, _) = transition(std::mem::take(&mut *state), event);
        *state = next;

        if current {
            FetchOutcome::Applied
        } else {
            tracing::debug!(token = token.value(), "dropping superseded suggestion fetch");
            FetchOutcome::Superseded
        }
    }

    pub fn open(&self) {
        self.dispatch(WizardEvent::Open);
    }

    pub fn close(&self) {
        self.dispatch(WizardEvent::Close);
    }

    pub fn back(&self) {
        self.dispatch(WizardEvent::Back);
    }

    pub fn select_energy(&self, energy: EnergyLevel) {
        self.dispatch(WizardEvent::SelectEnergy(energy));
    }

    /// Choose a time window and run the fetch it triggers.
    ///
    /// Returns `None` when the wizard was not waiting for a time window.
    pub async fn select_time_window(&self, window: TimeWindow) -> Option<FetchOutcome> {
        let effect = self.dispatch(WizardEvent::SelectTimeWindow(window));
        self.run(effect).await
    }

    /// Refetch with the stored inputs after an error, or to supersede a slow fetch.
    pub async fn retry(&self) -> Option<FetchOutcome> {
        let effect = self.dispatch(WizardEvent::Retry);
        self.run(effect).await
    }

    /// Pick a listed task. Returns its id and closes the wizard.
    pub fn select_item(&self, task_id: &str) -> Option<String> {
        match self.dispatch(WizardEvent::SelectItem(task_id.to_string())) {
            Some(WizardEffect::TaskChosen(id)) => Some(id),
            _ => None,
        }
    }

    async fn run(&self, effect: Option<WizardEffect>) -> Option<FetchOutcome> {
        match effect {
            Some(WizardEffect::Fetch { token, query }) => Some(self.run_fetch(token, query).await),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WizardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
