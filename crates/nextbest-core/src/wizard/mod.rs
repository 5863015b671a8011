//! "Suggest a task" wizard.
//!
//! A pure state machine: [`transition`] maps `(state, event)` to a new state
//! and at most one [`WizardEffect`] for the caller to run. Nothing here does
//! I/O; [`SuggestionWizard`] is the async driver that executes effects.
//!
//! ## Steps
//!
//! ```text
//! (closed) --Open--> CollectingEnergy --SelectEnergy--> CollectingTime
//!                          ^                 <--Back--      |
//!                          |                           SelectTimeWindow
//!                          |                                v
//!                          +--Close/Open (full reset)-- ShowingResults
//!                                                      Idle | Loading | Error | Loaded
//! ```
//!
//! Every fetch carries a fresh [`RequestToken`]. A completion is applied only
//! if its token is the one currently in flight; anything else was superseded
//! by a retry, a back step or a close, and is dropped.

mod driver;

pub use driver::{FetchOutcome, SuggestionWizard};

use serde::Serialize;

use crate::api::{EnergyLevel, NextQuery, RecommendationItem, TimeWindow, DEFAULT_NEXT_LIMIT};

/// Which question the wizard is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    CollectingEnergy,
    CollectingTime,
    ShowingResults,
}

/// Sub-state of the results step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ResultsState {
    Idle,
    Loading,
    /// Fetch failed; holds the message to show next to the retry button.
    Error(String),
    /// Possibly empty; empty renders the "no suggestions" state.
    Loaded(Vec<RecommendationItem>),
}

/// Identifies one fetch issued by one wizard instance. Strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// User actions and fetch completions.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    Open,
    Close,
    SelectEnergy(EnergyLevel),
    SelectTimeWindow(TimeWindow),
    Back,
    Retry,
    FetchSucceeded {
        token: RequestToken,
        items: Vec<RecommendationItem>,
    },
    FetchFailed {
        token: RequestToken,
        message: String,
    },
    SelectItem(String),
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEffect {
    /// Run `query` and report back with `token`.
    Fetch { token: RequestToken, query: NextQuery },
    /// The user picked this task; the wizard has closed itself.
    TaskChosen(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardState {
    open: bool,
    step: WizardStep,
    energy: Option<EnergyLevel>,
    time_window: Option<TimeWindow>,
    results: ResultsState,
    in_flight: Option<RequestToken>,
    /// Last token handed out; survives resets so old completions never match.
    last_token: u64,
    limit: u32,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(DEFAULT_NEXT_LIMIT)
    }
}

impl WizardState {
    /// A closed wizard whose fetches ask for `limit` items.
    pub fn new(limit: u32) -> Self {
        Self {
            open: false,
            step: WizardStep::CollectingEnergy,
            energy: None,
            time_window: None,
            results: ResultsState::Idle,
            in_flight: None,
            last_token: 0,
            limit,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn energy(&self) -> Option<EnergyLevel> {
        self.energy
    }

    pub fn time_window(&self) -> Option<TimeWindow> {
        self.time_window
    }

    pub fn results(&self) -> &ResultsState {
        &self.results
    }

    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.results, ResultsState::Loading)
    }

    /// Loaded items, if the results step finished successfully.
    pub fn items(&self) -> Option<&[RecommendationItem]> {
        match &self.results {
            ResultsState::Loaded(items) => Some(items),
            _ => None,
        }
    }

    /// Loaded with nothing to show.
    pub fn is_empty_result(&self) -> bool {
        self.items().is_some_and(|items| items.is_empty())
    }

    /// Same inputs and results as a freshly opened wizard.
    pub fn is_pristine(&self) -> bool {
        self.step == WizardStep::CollectingEnergy
            && self.energy.is_none()
            && self.time_window.is_none()
            && self.results == ResultsState::Idle
            && self.in_flight.is_none()
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn reset(&mut self, open: bool) {
        self.open = open;
        self.step = WizardStep::CollectingEnergy;
        self.energy = None;
        self.time_window = None;
        self.results = ResultsState::Idle;
        self.in_flight = None;
    }

    /// Issue a new token and enter Loading for the stored inputs.
    fn start_fetch(&mut self) -> Option<WizardEffect> {
        let (energy, time_window) = (self.energy?, self.time_window?);
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        self.in_flight = Some(token);
        self.results = ResultsState::Loading;
        Some(WizardEffect::Fetch {
            token,
            query: NextQuery::new(energy, time_window).with_limit(self.limit),
        })
    }

    fn is_current(&self, token: RequestToken) -> bool {
        self.step == WizardStep::ShowingResults && self.in_flight == Some(token)
    }
}

/// Apply `event` to `state`.
///
/// Events that make no sense in the current step leave the state unchanged.
pub fn transition(mut state: WizardState, event: WizardEvent) -> (WizardState, Option<WizardEffect>) {
    if !state.open && event != WizardEvent::Open {
        return (state, None);
    }

    let effect = match (state.step, event) {
        (_, WizardEvent::Open) => {
            state.reset(true);
            None
        }
        (_, WizardEvent::Close) => {
            state.reset(false);
            None
        }

        (WizardStep::CollectingEnergy, WizardEvent::SelectEnergy(energy)) => {
            state.energy = Some(energy);
            state.step = WizardStep::CollectingTime;
            None
        }

        (WizardStep::CollectingTime, WizardEvent::SelectTimeWindow(window)) => {
            state.time_window = Some(window);
            state.step = WizardStep::ShowingResults;
            state.start_fetch()
        }
        (WizardStep::CollectingTime, WizardEvent::Back) => {
            state.energy = None;
            state.step = WizardStep::CollectingEnergy;
            None
        }

        (WizardStep::ShowingResults, WizardEvent::Retry)
            if matches!(state.results, ResultsState::Loading | ResultsState::Error(_)) =>
        {
            state.start_fetch()
        }
        (WizardStep::ShowingResults, WizardEvent::Back) => {
            state.time_window = None;
            state.results = ResultsState::Idle;
            state.in_flight = None;
            state.step = WizardStep::CollectingTime;
            None
        }
        (WizardStep::ShowingResults, WizardEvent::FetchSucceeded { token, items }) => {
            if state.is_current(token) {
                state.in_flight = None;
                state.results = ResultsState::Loaded(items);
            }
            None
        }
        (WizardStep::ShowingResults, WizardEvent::FetchFailed { token, message }) => {
            if state.is_current(token) {
                state.in_flight = None;
                state.results = ResultsState::Error(message);
            }
            None
        }
        (WizardStep::ShowingResults, WizardEvent::SelectItem(task_id)) => {
            let listed = state
                .items()
                .is_some_and(|items| items.iter().any(|item| item.task.id == task_id));
            if listed {
                state.reset(false);
                Some(WizardEffect::TaskChosen(task_id))
            } else {
                None
            }
        }

        _ => None,
    };

    (state, effect)
}
