//! # nextbest core library
//!
//! Client-side retrieval and synchronization of "what should I work on next"
//! recommendations from a task backend. Ranking happens on the server; this
//! crate fetches, caches and presents the ranked list, and keeps it consistent
//! with local task status changes.
//!
//! ## Architecture
//!
//! - **API**: HTTP client for the three recommendation modes and the task
//!   mutations they trigger, behind the [`RecommendationSource`] and
//!   [`TaskMutator`] traits
//! - **Cache**: one list per [`CacheKey`], with generation-checked fetches and
//!   two-phase optimistic status patches
//! - **Wizard**: a pure state machine that asks for energy and time, then
//!   fetches matching suggestions
//! - **Feed**: the passive list with mark-done and session-local dismissals
//! - **Week**: weekly suggestions with selection and promotion
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`ApiClient`]: HTTP implementation of both traits
//! - [`RecommendationCache`]: keyed cache with optimistic updates
//! - [`SuggestionWizard`]: async driver for the wizard state machine
//! - [`RecommendationFeed`]: list view binding
//! - [`Config`]: client configuration management

pub mod api;
pub mod cache;
pub mod error;
pub mod feed;
pub mod storage;
pub mod task;
pub mod week;
pub mod wizard;

pub use api::{
    ApiClient, EnergyLevel, NextQuery, RecommendationItem, RecommendationSource, TaskMutator,
    TimeWindow,
};
pub use cache::{CacheKey, CacheMode, PendingMutation, RecommendationCache, Settlement, SharedCache};
pub use error::{ApiError, CacheError, ConfigError, CoreError, ValidationError};
pub use feed::{Notice, NoticeLevel, RecommendationFeed};
pub use storage::Config;
pub use task::{Task, TaskStatus};
pub use week::WeekPlan;
pub use wizard::{
    transition, FetchOutcome, RequestToken, ResultsState, SuggestionWizard, WizardEffect,
    WizardEvent, WizardState, WizardStep,
};
