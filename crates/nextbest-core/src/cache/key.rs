//! Cache keys: fetch mode plus its parameters, compared by value.

use crate::api::{EnergyLevel, NextQuery, TimeWindow};

/// Which endpoint/mode a cached list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheMode {
    Passive,
    Next,
    SuggestWeek,
}

/// Identifies one cached recommendation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Passive {
        limit: u32,
    },
    Next {
        energy: EnergyLevel,
        time_window: TimeWindow,
        limit: u32,
    },
    SuggestWeek {
        limit: u32,
    },
}

impl CacheKey {
    pub fn passive(limit: u32) -> Self {
        CacheKey::Passive { limit }
    }

    pub fn next(query: &NextQuery) -> Self {
        CacheKey::Next {
            energy: query.energy,
            time_window: query.time_window,
            limit: query.limit,
        }
    }

    pub fn suggest_week(limit: u32) -> Self {
        CacheKey::SuggestWeek { limit }
    }

    pub fn mode(&self) -> CacheMode {
        match self {
            CacheKey::Passive { .. } => CacheMode::Passive,
            CacheKey::Next { .. } => CacheMode::Next,
            CacheKey::SuggestWeek { .. } => CacheMode::SuggestWeek,
        }
    }

    pub fn limit(&self) -> u32 {
        match self {
            CacheKey::Passive { limit }
            | CacheKey::Next { limit, .. }
            | CacheKey::SuggestWeek { limit } => *limit,
        }
    }
}
