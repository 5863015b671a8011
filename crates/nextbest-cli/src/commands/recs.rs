//! Recommendation fetch commands: passive feed, energy/time filter, week plan.

use clap::Subcommand;
use nextbest_core::{EnergyLevel, NextQuery, RecommendationFeed, RecommendationCache, TimeWindow, WeekPlan};

use super::{client, format_item, print_items};

#[derive(Subcommand)]
pub enum RecsAction {
    /// Show the ranked recommendation feed
    List {
        /// Maximum number of items (default from config)
        #[arg(long)]
        limit: Option<u32>,
        /// Print raw items as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recommendations for your current energy and available time
    Next {
        /// Energy level: low, medium or high
        #[arg(short, long)]
        energy: EnergyLevel,
        /// Available time: minutes ("45"), or "15m", "1h", "4h+"
        #[arg(short, long = "time")]
        time_window: TimeWindow,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Suggested tasks for this week
    Week {
        #[arg(long)]
        limit: Option<u32>,
        /// Move the suggestions into this week
        #[arg(long)]
        promote: bool,
        /// Task id to leave out when promoting (repeatable)
        #[arg(long = "skip", requires = "promote")]
        skip: Vec<String>,
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: RecsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (api, config) = client()?;
    let limits = &config.recommendations;

    match action {
        RecsAction::List { limit, json } => {
            let limit = limit.unwrap_or(limits.list_limit);
            let feed = RecommendationFeed::with_cache(api.clone(), api, RecommendationCache::shared(), limit);
            let items = feed.refresh().await?;
            print_items(&items, json)?;
        }
        RecsAction::Next {
            energy,
            time_window,
            limit,
            json,
        } => {
            let query = NextQuery::new(energy, time_window).with_limit(limit.unwrap_or(limits.next_limit));
            let items = api.get_next_recommendations(&query).await?;
            if !json {
                println!("{} energy, {} available:", energy.label(), time_window.label());
            }
            print_items(&items, json)?;
        }
        RecsAction::Week {
            limit,
            promote,
            skip,
            json,
        } => {
            let mut plan = WeekPlan::fetch(&api, limit.unwrap_or(limits.week_limit)).await?;
            for id in &skip {
                if !plan.set_selected(id, false) {
                    return Err(format!("task {id} is not among this week's suggestions").into());
                }
            }

            if json && !promote {
                print_items(plan.suggestions(), true)?;
                return Ok(());
            }

            for item in plan.suggestions() {
                let mark = if plan.is_selected(&item.task.id) { "x" } else { " " };
                println!("[{mark}] {}", format_item(item));
            }

            if promote {
                let moved = plan.confirm(&api).await?;
                println!("Moved {moved} task(s) into this week.");
            }
        }
    }
    Ok(())
}
