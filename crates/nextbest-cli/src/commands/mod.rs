pub mod completions;
pub mod config;
pub mod recs;
pub mod suggest;
pub mod task;

use nextbest_core::{ApiClient, Config, RecommendationItem};

/// Load the user config and build a client for its base URL.
pub fn client() -> Result<(ApiClient, Config), Box<dyn std::error::Error>> {
    Ok(ApiClient::from_user_config()?)
}

/// Print items as a numbered list, or as JSON.
pub fn print_items(items: &[RecommendationItem], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No recommendations right now.");
        return Ok(());
    }

    for (i, item) in items.iter().enumerate() {
        println!("{:>2}. {}", i + 1, format_item(item));
    }
    Ok(())
}

/// One-line summary of a recommendation.
pub fn format_item(item: &RecommendationItem) -> String {
    let task = &item.task;
    let mut line = format!("{} [{}] ({})", task.title, task.id, task.status);
    if let Some(minutes) = task.effort_minutes {
        line.push_str(&format!(" ~{minutes}m"));
    }
    if let Some(due) = task.next_due() {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
    }
    if !item.why.is_empty() {
        line.push_str(&format!(" - {}", item.why));
    }
    line
}
