//! Task status commands.

use clap::Subcommand;
use nextbest_core::{NoticeLevel, RecommendationFeed, Settlement, TaskStatus};

use super::client;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Mark a task as done
    Done {
        /// Task ID
        id: String,
    },
    /// Move a task to another status
    Status {
        /// Task ID
        id: String,
        /// inbox, backlog, week, today, todo, doing, waiting or done
        status: TaskStatus,
    },
}

pub async fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let (api, _) = client()?;
    let feed = RecommendationFeed::new(api.clone(), api);

    let settlement = match action {
        TaskAction::Done { id } => feed.mark_done(&id).await?,
        TaskAction::Status { id, status } => feed.set_status(&id, status).await?,
    };

    let mut failure = None;
    for notice in feed.take_notices() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Error => failure = Some(notice.message),
        }
    }

    match (settlement, failure) {
        (Settlement::Committed, _) => Ok(()),
        (Settlement::RolledBack, Some(message)) => Err(message.into()),
        (Settlement::RolledBack, None) => Err("status change was rolled back".into()),
    }
}
