//! Interactive "suggest a task" wizard on the terminal.

use std::io::{self, BufRead, Write};

use clap::Args;
use nextbest_core::{ApiClient, EnergyLevel, ResultsState, SuggestionWizard, TimeWindow, WizardStep};

use super::{client, format_item};

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Skip the energy question
    #[arg(short, long)]
    pub energy: Option<EnergyLevel>,
    /// Skip the time question
    #[arg(short, long = "time", requires = "energy")]
    pub time_window: Option<TimeWindow>,
    /// Maximum number of suggestions (default from config)
    #[arg(long)]
    pub limit: Option<u32>,
}

pub async fn run(args: SuggestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (api, config) = client()?;
    let wizard = SuggestionWizard::with_limit(api, args.limit.unwrap_or(config.recommendations.next_limit));
    let mut input = io::stdin().lock();

    wizard.open();
    if let Some(energy) = args.energy {
        wizard.select_energy(energy);
    }
    if let Some(window) = args.time_window {
        wizard.select_time_window(window).await;
    }

    while wizard.state().is_open() {
        let state = wizard.state();
        match state.step() {
            WizardStep::CollectingEnergy => {
                println!("How much energy do you have?");
                for (i, level) in EnergyLevel::ALL.iter().enumerate() {
                    println!("  {}. {:<6} {}", i + 1, level.label(), level.description());
                }
                let Some(answer) = prompt(&mut input, "energy (q to quit)")? else {
                    wizard.close();
                    break;
                };
                match pick(&answer, &EnergyLevel::ALL) {
                    Some(level) => wizard.select_energy(level),
                    None => println!("Please choose 1-3 or low/medium/high."),
                }
            }
            WizardStep::CollectingTime => {
                println!("How much time do you have?");
                for (i, window) in TimeWindow::MENU.iter().enumerate() {
                    println!("  {}. {}", i + 1, window.label());
                }
                let Some(answer) = prompt(&mut input, "time (b to go back)")? else {
                    wizard.close();
                    break;
                };
                if answer == "b" {
                    wizard.back();
                    continue;
                }
                match pick(&answer, &TimeWindow::MENU) {
                    Some(window) => {
                        wizard.select_time_window(window).await;
                    }
                    None => println!("Please choose 1-5 or a duration like 45m."),
                }
            }
            WizardStep::ShowingResults => {
                show_results(&wizard, state.results(), state.time_window(), &mut input).await?;
            }
        }
    }
    Ok(())
}

async fn show_results(
    wizard: &SuggestionWizard<ApiClient>,
    results: &ResultsState,
    window: Option<TimeWindow>,
    input: &mut impl BufRead,
) -> Result<(), Box<dyn std::error::Error>> {
    match results {
        ResultsState::Idle | ResultsState::Loading => {
            // Nothing in flight from this loop; ask again.
            wizard.retry().await;
        }
        ResultsState::Error(message) => {
            println!("Could not load suggestions: {message}");
            match prompt(input, "r to retry, b to go back")?.as_deref() {
                Some("r") | Some("") => {
                    wizard.retry().await;
                }
                Some("b") => wizard.back(),
                _ => wizard.close(),
            }
        }
        ResultsState::Loaded(items) if items.is_empty() => {
            println!("Nothing fits right now. Try a different energy or time.");
            match prompt(input, "b to go back")?.as_deref() {
                Some("b") => wizard.back(),
                _ => wizard.close(),
            }
        }
        ResultsState::Loaded(items) => {
            for (i, item) in items.iter().enumerate() {
                let fits = window.map_or(true, |w| item.task.fits_within(w.minutes()));
                let flag = if fits { "" } else { " (may run over)" };
                println!("{:>2}. {}{flag}", i + 1, format_item(item));
            }
            let Some(answer) = prompt(input, "pick a number, b to go back")? else {
                wizard.close();
                return Ok(());
            };
            if answer == "b" {
                wizard.back();
                return Ok(());
            }
            let chosen = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| items.get(i));
            match chosen.and_then(|item| wizard.select_item(&item.task.id)) {
                Some(id) => println!("Next up: {id}"),
                None => println!("Please choose 1-{}.", items.len()),
            }
        }
    }
    Ok(())
}

/// Read one trimmed line. `None` on end of input or "q".
fn prompt(input: &mut impl BufRead, label: &str) -> io::Result<Option<String>> {
    print!("{label}> ");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim().to_lowercase();
    Ok((answer != "q").then_some(answer))
}

/// Accept a 1-based menu index or anything the type parses itself.
fn pick<T: Copy + std::str::FromStr>(answer: &str, menu: &[T]) -> Option<T> {
    match answer.parse::<usize>() {
        Ok(n) if (1..=menu.len()).contains(&n) => Some(menu[n - 1]),
        _ => answer.parse().ok(),
    }
}
