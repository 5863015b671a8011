use clap::Args;
use clap_complete::{generate, Shell};

/// Arguments for `nextbest completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to stdout.
pub fn run(shell: Shell, command: &mut clap::Command) -> Result<(), Box<dyn std::error::Error>> {
    generate(shell, command, "nextbest", &mut std::io::stdout());
    Ok(())
}
