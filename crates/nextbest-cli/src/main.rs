use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "nextbest", version, about = "What should I work on next?")]
struct Cli {
    /// Log requests and cache decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recommendations
    Recs {
        #[command(subcommand)]
        action: commands::recs::RecsAction,
    },
    /// Interactive "suggest a task" wizard
    Suggest(commands::suggest::SuggestArgs),
    /// Update a recommended task
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "nextbest_core=debug,nextbest=debug,info"
        } else {
            "warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Recs { action } => commands::recs::run(action).await,
        Commands::Suggest(args) => commands::suggest::run(args).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            commands::completions::run(args.shell, &mut command)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
