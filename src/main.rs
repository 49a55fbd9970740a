use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use devplan::{config::Config, mcp, store::Store};

#[derive(Parser)]
#[command(name = "devplan")]
#[command(about = "Iteration, requirement and task tracking for AI-assisted development")]
struct Cli {
    /// Project root; defaults to the current directory
    #[arg(long, global = true, env = "DEVPLAN_PROJECT_ROOT")]
    project_root: Option<PathBuf>,

    /// Plan directory, relative to the project root unless absolute
    #[arg(long, global = true, env = "DEVPLAN_PLAN_DIR")]
    plan_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server via stdio (default)
    Mcp,
    /// Print the project context as JSON
    Context,
    /// List iterations as JSON
    Iterations,
    /// Print an iteration plan as Markdown
    Plan {
        /// Version to show; defaults to the active iteration
        version: Option<String>,
    },
    /// Print an iteration's development report
    Report {
        /// Version to show; defaults to the active iteration
        version: Option<String>,
    },
    /// Rebuild the iterations index and active pointer from iteration documents
    RepairIndex,
}

/// Logs always go to stderr: stdout carries the MCP protocol or command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "devplan=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::resolve(cli.project_root, cli.plan_dir)?;
    let store = Store::open(&config)?;

    match cli.command.unwrap_or(Commands::Mcp) {
        Commands::Mcp => {
            tracing::info!(plan_dir = %config.plan_dir.display(), "serving development plan");
            mcp::run_stdio_server(store).await?;
        }
        Commands::Context => print_json(&store.get_context())?,
        Commands::Iterations => print_json(&store.list_iterations())?,
        Commands::Plan { version } => print!("{}", store.view_plan(version.as_deref())?),
        Commands::Report { version } => println!("{}", store.view_report(version.as_deref())?),
        Commands::RepairIndex => print_json(&store.repair_index()?)?,
    }

    Ok(())
}
