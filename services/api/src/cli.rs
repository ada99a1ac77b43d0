use crate::admin::{run_clear, run_export, run_seed, ClearArgs, ExportArgs, SeedArgs};
use crate::demo::{run_demo, run_summary, DemoArgs, SummaryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use csat::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "csat-api",
    about = "Run and administer the bilingual customer satisfaction survey service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the dashboard summary from the configured record store
    Summary(SummaryArgs),
    /// Download the spreadsheet report or raw CSV (administrator)
    Export(ExportArgs),
    /// Delete responses by date range, demographics, or all (administrator)
    Clear(ClearArgs),
    /// Insert the sample responses or import a CSV file (administrator)
    Seed(SeedArgs),
    /// Walk through intake, analytics, export, and clearing in memory
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Summary(args) => run_summary(args).await,
        Command::Export(args) => run_export(args).await,
        Command::Clear(args) => run_clear(args).await,
        Command::Seed(args) => run_seed(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
