use crate::server;
use crate::terminal::{run_assess, run_classify, run_screen, AssessArgs, ClassifyArgs, ScreenArgs};
use carecheck::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "carecheck",
    about = "Run the guided mental health screening service or use it from the terminal",
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
    /// Walk through a screening interactively on the terminal
    Screen(ScreenArgs),
    /// Show which questionnaire a message points to, or whether it signals a crisis
    Classify(ClassifyArgs),
    /// Run the slider stress or depression assessment
    Assess(AssessArgs),
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
        Command::Screen(args) => run_screen(args).await,
        Command::Classify(args) => run_classify(args),
        Command::Assess(args) => run_assess(args).await,
    }
}
