use crate::evaluate::{run_evaluate, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dealbot::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "DealBot",
    about = "Run the DealBot lead intake service or evaluate a deal from the command line",
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
    /// Print the MAO and exit-strategy projections for a property
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the buyer directory from a CSV export
    #[arg(long)]
    pub(crate) buyers_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_optional_and_evaluate_parses_flags() {
        let cli = Cli::try_parse_from(["dealbot"]).expect("no subcommand");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "dealbot",
            "evaluate",
            "--arv",
            "218000",
            "--repairs",
            "9810",
            "--cash-offer",
            "150000",
        ])
        .expect("evaluate parses");
        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.arv, 218_000.0);
                assert_eq!(args.cash_offer, 150_000.0);
                assert_eq!(args.insurance, 0.0);
            }
            other => panic!("expected evaluate, got {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_buyer_seed_file() {
        let cli = Cli::try_parse_from(["dealbot", "serve", "--buyers-csv", "buyers.csv"])
            .expect("serve parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.buyers_csv, Some(PathBuf::from("buyers.csv")));
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }
}
