mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::investment::InvestmentArgs;
use commands::loan_sizing::SizeLoanArgs;
use commands::time_value::{PaymentArgs, PresentValueArgs, ScheduleArgs};

/// Commercial real estate loan sizing and investment projections
#[derive(Parser)]
#[command(
    name = "uw",
    version,
    about = "Commercial real estate loan sizing and investment projections",
    long_about = "A CLI for underwriting income-producing property with decimal precision. \
                  Sizes loans against LTV, DSCR and requested-amount limits, builds \
                  amortization schedules, and projects after-tax cash flows through sale."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Size a loan at the binding LTV / DSCR / requested-amount limit
    SizeLoan(SizeLoanArgs),
    /// Project after-tax cash flows of a leveraged acquisition through sale
    Investment(InvestmentArgs),
    /// Level payment (PMT) for an annuity
    Payment(PaymentArgs),
    /// Present value (PV) of a level payment stream
    PresentValue(PresentValueArgs),
    /// Period-by-period amortization schedule
    Schedule(ScheduleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::SizeLoan(args) => commands::loan_sizing::run_size_loan(args),
        Commands::Investment(args) => commands::investment::run_investment(args),
        Commands::Payment(args) => commands::time_value::run_payment(args),
        Commands::PresentValue(args) => commands::time_value::run_present_value(args),
        Commands::Schedule(args) => commands::time_value::run_schedule(args),
        Commands::Version => {
            println!("uw {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
