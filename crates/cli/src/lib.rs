pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "wardrobe",
    about = "Wardrobe storefront operator CLI",
    long_about = "Prepare the storefront database, inspect configuration, and preview the weather-aware catalog.",
    after_help = "Examples:\n  wardrobe migrate\n  wardrobe seed\n  wardrobe classify --temp 31 --condition clear\n  wardrobe browse --color Black --price-range under20 --sort priceLow"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo shopper and the T-shirt dataset, then verify them")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Classify a weather observation into a clothing category")]
    Classify {
        #[arg(long, allow_hyphen_values = true, help = "Temperature in degrees Celsius")]
        temp: f64,
        #[arg(long, help = "Condition text, e.g. \"light rain\"")]
        condition: String,
        #[arg(long, default_value_t = 0.0, help = "Wind speed in m/s")]
        wind: f64,
    },
    #[command(about = "Generate a catalog page from the database, then filter and sort it")]
    Browse(commands::browse::BrowseArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Classify { temp, condition, wind } => {
            commands::classify::run(temp, &condition, wind)
        }
        Command::Browse(args) => commands::browse::run(&args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

