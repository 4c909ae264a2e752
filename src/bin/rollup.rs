use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use trade_rollup::service::{SummaryRequest, WindowRequest};
use trade_rollup::{parse_wall_clock, ExportFormat, MySqlLedger, RollupService, Settings, TimeColumn};

#[derive(Parser, Debug)]
#[command(name = "rollup")]
#[command(about = "Run trade roll-ups once and print the result")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hourly profit over a window, exported to the public directory
    Hourly {
        #[arg(short, long, default_value = "XAUUSD")]
        symbol: String,

        /// Window start (YYYY-MM-DD HH:MM:SS, inclusive)
        #[arg(long, value_parser = parse_wall_clock)]
        start: NaiveDateTime,

        /// Window end (YYYY-MM-DD HH:MM:SS, inclusive)
        #[arg(long, value_parser = parse_wall_clock)]
        end: NaiveDateTime,

        /// Bucket and window by open or close time
        #[arg(short, long, value_enum, default_value = "open")]
        time_column: TimeColumn,

        /// Print the rows instead of writing the export file
        #[arg(long)]
        inline: bool,

        /// Export layout for this run (defaults to --export-format)
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
    },

    /// Open / closed-today / closed-yesterday breakdown for a day
    Summary {
        /// Target day (YYYY-MM-DD)
        #[arg(short = 'D', long)]
        date: NaiveDate,

        #[arg(short, long, default_value = "XAUUSD")]
        symbol: String,
    },

    /// Rebuild the hourly export from the last snapshot, without the ledger
    Reaggregate {
        #[arg(short, long, value_enum, default_value = "open")]
        time_column: TimeColumn,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trade_rollup=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    args.settings.validate()?;

    let settings = Arc::new(args.settings);
    let ledger = Arc::new(MySqlLedger::new(&settings));
    let service = RollupService::new(settings, ledger);

    let (output, ok) = match args.command {
        Commands::Hourly {
            symbol,
            start,
            end,
            time_column,
            inline,
            format,
        } => {
            let request = WindowRequest {
                symbol,
                start,
                end,
                time_column,
                inline,
                format,
            };
            let result = service.hourly(&request).await;
            (serde_json::to_string_pretty(&result)?, result.is_ok())
        }
        Commands::Summary { date, symbol } => {
            let request = SummaryRequest { date, symbol };
            let result = service.summary(&request).await;
            (serde_json::to_string_pretty(&result)?, result.is_ok())
        }
        Commands::Reaggregate { time_column } => {
            let result = service.reaggregate(time_column);
            (serde_json::to_string_pretty(&result)?, result.is_ok())
        }
    };

    println!("{}", output);

    if !ok {
        anyhow::bail!("roll-up failed");
    }
    Ok(())
}
