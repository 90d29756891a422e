use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "duetrack", version, about = "Duetrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obligation management
    Obligation {
        #[command(subcommand)]
        action: commands::obligation::ObligationAction,
    },
    /// Reminder management
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Income records
    Income {
        #[command(subcommand)]
        action: commands::income::IncomeAction,
    },
    /// Premium subscription sync for digital accounts
    Subscription {
        #[command(subcommand)]
        action: commands::subscription::SubscriptionAction,
    },
    /// Due-date sweep
    Sweep {
        #[command(subcommand)]
        action: commands::sweep::SweepAction,
    },
    /// Upcoming-items horizon
    Horizon {
        #[command(subcommand)]
        action: commands::horizon::HorizonAction,
    },
    /// Exchange rates
    Rates {
        #[command(subcommand)]
        action: commands::rates::RatesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Obligation { action } => commands::obligation::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Income { action } => commands::income::run(action),
        Commands::Subscription { action } => commands::subscription::run(action),
        Commands::Sweep { action } => commands::sweep::run(action),
        Commands::Horizon { action } => commands::horizon::run(action),
        Commands::Rates { action } => commands::rates::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
