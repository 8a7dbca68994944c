mod config;
mod db;
mod error;
mod models;
mod operations;

use chrono::Datelike;
use clap::{Parser, Subcommand};
use config::{DEFAULT_SECRETS_PATH, Secrets};
use db::repository::LedgerStore;
use db::sheet::Sheet;
use env_logger::Env;
use error::AppResult;
use models::session::Session;
use operations::browse::{BrowseExit, run_browse};
use operations::gate::{AccessGate, authenticate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fincal", version, about = "Password-protected financial calendar")]
struct Cli {
    /// Secrets file holding app_password and store settings
    #[arg(long, env = "FINCAL_SECRETS", default_value = DEFAULT_SECRETS_PATH)]
    secrets: PathBuf,

    /// Password to log in with; prompts on the terminal when absent
    #[arg(long, env = "FINCAL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive month calendar (default)
    Calendar,
    /// Record a transaction
    Add {
        /// Date as YYYY-MM-DD
        date: String,
        /// income, expense or bill
        #[arg(value_name = "TYPE")]
        transaction_type: String,
        amount: String,
        description: String,
        /// Mark a bill as recurring
        #[arg(long)]
        recurring: bool,
    },
    /// Show the transactions recorded on a date
    Day {
        /// Date as YYYY-MM-DD
        date: String,
    },
    /// Print a month grid with weekly totals and the monthly net
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> AppResult<()> {
    let secrets = Secrets::load_from_file(&cli.secrets)?;
    let gate = AccessGate::new(secrets.app_password.clone());

    let today = chrono::Local::now().date_naive();
    let mut session = Session::new(today);
    authenticate(&gate, &mut session, cli.password.as_deref())?;

    let sheet = db::connection::open_sheet(&secrets.store)?;
    let store = LedgerStore::connect(sheet)?;
    let symbol = secrets.calendar.currency_symbol.as_str();

    match cli.command.unwrap_or(Command::Calendar) {
        Command::Calendar => run_calendar(&store, &gate, &mut session, &secrets)?,
        Command::Add {
            date,
            transaction_type,
            amount,
            description,
            recurring,
        } => {
            let date = operations::add::parse_date(&date)?;
            let added = operations::add::add_transaction_to_store(
                &store,
                date,
                &transaction_type,
                &amount,
                &description,
                recurring,
            )?;
            println!("Transaction added!");
            println!("{} {}", added.date, operations::report::format_entry(&added, symbol));
        }
        Command::Day { date } => {
            let date = operations::add::parse_date(&date)?;
            let entries: Vec<_> = store.list(date)?.collect();
            print!("{}", operations::report::format_day(date, &entries, symbol));

            let week = operations::calendar::week_containing(date, secrets.calendar.first_weekday.weekday());
            let week_net = store.weekly_total(&week)?;
            let month_net = store.monthly_total(date.year(), date.month())?;
            println!("Weekly Total: {}", operations::report::format_money(week_net, symbol));
            println!("Monthly Net: {}", operations::report::format_money(month_net, symbol));
        }
        Command::Month { year, month } => {
            let year = year.unwrap_or(session.current_year);
            let month = month.unwrap_or(session.current_month);
            let view = operations::calendar::build_month_view(
                &store.load_all()?,
                year,
                month,
                secrets.calendar.first_weekday.weekday(),
            )?;
            print!("{}", operations::report::format_month(&view, symbol));
        }
    }
    Ok(())
}

fn run_calendar(
    store: &LedgerStore<dyn Sheet>,
    gate: &AccessGate,
    session: &mut Session,
    secrets: &Secrets,
) -> AppResult<()> {
    loop {
        match run_browse(store, session, &secrets.calendar)? {
            BrowseExit::Quit => return Ok(()),
            BrowseExit::Logout => {
                gate.logout(session);
                println!("Logged out.");
                authenticate(gate, session, None)?;
            }
        }
    }
}
