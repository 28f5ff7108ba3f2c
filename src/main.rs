use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use risk_desk::api::{ApiError, ScoringClient};
use risk_desk::auth::{get_auth_path, AuthError, AuthSession};
use risk_desk::config::{self, Config};
use risk_desk::outreach::OutreachDraft;
use risk_desk::output;
use risk_desk::report::{write_report, ReportOptions};
use risk_desk::risk::{
    aggregate, DelinquencyFilter, ManualInputProfile, RecordFilter, RiskFilter, ScoringSession,
};
use risk_desk::session::{get_session_path, FileSessionStore, SessionStore, SubmissionGate};
use risk_desk::workflow::{self, Outcome, WorkflowError};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Args, Debug, Clone, Copy)]
struct FilterArgs {
    /// Only show customers at this risk level
    #[arg(long, value_enum, default_value_t = RiskFilter::All)]
    risk: RiskFilter,

    /// Only show customers with this next-month delinquency forecast
    #[arg(long, value_enum, default_value_t = DelinquencyFilter::All)]
    delinquency: DelinquencyFilter,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter::new(args.risk, args.delinquency)
    }
}

#[derive(Args, Debug, Clone, Copy)]
struct ManualArgs {
    /// Credit limit (> 0)
    #[arg(long, default_value_t = 100_000.0)]
    credit_limit: f64,

    /// Utilisation % (0-100)
    #[arg(long, default_value_t = 50.0)]
    utilisation: f64,

    /// Average payment ratio % (0-100)
    #[arg(long, default_value_t = 60.0)]
    avg_payment_ratio: f64,

    /// Minimum-due paid frequency % (0-100)
    #[arg(long, default_value_t = 40.0)]
    min_due_paid_frequency: f64,

    /// Merchant mix index (0-1)
    #[arg(long, default_value_t = 0.6)]
    merchant_mix_index: f64,

    /// Cash withdrawal % (0-100)
    #[arg(long, default_value_t = 10.0)]
    cash_withdrawal: f64,

    /// Recent spend change % (-100 to 100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    recent_spend_change: f64,
}

impl From<ManualArgs> for ManualInputProfile {
    fn from(args: ManualArgs) -> Self {
        ManualInputProfile {
            credit_limit: args.credit_limit,
            utilisation_pct: args.utilisation,
            avg_payment_ratio: args.avg_payment_ratio,
            min_due_paid_frequency: args.min_due_paid_frequency,
            merchant_mix_index: args.merchant_mix_index,
            cash_withdrawal_pct: args.cash_withdrawal,
            recent_spend_change_pct: args.recent_spend_change,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in as the analyst
    Login,
    /// Log out (optionally clearing stored results)
    Logout,
    /// Show login, stored results and scoring service status
    Status,
    /// Upload an Excel workbook for batch scoring
    Score {
        /// Path to a .xlsx or .xls file
        file: PathBuf,
    },
    /// Score one hypothetical customer profile
    Manual {
        #[command(flatten)]
        profile: ManualArgs,

        /// Print the result without replacing the stored results
        #[arg(long)]
        no_save: bool,
    },
    /// List stored results with summary counts (default if no subcommand)
    Results {
        #[command(flatten)]
        filter: FilterArgs,

        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Export the filtered results to CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory (defaults to export.output_dir, then the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show one customer in detail
    Show {
        /// Customer ID
        id: String,

        /// Fetch the latest record from the scoring service
        #[arg(long)]
        remote: bool,
    },
    /// Write the PDF risk report for one customer
    Report {
        /// Customer ID
        id: String,

        /// Output directory (defaults to export.output_dir, then the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Draft a review-meeting email for one customer
    Review {
        /// Customer ID
        id: String,

        /// Open the draft in the mail client
        #[arg(long)]
        open: bool,
    },
    /// Draft a customer contact email
    Contact {
        /// Customer ID
        id: String,

        /// Open the draft in the mail client
        #[arg(long)]
        open: bool,
    },
    /// Browse results interactively
    Tui {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory for exports and reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a config file interactively
    Init,
    /// Discard the stored results
    Clear,
}

#[derive(Parser, Debug)]
#[command(name = "risk-desk")]
#[command(about = "Early risk signal desk: score, filter, export and report on customers", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/risk-desk/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "risk_desk=debug" } else { "warn" };
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(fallback)),
        Err(_) => EnvFilter::new(fallback),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(risk_desk::stderr_buffer::BufferedStderr::default())
        .init();
}

fn exit_with(message: impl std::fmt::Display, code: i32) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

fn api_exit_code(err: &ApiError) -> i32 {
    match err {
        ApiError::InvalidBaseUrl { .. } | ApiError::Upload { .. } => EXIT_CONFIG,
        _ => EXIT_NETWORK,
    }
}

fn workflow_exit_code(err: &WorkflowError) -> i32 {
    match err {
        WorkflowError::Api(api) => api_exit_code(api),
        _ => EXIT_CONFIG,
    }
}

fn create_client(config: &Config) -> ScoringClient {
    let base_url = config::resolve_api_base_url(config);
    match ScoringClient::new(&base_url, config.api.timeout()) {
        Ok(client) => client,
        Err(e) => exit_with(format!("Config error: {}", e), EXIT_CONFIG),
    }
}

fn require_session(store: &dyn SessionStore) -> ScoringSession {
    match store.load() {
        Some(session) if !session.is_empty() => session,
        _ => exit_with(
            output::format_empty_results(output::should_use_colors()),
            EXIT_CONFIG,
        ),
    }
}

fn find_record(session: &ScoringSession, id: &str) -> risk_desk::risk::CustomerRiskRecord {
    match session.find(id) {
        Some(record) => record.clone(),
        None => exit_with(
            format!(
                "{}. Run `risk-desk results` to list customers.",
                WorkflowError::NotInSession(id.to_string())
            ),
            EXIT_CONFIG,
        ),
    }
}

fn deliver_draft(draft: &OutreachDraft, open: bool) {
    let link = draft.mailto();
    println!("Subject: {}", draft.subject);
    println!();
    println!("{}", draft.body);
    println!();
    println!("{}", link);

    if open {
        if let Err(e) = risk_desk::browser::open_url(&link) {
            exit_with(format!("{:#}", e), EXIT_NETWORK);
        }
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Results {
        filter: FilterArgs {
            risk: RiskFilter::All,
            delinquency: DelinquencyFilter::All,
        },
        tsv: false,
    });

    if let Commands::Init = command {
        match config::init::run_init_wizard(cli.config) {
            Ok(_) => std::process::exit(EXIT_SUCCESS),
            Err(e) => exit_with(format!("Init failed: {:#}", e), EXIT_CONFIG),
        }
    }

    let config = match config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => exit_with(format!("Config error: {:#}", e), EXIT_CONFIG),
    };
    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    tracing::debug!(base_url = %config::resolve_api_base_url(&config), "config loaded");

    let mut auth = AuthSession::load(get_auth_path(), config.auth.clone());
    let store = Arc::new(
        FileSessionStore::new(get_session_path()).with_max_age(config.session.max_age()),
    );
    let gate = Arc::new(SubmissionGate::new());
    let use_colors = output::should_use_colors();

    // Everything past login/logout needs an authenticated analyst
    if !matches!(command, Commands::Login | Commands::Logout) {
        if let Err(e) = auth.require() {
            exit_with(e, EXIT_AUTH);
        }
    }

    match command {
        // Handled before the config is loaded
        Commands::Init => {}
        Commands::Login => {
            let (user_id, password) = match risk_desk::auth::prompt::prompt_for_credentials() {
                Ok(pair) => pair,
                Err(e) => exit_with(format!("Login cancelled: {:#}", e), EXIT_AUTH),
            };
            match auth.login(&user_id, &password) {
                Ok(()) => println!("Logged in as {}", user_id.trim()),
                Err(e @ AuthError::Persist(_)) => exit_with(e, EXIT_CONFIG),
                Err(e) => exit_with(e, EXIT_AUTH),
            }
        }
        Commands::Logout => {
            if let Err(e) = auth.logout() {
                exit_with(e, EXIT_CONFIG);
            }
            if config.session.clear_on_logout {
                if let Err(e) = store.clear() {
                    exit_with(format!("Failed to clear results: {:#}", e), EXIT_CONFIG);
                }
            }
            println!("Logged out");
        }
        Commands::Status => {
            if let Some(state) = auth.state() {
                let age = chrono::Utc::now() - state.logged_in_at;
                println!("Logged in as {} ({} ago)", state.user_id, output::format_age(age));
            }

            match store.load() {
                Some(session) => {
                    println!(
                        "Stored results: {} records from {} ({} ago)",
                        session.len(),
                        session.source,
                        output::format_age(session.age())
                    );
                    println!();
                    println!(
                        "{}",
                        output::format_summary(&aggregate(&session.customers), use_colors)
                    );
                }
                None => println!("Stored results: none"),
            }

            let client = create_client(&config);
            println!();
            match client.ping().await {
                Ok(()) => println!("Scoring service: reachable at {}", client.base_url()),
                Err(e) => exit_with(
                    format!("Scoring service: unreachable at {} ({})", client.base_url(), e),
                    api_exit_code(&e),
                ),
            }
        }
        Commands::Score { file } => {
            let client = create_client(&config);
            match workflow::score_batch(&client, &*store, &gate, &file).await {
                Ok(Outcome::Applied(session)) => {
                    println!("Scored {} customers from {}", session.len(), file.display());
                    println!();
                    println!(
                        "{}",
                        output::format_summary(&aggregate(&session.customers), use_colors)
                    );
                }
                Ok(Outcome::Stale) => {}
                Err(e) => {
                    let code = workflow_exit_code(&e);
                    exit_with(e, code)
                }
            }
        }
        Commands::Manual { profile, no_save } => {
            let client = create_client(&config);
            let profile = ManualInputProfile::from(profile);
            match workflow::score_manual(&client, &*store, &gate, &profile, !no_save).await
            {
                Ok(Outcome::Applied(record)) => {
                    let currency = output::CurrencyFormat::terminal(&config.currency);
                    println!(
                        "{}",
                        output::format_customer_detail(
                            &record,
                            &currency,
                            use_colors,
                            output::get_terminal_width()
                        )
                    );
                }
                Ok(Outcome::Stale) => {}
                Err(e) => {
                    let code = workflow_exit_code(&e);
                    exit_with(e, code)
                }
            }
        }
        Commands::Results { filter, tsv } => {
            let Some(session) = store.load().filter(|s| !s.is_empty()) else {
                println!("{}", output::format_empty_results(use_colors));
                std::process::exit(EXIT_SUCCESS);
            };
            let filter = RecordFilter::from(filter);
            let visible = filter.apply(&session.customers);

            if tsv {
                println!("{}", output::format_tsv(&visible));
            } else {
                let currency = output::CurrencyFormat::terminal(&config.currency);
                println!(
                    "{}",
                    output::format_summary(&aggregate(&session.customers), use_colors)
                );
                println!();
                println!(
                    "{}",
                    output::format_results_table(&visible, &currency, use_colors)
                );
                if !filter.is_unfiltered() {
                    println!();
                    println!(
                        "Showing {} of {} customers (risk: {}, delinquency: {})",
                        visible.len(),
                        session.len(),
                        filter.risk.label(),
                        filter.delinquency.label()
                    );
                }
            }
        }
        Commands::Export { filter, output } => {
            let session = require_session(&*store);
            let visible = RecordFilter::from(filter).apply(&session.customers);
            if visible.is_empty() {
                println!("No customers match the current filters. Nothing exported.");
                std::process::exit(EXIT_SUCCESS);
            }
            let dir = config::resolve_output_dir(&config, output);
            match risk_desk::export::write_csv(&dir, &visible) {
                Ok(path) => println!("Exported {} rows to {}", visible.len(), path.display()),
                Err(e) => exit_with(format!("Export failed: {:#}", e), EXIT_CONFIG),
            }
        }
        Commands::Show { id, remote } => {
            let record = if remote {
                let client = create_client(&config);
                match client.fetch_customer(&id).await {
                    Ok(record) => record,
                    Err(e) => {
                        let code = api_exit_code(&e);
                        exit_with(e, code)
                    }
                }
            } else {
                find_record(&require_session(&*store), &id)
            };
            let currency = output::CurrencyFormat::terminal(&config.currency);
            println!(
                "{}",
                output::format_customer_detail(
                    &record,
                    &currency,
                    use_colors,
                    output::get_terminal_width()
                )
            );
        }
        Commands::Report { id, output } => {
            let record = find_record(&require_session(&*store), &id);
            let dir = config::resolve_output_dir(&config, output);
            let options = ReportOptions::from_config(&config, Local::now());
            match write_report(&dir, &record, &options) {
                Ok(path) => println!("Saved {}", path.display()),
                Err(e) => exit_with(format!("Report failed: {:#}", e), EXIT_CONFIG),
            }
        }
        Commands::Review { id, open } => {
            let record = find_record(&require_session(&*store), &id);
            let draft = OutreachDraft::schedule_review(&record, &config.report.title);
            deliver_draft(&draft, open);
        }
        Commands::Contact { id, open } => {
            let record = find_record(&require_session(&*store), &id);
            let draft = OutreachDraft::contact_customer(&record, &config.report.title);
            deliver_draft(&draft, open);
        }
        Commands::Tui { filter, output } => {
            let client = create_client(&config);
            let dir = config::resolve_output_dir(&config, output);
            let app = risk_desk::tui::App::new(store, config, dir, RecordFilter::from(filter));
            if let Err(e) = risk_desk::tui::run_tui(app, client).await {
                exit_with(format!("TUI error: {:#}", e), EXIT_CONFIG);
            }
        }
        Commands::Clear => match store.clear() {
            Ok(()) => println!("Stored results cleared"),
            Err(e) => exit_with(format!("Failed to clear results: {:#}", e), EXIT_CONFIG),
        },
    }

    std::process::exit(EXIT_SUCCESS);
}
