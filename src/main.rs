//! Triage - helpdesk ticket triage
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use triage::config::{triage_home, Config};
use triage::cli::resolve::ResolveOptions;
use triage::core::Priority;
use triage::error::exit_codes;
use triage::tickets::{open_store, NewTicket, Sender, TicketStatus, TicketUpdate};
use triage::Triage;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TRIAGE_LOG";

// =============================================================================
// CLI Definition
// =============================================================================

/// Triage - helpdesk ticket triage with confidence-gated automatic answers
#[derive(Parser)]
#[command(name = "triage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the knowledge base
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Maximum number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Classify ticket text (department, priority, type)
    Classify {
        /// Ticket text
        text: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Try to answer a question automatically
    Resolve {
        /// The user's question
        question: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Ticket category for context
        #[arg(long)]
        category: Option<String>,
        /// Ticket type for context
        #[arg(long = "type")]
        ticket_type: Option<String>,
        /// Department name for context
        #[arg(long)]
        department: Option<String>,
    },

    /// Detect the language of a text
    Detect {
        /// Text to inspect
        text: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Translate a text
    Translate {
        /// Text to translate
        text: String,
        /// Target language code (e.g. en, ru, kk)
        #[arg(long, short, default_value = "en")]
        to: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Work with stored tickets
    Ticket {
        #[command(subcommand)]
        action: TicketAction,
        /// Output as JSON
        #[arg(long, short, global = true)]
        json: bool,
        /// Suppress output
        #[arg(long, short, global = true)]
        quiet: bool,
    },
}

#[derive(Subcommand)]
enum TicketAction {
    /// Create a ticket (classifies and may auto-resolve it)
    Create {
        /// Ticket title
        title: String,
        /// Ticket description
        description: String,
        /// Requesting user ID
        #[arg(long, default_value = "cli")]
        user_id: String,
        /// Requesting user name
        #[arg(long)]
        user_name: Option<String>,
        /// Requesting user email
        #[arg(long)]
        user_email: Option<String>,
    },
    /// List tickets, newest first
    List {
        /// Only tickets routed to this department
        #[arg(long)]
        department: Option<String>,
        /// Maximum number of tickets
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Show a ticket with its messages and metrics
    Show {
        /// Ticket ID
        ticket_id: String,
    },
    /// Add a message to a ticket
    Reply {
        /// Ticket ID
        ticket_id: String,
        /// Message text
        content: String,
        /// Who is sending the message
        #[arg(long, value_enum, default_value = "operator")]
        sender: SenderArg,
        /// Display name of the sender
        #[arg(long, default_value = "Оператор")]
        name: String,
    },
    /// Update status, priority, department or category
    Update {
        /// Ticket ID
        ticket_id: String,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Department ID to reroute to
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Suggest operator replies for a ticket
    Suggest {
        /// Ticket ID
        ticket_id: String,
        /// Number of suggestions
        #[arg(long, short, default_value_t = triage::cli::tickets_cmd::DEFAULT_SUGGESTIONS)]
        count: usize,
    },
    /// Summarize a ticket's conversation
    Summarize {
        /// Ticket ID
        ticket_id: String,
    },
    /// Translate a ticket message and store the translation
    TranslateMessage {
        /// Ticket ID
        ticket_id: String,
        /// Message ID
        message_id: String,
        /// Target language code
        #[arg(long, short, default_value = "en")]
        to: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SenderArg {
    User,
    Operator,
    Ai,
}

impl From<SenderArg> for Sender {
    fn from(arg: SenderArg) -> Self {
        match arg {
            SenderArg::User => Sender::User,
            SenderArg::Operator => Sender::Operator,
            SenderArg::Ai => Sender::Ai,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl From<StatusArg> for TicketStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => TicketStatus::Open,
            StatusArg::InProgress => TicketStatus::InProgress,
            StatusArg::Resolved => TicketStatus::Resolved,
            StatusArg::Closed => TicketStatus::Closed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PriorityArg {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Urgent => Priority::Urgent,
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    setup_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("triage error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Log to stderr, filtered by `TRIAGE_LOG` (default `warn`).
fn setup_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.triage/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("triage panic: {}", info);

        if let Some(home) = triage_home() {
            let crash_log = home.join("crash.log");
            let opened = std::fs::create_dir_all(&home).and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&crash_log)
            });
            if let Ok(mut file) = opened {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();
    let triage = Triage::from_config(&config)?;

    match cli.command {
        Commands::Search {
            query,
            json,
            quiet,
            limit,
        } => Ok(run_search(&triage, &query, json, quiet, limit)),
        Commands::Classify { text, json, quiet } => Ok(run_classify(&triage, &text, json, quiet)),
        Commands::Resolve {
            question,
            json,
            quiet,
            category,
            ticket_type,
            department,
        } => Ok(run_resolve(
            &triage,
            &question,
            ResolveOptions {
                json,
                quiet,
                category,
                ticket_type,
                department,
            },
        )),
        Commands::Detect { text, json, quiet } => Ok(run_detect(&triage, &text, json, quiet)),
        Commands::Translate {
            text,
            to,
            json,
            quiet,
        } => Ok(run_translate(&triage, &text, to, json, quiet)),
        Commands::Ticket {
            action,
            json,
            quiet,
        } => run_ticket(&triage, &config, action, json, quiet),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted);
    }
}

fn run_search(
    triage: &Triage,
    query: &str,
    json: bool,
    quiet: bool,
    limit: Option<usize>,
) -> ExitCode {
    use triage::cli::search::{SearchCommand, SearchOptions};

    let cmd = SearchCommand::new(triage);
    let options = SearchOptions { json, quiet, limit };

    let output = cmd.run(query, &options);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_classify(triage: &Triage, text: &str, json: bool, quiet: bool) -> ExitCode {
    use triage::cli::classify::{ClassifyCommand, ClassifyOptions};

    let cmd = ClassifyCommand::new(triage);
    let options = ClassifyOptions { json, quiet };

    let output = cmd.run(text, &options);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_resolve(
    triage: &Triage,
    question: &str,
    options: ResolveOptions,
) -> ExitCode {
    use triage::cli::resolve::ResolveCommand;

    let cmd = ResolveCommand::new(triage);
    let output = cmd.run(question, &options);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_detect(triage: &Triage, text: &str, json: bool, quiet: bool) -> ExitCode {
    use triage::cli::detect::{DetectCommand, DetectOptions};

    let cmd = DetectCommand::new(triage);
    let options = DetectOptions { json, quiet };

    let output = cmd.run(text, &options);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_translate(triage: &Triage, text: &str, target: String, json: bool, quiet: bool) -> ExitCode {
    use triage::cli::translate::{TranslateCommand, TranslateOptions};

    let cmd = TranslateCommand::new(triage);
    let options = TranslateOptions {
        json,
        quiet,
        target,
    };

    let output = cmd.run(text, &options);
    print_formatted(&cmd.format_output(&output, &options));

    success_to_exit_code(output.success)
}

fn run_ticket(
    triage: &Triage,
    config: &Config,
    action: TicketAction,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use triage::cli::tickets_cmd::{TicketsCommand, TicketsOptions};

    let store = open_store(config)?;
    let cmd = TicketsCommand::new(triage, store);
    let mut options = TicketsOptions {
        json,
        quiet,
        limit: None,
    };

    let output = match action {
        TicketAction::Create {
            title,
            description,
            user_id,
            user_name,
            user_email,
        } => cmd.create(NewTicket {
            title,
            description,
            user_id,
            user_name,
            user_email,
        }),
        TicketAction::List { department, limit } => {
            options.limit = limit;
            cmd.list(department.as_deref(), &options)
        }
        TicketAction::Show { ticket_id } => cmd.show(&ticket_id),
        TicketAction::Reply {
            ticket_id,
            content,
            sender,
            name,
        } => cmd.reply(&ticket_id, &content, sender.into(), &name),
        TicketAction::Update {
            ticket_id,
            status,
            priority,
            department,
            category,
        } => cmd.update(
            &ticket_id,
            TicketUpdate {
                status: status.map(Into::into),
                priority: priority.map(Into::into),
                department_id: department,
                category,
            },
        ),
        TicketAction::Suggest { ticket_id, count } => cmd.suggest(&ticket_id, count),
        TicketAction::Summarize { ticket_id } => cmd.summarize(&ticket_id),
        TicketAction::TranslateMessage {
            ticket_id,
            message_id,
            to,
        } => cmd.translate(&ticket_id, &message_id, &to),
    };

    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_success_to_exit_code() {
        assert_eq!(
            success_to_exit_code(true),
            ExitCode::from(exit_codes::SUCCESS as u8)
        );
        assert_eq!(
            success_to_exit_code(false),
            ExitCode::from(exit_codes::ERROR as u8)
        );
    }

    #[test]
    fn test_parse_ticket_update() {
        let cli = Cli::try_parse_from([
            "triage",
            "ticket",
            "update",
            "ticket-1",
            "--status",
            "in-progress",
            "--priority",
            "urgent",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Ticket {
                action: TicketAction::Update {
                    status, priority, ..
                },
                json,
                ..
            } => {
                assert!(json);
                assert_eq!(TicketStatus::from(status.unwrap()), TicketStatus::InProgress);
                assert_eq!(Priority::from(priority.unwrap()), Priority::Urgent);
            }
            _ => panic!("expected ticket update"),
        }
    }

    #[test]
    fn test_sender_conversion() {
        assert_eq!(Sender::from(SenderArg::Operator), Sender::Operator);
        assert_eq!(Sender::from(SenderArg::Ai), Sender::Ai);
    }
}
