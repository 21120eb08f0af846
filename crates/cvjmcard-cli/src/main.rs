use std::io::{self, Write};
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use cvjmcard::directory::{ContactList, Directory};
use cvjmcard::fees::{DEFAULT_RATE, FeeReport};
use cvjmcard::{Credentials, PortalSession, WebScraper};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "cvjmcard")]
#[command(about = "District reports from the cvjm-card.de club portal", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        short = 'u',
        long,
        env = "CVJM_USER",
        global = true,
        help = "Portal user name (prompted if missing)"
    )]
    user: Option<String>,

    #[arg(
        long,
        env = "CVJM_PASSWORD",
        hide_env_values = true,
        global = true,
        help = "Portal password (prompted if missing)"
    )]
    password: Option<String>,

    #[arg(
        long,
        env = "CVJM_LOGIN_URL",
        default_value = cvjmcard::LOGIN_URL,
        global = true,
        help = "Login endpoint of the portal"
    )]
    login_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every contact list followed by the district fees
    Report {
        #[arg(long, default_value_t = DEFAULT_RATE, help = "District fee per member in Euro")]
        rate: f64,
    },
    /// Print one contact list
    Contacts {
        #[arg(
            value_parser = parse_contact_list,
            help = "district, all, chairpersons, board, representatives or youth-leaders"
        )]
        list: ContactList,

        #[arg(long, help = "Print e-mail addresses only")]
        mail_only: bool,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Print the district fee owed by each member club
    Fees {
        #[arg(long, default_value_t = DEFAULT_RATE, help = "District fee per member in Euro")]
        rate: f64,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Print the age bracket statistic of each member club
    Statistics {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn parse_contact_list(s: &str) -> Result<ContactList, String> {
    ContactList::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn prompt_user() -> io::Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut user = String::new();
    io::stdin().read_line(&mut user)?;
    Ok(user.trim().to_string())
}

fn credentials(user: Option<String>, password: Option<String>) -> io::Result<Credentials> {
    let user = match user {
        Some(user) => user,
        None => prompt_user()?,
    };
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    Ok(Credentials::new(user, password))
}

fn print_contacts(directory: &Directory, list: ContactList, mail_only: bool) {
    println!("{}:", list);
    for address in directory.list(list) {
        if mail_only {
            if let Some(mail) = &address.mail {
                println!("{}", mail);
            }
        } else if address.mail.is_some() || list != ContactList::All {
            println!("{}", address);
        }
    }
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .target(env_logger::Target::Stderr)
        .init();

    let credentials = credentials(cli.user, cli.password).unwrap_or_else(|e| {
        log::error!("Error reading credentials: {}", e);
        process::exit(1);
    });

    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    let mut session = PortalSession::new(scraper, cli.login_url, credentials);
    session.parse().await.unwrap_or_else(|e| {
        log::error!("Error parsing portal: {}", e);
        process::exit(1);
    });

    let directory = session.directory();

    match cli.command {
        Commands::Report { rate } => {
            println!("{}", "=".repeat(10));
            for list in ContactList::REPORT {
                let mail_only = matches!(list, ContactList::Board | ContactList::YouthLeaders);
                print_contacts(&directory, list, mail_only);
            }
            println!("----");
            println!("Beiträge:");
            println!("{}", FeeReport::new(session.member_clubs(), rate));
        }

        Commands::Contacts {
            list,
            mail_only,
            format,
        } => match format {
            OutputFormat::Json => serialize_json(&directory.list(list)),
            OutputFormat::Text => print_contacts(&directory, list, mail_only),
        },

        Commands::Fees { rate, format } => {
            let report = FeeReport::new(session.member_clubs(), rate);
            match format {
                OutputFormat::Json => serialize_json(&report),
                OutputFormat::Text => println!("{}", report),
            }
        }

        Commands::Statistics { format } => match format {
            OutputFormat::Json => {
                let clubs: Vec<_> = session
                    .member_clubs()
                    .iter()
                    .map(|club| {
                        serde_json::json!({
                            "club": club.name,
                            "number": club.number(),
                            "paying_members": club.paying_members(),
                            "statistic": club.statistic(),
                        })
                    })
                    .collect();
                serialize_json(&clubs);
            }
            OutputFormat::Text => {
                if session.member_clubs().is_empty() {
                    println!("No member clubs to display.");
                }
                for club in session.member_clubs() {
                    println!("── {}", club.name);
                    if let Some(statistic) = club.statistic() {
                        println!("{}", statistic);
                        println!(
                            "zahlend: {}  Gäste: {}  Mitarbeiter: {}",
                            statistic.total_paying_members(),
                            statistic.total_guests(),
                            statistic.total_workers()
                        );
                    }
                    println!();
                }
            }
        },
    }
}
