//! linkhop: command-line access to the linkhop API.
//!
//! Every command goes through the same validated dispatcher the library
//! exposes, so schema failures and server errors print the same normalized
//! messages a UI would show.

use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkhop_client::repositories::{CreateRedirectInput, LoginInput, TestRuleInput};
use linkhop_client::{
    bootstrap_listeners, ensure_url_protocol, ApiClient, ClientConfig, FormErrors, LoggingListeners,
};
use linkhop_core::{
    defaults, page_window, DefaultCatalog, MessageCatalog, PageItem, RuleCondition, UnifiedError,
};

#[derive(Parser)]
#[command(name = "linkhop")]
#[command(author, version, about = "Command-line client for the linkhop API")]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL (overrides LINKHOP_API_URL and the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Sign in with this email before running the command
    #[arg(long, global = true, env = "LINKHOP_EMAIL")]
    email: Option<String>,

    /// Password for --email
    #[arg(long, global = true, env = "LINKHOP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in user
    Whoami,

    /// List the teams of the signed-in user
    Teams,

    /// Manage redirects
    Redirects {
        #[command(subcommand)]
        command: RedirectCommands,
    },

    /// Inspect and test endpoint rules
    Rules {
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// List subscription products
    Products {
        /// Read the catalogue as an NDJSON stream
        #[arg(long)]
        stream: bool,
    },
}

#[derive(Subcommand)]
enum RedirectCommands {
    /// List one page of redirects
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Create a redirect
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Destination used when no endpoint matches; `https://` is added if missing
        #[arg(short, long)]
        url: String,
    },
}

#[derive(Subcommand)]
enum RuleCommands {
    /// List the rule kinds the server offers
    List,

    /// Evaluate a rule against a simulated visit
    Test {
        /// Rule condition as JSON, e.g. '{"type":"country","value":["NL"]}'
        condition: String,

        /// Visitor IP address
        #[arg(long)]
        ip: Option<String>,

        /// Visitor user agent
        #[arg(long)]
        user_agent: Option<String>,

        /// Visitor Accept-Language header
        #[arg(long)]
        accept_language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` selects levels; `LINKHOP_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "linkhop=info,linkhop_client=info,linkhop_core=warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let json = std::env::var("LINKHOP_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::load().context("loading configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let client = ApiClient::new(config).context("creating API client")?;
    bootstrap_listeners(client.events(), &[&LoggingListeners]);

    if let Some(email) = cli.email {
        let input = LoginInput {
            email: Some(email),
            password: cli.password,
            remember: None,
        };
        client.auth().login(&input).await.map_err(report)?;
    }

    match cli.command {
        Commands::Whoami => {
            let user = client.auth().current_user().await.map_err(report)?;
            print_json(&user)?;
        }
        Commands::Teams => {
            let teams = client.teams().list().await.map_err(report)?;
            print_json(&teams)?;
        }
        Commands::Redirects { command } => match command {
            RedirectCommands::List { page } => {
                let result = client.redirects().list(page).await.map_err(report)?;
                print_json(&result.data)?;
                println!(
                    "{}",
                    pager_line(result.meta.current_page, result.meta.last_page)
                );
            }
            RedirectCommands::Create { name, url } => {
                let input = CreateRedirectInput {
                    name: Some(name),
                    default_endpoint: Some(ensure_url_protocol(&url)),
                };
                let redirect = client.redirects().create(&input).await.map_err(report)?;
                print_json(&redirect)?;
            }
        },
        Commands::Rules { command } => match command {
            RuleCommands::List => {
                let kinds = client.rules().list().await.map_err(report)?;
                print_json(&kinds)?;
            }
            RuleCommands::Test {
                condition,
                ip,
                user_agent,
                accept_language,
            } => {
                let condition: RuleCondition =
                    serde_json::from_str(&condition).context("parsing rule condition")?;
                let kind = condition.kind();
                let input = TestRuleInput {
                    condition: Some(condition),
                    ip,
                    user_agent,
                    accept_language,
                    ..TestRuleInput::default()
                };
                let result = client.rules().test(kind, &input).await.map_err(report)?;
                print_json(&result)?;
            }
        },
        Commands::Products { stream: false } => {
            let products = client.products().list().await.map_err(report)?;
            print_json(&products)?;
        }
        Commands::Products { stream: true } => {
            let mut products = client.products().stream().await.map_err(report)?;
            let mut failed = 0usize;
            while let Some(item) = products.next().await {
                match item {
                    Ok(product) => println!("{}", serde_json::to_string(&product)?),
                    Err(e) => {
                        failed += 1;
                        eprintln!("skipped line: {}", describe(&e));
                    }
                }
            }
            debug!(failed, "Product stream finished");
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render the pager, e.g. `1 … 4 [5] 6 … 12`.
fn pager_line(current: u32, total: u32) -> String {
    page_window(current, total, defaults::PAGER_MAX_PAGES)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(page) if page == current => format!("[{}]", page),
            PageItem::Page(page) => page.to_string(),
            PageItem::Separator => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe(error: &UnifiedError) -> String {
    let form = FormErrors::from(error);
    if let Some(key) = form.message {
        return DefaultCatalog.resolve(key).into_owned();
    }
    let mut lines: Vec<String> = form.form;
    lines.extend(
        form.fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", "))),
    );
    lines.join("; ")
}

fn report(error: UnifiedError) -> anyhow::Error {
    anyhow!("{}", describe(&error))
}
