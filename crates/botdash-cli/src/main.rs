//! botdash - command-line front-end for the Telegram bot dashboard.
//!
//! Every command starts by hydrating the session from the stored
//! credential. Commands that need an account refuse to run while the
//! session is anonymous.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use botdash_core::forms::{self, RegistrationForm};
use botdash_core::models::BotStats;
use botdash_core::{ApiClient, Config, SessionState, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Log file name prefix inside the data directory
const LOG_FILE_PREFIX: &str = "botdash.log";

const USAGE: &str = "\
Usage: botdash <command> [args]

Commands:
  status                          Show who is logged in
  login [email]                   Log in (password from BOTDASH_PASSWORD or prompt)
  register <email> <name>         Create an account and log in
  logout                          Forget the stored credential
  bots                            List your bots with per-type counts
  add-bot <token>                 Register a bot by its @BotFather token
  broadcasts <bot_id>             Show broadcast history
  broadcast <bot_id> <message>    Send a message to every user of a bot
  transactions <bot_id>           Show transactions and revenue
  products <bot_id>               List store products
  add-stock <product_id> <item>...  Append stock items to a product";

/// Initialize the tracing subscriber for logging.
/// Returns the guard that flushes the log file on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config, using defaults: {:#}", e);
        Config::default()
    });

    let _guard = init_tracing(config.data_dir().ok().as_deref());
    info!("botdash starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };
    if command == "-h" || command == "--help" || command == "help" {
        println!("{}", USAGE);
        return Ok(());
    }

    let api = ApiClient::new(config.api_base_url(), config.token_store()?)?;
    debug!(base_url = api.base_url(), "API client configured");
    let session = SessionStore::connect(api).await;

    run(command, &args[1..], &session, config).await
}

async fn run(command: &str, args: &[String], session: &SessionStore, mut config: Config) -> Result<()> {
    match command {
        "status" => {
            match session.wait_until_ready().await {
                SessionState::Authenticated(user) => {
                    println!("Logged in as {} <{}> (id {})", user.label(), user.email, user.id)
                }
                _ => println!("Not logged in"),
            }
            Ok(())
        }
        "login" => {
            let email = match args.first() {
                Some(email) => email.clone(),
                None => prompt_email(&config)?,
            };
            let password = prompt_password("Password: ")?;
            forms::validate_login(&email, &password)?;

            let redirect = session.login(&email, &password).await?;
            config.last_email = Some(email);
            save_config(&config);
            print_identity(session);
            debug!(path = redirect.path(), "Redirect after login");
            Ok(())
        }
        "register" => {
            let [email, name] = args else {
                bail!("Usage: botdash register <email> <name>");
            };
            let form = RegistrationForm {
                name: name.clone(),
                email: email.clone(),
                password: prompt_password("Password: ")?,
                confirm_password: prompt_password("Confirm password: ")?,
            };
            form.validate()?;

            session.register(&form.email, &form.password, &form.name).await?;
            config.last_email = Some(form.email);
            save_config(&config);
            print_identity(session);
            Ok(())
        }
        "logout" => {
            session.logout()?;
            println!("Logged out");
            Ok(())
        }
        "bots" => {
            require_login(session)?;
            let bots = session.api().get_bots().await?;
            #[derive(Serialize)]
            struct Output<'a> {
                stats: BotStats,
                bots: &'a [botdash_core::models::Bot],
            }
            print_json(&Output {
                stats: BotStats::from_bots(&bots),
                bots: &bots,
            })
        }
        "add-bot" => {
            require_login(session)?;
            let token = forms::validate_bot_token(arg(args, 0, "token")?)?;
            let bot = session.api().create_bot(token).await?;
            println!("Added {} ({})", bot.handle(), bot.bot_type.display_name());
            Ok(())
        }
        "broadcasts" => {
            require_login(session)?;
            let bot_id = parse_id(arg(args, 0, "bot_id")?)?;
            print_json(&session.api().get_broadcasts(bot_id).await?)
        }
        "broadcast" => {
            require_login(session)?;
            let bot_id = parse_id(arg(args, 0, "bot_id")?)?;
            let joined = args.get(1..).unwrap_or_default().join(" ");
            let message = forms::validate_broadcast(&joined)?;
            let receipt = session.api().send_broadcast(bot_id, message).await?;
            println!("{}", receipt.message);
            Ok(())
        }
        "transactions" => {
            require_login(session)?;
            let bot_id = parse_id(arg(args, 0, "bot_id")?)?;
            print_json(&session.api().get_transactions(bot_id).await?)
        }
        "products" => {
            require_login(session)?;
            let bot_id = parse_id(arg(args, 0, "bot_id")?)?;
            print_json(&session.api().get_products(bot_id).await?)
        }
        "add-stock" => {
            require_login(session)?;
            let product_id = parse_id(arg(args, 0, "product_id")?)?;
            let items = args.get(1..).unwrap_or_default().to_vec();
            if items.is_empty() {
                bail!("At least one stock item is required");
            }
            let receipt = session.api().add_stock(product_id, &items).await?;
            println!("{}", receipt.message);
            Ok(())
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn require_login(session: &SessionStore) -> Result<()> {
    if !session.snapshot().is_authenticated() {
        bail!("Not logged in. Run `botdash login` first.");
    }
    Ok(())
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("Missing argument <{}>", name))
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Invalid id: {}", value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_identity(session: &SessionStore) {
    if let Some(user) = session.identity() {
        println!("Welcome, {}!", user.label());
    }
}

fn save_config(config: &Config) {
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }
}

fn prompt_email(config: &Config) -> Result<String> {
    if let Ok(email) = std::env::var("BOTDASH_EMAIL") {
        return Ok(email);
    }

    match config.last_email {
        Some(ref last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), &config.last_email) {
        (true, Some(last)) => Ok(last.clone()),
        _ => Ok(input.to_string()),
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    if let Ok(password) = std::env::var("BOTDASH_PASSWORD") {
        return Ok(password);
    }
    let password = rpassword::prompt_password(prompt)?;
    Ok(password)
}
