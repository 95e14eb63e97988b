mod render;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use eminent::config::{API_URL_ENV, SESSION_FILE_ENV};
use eminent::guard::{self, Route};
use eminent::{
    ApiClient, ApiError, Auth, ClientConfig, DocumentInput, Documents, FileStore, SessionStore, auth, debug, fields,
};
use serde_json::Value;
use time::{OffsetDateTime, UtcOffset};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no session file location; pass --session-file or set EMINENT_SESSION_FILE")]
    NoSessionFile,
    #[error("could not read {path}: {source}")]
    ReadInput { path: String, source: io::Error },
    #[error("prompt failed: {0}")]
    Prompt(io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.error_code(),
            Self::NoSessionFile => "E_CONFIG",
            Self::ReadInput { .. } => "E_INPUT",
            Self::Prompt(_) => "E_PROMPT",
            Self::InvalidJson(_) => "E_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "eminent", about = "Store and verify documents with the Eminent backend")]
struct Cli {
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    #[arg(long, env = SESSION_FILE_ENV)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// Prompted (with confirmation) when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    /// Store a document; reads stdin when neither --text nor --file is given.
    Store {
        #[command(flatten)]
        content: ContentArgs,
        /// Display name saved with the document.
        #[arg(long)]
        name: Option<String>,
    },
    Fetch {
        id: String,
    },
    Verify {
        id: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// List recently stored documents.
    Recent,
    Debug(DebugCommand),
}

#[derive(Args, Debug)]
struct ContentArgs {
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DebugCommand {
    #[command(subcommand)]
    command: DebugSubcommand,
}

#[derive(Subcommand, Debug)]
enum DebugSubcommand {
    ClearAuth,
    ShowToken,
    ShowUser,
    TestApi,
    QuickFix,
}

impl Command {
    /// Screen this command stands in for; `None` runs ungated.
    fn route(&self) -> Option<Route> {
        match self {
            Self::Signup { .. } => Some(Route::Signup),
            Self::Login { .. } => Some(Route::Login),
            Self::Store { .. } => Some(Route::Store),
            Self::Verify { .. } => Some(Route::Verify),
            Self::Whoami | Self::Fetch { .. } | Self::Recent => Some(Route::Dashboard),
            Self::Logout | Self::Debug(_) => None,
        }
    }
}

struct CliContext {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    offset: UtcOffset,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Must be read while the process is still single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    init_tracing();

    let cli = Cli::parse();
    match run(cli, offset).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error[{}]: {e}", e.error_code());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

async fn run(cli: Cli, offset: UtcOffset) -> Result<ExitCode, CliError> {
    let config = ClientConfig::from_env().with_overrides(cli.api_url.as_deref(), cli.session_file);
    let path = config.session_file.clone().ok_or(CliError::NoSessionFile)?;
    let file_store = FileStore::new(path);
    tracing::debug!(base_url = %config.base_url, session_file = %file_store.path().display(), "config resolved");

    let store: Arc<dyn SessionStore> = Arc::new(file_store);
    let client = ApiClient::with_http(&config, Arc::clone(&store))?;
    let ctx = CliContext { client, store, offset };

    if let Some(requested) = cli.command.route() {
        let landed = guard::resolve(ctx.store.as_ref(), requested)?;
        if landed != requested {
            return redirected(&ctx, landed);
        }
    }

    match cli.command {
        Command::Signup { email, name, password } => run_signup(&ctx, &email, &name, password).await,
        Command::Login { email, password } => run_login(&ctx, &email, password).await,
        Command::Logout => {
            let auth = Auth::new(ctx.client.clone());
            let was = auth.state()?;
            auth.logout()?;
            println!("{}", render::logout(was));
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => {
            let profile = auth::load_user(ctx.store.as_ref())?;
            println!("{}", render::whoami(profile.as_ref()));
            Ok(ExitCode::SUCCESS)
        }
        Command::Store { content, name } => {
            let input = read_input(content)?;
            let stored = Documents::new(ctx.client.clone()).store(&input, name.as_deref()).await?;
            println!("{}", render::stored(&stored, ctx.offset));
            Ok(ExitCode::SUCCESS)
        }
        Command::Fetch { id } => {
            let reply = Documents::new(ctx.client.clone()).fetch(&id).await?;
            print_json(&reply)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { id, content } => {
            let input = read_input(content)?;
            let report = Documents::new(ctx.client.clone()).verify(&id, &input).await?;
            println!("{}", render::verification(&report, ctx.offset));
            Ok(if report.matched { ExitCode::SUCCESS } else { ExitCode::from(2) })
        }
        Command::Recent => {
            let docs = Documents::new(ctx.client.clone()).recent().await?;
            println!("{}", render::recent(&docs, ctx.offset));
            Ok(ExitCode::SUCCESS)
        }
        Command::Debug(cmd) => run_debug(&ctx, cmd).await,
    }
}

fn redirected(ctx: &CliContext, landed: Route) -> Result<ExitCode, CliError> {
    if landed == Route::Login {
        eprintln!("Not logged in. Run `eminent login --email <EMAIL>` first.");
        return Ok(ExitCode::FAILURE);
    }
    let profile = auth::load_user(ctx.store.as_ref())?;
    println!("Already logged in. {}", render::whoami(profile.as_ref()));
    Ok(ExitCode::SUCCESS)
}

async fn run_signup(ctx: &CliContext, email: &str, name: &str, password: Option<String>) -> Result<ExitCode, CliError> {
    let (password, confirmation) = match password {
        Some(p) => (p.clone(), p),
        None => (prompt_password("Password: ")?, prompt_password("Confirm password: ")?),
    };
    auth::validate_new_password(&password, &confirmation)?;

    let auth = Auth::new(ctx.client.clone());
    let reply = auth.signup(email, &password, name).await?;
    ensure_success(&reply, "Signup failed")?;
    println!("Account created. {}", render::whoami(auth.get_user()?.as_ref()));
    Ok(ExitCode::SUCCESS)
}

async fn run_login(ctx: &CliContext, email: &str, password: Option<String>) -> Result<ExitCode, CliError> {
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };
    let auth = Auth::new(ctx.client.clone());
    let reply = auth.login(email, &password).await?;
    ensure_success(&reply, "Login failed")?;
    println!("{}", render::whoami(auth.get_user()?.as_ref()));
    Ok(ExitCode::SUCCESS)
}

async fn run_debug(ctx: &CliContext, cmd: DebugCommand) -> Result<ExitCode, CliError> {
    let store = ctx.store.as_ref();
    match cmd.command {
        DebugSubcommand::ClearAuth => {
            debug::clear_auth(store)?;
            println!("All authentication data cleared. Log in again to continue.");
        }
        DebugSubcommand::ShowToken => {
            let report = debug::show_token(store, OffsetDateTime::now_utc())?;
            println!("{}", render::token(&report, ctx.offset));
        }
        DebugSubcommand::ShowUser => {
            println!("{}", render::user(debug::show_user(store)?.as_ref()));
        }
        DebugSubcommand::TestApi => {
            println!("Testing API connection...");
            let probe = debug::test_api(&ctx.client, now_ms()).await;
            println!("{}", render::probe(&probe));
            if !matches!(probe, debug::ApiProbe::Working { .. }) {
                return Ok(ExitCode::FAILURE);
            }
        }
        DebugSubcommand::QuickFix => {
            debug::quick_fix(store)?;
            println!("All data cleared");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn ensure_success(reply: &Value, fallback: &str) -> Result<(), CliError> {
    if fields::is_success(reply) {
        return Ok(());
    }
    Err(ApiError::Rejected(fields::message(reply).unwrap_or(fallback).to_owned()).into())
}

fn read_input(content: ContentArgs) -> Result<DocumentInput, CliError> {
    if let Some(text) = content.text {
        return Ok(DocumentInput::Text(text));
    }
    if let Some(path) = content.file {
        let bytes = std::fs::read(&path)
            .map_err(|source| CliError::ReadInput { path: path.display().to_string(), source })?;
        return Ok(DocumentInput::File { file_name: file_name_of(&path), bytes });
    }
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|source| CliError::ReadInput { path: "stdin".to_owned(), source })?;
    Ok(DocumentInput::Text(text))
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn prompt_password(label: &str) -> Result<String, CliError> {
    rpassword::prompt_password(label).map_err(CliError::Prompt)
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
