use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docchat_cli::{
    config::CliConfig,
    handlers::{account, chat, library},
    state::CliState,
};

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Chat with your documents from the terminal", version)]
struct Cli {
    /// API base URL, overrides configuration
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print listings as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Sign in before running the command
    #[arg(long, global = true, env = "DOCCHAT_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "DOCCHAT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the user
    Login,
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Create an account; a one-time password is emailed
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Confirm a registration with the emailed one-time password
    Verify { email: String, otp: String },
    ResendOtp { email: String },

    /// List folders
    Folders,
    /// Create a folder
    Mkdir { name: String },
    RenameFolder { folder_id: String, name: String },
    DeleteFolder { folder_id: String },

    /// List threads of a folder, or the recent threads
    Threads {
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Start a new thread in a folder
    NewThread { folder_id: String, name: String },
    RenameThread { thread_id: String, name: String },
    DeleteThread { thread_id: String },

    /// Interactive chat on a thread
    Chat { thread_id: String },
    /// Ask one question and print the answer
    Ask { thread_id: String, message: String },

    /// List files of a folder
    Files { folder_id: String },
    /// Upload a document into a folder
    Upload {
        folder_id: String,
        path: PathBuf,
        /// Wait until the server finishes processing
        #[arg(long)]
        wait: bool,
    },
    DeleteFile { file_id: String },

    /// List who a folder is shared with
    Collaborators { folder_id: String },
    Share { folder_id: String, email: String },
    Unshare { folder_id: String, email: String },
    /// Find users to share with
    Search {
        query: String,
        /// Hide users already sharing this folder
        #[arg(short, long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = CliConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config);
    tracing::debug!("Using API at {}", config.api.base_url);

    let state = CliState::new(config, cli.json)?;
    let watcher = state.context.watch_session();

    if let Commands::Login = cli.command {
        let (email, password) = credentials(&cli)?;
        let user = account::login(&state, email, password).await?;
        println!("Signed in as {}", user.email);
        return Ok(());
    }
    if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        account::login(&state, email, password).await?;
    }

    // Chat commands print notices live
    let streams_notices = matches!(cli.command, Commands::Chat { .. } | Commands::Ask { .. });
    let mut notices = state.context.notifier().subscribe();

    let result = run(&state, cli.command).await;
    if !streams_notices {
        while let Ok(notice) = notices.try_recv() {
            chat::print_notice(&notice);
        }
    }
    watcher.abort();
    result
}

async fn run(state: &CliState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login => Ok(()),
        Commands::Logout => account::logout(state).await,
        Commands::Whoami => account::whoami(state).await,
        Commands::Register { name, email, password } => {
            account::register(state, &name, &email, &password).await
        }
        Commands::Verify { email, otp } => account::verify(state, &email, &otp).await,
        Commands::ResendOtp { email } => account::resend_otp(state, &email).await,

        Commands::Folders => library::list_folders(state).await,
        Commands::Mkdir { name } => library::create_folder(state, &name).await,
        Commands::RenameFolder { folder_id, name } => {
            library::rename_folder(state, &folder_id, &name).await
        }
        Commands::DeleteFolder { folder_id } => library::delete_folder(state, &folder_id).await,

        Commands::Threads { folder } => library::list_threads(state, folder.as_deref()).await,
        Commands::NewThread { folder_id, name } => {
            library::create_thread(state, &folder_id, &name).await
        }
        Commands::RenameThread { thread_id, name } => {
            library::rename_thread(state, &thread_id, &name).await
        }
        Commands::DeleteThread { thread_id } => library::delete_thread(state, &thread_id).await,

        Commands::Chat { thread_id } => chat::repl(state, &thread_id).await,
        Commands::Ask { thread_id, message } => chat::ask(state, &thread_id, &message).await,

        Commands::Files { folder_id } => library::list_files(state, &folder_id).await,
        Commands::Upload { folder_id, path, wait } => {
            library::upload(state, &folder_id, &path, wait).await
        }
        Commands::DeleteFile { file_id } => library::delete_file(state, &file_id).await,

        Commands::Collaborators { folder_id } => {
            library::list_collaborators(state, &folder_id).await
        }
        Commands::Share { folder_id, email } => library::share(state, &folder_id, &email).await,
        Commands::Unshare { folder_id, email } => {
            library::unshare(state, &folder_id, &email).await
        }
        Commands::Search { query, folder } => {
            account::search(state, &query, folder.as_deref()).await
        }
    }
}

fn credentials(cli: &Cli) -> anyhow::Result<(&str, &str)> {
    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => anyhow::bail!("login needs --email and --password (or DOCCHAT_EMAIL / DOCCHAT_PASSWORD)"),
    }
}

fn init_logging(config: &CliConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so streamed answers stay clean on stdout
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
