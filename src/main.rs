
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use recipebox::bench::{self, BenchConfig};
use recipebox::client::{self, ClientError, status};
use recipebox::config::{DEFAULT_CATALOG_SERVICE_URL, DEFAULT_USER_SERVICE_URL};
use recipebox::net::types::{ApiError, ImageUpload, NewRecipe, RecipeUpdate};
use recipebox::session::Action;
use recipebox::{ClientConfig, FileTokenStore, HttpBackend, RecipeClient};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("http client setup failed: {0}")]
    Api(#[from] ApiError),
    #[error("no token file location; pass --token-file or set RECIPEBOX_TOKEN_FILE")]
    NoTokenFile,
    #[error("failed to read image {}: {source}", .path.display())]
    Image { path: PathBuf, source: std::io::Error },
    /// Failure already printed in place of the command's output.
    #[error("request failed")]
    Reported,
}

#[derive(Parser, Debug)]
#[command(name = "recipebox", about = "Recipe demo client: log in, then create and list recipes")]
struct Cli {
    #[arg(long, env = "RECIPEBOX_USER_URL", default_value = DEFAULT_USER_SERVICE_URL)]
    user_url: String,

    #[arg(long, env = "RECIPEBOX_CATALOG_URL", default_value = DEFAULT_CATALOG_SERVICE_URL)]
    catalog_url: String,

    /// File holding the persisted bearer token.
    #[arg(long, env = "RECIPEBOX_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Whole-request timeout in seconds. Requests wait indefinitely when unset.
    #[arg(long, env = "RECIPEBOX_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// TCP connect timeout in seconds.
    #[arg(long, env = "RECIPEBOX_CONNECT_TIMEOUT_SECS")]
    connect_timeout_secs: Option<u64>,

    /// Log requests and session transitions to stderr.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the session restored from the token file.
    Status,
    Login {
        username: String,
        #[arg(long, env = "RECIPEBOX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Register {
        username: String,
        #[arg(long, env = "RECIPEBOX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Check the stored token against the user service.
    Whoami,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        instructions: String,
        /// Image file to attach.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    List,
    Update {
        recipe_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        instructions: Option<String>,
    },
    /// Load-test recipe creation with the stored token.
    Bench {
        #[arg(long, default_value_t = bench::DEFAULT_REQUESTS)]
        requests: usize,
        /// Concurrency levels to run, one pass each.
        #[arg(long, value_delimiter = ',', default_values_t = bench::DEFAULT_WORKER_COUNTS)]
        workers: Vec<usize>,
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}

type Client = RecipeClient<HttpBackend, FileTokenStore>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Reported) => ExitCode::FAILURE,
        Err(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = client_config(&cli);
    let token_file = cli
        .token_file
        .or_else(FileTokenStore::default_path)
        .ok_or(CliError::NoTokenFile)?;
    let backend = HttpBackend::new(&config)?;
    let mut client = RecipeClient::new(backend, FileTokenStore::new(token_file));
    let restored = client.initialize();

    match cli.command {
        Command::Status => {
            print_session(&client);
            if restored {
                println!("{}", status::RESTORED);
            }
            let enabled = client
                .view()
                .enabled_actions()
                .into_iter()
                .map(Action::label)
                .collect::<Vec<_>>();
            println!("Enabled actions: {}", enabled.join(", "));
            Ok(())
        }
        Command::Login { username, password } => {
            eprintln!("{}", status::LOGGING_IN);
            let result = client.login(&username, &password).await;
            print_session(&client);
            result?;
            println!("{}", status::LOGIN_SUCCESS);
            Ok(())
        }
        Command::Logout => {
            client.logout();
            print_session(&client);
            println!("{}", status::LOGGED_OUT);
            Ok(())
        }
        Command::Register { username, password } => {
            eprintln!("{}", status::REGISTERING);
            client.register(&username, &password).await?;
            println!("{}", status::REGISTER_SUCCESS);
            Ok(())
        }
        Command::Whoami => {
            let user_id = client.whoami().await?;
            println!("{}", client::whoami_status(&user_id));
            Ok(())
        }
        Command::Create { title, instructions, image } => {
            let image = image.as_deref().map(read_image).transpose()?;
            eprintln!("{}", status::CREATING_RECIPE);
            let created = client
                .create_recipe(NewRecipe { title, instructions, image })
                .await?;
            println!("{}", client::created_status(&created));
            Ok(())
        }
        Command::List => run_list(&mut client).await,
        Command::Update { recipe_id, title, instructions } => {
            eprintln!("{}", status::UPDATING_RECIPE);
            client
                .update_recipe(&recipe_id, &RecipeUpdate { title, instructions })
                .await?;
            println!("{}", status::UPDATE_SUCCESS);
            Ok(())
        }
        Command::Bench { requests, workers, timeout_secs } => {
            run_bench(&client, requests, &workers, Duration::from_secs(timeout_secs)).await
        }
    }
}

fn client_config(cli: &Cli) -> ClientConfig {
    let secs = |v: Option<u64>| v.filter(|s| *s > 0).map(Duration::from_secs);
    ClientConfig {
        request_timeout: secs(cli.request_timeout_secs),
        connect_timeout: secs(cli.connect_timeout_secs),
        ..ClientConfig::new(&cli.user_url, &cli.catalog_url)
    }
}

async fn run_list(client: &mut Client) -> Result<(), CliError> {
    if client.session().is_active() {
        eprintln!("{}", status::FETCHING);
    }
    let result = client.list_recipes().await;
    for line in client::recipe_lines(&result) {
        println!("{line}");
    }
    result.map(|_| ()).map_err(|_| CliError::Reported)
}

async fn run_bench(
    client: &Client,
    requests: usize,
    workers: &[usize],
    timeout: Duration,
) -> Result<(), CliError> {
    let token = client.session().token().ok_or(ClientError::NotLoggedIn)?;
    let backend = client.backend();
    for &worker_count in workers {
        let config = BenchConfig { requests, workers: worker_count, request_timeout: timeout };
        let report = bench::run(backend, token, &config).await;
        for line in report.lines() {
            println!("{line}");
        }
        println!();
    }
    Ok(())
}

fn print_session(client: &Client) {
    println!("{}", client.view().token_display);
}

fn read_image(path: &Path) -> Result<ImageUpload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Image { path: path.to_owned(), source })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_owned(), |n| n.to_string_lossy().into_owned());
    Ok(ImageUpload { mime: guess_mime(path).map(ToOwned::to_owned), file_name, bytes })
}

fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
