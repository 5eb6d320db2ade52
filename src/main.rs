use std::path::PathBuf;
use std::sync::Arc;

use blog_client::config::{ClientConfig, ConfigError};
use blog_client::controllers::FlowError;
use blog_client::controllers::create_post::CreatePostController;
use blog_client::controllers::header::{HeaderController, nav_links};
use blog_client::controllers::oauth::GoogleSignIn;
use blog_client::controllers::sign_up::{SignUpController, SignUpForm};
use blog_client::controllers::upload::UploadEvent;
use blog_client::net::api::HttpBlogApi;
use blog_client::net::identity::{FirebaseIdentity, IdentityError};
use blog_client::net::storage::{FirebaseStorage, LocalFile, StorageError};
use blog_client::net::types::ApiError;
use blog_client::routes::{MemoryHistory, Navigator, Route};
use blog_client::state::draft::CATEGORIES;
use blog_client::state::session::AppContext;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("failed to read {path}: {source}")]
    ReadImage { path: String, source: std::io::Error },
    #[error("invalid --field `{0}`; expected key=value")]
    InvalidField(String),
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "blog", about = "Blog client: accounts, posts and image uploads")]
struct Cli {
    /// Overrides `BLOG_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, env = "BLOG_SESSION_TOKEN")]
    session_token: Option<String>,

    /// Location the command starts from.
    #[arg(long, default_value = "/")]
    location: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    SignUp {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BLOG_PASSWORD")]
        password: String,
    },
    /// Exchange a Google ID token for a blog session.
    GoogleSignIn {
        #[arg(long, env = "GOOGLE_ID_TOKEN")]
        google_id_token: Option<String>,
    },
    SignOut,
    /// Create a post, optionally uploading a cover image first.
    Publish {
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "uncategorized")]
        category: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
        /// Extra draft field as key=value; JSON values are parsed.
        #[arg(long = "field")]
        fields: Vec<String>,
    },
    /// Print the search location for a term.
    Search { term: String },
    /// List header links and the route for `--location`.
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Missing .env is fine.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("ignoring .env: {e}");
        }
    }
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }

    let nav = MemoryHistory::new(&cli.location);
    let ctx = AppContext::default();
    let api = {
        let api = HttpBlogApi::from_config(&config)?;
        Arc::new(match cli.session_token {
            Some(token) => api.with_session_token(token),
            None => api,
        })
    };

    match cli.command {
        Command::SignUp { username, email, password } => {
            let mut form = SignUpForm::default();
            form.set_field("username", &username);
            form.set_field("email", &email);
            form.set_field("password", &password);
            SignUpController::new(api).submit(&form, &nav).await?;
        }
        Command::GoogleSignIn { google_id_token } => {
            let identity = FirebaseIdentity::from_config(&config)?.with_google_id_token(google_id_token);
            let user = GoogleSignIn::new(api, Arc::new(identity), ctx).run(&nav).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::SignOut => {
            HeaderController::new(api, ctx).sign_out(&nav).await?;
        }
        Command::Publish { title, category, content, image, fields } => {
            let storage = Arc::new(FirebaseStorage::from_config(&config)?);
            run_publish(api, storage, &nav, PublishArgs { title, category, content, image, fields }).await?;
        }
        Command::Search { term } => {
            let mut header = HeaderController::new(api, ctx);
            header.sync_from_location(&cli.location);
            header.set_search_term(&term);
            header.submit_search(&nav);
        }
        Command::Routes => {
            for link in nav_links(&cli.location) {
                let marker = if link.active { "*" } else { " " };
                println!("{marker} {:<10} {}", link.label, link.path);
            }
            match Route::parse(&cli.location) {
                Some(route) => println!("route: {route:?}"),
                None => println!("route: (unknown)"),
            }
        }
    }

    println!("{}", nav.location());
    Ok(())
}

struct PublishArgs {
    title: Option<String>,
    category: String,
    content: Option<String>,
    image: Option<PathBuf>,
    fields: Vec<String>,
}

async fn run_publish(
    api: Arc<HttpBlogApi>,
    storage: Arc<FirebaseStorage>,
    nav: &dyn Navigator,
    args: PublishArgs,
) -> Result<(), CliError> {
    if !CATEGORIES.iter().any(|(value, _)| *value == args.category) {
        return Err(CliError::UnknownCategory(args.category));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let mut editor = CreatePostController::new(api, storage).with_upload_events(tx);
    {
        let draft = editor.draft_mut();
        if let Some(title) = &args.title {
            draft.set_title(title);
        }
        draft.set_category(&args.category);
        if let Some(content) = &args.content {
            draft.set_content(content);
        }
        for field in &args.fields {
            let (key, raw) = field.split_once('=').ok_or_else(|| CliError::InvalidField(field.clone()))?;
            let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_owned()));
            if !draft.set(key, value) {
                return Err(CliError::InvalidField(field.clone()));
            }
        }
    }

    if let Some(path) = &args.image {
        let file = LocalFile::open(path)
            .await
            .map_err(|source| CliError::ReadImage { path: path.display().to_string(), source })?;
        editor.select_file(Some(file));

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let printer = tokio::spawn(print_upload_events(rx));
        let outcome = editor.upload_image(&cancel).await;
        if printer.await.is_err() {
            tracing::debug!("upload progress printer stopped early");
        }
        outcome?;
    }

    editor.publish(nav).await?;
    Ok(())
}

/// Render upload events on stderr until the transfer ends.
async fn print_upload_events(mut rx: mpsc::UnboundedReceiver<UploadEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            UploadEvent::Progress(percent) => eprint!("\rupload {percent:>3}%"),
            UploadEvent::Completed(url) => {
                eprintln!("\rupload done: {url}");
                break;
            }
            UploadEvent::Failed(message) => {
                eprintln!("\rupload failed: {message}");
                break;
            }
            UploadEvent::Cancelled => {
                eprintln!("\rupload cancelled");
                break;
            }
        }
    }
}
