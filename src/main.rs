use clap::{Parser, Subcommand, ValueEnum};
use forkedit::config::Config;
use forkedit::error::{ForkeditError, Result};
use forkedit::github::client::ProxyClient;
use forkedit::github::types::RepoName;
use forkedit::preview::fetcher::OctocrabFetcher;
use forkedit::preview::{self, PreviewRequest};
use forkedit::session::Session;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forkedit", about = "Edit repository content through a fork and a pull request")]
struct Cli {
    #[arg(long, short, help = "Path to config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Base repository (owner/repo)")]
    repo: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve preview props for a file on a fork
    Preview {
        #[arg(long)]
        fork: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        path: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    #[command(flatten)]
    Edit(EditCommand),
}

#[derive(Subcommand)]
enum EditCommand {
    /// Show the signed-in user
    Whoami,
    /// Fork the base repository and remember the fork
    Fork,
    /// Show the fork and whether you can push to it
    Repo,
    #[command(subcommand)]
    Pr(PrCommand),
    #[command(subcommand)]
    Branch(BranchCommand),
    /// Switch the working branch
    Checkout { branch: String },
    /// Print a file from the working branch
    Cat { path: String },
    /// Commit a local file to the working branch
    Commit {
        /// Path in the repository
        path: String,
        /// Local file with the new content
        #[arg(long)]
        from: PathBuf,
        /// Blob sha being replaced; fetched from the branch when omitted
        #[arg(long)]
        sha: Option<String>,
        #[arg(long, short)]
        message: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrCommand {
    /// Open a pull request from the working branch
    Create {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Find an open pull request for the working branch
    Find,
}

#[derive(Subcommand)]
enum BranchCommand {
    /// Show the working branch head
    Show,
    /// Create a branch off the working branch
    Create {
        name: String,
        #[arg(long, help = "Switch to the new branch")]
        checkout: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
    Text,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.clone());
    tracing::debug!(?config, "loaded config");

    if let Err(e) = run(cli, config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Preview {
            fork,
            branch,
            path,
            format,
        } => run_preview(&config, fork, branch, path, format).await,
        Command::Edit(command) => run_edit(command, cli.repo, &config).await,
    }
}

async fn run_edit(command: EditCommand, repo: Option<String>, config: &Config) -> Result<()> {
    let session_path = config.session_path();
    let session = Session::load(&session_path)?;
    let base_repo: RepoName = repo
        .or_else(|| config.base_repo.clone())
        .ok_or_else(|| ForkeditError::Config("no base repository configured".to_string()))?
        .parse()?;

    let mut client = ProxyClient::new(&config.proxy_url, base_repo, &config.base_branch, session)?
        .with_api_base(&config.api_base);

    match command {
        EditCommand::Whoami => match client.get_current_user().await? {
            Some(user) => println!("{}", user.login),
            None => println!("not signed in"),
        },
        EditCommand::Fork => {
            let fork = client.create_fork().await?;
            println!("{}", fork.full_name);
        }
        EditCommand::Repo => {
            let can_push = client.is_authorized().await?;
            println!("{} (push: {can_push})", client.session().fork()?);
        }
        EditCommand::Pr(PrCommand::Create { title, body }) => {
            let pr = client.create_pull_request(&title, &body).await?;
            println!("#{} {}", pr.number, pr.html_url.unwrap_or_default());
        }
        EditCommand::Pr(PrCommand::Find) => match client.find_existing_pull_request().await? {
            Some(pr) => println!("#{} {}", pr.number, pr.html_url.unwrap_or_default()),
            None => println!("no open pull request for {}", client.session().head_branch()),
        },
        EditCommand::Branch(BranchCommand::Show) => match client.get_branch_ref().await? {
            Some(r) => println!("{} {}", r.ref_name, r.object.sha),
            None => println!("{} does not exist yet", client.session().head_branch()),
        },
        EditCommand::Branch(BranchCommand::Create { name, checkout }) => {
            let created = client.create_branch(&name).await?;
            println!("{} {}", created.ref_name, created.object.sha);
            if checkout {
                client.checkout(&name);
            }
        }
        EditCommand::Checkout { branch } => client.checkout(&branch),
        EditCommand::Cat { path } => {
            let file = client.fetch_file(&path).await?;
            print!("{}", file.content);
        }
        EditCommand::Commit {
            path,
            from,
            sha,
            message,
        } => {
            let content = std::fs::read_to_string(&from)?;
            let sha = match sha {
                Some(s) => s,
                None => client.fetch_file(&path).await?.sha,
            };
            let result = client
                .commit_file(&path, &sha, &content, message.as_deref())
                .await?;
            println!("{}", result.commit.sha);
        }
    }

    client.into_session().save(&session_path)
}

async fn run_preview(
    config: &Config,
    fork: Option<String>,
    branch: Option<String>,
    path: String,
    format: Format,
) -> Result<()> {
    let session = Session::load(&config.session_path())?;
    let request = PreviewRequest {
        github_access_token: config.github_token.clone(),
        fork_full_name: match fork {
            Some(f) => f,
            None => session.fork()?.to_string(),
        },
        head_branch: branch.unwrap_or_else(|| session.head_branch().to_string()),
        file_relative_path: path,
    };
    let fetcher = OctocrabFetcher::with_base_uri(&config.api_base);

    let out = match format {
        Format::Json => serde_json::to_string_pretty(
            &preview::get_github_preview_props(&request, &fetcher, preview::parse_json::<serde_json::Value>)
                .await?,
        )?,
        Format::Toml => serde_json::to_string_pretty(
            &preview::get_github_preview_props(&request, &fetcher, preview::parse_toml::<serde_json::Value>)
                .await?,
        )?,
        Format::Text => serde_json::to_string_pretty(
            &preview::get_github_preview_props(&request, &fetcher, preview::parse_text).await?,
        )?,
    };
    println!("{out}");
    Ok(())
}
