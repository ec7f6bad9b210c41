use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use lookout_core::{BotConfig, PullRequestContext, Severity, DEFAULT_CONFIG_FILE};
use lookout_review::engine::LlmReviewEngine;
use lookout_review::github::{parse_pr_reference, GitHubClient, PullRequestHost};
use lookout_review::heuristics::{HeuristicEngine, RuleRegistry};
use lookout_review::jwt::AppJwtIssuer;
use lookout_review::llm::OllamaClient;
use lookout_review::pipeline::{ReviewOrchestrator, ReviewPipeline};
use lookout_server::dispatch::OrchestratorDispatcher;
use lookout_server::signature::SignatureVerifier;
use lookout_server::webhook::AppState;

#[derive(Parser)]
#[command(
    name = "lookout",
    version,
    about = "Pull-request review bot: pattern rules plus an LLM reviewer",
    long_about = "lookout reviews pull requests with fast pattern rules and a local LLM,\n\
                  then posts one consolidated comment per pull request.\n\n\
                  Examples:\n  \
                    lookout serve                         Run the GitHub App webhook server\n  \
                    git diff main | lookout review        Review a diff from stdin\n  \
                    lookout review --file pr.diff --no-llm  Heuristics only\n  \
                    lookout check-llm                     Check the LLM endpoint\n  \
                    lookout init                          Write a default lookout.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: lookout.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server
    #[command(long_about = "Run the webhook server.\n\n\
        Listens on server.bind_address for GitHub `pull_request` events at\n\
        POST /webhook/github and answers health checks at GET /webhook/health.\n\
        Requires github.app.id, github.app.private_key_path and\n\
        github.app.webhook_secret.")]
    Serve,
    /// Review a unified diff locally without touching GitHub
    #[command(long_about = "Review a unified diff locally.\n\n\
        Runs the same parse, heuristics, LLM and merge steps as the server and\n\
        prints the result. Nothing is posted to GitHub.\n\n\
        Examples:\n  git diff main | lookout review\n  lookout review --file changes.patch --format markdown")]
    Review {
        /// Read diff from file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
        /// Pull request title passed to the LLM
        #[arg(long)]
        title: Option<String>,
        /// Pull request description passed to the LLM
        #[arg(long)]
        description: Option<String>,
        /// Label the review with a PR reference (owner/repo#number)
        #[arg(long)]
        pr: Option<String>,
        /// Skip the LLM reviewer
        #[arg(long)]
        no_llm: bool,
        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
        /// Exit with non-zero code if findings meet severity threshold
        #[arg(
            long,
            long_help = "Exit with non-zero code if findings of this severity or higher are found.\n\n\
                Severity ranking: critical > high > medium > low > info."
        )]
        fail_on: Option<Severity>,
    },
    /// Check that the LLM endpoint is reachable
    CheckLlm,
    /// Write a default lookout.toml in the current directory
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON with camelCase keys
    Json,
    /// The comment body that would be published
    Markdown,
}

const DEFAULT_CONFIG: &str = r#"# lookout configuration
# Every key is optional; LOOKOUT_* environment variables override this file.

[github]
api_url = "https://api.github.com"

[github.app]
# id = 12345
# client_id = "Iv1.0000000000000000"
# private_key_path = "/etc/lookout/app.pem"
# webhook_secret = "change-me"

[llm]
model = "qwen2.5-coder:7b"
base_url = "http://localhost:11434"
timeout_seconds = 60
enabled = true

[app]
max_diff_size_bytes = 1048576
max_files_per_pr = 50
heuristics_enabled = true
llm_enabled = true
enable_comment_deletion = false

[server]
bind_address = "0.0.0.0:8080"
"#;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_diff_input(file: &Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

fn build_llm_engine(config: &BotConfig) -> Result<Option<LlmReviewEngine>> {
    if !config.llm_branch_enabled() {
        return Ok(None);
    }
    let client = OllamaClient::new(&config.llm)?;
    Ok(Some(LlmReviewEngine::new(Arc::new(client))))
}

fn heuristic_engine() -> HeuristicEngine {
    let registry = RuleRegistry::with_builtin_rules();
    tracing::debug!(rules = ?registry.names(), "heuristic rules registered");
    HeuristicEngine::new(registry)
}

async fn run_server(config: &BotConfig) -> Result<()> {
    config.validate_for_server()?;
    let app = &config.github.app;
    let (Some(app_id), Some(key_path)) = (app.id, app.private_key_path.as_deref()) else {
        miette::bail!("github.app.id and github.app.private_key_path are required");
    };

    let issuer = AppJwtIssuer::from_file(app_id, key_path)
        .wrap_err(format!("loading private key {}", key_path.display()))?;
    let host: Arc<dyn PullRequestHost> =
        Arc::new(GitHubClient::new(&config.github.api_url, Arc::new(issuer))?);

    let pipeline =
        ReviewPipeline::from_config(config, heuristic_engine(), build_llm_engine(config)?);
    let orchestrator = Arc::new(ReviewOrchestrator::new(
        host,
        pipeline,
        config.app.enable_comment_deletion,
    ));

    let state = Arc::new(AppState {
        verifier: SignatureVerifier::new(app.webhook_secret.clone()),
        dispatcher: Arc::new(OrchestratorDispatcher::new(orchestrator)),
    });

    tracing::info!(
        app_id,
        heuristics = config.app.heuristics_enabled,
        llm = config.llm_branch_enabled(),
        model = %config.llm.model,
        "starting lookout"
    );
    lookout_server::serve(&config.server.bind_address, state).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = BotConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => run_server(&config).await?,
        Command::Review {
            file,
            title,
            description,
            pr,
            no_llm,
            format,
            fail_on,
        } => {
            let diff = read_diff_input(&file)?;

            let mut context = PullRequestContext {
                title: title.unwrap_or_default(),
                description,
                ..PullRequestContext::default()
            };
            if let Some(reference) = pr {
                let (owner, repo, number) = parse_pr_reference(&reference)?;
                context.owner = owner;
                context.repo = repo;
                context.pr_number = number;
            }

            let llm = if no_llm {
                None
            } else {
                build_llm_engine(&config)?
            };
            let pipeline = ReviewPipeline::from_config(&config, heuristic_engine(), llm);

            let Some(result) = pipeline.analyze(&context, &diff).await? else {
                miette::bail!(
                    "diff is {} bytes, larger than app.max_diff_size_bytes ({})",
                    diff.len(),
                    config.app.max_diff_size_bytes
                );
            };

            match format {
                OutputFormat::Text => print!("{result}"),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
                }
                OutputFormat::Markdown => print!("{}", result.to_markdown()),
            }

            if let Some(threshold) = fail_on {
                let has_findings = result
                    .findings
                    .iter()
                    .any(|f| f.severity.meets_threshold(threshold));
                if has_findings {
                    std::process::exit(1);
                }
            }
        }
        Command::CheckLlm => {
            let client = OllamaClient::new(&config.llm)?;
            if !client.is_available().await {
                miette::bail!("LLM endpoint {} is not reachable", config.llm.base_url);
            }
            println!(
                "LLM endpoint {} is reachable (model: {})",
                config.llm.base_url, config.llm.model
            );
        }
        Command::Init => {
            let path = std::path::Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                miette::bail!("{DEFAULT_CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {DEFAULT_CONFIG_FILE} with default configuration");
        }
    }

    Ok(())
}
