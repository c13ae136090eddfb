// src/main.rs — TaskMaster entry point

use std::sync::Arc;

use clap::Parser;

use taskmaster::api::{ApiClient, TaskApi};
use taskmaster::cli::auth::AuthMode;
use taskmaster::cli::{self, AlreadyReported, Cli, Commands};
use taskmaster::core::view_model::TaskQuery;
use taskmaster::infra::config::Config;
use taskmaster::infra::errors::TaskMasterError;
use taskmaster::infra::logger;
use taskmaster::session::{check_gate, GateDecision, SessionScope};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects TASKMASTER_LOG / RUST_LOG)
    logger::init_logging(if cli.verbose { "debug" } else { "warn" });

    if let Err(e) = run(cli).await {
        if e.downcast_ref::<AlreadyReported>().is_none() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let mut config = if let Some(ref path) = cli.config {
        let mut config = Config::load_from(std::path::Path::new(path))?;
        config.apply_env();
        config
    } else {
        Config::load()?
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    config.validate()?;

    let mut scope = SessionScope::load_default()?;

    match check_gate(cli.command.gate(), scope.is_authenticated()) {
        GateDecision::Allow => {}
        GateDecision::RequireLogin => return Err(TaskMasterError::NotAuthenticated.into()),
        GateDecision::AlreadyAuthenticated if cli.command.forced() => {}
        GateDecision::AlreadyAuthenticated => {
            let email = scope.user().map(|u| u.email.as_str()).unwrap_or("unknown");
            println!("Already logged in as {email}.");
            println!("Run `taskmaster dashboard`, or pass --force to switch accounts.");
            return Ok(());
        }
    }

    let mut client = ApiClient::new(config.api.base_url.clone());
    if let Some(token) = scope.token() {
        client = client.with_token(token);
    }
    let client = Arc::new(client);
    let api: Arc<dyn TaskApi> = client.clone();

    match cli.command {
        Commands::Login {
            email, password, ..
        } => cli::auth::run_auth(AuthMode::Login, &mut scope, &client, email, password).await,
        Commands::Signup {
            email, password, ..
        } => cli::auth::run_auth(AuthMode::Signup, &mut scope, &client, email, password).await,
        Commands::Logout => cli::auth::run_logout(&mut scope),
        Commands::Whoami => cli::auth::run_whoami(&scope),
        Commands::Tasks {
            priority,
            status,
            sort,
            page,
            page_size,
        } => {
            let mut query = TaskQuery::new()
                .with_page(page)
                .with_page_size(page_size.unwrap_or(config.view.page_size))
                .with_sort(match sort {
                    Some(s) => s,
                    None => config.view.sort_order()?,
                });
            query.priority = priority;
            query.status = status;
            cli::tasks::run_list(api.as_ref(), query).await
        }
        Commands::Add {
            title,
            priority,
            start,
            end,
        } => cli::tasks::run_add(api, title, priority, start, end).await,
        Commands::Edit {
            id,
            title,
            priority,
            status,
            start,
            end,
        } => cli::tasks::run_edit(api, &id, title, priority, status, start, end).await,
        Commands::Finish { id } => cli::tasks::run_finish(api, &id).await,
        Commands::Delete { ids } => cli::tasks::run_delete(api, &ids).await,
        Commands::Stats => cli::stats::show_stats(api.as_ref()).await,
        Commands::Dashboard => taskmaster::tui::run_dashboard(api, &config).await,
    }
}
