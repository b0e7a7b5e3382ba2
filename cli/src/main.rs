//! CLI entrypoint for agent-tools
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use agent_tools_application::{RegistryError, RegistryService};
use agent_tools_domain::{
    InvocationId, RegisterProviderRequest, SearchQuery, ToolUpdate, resolve_requester,
};
use agent_tools_infrastructure::{
    ConfigLoader, ENV_PREFIX, FileConfig, MEMORY_PATH, PROJECT_CONFIG_FILES, SqliteStore,
    StoreOptions,
};
use agent_tools_presentation::{
    Cli, Command, InvocationCommand, OutputFormatter, ProviderCommand, ToolCommand, formatter_for,
    parse_payload, parse_register_request,
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type Service = RegistryService<SqliteStore>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let mut cli = Cli::parse();

    // --show-config is answered before any file is read
    if cli.show_config {
        print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?
    };

    init_tracing(cli.verbose, config.log.level.as_deref());

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config: {issue}");
        }
        bail!("invalid configuration ({} problems)", issues.len());
    }

    let Some(command) = cli.command.take() else {
        bail!("No command given. Run `agent-tools --help` for usage.");
    };

    let formatter = formatter_for(cli.output);
    let outcome = match command {
        Command::Init { force } => {
            return init_project(&config, force).map(|()| ExitCode::SUCCESS);
        }
        Command::Tool(cmd) => {
            let service = open_service(&cli, &config)?;
            let requester = resolve_requester(
                cli.as_provider
                    .as_deref()
                    .or(config.identity.provider_id.as_deref()),
            );
            debug!(requester = %requester, "Resolved requesting provider");
            run_tool(&service, &requester, cmd, formatter.as_ref()).await
        }
        Command::Provider(cmd) => {
            let service = open_service(&cli, &config)?;
            run_provider(&service, cmd, formatter.as_ref()).await
        }
        Command::Invocation(cmd) => {
            let service = open_service(&cli, &config)?;
            run_invocation(&service, cmd, formatter.as_ref()).await
        }
    };

    match outcome {
        Ok(output) => {
            print!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if e.is_retryable() {
                warn!(code = e.code(), "Command failed: {e}");
            }
            eprint!("{}", formatter.error(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Initialize logging: `-v` flags win, then `RUST_LOG`, then `log.level`
fn init_tracing(verbose: u8, configured: Option<&str>) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or("warn")))
            .unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// === Dependency Injection ===
/// Open the store and build a service that aborts on Ctrl-C or `--timeout`
fn open_service(cli: &Cli, config: &FileConfig) -> Result<Service> {
    let mut options = StoreOptions::from(&config.store);
    if let Some(db) = cli.db.as_deref() {
        options.path = db.to_path_buf();
    }
    info!(path = %options.path.display(), "Opening registry");
    let store = SqliteStore::open_with(options)
        .map_err(|e| anyhow::anyhow!("failed to open registry: {e}"))?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());
    let service = RegistryService::new(Arc::new(store)).with_cancellation(cancel);
    Ok(match cli.timeout {
        Some(secs) => service.with_timeout(Duration::from_secs(secs)),
        None => service,
    })
}

fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
}

fn print_config_sources(explicit: Option<&Path>) {
    println!("Configuration sources (highest priority first):");
    println!("  Environment: {}*", ENV_PREFIX);
    for source in ConfigLoader::sources(explicit) {
        let marker = if source.found { "found" } else { "not found" };
        println!("  {}: {} ({})", source.label, source.path.display(), marker);
    }
}

/// Write a starter config and create the database directory
fn init_project(config: &FileConfig, force: bool) -> Result<()> {
    let config_path = PathBuf::from(PROJECT_CONFIG_FILES[0]);
    if config_path.exists() && !force {
        println!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    } else {
        std::fs::write(&config_path, ConfigLoader::default_config_toml())
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("Wrote {}", config_path.display());
    }

    if config.store.path != MEMORY_PATH
        && let Some(dir) = Path::new(&config.store.path).parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        println!("Data directory: {}", dir.display());
    }
    Ok(())
}

fn read_request(file: &Path) -> Result<String, RegistryError> {
    let result = if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        std::fs::read_to_string(file)
    };
    result.map_err(|e| RegistryError::NotFound(format!("request file {}: {e}", file.display())))
}

async fn run_tool(
    service: &Service,
    requester: &str,
    command: ToolCommand,
    out: &dyn OutputFormatter,
) -> Result<String, RegistryError> {
    match command {
        ToolCommand::Register { file } => {
            let request = parse_register_request(&read_request(&file)?)?;
            let tool = service.register_tool(requester, request).await?;
            Ok(out.tool(&tool))
        }
        ToolCommand::Get { id } => Ok(out.tool(&service.get_tool(&id).await?)),
        ToolCommand::List { page } => {
            let result = service.list_tools(page.page, page.limit).await?;
            Ok(out.search_result(&result))
        }
        ToolCommand::Search {
            query,
            tag,
            provider,
            max_price,
            page,
        } => {
            let mut search = SearchQuery::new(query).with_page(page.page, page.limit);
            search.tag = tag;
            search.provider = provider;
            search.max_price_claw = max_price;
            Ok(out.search_result(&service.search_tools(&search).await?))
        }
        ToolCommand::Update(args) => {
            let id = args.id.clone();
            let update = ToolUpdate::try_from(args)?;
            let tool = service.update_tool(&id, requester, update).await?;
            Ok(out.tool(&tool))
        }
        ToolCommand::Deactivate { id } => {
            service.deactivate_tool(&id, requester).await?;
            Ok(out.message(&format!("Tool {id} deactivated")))
        }
    }
}

async fn run_provider(
    service: &Service,
    command: ProviderCommand,
    out: &dyn OutputFormatter,
) -> Result<String, RegistryError> {
    match command {
        ProviderCommand::Register {
            id,
            endpoint,
            pubkey,
            name,
            stake,
        } => {
            let request = RegisterProviderRequest::new(id, endpoint, pubkey)
                .with_name(name)
                .with_stake(stake);
            Ok(out.provider(&service.register_provider(request).await?))
        }
        ProviderCommand::Get { id } => Ok(out.provider(&service.get_provider(&id).await?)),
        ProviderCommand::List => Ok(out.providers(&service.list_providers().await?)),
    }
}

async fn run_invocation(
    service: &Service,
    command: InvocationCommand,
    out: &dyn OutputFormatter,
) -> Result<String, RegistryError> {
    let tracker = service.invocations();
    match command {
        InvocationCommand::Record {
            tool_id,
            consumer,
            input,
        } => {
            let payload = parse_payload(&input)?;
            let id = tracker.record_invocation(&tool_id, &consumer, &payload).await?;
            Ok(out.invocation(&tracker.get_invocation(&id).await?))
        }
        InvocationCommand::Complete {
            id,
            output_hash,
            receipt_sig,
            cost,
        } => {
            let id = InvocationId::from(id);
            tracker
                .complete_invocation(&id, &output_hash, &receipt_sig, &cost)
                .await?;
            Ok(out.invocation(&tracker.get_invocation(&id).await?))
        }
        InvocationCommand::Fail { id, reason } => {
            let id = InvocationId::from(id);
            tracker.fail_invocation(&id, &reason).await?;
            Ok(out.invocation(&tracker.get_invocation(&id).await?))
        }
        InvocationCommand::Timeout { id } => {
            let id = InvocationId::from(id);
            tracker.timeout_invocation(&id).await?;
            Ok(out.invocation(&tracker.get_invocation(&id).await?))
        }
        InvocationCommand::Get { id } => {
            Ok(out.invocation(&tracker.get_invocation(&InvocationId::from(id)).await?))
        }
        InvocationCommand::List { tool_id } => {
            Ok(out.invocations(&tracker.list_invocations(&tool_id).await?))
        }
    }
}
