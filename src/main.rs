use std::path::PathBuf;
use std::sync::Arc;
use virtual_ta::cli::{Cli, Commands, ConfigAction};
use virtual_ta::config::Config;
use virtual_ta::error::{Result, TaError};
use virtual_ta::qa::QaEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Serve { host, port, warm } => {
            cmd_serve(cli.config, host, port, warm).await?;
        }
        Commands::Ask { question, json } => {
            cmd_ask(cli.config, &question, json).await?;
        }
        Commands::Index { json } => {
            cmd_index(cli.config, json).await?;
        }
        Commands::Search { query, k, json } => {
            cmd_search(cli.config, &query, k, json).await?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose {
        "virtual_ta=debug,tower_http=debug"
    } else {
        "virtual_ta=info,tower_http=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::load_or_default(&path)
}

/// Model loading blocks (and downloads weights on first use)
async fn build_engine(config: &Config) -> Result<QaEngine> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || QaEngine::from_config(&config)).await?
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| TaError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })
}

async fn cmd_serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    warm: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine = Arc::new(build_engine(&config).await?);
    virtual_ta::server::serve(engine, &config.server, warm).await
}

async fn cmd_ask(config_path: Option<PathBuf>, question: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config).await?;
    let response = engine.answer(question).await?;

    if json {
        println!("{}", to_json(&response)?);
        return Ok(());
    }

    if response.answer.is_empty() {
        println!("No answer found in the course material.");
    } else {
        println!("{}", response.answer);
    }

    if !response.links.is_empty() {
        println!();
        println!("Sources:");
        for link in &response.links {
            println!("  - {}", link.url);
            println!("    {}", link.text);
        }
    }

    Ok(())
}

async fn cmd_index(config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config).await?;
    let kb = engine.warm_up().await?;
    let stats = kb.stats();

    if json {
        println!("{}", to_json(stats)?);
        return Ok(());
    }

    println!("✓ Knowledge base built in {}ms", stats.build_ms);
    println!("  Documents:   {}", stats.documents);
    println!(
        "    course:    {} ({:?}, {} skipped)",
        stats.course_documents, stats.sources.course.status, stats.sources.course.skipped
    );
    println!(
        "    forum:     {} ({:?}, {} skipped)",
        stats.forum_documents, stats.sources.forum.status, stats.sources.forum.skipped
    );
    println!("  Model:       {}", stats.embedding_model);
    println!("  Dimension:   {}", stats.dimension);
    println!("  Fingerprint: {}", stats.fingerprint);

    Ok(())
}

async fn cmd_search(config_path: Option<PathBuf>, query: &str, k: usize, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = build_engine(&config).await?;
    let results = engine.search(query, k).await?;

    if json {
        println!("{}", to_json(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No documents indexed.");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} (row {})",
            rank + 1,
            result.score,
            result.document.source_url,
            result.row
        );
        println!("   {}", result.document.display_snippet.replace('\n', " "));
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("{}", to_json(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Override rules: {}", config.overrides.len());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| TaError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}
