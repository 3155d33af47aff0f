mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use vl_av::{probe, ToolRegistry};
use vl_core::config::Config;
use vl_db::queries::pending_outputs;
use vl_server::links::LinkManager;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults based on the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidlink=trace,vl_server=trace,vl_av=debug,vl_db=debug,vl_core=debug,tower_http=debug"
                .to_string()
        } else {
            "vidlink=info,vl_server=info,vl_av=info,vl_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::load_or_default(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(vl_server::start(config))?;
            Ok(())
        }
        Commands::Probe { file, json } => {
            let config = Config::load_or_default(cli.config.as_deref());
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&config, &file, json))
        }
        Commands::CheckTools => {
            let config = Config::load_or_default(cli.config.as_deref());
            check_tools(&config)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Reconcile { force } => {
            let config = Config::load_or_default(cli.config.as_deref());
            reconcile(&config, force)
        }
        Commands::PruneLinks { older_than_hours } => {
            let config = Config::load_or_default(cli.config.as_deref());
            prune_links(&config, older_than_hours)
        }
        Commands::Version => {
            println!("vidlink {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let tools = ToolRegistry::discover_default(&config.tools);
    let duration = probe::probe_duration(&tools, file).await?;
    let accepted = config.limits.accepts(duration);

    if json {
        let out = serde_json::json!({
            "file": file,
            "duration": duration,
            "accepted": accepted,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("File: {}", file.display());
        println!("Duration: {duration:.3}s");
        println!(
            "Upload limits: {}-{}s ({})",
            config.limits.min_duration_secs,
            config.limits.max_duration_secs,
            if accepted { "accepted" } else { "rejected" }
        );
    }

    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover_default(&config.tools);
    let mut all_ok = true;

    for tool in tools.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("Some tools are missing. Install ffmpeg to process videos.")
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        for warning in &warnings {
            println!("⚠ {warning}");
        }
    }
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Storage: {}", config.storage.root_dir.display());
    println!(
        "  Duration limits: {}-{}s",
        config.limits.min_duration_secs, config.limits.max_duration_secs
    );
    println!("  Max upload: {} MB", config.storage.max_upload_mb);
    println!("  Auth enabled: {}", config.auth.enabled);

    Ok(())
}

fn reconcile(config: &Config, force: bool) -> Result<()> {
    let db = vl_server::open_database(config)?;

    // A marker younger than the transcode timeout may belong to a live server.
    let cutoff = i64::try_from(config.transcode.timeout_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
    let recent = {
        let conn = vl_db::pool::get_conn(&db)?;
        pending_outputs::list_pending(&conn)?
            .into_iter()
            .filter(|m| m.created_at > cutoff)
            .count()
    };
    if recent > 0 && !force {
        anyhow::bail!(
            "{recent} write(s) started within the last {}s; a server may be running. \
             Stop it first or pass --force.",
            config.transcode.timeout_secs
        );
    }

    println!("Warning: reconcile deletes in-flight writes; make sure no server is running.");
    let storage = vl_server::storage::Storage::new(config.storage.root_dir.clone());
    storage.ensure_layout()?;
    let report = vl_server::reconcile::reconcile(&db, &storage)?;

    println!("Orphaned outputs removed: {}", report.orphaned_outputs);
    println!("Stale markers cleared: {}", report.stale_markers);
    println!("Staging files removed: {}", report.staging_files);
    Ok(())
}

fn prune_links(config: &Config, older_than_hours: u32) -> Result<()> {
    let db = vl_server::open_database(config)?;
    let storage = vl_server::storage::Storage::new(config.storage.root_dir.clone());
    let links = LinkManager::new(db, storage);

    let cutoff = Utc::now() - Duration::hours(i64::from(older_than_hours));
    let removed = links.prune_expired(cutoff)?;
    println!("Removed {removed} expired link(s)");
    Ok(())
}
