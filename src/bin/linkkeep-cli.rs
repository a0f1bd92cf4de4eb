use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use linkkeep::config::Config;
use linkkeep::format::{format_age, format_expiry, truncate_url};
use linkkeep::models::LinkRecord;
use linkkeep::registry::LinkRegistry;
use linkkeep::storage::open_storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linkkeep-cli")]
#[command(about = "Shorten links and manage the link history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shorten a URL
    Shorten {
        /// URL to shorten (https:// is assumed when no scheme is given)
        url: String,
        /// Use this alias instead of a generated code
        #[arg(long)]
        alias: Option<String>,
        /// Expire the link after this many hours
        #[arg(long)]
        expiry_hours: Option<i64>,
    },
    /// List recent live links
    List {
        /// Maximum number of links to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record a click on a link
    Click {
        /// Short code
        code: String,
    },
    /// Remove expired links
    Sweep,
    /// Delete a link
    Remove {
        /// Short code
        code: String,
    },
}

fn print_link(link: &LinkRecord) {
    let now = Utc::now();
    println!("{:<12} {}", link.short_code, link.short_url);
    println!("    {}", truncate_url(&link.long_url, 50));
    let mut meta = format!(
        "    {} clicks · created {}",
        link.clicks,
        format_age(link.created_at, now)
    );
    if let Some(expires_at) = link.expires_at {
        meta.push_str(&format!(" · expires {}", format_expiry(expires_at, now)));
    }
    println!("{meta}");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = open_storage(&config.storage)
        .await
        .context("failed to open link storage")?;
    let mut registry = LinkRegistry::open(storage, config.registry.options()).await;

    let changed = match cli.command {
        Commands::Shorten {
            url,
            alias,
            expiry_hours,
        } => {
            let delay = config.registry.create_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match registry.create(&url, alias.as_deref(), expiry_hours).await {
                Ok(link) => {
                    println!("✓ Shortened");
                    print_link(&link);
                    true
                }
                Err(e) => anyhow::bail!("{e}"),
            }
        }
        Commands::List { limit } => {
            let links = registry.list_active(limit.unwrap_or(config.registry.recent_limit));
            if links.is_empty() {
                println!("No links yet. Create your first one!");
            } else {
                for link in &links {
                    print_link(link);
                }
            }
            false
        }
        Commands::Click { code } => match registry.track_click(&code).await {
            Some(link) => {
                println!("✓ '{}' now has {} clicks", link.short_code, link.clicks);
                true
            }
            None => {
                println!("⚠ No live link with code '{}'", code);
                false
            }
        },
        Commands::Sweep => {
            let removed = registry.sweep_expired().await;
            if removed.is_empty() {
                println!("No expired links.");
            } else {
                println!("Removed {} expired links:", removed.len());
                for link in &removed {
                    println!("  {}", link.short_code);
                }
            }
            !removed.is_empty()
        }
        Commands::Remove { code } => match registry.remove(&code).await {
            Some(link) => {
                println!("✓ Removed '{}'", link.short_code);
                true
            }
            None => {
                println!("⚠ No link with code '{}'", code);
                false
            }
        },
    };

    // Write failures are fatal for one-shot commands
    if changed {
        registry
            .try_save()
            .await
            .context("failed to persist links")?;
    }

    Ok(())
}
