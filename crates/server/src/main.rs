//! Coloring Gallery
//!
//! Serves coloring book pages and stores the pictures users save.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gallery::{Gallery, GalleryRoot, ImageRef, Page};
use server::config::{default_config_path, Config};
use server::testimage;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Coloring Gallery - browse coloring pages and keep the saved ones.
#[derive(Parser, Debug)]
#[command(name = "coloring-gallery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address, overriding the configuration
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Print one page of a gallery listing
    List {
        /// List saved images instead of source images
        #[arg(long)]
        saved: bool,

        /// Page number (1-based)
        #[arg(long, short, default_value = "1", allow_negative_numbers = true)]
        page: i64,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Draw a test coloring page into the source directory
    GenerateTestImage {
        /// Output file (defaults to <source_dir>/test-page.png)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Image width in pixels
        #[arg(long, default_value_t = testimage::DEFAULT_WIDTH)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = testimage::DEFAULT_HEIGHT)]
        height: u32,
    },

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    // Load configuration
    let mut config = Config::load(&config_path)?;

    // Apply environment variable overrides
    let overrides = config.apply_env_overrides();

    let _log_guard = init_logging(&config, cli.verbose);
    tracing::debug!("Using config file: {:?}", config_path);
    for o in &overrides {
        tracing::info!("Overriding from environment: {}={}", o.variable, o.value);
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            config.validate()?;

            let gallery = Gallery::open(config.to_settings()?)?;
            server::http::serve(gallery, config.bind_addr()?).await?;
        }
        Commands::List { saved, page, json } => {
            config.validate()?;

            let gallery = Gallery::new(config.to_settings()?);
            let root = if saved {
                GalleryRoot::Saved
            } else {
                GalleryRoot::Source
            };
            let listing = gallery.list(root, page)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print_listing(&listing, root);
            }
        }
        Commands::GenerateTestImage {
            output,
            width,
            height,
        } => {
            config.validate()?;

            let output = output.unwrap_or_else(|| {
                config
                    .storage
                    .source_dir
                    .join(testimage::DEFAULT_FILE_NAME)
            });
            testimage::write_png(&output, width, height)?;
            println!("Test image created at {}", output.display());
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => {
                print!("{}", config.to_toml()?);
            }
            ConfigCommands::Init { force } => {
                init_config(&config_path, force)?;
                println!("Configuration written to {}", config_path.display());
            }
        },
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// Returns the file writer guard when file logging is enabled; it must live
/// until the process exits so buffered lines are flushed.
fn init_logging(config: &Config, verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.server.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match &config.server.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "coloring-gallery.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(path)
}

fn print_listing(listing: &Page<ImageRef>, root: GalleryRoot) {
    let label = match root {
        GalleryRoot::Source => "Source images",
        GalleryRoot::Saved => "Saved images",
    };

    if listing.total_pages == 0 {
        println!("{}: none", label);
        return;
    }

    println!(
        "{} (page {} of {}):",
        label, listing.page, listing.total_pages
    );
    if listing.is_empty() {
        println!("  (no images on this page)");
    }
    for image in &listing.items {
        println!("  {}", image);
    }
}
