use clap::{Parser, Subcommand};
use gallery_feed::bootstrap::Composer;
use gallery_feed::config::{self, Credentials, LogFormat, ServiceConfig};
use gallery_feed::fetch::{CloudinaryStore, Fetcher, build_client};
use gallery_feed::query::{GalleryQuery, run_query};
use gallery_feed::server::{self, AppState};
use gallery_feed::{output, testimonials, version_string};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gallery-feed")]
#[command(about = "Page-ready gallery JSON from remote media folders")]
#[command(long_about = "\
Page-ready gallery JSON from remote media folders

Lists image folders in the remote media store, merges them into one ordered
gallery, and serves page-sized slices plus a one-shot landing-page payload.

Endpoints (under server.base_path, default /api):

  GET /gallery?limit&offset&category   Paged, filterable portfolio
  GET /hero                            Hero slider images
  GET /client-photos                   Testimonial avatars
  GET /reach-out-bg                    Contact section background
  GET /stats-clients                   Stats section background
  GET /testimonials                    Testimonial records
  GET /bootstrap                       Everything the landing page needs
  GET /healthz                         Liveness

Credentials come from the environment:
  CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET

Logging level comes from RUST_LOG (default: info).

Run 'gallery-feed gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server until Ctrl-C
    Serve,
    /// Run one gallery query and print the result
    Gallery {
        /// Page size (default: gallery.default_limit)
        #[arg(long)]
        limit: Option<usize>,
        /// Items to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Only folders with this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Compose the landing-page payload once and print it as JSON
    Bootstrap,
    /// Validate config and credentials without contacting the store
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            let (config, credentials) = setup(&cli.config)?;
            let state = app_state(config, credentials)?;
            server::serve(state).await?;
        }
        Command::Gallery {
            limit,
            offset,
            category,
        } => {
            let (config, credentials) = setup(&cli.config)?;
            let state = app_state(config, credentials)?;
            let cfg = &state.config;
            let mut query = GalleryQuery::new(cfg.gallery.default_limit);
            query.offset = offset;
            query.category = category.filter(|c| !c.is_empty());
            if let Some(limit) = limit.filter(|&n| n > 0) {
                query.limit = limit;
            }
            let (page, reports) =
                run_query(&state.fetcher, &cfg.gallery, &cfg.profiles.delivery, &query).await;
            let page = page.unless_total_failure(&query, &reports);
            output::print_gallery_output(&page, &reports);
        }
        Command::Bootstrap => {
            let (config, credentials) = setup(&cli.config)?;
            let state = app_state(config, credentials)?;
            let cfg = &state.config;
            let payload = Composer::new(
                &state.fetcher,
                state.testimonials.as_ref(),
                &cfg.bootstrap,
                &cfg.profiles,
            )
            .compose()
            .await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Check => {
            let (config, credentials) = setup(&cli.config)?;
            output::print_check_output(&config, &credentials.cloud_name);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load and validate config, start logging, read credentials.
fn setup(
    config_dir: &Path,
) -> Result<(ServiceConfig, Credentials), Box<dyn std::error::Error>> {
    let config = config::load_config(config_dir)?;
    init_tracing(config.logging.format);
    let credentials = Credentials::from_env()?;
    Ok((config, credentials))
}

/// Wire the store client, fetcher and testimonial source from config.
fn app_state(
    config: ServiceConfig,
    credentials: Credentials,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let client = build_client(&config.store)?;
    let store = CloudinaryStore::new(client.clone(), &config.store.api_base, credentials);
    let fetcher = Fetcher::from_config(Arc::new(store), &config.store);
    let testimonials = testimonials::from_config(&config.testimonials, client);
    Ok(AppState {
        config: Arc::new(config),
        fetcher,
        testimonials,
    })
}

/// Install the global subscriber. Level filter from `RUST_LOG`, default `info`.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}
