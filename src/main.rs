use std::path::PathBuf;

use castlist::api::create_router;
use castlist::api::handlers::{AppState, PagingConfig};
use castlist::config;
use castlist::persist::csv_file::CsvStore;
use castlist::runtime::handle::{RuntimeConfig, spawn_store};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "castlist", about = "CSV-backed character records over HTTP")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = config::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Backing CSV file
    #[arg(short, long, env = "CASTLIST_DATA_FILE", default_value = config::DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Page size when the request omits per_page
    #[arg(long, default_value_t = config::DEFAULT_PER_PAGE)]
    default_per_page: usize,

    /// Upper bound for per_page
    #[arg(long, default_value_t = config::DEFAULT_MAX_PER_PAGE)]
    max_per_page: usize,

    /// Store command queue capacity
    #[arg(long, default_value_t = config::DEFAULT_QUEUE_BOUND)]
    queue_bound: usize,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if args.default_per_page == 0 || args.max_per_page == 0 {
        return Err("page sizes must be > 0".into());
    }

    let store = CsvStore::new(&args.data_file);
    match store.load() {
        Ok(collection) => tracing::info!(
            records = collection.len(),
            detached = collection.detached_rows().len(),
            "store opened"
        ),
        Err(e) => tracing::warn!("Store is not loadable yet, requests will fail until fixed: {}", e),
    }

    let handle = spawn_store(
        Box::new(store),
        RuntimeConfig {
            command_queue_bound: args.queue_bound,
        },
    );

    let state = AppState {
        store: handle.clone(),
        paging: PagingConfig {
            default_per_page: args.default_per_page.min(args.max_per_page),
            max_per_page: args.max_per_page,
        },
    };
    let app = create_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        data_file = %args.data_file.display(),
        "castlist ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    handle.shutdown().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("castlist=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
