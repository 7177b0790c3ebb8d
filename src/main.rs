use anyhow::{Context, Result};
use clap::Parser;
use filmrec::{api::create_router, init_tracing, AppState, Config, RatingMatrix};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Film recommendation server", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON file of `{ "<user>": { "<film>": rating } }` loaded at startup
    #[arg(short, long)]
    seed: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = Config::load_or_default(&args.config)?;
    info!("Starting film recommendation server with config: {:?}", config.server);

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()?
        .block_on(serve(args, config))
}

async fn serve(args: Args, config: Config) -> Result<()> {
    let state = AppState::new(config.clone()).await?;

    if let Some(path) = &args.seed {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        let matrix: RatingMatrix =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
        let imported = state.rating_store.import(&matrix)?;
        info!("Seeded {} ratings from {}", imported, path);
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.socket_addr()).await?;
    info!("Server listening on {}", config.server.socket_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
