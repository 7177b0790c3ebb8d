use anyhow::{Context, Result};
use clap::Parser;
use filmrec::algorithms::SlopeOne;
use filmrec::services::evaluation::{EvaluationSettings, Evaluator};
use filmrec::utils::validation::validate_rating_matrix;
use filmrec::{init_tracing, Config, RatingMatrix};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Hold-out evaluation of slope-one predictions",
    long_about = None
)]
struct Args {
    /// JSON file of `{ "<user>": { "<film>": rating } }`
    #[arg(short, long)]
    ratings: String,

    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Overrides the configured recommendation threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    #[arg(short, long, default_value_t = 10)]
    k: usize,

    /// Ratings hidden per user
    #[arg(long, default_value_t = 1)]
    holdout: usize,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = Config::load_or_default(&args.config)?;

    let raw = std::fs::read_to_string(&args.ratings)
        .with_context(|| format!("reading {}", args.ratings))?;
    let matrix: RatingMatrix = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.ratings))?;
    let total = validate_rating_matrix(&matrix, &config.ratings)?;
    info!("Loaded {} ratings from {} users", total, matrix.len());

    let settings = EvaluationSettings {
        threshold: args.threshold.unwrap_or(config.recommendation.threshold),
        k: args.k,
        holdout: args.holdout,
    };
    let report = Evaluator::new(SlopeOne::new(), settings).evaluate(&matrix);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
