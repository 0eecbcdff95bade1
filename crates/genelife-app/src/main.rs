//! Headless simulation shell: seeds a board, runs it for a number of
//! turns, and reports per-kind population and score over tracing.

use anyhow::{Result, bail};
use clap::Parser;
use genelife_core::{Board, BoardConfig, BoardObserver, Kind, TurnNotice};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "genelife",
    version,
    about = "Run a kind-tagged Game-of-Life board headlessly"
)]
struct Cli {
    /// Grid width in cells.
    #[arg(long, default_value_t = 40)]
    cols: u32,

    /// Grid height in cells.
    #[arg(long, default_value_t = 30)]
    rows: u32,

    /// Number of turns to simulate.
    #[arg(long, default_value_t = 200)]
    turns: u64,

    /// Probability that each cell starts alive.
    #[arg(long, default_value_t = 0.3)]
    fill: f64,

    /// RNG seed; omit for an entropy-seeded run.
    #[arg(long)]
    seed: Option<u64>,

    /// Comma-separated gene pool (e.g. "vanilla,photosyn,explode").
    /// Duplicates raise a kind's draw weight.
    #[arg(long, value_delimiter = ',')]
    pool: Option<Vec<String>>,

    /// Turns between progress reports.
    #[arg(long, default_value_t = 50)]
    report_interval: u64,
}

fn parse_kind(name: &str) -> Result<Kind> {
    let kind = match name.trim().to_ascii_lowercase().as_str() {
        "vanilla" => Kind::Vanilla,
        "photosyn" => Kind::Photosyn,
        "explode" => Kind::Explode,
        "guardian" => Kind::Guardian,
        "copy" => Kind::Copy,
        other => bail!("unknown kind: {other}"),
    };
    Ok(kind)
}

/// Observer that mirrors board notifications onto the tracing layer.
struct TracingObserver;

impl BoardObserver for TracingObserver {
    fn on_turn(&mut self, notice: &TurnNotice) {
        debug!(
            turn = notice.turn.0,
            delta = notice.score_delta,
            score = notice.score,
            "turn committed",
        );
    }

    fn on_pool_changed(&mut self, pool: &[Kind]) {
        info!(entries = pool.len(), "gene pool changed");
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let initial_pool = match &cli.pool {
        Some(names) => names
            .iter()
            .map(|name| parse_kind(name))
            .collect::<Result<Vec<_>>>()?,
        None => Kind::ALL.to_vec(),
    };

    let config = BoardConfig {
        cols: cli.cols,
        rows: cli.rows,
        rng_seed: cli.seed,
        initial_pool,
        ..BoardConfig::default()
    };
    let mut board = Board::with_observer(config, Box::new(TracingObserver))?;
    board.reset(cli.fill);

    let stats = board.statistics();
    info!(
        cols = cli.cols,
        rows = cli.rows,
        alive = stats.total_alive,
        pool = board.pool().len(),
        "board seeded",
    );

    for _ in 0..cli.turns {
        let summary = board.step();
        if cli.report_interval > 0 && summary.turn.0.is_multiple_of(cli.report_interval) {
            info!(
                turn = summary.turn.0,
                alive = summary.total_alive,
                births = summary.births,
                deaths = summary.deaths,
                score = summary.total_score,
                "progress",
            );
        }
    }

    let stats = board.statistics();
    info!(
        turn = stats.turn.0,
        score = stats.score,
        alive = stats.total_alive,
        "run complete",
    );
    for kind in Kind::ALL {
        info!(kind = %kind, count = stats.count_of(kind), "population");
    }
    Ok(())
}
