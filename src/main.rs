//! seedfill demo driver: builds a synthetic volume, runs seeded fills through
//! the seed controller and exports the resulting counts.

mod config;
mod scene;
mod sink;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use seedfill_fill::accumulate_star_shapes;
use seedfill_geom::RaySet;
use seedfill_runtime::{AffineSeedTransform, FillKind, FillRuntime, LabelSet, SeedController};
use seedfill_volume::{AtomicCounts, CountField, write_counts};

use crate::config::{AppConfig, load_config_from_path};
use crate::sink::RawFileSink;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "seedfill")]
#[command(about = "Consensus-gated seeded flood fill over a synthetic sphere volume")]
#[command(version)]
struct Cli {
    /// TOML file with `[scene]`, `[runtime]`, `[ball]`, `[star]` and `[worklist]`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed as `x,y` on the z slice. Repeat for several fills on one label.
    #[arg(long = "seed", value_parser = parse_seed)]
    seeds: Vec<[f64; 2]>,

    /// z slice the seeds land on (default: the first sphere's center).
    #[arg(long)]
    slice: Option<i64>,

    /// Admission test.
    #[arg(long, value_enum, default_value_t = Variant::Ball)]
    variant: Variant,

    /// Rasterize every voxel's star shape instead of filling from seeds.
    #[arg(long)]
    accumulate: bool,

    /// Write the final counts as raw little-endian u32 (x fastest).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Log to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Overrides `[runtime] workers`.
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Ball,
    Star,
}

fn parse_seed(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{s}'"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x '{x}': {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y '{y}': {e}"))?;
    Ok([x, y])
}

fn init_logging(log_file: Option<&Path>) -> CliResult<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            simplelog::WriteLogger::init(log::LevelFilter::Info, simplelog::Config::default(), file)?;
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        }
    }
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let mut cfg = match &cli.config {
        Some(path) => load_config_from_path(path)?,
        None => AppConfig::default(),
    };
    if let Some(w) = cli.workers {
        cfg.runtime.workers = w;
    }
    let bounds = scene::scene_bounds(&cfg.scene);
    log::info!(
        "scene {:?} spheres={} variant={:?}",
        cfg.scene.dims,
        cfg.scene.spheres.len(),
        cli.variant
    );

    let counts: Arc<dyn CountField<3>> = if cli.accumulate {
        run_accumulate(&cfg)?
    } else {
        run_seeds(&cli, &cfg)?
    };

    let covered = bounds.iter().filter(|p| counts.count(p).is_ok_and(|c| c > 0)).count();
    log::info!("{} of {} voxels counted", covered, bounds.size());

    if let Some(out) = &cli.out {
        let sink = RawFileSink::create(out, bounds)?;
        let blocks = write_counts(&*counts, &sink, [cfg.scene.block; 3])?;
        log::info!("wrote {} blocks to {}", blocks, out.display());
    }
    Ok(())
}

fn fill_kind(variant: Variant, cfg: &AppConfig) -> FillKind<3> {
    match variant {
        Variant::Ball => FillKind::Ball {
            source: Arc::new(scene::radius_field(&cfg.scene)),
            params: cfg.fill.ball.clone(),
        },
        Variant::Star => {
            let rays = RaySet::<3>::fibonacci(cfg.scene.rays);
            FillKind::Star {
                source: Arc::new(scene::ray_field(&cfg.scene, &rays)),
                rays: Arc::new(rays),
                params: cfg.fill.star.clone(),
            }
        }
    }
}

fn run_seeds(cli: &Cli, cfg: &AppConfig) -> CliResult<Arc<dyn CountField<3>>> {
    let default_seed = scene::default_seed(&cfg.scene);
    let slice = cli.slice.unwrap_or(default_seed[2]);
    let seeds = if cli.seeds.is_empty() {
        vec![[default_seed[0] as f64, default_seed[1] as f64]]
    } else {
        cli.seeds.clone()
    };

    let runtime = FillRuntime::<3>::new(&cfg.runtime)?;
    let mut controller = SeedController::new(
        AffineSeedTransform::identity([0, 0, slice]),
        LabelSet::new(scene::scene_bounds(&cfg.scene)),
        runtime,
        fill_kind(cli.variant, cfg),
        cfg.fill.worklist.clone(),
    );
    for [x, y] in &seeds {
        controller.on_seed_event(*x, *y)?;
    }
    let outs = controller.wait_all(Duration::from_secs(3600));
    if controller.pending() > 0 {
        return Err(format!("{} fills did not finish", controller.pending()).into());
    }
    if let Some(out) = outs.iter().find(|o| o.result.is_err()) {
        return Err(format!("fill job {} failed", out.job_id).into());
    }

    let label = controller
        .labels()
        .current()
        .ok_or("no label was created")?;
    let fields = controller
        .labels()
        .fields(label)
        .ok_or("current label has no fields")?;
    log::info!(
        "label {} rev={} visited={}",
        label,
        controller.labels().rev(label),
        fields.state.visited_count()
    );
    Ok(fields.counts)
}

fn run_accumulate(cfg: &AppConfig) -> CliResult<Arc<dyn CountField<3>>> {
    let bounds = scene::scene_bounds(&cfg.scene);
    let rays = RaySet::<3>::fibonacci(cfg.scene.rays);
    let source = scene::ray_field(&cfg.scene, &rays);
    let counts = Arc::new(AtomicCounts::new(bounds));
    let shapes = accumulate_star_shapes(&source, &rays, &*counts, bounds, cfg.fill.star.max_dist)?;
    log::info!("accumulated {} star shapes", shapes);
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_as_pairs() {
        assert_eq!(parse_seed("3, 4.5").unwrap(), [3.0, 4.5]);
        assert!(parse_seed("3").is_err());
        assert!(parse_seed("a,1").is_err());
    }

    #[test]
    fn cli_accepts_repeated_seeds() {
        let cli = Cli::try_parse_from([
            "seedfill", "--seed", "1,2", "--seed", "5,6", "--variant", "star", "--workers", "2",
        ])
        .unwrap();
        assert_eq!(cli.seeds, vec![[1.0, 2.0], [5.0, 6.0]]);
        assert_eq!(cli.variant, Variant::Star);
        assert_eq!(cli.workers, Some(2));
    }

    #[test]
    fn small_ball_scene_fills_its_sphere() {
        let mut cfg = AppConfig::default();
        cfg.scene.dims = [20, 20, 20];
        cfg.scene.spheres = vec![config::SphereParams {
            center: [10.0, 10.0, 10.0],
            radius: 6.0,
        }];
        cfg.runtime.workers = 2;
        let cli = Cli::try_parse_from(["seedfill"]).unwrap();
        let counts = run_seeds(&cli, &cfg).unwrap();
        assert!(counts.count(&[10, 10, 10]).unwrap() > 0);
        assert_eq!(counts.count(&[0, 0, 0]).unwrap(), 0);
    }
}
