use anyhow::{Context, Result};
use clap::Parser;
use ecosim_core::config::SimConfig;
use ecosim_core::world::{RunSummary, World};
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ecosim", version, about = "Run the grid ecosystem headless")]
struct Cli {
    /// JSON config file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Grid rows. Non-positive values fall back to the default.
    #[arg(long, allow_negative_numbers = true)]
    depth: Option<i64>,
    /// Grid columns. Non-positive values fall back to the default.
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 500)]
    steps: usize,
    #[arg(long, default_value_t = 50)]
    sample_every: usize,
    /// Sleep between ticks.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
    /// Stop early once fewer than two kinds are alive.
    #[arg(long)]
    until_unviable: bool,
    /// Print one JSON line of metrics per tick instead of a summary.
    #[arg(long)]
    stream: bool,
}

impl Cli {
    fn sim_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SimConfig::from_json(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => SimConfig::default(),
        };
        let to_axis = |v: i64| usize::try_from(v).unwrap_or(0);
        if let Some(depth) = self.depth {
            config.depth = to_axis(depth);
        }
        if let Some(width) = self.width {
            config.width = to_axis(width);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }

    /// The batch runner covers the plain case; pacing, streaming and early
    /// stopping need the tick loop here.
    fn needs_tick_loop(&self) -> bool {
        self.delay_ms > 0 || self.until_unviable || self.stream
    }
}

fn drive(world: &mut World, cli: &Cli, out: &mut impl Write) -> Result<RunSummary> {
    anyhow::ensure!(cli.sample_every > 0, "--sample-every must be positive");
    let births_before = world.total_births();
    let deaths_before = world.total_deaths();
    let mut samples = Vec::new();
    let mut steps = 0;
    while steps < cli.steps {
        world.step();
        steps += 1;
        let metrics = world.step_metrics();
        if cli.stream {
            serde_json::to_writer(&mut *out, &metrics)?;
            writeln!(out)?;
        }
        let viable = metrics.population.is_viable();
        if steps % cli.sample_every == 0 || steps == cli.steps || !viable {
            samples.push(metrics);
        }
        if cli.until_unviable && !viable {
            info!(tick = world.tick(), "fewer than two kinds remain; stopping");
            break;
        }
        if cli.delay_ms > 0 {
            thread::sleep(Duration::from_millis(cli.delay_ms));
        }
    }
    Ok(RunSummary {
        schema_version: 1,
        steps,
        sample_every: cli.sample_every,
        samples,
        total_births: world.total_births() - births_before,
        total_deaths: world.total_deaths() - deaths_before,
        final_population: world.population(),
    })
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.sim_config()?;
    let mut world = World::try_new(config).context("building world")?;
    let (depth, width) = (world.grid().depth(), world.grid().width());
    info!(
        depth,
        width,
        seed = world.config().seed,
        seeded = world.live_count(),
        "world ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = if cli.needs_tick_loop() {
        drive(&mut world, &cli, &mut out)?
    } else {
        world.try_run(cli.steps, cli.sample_every)?
    };
    info!(
        steps = summary.steps,
        births = summary.total_births,
        deaths = summary.total_deaths,
        alive = summary.final_population.total,
        "run finished"
    );
    if !cli.stream {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    }
    Ok(())
}
