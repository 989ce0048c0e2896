use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic detection driver for the Lookout dashboard")]
struct Args {
    /// Run a fixed number of ticks offline and write the exports
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Ticks to run in offline mode
    #[arg(long, default_value_t = 100)]
    ticks: usize,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,
    #[arg(long, default_value_t = 0.6)]
    min_confidence: f32,
    #[arg(long, default_value_t = 640)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Directory for offline exports (overrides the workflow file)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Font for label glyphs in exported PNGs
    #[arg(long)]
    font: Option<PathBuf>,
    /// Run the live session behind the HTTP bridge until Ctrl+C (default without --offline)
    #[arg(long, default_value_t = false)]
    serve: bool,
}

impl Args {
    fn should_serve(&self) -> bool {
        self.serve || !self.offline
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.interval_ms,
            args.min_confidence,
            args.width,
            args.height,
            args.seed,
        )
    };
    if let Some(dir) = args.output_dir.clone() {
        workflow_config.output_dir = dir;
    }
    if args.font.is_some() {
        workflow_config.font_path = args.font.clone();
    }

    let runner = Runner::new(workflow_config);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    if args.offline {
        let result = runtime.block_on(runner.execute(args.ticks))?;
        log::info!(
            "offline run -> ticks {} (skipped {}), history {}, last counts {:?}",
            result.ticks_rendered,
            result.ticks_skipped,
            result.history_len,
            result.last_counts
        );
        println!(
            "Wrote {} and {}",
            result.csv_path.display(),
            result.heatmap_path.display()
        );
    }
    if args.should_serve() {
        if !args.serve {
            println!("No mode given, serving the HTTP bridge (pass --offline for a batch run)");
        }
        runtime.block_on(serve(&runner))?;
    }

    Ok(())
}

async fn serve(runner: &Runner) -> anyhow::Result<()> {
    let handle = runner.build_session()?.spawn();
    let bridge = GuiBridge::new(handle.client());
    let (addr, server) = bridge.bind(runner.config().bind_address, async {
        if let Err(err) = signal::ctrl_c().await {
            log::warn!("awaiting Ctrl+C failed: {}", err);
        }
    })?;
    let server = tokio::spawn(server);
    log::info!("HTTP bridge running on http://{} (Ctrl+C to stop)", addr);

    let status = handle.client().wait_until_loaded().await;
    log::info!("session status: {:?}", status);

    server.await.context("HTTP bridge task")?;
    handle.stop().await.context("stopping session")?;
    log::info!("session stopped");
    Ok(())
}
