use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use gymboard::metrics::{read_run, summary_records, RecordLine, SummaryRecord};
use gymboard::{
    clean_logdir, dashboard, ClipOptions, DashboardCommand, DashboardProcess, EpisodeRecorder,
    RecorderConfig, ScriptedEnv,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log directory (overrides gymboard.ron / GYMBOARD_LOGDIR)
    #[arg(long, global = true)]
    logdir: Option<PathBuf>,

    /// Dashboard port (overrides gymboard.ron / GYMBOARD_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one scalar into a new run
    Scalar {
        #[arg(long)]
        label: String,
        #[arg(long)]
        value: f64,
        #[arg(long)]
        step: Option<u64>,
    },

    /// Record a scripted replay episode with random actions into a new run
    Demo {
        /// Episode length
        #[arg(long, default_value = "30")]
        steps: usize,
        /// Playback rate before speed is applied
        #[arg(long)]
        fps: Option<f64>,
        /// Playback speed multiplier
        #[arg(long, default_value = "1.0")]
        speed: f64,
        /// Seed for the random actions
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show how to start the dashboard (or start it in a notebook host)
    Display,

    /// Delete the log directory and every run in it
    Clean,

    /// Print the effective configuration as RON (a starting point for gymboard.ron)
    Config,

    /// List the records of a run directory
    Inspect {
        run_dir: PathBuf,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = RecorderConfig::load()?;
    if let Some(logdir) = args.logdir {
        config.logdir = logdir;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command {
        Command::Scalar { label, value, step } => {
            let mut recorder = EpisodeRecorder::new(&config)?;
            let step = recorder.write_scalar(&label, value, step)?;
            log::info!("wrote {label}={value} at step {step}");
        }
        Command::Demo {
            steps,
            fps,
            speed,
            seed,
        } => {
            if let Some(seed) = seed {
                config.seed = Some(seed);
            }
            run_demo(&config, steps, fps, speed)?;
        }
        Command::Display => {
            let command = DashboardCommand::new(&config.logdir, config.port);
            let mut process = DashboardProcess::default();
            dashboard::display(&command, config.host, &mut process);
        }
        Command::Clean => clean_logdir(&config.logdir),
        Command::Config => {
            let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())
                .context("Failed to serialize configuration")?;
            println!("{text}");
        }
        Command::Inspect { run_dir, json } => inspect(&run_dir, json)?,
    }

    Ok(())
}

fn run_demo(config: &RecorderConfig, steps: usize, fps: Option<f64>, speed: f64) -> Result<()> {
    let rewards = (0..steps.max(1)).map(|i| (i % 3) as f64).collect();
    let mut env = ScriptedEnv::new("Scripted-v0", rewards)?.with_frame_size(64, 64);

    let mut recorder = EpisodeRecorder::new(config)?;
    let mut options = ClipOptions::default().with_speed(speed);
    if let Some(fps) = fps {
        options = options.with_fps(fps);
    }

    let summary = recorder.write_env(&mut env, None, options)?;
    recorder.write_scalar("demo/total_reward", summary.total_reward, None)?;

    println!(
        "{} ({} frames, {} fps, {} bytes) -> {}",
        summary.tag,
        summary.frame_count,
        summary.fps,
        summary.encoded_bytes,
        recorder.session().run_dir().display()
    );
    Ok(())
}

fn inspect(run_dir: &Path, json: bool) -> Result<()> {
    let lines: Vec<RecordLine> = summary_records(&read_run(run_dir)?)
        .iter()
        .map(SummaryRecord::line)
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&lines).context("Failed to serialize records")?;
        println!("{out}");
        return Ok(());
    }

    for line in &lines {
        println!("{line}");
    }
    Ok(())
}
