// Landmark-based EKF localization with DWA target tracking
//
// Runs the closed loop for a fixed number of ticks, prints a summary and
// optionally renders the run to a PNG.

use std::error::Error;
use std::io::Write;

use clap::{Parser, ValueEnum};
use log::info;

use landmark_nav::localization::EKFConfig;
use landmark_nav::path_planning::DWAPlanner;
use landmark_nav::path_tracking::DirectInputController;
use landmark_nav::simulation::{
    NoiseConfig, RunSummary, Simulation, SimulationConfig, TickRecord,
};
use landmark_nav::trajectory::{CircularTrajectory, SquareTrajectory, WaypointTrajectory};
use landmark_nav::utils::{colors, PathStyle, Visualizer};
use landmark_nav::{InputPlanner, KinematicLimits, Landmark, Pose2D, TrajectoryProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TrajectoryKind {
    Circular,
    Square,
    Waypoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlannerKind {
    Dwa,
    Direct,
}

#[derive(Parser, Debug)]
#[command(name = "landmark_nav")]
#[command(about = "EKF landmark localization with dynamic window target tracking")]
struct Cli {
    /// Target trajectory to follow
    #[arg(long, value_enum, default_value = "circular")]
    trajectory: TrajectoryKind,

    /// Input planner
    #[arg(long, value_enum, default_value = "dwa")]
    planner: PlannerKind,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 300)]
    ticks: usize,

    /// Tick length in seconds
    #[arg(long, default_value_t = 0.2)]
    dt: f64,

    /// Seed for the simulated noise
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Render the run to this PNG file
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Open an interactive gnuplot window after the run
    #[arg(long)]
    show: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logger(log_level: &str) -> Result<(), Box<dyn Error>> {
    let level = log_level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'info'", log_level);
        log::LevelFilter::Info
    });

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .try_init()?;
    Ok(())
}

struct RunOutput {
    history: Vec<TickRecord>,
    summary: Option<RunSummary>,
    landmarks: Vec<Landmark>,
}

fn simulate<P: TrajectoryProvider, C: InputPlanner>(
    config: SimulationConfig,
    provider: P,
    planner: C,
    noise: NoiseConfig,
    ticks: usize,
) -> Result<RunOutput, Box<dyn Error>> {
    let mut sim = Simulation::new(config, provider, planner, EKFConfig::default(), noise)?;
    sim.run(ticks);
    Ok(RunOutput {
        history: sim.history().to_vec(),
        summary: sim.summary(),
        landmarks: sim.landmarks().to_vec(),
    })
}

fn with_planner<P: TrajectoryProvider>(
    cli: &Cli,
    config: SimulationConfig,
    provider: P,
    noise: NoiseConfig,
) -> Result<RunOutput, Box<dyn Error>> {
    match cli.planner {
        PlannerKind::Dwa => {
            simulate(config, provider, DWAPlanner::with_defaults(), noise, cli.ticks)
        }
        PlannerKind::Direct => {
            simulate(config, provider, DirectInputController::new(), noise, cli.ticks)
        }
    }
}

fn plot_run(run: &RunOutput) -> Visualizer {
    let target: Vec<Pose2D> = run.history.iter().map(|r| r.target).collect();
    let truth: Vec<Pose2D> = run.history.iter().map(|r| r.truth).collect();
    let estimate: Vec<Pose2D> = run.history.iter().map(|r| r.estimate).collect();

    let mut vis = Visualizer::new();
    vis.set_title("EKF localization with DWA tracking")
        .set_x_range(-2.0, 2.0)
        .set_y_range(-2.0, 2.0)
        .plot_landmarks(&run.landmarks)
        .plot_poses(&target, &PathStyle::new(colors::TARGET, "Target"))
        .plot_poses(&truth, &PathStyle::new(colors::GROUND_TRUTH, "Ground Truth"))
        .plot_poses(&estimate, &PathStyle::new(colors::ESTIMATED, "EKF Estimate"));
    if let Some(last) = run.history.last() {
        vis.plot_sightings(&last.truth, &last.observations)
            .plot_robot(&last.estimate, 0.15);
    }
    vis
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logger(&cli.log_level)?;

    let config = SimulationConfig { dt: cli.dt, ..SimulationConfig::default() };
    let noise = NoiseConfig { seed: cli.seed, ..NoiseConfig::default() };
    info!(
        "running {} ticks: trajectory {:?}, planner {:?}, dt {}",
        cli.ticks, cli.trajectory, cli.planner, cli.dt
    );

    let run = match cli.trajectory {
        TrajectoryKind::Circular => {
            with_planner(&cli, config, CircularTrajectory::default(), noise)?
        }
        TrajectoryKind::Square => {
            with_planner(&cli, config, SquareTrajectory::default(), noise)?
        }
        TrajectoryKind::Waypoints => {
            let provider = WaypointTrajectory::new(
                config.initial_pose,
                WaypointTrajectory::default_waypoints(),
                KinematicLimits::default(),
            )?;
            with_planner(&cli, config, provider, noise)?
        }
    };

    match &run.summary {
        Some(summary) => {
            println!("ticks:                  {}", summary.ticks);
            println!("final estimation error: {:.4} m", summary.final_estimation_error);
            println!("rms estimation error:   {:.4} m", summary.rms_estimation_error);
            println!("rms tracking error:     {:.4} m", summary.rms_tracking_error);
            println!("max covariance trace:   {:.6}", summary.max_covariance_trace);
            println!("degraded ticks:         {}", summary.degraded_ticks);
        }
        None => println!("no ticks run"),
    }

    if cli.output.is_some() || cli.show {
        let vis = plot_run(&run);
        if let Some(path) = &cli.output {
            vis.save_png(path, 800, 800)?;
            info!("saved plot to {}", path);
        }
        if cli.show {
            vis.show()?;
        }
    }
    Ok(())
}
