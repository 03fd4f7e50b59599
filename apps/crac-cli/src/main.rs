use clap::{Parser, Subcommand, ValueEnum};
use crac_app::{
    AppConfig, AppResult, BusFrame, Cadence, Command, ControlLoop, Intent, MemorySink,
    QueuedPublisher, readiness, spawn_listener,
};
use crac_controls::{ControlInputs, OperatingMode, Setpoint, TwoStageController};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "crac-cli")]
#[command(about = "CRAC fuzzy controller - data center cooling control loop", long_about = None)]
struct Cli {
    /// Path to a YAML config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live loop on a line-delimited JSON bus (stdin in, stdout out)
    Run,
    /// Run the scripted 24 h cycle offline and print every state record
    Scenario {
        /// Setpoint in degrees Celsius (16, 22, 25 or 32)
        #[arg(long, default_value_t = 25)]
        setpoint: i64,
    },
    /// Evaluate the two-stage controller once
    Eval {
        /// Temperature error T - setpoint
        #[arg(long, allow_hyphen_values = true)]
        error: f64,
        /// Change of error since the previous tick
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        delta_error: f64,
        /// External temperature
        #[arg(long, default_value_t = 25.0)]
        text: f64,
        /// Thermal load
        #[arg(long, default_value_t = 40.0)]
        load: f64,
        /// Setpoint in degrees Celsius (16, 22, 25 or 32)
        #[arg(long, default_value_t = 25)]
        setpoint: i64,
        /// Gain table to use
        #[arg(long, value_enum, default_value_t = ModeArg::Dynamic)]
        mode: ModeArg,
        /// Also print per-rule firing strengths of both stages
        #[arg(long)]
        rules: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Dynamic,
    Scripted,
}

impl From<ModeArg> for OperatingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Dynamic => OperatingMode::Dynamic,
            ModeArg::Scripted => OperatingMode::Scripted,
        }
    }
}

fn main() -> AppResult<()> {
    // Logs go to stderr; stdout carries bus frames.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => cmd_run(config),
        Commands::Scenario { setpoint } => cmd_scenario(config, setpoint),
        Commands::Eval {
            error,
            delta_error,
            text,
            load,
            setpoint,
            mode,
            rules,
        } => cmd_eval(
            &config,
            ControlInputs {
                error,
                delta_error,
                external_temperature: text,
                load,
            },
            setpoint,
            mode.into(),
            rules,
        ),
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> AppResult<AppConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            AppConfig::load_yaml(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn cmd_run(config: AppConfig) -> AppResult<()> {
    let (tx, rx) = mpsc::channel();
    let (signal, waiter) = readiness();
    let publisher = QueuedPublisher::spawn(io::stdout(), config.bus.queue_capacity);

    let _listener = spawn_listener(
        BufReader::new(io::stdin()),
        config.topics.clone(),
        tx,
        signal,
    );
    waiter.wait(config.bus.ready_timeout())?;
    info!(
        setpoint = %config.topics.setpoint,
        command = %config.topics.command,
        injection = %config.topics.injection,
        "bus ready"
    );

    let mut control = ControlLoop::new(config, publisher, rx)?;
    control.run();
    if let Err(err) = control.into_sink().close() {
        warn!(%err, "publisher did not shut down cleanly");
    }
    Ok(())
}

fn cmd_scenario(mut config: AppConfig, setpoint: i64) -> AppResult<()> {
    let setpoint = Setpoint::try_from(setpoint)?;
    config.cadence = Cadence::immediate();
    let topic = config.topics.state.clone();
    let sink = MemorySink::new();
    let (tx, rx) = mpsc::channel();
    let mut control = ControlLoop::new(config, sink.clone(), rx)?;

    tx.send(Intent::SetSetpoint(setpoint)).ok();
    tx.send(Intent::Command(Command::StartScripted)).ok();
    control.cycle();
    drop(tx);

    let mut out = io::stdout().lock();
    for (_, record) in sink.records() {
        let frame = BusFrame {
            topic: topic.clone(),
            payload: serde_json::to_value(&record)?,
        };
        serde_json::to_writer(&mut out, &frame)?;
        writeln!(out)?;
    }
    info!(records = sink.len(), "scenario complete");
    Ok(())
}

fn cmd_eval(
    config: &AppConfig,
    inputs: ControlInputs,
    setpoint: i64,
    mode: OperatingMode,
    rules: bool,
) -> AppResult<()> {
    let setpoint = Setpoint::try_from(setpoint)?;
    let controller = TwoStageController::new(config.controller.clone())?;
    let out = controller.compute(setpoint, mode, &inputs)?;

    println!("Setpoint: {} C ({:?} gains)", setpoint, mode);
    println!(
        "  base power : {:.3}{}",
        out.base_power,
        if out.core_fallback { " (fallback)" } else { "" }
    );
    println!("  gain       : {:.3}", out.gain);
    println!(
        "  adjustment : {:.3}{}",
        out.adjustment,
        if out.compensation_fallback {
            " (fallback)"
        } else {
            ""
        }
    );
    println!("  unclipped  : {:.3}", out.unclipped);
    println!("  power      : {:.3}", out.power);

    if rules {
        let (core, compensation) = controller.firing_strengths(&inputs)?;
        print_strengths("core", &core);
        print_strengths("compensation", &compensation);
    }
    Ok(())
}

fn print_strengths(stage: &str, strengths: &[f64]) {
    println!("{} rules:", stage);
    for (i, s) in strengths.iter().enumerate().filter(|(_, s)| **s > 0.0) {
        println!("  #{:<2} {:.3}", i, s);
    }
}

fn cmd_config(config: &AppConfig) -> AppResult<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}
