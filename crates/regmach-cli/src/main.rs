//! Register Machine - CLI
//!
//! Describe, check and run programs on machines stored as JSON snapshots.

mod logger;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;

use regmach_core::render::describe_program;
use regmach_core::snapshot::{MachineParams, OutputModeTag};
use regmach_core::{
    parse, validate, EngineLimits, EnginePhase, ExecutionEngine, MachineConfig, Program,
    RunStatus, RuntimeState, ValidationErrors,
};
use regmach_host::{load_snapshot, run_timed, save_snapshot, stop_channel};

const SAMPLE_PROGRAM: &str = "\
// Count the first input down to zero, emitting each value
start: IN R1
loop: JZ R1, done
OUT R1
DEC R1
JUMP loop
done: HALT
";

#[derive(Parser)]
#[command(name = "regmach", version, about = "Configurable abstract register machine")]
struct Cli {
    /// Log every executed step
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the formal description of a machine and its embedded program
    Describe {
        /// Machine snapshot (JSON)
        machine: PathBuf,
    },

    /// Validate a program against a machine
    Check {
        machine: PathBuf,
        /// Program source; defaults to the program embedded in the snapshot
        program: Option<PathBuf>,
    },

    /// Run a program and print its trace and final state
    Run {
        machine: PathBuf,
        program: Option<PathBuf>,

        /// Initial input queue, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        input: Vec<i64>,

        /// Delay between steps in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Maximum number of executed instructions
        #[arg(long)]
        budget: Option<u64>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write a sample machine snapshot
    Init {
        path: PathBuf,

        #[arg(long, default_value_t = 1)]
        registers: usize,

        #[arg(long, default_value_t = 0)]
        memory: usize,

        /// Embed a countdown program in the snapshot
        #[arg(long)]
        with_program: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    status: RunStatus,
    phase: EnginePhase,
    state: &'a RuntimeState,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logger::init(level).context("failed to install logger")?;

    match cli.command {
        Command::Describe { machine } => describe(&machine),
        Command::Check { machine, program } => check(&machine, program.as_deref()),
        Command::Run {
            machine,
            program,
            input,
            interval_ms,
            budget,
            format,
        } => run(&machine, program.as_deref(), &input, interval_ms, budget, format),
        Command::Init {
            path,
            registers,
            memory,
            with_program,
        } => init(&path, registers, memory, with_program),
    }
}

fn describe(machine: &Path) -> Result<()> {
    let (config, embedded) = load_snapshot(machine)?;
    print!("{}", config.describe());

    if let Some(source) = embedded {
        let program = parse(&source).context("embedded program does not parse")?;
        println!();
        print!("{}", describe_program(&program));
    }
    Ok(())
}

fn check(machine: &Path, program: Option<&Path>) -> Result<()> {
    let (config, embedded) = load_snapshot(machine)?;
    let program = load_program(program, embedded)?;

    match validate(&program, &config) {
        Ok(()) => {
            println!("ok: {} instruction(s)", program.len());
            Ok(())
        }
        Err(errors) => reject(&errors),
    }
}

fn run(
    machine: &Path,
    program: Option<&Path>,
    input: &[i64],
    interval_ms: Option<u64>,
    budget: Option<u64>,
    format: Format,
) -> Result<()> {
    let (config, embedded) = load_snapshot(machine)?;
    let program = load_program(program, embedded)?;

    let mut limits = EngineLimits::new();
    if let Some(budget) = budget {
        limits = limits.with_step_budget(budget);
    }
    if let Some(ms) = interval_ms {
        limits = limits.with_tick_interval(Duration::from_millis(ms));
    }
    let period = limits.tick_interval;

    let mut engine = ExecutionEngine::new(config, limits);
    engine.reset(input);
    if let Err(errors) = engine.load(program) {
        return reject(&errors);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start runtime")?;
    let (_signal, mut listener) = stop_channel();
    let status = runtime.block_on(run_timed(&mut engine, period, None, &mut listener))?;

    match format {
        Format::Json => {
            let report = RunReport {
                status,
                phase: engine.phase(),
                state: engine.state(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => print_summary(&engine, status),
    }
    Ok(())
}

fn init(path: &Path, registers: usize, memory: usize, with_program: bool) -> Result<()> {
    let mut params = MachineParams::new(registers);
    params.memory_size = memory;
    params.input_capacity = 1;
    params.output_capacity = 1;
    params
        .register_output_mode
        .insert("R1".to_string(), OutputModeTag::Push);

    let config = MachineConfig::build(&params).context("invalid machine parameters")?;
    let program = with_program.then_some(SAMPLE_PROGRAM);
    save_snapshot(path, &config, program)?;
    println!("wrote {}", path.display());
    Ok(())
}

/// Program from a file, falling back to the snapshot's embedded source
fn load_program(path: Option<&Path>, embedded: Option<String>) -> Result<Program> {
    let source = match (path, embedded) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("failed to read program {}", path.display()))?,
        (None, Some(source)) => source,
        (None, None) => bail!("no program given and the snapshot embeds none"),
    };
    Ok(parse(&source)?)
}

fn reject(errors: &ValidationErrors) -> Result<()> {
    println!("{}", errors);
    eprintln!("program rejected with {} error(s)", errors.len());
    process::exit(1);
}

fn print_summary(engine: &ExecutionEngine, status: RunStatus) {
    for line in engine.trace() {
        println!("{}", line);
    }
    println!();
    println!("status:    {}", status);
    println!("steps:     {}", engine.steps_executed());
    let registers: Vec<String> = engine
        .registers()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("R{}={}", i + 1, v))
        .collect();
    println!("registers: {}", registers.join(" "));
    println!("memory:    {:?}", engine.memory());
    println!("output:    {:?}", engine.output_queue());
}
