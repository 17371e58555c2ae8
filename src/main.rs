use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use andrews::runfile::{RunFile, classroom};
use andrews::{Backend, Figure, Fluid, OutputPaths, generate};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Draw Andrews isotherm networks (P–v diagrams) for a pure fluid."
)]
struct Cli {
    /// Fluid name, e.g. carbondioxide, CO2, water, R134a.
    fluid: Option<String>,

    /// TOML run file listing the diagrams to draw.
    #[arg(long)]
    run_file: Option<PathBuf>,

    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Directory receiving images and exports [default: PNG].
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Draw the three classic classroom diagrams.
    #[arg(long)]
    classroom: bool,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("warning: logging disabled ({e})");
    }
}

fn run(cli: Cli) -> andrews::Result<()> {
    let run_file = match &cli.run_file {
        Some(path) => RunFile::load(path)?,
        None => RunFile::default(),
    };

    let fluid_name = cli
        .fluid
        .or(run_file.fluid.clone())
        .unwrap_or_else(|| "carbondioxide".to_string());
    let backend = cli.backend.or(run_file.backend).unwrap_or_default();
    let paths = OutputPaths::new(
        cli.output_dir
            .or(run_file.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("PNG")),
    );
    paths.ensure_dir()?;

    let fluid = Fluid::with_backend(&fluid_name, backend)?;
    let runs = if cli.classroom {
        classroom(&fluid_name)
    } else {
        run_file.runs()
    };

    let mut figure = Figure::new();
    for overrides in &runs {
        let report = generate(&fluid, overrides, &paths, &mut figure)?;
        for file in &report.files {
            println!("{}", file.display());
        }
        info!(
            "{}: {} isotherms × {} samples ({} backend)",
            report.fluid,
            report.curves,
            report.samples_per_curve,
            fluid.backend()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
