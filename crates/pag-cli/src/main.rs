//! pag - paging MMU trace simulator
//!
//! Usage:
//!   pag -f16 -af -oOPFS trace.in randfile     # FIFO over 16 frames, full output
//!   pag -ac -oO trace.in randfile             # Clock, trace only
//!   pag -aw -oOa trace.in randfile            # Working Set with ASELECT debug
//!
//! The trace goes to stdout and is byte-exact reproducible for a fixed
//! input file, random file, algorithm, and frame count.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use paginar::{Algorithm, Pager, RandomSource, Simulation, TraceOptions, Workload, MAX_FRAMES};

mod error;

use error::{CliError, Result};

/// pag - paging MMU trace simulator
///
/// Replays a memory-operation trace against simulated page tables and
/// physical frames, with a selectable page-replacement policy.
#[derive(Parser)]
#[command(name = "pag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of physical frames (1..=128)
    #[arg(short = 'f', long = "frames", value_name = "NUMFRAMES", default_value_t = 128)]
    frames: usize,

    /// Replacement algorithm: f=FIFO r=Random c=Clock e=NRU a=Aging w=WorkingSet
    #[arg(short = 'a', long = "algorithm", value_name = "ALGO", default_value = "f")]
    algorithm: String,

    /// Output options, a concatenation of the letters OPFSxyfa
    #[arg(short = 'o', long = "options", value_name = "OPTSTR", default_value = "")]
    options: String,

    /// Process, VMA, and instruction file
    #[arg(value_name = "INPUTFILE")]
    input: PathBuf,

    /// Random number file (first value is a count)
    #[arg(value_name = "RANDFILE")]
    random: PathBuf,
}

fn require_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

fn execute(cli: &Cli) -> Result<()> {
    if cli.frames == 0 || cli.frames > MAX_FRAMES {
        return Err(CliError::InvalidFrameCount(cli.frames));
    }
    let algorithm: Algorithm = cli.algorithm.parse().map_err(CliError::Paginar)?;
    let options = TraceOptions::parse(&cli.options);

    require_file(&cli.input)?;
    require_file(&cli.random)?;
    let randoms = RandomSource::from_file(&cli.random)?;
    let workload = Workload::from_path(&cli.input)?;

    let pager = Pager::new(algorithm, cli.frames, randoms, options.aselect());
    let mut sim = Simulation::new(cli.frames, workload.processes, pager, options)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    sim.run(&workload.instructions, &mut out)?;
    sim.write_final_reports(&mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
