//! Paginar: a trace-driven simulator of a paging memory management unit.
//!
//! The simulator replays a stream of memory operations (context switch,
//! read, write, process exit) over per-process page tables and a shared
//! physical frame table, exactly as an operating-system pager would:
//! demand-faulting pages in, evicting under memory pressure through a
//! selectable replacement policy, flagging segmentation and protection
//! violations, and charging a fixed cost per event. For a fixed input,
//! policy, and random file the emitted trace is byte-exact reproducible.
//!
//! # Quick start
//!
//! ```
//! use paginar::input::Workload;
//! use paginar::mmu::Simulation;
//! use paginar::pager::{Algorithm, Pager};
//! use paginar::report::TraceOptions;
//! use paginar::rng::RandomSource;
//!
//! let workload = Workload::parse("1\n1\n0 3 0 0\nc 0\nr 0\nr 1\n").unwrap();
//! let pager = Pager::new(
//!     Algorithm::Fifo,
//!     2,
//!     RandomSource::from_values(vec![1]).unwrap(),
//!     false,
//! );
//! let mut sim = Simulation::new(2, workload.processes, pager, TraceOptions::parse("O")).unwrap();
//!
//! let mut trace = Vec::new();
//! sim.run(&workload.instructions, &mut trace).unwrap();
//! assert!(String::from_utf8(trace).unwrap().contains(" MAP 0"));
//! assert_eq!(sim.totals().instructions, 3);
//! ```
//!
//! # Modules
//!
//! - [`mmu`]: the paging state machine
//! - [`pager`]: the six replacement policies behind one selection contract
//! - [`mem`]: bit-packed page-table entries and the frame table
//! - [`process`]: process descriptors, VMAs, per-process statistics
//! - [`input`]: the process/VMA/instruction file format
//! - [`report`]: trace options and the page-table/frame-table/summary dumps
//! - [`rng`]: the file-seeded random oracle

pub mod error;
pub mod input;
pub mod mem;
pub mod mmu;
pub mod pager;
pub mod process;
pub mod report;
pub mod rng;

pub use error::{PaginarError, Result};
pub use input::{Instruction, Opcode, Workload};
pub use mem::{Frame, Pte, MAX_FRAMES, MAX_VPAGES};
pub use mmu::Simulation;
pub use pager::{Algorithm, Pager};
pub use process::{ProcStats, Process, Vma};
pub use report::{Totals, TraceOptions};
pub use rng::RandomSource;
