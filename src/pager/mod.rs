//! Page-replacement policies.
//!
//! Six interchangeable victim selectors drive frame eviction:
//!
//! - [`FifoPager`]: round-robin over frame indices
//! - [`RandomPager`]: draws indices from the file-seeded [`RandomSource`]
//! - [`ClockPager`]: second chance on the referenced bit
//! - [`NruPager`]: enhanced second chance over (referenced, modified) classes
//! - [`AgingPager`]: 32-bit shift-register approximation of LRU
//! - [`WorkingSetPager`]: evicts pages idle longer than the window τ
//!
//! [`Pager`] is a tagged variant over the policy structs. The simulator calls
//! every hook unconditionally and each policy ignores the ones it does not
//! need, so there is no runtime type inspection anywhere on the fault path.
//!
//! The contract for [`Pager::select_victim`]: it is only called when the free
//! list is empty, which by the free-list invariant means every frame is
//! occupied, and it always returns the index of an occupied frame. Policies
//! that scan read the owning page-table entries through the frame table and
//! may clear `referenced` bits as a side effect.

mod aging;
mod clock;
mod fifo;
mod nru;
mod random;
mod working_set;

pub use aging::AgingPager;
pub use clock::ClockPager;
pub use fifo::FifoPager;
pub use nru::NruPager;
pub use random::RandomPager;
pub use working_set::WorkingSetPager;

use std::io::{self, Write};
use std::str::FromStr;

use crate::error::PaginarError;
use crate::mem::{Frame, Slot};
use crate::process::Process;
use crate::rng::RandomSource;

/// Replacement-algorithm selector, one letter each on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Fifo,
    Random,
    Clock,
    Nru,
    Aging,
    WorkingSet,
}

impl Algorithm {
    /// The command-line letter for this algorithm.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Fifo => 'f',
            Self::Random => 'r',
            Self::Clock => 'c',
            Self::Nru => 'e',
            Self::Aging => 'a',
            Self::WorkingSet => 'w',
        }
    }
}

impl FromStr for Algorithm {
    type Err = PaginarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" => Ok(Self::Fifo),
            "r" => Ok(Self::Random),
            "c" => Ok(Self::Clock),
            "e" => Ok(Self::Nru),
            "a" => Ok(Self::Aging),
            "w" => Ok(Self::WorkingSet),
            other => Err(PaginarError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// The active replacement policy and its private scratch state.
#[derive(Debug)]
pub enum Pager {
    Fifo(FifoPager),
    Random(RandomPager),
    Clock(ClockPager),
    Nru(NruPager),
    Aging(AgingPager),
    WorkingSet(WorkingSetPager),
}

impl Pager {
    /// Build the policy selected by `algorithm` for a table of `num_frames`
    /// frames. The random source is consumed only by the Random policy;
    /// `aselect` enables the per-selection debug lines of the scanning
    /// policies.
    #[must_use]
    pub fn new(
        algorithm: Algorithm,
        num_frames: usize,
        source: RandomSource,
        aselect: bool,
    ) -> Self {
        match algorithm {
            Algorithm::Fifo => Self::Fifo(FifoPager::new(num_frames)),
            Algorithm::Random => Self::Random(RandomPager::new(num_frames, source)),
            Algorithm::Clock => Self::Clock(ClockPager::new()),
            Algorithm::Nru => Self::Nru(NruPager::new(aselect)),
            Algorithm::Aging => Self::Aging(AgingPager::new(num_frames, aselect)),
            Algorithm::WorkingSet => Self::WorkingSet(WorkingSetPager::new(num_frames, aselect)),
        }
    }

    /// Choose an occupied frame to evict.
    ///
    /// Must not be called while the free list is non-empty. Scanning
    /// policies may clear `referenced` bits in `processes` and write
    /// `ASELECT` debug lines to `out`.
    pub fn select_victim(
        &mut self,
        frames: &[Frame],
        processes: &mut [Process],
        out: &mut dyn Write,
    ) -> io::Result<usize> {
        match self {
            Self::Fifo(pager) => Ok(pager.select_victim()),
            Self::Random(pager) => Ok(pager.select_victim()),
            Self::Clock(pager) => Ok(pager.select_victim(frames, processes)),
            Self::Nru(pager) => pager.select_victim(frames, processes, out),
            Self::Aging(pager) => pager.select_victim(frames, processes, out),
            Self::WorkingSet(pager) => pager.select_victim(frames, processes, out),
        }
    }

    /// A page was just mapped into `frame` during instruction `now`.
    pub fn on_map(&mut self, frame: usize, now: u64) {
        match self {
            Self::Aging(pager) => pager.reset_age(frame),
            Self::WorkingSet(pager) => pager.record_use(frame, now),
            _ => {}
        }
    }

    /// A mapped page in `frame` was successfully accessed during
    /// instruction `now`.
    pub fn on_access(&mut self, frame: usize, now: u64) {
        if let Self::WorkingSet(pager) = self {
            pager.record_use(frame, now);
        }
    }

    /// One instruction has completed.
    pub fn tick(&mut self) {
        match self {
            Self::Nru(pager) => pager.tick(),
            Self::WorkingSet(pager) => pager.tick(),
            _ => {}
        }
    }
}

/// Page-table entry owned by the occupant of `frame`.
///
/// Callers hold the select-victim precondition, so an unoccupied frame here
/// is a simulator bug, not an input error.
fn owner_slot(frame: &Frame) -> Slot {
    frame
        .slot
        .expect("select_victim requires a fully occupied frame table")
}
