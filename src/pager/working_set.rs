//! Working-set replacement.
//!
//! A page is inside the working set while it was used within the last
//! [`TAU`] instructions. The scan clears referenced bits (refreshing
//! `last_used` to now), takes the first page idle for at least τ as an
//! immediate victim, and otherwise falls back to the oldest page seen.

use std::io::{self, Write};

use super::owner_slot;
use crate::mem::Frame;
use crate::process::Process;

/// Working-set window, in instructions.
pub const TAU: u64 = 50;

#[derive(Debug)]
pub struct WorkingSetPager {
    hand: usize,
    now: u64,
    last_used: Vec<u64>,
    aselect: bool,
}

impl WorkingSetPager {
    #[must_use]
    pub fn new(num_frames: usize, aselect: bool) -> Self {
        Self {
            hand: 0,
            now: 0,
            last_used: vec![0; num_frames],
            aselect,
        }
    }

    pub fn tick(&mut self) {
        self.now += 1;
    }

    /// `on_map` / `on_access` hook: the page in `frame` was used during
    /// instruction `now`.
    pub fn record_use(&mut self, frame: usize, now: u64) {
        self.last_used[frame] = now;
    }

    pub fn select_victim(
        &mut self,
        frames: &[Frame],
        processes: &mut [Process],
        out: &mut dyn Write,
    ) -> io::Result<usize> {
        let num_frames = frames.len();
        if self.aselect {
            write!(
                out,
                "ASELECT {}-{} | ",
                self.hand,
                (self.hand + num_frames - 1) % num_frames
            )?;
        }

        let start = self.hand;
        let mut oldest = self.now;
        let mut victim: Option<usize> = None;

        loop {
            let frame = &frames[self.hand];
            let slot = owner_slot(frame);
            let pte = &mut processes[slot.pid].page_table[slot.vpage];

            if pte.referenced() {
                // Recently used: back into the working set.
                pte.set_referenced(false);
                self.last_used[self.hand] = self.now;
            } else if self.now - self.last_used[self.hand] >= TAU {
                // Idle past the window: immediate victim.
                victim = Some(frame.index);
                if self.aselect {
                    write!(
                        out,
                        "{}(0 {}:{} {}) ",
                        self.hand, slot.pid, slot.vpage, self.last_used[self.hand]
                    )?;
                }
                break;
            }

            // Oldest-seen fallback; frames refreshed above participate at
            // last_used == now, so an all-referenced ring still resolves to
            // the first frame after the hand.
            if victim.is_none() || self.last_used[self.hand] < oldest {
                oldest = self.last_used[self.hand];
                victim = Some(frame.index);
            }

            if self.aselect {
                write!(
                    out,
                    "{}({} {}:{} {}) ",
                    self.hand,
                    u32::from(pte.referenced()),
                    slot.pid,
                    slot.vpage,
                    self.last_used[self.hand]
                )?;
            }

            self.hand = (self.hand + 1) % num_frames;
            if self.hand == start {
                break;
            }
        }

        let victim = victim.expect("scan visits at least one frame");
        if self.aselect {
            writeln!(out, "| {victim}")?;
        }
        self.hand = (victim + 1) % num_frames;

        Ok(victim)
    }
}
