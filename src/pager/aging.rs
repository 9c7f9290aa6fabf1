//! Aging replacement: shift-register LRU approximation.

use std::io::{self, Write};

use super::owner_slot;
use crate::mem::Frame;
use crate::process::Process;

/// Keeps a 32-bit age per frame. Every selection shifts each age right one
/// bit and ORs the high bit back in for pages referenced since the last
/// scan (clearing the bit); the smallest age after shifting loses, first
/// seen from the hand on ties. Freshly mapped frames restart at age zero.
#[derive(Debug)]
pub struct AgingPager {
    hand: usize,
    ages: Vec<u32>,
    aselect: bool,
}

impl AgingPager {
    #[must_use]
    pub fn new(num_frames: usize, aselect: bool) -> Self {
        Self {
            hand: 0,
            ages: vec![0; num_frames],
            aselect,
        }
    }

    /// `on_map` hook: a new page entered `frame`.
    pub fn reset_age(&mut self, frame: usize) {
        self.ages[frame] = 0;
    }

    #[cfg(test)]
    pub(crate) fn age(&self, frame: usize) -> u32 {
        self.ages[frame]
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

        let mut min_age = u32::MAX;
        let mut victim: Option<usize> = None;

        for _ in 0..num_frames {
            let frame = &frames[self.hand];
            let slot = owner_slot(frame);
            let pte = &mut processes[slot.pid].page_table[slot.vpage];

            self.ages[self.hand] >>= 1;
            if pte.referenced() {
                self.ages[self.hand] |= 0x8000_0000;
                pte.set_referenced(false);
            }

            if self.aselect {
                write!(out, "{}:{:x} ", self.hand, self.ages[self.hand])?;
            }

            if victim.is_none() || self.ages[self.hand] < min_age {
                min_age = self.ages[self.hand];
                victim = Some(frame.index);
            }

            self.hand = (self.hand + 1) % num_frames;
        }

        let victim = victim.expect("scan visits at least one frame");
        self.hand = (victim + 1) % num_frames;

        if self.aselect {
            writeln!(out, "| {victim}")?;
        }

        Ok(victim)
    }
}
