//! NRU replacement (enhanced second chance).
//!
//! Pages are classified by `2 * referenced + modified`; the victim is the
//! first frame of the lowest non-empty class, scanning from the hand. Every
//! [`RESET_PERIOD`] instructions the scan covers the whole ring and clears
//! the referenced bit of every page it visits; outside a reset the scan
//! short-circuits as soon as it sees a class-0 page.

use std::io::{self, Write};

use super::owner_slot;
use crate::mem::Frame;
use crate::process::Process;

/// Instructions between referenced-bit resets.
pub const RESET_PERIOD: u64 = 48;

#[derive(Debug)]
pub struct NruPager {
    hand: usize,
    now: u64,
    last_reset: u64,
    aselect: bool,
}

impl NruPager {
    #[must_use]
    pub fn new(aselect: bool) -> Self {
        Self {
            hand: 0,
            now: 0,
            last_reset: 0,
            aselect,
        }
    }

    pub fn tick(&mut self) {
        self.now += 1;
    }

    pub fn select_victim(
        &mut self,
        frames: &[Frame],
        processes: &mut [Process],
        out: &mut dyn Write,
    ) -> io::Result<usize> {
        let num_frames = frames.len();
        let reset = self.now - self.last_reset >= RESET_PERIOD;
        if reset {
            self.last_reset = self.now;
        }

        let start = self.hand;
        let mut class_frames: [Option<usize>; 4] = [None; 4];
        let mut lowest_class = 4;

        loop {
            let frame = &frames[self.hand];
            let slot = owner_slot(frame);
            let pte = &mut processes[slot.pid].page_table[slot.vpage];

            let class = 2 * usize::from(pte.referenced()) + usize::from(pte.modified());
            if class_frames[class].is_none() {
                class_frames[class] = Some(frame.index);
                if class < lowest_class {
                    lowest_class = class;
                }
            }

            // Classification above sees the pre-reset bit.
            if reset {
                pte.set_referenced(false);
            }

            self.hand = (self.hand + 1) % num_frames;

            if !reset && class == 0 {
                break;
            }
            if self.hand == start {
                break;
            }
        }

        let victim = class_frames[lowest_class]
            .expect("an occupied ring always yields at least one class");
        self.hand = (victim + 1) % num_frames;

        if self.aselect {
            writeln!(
                out,
                "ASELECT: {start} {} | {lowest_class} {victim}",
                u32::from(reset)
            )?;
        }

        Ok(victim)
    }
}
