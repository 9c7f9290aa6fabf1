//! Trace options and the formatted reporting surface.
//!
//! The option string is a concatenation of single letters:
//!
//! | letter | effect |
//! |--------|--------|
//! | `O` | trace every instruction and sub-event |
//! | `P` | dump all page tables after the run |
//! | `F` | dump the frame table after the run |
//! | `S` | per-process stats and the `TOTALCOST` line after the run |
//! | `x` | dump the current process's page table after each instruction |
//! | `y` | dump all page tables after each instruction |
//! | `f` | dump the frame table after each instruction |
//! | `a` | pager `ASELECT` debug lines |
//!
//! Dump letters keep their first-appearance order: `-oFS` prints the frame
//! table before the summary, `-oSF` the other way around. Unrecognized
//! letters are ignored.

use std::io::{self, Write};
use std::mem::size_of;

#[allow(unused_imports)]
use crate::mem::{Frame, Pte, MAX_VPAGES};
use crate::process::Process;

const KNOWN_LETTERS: &[char] = &['O', 'P', 'F', 'S', 'x', 'y', 'f', 'a'];

/// Parsed output options.
#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    letters: Vec<char>,
}

impl TraceOptions {
    /// Parse an option string, keeping recognized letters in first-appearance
    /// order and dropping duplicates and unknown letters.
    #[must_use]
    pub fn parse(optstr: &str) -> Self {
        let mut letters = Vec::new();
        for ch in optstr.chars() {
            if KNOWN_LETTERS.contains(&ch) && !letters.contains(&ch) {
                letters.push(ch);
            }
        }
        Self { letters }
    }

    fn has(&self, letter: char) -> bool {
        self.letters.contains(&letter)
    }

    /// `O`: per-instruction trace lines.
    #[must_use]
    pub fn trace(&self) -> bool {
        self.has('O')
    }

    /// `a`: pager selection debug lines.
    #[must_use]
    pub fn aselect(&self) -> bool {
        self.has('a')
    }

    /// The `x`/`y`/`f` letters in the order they appeared.
    pub fn per_instruction_dumps(&self) -> impl Iterator<Item = char> + '_ {
        self.letters
            .iter()
            .copied()
            .filter(|ch| matches!(ch, 'x' | 'y' | 'f'))
    }

    /// The `P`/`F`/`S` letters in the order they appeared.
    pub fn final_dumps(&self) -> impl Iterator<Item = char> + '_ {
        self.letters
            .iter()
            .copied()
            .filter(|ch| matches!(ch, 'P' | 'F' | 'S'))
    }
}

/// End-of-run accounting, printed on the `TOTALCOST` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub instructions: u64,
    pub ctx_switches: u64,
    pub process_exits: u64,
    pub total_cost: u64,
}

/// `PT[pid]:` line: per page `i:RMS` with `-` for clear bits, or `#` for a
/// paged-out non-present page, `*` otherwise.
pub fn write_page_table(out: &mut dyn Write, process: &Process) -> io::Result<()> {
    write!(out, "PT[{}]:", process.pid)?;
    for (vpage, pte) in process.page_table.iter().enumerate() {
        write!(out, " ")?;
        write_page_token(out, vpage, *pte)?;
    }
    writeln!(out)
}

fn write_page_token(out: &mut dyn Write, vpage: usize, pte: Pte) -> io::Result<()> {
    if pte.present() {
        write!(
            out,
            "{}:{}{}{}",
            vpage,
            if pte.referenced() { 'R' } else { '-' },
            if pte.modified() { 'M' } else { '-' },
            if pte.paged_out() { 'S' } else { '-' },
        )
    } else if pte.paged_out() {
        write!(out, "#")
    } else {
        write!(out, "*")
    }
}

/// One `PT[pid]:` line per process.
pub fn write_all_page_tables(out: &mut dyn Write, processes: &[Process]) -> io::Result<()> {
    for process in processes {
        write_page_table(out, process)?;
    }
    Ok(())
}

/// `FT:` line: `pid:vpage` per occupied frame, `*` per free frame.
pub fn write_frame_table(out: &mut dyn Write, frames: &[Frame]) -> io::Result<()> {
    write!(out, "FT:")?;
    for frame in frames {
        match &frame.slot {
            Some(slot) => write!(out, " {}:{}", slot.pid, slot.vpage)?,
            None => write!(out, " *")?,
        }
    }
    writeln!(out)
}

/// Per-process `PROC[pid]` stat lines followed by the `TOTALCOST` line.
pub fn write_summary(
    out: &mut dyn Write,
    processes: &[Process],
    totals: Totals,
) -> io::Result<()> {
    for process in processes {
        let stats = &process.stats;
        writeln!(
            out,
            "PROC[{}]: U={} M={} I={} O={} FI={} FO={} Z={} SV={} SP={}",
            process.pid,
            stats.unmaps,
            stats.maps,
            stats.ins,
            stats.outs,
            stats.fins,
            stats.fouts,
            stats.zeros,
            stats.segv,
            stats.segprot,
        )?;
    }
    writeln!(
        out,
        "TOTALCOST {} {} {} {} {}",
        totals.instructions,
        totals.ctx_switches,
        totals.process_exits,
        totals.total_cost,
        size_of::<Pte>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::Slot;
    use crate::process::Vma;

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_option_letters_keep_first_appearance_order() {
        let options = TraceOptions::parse("SFOP");
        assert!(options.trace());
        assert_eq!(options.final_dumps().collect::<Vec<_>>(), vec!['S', 'F', 'P']);
    }

    #[test]
    fn test_duplicates_and_unknown_letters_dropped() {
        let options = TraceOptions::parse("OOxzqxf");
        assert!(options.trace());
        assert_eq!(
            options.per_instruction_dumps().collect::<Vec<_>>(),
            vec!['x', 'f']
        );
        assert!(!options.aselect());
    }

    #[test]
    fn test_empty_option_string() {
        let options = TraceOptions::parse("");
        assert!(!options.trace());
        assert_eq!(options.final_dumps().count(), 0);
        assert_eq!(options.per_instruction_dumps().count(), 0);
    }

    #[test]
    fn test_page_table_line_tokens() {
        let mut process = Process::new(1);
        process
            .add_vma(Vma {
                start_vpage: 0,
                end_vpage: 3,
                write_protect: false,
                file_mapped: false,
            })
            .unwrap();

        // Page 0 present and referenced+modified, page 1 paged out,
        // page 2 never touched.
        let pte = &mut process.page_table[0];
        pte.set_present(true);
        pte.set_referenced(true);
        pte.set_modified(true);
        process.page_table[1].set_paged_out(true);

        let line = render(|out| write_page_table(out, &process));
        assert!(line.starts_with("PT[1]: 0:RM- # *"));
        assert!(line.ends_with("*\n"));
        assert_eq!(line.split(' ').count(), 1 + MAX_VPAGES);
    }

    #[test]
    fn test_present_page_with_swap_history_shows_s() {
        let mut process = Process::new(0);
        let pte = &mut process.page_table[5];
        pte.set_present(true);
        pte.set_paged_out(true);

        let line = render(|out| write_page_table(out, &process));
        assert!(line.contains(" 5:--S "));
    }

    #[test]
    fn test_frame_table_line() {
        let mut frames = vec![Frame::new(0), Frame::new(1), Frame::new(2)];
        frames[0].slot = Some(Slot { pid: 0, vpage: 12 });
        frames[2].slot = Some(Slot { pid: 1, vpage: 3 });

        let line = render(|out| write_frame_table(out, &frames));
        assert_eq!(line, "FT: 0:12 * 1:3\n");
    }

    #[test]
    fn test_summary_lines() {
        let mut process = Process::new(0);
        process.stats.maps = 3;
        process.stats.unmaps = 1;
        process.stats.zeros = 3;
        process.stats.segv = 2;

        let totals = Totals {
            instructions: 10,
            ctx_switches: 1,
            process_exits: 0,
            total_cost: 4242,
        };
        let text = render(|out| write_summary(out, &[process], totals));
        assert_eq!(
            text,
            "PROC[0]: U=1 M=3 I=0 O=0 FI=0 FO=0 Z=3 SV=2 SP=0\nTOTALCOST 10 1 0 4242 4\n"
        );
    }
}
