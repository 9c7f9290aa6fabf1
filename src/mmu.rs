//! The paging state machine.
//!
//! [`Simulation`] consumes the instruction stream one operation at a time:
//! context switches, read/write accesses (with demand faulting), and process
//! exits. It owns the frame table and the free-frame pool and delegates
//! victim selection to the active [`Pager`] once the pool runs dry. Every
//! event charges a fixed cost; the event sequence written to the trace sink
//! is deterministic and byte-exact for a fixed input, policy, and random
//! file.
//!
//! Event ordering on a fault is observable and fixed: the evicted page's
//! `UNMAP` (and `OUT`/`FOUT` if dirty) comes first, then the new page's
//! backing-store event (`IN`/`FIN`/`ZERO`), then its `MAP`.

use std::collections::VecDeque;
use std::io::Write;

use crate::error::{PaginarError, Result};
use crate::input::{Instruction, Opcode};
use crate::mem::{Frame, Slot, MAX_FRAMES, MAX_VPAGES};
use crate::pager::Pager;
use crate::process::Process;
use crate::report::{self, Totals, TraceOptions};

pub const COST_CTX_SWITCH: u64 = 130;
pub const COST_PROCESS_EXIT: u64 = 1230;
pub const COST_MAP: u64 = 350;
pub const COST_UNMAP: u64 = 410;
pub const COST_IN: u64 = 3200;
pub const COST_OUT: u64 = 2750;
pub const COST_FIN: u64 = 2350;
pub const COST_FOUT: u64 = 2800;
pub const COST_ZERO: u64 = 150;
pub const COST_SEGV: u64 = 440;
pub const COST_SEGPROT: u64 = 410;
pub const COST_READ_WRITE: u64 = 1;

/// The simulator: processes, frame table, free pool, active pager,
/// and cost accounting.
#[derive(Debug)]
pub struct Simulation {
    frames: Vec<Frame>,
    free_frames: VecDeque<usize>,
    processes: Vec<Process>,
    pager: Pager,
    options: TraceOptions,
    current: Option<usize>,
    inst_count: u64,
    total_cost: u64,
    ctx_switches: u64,
    process_exits: u64,
}

impl Simulation {
    /// Build a simulation over `num_frames` physical frames. The free pool
    /// starts holding every frame in index order.
    pub fn new(
        num_frames: usize,
        processes: Vec<Process>,
        pager: Pager,
        options: TraceOptions,
    ) -> Result<Self> {
        if num_frames == 0 || num_frames > MAX_FRAMES {
            return Err(PaginarError::InvalidFrameCount(num_frames));
        }
        Ok(Self {
            frames: (0..num_frames).map(Frame::new).collect(),
            free_frames: (0..num_frames).collect(),
            processes,
            pager,
            options,
            current: None,
            inst_count: 0,
            total_cost: 0,
            ctx_switches: 0,
            process_exits: 0,
        })
    }

    /// Execute the whole instruction stream.
    pub fn run(&mut self, instructions: &[Instruction], out: &mut dyn Write) -> Result<()> {
        for instruction in instructions {
            self.step(instruction, out)?;
        }
        Ok(())
    }

    /// Execute one instruction: trace header, dispatch, pager tick, then
    /// any per-instruction dumps.
    pub fn step(&mut self, instruction: &Instruction, out: &mut dyn Write) -> Result<()> {
        let now = self.inst_count;
        self.inst_count += 1;

        if self.options.trace() {
            writeln!(out, "{now}: ==> {instruction}")?;
        }

        match instruction.op {
            Opcode::ContextSwitch => self.context_switch(instruction.value)?,
            Opcode::Read => self.access(instruction.value, false, now, out)?,
            Opcode::Write => self.access(instruction.value, true, now, out)?,
            Opcode::Exit => self.exit(instruction.value, out)?,
        }

        self.pager.tick();

        for letter in self.options.per_instruction_dumps() {
            match letter {
                'x' => {
                    if let Some(pid) = self.current {
                        report::write_page_table(out, &self.processes[pid])?;
                    }
                }
                'y' => report::write_all_page_tables(out, &self.processes)?,
                'f' => report::write_frame_table(out, &self.frames)?,
                _ => unreachable!("per_instruction_dumps yields only x, y, f"),
            }
        }

        Ok(())
    }

    fn context_switch(&mut self, procid: i64) -> Result<()> {
        let pid = self.resolve_pid(procid)?;
        if self.current != Some(pid) {
            self.ctx_switches += 1;
            self.total_cost += COST_CTX_SWITCH;
        }
        self.current = Some(pid);
        Ok(())
    }

    fn access(&mut self, vpage: i64, is_write: bool, now: u64, out: &mut dyn Write) -> Result<()> {
        self.total_cost += COST_READ_WRITE;
        let pid = self.current.ok_or(PaginarError::NoCurrentProcess)?;

        if vpage < 0 || vpage >= MAX_VPAGES as i64 {
            self.segv(pid, out)?;
            return Ok(());
        }
        let vpage = vpage as usize;

        if !self.processes[pid].page_table[vpage].present() {
            self.fault(pid, vpage, now, out)?;
            if !self.processes[pid].page_table[vpage].present() {
                // The fault was denied: SEGV already charged.
                return Ok(());
            }
        }

        let pte = &mut self.processes[pid].page_table[vpage];
        if is_write && pte.write_protect() {
            pte.set_referenced(true);
            if self.options.trace() {
                writeln!(out, " SEGPROT")?;
            }
            self.processes[pid].stats.segprot += 1;
            self.total_cost += COST_SEGPROT;
            return Ok(());
        }

        pte.set_referenced(true);
        if is_write {
            pte.set_modified(true);
        }
        let frame = pte.frame();
        self.pager.on_access(frame, now);
        Ok(())
    }

    /// Demand-fault `vpage` into a frame, evicting a victim if the free
    /// pool is empty. A page outside every VMA is a SEGV and allocates
    /// nothing.
    fn fault(&mut self, pid: usize, vpage: usize, now: u64, out: &mut dyn Write) -> Result<()> {
        let info = self.processes[pid].page_info(vpage);
        if !info.valid {
            self.segv(pid, out)?;
            return Ok(());
        }

        let frame_index = match self.free_frames.pop_front() {
            Some(index) => index,
            None => self
                .pager
                .select_victim(&self.frames, &mut self.processes, out)?,
        };

        // Evict the current occupant. The frame never passes through the
        // free pool here; it goes straight to the new owner.
        if let Some(old) = self.frames[frame_index].slot.take() {
            if self.options.trace() {
                writeln!(out, " UNMAP {}:{}", old.pid, old.vpage)?;
            }
            self.processes[old.pid].stats.unmaps += 1;
            self.total_cost += COST_UNMAP;

            if self.processes[old.pid].page_table[old.vpage].modified() {
                if self.processes[old.pid].page_table[old.vpage].file_mapped() {
                    if self.options.trace() {
                        writeln!(out, " FOUT")?;
                    }
                    self.processes[old.pid].stats.fouts += 1;
                    self.total_cost += COST_FOUT;
                } else {
                    if self.options.trace() {
                        writeln!(out, " OUT")?;
                    }
                    self.processes[old.pid].stats.outs += 1;
                    self.total_cost += COST_OUT;
                    self.processes[old.pid].page_table[old.vpage].set_paged_out(true);
                }
                self.processes[old.pid].page_table[old.vpage].set_modified(false);
            }

            let old_pte = &mut self.processes[old.pid].page_table[old.vpage];
            old_pte.set_present(false);
            old_pte.set_frame(0);
            old_pte.set_referenced(false);
        }

        self.frames[frame_index].slot = Some(Slot { pid, vpage });

        let pte = &mut self.processes[pid].page_table[vpage];
        pte.set_present(true);
        pte.set_frame(frame_index);
        if !pte.initialized() {
            pte.set_write_protect(info.write_protect);
            pte.set_file_mapped(info.file_mapped);
            pte.set_initialized(true);
        }

        // Backing-store event, then the MAP itself.
        if pte.file_mapped() {
            if self.options.trace() {
                writeln!(out, " FIN")?;
            }
            self.processes[pid].stats.fins += 1;
            self.total_cost += COST_FIN;
        } else if self.processes[pid].page_table[vpage].paged_out() {
            if self.options.trace() {
                writeln!(out, " IN")?;
            }
            self.processes[pid].stats.ins += 1;
            self.total_cost += COST_IN;
        } else {
            if self.options.trace() {
                writeln!(out, " ZERO")?;
            }
            self.processes[pid].stats.zeros += 1;
            self.total_cost += COST_ZERO;
        }

        if self.options.trace() {
            writeln!(out, " MAP {frame_index}")?;
        }
        self.processes[pid].stats.maps += 1;
        self.total_cost += COST_MAP;

        self.pager.on_map(frame_index, now);
        Ok(())
    }

    /// Tear down every mapping of the exiting process and return its frames
    /// to the free pool. Dirty file-mapped pages are written back; anonymous
    /// pages just cease to exist, so no `OUT` is emitted and swap slots are
    /// conceptually freed.
    fn exit(&mut self, procid: i64, out: &mut dyn Write) -> Result<()> {
        let pid = self.resolve_pid(procid)?;
        if self.options.trace() {
            writeln!(out, "EXIT current process {pid}")?;
        }

        for vpage in 0..MAX_VPAGES {
            let pte = self.processes[pid].page_table[vpage];
            if pte.present() {
                let frame_index = pte.frame();
                if self.options.trace() {
                    writeln!(out, " UNMAP {pid}:{vpage}")?;
                }
                self.processes[pid].stats.unmaps += 1;
                self.total_cost += COST_UNMAP;

                if pte.modified() && pte.file_mapped() {
                    if self.options.trace() {
                        writeln!(out, " FOUT")?;
                    }
                    self.processes[pid].stats.fouts += 1;
                    self.total_cost += COST_FOUT;
                }

                self.frames[frame_index].slot = None;
                self.free_frames.push_back(frame_index);
            }

            let pte = &mut self.processes[pid].page_table[vpage];
            pte.set_present(false);
            pte.set_referenced(false);
            pte.set_modified(false);
            pte.set_frame(0);
            pte.set_paged_out(false);
        }

        self.process_exits += 1;
        self.total_cost += COST_PROCESS_EXIT;
        Ok(())
    }

    fn segv(&mut self, pid: usize, out: &mut dyn Write) -> Result<()> {
        if self.options.trace() {
            writeln!(out, " SEGV")?;
        }
        self.processes[pid].stats.segv += 1;
        self.total_cost += COST_SEGV;
        Ok(())
    }

    fn resolve_pid(&self, procid: i64) -> Result<usize> {
        if procid < 0 || procid as usize >= self.processes.len() {
            return Err(PaginarError::NoSuchProcess(procid));
        }
        Ok(procid as usize)
    }

    /// The `P`/`F`/`S` end-of-run dumps, in the order their option letters
    /// appeared.
    pub fn write_final_reports(&self, out: &mut dyn Write) -> Result<()> {
        for letter in self.options.final_dumps() {
            match letter {
                'P' => report::write_all_page_tables(out, &self.processes)?,
                'F' => report::write_frame_table(out, &self.frames)?,
                'S' => report::write_summary(out, &self.processes, self.totals())?,
                _ => unreachable!("final_dumps yields only P, F, S"),
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frames currently on the free list, in pop order.
    #[must_use]
    pub fn free_frames(&self) -> &VecDeque<usize> {
        &self.free_frames
    }

    #[must_use]
    pub fn current_process(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals {
            instructions: self.inst_count,
            ctx_switches: self.ctx_switches,
            process_exits: self.process_exits,
            total_cost: self.total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::{Algorithm, Pager};
    use crate::process::Vma;
    use crate::rng::RandomSource;

    fn simulation(num_frames: usize) -> Simulation {
        let mut process = Process::new(0);
        process
            .add_vma(Vma {
                start_vpage: 0,
                end_vpage: 15,
                write_protect: false,
                file_mapped: false,
            })
            .unwrap();
        let pager = Pager::new(
            Algorithm::Fifo,
            num_frames,
            RandomSource::from_values(vec![1]).unwrap(),
            false,
        );
        Simulation::new(num_frames, vec![process], pager, TraceOptions::parse("")).unwrap()
    }

    fn step(sim: &mut Simulation, op: Opcode, value: i64) {
        sim.step(&Instruction { op, value }, &mut std::io::sink())
            .unwrap();
    }

    #[test]
    fn test_frame_count_bounds() {
        let pager = Pager::new(
            Algorithm::Fifo,
            1,
            RandomSource::from_values(vec![1]).unwrap(),
            false,
        );
        assert!(matches!(
            Simulation::new(0, Vec::new(), pager, TraceOptions::default()),
            Err(PaginarError::InvalidFrameCount(0))
        ));

        let pager = Pager::new(
            Algorithm::Fifo,
            MAX_FRAMES + 1,
            RandomSource::from_values(vec![1]).unwrap(),
            false,
        );
        assert!(Simulation::new(MAX_FRAMES + 1, Vec::new(), pager, TraceOptions::default()).is_err());
    }

    #[test]
    fn test_context_switch_charges_only_on_change() {
        let mut sim = simulation(4);
        step(&mut sim, Opcode::ContextSwitch, 0);
        assert_eq!(sim.totals().ctx_switches, 1);
        assert_eq!(sim.totals().total_cost, COST_CTX_SWITCH);

        // Switching to the process already running is free.
        step(&mut sim, Opcode::ContextSwitch, 0);
        assert_eq!(sim.totals().ctx_switches, 1);
        assert_eq!(sim.totals().total_cost, COST_CTX_SWITCH);
    }

    #[test]
    fn test_access_without_process_is_an_error() {
        let mut sim = simulation(2);
        let result = sim.step(
            &Instruction {
                op: Opcode::Read,
                value: 0,
            },
            &mut std::io::sink(),
        );
        assert!(matches!(result, Err(PaginarError::NoCurrentProcess)));
    }

    #[test]
    fn test_unknown_process_is_an_error() {
        let mut sim = simulation(2);
        let result = sim.step(
            &Instruction {
                op: Opcode::ContextSwitch,
                value: 3,
            },
            &mut std::io::sink(),
        );
        assert!(matches!(result, Err(PaginarError::NoSuchProcess(3))));
    }

    #[test]
    fn test_free_frames_are_taken_in_index_order() {
        let mut sim = simulation(3);
        step(&mut sim, Opcode::ContextSwitch, 0);
        step(&mut sim, Opcode::Read, 5);
        step(&mut sim, Opcode::Read, 9);

        assert_eq!(sim.processes()[0].page_table[5].frame(), 0);
        assert_eq!(sim.processes()[0].page_table[9].frame(), 1);
        assert_eq!(sim.free_frames().len(), 1);
    }

    #[test]
    fn test_eviction_does_not_refill_free_pool() {
        let mut sim = simulation(1);
        step(&mut sim, Opcode::ContextSwitch, 0);
        step(&mut sim, Opcode::Read, 0);
        step(&mut sim, Opcode::Read, 1);

        assert!(sim.free_frames().is_empty());
        assert!(sim.frames()[0].is_occupied());
        assert!(!sim.processes()[0].page_table[0].present());
        assert!(sim.processes()[0].page_table[1].present());
    }

    #[test]
    fn test_exit_returns_frames_and_clears_ptes() {
        let mut sim = simulation(2);
        step(&mut sim, Opcode::ContextSwitch, 0);
        step(&mut sim, Opcode::Write, 0);
        step(&mut sim, Opcode::Read, 1);
        step(&mut sim, Opcode::Read, 2); // evicts dirty page 0 -> paged out
        step(&mut sim, Opcode::Exit, 0);

        assert_eq!(sim.free_frames().len(), 2);
        assert!(sim.frames().iter().all(|frame| !frame.is_occupied()));
        for pte in &sim.processes()[0].page_table {
            assert!(!pte.present());
            assert!(!pte.paged_out());
            assert!(!pte.referenced());
            assert!(!pte.modified());
        }
        assert_eq!(sim.totals().process_exits, 1);
        // The exited process stays current until the next context switch.
        assert_eq!(sim.current_process(), Some(0));
    }

    #[test]
    fn test_out_of_range_page_is_segv_without_allocation() {
        let mut sim = simulation(2);
        step(&mut sim, Opcode::ContextSwitch, 0);
        step(&mut sim, Opcode::Read, 64);
        step(&mut sim, Opcode::Read, -1);

        assert_eq!(sim.processes()[0].stats.segv, 2);
        assert_eq!(sim.free_frames().len(), 2);
        assert_eq!(
            sim.totals().total_cost,
            COST_CTX_SWITCH + 2 * (COST_READ_WRITE + COST_SEGV)
        );
    }
}
