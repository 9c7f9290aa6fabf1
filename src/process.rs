//! Process descriptor: virtual memory areas, page table, statistics.

use crate::error::{PaginarError, Result};
use crate::mem::{Pte, MAX_VPAGES};

/// Contiguous range of virtual pages with uniform protection and backing.
/// Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vma {
    pub start_vpage: usize,
    pub end_vpage: usize,
    pub write_protect: bool,
    pub file_mapped: bool,
}

/// Per-virtual-page cache of the covering VMA's attributes, precomputed at
/// insertion time so page faults never rescan the VMA list.
#[derive(Debug, Clone, Copy, Default)]
pub struct VPageInfo {
    pub valid: bool,
    pub write_protect: bool,
    pub file_mapped: bool,
}

/// Per-process event counters, reported in the summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStats {
    pub unmaps: u64,
    pub maps: u64,
    pub ins: u64,
    pub outs: u64,
    pub fins: u64,
    pub fouts: u64,
    pub zeros: u64,
    pub segv: u64,
    pub segprot: u64,
}

/// A simulated process: its VMAs, page table, and counters.
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: usize,
    vmas: Vec<Vma>,
    pub page_table: [Pte; MAX_VPAGES],
    vpage_info: [VPageInfo; MAX_VPAGES],
    pub stats: ProcStats,
}

impl Process {
    #[must_use]
    pub fn new(pid: usize) -> Self {
        Self {
            pid,
            vmas: Vec::new(),
            page_table: [Pte::new(); MAX_VPAGES],
            vpage_info: [VPageInfo::default(); MAX_VPAGES],
            stats: ProcStats::default(),
        }
    }

    /// Register a VMA and fill the per-page cache for every page it covers.
    ///
    /// VMAs are trusted to be disjoint; the range must lie inside
    /// `0..MAX_VPAGES` with `start <= end`.
    pub fn add_vma(&mut self, vma: Vma) -> Result<()> {
        if vma.start_vpage > vma.end_vpage || vma.end_vpage >= MAX_VPAGES {
            return Err(PaginarError::InvalidVma {
                start: vma.start_vpage,
                end: vma.end_vpage,
            });
        }
        for info in &mut self.vpage_info[vma.start_vpage..=vma.end_vpage] {
            info.valid = true;
            info.write_protect = vma.write_protect;
            info.file_mapped = vma.file_mapped;
        }
        self.vmas.push(vma);
        Ok(())
    }

    /// O(1) lookup of the cached VMA attributes for a page.
    #[must_use]
    pub fn page_info(&self, vpage: usize) -> VPageInfo {
        self.vpage_info[vpage]
    }

    #[must_use]
    pub fn vmas(&self) -> &[Vma] {
        &self.vmas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vma_cache_covers_inclusive_range() {
        let mut proc = Process::new(0);
        proc.add_vma(Vma {
            start_vpage: 2,
            end_vpage: 4,
            write_protect: true,
            file_mapped: false,
        })
        .unwrap();

        assert!(!proc.page_info(1).valid);
        for vpage in 2..=4 {
            let info = proc.page_info(vpage);
            assert!(info.valid);
            assert!(info.write_protect);
            assert!(!info.file_mapped);
        }
        assert!(!proc.page_info(5).valid);
    }

    #[test]
    fn test_multiple_vmas_keep_their_attributes() {
        let mut proc = Process::new(0);
        proc.add_vma(Vma {
            start_vpage: 0,
            end_vpage: 0,
            write_protect: false,
            file_mapped: true,
        })
        .unwrap();
        proc.add_vma(Vma {
            start_vpage: 10,
            end_vpage: 12,
            write_protect: true,
            file_mapped: false,
        })
        .unwrap();

        assert!(proc.page_info(0).file_mapped);
        assert!(!proc.page_info(0).write_protect);
        assert!(proc.page_info(11).write_protect);
        assert!(!proc.page_info(11).file_mapped);
        assert_eq!(proc.vmas().len(), 2);
    }

    #[test]
    fn test_vma_range_validation() {
        let mut proc = Process::new(0);
        assert!(matches!(
            proc.add_vma(Vma {
                start_vpage: 0,
                end_vpage: MAX_VPAGES,
                write_protect: false,
                file_mapped: false,
            }),
            Err(PaginarError::InvalidVma { .. })
        ));
        assert!(matches!(
            proc.add_vma(Vma {
                start_vpage: 5,
                end_vpage: 4,
                write_protect: false,
                file_mapped: false,
            }),
            Err(PaginarError::InvalidVma { .. })
        ));
    }

    #[test]
    fn test_fresh_process_has_empty_page_table() {
        let proc = Process::new(3);
        assert_eq!(proc.pid, 3);
        assert!(proc.page_table.iter().all(|pte| !pte.present()));
    }
}
