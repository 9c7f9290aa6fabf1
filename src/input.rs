//! Input-file parser.
//!
//! Grammar: an integer process count; for each process an integer VMA count
//! followed by that many `start end write_protect file_mapped` lines; then
//! any number of `OP VALUE` instruction lines with OP one of `c`, `r`, `w`,
//! `e`. Lines that are blank or start with `#` are comments and are skipped
//! everywhere. Errors carry the 1-based line number of the offending line.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PaginarError, Result};
use crate::process::{Process, Vma};

/// One trace operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// `c`: switch to process VALUE
    ContextSwitch,
    /// `r`: read virtual page VALUE
    Read,
    /// `w`: write virtual page VALUE
    Write,
    /// `e`: exit process VALUE
    Exit,
}

impl Opcode {
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::ContextSwitch => 'c',
            Self::Read => 'r',
            Self::Write => 'w',
            Self::Exit => 'e',
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "c" => Ok(Self::ContextSwitch),
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "e" => Ok(Self::Exit),
            _ => Err(()),
        }
    }
}

/// A parsed instruction. The value is kept signed so that out-of-range
/// page numbers (including negative ones) reach the simulator and take the
/// SEGV path instead of failing at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Opcode,
    pub value: i64,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.letter(), self.value)
    }
}

/// A fully parsed input file: the process set and the instruction stream.
#[derive(Debug, Clone)]
pub struct Workload {
    pub processes: Vec<Process>,
    pub instructions: Vec<Instruction>,
}

impl Workload {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = ContentLines::new(text);

        let (line, count) = lines.expect_line("process count")?;
        let num_processes: usize = parse_field(count.split_whitespace().next().unwrap_or(""), line, "process count")?;

        let mut processes = Vec::with_capacity(num_processes);
        for pid in 0..num_processes {
            let (line, count) = lines.expect_line("vma count")?;
            let num_vmas: usize = parse_field(count.split_whitespace().next().unwrap_or(""), line, "vma count")?;

            let mut process = Process::new(pid);
            for _ in 0..num_vmas {
                let (line, entry) = lines.expect_line("vma entry")?;
                let vma = parse_vma(entry, line)?;
                process.add_vma(vma).map_err(|err| PaginarError::Parse {
                    line,
                    message: err.to_string(),
                })?;
            }
            processes.push(process);
        }

        let mut instructions = Vec::new();
        while let Some((line, text)) = lines.next_content() {
            instructions.push(parse_instruction(text, line)?);
        }

        Ok(Self {
            processes,
            instructions,
        })
    }
}

/// Line iterator that skips comments and blanks, tracking 1-based numbers.
struct ContentLines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> ContentLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            last_line: 0,
        }
    }

    fn next_content(&mut self) -> Option<(usize, &'a str)> {
        for (index, line) in self.inner.by_ref() {
            self.last_line = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some((index + 1, trimmed));
        }
        None
    }

    fn expect_line(&mut self, what: &str) -> Result<(usize, &'a str)> {
        self.next_content().ok_or_else(|| PaginarError::Parse {
            line: self.last_line,
            message: format!("unexpected end of file, expected {what}"),
        })
    }
}

fn parse_field<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token.parse::<T>().map_err(|_| PaginarError::Parse {
        line,
        message: format!("invalid {what} '{token}'"),
    })
}

fn parse_vma(text: &str, line: usize) -> Result<Vma> {
    let mut tokens = text.split_whitespace();

    let start_vpage = parse_field(next_token(&mut tokens, line, "start vpage")?, line, "start vpage")?;
    let end_vpage = parse_field(next_token(&mut tokens, line, "end vpage")?, line, "end vpage")?;
    let write_protect = parse_flag(
        next_token(&mut tokens, line, "write protect flag")?,
        line,
        "write protect flag",
    )?;
    let file_mapped = parse_flag(
        next_token(&mut tokens, line, "file mapped flag")?,
        line,
        "file mapped flag",
    )?;

    Ok(Vma {
        start_vpage,
        end_vpage,
        write_protect,
        file_mapped,
    })
}

fn next_token<'a>(
    tokens: &mut std::str::SplitWhitespace<'a>,
    line: usize,
    what: &str,
) -> Result<&'a str> {
    tokens.next().ok_or_else(|| PaginarError::Parse {
        line,
        message: format!("missing {what} in vma entry"),
    })
}

fn parse_flag(token: &str, line: usize, what: &str) -> Result<bool> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(PaginarError::Parse {
            line,
            message: format!("invalid {what} '{token}', expected 0 or 1"),
        }),
    }
}

fn parse_instruction(text: &str, line: usize) -> Result<Instruction> {
    let mut tokens = text.split_whitespace();
    let op_token = tokens.next().unwrap_or("");
    let op = op_token
        .parse::<Opcode>()
        .map_err(|()| PaginarError::Parse {
            line,
            message: format!("unknown operation '{op_token}'"),
        })?;
    let value_token = tokens.next().ok_or_else(|| PaginarError::Parse {
        line,
        message: "missing instruction value".to_string(),
    })?;
    let value = parse_field(value_token, line, "instruction value")?;
    Ok(Instruction { op, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "\
# two processes
2
# process 0
1
0 16 0 0
# process 1
2
0 7 0 1
8 15 1 0
c 0
r 3
w 4
e 0
";

    #[test]
    fn test_parse_processes_and_instructions() {
        let workload = Workload::parse(BASIC).unwrap();
        assert_eq!(workload.processes.len(), 2);
        assert_eq!(workload.processes[0].vmas().len(), 1);
        assert_eq!(workload.processes[1].vmas().len(), 2);
        assert!(workload.processes[1].page_info(10).write_protect);
        assert!(workload.processes[1].page_info(3).file_mapped);

        assert_eq!(
            workload.instructions,
            vec![
                Instruction {
                    op: Opcode::ContextSwitch,
                    value: 0
                },
                Instruction {
                    op: Opcode::Read,
                    value: 3
                },
                Instruction {
                    op: Opcode::Write,
                    value: 4
                },
                Instruction {
                    op: Opcode::Exit,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn test_comments_and_blanks_skipped_between_sections() {
        let input = "\n# header\n\n1\n\n# vmas\n1\n# range\n0 0 0 0\n\n# trace\nc 0\n\n";
        let workload = Workload::parse(input).unwrap();
        assert_eq!(workload.processes.len(), 1);
        assert_eq!(workload.instructions.len(), 1);
    }

    #[test]
    fn test_negative_page_values_survive_parsing() {
        let workload = Workload::parse("1\n1\n0 0 0 0\nr -1\n").unwrap();
        assert_eq!(workload.instructions[0].value, -1);
    }

    #[test]
    fn test_unknown_operation_is_fatal_with_line() {
        let err = Workload::parse("1\n1\n0 0 0 0\nq 5\n").unwrap_err();
        match err {
            PaginarError::Parse { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("unknown operation 'q'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_counts_are_fatal() {
        assert!(Workload::parse("abc\n").is_err());
        assert!(Workload::parse("1\nxyz\n").is_err());
    }

    #[test]
    fn test_truncated_vma_block() {
        let err = Workload::parse("1\n2\n0 0 0 0\n").unwrap_err();
        assert!(err.to_string().contains("unexpected end of file"));
    }

    #[test]
    fn test_vma_outside_page_range() {
        let err = Workload::parse("1\n1\n0 64 0 0\n").unwrap_err();
        match err {
            PaginarError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_flag_value() {
        let err = Workload::parse("1\n1\n0 5 2 0\n").unwrap_err();
        assert!(err.to_string().contains("expected 0 or 1"));
    }

    #[test]
    fn test_instruction_display() {
        let instr = Instruction {
            op: Opcode::Read,
            value: 12,
        };
        assert_eq!(instr.to_string(), "r 12");
    }
}
