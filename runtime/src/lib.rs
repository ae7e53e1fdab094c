//! Provides the bytecode program representation and the virtual machine that
//! evaluates it against an input.
//!
//! # Example
//!
//! ```
//! use tiny_regex_runtime::*;
//!
//! // approximate to `ab?`
//! let program = Instructions::default().with_opcodes(vec![
//!     Opcode::Char(InstChar::new('a')),
//!     Opcode::Split(InstSplit::new(InstIndex::from(2), InstIndex::from(3))),
//!     Opcode::Char(InstChar::new('b')),
//!     Opcode::Match,
//! ]);
//!
//! assert!(run(&program, "ab", 0));
//! assert!(!run(&program, "ba", 0));
//! assert_eq!(Some(1), search(&program, "bab"));
//! assert_eq!(Some(Match::new(1, 3)), find(&program, "bab"));
//! ```

use std::fmt::Display;

pub mod bytecode;
mod sparse_set;

use sparse_set::SparseSet;

/// Represents the span of a successful match as a non-inclusive range of
/// byte offsets into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    /// Returns a match from its constituent parts.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns `true` if the match consumed no input.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// A hint for skipping start offsets that can never begin a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FastForward {
    #[default]
    None,
    /// Every match begins with the enclosed character.
    Char(char),
}

#[derive(Debug)]
struct Threads {
    gen: SparseSet,
    threads: Vec<InstIndex>,
}

impl Threads {
    fn with_set_size(set_capacity: usize) -> Self {
        Self {
            gen: SparseSet::new(set_capacity),
            threads: Vec::with_capacity(set_capacity),
        }
    }

    fn clear(&mut self) {
        self.gen.clear();
        self.threads.clear();
    }

    fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

/// A resolved program. Every jump and split target is an absolute index into
/// the program.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Instructions {
    fast_forward: FastForward,
    program: Vec<Instruction>,
}

impl Instructions {
    #[must_use]
    pub fn new(program: Vec<Opcode>) -> Self {
        Self::default().with_opcodes(program)
    }

    pub fn with_opcodes(self, program: Vec<Opcode>) -> Self {
        Self {
            fast_forward: self.fast_forward,
            program: program
                .into_iter()
                .enumerate()
                .map(|(id, opcode)| Instruction::new(id, opcode))
                .collect(),
        }
    }

    pub fn with_fast_forward(self, fast_forward: FastForward) -> Self {
        Self {
            fast_forward,
            program: self.program,
        }
    }

    pub fn fast_forward(&self) -> FastForward {
        self.fast_forward
    }

    /// Returns an iterator over the opcodes of the program in address order.
    pub fn opcodes(&self) -> impl Iterator<Item = &Opcode> {
        self.program.iter().map(|inst| &inst.opcode)
    }

    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for Instructions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for inst in self.program.iter() {
            writeln!(f, "{}", inst)?
        }

        Ok(())
    }
}

impl std::ops::Index<InstIndex> for Instructions {
    type Output = Opcode;

    fn index(&self, index: InstIndex) -> &Self::Output {
        let idx = index.as_usize();
        &self.program[idx].opcode
    }
}

impl AsRef<[Instruction]> for Instructions {
    fn as_ref(&self) -> &[Instruction] {
        &self.program
    }
}

/// An absolute address into a program.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstIndex(u32);

impl InstIndex {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for InstIndex {
    fn from(ptr: u32) -> Self {
        Self(ptr)
    }
}

impl std::ops::Add<u32> for InstIndex {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        InstIndex::from(self.0 + rhs)
    }
}

impl Display for InstIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    id: usize,
    opcode: Opcode,
}

impl Instruction {
    #[must_use]
    pub fn new(id: usize, opcode: Opcode) -> Self {
        Self { id, opcode }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn opcode(&self) -> &Opcode {
        &self.opcode
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>4}  {}", self.id, self.opcode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Char(InstChar),
    Jmp(InstJmp),
    Split(InstSplit),
    Match,
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::Char(i) => Display::fmt(&i, f),
            Opcode::Jmp(i) => Display::fmt(&i, f),
            Opcode::Split(i) => Display::fmt(&i, f),
            Opcode::Match => Display::fmt(&InstMatch, f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstMatch;

impl InstMatch {
    pub const OPCODE_BINARY_REPR: u32 = 0b11;
}

impl Display for InstMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "match")
    }
}

/// Consumes exactly one character of input, failing the thread on mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstChar {
    value: char,
}

impl InstChar {
    pub const OPCODE_BINARY_REPR: u32 = 0b00;

    #[must_use]
    pub fn new(value: char) -> Self {
        Self { value }
    }

    pub fn value(&self) -> char {
        self.value
    }
}

impl Display for InstChar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "char {}", self.value)
    }
}

/// Forks execution. The `x` branch has priority over the `y` branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstSplit {
    x_branch: InstIndex,
    y_branch: InstIndex,
}

impl InstSplit {
    pub const OPCODE_BINARY_REPR: u32 = 0b10;

    #[must_use]
    pub fn new(x: InstIndex, y: InstIndex) -> Self {
        Self {
            x_branch: x,
            y_branch: y,
        }
    }

    pub fn x_branch(&self) -> InstIndex {
        self.x_branch
    }

    pub fn y_branch(&self) -> InstIndex {
        self.y_branch
    }
}

impl Display for InstSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "split {}, {}", self.x_branch, self.y_branch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstJmp {
    next: InstIndex,
}

impl InstJmp {
    pub const OPCODE_BINARY_REPR: u32 = 0b01;

    #[must_use]
    pub fn new(next: InstIndex) -> Self {
        Self { next }
    }

    pub fn next(&self) -> InstIndex {
        self.next
    }
}

impl Display for InstJmp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "jmp {}", self.next)
    }
}

/// Follows every `Jmp` and `Split` reachable from `start` without consuming
/// input, appending the `Char` and `Match` instructions it lands on to the
/// thread list in priority order.
fn add_thread(
    program: &[Instruction],
    thread_list: &mut Threads,
    stack: &mut Vec<InstIndex>,
    start: InstIndex,
) {
    stack.push(start);

    while let Some(inst_idx) = stack.pop() {
        let idx = inst_idx.as_usize();

        // Don't visit states we've already added.
        if thread_list.gen.contains(idx) {
            continue;
        }

        let opcode = match program.get(idx) {
            Some(inst) => &inst.opcode,
            // falling off the end of the program kills the thread.
            None => continue,
        };
        thread_list.gen.insert(idx);

        match opcode {
            Opcode::Jmp(InstJmp { next }) => stack.push(*next),
            // y is pushed first so that x, and everything reachable from
            // it, is visited first.
            Opcode::Split(InstSplit { x_branch, y_branch }) => {
                stack.push(*y_branch);
                stack.push(*x_branch);
            }
            Opcode::Char(_) | Opcode::Match => thread_list.threads.push(inst_idx),
        }
    }
}

/// Evaluates an anchored match at `start`, returning the end offset of the
/// highest priority match. When `earliest` is set, the first match
/// encountered is returned regardless of priority.
fn exec(program: &Instructions, input: &str, start: usize, earliest: bool) -> Option<usize> {
    use core::mem::swap;

    // out of bounds or not on a character boundary.
    let remaining_input = input.get(start..)?;
    let instructions = program.as_ref();
    let program_len = instructions.len();

    let mut current_thread_list = Threads::with_set_size(program_len);
    let mut next_thread_list = Threads::with_set_size(program_len);
    let mut stack = Vec::new();

    add_thread(
        instructions,
        &mut current_thread_list,
        &mut stack,
        InstIndex::from(0),
    );

    let mut chars = remaining_input.chars();
    let mut input_idx = start;
    let mut matched = None;

    loop {
        let next_char = chars.next();

        for &inst_idx in current_thread_list.threads.iter() {
            let opcode = instructions.get(inst_idx.as_usize()).map(|i| &i.opcode);

            match opcode {
                Some(Opcode::Match) => {
                    matched = Some(input_idx);
                    if earliest {
                        return matched;
                    }

                    // lower priority threads are cut.
                    break;
                }
                Some(Opcode::Char(InstChar { value })) if Some(*value) == next_char => {
                    add_thread(
                        instructions,
                        &mut next_thread_list,
                        &mut stack,
                        inst_idx + 1,
                    );
                }
                _ => continue,
            }
        }

        match next_char {
            Some(c) if !next_thread_list.is_empty() => {
                input_idx += c.len_utf8();
                swap(&mut current_thread_list, &mut next_thread_list);
                next_thread_list.clear();
            }
            _ => break,
        }
    }

    matched
}

/// Attempts an anchored match of `program` beginning at byte offset `start`
/// of `input`. The pattern only needs to match a prefix of the remaining
/// input.
///
/// A `start` past the end of `input` or not on a character boundary never
/// matches.
pub fn run(program: &Instructions, input: &str, start: usize) -> bool {
    exec(program, input, start, true).is_some()
}

/// Attempts an anchored match at `start`, returning the end offset of the
/// match preferred by the program's split priorities.
pub fn find_at(program: &Instructions, input: &str, start: usize) -> Option<usize> {
    exec(program, input, start, false)
}

/// Returns every offset a match could begin at, in ascending order. This
/// includes the end of the input unless a fast-forward hint rules it out.
fn candidate_starts<'a>(
    program: &Instructions,
    input: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    let fast_forward = program.fast_forward();

    input
        .char_indices()
        .filter(move |(_, c)| match fast_forward {
            FastForward::Char(required) => *c == required,
            FastForward::None => true,
        })
        .map(|(idx, _)| idx)
        .chain((fast_forward == FastForward::None).then_some(input.len()))
}

/// Tries an anchored match at each offset of `input` in turn, returning the
/// first offset that matches.
pub fn search(program: &Instructions, input: &str) -> Option<usize> {
    candidate_starts(program, input).find(|&start| {
        log::trace!("attempting anchored match at offset {}", start);
        run(program, input, start)
    })
}

/// Returns the span of the first match found by [search].
pub fn find(program: &Instructions, input: &str) -> Option<Match> {
    candidate_starts(program, input)
        .find_map(|start| find_at(program, input, start).map(|end| Match::new(start, end)))
}
