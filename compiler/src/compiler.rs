//! Lowers a parsed AST into a runnable program in two passes. The first pass
//! emits a labeled program where every jump target is symbolic, the second
//! resolves each label to the address of the instruction it is attached to.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tiny_regex_runtime::bytecode::MAX_PROGRAM_LEN;
use tiny_regex_runtime::*;

use crate::ast::{Ast, RepeatKind};
use crate::ir::{Label, LabeledInstruction, LabeledOpcode, LabeledProgram};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrKind {
    /// The program holds more instructions than a split operand can address.
    ProgramTooLarge { len: usize, max: usize },
    /// A jump or split references a label that no instruction carries.
    UnresolvedLabel(Label),
}

impl fmt::Display for CompileErrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramTooLarge { len, max } => write!(
                f,
                "program of {} instructions exceeds the maximum of {}",
                len, max
            ),
            Self::UnresolvedLabel(label) => {
                write!(f, "label {} is not attached to any instruction", label)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErr {
    kind: CompileErrKind,
}

impl CompileErr {
    #[must_use]
    pub fn new(kind: CompileErrKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &CompileErrKind {
        &self.kind
    }
}

impl fmt::Display for CompileErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compilation error: {}", self.kind)
    }
}

impl std::error::Error for CompileErr {}

/// A contiguous run of lowered code along with the labels that should be
/// attached to whichever instruction follows it.
#[derive(Debug, Default)]
struct Fragment {
    code: Vec<LabeledInstruction>,
    pending: BTreeSet<Label>,
}

impl Fragment {
    fn from_opcode(opcode: LabeledOpcode) -> Self {
        Self {
            code: vec![LabeledInstruction::new(opcode)],
            pending: BTreeSet::new(),
        }
    }

    /// Appends an instruction, handing it any pending labels.
    fn push(&mut self, opcode: LabeledOpcode) {
        let pending = std::mem::take(&mut self.pending);
        self.code
            .push(LabeledInstruction::new(opcode).with_labels(pending));
    }

    /// Attaches a label to the first instruction of the fragment. An empty
    /// fragment defers it to whatever follows.
    fn labeled(mut self, label: Label) -> Self {
        match self.code.first_mut() {
            Some(head) => head.attach([label]),
            None => {
                self.pending.insert(label);
            }
        }

        self
    }

    /// Appends another fragment, attaching this fragment's pending labels to
    /// the head of the next.
    fn append(&mut self, next: Fragment) {
        let Fragment { mut code, pending } = next;

        match code.first_mut() {
            Some(head) => {
                head.attach(std::mem::take(&mut self.pending));
                self.pending = pending;
            }
            None => self.pending.extend(pending),
        }

        self.code.append(&mut code);
    }
}

/// Per-compilation lowering state. Labels are numbered from zero on every
/// call so the same AST always yields the same program.
#[derive(Debug, Default)]
struct Lowering {
    next_label: u32,
}

impl Lowering {
    fn new_label(&mut self) -> Label {
        let label = Label::from(self.next_label);
        self.next_label += 1;
        label
    }

    fn lower(&mut self, node: &Ast) -> Fragment {
        match node {
            Ast::Literal(c) => Fragment::from_opcode(LabeledOpcode::Char(*c)),
            Ast::EndMarker => Fragment::from_opcode(LabeledOpcode::Match),
            Ast::Concat(children) => {
                children
                    .iter()
                    .fold(Fragment::default(), |mut frag, child| {
                        let next = self.lower(child);
                        frag.append(next);
                        frag
                    })
            }
            Ast::Alternation(left, right) => self.alternation(left, right),
            Ast::Repeat { kind, inner } => match kind {
                RepeatKind::Optional => self.optional(inner),
                RepeatKind::Star => self.star(inner),
                RepeatKind::Plus => self.plus(inner),
            },
        }
    }

    //     split L0, L1
    // L0: <inner>
    // L1: ...
    fn optional(&mut self, inner: &Ast) -> Fragment {
        let (body, exit) = (self.new_label(), self.new_label());

        let mut frag = Fragment::from_opcode(LabeledOpcode::Split(body, exit));
        let inner = self.lower(inner).labeled(body);
        frag.append(inner);
        frag.pending.insert(exit);
        frag
    }

    // L0: split L1, L2
    // L1: <inner>
    //     jmp L0
    // L2: ...
    fn star(&mut self, inner: &Ast) -> Fragment {
        let (entry, body, exit) = (self.new_label(), self.new_label(), self.new_label());

        let mut frag = Fragment::from_opcode(LabeledOpcode::Split(body, exit)).labeled(entry);
        let inner = self.lower(inner).labeled(body);
        frag.append(inner);
        frag.push(LabeledOpcode::Jmp(entry));
        frag.pending.insert(exit);
        frag
    }

    // L0: <inner>
    //     split L0, L1
    // L1: ...
    fn plus(&mut self, inner: &Ast) -> Fragment {
        let (body, exit) = (self.new_label(), self.new_label());

        let mut frag = self.lower(inner).labeled(body);
        frag.push(LabeledOpcode::Split(body, exit));
        frag.pending.insert(exit);
        frag
    }

    //     split L0, L1
    // L0: <left>
    //     jmp L2
    // L1: <right>
    // L2: ...
    //
    // A right-nested chain is lowered in a single pass, each link's split
    // taking the previous link's right label.
    fn alternation(&mut self, left: &Ast, right: &Ast) -> Fragment {
        let mut frag = Fragment::default();
        let mut exits = BTreeSet::new();
        let (mut left, mut right) = (left, right);

        loop {
            let (left_entry, right_entry, exit) =
                (self.new_label(), self.new_label(), self.new_label());
            exits.insert(exit);

            frag.push(LabeledOpcode::Split(left_entry, right_entry));
            let lowered_left = self.lower(left).labeled(left_entry);
            frag.append(lowered_left);
            frag.push(LabeledOpcode::Jmp(exit));
            frag.pending.insert(right_entry);

            match right {
                Ast::Alternation(next_left, next_right) => {
                    left = &**next_left;
                    right = &**next_right;
                }
                _ => break,
            }
        }

        let lowered_right = self.lower(right);
        frag.append(lowered_right);
        frag.pending.extend(exits);
        frag
    }
}

/// Lowers an AST into a labeled program.
///
/// The returned program always ends in a `match`. When labels are still
/// pending after the last node, as happens with the exit of a top-level
/// alternation, or when the final instruction is not a `match`, a terminal
/// `match` is appended to carry them.
pub fn lower(ast: &Ast) -> LabeledProgram {
    let mut frag = Lowering::default().lower(ast);

    let ends_in_match = matches!(
        frag.code.last().map(|inst| inst.opcode()),
        Some(LabeledOpcode::Match)
    );
    if !frag.pending.is_empty() || !ends_in_match {
        frag.push(LabeledOpcode::Match);
    }

    LabeledProgram::new(frag.code)
}

/// Resolves every label in a program to the absolute address of the
/// instruction carrying it.
pub fn resolve(program: LabeledProgram) -> Result<Instructions, CompileErr> {
    let len = program.len();
    if len > MAX_PROGRAM_LEN {
        return Err(CompileErr::new(CompileErrKind::ProgramTooLarge {
            len,
            max: MAX_PROGRAM_LEN,
        }));
    }

    let mut addresses = HashMap::new();
    for (idx, inst) in program.iter().enumerate() {
        // bounded by the length check above.
        let addr = InstIndex::from(idx as u32);
        for &label in inst.labels() {
            addresses.insert(label, addr);
        }
    }

    let address_of = |label: Label| {
        addresses
            .get(&label)
            .copied()
            .ok_or_else(|| CompileErr::new(CompileErrKind::UnresolvedLabel(label)))
    };

    let opcodes = program
        .into_iter()
        .map(|inst| match inst.opcode() {
            LabeledOpcode::Char(c) => Ok(Opcode::Char(InstChar::new(c))),
            LabeledOpcode::Jmp(next) => address_of(next).map(|next| Opcode::Jmp(InstJmp::new(next))),
            LabeledOpcode::Split(x, y) => Ok(Opcode::Split(InstSplit::new(
                address_of(x)?,
                address_of(y)?,
            ))),
            LabeledOpcode::Match => Ok(Opcode::Match),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instructions::new(opcodes))
}

/// Accepts a parsed AST and attempts to compile it into a runnable program
/// for use with the tiny-regex-runtime crate.
///
/// # Example
///
/// ```
/// use tiny_regex_compiler::{compile, parse};
/// use tiny_regex_runtime::*;
///
/// let ast = parse("ab").unwrap();
///
/// assert_eq!(
///     Ok(Instructions::default()
///         .with_opcodes(vec![
///             Opcode::Char(InstChar::new('a')),
///             Opcode::Char(InstChar::new('b')),
///             Opcode::Match,
///         ])
///         .with_fast_forward(FastForward::Char('a'))),
///     compile(&ast)
/// )
/// ```
pub fn compile(ast: &Ast) -> Result<Instructions, CompileErr> {
    let labeled = lower(ast);
    log::trace!("labeled program:\n{}", labeled);

    let program = resolve(labeled).map_err(|e| {
        log::debug!("{}", e);
        e
    })?;
    log::debug!("compiled program of {} instructions", program.len());
    log::trace!("program:\n{}", program);

    // every thread starts at the first instruction, so a leading char must
    // be present at any offset that can match.
    let fast_forward = match program.opcodes().next() {
        Some(Opcode::Char(ic)) => FastForward::Char(ic.value()),
        _ => FastForward::None,
    };

    Ok(program.with_fast_forward(fast_forward))
}
