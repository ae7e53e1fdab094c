//! The labeled intermediate representation produced by lowering an AST.
//! Jump and split targets are symbolic labels that are only resolved to
//! absolute addresses once the whole program has been laid out.

use std::collections::BTreeSet;
use std::fmt;

/// A symbolic jump target, unique within a single compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(u32);

impl Label {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Label {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabeledOpcode {
    Char(char),
    Jmp(Label),
    Split(Label, Label),
    Match,
}

impl fmt::Display for LabeledOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "char {}", c),
            Self::Jmp(next) => write!(f, "jmp {}", next),
            Self::Split(x, y) => write!(f, "split {}, {}", x, y),
            Self::Match => write!(f, "match"),
        }
    }
}

/// An opcode along with every label that lands on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledInstruction {
    labels: BTreeSet<Label>,
    opcode: LabeledOpcode,
}

impl LabeledInstruction {
    #[must_use]
    pub fn new(opcode: LabeledOpcode) -> Self {
        Self {
            labels: BTreeSet::new(),
            opcode,
        }
    }

    pub fn with_labels<L: IntoIterator<Item = Label>>(mut self, labels: L) -> Self {
        self.attach(labels);
        self
    }

    /// Attaches additional labels to the instruction.
    pub fn attach<L: IntoIterator<Item = Label>>(&mut self, labels: L) {
        self.labels.extend(labels)
    }

    pub fn labels(&self) -> &BTreeSet<Label> {
        &self.labels
    }

    pub fn opcode(&self) -> LabeledOpcode {
        self.opcode
    }
}

impl From<LabeledOpcode> for LabeledInstruction {
    fn from(opcode: LabeledOpcode) -> Self {
        Self::new(opcode)
    }
}

impl fmt::Display for LabeledInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "    ")?;
        } else {
            let labels = self
                .labels
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "{}: ", labels)?;
        }

        write!(f, "{}", self.opcode)
    }
}

/// An ordered sequence of labeled instructions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabeledProgram(Vec<LabeledInstruction>);

impl LabeledProgram {
    #[must_use]
    pub fn new(instructions: Vec<LabeledInstruction>) -> Self {
        Self(instructions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledInstruction> {
        self.0.iter()
    }
}

impl IntoIterator for LabeledProgram {
    type Item = LabeledInstruction;
    type IntoIter = std::vec::IntoIter<LabeledInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl AsRef<[LabeledInstruction]> for LabeledProgram {
    fn as_ref(&self) -> &[LabeledInstruction] {
        &self.0
    }
}

impl fmt::Display for LabeledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in self.0.iter() {
            writeln!(f, "{}", inst)?
        }

        Ok(())
    }
}
