use std::fmt;

/// The number of spaces each nesting level is indented by when displayed.
const INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// Matches exactly one character.
    Literal(char),
    /// Matches each child in sequence.
    Concat(Vec<Ast>),
    Alternation(Box<Ast>, Box<Ast>),
    Repeat {
        kind: RepeatKind,
        inner: Box<Ast>,
    },
    /// Terminates the outermost expression, signifying a successful match.
    EndMarker,
}

impl Ast {
    pub fn alternation(left: Ast, right: Ast) -> Self {
        Self::Alternation(Box::new(left), Box::new(right))
    }

    pub fn repeat(kind: RepeatKind, inner: Ast) -> Self {
        Self::Repeat {
            kind,
            inner: Box::new(inner),
        }
    }
}

/// A pending line of the tree printer.
enum Line<'a> {
    Node(&'a Ast, usize),
    Header(&'static str, usize),
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // walked with an explicit stack, alternation chains can be
        // arbitrarily long.
        let mut lines = vec![Line::Node(self, 0)];

        while let Some(line) = lines.pop() {
            let (node, indent) = match line {
                Line::Header(text, indent) => {
                    writeln!(f, "{:indent$}{}", "", text, indent = indent)?;
                    continue;
                }
                Line::Node(node, indent) => (node, indent),
            };
            let nested = indent + INDENT_WIDTH;

            match node {
                Ast::Literal(c) => writeln!(f, "{:indent$}char {}", "", c, indent = indent)?,
                // a concatenation is transparent, its children share its level.
                Ast::Concat(children) => lines.extend(
                    children
                        .iter()
                        .rev()
                        .map(|child| Line::Node(child, indent)),
                ),
                Ast::Alternation(left, right) => {
                    writeln!(f, "{:indent$}|", "", indent = indent)?;
                    writeln!(f, "{:indent$}left:", "", indent = indent)?;
                    lines.push(Line::Node(right, nested));
                    lines.push(Line::Header("right:", indent));
                    lines.push(Line::Node(left, nested));
                }
                Ast::Repeat { kind, inner } => {
                    writeln!(f, "{:indent$}{}", "", kind, indent = indent)?;
                    lines.push(Line::Node(inner, nested));
                }
                Ast::EndMarker => writeln!(f, "{:indent$}match", "", indent = indent)?,
            }
        }

        Ok(())
    }
}

impl Drop for Ast {
    fn drop(&mut self) {
        // children are moved onto a heap allocated stack before being
        // dropped, so freeing a long chain doesn't recurse once per node.
        let mut detached = vec![];
        detach_children(self, &mut detached);

        while let Some(mut node) = detached.pop() {
            detach_children(&mut node, &mut detached);
        }
    }
}

/// Moves every child of `node` onto `detached`, leaving leaves behind.
fn detach_children(node: &mut Ast, detached: &mut Vec<Ast>) {
    match node {
        Ast::Concat(children) => detached.append(children),
        Ast::Alternation(left, right) => {
            detached.push(std::mem::replace(left.as_mut(), Ast::EndMarker));
            detached.push(std::mem::replace(right.as_mut(), Ast::EndMarker));
        }
        Ast::Repeat { inner, .. } => {
            detached.push(std::mem::replace(inner.as_mut(), Ast::EndMarker))
        }
        Ast::Literal(_) | Ast::EndMarker => (),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    /// `+`, one or more.
    Plus,
    /// `*`, zero or more.
    Star,
    /// `?`, zero or one.
    Optional,
}

impl RepeatKind {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Plus),
            '*' => Some(Self::Star),
            '?' => Some(Self::Optional),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Plus => '+',
            Self::Star => '*',
            Self::Optional => '?',
        }
    }
}

impl fmt::Display for RepeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
