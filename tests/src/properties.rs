use std::collections::BTreeSet;

use quickcheck::{quickcheck, Arbitrary, Gen};
use tiny_regex_compiler::ast::{Ast, RepeatKind};
use tiny_regex_compiler::{compile, parse, to_binary};
use tiny_regex_runtime::*;

const ALPHABET: &[char] = &['a', 'b', 'c'];

/// A well formed pattern over a small alphabet, nested at most a few groups
/// deep.
#[derive(Debug, Clone)]
struct Pattern(String);

/// A short input drawn from the same alphabet as [Pattern].
#[derive(Debug, Clone)]
struct Input(String);

fn arbitrary_char(g: &mut Gen) -> char {
    g.choose(ALPHABET).copied().unwrap_or('a')
}

fn arbitrary_expression(g: &mut Gen, depth: usize) -> String {
    let len = usize::arbitrary(g) % 4 + 1;
    (0..len).map(|_| arbitrary_item(g, depth)).collect()
}

fn arbitrary_item(g: &mut Gen, depth: usize) -> String {
    let atom = match u8::arbitrary(g) % 5 {
        0 if depth > 0 => format!("({})", arbitrary_expression(g, depth - 1)),
        1 if depth > 0 => format!(
            "({}|{})",
            arbitrary_expression(g, depth - 1),
            arbitrary_expression(g, depth - 1)
        ),
        _ => arbitrary_char(g).to_string(),
    };
    let quantifier = g.choose(&["", "", "*", "+", "?"]).copied().unwrap_or("");

    format!("{}{}", atom, quantifier)
}

impl Arbitrary for Pattern {
    fn arbitrary(g: &mut Gen) -> Self {
        let expr = arbitrary_expression(g, 2);

        if bool::arbitrary(g) {
            Pattern(format!("{}|{}", expr, arbitrary_expression(g, 2)))
        } else {
            Pattern(expr)
        }
    }
}

impl Arbitrary for Input {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 9;
        Input((0..len).map(|_| arbitrary_char(g)).collect())
    }
}

/// Returns every position a node can finish matching at when started at
/// `pos`, computed without the virtual machine.
fn reference_ends(node: &Ast, input: &[char], pos: usize) -> BTreeSet<usize> {
    match node {
        Ast::Literal(c) if input.get(pos) == Some(c) => BTreeSet::from([pos + 1]),
        Ast::Literal(_) => BTreeSet::new(),
        Ast::EndMarker => BTreeSet::from([pos]),
        Ast::Concat(children) => children.iter().fold(BTreeSet::from([pos]), |ends, child| {
            ends.into_iter()
                .flat_map(|end| reference_ends(child, input, end))
                .collect()
        }),
        Ast::Alternation(left, right) => {
            let mut ends = reference_ends(left, input, pos);
            ends.extend(reference_ends(right, input, pos));
            ends
        }
        Ast::Repeat { kind, inner } => {
            let start = match kind {
                RepeatKind::Plus => reference_ends(inner, input, pos),
                RepeatKind::Star | RepeatKind::Optional => BTreeSet::from([pos]),
            };

            match kind {
                RepeatKind::Optional => {
                    let mut ends = start;
                    ends.extend(reference_ends(inner, input, pos));
                    ends
                }
                RepeatKind::Star | RepeatKind::Plus => closure(inner, input, start),
            }
        }
    }
}

/// Repeatedly applies `inner` until no new end positions are found.
fn closure(inner: &Ast, input: &[char], start: BTreeSet<usize>) -> BTreeSet<usize> {
    let mut reached = start.clone();
    let mut frontier = start.into_iter().collect::<Vec<_>>();

    while let Some(pos) = frontier.pop() {
        for end in reference_ends(inner, input, pos) {
            if reached.insert(end) {
                frontier.push(end);
            }
        }
    }

    reached
}

fn compile_generated(pattern: &Pattern) -> (Ast, Instructions) {
    let ast = parse(&pattern.0).expect("generated pattern should parse");
    let program = compile(&ast).expect("generated pattern should compile");

    (ast, program)
}

fn targets_in_range(program: &Instructions) -> bool {
    let len = program.len();

    program.opcodes().all(|opcode| match opcode {
        Opcode::Jmp(jmp) => jmp.next().as_usize() < len,
        Opcode::Split(split) => split.x_branch().as_usize() < len && split.y_branch().as_usize() < len,
        Opcode::Char(_) | Opcode::Match => true,
    })
}

quickcheck! {
    fn compiled_programs_are_well_formed(pattern: Pattern) -> bool {
        let (_, program) = compile_generated(&pattern);

        matches!(program.opcodes().last(), Some(Opcode::Match)) && targets_in_range(&program)
    }

    fn run_agrees_with_reference_matcher(pattern: Pattern, input: Input) -> bool {
        let (ast, program) = compile_generated(&pattern);
        let chars = input.0.chars().collect::<Vec<_>>();

        // the alphabet is ascii so character and byte offsets coincide.
        (0..=chars.len()).all(|start| {
            let ends = reference_ends(&ast, &chars, start);

            match find_at(&program, &input.0, start) {
                Some(end) => ends.contains(&end),
                None => ends.is_empty(),
            }
        })
    }

    fn search_reports_first_matching_offset(pattern: Pattern, input: Input) -> bool {
        let (_, program) = compile_generated(&pattern);
        let expected = (0..=input.0.len()).find(|&start| run(&program, &input.0, start));

        search(&program, &input.0) == expected
            && find(&program, &input.0).map(|m| m.start()) == expected
    }

    fn binary_image_preserves_program(pattern: Pattern) -> bool {
        let (_, program) = compile_generated(&pattern);

        to_binary(&program)
            .ok()
            .and_then(|bin| bytecode::from_binary(bin).ok())
            .map_or(false, |decoded| decoded == program)
    }
}
