use tiny_regex_compiler::{compile, parse, CompileErrKind, ParseErrKind, MAX_NESTING_DEPTH};
use tiny_regex_runtime::*;

use crate::compile_pattern;

#[test]
fn should_match_literals_anchored_at_offset() {
    let test_cases = vec![
        (1, "abc", "abc", 0, true),
        (2, "abc", "abd", 0, false),
        (3, "abc", "xabc", 1, true),
        (4, "abc", "xabc", 0, false),
        (5, "abc", "ab", 0, false),
        // a match may end before the input does.
        (6, "ab", "abc", 0, true),
        (7, "", "", 0, true),
        (8, "", "abc", 3, true),
    ];

    for (test_id, pattern, input, start, expected) in test_cases {
        let program = compile_pattern(pattern);
        assert_eq!((test_id, expected), (test_id, run(&program, input, start)));
    }
}

#[test]
fn should_match_quantified_items() {
    let test_cases = vec![
        (1, "a*", "", true),
        (2, "a*", "aaa", true),
        (3, "a*", "b", true),
        (4, "a+", "", false),
        (5, "a+", "aaa", true),
        (6, "a?b", "b", true),
        (7, "a?b", "ab", true),
        (8, "a?b", "aab", false),
        (9, "ab*c", "ac", true),
        (10, "ab*c", "abbbc", true),
        (11, "ab+c", "ac", false),
    ];

    for (test_id, pattern, input, expected) in test_cases {
        let program = compile_pattern(pattern);
        assert_eq!((test_id, expected), (test_id, run(&program, input, 0)));
    }
}

#[test]
fn should_match_quantified_groups() {
    let program = compile_pattern("(ab)+");

    assert_eq!(Some(6), find_at(&program, "ababab", 0));
    assert_eq!(Some(2), find_at(&program, "abx", 0));
    assert!(!run(&program, "ba", 0));
}

#[test]
fn should_search_for_alternation_anywhere_in_input() {
    let program = compile_pattern("cat|dog");

    assert_eq!(Some(9), search(&program, "I have a dog"));
    assert_eq!(Some(Match::new(9, 12)), find(&program, "I have a dog"));
    assert_eq!(None, search(&program, "I have a bird"));
}

#[test]
fn should_prefer_leftmost_alternative() {
    let test_cases = vec![
        (1, "a|ab", Some(Match::new(0, 1))),
        (2, "ab|a", Some(Match::new(0, 2))),
        (3, "(a|ab)c", Some(Match::new(0, 3))),
    ];

    for (test_id, pattern, expected) in test_cases {
        let program = compile_pattern(pattern);
        let input = if test_id == 3 { "abc" } else { "ab" };

        assert_eq!((test_id, expected), (test_id, find(&program, input)));
    }
}

#[test]
fn should_prefer_greedy_repetition() {
    let test_cases = vec![
        (1, "a*", "aaab", Some(3)),
        (2, "a+", "aaab", Some(3)),
        (3, "a?", "aaab", Some(1)),
        (4, "(a|b)*", "abbac", Some(4)),
    ];

    for (test_id, pattern, input, expected) in test_cases {
        let program = compile_pattern(pattern);
        assert_eq!((test_id, expected), (test_id, find_at(&program, input, 0)));
    }
}

#[test]
fn should_terminate_on_nested_nullable_repetition() {
    let test_cases = vec![
        (1, "(a*)*", "aaaa", Some(4)),
        (2, "(a?)*b", "aab", Some(3)),
        (3, "(a*)+", "", Some(0)),
        (4, "((a|b)*)*c", "ababx", None),
    ];

    for (test_id, pattern, input, expected) in test_cases {
        let program = compile_pattern(pattern);
        assert_eq!((test_id, expected), (test_id, find_at(&program, input, 0)));
    }
}

#[test]
fn should_report_match_at_end_of_input() {
    let program = compile_pattern("b?");

    assert!(run(&program, "abc", 3));
    assert_eq!(Some(Match::new(0, 0)), find(&program, "abc"));
}

#[test]
fn should_skip_to_leading_character_when_fast_forwarding() {
    let program = compile_pattern("ab+");

    assert_eq!(FastForward::Char('a'), program.fast_forward());
    assert_eq!(Some(Match::new(4, 7)), find(&program, "xxaxabbx"));
    assert_eq!(None, search(&program, "bbbb"));
}

#[test]
fn should_treat_offsets_as_byte_offsets() {
    let program = compile_pattern("b");

    // `é` occupies two bytes.
    assert!(run(&program, "éb", 2));
    assert!(!run(&program, "éb", 1));
    assert_eq!(Some(2), search(&program, "éb"));
}

#[test]
fn should_surface_parse_errors_through_pipeline() {
    let test_cases = vec![
        (1, "(ab", ParseErrKind::UnmatchedParenthesis, 3),
        (2, "|ab", ParseErrKind::NoLeftExpression, 0),
        (3, "a++", ParseErrKind::NoLeftExpression, 2),
    ];

    for (test_id, pattern, expected_kind, expected_position) in test_cases {
        let err = parse(pattern).expect_err("pattern should not parse");

        assert_eq!(
            (test_id, &expected_kind, expected_position),
            (test_id, err.kind(), err.position())
        );
    }
}

#[test]
fn should_reject_pathologically_nested_patterns_without_overflowing() {
    let depth = 100_000;
    let nested = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    let err = parse(&nested).expect_err("pattern should not parse");

    assert_eq!(
        (&ParseErrKind::NestingTooDeep, MAX_NESTING_DEPTH),
        (err.kind(), err.position())
    );

    let chain = format!("{}a", "a|".repeat(50_000));
    let ast = parse(&chain).expect("pattern should parse");
    let err = compile(&ast).expect_err("program should exceed maximum length");

    assert!(matches!(
        err.kind(),
        CompileErrKind::ProgramTooLarge { .. }
    ));
}

#[test]
fn should_match_against_long_alternation_chain() {
    let pattern = (0..2_000)
        .map(|n| format!("x{}", n))
        .collect::<Vec<_>>()
        .join("|");
    let program = compile_pattern(&pattern);

    assert_eq!(Some(Match::new(3, 5)), find(&program, "ab x7"));
    // `x1` precedes `x1999` so it is preferred.
    assert_eq!(Some(Match::new(3, 5)), find(&program, "ab x1999"));
    assert_eq!(None, search(&program, "abc y1"));
}
