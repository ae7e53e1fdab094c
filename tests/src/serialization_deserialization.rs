use tiny_regex_compiler::bytecode::ToBytecode;
use tiny_regex_runtime::bytecode::FromBytecode;
use tiny_regex_runtime::*;

use crate::compile_pattern;

#[test]
fn should_preserve_equivalent_representation_in_bytecode_encoding() {
    let input_output = [
        Instructions::new(vec![Opcode::Char(InstChar::new('a')), Opcode::Match]),
        Instructions::new(vec![
            Opcode::Char(InstChar::new('€')),
            Opcode::Split(InstSplit::new(InstIndex::from(0), InstIndex::from(2))),
            Opcode::Match,
        ])
        .with_fast_forward(FastForward::Char('€')),
        Instructions::new(vec![
            Opcode::Split(InstSplit::new(InstIndex::from(1), InstIndex::from(3))),
            Opcode::Char(InstChar::new('a')),
            Opcode::Jmp(InstJmp::new(InstIndex::from(0))),
            Opcode::Match,
        ]),
    ];

    for (test_case, program) in input_output.into_iter().enumerate() {
        let generated_bytecode = program.to_bytecode();
        let deserialized_program_result = Instructions::from_bytecode(generated_bytecode);

        // assert the generated output matches the expected output
        assert_eq!(
            (test_case, Ok(program)),
            (test_case, deserialized_program_result)
        );
    }
}

#[test]
fn should_behave_identically_after_binary_round_trip() {
    let test_cases = vec![
        (1, "cat|dog", "hotdog"),
        (2, "a(b|c)*d", "xxabcbcd"),
        (3, "(ab)+", "aababab"),
    ];

    for (test_id, pattern, input) in test_cases {
        let program = compile_pattern(pattern);
        let bin = tiny_regex_compiler::to_binary(&program).expect("program should serialize");
        let decoded = bytecode::from_binary(&bin).expect("image should deserialize");

        assert_eq!(
            (test_id, find(&program, input)),
            (test_id, find(&decoded, input))
        );
    }
}

#[test]
fn should_decode_words_emitted_by_encoder() {
    let program = compile_pattern("a?b");
    let words = program
        .as_ref()
        .iter()
        .map(|inst| inst.to_bytecode())
        .collect::<Vec<u32>>();

    // the header carries the fast-forward hint, bare words do not.
    assert_eq!(
        Ok(program.clone().with_fast_forward(FastForward::None)),
        bytecode::from_words(&words)
    );
}
