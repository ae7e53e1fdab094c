//! Cross-crate tests exercising the compiler and runtime together.

#[cfg(test)]
mod end_to_end;
#[cfg(test)]
mod properties;
#[cfg(test)]
mod serialization_deserialization;

/// Parses and compiles a pattern, panicking on either failure.
#[cfg(test)]
pub(crate) fn compile_pattern(pattern: &str) -> tiny_regex_runtime::Instructions {
    let _ = env_logger::builder().is_test(true).try_init();

    let ast = tiny_regex_compiler::parse(pattern)
        .unwrap_or_else(|e| panic!("pattern {:?} should parse:\n{}", pattern, e));
    tiny_regex_compiler::compile(&ast)
        .unwrap_or_else(|e| panic!("pattern {:?} should compile: {}", pattern, e))
}
