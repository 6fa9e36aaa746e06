use lank::interpreter::{parse_and_run, parse_and_run_with_diagnostics};
use lank::lexer::tokenize;
use lank::Value;

// ============================================================================
// Fatal Conditions
// ============================================================================

#[test]
fn test_unparseable_text_in_numeric_position_is_fatal() {
    let error = parse_and_run("( + 1 bogus )").expect_err("expected a runtime error");
    assert!(error.contains("not a number"));
    assert!(error.contains("bogus"));
}

#[test]
fn test_unmatched_closing_bracket_is_fatal() {
    let error = parse_and_run("( a ! ) )").expect_err("expected a parse error");
    assert!(error.contains("unmatched"));
}

#[test]
fn test_unclosed_bracket_is_fatal() {
    let error = parse_and_run("( a = ( 1 )").expect_err("expected a parse error");
    assert!(error.contains("unclosed"));
}

#[test]
fn test_fatal_conditions_discard_all_work() {
    // The first statement binds, but the run as a whole still fails.
    assert!(parse_and_run("( a = 1 ) ( + 1 bogus )").is_err());
}

// ============================================================================
// Soft Failures
// ============================================================================

#[test]
fn test_unbound_variable_is_null_not_an_error() {
    assert_eq!(parse_and_run("( never_set ! )"), Ok(Value::Null));
}

#[test]
fn test_unbound_function_is_null_not_an_error() {
    assert_eq!(parse_and_run("( @ never_defined )"), Ok(Value::Null));
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_parse_error_diagnostic_carries_code_and_span() {
    let diagnostics = parse_and_run_with_diagnostics("( a ! ) )")
        .expect_err("expected diagnostics");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some("E0101"));
    assert!(!diagnostics[0].labels.is_empty());
    assert!(!diagnostics[0].labels[0].span.is_dummy());
}

#[test]
fn test_runtime_diagnostic_carries_code() {
    let diagnostics = parse_and_run_with_diagnostics("( + 1 bogus )")
        .expect_err("expected diagnostics");
    assert_eq!(diagnostics[0].code.as_deref(), Some("E0201"));
}

#[test]
fn test_success_path_reports_no_diagnostics() {
    let result = parse_and_run_with_diagnostics("( + 1 2 )");
    assert_eq!(result.expect("evaluation failed"), Value::Number(3.0));
}

// ============================================================================
// Lexing Contract
// ============================================================================

#[test]
fn test_every_nonempty_word_classifies() {
    // The identifier kind is a catch-all, so ordinary garbage still
    // tokenizes; it fails later, at coercion time, if at all.
    assert!(tokenize("@@@ ??? ((( )))").is_ok());
}

#[test]
fn test_tokenizer_drops_escaped_out_words() {
    // A lone escape at end of input contributes nothing.
    let tokens = tokenize("a \\").expect("Lexer failed");
    assert_eq!(tokens.len(), 1);
}
