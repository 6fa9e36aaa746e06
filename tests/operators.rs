use lank::interpreter::parse_and_run;
use lank::Value;

fn run(source: &str) -> Value {
    parse_and_run(source).expect("evaluation failed")
}

fn number(source: &str) -> f64 {
    match run(source) {
        Value::Number(n) => n,
        other => panic!("Expected a number, got {:?}", other),
    }
}

fn boolean(source: &str) -> bool {
    match run(source) {
        Value::Bool(b) => b,
        other => panic!("Expected a boolean, got {:?}", other),
    }
}

// ============================================================================
// Arithmetic Folds
// ============================================================================

#[test]
fn test_addition() {
    assert_eq!(number("( + 1 2 )"), 3.0);
    assert_eq!(number("( + 1 2 3 4 )"), 10.0);
}

#[test]
fn test_subtraction_is_a_left_fold() {
    // (10 - 3) - 2, never 10 - (3 - 2).
    assert_eq!(number("( - 10 3 2 )"), 5.0);
}

#[test]
fn test_division_is_a_left_fold() {
    assert_eq!(number("( / 100 5 2 )"), 10.0);
}

#[test]
fn test_multiplication() {
    assert_eq!(number("( * 2 3 4 )"), 24.0);
}

#[test]
fn test_single_operand_fold_returns_the_operand() {
    assert_eq!(number("( + 5 )"), 5.0);
    assert_eq!(number("( - 5 )"), 5.0);
}

#[test]
fn test_infix_spelling_means_the_same_tree() {
    assert_eq!(number("( 1 + 2 )"), number("( + 1 2 )"));
}

#[test]
fn test_numeric_coercion_in_folds() {
    // Identifiers evaluate to their own text, which coerces if it
    // parses; booleans coerce to 1/0.
    assert_eq!(number("( + 3.5 1 )"), 4.5);
    assert_eq!(number("( + ( == 1 1 ) 1 )"), 2.0);
    assert_eq!(number("( + ( x ! ) 7 )"), 7.0); // Null coerces to 0
}

#[test]
fn test_division_by_zero_is_infinite() {
    assert!(number("( / 1 0 )").is_infinite());
}

// ============================================================================
// Comparison Chains
// ============================================================================

#[test]
fn test_ascending_chain() {
    assert!(boolean("( < 1 2 3 )"));
    assert!(!boolean("( < 1 3 2 )"));
}

#[test]
fn test_descending_chain() {
    assert!(boolean("( > 9 5 1 )"));
    assert!(!boolean("( > 9 1 5 )"));
}

#[test]
fn test_inclusive_chains() {
    assert!(boolean("( <= 1 1 2 )"));
    assert!(boolean("( >= 3 3 2 )"));
    assert!(!boolean("( <= 2 1 )"));
}

#[test]
fn test_chain_failure_skips_later_operands() {
    // The chain fails at 3 > 2, so the unparseable tail is never
    // coerced.
    assert!(!boolean("( < 3 2 bogus )"));
}

// ============================================================================
// Equality as Set Collapse
// ============================================================================

#[test]
fn test_all_equal() {
    assert!(boolean("( == 5 5 5 )"));
    assert!(!boolean("( == 5 5 6 )"));
}

#[test]
fn test_all_distinct() {
    assert!(boolean("( != 1 2 3 )"));
    assert!(!boolean("( != 1 1 2 )"));
}

#[test]
fn test_equality_is_not_coercing() {
    // The number 5 and the text "5" are different values.
    assert!(!boolean("( == 5 \"5\" )"));
}

#[test]
fn test_text_equality() {
    assert!(boolean("( == \"a\" \"a\" \"a\" )"));
    assert!(boolean("( != \"a\" \"b\" )"));
}

// ============================================================================
// Boolean Folds (eager, no short-circuit)
// ============================================================================

#[test]
fn test_or_and_fold() {
    assert!(boolean("( | 0 0 1 )"));
    assert!(!boolean("( | 0 0 0 )"));
    assert!(boolean("( & 1 1 1 )"));
    assert!(!boolean("( & 1 0 1 )"));
}

#[test]
fn test_boolean_folds_evaluate_every_branch() {
    // The assignment in the second branch runs even though the first
    // branch already decided the result.
    let result = run("( | 1 ( x = 1 ) ) ( x ! )");
    assert_eq!(result, Value::Number(1.0));
}

#[test]
fn test_truthiness_table() {
    assert!(!boolean("( | 0 0 )"));
    assert!(boolean("( | \"text\" 0 )"));
    assert!(!boolean("( | \"\" 0 )"));
    assert!(!boolean("( | ( nope ! ) 0 )")); // Null is falsy
}

// ============================================================================
// Conditional
// ============================================================================

#[test]
fn test_conditional_branches() {
    assert_eq!(run("( ? 0 1 2 )"), Value::Number(2.0));
    assert_eq!(run("( ? 1 \"x\" )"), Value::Text("x".into()));
    assert_eq!(run("( ? 0 1 )"), Value::Null);
}

#[test]
fn test_only_the_taken_branch_runs() {
    assert_eq!(run("( ? 1 2 ( x = 9 ) ) ( x ! )"), Value::Number(2.0));
    assert_eq!(run("( ? 0 ( y = 9 ) 3 ) ( y ! )"), Value::Number(3.0));
}
