use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::ast::Node;
use crate::diagnostic::Diagnostic;
use crate::lexer::{self, Op, TokenKind};
use crate::value::{StructValue, Value};

use super::bridge;
use super::environment::{Environment, ScopeId};
use super::error::RuntimeError;
use super::parser::TreeParser;

/// Tree-walking evaluator. Holds the scope-frame arena and the stack
/// of scripts currently executing, which `#` uses to resolve relative
/// paths. The stack is instance state, not a process global.
pub struct Interpreter {
    env: Environment,
    script_stack: Vec<PathBuf>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            script_stack: Vec::new(),
        }
    }

    /// An interpreter about to run the script at `path`; relative `#`
    /// targets resolve against that script's directory.
    pub fn for_script(path: impl Into<PathBuf>) -> Self {
        Self {
            env: Environment::new(),
            script_stack: vec![path.into()],
        }
    }

    /// Tokenizes, parses and evaluates `source` in the root scope,
    /// converting any failure into renderable diagnostics.
    pub fn exec(&mut self, source: &str) -> Result<Value, Vec<Diagnostic>> {
        let tokens = lexer::tokenize(source).map_err(|error| vec![error.to_diagnostic()])?;
        let tree = TreeParser::new()
            .parse(&tokens)
            .map_err(|error| vec![error.to_diagnostic()])?;
        let root_scope = self.env.root();
        self.run(&tree.root, root_scope)
            .map_err(|error| vec![error.to_diagnostic()])
    }

    /// Evaluates a node in the given scope. A valueless node is a
    /// statement group: every branch runs in order, in this same
    /// scope, and the last non-Null result wins (Null if there is
    /// none). A valued node dispatches on its token.
    pub fn run(&mut self, node: &Node, scope: ScopeId) -> Result<Value, RuntimeError> {
        match &node.value {
            None => {
                let mut last = Value::Null;
                for branch in &node.branches {
                    let value = self.run(branch, scope)?;
                    if !value.is_null() {
                        last = value;
                    }
                }
                Ok(last)
            }
            Some(token) => match token.kind {
                TokenKind::Operator(op) => self.apply(op, node, scope),
                TokenKind::StringLit => {
                    let lexeme = token.lexeme.as_ref();
                    // Strip the delimiting quotes; escapes were already
                    // resolved by the tokenizer.
                    Ok(Value::Text(Rc::from(&lexeme[1..lexeme.len() - 1])))
                }
                TokenKind::NumberLit => {
                    let lexeme = token.lexeme.as_ref();
                    let number: f64 = lexeme
                        .parse()
                        .map_err(|_| RuntimeError::number_format(lexeme))?;
                    Ok(Value::Number(number))
                }
                // Bare names evaluate to their own text, which is how
                // they act as keys for = ! ^ @ without quoting.
                TokenKind::Identifier => Ok(Value::Text(token.lexeme.clone())),
                TokenKind::StructStart => self.build_struct(node, scope),
                // The parser never stores these as node values.
                TokenKind::ScopeIn | TokenKind::ScopeOut | TokenKind::StructEnd => {
                    Ok(Value::Null)
                }
            },
        }
    }

    fn apply(&mut self, op: Op, node: &Node, scope: ScopeId) -> Result<Value, RuntimeError> {
        match op {
            Op::Assign => {
                if node.branches.len() < 2 {
                    return Ok(Value::Null);
                }
                let key = self.eval_arg(node, 0, scope)?;
                let value = self.eval_arg(node, 1, scope)?;
                self.env.set(scope, key, value.clone());
                Ok(value)
            }
            Op::Lookup => {
                if node.branches.is_empty() {
                    return Ok(Value::Null);
                }
                let key = self.eval_arg(node, 0, scope)?;
                Ok(self.env.get(scope, &key).unwrap_or(Value::Null))
            }
            Op::Cond => {
                if node.branches.len() < 2 {
                    return Ok(Value::Null);
                }
                let condition = self.eval_arg(node, 0, scope)?;
                if condition.is_truthy() {
                    self.eval_arg(node, 1, scope)
                } else if node.branches.len() == 3 {
                    self.eval_arg(node, 2, scope)
                } else {
                    Ok(Value::Null)
                }
            }
            // Boolean folds are eager: every branch runs, no
            // short-circuit.
            Op::Or => self.fold_bool(node, scope, |acc, next| acc | next),
            Op::And => self.fold_bool(node, scope, |acc, next| acc & next),
            Op::Eq => {
                let mut seen = HashSet::new();
                for index in 0..node.branches.len() {
                    seen.insert(self.eval_arg(node, index, scope)?);
                }
                Ok(Value::Bool(seen.len() == 1))
            }
            Op::NotEq => {
                let count = node.branches.len();
                let mut seen = HashSet::new();
                for index in 0..count {
                    seen.insert(self.eval_arg(node, index, scope)?);
                }
                Ok(Value::Bool(seen.len() == count))
            }
            Op::GreaterEq => self.chain_compare(node, scope, |a, b| a >= b),
            Op::LessEq => self.chain_compare(node, scope, |a, b| a <= b),
            Op::Greater => self.chain_compare(node, scope, |a, b| a > b),
            Op::Less => self.chain_compare(node, scope, |a, b| a < b),
            Op::Add => self.fold_number(node, scope, |acc, next| acc + next),
            Op::Sub => self.fold_number(node, scope, |acc, next| acc - next),
            Op::Mul => self.fold_number(node, scope, |acc, next| acc * next),
            Op::Div => self.fold_number(node, scope, |acc, next| acc / next),
            Op::Define => {
                if node.branches.len() < 2 {
                    return Ok(Value::Null);
                }
                let key = self.eval_arg(node, 0, scope)?;
                let body = Value::Function(node.branches[1].clone());
                self.env.set_function(scope, key, body);
                Ok(Value::Null)
            }
            Op::Call => {
                if node.branches.is_empty() {
                    return Ok(Value::Null);
                }
                let key = self.eval_arg(node, 0, scope)?;
                match self.env.get_function(scope, &key) {
                    // The body executes against the caller's scope
                    // chain: call-site binding, not a lexical closure.
                    Some(Value::Function(body)) => self.run(&body, scope),
                    _ => Ok(Value::Null),
                }
            }
            Op::Include => self.include(node, scope),
            Op::Syscall => {
                if node.branches.is_empty() {
                    return Ok(Value::Null);
                }
                let number = self.number_arg(node, 0, scope)? as i64;
                let mut args = Vec::with_capacity(node.branches.len() - 1);
                for index in 1..node.branches.len() {
                    args.push(self.eval_arg(node, index, scope)?);
                }
                let result = bridge::syscall(number, &args)?;
                Ok(Value::Number(result as f64))
            }
        }
    }

    fn eval_arg(&mut self, node: &Node, index: usize, scope: ScopeId) -> Result<Value, RuntimeError> {
        self.run(&node.branches[index], scope)
    }

    fn number_arg(&mut self, node: &Node, index: usize, scope: ScopeId) -> Result<f64, RuntimeError> {
        let value = self.eval_arg(node, index, scope)?;
        value
            .coerce_number()
            .ok_or_else(|| RuntimeError::number_format(value.coerce_text()))
    }

    fn fold_number(
        &mut self,
        node: &Node,
        scope: ScopeId,
        op: impl Fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeError> {
        if node.branches.is_empty() {
            return Ok(Value::Null);
        }
        let mut result = self.number_arg(node, 0, scope)?;
        for index in 1..node.branches.len() {
            let next = self.number_arg(node, index, scope)?;
            result = op(result, next);
        }
        Ok(Value::Number(result))
    }

    fn fold_bool(
        &mut self,
        node: &Node,
        scope: ScopeId,
        op: impl Fn(bool, bool) -> bool,
    ) -> Result<Value, RuntimeError> {
        if node.branches.is_empty() {
            return Ok(Value::Null);
        }
        let mut result = self.eval_arg(node, 0, scope)?.is_truthy();
        for index in 1..node.branches.len() {
            let next = self.eval_arg(node, index, scope)?.is_truthy();
            result = op(result, next);
        }
        Ok(Value::Bool(result))
    }

    /// Adjacent-pair numeric chain; false as soon as one pair fails,
    /// leaving later branches unevaluated.
    fn chain_compare(
        &mut self,
        node: &Node,
        scope: ScopeId,
        relation: impl Fn(f64, f64) -> bool,
    ) -> Result<Value, RuntimeError> {
        if node.branches.is_empty() {
            return Ok(Value::Null);
        }
        let mut previous = self.number_arg(node, 0, scope)?;
        for index in 1..node.branches.len() {
            let next = self.number_arg(node, index, scope)?;
            if !relation(previous, next) {
                return Ok(Value::Bool(false));
            }
            previous = next;
        }
        Ok(Value::Bool(true))
    }

    /// Evaluates a struct literal. All fields share one fresh field
    /// scope parented to the enclosing scope, so an assignment in an
    /// early field is visible to later fields but leaks nowhere.
    /// Nested literals re-enter here through `run`, parenting their
    /// field scope to this one.
    fn build_struct(&mut self, node: &Node, scope: ScopeId) -> Result<Value, RuntimeError> {
        let mark = self.env.depth();
        let field_scope = self.env.child(scope);

        let mut fields = Vec::with_capacity(node.branches.len());
        for branch in &node.branches {
            match self.run(branch, field_scope) {
                Ok(value) => fields.push(value),
                Err(error) => {
                    self.env.release(mark);
                    return Err(error);
                }
            }
        }

        self.env.release(mark);
        Ok(Value::Struct(Rc::new(StructValue { fields })))
    }

    /// `#`: each branch is either inline source (contains a line
    /// break) or a path to read, resolved against the directory of the
    /// script currently executing. Either way the code runs in the
    /// current scope; the last non-Null result across branches wins.
    fn include(&mut self, node: &Node, scope: ScopeId) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for index in 0..node.branches.len() {
            let target = self.eval_arg(node, index, scope)?.coerce_text();
            let value = if target.contains('\n') {
                self.run_embedded(&target, scope, "<inline>")?
            } else {
                self.include_file(&target, scope)?
            };
            if !value.is_null() {
                last = value;
            }
        }
        Ok(last)
    }

    fn include_file(&mut self, target: &str, scope: ScopeId) -> Result<Value, RuntimeError> {
        let path = self.resolve(target);
        let origin = path.display().to_string();
        let source = fs::read_to_string(&path)
            .map_err(|error| RuntimeError::include(&origin, error.to_string()))?;

        self.script_stack.push(path);
        let result = self.run_embedded(&source, scope, &origin);
        self.script_stack.pop();
        result
    }

    fn resolve(&self, target: &str) -> PathBuf {
        let path = Path::new(target);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self
            .script_stack
            .last()
            .and_then(|current| current.parent())
        {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    fn run_embedded(
        &mut self,
        source: &str,
        scope: ScopeId,
        origin: &str,
    ) -> Result<Value, RuntimeError> {
        let tokens = lexer::tokenize(source)
            .map_err(|error| RuntimeError::include(origin, error.to_string()))?;
        let tree = TreeParser::new()
            .parse(&tokens)
            .map_err(|error| RuntimeError::include(origin, error.to_string()))?;
        self.run(&tree.root, scope)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_and_run(source: &str) -> Result<Value, String> {
    let tokens = lexer::tokenize(source).map_err(|error| error.to_string())?;
    let tree = TreeParser::new()
        .parse(&tokens)
        .map_err(|error| error.to_string())?;

    let mut interpreter = Interpreter::new();
    let root_scope = interpreter.env.root();
    interpreter
        .run(&tree.root, root_scope)
        .map_err(|error| format!("Runtime error: {}", error))
}

pub fn parse_and_run_with_diagnostics(source: &str) -> Result<Value, Vec<Diagnostic>> {
    let mut interpreter = Interpreter::new();
    interpreter.exec(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Value {
        parse_and_run(source).expect("evaluation failed")
    }

    #[test]
    fn test_assignment_and_lookup() {
        assert_eq!(run("( a = ( 3 + ( 7 * 9 ) ) ) ( b = ( + 10 ( a ! ) ) ) ( b ! )"),
            Value::Number(76.0));
    }

    #[test]
    fn test_unbound_lookup_is_null() {
        assert_eq!(run("( x ! )"), Value::Null);
    }

    #[test]
    fn test_assignment_returns_its_value() {
        assert_eq!(run("( a = 5 )"), Value::Number(5.0));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(run("( ? 0 1 2 )"), Value::Number(2.0));
        assert_eq!(run("( ? 1 \"x\" )"), Value::Text("x".into()));
        assert_eq!(run("( ? 0 1 )"), Value::Null);
    }

    #[test]
    fn test_untaken_branch_has_no_side_effects() {
        assert_eq!(run("( ? 1 2 ( x = 9 ) ) ( x ! )"), Value::Number(2.0));
    }

    #[test]
    fn test_subtraction_folds_left() {
        assert_eq!(run("( - 10 3 2 )"), Value::Number(5.0));
    }

    #[test]
    fn test_division_folds_left() {
        assert_eq!(run("( / 100 5 2 )"), Value::Number(10.0));
    }

    #[test]
    fn test_comparison_chains() {
        assert_eq!(run("( < 1 2 3 )"), Value::Bool(true));
        assert_eq!(run("( < 1 3 2 )"), Value::Bool(false));
    }

    #[test]
    fn test_equality_collapses_to_a_set() {
        assert_eq!(run("( == 5 5 5 )"), Value::Bool(true));
        assert_eq!(run("( == 5 5 6 )"), Value::Bool(false));
        assert_eq!(run("( != 1 2 3 )"), Value::Bool(true));
        assert_eq!(run("( != 1 1 2 )"), Value::Bool(false));
    }

    #[test]
    fn test_string_literal_strips_quotes() {
        assert_eq!(run("( \"abc\" )"), Value::Text("abc".into()));
    }

    #[test]
    fn test_define_and_call() {
        assert_eq!(run("( ^ f ( + 1 1 ) ) ( @ f )"), Value::Number(2.0));
    }

    #[test]
    fn test_call_unbound_function_is_null() {
        assert_eq!(run("( @ nothing )"), Value::Null);
    }

    #[test]
    fn test_function_reads_caller_bindings() {
        // Dynamic binding: the body resolves x at call time.
        assert_eq!(
            run("( ^ f ( + ( x ! ) 1 ) ) ( x = 41 ) ( @ f )"),
            Value::Number(42.0)
        );
    }

    #[test]
    fn test_struct_fields_share_a_scope() {
        let result = run("{ ( x = 1 ) ( x ! ) }");
        let Value::Struct(fields) = result else {
            panic!("expected a struct");
        };
        assert_eq!(fields.fields, vec![Value::Number(1.0), Value::Number(1.0)]);
    }

    #[test]
    fn test_struct_scope_does_not_leak() {
        // x is unbound after the literal, so the probe takes its else
        // branch.
        assert_eq!(run("{ ( x = 1 ) } ( ? ( x ! ) 1 2 )"), Value::Number(2.0));
    }

    #[test]
    fn test_arity_shortfalls_yield_null() {
        assert_eq!(run("( = a )"), Value::Null);
        assert_eq!(run("( ! )"), Value::Null);
        assert_eq!(run("( ? 1 )"), Value::Null);
        assert_eq!(run("( ^ f )"), Value::Null);
        assert_eq!(run("( @ )"), Value::Null);
        assert_eq!(run("( + )"), Value::Null);
    }

    #[test]
    fn test_number_format_failure_is_fatal() {
        assert!(parse_and_run("( + 1 oops )").is_err());
    }

    #[test]
    fn test_empty_program_is_null() {
        assert_eq!(run(""), Value::Null);
    }
}
