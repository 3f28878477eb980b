//! The builtin primitive library, registered once into the global
//! environment at interpreter construction.

use crate::engine::env::Environment;
use crate::engine::error::ExecutionError;
use crate::engine::eval::{apply, is_truthy};
use crate::engine::list::List;
use crate::engine::token::Token;
use crate::engine::value::{Arity, Builtin, Function, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

const BUILTINS: &[Builtin] = &[
    // IO
    Builtin {
        name: "println",
        arity: Arity::AtLeast(0),
        func: native_println,
    },
    // Math
    Builtin {
        name: "+",
        arity: Arity::AtLeast(2),
        func: native_add,
    },
    Builtin {
        name: "-",
        arity: Arity::AtLeast(2),
        func: native_subtract,
    },
    Builtin {
        name: "*",
        arity: Arity::AtLeast(2),
        func: native_multiply,
    },
    Builtin {
        name: "/",
        arity: Arity::AtLeast(2),
        func: native_divide,
    },
    // Collection
    Builtin {
        name: "first",
        arity: Arity::Exact(1),
        func: native_first,
    },
    Builtin {
        name: "rest",
        arity: Arity::Exact(1),
        func: native_rest,
    },
    Builtin {
        name: "add",
        arity: Arity::Exact(2),
        func: native_add_element,
    },
    Builtin {
        name: "len",
        arity: Arity::Exact(1),
        func: native_len,
    },
    Builtin {
        name: "map",
        arity: Arity::Exact(2),
        func: native_map,
    },
    Builtin {
        name: "filter",
        arity: Arity::Exact(2),
        func: native_filter,
    },
    // Logical
    Builtin {
        name: "and",
        arity: Arity::AtLeast(2),
        func: native_and,
    },
    Builtin {
        name: "or",
        arity: Arity::AtLeast(2),
        func: native_or,
    },
    Builtin {
        name: "!",
        arity: Arity::Exact(1),
        func: native_not,
    },
    Builtin {
        name: "<",
        arity: Arity::AtLeast(2),
        func: native_lt,
    },
    Builtin {
        name: "<=",
        arity: Arity::AtLeast(2),
        func: native_lte,
    },
    Builtin {
        name: ">",
        arity: Arity::AtLeast(2),
        func: native_gt,
    },
    Builtin {
        name: ">=",
        arity: Arity::AtLeast(2),
        func: native_gte,
    },
    Builtin {
        name: "=",
        arity: Arity::AtLeast(2),
        func: native_eq,
    },
    Builtin {
        name: "!=",
        arity: Arity::AtLeast(2),
        func: native_neq,
    },
];

/// Registers every builtin in the given (fresh) environment.
pub fn register(env: &Rc<RefCell<Environment>>) {
    debug!(count = BUILTINS.len(), "registering builtin library");
    let mut env = env.borrow_mut();

    for builtin in BUILTINS {
        // Builtin names are unique, so this cannot collide.
        let _ = env.define(
            &Token::identifier(builtin.name, 0),
            Value::Function(Function::Builtin(builtin.clone())),
        );
    }
}

fn as_number(line: usize, op: &str, value: &Value) -> Result<f64, ExecutionError> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(ExecutionError::TypeError {
            line,
            message: format!("'{op}' is only defined for numbers"),
        }),
    }
}

fn as_list<'a>(line: usize, op: &str, value: &'a Value) -> Result<&'a List, ExecutionError> {
    match value {
        Value::List(list) => Ok(list),
        _ => Err(ExecutionError::TypeError {
            line,
            message: format!("'{op}' is only defined for lists"),
        }),
    }
}

// Math

fn native_add(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let mut sum = 0.0;

    for arg in args {
        sum += as_number(line, "+", arg)?;
    }

    Ok(Value::Number(sum))
}

fn native_subtract(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let mut result = as_number(line, "-", &args[0])?;

    for arg in &args[1..] {
        result -= as_number(line, "-", arg)?;
    }

    Ok(Value::Number(result))
}

fn native_multiply(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let mut result = as_number(line, "*", &args[0])?;

    for arg in &args[1..] {
        result *= as_number(line, "*", arg)?;
    }

    Ok(Value::Number(result))
}

fn native_divide(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let mut result = as_number(line, "/", &args[0])?;

    for arg in &args[1..] {
        let divisor = as_number(line, "/", arg)?;

        if divisor == 0.0 {
            return Err(ExecutionError::DivisionByZero { line });
        }

        result /= divisor;
    }

    Ok(Value::Number(result))
}

// Comparisons evaluate pairwise on adjacent elements; every adjacent
// pair must satisfy the relation.

fn adjacent_numbers(
    line: usize,
    op: &str,
    args: &[Value],
    relation: fn(f64, f64) -> bool,
) -> Result<Value, ExecutionError> {
    for pair in args.windows(2) {
        let left = as_number(line, op, &pair[0])?;
        let right = as_number(line, op, &pair[1])?;

        if !relation(left, right) {
            return Ok(Value::Bool(false));
        }
    }

    Ok(Value::Bool(true))
}

fn native_lt(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    adjacent_numbers(line, "<", args, |a, b| a < b)
}

fn native_lte(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    adjacent_numbers(line, "<=", args, |a, b| a <= b)
}

fn native_gt(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    adjacent_numbers(line, ">", args, |a, b| a > b)
}

fn native_gte(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    adjacent_numbers(line, ">=", args, |a, b| a >= b)
}

// Equality is defined for any value type, compared pairwise.

fn native_eq(_line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
}

fn native_neq(_line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] != pair[1])))
}

// Logical operators receive already-evaluated arguments, so they do not
// short-circuit.

fn native_and(_line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    if args.iter().all(is_truthy) {
        Ok(args[args.len() - 1].clone())
    } else {
        Ok(Value::Bool(false))
    }
}

fn native_or(_line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    match args.iter().find(|arg| is_truthy(arg)) {
        Some(first_truthy) => Ok(first_truthy.clone()),
        None => Ok(Value::Bool(false)),
    }
}

fn native_not(_line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    Ok(Value::Bool(!is_truthy(&args[0])))
}

// Collection

fn native_first(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let list = as_list(line, "first", &args[0])?;

    match list.first() {
        Some(el) => Ok(el.clone()),
        None => Ok(Value::Nil),
    }
}

fn native_rest(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let list = as_list(line, "rest", &args[0])?;

    if list.is_empty() {
        return Ok(Value::Nil);
    }

    Ok(Value::List(list.rest()))
}

fn native_add_element(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let list = as_list(line, "add", &args[0])?;
    Ok(Value::List(list.add(args[1].clone())))
}

fn native_len(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let list = as_list(line, "len", &args[0])?;
    Ok(Value::Number(list.len() as f64))
}

/// Extracts the callback for `map`/`filter`: a function taking exactly
/// one argument.
fn as_unary_function<'a>(
    line: usize,
    op: &str,
    value: &'a Value,
) -> Result<&'a Function, ExecutionError> {
    let function = match value {
        Value::Function(f) => f,
        _ => {
            return Err(ExecutionError::TypeError {
                line,
                message: format!("'{op}' expects a function as its first argument"),
            });
        }
    };

    if function.arity() != Arity::Exact(1) {
        return Err(ExecutionError::ArityMismatch {
            line,
            message: format!("'{op}' expects a function of exactly one argument"),
        });
    }

    Ok(function)
}

fn native_map(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let function = as_unary_function(line, "map", &args[0])?;
    let list = as_list(line, "map", &args[1])?;

    let mut mapped = Vec::with_capacity(list.len());
    for el in list.iter() {
        mapped.push(apply(line, function, vec![el.clone()])?);
    }

    Ok(Value::List(List::new(mapped)))
}

fn native_filter(line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let function = as_unary_function(line, "filter", &args[0])?;
    let list = as_list(line, "filter", &args[1])?;

    let mut kept = Vec::new();
    for el in list.iter() {
        if is_truthy(&apply(line, function, vec![el.clone()])?) {
            kept.push(el.clone());
        }
    }

    Ok(Value::List(List::new(kept)))
}

// IO

fn native_println(_line: usize, args: &[Value]) -> Result<Value, ExecutionError> {
    let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    println!("{}", rendered.join(" "));

    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::eval::Interpreter;
    use crate::engine::parser::Parser;
    use crate::engine::scanner::Scanner;
    use crate::test_utils::setup_tracing;

    fn eval_src(src: &str) -> Result<Value, ExecutionError> {
        let mut sink = Vec::new();
        let (tokens, ok) = Scanner::new(src, &mut sink).scan();
        assert!(ok, "scan errors: {}", String::from_utf8_lossy(&sink));
        let expressions = Parser::new(tokens).parse().expect("parse failed");
        Interpreter::new().interpret(&expressions)
    }

    fn number(src: &str) -> f64 {
        match eval_src(src) {
            Ok(Value::Number(n)) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn addition_is_variadic() {
        setup_tracing();
        assert_eq!(number("(+ 1 2)"), 3.0);
        assert_eq!(number("(+ 1 2 3 4)"), 10.0);
    }

    #[test]
    fn subtraction_left_folds_from_the_first_argument() {
        setup_tracing();
        assert_eq!(number("(- 10 1 2)"), 7.0);
    }

    #[test]
    fn multiplication_and_division_fold() {
        setup_tracing();
        assert_eq!(number("(* 2 3 4)"), 24.0);
        assert_eq!(number("(/ 100 5 2)"), 10.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        setup_tracing();
        assert_eq!(
            eval_src("(/ 10 0)"),
            Err(ExecutionError::DivisionByZero { line: 1 })
        );
        // Any zero divisor triggers it, not just the first.
        assert!(eval_src("(/ 10 2 0)").is_err());
    }

    #[test]
    fn arithmetic_requires_two_arguments() {
        setup_tracing();
        assert_eq!(
            eval_src("(+ 1)"),
            Err(ExecutionError::ArityMismatch {
                line: 1,
                message: "'+' requires at least 2 arguments, got 1".to_string()
            })
        );
    }

    #[test]
    fn arithmetic_rejects_non_numbers() {
        setup_tracing();
        assert_eq!(
            eval_src("(+ 1 true)"),
            Err(ExecutionError::TypeError {
                line: 1,
                message: "'+' is only defined for numbers".to_string()
            })
        );
    }

    #[test]
    fn comparisons_check_adjacent_pairs() {
        setup_tracing();
        assert_eq!(eval_src("(< 1 2 3)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(< 1 3 2)"), Ok(Value::Bool(false)));
        assert_eq!(eval_src("(<= 1 1 2)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(> 3 2 1)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(>= 3 3 1)"), Ok(Value::Bool(true)));
    }

    #[test]
    fn comparison_rejects_non_numbers() {
        setup_tracing();
        assert!(matches!(
            eval_src("(< 1 \"two\")"),
            Err(ExecutionError::TypeError { .. })
        ));
    }

    #[test]
    fn equality_works_across_types() {
        setup_tracing();
        assert_eq!(eval_src("(= 5 5 5)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(= 5 6)"), Ok(Value::Bool(false)));
        assert_eq!(eval_src("(= \"a\" \"a\")"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(= 5 \"5\")"), Ok(Value::Bool(false)));
        assert_eq!(eval_src("(!= 1 2 3)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(!= 1 1)"), Ok(Value::Bool(false)));
    }

    #[test]
    fn and_returns_last_truthy_or_false() {
        setup_tracing();
        assert_eq!(eval_src("(and 1 2 3)"), Ok(Value::Number(3.0)));
        assert_eq!(eval_src("(and 1 false 3)"), Ok(Value::Bool(false)));
        assert_eq!(eval_src("(and 1 nil)"), Ok(Value::Bool(false)));
    }

    #[test]
    fn or_returns_first_truthy_or_false() {
        setup_tracing();
        assert_eq!(eval_src("(or false 2 3)"), Ok(Value::Number(2.0)));
        assert_eq!(eval_src("(or false nil)"), Ok(Value::Bool(false)));
    }

    #[test]
    fn logical_operators_do_not_short_circuit() {
        setup_tracing();
        // Arguments are evaluated eagerly, so the undefined variable is
        // reached even though the first argument already decides the
        // result.
        assert!(matches!(
            eval_src("(or true missing)"),
            Err(ExecutionError::UndefinedVariable { .. })
        ));
        assert!(matches!(
            eval_src("(and false missing)"),
            Err(ExecutionError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn not_negates_truthiness() {
        setup_tracing();
        assert_eq!(eval_src("(! false)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(! nil)"), Ok(Value::Bool(true)));
        assert_eq!(eval_src("(! 0)"), Ok(Value::Bool(false)));
    }

    #[test]
    fn first_and_rest_round_trip() {
        setup_tracing();
        assert_eq!(eval_src("(first '(1 2 3))"), Ok(Value::Number(1.0)));
        assert_eq!(
            eval_src("(first (rest '(1 2 3)))"),
            Ok(Value::Number(2.0))
        );
    }

    #[test]
    fn first_and_rest_of_empty_list_are_nil() {
        setup_tracing();
        assert_eq!(eval_src("(first '())"), Ok(Value::Nil));
        assert_eq!(eval_src("(rest '())"), Ok(Value::Nil));
    }

    #[test]
    fn collection_builtins_reject_non_lists() {
        setup_tracing();
        assert_eq!(
            eval_src("(first 5)"),
            Err(ExecutionError::TypeError {
                line: 1,
                message: "'first' is only defined for lists".to_string()
            })
        );
        assert!(eval_src("(len \"abc\")").is_err());
    }

    #[test]
    fn add_appends_without_mutating() {
        setup_tracing();
        assert_eq!(eval_src("(len (add '(1 2) 3))"), Ok(Value::Number(3.0)));
        // The source list is untouched by the append.
        assert_eq!(
            eval_src("(defvar l '(1 2)) (defvar m (add l 3)) (len l)"),
            Ok(Value::Number(2.0))
        );
    }

    #[test]
    fn map_preserves_order_and_length() {
        setup_tracing();
        assert_eq!(
            eval_src("(defun identity (x) x) (map identity '(1 2 3))"),
            eval_src("'(1 2 3)")
        );
        assert_eq!(
            eval_src("(map (lambda (x) (* x 2)) '(1 2 3))"),
            eval_src("'(2 4 6)")
        );
    }

    #[test]
    fn filter_keeps_original_elements() {
        setup_tracing();
        assert_eq!(
            eval_src("(filter (lambda (x) (> x 1)) '(1 2 3))"),
            eval_src("'(2 3)")
        );
        assert_eq!(eval_src("(filter (lambda (x) false) '(1 2))"), eval_src("'()"));
    }

    #[test]
    fn map_requires_a_unary_function() {
        setup_tracing();
        assert!(matches!(
            eval_src("(map 5 '(1 2))"),
            Err(ExecutionError::TypeError { .. })
        ));
        assert!(matches!(
            eval_src("(defun two (a b) a) (map two '(1 2))"),
            Err(ExecutionError::ArityMismatch { .. })
        ));
        // Builtins of exact arity one are fine as callbacks.
        assert_eq!(
            eval_src("(map ! '(false true))"),
            eval_src("'(true false)")
        );
    }

    #[test]
    fn println_returns_nil() {
        setup_tracing();
        assert_eq!(eval_src("(println \"a\" 1 nil)"), Ok(Value::Nil));
        assert_eq!(eval_src("(println)"), Ok(Value::Nil));
    }
}
