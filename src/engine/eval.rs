use crate::engine::ast::Expr;
use crate::engine::builtins;
use crate::engine::env::Environment;
use crate::engine::error::ExecutionError;
use crate::engine::list::List;
use crate::engine::value::{Arity, Function, UserFunction, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, error, instrument, trace};

/// Tree-walking evaluator.
///
/// The interpreter owns only the global environment; the active
/// environment is threaded through `evaluate` as an explicit parameter
/// and unwinds with the call stack, so nested evaluation never toggles
/// shared state.
pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
}

impl Interpreter {
    /// Creates an interpreter with the builtin library registered in a
    /// fresh global environment.
    pub fn new() -> Self {
        let globals = Environment::new();
        builtins::register(&globals);
        Interpreter { globals }
    }

    /// Evaluates top-level expressions in order and returns the value of
    /// the last one. The first error aborts the rest of the batch;
    /// bindings defined before the error remain in the global scope.
    #[instrument(skip(self, expressions))]
    pub fn interpret(&self, expressions: &[Expr]) -> Result<Value, ExecutionError> {
        let mut ret = Value::Nil;

        for expr in expressions {
            ret = evaluate(expr, &self.globals)?;
        }

        Ok(ret)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates one expression in the given environment.
pub fn evaluate(expr: &Expr, env: &Rc<RefCell<Environment>>) -> Result<Value, ExecutionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var { name } => env.borrow().get(name),
        Expr::DefVar { name, initializer } => {
            let value = evaluate(initializer, env)?;
            debug!(name = %name.lexeme, "defvar");
            env.borrow_mut().define(name, value.clone())?;
            Ok(value)
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = evaluate(condition, env)?;
            trace!(truthy = is_truthy(&cond), "if condition evaluated");

            // Exactly one branch is ever evaluated.
            if is_truthy(&cond) {
                evaluate(then_branch, env)
            } else {
                evaluate(else_branch, env)
            }
        }
        Expr::DefFun { name, params, body } => {
            let function = Value::Function(Function::User(UserFunction {
                name: name.lexeme.clone(),
                params: params.clone(),
                body: Rc::new((**body).clone()),
                closure: Rc::clone(env),
            }));

            debug!(name = %name.lexeme, arity = params.len(), "defun");
            env.borrow_mut().define(name, function.clone())?;
            Ok(function)
        }
        Expr::Lambda { params, body } => Ok(Value::Function(Function::User(UserFunction {
            name: "lambda".to_string(),
            params: params.clone(),
            body: Rc::new((**body).clone()),
            closure: Rc::clone(env),
        }))),
        Expr::Call { name, args } => {
            let callee = env.borrow().get(name)?;

            let function = match callee {
                Value::Function(f) => f,
                other => {
                    error!(name = %name.lexeme, value = ?other, "call target is not a function");
                    return Err(ExecutionError::NotAFunction {
                        line: name.line,
                        name: name.lexeme.clone(),
                    });
                }
            };

            // Arguments are evaluated eagerly, left to right.
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, env)?);
            }

            apply(name.line, &function, evaluated)
        }
        Expr::ListLiteral { elements } => {
            let mut values = Vec::with_capacity(elements.len());
            for el in elements {
                values.push(evaluate(el, env)?);
            }
            Ok(Value::List(List::new(values)))
        }
        Expr::Let {
            names,
            values,
            body,
        } => {
            // Binding values see the outer scope only, not each other.
            let mut evaluated = Vec::with_capacity(values.len());
            for value in values {
                evaluated.push(evaluate(value, env)?);
            }

            let scope = Environment::new_enclosed(Rc::clone(env));
            for (name, value) in names.iter().zip(evaluated) {
                scope.borrow_mut().define(name, value)?;
            }

            evaluate(body, &scope)
        }
    }
}

/// Applies a callable to already-evaluated arguments, enforcing its
/// arity rule. `line` is the call site, used for error reporting.
#[instrument(skip(function, args), fields(name = function.name()))]
pub fn apply(line: usize, function: &Function, args: Vec<Value>) -> Result<Value, ExecutionError> {
    check_arity(line, function, args.len())?;

    match function {
        Function::User(user_fn) => {
            let call_env = Environment::new_enclosed(Rc::clone(&user_fn.closure));

            for (param, arg) in user_fn.params.iter().zip(args) {
                call_env.borrow_mut().define(param, arg)?;
            }

            trace!("evaluating function body");
            evaluate(&user_fn.body, &call_env)
        }
        Function::Builtin(builtin) => (builtin.func)(line, &args),
    }
}

fn check_arity(line: usize, function: &Function, got: usize) -> Result<(), ExecutionError> {
    match function.arity() {
        Arity::Exact(expected) if got != expected => Err(ExecutionError::ArityMismatch {
            line,
            message: format!(
                "'{}' expects {} arguments, got {}",
                function.name(),
                expected,
                got
            ),
        }),
        Arity::AtLeast(min) if got < min => Err(ExecutionError::ArityMismatch {
            line,
            message: format!(
                "'{}' requires at least {} arguments, got {}",
                function.name(),
                min,
                got
            ),
        }),
        _ => Ok(()),
    }
}

/// Only `false` and `nil` are falsy; everything else, including zero,
/// the empty string and the empty list, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Bool(false) | Value::Nil)
}
