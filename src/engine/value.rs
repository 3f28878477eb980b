use crate::engine::ast::Expr;
use crate::engine::env::Environment;
use crate::engine::error::ExecutionError;
use crate::engine::list::List;
use crate::engine::token::Token;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A runtime value produced by evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
    Function(Function),
    List(List),
}

/// A callable value. The builtin set is closed and known at compile
/// time, so this is a tagged variant rather than an open trait.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    User(UserFunction),
    Builtin(Builtin),
}

impl Function {
    pub fn arity(&self) -> Arity {
        match self {
            Function::User(f) => Arity::Exact(f.params.len()),
            Function::Builtin(b) => b.arity,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Function::User(f) => &f.name,
            Function::Builtin(b) => b.name,
        }
    }
}

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

/// A user-defined function or lambda, closing over the environment that
/// was active at its definition site. The shared handle keeps the
/// captured environment alive for as long as the closure exists.
#[derive(Clone)]
pub struct UserFunction {
    pub name: String,
    pub params: Vec<Token>,
    pub body: Rc<Expr>,
    pub closure: Rc<RefCell<Environment>>,
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("closure", &"<captured_env>") // Avoid printing the whole env
            .finish()
    }
}

// Functions are equal if their parameters and body are structurally
// equal. The captured environment is not considered.
impl PartialEq for UserFunction {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body
    }
}

/// Signature of a native builtin. Arity has already been checked against
/// the declared rule by the time this runs; `line` is the call site for
/// error reporting.
pub type NativeFn = fn(line: usize, args: &[Value]) -> Result<Value, ExecutionError>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("func", &"<native_fn_ptr>")
            .finish()
    }
}

// Builtin names are unique within the stdlib, so name equality suffices.
impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Nil => write!(f, "nil"),
            Value::Function(func) => write!(f, "<{}>", func.name()),
            Value::List(list) => write!(f, "{list}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Number(-3.0).to_string(), "-3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn scalars_display_plainly() {
        assert_eq!(Value::Str("hi".to_string()).to_string(), "hi");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "nil");
    }

    #[test]
    fn lists_display_with_parens() {
        let list = List::new(vec![
            Value::Number(1.0),
            Value::Str("two".to_string()),
            Value::Nil,
        ]);
        assert_eq!(Value::List(list).to_string(), "(1 two nil)");
    }
}
