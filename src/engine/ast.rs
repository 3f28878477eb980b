use crate::engine::token::Token;
use crate::engine::value::Value;

/// One parsed form. The parser builds these once; the evaluator matches
/// on them exhaustively, so adding a variant is a compile-time-checked
/// change everywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A scalar constant: number, string, boolean or nil.
    Literal(Value),
    /// (defvar name initializer)
    DefVar {
        name: Token,
        initializer: Box<Expr>,
    },
    /// A variable reference.
    Var { name: Token },
    /// (if condition then else)
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// (defun name (params...) body)
    DefFun {
        name: Token,
        params: Vec<Token>,
        body: Box<Expr>,
    },
    /// (name args...)
    Call { name: Token, args: Vec<Expr> },
    /// '(elements...)
    ListLiteral { elements: Vec<Expr> },
    /// (let (name value ...) body). Bindings are evaluated in the
    /// outer scope and do not see each other.
    Let {
        names: Vec<Token>,
        values: Vec<Expr>,
        body: Box<Expr>,
    },
    /// (lambda (params...) body)
    Lambda { params: Vec<Token>, body: Box<Expr> },
}
