use crate::engine::ast::Expr;
use crate::engine::error::ParseError;
use crate::engine::token::{Literal, Token, TokenType};
use crate::engine::value::Value;
use tracing::{instrument, trace};

/// Recursive-descent parser over the scanner's token sequence.
///
/// Grammar forms are disambiguated by peeking one or two tokens ahead at
/// a `(`. Unlike the scanner, parsing fails fast: the first structural
/// error aborts the whole parse unit.
pub struct Parser {
    tokens: Vec<Token>,
    curr: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, curr: 0 }
    }

    /// Parses every top-level declaration until EOF, in source order.
    #[instrument(skip(self))]
    pub fn parse(mut self) -> Result<Vec<Expr>, ParseError> {
        let mut expressions = Vec::new();

        while !self.is_at_end() {
            expressions.push(self.declaration()?);
        }

        trace!(count = expressions.len(), "parse finished");
        Ok(expressions)
    }

    fn declaration(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenType::LeftParen) {
            if self.check_n(TokenType::Defvar, 1) {
                return self.var_def();
            }
            if self.check_n(TokenType::Defun, 1) {
                return self.fun_def();
            }
        }

        self.expression()
    }

    fn var_def(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before variable definition")?;
        self.consume(TokenType::Defvar, "Expect 'defvar' after '('")?;

        let name = self.consume(TokenType::Identifier, "Expect identifier after 'defvar'")?;
        let initializer = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after expression")?;

        Ok(Expr::DefVar {
            name,
            initializer: Box::new(initializer),
        })
    }

    fn fun_def(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before function definition")?;
        self.consume(TokenType::Defun, "Expect 'defun' after '('")?;

        let name = self.consume(TokenType::Identifier, "Expect function name after 'defun'")?;
        let params = self.params()?;
        let body = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after function body")?;

        Ok(Expr::DefFun {
            name,
            params,
            body: Box::new(body),
        })
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenType::Quote) {
            return self.list_literal();
        }

        if self.check(TokenType::LeftParen) {
            if self.check_n(TokenType::If, 1) {
                return self.if_expr();
            }
            if self.check_n(TokenType::Let, 1) {
                return self.let_expr();
            }
            if self.check_n(TokenType::Lambda, 1) {
                return self.lambda_expr();
            }
            if self.check_n(TokenType::Identifier, 1) {
                return self.call();
            }
        }

        self.primary()
    }

    fn if_expr(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before 'if'")?;
        self.consume(TokenType::If, "Expect 'if' after '('")?;

        let condition = self.expression()?;
        let then_branch = self.expression()?;
        let else_branch = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after else branch")?;

        Ok(Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn let_expr(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before 'let'")?;
        self.consume(TokenType::Let, "Expect 'let' after '('")?;
        self.consume(TokenType::LeftParen, "Expect '(' before let bindings")?;

        let mut names = Vec::new();
        let mut values = Vec::new();

        while !self.check(TokenType::RightParen) {
            names.push(self.consume(TokenType::Identifier, "Expect identifier in let binding")?);
            values.push(self.expression()?);
        }

        self.consume(TokenType::RightParen, "Expect ')' after let bindings")?;

        let body = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after let body")?;

        Ok(Expr::Let {
            names,
            values,
            body: Box::new(body),
        })
    }

    fn lambda_expr(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before 'lambda'")?;
        self.consume(TokenType::Lambda, "Expect 'lambda' after '('")?;

        let params = self.params()?;
        let body = self.expression()?;

        self.consume(TokenType::RightParen, "Expect ')' after lambda body")?;

        Ok(Expr::Lambda {
            params,
            body: Box::new(body),
        })
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before function call")?;

        let name = self.consume(TokenType::Identifier, "Expect function name in call")?;

        let mut args = Vec::new();
        while !self.check(TokenType::RightParen) && !self.is_at_end() {
            args.push(self.expression()?);
        }

        self.consume(TokenType::RightParen, "Expect ')' after arguments")?;

        Ok(Expr::Call { name, args })
    }

    fn list_literal(&mut self) -> Result<Expr, ParseError> {
        self.consume(TokenType::Quote, "Expect ' before list literal")?;
        self.consume(TokenType::LeftParen, "Expect '(' after '")?;

        let mut elements = Vec::new();
        while !self.check(TokenType::RightParen) && !self.is_at_end() {
            elements.push(self.expression()?);
        }

        self.consume(TokenType::RightParen, "Expect ')' after list elements")?;

        Ok(Expr::ListLiteral { elements })
    }

    /// A parenthesized, possibly empty sequence of identifiers.
    fn params(&mut self) -> Result<Vec<Token>, ParseError> {
        self.consume(TokenType::LeftParen, "Expect '(' before parameter list")?;

        let mut params = Vec::new();
        while self.check(TokenType::Identifier) {
            params.push(self.advance());
        }

        self.consume(TokenType::RightParen, "Expect ')' after parameter list")?;

        Ok(params)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();

        match token.kind {
            TokenType::False => {
                self.curr += 1;
                Ok(Expr::Literal(Value::Bool(false)))
            }
            TokenType::True => {
                self.curr += 1;
                Ok(Expr::Literal(Value::Bool(true)))
            }
            TokenType::Nil => {
                self.curr += 1;
                Ok(Expr::Literal(Value::Nil))
            }
            TokenType::Str => {
                self.curr += 1;
                match token.literal {
                    Some(Literal::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
                    _ => Err(ParseError::new(token.line, "String token without value")),
                }
            }
            TokenType::Number => {
                self.curr += 1;
                match token.literal {
                    Some(Literal::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
                    _ => Err(ParseError::new(token.line, "Number token without value")),
                }
            }
            TokenType::Identifier => {
                self.curr += 1;
                Ok(Expr::Var { name: token })
            }
            _ => Err(ParseError::new(token.line, "Expression expected.")),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.curr]
    }

    fn peek_n(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.curr + n)
    }

    fn check(&self, kind: TokenType) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn check_n(&self, kind: TokenType, n: usize) -> bool {
        self.peek_n(n).is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.curr += 1;
        token
    }

    fn consume(&mut self, kind: TokenType, msg: &str) -> Result<Token, ParseError> {
        if !self.check(kind) {
            return Err(ParseError::new(self.peek().line, msg));
        }

        Ok(self.advance())
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenType::Eof
    }
}
