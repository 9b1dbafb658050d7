//! Scalar expressions typed as text, e.g. `x^3 - 2*x - 5` or `-x + sin(t)`.
//!
//! Source is parsed into an [`Expr`] tree and compiled into bytecode for a
//! small stack machine. Supported syntax: `+ - * / ^` (`^` is right
//! associative and binds tighter than unary minus), parentheses, numeric
//! literals with optional exponent, the constants `pi` and `e`, and the
//! functions `sin cos tan exp ln sqrt abs`.

use crate::traits::{constant, OdeFunction, Scalar, ScalarFunction};
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("expected ')'")]
    MissingParen,
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn apply<T: Scalar>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
    Abs,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "exp" => Function::Exp,
            "ln" => Function::Ln,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            _ => return None,
        })
    }

    fn apply<T: Scalar>(self, a: T) -> T {
        match self {
            Function::Sin => a.sin(),
            Function::Cos => a.cos(),
            Function::Tan => a.tan(),
            Function::Exp => a.exp(),
            Function::Ln => a.ln(),
            Function::Sqrt => a.sqrt(),
            Function::Abs => a.abs(),
        }
    }
}

/// Parsed expression tree. Names are not resolved until compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Name(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum OpCode {
    Const(f64),
    Var(usize),
    Neg,
    Binary(BinaryOp),
    Call(Function),
}

// --- Tokenizer ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("'{n}'"),
        Token::Ident(name) => format!("'{name}'"),
        Token::Op(c) => format!("'{c}'"),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            // Exponent only if digits follow, so `2*e` still reads the constant.
            if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
                let mut look = pos + 1;
                if look < chars.len() && (chars[look] == '+' || chars[look] == '-') {
                    look += 1;
                }
                if look < chars.len() && chars[look].is_ascii_digit() {
                    pos = look;
                    while pos < chars.len() && chars[pos].is_ascii_digit() {
                        pos += 1;
                    }
                }
            }
            let literal: String = chars[start..pos].iter().collect();
            let value = literal
                .parse()
                .map_err(|_| ExpressionError::InvalidNumber(literal.clone()))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
        } else {
            let token = match c {
                '+' | '-' | '*' | '/' | '^' => Token::Op(c),
                '(' => Token::LParen,
                ')' => Token::RParen,
                _ => return Err(ExpressionError::UnexpectedCharacter(c, pos)),
            };
            tokens.push(token);
            pos += 1;
        }
    }
    Ok(tokens)
}

// --- Parser ---

/// Parses `input` into an expression tree.
pub fn parse(input: &str) -> Result<Expr, ExpressionError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
    };
    let expr = parser.parse_sum()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExpressionError::UnexpectedToken(describe(token))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_op(&self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(c) => Some(*c),
            _ => None,
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_product()?;
        while let Some(c) = self.peek_op(&['+', '-']) {
            self.pos += 1;
            let right = self.parse_product()?;
            let op = if c == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_product(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;
        while let Some(c) = self.peek_op(&['*', '/']) {
            self.pos += 1;
            let right = self.parse_unary()?;
            let op = if c == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek_op(&['-']).is_some() {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        if self.peek_op(&['+']).is_some() {
            self.pos += 1;
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.parse_primary()?;
        if self.peek_op(&['^']).is_some() {
            self.pos += 1;
            // Right associative; the exponent may carry its own sign.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let arg = self.parse_sum()?;
                    self.expect_close()?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_sum()?;
                self.expect_close()?;
                Ok(expr)
            }
            Some(token) => Err(ExpressionError::UnexpectedToken(describe(&token))),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn expect_close(&mut self) -> Result<(), ExpressionError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            _ => Err(ExpressionError::MissingParen),
        }
    }
}

// --- Compiler ---

struct Compiler<'a> {
    variables: &'a [String],
    ops: Vec<OpCode>,
    depth: usize,
    max_depth: usize,
}

impl Compiler<'_> {
    fn push(&mut self, op: OpCode) {
        match op {
            OpCode::Const(_) | OpCode::Var(_) => self.depth += 1,
            OpCode::Binary(_) => self.depth -= 1,
            OpCode::Neg | OpCode::Call(_) => {}
        }
        self.max_depth = self.max_depth.max(self.depth);
        self.ops.push(op);
    }

    fn compile(&mut self, expr: &Expr) -> Result<(), ExpressionError> {
        match expr {
            Expr::Number(n) => self.push(OpCode::Const(*n)),
            Expr::Name(name) => {
                // Variables shadow the built-in constants.
                let op = match self.variables.iter().position(|v| v == name) {
                    Some(index) => OpCode::Var(index),
                    None => match name.as_str() {
                        "pi" => OpCode::Const(std::f64::consts::PI),
                        "e" => OpCode::Const(std::f64::consts::E),
                        _ => return Err(ExpressionError::UnknownVariable(name.clone())),
                    },
                };
                self.push(op);
            }
            Expr::Neg(inner) => {
                self.compile(inner)?;
                self.push(OpCode::Neg);
            }
            Expr::Binary(op, left, right) => {
                self.compile(left)?;
                self.compile(right)?;
                self.push(OpCode::Binary(*op));
            }
            Expr::Call(name, arg) => {
                let function = Function::lookup(name)
                    .ok_or_else(|| ExpressionError::UnknownFunction(name.clone()))?;
                self.compile(arg)?;
                self.push(OpCode::Call(function));
            }
        }
        Ok(())
    }
}

/// A compiled expression over an ordered list of variables.
///
/// Evaluation reuses an internal scratch stack, which makes the type `!Sync`.
#[derive(Debug, Clone)]
pub struct Expression<T: Scalar = f64> {
    source: String,
    variables: Vec<String>,
    ops: Vec<OpCode>,
    stack: RefCell<Vec<T>>,
}

impl<T: Scalar> Expression<T> {
    /// Compiles `source`; `variables[i]` is bound to `values[i]` at evaluation.
    pub fn compile(source: &str, variables: &[&str]) -> Result<Self, ExpressionError> {
        let parsed = parse(source)?;
        let variables: Vec<String> = variables.iter().map(|v| v.to_string()).collect();
        let mut compiler = Compiler {
            variables: &variables,
            ops: Vec::new(),
            depth: 0,
            max_depth: 0,
        };
        compiler.compile(&parsed)?;
        let Compiler { ops, max_depth, .. } = compiler;

        Ok(Self {
            source: source.to_string(),
            variables,
            ops,
            stack: RefCell::new(Vec::with_capacity(max_depth)),
        })
    }

    /// A function of one variable, usable with the root finder.
    pub fn univariate(source: &str, variable: &str) -> Result<Self, ExpressionError> {
        Self::compile(source, &[variable])
    }

    /// An ODE right-hand side in `state` and `time`, usable with the integrators.
    pub fn ode(source: &str, state: &str, time: &str) -> Result<Self, ExpressionError> {
        Self::compile(source, &[state, time])
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluates with `values` bound positionally; missing values read as NaN.
    pub fn evaluate(&self, values: &[T]) -> T {
        let mut stack = self.stack.borrow_mut();
        stack.clear();

        for op in &self.ops {
            let value = match *op {
                OpCode::Const(c) => constant(c),
                OpCode::Var(index) => values.get(index).copied().unwrap_or_else(T::nan),
                OpCode::Neg => -pop(&mut stack),
                OpCode::Call(function) => function.apply(pop(&mut stack)),
                OpCode::Binary(op) => {
                    let b = pop(&mut stack);
                    let a = pop(&mut stack);
                    op.apply(a, b)
                }
            };
            stack.push(value);
        }

        pop(&mut stack)
    }
}

// Compiled code is balanced, so the stack never underflows.
fn pop<T: Scalar>(stack: &mut Vec<T>) -> T {
    stack.pop().unwrap_or_else(T::nan)
}

impl<T: Scalar> ScalarFunction<T> for Expression<T> {
    fn eval(&self, x: T) -> T {
        self.evaluate(&[x])
    }
}

impl<T: Scalar> OdeFunction<T> for Expression<T> {
    fn derivative(&self, x: T, t: T) -> T {
        self.evaluate(&[x, t])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bisection::find_root;
    use crate::integrate::solve;

    fn value(source: &str) -> f64 {
        Expression::<f64>::compile(source, &[])
            .expect("expression should compile")
            .evaluate(&[])
    }

    #[test]
    fn respects_precedence_and_associativity() {
        assert_eq!(value("1 + 2 * 3"), 7.0);
        assert_eq!(value("(1 + 2) * 3"), 9.0);
        assert_eq!(value("8 / 4 / 2"), 1.0);
        assert_eq!(value("10 - 4 - 3"), 3.0);
        assert_eq!(value("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(value("-2 ^ 2"), -4.0);
        assert_eq!(value("2 ^ -1"), 0.5);
    }

    #[test]
    fn evaluates_functions_and_constants() {
        assert_eq!(
            value("sin(0) + cos(0) + exp(0) + ln(1) + sqrt(4) + abs(-3)"),
            7.0
        );
        assert!((value("tan(pi / 4)") - 1.0).abs() < 1e-12);
        assert!((value("ln(e)") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reads_scientific_literals() {
        assert!((value("1e-3 * 1000") - 1.0).abs() < 1e-12);
        assert_eq!(value("2.5E2"), 250.0);
        assert!((value("2*e") - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn binds_variables_by_position() {
        let expr = Expression::<f64>::ode("-x + t", "x", "t").expect("should compile");
        assert_eq!(expr.evaluate(&[2.0, 5.0]), 3.0);
        assert_eq!(expr.derivative(1.0, 1.0), 0.0);
        assert_eq!(expr.variables(), &["x".to_string(), "t".to_string()]);
        assert_eq!(expr.source(), "-x + t");
    }

    #[test]
    fn variables_shadow_constants() {
        let expr = Expression::<f64>::univariate("e + 1", "e").expect("should compile");
        assert_eq!(expr.eval(1.0), 2.0);
    }

    #[test]
    fn missing_values_evaluate_to_nan() {
        let expr = Expression::<f64>::ode("x + t", "x", "t").expect("should compile");
        assert!(expr.evaluate(&[1.0]).is_nan());
    }

    #[test]
    fn reports_parse_and_compile_errors() {
        let err = |source: &str| {
            Expression::<f64>::univariate(source, "x").expect_err("should fail to compile")
        };
        assert_eq!(err("y + 1"), ExpressionError::UnknownVariable("y".to_string()));
        assert_eq!(err("foo(x)"), ExpressionError::UnknownFunction("foo".to_string()));
        assert_eq!(err("(x + 1"), ExpressionError::MissingParen);
        assert_eq!(err("x +"), ExpressionError::UnexpectedEnd);
        assert_eq!(err("x $ 1"), ExpressionError::UnexpectedCharacter('$', 2));
        assert_eq!(err("x )"), ExpressionError::UnexpectedToken("')'".to_string()));
        assert_eq!(err("1.2.3"), ExpressionError::InvalidNumber("1.2.3".to_string()));
    }

    #[test]
    fn drives_the_root_finder() {
        let f = Expression::<f64>::univariate("x^3 - 2*x - 5", "x").expect("should compile");
        let root = find_root(&f, (2.0, 3.0), 1e-12, false).expect("root should be bracketed");
        assert!((root - 2.094_551_481_542_326_5).abs() < 1e-10);
    }

    #[test]
    fn drives_the_integrator() {
        let f = Expression::<f64>::ode("x", "x", "t").expect("should compile");
        let trajectory = solve(&f, 1.0, (0.0, 1.0), 20, 4).expect("integration should run");
        let terminal = trajectory.terminal();
        assert!((terminal.x - 1.0_f64.exp()).abs() < 1e-6);
    }
}
