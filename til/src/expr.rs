//! Arithmetic Expressions
//!
//! The body of a `$( )` substitution is first tried as an integer expression:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/' | '%') factor)*
//! factor := INTEGER | '$' IDENT | '$(' ... ')' | '(' expr ')' | ('-' | '+') factor
//! ```
//!
//! Operators of equal precedence associate to the left.  `/` truncates toward zero and
//! `%` takes the sign of the dividend; both fail with `DivideByZero` on a zero divisor.
//! All arithmetic is checked, and overflow is an `Overflow` error.
//!
//! Parsing and evaluation are separate steps.  [`parse`] never looks at variables, so a
//! syntax error is always reported before anything is evaluated; this lets the
//! substitution engine fall back to command evaluation without side effects.  `$name`
//! operands are resolved when the expression is evaluated, in the scope of the
//! enclosing statement, and must hold integers (or Text that parses as one).

use crate::interp::Interp;
use crate::parser::{is_varname_char, split_group};
use crate::til_err;
use crate::types::*;
use std::fmt;

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn from_char(ch: char) -> Option<BinOp> {
        match ch {
            '+' => Some(BinOp::Add),
            '-' => Some(BinOp::Sub),
            '*' => Some(BinOp::Mul),
            '/' => Some(BinOp::Div),
            '%' => Some(BinOp::Rem),
            _ => None,
        }
    }

    /// Applies the operator.
    pub fn apply(self, a: TilInt, b: TilInt) -> Result<TilInt, Exception> {
        let result = match self {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div | BinOp::Rem if b == 0 => {
                return til_err!(ErrorCode::DivideByZero, "divide by zero");
            }
            BinOp::Div => a.checked_div(b),
            BinOp::Rem => a.checked_rem(b),
        };

        result.ok_or_else(|| overflow(a, self, b))
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        };
        f.write_str(op)
    }
}

fn overflow(a: TilInt, op: BinOp, b: TilInt) -> Exception {
    Exception::new(
        ErrorCode::Overflow,
        format!("integer overflow in \"{} {} {}\"", a, op, b),
    )
}

/// A parsed expression.
///
/// Runs of operators at the same precedence are kept flat in a `Chain`, so the tree
/// only grows deeper through parentheses and unary operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An integer literal.
    Int(TilInt),

    /// A `$name` reference.
    Var(String),

    /// A nested `$( )` substitution, holding the text between the parentheses.
    Subst(String),

    /// Unary minus.
    Neg(Box<Expr>),

    /// An operand followed by operator/operand pairs of equal precedence.
    Chain(Box<Expr>, Vec<(BinOp, Expr)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Int(TilInt),
    Var(&'a str),
    Subst(&'a str),
    Op(char),
    Open,
    Close,
}

/// Parses an expression.  Parentheses and unary operators may nest at most `max_depth`
/// levels deep; deeper nesting is a `RecursionLimit` error.
///
/// ```
/// use til::expr::{parse, BinOp, Expr};
///
/// let expr = parse("$a + $b", 100).unwrap();
/// assert_eq!(
///     expr,
///     Expr::Chain(
///         Box::new(Expr::Var("a".into())),
///         vec![(BinOp::Add, Expr::Var("b".into()))],
///     )
/// );
///
/// assert!(parse("2 +", 100).is_err());
/// ```
pub fn parse(input: &str, max_depth: usize) -> Result<Expr, Exception> {
    let tokens = lex(input)?;

    if tokens.is_empty() {
        return Err(Exception::parse("empty expression"));
    }

    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };

    let expr = parser.expr()?;

    match parser.peek() {
        None => Ok(expr),
        Some(Token::Close) => Err(Exception::parse("unbalanced close-paren in expression")),
        Some(token) => Err(unexpected(token)),
    }
}

/// Evaluates a parsed expression in the given scope.
pub(crate) fn eval(interp: &mut Interp, scope: ScopeId, expr: &Expr) -> Result<TilInt, Exception> {
    match expr {
        Expr::Int(n) => Ok(*n),
        Expr::Var(name) => interp.get_integer(scope, name),
        Expr::Subst(text) => {
            let value = interp.eval_group(scope, text)?;
            value.as_int().map_err(|_| {
                Exception::new(
                    ErrorCode::TypeMismatch,
                    format!("expected integer but got \"{}\" from \"$({})\"", value, text),
                )
            })
        }
        Expr::Neg(operand) => {
            let n = eval(interp, scope, operand)?;
            n.checked_neg().ok_or_else(|| {
                Exception::new(ErrorCode::Overflow, format!("integer overflow in \"-{}\"", n))
            })
        }
        Expr::Chain(first, rest) => {
            let mut acc = eval(interp, scope, first)?;
            for (op, operand) in rest {
                let rhs = eval(interp, scope, operand)?;
                acc = op.apply(acc, rhs)?;
            }
            Ok(acc)
        }
    }
}

fn unexpected(token: &Token) -> Exception {
    let what = match token {
        Token::Int(n) => n.to_string(),
        Token::Var(name) => format!("${}", name),
        Token::Subst(text) => format!("$({})", text),
        Token::Op(ch) => ch.to_string(),
        Token::Open => "(".into(),
        Token::Close => ")".into(),
    };

    Exception::parse(format!("unexpected \"{}\" in expression", what))
}

fn lex(input: &str) -> Result<Vec<Token<'_>>, Exception> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        if ch.is_whitespace() {
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        // Line continuations are whitespace too.
        if rest.starts_with("\\\n") {
            rest = &rest[2..];
            continue;
        }

        if ch.is_ascii_digit() {
            let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let (digits, after) = rest.split_at(end);

            if after.starts_with(is_varname_char) {
                return til_err!(
                    ErrorCode::Parse,
                    "invalid integer \"{}\" in expression",
                    &rest[..end + after.find(|c: char| !is_varname_char(c)).unwrap_or(after.len())]
                );
            }

            let n = digits.parse::<TilInt>().map_err(|_| {
                Exception::parse(format!("integer value too large \"{}\"", digits))
            })?;

            tokens.push(Token::Int(n));
            rest = after;
            continue;
        }

        rest = &rest[ch.len_utf8()..];

        match ch {
            '$' if rest.starts_with('(') => {
                let (text, after) = split_group(rest)?;
                tokens.push(Token::Subst(text));
                rest = after;
            }
            '$' => {
                let end = rest.find(|c: char| !is_varname_char(c)).unwrap_or(rest.len());
                if end == 0 {
                    return Err(Exception::parse("missing variable name after \"$\""));
                }
                tokens.push(Token::Var(&rest[..end]));
                rest = &rest[end..];
            }
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            _ if BinOp::from_char(ch).is_some() => tokens.push(Token::Op(ch)),
            _ => {
                return til_err!(ErrorCode::Parse, "unexpected character \"{}\" in expression", ch);
            }
        }
    }

    Ok(tokens)
}

struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t, 'a> ExprParser<'t, 'a> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // Consumes the next token if it's one of the given operators.
    fn next_op(&mut self, ops: &[char]) -> Option<BinOp> {
        match self.peek() {
            Some(Token::Op(ch)) if ops.contains(ch) => {
                self.pos += 1;
                BinOp::from_char(*ch)
            }
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<Expr, Exception> {
        let first = self.term()?;
        let mut rest = Vec::new();

        while let Some(op) = self.next_op(&['+', '-']) {
            rest.push((op, self.term()?));
        }

        Ok(chain(first, rest))
    }

    fn term(&mut self) -> Result<Expr, Exception> {
        let first = self.factor()?;
        let mut rest = Vec::new();

        while let Some(op) = self.next_op(&['*', '/', '%']) {
            rest.push((op, self.factor()?));
        }

        Ok(chain(first, rest))
    }

    fn factor(&mut self) -> Result<Expr, Exception> {
        match self.next() {
            None => Err(Exception::parse("unexpected end of expression")),
            Some(Token::Int(n)) => Ok(Expr::Int(*n)),
            Some(Token::Var(name)) => Ok(Expr::Var(name.to_string())),
            Some(Token::Subst(text)) => Ok(Expr::Subst(text.to_string())),
            Some(Token::Op('-')) => {
                self.descend()?;
                let operand = self.factor()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(operand)))
            }
            Some(Token::Op('+')) => {
                self.descend()?;
                let operand = self.factor()?;
                self.depth -= 1;
                Ok(operand)
            }
            Some(Token::Open) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;

                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    None => Err(Exception::parse("missing close-paren in expression")),
                    Some(token) => Err(unexpected(token)),
                }
            }
            Some(token) => Err(unexpected(token)),
        }
    }

    fn descend(&mut self) -> Result<(), Exception> {
        self.depth += 1;
        if self.depth > self.max_depth {
            til_err!(
                ErrorCode::RecursionLimit,
                "expression nested too deeply (more than {} levels)",
                self.max_depth
            )
        } else {
            Ok(())
        }
    }
}

fn chain(first: Expr, rest: Vec<(BinOp, Expr)>) -> Expr {
    if rest.is_empty() {
        first
    } else {
        Expr::Chain(Box::new(first), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(text: &str) -> Result<TilInt, Exception> {
        let mut interp = Interp::new();
        let scope = interp.create_scope("test", None);
        let expr = parse(text, 100)?;
        eval(&mut interp, scope, &expr)
    }

    fn code(result: Result<TilInt, Exception>) -> ErrorCode {
        result.unwrap_err().code()
    }

    #[test]
    fn test_literals() {
        assert_eq!(calc("7"), Ok(7));
        assert_eq!(calc("  42  "), Ok(42));
        assert_eq!(calc("007"), Ok(7));
    }

    #[test]
    fn test_precedence() {
        assert_eq!(calc("2 + 3 * 4"), Ok(14));
        assert_eq!(calc("(2 + 3) * 4"), Ok(20));
        assert_eq!(calc("2*3+4*5"), Ok(26));
        assert_eq!(calc("10 - 4 - 3"), Ok(3));
        assert_eq!(calc("100 / 10 / 5"), Ok(2));
        assert_eq!(calc("2 * (3 + (4 - 1)) % 5"), Ok(2));
    }

    #[test]
    fn test_division() {
        assert_eq!(calc("7 / 2"), Ok(3));
        assert_eq!(calc("-7 / 2"), Ok(-3));
        assert_eq!(calc("7 % 3"), Ok(1));
        assert_eq!(calc("-7 % 3"), Ok(-1));
        assert_eq!(code(calc("1 / 0")), ErrorCode::DivideByZero);
        assert_eq!(code(calc("1 % (2 - 2)")), ErrorCode::DivideByZero);
    }

    #[test]
    fn test_unary() {
        assert_eq!(calc("-5"), Ok(-5));
        assert_eq!(calc("--5"), Ok(5));
        assert_eq!(calc("+5"), Ok(5));
        assert_eq!(calc("3 - -2"), Ok(5));
        assert_eq!(calc("-(2 + 3) * 2"), Ok(-10));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(code(calc("9223372036854775807 + 1")), ErrorCode::Overflow);
        assert_eq!(code(calc("(-9223372036854775807 - 1) / -1")), ErrorCode::Overflow);
        assert_eq!(code(calc("-(-9223372036854775807 - 1)")), ErrorCode::Overflow);
        assert_eq!(code(calc("99999999999999999999")), ErrorCode::Parse);
    }

    #[test]
    fn test_parse_errors() {
        for bad in &["", "   ", "2 +", "(2 + 3", "2 + 3)", "2 3", "2 ^ 3", "$", "$ a", "2a", "*2", "()"] {
            let err = parse(bad, 100).unwrap_err();
            assert_eq!(err.code(), ErrorCode::Parse, "input: {:?}", bad);
        }

        assert_eq!(parse("", 100).unwrap_err().message(), "empty expression");
        assert_eq!(
            parse("2 + 3)", 100).unwrap_err().message(),
            "unbalanced close-paren in expression"
        );
        assert_eq!(
            parse("(2 + 3", 100).unwrap_err().message(),
            "missing close-paren in expression"
        );
        assert_eq!(parse("2 3", 100).unwrap_err().message(), "unexpected \"3\" in expression");
    }

    #[test]
    fn test_depth_limit() {
        assert!(parse("((((1))))", 4).is_ok());
        assert_eq!(
            parse("(((((1)))))", 4).unwrap_err().code(),
            ErrorCode::RecursionLimit
        );
        assert_eq!(parse("-----1", 4).unwrap_err().code(), ErrorCode::RecursionLimit);

        // Long flat chains don't count toward the depth.
        let long = vec!["1"; 1000].join(" + ");
        assert_eq!(calc(&long), Ok(1000));
    }

    #[test]
    fn test_variables() {
        let mut interp = Interp::new();
        let scope = interp.create_scope("test", None);
        interp.set_var(scope, "a", Value::from(6));
        interp.set_var(scope, "b", Value::from(" 7 "));
        interp.set_var(scope, "c", Value::from("seven"));

        let mut calc = |text: &str| -> Result<TilInt, Exception> {
            let expr = parse(text, 100)?;
            eval(&mut interp, scope, &expr)
        };

        assert_eq!(calc("$a * $b"), Ok(42));
        assert_eq!(calc("-$a"), Ok(-6));
        assert_eq!(code(calc("$a + $c")), ErrorCode::TypeMismatch);
        assert_eq!(code(calc("$a + $nope")), ErrorCode::UndefinedVariable);
    }

    #[test]
    fn test_parse_is_side_effect_free() {
        // A syntax error is reported even though the first operand is undefined.
        assert_eq!(parse("$nope +", 100).unwrap_err().code(), ErrorCode::Parse);
    }

    #[test]
    fn test_nested_substitution() {
        assert_eq!(calc("$(2 * 3) + 1"), Ok(7));
        assert_eq!(calc("$($(1 + 1) * 2) * 2"), Ok(8));
    }
}
