//! Word Substitution
//!
//! Resolves the `$name` and `$( )` markup in the words of a statement, producing the
//! [`Value`]s the command is invoked with.
//!
//! * A quoted word is used as-is, as Text.
//! * In a bare word, `$name` is replaced by the variable's value and `$( ... )` by the
//!   value of the group, both looked up or evaluated in the statement's scope.
//!   `\c` yields `c`, and a `$` that starts neither form is kept literally.
//! * A word that consists of exactly one substitution yields that value unchanged, so
//!   an Integer stays an Integer.  Anything else is concatenated into Text.
//!
//! The body of a group is evaluated as an arithmetic expression if it parses as one.
//! Otherwise, if it parses as a script whose first word doesn't read as the start of an
//! expression, it is evaluated as a nested script and the group yields the value of its
//! last statement.  Nested evaluation counts against
//! the interpreter's recursion limit.

use crate::expr;
use crate::interp::Interp;
use crate::parser::{is_varname_char, split_group, Word};
#[cfg(feature = "command-subst")]
use crate::parser::{self, Script};
use crate::types::*;

/// The pieces of a word, as they are resolved.
enum Piece {
    Literal(String),
    Subst(Value),
}

impl Interp {
    /// Substitutes each of a statement's words, in order.  The first error stops
    /// substitution.
    pub(crate) fn subst_words(&mut self, scope: ScopeId, words: &[Word]) -> Result<Vec<Value>, Exception> {
        words.iter().map(|word| self.subst_word(scope, word)).collect()
    }

    /// Substitutes a single word.
    pub(crate) fn subst_word(&mut self, scope: ScopeId, word: &Word) -> TilResult {
        match word {
            Word::Quoted(text) => Ok(Value::from(text)),
            Word::Bare(text) => self.subst_bare(scope, text),
        }
    }

    fn subst_bare(&mut self, scope: ScopeId, text: &str) -> TilResult {
        let mut pieces: Vec<Piece> = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(ch) = rest.chars().next() {
            rest = &rest[ch.len_utf8()..];

            match ch {
                '\\' => match rest.chars().next() {
                    Some(escaped) => {
                        literal.push(escaped);
                        rest = &rest[escaped.len_utf8()..];
                    }
                    None => literal.push('\\'),
                },
                '$' if rest.starts_with('(') => {
                    let (group, after) = split_group(rest)?;
                    flush(&mut pieces, &mut literal);
                    pieces.push(Piece::Subst(self.eval_group(scope, group)?));
                    rest = after;
                }
                '$' if rest.starts_with(is_varname_char) => {
                    let end = rest
                        .find(|c: char| !is_varname_char(c))
                        .unwrap_or(rest.len());
                    let name = &rest[..end];
                    tracing::trace!(name, "variable substitution");
                    flush(&mut pieces, &mut literal);
                    pieces.push(Piece::Subst(self.var(scope, name)?));
                    rest = &rest[end..];
                }
                _ => literal.push(ch),
            }
        }

        flush(&mut pieces, &mut literal);

        if pieces.len() == 1 && matches!(pieces[0], Piece::Subst(_)) {
            if let Some(Piece::Subst(value)) = pieces.pop() {
                return Ok(value);
            }
        }

        let mut result = String::new();
        for piece in &pieces {
            match piece {
                Piece::Literal(s) => result.push_str(s),
                Piece::Subst(value) => result.push_str(&value.as_str()),
            }
        }

        Ok(Value::from(result))
    }

    /// Evaluates the body of a `$( )` group in the given scope.
    pub(crate) fn eval_group(&mut self, scope: ScopeId, text: &str) -> TilResult {
        self.enter()?;
        let result = self.eval_group_body(scope, text);
        self.leave();
        result
    }

    fn eval_group_body(&mut self, scope: ScopeId, text: &str) -> TilResult {
        match expr::parse(text, self.recursion_limit()) {
            Ok(ast) => {
                tracing::trace!(text, "arithmetic substitution");
                Ok(Value::from(expr::eval(self, scope, &ast)?))
            }
            Err(err) if err.code() == ErrorCode::Parse => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "command-subst")] {
                        self.eval_command_group(scope, text, err)
                    } else {
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    // Evaluates a group body that isn't arithmetic as a nested script, if it reads as
    // one.  Otherwise the arithmetic error stands.
    #[cfg(feature = "command-subst")]
    fn eval_command_group(&mut self, scope: ScopeId, text: &str, arith_err: Exception) -> TilResult {
        match parser::parse(text) {
            Ok(script) if looks_like_command(&script) => {
                tracing::trace!(text, "command substitution");
                self.eval_script(scope, &script)
            }
            Ok(_) => Err(arith_err),
            Err(err) if starts_with_name(text) => Err(err),
            Err(_) => Err(arith_err),
        }
    }
}

// Moves any accumulated literal text into the piece list.
fn flush(pieces: &mut Vec<Piece>, literal: &mut String) {
    if !literal.is_empty() {
        pieces.push(Piece::Literal(std::mem::take(literal)));
    }
}

#[cfg(feature = "command-subst")]
fn is_operator(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '%')
}

// A group body is a command unless its first word reads as the start of an
// expression: one beginning with a digit, operator or paren, one ending in an
// operator, or one followed by a lone operator.  `$(1 +)` and `$($a + )` stay
// arithmetic errors, while `$(tick)` and `$($cmd q 7)` run as commands.
#[cfg(feature = "command-subst")]
fn looks_like_command(script: &Script) -> bool {
    let Some(words) = script.statements().first().map(|s| s.words()) else {
        return false;
    };

    let first = match &words[0] {
        Word::Quoted(_) => return true,
        Word::Bare(text) => text.as_str(),
    };

    let starts_expr = first
        .chars()
        .next()
        .map_or(true, |ch| ch.is_ascii_digit() || ch == '(' || is_operator(ch));
    let ends_with_op = first.chars().last().map_or(false, is_operator);
    let op_follows = match words.get(1) {
        Some(Word::Bare(text)) => {
            let mut chars = text.chars();
            chars.next().map_or(false, is_operator) && chars.next().is_none()
        }
        _ => false,
    };

    !(starts_expr || ends_with_op || op_follows)
}

// True if the body begins with a plain command name.
#[cfg(feature = "command-subst")]
fn starts_with_name(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .map_or(false, |ch| ch.is_alphabetic() || ch == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Interp;

    fn setup() -> (Interp, ScopeId) {
        let mut interp = Interp::new();
        let scope = interp.create_scope("test", None);
        interp.set_var(scope, "a", Value::from(1));
        interp.set_var(scope, "b", Value::from(2));
        interp.set_var(scope, "name", Value::from("world"));
        (interp, scope)
    }

    fn subst(interp: &mut Interp, scope: ScopeId, text: &str) -> TilResult {
        interp.subst_word(scope, &Word::Bare(text.into()))
    }

    #[test]
    fn test_literal_words() {
        let (mut interp, scope) = setup();
        assert_eq!(subst(&mut interp, scope, "abc"), Ok(Value::from("abc")));
        assert_eq!(subst(&mut interp, scope, "123"), Ok(Value::from("123")));
        assert_eq!(subst(&mut interp, scope, "a\\$b"), Ok(Value::from("a$b")));
        assert_eq!(subst(&mut interp, scope, "\\$a"), Ok(Value::from("$a")));
        assert_eq!(subst(&mut interp, scope, "cost$"), Ok(Value::from("cost$")));
        assert_eq!(subst(&mut interp, scope, "$-1"), Ok(Value::from("$-1")));
        assert_eq!(subst(&mut interp, scope, "tail\\"), Ok(Value::from("tail\\")));
    }

    #[test]
    fn test_quoted_words_are_literal() {
        let (mut interp, scope) = setup();
        assert_eq!(
            interp.subst_word(scope, &Word::Quoted("$a $(1 + 2)".into())),
            Ok(Value::from("$a $(1 + 2)"))
        );
    }

    #[test]
    fn test_single_substitution_keeps_tag() {
        let (mut interp, scope) = setup();
        assert_eq!(subst(&mut interp, scope, "$a"), Ok(Value::from(1)));
        assert_eq!(subst(&mut interp, scope, "$name"), Ok(Value::from("world")));
        assert_eq!(subst(&mut interp, scope, "$($a + $b)"), Ok(Value::from(3)));
    }

    #[test]
    fn test_mixed_words_are_text() {
        let (mut interp, scope) = setup();
        assert_eq!(subst(&mut interp, scope, "x$a"), Ok(Value::from("x1")));
        assert_eq!(subst(&mut interp, scope, "$a$b"), Ok(Value::from("12")));
        assert_eq!(
            subst(&mut interp, scope, "prefix$a-suffix"),
            Ok(Value::from("prefix1-suffix"))
        );
        assert_eq!(
            subst(&mut interp, scope, "hello,$name!"),
            Ok(Value::from("hello,world!"))
        );
        assert_eq!(subst(&mut interp, scope, "[$($a * 10)]"), Ok(Value::from("[10]")));
    }

    #[test]
    fn test_undefined_variable() {
        let (mut interp, scope) = setup();
        let err = subst(&mut interp, scope, "x$nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UndefinedVariable);

        let err = subst(&mut interp, scope, "$($nope + 1)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UndefinedVariable);
    }

    #[test]
    fn test_arithmetic_errors_do_not_fall_back() {
        let (mut interp, scope) = setup();
        let err = subst(&mut interp, scope, "$(1 / 0)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::DivideByZero);

        let err = subst(&mut interp, scope, "$($name + 1)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeMismatch);

        let err = subst(&mut interp, scope, "$($a + )").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);

        let err = subst(&mut interp, scope, "$()").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);
    }

    #[cfg(feature = "command-subst")]
    #[test]
    fn test_command_substitution() {
        let (mut interp, scope) = setup();
        assert_eq!(subst(&mut interp, scope, "$(set c 5)"), Ok(Value::from("5")));
        assert_eq!(interp.var(scope, "c"), Ok(Value::from("5")));

        // The group yields the value of its last statement.
        assert_eq!(
            subst(&mut interp, scope, "$(set d 1; set e $($d + 1))"),
            Ok(Value::from(2))
        );
        assert_eq!(interp.var(scope, "e"), Ok(Value::from(2)));

        let err = subst(&mut interp, scope, "$(frobnicate 1 2)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownCommand);

        let err = subst(&mut interp, scope, "$(set x \"unterminated)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);
    }

    #[cfg(feature = "command-subst")]
    #[test]
    fn test_command_named_by_variable() {
        let (mut interp, scope) = setup();
        interp.set_var(scope, "cmd", Value::from("set"));

        assert_eq!(subst(&mut interp, scope, "$($cmd q 7)"), Ok(Value::from("7")));
        assert_eq!(interp.var(scope, "q"), Ok(Value::from("7")));

        // Bodies that start like expressions keep the arithmetic error.
        for text in &["$(1 +)", "$($a + )", "$($a+)", "$(* 2)"] {
            let err = subst(&mut interp, scope, text).unwrap_err();
            assert_eq!(err.code(), ErrorCode::Parse, "text: {}", text);
            assert!(err.message().contains("expression"), "text: {}", text);
        }

        // A malformed command reports the command's own parse error.
        let err = subst(&mut interp, scope, "$(set r \"x\"y)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);
        assert_eq!(err.message(), "extra characters after close-quote");
    }

    #[cfg(feature = "command-subst")]
    #[test]
    fn test_quote_mid_word_in_group() {
        let (mut interp, scope) = setup();
        assert_eq!(subst(&mut interp, scope, "$(set s b\"c)"), Ok(Value::from("b\"c")));
        assert_eq!(interp.var(scope, "s"), Ok(Value::from("b\"c")));
    }

    #[cfg(not(feature = "command-subst"))]
    #[test]
    fn test_command_substitution_disabled() {
        let (mut interp, scope) = setup();
        let err = subst(&mut interp, scope, "$(set c 5)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Parse);
    }

    #[test]
    fn test_recursion_limit() {
        let (mut interp, scope) = setup();
        interp.set_recursion_limit(3);

        assert_eq!(subst(&mut interp, scope, "$($(1))"), Ok(Value::from(1)));

        let err = subst(&mut interp, scope, "$($($($(1))))").unwrap_err();
        assert_eq!(err.code(), ErrorCode::RecursionLimit);

        // The level counter unwinds after an error.
        assert_eq!(subst(&mut interp, scope, "$($(2))"), Ok(Value::from(2)));
    }
}
