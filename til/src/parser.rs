//! The Til Parser
//!
//! Splits script source into [`Statement`]s and each statement into [`Word`]s.  Parsing
//! happens before any substitution: the words of a statement are kept as written, and
//! the substitution engine in `subst.rs` resolves `$name` and `$( )` markup when the
//! statement is evaluated.
//!
//! # Syntax
//!
//! * Statements are separated by an unescaped newline or `;`.  Blank statements are
//!   skipped, and a statement beginning with `#` is a comment through end of line.
//! * A backslash immediately before a newline continues the statement on the next
//!   line; the backslash, newline and the next line's leading whitespace count as a
//!   single space.
//! * Words are separated by runs of spaces and tabs.
//! * A word beginning with `"` is quoted.  It extends to the next unescaped `"`, may
//!   contain whitespace, separators and newlines, and is taken literally: no `$`
//!   substitution happens inside it.  The escapes `\"`, `\\`, `\$`, `\n` and `\t` are
//!   recognized; backslash-newline becomes a space; any other `\c` yields `c`.  The
//!   close quote must end the word.
//! * Any other word is bare.  In a bare word, `$(` opens a group that runs to the
//!   matching `)`, counting nested parentheses and skipping over quoted words; the
//!   group is always part of the enclosing word, whatever it contains.
//!
//! An unterminated quote or group is a `Parse` error, flagged as
//! [incomplete](../types/struct.Exception.html#method.is_incomplete) input.

use crate::types::Exception;

/// A parsed script: the statements in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    statements: Vec<Statement>,
}

impl Script {
    /// The script's statements.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns true if the script contains no statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A single statement: the command word followed by its arguments, before substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    line: usize,
    text: String,
    words: Vec<Word>,
}

impl Statement {
    /// The 1-based source line on which the statement begins.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The statement's source text, for error traces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The statement's words; never empty.
    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

/// A single word of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    /// A bare word, as written; may contain `$` markup and backslash escapes.
    Bare(String),

    /// The content of a quoted word, with escapes already processed.
    Quoted(String),
}

impl Word {
    /// The word's text: raw for a bare word, unescaped for a quoted one.
    pub fn text(&self) -> &str {
        match self {
            Word::Bare(s) => s,
            Word::Quoted(s) => s,
        }
    }
}

/// Parses a script into statements.
///
/// ```
/// use til::parser::{parse, Word};
///
/// let script = parse("set a 1\nset b \\\n    \"two words\"").unwrap();
/// assert_eq!(script.statements().len(), 2);
///
/// let words = script.statements()[1].words();
/// assert_eq!(words[2], Word::Quoted("two words".into()));
/// ```
pub fn parse(input: &str) -> Result<Script, Exception> {
    let mut ctx = Tokenizer::new(input);
    let mut statements = Vec::new();

    loop {
        ctx.skip_statement_separators();

        if ctx.at_end() {
            break;
        }

        if ctx.is('#') {
            ctx.skip_comment();
            continue;
        }

        let statement = parse_statement(&mut ctx)?;

        if !statement.words.is_empty() {
            statements.push(statement);
        }
    }

    Ok(Script { statements })
}

/// Splits the text of a single statement into words.  Fails if the text holds more
/// than one statement.
///
/// ```
/// use til::parser::{tokenize, Word};
///
/// let words = tokenize("set result $($a + $b)").unwrap();
/// assert_eq!(words, vec![
///     Word::Bare("set".into()),
///     Word::Bare("result".into()),
///     Word::Bare("$($a + $b)".into()),
/// ]);
/// ```
pub fn tokenize(input: &str) -> Result<Vec<Word>, Exception> {
    let script = parse(input)?;

    match script.statements.len() {
        0 => Ok(Vec::new()),
        1 => Ok(script.statements.into_iter().next().map(|s| s.words).unwrap_or_default()),
        _ => Err(Exception::parse("expected a single statement")),
    }
}

/// Returns true if the character may appear in a variable name.
pub fn is_varname_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Given text beginning with `(`, returns the interior of the balanced group and the
/// text following its close paren.  Groups are scanned as in bare words.
pub(crate) fn split_group(input: &str) -> Result<(&str, &str), Exception> {
    debug_assert!(input.starts_with('('));

    let mut ctx = Tokenizer::new(input);
    let mut group = String::new();
    parse_group(&mut ctx, &mut group)?;

    Ok((&input[1..ctx.index - 1], &input[ctx.index..]))
}

/// Returns true if the script ends in a line continuation, i.e., an odd number
/// of trailing backslashes.
pub(crate) fn ends_with_continuation(input: &str) -> bool {
    let trailing = input
        .trim_end_matches(['\r', '\n'])
        .chars()
        .rev()
        .take_while(|c| *c == '\\')
        .count();

    trailing % 2 == 1
}

fn parse_statement(ctx: &mut Tokenizer) -> Result<Statement, Exception> {
    let line = ctx.line;
    let start = ctx.index;
    let mut words = Vec::new();

    loop {
        ctx.skip_word_separators();

        match ctx.peek() {
            None | Some('\n') | Some(';') => break,
            Some('"') => words.push(Word::Quoted(parse_quoted_word(ctx)?)),
            Some(_) => words.push(Word::Bare(parse_bare_word(ctx)?)),
        }
    }

    let text = ctx.input[start..ctx.index].trim().to_string();

    Ok(Statement { line, text, words })
}

fn parse_quoted_word(ctx: &mut Tokenizer) -> Result<String, Exception> {
    ctx.skip_char('"');
    let mut word = String::new();

    loop {
        match ctx.next() {
            None => return Err(Exception::incomplete("missing \"")),
            Some('"') => break,
            Some('\\') => match ctx.next() {
                None => return Err(Exception::incomplete("missing \"")),
                Some('\n') => {
                    ctx.skip_inline_space();
                    word.push(' ');
                }
                Some('n') => word.push('\n'),
                Some('t') => word.push('\t'),
                Some(c) => word.push(c),
            },
            Some(c) => word.push(c),
        }
    }

    // The close quote must end the word.
    if ctx.at_word_end() {
        Ok(word)
    } else {
        Err(Exception::parse("extra characters after close-quote"))
    }
}

fn parse_bare_word(ctx: &mut Tokenizer) -> Result<String, Exception> {
    let mut word = String::new();

    while !ctx.at_word_end() {
        match ctx.next() {
            Some('\\') => {
                word.push('\\');
                if let Some(c) = ctx.next() {
                    word.push(c);
                }
            }
            Some('$') if ctx.is('(') => {
                word.push('$');
                parse_group(ctx, &mut word)?;
            }
            Some(c) => word.push(c),
            None => break,
        }
    }

    Ok(word)
}

// Copies a `( ... )` group, including its parentheses, into `word`.  Nested
// parentheses are counted; quoted strings and escaped characters aren't.  As in a
// statement, a `"` only opens a quoted string at the start of a word.
fn parse_group(ctx: &mut Tokenizer, word: &mut String) -> Result<(), Exception> {
    let mut depth = 0usize;
    let mut prev = ' ';

    loop {
        let c = ctx
            .next()
            .ok_or_else(|| Exception::incomplete("missing close-paren"))?;
        word.push(c);
        let at_word_start = prev == '(' || prev == ';' || prev == '\n' || is_inline_space(prev);
        prev = c;

        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            '\\' => {
                if let Some(c) = ctx.next() {
                    word.push(c);
                    prev = c;
                }
            }
            '"' if at_word_start => loop {
                let c = ctx
                    .next()
                    .ok_or_else(|| Exception::incomplete("missing \" in group"))?;
                word.push(c);

                match c {
                    '"' => break,
                    '\\' => {
                        if let Some(c) = ctx.next() {
                            word.push(c);
                        }
                    }
                    _ => (),
                }
            },
            _ => (),
        }
    }
}

fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\x0C'
}

/// A cursor over the script source that tracks the current line.
struct Tokenizer<'a> {
    input: &'a str,
    index: usize,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            index: 0,
            line: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.index >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.index..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        self.input[self.index..].chars().nth(1)
    }

    fn is(&self, ch: char) -> bool {
        self.peek() == Some(ch)
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_char(&mut self, ch: char) {
        debug_assert!(self.is(ch));
        self.next();
    }

    fn at_continuation(&self) -> bool {
        self.is('\\') && self.peek2() == Some('\n')
    }

    fn at_word_end(&self) -> bool {
        match self.peek() {
            None | Some('\n') | Some(';') => true,
            Some(c) if is_inline_space(c) => true,
            Some(_) => self.at_continuation(),
        }
    }

    fn skip_inline_space(&mut self) {
        while self.peek().map_or(false, is_inline_space) {
            self.next();
        }
    }

    // Skips whitespace and line continuations within a statement.
    fn skip_word_separators(&mut self) {
        loop {
            self.skip_inline_space();

            if self.at_continuation() {
                self.next();
                self.next();
            } else {
                break;
            }
        }
    }

    // Skips whitespace, continuations, newlines and semicolons between statements.
    fn skip_statement_separators(&mut self) {
        loop {
            self.skip_word_separators();

            match self.peek() {
                Some('\n') | Some(';') => {
                    self.next();
                }
                _ => break,
            }
        }
    }

    // Skips a comment through end of line; a continuation extends the comment.
    fn skip_comment(&mut self) {
        while let Some(c) = self.next() {
            match c {
                '\n' => break,
                '\\' => {
                    self.next();
                }
                _ => (),
            }
        }
    }
}
