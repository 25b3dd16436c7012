use std::fmt;

use crate::error::SyntaxError;

// Shell operators recognised on a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    RedirectIn,  // <
    RedirectOut, // >
    Pipe,        // |
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::RedirectIn),
            '>' => Some(Self::RedirectOut),
            '|' => Some(Self::Pipe),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RedirectIn => "<",
            Self::RedirectOut => ">",
            Self::Pipe => "|",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Op(Operator),
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Self::Word(text.into())
    }
}

/// Splits a line into words and operators.
///
/// Whitespace separates words, and `<`, `>` and `|` always form their own token
/// even when glued to a word (`cmd>out` is three tokens). There is no quoting,
/// escaping or comment syntax.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in line.chars() {
        if c.is_whitespace() {
            flush_word(&mut current, &mut tokens);
        } else if let Some(op) = Operator::from_char(c) {
            flush_word(&mut current, &mut tokens);
            tokens.push(Token::Op(op));
        } else {
            current.push(c);
        }
    }
    flush_word(&mut current, &mut tokens);

    tokens
}

fn flush_word(current: &mut String, tokens: &mut Vec<Token>) {
    if !current.is_empty() {
        tokens.push(Token::Word(std::mem::take(current)));
    }
}

/// Splits a token sequence on its pipe operator.
///
/// Returns the whole sequence and `None` when there is no pipe. More than one
/// pipe is a syntax error, as is a pipe with nothing on one of its sides.
pub fn split_pipe(mut tokens: Vec<Token>) -> Result<(Vec<Token>, Option<Vec<Token>>), SyntaxError> {
    let mut pipes = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == Token::Op(Operator::Pipe))
        .map(|(i, _)| i);

    let Some(at) = pipes.next() else {
        return Ok((tokens, None));
    };
    if pipes.next().is_some() {
        return Err(SyntaxError::TooManyPipes);
    }

    let right = tokens.split_off(at + 1);
    tokens.pop();
    if tokens.is_empty() || right.is_empty() {
        return Err(SyntaxError::EmptyPipeSide);
    }
    Ok((tokens, Some(right)))
}
