//! Tokenization of an input line into words and control operators.
//!
//! There is no quoting or substitution: a word is any run of characters that are
//! neither blanks nor one of the operator characters `# < > & | ;` or a newline.

use std::fmt;

/// Control operators recognized by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `#`, comment to end of line.
    Comment,
    /// `<`, input redirection.
    RedirectIn,
    /// `>`, output redirection.
    RedirectOut,
    /// `&`, run the preceding command in the background.
    Background,
    /// `|`, pipe.
    Pipe,
    /// `;`, statement separator.
    Semicolon,
    /// End of line.
    Newline,
}

impl Operator {
    fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            '#' => Operator::Comment,
            '<' => Operator::RedirectIn,
            '>' => Operator::RedirectOut,
            '&' => Operator::Background,
            '|' => Operator::Pipe,
            ';' => Operator::Semicolon,
            '\n' => Operator::Newline,
            _ => return None,
        })
    }

    /// `;` and newline end a statement; everything else is "special".
    pub fn is_terminator(self) -> bool {
        matches!(self, Operator::Semicolon | Operator::Newline)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Comment => "#",
            Operator::RedirectIn => "<",
            Operator::RedirectOut => ">",
            Operator::Background => "&",
            Operator::Pipe => "|",
            Operator::Semicolon => ";",
            Operator::Newline => "\\n",
        };
        f.write_str(s)
    }
}

/// A token produced by [`split_into_tokens`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Operator(Operator),
}

impl Token {
    pub fn word(s: impl Into<String>) -> Self {
        Token::Word(s.into())
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::Operator(_) => None,
        }
    }

    pub fn as_operator(&self) -> Option<Operator> {
        match self {
            Token::Operator(op) => Some(*op),
            Token::Word(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
}

struct LexingFSM<'a> {
    input: std::str::Chars<'a>,
    state: LexingState,
    buffer: String,
    out: Vec<Token>,
}

impl<'a> LexingFSM<'a> {
    fn new(line: &'a str) -> Self {
        LexingFSM {
            input: line.chars(),
            state: LexingState::Start,
            buffer: String::new(),
            out: Vec::new(),
        }
    }

    fn make_tokens(mut self) -> Vec<Token> {
        while let Some(ch) = self.input.next() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.finish_word();
            } else if let Some(op) = Operator::from_char(ch) {
                self.finish_word();
                self.out.push(Token::Operator(op));
            } else {
                self.buffer.push(ch);
                self.state = LexingState::ReadingWord;
            }
        }
        self.finish_word();
        self.out
    }

    fn finish_word(&mut self) {
        if self.state == LexingState::ReadingWord {
            self.out.push(Token::Word(std::mem::take(&mut self.buffer)));
            self.state = LexingState::Start;
        }
    }
}

/// Split a line into tokens. Never fails: every character is either a blank, an
/// operator, or part of a word.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    LexingFSM::new(line).make_tokens()
}
