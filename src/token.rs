//! Source positions, the token model, and the hand-written lexer that turns
//! program text into a token stream.

use crate::error::ThistleError;
use crate::{Float, Int};
use std::fmt;
use std::rc::Rc;

/// A single point in a source buffer: a byte offset plus the 0-based line
/// and column it falls on. Positions borrow the filename and source text
/// they were produced from so error messages can render without threading
/// extra arguments everywhere.
#[derive(Clone)]
pub struct Position {
    pub index: usize,
    pub line: u32,
    pub column: u32,
    pub filename: Rc<str>,
    pub source: Rc<str>,
}

impl Position {
    pub fn start(filename: Rc<str>, source: Rc<str>) -> Self {
        Self {
            index: 0,
            line: 0,
            column: 0,
            filename,
            source,
        }
    }

    /// Advance past `ch`, updating line/column bookkeeping.
    ///
    /// Advancing past a newline increments `line` and resets `column` to 0.
    pub fn advance(&mut self, ch: char) {
        self.index += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    pub fn span_to(&self, end: &Position) -> Span {
        Span {
            start: self.clone(),
            end: end.clone(),
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A contiguous source region. `end` is always at or after `start`.
#[derive(Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

/// Reserved words. `To` and `Leap` are recognised by the lexer but never
/// consumed by the parser - they are held in reserve for a future
/// `break`/`continue`/`range` wiring so the lexer's keyword table does not
/// need to change when that lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Take,
    And,
    Or,
    Not,
    Whether,
    Further,
    Ifnot,
    StartCycle,
    To,
    Leap,
    AsLongAs,
    Method,
}

impl Keyword {
    fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "take" => Self::Take,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "whether" => Self::Whether,
            "further" => Self::Further,
            "ifnot" => Self::Ifnot,
            "StartCycle" => Self::StartCycle,
            "to" => Self::To,
            "leap" => Self::Leap,
            "AsLongAs" => Self::AsLongAs,
            "Method" => Self::Method,
            _ => return None,
        })
    }
}

/// The shape of a paren-like delimiter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParenKind {
    Round,
    Curly,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Int(Int),
    Float(Float),
    /// Used for identifiers, keywords, and string literals alike.
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Int,
    Float,
    String,
    Identifier,
    Keyword(Keyword),
    Equal,
    Plus,
    Minus,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    LParen(ParenKind),
    RParen(ParenKind),
    Newline,
    Colon,
    Comma,
    Index,
    Ee,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Literal,
    pub start: Position,
    pub end: Position,
}

impl Token {
    pub fn span(&self) -> Span {
        self.start.span_to(&self.end)
    }

    pub fn as_identifier(&self) -> &str {
        match &self.literal {
            Literal::Str(s) => s.as_str(),
            _ => "",
        }
    }
}

/// Single-pass, one-character-lookahead lexer.
pub struct Lexer {
    chars: Vec<char>,
    cursor: usize,
    pos: Position,
}

impl Lexer {
    pub fn new(filename: &str, source: &str) -> Self {
        let filename: Rc<str> = Rc::from(filename);
        let source_rc: Rc<str> = Rc::from(source);
        Self {
            chars: source.chars().collect(),
            cursor: 0,
            pos: Position::start(filename, source_rc),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.cursor];
        self.cursor += 1;
        self.pos.advance(ch);
        ch
    }

    /// Tokenize the entire source buffer.
    ///
    /// Terminates for any input: either a token list ending in `EOF`, or a
    /// lexical error carrying a non-empty span within the source.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ThistleError> {
        let mut tokens = Vec::new();
        loop {
            match self.peek() {
                None => {
                    let eof_pos = self.pos.clone();
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        literal: Literal::None,
                        start: eof_pos.clone(),
                        end: eof_pos,
                    });
                    return Ok(tokens);
                }
                Some(' ') | Some('\t') => {
                    self.advance();
                }
                Some('\n') | Some(';') => {
                    let start = self.pos.clone();
                    self.advance();
                    tokens.push(Token {
                        kind: TokenKind::Newline,
                        literal: Literal::None,
                        end: self.pos.clone(),
                        start,
                    });
                }
                Some(c) if c.is_ascii_digit() => tokens.push(self.scan_number()),
                Some('"') => tokens.push(self.scan_string()),
                Some(c) if c.is_alphabetic() => tokens.push(self.scan_identifier()),
                Some(_) => tokens.push(self.scan_operator()?),
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos.clone();
        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !is_float {
                is_float = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let end = self.pos.clone();
        let literal = if is_float {
            Literal::Float(text.parse().unwrap_or(0.0))
        } else {
            Literal::Int(text.parse().unwrap_or(0))
        };
        Token {
            kind: if is_float { TokenKind::Float } else { TokenKind::Int },
            literal,
            start,
            end,
        }
    }

    /// Opened and closed by `"`. `\n` and `\t` are recognised escapes; any
    /// other escaped character is taken literally. An unterminated string
    /// reads to EOF and returns whatever was collected rather than erroring
    /// - this matches observed behavior of the language and is intentional,
    /// not a bug to silently fix.
    fn scan_string(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek() {
                None => break,
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => {
                            text.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            text.push('\t');
                            self.advance();
                        }
                        Some(c) => {
                            text.push(c);
                            self.advance();
                        }
                        None => {}
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        let end = self.pos.clone();
        Token {
            kind: TokenKind::String,
            literal: Literal::Str(text),
            start,
            end,
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos.clone();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let end = self.pos.clone();
        let kind = match Keyword::from_str(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        Token {
            kind,
            literal: Literal::Str(text),
            start,
            end,
        }
    }

    fn scan_operator(&mut self) -> Result<Token, ThistleError> {
        let start = self.pos.clone();
        let c = self.advance();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Multiply,
            '%' => TokenKind::Modulo,
            '^' => TokenKind::Power,
            '(' => TokenKind::LParen(ParenKind::Round),
            ')' => TokenKind::RParen(ParenKind::Round),
            '{' => TokenKind::LParen(ParenKind::Curly),
            '}' => TokenKind::RParen(ParenKind::Curly),
            '[' => TokenKind::LParen(ParenKind::Square),
            ']' => TokenKind::RParen(ParenKind::Square),
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Index,
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    TokenKind::FloorDivide
                } else {
                    TokenKind::Divide
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ee
                } else {
                    TokenKind::Equal
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Lte
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Gte
                } else {
                    TokenKind::Gt
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ne
                } else {
                    return Err(ThistleError::expected_char(
                        '=',
                        "after '!'",
                        start,
                        self.pos.clone(),
                    ));
                }
            }
            other => {
                return Err(ThistleError::illegal_character(other, start, self.pos.clone()));
            }
        };
        let end = self.pos.clone();
        Ok(Token {
            kind,
            literal: Literal::None,
            start,
            end,
        })
    }
}
