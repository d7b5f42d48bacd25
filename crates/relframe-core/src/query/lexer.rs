/// Lexer for filter expressions
///
/// Converts raw expression text into positioned tokens for parsing.
use crate::error::{Error, Result};
use std::fmt;

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Combinators
    And, // &
    Or,  // |
    Not, // ~

    // Comparison operators
    Eq, // ==
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,

    /// Dotted column path, e.g. `age`, `orders.amount`, `self.age`
    Column(Vec<String>),

    // Punctuation
    LeftParen,  // (
    RightParen, // )

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => write!(f, "&"),
            Token::Or => write!(f, "|"),
            Token::Not => write!(f, "~"),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Integer(i) => write!(f, "{}", i),
            Token::Float(fl) => write!(f, "{}", fl),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Null => write!(f, "None"),
            Token::Column(parts) => write!(f, "{}", parts.join(".")),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Lexer state
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a new lexer from input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();
        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(self.spanned(Token::Eof, start));
        };

        let token = match ch {
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            '&' => {
                self.advance();
                if self.current_char() == Some('&') {
                    return Err(Error::syntax(start, "unknown operator '&&', use '&'"));
                }
                Token::And
            }
            '|' => {
                self.advance();
                if self.current_char() == Some('|') {
                    return Err(Error::syntax(start, "unknown operator '||', use '|'"));
                }
                Token::Or
            }
            '~' => {
                self.advance();
                Token::Not
            }
            '=' => {
                self.advance();
                if self.current_char() != Some('=') {
                    return Err(Error::syntax(start, "unknown operator '=', use '=='"));
                }
                self.advance();
                Token::Eq
            }
            '!' => {
                self.advance();
                if self.current_char() != Some('=') {
                    return Err(Error::syntax(start, "unknown operator '!', use '~' or '!='"));
                }
                self.advance();
                Token::Ne
            }
            '<' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '\'' | '"' => self.read_string(ch)?,
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
            c if c.is_ascii_digit() => self.read_number()?,
            c if c.is_alphabetic() || c == '_' => self.read_column_or_keyword()?,
            c => {
                return Err(Error::syntax(
                    start,
                    format!("unexpected character '{}'", c),
                ))
            }
        };

        Ok(self.spanned(token, start))
    }

    /// Tokenize entire input into vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn spanned(&self, token: Token, position: usize) -> Spanned {
        Spanned { token, position }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.position;
        let mut has_dot = false;

        if self.current_char() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !has_dot && self.peek_char().is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        // `12abc` is neither a number nor an identifier
        if self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            return Err(Error::syntax(start, "invalid number"));
        }

        let num_str: String = self.input[start..self.position].iter().collect();
        let parsed = if has_dot {
            num_str
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Token::Float)
        } else {
            num_str.parse::<i64>().map(Token::Integer).ok()
        };
        parsed.ok_or_else(|| Error::syntax(start, format!("invalid number '{}'", num_str)))
    }

    fn read_string(&mut self, quote: char) -> Result<Token> {
        let start = self.position;
        self.advance(); // skip opening quote
        let content_start = self.position;

        while self.current_char().is_some_and(|c| c != quote) {
            self.advance();
        }

        if self.current_char().is_none() {
            return Err(Error::syntax(start, "unterminated string literal"));
        }

        let string: String = self.input[content_start..self.position].iter().collect();
        self.advance(); // skip closing quote

        Ok(Token::String(string))
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self
            .current_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        self.input[start..self.position].iter().collect()
    }

    fn read_column_or_keyword(&mut self) -> Result<Token> {
        let mut parts = vec![self.read_identifier()];

        while self.current_char() == Some('.') {
            let dot = self.position;
            self.advance();
            if !self
                .current_char()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
            {
                return Err(Error::syntax(dot + 1, "expected a name after '.'"));
            }
            parts.push(self.read_identifier());
        }

        if parts.len() == 1 {
            match parts[0].to_lowercase().as_str() {
                "true" => return Ok(Token::Boolean(true)),
                "false" => return Ok(Token::Boolean(false)),
                "none" | "null" | "nan" | "nat" => return Ok(Token::Null),
                _ => {}
            }
        }

        Ok(Token::Column(parts))
    }
}
