use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Formatter;

pub static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("fn", TokenType::Function);
    m.insert("let", TokenType::Let);
    m.insert("true", TokenType::True);
    m.insert("false", TokenType::False);
    m.insert("if", TokenType::If);
    m.insert("else", TokenType::Else);
    m.insert("return", TokenType::Return);
    m
});

/*
The scanner groups the raw character stream into lexemes and emits one token
per lexeme. A token carries its type, the exact source text it was built
from, and the line it started on. The parser never touches the source text
again; everything downstream works on tokens.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // single character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Minus,
    Plus,
    SemiColon,
    Slash,
    Star,
    Less,
    Greater,

    // one or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,

    // literals
    Identifier,
    Number,
    String,

    // keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,

    /// A character the scanner could not place in any lexeme. The parser
    /// reports these; the scanner itself never fails.
    Illegal,

    Eof,
}

impl fmt::Display for TokenType {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenType as T;

        match self {
            T::LeftParen    => write!(f, "("),
            T::RightParen   => write!(f, ")"),
            T::LeftBrace    => write!(f, "{{"),
            T::RightBrace   => write!(f, "}}"),
            T::LeftBracket  => write!(f, "["),
            T::RightBracket => write!(f, "]"),
            T::Comma        => write!(f, ","),
            T::Minus        => write!(f, "-"),
            T::Plus         => write!(f, "+"),
            T::SemiColon    => write!(f, ";"),
            T::Slash        => write!(f, "/"),
            T::Star         => write!(f, "*"),
            T::Less         => write!(f, "<"),
            T::Greater      => write!(f, ">"),
            T::Bang         => write!(f, "!"),
            T::BangEqual    => write!(f, "!="),
            T::Equal        => write!(f, "="),
            T::EqualEqual   => write!(f, "=="),
            T::Identifier   => write!(f, "identifier"),
            T::Number       => write!(f, "number"),
            T::String       => write!(f, "string"),
            T::Function     => write!(f, "fn"),
            T::Let          => write!(f, "let"),
            T::True         => write!(f, "true"),
            T::False        => write!(f, "false"),
            T::If           => write!(f, "if"),
            T::Else         => write!(f, "else"),
            T::Return       => write!(f, "return"),
            T::Illegal      => write!(f, "illegal"),
            T::Eof          => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} '{}'", self.token_type, self.lexeme)
    }
}

pub struct Scanner {
    source: String,
    tokens: Vec<Token>,
    // these fields are used by the scanner to keep track of its position in the input
    start: usize,   // points to the first position in the lexeme
    current: usize, // points to the current position of the lexeme
    line: usize,    // source line `current` is on, recorded on every token
}

impl Scanner {
    pub fn new(source: String) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(&mut self) -> &Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens
            .push(Token::new(TokenType::Eof, "".to_string(), self.line));
        &self.tokens
    }

    // to consume input
    fn advance(&mut self) -> char {
        let ch = self.source[self.current..].chars().next().unwrap();
        self.current += ch.len_utf8();
        ch
    }

    fn scan_token(&mut self) {
        let ch = self.advance();
        match ch {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            '[' => self.add_token(TokenType::LeftBracket),
            ']' => self.add_token(TokenType::RightBracket),
            ',' => self.add_token(TokenType::Comma),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::SemiColon),
            '*' => self.add_token(TokenType::Star),
            '<' => self.add_token(TokenType::Less),
            '>' => self.add_token(TokenType::Greater),
            '!' => {
                let token = if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(token);
            }
            '=' => {
                let token = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token);
            }
            '/' => {
                if self.match_char('/') {
                    // a comment goes until the line's end
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash)
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
            }
            '"' => self.string(),
            c => {
                if self.is_digit(c) {
                    self.number();
                } else if self.is_alpha(c) {
                    self.identifier();
                } else {
                    // an unexpected character still becomes a token, so the
                    // parser can report it with a line number attached
                    self.add_token(TokenType::Illegal);
                }
            }
        }
    }

    fn is_alpha(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_alphanumeric(&self, c: char) -> bool {
        self.is_alpha(c) || self.is_digit(c)
    }

    fn is_digit(&self, ch: char) -> bool {
        ch.is_ascii_digit()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current..].chars().next().unwrap()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }

        let next_char = self.source[self.current..].chars().next().unwrap();
        if next_char != expected {
            return false;
        }
        self.current += next_char.len_utf8();
        true
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            // unterminated string; the dangling quote surfaces as a parse error
            self.add_token(TokenType::Illegal);
            return;
        }

        // the closing "
        self.advance();
        let value = self.source[self.start + 1..self.current - 1].to_string();
        let token = Token::new(TokenType::String, value, self.line);
        self.tokens.push(token);
    }

    fn number(&mut self) {
        while self.is_digit(self.peek()) {
            self.advance();
        }
        // integers only; a trailing `.` is left for the next scan round
        self.add_token(TokenType::Number);
    }

    fn identifier(&mut self) {
        while self.is_alphanumeric(self.peek()) {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = KEYWORDS.get(text).cloned().unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    // to produce output
    fn add_token(&mut self, token_type: TokenType) {
        let text = self.source[self.start..self.current].to_string();
        let token = Token::new(token_type, text, self.line);
        self.tokens.push(token);
    }
}
