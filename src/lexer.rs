use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::intern::{Interner, Symbol};
use crate::token::{Span, Token, TokenKind};

/// Tokenizer for the C subset. Skips whitespace and `//` / `/* */` comments,
/// applies maximal munch to the two-character operators, and always
/// terminates the stream with an EOF token.
pub struct Lexer<'a, 'int> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    interner: &'int mut Interner,
}

impl<'a, 'int> Lexer<'a, 'int> {
    pub fn new(source: &'a str, interner: &'int mut Interner) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
        }
    }

    pub fn tokenize(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            if self.pos >= self.bytes.len() {
                let end = self.source.len();
                tokens.push(Token::new(TokenKind::Eof, Symbol::EMPTY, Span::new(end, end)));
                return Ok(tokens);
            }
            let token = match self.bytes[self.pos] {
                b'0'..=b'9' => self.number(),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.ident_or_keyword(),
                _ => self.operator()?,
            };
            tokens.push(token);
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'/') {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
            } else if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                self.pos += 2;
                while self.pos < self.bytes.len() {
                    if self.bytes[self.pos] == b'*' && self.peek_at(1) == Some(b'/') {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                return;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        let mut value: i64 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value * 10 + i64::from(b - b'0');
            self.pos += 1;
        }
        let source = self.source;
        let lexeme = self.interner.intern(&source[start..self.pos]);
        Token::number(value, lexeme, Span::new(start, self.pos))
    }

    fn ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let source = self.source;
        let text = &source[start..self.pos];
        let kind = match text {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "int" => TokenKind::Int,
            _ => TokenKind::Ident,
        };
        let lexeme = self.interner.intern(text);
        Token::new(kind, lexeme, Span::new(start, self.pos))
    }

    fn operator(&mut self) -> CompileResult<Token> {
        let start = self.pos;
        let kind = match self.bytes[self.pos] {
            b'+' if self.peek_at(1) == Some(b'+') => self.two(TokenKind::Inc),
            b'+' => self.one(TokenKind::Plus),
            b'-' if self.peek_at(1) == Some(b'-') => self.two(TokenKind::Dec),
            b'-' => self.one(TokenKind::Minus),
            b'*' => self.one(TokenKind::Star),
            b'/' => self.one(TokenKind::Slash),
            b'&' => self.one(TokenKind::Amp),
            b'=' if self.peek_at(1) == Some(b'=') => self.two(TokenKind::EqEq),
            b'=' => self.one(TokenKind::Assign),
            b'!' if self.peek_at(1) == Some(b'=') => self.two(TokenKind::NotEq),
            b'<' if self.peek_at(1) == Some(b'=') => self.two(TokenKind::Le),
            b'<' => self.one(TokenKind::Lt),
            b'>' if self.peek_at(1) == Some(b'=') => self.two(TokenKind::Ge),
            b'>' => self.one(TokenKind::Gt),
            b'(' => self.one(TokenKind::LParen),
            b')' => self.one(TokenKind::RParen),
            b';' => self.one(TokenKind::Semi),
            b',' => self.one(TokenKind::Comma),
            b'{' => self.one(TokenKind::LCurly),
            b'}' => self.one(TokenKind::RCurly),
            b'[' => self.one(TokenKind::LBracket),
            b']' => self.one(TokenKind::RBracket),
            _ => {
                let source = self.source;
                let c = source[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(CompileError::at(
                    ErrorKind::UnexpectedCharacter(c),
                    Span::new(start, start + c.len_utf8()),
                ));
            }
        };
        let source = self.source;
        let lexeme = self.interner.intern(&source[start..self.pos]);
        Ok(Token::new(kind, lexeme, Span::new(start, self.pos)))
    }

    fn one(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn two(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 2;
        kind
    }
}
