use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source slice the token was scanned from. String lexemes keep
    /// their quotes and escape backslashes; decoding happens in the parser.
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Int,
    Float,
    Str,
    Identifier,
    // keywords
    And,
    Break,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    False,
    For,
    If,
    In,
    None,
    Not,
    Or,
    Pass,
    Return,
    True,
    While,
    // operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Semicolon,
    // layout
    Newline,
    Indent,
    Dedent,
    Invalid,
    Eof,
}

fn keyword_kind(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "and" => TokenKind::And,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "def" => TokenKind::Def,
        "del" => TokenKind::Del,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "in" => TokenKind::In,
        "none" => TokenKind::None,
        "not" => TokenKind::Not,
        "or" => TokenKind::Or,
        "pass" => TokenKind::Pass,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "while" => TokenKind::While,
        _ => return Option::None,
    };
    Some(kind)
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    pending_dedents: usize,
    at_line_start: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        // Queued dedents drain one per call, never batched.
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return self.layout_token(TokenKind::Dedent);
        }

        if self.at_line_start {
            if let Some(token) = self.scan_line_start() {
                return token;
            }
        }

        loop {
            self.skip_inline_space();

            let line = self.line;
            let column = self.column;

            let ch = match self.peek() {
                Some(ch) => ch,
                Option::None => {
                    // Drain the remaining indentation levels before EOF.
                    if self.indent_stack.len() > 1 {
                        self.pending_dedents = self.indent_stack.len() - 2;
                        self.indent_stack.truncate(1);
                        return self.layout_token(TokenKind::Dedent);
                    }
                    return Token {
                        kind: TokenKind::Eof,
                        lexeme: String::new(),
                        line,
                        column,
                    };
                }
            };

            match ch {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                    self.at_line_start = true;
                    return Token {
                        kind: TokenKind::Newline,
                        lexeme: "\n".to_string(),
                        line,
                        column,
                    };
                }
                '#' => {
                    // Comments never produce tokens.
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                'a'..='z' | 'A'..='Z' | '_' => return self.read_word(line, column),
                '0'..='9' => return self.read_number(line, column),
                '\'' | '"' => return self.read_string(ch, line, column),
                _ => return self.read_operator(ch, line, column),
            }
        }
    }

    /// Measures the indentation of a fresh logical line and moves the
    /// indentation stack. Returns the Indent/Dedent token that movement
    /// produces, if any. Blank and comment-only lines leave the stack alone.
    fn scan_line_start(&mut self) -> Option<Token> {
        let mut width = 0usize;
        loop {
            match self.peek() {
                Some(' ') => {
                    width += 1;
                    self.advance();
                }
                Some('\t') => {
                    width += 4;
                    self.advance();
                }
                Some('\r') => {
                    self.advance();
                }
                _ => break,
            }
        }
        self.at_line_start = false;

        match self.peek() {
            Option::None | Some('\n') | Some('#') => return Option::None,
            _ => {}
        }

        let top = self.indent_stack.last().copied().unwrap_or(0);
        if width > top {
            self.indent_stack.push(width);
            return Some(self.layout_token(TokenKind::Indent));
        }
        if width < top {
            let mut pops = 0usize;
            while self.indent_stack.last().copied().unwrap_or(0) > width {
                self.indent_stack.pop();
                pops += 1;
            }
            self.pending_dedents = pops - 1;
            return Some(self.layout_token(TokenKind::Dedent));
        }
        Option::None
    }

    fn layout_token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            lexeme: String::new(),
            line: self.line,
            column: 1,
        }
    }

    fn skip_inline_space(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self, line: usize, column: usize) -> Token {
        let mut lexeme = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                lexeme.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let kind = keyword_kind(&lexeme).unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> Token {
        let mut lexeme = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                lexeme.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // A float needs a digit after the dot; `5.` stays an int followed
        // by a dot token.
        let mut kind = TokenKind::Int;
        if self.peek() == Some('.') {
            let mut ahead = self.chars.clone();
            ahead.next();
            if matches!(ahead.next(), Some(digit) if digit.is_ascii_digit()) {
                lexeme.push('.');
                self.advance();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        lexeme.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
                kind = TokenKind::Float;
            }
        }

        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Token {
        let mut lexeme = String::new();
        lexeme.push(quote);
        self.advance();

        loop {
            match self.peek() {
                Option::None | Some('\n') => {
                    // Unterminated string; lexing never hard-errors.
                    return Token {
                        kind: TokenKind::Invalid,
                        lexeme,
                        line,
                        column,
                    };
                }
                Some('\\') => {
                    lexeme.push('\\');
                    self.advance();
                    match self.peek() {
                        Option::None | Some('\n') => {
                            return Token {
                                kind: TokenKind::Invalid,
                                lexeme,
                                line,
                                column,
                            };
                        }
                        Some(escaped) => {
                            lexeme.push(escaped);
                            self.advance();
                        }
                    }
                }
                Some(ch) if ch == quote => {
                    lexeme.push(ch);
                    self.advance();
                    return Token {
                        kind: TokenKind::Str,
                        lexeme,
                        line,
                        column,
                    };
                }
                Some(ch) => {
                    lexeme.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_operator(&mut self, ch: char, line: usize, column: usize) -> Token {
        self.advance();

        // Maximal two-character munch for the compound operators.
        let followed_by_eq = self.peek() == Some('=');
        let (kind, lexeme) = match (ch, followed_by_eq) {
            ('=', true) => (TokenKind::EqEq, "=="),
            ('=', false) => (TokenKind::Assign, "="),
            ('!', true) => (TokenKind::NotEq, "!="),
            ('<', true) => (TokenKind::LessEq, "<="),
            ('<', false) => (TokenKind::Less, "<"),
            ('>', true) => (TokenKind::GreaterEq, ">="),
            ('>', false) => (TokenKind::Greater, ">"),
            ('+', true) => (TokenKind::PlusAssign, "+="),
            ('+', false) => (TokenKind::Plus, "+"),
            ('-', true) => (TokenKind::MinusAssign, "-="),
            ('-', false) => (TokenKind::Minus, "-"),
            ('*', true) => (TokenKind::StarAssign, "*="),
            ('*', false) => (TokenKind::Star, "*"),
            ('/', true) => (TokenKind::SlashAssign, "/="),
            ('/', false) => (TokenKind::Slash, "/"),
            ('%', true) => (TokenKind::PercentAssign, "%="),
            ('%', false) => (TokenKind::Percent, "%"),
            ('(', _) => (TokenKind::LParen, "("),
            (')', _) => (TokenKind::RParen, ")"),
            ('[', _) => (TokenKind::LBracket, "["),
            (']', _) => (TokenKind::RBracket, "]"),
            ('{', _) => (TokenKind::LBrace, "{"),
            ('}', _) => (TokenKind::RBrace, "}"),
            (',', _) => (TokenKind::Comma, ","),
            (':', _) => (TokenKind::Colon, ":"),
            ('.', _) => (TokenKind::Dot, "."),
            (';', _) => (TokenKind::Semicolon, ";"),
            _ => {
                // Unrecognized characters become invalid tokens rather than
                // aborting the scan.
                return Token {
                    kind: TokenKind::Invalid,
                    lexeme: ch.to_string(),
                    line,
                    column,
                };
            }
        };

        if lexeme.len() == 2 {
            self.advance();
        }

        Token {
            kind,
            lexeme: lexeme.to_string(),
            line,
            column,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch.is_some() {
            self.column += 1;
        }
        ch
    }
}
