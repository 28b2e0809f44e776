use crate::{
    ast::{BinOp, Expr, FuncDef, Program, Stmt, UnaryOp},
    error::ParseError,
    lexer::{Token, TokenKind},
};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses the whole token stream. Statements that fail to parse are
    /// recorded in `errors()` and the parser resynchronizes on the next
    /// line, so independently-valid statements still come through.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        self.skip_separators();
        while !self.check(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
            self.skip_separators();
        }
        Program { statements }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Del => self.parse_del(),
            TokenKind::Break => {
                self.advance();
                self.end_of_statement()?;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.end_of_statement()?;
                Ok(Stmt::Continue)
            }
            TokenKind::Pass => {
                self.advance();
                self.end_of_statement()?;
                Ok(Stmt::Pass)
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// A bare expression is re-examined once parsed: `=` after a name or
    /// index expression makes it an assignment, an augmented operator after
    /// a name makes it an augmented assignment, anything else leaves it a
    /// plain expression statement.
    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;

        match self.current_kind() {
            TokenKind::Assign
                if matches!(expr, Expr::Identifier(_) | Expr::Index { .. }) =>
            {
                self.advance();
                let value = self.parse_expression()?;
                self.end_of_statement()?;
                match expr {
                    Expr::Identifier(name) => Ok(Stmt::Assign { name, value }),
                    Expr::Index { object, index } => Ok(Stmt::IndexAssign {
                        object: *object,
                        index: *index,
                        value,
                    }),
                    _ => unreachable!("guarded by the match arm"),
                }
            }
            kind if augmented_op(kind).is_some() && matches!(expr, Expr::Identifier(_)) => {
                let op = augmented_op(kind).unwrap_or(BinOp::Add);
                self.advance();
                let value = self.parse_expression()?;
                self.end_of_statement()?;
                match expr {
                    Expr::Identifier(name) => Ok(Stmt::AugAssign { name, op, value }),
                    _ => unreachable!("guarded by the match arm"),
                }
            }
            _ => {
                self.end_of_statement()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Colon, "expected ':' after if condition")?;
        let then = self.parse_block()?;

        let mut elifs = Vec::new();
        while self.check(TokenKind::Elif) {
            self.advance();
            let elif_cond = self.parse_expression()?;
            self.expect(TokenKind::Colon, "expected ':' after elif condition")?;
            let elif_body = self.parse_block()?;
            elifs.push((elif_cond, elif_body));
        }

        let else_body = if self.check(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon, "expected ':' after else")?;
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then: Box::new(then),
            elifs,
            else_body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Colon, "expected ':' after while condition")?;
        let body = self.parse_block()?;
        Ok(Stmt::While {
            cond,
            body: Box::new(body),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let var = self.expect_identifier("expected a loop variable after 'for'")?;
        self.expect(TokenKind::In, "expected 'in' after the loop variable")?;
        let iterable = self.parse_expression()?;
        self.expect(TokenKind::Colon, "expected ':' after the for iterable")?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            var,
            iterable,
            body: Box::new(body),
        })
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let name = self.expect_identifier("expected a function name after 'def'")?;
        self.expect(TokenKind::LParen, "expected '(' after the function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier("expected a parameter name")?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameters")?;
        self.expect(TokenKind::Colon, "expected ':' after the parameter list")?;
        let body = self.parse_block()?;

        Ok(Stmt::FuncDef(FuncDef {
            name,
            params,
            body: Box::new(body),
        }))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let value = match self.current_kind() {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::Dedent => None,
            _ => Some(self.parse_expression()?),
        };
        self.end_of_statement()?;
        Ok(Stmt::Return(value))
    }

    fn parse_del(&mut self) -> Result<Stmt, ParseError> {
        self.advance();
        let target = self.parse_expression()?;
        self.end_of_statement()?;
        match target {
            Expr::Index { object, index } => Ok(Stmt::Delete {
                object: *object,
                index: *index,
            }),
            _ => Err(self.error("del target must be an index expression".to_string())),
        }
    }

    /// A block is either one inline statement on the same line, or a
    /// newline followed by an indented statement sequence.
    fn parse_block(&mut self) -> Result<Stmt, ParseError> {
        if !self.check(TokenKind::Newline) {
            let stmt = self.parse_statement()?;
            return Ok(Stmt::Block(vec![stmt]));
        }
        self.advance();
        while self.check(TokenKind::Newline) {
            self.advance();
        }
        self.expect(TokenKind::Indent, "expected an indented block")?;

        let mut statements = Vec::new();
        self.skip_newlines();
        while !self.check(TokenKind::Dedent) && !self.check(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
            self.skip_newlines();
        }
        if self.check(TokenKind::Dedent) {
            self.advance();
        }
        Ok(Stmt::Block(statements))
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Not) {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// Comparison operators and membership tests share one tier and chain
    /// left-associatively, with no special chained-comparison semantics.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                TokenKind::In => {
                    self.advance();
                    let collection = self.parse_additive()?;
                    left = Expr::Membership {
                        value: Box::new(left),
                        collection: Box::new(collection),
                        negated: false,
                    };
                    continue;
                }
                TokenKind::Not => {
                    self.advance();
                    self.expect(TokenKind::In, "expected 'in' after 'not'")?;
                    let collection = self.parse_additive()?;
                    left = Expr::Membership {
                        value: Box::new(left),
                        collection: Box::new(collection),
                        negated: true,
                    };
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Minus) {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "expected ']' after index")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    // Calls are only permitted on bare names.
                    let name = match &expr {
                        Expr::Identifier(name) => name.clone(),
                        _ => {
                            return Err(
                                self.error("only a bare name can be called".to_string())
                            )
                        }
                    };
                    self.advance();
                    let args = self.parse_arguments()?;
                    expr = Expr::Call { name, args };
                }
                TokenKind::Dot => {
                    self.advance();
                    let method = self.expect_identifier("expected a method name after '.'")?;
                    self.expect(TokenKind::LParen, "expected '(' after the method name")?;
                    let args = self.parse_arguments()?;
                    expr = Expr::MethodCall {
                        object: Box::new(expr),
                        method,
                        args,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after arguments")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current_kind() {
            TokenKind::Int => {
                let lexeme = self.current_lexeme();
                let value = lexeme.parse::<i64>().map_err(|_| {
                    self.error(format!("integer literal '{}' is out of range", lexeme))
                })?;
                self.advance();
                Ok(Expr::Int(value))
            }
            TokenKind::Float => {
                let lexeme = self.current_lexeme();
                let value = lexeme.parse::<f64>().map_err(|_| {
                    self.error(format!("invalid float literal '{}'", lexeme))
                })?;
                self.advance();
                Ok(Expr::Float(value))
            }
            TokenKind::Str => {
                let lexeme = self.current_lexeme();
                self.advance();
                Ok(Expr::Str(unescape_string(&lexeme)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::None)
            }
            TokenKind::Identifier => {
                let name = self.current_lexeme();
                self.advance();
                Ok(Expr::Identifier(name))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression()?);
                        if self.check(TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "expected ']' after list elements")?;
                Ok(Expr::List(elements))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut keys = Vec::new();
                let mut values = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        keys.push(self.parse_expression()?);
                        self.expect(TokenKind::Colon, "expected ':' after dict key")?;
                        values.push(self.parse_expression()?);
                        if self.check(TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBrace, "expected '}' after dict entries")?;
                Ok(Expr::Dict { keys, values })
            }
            _ => Err(self.error(format!(
                "expected an expression, found {}",
                self.describe_current()
            ))),
        }
    }

    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        match self.current_kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(()),
            _ => Err(self.error(format!(
                "expected end of statement, found {}",
                self.describe_current()
            ))),
        }
    }

    /// Discards tokens up to the next line break (consumed) or a
    /// block-starting keyword (left in place), then resumes.
    fn synchronize(&mut self) {
        loop {
            match self.current_kind() {
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::Eof | TokenKind::Dedent => return,
                TokenKind::If | TokenKind::While | TokenKind::For => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.advance();
        }
    }

    /// Top-level separator skipping also swallows stray indentation tokens
    /// left behind by error recovery.
    fn skip_separators(&mut self) {
        while matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Indent | TokenKind::Dedent
        ) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    fn current_lexeme(&self) -> String {
        self.current_token().lexeme.clone()
    }

    fn describe_current(&self) -> String {
        let token = self.current_token();
        match token.kind {
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", token.lexeme),
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn advance(&mut self) {
        if !self.check(TokenKind::Eof) {
            self.current += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("{}, found {}", message, self.describe_current())))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        if self.check(TokenKind::Identifier) {
            let lexeme = self.current_lexeme();
            self.advance();
            Ok(lexeme)
        } else {
            Err(self.error(format!("{}, found {}", message, self.describe_current())))
        }
    }

    fn error(&self, message: String) -> ParseError {
        let token = self.current_token();
        ParseError::new(message, token.line, token.column)
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn augmented_op(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::PlusAssign => Some(BinOp::Add),
        TokenKind::MinusAssign => Some(BinOp::Sub),
        TokenKind::StarAssign => Some(BinOp::Mul),
        TokenKind::SlashAssign => Some(BinOp::Div),
        TokenKind::PercentAssign => Some(BinOp::Mod),
        _ => None,
    }
}

/// Strips the surrounding quotes and decodes escape sequences. Unknown
/// escapes pass the following character through literally.
fn unescape_string(lexeme: &str) -> String {
    let interior = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(interior.len());
    let mut chars = interior.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Program, Vec<ParseError>) {
        let tokens = Lexer::new(source).tokenize();
        let mut parser = Parser::new(tokens);
        let program = parser.parse_program();
        let errors = parser.take_errors();
        (program, errors)
    }

    fn parse_clean(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        program
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse_clean("x = 5 + 3 * 2\n");
        let expected = Stmt::Assign {
            name: "x".to_string(),
            value: Expr::Binary {
                op: BinOp::Add,
                left: Box::new(Expr::Int(5)),
                right: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    left: Box::new(Expr::Int(3)),
                    right: Box::new(Expr::Int(2)),
                }),
            },
        };
        assert_eq!(program.statements, vec![expected]);
    }

    #[test]
    fn binary_chains_lean_left() {
        let program = parse_clean("x = 1 - 2 - 3\n");
        let expected = Stmt::Assign {
            name: "x".to_string(),
            value: Expr::Binary {
                op: BinOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinOp::Sub,
                    left: Box::new(Expr::Int(1)),
                    right: Box::new(Expr::Int(2)),
                }),
                right: Box::new(Expr::Int(3)),
            },
        };
        assert_eq!(program.statements, vec![expected]);
    }

    #[test]
    fn index_assignment_is_recognized() {
        let program = parse_clean("xs[0] = 9\n");
        match &program.statements[0] {
            Stmt::IndexAssign { object, index, value } => {
                assert_eq!(*object, Expr::Identifier("xs".to_string()));
                assert_eq!(*index, Expr::Int(0));
                assert_eq!(*value, Expr::Int(9));
            }
            other => panic!("expected index assignment, got {:?}", other),
        }
    }

    #[test]
    fn augmented_assignment_requires_a_name() {
        let program = parse_clean("total += 2\n");
        match &program.statements[0] {
            Stmt::AugAssign { name, op, .. } => {
                assert_eq!(name, "total");
                assert_eq!(*op, BinOp::Add);
            }
            other => panic!("expected augmented assignment, got {:?}", other),
        }

        let (_, errors) = parse("xs[0] += 2\n");
        assert!(!errors.is_empty());
    }

    #[test]
    fn del_requires_an_index_target() {
        let (program, errors) = parse("del xs[1]\n");
        assert!(errors.is_empty());
        assert!(matches!(program.statements[0], Stmt::Delete { .. }));

        let (_, errors) = parse("del xs\n");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("index expression"));
    }

    #[test]
    fn calls_are_limited_to_bare_names() {
        let program = parse_clean("f(1, 2)\n");
        match &program.statements[0] {
            Stmt::Expr(Expr::Call { name, args }) => {
                assert_eq!(name, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }

        let (_, errors) = parse("xs[0](1)\n");
        assert!(!errors.is_empty());
        assert!(errors[0].message.contains("bare name"));
    }

    #[test]
    fn method_calls_attach_to_any_postfix_chain() {
        let program = parse_clean("rows[0].append(4)\n");
        match &program.statements[0] {
            Stmt::Expr(Expr::MethodCall { object, method, args }) => {
                assert!(matches!(**object, Expr::Index { .. }));
                assert_eq!(method, "append");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected method call, got {:?}", other),
        }
    }

    #[test]
    fn membership_sits_on_the_comparison_tier() {
        let program = parse_clean("found = key not in seen\n");
        match &program.statements[0] {
            Stmt::Assign { value, .. } => match value {
                Expr::Membership { negated, .. } => assert!(*negated),
                other => panic!("expected membership, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn not_binds_looser_than_comparison() {
        let program = parse_clean("x = not 1 == 2\n");
        match &program.statements[0] {
            Stmt::Assign { value, .. } => match value {
                Expr::Unary { op, operand } => {
                    assert_eq!(*op, UnaryOp::Not);
                    assert!(matches!(**operand, Expr::Binary { op: BinOp::Eq, .. }));
                }
                other => panic!("expected unary not, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn string_escapes_decode_in_the_parser() {
        let program = parse_clean("s = \"a\\tb\\qc\"\n");
        match &program.statements[0] {
            Stmt::Assign { value, .. } => {
                // \t decodes, the unknown \q passes `q` through literally.
                assert_eq!(*value, Expr::Str("a\tbqc".to_string()));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn double_star_fails_to_parse() {
        let (_, errors) = parse("x = 2 ** 3\n");
        assert!(!errors.is_empty());
    }

    #[test]
    fn recovery_keeps_later_statements() {
        let source = "x = = 1\ny = 2\n";
        let (program, errors) = parse(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(
            &program.statements[0],
            Stmt::Assign { name, .. } if name == "y"
        ));
    }

    #[test]
    fn recovery_resumes_at_block_keywords() {
        let source = "x = = 1 while y: y = 0\n";
        let (program, errors) = parse(source);
        assert_eq!(errors.len(), 1);
        assert!(matches!(program.statements[0], Stmt::While { .. }));
    }

    #[test]
    fn inline_and_indented_blocks_both_parse() {
        let inline = parse_clean("if x: y = 1\n");
        match &inline.statements[0] {
            Stmt::If { then, .. } => match &**then {
                Stmt::Block(stmts) => assert_eq!(stmts.len(), 1),
                other => panic!("expected block, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }

        let indented = parse_clean("if x:\n    y = 1\n    z = 2\n");
        match &indented.statements[0] {
            Stmt::If { then, .. } => match &**then {
                Stmt::Block(stmts) => assert_eq!(stmts.len(), 2),
                other => panic!("expected block, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn elif_chains_collect_in_order() {
        let source = "if a: x = 1\nelif b: x = 2\nelif c: x = 3\nelse: x = 4\n";
        let program = parse_clean(source);
        match &program.statements[0] {
            Stmt::If { elifs, else_body, .. } => {
                assert_eq!(elifs.len(), 2);
                assert!(else_body.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn def_parses_parameters_and_body() {
        let source = "def add(a, b):\n    return a + b\n";
        let program = parse_clean(source);
        match &program.statements[0] {
            Stmt::FuncDef(def) => {
                assert_eq!(def.name, "add");
                assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn dict_literal_keeps_parallel_keys_and_values() {
        let program = parse_clean("d = {\"a\": 1, \"b\": 2}\n");
        match &program.statements[0] {
            Stmt::Assign { value, .. } => match value {
                Expr::Dict { keys, values } => {
                    assert_eq!(keys.len(), 2);
                    assert_eq!(values.len(), 2);
                }
                other => panic!("expected dict literal, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn bare_return_has_no_value() {
        let source = "def f():\n    return\n";
        let program = parse_clean(source);
        match &program.statements[0] {
            Stmt::FuncDef(def) => match &*def.body {
                Stmt::Block(stmts) => assert_eq!(stmts[0], Stmt::Return(None)),
                other => panic!("expected block, got {:?}", other),
            },
            other => panic!("expected function definition, got {:?}", other),
        }
    }
}
