//! Recursive-descent parser with a backtracking [`ParseResult`] helper.
//!
//! The helper tracks how many tokens the current attempt has advanced past
//! the last committed decision point. That count is what lets
//! [`ParseResult::failure`] tell a genuinely new syntax error (no tokens
//! consumed since the last decision) from a deeper one (tokens were already
//! committed), so the parser reports the earliest, most informative error
//! rather than whatever the last attempted alternative happened to produce.

use crate::ast::{BinOp, Expr, IfClause, UnOp};
use crate::error::ThistleError;
use crate::token::{Keyword, ParenKind, Position, Token, TokenKind};
use crate::Identifier;
use std::rc::Rc;

/// Backtracking result wrapper. See the module docs for why `failure`
/// checks `last_registered_advance_count` before overwriting an error.
pub struct ParseResult<T> {
    pub value: Option<T>,
    pub error: Option<ThistleError>,
    pub advance_count: usize,
    pub last_registered_advance_count: usize,
    pub to_reverse_count: usize,
}

impl<T> ParseResult<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            error: None,
            advance_count: 0,
            last_registered_advance_count: 0,
            to_reverse_count: 0,
        }
    }

    pub fn register_advancement(&mut self) {
        self.advance_count += 1;
    }

    /// Incorporate a sub-result, inheriting its error.
    pub fn register<U>(&mut self, mut other: ParseResult<U>) -> Option<U> {
        self.last_registered_advance_count = other.advance_count;
        self.advance_count += other.advance_count;
        if other.error.is_some() {
            self.error = other.error.take();
        }
        other.value
    }

    /// Run a speculative attempt. On failure, record how many tokens must
    /// be rewound and return `None` without touching `self.error`, so the
    /// caller can `reverse(to_reverse_count)` and try another production.
    pub fn try_register<U>(&mut self, other: ParseResult<U>) -> Option<U> {
        if other.error.is_some() {
            self.to_reverse_count = other.advance_count;
            return None;
        }
        self.register(other)
    }

    pub fn success(mut self, value: T) -> Self {
        self.value = Some(value);
        self.error = None;
        self
    }

    pub fn failure(mut self, err: ThistleError) -> Self {
        if self.error.is_none() || self.last_registered_advance_count == 0 {
            self.error = Some(err);
        }
        self
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, idx: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.idx]
    }

    fn advance(&mut self) {
        if self.idx + 1 < self.tokens.len() {
            self.idx += 1;
        }
    }

    fn reverse(&mut self, count: usize) {
        self.idx = self.idx.saturating_sub(count);
    }

    fn prev_end(&self) -> Position {
        self.tokens[self.idx.saturating_sub(1)].end.clone()
    }

    fn skip_newlines(&mut self, res: &mut ParseResult<()>) {
        while self.current().kind == TokenKind::Newline {
            res.register_advancement();
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ThistleError> {
        if self.current().kind == kind {
            Ok(())
        } else {
            Err(ThistleError::invalid_syntax(
                format!("expected {}", what),
                self.current().span(),
            ))
        }
    }

    pub fn parse(tokens: Vec<Token>) -> Result<Expr, ThistleError> {
        let mut parser = Parser::new(tokens);
        let result = parser.statements();
        if let Some(err) = result.error {
            return Err(err);
        }
        let ast = result.value.expect("success carries a value");
        if parser.current().kind != TokenKind::Eof {
            return Err(ThistleError::invalid_syntax(
                "expected an operator",
                parser.current().span(),
            ));
        }
        Ok(ast)
    }

    /// `statements := NEWLINE* expression (NEWLINE+ expression)* NEWLINE*`
    fn statements(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        let mut items = Vec::new();

        while self.current().kind == TokenKind::Newline {
            res.register_advancement();
            self.advance();
        }

        let first = match res.register(self.expression()) {
            Some(e) => e,
            None => return res,
        };
        items.push(first);

        loop {
            let mut newline_count = 0;
            while self.current().kind == TokenKind::Newline {
                res.register_advancement();
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 || self.current().kind == TokenKind::Eof {
                break;
            }
            match res.try_register(self.expression()) {
                Some(expr) => items.push(expr),
                None => {
                    self.reverse(res.to_reverse_count);
                    break;
                }
            }
        }

        let end = self.prev_end();
        res.success(Expr::Statements {
            items,
            span: start.span_to(&end),
        })
    }

    /// `'{' body` where `body := expression '}' | NEWLINE statements '}'`.
    /// Called once the leading `'{'` of a block has already been consumed.
    fn block_body(&mut self) -> ParseResult<(Expr, bool)> {
        let mut res = ParseResult::new();
        if self.current().kind == TokenKind::Newline {
            res.register_advancement();
            self.advance();
            let stmts = match res.register(self.statements()) {
                Some(v) => v,
                None => return res,
            };
            if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Curly), "'}'") {
                return res.failure(e);
            }
            res.register_advancement();
            self.advance();
            res.success((stmts, true))
        } else {
            let expr = match res.register(self.expression()) {
                Some(v) => v,
                None => return res,
            };
            if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Curly), "'}'") {
                return res.failure(e);
            }
            res.register_advancement();
            self.advance();
            res.success((expr, false))
        }
    }

    /// `expression := 'take' IDENT '=' expression | comp_expr (('and'|'or') comp_expr)*`
    fn expression(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();

        if self.current().kind == TokenKind::Keyword(Keyword::Take) {
            res.register_advancement();
            self.advance();
            if self.current().kind != TokenKind::Identifier {
                return res.failure(ThistleError::invalid_syntax(
                    "expected an identifier",
                    self.current().span(),
                ));
            }
            let name = Identifier::from(self.current().as_identifier());
            res.register_advancement();
            self.advance();
            if let Err(e) = self.expect(TokenKind::Equal, "'='") {
                return res.failure(e);
            }
            res.register_advancement();
            self.advance();
            let value = match res.register(self.expression()) {
                Some(v) => v,
                None => return res,
            };
            let end = value.span().end.clone();
            return res.success(Expr::VarAssign {
                name,
                value: Box::new(value),
                span: start.span_to(&end),
            });
        }

        let mut node = match res.register(self.comp_expr()) {
            Some(v) => v,
            None => return res,
        };

        loop {
            let op = match self.current().kind {
                TokenKind::Keyword(Keyword::And) => BinOp::And,
                TokenKind::Keyword(Keyword::Or) => BinOp::Or,
                _ => break,
            };
            res.register_advancement();
            self.advance();
            let right = match res.register(self.comp_expr()) {
                Some(v) => v,
                None => return res,
            };
            let span = node.span().merge(right.span());
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
                span,
            };
        }
        res.success(node)
    }

    /// `comp_expr := 'not' comp_expr | arith_expr (cmp_op arith_expr)*`
    fn comp_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        if self.current().kind == TokenKind::Keyword(Keyword::Not) {
            let start = self.current().start.clone();
            res.register_advancement();
            self.advance();
            let operand = match res.register(self.comp_expr()) {
                Some(v) => v,
                None => return res,
            };
            let end = operand.span().end.clone();
            return res.success(Expr::UnaryOp {
                op: UnOp::Not,
                operand: Box::new(operand),
                span: start.span_to(&end),
            });
        }

        let mut node = match res.register(self.arith_expr()) {
            Some(v) => v,
            None => return res,
        };

        loop {
            let op = match self.current().kind {
                TokenKind::Ee => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Lte => BinOp::Lte,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Gte => BinOp::Gte,
                _ => break,
            };
            res.register_advancement();
            self.advance();
            let right = match res.register(self.arith_expr()) {
                Some(v) => v,
                None => return res,
            };
            let span = node.span().merge(right.span());
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
                span,
            };
        }
        res.success(node)
    }

    /// `arith_expr := term (('+'|'-') term)*`
    fn arith_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let mut node = match res.register(self.term()) {
            Some(v) => v,
            None => return res,
        };
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            res.register_advancement();
            self.advance();
            let right = match res.register(self.term()) {
                Some(v) => v,
                None => return res,
            };
            let span = node.span().merge(right.span());
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
                span,
            };
        }
        res.success(node)
    }

    /// `term := factor (('*'|'/'|'//'|'%'|'?') factor)*`
    fn term(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let mut node = match res.register(self.factor()) {
            Some(v) => v,
            None => return res,
        };
        loop {
            let op = match self.current().kind {
                TokenKind::Multiply => BinOp::Mul,
                TokenKind::Divide => BinOp::Div,
                TokenKind::FloorDivide => BinOp::FloorDiv,
                TokenKind::Modulo => BinOp::Mod,
                TokenKind::Index => BinOp::Index,
                _ => break,
            };
            res.register_advancement();
            self.advance();
            let right = match res.register(self.factor()) {
                Some(v) => v,
                None => return res,
            };
            let span = node.span().merge(right.span());
            node = Expr::BinaryOp {
                op,
                left: Box::new(node),
                right: Box::new(right),
                span,
            };
        }
        res.success(node)
    }

    /// `factor := ('+'|'-') factor | power`
    fn factor(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        match self.current().kind {
            TokenKind::Minus => {
                res.register_advancement();
                self.advance();
                let operand = match res.register(self.factor()) {
                    Some(v) => v,
                    None => return res,
                };
                let end = operand.span().end.clone();
                res.success(Expr::UnaryOp {
                    op: UnOp::Neg,
                    operand: Box::new(operand),
                    span: start.span_to(&end),
                })
            }
            TokenKind::Plus => {
                // `+x` has no semantic effect; normalize it away here
                // rather than carry a no-op node through evaluation.
                res.register_advancement();
                self.advance();
                self.factor()
            }
            _ => self.power(),
        }
    }

    /// `power := call ('^' factor)*`
    fn power(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let mut node = match res.register(self.call()) {
            Some(v) => v,
            None => return res,
        };
        while self.current().kind == TokenKind::Power {
            res.register_advancement();
            self.advance();
            let right = match res.register(self.factor()) {
                Some(v) => v,
                None => return res,
            };
            let span = node.span().merge(right.span());
            node = Expr::BinaryOp {
                op: BinOp::Pow,
                left: Box::new(node),
                right: Box::new(right),
                span,
            };
        }
        res.success(node)
    }

    /// `call := complex ( '(' (expression (',' expression)*)? ')' )?`
    fn call(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let callee = match res.register(self.complex()) {
            Some(v) => v,
            None => return res,
        };
        if self.current().kind != TokenKind::LParen(ParenKind::Round) {
            return res.success(callee);
        }
        res.register_advancement();
        self.advance();
        let mut args = Vec::new();
        if self.current().kind != TokenKind::RParen(ParenKind::Round) {
            let first = match res.register(self.expression()) {
                Some(v) => v,
                None => return res,
            };
            args.push(first);
            while self.current().kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();
                let next = match res.register(self.expression()) {
                    Some(v) => v,
                    None => return res,
                };
                args.push(next);
            }
        }
        if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Round), "')'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();
        let call_end = self.prev_end();
        let span = callee.span().start.span_to(&call_end);
        res.success(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    /// `complex := INT | FLOAT | STRING | IDENT | '(' expression ')' |`
    /// `list_expr | dict_expr | if_expr | for_expr | while_expr | func_def`
    fn complex(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Int => {
                res.register_advancement();
                self.advance();
                let value = match tok.literal {
                    crate::token::Literal::Int(i) => crate::value::Number::Int(i),
                    _ => unreachable!(),
                };
                res.success(Expr::Number {
                    value,
                    span: tok.span(),
                })
            }
            TokenKind::Float => {
                res.register_advancement();
                self.advance();
                let value = match tok.literal {
                    crate::token::Literal::Float(f) => crate::value::Number::Float(f),
                    _ => unreachable!(),
                };
                res.success(Expr::Number {
                    value,
                    span: tok.span(),
                })
            }
            TokenKind::String => {
                res.register_advancement();
                self.advance();
                let value = tok.as_identifier().to_string();
                res.success(Expr::Str {
                    value,
                    span: tok.span(),
                })
            }
            TokenKind::Identifier => {
                res.register_advancement();
                self.advance();
                res.success(Expr::VarAccess {
                    name: Identifier::from(tok.as_identifier()),
                    span: tok.span(),
                })
            }
            TokenKind::LParen(ParenKind::Round) => {
                res.register_advancement();
                self.advance();
                let inner = match res.register(self.expression()) {
                    Some(v) => v,
                    None => return res,
                };
                if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Round), "')'") {
                    return res.failure(e);
                }
                res.register_advancement();
                self.advance();
                res.success(inner)
            }
            TokenKind::LParen(ParenKind::Square) => self.list_expr(),
            TokenKind::LParen(ParenKind::Curly) => self.dict_expr(),
            TokenKind::Keyword(Keyword::Whether) => self.if_expr(),
            TokenKind::Keyword(Keyword::StartCycle) => self.for_expr(),
            TokenKind::Keyword(Keyword::AsLongAs) => self.while_expr(),
            TokenKind::Keyword(Keyword::Method) => self.func_def(),
            _ => res.failure(ThistleError::invalid_syntax(
                "expected an int, float, string, identifier, '(', '[', '{', 'whether', \
                 'StartCycle', 'AsLongAs', or 'Method'",
                tok.span(),
            )),
        }
    }

    /// `list_expr := '[' (expression (',' expression)*)? ']'`
    fn list_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        res.register_advancement();
        self.advance();
        let mut items = Vec::new();
        if self.current().kind != TokenKind::RParen(ParenKind::Square) {
            let first = match res.register(self.expression()) {
                Some(v) => v,
                None => return res,
            };
            items.push(first);
            while self.current().kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();
                let next = match res.register(self.expression()) {
                    Some(v) => v,
                    None => return res,
                };
                items.push(next);
            }
        }
        if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Square), "']'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();
        let end = self.prev_end();
        res.success(Expr::List {
            items,
            span: start.span_to(&end),
        })
    }

    /// `dict_expr := '{' (expression ':' expression (',' expression ':' expression)*)? '}'`
    fn dict_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        res.register_advancement();
        self.advance();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        if self.current().kind != TokenKind::RParen(ParenKind::Curly) {
            let (k, v) = match self.dict_pair(&mut res) {
                Some(pair) => pair,
                None => return res,
            };
            keys.push(k);
            values.push(v);
            while self.current().kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();
                let (k, v) = match self.dict_pair(&mut res) {
                    Some(pair) => pair,
                    None => return res,
                };
                keys.push(k);
                values.push(v);
            }
        }
        if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Curly), "'}'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();
        let end = self.prev_end();
        res.success(Expr::Dictionary {
            keys,
            values,
            span: start.span_to(&end),
        })
    }

    fn dict_pair(&mut self, res: &mut ParseResult<Expr>) -> Option<(Expr, Expr)> {
        let key = res.register(self.expression())?;
        if self.current().kind != TokenKind::Colon {
            res.error = Some(ThistleError::invalid_syntax("expected ':'", self.current().span()));
            return None;
        }
        res.register_advancement();
        self.advance();
        let value = res.register(self.expression())?;
        Some((key, value))
    }

    /// `if_expr := 'whether' expression '{' body ('further' expression '{' body)* ('ifnot' '{' body)?`
    fn if_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        res.register_advancement();
        self.advance();

        let mut clauses = Vec::new();
        match self.if_clause(&mut res) {
            Some(clause) => clauses.push(clause),
            None => return res,
        }

        while self.current().kind == TokenKind::Keyword(Keyword::Further) {
            res.register_advancement();
            self.advance();
            match self.if_clause(&mut res) {
                Some(clause) => clauses.push(clause),
                None => return res,
            }
        }

        let mut else_branch = None;
        if self.current().kind == TokenKind::Keyword(Keyword::Ifnot) {
            res.register_advancement();
            self.advance();
            if let Err(e) = self.expect(TokenKind::LParen(ParenKind::Curly), "'{'") {
                return res.failure(e);
            }
            res.register_advancement();
            self.advance();
            let (body, multi) = match res.register(self.block_body()) {
                Some(v) => v,
                None => return res,
            };
            else_branch = Some((Box::new(body), multi));
        }

        let end = self.prev_end();
        res.success(Expr::If {
            clauses,
            else_branch,
            span: start.span_to(&end),
        })
    }

    fn if_clause(&mut self, res: &mut ParseResult<Expr>) -> Option<IfClause> {
        let condition = res.register(self.expression())?;
        if self.current().kind != TokenKind::LParen(ParenKind::Curly) {
            res.error = Some(ThistleError::invalid_syntax("expected '{'", self.current().span()));
            return None;
        }
        res.register_advancement();
        self.advance();
        let (body, multi_line) = res.register(self.block_body())?;
        Some(IfClause {
            condition,
            body,
            multi_line,
        })
    }

    /// `for_expr := 'StartCycle' IDENT '=' expression ':' expression (':' expression)? '{' body`
    fn for_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        res.register_advancement();
        self.advance();

        if self.current().kind != TokenKind::Identifier {
            return res.failure(ThistleError::invalid_syntax(
                "expected an identifier",
                self.current().span(),
            ));
        }
        let var_name = Identifier::from(self.current().as_identifier());
        res.register_advancement();
        self.advance();

        if let Err(e) = self.expect(TokenKind::Equal, "'='") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let start_expr = match res.register(self.expression()) {
            Some(v) => v,
            None => return res,
        };

        if let Err(e) = self.expect(TokenKind::Colon, "':'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let end_expr = match res.register(self.expression()) {
            Some(v) => v,
            None => return res,
        };

        let mut step_expr = None;
        if self.current().kind == TokenKind::Colon {
            res.register_advancement();
            self.advance();
            let step = match res.register(self.expression()) {
                Some(v) => v,
                None => return res,
            };
            step_expr = Some(Box::new(step));
        }

        if let Err(e) = self.expect(TokenKind::LParen(ParenKind::Curly), "'{'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let (body, discard) = match res.register(self.block_body()) {
            Some(v) => v,
            None => return res,
        };

        let span_end = self.prev_end();
        res.success(Expr::For {
            var_name,
            start: Box::new(start_expr),
            end: Box::new(end_expr),
            step: step_expr,
            body: Box::new(body),
            discard_result: discard,
            span: start.span_to(&span_end),
        })
    }

    /// `while_expr := 'AsLongAs' '(' expression ')' '{' body`
    fn while_expr(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        res.register_advancement();
        self.advance();

        if let Err(e) = self.expect(TokenKind::LParen(ParenKind::Round), "'('") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let condition = match res.register(self.expression()) {
            Some(v) => v,
            None => return res,
        };

        if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Round), "')'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        if let Err(e) = self.expect(TokenKind::LParen(ParenKind::Curly), "'{'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let (body, discard) = match res.register(self.block_body()) {
            Some(v) => v,
            None => return res,
        };

        let end = self.prev_end();
        res.success(Expr::While {
            condition: Box::new(condition),
            body: Box::new(body),
            discard_result: discard,
            span: start.span_to(&end),
        })
    }

    /// `func_def := 'Method' IDENT? '(' (IDENT (',' IDENT)*)? ')' '{' body`
    fn func_def(&mut self) -> ParseResult<Expr> {
        let mut res = ParseResult::new();
        let start = self.current().start.clone();
        res.register_advancement();
        self.advance();

        let mut name = None;
        if self.current().kind == TokenKind::Identifier {
            name = Some(Identifier::from(self.current().as_identifier()));
            res.register_advancement();
            self.advance();
        }

        if let Err(e) = self.expect(TokenKind::LParen(ParenKind::Round), "'('") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let mut params = Vec::new();
        if self.current().kind == TokenKind::Identifier {
            params.push(Identifier::from(self.current().as_identifier()));
            res.register_advancement();
            self.advance();
            while self.current().kind == TokenKind::Comma {
                res.register_advancement();
                self.advance();
                if self.current().kind != TokenKind::Identifier {
                    return res.failure(ThistleError::invalid_syntax(
                        "expected an identifier",
                        self.current().span(),
                    ));
                }
                params.push(Identifier::from(self.current().as_identifier()));
                res.register_advancement();
                self.advance();
            }
        }

        if let Err(e) = self.expect(TokenKind::RParen(ParenKind::Round), "')'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        if let Err(e) = self.expect(TokenKind::LParen(ParenKind::Curly), "'{'") {
            return res.failure(e);
        }
        res.register_advancement();
        self.advance();

        let (body, discard) = match res.register(self.block_body()) {
            Some(v) => v,
            None => return res,
        };

        let end = self.prev_end();
        res.success(Expr::FuncDef {
            name,
            params,
            body: Rc::new(body),
            discard_result: discard,
            span: start.span_to(&end),
        })
    }
}

pub fn parse(tokens: Vec<Token>) -> Result<Expr, ThistleError> {
    Parser::parse(tokens)
}
