//! Indentation-sensitive tokeniser for PB (spec §4.1).
//!
//! Consumes source text as a sequence of Unicode scalar values and produces a
//! flat `Vec<Token>` terminated by `Eof`. Indentation discipline (INDENT /
//! DEDENT synthesis), numeric-literal underscore handling, and f-string brace
//! scanning all live here; everything downstream only ever sees tokens.

mod error;
mod span;
mod token;

pub use error::{LexError, LexResult};
pub use span::Span;
pub use token::{Keyword, Op, Token, TokenKind};

use log::trace;

/// Tokenises a complete source file.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
        let mut lexer = Self::new(source);
        lexer.run()?;
        Ok(lexer.tokens)
    }

    fn here(&self) -> Span {
        Span::new(self.line, self.col, 0)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        trace!("emit {kind:?} at {span}");
        self.tokens.push(Token::new(kind, span));
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Drives the whole file. Top-level loop: at the start of every logical
    /// line, measure indentation (spec §4.1); otherwise lex one token at a
    /// time until a NEWLINE.
    fn run(&mut self) -> LexResult<()> {
        loop {
            if self.at_line_start {
                if self.consume_indentation()? {
                    // blank or comment-only line: indentation stack untouched,
                    // a NEWLINE was already emitted by consume_indentation.
                    continue;
                }
                self.at_line_start = false;
            }

            if self.at_eof() {
                break;
            }

            match self.peek().unwrap() {
                '\n' => {
                    let span = self.here();
                    self.advance();
                    self.push(TokenKind::Newline, span);
                    self.at_line_start = true;
                }
                ' ' | '\t' => {
                    self.advance();
                }
                '\r' => {
                    self.advance();
                }
                '#' => self.skip_comment(),
                '0'..='9' => self.lex_number()?,
                c if c == '_' || c.is_alphabetic() => self.lex_ident_or_prefixed_string()?,
                '"' | '\'' => {
                    let quote = self.peek().unwrap();
                    self.lex_string(quote, false)?;
                }
                _ => self.lex_operator()?,
            }
        }

        // Close any still-open logical line without a trailing newline.
        if self.tokens.last().map(|t| t.kind != TokenKind::Newline) == Some(true) {
            self.push(TokenKind::Newline, self.here());
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, self.here());
        }

        self.push(TokenKind::Eof, self.here());

        Ok(())
    }

    /// Measures the leading whitespace of a logical line and synthesises
    /// INDENT/DEDENT tokens. Returns `true` if the line was blank or
    /// comment-only (caller should loop back without further processing).
    fn consume_indentation(&mut self) -> LexResult<bool> {
        let start_span = self.here();
        let mut width = 0usize;
        let mut saw_tab = false;

        loop {
            match self.peek() {
                Some(' ') => {
                    width += 1;
                    self.advance();
                }
                Some('\t') => {
                    saw_tab = true;
                    self.advance();
                }
                _ => break,
            }
        }

        if saw_tab {
            return Err(LexError::new("mixed indentation: tabs are not permitted in leading whitespace", start_span));
        }

        match self.peek() {
            None => {
                self.at_line_start = false;
                Ok(false)
            }
            Some('\n') | Some('#') | Some('\r') => {
                // Blank or comment-only line: consume to end of line, emit a
                // single NEWLINE, leave the indent stack untouched.
                if self.peek() == Some('#') {
                    self.skip_comment_text();
                }
                if self.peek() == Some('\r') {
                    self.advance();
                }
                let span = self.here();
                if self.peek() == Some('\n') {
                    self.advance();
                }
                self.push(TokenKind::Newline, span);
                Ok(true)
            }
            Some(_) => {
                let top = *self.indent_stack.last().unwrap();
                if width > top {
                    self.indent_stack.push(width);
                    self.push(TokenKind::Indent, Span::new(self.line, 1, 0));
                } else if width < top {
                    while *self.indent_stack.last().unwrap() > width {
                        self.indent_stack.pop();
                        self.push(TokenKind::Dedent, Span::new(self.line, 1, 0));
                    }
                    if *self.indent_stack.last().unwrap() != width {
                        return Err(LexError::new(
                            "unindent does not match any outer indentation level",
                            start_span,
                        ));
                    }
                }
                Ok(false)
            }
        }
    }

    fn skip_comment(&mut self) {
        self.skip_comment_text();
    }

    fn skip_comment_text(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn lex_operator(&mut self) -> LexResult<()> {
        let start = self.here();
        let c = self.advance().unwrap();

        macro_rules! two {
            ($second:expr, $double:expr, $single:expr) => {{
                if self.peek() == Some($second) {
                    self.advance();
                    $double
                } else {
                    $single
                }
            }};
        }

        let op = match c {
            '+' => two!('=', Op::PlusEq, Op::Plus),
            '-' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Op::MinusEq
                } else if self.peek() == Some('>') {
                    self.advance();
                    Op::Arrow
                } else {
                    Op::Minus
                }
            }
            '*' => two!('=', Op::StarEq, Op::Star),
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    two!('=', Op::SlashSlashEq, Op::SlashSlash)
                } else {
                    two!('=', Op::SlashEq, Op::Slash)
                }
            }
            '%' => two!('=', Op::PercentEq, Op::Percent),
            '=' => two!('=', Op::EqEq, Op::Eq),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Op::NotEq
                } else {
                    return Err(LexError::new("unexpected character '!'", start));
                }
            }
            '<' => two!('=', Op::LtEq, Op::Lt),
            '>' => two!('=', Op::GtEq, Op::Gt),
            '(' => Op::LParen,
            ')' => Op::RParen,
            '[' => Op::LBracket,
            ']' => Op::RBracket,
            '{' => Op::LBrace,
            '}' => Op::RBrace,
            ':' => Op::Colon,
            ',' => Op::Comma,
            ';' => Op::Semi,
            '.' => {
                if matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                    return Err(LexError::new(
                        "invalid numeric literal: a float requires a digit before the decimal point",
                        start,
                    ));
                }
                Op::Dot
            }
            other => {
                return Err(LexError::new(format!("unexpected character '{other}'"), start));
            }
        };

        let span = Span::new(start.line, start.col, self.col.saturating_sub(start.col).max(1));
        self.push(TokenKind::Op(op), span);
        Ok(())
    }

    fn lex_ident_or_prefixed_string(&mut self) -> LexResult<()> {
        let start = self.here();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '_' || c.is_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if text == "f" && matches!(self.peek(), Some('"') | Some('\'')) {
            let quote = self.peek().unwrap();
            return self.lex_string(quote, true);
        }

        let span = Span::new(start.line, start.col, text.chars().count());
        if let Some(keyword) = Keyword::lookup(&text) {
            self.push(TokenKind::Keyword(keyword), span);
        } else {
            self.push(TokenKind::Ident(text), span);
        }
        Ok(())
    }

    fn lex_number(&mut self) -> LexResult<()> {
        let start = self.here();

        let int_part = self.consume_digit_run();
        let int_text = self.validate_underscore_run(&int_part, start)?;

        let mut is_float = false;
        let mut frac_text = String::new();
        let mut exp_text = String::new();
        let mut exp_sign = "";

        if self.peek() == Some('.') {
            let after = self.peek_at(1);
            if matches!(after, Some(d) if d.is_ascii_digit()) {
                is_float = true;
                self.advance(); // '.'
                let frac_part = self.consume_digit_run();
                frac_text = self.validate_underscore_run(&frac_part, start)?;
            } else {
                return Err(LexError::new(
                    "invalid numeric literal: a float requires a digit after the decimal point",
                    start,
                ));
            }
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                exp_sign = if self.peek() == Some('-') { "-" } else { "+" };
                self.advance();
            }
            let exp_part = self.consume_digit_run();
            if exp_part.is_empty() {
                return Err(LexError::new(
                    "invalid numeric literal: exponent requires at least one digit",
                    start,
                ));
            }
            exp_text = self.validate_underscore_run(&exp_part, start)?;
        }

        let len = self.col.saturating_sub(start.col).max(1);
        let span = Span::new(start.line, start.col, len);

        if is_float {
            let mut literal = format!("{int_text}.{frac_text}");
            if !exp_text.is_empty() {
                literal.push('e');
                literal.push_str(exp_sign);
                literal.push_str(&exp_text);
            }
            let value: f64 = literal
                .parse()
                .map_err(|_| LexError::new(format!("invalid float literal '{literal}'"), start))?;
            self.push(TokenKind::Float(value), span);
        } else {
            let value: i64 = int_text
                .parse()
                .map_err(|_| LexError::new(format!("invalid integer literal '{int_text}'"), start))?;
            self.push(TokenKind::Int(value), span);
        }

        Ok(())
    }

    fn consume_digit_run(&mut self) -> String {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                raw.push(c);
                self.advance();
            } else {
                break;
            }
        }
        raw
    }

    /// Strips underscores from a digit run after validating that they only
    /// appear strictly between two digits (spec §4.1).
    fn validate_underscore_run(&self, raw: &str, span: Span) -> LexResult<String> {
        if raw.starts_with('_') || raw.ends_with('_') {
            return Err(LexError::new(
                "numeric literal cannot start or end with an underscore",
                span,
            ));
        }
        if raw.contains("__") {
            return Err(LexError::new(
                "numeric literal cannot contain two adjacent underscores",
                span,
            ));
        }
        Ok(raw.chars().filter(|c| *c != '_').collect())
    }

    fn decode_escape(&mut self, start: Span) -> LexResult<char> {
        let Some(c) = self.advance() else {
            return Err(LexError::new("unterminated string literal", start));
        };
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            '0' => '\0',
            other => {
                return Err(LexError::new(format!("unknown escape sequence '\\{other}'"), start));
            }
        })
    }

    /// Lexes a single- or double-quoted string literal, or (when
    /// `is_fstring`) an f-string, which expands into a `FStringStart` /
    /// `FStringMiddle` / `FStringExprStart` ... `FStringExprEnd` /
    /// `FStringEnd` run. The expression portions are lexed by recursively
    /// invoking the ordinary token lexer (spec §4.1).
    fn lex_string(&mut self, quote: char, is_fstring: bool) -> LexResult<()> {
        let start = self.here();
        if is_fstring {
            self.advance(); // 'f'
        }
        self.advance(); // opening quote

        if is_fstring {
            self.push(TokenKind::FStringStart, start);
            self.lex_fstring_body(quote, start)?;
            return Ok(());
        }

        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexError::new("unterminated string literal", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let esc_start = self.here();
                    self.advance();
                    value.push(self.decode_escape(esc_start)?);
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        let span = Span::new(start.line, start.col, self.col.saturating_sub(start.col).max(1));
        self.push(TokenKind::Str(value), span);
        Ok(())
    }

    fn lex_fstring_body(&mut self, quote: char, start: Span) -> LexResult<()> {
        let mut middle = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexError::new("unterminated f-string literal", start));
                }
                Some(c) if c == quote => {
                    self.advance();
                    if !middle.is_empty() {
                        self.push(TokenKind::FStringMiddle(std::mem::take(&mut middle)), self.here());
                    }
                    self.push(TokenKind::FStringEnd, self.here());
                    return Ok(());
                }
                Some('{') if self.peek_at(1) == Some('{') => {
                    middle.push('{');
                    self.advance();
                    self.advance();
                }
                Some('}') if self.peek_at(1) == Some('}') => {
                    middle.push('}');
                    self.advance();
                    self.advance();
                }
                Some('{') => {
                    if !middle.is_empty() {
                        self.push(TokenKind::FStringMiddle(std::mem::take(&mut middle)), self.here());
                    }
                    let brace_start = self.here();
                    self.advance();
                    self.push(TokenKind::FStringExprStart, brace_start);
                    self.lex_fstring_expr()?;
                }
                Some('\\') => {
                    let esc_start = self.here();
                    self.advance();
                    middle.push(self.decode_escape(esc_start)?);
                }
                Some(c) => {
                    middle.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Lexes ordinary tokens until the `}` that matches the `{` which opened
    /// this placeholder, tracking brace depth so a nested literal (e.g. a
    /// dict literal) inside the expression does not end the placeholder
    /// early.
    fn lex_fstring_expr(&mut self) -> LexResult<()> {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => return Err(LexError::new("unterminated f-string expression", self.here())),
                Some('}') if depth == 1 => {
                    let span = self.here();
                    self.advance();
                    self.push(TokenKind::FStringExprEnd, span);
                    return Ok(());
                }
                Some('}') => {
                    depth -= 1;
                    self.lex_operator()?;
                }
                Some('{') => {
                    depth += 1;
                    self.lex_operator()?;
                }
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    return Err(LexError::new("f-string expressions must be single line", self.here()));
                }
                Some('#') => self.skip_comment_text(),
                Some('0'..='9') => self.lex_number()?,
                Some(c) if c == '_' || c.is_alphabetic() => self.lex_ident_or_prefixed_string()?,
                Some('"') | Some('\'') => {
                    let q = self.peek().unwrap();
                    self.lex_string(q, false)?;
                }
                Some(_) => self.lex_operator()?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn indent_and_dedent_are_synthesised() {
        let kinds = kinds("if True:\n    pass\npass\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::If),
                TokenKind::Keyword(Keyword::True),
                TokenKind::Op(Op::Colon),
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Keyword(Keyword::Pass),
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Keyword(Keyword::Pass),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_change_indentation() {
        let kinds = kinds("if True:\n    pass\n\n    # a comment\n    pass\n");
        let indents = kinds.iter().filter(|k| matches!(k, TokenKind::Indent)).count();
        let dedents = kinds.iter().filter(|k| matches!(k, TokenKind::Dedent)).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn tab_in_indentation_is_rejected() {
        let err = Lexer::tokenize("if True:\n\tpass\n").unwrap_err();
        assert!(err.message.contains("mixed indentation"));
    }

    #[test]
    fn dedent_to_unknown_level_is_rejected() {
        let err = Lexer::tokenize("if True:\n        pass\n    pass\n").unwrap_err();
        assert!(err.message.contains("unindent"));
    }

    #[test]
    fn numeric_underscores_are_stripped() {
        assert_eq!(kinds("1_000"), vec![TokenKind::Int(1000), TokenKind::Newline, TokenKind::Eof]);
        assert_eq!(kinds("1_000.5"), vec![TokenKind::Float(1000.5), TokenKind::Newline, TokenKind::Eof]);
    }

    #[test]
    fn numeric_underscore_boundary_errors() {
        assert!(Lexer::tokenize("1__2").is_err());
        assert!(Lexer::tokenize("1_").is_err());
    }

    #[test]
    fn leading_and_trailing_dot_floats_are_rejected() {
        assert!(Lexer::tokenize("5.").is_err());
        assert!(Lexer::tokenize(".5").is_err());
    }

    #[test]
    fn string_escapes_decode() {
        assert_eq!(kinds("\"a\\nb\""), vec![TokenKind::Str("a\nb".to_string()), TokenKind::Newline, TokenKind::Eof]);
    }

    #[test]
    fn unknown_escape_is_an_error() {
        assert!(Lexer::tokenize("\"\\q\"").is_err());
    }

    #[test]
    fn fstring_splits_text_and_expression_segments() {
        let kinds = kinds("f\"hi {name}!\"");
        assert_eq!(
            kinds,
            vec![
                TokenKind::FStringStart,
                TokenKind::FStringMiddle("hi ".to_string()),
                TokenKind::FStringExprStart,
                TokenKind::Ident("name".to_string()),
                TokenKind::FStringExprEnd,
                TokenKind::FStringMiddle("!".to_string()),
                TokenKind::FStringEnd,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn fstring_tracks_nested_brace_depth() {
        let kinds = kinds("f\"{ {1: 2}[key] }\"");
        assert!(kinds.contains(&TokenKind::Op(Op::LBrace)));
        assert!(kinds.contains(&TokenKind::Op(Op::RBrace)));
    }

    #[test]
    fn true_false_none_are_keywords_not_identifiers() {
        assert_eq!(kinds("True"), vec![TokenKind::Keyword(Keyword::True), TokenKind::Newline, TokenKind::Eof]);
        assert_eq!(kinds("false"), vec![TokenKind::Ident("false".to_string()), TokenKind::Newline, TokenKind::Eof]);
    }
}
