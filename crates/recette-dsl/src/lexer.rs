use logos::Logos;
use recette_core::{LineIndex, Span};
use std::fmt;
use std::ops::Range;

/// Token type for the assembler grammar.
///
/// Mnemonics, registers and directives are all `Token::Ident`; the parser
/// tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Double indirection `@`.
    At,
    /// Assignment `=`.
    Equals,
    /// `+`.
    Plus,
    /// `-`.
    Minus,
    /// `*`.
    Times,
    /// Label terminator `:`.
    Colon,
    /// Immediate marker `#`.
    Sharp,
    /// Operand separator `,`.
    Comma,
    /// Left parenthesis `(`.
    LParen,
    /// Right parenthesis `)`.
    RParen,
    /// End of line (statement separator).
    Eol,
    /// End of input. Always the last token.
    Eof,
    /// Identifier, including local labels such as `10$`.
    Ident(String),
    /// Integer literal: value of the leading digit run and the source text.
    Integer(i64, String),
    /// Character literal `'c`.
    Char(char),
    /// String literal, without its delimiters.
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::At => write!(f, "'@'"),
            Token::Equals => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Times => write!(f, "'*'"),
            Token::Colon => write!(f, "':'"),
            Token::Sharp => write!(f, "'#'"),
            Token::Comma => write!(f, "','"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Eol => write!(f, "end of line"),
            Token::Eof => write!(f, "end of file"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::Integer(_, raw) => write!(f, "{raw}"),
            Token::Char(c) => write!(f, "'{c}"),
            Token::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\x00]+")]
#[logos(skip r";[^\n]*")]
enum RawToken {
    #[token("\n")]
    Newline,

    #[token("@")]
    At,

    #[token("=")]
    Equals,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Times,

    #[token(":")]
    Colon,

    #[token("#")]
    Sharp,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("\"")]
    DoubleQuote,

    #[token("/")]
    Slash,

    #[token("'")]
    Apostrophe,

    #[regex(r"[A-Za-z.][A-Za-z0-9.]*")]
    Ident,

    #[regex(r"[0-9][0-9.]*")]
    Integer,

    #[regex(r"[0-9][0-9.]*\$")]
    LocalLabel,
}

/// A lexer error with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Location of the erroneous input.
    pub span: Span,
    /// Human-readable description of the lexer error.
    pub message: String,
}

/// Streaming lexer over assembler source.
///
/// Yields `(Token, Span)` pairs and ends with exactly one [`Token::Eof`].
/// Errors are collected on the side; lexing never stops early.
pub struct Lexer<'src> {
    raw: logos::Lexer<'src, RawToken>,
    index: LineIndex<'src>,
    /// Set by an identifier reading exactly `.ASCII`, cleared by any other
    /// identifier. While set, `'` delimits a string.
    ascii_mode: bool,
    unexpected: Option<Range<usize>>,
    errors: Vec<LexError>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Start lexing `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            raw: RawToken::lexer(source),
            index: LineIndex::new(source),
            ascii_mode: false,
            unexpected: None,
            errors: Vec::new(),
            finished: false,
        }
    }

    /// Whether `'` currently delimits strings.
    pub fn ascii_mode(&self) -> bool {
        self.ascii_mode
    }

    /// Errors reported so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    /// Consume the lexer, returning its errors.
    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    /// Produce the next token. After [`Token::Eof`] every call returns
    /// `Eof` again.
    pub fn next_token(&mut self) -> (Token, Span) {
        loop {
            let Some(result) = self.raw.next() else {
                self.flush_unexpected();
                self.finished = true;
                return (Token::Eof, Span::empty(self.index.end()));
            };
            let range = self.raw.span();
            let raw = match result {
                Ok(raw) => raw,
                Err(()) => {
                    self.mark_unexpected(range);
                    continue;
                }
            };
            self.flush_unexpected();

            let token = match raw {
                RawToken::Newline => Token::Eol,
                RawToken::At => Token::At,
                RawToken::Equals => Token::Equals,
                RawToken::Plus => Token::Plus,
                RawToken::Minus => Token::Minus,
                RawToken::Times => Token::Times,
                RawToken::Colon => Token::Colon,
                RawToken::Sharp => Token::Sharp,
                RawToken::Comma => Token::Comma,
                RawToken::LParen => Token::LParen,
                RawToken::RParen => Token::RParen,
                RawToken::DoubleQuote => return self.string('"', range),
                RawToken::Slash => return self.string('/', range),
                RawToken::Apostrophe if self.ascii_mode => return self.string('\'', range),
                RawToken::Apostrophe => match self.char_literal(&range) {
                    Some(token) => return token,
                    None => continue,
                },
                RawToken::Ident => {
                    let name = self.raw.slice();
                    self.ascii_mode = name == ".ASCII";
                    Token::Ident(name.to_string())
                }
                RawToken::LocalLabel => Token::Ident(self.raw.slice().to_string()),
                RawToken::Integer => self.integer(&range),
            };
            return (token, self.index.span_of_bytes(range));
        }
    }

    fn mark_unexpected(&mut self, range: Range<usize>) {
        self.unexpected = match self.unexpected.take() {
            Some(pending) => Some(pending.start..range.end),
            None => Some(range),
        };
    }

    fn flush_unexpected(&mut self) {
        if let Some(range) = self.unexpected.take() {
            let text = self.index.text().get(range.clone()).unwrap_or_default();
            self.errors.push(LexError {
                span: self.index.span_of_bytes(range),
                message: format!("unexpected characters: {text:?}"),
            });
        }
    }

    /// Scan to the closing delimiter. Strings may span lines; a missing
    /// delimiter reports an error and keeps the partial content.
    fn string(&mut self, delimiter: char, open: Range<usize>) -> (Token, Span) {
        let remainder = self.raw.remainder();
        let (content, consumed) = match remainder.find(delimiter) {
            Some(end) => (remainder[..end].to_string(), end + delimiter.len_utf8()),
            None => {
                let span = self.index.span_of_bytes(open.start..open.end + remainder.len());
                self.errors.push(LexError {
                    span,
                    message: "unterminated string".to_string(),
                });
                (remainder.to_string(), remainder.len())
            }
        };
        self.raw.bump(consumed);
        let span = self.index.span_of_bytes(open.start..open.end + consumed);
        (Token::Str(content), span)
    }

    fn char_literal(&mut self, open: &Range<usize>) -> Option<(Token, Span)> {
        let Some(c) = self.raw.remainder().chars().next() else {
            self.errors.push(LexError {
                span: self.index.span_of_bytes(open.clone()),
                message: "unterminated character literal".to_string(),
            });
            return None;
        };
        self.raw.bump(c.len_utf8());
        let span = self.index.span_of_bytes(open.start..open.end + c.len_utf8());
        Some((Token::Char(c), span))
    }

    /// The value is the leading run of decimal digits; `1.5` reads as 1.
    fn integer(&mut self, range: &Range<usize>) -> Token {
        let raw = self.raw.slice().to_string();
        let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
        match digits.parse::<i64>() {
            Ok(value) => Token::Integer(value, raw),
            Err(_) => {
                self.errors.push(LexError {
                    span: self.index.span_of_bytes(range.clone()),
                    message: format!("invalid integer literal: {raw}"),
                });
                Token::Integer(0, raw)
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = (Token, Span);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

/// Lex source code into a sequence of `(Token, Span)` pairs ending in
/// [`Token::Eof`].
///
/// Returns the token stream and any lexer errors. Lexing continues past errors
/// to collect as many tokens as possible.
pub fn lex(source: &str) -> (Vec<(Token, Span)>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let tokens: Vec<_> = lexer.by_ref().collect();
    (tokens, lexer.into_errors())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<String> {
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty(), "errors: {errors:?}");
        tokens.iter().map(|(t, _)| t.to_string()).collect()
    }

    #[test]
    fn lex_instruction() {
        assert_eq!(
            kinds("MOV #10, R0\n"),
            vec!["MOV", "'#'", "10", "','", "R0", "end of line", "end of file"]
        );
    }

    #[test]
    fn stream_always_ends_with_eof() {
        let (tokens, errors) = lex("");
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].0, Token::Eof);
    }

    #[test]
    fn comments_are_skipped() {
        let (tokens, _) = lex("; set up the stack\nRTS PC ; return");
        let names: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(
            names,
            vec![
                Token::Eol,
                Token::Ident("RTS".to_string()),
                Token::Ident("PC".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn local_labels_are_identifiers() {
        let (tokens, _) = lex("10$: BR 10$");
        assert_eq!(tokens[0].0, Token::Ident("10$".to_string()));
        assert_eq!(tokens[1].0, Token::Colon);
        assert_eq!(tokens[3].0, Token::Ident("10$".to_string()));
    }

    #[test]
    fn integers_keep_source_text() {
        let (tokens, _) = lex("177776 12.");
        assert_eq!(tokens[0].0, Token::Integer(177_776, "177776".to_string()));
        assert_eq!(tokens[1].0, Token::Integer(12, "12.".to_string()));
    }

    #[test]
    fn oversized_integer_is_reported() {
        let (tokens, errors) = lex("99999999999999999999");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("invalid integer literal"));
        assert!(matches!(tokens[0].0, Token::Integer(0, _)));
    }

    #[test]
    fn apostrophe_is_char_literal_outside_ascii_mode() {
        let (tokens, errors) = lex("MOVB #'A, R0");
        assert!(errors.is_empty());
        assert_eq!(tokens[2].0, Token::Char('A'));
        assert_eq!(tokens[2].1.offsets(), 6..8);
    }

    #[test]
    fn ascii_directive_switches_apostrophe_to_string() {
        let (tokens, errors) = lex(".ASCII 'hello'");
        assert!(errors.is_empty());
        assert_eq!(tokens[1].0, Token::Str("hello".to_string()));
        assert_eq!(tokens[1].1.offsets(), 7..14);
    }

    #[test]
    fn ascii_mode_is_sticky_until_next_identifier() {
        // Punctuation and newlines keep the mode; only an identifier resets it.
        let (tokens, errors) = lex(".ASCII 'a', 'b'\n'c'\nMOV 'd");
        assert!(errors.is_empty(), "errors: {errors:?}");
        let values: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
        assert_eq!(values[1], Token::Str("a".to_string()));
        assert_eq!(values[3], Token::Str("b".to_string()));
        assert_eq!(values[5], Token::Str("c".to_string()));
        assert_eq!(values[8], Token::Char('d'));
    }

    #[test]
    fn ascii_mode_flag_is_observable() {
        let mut lexer = Lexer::new(".ASCII /x/ MOV");
        assert!(!lexer.ascii_mode());
        lexer.next_token();
        assert!(lexer.ascii_mode());
        lexer.next_token();
        assert!(lexer.ascii_mode());
        lexer.next_token();
        assert!(!lexer.ascii_mode());
    }

    #[test]
    fn double_quote_and_slash_always_delimit_strings() {
        let (tokens, errors) = lex(".ASCIZ \"ok\" /fine/");
        assert!(errors.is_empty());
        assert_eq!(tokens[1].0, Token::Str("ok".to_string()));
        assert_eq!(tokens[2].0, Token::Str("fine".to_string()));
    }

    #[test]
    fn strings_may_span_lines() {
        let (tokens, errors) = lex("\"a\nb\" X");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].0, Token::Str("a\nb".to_string()));
        assert_eq!(tokens[0].1.end.line, 1);
        assert_eq!(tokens[1].0, Token::Ident("X".to_string()));
    }

    #[test]
    fn unterminated_string_keeps_partial_content() {
        let (tokens, errors) = lex(".ASCII /abc");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unterminated string");
        assert_eq!(errors[0].span.offsets(), 7..11);
        assert_eq!(tokens[1].0, Token::Str("abc".to_string()));
        assert_eq!(tokens[2].0, Token::Eof);
    }

    #[test]
    fn char_literal_at_end_of_input() {
        let (tokens, errors) = lex("MOV '");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unterminated character literal");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn unexpected_characters_coalesce() {
        let (tokens, errors) = lex("MOV ?!% R0 & X");
        assert_eq!(errors.len(), 2, "errors: {errors:?}");
        assert_eq!(errors[0].span.offsets(), 4..7);
        assert!(errors[0].message.contains("?!%"));
        assert_eq!(errors[1].span.offsets(), 11..12);
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn unexpected_characters_at_end_are_flushed() {
        let (_, errors) = lex("X ??");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.offsets(), 2..4);
    }

    #[test]
    fn spans_count_characters() {
        let (tokens, _) = lex("\"é\" A");
        assert_eq!(tokens[0].1.offsets(), 0..3);
        assert_eq!(tokens[1].1.offsets(), 4..5);
    }
}
