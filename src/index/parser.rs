//! Parser for the JavaScript literal subset used by search-index fragments.
//!
//! A fragment is a single assignment of an array literal to a variable:
//!
//! ```text
//! var searchData=
//! [
//!   ['lock',['lock',['../structlist__t.html#a236a...',1,'list_t']]]
//! ];
//! ```
//!
//! Only the pieces generators actually emit are accepted: nested arrays,
//! quoted strings, integers, `true`/`false`/`null` and comments.

use serde::Serialize;
use thiserror::Error;

/// A parsed literal value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Null,
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Short name of the value kind, used in shape errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(String),
    #[error("integer literal out of range: {0}")]
    IntegerOverflow(String),
    #[error("expected identifier")]
    ExpectedIdent,
    #[error("expected '{0}'")]
    Expected(char),
    #[error("trailing input after fragment")]
    TrailingInput,
    #[error("arrays nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Parse failure with a 1-based source position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Parse a single literal value (no surrounding assignment)
pub fn parse_value(input: &str) -> Result<Value, ParseError> {
    let mut parser = ValueParser::new(input);
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if !parser.is_eof() {
        return Err(parser.error(ParseErrorKind::TrailingInput));
    }
    Ok(value)
}

/// Parse a whole fragment file: `var <name> = <array>;`
///
/// The leading `var` keyword and the closing semicolon are optional. Returns
/// the assigned variable name and the array value.
pub fn parse_fragment(input: &str) -> Result<(String, Value), ParseError> {
    let mut parser = ValueParser::new(input);
    parser.skip_trivia()?;

    let mut name = parser.parse_ident()?;
    if name == "var" || name == "let" || name == "const" {
        parser.skip_trivia()?;
        name = parser.parse_ident()?;
    }

    parser.skip_trivia()?;
    parser.expect('=')?;
    let value = parser.parse_value()?;

    parser.skip_trivia()?;
    parser.consume_char(';');
    parser.skip_trivia()?;
    if !parser.is_eof() {
        return Err(parser.error(ParseErrorKind::TrailingInput));
    }

    Ok((name, value))
}

/// Maximum array nesting accepted by the parser
pub const MAX_DEPTH: usize = 256;

struct ValueParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> ValueParser<'a> {
    fn new(input: &'a str) -> Self {
        // A UTF-8 BOM is common in generated files
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia()?;

        match self.peek_char() {
            None => Err(self.error(ParseErrorKind::UnexpectedEof)),
            Some('[') => self.parse_array(),
            Some(q @ ('\'' | '"')) => self.parse_string(q).map(Value::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_int(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let ident = self.parse_ident()?;
                match ident.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => {
                        self.pos = start;
                        Err(self.error(ParseErrorKind::UnexpectedChar(c)))
                    }
                }
            }
            Some(c) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
        }
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep(MAX_DEPTH)));
        }
        self.depth += 1;
        let result = self.parse_array_items();
        self.depth -= 1;
        result
    }

    fn parse_array_items(&mut self) -> Result<Value, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.consume_char(']') {
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_trivia()?;
            if self.consume_char(',') {
                continue;
            }
            if self.consume_char(']') {
                return Ok(Value::Array(items));
            }

            return Err(match self.peek_char() {
                Some(c) => self.error(ParseErrorKind::UnexpectedChar(c)),
                None => self.error(ParseErrorKind::UnexpectedEof),
            });
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, ParseError> {
        let open = self.pos;
        self.advance();
        let mut out = String::new();

        loop {
            let Some(c) = self.peek_char() else {
                self.pos = open;
                return Err(self.error(ParseErrorKind::UnterminatedString));
            };
            self.advance();

            if c == quote {
                return Ok(out);
            }
            if c == '\n' {
                self.pos = open;
                return Err(self.error(ParseErrorKind::UnterminatedString));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let escape_pos = self.pos;
            let Some(e) = self.peek_char() else {
                self.pos = open;
                return Err(self.error(ParseErrorKind::UnterminatedString));
            };
            self.advance();

            match e {
                '\\' | '\'' | '"' | '/' => out.push(e),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                '0' => out.push('\0'),
                // Line continuation
                '\n' => {}
                'x' => out.push(self.parse_hex_escape(escape_pos, 2)?),
                'u' => out.push(self.parse_unicode_escape(escape_pos)?),
                other => {
                    self.pos = escape_pos;
                    return Err(self.error(ParseErrorKind::InvalidEscape(other.to_string())));
                }
            }
        }
    }

    fn parse_hex_escape(&mut self, escape_pos: usize, digits: usize) -> Result<char, ParseError> {
        match self.hex_at(self.pos, digits).and_then(char::from_u32) {
            Some(c) => {
                self.pos += digits;
                Ok(c)
            }
            None => Err(self.invalid_escape(escape_pos, self.pos + digits)),
        }
    }

    /// `\uXXXX`, joining a UTF-16 surrogate pair written as two escapes
    fn parse_unicode_escape(&mut self, escape_pos: usize) -> Result<char, ParseError> {
        let Some(unit) = self.hex_at(self.pos, 4) else {
            return Err(self.invalid_escape(escape_pos, self.pos + 4));
        };

        if !(0xD800..=0xDBFF).contains(&unit) {
            // Lone low surrogates are rejected by from_u32
            return self.parse_hex_escape(escape_pos, 4);
        }

        let low_start = self.pos + 4;
        if self.input.get(low_start..low_start + 2) == Some("\\u") {
            if let Some(low @ 0xDC00..=0xDFFF) = self.hex_at(low_start + 2, 4) {
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                if let Some(c) = char::from_u32(code) {
                    self.pos = low_start + 6;
                    return Ok(c);
                }
            }
        }
        Err(self.invalid_escape(escape_pos, low_start))
    }

    /// Value of exactly `digits` hex digits starting at byte `start`
    fn hex_at(&self, start: usize, digits: usize) -> Option<u32> {
        let hex = self.input.get(start..start + digits)?;
        if hex.len() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }

    fn invalid_escape(&mut self, escape_pos: usize, end: usize) -> ParseError {
        let seq = self
            .input
            .get(escape_pos..end)
            .unwrap_or(&self.input[escape_pos..escape_pos + 1]);
        let seq = seq.to_string();
        self.pos = escape_pos;
        self.error(ParseErrorKind::InvalidEscape(seq))
    }

    fn parse_int(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        self.consume_char('-');

        let digits_start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == digits_start {
            return match self.peek_char() {
                Some(c) => Err(self.error(ParseErrorKind::UnexpectedChar(c))),
                None => Err(self.error(ParseErrorKind::UnexpectedEof)),
            };
        }

        let text = &self.input[start..self.pos];
        match text.parse::<i64>() {
            Ok(n) => Ok(Value::Int(n)),
            Err(_) => {
                let literal = text.to_string();
                self.pos = start;
                Err(self.error(ParseErrorKind::IntegerOverflow(literal)))
            }
        }
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        match self.peek_char() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.error(ParseErrorKind::ExpectedIdent)),
        }

        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if is_ident_continue(c)) {
            self.advance();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.remaining();
            if rest.starts_with("//") {
                match rest.find('\n') {
                    Some(nl) => self.pos += nl + 1,
                    None => self.pos = self.input.len(),
                }
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.error(ParseErrorKind::UnterminatedComment)),
                }
            } else if let Some(c) = self.peek_char().filter(|c| c.is_whitespace()) {
                self.pos += c.len_utf8();
            } else {
                return Ok(());
            }
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), ParseError> {
        self.skip_trivia()?;
        if self.consume_char(ch) {
            Ok(())
        } else if self.is_eof() {
            Err(self.error(ParseErrorKind::UnexpectedEof))
        } else {
            Err(self.error(ParseErrorKind::Expected(ch)))
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let (line, column) = position(self.input, self.pos);
        ParseError { kind, line, column }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &str {
        &self.input[self.pos..]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Convert a byte offset into a 1-based (line, column) pair
fn position(input: &str, offset: usize) -> (usize, usize) {
    let before = &input.as_bytes()[..offset.min(input.len())];
    let line = memchr::memchr_iter(b'\n', before).count() + 1;
    let line_start = memchr::memrchr(b'\n', before).map(|i| i + 1).unwrap_or(0);
    let column = input[line_start..offset.min(input.len())].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    #[test]
    fn test_parse_nested_array() {
        let v = parse_value("['a',[1,'b'],[]]").unwrap();
        assert_eq!(
            v,
            Value::Array(vec![
                s("a"),
                Value::Array(vec![Value::Int(1), s("b")]),
                Value::Array(vec![]),
            ])
        );
    }

    #[test]
    fn test_trailing_comma() {
        let v = parse_value("[1, 2, ]").unwrap();
        assert_eq!(v, Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_string_escapes() {
        let v = parse_value(r#"'it\'s \"q\" \x41é\\'"#).unwrap();
        assert_eq!(v, s("it's \"q\" Aé\\"));
    }

    #[test]
    fn test_double_quoted() {
        assert_eq!(parse_value(r#""a'b""#).unwrap(), s("a'b"));
    }

    #[test]
    fn test_keywords_and_negative() {
        let v = parse_value("[true, false, null, -7]").unwrap();
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Bool(true),
                Value::Bool(false),
                Value::Null,
                Value::Int(-7)
            ])
        );
    }

    #[test]
    fn test_comments_skipped() {
        let v = parse_value("[ // first\n 1, /* second */ 2 ]").unwrap();
        assert_eq!(v, Value::Array(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_fragment_assignment() {
        let (name, v) = parse_fragment("var searchData=\n[\n  ['a',['A',['../a.html',1,'']]]\n];\n").unwrap();
        assert_eq!(name, "searchData");
        assert_eq!(v.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_fragment_without_var_or_semicolon() {
        let (name, _) = parse_fragment("searchData = []").unwrap();
        assert_eq!(name, "searchData");
    }

    #[test]
    fn test_fragment_with_bom() {
        let (name, _) = parse_fragment("\u{feff}var x=[];").unwrap();
        assert_eq!(name, "x");
    }

    #[test]
    fn test_unterminated_string_position() {
        let err = parse_value("[\n  'abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
    }

    #[test]
    fn test_missing_comma() {
        let err = parse_value("[1 2]").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar('2'));
        assert_eq!((err.line, err.column), (1, 4));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse_value("[1,").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_invalid_escape() {
        let err = parse_value(r"'\q'").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscape("q".to_string()));

        let err = parse_value(r"'\xZ1'").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidEscape(_)));
    }

    #[test]
    fn test_integer_overflow() {
        let err = parse_value("99999999999999999999").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::IntegerOverflow(_)));
    }

    #[test]
    fn test_trailing_input_rejected() {
        let err = parse_fragment("var a=[]; var b=[];").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TrailingInput);
    }

    #[test]
    fn test_unknown_identifier_value() {
        let err = parse_value("[undefined]").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar('u'));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = parse_value("/* open").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);
    }

    #[test]
    fn test_unicode_escapes() {
        assert_eq!(parse_value(r"'caf\u00e9'").unwrap(), s("café"));
        assert_eq!(parse_value(r"'\ud83d\ude00'").unwrap(), s("\u{1f600}"));
        assert_eq!(parse_value(r"'a\uD83D\uDE00b'").unwrap(), s("a\u{1f600}b"));
    }

    #[test]
    fn test_lone_surrogates_rejected() {
        let err = parse_value(r"'\ud83d'").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscape("ud83d".to_string()));
        assert_eq!((err.line, err.column), (1, 3));

        let err = parse_value(r"'\ude00'").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidEscape("ude00".to_string()));

        let err = parse_value(r"'\ud83d\u0041'").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidEscape(_)));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let err = parse_fragment(&format!("var s={};", "[".repeat(100_000))).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TooDeep(MAX_DEPTH));
        assert_eq!(err.line, 1);
        assert_eq!(err.column, "var s=".len() + MAX_DEPTH + 1);
    }

    #[test]
    fn test_nesting_at_limit_accepted() {
        let src = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_value(&src).is_ok());

        let src = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(parse_value(&src).is_err());
    }

    #[test]
    fn test_missing_assignment() {
        let err = parse_fragment("var searchData [];").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Expected('='));
    }
}
