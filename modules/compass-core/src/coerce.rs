//! Best-effort coercion of raw cell text into typed values.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::{CompassError, Result};

const DATE_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a portal date string.
///
/// Empty and whitespace-only input is `Ok(None)`. Times of day are accepted
/// and discarded.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(Some(date));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Some(datetime.date()));
        }
    }

    Err(CompassError::Parse(format!(
        "Parsing string `{value}` into a date failed!"
    )))
}

/// Values that may hold an integer.
pub trait IntLike {
    fn as_int(&self) -> Option<i64>;
}

impl IntLike for str {
    fn as_int(&self) -> Option<i64> {
        self.trim().parse().ok()
    }
}

impl IntLike for &str {
    fn as_int(&self) -> Option<i64> {
        (**self).as_int()
    }
}

impl IntLike for String {
    fn as_int(&self) -> Option<i64> {
        self.as_str().as_int()
    }
}

impl IntLike for i64 {
    fn as_int(&self) -> Option<i64> {
        Some(*self)
    }
}

impl IntLike for i32 {
    fn as_int(&self) -> Option<i64> {
        Some(i64::from(*self))
    }
}

impl IntLike for u64 {
    fn as_int(&self) -> Option<i64> {
        i64::try_from(*self).ok()
    }
}

impl<T: IntLike> IntLike for Option<T> {
    fn as_int(&self) -> Option<i64> {
        self.as_ref().and_then(IntLike::as_int)
    }
}

/// Integer value of `value`, or `None` where it holds no integer.
pub fn maybe_int<T: IntLike + ?Sized>(value: &T) -> Option<i64> {
    value.as_int()
}

/// Non-negative integer value of `value`, used for portal identifiers.
pub fn maybe_id<T: IntLike + ?Sized>(value: &T) -> Option<u64> {
    value.as_int().and_then(|n| u64::try_from(n).ok())
}

/// Integer if possible, then a Python-style literal (`True`, `None`, `1.5`,
/// `'abc'`, `[1, (2, 3)]`, `{'a': 1}`), otherwise the original string.
/// Never fails.
pub fn coerce_int_or_literal(value: &str) -> Value {
    if let Some(n) = maybe_int(value) {
        return Value::from(n);
    }
    python_literal(value).unwrap_or_else(|| Value::String(value.to_string()))
}

fn python_literal(value: &str) -> Option<Value> {
    let mut parser = LiteralParser { rest: value };
    let literal = parser.value()?;
    parser.skip_ws();
    parser.rest.is_empty().then_some(literal)
}

/// Recursive descent over Python literal syntax. Tuples become arrays and
/// non-string dict keys their JSON text.
struct LiteralParser<'a> {
    rest: &'a str,
}

impl LiteralParser<'_> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.rest.chars().next()? {
            '[' => self.sequence('[', ']'),
            '(' => self.sequence('(', ')'),
            '{' => self.dict(),
            quote @ ('\'' | '"') => self.string(quote).map(Value::String),
            _ => self.atom(),
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Option<Value> {
        self.eat(open);
        let mut items = Vec::new();
        let mut separated = false;
        loop {
            if self.eat(close) {
                break;
            }
            items.push(self.value()?);
            if self.eat(',') {
                separated = true;
            } else if self.eat(close) {
                break;
            } else {
                return None;
            }
        }
        // `(1)` is a parenthesised value, `(1,)` a tuple
        if open == '(' && items.len() == 1 && !separated {
            return items.pop();
        }
        Some(Value::Array(items))
    }

    fn dict(&mut self) -> Option<Value> {
        self.eat('{');
        let mut map = Map::new();
        loop {
            if self.eat('}') {
                return Some(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(key) => key,
                other => other.to_string(),
            };
            if !self.eat(':') {
                return None;
            }
            map.insert(key, self.value()?);
            if !self.eat(',') {
                return self.eat('}').then_some(Value::Object(map));
            }
        }
    }

    fn string(&mut self, quote: char) -> Option<String> {
        let body = &self.rest[quote.len_utf8()..];
        let mut out = String::new();
        let mut chars = body.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    let (_, escaped) = chars.next()?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' | '\'' | '"' => out.push(escaped),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                c if c == quote => {
                    self.rest = &body[i + c.len_utf8()..];
                    return Some(out);
                }
                c => out.push(c),
            }
        }
        None
    }

    fn atom(&mut self) -> Option<Value> {
        let end = self
            .rest
            .find(|c: char| c.is_whitespace() || ",:[](){}".contains(c))
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        let value = match token {
            "True" => Value::Bool(true),
            "False" => Value::Bool(false),
            "None" => Value::Null,
            _ => number(token)?,
        };
        self.rest = rest;
        Some(value)
    }
}

fn number(token: &str) -> Option<Value> {
    let unsigned = token.strip_prefix(['-', '+']).unwrap_or(token);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if let Ok(n) = token.parse::<i64>() {
        return Some(Value::from(n));
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// `Some` for non-empty text, `None` otherwise.
pub(crate) fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_is_none() {
        assert_eq!(parse_date("").unwrap(), None);
        assert_eq!(parse_date("   ").unwrap(), None);
    }

    #[test]
    fn parse_short_and_long_month() {
        let expected = NaiveDate::from_ymd_opt(2000, 1, 1);
        assert_eq!(parse_date("01 Jan 2000").unwrap(), expected);
        assert_eq!(parse_date("01 January 2000").unwrap(), expected);
    }

    #[test]
    fn parse_other_layouts() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 14);
        assert_eq!(parse_date("14-Mar-2021").unwrap(), expected);
        assert_eq!(parse_date("14/03/2021").unwrap(), expected);
        assert_eq!(parse_date("2021-03-14").unwrap(), expected);
        assert_eq!(parse_date("2021-03-14T00:00:00").unwrap(), expected);
        assert_eq!(parse_date(" 14 March 2021 ").unwrap(), expected);
    }

    #[test]
    fn parse_non_date_names_input() {
        let err = parse_date("abc").unwrap_err();
        assert!(matches!(err, CompassError::Parse(_)));
        assert!(err.to_string().contains("Parsing string `abc` into a date failed!"));
    }

    #[test]
    fn maybe_int_accepts_ints_and_strings() {
        assert_eq!(maybe_int(&123i64), Some(123));
        assert_eq!(maybe_int("123"), Some(123));
        assert_eq!(maybe_int("abc"), None);
        assert_eq!(maybe_int(&None::<String>), None);
        assert_eq!(maybe_id("-4"), None);
    }

    #[test]
    fn coerce_falls_through_to_raw_string() {
        assert_eq!(coerce_int_or_literal("42"), Value::from(42));
        assert_eq!(coerce_int_or_literal("True"), Value::Bool(true));
        assert_eq!(coerce_int_or_literal("None"), Value::Null);
        assert_eq!(coerce_int_or_literal("[1, 2]"), serde_json::json!([1, 2]));
        assert_eq!(
            coerce_int_or_literal("Group Scout Leader"),
            Value::String("Group Scout Leader".into())
        );
        assert_eq!(coerce_int_or_literal(""), Value::String(String::new()));
    }

    #[test]
    fn coerce_reads_python_literal_spellings() {
        assert_eq!(coerce_int_or_literal("'abc'"), Value::String("abc".into()));
        assert_eq!(coerce_int_or_literal(r#""it's""#), Value::String("it's".into()));
        assert_eq!(coerce_int_or_literal(r#"'a\'b'"#), Value::String("a'b".into()));
        assert_eq!(coerce_int_or_literal("-1.5"), serde_json::json!(-1.5));
        assert_eq!(coerce_int_or_literal("(1, 'two')"), serde_json::json!([1, "two"]));
        assert_eq!(coerce_int_or_literal("(7)"), serde_json::json!(7));
        assert_eq!(
            coerce_int_or_literal("{'a': [True, None], 2: 'b'}"),
            serde_json::json!({"a": [true, null], "2": "b"})
        );
        assert_eq!(coerce_int_or_literal("[]"), serde_json::json!([]));
    }

    #[test]
    fn json_only_spellings_stay_strings() {
        assert_eq!(coerce_int_or_literal("true"), Value::String("true".into()));
        assert_eq!(coerce_int_or_literal("null"), Value::String("null".into()));
        assert_eq!(coerce_int_or_literal("inf"), Value::String("inf".into()));
        assert_eq!(coerce_int_or_literal("[1, 2"), Value::String("[1, 2".into()));
        assert_eq!(coerce_int_or_literal("'open"), Value::String("'open".into()));
    }
}
