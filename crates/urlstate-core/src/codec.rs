use std::fmt::Display;
use std::marker::PhantomData;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::DecodeError;

/// A `(parse, stringify)` pair between the text kept in the store and a
/// typed value.
///
/// `stringify` must be total. `parse` must report malformed input through
/// `DecodeError` and never panic. For every value `v` a slot can hold,
/// `parse(&stringify(&v))` gives back `v`, modulo whatever normalization the
/// codec documents.
pub trait Codec<T>: 'static {
    fn parse(&self, raw: &str) -> Result<T, DecodeError>;
    fn stringify(&self, value: &T) -> String;
}

pub type SharedCodec<T> = Rc<dyn Codec<T>>;

/// Plain text, stored as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl Codec<String> for TextCodec {
    fn parse(&self, raw: &str) -> Result<String, DecodeError> {
        Ok(raw.to_string())
    }
    fn stringify(&self, value: &String) -> String {
        value.clone()
    }
}

/// Anything with a `FromStr`/`Display` pair (numbers, mostly).
pub struct FromStrCodec<T>(PhantomData<fn() -> T>);

impl<T> FromStrCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromStrCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for FromStrCodec<T>
where
    T: FromStr + Display + 'static,
    T::Err: Display,
{
    fn parse(&self, raw: &str) -> Result<T, DecodeError> {
        if raw.is_empty() {
            return Err(DecodeError::Empty);
        }
        raw.parse::<T>()
            .map_err(|e| DecodeError::Invalid(e.to_string()))
    }
    fn stringify(&self, value: &T) -> String {
        value.to_string()
    }
}

/// Codec built from two closures.
pub struct FnCodec<T> {
    parse: Box<dyn Fn(&str) -> Result<T, DecodeError>>,
    stringify: Box<dyn Fn(&T) -> String>,
}

impl<T> FnCodec<T> {
    pub fn new(
        parse: impl Fn(&str) -> Result<T, DecodeError> + 'static,
        stringify: impl Fn(&T) -> String + 'static,
    ) -> Self {
        Self {
            parse: Box::new(parse),
            stringify: Box::new(stringify),
        }
    }
}

impl<T: 'static> Codec<T> for FnCodec<T> {
    fn parse(&self, raw: &str) -> Result<T, DecodeError> {
        (self.parse)(raw)
    }
    fn stringify(&self, value: &T) -> String {
        (self.stringify)(value)
    }
}

/// serde_json text.
#[cfg(feature = "json")]
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

#[cfg(feature = "json")]
impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[cfg(feature = "json")]
impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl<T> Codec<T> for JsonCodec<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + 'static,
{
    fn parse(&self, raw: &str) -> Result<T, DecodeError> {
        if raw.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(serde_json::from_str(raw)?)
    }
    fn stringify(&self, value: &T) -> String {
        // Serialize impls that error are a caller precondition violation;
        // `null` keeps this total and decodes back to the fallback.
        serde_json::to_string(value).unwrap_or_else(|e| {
            log::debug!("JsonCodec: value not representable: {e}");
            "null".into()
        })
    }
}

/// A record with a fixed number of text fields, for `DelimitedCodec`.
pub trait DelimitedRecord: Sized + 'static {
    /// Field count; input with any other count is rejected.
    const ARITY: usize;

    fn to_fields(&self) -> Vec<String>;
    fn from_fields(fields: &[&str]) -> Result<Self, DecodeError>;
}

/// `a|b|c`-style encoding of a `DelimitedRecord`.
///
/// `%` and the delimiter inside a field are written as `%XX` escapes, so
/// any field text survives a round trip.
pub struct DelimitedCodec<T> {
    delimiter: char,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DelimitedCodec<T> {
    pub fn new() -> Self {
        Self::with_delimiter('|')
    }

    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            _marker: PhantomData,
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }
}

impl<T> Default for DelimitedCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DelimitedRecord> Codec<T> for DelimitedCodec<T> {
    fn parse(&self, raw: &str) -> Result<T, DecodeError> {
        if raw.is_empty() {
            return Err(DecodeError::Empty);
        }
        let parts: Vec<&str> = raw.split(self.delimiter).collect();
        if parts.len() != T::ARITY {
            return Err(DecodeError::Arity {
                expected: T::ARITY,
                found: parts.len(),
            });
        }
        let owned = parts
            .into_iter()
            .map(unescape_field)
            .collect::<Result<Vec<String>, DecodeError>>()?;
        let fields: Vec<&str> = owned.iter().map(String::as_str).collect();
        T::from_fields(&fields)
    }

    fn stringify(&self, value: &T) -> String {
        let sep = self.delimiter.to_string();
        value
            .to_fields()
            .iter()
            .map(|f| escape_field(f, self.delimiter))
            .collect::<Vec<_>>()
            .join(sep.as_str())
    }
}

/// Percent-escapes `%` and the delimiter so a field never splits.
fn escape_field(field: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(field.len());
    for ch in field.chars() {
        if ch == '%' || ch == delimiter {
            let mut buf = [0u8; 4];
            for b in ch.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{b:02X}"));
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn unescape_field(field: &str) -> Result<String, DecodeError> {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = field
                .get(i + 1..i + 3)
                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| DecodeError::Invalid(format!("bad escape in {field:?}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|e| DecodeError::Invalid(e.to_string()))
}

/// `"1"` / `"0"`.
pub fn encode_flag(v: bool) -> &'static str {
    if v { "1" } else { "0" }
}

/// Only `"1"` is true; any other text reads as false.
pub fn decode_flag(s: &str) -> bool {
    s == "1"
}

/// Rejects an empty field; record impls use it for required text fields.
pub fn required<'a>(field: &'static str, s: &'a str) -> Result<&'a str, DecodeError> {
    if s.is_empty() {
        Err(DecodeError::field(field, "missing"))
    } else {
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        name: String,
        on: bool,
    }

    impl DelimitedRecord for Pair {
        const ARITY: usize = 2;
        fn to_fields(&self) -> Vec<String> {
            vec![self.name.clone(), encode_flag(self.on).into()]
        }
        fn from_fields(fields: &[&str]) -> Result<Self, DecodeError> {
            Ok(Pair {
                name: required("name", fields[0])?.to_string(),
                on: decode_flag(fields[1]),
            })
        }
    }

    #[test]
    fn delimited_arity_is_checked() {
        let c = DelimitedCodec::<Pair>::new();
        assert_eq!(
            c.parse("x"),
            Err(DecodeError::Arity {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            c.parse("a|1|z"),
            Err(DecodeError::Arity {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(c.parse(""), Err(DecodeError::Empty));
        assert!(matches!(c.parse("|1"), Err(DecodeError::Field { .. })));
    }

    #[test]
    fn delimited_custom_delimiter() {
        let c = DelimitedCodec::<Pair>::with_delimiter(',');
        let v = Pair {
            name: "a".into(),
            on: true,
        };
        assert_eq!(c.stringify(&v), "a,1");
        assert_eq!(c.parse("a,1"), Ok(v));
        assert!(c.parse("a|1").is_err());
    }

    #[test]
    fn delimited_escapes_delimiter_and_percent() {
        let c = DelimitedCodec::<Pair>::new();
        let v = Pair {
            name: "high|contrast 50%".into(),
            on: false,
        };
        let raw = c.stringify(&v);
        assert_eq!(raw, "high%7Ccontrast 50%25|0");
        assert_eq!(c.parse(&raw), Ok(v));
    }

    #[test]
    fn delimited_rejects_broken_escapes() {
        let c = DelimitedCodec::<Pair>::new();
        assert!(matches!(c.parse("a%zz|1"), Err(DecodeError::Invalid(_))));
        assert!(matches!(c.parse("a%7|1"), Err(DecodeError::Invalid(_))));
        assert!(matches!(c.parse("%FF|1"), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn delimited_escapes_multibyte_delimiter() {
        let c = DelimitedCodec::<Pair>::with_delimiter('¦');
        let v = Pair {
            name: "a¦b".into(),
            on: true,
        };
        let raw = c.stringify(&v);
        assert_eq!(raw, "a%C2%A6b¦1");
        assert_eq!(c.parse(&raw), Ok(v));
    }

    #[test]
    fn flag_normalization() {
        assert!(decode_flag(encode_flag(true)));
        assert!(!decode_flag(encode_flag(false)));
        assert!(!decode_flag("true"));
        assert!(!decode_flag(""));
    }

    #[test]
    fn from_str_codec_rejects_garbage() {
        let c = FromStrCodec::<i64>::new();
        assert_eq!(c.parse("42"), Ok(42));
        assert_eq!(c.stringify(&-3), "-3");
        assert_eq!(c.parse(""), Err(DecodeError::Empty));
        assert!(matches!(c.parse("4x"), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn fn_codec_forwards() {
        let c = FnCodec::new(
            |raw: &str| raw.parse::<u8>().map_err(|e| DecodeError::Invalid(e.to_string())),
            |v: &u8| format!("{v}"),
        );
        assert_eq!(c.parse("7"), Ok(7));
        assert_eq!(c.stringify(&9), "9");
        assert!(c.parse("300").is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_codec_errors_are_decode_errors() {
        let c = JsonCodec::<Vec<u32>>::new();
        assert_eq!(c.parse("[1,2]"), Ok(vec![1, 2]));
        assert_eq!(c.stringify(&vec![3]), "[3]");
        assert_eq!(c.parse(""), Err(DecodeError::Empty));
        assert!(matches!(c.parse("[1,"), Err(DecodeError::Json(_))));
        assert!(matches!(c.parse("{\"a\":1}"), Err(DecodeError::Json(_))));
    }
}
