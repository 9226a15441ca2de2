//! Literal constants: type fit, source text and canonical value text.

use opseq_core::{PrimitiveType, TypeRef, Value};

/// Whether `value` can be the constant of a literal of type `ty`.
pub fn fits(ty: &TypeRef, value: &Value) -> bool {
    match ty {
        TypeRef::Void => false,
        TypeRef::Primitive(p) => match (p, value) {
            (PrimitiveType::Boolean, Value::Bool(_)) => true,
            (PrimitiveType::Char, Value::Char(_)) => true,
            (PrimitiveType::Byte, Value::Int(i)) => i8::try_from(*i).is_ok(),
            (PrimitiveType::Short, Value::Int(i)) => i16::try_from(*i).is_ok(),
            (PrimitiveType::Int, Value::Int(i)) => i32::try_from(*i).is_ok(),
            (PrimitiveType::Long, Value::Int(_)) => true,
            (PrimitiveType::Float | PrimitiveType::Double, Value::Float(_)) => true,
            _ => false,
        },
        TypeRef::Class(_) | TypeRef::Array(_) => match value {
            Value::Null => true,
            Value::String(_) => ty.is_string(),
            _ => false,
        },
    }
}

/// The constant as it appears in generated source.
pub fn source_text(ty: &TypeRef, value: &Value) -> String {
    match (ty.as_primitive(), value) {
        (_, Value::Null) if ty.is_object() => "null".to_string(),
        (_, Value::Null) => format!("({}) null", ty.source_name()),
        (Some(PrimitiveType::Byte), Value::Int(i)) => format!("(byte) {}", i),
        (Some(PrimitiveType::Short), Value::Int(i)) => format!("(short) {}", i),
        (Some(PrimitiveType::Long), Value::Int(i)) => format!("{}L", i),
        (Some(PrimitiveType::Float), Value::Float(f)) => float_source(*f, "Float", "f"),
        (_, Value::Float(f)) => float_source(*f, "Double", ""),
        _ => value_text(value),
    }
}

fn float_source(f: f64, class: &str, suffix: &str) -> String {
    if f.is_nan() {
        format!("{}.NaN", class)
    } else if f == f64::INFINITY {
        format!("{}.POSITIVE_INFINITY", class)
    } else if f == f64::NEG_INFINITY {
        format!("{}.NEGATIVE_INFINITY", class)
    } else {
        format!("{:?}{}", f, suffix)
    }
}

/// Canonical text of a constant, as written after `type:` in operation text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => format!("'{}'", escape(&c.to_string(), '\'')),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_nan() => "NaN".to_string(),
        Value::Float(f) if f.is_infinite() => {
            let text = if *f > 0.0 { "Infinity" } else { "-Infinity" };
            text.to_string()
        }
        Value::Float(f) => format!("{:?}", f),
        Value::String(s) => format!("\"{}\"", escape(s, '"')),
        Value::Object(o) => o.to_string(),
    }
}

/// Parse canonical value text for a literal of type `ty`. The result is not
/// range-checked; see [`fits`].
pub fn parse_value(ty: &TypeRef, text: &str) -> Option<Value> {
    let text = text.trim();
    if text == "null" {
        return ty.is_reference().then_some(Value::Null);
    }
    match ty.as_primitive() {
        Some(PrimitiveType::Boolean) => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Some(PrimitiveType::Char) => {
            let inner = unescape(quoted(text, '\'')?)?;
            let mut chars = inner.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }
        Some(p) if p.is_integral() => text.parse::<i64>().ok().map(Value::Int),
        Some(_) => match text {
            "NaN" => Some(Value::Float(f64::NAN)),
            "Infinity" => Some(Value::Float(f64::INFINITY)),
            "-Infinity" => Some(Value::Float(f64::NEG_INFINITY)),
            _ => text.parse::<f64>().ok().map(Value::Float),
        },
        None if ty.is_string() => unescape(quoted(text, '"')?).map(Value::String),
        None => None,
    }
}

fn quoted(text: &str, quote: char) -> Option<&str> {
    text.strip_prefix(quote)?.strip_suffix(quote)
}

/// Escape `s` for a Java literal delimited by `quote`.
pub fn escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() || !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Undo [`escape`]. Returns `None` on a malformed escape.
pub fn unescape(s: &str) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return None;
                }
                units.push(u16::from_str_radix(&hex, 16).ok()?);
                continue;
            }
            _ => return None,
        };
        units.push(escaped as u16);
    }
    String::from_utf16(&units).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prim(p: PrimitiveType) -> TypeRef {
        TypeRef::Primitive(p)
    }

    #[test]
    fn test_fits_checks_ranges() {
        assert!(fits(&prim(PrimitiveType::Byte), &Value::Int(127)));
        assert!(!fits(&prim(PrimitiveType::Byte), &Value::Int(128)));
        assert!(fits(&prim(PrimitiveType::Int), &Value::Int(i32::MIN as i64)));
        assert!(!fits(&prim(PrimitiveType::Int), &Value::Int(1 << 40)));
        assert!(fits(&prim(PrimitiveType::Long), &Value::Int(1 << 40)));
        assert!(!fits(&prim(PrimitiveType::Int), &Value::Null));
        assert!(fits(&TypeRef::string(), &Value::from("x")));
        assert!(!fits(&TypeRef::object(), &Value::from("x")));
        assert!(fits(&TypeRef::object(), &Value::Null));
    }

    #[test]
    fn test_source_text() {
        assert_eq!(source_text(&prim(PrimitiveType::Int), &Value::Int(-3)), "-3");
        assert_eq!(source_text(&prim(PrimitiveType::Long), &Value::Int(3)), "3L");
        assert_eq!(source_text(&prim(PrimitiveType::Byte), &Value::Int(3)), "(byte) 3");
        assert_eq!(source_text(&prim(PrimitiveType::Float), &Value::Float(1.5)), "1.5f");
        assert_eq!(source_text(&prim(PrimitiveType::Double), &Value::Float(f64::NAN)), "Double.NaN");
        assert_eq!(source_text(&prim(PrimitiveType::Char), &Value::Char('\'')), "'\\''");
        assert_eq!(source_text(&TypeRef::string(), &Value::from("a\"b\n")), "\"a\\\"b\\n\"");
        assert_eq!(source_text(&TypeRef::string(), &Value::Null), "(java.lang.String) null");
        assert_eq!(source_text(&TypeRef::object(), &Value::Null), "null");
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value(&prim(PrimitiveType::Int), "42"), Some(Value::Int(42)));
        assert_eq!(parse_value(&prim(PrimitiveType::Boolean), "true"), Some(Value::Bool(true)));
        assert_eq!(parse_value(&prim(PrimitiveType::Char), "'\\n'"), Some(Value::Char('\n')));
        assert_eq!(parse_value(&prim(PrimitiveType::Double), "-Infinity"), Some(Value::Float(f64::NEG_INFINITY)));
        assert_eq!(parse_value(&TypeRef::string(), "\"a\\\"b\""), Some(Value::from("a\"b")));
        assert_eq!(parse_value(&TypeRef::string(), "null"), Some(Value::Null));
        assert_eq!(parse_value(&prim(PrimitiveType::Int), "null"), None);
        assert_eq!(parse_value(&prim(PrimitiveType::Int), "x"), None);
        assert_eq!(parse_value(&TypeRef::string(), "unquoted"), None);
    }

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape("é", '"'), "\\u00e9");
        assert_eq!(unescape("\\u00e9").as_deref(), Some("é"));
        assert_eq!(unescape("\\q"), None);
        assert_eq!(unescape(&escape("tab\there \\ \"q\"", '"')).as_deref(), Some("tab\there \\ \"q\""));
    }
}
