//! `$name` variable substitution.
//!
//! Before an expression (or a `log` message) is evaluated, every `$name`
//! reference is replaced with the display form of the bound value. A
//! reference to an unbound variable is a hard failure: the script is
//! considered malformed and the run stops. A `$` not followed by an
//! identifier character passes through unchanged.

use std::collections::HashMap;

use super::value::Value;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace every `$name` in `src` with the value bound in `vars`.
pub fn substitute(src: &str, vars: &HashMap<String, Value>) -> Result<String, String> {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        let mut name = String::new();
        while matches!(chars.peek(), Some(c) if is_ident_char(*c)) {
            name.push(chars.next().unwrap());
        }
        if name.is_empty() {
            out.push('$');
            continue;
        }
        match vars.get(&name) {
            Some(value) => out.push_str(&value.to_string()),
            None => return Err(format!("variable '${name}' not found")),
        }
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn single_reference() {
        let v = vars(&[("x", Value::Int(7))]);
        assert_eq!(substitute("$x + 1", &v).unwrap(), "7 + 1");
    }

    #[test]
    fn multiple_references() {
        let v = vars(&[("a", Value::Int(1)), ("b", Value::Int(2))]);
        assert_eq!(substitute("$a < $b", &v).unwrap(), "1 < 2");
    }

    #[test]
    fn adjacent_text() {
        let v = vars(&[("count", Value::Int(3))]);
        assert_eq!(substitute("($count)*2", &v).unwrap(), "(3)*2");
    }

    #[test]
    fn unbound_is_error() {
        let v = HashMap::new();
        let err = substitute("$missing", &v).unwrap_err();
        assert!(err.contains("$missing"), "{err}");
    }

    #[test]
    fn bare_dollar_passes_through() {
        let v = HashMap::new();
        assert_eq!(substitute("$ 1 + 1", &v).unwrap(), "$ 1 + 1");
        assert_eq!(substitute("100$", &v).unwrap(), "100$");
    }

    #[test]
    fn value_display_forms() {
        let v = vars(&[
            ("f", Value::Float(2.0)),
            ("b", Value::Bool(true)),
            ("s", Value::Str("hi".into())),
        ]);
        assert_eq!(substitute("$f $b $s", &v).unwrap(), "2.0 true hi");
    }

    #[test]
    fn no_references_is_identity() {
        let v = HashMap::new();
        assert_eq!(substitute("1 + 2 * 3", &v).unwrap(), "1 + 2 * 3");
    }
}
