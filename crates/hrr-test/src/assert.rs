//! JSON body assertions.

use crate::TestError;
use regex::Regex;

/// Strips layout whitespace from a hand-written JSON pattern.
///
/// Newlines and tabs are removed, as are spaces next to quotes and after
/// `":`. The result lines up with the compact output of `serde_json`.
///
/// ```rust
/// use hrr_test::simplify_json;
///
/// let pattern = "{\n\t\"name\": \"Grog\"\n}";
/// assert_eq!(simplify_json(pattern), r#"{"name":"Grog"}"#);
/// ```
#[must_use]
pub fn simplify_json(json: &str) -> String {
    json.replace(['\n', '\t'], "")
        .replace(" \"", "\"")
        .replace("\" ", "\"")
        .replace("\": ", "\":")
}

/// Checks that `body` contains a match for `expected`.
///
/// `expected` is simplified with [`simplify_json`] and then used as a
/// regular expression, so parts of it may be patterns such as `\d+`. Braces
/// that should match literally need no escaping when they cannot be read as
/// a repetition.
///
/// # Errors
///
/// Returns `TestError::Pattern` if the simplified pattern is not a valid
/// regular expression, and `TestError::BodyMismatch` if it does not match.
pub fn assert_json_body(expected: &str, body: &[u8]) -> Result<(), TestError> {
    let pattern = simplify_json(expected);
    let re = Regex::new(&escape_literal_braces(&pattern))?;
    let actual = String::from_utf8_lossy(body);

    if re.is_match(&actual) {
        Ok(())
    } else {
        Err(TestError::BodyMismatch {
            expected: pattern,
            actual: actual.into_owned(),
        })
    }
}

/// Escapes every brace that is not part of a `{n}`, `{n,}` or `{n,m}`
/// repetition, since JSON objects are full of them.
fn escape_literal_braces(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            '{' => match repetition_len(&pattern[i..]) {
                Some(len) => {
                    out.push_str(&pattern[i..i + len]);
                    // Skip the rest of the repetition, which is ASCII.
                    for _ in 1..len {
                        chars.next();
                    }
                }
                None => out.push_str("\\{"),
            },
            '}' => out.push_str("\\}"),
            _ => out.push(c),
        }
    }

    out
}

/// Length of a counted repetition at the start of `s`, if there is one.
fn repetition_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 1;
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let min = digits(i);
    if min == 0 {
        return None;
    }
    i += min;

    if bytes.get(i) == Some(&b',') {
        i += 1;
        i += digits(i);
    }

    (bytes.get(i) == Some(&b'}')).then_some(i + 1)
}
