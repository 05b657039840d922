//! Runtime-safe extraction of questionnaire answers
//!
//! Each helper returns `None` when the raw value is missing or unusable, so a
//! transform can write `fact.insert_opt(name, helper(...))` and the absence
//! of the source propagates to the derived fact.

use chrono::NaiveDate;
use core_kernel::{parse_calendar_date, years_since};

use crate::facts::{ResponseValue, Responses};

/// Trimmed, non-empty text
pub fn text<'a>(responses: &'a Responses, field: &str) -> Option<&'a str> {
    match responses.get(field)? {
        ResponseValue::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        }
        _ => None,
    }
}

/// Finite number from a number or a trimmed numeric string
///
/// Strings must parse completely: `"7.5"` is accepted, `"7.5abc"` is not.
pub fn number(responses: &Responses, field: &str) -> Option<f64> {
    let parsed = match responses.get(field)? {
        ResponseValue::Number(n) => *n,
        ResponseValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

/// List of strings; lists containing anything but strings are rejected
///
/// Empty lists are preserved. The caller decides whether an empty list means
/// "unanswered" or "explicitly none".
pub fn string_list(responses: &Responses, field: &str) -> Option<Vec<String>> {
    match responses.get(field)? {
        ResponseValue::List(items) => items
            .iter()
            .map(|item| match item {
                ResponseValue::Text(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Like [`string_list`] but an empty selection counts as unanswered
pub fn answered_list(responses: &Responses, field: &str) -> Option<Vec<String>> {
    string_list(responses, field).filter(|items| !items.is_empty())
}

/// Lowercases and replaces every character outside `a-z` with `_`
pub fn token(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() { c } else { '_' })
        .collect()
}

/// Lowercases, drops parenthetical qualifiers, and snake-cases word gaps
///
/// `"Kidney Disease (stage 3)"` becomes `"kidney_disease"`.
pub fn label_token(label: &str) -> String {
    let mut stripped = String::with_capacity(label.len());
    let mut depth = 0usize;
    for c in label.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }
    words(&stripped).join("_")
}

/// Maps labels through a known-label table, falling back to [`token`]
///
/// Labels that map to an empty string are dropped.
pub fn canonical_labels(labels: &[String], table: &[(&str, &str)]) -> Vec<String> {
    labels
        .iter()
        .map(|label| {
            table
                .iter()
                .find(|(known, _)| *known == label.as_str())
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or_else(|| token(label))
        })
        .filter(|label| !label.is_empty())
        .collect()
}

/// Lowercase alphanumeric words of `text`
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Case-insensitive substring test
pub fn mentions(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(needle)
}

/// Leading integer of an answer such as `"3 or more"` or `"0 (diet only)"`
pub fn leading_count(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Calendar date answer, absent when unparseable
pub fn date(responses: &Responses, field: &str) -> Option<NaiveDate> {
    parse_calendar_date(text(responses, field)?).ok()
}

/// Fractional years since a recorded date answer
///
/// Absent for unparseable dates and dates after `as_of`.
pub fn years_since_answer(responses: &Responses, field: &str, as_of: NaiveDate) -> Option<f64> {
    years_since(date(responses, field)?, as_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses(field: &str, value: ResponseValue) -> Responses {
        let mut map = Responses::new();
        map.insert(field.to_string(), value);
        map
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        assert_eq!(number(&responses("x", " 7.5 ".into()), "x"), Some(7.5));
        assert_eq!(number(&responses("x", 7.5.into()), "x"), Some(7.5));
    }

    #[test]
    fn test_number_rejects_non_finite_and_garbage() {
        assert_eq!(number(&responses("x", "abc".into()), "x"), None);
        assert_eq!(number(&responses("x", "NaN".into()), "x"), None);
        assert_eq!(number(&responses("x", "Infinity".into()), "x"), None);
        assert_eq!(number(&responses("x", f64::INFINITY.into()), "x"), None);
        assert_eq!(number(&responses("x", "7.5abc".into()), "x"), None);
        assert_eq!(number(&responses("x", "".into()), "x"), None);
    }

    #[test]
    fn test_string_list_rejects_mixed_lists() {
        let mixed = ResponseValue::List(vec!["a".into(), ResponseValue::Number(1.0)]);
        assert_eq!(string_list(&responses("x", mixed), "x"), None);
        assert_eq!(
            string_list(&responses("x", ResponseValue::labels(Vec::<String>::new())), "x"),
            Some(vec![])
        );
    }

    #[test]
    fn test_label_token() {
        assert_eq!(label_token("Retinopathy (eye)"), "retinopathy");
        assert_eq!(label_token("Kidney Disease (stage 3)"), "kidney_disease");
        assert_eq!(label_token("Foot ulcer"), "foot_ulcer");
    }

    #[test]
    fn test_leading_count() {
        assert_eq!(leading_count("3 or more"), Some(3));
        assert_eq!(leading_count("0 (diet/lifestyle only)"), Some(0));
        assert_eq!(leading_count("none"), None);
    }
}
