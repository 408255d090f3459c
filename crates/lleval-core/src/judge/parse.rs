use crate::errors::{EvalError, EvalResult};
use crate::model::{Dimension, Method};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVerdict {
    /// Likert rating 1..=5, or the preferred response (1 or 2) for winrate.
    pub value: u8,
    /// Judge text preceding the verdict line.
    pub explanation: String,
}

/// Pattern of the verdict line the judge is instructed to emit.
pub fn verdict_pattern(method: Method, dimension: &Dimension) -> EvalResult<Regex> {
    let pattern = match method {
        Method::Likert => format!(
            r"\n{} Score: ([12345])",
            regex::escape(&dimension.capitalized_name())
        ),
        Method::Winrate => format!(
            r"\nMore {} response: ([1-2])",
            regex::escape(dimension.comparative())
        ),
    };
    Regex::new(&pattern).map_err(|e| EvalError::template(format!("invalid verdict pattern: {}", e)))
}

/// Find the first verdict line in `text`.
pub fn parse_verdict(pattern: &Regex, text: &str) -> Option<ParsedVerdict> {
    let caps = pattern.captures(text)?;
    let whole = caps.get(0)?;
    let value = caps.get(1)?.as_str().parse().ok()?;
    let explanation = text[..whole.start()].trim_matches('\n').to_string();
    Some(ParsedVerdict { value, explanation })
}
