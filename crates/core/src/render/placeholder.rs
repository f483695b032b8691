use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([#$])\{([^}]*)\}").expect("placeholder pattern is valid"));

/// One placeholder found in literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'t> {
    /// `#{expr, jdbcType=...}`; only the expression before the first comma
    /// is evaluated, the options are ignored.
    Bind { expression: &'t str },
    /// `${expr}`, spliced into the SQL unescaped.
    Raw { expression: &'t str },
}

impl<'t> Placeholder<'t> {
    fn from_captures(captures: &Captures<'t>) -> Self {
        let body = captures.get(2).map_or("", |m| m.as_str());
        match captures.get(1).map(|m| m.as_str()) {
            Some("$") => Self::Raw {
                expression: body.trim(),
            },
            _ => Self::Bind {
                expression: body.split(',').next().unwrap_or_default().trim(),
            },
        }
    }

    pub fn expression(&self) -> &'t str {
        match self {
            Self::Bind { expression } | Self::Raw { expression } => expression,
        }
    }

    /// The marker as it would appear in a diagnostic.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "#{}",
            Self::Raw { .. } => "${}",
        }
    }
}

/// Replaces every placeholder in `text` with what `resolve` returns for it.
///
/// Text is scanned once, left to right; substituted values are never
/// scanned again.
pub fn substitute<E, F>(text: &str, mut resolve: F) -> Result<String, E>
where
    F: FnMut(Placeholder<'_>) -> Result<String, E>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&resolve(Placeholder::from_captures(&captures))?);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}
