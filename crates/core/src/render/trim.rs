use crate::mapper::Element;

/// Prefix/suffix rewriting shared by `<trim>`, `<where>` and `<set>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrimRule {
    pub prefix: String,
    pub suffix: String,
    pub prefix_overrides: Vec<String>,
    pub suffix_overrides: Vec<String>,
}

impl TrimRule {
    pub fn where_clause() -> Self {
        Self {
            prefix: "WHERE".to_string(),
            prefix_overrides: vec!["AND ".to_string(), "OR ".to_string()],
            ..Self::default()
        }
    }

    pub fn set_clause() -> Self {
        Self {
            prefix: "SET".to_string(),
            suffix_overrides: vec![",".to_string()],
            ..Self::default()
        }
    }

    pub fn from_element(element: &Element) -> Self {
        Self {
            prefix: element.attr("prefix").unwrap_or_default().to_string(),
            suffix: element.attr("suffix").unwrap_or_default().to_string(),
            prefix_overrides: parse_overrides(element.attr("prefixOverrides")),
            suffix_overrides: parse_overrides(element.attr("suffixOverrides")),
        }
    }

    /// Strips override tokens from both ends until none matches.
    ///
    /// Matching is case-insensitive and a whitespace character in a token
    /// matches any whitespace character, so `AND ` also strips `AND\n`.
    pub fn strip_overrides<'s>(&self, content: &'s str) -> &'s str {
        let mut working = content.trim();

        'prefix: loop {
            for token in &self.prefix_overrides {
                if let Some(len) = match_prefix(working, token) {
                    working = working[len..].trim_start();
                    continue 'prefix;
                }
            }
            break;
        }

        'suffix: loop {
            for token in &self.suffix_overrides {
                if let Some(start) = match_suffix(working, token) {
                    working = working[..start].trim_end();
                    continue 'suffix;
                }
            }
            break;
        }

        working
    }

    /// Rewrites a rendered body; a body that is blank before or after
    /// stripping produces nothing.
    pub fn apply(&self, content: &str) -> String {
        let body = self.strip_overrides(content);
        if body.is_empty() {
            return String::new();
        }

        let mut out = String::with_capacity(body.len() + self.prefix.len() + self.suffix.len() + 4);
        out.push(' ');
        if !self.prefix.is_empty() {
            out.push_str(&self.prefix);
            out.push(' ');
        }
        out.push_str(body);
        out.push_str(&self.suffix);
        out.push(' ');
        out
    }
}

fn parse_overrides(attribute: Option<&str>) -> Vec<String> {
    attribute
        .map(|value| {
            value
                .split('|')
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn chars_match(text: char, token: char) -> bool {
    if token.is_whitespace() {
        text.is_whitespace()
    } else {
        text.to_lowercase().eq(token.to_lowercase())
    }
}

/// Byte length of the match when `text` starts with `token`.
fn match_prefix(text: &str, token: &str) -> Option<usize> {
    let mut end = 0;
    let mut chars = text.char_indices();
    for expected in token.chars() {
        let (index, actual) = chars.next()?;
        if !chars_match(actual, expected) {
            return None;
        }
        end = index + actual.len_utf8();
    }
    (!token.is_empty()).then_some(end)
}

/// Byte offset where the match starts when `text` ends with `token`.
fn match_suffix(text: &str, token: &str) -> Option<usize> {
    let mut start = text.len();
    let mut chars = text.char_indices().rev();
    for expected in token.chars().rev() {
        let (index, actual) = chars.next()?;
        if !chars_match(actual, expected) {
            return None;
        }
        start = index;
    }
    (!token.is_empty()).then_some(start)
}
