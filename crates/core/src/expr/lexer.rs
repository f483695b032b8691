use super::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Integer { digits: String, suffix: Option<char> },
    Float { digits: String, suffix: Option<char> },
    Str(String),
    Symbol(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

// Two-character operators come first so they win over their prefixes.
const SYMBOLS: [&str; 24] = [
    "==", "!=", "<=", ">=", "&&", "||", "(", ")", "[", "]", "{", "}", ",", ".", "?", ":", "!", "<",
    ">", "+", "-", "*", "/", "%",
];

pub(crate) fn tokenize(expression: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<(usize, char)> = expression.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let syntax = |offset: usize, message: String| EvalError::Syntax {
        expression: expression.to_string(),
        position: offset,
        message,
    };

    while i < chars.len() {
        let (offset, c) = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' || c == '#' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || matches!(chars[i].1, '_' | '$')) {
                i += 1;
            }
            let ident: String = chars[start..i].iter().map(|(_, c)| c).collect();
            // OGNL's `#name` context variables read like plain names here.
            let ident = ident.trim_start_matches('#').to_string();
            if ident.is_empty() {
                return Err(syntax(offset, "expected a name after '#'".into()));
            }
            tokens.push(Token {
                kind: TokenKind::Ident(ident),
                offset,
            });
            continue;
        }

        if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|(_, next)| next.is_ascii_digit()))
        {
            let start = i;
            let mut is_float = false;
            while i < chars.len() {
                let current = chars[i].1;
                if current.is_ascii_digit() {
                    i += 1;
                } else if current == '.'
                    && !is_float
                    && chars.get(i + 1).is_some_and(|(_, next)| next.is_ascii_digit())
                {
                    is_float = true;
                    i += 1;
                } else if matches!(current, 'e' | 'E') {
                    is_float = true;
                    i += 1;
                    if chars.get(i).is_some_and(|(_, sign)| matches!(sign, '+' | '-')) {
                        i += 1;
                    }
                } else {
                    break;
                }
            }
            let digits: String = chars[start..i].iter().map(|(_, c)| c).collect();
            let suffix = chars
                .get(i)
                .map(|(_, c)| *c)
                .filter(|c| matches!(c, 'l' | 'L' | 'd' | 'D' | 'f' | 'F' | 'b' | 'B' | 'h' | 'H'));
            if suffix.is_some() {
                i += 1;
            }
            let kind = match suffix {
                Some('d' | 'D' | 'f' | 'F') => TokenKind::Float { digits, suffix },
                _ if is_float => TokenKind::Float { digits, suffix },
                _ => TokenKind::Integer { digits, suffix },
            };
            tokens.push(Token { kind, offset });
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            let mut text = String::new();
            i += 1;
            loop {
                let Some(&(_, current)) = chars.get(i) else {
                    return Err(syntax(offset, "unterminated string literal".into()));
                };
                i += 1;
                match current {
                    '\\' => {
                        let Some(&(_, escaped)) = chars.get(i) else {
                            return Err(syntax(offset, "unterminated string literal".into()));
                        };
                        i += 1;
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => other,
                        });
                    }
                    current if current == quote => break,
                    other => text.push(other),
                }
            }
            tokens.push(Token {
                kind: TokenKind::Str(text),
                offset,
            });
            continue;
        }

        let rest = &expression[offset..];
        let symbol = SYMBOLS.iter().copied().find(|symbol| rest.starts_with(symbol));
        match symbol {
            Some(symbol) => {
                i += symbol.chars().count();
                tokens.push(Token {
                    kind: TokenKind::Symbol(symbol),
                    offset,
                });
            }
            None => return Err(syntax(offset, format!("unexpected character '{}'", c))),
        }
    }

    Ok(tokens)
}
