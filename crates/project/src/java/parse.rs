//! Declaration-level scanning of Java source text.

use once_cell::sync::Lazy;
use regex::Regex;

use batislens_core::types::ClassKind;

static PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpackage\s+([\w.]+)\s*;").expect("package pattern is valid"));

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bimport\s+(static\s+)?([\w.]+(?:\.\*)?)\s*;").expect("import pattern is valid")
});

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(class|interface|enum)\s+([A-Za-z_$][\w$]*)").expect("declaration pattern is valid")
});

static EXTENDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*extends\s+(.+?)(?:\s+implements\b.*)?\s*$").expect("extends pattern is valid")
});

static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^((?:(?:public|protected|private|static|final|transient|volatile)\s+)*)(.+?)\s+([A-Za-z_$][\w$]*)\s*((?:\[\s*\])*)$",
    )
    .expect("field pattern is valid")
});

static PARAM_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@Param\s*\(\s*(?:value\s*=\s*)?"([^"]*)"\s*\)"#).expect("param pattern is valid")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*").expect("identifier pattern is valid"));

const KEYWORDS: [&str; 6] = ["class", "interface", "enum", "record", "return", "new"];

#[derive(Debug, Default, PartialEq)]
pub(super) struct SourceFile {
    pub package: String,
    pub imports: Vec<String>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, PartialEq)]
pub(super) struct TypeDecl {
    pub name: String,
    pub kind: ClassKind,
    pub superclass: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub enum_constants: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub(super) struct FieldDecl {
    pub name: String,
    pub ty: String,
    pub is_static: bool,
}

#[derive(Debug, PartialEq)]
pub(super) struct MethodDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
}

#[derive(Debug, PartialEq)]
pub(super) struct ParamDecl {
    /// Name given by `@Param`, if any.
    pub binding: Option<String>,
    pub ty: String,
}

pub(super) fn parse_source(source: &str) -> SourceFile {
    let text = strip_comments(source);

    let package = PACKAGE
        .captures(&text)
        .and_then(|c| c.get(1))
        .map_or_else(String::new, |m| m.as_str().to_string());

    let imports = IMPORT
        .captures_iter(&text)
        .filter(|c| c.get(1).is_none())
        .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
        .collect();

    let mut types = Vec::new();
    for captures in DECLARATION.captures_iter(&text) {
        let (Some(keyword), Some(name)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        // `@interface` declares an annotation type.
        if text[..keyword.start()].ends_with('@') {
            continue;
        }
        let Some(open) = text[name.end()..].find('{').map(|i| i + name.end()) else {
            continue;
        };
        let header = &text[name.end()..open];
        if header.contains(';') {
            continue;
        }
        let Some(close) = matching_brace(&text, open) else {
            continue;
        };

        let kind = match keyword.as_str() {
            "interface" => ClassKind::Interface,
            "enum" => ClassKind::Enum,
            _ => ClassKind::Class,
        };
        types.push(parse_body(
            name.as_str(),
            kind,
            header,
            &text[open + 1..close],
        ));
    }

    SourceFile {
        package,
        imports,
        types,
    }
}

fn parse_body(name: &str, kind: ClassKind, header: &str, body: &str) -> TypeDecl {
    let superclass = match kind {
        ClassKind::Class => EXTENDS
            .captures(skip_type_parameters(header))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string()),
        _ => None,
    };

    let mut statements = top_level_statements(body).into_iter();
    let enum_constants = match kind {
        ClassKind::Enum => statements
            .next()
            .map(|first| parse_enum_constants(&first))
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut fields = Vec::new();
    let mut methods = Vec::new();
    for statement in statements {
        if kind == ClassKind::Interface {
            methods.extend(parse_method(&statement));
        } else {
            fields.extend(parse_field(&statement));
        }
    }

    TypeDecl {
        name: name.to_string(),
        kind,
        superclass,
        fields,
        methods,
        enum_constants,
    }
}

fn parse_enum_constants(statement: &str) -> Vec<String> {
    split_top_level(statement, ',')
        .into_iter()
        .filter_map(|constant| {
            let constant = strip_annotations(&constant);
            IDENTIFIER
                .find(constant.trim())
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

fn parse_field(statement: &str) -> Option<FieldDecl> {
    let statement = strip_annotations(statement);
    let declaration = statement.split('=').next().unwrap_or_default().trim();
    if declaration.contains('(') {
        return None;
    }

    let captures = FIELD.captures(declaration)?;
    let modifiers = captures.get(1).map_or("", |m| m.as_str());
    let mut ty = captures.get(2)?.as_str().trim().to_string();
    let name = captures.get(3)?.as_str();
    if KEYWORDS.contains(&ty.as_str()) || ty.ends_with(',') {
        return None;
    }
    // `int values[]` is `int[] values`.
    let dims = captures.get(4).map_or("", |m| m.as_str());
    for _ in 0..dims.matches('[').count() {
        ty.push_str("[]");
    }

    Some(FieldDecl {
        name: name.to_string(),
        ty,
        is_static: modifiers.split_whitespace().any(|m| m == "static"),
    })
}

fn parse_method(statement: &str) -> Option<MethodDecl> {
    let statement = skip_leading_annotations(statement);
    let open = statement.find('(')?;
    let close = matching_paren(statement, open)?;

    let head: Vec<&str> = statement[..open].split_whitespace().collect();
    let (name, rest) = head.split_last()?;
    if rest.is_empty() || rest.iter().any(|m| matches!(*m, "default" | "static" | "private")) {
        return None;
    }

    let params = split_top_level(&statement[open + 1..close], ',')
        .iter()
        .filter(|param| !param.trim().is_empty())
        .filter_map(|param| parse_param(param))
        .collect();

    Some(MethodDecl {
        name: name.to_string(),
        params,
    })
}

fn parse_param(text: &str) -> Option<ParamDecl> {
    let binding = PARAM_NAME
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let plain = strip_annotations(text);
    let plain = plain.trim().trim_start_matches("final ").trim();
    let (ty, _name) = plain.rsplit_once(char::is_whitespace)?;

    Some(ParamDecl {
        binding,
        ty: ty.trim().to_string(),
    })
}

/// Header text after any class type parameters (`<T extends Foo>`).
fn skip_type_parameters(header: &str) -> &str {
    let trimmed = header.trim_start();
    if !trimmed.starts_with('<') {
        return header;
    }
    let mut depth = 0usize;
    for (i, c) in trimmed.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return &trimmed[i + 1..];
                }
            }
            _ => {}
        }
    }
    header
}

fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..at]);
        rest = skip_annotation(&rest[at..]);
    }
    out.push_str(rest);
    out
}

fn skip_leading_annotations(text: &str) -> &str {
    let mut rest = text.trim_start();
    while rest.starts_with('@') {
        rest = skip_annotation(rest).trim_start();
    }
    rest
}

/// The text after the annotation `text` starts with.
fn skip_annotation(text: &str) -> &str {
    let name_len = text[1..]
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '.')))
        .map_or(text.len(), |i| i + 1);
    let after = &text[name_len..];
    let trimmed = after.trim_start();
    if trimmed.starts_with('(') {
        let offset = after.len() - trimmed.len();
        if let Some(close) = matching_paren(trimmed, 0) {
            return &after[offset + close + 1..];
        }
    }
    after
}

/// Statements directly inside a type body, with nested blocks collapsed to
/// statement breaks.
fn top_level_statements(body: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                let literal = take_literal(c, &mut chars);
                if depth == 0 {
                    current.push(c);
                    current.push_str(&literal);
                }
            }
            '{' => {
                if depth == 0 {
                    push_statement(&mut statements, &mut current);
                }
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => push_statement(&mut statements, &mut current),
            _ if depth == 0 => current.push(c),
            _ => {}
        }
    }
    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// Consumes a string or char literal up to and including its closing quote.
fn take_literal(quote: char, chars: &mut impl Iterator<Item = char>) -> String {
    let mut literal = String::new();
    let mut escaped = false;
    for c in chars.by_ref() {
        literal.push(c);
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            break;
        }
    }
    literal
}

fn split_top_level(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                current.push(c);
                current.push_str(&take_literal(c, &mut chars));
            }
            '<' | '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c == separator && depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Byte offset of the brace closing the one at `open`.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    matching(text, open, '{', '}')
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    matching(text, open, '(', ')')
}

fn matching(text: &str, open: usize, opener: char, closer: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            c if c == opener => depth += 1,
            c if c == closer => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes `//` and `/* */` comments, leaving string literals intact.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push(c);
                out.push_str(&take_literal(c, &mut chars));
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for c in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}
