// types/mod.rs
//! Java type references and their classification.
//!
//! Type references arrive as canonical Java text (`java.util.List<java.lang.Integer>`,
//! `int[]`, `Map<String, ?>`). They are parsed into a [`TypeRef`] and then
//! classified into a [`TypeCategory`], which is what the shape resolver,
//! schema walker and JSON converter branch on.

mod alias;
mod category;
mod descriptor;
mod example;

pub use alias::expand_alias;
pub use category::*;
pub use descriptor::*;
pub use example::*;

use std::fmt;

const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// A parsed Java type reference: an erased name, generic arguments and
/// array dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
    pub array_dims: usize,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            args,
            array_dims: 0,
        }
    }

    pub fn array_of(component: TypeRef) -> Self {
        Self {
            array_dims: component.array_dims + 1,
            ..component
        }
    }

    pub fn object() -> Self {
        Self::named(JAVA_LANG_OBJECT)
    }

    /// Parses canonical Java type text.
    ///
    /// Wildcards collapse to their bound (`? extends Foo` is `Foo`, a bare
    /// `?` or a `? super` bound is `Object`) and varargs (`String...`) count
    /// as one array dimension. Returns `None` for malformed text.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parser = TypeParser {
            chars: text.trim().chars().collect(),
            pos: 0,
        };
        let parsed = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos == parser.chars.len() {
            Some(parsed)
        } else {
            None
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }

    /// The simple (unqualified) part of the erased name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Element type of an array or of a single-argument collection.
    pub fn element_type(&self) -> Option<TypeRef> {
        if self.is_array() {
            Some(Self {
                array_dims: self.array_dims - 1,
                ..self.clone()
            })
        } else {
            self.args.first().cloned()
        }
    }

    /// Value type of a map, its second generic argument.
    pub fn map_value_type(&self) -> Option<&TypeRef> {
        self.args.get(1)
    }

    /// Key type of a map, its first generic argument.
    pub fn map_key_type(&self) -> Option<&TypeRef> {
        self.args.first()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

struct TypeParser {
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        let end = self.pos + keyword.len();
        if end > self.chars.len() {
            return false;
        }
        let matches = self.chars[self.pos..end].iter().copied().eq(keyword.chars());
        let boundary = self
            .chars
            .get(end)
            .map_or(true, |c| !(c.is_alphanumeric() || *c == '_'));
        if matches && boundary {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn parse_name(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
        {
            // `...` is varargs, not part of the name.
            if self.peek() == Some('.') && self.chars.get(self.pos + 1) == Some(&'.') {
                break;
            }
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        self.skip_whitespace();
        if self.eat('?') {
            if self.eat_keyword("extends") {
                return self.parse_type();
            }
            if self.eat_keyword("super") {
                self.parse_type()?;
            }
            return Some(TypeRef::object());
        }

        let name = self.parse_name()?;
        let mut ty = TypeRef::named(name);

        if self.eat('<') {
            if !self.eat('>') {
                loop {
                    ty.args.push(self.parse_type()?);
                    if self.eat(',') {
                        continue;
                    }
                    if self.eat('>') {
                        break;
                    }
                    return None;
                }
            }
        }

        loop {
            if self.eat('[') {
                if !self.eat(']') {
                    return None;
                }
                ty.array_dims += 1;
            } else if self.eat('.') {
                if !(self.eat('.') && self.eat('.')) {
                    return None;
                }
                ty.array_dims += 1;
            } else {
                break;
            }
        }

        Some(ty)
    }
}
