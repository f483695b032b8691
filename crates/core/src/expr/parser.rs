use super::lexer::{tokenize, Token, TokenKind};
use super::EvalError;
use crate::model::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne => 3,
            Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::In | Self::NotIn => 4,
            Self::Add | Self::Sub => 5,
            Self::Mul | Self::Div | Self::Rem => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member {
        target: Box<Expr>,
        name: String,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    List(Vec<Expr>),
}

impl Expr {
    pub fn parse(expression: &str) -> Result<Self, EvalError> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            expression,
            tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(parser.error_at(token.offset, "unexpected trailing input")),
        }
    }
}

/// Deepest nesting of parentheses, ternaries and prefix operators accepted.
const MAX_NESTING: usize = 128;

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn peek_symbol(&self, symbol: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Symbol(s)) if *s == symbol)
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident(w)) if w == word)
    }

    fn eat_symbol(&mut self, symbol: &str) -> bool {
        if self.peek_symbol(symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<(), EvalError> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error_here(&format!("expected '{}'", symbol)))
        }
    }

    fn error_at(&self, position: usize, message: &str) -> EvalError {
        EvalError::Syntax {
            expression: self.expression.to_string(),
            position,
            message: message.to_string(),
        }
    }

    fn error_here(&self, message: &str) -> EvalError {
        let position = self.peek().map_or(self.expression.len(), |token| token.offset);
        self.error_at(position, message)
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error_here("expression nests too deeply"));
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let expr = self.parse_conditional();
        self.depth -= 1;
        expr
    }

    fn parse_conditional(&mut self) -> Result<Expr, EvalError> {
        let condition = self.parse_binary(1)?;
        if !self.eat_symbol("?") {
            return Ok(condition);
        }
        let then = self.parse_expr()?;
        self.expect_symbol(":")?;
        let otherwise = self.parse_expr()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// The binary operator at the cursor and how many tokens it spans.
    fn peek_binary(&self) -> Option<(BinaryOp, usize)> {
        let op = match self.peek_kind()? {
            TokenKind::Symbol(symbol) => match *symbol {
                "||" => BinaryOp::Or,
                "&&" => BinaryOp::And,
                "==" => BinaryOp::Eq,
                "!=" => BinaryOp::Ne,
                "<" => BinaryOp::Lt,
                ">" => BinaryOp::Gt,
                "<=" => BinaryOp::Le,
                ">=" => BinaryOp::Ge,
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                "%" => BinaryOp::Rem,
                _ => return None,
            },
            TokenKind::Ident(word) => match word.as_str() {
                "or" => BinaryOp::Or,
                "and" => BinaryOp::And,
                "eq" => BinaryOp::Eq,
                "neq" => BinaryOp::Ne,
                "lt" => BinaryOp::Lt,
                "gt" => BinaryOp::Gt,
                "lte" => BinaryOp::Le,
                "gte" => BinaryOp::Ge,
                "in" => BinaryOp::In,
                "not" => {
                    let next_is_in = matches!(
                        self.tokens.get(self.pos + 1).map(|t| &t.kind),
                        Some(TokenKind::Ident(w)) if w == "in"
                    );
                    return next_is_in.then_some((BinaryOp::NotIn, 2));
                }
                _ => return None,
            },
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, width)) = self.peek_binary() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += width;
            let rhs = self.parse_binary(precedence + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = if self.eat_symbol("!") {
            Some(UnaryOp::Not)
        } else if self.peek_word("not") {
            self.pos += 1;
            Some(UnaryOp::Not)
        } else if self.eat_symbol("-") {
            Some(UnaryOp::Neg)
        } else {
            None
        };

        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_symbol(".") {
                let name = match self.peek_kind() {
                    Some(TokenKind::Ident(name)) => name.clone(),
                    _ => return Err(self.error_here("expected a property or method name")),
                };
                self.pos += 1;
                if self.eat_symbol("(") {
                    let args = self.parse_arguments(")")?;
                    expr = Expr::Call {
                        target: Box::new(expr),
                        method: name,
                        args,
                    };
                } else {
                    expr = Expr::Member {
                        target: Box::new(expr),
                        name,
                    };
                }
            } else if self.eat_symbol("[") {
                let index = self.parse_expr()?;
                self.expect_symbol("]")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self, close: &str) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.eat_symbol(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat_symbol(",") {
                continue;
            }
            self.expect_symbol(close)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_here("unexpected end of expression"));
        };
        self.pos += 1;

        match token.kind {
            TokenKind::Integer { digits, suffix } => {
                integer_literal(&digits, suffix).ok_or_else(|| {
                    self.error_at(token.offset, "integer literal out of range")
                })
            }
            TokenKind::Float { digits, suffix } => digits
                .parse::<f64>()
                .map(|v| match suffix {
                    Some('f' | 'F') => Expr::Literal(Value::Float(v as f32)),
                    Some('b' | 'B') => Expr::Literal(Value::Decimal(digits.clone())),
                    _ => Expr::Literal(Value::Double(v)),
                })
                .map_err(|_| self.error_at(token.offset, "malformed number")),
            TokenKind::Str(text) => Ok(Expr::Literal(Value::String(text))),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "null" => Expr::Literal(Value::Null),
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                _ => Expr::Ident(name),
            }),
            TokenKind::Symbol("(") => {
                let inner = self.parse_expr()?;
                self.expect_symbol(")")?;
                Ok(inner)
            }
            TokenKind::Symbol("{") => Ok(Expr::List(self.parse_arguments("}")?)),
            TokenKind::Symbol(symbol) => {
                Err(self.error_at(token.offset, &format!("unexpected '{}'", symbol)))
            }
        }
    }
}

fn integer_literal(digits: &str, suffix: Option<char>) -> Option<Expr> {
    let value: i128 = digits.parse().ok()?;
    let literal = match suffix {
        Some('l' | 'L') => Value::Long(i64::try_from(value).ok()?),
        Some('h' | 'H') => Value::BigInteger(value),
        Some('b' | 'B') => Value::Decimal(digits.to_string()),
        _ => match i32::try_from(value) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::Long(i64::try_from(value).ok()?),
        },
    };
    Some(Expr::Literal(literal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.into()))
    }

    #[test]
    fn precedence_binds_and_tighter_than_or() {
        let expr = Expr::parse("a or b and c").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Or,
                lhs: ident("a"),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::And,
                    lhs: ident("b"),
                    rhs: ident("c"),
                }),
            }
        );
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let deep = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(Expr::parse(&deep), Err(EvalError::Syntax { .. })));
        assert!(matches!(
            Expr::parse(&"!".repeat(10_000)),
            Err(EvalError::Syntax { .. })
        ));

        let shallow = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(Expr::parse(&shallow).unwrap(), Expr::Ident("x".into()));
    }

    #[test]
    fn arithmetic_is_left_associative() {
        let expr = Expr::parse("10 - 3 - 2").unwrap();
        let Expr::Binary { op, lhs, .. } = expr else {
            panic!("expected a binary expression");
        };
        assert_eq!(op, BinaryOp::Sub);
        assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn parses_paths_calls_and_indexes() {
        let expr = Expr::parse("user.roles[0].name.trim()").unwrap();
        let Expr::Call { method, target, args } = expr else {
            panic!("expected a call");
        };
        assert_eq!(method, "trim");
        assert!(args.is_empty());
        assert!(matches!(*target, Expr::Member { ref name, .. } if name == "name"));
    }

    #[test]
    fn parses_ternary_and_not_in() {
        assert!(matches!(
            Expr::parse("a ? 'x' : 'y'").unwrap(),
            Expr::Conditional { .. }
        ));
        assert!(matches!(
            Expr::parse("status not in {'A', 'B'}").unwrap(),
            Expr::Binary { op: BinaryOp::NotIn, .. }
        ));
    }

    #[test]
    fn literals_pick_their_width() {
        assert_eq!(Expr::parse("1").unwrap(), Expr::Literal(Value::Int(1)));
        assert_eq!(
            Expr::parse("3000000000").unwrap(),
            Expr::Literal(Value::Long(3_000_000_000))
        );
        assert_eq!(Expr::parse("2L").unwrap(), Expr::Literal(Value::Long(2)));
    }

    #[test]
    fn reports_trailing_input() {
        let err = Expr::parse("a b").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { position: 2, .. }));
    }
}
