use crate::core::{Result, WeaveError};
use crate::model::{GenericArg, TypeRef};

/// Parse a type expression such as `Map<String, List<? extends Number>>[]`.
pub fn parse_type(text: &str, line_no: usize) -> Result<TypeRef> {
    let mut cursor = TypeCursor::new(text, line_no);
    let ty = cursor.parse_type()?;
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(cursor.error(&format!("unexpected '{}' after type", cursor.rest())));
    }
    Ok(ty)
}

struct TypeCursor<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
    line_no: usize,
}

impl<'a> TypeCursor<'a> {
    fn new(text: &'a str, line_no: usize) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
            line_no,
        }
    }

    fn error(&self, message: &str) -> WeaveError {
        WeaveError::ParseError(format!(
            "Line {}: invalid type '{}': {}",
            self.line_no,
            self.text.trim(),
            message
        ))
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `keyword` if it is the next whole word.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let end = self.pos + keyword.chars().count();
        if end > self.chars.len() {
            return false;
        }
        let word: String = self.chars[self.pos..end].iter().collect();
        let boundary = self
            .chars
            .get(end)
            .is_none_or(|ch| !is_name_char(*ch));
        if word == keyword && boundary {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| is_name_char(ch) || ch == '.')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if name.is_empty() || name.starts_with('.') || name.ends_with('.') || name.contains("..")
        {
            return Err(self.error("expected a type name"));
        }
        Ok(name)
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        let name = self.parse_name()?;
        let mut ty = TypeRef::new(name).at_line(self.line_no);

        if self.eat('<') {
            let mut args = Vec::new();
            loop {
                args.push(self.parse_arg()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>' in type arguments"));
            }
            ty.args = args;
        }

        while self.eat('[') {
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            ty.array_dims += 1;
        }
        Ok(ty)
    }

    fn parse_bounds(&mut self) -> Result<Vec<TypeRef>> {
        let mut bounds = vec![self.parse_type()?];
        while self.eat('&') {
            bounds.push(self.parse_type()?);
        }
        Ok(bounds)
    }

    fn parse_arg(&mut self) -> Result<GenericArg> {
        if self.eat('?') {
            if self.eat_keyword("extends") {
                return Ok(GenericArg::Wildcard {
                    upper: self.parse_bounds()?,
                    lower: None,
                });
            }
            if self.eat_keyword("super") {
                return Ok(GenericArg::Wildcard {
                    upper: Vec::new(),
                    lower: Some(self.parse_type()?),
                });
            }
            return Ok(GenericArg::Wildcard {
                upper: Vec::new(),
                lower: None,
            });
        }

        let ty = self.parse_type()?;
        if self.eat_keyword("extends") {
            if ty.is_generic() || ty.array_dims > 0 || ty.name.contains('.') {
                return Err(self.error("only a plain name can carry bounds"));
            }
            return Ok(GenericArg::Placeholder {
                name: ty.name,
                upper: self.parse_bounds()?,
            });
        }
        Ok(GenericArg::Concrete(ty))
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}
