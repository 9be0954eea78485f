//! Line-oriented class description language.
//!
//! ```text
//! @Entity
//! class Account extends Object implements Serializable {
//!   property id: Long
//!   property balance: BigDecimal
//!   private transient property cache: Map<String, List<? extends Number>>
//!   method getOwner(): String { return this.owner }
//!   method setOwner(value: String) {
//!     this.owner = value
//!     audit(value)
//!   }
//!   @PersistenceMethod method setRaw(value: String) { this.raw = value }
//! }
//! ```
//!
//! Attributes default to public visibility. Method bodies hold one
//! statement per line; assignments, returns and calls on `this` are
//! understood, anything else is kept verbatim. Lines of nested blocks
//! (`if (..) {` up to the matching `}`) are kept verbatim as well.

mod render;
mod types;

pub use types::parse_type;

const BLOCK_INDENT: &str = "  ";

use crate::core::{Result, WeaveError};
use crate::model::{
    AttributeDeclaration, ClassDefinition, Expr, MethodDeclaration, Modifiers, Parameter,
    Statement, TypeRef, Visibility,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassProgram {
    pub classes: Vec<ClassDefinition>,
}

impl ClassProgram {
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser::default();
        for (line_idx, raw_line) in input.lines().enumerate() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            parser.line(line, line_idx + 1)?;
        }
        parser.finish()
    }

    pub fn find(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes
            .iter()
            .find(|class| class.name == name || class.simple_name() == name)
    }

    /// Render all classes back into the class language.
    pub fn render(&self) -> String {
        self.classes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Default)]
struct Parser {
    classes: Vec<ClassDefinition>,
    current: Option<ClassDefinition>,
    /// Method whose body is still open.
    open_method: Option<MethodDeclaration>,
    /// Nested blocks open inside that body.
    block_depth: usize,
    pending_annotations: Vec<String>,
}

impl Parser {
    fn line(&mut self, line: &str, line_no: usize) -> Result<()> {
        if self.open_method.is_some() && self.block_depth == 0 && line == "}" {
            let finished = self.open_method.take().ok_or_else(|| {
                WeaveError::ParseError("Internal parser error: missing open method".into())
            })?;
            return self.push_method(finished, line_no);
        }
        if let Some(method) = self.open_method.as_mut() {
            let delta = brace_delta(line);
            let statement = if self.block_depth == 0 && delta == 0 {
                parse_statement(line)
            } else {
                let closing = line.chars().take_while(|&ch| ch == '}').count();
                let indent = self.block_depth.saturating_sub(closing);
                Statement::Raw {
                    text: format!("{}{}", BLOCK_INDENT.repeat(indent), line),
                }
            };
            let depth = self.block_depth as isize + delta;
            if depth < 0 {
                return Err(WeaveError::ParseError(format!(
                    "Line {}: unbalanced '}}' in body of method '{}'",
                    line_no, method.name
                )));
            }
            self.block_depth = depth as usize;
            method.body.get_or_insert_with(Vec::new).push(statement);
            return Ok(());
        }

        let (annotations, rest) = split_annotations(line, line_no)?;
        self.pending_annotations.extend(annotations);
        if rest.is_empty() {
            return Ok(());
        }

        if self.current.is_some() {
            if rest == "}" {
                if !self.pending_annotations.is_empty() {
                    return Err(WeaveError::ParseError(format!(
                        "Line {}: annotations without a member",
                        line_no
                    )));
                }
                let finished = self.current.take().ok_or_else(|| {
                    WeaveError::ParseError("Internal parser error: missing active class".into())
                })?;
                self.classes.push(finished);
                return Ok(());
            }
            return self.member(rest, line_no);
        }

        let mut class = parse_class_header(rest, line_no)?;
        class.annotations = std::mem::take(&mut self.pending_annotations);
        self.current = Some(class);
        Ok(())
    }

    fn member(&mut self, line: &str, line_no: usize) -> Result<()> {
        let (visibility, modifiers, rest) = parse_modifiers(line);
        let annotations = std::mem::take(&mut self.pending_annotations);

        if let Some(decl) = strip_keyword(rest, "property").or_else(|| strip_keyword(rest, "field"))
        {
            let mut attribute = parse_attribute(decl, line_no)?;
            attribute.visibility = visibility;
            attribute.modifiers = modifiers;
            attribute.annotations = annotations;
            let class = self.active_class(line_no)?;
            if class.find_attribute(&attribute.name).is_some() {
                return Err(WeaveError::ParseError(format!(
                    "Line {}: class '{}' declares '{}' more than once",
                    line_no, class.name, attribute.name
                )));
            }
            class.attributes.push(attribute);
            return Ok(());
        }

        if let Some(decl) = strip_keyword(rest, "method") {
            let (mut method, body) = parse_method(decl, line_no)?;
            method.visibility = visibility;
            method.modifiers = modifiers;
            method.annotations = annotations;
            return match body {
                BodyState::None => self.push_method(method, line_no),
                BodyState::Inline(statements) => {
                    method.body = Some(statements);
                    self.push_method(method, line_no)
                }
                BodyState::Open => {
                    method.body = Some(Vec::new());
                    self.open_method = Some(method);
                    Ok(())
                }
            };
        }

        Err(WeaveError::ParseError(format!(
            "Line {}: expected 'property' or 'method' declaration, got '{}'",
            line_no, line
        )))
    }

    fn push_method(&mut self, method: MethodDeclaration, line_no: usize) -> Result<()> {
        let class = self.active_class(line_no)?;
        let duplicate = class.methods.iter().any(|existing| {
            existing.name == method.name
                && existing.params.iter().map(|p| &p.ty).eq(method.params.iter().map(|p| &p.ty))
        });
        if duplicate {
            return Err(WeaveError::ParseError(format!(
                "Line {}: class '{}' declares method '{}' with the same parameters twice",
                line_no, class.name, method.name
            )));
        }
        class.methods.push(method);
        Ok(())
    }

    fn active_class(&mut self, line_no: usize) -> Result<&mut ClassDefinition> {
        self.current.as_mut().ok_or_else(|| {
            WeaveError::ParseError(format!("Line {}: member outside of a class", line_no))
        })
    }

    fn finish(self) -> Result<ClassProgram> {
        if let Some(method) = self.open_method {
            return Err(WeaveError::ParseError(format!(
                "Unclosed body of method '{}' (missing closing '}}')",
                method.name
            )));
        }
        if let Some(unclosed) = self.current {
            return Err(WeaveError::ParseError(format!(
                "Unclosed class '{}' (missing closing '}}')",
                unclosed.name
            )));
        }
        if !self.pending_annotations.is_empty() {
            return Err(WeaveError::ParseError(
                "Trailing annotations without a class".into(),
            ));
        }
        if self.classes.is_empty() {
            return Err(WeaveError::ParseError(
                "Class program is empty; add at least one class".into(),
            ));
        }
        Ok(ClassProgram {
            classes: self.classes,
        })
    }
}

enum BodyState {
    None,
    Inline(Vec<Statement>),
    Open,
}

fn parse_class_header(line: &str, line_no: usize) -> Result<ClassDefinition> {
    let Some(rest) = strip_keyword(line, "class") else {
        return Err(WeaveError::ParseError(format!(
            "Line {}: expected 'class <name> {{'",
            line_no
        )));
    };
    let Some(rest) = rest.strip_suffix('{') else {
        return Err(WeaveError::ParseError(format!(
            "Line {}: class declaration must end with '{{'",
            line_no
        )));
    };
    let rest = rest.trim();

    let (name_part, tail) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, tail)| (name, tail.trim()));
    if !is_qualified_name(name_part) {
        return Err(WeaveError::ParseError(format!(
            "Line {}: invalid class name '{}'",
            line_no, name_part
        )));
    }
    let mut class = ClassDefinition::new(name_part);

    let (extends_part, implements_part) = match find_keyword(tail, "implements") {
        Some(idx) => (tail[..idx].trim(), Some(tail[idx + "implements".len()..].trim())),
        None => (tail, None),
    };

    if !extends_part.is_empty() {
        let Some(ancestor) = strip_keyword(extends_part, "extends") else {
            return Err(WeaveError::ParseError(format!(
                "Line {}: unexpected '{}' in class header",
                line_no, extends_part
            )));
        };
        class.ancestor = Some(parse_type(ancestor, line_no)?);
    }

    if let Some(list) = implements_part {
        for part in split_top_level(list, ',') {
            class.capabilities.push(parse_type(part.trim(), line_no)?);
        }
    }

    Ok(class)
}

fn parse_attribute(decl: &str, line_no: usize) -> Result<AttributeDeclaration> {
    let (name_raw, ty_raw) = decl.split_once(':').ok_or_else(|| {
        WeaveError::ParseError(format!(
            "Line {}: expected attribute format '<name>: <type>'",
            line_no
        ))
    })?;
    let name = name_raw.trim();
    if !is_identifier(name) {
        return Err(WeaveError::ParseError(format!(
            "Line {}: invalid attribute name '{}'",
            line_no, name
        )));
    }
    Ok(AttributeDeclaration::new(name, parse_type(ty_raw.trim(), line_no)?))
}

fn parse_method(decl: &str, line_no: usize) -> Result<(MethodDeclaration, BodyState)> {
    let open = decl.find('(').ok_or_else(|| {
        WeaveError::ParseError(format!("Line {}: expected '(' after method name", line_no))
    })?;
    let name = decl[..open].trim();
    if !is_identifier(name) {
        return Err(WeaveError::ParseError(format!(
            "Line {}: invalid method name '{}'",
            line_no, name
        )));
    }
    let close = decl.find(')').ok_or_else(|| {
        WeaveError::ParseError(format!("Line {}: missing ')' in method '{}'", line_no, name))
    })?;

    let mut method = MethodDeclaration::new(name);
    let params_raw = decl[open + 1..close].trim();
    if !params_raw.is_empty() {
        for part in split_top_level(params_raw, ',') {
            let (param_name, param_ty) = part.split_once(':').ok_or_else(|| {
                WeaveError::ParseError(format!(
                    "Line {}: parameter '{}' must be written '<name>: <type>'",
                    line_no,
                    part.trim()
                ))
            })?;
            let param_name = param_name.trim();
            if !is_identifier(param_name) {
                return Err(WeaveError::ParseError(format!(
                    "Line {}: invalid parameter name '{}'",
                    line_no, param_name
                )));
            }
            method
                .params
                .push(Parameter::new(param_name, parse_type(param_ty.trim(), line_no)?));
        }
    }

    let mut tail = decl[close + 1..].trim();
    let body = match tail.find('{') {
        Some(brace) => {
            let body_text = tail[brace + 1..].trim();
            tail = tail[..brace].trim();
            match body_text.strip_suffix('}') {
                Some(inline) if inline.trim().is_empty() => BodyState::Inline(Vec::new()),
                Some(inline) => BodyState::Inline(vec![parse_statement(inline.trim())]),
                None if body_text.is_empty() => BodyState::Open,
                None => {
                    return Err(WeaveError::ParseError(format!(
                        "Line {}: statements after '{{' must start on the next line",
                        line_no
                    )));
                }
            }
        }
        None => BodyState::None,
    };

    if let Some(ret) = tail.strip_prefix(':') {
        method.return_type = Some(parse_type(ret.trim(), line_no)?);
    } else if !tail.is_empty() {
        return Err(WeaveError::ParseError(format!(
            "Line {}: unexpected '{}' after parameters of '{}'",
            line_no, tail, name
        )));
    }

    Ok((method, body))
}

/// Leading visibility and modifier keywords, in any order.
fn parse_modifiers(line: &str) -> (Visibility, Modifiers, &str) {
    let mut visibility = Visibility::Public;
    let mut modifiers = Modifiers::none();
    let mut rest = line;
    loop {
        let (word, tail) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(word, tail)| (word, tail.trim_start()));
        match word {
            "public" => visibility = Visibility::Public,
            "protected" => visibility = Visibility::Protected,
            "package" => visibility = Visibility::Package,
            "private" => visibility = Visibility::Private,
            "static" => modifiers.is_static = true,
            "final" => modifiers.is_final = true,
            "transient" => modifiers.is_transient = true,
            "abstract" => modifiers.is_abstract = true,
            "synthetic" => modifiers.is_synthetic = true,
            _ => return (visibility, modifiers, rest),
        }
        rest = tail;
    }
}

/// Leading `@Name` tokens.
fn split_annotations(line: &str, line_no: usize) -> Result<(Vec<String>, &str)> {
    let mut annotations = Vec::new();
    let mut rest = line;
    while let Some(tail) = rest.strip_prefix('@') {
        let (name, next) = tail
            .split_once(char::is_whitespace)
            .map_or((tail, ""), |(name, next)| (name, next.trim_start()));
        if !is_qualified_name(name) {
            return Err(WeaveError::ParseError(format!(
                "Line {}: invalid annotation '@{}'",
                line_no, name
            )));
        }
        annotations.push(name.to_string());
        rest = next;
    }
    Ok((annotations, rest))
}

pub(crate) fn parse_statement(text: &str) -> Statement {
    let text = text.trim().trim_end_matches(';').trim_end();

    if let Some(value) = strip_keyword(text, "return") {
        return Statement::returning(parse_expr(value));
    }

    if let Some((lhs, rhs)) = split_assignment(text) {
        let target = parse_expr(lhs);
        if matches!(target, Expr::Field { .. } | Expr::Var { .. }) {
            return Statement::Assign {
                target,
                value: parse_expr(rhs),
            };
        }
    }

    match parse_expr(text) {
        call @ Expr::Call { .. } => Statement::expr(call),
        _ => Statement::Raw {
            text: text.to_string(),
        },
    }
}

fn parse_expr(text: &str) -> Expr {
    let text = text.trim();
    if text == "this" {
        return Expr::This;
    }
    if let Some(literal) = parse_string_literal(text) {
        return Expr::string(literal);
    }
    if is_identifier(text) {
        return Expr::var(text);
    }
    if let Some(member) = text.strip_prefix("this.") {
        if is_identifier(member) {
            return Expr::field(member);
        }
        if let Some((method, args)) = member
            .strip_suffix(')')
            .and_then(|call| call.split_once('('))
        {
            if is_identifier(method) && balanced(args) {
                let args = if args.trim().is_empty() {
                    Vec::new()
                } else {
                    split_top_level(args, ',')
                        .into_iter()
                        .map(parse_expr)
                        .collect()
                };
                return Expr::call(method, args);
            }
        }
    }
    Expr::Raw {
        text: text.to_string(),
    }
}

fn parse_string_literal(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

/// `lhs = rhs` with a single `=` (not `==`, `!=`, `<=`, `>=`).
fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte != b'=' {
            continue;
        }
        let prev = idx.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(idx + 1).copied();
        if next == Some(b'=') || matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) {
            return None;
        }
        return Some((text[..idx].trim(), text[idx + 1..].trim()));
    }
    None
}

/// Split on `separator` outside of `<>`, `()` and string literals.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '<' | '(' if !in_string => depth += 1,
            '>' | ')' if !in_string => depth -= 1,
            c if c == separator && depth == 0 && !in_string => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// `keyword rest` -> `rest`, requiring whitespace after the keyword.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.chars().next().is_some_and(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Byte offset of `keyword` as a whole word.
fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    text.match_indices(keyword).map(|(idx, _)| idx).find(|&idx| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + keyword.len()..].chars().next();
        before.is_none_or(char::is_whitespace) && after.is_some_and(char::is_whitespace)
    })
}

/// Cuts a trailing `//` comment; `//` inside a string literal is kept.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    let mut after_slash = false;
    for (idx, ch) in line.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '/' if after_slash => return &line[..idx - 1],
            '/' => after_slash = true,
            '"' => {
                in_string = true;
                after_slash = false;
            }
            _ => after_slash = false,
        }
    }
    line
}

/// Opened minus closed braces outside string literals.
fn brace_delta(line: &str) -> isize {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    for ch in line.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => delta += 1,
            '}' if !in_string => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

fn is_qualified_name(value: &str) -> bool {
    value.split('.').all(is_identifier)
}
