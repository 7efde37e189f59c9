//! Line-oriented text templating with typed placeholders.
//!
//! A template declares its placeholders in the text itself:
//!
//! - `%name%` — plain substitution, the value is required.
//! - `%name?%` — optional: absent from the mapping renders as empty text.
//! - `%name??%` — nullable: an explicit [`Value::Null`] renders as empty text
//!   (an absent value is still an error).
//! - `%~cond -> "text"~%` — whole-line conditional: `cond` must be a boolean.
//!   When false, the entire output line containing the placeholder is dropped;
//!   when true, the quoted text (after `\n`/`\"`/`\\` unescaping) is itself
//!   parsed as a nested template and rendered in place, indented to the column
//!   at which the placeholder appears.
//!
//! A `%` that does not introduce a well-formed placeholder is literal text.
//! Parsing is an explicit scanner over the template characters; rendering is a
//! single pass over the declared placeholders in first-encountered order, so
//! output is byte-identical for fixed template text and a fixed value mapping.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Sentinel substituted for a falsy whole-line conditional. The line filter
/// drops every output line that still contains it after substitution.
const ELIDE: &str = "\u{1}elide\u{1}";

/// A value supplied to [`Template::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text, substituted verbatim by the default formatter.
    Str(String),
    /// Integer, rendered in decimal by the default formatter.
    Int(i64),
    /// Boolean, the only value a whole-line conditional accepts.
    Bool(bool),
    /// Explicit null; only legal for nullable placeholders.
    Null,
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }

    /// Human-readable form, also the default substitution text.
    pub fn display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Placeholder-name → value mapping, insertion ordered.
#[derive(Debug, Clone, Default)]
pub struct Values {
    entries: IndexMap<String, Value>,
}

impl Values {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Binds `name` to `value` when `value` is present; otherwise leaves the
    /// name unbound.
    #[must_use]
    pub fn set_opt(mut self, name: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.entries.insert(name.into(), value.into());
        }
        self
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }
}

/// Value → text function applied to plain/optional/nullable placeholders.
pub type Formatter = fn(&Value) -> String;

fn default_format(value: &Value) -> String {
    value.display()
}

/// Placeholder kind, as written in the template text.
#[derive(Debug, Clone)]
enum Kind {
    Plain,
    Optional,
    Nullable,
    /// `%~name -> "..."~%`; owns the parsed branch template and the column at
    /// which the token appears, which becomes the branch's render indent.
    Conditional { branch: Box<Template>, column: usize },
}

impl Kind {
    fn describe(&self) -> &'static str {
        match self {
            Kind::Plain => "plain placeholder",
            Kind::Optional => "optional placeholder",
            Kind::Nullable => "nullable placeholder",
            Kind::Conditional { .. } => "whole-line conditional",
        }
    }
}

/// One declared placeholder.
#[derive(Debug, Clone)]
struct Variable {
    name: String,
    kind: Kind,
    /// The literal token text in the source, e.g. `%foo?%`.
    token: String,
    formatter: Formatter,
}

impl Variable {
    fn substitution(&self, values: &Values) -> Result<String> {
        match &self.kind {
            Kind::Plain => self.text_value(values.get(&self.name), false),
            Kind::Optional => match values.get(&self.name) {
                None => Ok(String::new()),
                some => self.text_value(some, false),
            },
            Kind::Nullable => self.text_value(values.get(&self.name), true),
            Kind::Conditional { branch, column } => match values.get(&self.name) {
                None => Err(Error::MissingRequiredVariable {
                    name: self.name.clone(),
                }),
                Some(Value::Bool(false)) => Ok(ELIDE.to_string()),
                Some(Value::Bool(true)) => branch.render(values, *column),
                Some(other) => Err(self.mismatch("boolean", other)),
            },
        }
    }

    fn text_value(&self, value: Option<&Value>, nullable: bool) -> Result<String> {
        match value {
            None => Err(Error::MissingRequiredVariable {
                name: self.name.clone(),
            }),
            Some(Value::Null) if nullable => Ok(String::new()),
            Some(value @ Value::Null) => Err(self.mismatch("text", value)),
            Some(value @ Value::Bool(_)) => Err(self.mismatch("text", value)),
            Some(value) => Ok((self.formatter)(value)),
        }
    }

    fn mismatch(&self, expected: &str, value: &Value) -> Error {
        Error::TypeMismatch {
            name: self.name.clone(),
            expected: expected.to_string(),
            actual: value.type_name().to_string(),
            value: value.display(),
        }
    }
}

/// A parsed template: the source text plus its declared placeholder set.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    vars: Vec<Variable>,
}

impl Template {
    /// Parses `text` into a template, collecting placeholders in the order
    /// they are first encountered.
    pub fn parse(text: &str) -> Result<Self> {
        let chars: Vec<char> = text.chars().collect();
        let mut vars: Vec<Variable> = Vec::new();
        let mut column = 0usize;
        let mut i = 0usize;
        while i < chars.len() {
            if chars[i] == '\n' {
                column = 0;
                i += 1;
                continue;
            }
            if chars[i] == '%' {
                if let Some((var, end)) = scan_placeholder(&chars, i, column)? {
                    declare(&mut vars, var)?;
                    column += end - i;
                    i = end;
                    continue;
                }
            }
            column += 1;
            i += 1;
        }
        Ok(Template {
            source: text.to_string(),
            vars,
        })
    }

    /// Overrides the formatter of every placeholder named `name`, including
    /// inside conditional branches.
    #[must_use]
    pub fn with_formatter(mut self, name: &str, formatter: Formatter) -> Self {
        set_formatter(&mut self.vars, name, formatter);
        self
    }

    /// Substitutes `values` into the template.
    ///
    /// Lines containing a falsy whole-line conditional are removed from the
    /// output; `indent` is then prepended to every non-empty line after the
    /// first. The first line is never re-indented, so rendered text can be
    /// spliced inline at an already-indented call site.
    pub fn render(&self, values: &Values, indent: usize) -> Result<String> {
        let mut out = self.source.clone();
        for var in &self.vars {
            let replacement = var.substitution(values)?;
            out = out.replace(&var.token, &replacement);
        }

        let pad = " ".repeat(indent);
        let mut result = String::new();
        let mut first = true;
        for line in out.split('\n') {
            if line.contains(ELIDE) {
                continue;
            }
            if !first {
                result.push('\n');
                if !line.is_empty() && indent > 0 {
                    result.push_str(&pad);
                }
            }
            result.push_str(line);
            first = false;
        }
        Ok(result)
    }

    /// Names of the declared placeholders, in first-encountered order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.name.as_str())
    }
}

fn set_formatter(vars: &mut [Variable], name: &str, formatter: Formatter) {
    for var in vars {
        if var.name == name {
            var.formatter = formatter;
        }
        if let Kind::Conditional { branch, .. } = &mut var.kind {
            set_formatter(&mut branch.vars, name, formatter);
        }
    }
}

/// Registers a placeholder occurrence. A repeated occurrence of the same token
/// is the same variable; the same name under a different form is a conflict.
fn declare(vars: &mut Vec<Variable>, var: Variable) -> Result<()> {
    if let Some(existing) = vars.iter().find(|v| v.name == var.name) {
        if existing.token == var.token {
            return Ok(());
        }
        return Err(Error::TypeMismatch {
            name: var.name,
            expected: existing.kind.describe().to_string(),
            actual: var.kind.describe().to_string(),
            value: var.token,
        });
    }
    vars.push(var);
    Ok(())
}

/// Attempts to scan a placeholder starting at `chars[start] == '%'`. Returns
/// the variable and the index one past its closing `%`, or `None` when the
/// text is not a well-formed placeholder (it is then literal text).
fn scan_placeholder(
    chars: &[char],
    start: usize,
    column: usize,
) -> Result<Option<(Variable, usize)>> {
    let mut i = start + 1;
    if i >= chars.len() {
        return Ok(None);
    }

    if chars[i] == '~' {
        i += 1;
        skip_spaces(chars, &mut i);
        let name = scan_ident(chars, &mut i);
        if name.is_empty() {
            return Ok(None);
        }
        skip_spaces(chars, &mut i);
        if !(eat(chars, &mut i, '-') && eat(chars, &mut i, '>')) {
            return Ok(None);
        }
        skip_spaces(chars, &mut i);
        if !eat(chars, &mut i, '"') {
            return Ok(None);
        }
        let mut text = String::new();
        loop {
            if i >= chars.len() {
                return Ok(None);
            }
            match chars[i] {
                '"' => {
                    i += 1;
                    break;
                }
                '\\' if i + 1 < chars.len() => {
                    i += 1;
                    match chars[i] {
                        'n' => text.push('\n'),
                        '"' => text.push('"'),
                        '\\' => text.push('\\'),
                        other => {
                            text.push('\\');
                            text.push(other);
                        }
                    }
                    i += 1;
                }
                c => {
                    text.push(c);
                    i += 1;
                }
            }
        }
        skip_spaces(chars, &mut i);
        if !(eat(chars, &mut i, '~') && eat(chars, &mut i, '%')) {
            return Ok(None);
        }
        let branch = Template::parse(&text)?;
        let token: String = chars[start..i].iter().collect();
        return Ok(Some((
            Variable {
                name,
                kind: Kind::Conditional {
                    branch: Box::new(branch),
                    column,
                },
                token,
                formatter: default_format,
            },
            i,
        )));
    }

    let name = scan_ident(chars, &mut i);
    if name.is_empty() {
        return Ok(None);
    }
    let mut marks = 0;
    while marks < 2 && eat(chars, &mut i, '?') {
        marks += 1;
    }
    if !eat(chars, &mut i, '%') {
        return Ok(None);
    }
    let kind = match marks {
        0 => Kind::Plain,
        1 => Kind::Optional,
        _ => Kind::Nullable,
    };
    let token: String = chars[start..i].iter().collect();
    Ok(Some((
        Variable {
            name,
            kind,
            token,
            formatter: default_format,
        },
        i,
    )))
}

fn scan_ident(chars: &[char], i: &mut usize) -> String {
    let mut ident = String::new();
    if *i < chars.len() && (chars[*i].is_ascii_alphabetic() || chars[*i] == '_') {
        while *i < chars.len() && (chars[*i].is_ascii_alphanumeric() || chars[*i] == '_') {
            ident.push(chars[*i]);
            *i += 1;
        }
    }
    ident
}

fn skip_spaces(chars: &[char], i: &mut usize) {
    while *i < chars.len() && chars[*i] == ' ' {
        *i += 1;
    }
}

fn eat(chars: &[char], i: &mut usize, expected: char) -> bool {
    if *i < chars.len() && chars[*i] == expected {
        *i += 1;
        true
    } else {
        false
    }
}
