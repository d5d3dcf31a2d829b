//! Line templates for rendering log entries as chat text.

use crate::{LogEntry, SourceName};
use filterwatch_error::{ValidationError, ValidationErrorKind};
use std::str::FromStr;

/// Placeholders a template may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TemplateField {
    /// `{user}`: who tripped the filter.
    User,
    /// `{filter_id}`: which filter fired.
    FilterId,
    /// `{action}`: what was attempted.
    Action,
    /// `{page}`: the target page.
    Page,
    /// `{result}`: the consequence applied.
    Result,
    /// `{filter_description}`: the filter's public description.
    FilterDescription,
    /// `{id}`: the log entry id.
    Id,
    /// `{wiki_address}`: the source the entry came from.
    WikiAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(TemplateField),
}

/// A line format parsed once, rendered many times.
///
/// Placeholders are written `{field}`; literal braces are doubled (`{{`, `}}`).
///
/// # Examples
///
/// ```
/// use filterwatch_core::{LineTemplate, LogEntryBuilder, SourceName};
///
/// let template = LineTemplate::parse("{user} hit #{filter_id} on {wiki_address}").unwrap();
/// let entry = LogEntryBuilder::default()
///     .id(7u64)
///     .filter_id("12")
///     .user("Vandal")
///     .page("Sandbox")
///     .action("edit")
///     .result("warn")
///     .build()
///     .unwrap();
/// let source = SourceName::new("test.wikipedia.org").unwrap();
/// assert_eq!(template.render(&entry, &source), "Vandal hit #12 on test.wikipedia.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl LineTemplate {
    /// Parse a template, rejecting unknown placeholders and unbalanced braces.
    #[track_caller]
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let invalid = |reason: String| {
            ValidationError::new(ValidationErrorKind::Template {
                template: raw.clone(),
                reason,
            })
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(invalid("unterminated placeholder".to_string()));
                    }
                    let field = TemplateField::from_str(name.trim())
                        .map_err(|_| invalid(format!("unknown placeholder '{{{}}}'", name)))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(invalid("unmatched '}'".to_string())),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { raw, segments })
    }

    /// Render an entry from `source`.
    pub fn render(&self, entry: &LogEntry, source: &SourceName) -> String {
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(field) => match field {
                    TemplateField::User => line.push_str(&entry.user),
                    TemplateField::FilterId => line.push_str(&entry.filter_id),
                    TemplateField::Action => line.push_str(&entry.action),
                    TemplateField::Page => line.push_str(&entry.page),
                    TemplateField::Result => line.push_str(&entry.result),
                    TemplateField::FilterDescription => line.push_str(&entry.filter_description),
                    TemplateField::Id => line.push_str(&entry.id.to_string()),
                    TemplateField::WikiAddress => line.push_str(source.as_str()),
                },
            }
        }
        line
    }

    /// The template as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for LineTemplate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
