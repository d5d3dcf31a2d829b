//! Operator host patterns.

use filterwatch_error::{ValidationError, ValidationErrorKind};
use regex::{Regex, RegexBuilder};

/// A glob over IRC hosts granting operator rights.
///
/// `*` matches any run of characters and `?` a single character; everything
/// else matches literally, ignoring ASCII case. A pattern without wildcards
/// is an exact host match.
///
/// # Examples
///
/// ```
/// use filterwatch_core::HostPattern;
///
/// let pattern = HostPattern::new("wikimedia/*").unwrap();
/// assert!(pattern.matches("wikimedia/Alice"));
/// assert!(!pattern.matches("unaffiliated/alice"));
/// ```
#[derive(Debug, Clone)]
pub struct HostPattern {
    source: String,
    regex: Regex,
}

impl HostPattern {
    /// Compile a host pattern.
    #[track_caller]
    pub fn new(pattern: impl AsRef<str>) -> Result<Self, ValidationError> {
        let pattern = pattern.as_ref().trim();
        if pattern.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::HostPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            }));
        }

        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for c in pattern.chars() {
            match c {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        expr.push('$');

        let regex = RegexBuilder::new(&expr)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                ValidationError::new(ValidationErrorKind::HostPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether `host` is covered by this pattern.
    pub fn matches(&self, host: &str) -> bool {
        self.regex.is_match(host)
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for HostPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for HostPattern {}
