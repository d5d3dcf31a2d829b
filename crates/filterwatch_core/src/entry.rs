//! Abuse-log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hit of an abuse filter, as read from a wiki's log.
///
/// Entry ids increase monotonically within a wiki, which is what makes them
/// usable as a watermark.
///
/// # Examples
///
/// ```
/// use filterwatch_core::LogEntryBuilder;
///
/// let entry = LogEntryBuilder::default()
///     .id(101u64)
///     .filter_id("12")
///     .user("Vandal")
///     .page("Main Page")
///     .action("edit")
///     .result("disallow")
///     .build()
///     .unwrap();
/// assert_eq!(entry.id, 101);
/// assert!(entry.filter_description.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct LogEntry {
    /// Log entry id.
    pub id: u64,
    /// Filter (category) id; global filters look like `global-12`.
    pub filter_id: String,
    /// User who tripped the filter.
    pub user: String,
    /// Page the action targeted.
    pub page: String,
    /// Action attempted (`edit`, `move`, ...).
    pub action: String,
    /// Consequence applied (`warn`, `disallow`, ...), possibly empty.
    pub result: String,
    /// Public description of the filter.
    #[builder(default)]
    pub filter_description: String,
    /// When the filter was tripped.
    #[builder(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
