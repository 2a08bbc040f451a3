use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{Tainted, Verified};

/// Error returned when sanitization fails.
///
/// The message never echoes the rejected input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationError {
    kind: SanitizationErrorKind,
    message: String,
}

impl SanitizationError {
    /// Creates a new sanitization error.
    pub fn new(kind: SanitizationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SanitizationErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SanitizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sanitization failed ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for SanitizationError {}

/// Kind of sanitization error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationErrorKind {
    /// Input is empty or contains only whitespace.
    Empty,
    /// Input exceeds maximum allowed length.
    TooLong,
    /// Input contains control or non-printable characters.
    ContainsControlChars,
    /// Input is not a recognizable calendar date.
    MalformedDate,
}

impl fmt::Display for SanitizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty input"),
            Self::TooLong => write!(f, "input too long"),
            Self::ContainsControlChars => write!(f, "contains control characters"),
            Self::MalformedDate => write!(f, "malformed date"),
        }
    }
}

/// Converts a tainted request value into a verified one.
///
/// Implementations validate the input and only then wrap it in
/// [`Verified`]. `Out` defaults to the input type; parsers such as
/// [`DateSanitizer`] produce a different type.
pub trait Sanitizer<In, Out = In> {
    /// Sanitizes a tainted value, returning a verified value on success.
    ///
    /// # Errors
    ///
    /// Returns `SanitizationError` if the input fails validation.
    fn sanitize(&self, input: Tainted<In>) -> Result<Verified<Out>, SanitizationError>;
}

/// Normalizes a requested feed name.
///
/// - Rejects empty names and names with control characters
/// - Enforces a maximum length (default 128)
/// - Lower-cases the result, which is the canonical feed name
///
/// Whitespace is kept as sent, so `" client "` never matches `client`.
///
/// # Examples
///
/// ```
/// use feed_access::{FeedNameSanitizer, Sanitizer, Tainted};
///
/// let sanitizer = FeedNameSanitizer::default();
/// let verified = sanitizer.sanitize(Tainted::new("Client".to_string())).unwrap();
/// assert_eq!(verified.as_ref(), "client");
///
/// let padded = sanitizer.sanitize(Tainted::new(" Client ".to_string())).unwrap();
/// assert_eq!(padded.as_ref(), " client ");
///
/// assert!(sanitizer.sanitize(Tainted::new(String::new())).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FeedNameSanitizer {
    max_len: usize,
}

impl FeedNameSanitizer {
    /// Creates a sanitizer with the given maximum length.
    ///
    /// A `max_len` of zero is raised to one.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    fn is_control_char(c: char) -> bool {
        c.is_control() || c == '\u{007F}'
    }
}

impl Default for FeedNameSanitizer {
    fn default() -> Self {
        Self::new(128)
    }
}

impl Sanitizer<String> for FeedNameSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<String>, SanitizationError> {
        let raw = input.into_inner();

        if raw.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "feed name is empty",
            ));
        }

        if raw.chars().any(Self::is_control_char) {
            return Err(SanitizationError::new(
                SanitizationErrorKind::ContainsControlChars,
                "feed name contains control characters",
            ));
        }

        if raw.len() > self.max_len {
            return Err(SanitizationError::new(
                SanitizationErrorKind::TooLong,
                format!("feed name exceeds maximum length of {}", self.max_len),
            ));
        }

        Ok(Verified::new_unchecked(raw.to_lowercase()))
    }
}

/// Parses a request date, discarding any time-of-day component.
///
/// Accepted forms:
/// - `2024-01-05`, `2024/01/05`
/// - `01/05/2024` (month first)
/// - `2024-01-05T10:30:00`, `2024-01-05 10:30:00`
/// - RFC 3339 timestamps such as `2024-01-05T10:30:00Z`
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use feed_access::{DateSanitizer, Sanitizer, Tainted};
///
/// let date = DateSanitizer.sanitize(Tainted::new("2024-01-05T23:00:00Z".to_string())).unwrap();
/// assert_eq!(*date.as_ref(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DateSanitizer;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

impl DateSanitizer {
    fn parse(raw: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                DATE_TIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|dt| dt.date())
            })
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }
}

impl Sanitizer<String, NaiveDate> for DateSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Result<Verified<NaiveDate>, SanitizationError> {
        let raw = input.into_inner();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(SanitizationError::new(
                SanitizationErrorKind::Empty,
                "date is empty",
            ));
        }

        Self::parse(trimmed)
            .map(Verified::new_unchecked)
            .ok_or_else(|| {
                SanitizationError::new(
                    SanitizationErrorKind::MalformedDate,
                    "date is not a recognizable calendar date",
                )
            })
    }
}
