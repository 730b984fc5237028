//! Field types, field definitions and resolved fields.
//!
//! A [`FieldType`] knows how to correct, validate and pad a raw value. A
//! [`FieldDefinition`] binds a named slot in a record layout to a type and
//! width. A [`Field`] is a value resolved against a definition; its rendered
//! value always has exactly the definition's width.

use crate::error::FieldError;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Sentinel resolving to the current date (or time).
pub const AUTO_NOW: &str = "NOW";

/// Sentinel resolving to the next calendar day. Date fields only.
pub const AUTO_TOMORROW: &str = "TOMORROW";

const DATE_FORMAT: &str = "%y%m%d";
const TIME_FORMAT: &str = "%H%M";
const ISO_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Side of a fixed-width slot that a value is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

impl Alignment {
    /// Pads `input` with `padding` up to `width` characters. Longer input is
    /// returned unchanged.
    pub fn align(self, input: &str, width: usize, padding: char) -> String {
        let len = input.chars().count();
        if len >= width {
            return input.to_string();
        }
        let fill: String = std::iter::repeat(padding).take(width - len).collect();
        match self {
            Alignment::Left => format!("{}{}", input, fill),
            Alignment::Right => format!("{}{}", fill, input),
        }
    }

    /// Cuts `input` down to `width` characters, dropping the trailing side of
    /// left-aligned values and the leading side of right-aligned ones.
    pub fn truncate(self, input: &str, width: usize) -> String {
        let len = input.chars().count();
        if len <= width {
            return input.to_string();
        }
        match self {
            Alignment::Left => input.chars().take(width).collect(),
            Alignment::Right => input.chars().skip(len - width).collect(),
        }
    }
}

/// Behavior set shared by every field of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Digits only, zero padded, right aligned.
    Integer,
    /// Restricted printable ASCII set, space padded, left aligned.
    AlphaNumeric,
    /// Optional leading blank plus nine routing digits, blank padded.
    BlankPaddedRoutingNumber,
    /// `YYMMDD`.
    Date,
    /// `HHMM`.
    Time,
}

impl FieldType {
    /// Filler character for short values.
    pub fn padding(self) -> char {
        match self {
            FieldType::Integer => '0',
            FieldType::AlphaNumeric
            | FieldType::BlankPaddedRoutingNumber
            | FieldType::Date
            | FieldType::Time => ' ',
        }
    }

    pub fn alignment(self) -> Alignment {
        match self {
            FieldType::Integer | FieldType::BlankPaddedRoutingNumber => Alignment::Right,
            FieldType::AlphaNumeric | FieldType::Date | FieldType::Time => Alignment::Left,
        }
    }

    /// Whether values are corrected before validation when the field
    /// definition does not say otherwise.
    pub fn auto_corrects(self) -> bool {
        !matches!(self, FieldType::Integer)
    }

    /// Human readable description of accepted values, used in mismatch errors.
    pub fn expected(self) -> &'static str {
        match self {
            FieldType::Integer => r"^\d+$",
            FieldType::AlphaNumeric => r"^[A-Za-z0-9./()&' -]+$",
            FieldType::BlankPaddedRoutingNumber => r"^ ?\d{9}$",
            FieldType::Date => r"^\d{6}$ (valid YYMMDD date)",
            FieldType::Time => r"^\d{4}$ (valid HHMM time)",
        }
    }

    /// Pads short values and truncates long ones to exactly `width` characters.
    pub fn apply_fixed_length(self, value: &str, width: usize) -> String {
        let alignment = self.alignment();
        let aligned = alignment.align(value, width, self.padding());
        alignment.truncate(&aligned, width)
    }

    /// Rewrites a raw value into a form that should pass validation.
    ///
    /// `override_correction` replaces the type default when set.
    pub fn correct_input(self, value: &str, override_correction: Option<bool>) -> String {
        if !override_correction.unwrap_or_else(|| self.auto_corrects()) {
            return value.to_string();
        }
        match self {
            FieldType::Integer => value.to_string(),
            FieldType::AlphaNumeric => correct_alphanumeric(value),
            FieldType::BlankPaddedRoutingNumber => correct_routing_number(value),
            FieldType::Date => correct_date(value),
            FieldType::Time => correct_time(value),
        }
    }

    /// Checks a corrected value. Empty values are accepted by every type so
    /// that optional fields render as pure padding.
    pub fn validate(self, value: &str) -> Result<(), FieldError> {
        if value.is_empty() {
            return Ok(());
        }
        let valid = match self {
            FieldType::Integer => value.chars().all(|c| c.is_ascii_digit()),
            FieldType::AlphaNumeric => value.chars().all(is_alphanumeric_char),
            FieldType::BlankPaddedRoutingNumber => is_blank_padded_routing(value),
            FieldType::Date => is_blank(value) || parse_yymmdd(value).is_some(),
            FieldType::Time => is_blank(value) || parse_hhmm(value).is_some(),
        };
        if valid {
            Ok(())
        } else {
            Err(FieldError::ValueMismatch {
                value: value.to_string(),
                expected: self.expected().to_string(),
            })
        }
    }

    pub fn is_valid(self, value: &str) -> bool {
        self.validate(value).is_ok()
    }
}

// Only the ASCII space counts as whitespace: line breaks would split the
// record and multi-byte spaces would widen the line on the wire.
fn is_alphanumeric_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || "./()&'-".contains(c)
}

fn is_blank(value: &str) -> bool {
    value.chars().all(|c| c == ' ')
}

fn correct_alphanumeric(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            c if is_alphanumeric_char(c) => Some(c),
            c if c.is_whitespace() => Some(' '),
            _ => None,
        })
        .collect()
}

fn is_blank_padded_routing(value: &str) -> bool {
    let digits = value.strip_prefix(' ').unwrap_or(value);
    digits.len() == 9 && digits.chars().all(|c| c.is_ascii_digit())
}

fn correct_routing_number(value: &str) -> String {
    if value.is_empty() || is_blank_padded_routing(value) {
        return value.to_string();
    }
    let digits = value.trim_start();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        return Alignment::Right.align(digits, 9, '0');
    }
    value.to_string()
}

fn parse_yymmdd(value: &str) -> Option<NaiveDate> {
    if value.len() != 6 || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = value[..2].parse().ok()?;
    let month: u32 = value[2..4].parse().ok()?;
    let day: u32 = value[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    if value.len() != 4 || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = value[..2].parse().ok()?;
    let minute: u32 = value[2..].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    ISO_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            // Offset-bearing input keeps its own wall-clock reading.
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|datetime| datetime.naive_local())
        })
}

fn correct_date(value: &str) -> String {
    if FieldType::Date.is_valid(value) {
        return value.to_string();
    }
    let today = Local::now().date_naive();
    if value.eq_ignore_ascii_case(AUTO_NOW) {
        return today.format(DATE_FORMAT).to_string();
    }
    if value.eq_ignore_ascii_case(AUTO_TOMORROW) {
        return (today + Duration::days(1)).format(DATE_FORMAT).to_string();
    }
    if let Some(datetime) = parse_iso_datetime(value) {
        return datetime.format(DATE_FORMAT).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format(DATE_FORMAT).to_string();
    }
    value.to_string()
}

// TOMORROW is deliberately not a time sentinel; it stays uncorrected and
// fails validation.
fn correct_time(value: &str) -> String {
    if FieldType::Time.is_valid(value) {
        return value.to_string();
    }
    if value.eq_ignore_ascii_case(AUTO_NOW) {
        return Local::now().format(TIME_FORMAT).to_string();
    }
    if let Some(datetime) = parse_iso_datetime(value) {
        return datetime.format(TIME_FORMAT).to_string();
    }
    value.to_string()
}

/// Immutable description of one slot in a record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Key used to supply and look up the value, e.g. `company_name`.
    pub name: &'static str,
    /// Display label from the published layout.
    pub label: &'static str,
    pub field_type: FieldType,
    pub width: usize,
    pub required: bool,
    pub default: Option<&'static str>,
    /// Per-field override of the type's auto-correction setting.
    pub auto_correct: Option<bool>,
}

impl FieldDefinition {
    /// A required field with no default.
    pub const fn new(
        name: &'static str,
        label: &'static str,
        field_type: FieldType,
        width: usize,
    ) -> Self {
        assert!(width > 0, "field width must be positive");
        FieldDefinition {
            name,
            label,
            field_type,
            width,
            required: true,
            default: None,
            auto_correct: None,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn with_auto_correct(mut self, auto_correct: bool) -> Self {
        self.auto_correct = Some(auto_correct);
        self
    }

    /// Required with no default: a caller must always supply it.
    pub fn needs_value(&self) -> bool {
        self.required && self.default.is_none()
    }

    pub fn correct_input(&self, value: &str) -> String {
        self.field_type.correct_input(value, self.auto_correct)
    }

    pub fn fixed_width_value(&self, value: &str) -> String {
        self.field_type.apply_fixed_length(value, self.width)
    }
}

/// A value resolved against a [`FieldDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    definition: FieldDefinition,
    value: String,
}

impl Field {
    /// Resolves `value` (or the definition's default) through correction,
    /// validation and fixed-width rendering.
    pub fn new(definition: FieldDefinition, value: Option<&str>) -> Result<Self, FieldError> {
        let raw = match (value, definition.default) {
            (Some(v), _) => v,
            (None, Some(default)) => default,
            (None, None) if definition.required => {
                return Err(FieldError::EmptyRequired {
                    field: definition.name,
                })
            }
            (None, None) => "",
        };

        let corrected = definition.correct_input(raw);
        definition.field_type.validate(&corrected)?;

        Ok(Field {
            value: definition.fixed_width_value(&corrected),
            definition,
        })
    }

    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    /// Rendered value, exactly `definition().width` characters.
    pub fn value(&self) -> &str {
        &self.value
    }
}
