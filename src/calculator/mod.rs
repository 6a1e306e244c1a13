//! Volume calculator state
//!
//! Holds the three raw inputs (length and width in metres, thickness in
//! centimetres), validates them and derives the volume in cubic metres.
//! Everything here is synchronous and free of I/O so the UI can call it on
//! every keystroke.

pub mod query;

pub use query::QueryParams;

pub const TITLE: &str = "간이 루베 계산기";
pub const MSG_IDLE: &str = "값을 입력하면 자동으로 계산됩니다";
pub const MSG_NEEDS_INPUT: &str = "올바른 값을 입력해주세요";
pub const MSG_FIELD_ERROR: &str = "숫자를 입력해 주세요";
pub const MSG_DISCLAIMER: &str = "※ 이 계산은 대략적인 값이며, 현장 상황에 따라 상이할 수 있습니다.";
pub const THICKNESS_HELPER: &str = "두께가 20cm면 20을 입력";

/// Validated form of one text input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Empty,
    Invalid,
    Valid(f64),
}

impl FieldValue {
    pub fn as_valid(self) -> Option<f64> {
        match self {
            FieldValue::Valid(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_invalid(self) -> bool {
        self == FieldValue::Invalid
    }
}

/// Classify raw input text. Blank is Empty, anything that is not a finite
/// number above zero is Invalid.
pub fn validate(raw: &str) -> FieldValue {
    let raw = raw.trim();
    if raw.is_empty() {
        return FieldValue::Empty;
    }

    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => FieldValue::Valid(n),
        _ => FieldValue::Invalid,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Length,
    Width,
    Thickness,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Length, Field::Width, Field::Thickness];

    fn index(self) -> usize {
        match self {
            Field::Length => 0,
            Field::Width => 1,
            Field::Thickness => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Field::Length => Field::Width,
            Field::Width => Field::Thickness,
            Field::Thickness => Field::Length,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Length => Field::Thickness,
            Field::Width => Field::Length,
            Field::Thickness => Field::Width,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Length => "가로 (m)",
            Field::Width => "세로 (m)",
            Field::Thickness => "두께 (높이) (cm)",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Field::Length => "예) 10",
            Field::Width => "예) 5",
            Field::Thickness => "예) 20",
        }
    }

    pub fn helper(self) -> Option<&'static str> {
        match self {
            Field::Thickness => Some(THICKNESS_HELPER),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub raw: String,
    pub value: FieldValue,
}

impl Default for FieldState {
    fn default() -> Self {
        Self {
            raw: String::new(),
            value: FieldValue::Empty,
        }
    }
}

/// What the result line currently shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultStatus {
    /// Nothing calculated yet (mount or reset)
    Idle,
    /// At least one field is empty or invalid
    NeedsInput,
    Volume(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculator {
    fields: [FieldState; 3],
    status: ResultStatus,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self {
            fields: Default::default(),
            status: ResultStatus::Idle,
        }
    }

    pub fn field(&self, field: Field) -> &FieldState {
        &self.fields[field.index()]
    }

    pub fn raw(&self, field: Field) -> &str {
        &self.field(field).raw
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    /// Rounded volume, present only while all three fields are valid
    pub fn result(&self) -> Option<f64> {
        match self.status {
            ResultStatus::Volume(v) => Some(v),
            _ => None,
        }
    }

    pub fn can_copy(&self) -> bool {
        self.result().is_some()
    }

    /// Text placed on the clipboard, always two decimals
    pub fn copy_text(&self) -> Option<String> {
        self.result().map(|v| format!("{:.2}", v))
    }

    /// Inline error under a field, if its value is invalid
    pub fn error_text(&self, field: Field) -> Option<&'static str> {
        self.field(field).value.is_invalid().then_some(MSG_FIELD_ERROR)
    }

    pub fn status_text(&self) -> String {
        match self.status {
            ResultStatus::Idle => MSG_IDLE.to_string(),
            ResultStatus::NeedsInput => MSG_NEEDS_INPUT.to_string(),
            ResultStatus::Volume(v) => format!("필요 루베: {:.2}", v),
        }
    }

    /// Replace a field's text and recompute
    pub fn set_raw(&mut self, field: Field, text: impl Into<String>) {
        self.fields[field.index()].raw = text.into();
        self.recompute();
    }

    pub fn push_char(&mut self, field: Field, c: char) {
        self.fields[field.index()].raw.push(c);
        self.recompute();
    }

    pub fn pop_char(&mut self, field: Field) {
        self.fields[field.index()].raw.pop();
        self.recompute();
    }

    /// Re-validate every field and derive the result
    pub fn recompute(&mut self) {
        for state in &mut self.fields {
            state.value = validate(&state.raw);
        }

        let [length, width, thickness] = &self.fields;
        self.status = match (
            length.value.as_valid(),
            width.value.as_valid(),
            thickness.value.as_valid(),
        ) {
            (Some(l), Some(w), Some(t)) => match volume(l, w, t) {
                v if v.is_finite() => ResultStatus::Volume(v),
                // Product overflowed f64
                _ => ResultStatus::NeedsInput,
            },
            _ => ResultStatus::NeedsInput,
        };

        tracing::debug!(status = ?self.status, "recomputed volume");
    }

    pub fn reset(&mut self) {
        self.fields = Default::default();
        self.status = ResultStatus::Idle;
    }
}

/// Volume in m³ from metres, metres and centimetres, rounded to 2 decimals
pub fn volume(length_m: f64, width_m: f64, thickness_cm: f64) -> f64 {
    round_to_cents(length_m * width_m * (thickness_cm / 100.0))
}

/// Round half away from zero at the second decimal.
///
/// The scaled value is first snapped to 1e-9 so that decimal halves which
/// land just under .5 in binary (0.335 * 100, 1.005 * 100) still round up.
/// Inputs carrying ten or more decimals just below a half (0.3349999999x)
/// are snapped up as well.
///
/// From 1e15 up an f64 has no cent resolution left and is returned as is.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }
    snap(value * 100.0).round() / 100.0
}

/// Drop binary noise below 1e-9. Above 1e6 there is no sub-nano noise to
/// drop and scaling could overflow, so the value passes through.
pub(crate) fn snap(value: f64) -> f64 {
    if !value.is_finite() || value.abs() > 1e6 {
        return value;
    }
    (value * 1e9).round() / 1e9
}
