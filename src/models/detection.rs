// src/models/detection.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the four bubble columns printed for every question on the sheet.
/// Label at index `i` corresponds to `ReferenceQuestion::options[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("'{}' is not an option label", s))
    }
}

/// Serializes `Option<OptionLabel>` as the label letter, or `"N/A"` when absent.
pub mod label_or_na {
    use super::OptionLabel;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const NOT_AVAILABLE: &str = "N/A";

    pub fn serialize<S: Serializer>(label: &Option<OptionLabel>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(label.map_or(NOT_AVAILABLE, OptionLabel::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<OptionLabel>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == NOT_AVAILABLE {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

/// A bubble detection exactly as the OMR service reported it.
///
/// Every field is kept as raw JSON so that a single malformed record
/// can be skipped without rejecting the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(default)]
    pub question: Value,
    #[serde(default)]
    pub option: Value,
    #[serde(default)]
    pub marked: Value,
}

/// A detection that passed validation: a marked bubble for a known question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionRecord {
    pub question: usize,
    pub option: OptionLabel,
}

/// Why a raw detection was not used as a candidate answer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordIssue {
    /// `question` is missing, not an integer, or not positive.
    BadQuestion(Value),
    /// `option` is missing or an empty string.
    EmptyOption,
    /// `option` is present but not one of the sheet's labels.
    UnknownOption(Value),
    /// `marked` is anything other than 1.
    Unmarked,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIssue::BadQuestion(v) => write!(f, "invalid question number {}", v),
            RecordIssue::EmptyOption => write!(f, "empty option"),
            RecordIssue::UnknownOption(v) => write!(f, "unknown option {}", v),
            RecordIssue::Unmarked => write!(f, "bubble not marked"),
        }
    }
}

impl TryFrom<&RawDetection> for DetectionRecord {
    type Error = RecordIssue;

    fn try_from(raw: &RawDetection) -> Result<Self, Self::Error> {
        let question = positive_integer(&raw.question)
            .ok_or_else(|| RecordIssue::BadQuestion(raw.question.clone()))?;

        let option = match &raw.option {
            Value::Null => return Err(RecordIssue::EmptyOption),
            Value::String(s) if s.is_empty() => return Err(RecordIssue::EmptyOption),
            Value::String(s) => s
                .parse::<OptionLabel>()
                .map_err(|_| RecordIssue::UnknownOption(raw.option.clone()))?,
            other => return Err(RecordIssue::UnknownOption(other.clone())),
        };

        if raw.marked.as_f64() != Some(1.0) {
            return Err(RecordIssue::Unmarked);
        }

        Ok(DetectionRecord { question, option })
    }
}

/// Accepts `3` and `3.0` but not `"3"`, `0`, `-1` or `2.5`.
fn positive_integer(value: &Value) -> Option<usize> {
    let Value::Number(n) = value else {
        return None;
    };
    let whole = match n.as_u64() {
        Some(u) => u,
        None => {
            let f = n.as_f64()?;
            if f.fract() != 0.0 || f < 1.0 || f > u32::MAX as f64 {
                return None;
            }
            f as u64
        }
    };
    if whole == 0 {
        return None;
    }
    usize::try_from(whole).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(question: Value, option: Value, marked: Value) -> RawDetection {
        RawDetection { question, option, marked }
    }

    #[test]
    fn label_parsing_ignores_case_and_whitespace() {
        assert_eq!(" b ".parse::<OptionLabel>(), Ok(OptionLabel::B));
        assert_eq!("D".parse::<OptionLabel>(), Ok(OptionLabel::D));
        assert!("E".parse::<OptionLabel>().is_err());
        assert!("AB".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn labels_map_positionally() {
        assert_eq!(OptionLabel::from_index(2), Some(OptionLabel::C));
        assert_eq!(OptionLabel::from_index(4), None);
        assert_eq!(OptionLabel::D.index(), 3);
    }

    #[test]
    fn valid_record_is_accepted() {
        let record = DetectionRecord::try_from(&raw(json!(7), json!("C"), json!(1))).unwrap();
        assert_eq!(record, DetectionRecord { question: 7, option: OptionLabel::C });

        let float_question = DetectionRecord::try_from(&raw(json!(2.0), json!("a"), json!(1.0))).unwrap();
        assert_eq!(float_question.question, 2);
    }

    #[test]
    fn malformed_records_report_their_issue() {
        assert!(matches!(
            DetectionRecord::try_from(&raw(json!("3"), json!("A"), json!(1))),
            Err(RecordIssue::BadQuestion(_))
        ));
        assert!(matches!(
            DetectionRecord::try_from(&raw(json!(0), json!("A"), json!(1))),
            Err(RecordIssue::BadQuestion(_))
        ));
        assert!(matches!(
            DetectionRecord::try_from(&raw(json!(1.5), json!("A"), json!(1))),
            Err(RecordIssue::BadQuestion(_))
        ));
        assert_eq!(
            DetectionRecord::try_from(&raw(json!(1), json!(""), json!(1))),
            Err(RecordIssue::EmptyOption)
        );
        assert_eq!(
            DetectionRecord::try_from(&raw(json!(1), Value::Null, json!(1))),
            Err(RecordIssue::EmptyOption)
        );
        assert!(matches!(
            DetectionRecord::try_from(&raw(json!(1), json!("E"), json!(1))),
            Err(RecordIssue::UnknownOption(_))
        ));
        assert_eq!(
            DetectionRecord::try_from(&raw(json!(1), json!("A"), json!(0))),
            Err(RecordIssue::Unmarked)
        );
        assert_eq!(
            DetectionRecord::try_from(&raw(json!(1), json!("A"), json!(true))),
            Err(RecordIssue::Unmarked)
        );
    }

    #[test]
    fn missing_label_serializes_as_not_available() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "label_or_na")]
            label: Option<OptionLabel>,
        }

        let none = serde_json::to_value(Wrapper { label: None }).unwrap();
        assert_eq!(none, json!({ "label": "N/A" }));

        let back: Wrapper = serde_json::from_value(json!({ "label": "B" })).unwrap();
        assert_eq!(back.label, Some(OptionLabel::B));
    }
}
