// src/models/question.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::detection::OptionLabel;

/// One entry of a test's answer key, as stored by the main platform API.
/// The position of the entry in the key is its question number (index + 1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceQuestion {
    #[serde(default, deserialize_with = "lenient_text")]
    pub question_text: String,

    /// Option texts in printed order (A, B, C, D).
    #[serde(default, deserialize_with = "lenient_options")]
    pub options: Vec<String>,

    /// Text of the correct option, not its label.
    #[serde(default, deserialize_with = "lenient_text")]
    pub correctanswer: String,
}

impl ReferenceQuestion {
    /// Label of the option whose trimmed text equals the trimmed correct answer.
    /// `None` when no option matches, or the match lies past the fourth option.
    pub fn correct_label(&self) -> Option<OptionLabel> {
        let target = self.correctanswer.trim();
        self.options
            .iter()
            .position(|option| option.trim() == target)
            .and_then(OptionLabel::from_index)
    }
}

/// Text of a JSON scalar: strings as-is, numbers and booleans printed, anything else empty.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(text_of(&Value::deserialize(deserializer)?))
}

fn lenient_options<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().map(text_of).collect(),
        _ => Vec::new(),
    })
}
