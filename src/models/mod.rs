use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GenerationError;

/// Target word counts, one row per length category.
pub const LENGTH_TABLE: [(LengthCategory, u32); 3] = [
    (LengthCategory::Short, LengthCategory::Short.word_count()),
    (LengthCategory::Medium, LengthCategory::Medium.word_count()),
    (LengthCategory::Long, LengthCategory::Long.word_count()),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthCategory {
    Short,
    Medium,
    Long,
}

impl LengthCategory {
    pub const ALL: [LengthCategory; 3] = [Self::Short, Self::Medium, Self::Long];

    pub const fn word_count(self) -> u32 {
        match self {
            Self::Short => 300,
            Self::Medium => 600,
            Self::Long => 1200,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    /// Label shown in the length selector.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Short => "Short Essay",
            Self::Medium => "Medium Essay",
            Self::Long => "Long Essay",
        }
    }
}

impl fmt::Display for LengthCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LengthCategory {
    type Err = GenerationError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == label)
            .ok_or_else(|| GenerationError::UnknownLengthCategory(label.to_string()))
    }
}

/// A complete, dispatchable request. Built fresh for every submission.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub length: LengthCategory,
    pub credential: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum GenerationResult {
    Pending,
    Success(String),
    Failure(String),
}

/// What the UI is allowed to see of the controller. The credential is
/// reduced to a presence flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub topic: String,
    pub length: Option<LengthCategory>,
    pub has_credential: bool,
    pub can_submit: bool,
    pub result: Option<GenerationResult>,
}

/// Fields posted by the form page, either as JSON or urlencoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub length: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f64,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}
