//! Extraction result parsing.
//!
//! The extractor asks the model for a strict JSON judgment. Models still
//! wrap structured output in prose or code fences often enough that the
//! parser scans for the first balanced JSON object instead of trusting the
//! raw response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-turn judgment of whether the respondent's latest message answers
/// the current field. Transient: consumed by the orchestrator and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The extracted answer value; `None` means no answer was found.
    pub answer: Option<String>,
    /// Whether the answer satisfies the field. Only this gates acceptance.
    pub is_valid: bool,
    /// Model confidence in [0, 1]. Informational; never thresholded.
    pub confidence: f32,
    /// Model reasoning. Informational, useful in logs.
    pub reasoning: String,
}

impl ExtractionResult {
    /// "No valid answer found" expressed as data, not an error.
    pub fn invalid(reasoning: impl Into<String>) -> Self {
        Self {
            answer: None,
            is_valid: false,
            confidence: 0.0,
            reasoning: reasoning.into(),
        }
    }

    /// Synthesized acceptance for bypass field kinds: the submitted text
    /// is taken verbatim without a model call.
    pub fn accepted_verbatim(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            is_valid: true,
            confidence: 1.0,
            reasoning: "input kind accepted without extraction".to_string(),
        }
    }

    /// True iff the orchestrator should commit the answer.
    pub fn accepted(&self) -> bool {
        self.is_valid && self.answer.is_some()
    }
}

/// Errors from parsing the model's extraction response.
///
/// These are infra failures (malformed model output), distinct from the
/// "no answer found" case which is valid data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionParseError {
    #[error("No JSON object found in model response")]
    MissingJson,

    #[error("Malformed extraction JSON: {0}")]
    Malformed(String),

    #[error("Extraction JSON missing required field '{0}'")]
    MissingField(&'static str),
}

/// Parses the model's raw extraction response into an [`ExtractionResult`].
///
/// Accepts bare JSON, JSON inside markdown code fences, and JSON preceded
/// or followed by prose. Confidence is clamped to [0, 1]; a JSON `null`
/// answer or empty-string answer is treated as "no answer".
pub fn parse_extraction_response(raw: &str) -> Result<ExtractionResult, ExtractionParseError> {
    let json_str = extract_json_object(raw).ok_or(ExtractionParseError::MissingJson)?;

    let value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractionParseError::Malformed(e.to_string()))?;

    let is_valid = value
        .get("is_valid")
        .and_then(|v| v.as_bool())
        .ok_or(ExtractionParseError::MissingField("is_valid"))?;

    let answer = match value.get("answer") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        // Numeric or boolean answers come back untyped sometimes.
        Some(other) => Some(other.to_string()),
    };

    let confidence = value
        .get("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0) as f32;

    let reasoning = value
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok(ExtractionResult {
        answer,
        is_valid,
        confidence,
        reasoning,
    })
}

/// Finds the first JSON object in a response, preferring fenced blocks.
fn extract_json_object(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    if let Some(fenced) = extract_from_code_block(trimmed) {
        if let Some(obj) = extract_balanced_object(&fenced) {
            return Some(obj);
        }
    }

    extract_balanced_object(trimmed)
}

fn extract_from_code_block(s: &str) -> Option<String> {
    let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for pattern in patterns {
        if let Some(start) = s.find(pattern) {
            let json_start = start + pattern.len();
            if let Some(end) = s[json_start..].find("```") {
                return Some(s[json_start..json_start + end].trim().to_string());
            }
        }
    }
    None
}

/// Scans for the first `{` and returns the substring up to its balanced
/// closing brace, respecting string literals and escapes.
fn extract_balanced_object(s: &str) -> Option<String> {
    let start = s.find('{')?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let raw = r#"{"answer":"John","is_valid":true,"confidence":0.95,"reasoning":"clear name"}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.answer.as_deref(), Some("John"));
        assert!(result.is_valid);
        assert!((result.confidence - 0.95).abs() < f32::EPSILON);
        assert_eq!(result.reasoning, "clear name");
        assert!(result.accepted());
    }

    #[test]
    fn parses_json_inside_code_fence() {
        let raw = "Here is my judgment:\n```json\n{\"answer\": \"30\", \"is_valid\": true, \"confidence\": 0.8, \"reasoning\": \"numeric age\"}\n```";
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.answer.as_deref(), Some("30"));
        assert!(result.accepted());
    }

    #[test]
    fn parses_json_surrounded_by_prose() {
        let raw = "Sure! {\"answer\": null, \"is_valid\": false, \"confidence\": 0.2, \"reasoning\": \"vague\"} Hope that helps.";
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.answer, None);
        assert!(!result.is_valid);
        assert!(!result.accepted());
    }

    #[test]
    fn null_answer_is_data_not_error() {
        let raw = r#"{"answer": null, "is_valid": false, "confidence": 0.1, "reasoning": "no answer given"}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert!(!result.accepted());
        assert_eq!(result.answer, None);
    }

    #[test]
    fn empty_string_answer_treated_as_no_answer() {
        let raw = r#"{"answer": "  ", "is_valid": true, "confidence": 0.5, "reasoning": ""}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.answer, None);
        assert!(!result.accepted());
    }

    #[test]
    fn numeric_answer_is_stringified() {
        let raw = r#"{"answer": 42, "is_valid": true, "confidence": 1.0, "reasoning": "number"}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.answer.as_deref(), Some("42"));
    }

    #[test]
    fn confidence_is_clamped() {
        let raw = r#"{"answer": "x", "is_valid": true, "confidence": 3.5, "reasoning": ""}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.confidence, 1.0);

        let raw = r#"{"answer": "x", "is_valid": true, "confidence": -1.0, "reasoning": ""}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn missing_is_valid_is_an_error() {
        let raw = r#"{"answer": "x", "confidence": 0.5}"#;
        let result = parse_extraction_response(raw);
        assert_eq!(result, Err(ExtractionParseError::MissingField("is_valid")));
    }

    #[test]
    fn response_without_json_is_an_error() {
        let result = parse_extraction_response("I could not determine an answer.");
        assert_eq!(result, Err(ExtractionParseError::MissingJson));
    }

    #[test]
    fn braces_inside_strings_do_not_break_balancing() {
        let raw = r#"{"answer": "curly {brace} text", "is_valid": true, "confidence": 0.9, "reasoning": "ok"}"#;
        let result = parse_extraction_response(raw).unwrap();
        assert_eq!(result.answer.as_deref(), Some("curly {brace} text"));
    }

    #[test]
    fn accepted_verbatim_is_valid_with_full_confidence() {
        let result = ExtractionResult::accepted_verbatim("Blue");
        assert!(result.accepted());
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.answer.as_deref(), Some("Blue"));
    }

    #[test]
    fn invalid_constructor_carries_reasoning() {
        let result = ExtractionResult::invalid("off topic");
        assert!(!result.accepted());
        assert_eq!(result.reasoning, "off topic");
    }
}
