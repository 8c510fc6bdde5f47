//! Field value objects - one slot to be filled per field.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::FieldId;

/// One slot in the form's fixed interview order.
///
/// `value` starts as `None` and is set exactly once when a valid answer is
/// accepted; the orchestrator never reverts a committed value to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    id: FieldId,
    name: String,
    description: String,
    configuration: FieldConfiguration,
    value: Option<String>,
}

impl Field {
    /// Creates an unfilled field.
    pub fn new(
        id: FieldId,
        name: impl Into<String>,
        description: impl Into<String>,
        configuration: FieldConfiguration,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            configuration,
            value: None,
        }
    }

    /// Returns the field's stable id.
    pub fn id(&self) -> &FieldId {
        &self.id
    }

    /// Returns the semantic label shown to the AI collaborators.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input-kind configuration.
    pub fn configuration(&self) -> &FieldConfiguration {
        &self.configuration
    }

    /// Returns the committed answer, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// True once a valid answer has been committed.
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn set_value(&mut self, value: String) {
        self.value = Some(value);
    }
}

/// Input kind for a field, with kind-specific constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "input_type", rename_all = "snake_case")]
pub enum FieldConfiguration {
    /// Free-form text input.
    Text,
    /// Choice selection rendered as tappable options.
    MultipleChoice {
        options: Vec<String>,
        #[serde(default)]
        allow_multiple: bool,
    },
    /// Calendar date input.
    Date,
    /// Numeric rating input (1..=max_rating).
    Rating { max_rating: u8 },
    /// File upload; the submitted text is the stored file reference.
    FileUpload,
}

impl FieldConfiguration {
    /// True for input kinds whose widget guarantees an unambiguous
    /// submission, so the orchestrator skips AI validation and commits
    /// the submitted text verbatim.
    ///
    /// New kinds default to "validate" unless listed here.
    pub fn skips_extraction(&self) -> bool {
        match self {
            FieldConfiguration::MultipleChoice { allow_multiple, .. } => !allow_multiple,
            FieldConfiguration::Rating { .. } => true,
            FieldConfiguration::Text
            | FieldConfiguration::Date
            | FieldConfiguration::FileUpload => false,
        }
    }

    /// Short label used in extractor/generator prompts.
    pub fn kind_label(&self) -> &'static str {
        match self {
            FieldConfiguration::Text => "text",
            FieldConfiguration::MultipleChoice { .. } => "multiple_choice",
            FieldConfiguration::Date => "date",
            FieldConfiguration::Rating { .. } => "rating",
            FieldConfiguration::FileUpload => "file_upload",
        }
    }
}
