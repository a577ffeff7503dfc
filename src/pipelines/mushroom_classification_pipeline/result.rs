//! Result data model and its caller-facing JSON shapes.
//!
//! Each flavor has its own wire shape. Field names are part of the external
//! contract and must not change.

use crate::core::config::Flavor;
use crate::core::ClassifyError;
use serde::Serialize;

pub const NOT_A_MUSHROOM_CLASS: &str = "not_a_mushroom";
pub const NOT_A_MUSHROOM_DETAILS: &str =
    "The image does not appear to be a mushroom or is not clearly identifiable";

const SPOROCARP_ERROR_CLASS: &str = "unknown";
const EDIBILITY_ERROR_CLASS: &str = "error";
const SPOROCARP_USAGE: &str = "No image path provided";
const EDIBILITY_USAGE: &str = "Invalid usage. Please provide an image path.";

/// Outcome of one classification. Exactly one variant per invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassificationResult {
    NotAMushroom {
        confidence: f32,
        details: String,
    },
    Classified {
        class: String,
        confidence: f32,
        /// Advisory text; edibility flavor only.
        details: Option<String>,
    },
    Error {
        message: String,
        /// Whether the gate had already passed when the failure happened.
        is_mushroom: bool,
    },
}

impl ClassificationResult {
    pub fn not_a_mushroom(flavor: Flavor, confidence: f32) -> Self {
        let details = match flavor {
            Flavor::Sporocarp => NOT_A_MUSHROOM_DETAILS.to_string(),
            Flavor::Edibility => format!("{NOT_A_MUSHROOM_DETAILS}."),
        };
        ClassificationResult::NotAMushroom {
            confidence,
            details,
        }
    }

    pub fn from_error(err: &ClassifyError, is_mushroom: bool) -> Self {
        ClassificationResult::Error {
            message: err.to_string(),
            is_mushroom,
        }
    }

    /// Always in [0, 1]; `0.0` for errors.
    pub fn confidence(&self) -> f32 {
        match self {
            ClassificationResult::NotAMushroom { confidence, .. }
            | ClassificationResult::Classified { confidence, .. } => *confidence,
            ClassificationResult::Error { .. } => 0.0,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ClassificationResult::Error { .. })
    }

    /// The `class` field as it appears on the wire for the given flavor.
    pub fn class(&self, flavor: Flavor) -> &str {
        match self {
            ClassificationResult::NotAMushroom { .. } => NOT_A_MUSHROOM_CLASS,
            ClassificationResult::Classified { class, .. } => class,
            ClassificationResult::Error { .. } => error_class(flavor),
        }
    }
}

fn error_class(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::Sporocarp => SPOROCARP_ERROR_CLASS,
        Flavor::Edibility => EDIBILITY_ERROR_CLASS,
    }
}

/// `{"error"?, "class", "confidence", "details"?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SporocarpPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub class: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `{"is_mushroom"?, "classification"?, "class", "confidence", "details"}`
///
/// `is_mushroom` and `classification` are present on every result payload;
/// only the process-level usage and not-found payloads omit them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdibilityPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mushroom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    pub class: String,
    pub confidence: f32,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Sporocarp(SporocarpPayload),
    Edibility(EdibilityPayload),
}

impl Payload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn class(&self) -> &str {
        match self {
            Payload::Sporocarp(p) => &p.class,
            Payload::Edibility(p) => &p.class,
        }
    }
}

/// Turns results and process-level failures into the flavor's wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFormatter {
    flavor: Flavor,
}

impl ResultFormatter {
    pub fn new(flavor: Flavor) -> Self {
        Self { flavor }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn format(&self, result: &ClassificationResult) -> Payload {
        let class = result.class(self.flavor).to_string();
        let confidence = result.confidence();

        match self.flavor {
            Flavor::Sporocarp => {
                let (error, details) = match result {
                    ClassificationResult::NotAMushroom { details, .. } => {
                        (None, Some(details.clone()))
                    }
                    ClassificationResult::Classified { .. } => (None, None),
                    ClassificationResult::Error { message, .. } => (Some(message.clone()), None),
                };
                Payload::Sporocarp(SporocarpPayload {
                    error,
                    class,
                    confidence,
                    details,
                })
            }
            Flavor::Edibility => {
                let (is_mushroom, details) = match result {
                    ClassificationResult::NotAMushroom { details, .. } => (false, details.clone()),
                    ClassificationResult::Classified { details, .. } => (
                        true,
                        details
                            .clone()
                            .unwrap_or_else(|| crate::core::GENERIC_ADVISORY.to_string()),
                    ),
                    ClassificationResult::Error {
                        message,
                        is_mushroom,
                    } => (
                        *is_mushroom,
                        format!("An error occurred during classification: {message}"),
                    ),
                };
                Payload::Edibility(EdibilityPayload {
                    is_mushroom: Some(is_mushroom),
                    classification: Some(class.clone()),
                    class,
                    confidence,
                    details,
                })
            }
        }
    }

    /// Payload for failures reported at the process boundary, before or
    /// instead of a classification result.
    pub fn format_failure(&self, err: &ClassifyError) -> Payload {
        match self.flavor {
            Flavor::Sporocarp => {
                let message = match err {
                    ClassifyError::Usage(_) => SPOROCARP_USAGE.to_string(),
                    other => other.to_string(),
                };
                Payload::Sporocarp(SporocarpPayload {
                    error: Some(message),
                    class: SPOROCARP_ERROR_CLASS.to_string(),
                    confidence: 0.0,
                    details: None,
                })
            }
            Flavor::Edibility => {
                let details = match err {
                    ClassifyError::Usage(_) => EDIBILITY_USAGE.to_string(),
                    ClassifyError::NotFound(_) => err.to_string(),
                    other => format!("Unexpected error: {other}"),
                };
                Payload::Edibility(EdibilityPayload {
                    is_mushroom: None,
                    classification: None,
                    class: EDIBILITY_ERROR_CLASS.to_string(),
                    confidence: 0.0,
                    details,
                })
            }
        }
    }
}
