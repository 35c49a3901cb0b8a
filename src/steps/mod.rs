// ============================================================================
// Build-up steps — a document is a sequence of `#<label>#...` groups and a
// `step` text layer holding the label currently on show. Navigating moves
// the marker to the adjacent label and re-renders visibility and highlights.
// ============================================================================

pub mod adjacent;
pub mod controller;
pub mod labels;
pub mod members;
pub mod style;
pub mod visibility;

pub use adjacent::{Direction, adjacent};
pub use controller::{MARKER_NAME, advance, find_marker, read_marker, retreat, step};
pub use labels::{LabelMap, extract_labels, parse_label};
pub use members::find_member;
pub use visibility::{apply, predecessors};

use crate::host::HostError;

/// Errors raised while navigating steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// No top-level text layer named `step`.
    MissingMarker,
    /// The marker's text is not an integer.
    InvalidMarker(String),
    /// The document has no step groups to navigate.
    NoStepGroups,
    Host(HostError),
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepError::MissingMarker => {
                write!(f, "Text layer named '{}' not found in the image.", MARKER_NAME)
            }
            StepError::InvalidMarker(text) => write!(
                f,
                "The text layer '{}' must contain a valid integer (found {:?}).",
                MARKER_NAME, text
            ),
            StepError::NoStepGroups => {
                write!(f, "No step groups found (expected group layers named '#<number>#...').")
            }
            StepError::Host(e) => write!(f, "Host error: {}", e),
        }
    }
}

impl std::error::Error for StepError {}

impl From<HostError> for StepError {
    fn from(e: HostError) -> Self {
        StepError::Host(e)
    }
}
