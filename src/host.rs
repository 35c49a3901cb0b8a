// ============================================================================
// Host interface — the narrow slice of a layered-image editor that step
// navigation needs: read the layer tree, toggle visibility and opacity,
// read/write text layers, fill a drawable with the foreground colour, flush.
// ============================================================================

use image::Rgba;

/// Numeric layer identifier. Unique within a document and never reused.
pub type LayerId = u32;

/// What sort of node a layer is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Pixel layer (a drawable).
    Plain,
    /// Text layer; also a drawable, but its content is a string.
    Text,
    /// Container of child layers.
    Group,
}

impl LayerKind {
    pub fn label(self) -> &'static str {
        match self {
            LayerKind::Plain => "layer",
            LayerKind::Text => "text",
            LayerKind::Group => "group",
        }
    }
}

/// Snapshot of a node as reported by the host while enumerating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerInfo {
    pub id: LayerId,
    pub kind: LayerKind,
    pub name: String,
}

impl LayerInfo {
    pub fn is_group(&self) -> bool {
        self.kind == LayerKind::Group
    }

    pub fn is_text(&self) -> bool {
        self.kind == LayerKind::Text
    }
}

/// Error type for host primitive calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    UnknownLayer(LayerId),
    NotAGroup(LayerId),
    NotAText(LayerId),
    NotADrawable(LayerId),
    InvalidCanvas { width: u32, height: u32 },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::UnknownLayer(id) => write!(f, "layer {} does not exist", id),
            HostError::NotAGroup(id) => write!(f, "layer {} is not a group", id),
            HostError::NotAText(id) => write!(f, "layer {} is not a text layer", id),
            HostError::NotADrawable(id) => write!(f, "layer {} cannot be filled", id),
            HostError::InvalidCanvas { width, height } => write!(
                f,
                "canvas size {}x{} is outside 1x1 to {}x{}",
                width,
                height,
                crate::document::MAX_CANVAS_DIM,
                crate::document::MAX_CANVAS_DIM
            ),
        }
    }
}

impl std::error::Error for HostError {}

/// Primitives consumed from the editor hosting a document.
///
/// Opacity is on the 0–100 percent scale. Enumeration order is whatever the
/// host reports (top of the stack first for [`crate::document::Document`]).
pub trait Host {
    /// Top-level nodes of the document, not descending into groups.
    fn top_level_layers(&self) -> Vec<LayerInfo>;

    /// Direct children of a group.
    fn children(&self, group: LayerId) -> Result<Vec<LayerInfo>, HostError>;

    fn visible(&self, id: LayerId) -> Result<bool, HostError>;
    fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), HostError>;

    fn opacity(&self, id: LayerId) -> Result<f32, HostError>;
    fn set_opacity(&mut self, id: LayerId, percent: f32) -> Result<(), HostError>;

    fn text(&self, id: LayerId) -> Result<String, HostError>;
    fn set_text(&mut self, id: LayerId, text: &str) -> Result<(), HostError>;

    /// Set the global foreground drawing colour.
    fn set_foreground(&mut self, color: Rgba<u8>);

    /// Flood-fill a drawable with the current foreground colour.
    ///
    /// Text layers are drawables too; filling one rasterises it.
    fn fill_foreground(&mut self, id: LayerId) -> Result<(), HostError>;

    /// Redraw displays after a batch of mutations.
    fn flush(&mut self);
}
