use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::document::{Document, Layer, LayerContent, MAX_CANVAS_DIM, canvas_size_ok};
use crate::host::LayerId;

// ============================================================================
// BSD DOCUMENT FILE FORMAT
// ============================================================================

/// Magic header for the layered document format (v1)
const BSD_MAGIC_V1: &str = "BSD1";

/// Maximum number of layers (at any depth) in a document.
const MAX_LAYERS: usize = 1024;
/// Maximum group nesting; top-level layers are at depth 0.
const MAX_DEPTH: usize = 32;

/// V1 serializable document
#[derive(Serialize, Deserialize)]
struct DocumentFileV1 {
    magic: String,
    width: u32,
    height: u32,
    next_id: LayerId,
    /// Every layer, each group before its children; siblings bottom first.
    layers: Vec<LayerDataV1>,
}

#[derive(Serialize, Deserialize)]
struct LayerDataV1 {
    id: LayerId,
    /// Enclosing group, `None` at the top level.
    parent: Option<LayerId>,
    name: String,
    visible: bool,
    opacity: f32,
    payload: PayloadV1,
}

#[derive(Serialize, Deserialize)]
enum PayloadV1 {
    /// Raw RGBA, width × height × 4 bytes
    Pixels(Vec<u8>),
    Text(String),
    Group,
}

/// Error type for document file operations
#[derive(Debug)]
pub enum DocError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for DocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocError::Io(e) => write!(f, "I/O error: {}", e),
            DocError::Serialize(e) => write!(f, "Serialization error: {}", e),
            DocError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for DocError {}

impl From<std::io::Error> for DocError {
    fn from(e: std::io::Error) -> Self {
        DocError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for DocError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        DocError::Serialize(e.to_string())
    }
}

impl From<image::ImageError> for DocError {
    fn from(e: image::ImageError) -> Self {
        DocError::Serialize(e.to_string())
    }
}

/// Pre-order walk of the layer tree without recursion.
fn flatten(layers: &[Layer]) -> Vec<LayerDataV1> {
    let mut out = Vec::new();
    let mut stack: Vec<(&Layer, Option<LayerId>)> = layers.iter().rev().map(|l| (l, None)).collect();
    while let Some((layer, parent)) = stack.pop() {
        let payload = match &layer.content {
            LayerContent::Pixels(img) => PayloadV1::Pixels(img.as_raw().clone()),
            LayerContent::Text(s) => PayloadV1::Text(s.clone()),
            LayerContent::Group(children) => {
                stack.extend(children.iter().rev().map(|c| (c, Some(layer.id))));
                PayloadV1::Group
            }
        };
        out.push(LayerDataV1 {
            id: layer.id,
            parent,
            name: layer.name.clone(),
            visible: layer.visible,
            opacity: layer.opacity,
            payload,
        });
    }
    out
}

/// Save a document as a .bsd file.
///
/// The bytes go to a temporary file in the target directory, which then
/// replaces `path`, so an existing document is never left half written.
pub fn save_document(doc: &Document, path: &Path) -> Result<(), DocError> {
    let file = DocumentFileV1 {
        magic: BSD_MAGIC_V1.to_string(),
        width: doc.width,
        height: doc.height,
        next_id: doc.next_id,
        layers: flatten(&doc.layers),
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        bincode::serialize_into(&mut writer, &file)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DocError::Io(e.error))?;
    Ok(())
}

/// Load a .bsd file
pub fn load_document(path: &Path) -> Result<Document, DocError> {
    let raw = std::fs::read(path)?;
    if raw.len() < 12 {
        return Err(DocError::InvalidFormat("File too small".into()));
    }

    // bincode encodes a String as: 8-byte length prefix + UTF-8 data.
    // The magic string is 4 chars, so bytes 8..12 hold it.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    match magic {
        BSD_MAGIC_V1 => load_document_v1(&raw),
        _ => Err(DocError::InvalidFormat(format!("Unknown magic '{}'", magic))),
    }
}

fn load_document_v1(raw: &[u8]) -> Result<Document, DocError> {
    let file: DocumentFileV1 = bincode::deserialize(raw)?;

    if file.width == 0 || file.height == 0 {
        return Err(DocError::InvalidFormat("Canvas dimensions cannot be zero".into()));
    }
    if !canvas_size_ok(file.width, file.height) {
        return Err(DocError::InvalidFormat(format!(
            "Canvas size {}x{} exceeds maximum allowed {}x{}",
            file.width, file.height, MAX_CANVAS_DIM, MAX_CANVAS_DIM
        )));
    }
    if file.layers.len() > MAX_LAYERS {
        return Err(DocError::InvalidFormat(format!(
            "Document contains more than {} layers",
            MAX_LAYERS
        )));
    }

    let mut loader = Loader {
        width: file.width,
        height: file.height,
        next_id: file.next_id,
        seen: HashSet::new(),
        group_depth: HashMap::new(),
        nodes: Vec::with_capacity(file.layers.len()),
        children: HashMap::new(),
        roots: Vec::new(),
    };
    for ld in file.layers {
        loader.push(ld)?;
    }

    let mut doc = Document::new(file.width, file.height);
    doc.layers = loader.finish();
    doc.next_id = file.next_id;
    Ok(doc)
}

/// Validates the flat layer table and rebuilds the tree from it.
struct Loader {
    width: u32,
    height: u32,
    next_id: LayerId,
    seen: HashSet<LayerId>,
    /// Depth of every group read so far; only these may be parents.
    group_depth: HashMap<LayerId, usize>,
    /// Layers in file order, taken out again while assembling.
    nodes: Vec<Option<Layer>>,
    /// Group id → indices into `nodes`, bottom first.
    children: HashMap<LayerId, Vec<usize>>,
    roots: Vec<usize>,
}

impl Loader {
    fn push(&mut self, ld: LayerDataV1) -> Result<(), DocError> {
        if ld.id >= self.next_id || !self.seen.insert(ld.id) {
            return Err(DocError::InvalidFormat(format!(
                "Layer '{}' has invalid or duplicate id {}",
                ld.name, ld.id
            )));
        }

        let depth = match ld.parent {
            None => 0,
            Some(pid) => {
                let parent_depth = *self.group_depth.get(&pid).ok_or_else(|| {
                    DocError::InvalidFormat(format!(
                        "Layer '{}' refers to {} which is not an earlier group",
                        ld.name, pid
                    ))
                })?;
                parent_depth + 1
            }
        };
        if depth > MAX_DEPTH {
            return Err(DocError::InvalidFormat(format!(
                "Groups are nested more than {} levels deep",
                MAX_DEPTH
            )));
        }

        let content = match ld.payload {
            PayloadV1::Pixels(bytes) => {
                let expected = self.width as usize * self.height as usize * 4;
                if bytes.len() != expected {
                    return Err(DocError::InvalidFormat(format!(
                        "Layer '{}' has {} bytes, expected {}",
                        ld.name,
                        bytes.len(),
                        expected
                    )));
                }
                let img = RgbaImage::from_raw(self.width, self.height, bytes).ok_or_else(|| {
                    DocError::InvalidFormat(format!("Failed to reconstruct layer '{}'", ld.name))
                })?;
                LayerContent::Pixels(img)
            }
            PayloadV1::Text(s) => LayerContent::Text(s),
            PayloadV1::Group => {
                self.group_depth.insert(ld.id, depth);
                LayerContent::Group(Vec::new())
            }
        };

        let index = self.nodes.len();
        match ld.parent {
            None => self.roots.push(index),
            Some(pid) => self.children.entry(pid).or_default().push(index),
        }
        self.nodes.push(Some(Layer {
            id: ld.id,
            name: ld.name,
            visible: ld.visible,
            opacity: ld.opacity.clamp(0.0, 1.0),
            content,
        }));
        Ok(())
    }

    fn finish(mut self) -> Vec<Layer> {
        let roots = std::mem::take(&mut self.roots);
        roots.into_iter().filter_map(|i| self.assemble(i)).collect()
    }

    /// Recursion is bounded by `MAX_DEPTH`, checked in `push`.
    fn assemble(&mut self, index: usize) -> Option<Layer> {
        let mut layer = self.nodes.get_mut(index)?.take()?;
        if let LayerContent::Group(slot) = &mut layer.content {
            let kids = self.children.remove(&layer.id).unwrap_or_default();
            *slot = kids.into_iter().filter_map(|i| self.assemble(i)).collect();
        }
        Some(layer)
    }
}

/// Flatten the document and write it as PNG.
pub fn save_preview(doc: &Document, path: &Path) -> Result<(), DocError> {
    doc.composite()
        .save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
