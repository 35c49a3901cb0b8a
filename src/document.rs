use image::{Rgba, RgbaImage};

use crate::host::{Host, HostError, LayerId, LayerInfo, LayerKind};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Largest canvas side in pixels, for new and loaded documents alike.
pub const MAX_CANVAS_DIM: u32 = 16_384;

/// Payload of a layer node.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerContent {
    Pixels(RgbaImage),
    Text(String),
    /// Children, bottom of the stack first.
    Group(Vec<Layer>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    /// 0.0 ..= 1.0
    pub opacity: f32,
    pub content: LayerContent,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self.content {
            LayerContent::Pixels(_) => LayerKind::Plain,
            LayerContent::Text(_) => LayerKind::Text,
            LayerContent::Group(_) => LayerKind::Group,
        }
    }

    pub fn info(&self) -> LayerInfo {
        LayerInfo {
            id: self.id,
            kind: self.kind(),
            name: self.name.clone(),
        }
    }

    /// Child layers, bottom first. Empty for non-groups.
    pub fn children(&self) -> &[Layer] {
        match &self.content {
            LayerContent::Group(children) => children,
            _ => &[],
        }
    }

    fn find(&self, id: LayerId) -> Option<&Layer> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        if self.id == id {
            return Some(self);
        }
        match &mut self.content {
            LayerContent::Group(children) => children.iter_mut().find_map(|c| c.find_mut(id)),
            _ => None,
        }
    }
}

/// Single open layered document.
///
/// Top-level layers are stored bottom of the stack first (index 0 is the
/// background), while the [`Host`] enumeration reports them top first.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
    pub(crate) next_id: LayerId,
    /// Current foreground drawing colour.
    pub foreground: Rgba<u8>,
    /// Bumped on every flush; stands in for a display redraw.
    pub display_generation: u64,
}

impl Document {
    /// New empty document. Sizes are not checked; see [`Document::try_new`].
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
            next_id: 1,
            foreground: Rgba([0, 0, 0, 255]),
            display_generation: 0,
        }
    }

    /// New empty document, refusing a zero or oversized canvas.
    pub fn try_new(width: u32, height: u32) -> Result<Self, HostError> {
        if !canvas_size_ok(width, height) {
            return Err(HostError::InvalidCanvas { width, height });
        }
        Ok(Self::new(width, height))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find_map(|l| l.find(id))
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find_map(|l| l.find_mut(id))
    }

    fn get(&self, id: LayerId) -> Result<&Layer, HostError> {
        self.layer(id).ok_or(HostError::UnknownLayer(id))
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut Layer, HostError> {
        self.layer_mut(id).ok_or(HostError::UnknownLayer(id))
    }

    /// Insert a layer at the top of `parent` (or of the document) and return its id.
    fn insert(
        &mut self,
        parent: Option<LayerId>,
        name: &str,
        content: LayerContent,
    ) -> Result<LayerId, HostError> {
        let id = self.next_id;
        let layer = Layer {
            id,
            name: name.to_string(),
            visible: true,
            opacity: 1.0,
            content,
        };
        match parent {
            None => self.layers.push(layer),
            Some(pid) => match &mut self.get_mut(pid)?.content {
                LayerContent::Group(children) => children.push(layer),
                _ => return Err(HostError::NotAGroup(pid)),
            },
        }
        self.next_id += 1;
        Ok(id)
    }

    /// Add a transparent pixel layer the size of the canvas.
    pub fn add_plain(&mut self, parent: Option<LayerId>, name: &str) -> Result<LayerId, HostError> {
        let pixels = RgbaImage::from_pixel(self.width, self.height, TRANSPARENT);
        self.insert(parent, name, LayerContent::Pixels(pixels))
    }

    pub fn add_text(
        &mut self,
        parent: Option<LayerId>,
        name: &str,
        text: &str,
    ) -> Result<LayerId, HostError> {
        self.insert(parent, name, LayerContent::Text(text.to_string()))
    }

    pub fn add_group(&mut self, parent: Option<LayerId>, name: &str) -> Result<LayerId, HostError> {
        self.insert(parent, name, LayerContent::Group(Vec::new()))
    }

    /// Direct access to a plain layer's pixels.
    pub fn pixels_mut(&mut self, id: LayerId) -> Result<&mut RgbaImage, HostError> {
        match &mut self.get_mut(id)?.content {
            LayerContent::Pixels(img) => Ok(img),
            _ => Err(HostError::NotADrawable(id)),
        }
    }

    /// Flatten all visible layers onto a transparent canvas.
    ///
    /// Groups are composited in isolation and then blended with their own
    /// opacity. Text layers carry no pixels and contribute nothing.
    pub fn composite(&self) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(self.width, self.height, TRANSPARENT);
        composite_into(&mut out, &self.layers);
        out
    }
}

/// True when both sides are in `1..=MAX_CANVAS_DIM`.
pub fn canvas_size_ok(width: u32, height: u32) -> bool {
    (1..=MAX_CANVAS_DIM).contains(&width) && (1..=MAX_CANVAS_DIM).contains(&height)
}

fn composite_into(dst: &mut RgbaImage, layers: &[Layer]) {
    for layer in layers.iter().filter(|l| l.visible && l.opacity > 0.0) {
        match &layer.content {
            LayerContent::Pixels(src) => blend_image(dst, src, layer.opacity),
            LayerContent::Group(children) => {
                let mut scratch = RgbaImage::from_pixel(dst.width(), dst.height(), TRANSPARENT);
                composite_into(&mut scratch, children);
                blend_image(dst, &scratch, layer.opacity);
            }
            LayerContent::Text(_) => {}
        }
    }
}

fn blend_image(dst: &mut RgbaImage, src: &RgbaImage, opacity: f32) {
    let w = dst.width().min(src.width());
    let h = dst.height().min(src.height());
    for y in 0..h {
        for x in 0..w {
            let s = *src.get_pixel(x, y);
            let d = dst.get_pixel_mut(x, y);
            *d = blend_normal(*d, s, opacity);
        }
    }
}

/// Straight-alpha source-over.
fn blend_normal(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = (src[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

impl Host for Document {
    fn top_level_layers(&self) -> Vec<LayerInfo> {
        self.layers.iter().rev().map(Layer::info).collect()
    }

    fn children(&self, group: LayerId) -> Result<Vec<LayerInfo>, HostError> {
        let layer = self.get(group)?;
        match &layer.content {
            LayerContent::Group(children) => Ok(children.iter().rev().map(Layer::info).collect()),
            _ => Err(HostError::NotAGroup(group)),
        }
    }

    fn visible(&self, id: LayerId) -> Result<bool, HostError> {
        Ok(self.get(id)?.visible)
    }

    fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), HostError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    fn opacity(&self, id: LayerId) -> Result<f32, HostError> {
        Ok(self.get(id)?.opacity * 100.0)
    }

    fn set_opacity(&mut self, id: LayerId, percent: f32) -> Result<(), HostError> {
        self.get_mut(id)?.opacity = (percent / 100.0).clamp(0.0, 1.0);
        Ok(())
    }

    fn text(&self, id: LayerId) -> Result<String, HostError> {
        match &self.get(id)?.content {
            LayerContent::Text(s) => Ok(s.clone()),
            _ => Err(HostError::NotAText(id)),
        }
    }

    fn set_text(&mut self, id: LayerId, text: &str) -> Result<(), HostError> {
        match &mut self.get_mut(id)?.content {
            LayerContent::Text(s) => {
                *s = text.to_string();
                Ok(())
            }
            _ => Err(HostError::NotAText(id)),
        }
    }

    fn set_foreground(&mut self, color: Rgba<u8>) {
        self.foreground = color;
    }

    fn fill_foreground(&mut self, id: LayerId) -> Result<(), HostError> {
        let fill = RgbaImage::from_pixel(self.width, self.height, self.foreground);
        let layer = self.get_mut(id)?;
        match layer.content {
            LayerContent::Group(_) => Err(HostError::NotADrawable(id)),
            // A text layer loses its text, as when an editor rasterises it.
            _ => {
                layer.content = LayerContent::Pixels(fill);
                Ok(())
            }
        }
    }

    fn flush(&mut self) {
        self.display_generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_enumerates_top_first() {
        let mut doc = Document::new(4, 4);
        let bottom = doc.add_plain(None, "background").unwrap();
        let top = doc.add_text(None, "step", "1").unwrap();
        let ids: Vec<LayerId> = doc.top_level_layers().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![top, bottom]);
    }

    #[test]
    fn children_are_direct_only() {
        let mut doc = Document::new(4, 4);
        let g = doc.add_group(None, "#1#a").unwrap();
        let inner = doc.add_group(Some(g), "nested").unwrap();
        doc.add_plain(Some(inner), "hint").unwrap();
        let kids = doc.children(g).unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].id, inner);
        assert!(kids[0].is_group());
    }

    #[test]
    fn children_of_non_group_is_error() {
        let mut doc = Document::new(4, 4);
        let p = doc.add_plain(None, "x").unwrap();
        assert_eq!(doc.children(p), Err(HostError::NotAGroup(p)));
        assert_eq!(doc.children(99), Err(HostError::UnknownLayer(99)));
    }

    #[test]
    fn opacity_is_percent_at_the_boundary() {
        let mut doc = Document::new(2, 2);
        let p = doc.add_plain(None, "x").unwrap();
        doc.set_opacity(p, 50.0).unwrap();
        assert_eq!(doc.layer(p).unwrap().opacity, 0.5);
        assert_eq!(doc.opacity(p).unwrap(), 50.0);
        doc.set_opacity(p, 250.0).unwrap();
        assert_eq!(doc.opacity(p).unwrap(), 100.0);
    }

    #[test]
    fn fill_uses_foreground() {
        let mut doc = Document::new(3, 2);
        let p = doc.add_plain(None, "color").unwrap();
        doc.set_foreground(Rgba([255, 0, 0, 255]));
        doc.fill_foreground(p).unwrap();
        assert!(doc.pixels_mut(p).unwrap().pixels().all(|px| *px == Rgba([255, 0, 0, 255])));

        let g = doc.add_group(None, "g").unwrap();
        assert_eq!(doc.fill_foreground(g), Err(HostError::NotADrawable(g)));
    }

    #[test]
    fn filling_a_text_layer_rasterises_it() {
        let mut doc = Document::new(3, 2);
        let t = doc.add_text(None, "color caption", "red").unwrap();
        doc.set_foreground(Rgba([0, 255, 0, 255]));
        doc.fill_foreground(t).unwrap();

        assert_eq!(doc.layer(t).unwrap().kind(), LayerKind::Plain);
        assert_eq!(doc.text(t), Err(HostError::NotAText(t)));
        let img = doc.pixels_mut(t).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(img.pixels().all(|px| *px == Rgba([0, 255, 0, 255])));
    }

    #[test]
    fn try_new_bounds_the_canvas() {
        assert!(Document::try_new(MAX_CANVAS_DIM, 1).is_ok());
        assert_eq!(
            Document::try_new(MAX_CANVAS_DIM + 1, 1),
            Err(HostError::InvalidCanvas { width: MAX_CANVAS_DIM + 1, height: 1 })
        );
        assert!(Document::try_new(4, 0).is_err());
    }

    #[test]
    fn text_round_trip() {
        let mut doc = Document::new(2, 2);
        let t = doc.add_text(None, "step", "10").unwrap();
        doc.set_text(t, "30").unwrap();
        assert_eq!(doc.text(t).unwrap(), "30");
        let g = doc.add_group(None, "g").unwrap();
        assert_eq!(doc.text(g), Err(HostError::NotAText(g)));
    }

    #[test]
    fn composite_skips_hidden_layers_and_groups() {
        let mut doc = Document::new(1, 1);
        let base = doc.add_plain(None, "base").unwrap();
        doc.set_foreground(Rgba([0, 0, 255, 255]));
        doc.fill_foreground(base).unwrap();

        let g = doc.add_group(None, "g").unwrap();
        let red = doc.add_plain(Some(g), "red").unwrap();
        doc.set_foreground(Rgba([255, 0, 0, 255]));
        doc.fill_foreground(red).unwrap();

        assert_eq!(*doc.composite().get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        doc.set_visible(g, false).unwrap();
        assert_eq!(*doc.composite().get_pixel(0, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn flush_bumps_generation() {
        let mut doc = Document::new(1, 1);
        doc.flush();
        doc.flush();
        assert_eq!(doc.display_generation, 2);
    }
}
