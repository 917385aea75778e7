//! Read-only snapshot of a presentation as returned by `presentations.get`.
//!
//! Only the parts the operations read are modelled; everything else in the
//! API response is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// 1 point = 12700 EMU.
pub const EMU_PER_PT: f64 = 12_700.0;

/// Page size used when the snapshot omits one (16:9, 10in x 5.625in).
pub const DEFAULT_PAGE_SIZE_PT: (f64, f64) = (720.0, 405.0);

/// A presentation snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub presentation_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub revision_id: Option<String>,
    #[serde(default)]
    pub page_size: Option<Size>,
    #[serde(default)]
    pub slides: Vec<Page>,
}

/// A slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub object_id: String,
    #[serde(default)]
    pub page_elements: Vec<PageElement>,
}

/// An element placed on a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub object_id: String,
    #[serde(default)]
    pub size: Option<Size>,
    #[serde(default)]
    pub transform: Option<AffineTransform>,
    #[serde(default)]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub image: Option<serde_json::Value>,
    #[serde(default)]
    pub video: Option<serde_json::Value>,
    #[serde(default)]
    pub table: Option<serde_json::Value>,
    #[serde(default)]
    pub line: Option<serde_json::Value>,
    #[serde(default)]
    pub element_group: Option<ElementGroup>,
}

/// Children of a grouped element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementGroup {
    #[serde(default)]
    pub children: Vec<PageElement>,
}

/// Width and height of an element or page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Size {
    #[serde(default)]
    pub width: Dimension,
    #[serde(default)]
    pub height: Dimension,
}

/// A single measurement. The API omits `magnitude` when it is zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Dimension {
    #[serde(default)]
    pub magnitude: Option<f64>,
    #[serde(default)]
    pub unit: Option<Unit>,
}

/// Measurement units used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    Emu,
    Pt,
    #[serde(other)]
    Unspecified,
}

impl Dimension {
    /// Value converted to points.
    pub fn to_pt(&self) -> f64 {
        let magnitude = self.magnitude.unwrap_or(0.0);
        match self.unit {
            Some(Unit::Pt) => magnitude,
            _ => magnitude / EMU_PER_PT,
        }
    }
}

impl Size {
    /// `(width, height)` in points.
    pub fn to_pt(&self) -> (f64, f64) {
        (self.width.to_pt(), self.height.to_pt())
    }
}

/// Affine transform of a page element. Missing scale factors default to 1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    #[serde(default)]
    pub scale_x: Option<f64>,
    #[serde(default)]
    pub scale_y: Option<f64>,
    #[serde(default)]
    pub shear_x: Option<f64>,
    #[serde(default)]
    pub shear_y: Option<f64>,
    #[serde(default)]
    pub translate_x: Option<f64>,
    #[serde(default)]
    pub translate_y: Option<f64>,
    #[serde(default)]
    pub unit: Option<Unit>,
}

impl AffineTransform {
    /// Effective horizontal and vertical scale, including any rotation or
    /// shear component.
    pub fn effective_scale(&self) -> (f64, f64) {
        let sx = self.scale_x.unwrap_or(1.0);
        let sy = self.scale_y.unwrap_or(1.0);
        let hx = self.shear_x.unwrap_or(0.0);
        let hy = self.shear_y.unwrap_or(0.0);
        ((sx * sx + hy * hy).sqrt(), (sy * sy + hx * hx).sqrt())
    }
}

/// Shape payload; only the text is modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    #[serde(default)]
    pub shape_type: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(default)]
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

/// Coarse element classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Shape,
    Image,
    Video,
    Table,
    Line,
    Group,
    Unknown,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Shape => "shape",
            ElementKind::Image => "image",
            ElementKind::Video => "video",
            ElementKind::Table => "table",
            ElementKind::Line => "line",
            ElementKind::Group => "group",
            ElementKind::Unknown => "unknown",
        }
    }
}

impl PageElement {
    pub fn kind(&self) -> ElementKind {
        if self.shape.is_some() {
            ElementKind::Shape
        } else if self.image.is_some() {
            ElementKind::Image
        } else if self.video.is_some() {
            ElementKind::Video
        } else if self.table.is_some() {
            ElementKind::Table
        } else if self.line.is_some() {
            ElementKind::Line
        } else if self.element_group.is_some() {
            ElementKind::Group
        } else {
            ElementKind::Unknown
        }
    }

    /// Concatenated text runs of a shape, `None` when the shape has no text.
    ///
    /// The API always terminates shape text with a newline; it is kept so
    /// indices computed from this string line up with the remote ones.
    pub fn text(&self) -> Option<String> {
        let elements = &self.shape.as_ref()?.text.as_ref()?.text_elements;
        let text: String = elements
            .iter()
            .filter_map(|el| el.text_run.as_ref())
            .map(|run| run.content.as_str())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Rendered `(width, height)` in points: intrinsic size times scale.
    pub fn rendered_size_pt(&self) -> Option<(f64, f64)> {
        let (w, h) = self.size?.to_pt();
        let (sx, sy) = self
            .transform
            .map(|t| t.effective_scale())
            .unwrap_or((1.0, 1.0));
        Some((w * sx, h * sy))
    }
}

impl Presentation {
    /// Page size in points, falling back to the 16:9 default.
    pub fn page_size_pt(&self) -> (f64, f64) {
        match self.page_size {
            Some(size) => {
                let (w, h) = size.to_pt();
                if w > 0.0 && h > 0.0 {
                    (w, h)
                } else {
                    DEFAULT_PAGE_SIZE_PT
                }
            }
            None => DEFAULT_PAGE_SIZE_PT,
        }
    }

    pub fn slide(&self, object_id: &str) -> Option<&Page> {
        self.slides.iter().find(|s| s.object_id == object_id)
    }

    /// Slide at a zero-based position in the current ordering.
    pub fn slide_at(&self, position: usize) -> Option<&Page> {
        self.slides.get(position)
    }

    /// Find an element anywhere in the deck, descending into groups.
    pub fn find_element(&self, object_id: &str) -> Option<(&Page, &PageElement)> {
        self.slides.iter().find_map(|slide| {
            find_in(&slide.page_elements, object_id).map(|element| (slide, element))
        })
    }
}

fn find_in<'a>(elements: &'a [PageElement], object_id: &str) -> Option<&'a PageElement> {
    for element in elements {
        if element.object_id == object_id {
            return Some(element);
        }
        if let Some(group) = &element.element_group {
            if let Some(found) = find_in(&group.children, object_id) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Presentation {
        serde_json::from_value(serde_json::json!({
            "presentationId": "deck1",
            "title": "Q1 Report",
            "pageSize": {
                "width": { "magnitude": 9144000, "unit": "EMU" },
                "height": { "magnitude": 5143500, "unit": "EMU" }
            },
            "slides": [
                {
                    "objectId": "s1",
                    "pageElements": [
                        {
                            "objectId": "title",
                            "size": {
                                "width": { "magnitude": 3000000, "unit": "EMU" },
                                "height": { "magnitude": 1000000, "unit": "EMU" }
                            },
                            "transform": { "scaleX": 2.0, "scaleY": 0.5, "unit": "EMU" },
                            "shape": {
                                "shapeType": "TEXT_BOX",
                                "text": { "textElements": [
                                    { "paragraphMarker": {} },
                                    { "textRun": { "content": "Hello " } },
                                    { "textRun": { "content": "world\n" } }
                                ]}
                            }
                        },
                        {
                            "objectId": "grp",
                            "elementGroup": { "children": [
                                { "objectId": "pic", "image": { "contentUrl": "x" } }
                            ]}
                        }
                    ]
                },
                { "objectId": "s2" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_page_size_from_emu() {
        let deck = sample();
        let (w, h) = deck.page_size_pt();
        assert!((w - 720.0).abs() < 1e-6);
        assert!((h - 405.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_page_size() {
        let deck = Presentation::default();
        assert_eq!(deck.page_size_pt(), DEFAULT_PAGE_SIZE_PT);
    }

    #[test]
    fn test_find_element_descends_into_groups() {
        let deck = sample();
        let (slide, element) = deck.find_element("pic").unwrap();
        assert_eq!(slide.object_id, "s1");
        assert_eq!(element.kind(), ElementKind::Image);
        assert!(deck.find_element("missing").is_none());
    }

    #[test]
    fn test_text_and_rendered_size() {
        let deck = sample();
        let (_, title) = deck.find_element("title").unwrap();
        assert_eq!(title.text().as_deref(), Some("Hello world\n"));

        let (w, h) = title.rendered_size_pt().unwrap();
        assert!((w - 3_000_000.0 / EMU_PER_PT * 2.0).abs() < 1e-6);
        assert!((h - 1_000_000.0 / EMU_PER_PT * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_slide_lookup() {
        let deck = sample();
        assert_eq!(deck.slide_at(1).unwrap().object_id, "s2");
        assert!(deck.slide_at(2).is_none());
        assert!(deck.slide("s1").is_some());
    }
}
