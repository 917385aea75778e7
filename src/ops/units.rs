//! Unit conversion and small request-building helpers shared by the
//! operation compilers.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::ops::ValidationError;
use crate::slides::WireReply;
use crate::slides::document::EMU_PER_PT;

/// Object ids the API accepts: 5-50 chars, word characters plus `-` and `:`
/// after the first position.
static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-:]{4,49}$").expect("valid regex"));

/// Points to EMU (English Metric Units).
pub fn pt_to_emu(pt: f64) -> f64 {
    pt * EMU_PER_PT
}

/// A fresh object id for elements created by a compiler.
pub fn new_object_id() -> String {
    format!("sk_{}", Uuid::new_v4().simple())
}

/// Use the caller's id when given (after validating it), else generate one.
pub fn object_id_or_new(requested: Option<&str>) -> Result<String, ValidationError> {
    match requested {
        Some(id) => {
            validate_object_id(id)?;
            Ok(id.to_string())
        }
        None => Ok(new_object_id()),
    }
}

pub fn validate_object_id(id: &str) -> Result<(), ValidationError> {
    if OBJECT_ID.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::Invalid(format!(
            "invalid object id '{}': expected 5-50 characters of [A-Za-z0-9_-:]",
            id
        )))
    }
}

/// Reject empty references to existing objects.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Invalid(format!("'{}' must not be empty", field)))
    } else {
        Ok(())
    }
}

/// Parse `#RRGGBB` or `#RGB` into an API `rgbColor` object.
pub fn parse_hex_rgb(hex: &str) -> Result<serde_json::Value, ValidationError> {
    let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => {
            return Err(ValidationError::Invalid(format!(
                "invalid color '{}': expected #RRGGBB",
                hex
            )));
        }
    };

    let channel = |range: std::ops::Range<usize>| {
        expanded
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| f64::from(v) / 255.0)
            .ok_or_else(|| {
                ValidationError::Invalid(format!("invalid color '{}': expected #RRGGBB", hex))
            })
    };

    Ok(serde_json::json!({
        "red": channel(0..2)?,
        "green": channel(2..4)?,
        "blue": channel(4..6)?,
    }))
}

/// Text color in the `OptionalColor` shape used by text styles.
pub fn opaque_color(hex: &str) -> Result<serde_json::Value, ValidationError> {
    Ok(serde_json::json!({ "opaqueColor": { "rgbColor": parse_hex_rgb(hex)? } }))
}

/// Build a `Range` object from optional bounds.
pub fn text_range(start: Option<i64>, end: Option<i64>) -> Result<serde_json::Value, ValidationError> {
    match (start, end) {
        (Some(s), _) if s < 0 => Err(ValidationError::Invalid(
            "start_index must be >= 0".to_string(),
        )),
        (Some(s), Some(e)) if e <= s => Err(ValidationError::Invalid(format!(
            "end_index ({}) must be greater than start_index ({})",
            e, s
        ))),
        (Some(s), Some(e)) => Ok(serde_json::json!({
            "type": "FIXED_RANGE",
            "startIndex": s,
            "endIndex": e,
        })),
        (Some(s), None) => Ok(serde_json::json!({
            "type": "FROM_START_INDEX",
            "startIndex": s,
        })),
        (None, Some(e)) if e <= 0 => Err(ValidationError::Invalid(
            "end_index must be > 0".to_string(),
        )),
        (None, Some(e)) => Ok(serde_json::json!({
            "type": "FIXED_RANGE",
            "startIndex": 0,
            "endIndex": e,
        })),
        (None, None) => Ok(serde_json::json!({ "type": "ALL" })),
    }
}

/// Placement of a new element on a page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    /// Resolve optional placement against the page size. Missing sizes
    /// default to half the page; missing positions center the element.
    pub fn resolve(
        page: (f64, f64),
        x: Option<f64>,
        y: Option<f64>,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let width = width.unwrap_or(page.0 / 2.0);
        let height = height.unwrap_or(page.1 / 2.0);
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ValidationError::Invalid(
                "width and height must be positive".to_string(),
            ));
        }
        let x = x.unwrap_or((page.0 - width) / 2.0);
        let y = y.unwrap_or((page.1 - height) / 2.0);
        if !(x.is_finite() && y.is_finite()) {
            return Err(ValidationError::Invalid(
                "x and y must be finite numbers".to_string(),
            ));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// `elementProperties` for a create request.
    pub fn element_properties(&self, page_object_id: &str) -> serde_json::Value {
        serde_json::json!({
            "pageObjectId": page_object_id,
            "size": {
                "width": { "magnitude": pt_to_emu(self.width), "unit": "EMU" },
                "height": { "magnitude": pt_to_emu(self.height), "unit": "EMU" },
            },
            "transform": {
                "scaleX": 1.0,
                "scaleY": 1.0,
                "shearX": 0.0,
                "shearY": 0.0,
                "translateX": pt_to_emu(self.x),
                "translateY": pt_to_emu(self.y),
                "unit": "EMU",
            },
        })
    }
}

/// Affine matrix for "scale, then rotate, then translate", in EMU.
pub fn affine_matrix(
    scale_x: f64,
    scale_y: f64,
    rotation_degrees: f64,
    translate_x_pt: f64,
    translate_y_pt: f64,
) -> serde_json::Value {
    let (sin, cos) = rotation_degrees.to_radians().sin_cos();
    serde_json::json!({
        "scaleX": cos * scale_x,
        "scaleY": cos * scale_y,
        "shearX": -sin * scale_y,
        "shearY": sin * scale_x,
        "translateX": pt_to_emu(translate_x_pt),
        "translateY": pt_to_emu(translate_y_pt),
        "unit": "EMU",
    })
}

/// The reply slice belonging to one operation.
pub fn replies_for(
    replies: &[WireReply],
    offset: usize,
    count: usize,
) -> Result<&[WireReply], String> {
    replies.get(offset..offset + count).ok_or_else(|| {
        format!(
            "expected {} replies at offset {}, response has {}",
            count,
            offset,
            replies.len()
        )
    })
}

/// Object id reported by a create reply such as `{"createShape": {"objectId": ..}}`,
/// falling back to the id the request asked for.
pub fn created_object_id(reply: &WireReply, key: &str, requested: &str) -> String {
    reply[key]["objectId"]
        .as_str()
        .unwrap_or(requested)
        .to_string()
}
