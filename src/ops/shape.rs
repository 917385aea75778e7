//! Shapes, placement and stacking order.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::context::ToolContext;
use crate::ops::units::{
    Frame, affine_matrix, created_object_id, object_id_or_new, parse_hex_rgb, replies_for,
    require_non_empty, validate_object_id,
};
use crate::ops::{
    CompileContext, CompiledRequests, OperationServices, Params, ValidationError, apply,
};
use crate::slides::document::{EMU_PER_PT, Unit};
use crate::tools::ToolError;

static SHAPE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex"));

fn default_shape_type() -> String {
    "TEXT_BOX".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShapeParams {
    pub slide_object_id: String,
    /// API shape type such as `RECTANGLE`, `ELLIPSE`, `ROUND_RECTANGLE`.
    #[serde(default = "default_shape_type")]
    pub shape_type: String,
    #[serde(default)]
    pub object_id: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Solid fill as hex.
    #[serde(default)]
    pub fill_color: Option<String>,
}

impl Params for CreateShapeParams {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.slide_object_id)?;
        if !SHAPE_TYPE.is_match(&self.shape_type) {
            return Err(ValidationError::Invalid(format!(
                "invalid shape_type '{}'",
                self.shape_type
            )));
        }
        if let Some(color) = &self.fill_color {
            parse_hex_rgb(color)?;
        }
        Ok(())
    }
}

pub fn compile_create_shape(
    p: CreateShapeParams,
    ctx: &CompileContext<'_>,
) -> Result<CompiledRequests, ValidationError> {
    let frame = Frame::resolve(ctx.document.page_size_pt(), p.x, p.y, p.width, p.height)?;
    let object_id = object_id_or_new(p.object_id.as_deref())?;

    let mut requests = vec![serde_json::json!({
        "createShape": {
            "objectId": object_id,
            "shapeType": p.shape_type,
            "elementProperties": frame.element_properties(&p.slide_object_id),
        }
    })];
    if let Some(color) = &p.fill_color {
        requests.push(serde_json::json!({
            "updateShapeProperties": {
                "objectId": object_id,
                "shapeProperties": {
                    "shapeBackgroundFill": {
                        "solidFill": { "color": { "rgbColor": parse_hex_rgb(color)? } }
                    }
                },
                "fields": "shapeBackgroundFill.solidFill.color",
            }
        }));
    }

    let count = requests.len();
    Ok(CompiledRequests::new(requests, move |replies, offset| {
        let own = replies_for(replies, offset, count)?;
        Ok(serde_json::json!({
            "object_id": created_object_id(&own[0], "createShape", &object_id),
        }))
    }))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Compose with the element's current transform.
    #[default]
    Relative,
    /// Replace the element's transform outright.
    Absolute,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformObjectParams {
    pub object_id: String,
    #[serde(default)]
    pub mode: TransformMode,
    /// Offset in points.
    #[serde(default)]
    pub translate_x: Option<f64>,
    #[serde(default)]
    pub translate_y: Option<f64>,
    #[serde(default)]
    pub scale_x: Option<f64>,
    #[serde(default)]
    pub scale_y: Option<f64>,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation: Option<f64>,
}

impl Params for TransformObjectParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)?;
        let components = [
            self.translate_x,
            self.translate_y,
            self.scale_x,
            self.scale_y,
            self.rotation,
        ];
        if components.iter().all(Option::is_none) {
            return Err(ValidationError::Invalid(
                "at least one of translate_x, translate_y, scale_x, scale_y, rotation is required"
                    .to_string(),
            ));
        }
        if components.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ValidationError::Invalid(
                "transform values must be finite numbers".to_string(),
            ));
        }
        if [self.scale_x, self.scale_y].iter().flatten().any(|s| *s == 0.0) {
            return Err(ValidationError::Invalid("scale must not be zero".to_string()));
        }
        Ok(())
    }
}

pub fn compile_transform_object(
    p: TransformObjectParams,
) -> Result<CompiledRequests, ValidationError> {
    let transform = affine_matrix(
        p.scale_x.unwrap_or(1.0),
        p.scale_y.unwrap_or(1.0),
        p.rotation.unwrap_or(0.0),
        p.translate_x.unwrap_or(0.0),
        p.translate_y.unwrap_or(0.0),
    );
    let apply_mode = match p.mode {
        TransformMode::Relative => "RELATIVE",
        TransformMode::Absolute => "ABSOLUTE",
    };

    let request = serde_json::json!({
        "updatePageElementTransform": {
            "objectId": p.object_id,
            "transform": transform,
            "applyMode": apply_mode,
        }
    });

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({ "object_id": p.object_id }))
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZOrderOperation {
    BringToFront,
    BringForward,
    SendBackward,
    SendToBack,
}

impl ZOrderOperation {
    fn as_str(&self) -> &'static str {
        match self {
            ZOrderOperation::BringToFront => "BRING_TO_FRONT",
            ZOrderOperation::BringForward => "BRING_FORWARD",
            ZOrderOperation::SendBackward => "SEND_BACKWARD",
            ZOrderOperation::SendToBack => "SEND_TO_BACK",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderLayersParams {
    pub object_ids: Vec<String>,
    pub operation: ZOrderOperation,
}

impl Params for ReorderLayersParams {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.object_ids.is_empty() {
            return Err(ValidationError::Invalid(
                "object_ids must not be empty".to_string(),
            ));
        }
        self.object_ids
            .iter()
            .try_for_each(|id| require_non_empty("object_ids", id))
    }
}

pub fn compile_reorder_layers(
    p: ReorderLayersParams,
) -> Result<CompiledRequests, ValidationError> {
    let request = serde_json::json!({
        "updatePageElementsZOrder": {
            "pageElementObjectIds": p.object_ids,
            "operation": p.operation.as_str(),
        }
    });

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({
            "object_ids": p.object_ids,
            "operation": p.operation.as_str(),
        }))
    }))
}

fn default_keep_aspect_ratio() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResizeObjectParams {
    pub object_id: String,
    /// Target rendered width in points.
    #[serde(default)]
    pub width: Option<f64>,
    /// Target rendered height in points.
    #[serde(default)]
    pub height: Option<f64>,
    /// Uniform factor applied to the current size.
    #[serde(default)]
    pub scale: Option<f64>,
    /// When only one dimension is given, scale the other to match.
    #[serde(default = "default_keep_aspect_ratio")]
    pub keep_aspect_ratio: bool,
}

impl Params for ResizeObjectParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)?;
        let given = [self.width, self.height, self.scale];
        if given.iter().all(Option::is_none) {
            return Err(ValidationError::Invalid(
                "one of 'width', 'height' or 'scale' is required".to_string(),
            ));
        }
        if self.scale.is_some() && (self.width.is_some() || self.height.is_some()) {
            return Err(ValidationError::Invalid(
                "'scale' cannot be combined with 'width' or 'height'".to_string(),
            ));
        }
        if given.iter().flatten().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ValidationError::Invalid(
                "sizes and scale must be positive numbers".to_string(),
            ));
        }
        Ok(())
    }
}

impl ResizeObjectParams {
    /// Horizontal and vertical factors to reach the requested size from
    /// `current` (rendered, in points).
    fn factors(&self, current: (f64, f64)) -> (f64, f64) {
        if let Some(scale) = self.scale {
            return (scale, scale);
        }
        let kx = self.width.map(|w| w / current.0);
        let ky = self.height.map(|h| h / current.1);
        match (kx, ky) {
            (Some(kx), Some(ky)) => (kx, ky),
            (Some(kx), None) => (kx, if self.keep_aspect_ratio { kx } else { 1.0 }),
            (None, Some(ky)) => (if self.keep_aspect_ratio { ky } else { 1.0 }, ky),
            (None, None) => (1.0, 1.0),
        }
    }
}

/// Resize an element in place, keeping its top-left corner fixed.
pub async fn resize_object(
    services: &OperationServices,
    presentation_id: &str,
    p: ResizeObjectParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let document = services
        .documents
        .fetch(&ctx.credentials, presentation_id)
        .await?;

    let (_, element) = document.find_element(&p.object_id).ok_or_else(|| {
        ToolError::ObjectNotFound(format!("object '{}' not found", p.object_id))
    })?;
    let current = element
        .rendered_size_pt()
        .filter(|(w, h)| *w > 0.0 && *h > 0.0)
        .ok_or_else(|| {
            ToolError::ExecutionFailed(format!("object '{}' has no size to scale", p.object_id))
        })?;

    let (kx, ky) = p.factors(current);

    // A relative scale is applied about the page origin; shift back so the
    // element's own top-left stays put.
    let to_emu = |v: Option<f64>, unit: Option<Unit>| match unit {
        Some(Unit::Pt) => v.unwrap_or(0.0) * EMU_PER_PT,
        _ => v.unwrap_or(0.0),
    };
    let (tx, ty) = element
        .transform
        .map(|t| (to_emu(t.translate_x, t.unit), to_emu(t.translate_y, t.unit)))
        .unwrap_or((0.0, 0.0));

    let request = serde_json::json!({
        "updatePageElementTransform": {
            "objectId": p.object_id,
            "transform": {
                "scaleX": kx,
                "scaleY": ky,
                "shearX": 0.0,
                "shearY": 0.0,
                "translateX": tx * (1.0 - kx),
                "translateY": ty * (1.0 - ky),
                "unit": "EMU",
            },
            "applyMode": "RELATIVE",
        }
    });
    apply(services, presentation_id, vec![request], ctx).await?;

    Ok(serde_json::json!({
        "object_id": p.object_id,
        "width": current.0 * kx,
        "height": current.1 * ky,
    }))
}
