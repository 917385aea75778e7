//! Slide-level operations.

use serde::Deserialize;

use crate::context::ToolContext;
use crate::ops::units::{
    created_object_id, object_id_or_new, parse_hex_rgb, replies_for, require_non_empty,
    validate_object_id,
};
use crate::ops::{CompiledRequests, OperationServices, Params, ValidationError, apply};
use crate::tools::ToolError;

/// Predefined slide layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Layout {
    #[default]
    Blank,
    CaptionOnly,
    Title,
    TitleAndBody,
    TitleAndTwoColumns,
    TitleOnly,
    SectionHeader,
    SectionTitleAndDescription,
    OneColumnText,
    MainPoint,
    BigNumber,
}

impl Layout {
    fn as_str(&self) -> &'static str {
        match self {
            Layout::Blank => "BLANK",
            Layout::CaptionOnly => "CAPTION_ONLY",
            Layout::Title => "TITLE",
            Layout::TitleAndBody => "TITLE_AND_BODY",
            Layout::TitleAndTwoColumns => "TITLE_AND_TWO_COLUMNS",
            Layout::TitleOnly => "TITLE_ONLY",
            Layout::SectionHeader => "SECTION_HEADER",
            Layout::SectionTitleAndDescription => "SECTION_TITLE_AND_DESCRIPTION",
            Layout::OneColumnText => "ONE_COLUMN_TEXT",
            Layout::MainPoint => "MAIN_POINT",
            Layout::BigNumber => "BIG_NUMBER",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlideParams {
    #[serde(default)]
    pub layout: Layout,
    /// Position to insert (0-based). Omit to append at end.
    #[serde(default)]
    pub insertion_index: Option<u32>,
    /// Caller-chosen id for the new slide.
    #[serde(default)]
    pub object_id: Option<String>,
}

impl Params for CreateSlideParams {}

pub fn compile_create_slide(p: CreateSlideParams) -> Result<CompiledRequests, ValidationError> {
    let object_id = object_id_or_new(p.object_id.as_deref())?;

    let mut request = serde_json::json!({
        "createSlide": {
            "objectId": object_id,
            "slideLayoutReference": { "predefinedLayout": p.layout.as_str() },
        }
    });
    if let Some(idx) = p.insertion_index {
        request["createSlide"]["insertionIndex"] = serde_json::json!(idx);
    }

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        let reply = &replies_for(replies, offset, 1)?[0];
        Ok(serde_json::json!({
            "object_id": created_object_id(reply, "createSlide", &object_id),
        }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DuplicateObjectParams {
    pub object_id: String,
    /// Id for the copy. Generated when omitted.
    #[serde(default)]
    pub new_object_id: Option<String>,
}

impl Params for DuplicateObjectParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)
    }
}

pub fn compile_duplicate_object(
    p: DuplicateObjectParams,
) -> Result<CompiledRequests, ValidationError> {
    let new_id = object_id_or_new(p.new_object_id.as_deref())?;
    let request = serde_json::json!({
        "duplicateObject": {
            "objectId": p.object_id,
            "objectIds": { p.object_id.clone(): new_id },
        }
    });

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        let reply = &replies_for(replies, offset, 1)?[0];
        Ok(serde_json::json!({
            "source_object_id": p.object_id,
            "object_id": created_object_id(reply, "duplicateObject", &new_id),
        }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteObjectParams {
    pub object_id: String,
}

impl Params for DeleteObjectParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)
    }
}

pub fn compile_delete_object(p: DeleteObjectParams) -> Result<CompiledRequests, ValidationError> {
    let request = serde_json::json!({
        "deleteObject": { "objectId": p.object_id }
    });

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({ "deleted_object_id": p.object_id }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveSlidesParams {
    pub slide_object_ids: Vec<String>,
    pub insertion_index: u32,
}

impl Params for MoveSlidesParams {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.slide_object_ids.is_empty() {
            return Err(ValidationError::Invalid(
                "slide_object_ids must not be empty".to_string(),
            ));
        }
        self.slide_object_ids
            .iter()
            .try_for_each(|id| require_non_empty("slide_object_ids", id))
    }
}

pub fn compile_move_slides(p: MoveSlidesParams) -> Result<CompiledRequests, ValidationError> {
    let request = serde_json::json!({
        "updateSlidesPosition": {
            "slideObjectIds": p.slide_object_ids,
            "insertionIndex": p.insertion_index,
        }
    });

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({
            "slide_object_ids": p.slide_object_ids,
            "insertion_index": p.insertion_index,
        }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSlideAtParams {
    /// Zero-based position in the current slide ordering.
    pub position: usize,
}

impl Params for DeleteSlideAtParams {}

/// Delete whichever slide currently sits at `position`.
pub async fn delete_slide_at(
    services: &OperationServices,
    presentation_id: &str,
    p: DeleteSlideAtParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let document = services
        .documents
        .fetch(&ctx.credentials, presentation_id)
        .await?;

    let slide = document.slide_at(p.position).ok_or_else(|| {
        ToolError::ObjectNotFound(format!(
            "no slide at position {} (presentation has {} slides)",
            p.position,
            document.slides.len()
        ))
    })?;
    let object_id = slide.object_id.clone();

    let request = serde_json::json!({ "deleteObject": { "objectId": object_id } });
    apply(services, presentation_id, vec![request], ctx).await?;

    Ok(serde_json::json!({
        "deleted_object_id": object_id,
        "position": p.position,
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetBackgroundParams {
    /// Slide to change. All slides when omitted.
    #[serde(default)]
    pub slide_object_id: Option<String>,
    /// Solid fill as hex, e.g. `#336699`.
    #[serde(default)]
    pub color: Option<String>,
    /// Image stretched over the slide.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Params for SetBackgroundParams {
    fn validate(&self) -> Result<(), ValidationError> {
        match (&self.color, &self.image_url) {
            (Some(color), None) => parse_hex_rgb(color).map(|_| ()),
            (None, Some(url)) => require_non_empty("image_url", url),
            _ => Err(ValidationError::Invalid(
                "exactly one of 'color' or 'image_url' is required".to_string(),
            )),
        }?;
        if let Some(id) = &self.slide_object_id {
            validate_object_id(id)?;
        }
        Ok(())
    }
}

/// Set the background of one slide or of every slide in the deck.
pub async fn set_background(
    services: &OperationServices,
    presentation_id: &str,
    p: SetBackgroundParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let fill = match (&p.color, &p.image_url) {
        (Some(color), _) => serde_json::json!({
            "solidFill": { "color": { "rgbColor": parse_hex_rgb(color)? } }
        }),
        (None, Some(url)) => serde_json::json!({
            "stretchedPictureFill": { "contentUrl": url }
        }),
        (None, None) => {
            return Err(ToolError::InvalidParameters(
                "exactly one of 'color' or 'image_url' is required".to_string(),
            ));
        }
    };

    let document = services
        .documents
        .fetch(&ctx.credentials, presentation_id)
        .await?;

    let targets: Vec<String> = match &p.slide_object_id {
        Some(id) => {
            if document.slide(id).is_none() {
                return Err(ToolError::ObjectNotFound(format!("slide '{}' not found", id)));
            }
            vec![id.clone()]
        }
        None => document.slides.iter().map(|s| s.object_id.clone()).collect(),
    };

    if targets.is_empty() {
        return Ok(serde_json::json!({ "updated_slides": [] }));
    }

    let requests = targets
        .iter()
        .map(|id| {
            serde_json::json!({
                "updatePageProperties": {
                    "objectId": id,
                    "pageProperties": { "pageBackgroundFill": fill },
                    "fields": "pageBackgroundFill",
                }
            })
        })
        .collect();
    apply(services, presentation_id, requests, ctx).await?;

    Ok(serde_json::json!({ "updated_slides": targets }))
}
