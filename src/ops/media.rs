//! Images and videos.
//!
//! These run standalone: the remote side fetches the media while applying
//! the request, and an unreachable URL fails the whole call it is part of.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::Deserialize;

use crate::context::ToolContext;
use crate::ops::units::{created_object_id, object_id_or_new, pt_to_emu, validate_object_id};
use crate::ops::{OperationServices, Params, ValidationError, apply};
use crate::slides::ElementKind;
use crate::tools::ToolError;

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|[?&]v=|/embed/|/shorts/)([A-Za-z0-9_-]{11})").expect("valid regex")
});
static DRIVE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:/file/d/|[?&]id=)([A-Za-z0-9_-]{10,})").expect("valid regex")
});
static BARE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid regex"));

fn validate_media_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url)
        .map_err(|e| ValidationError::Invalid(format!("invalid url '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ValidationError::Invalid(format!(
            "unsupported url scheme '{}': expected http or https",
            other
        ))),
    }
}

/// `elementProperties` for media. Size is omitted unless both dimensions
/// are given, so the remote side keeps the intrinsic aspect ratio.
fn media_properties(
    page_object_id: &str,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
) -> Result<serde_json::Value, ValidationError> {
    let mut props = serde_json::json!({
        "pageObjectId": page_object_id,
        "transform": {
            "scaleX": 1.0,
            "scaleY": 1.0,
            "translateX": pt_to_emu(x.unwrap_or(0.0)),
            "translateY": pt_to_emu(y.unwrap_or(0.0)),
            "unit": "EMU",
        },
    });
    if let (Some(w), Some(h)) = (width, height) {
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(ValidationError::Invalid(
                "width and height must be positive".to_string(),
            ));
        }
        props["size"] = serde_json::json!({
            "width": { "magnitude": pt_to_emu(w), "unit": "EMU" },
            "height": { "magnitude": pt_to_emu(h), "unit": "EMU" },
        });
    }
    Ok(props)
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddImageParams {
    pub slide_object_id: String,
    /// Publicly reachable http(s) URL.
    pub url: String,
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
}

impl Params for AddImageParams {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.slide_object_id)?;
        validate_media_url(&self.url)?;
        media_properties(&self.slide_object_id, self.x, self.y, self.width, self.height)?;
        Ok(())
    }
}

pub async fn add_image(
    services: &OperationServices,
    presentation_id: &str,
    p: AddImageParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let object_id = object_id_or_new(p.object_id.as_deref())?;
    let request = serde_json::json!({
        "createImage": {
            "objectId": object_id,
            "url": p.url,
            "elementProperties": media_properties(&p.slide_object_id, p.x, p.y, p.width, p.height)?,
        }
    });

    let replies = apply(services, presentation_id, vec![request], ctx).await?;
    let reply = replies.first().cloned().unwrap_or_default();
    Ok(serde_json::json!({
        "object_id": created_object_id(&reply, "createImage", &object_id),
    }))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoSource {
    #[default]
    Youtube,
    Drive,
}

impl VideoSource {
    fn as_str(&self) -> &'static str {
        match self {
            VideoSource::Youtube => "YOUTUBE",
            VideoSource::Drive => "DRIVE",
        }
    }

    /// Pull the video id out of a share URL, or accept a bare id.
    fn extract_id(&self, video: &str) -> Option<String> {
        let video = video.trim();
        let pattern = match self {
            VideoSource::Youtube => &YOUTUBE_ID,
            VideoSource::Drive => &DRIVE_ID,
        };
        if let Some(caps) = pattern.captures(video) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
        BARE_ID.is_match(video).then(|| video.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddVideoParams {
    pub slide_object_id: String,
    /// Share URL or bare video id.
    pub video: String,
    #[serde(default)]
    pub source: VideoSource,
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
}

impl Params for AddVideoParams {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.slide_object_id)?;
        if self.source.extract_id(&self.video).is_none() {
            return Err(ValidationError::Invalid(format!(
                "cannot find a {} video id in '{}'",
                self.source.as_str(),
                self.video
            )));
        }
        media_properties(&self.slide_object_id, self.x, self.y, self.width, self.height)?;
        Ok(())
    }
}

pub async fn add_video(
    services: &OperationServices,
    presentation_id: &str,
    p: AddVideoParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let video_id = p.source.extract_id(&p.video).ok_or_else(|| {
        ToolError::InvalidParameters(format!("cannot find a video id in '{}'", p.video))
    })?;
    let object_id = object_id_or_new(p.object_id.as_deref())?;
    let request = serde_json::json!({
        "createVideo": {
            "objectId": object_id,
            "source": p.source.as_str(),
            "id": video_id,
            "elementProperties": media_properties(&p.slide_object_id, p.x, p.y, p.width, p.height)?,
        }
    });

    let replies = apply(services, presentation_id, vec![request], ctx).await?;
    let reply = replies.first().cloned().unwrap_or_default();
    Ok(serde_json::json!({
        "object_id": created_object_id(&reply, "createVideo", &object_id),
        "video_id": video_id,
    }))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplaceMethod {
    #[default]
    CenterInside,
    CenterCrop,
}

impl ReplaceMethod {
    fn as_str(&self) -> &'static str {
        match self {
            ReplaceMethod::CenterInside => "CENTER_INSIDE",
            ReplaceMethod::CenterCrop => "CENTER_CROP",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceImageParams {
    pub object_id: String,
    pub url: String,
    #[serde(default)]
    pub method: ReplaceMethod,
}

impl Params for ReplaceImageParams {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.object_id)?;
        validate_media_url(&self.url)
    }
}

pub async fn replace_image(
    services: &OperationServices,
    presentation_id: &str,
    p: ReplaceImageParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let document = services
        .documents
        .fetch(&ctx.credentials, presentation_id)
        .await?;

    let (_, element) = document.find_element(&p.object_id).ok_or_else(|| {
        ToolError::ObjectNotFound(format!("object '{}' not found", p.object_id))
    })?;
    let kind = element.kind();
    if kind != ElementKind::Image {
        return Err(ToolError::InvalidParameters(format!(
            "object '{}' is a {}, not an image",
            p.object_id,
            kind.as_str()
        )));
    }

    let request = serde_json::json!({
        "replaceImage": {
            "imageObjectId": p.object_id,
            "url": p.url,
            "imageReplaceMethod": p.method.as_str(),
        }
    });
    apply(services, presentation_id, vec![request], ctx).await?;

    Ok(serde_json::json!({ "object_id": p.object_id }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ops::parse_params;
    use crate::slides::Presentation;
    use crate::slides::fake::{FakeDocuments, FakeTranslator, test_credentials};

    fn services(docs: Arc<FakeDocuments>) -> OperationServices {
        OperationServices {
            documents: docs,
            translator: Arc::new(FakeTranslator::default()),
        }
    }

    #[test]
    fn test_video_id_extraction() {
        let yt = VideoSource::Youtube;
        assert_eq!(
            yt.extract_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(yt.extract_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(yt.extract_id("dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert!(yt.extract_id("https://example.com/").is_none());

        let drive = VideoSource::Drive;
        assert_eq!(
            drive
                .extract_id("https://drive.google.com/file/d/1AbCdEfGhIjKlMnOp/view")
                .as_deref(),
            Some("1AbCdEfGhIjKlMnOp")
        );
    }

    #[test]
    fn test_image_url_must_be_http() {
        let err = parse_params::<AddImageParams>(&serde_json::json!({
            "slide_object_id": "slide_1",
            "url": "file:///etc/passwd"
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_add_image_runs_in_its_own_call() {
        let docs = Arc::new(FakeDocuments::with_slides(&["slide_1"]));
        docs.push_replies(vec![serde_json::json!({ "createImage": { "objectId": "img_0001" } })]);
        let ctx = ToolContext::new(test_credentials());

        let result = add_image(
            &services(docs.clone()),
            "deck1",
            parse_params(&serde_json::json!({
                "slide_object_id": "slide_1",
                "url": "https://example.com/chart.png",
                "width": 200, "height": 100
            }))
            .unwrap(),
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(result["object_id"], "img_0001");
        let batches = docs.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].requests[0]["createImage"]["elementProperties"]["size"]["width"]["magnitude"],
            200.0 * 12_700.0
        );
        assert_eq!(docs.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_replace_image_rejects_shapes() {
        let deck: Presentation = serde_json::from_value(serde_json::json!({
            "presentationId": "deck1",
            "slides": [{
                "objectId": "slide_1",
                "pageElements": [{ "objectId": "shape_1", "shape": {} }]
            }]
        }))
        .unwrap();
        let docs = Arc::new(FakeDocuments::new(deck));
        let ctx = ToolContext::new(test_credentials());

        let err = replace_image(
            &services(docs.clone()),
            "deck1",
            parse_params(&serde_json::json!({
                "object_id": "shape_1",
                "url": "https://example.com/new.png"
            }))
            .unwrap(),
            &ctx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolError::InvalidParameters(_)));
        assert!(docs.batches().is_empty());
    }
}
