//! Slide-deck operations.
//!
//! Every operation kind the tools understand is listed in [`OperationKind`].
//! Batchable kinds compile ahead of time into wire requests plus a result
//! extractor ([`compile`]); the others need fresh remote state or their
//! own remote interaction and only run through [`execute`].
//!
//! # Compile outcomes
//!
//! ```text
//! compile(kind, params) ──► Compiled { requests, extractor }   batch path
//!                       ├─► Unsupported                        run on its own
//!                       └─► Invalid(ValidationError)           never runs
//! ```

mod media;
mod shape;
mod slide;
mod table;
mod text;
pub mod units;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::context::ToolContext;
use crate::slides::{DocumentService, Presentation, TranslationService, WireReply, WireRequest};
use crate::tools::ToolError;

/// Closed set of operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateSlide,
    DuplicateObject,
    DeleteObject,
    MoveSlides,
    InsertText,
    DeleteText,
    ReplaceAllText,
    FormatText,
    FormatParagraph,
    CreateShape,
    AddTextBox,
    CreateTable,
    TransformObject,
    ReorderLayers,
    DeleteSlideAt,
    ResizeObject,
    SetBackground,
    TranslateText,
    AddImage,
    AddVideo,
    ReplaceImage,
}

impl OperationKind {
    pub const ALL: [OperationKind; 21] = [
        OperationKind::CreateSlide,
        OperationKind::DuplicateObject,
        OperationKind::DeleteObject,
        OperationKind::MoveSlides,
        OperationKind::InsertText,
        OperationKind::DeleteText,
        OperationKind::ReplaceAllText,
        OperationKind::FormatText,
        OperationKind::FormatParagraph,
        OperationKind::CreateShape,
        OperationKind::AddTextBox,
        OperationKind::CreateTable,
        OperationKind::TransformObject,
        OperationKind::ReorderLayers,
        OperationKind::DeleteSlideAt,
        OperationKind::ResizeObject,
        OperationKind::SetBackground,
        OperationKind::TranslateText,
        OperationKind::AddImage,
        OperationKind::AddVideo,
        OperationKind::ReplaceImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateSlide => "create_slide",
            OperationKind::DuplicateObject => "duplicate_object",
            OperationKind::DeleteObject => "delete_object",
            OperationKind::MoveSlides => "move_slides",
            OperationKind::InsertText => "insert_text",
            OperationKind::DeleteText => "delete_text",
            OperationKind::ReplaceAllText => "replace_all_text",
            OperationKind::FormatText => "format_text",
            OperationKind::FormatParagraph => "format_paragraph",
            OperationKind::CreateShape => "create_shape",
            OperationKind::AddTextBox => "add_text_box",
            OperationKind::CreateTable => "create_table",
            OperationKind::TransformObject => "transform_object",
            OperationKind::ReorderLayers => "reorder_layers",
            OperationKind::DeleteSlideAt => "delete_slide_at",
            OperationKind::ResizeObject => "resize_object",
            OperationKind::SetBackground => "set_background",
            OperationKind::TranslateText => "translate_text",
            OperationKind::AddImage => "add_image",
            OperationKind::AddVideo => "add_video",
            OperationKind::ReplaceImage => "replace_image",
        }
    }

    /// Whether the kind can be compiled into wire requests ahead of time.
    pub fn is_batchable(&self) -> bool {
        !matches!(
            self,
            OperationKind::DeleteSlideAt
                | OperationKind::ResizeObject
                | OperationKind::SetBackground
                | OperationKind::TranslateText
                | OperationKind::AddImage
                | OperationKind::AddVideo
                | OperationKind::ReplaceImage
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::CreateSlide => "Add a slide with a predefined layout",
            OperationKind::DuplicateObject => "Duplicate a slide or page element",
            OperationKind::DeleteObject => "Delete a slide or page element",
            OperationKind::MoveSlides => "Move slides to a new position",
            OperationKind::InsertText => "Insert text into a shape or table cell",
            OperationKind::DeleteText => "Delete a range of text from a shape",
            OperationKind::ReplaceAllText => "Find and replace text across the presentation",
            OperationKind::FormatText => "Style text (bold, italic, size, font, color)",
            OperationKind::FormatParagraph => "Set paragraph alignment and spacing",
            OperationKind::CreateShape => "Create a shape or empty text box",
            OperationKind::AddTextBox => "Create a text box with text and optional styling",
            OperationKind::CreateTable => "Create a table, optionally filled with data",
            OperationKind::TransformObject => "Move, scale, or rotate a page element",
            OperationKind::ReorderLayers => "Change the z-order of page elements",
            OperationKind::DeleteSlideAt => "Delete the slide at a position",
            OperationKind::ResizeObject => "Resize an element, optionally keeping aspect ratio",
            OperationKind::SetBackground => "Set a slide background color or image",
            OperationKind::TranslateText => "Translate the text of shapes in place",
            OperationKind::AddImage => "Insert an image from a URL",
            OperationKind::AddVideo => "Insert a YouTube or Drive video",
            OperationKind::ReplaceImage => "Replace an existing image",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let kind = match normalized.as_str() {
            "add_slide" => OperationKind::CreateSlide,
            "add_shape" => OperationKind::CreateShape,
            "create_text_box" => OperationKind::AddTextBox,
            "add_table" => OperationKind::CreateTable,
            "translate" => OperationKind::TranslateText,
            "insert_image" => OperationKind::AddImage,
            "insert_video" => OperationKind::AddVideo,
            "style_text" => OperationKind::FormatText,
            other => OperationKind::ALL
                .into_iter()
                .find(|k| k.as_str() == other)
                .ok_or_else(|| ValidationError::UnknownKind(s.to_string()))?,
        };
        Ok(kind)
    }
}

/// Why an operation cannot run on any path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown operation kind '{0}'")]
    UnknownKind(String),

    /// The payload does not deserialize into the kind's parameters.
    #[error("invalid parameters: {0}")]
    Parse(String),

    /// The payload parsed but is semantically wrong.
    #[error("{0}")]
    Invalid(String),
}

/// Parameters of one operation kind.
pub trait Params: DeserializeOwned {
    /// Semantic checks beyond deserialization.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Deserialize and validate a parameter payload.
pub fn parse_params<P: Params>(params: &serde_json::Value) -> Result<P, ValidationError> {
    if !params.is_object() {
        return Err(ValidationError::Parse(
            "parameters must be a JSON object".to_string(),
        ));
    }
    let parsed: P = serde_json::from_value(params.clone())
        .map_err(|e| ValidationError::Parse(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Read-only data available to compilers.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    pub presentation_id: &'a str,
    /// Snapshot fetched at the start of the run. Only state that no
    /// operation in the same run can change (such as the page size) may be
    /// read from it.
    pub document: &'a Presentation,
}

/// Turns an operation's slice of the batch reply into its result payload.
///
/// Called with the full reply list and the offset where this operation's
/// own replies begin.
pub type ResultExtractor =
    Box<dyn FnOnce(&[WireReply], usize) -> Result<serde_json::Value, String> + Send>;

/// Output of a successful compilation.
pub struct CompiledRequests {
    pub requests: Vec<WireRequest>,
    pub extractor: ResultExtractor,
}

impl CompiledRequests {
    pub fn new<F>(requests: Vec<WireRequest>, extractor: F) -> Self
    where
        F: FnOnce(&[WireReply], usize) -> Result<serde_json::Value, String> + Send + 'static,
    {
        Self {
            requests,
            extractor: Box::new(extractor),
        }
    }
}

impl fmt::Debug for CompiledRequests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRequests")
            .field("requests", &self.requests)
            .finish_non_exhaustive()
    }
}

/// Result of asking the registry to compile one operation.
#[derive(Debug)]
pub enum Compilation {
    Compiled(CompiledRequests),
    /// Valid, but must run through its standalone handler.
    Unsupported,
    Invalid(ValidationError),
}

fn compiled<P, F>(params: &serde_json::Value, build: F) -> Compilation
where
    P: Params,
    F: FnOnce(P) -> Result<CompiledRequests, ValidationError>,
{
    match parse_params::<P>(params).and_then(build) {
        Ok(c) => Compilation::Compiled(c),
        Err(e) => Compilation::Invalid(e),
    }
}

fn standalone<P: Params>(params: &serde_json::Value) -> Compilation {
    match parse_params::<P>(params) {
        Ok(_) => Compilation::Unsupported,
        Err(e) => Compilation::Invalid(e),
    }
}

/// Compile one operation into wire requests.
///
/// Pure: no network access and no side effects. Identical parameters yield
/// identical requests apart from freshly generated object ids.
pub fn compile(
    kind: OperationKind,
    params: &serde_json::Value,
    ctx: &CompileContext<'_>,
) -> Compilation {
    match kind {
        OperationKind::CreateSlide => compiled(params, slide::compile_create_slide),
        OperationKind::DuplicateObject => compiled(params, slide::compile_duplicate_object),
        OperationKind::DeleteObject => compiled(params, slide::compile_delete_object),
        OperationKind::MoveSlides => compiled(params, slide::compile_move_slides),
        OperationKind::InsertText => compiled(params, text::compile_insert_text),
        OperationKind::DeleteText => compiled(params, text::compile_delete_text),
        OperationKind::ReplaceAllText => compiled(params, text::compile_replace_all_text),
        OperationKind::FormatText => compiled(params, text::compile_format_text),
        OperationKind::FormatParagraph => compiled(params, text::compile_format_paragraph),
        OperationKind::CreateShape => compiled(params, |p| shape::compile_create_shape(p, ctx)),
        OperationKind::AddTextBox => compiled(params, |p| text::compile_add_text_box(p, ctx)),
        OperationKind::CreateTable => compiled(params, |p| table::compile_create_table(p, ctx)),
        OperationKind::TransformObject => compiled(params, shape::compile_transform_object),
        OperationKind::ReorderLayers => compiled(params, shape::compile_reorder_layers),
        OperationKind::DeleteSlideAt => standalone::<slide::DeleteSlideAtParams>(params),
        OperationKind::ResizeObject => standalone::<shape::ResizeObjectParams>(params),
        OperationKind::SetBackground => standalone::<slide::SetBackgroundParams>(params),
        OperationKind::TranslateText => standalone::<text::TranslateTextParams>(params),
        OperationKind::AddImage => standalone::<media::AddImageParams>(params),
        OperationKind::AddVideo => standalone::<media::AddVideoParams>(params),
        OperationKind::ReplaceImage => standalone::<media::ReplaceImageParams>(params),
    }
}

/// Remote services used by standalone execution.
#[derive(Clone)]
pub struct OperationServices {
    pub documents: Arc<dyn DocumentService>,
    pub translator: Arc<dyn TranslationService>,
}

/// Compilers and standalone handlers for every [`OperationKind`], bound to
/// the remote services they run against.
#[derive(Clone)]
pub struct OperationRegistry {
    services: OperationServices,
}

impl OperationRegistry {
    pub fn new(services: OperationServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &OperationServices {
        &self.services
    }

    pub fn compile(
        &self,
        kind: OperationKind,
        params: &serde_json::Value,
        ctx: &CompileContext<'_>,
    ) -> Compilation {
        compile(kind, params, ctx)
    }

    pub async fn execute(
        &self,
        kind: OperationKind,
        presentation_id: &str,
        params: &serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        execute(kind, &self.services, presentation_id, params, ctx).await
    }
}

/// Run one operation on its own against the remote services.
///
/// Batchable kinds are compiled against a fresh snapshot and applied in a
/// dedicated call; the others run their own handler.
pub async fn execute(
    kind: OperationKind,
    services: &OperationServices,
    presentation_id: &str,
    params: &serde_json::Value,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    match kind {
        OperationKind::DeleteSlideAt => {
            slide::delete_slide_at(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::ResizeObject => {
            shape::resize_object(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::SetBackground => {
            slide::set_background(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::TranslateText => {
            text::translate_text(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::AddImage => {
            media::add_image(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::AddVideo => {
            media::add_video(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::ReplaceImage => {
            media::replace_image(services, presentation_id, parse_params(params)?, ctx).await
        }
        OperationKind::CreateSlide
        | OperationKind::DuplicateObject
        | OperationKind::DeleteObject
        | OperationKind::MoveSlides
        | OperationKind::InsertText
        | OperationKind::DeleteText
        | OperationKind::ReplaceAllText
        | OperationKind::FormatText
        | OperationKind::FormatParagraph
        | OperationKind::CreateShape
        | OperationKind::AddTextBox
        | OperationKind::CreateTable
        | OperationKind::TransformObject
        | OperationKind::ReorderLayers => {
            run_compiled(kind, services, presentation_id, params, ctx).await
        }
    }
}

async fn run_compiled(
    kind: OperationKind,
    services: &OperationServices,
    presentation_id: &str,
    params: &serde_json::Value,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let document = services
        .documents
        .fetch(&ctx.credentials, presentation_id)
        .await?;
    let compile_ctx = CompileContext {
        presentation_id,
        document: &document,
    };

    let CompiledRequests {
        requests,
        extractor,
    } = match compile(kind, params, &compile_ctx) {
        Compilation::Compiled(c) => c,
        Compilation::Invalid(e) => return Err(e.into()),
        Compilation::Unsupported => {
            return Err(ToolError::ExecutionFailed(format!(
                "{} cannot be compiled into requests",
                kind
            )));
        }
    };

    if requests.is_empty() {
        tracing::debug!(kind = %kind, "Nothing to apply");
        return Ok(serde_json::json!({ "applied": false }));
    }

    let replies = apply(services, presentation_id, requests, ctx).await?;
    extractor(&replies, 0).map_err(ToolError::PostProcess)
}

/// Send one batch of requests for a standalone handler, honoring
/// cancellation before dispatch.
pub(crate) async fn apply(
    services: &OperationServices,
    presentation_id: &str,
    requests: Vec<WireRequest>,
    ctx: &ToolContext,
) -> Result<Vec<WireReply>, ToolError> {
    if ctx.is_cancelled() {
        return Err(ToolError::Cancelled);
    }
    let response = services
        .documents
        .execute_batch(&ctx.credentials, presentation_id, requests)
        .await?;
    Ok(response.replies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(document: &Presentation) -> CompileContext<'_> {
        CompileContext {
            presentation_id: "deck1",
            document,
        }
    }

    #[test]
    fn test_kind_parsing_and_aliases() {
        assert_eq!("create_slide".parse::<OperationKind>().unwrap(), OperationKind::CreateSlide);
        assert_eq!("Add-Slide".parse::<OperationKind>().unwrap(), OperationKind::CreateSlide);
        assert_eq!("translate".parse::<OperationKind>().unwrap(), OperationKind::TranslateText);
        assert_eq!(
            "explode".parse::<OperationKind>().unwrap_err(),
            ValidationError::UnknownKind("explode".to_string())
        );
    }

    #[test]
    fn test_every_kind_round_trips_its_name() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_standalone_kinds_report_unsupported() {
        let deck = Presentation::default();
        let compilation = compile(
            OperationKind::DeleteSlideAt,
            &serde_json::json!({ "position": 2 }),
            &ctx(&deck),
        );
        assert!(matches!(compilation, Compilation::Unsupported));

        for kind in OperationKind::ALL.into_iter().filter(|k| !k.is_batchable()) {
            let compilation = compile(kind, &serde_json::json!({}), &ctx(&deck));
            assert!(
                matches!(compilation, Compilation::Invalid(_)),
                "{} accepted empty parameters",
                kind
            );
        }
    }

    #[test]
    fn test_non_object_parameters_are_parse_errors() {
        let deck = Presentation::default();
        let compilation = compile(OperationKind::DeleteObject, &serde_json::json!("x"), &ctx(&deck));
        assert!(matches!(compilation, Compilation::Invalid(ValidationError::Parse(_))));
    }

    #[test]
    fn test_compilation_is_repeatable() {
        let deck = Presentation::default();
        let params = serde_json::json!({
            "slide_object_id": "slide_1",
            "object_id": "box_0001",
            "text": "Hello",
            "x": 10, "y": 20, "width": 100, "height": 40,
            "bold": true
        });

        let first = match compile(OperationKind::AddTextBox, &params, &ctx(&deck)) {
            Compilation::Compiled(c) => c.requests,
            other => panic!("unexpected: {:?}", other),
        };
        let second = match compile(OperationKind::AddTextBox, &params, &ctx(&deck)) {
            Compilation::Compiled(c) => c.requests,
            other => panic!("unexpected: {:?}", other),
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_ids_are_the_only_difference() {
        let deck = Presentation::default();
        let params = serde_json::json!({ "layout": "TITLE" });

        let strip = |mut requests: Vec<WireRequest>| {
            for r in &mut requests {
                r["createSlide"]["objectId"] = serde_json::Value::Null;
            }
            requests
        };
        let first = match compile(OperationKind::CreateSlide, &params, &ctx(&deck)) {
            Compilation::Compiled(c) => c.requests,
            other => panic!("unexpected: {:?}", other),
        };
        let second = match compile(OperationKind::CreateSlide, &params, &ctx(&deck)) {
            Compilation::Compiled(c) => c.requests,
            other => panic!("unexpected: {:?}", other),
        };
        assert_ne!(first, second);
        assert_eq!(strip(first), strip(second));
    }
}
