//! One tool per slide operation kind.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ToolContext;
use crate::ops::{OperationKind, OperationRegistry};
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Runs a single operation kind on its own.
pub struct SlidesOperationTool {
    kind: OperationKind,
    operations: Arc<OperationRegistry>,
}

impl SlidesOperationTool {
    pub fn new(kind: OperationKind, operations: Arc<OperationRegistry>) -> Self {
        Self { kind, operations }
    }
}

#[async_trait]
impl Tool for SlidesOperationTool {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let (mut properties, mut required) = operation_schema(self.kind);
        properties["presentation_id"] = serde_json::json!({
            "type": "string",
            "description": "ID of the presentation to edit"
        });
        required.insert(0, "presentation_id");
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();

        let mut params = match params {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(ToolError::InvalidParameters(
                    "parameters must be a JSON object".to_string(),
                ));
            }
        };
        let presentation_id = params
            .remove("presentation_id")
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ToolError::InvalidParameters("missing 'presentation_id' parameter".to_string())
            })?;

        tracing::debug!(
            request_id = %ctx.request_id,
            presentation_id = %presentation_id,
            kind = %self.kind,
            "Running operation"
        );

        let result = self
            .operations
            .execute(
                self.kind,
                &presentation_id,
                &serde_json::Value::Object(params),
                ctx,
            )
            .await?;

        Ok(ToolOutput::success(result, start.elapsed()))
    }
}

fn string(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "string", "description": description })
}

fn number(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "number", "description": description })
}

fn integer(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "integer", "minimum": 0, "description": description })
}

fn boolean(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "boolean", "description": description })
}

fn string_enum(values: &[&str], description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "string", "enum": values, "description": description })
}

fn string_list(description: &str) -> serde_json::Value {
    serde_json::json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn cell() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "description": "Table cell, when the target is a table",
        "properties": {
            "row": { "type": "integer", "minimum": 0 },
            "column": { "type": "integer", "minimum": 0 }
        },
        "required": ["row", "column"]
    })
}

/// Add optional placement fields (points) to a property map.
fn with_frame(mut properties: serde_json::Value) -> serde_json::Value {
    properties["x"] = number("Left edge in points. Centered when omitted");
    properties["y"] = number("Top edge in points. Centered when omitted");
    properties["width"] = number("Width in points");
    properties["height"] = number("Height in points");
    properties
}

fn with_text_style(mut properties: serde_json::Value) -> serde_json::Value {
    properties["bold"] = boolean("Bold");
    properties["italic"] = boolean("Italic");
    properties["underline"] = boolean("Underline");
    properties["strikethrough"] = boolean("Strikethrough");
    properties["font_size"] = number("Font size in points");
    properties["font_family"] = string("Font family, e.g. 'Arial'");
    properties["foreground_color"] = string("Text color as hex, e.g. '#FF0000'");
    properties["link_url"] = string("Hyperlink target");
    properties
}

/// Operation-specific properties and required fields.
fn operation_schema(kind: OperationKind) -> (serde_json::Value, Vec<&'static str>) {
    use serde_json::json;

    match kind {
        OperationKind::CreateSlide => (
            json!({
                "layout": string_enum(
                    &[
                        "BLANK", "CAPTION_ONLY", "TITLE", "TITLE_AND_BODY",
                        "TITLE_AND_TWO_COLUMNS", "TITLE_ONLY", "SECTION_HEADER",
                        "SECTION_TITLE_AND_DESCRIPTION", "ONE_COLUMN_TEXT", "MAIN_POINT",
                        "BIG_NUMBER",
                    ],
                    "Predefined layout (default BLANK)",
                ),
                "insertion_index": integer("Position to insert at. Appends when omitted"),
                "object_id": string("Object ID for the new slide"),
            }),
            vec![],
        ),
        OperationKind::DuplicateObject => (
            json!({
                "object_id": string("Slide or element to duplicate"),
                "new_object_id": string("Object ID for the copy"),
            }),
            vec!["object_id"],
        ),
        OperationKind::DeleteObject => (
            json!({ "object_id": string("Slide or element to delete") }),
            vec!["object_id"],
        ),
        OperationKind::MoveSlides => (
            json!({
                "slide_object_ids": string_list("Slides to move, in their current order"),
                "insertion_index": integer("Target position"),
            }),
            vec!["slide_object_ids", "insertion_index"],
        ),
        OperationKind::InsertText => (
            json!({
                "object_id": string("Shape or table to insert into"),
                "text": string("Text to insert"),
                "insertion_index": integer("Character index (default 0)"),
                "cell": cell(),
            }),
            vec!["object_id", "text"],
        ),
        OperationKind::DeleteText => (
            json!({
                "object_id": string("Shape or table to delete from"),
                "start_index": integer("Start of the range (inclusive)"),
                "end_index": integer("End of the range (exclusive)"),
                "cell": cell(),
            }),
            vec!["object_id"],
        ),
        OperationKind::ReplaceAllText => (
            json!({
                "find": string("Text to find"),
                "replace": string("Replacement text"),
                "match_case": boolean("Case-sensitive match (default true)"),
                "page_object_ids": string_list("Limit to these slides"),
            }),
            vec!["find", "replace"],
        ),
        OperationKind::FormatText => (
            with_text_style(json!({
                "object_id": string("Shape or table containing the text"),
                "start_index": integer("Start of the range (inclusive)"),
                "end_index": integer("End of the range (exclusive)"),
                "cell": cell(),
            })),
            vec!["object_id"],
        ),
        OperationKind::FormatParagraph => (
            json!({
                "object_id": string("Shape containing the paragraphs"),
                "alignment": string_enum(&["START", "CENTER", "END", "JUSTIFIED"], "Alignment"),
                "line_spacing": number("Line spacing in percent (100 = single)"),
                "start_index": integer("Start of the range (inclusive)"),
                "end_index": integer("End of the range (exclusive)"),
            }),
            vec!["object_id"],
        ),
        OperationKind::CreateShape => (
            with_frame(json!({
                "slide_object_id": string("Slide to place the shape on"),
                "shape_type": string("Shape type, e.g. RECTANGLE, ELLIPSE (default TEXT_BOX)"),
                "object_id": string("Object ID for the new shape"),
                "fill_color": string("Fill color as hex"),
            })),
            vec!["slide_object_id"],
        ),
        OperationKind::AddTextBox => (
            with_text_style(with_frame(json!({
                "slide_object_id": string("Slide to place the text box on"),
                "text": string("Text content"),
                "object_id": string("Object ID for the new text box"),
            }))),
            vec!["slide_object_id", "text"],
        ),
        OperationKind::CreateTable => (
            with_frame(json!({
                "slide_object_id": string("Slide to place the table on"),
                "rows": { "type": "integer", "minimum": 1 },
                "columns": { "type": "integer", "minimum": 1 },
                "data": {
                    "type": "array",
                    "items": { "type": "array", "items": { "type": "string" } },
                    "description": "Row-major cell text"
                },
                "object_id": string("Object ID for the new table"),
            })),
            vec!["slide_object_id", "rows", "columns"],
        ),
        OperationKind::TransformObject => (
            json!({
                "object_id": string("Element to transform"),
                "mode": string_enum(&["relative", "absolute"], "Compose with or replace the current transform"),
                "translate_x": number("Horizontal offset in points"),
                "translate_y": number("Vertical offset in points"),
                "scale_x": number("Horizontal scale factor"),
                "scale_y": number("Vertical scale factor"),
                "rotation": number("Rotation in degrees"),
            }),
            vec!["object_id"],
        ),
        OperationKind::ReorderLayers => (
            json!({
                "object_ids": string_list("Elements to move"),
                "operation": string_enum(
                    &["BRING_TO_FRONT", "BRING_FORWARD", "SEND_BACKWARD", "SEND_TO_BACK"],
                    "Z-order change",
                ),
            }),
            vec!["object_ids", "operation"],
        ),
        OperationKind::DeleteSlideAt => (
            json!({ "position": integer("Zero-based slide position") }),
            vec!["position"],
        ),
        OperationKind::ResizeObject => (
            json!({
                "object_id": string("Element to resize"),
                "width": number("Target width in points"),
                "height": number("Target height in points"),
                "scale": number("Uniform scale factor"),
                "keep_aspect_ratio": boolean("Scale the other side when only one is given (default true)"),
            }),
            vec!["object_id"],
        ),
        OperationKind::SetBackground => (
            json!({
                "slide_object_id": string("Slide to change. All slides when omitted"),
                "color": string("Background color as hex"),
                "image_url": string("Background image URL"),
            }),
            vec![],
        ),
        OperationKind::TranslateText => (
            json!({
                "object_id": string("Shape to translate"),
                "slide_object_id": string("Translate every shape on this slide"),
                "target_language": string("Target language code, e.g. 'de'"),
                "source_language": string("Source language code. Detected when omitted"),
            }),
            vec!["target_language"],
        ),
        OperationKind::AddImage => (
            with_frame(json!({
                "slide_object_id": string("Slide to place the image on"),
                "url": string("Public http(s) image URL"),
                "object_id": string("Object ID for the new image"),
            })),
            vec!["slide_object_id", "url"],
        ),
        OperationKind::AddVideo => (
            with_frame(json!({
                "slide_object_id": string("Slide to place the video on"),
                "video": string("Share URL or video ID"),
                "source": string_enum(&["YOUTUBE", "DRIVE"], "Video source (default YOUTUBE)"),
                "object_id": string("Object ID for the new video"),
            })),
            vec!["slide_object_id", "video"],
        ),
        OperationKind::ReplaceImage => (
            json!({
                "object_id": string("Image to replace"),
                "url": string("Public http(s) URL of the new image"),
                "method": string_enum(&["CENTER_INSIDE", "CENTER_CROP"], "Fit method (default CENTER_INSIDE)"),
            }),
            vec!["object_id", "url"],
        ),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ops::OperationServices;
    use crate::slides::fake::{FakeDocuments, FakeTranslator, test_credentials};

    fn tool(kind: OperationKind, docs: Arc<FakeDocuments>) -> SlidesOperationTool {
        SlidesOperationTool::new(
            kind,
            Arc::new(OperationRegistry::new(OperationServices {
                documents: docs,
                translator: Arc::new(FakeTranslator::default()),
            })),
        )
    }

    #[test]
    fn test_schema_requires_presentation_id() {
        let docs = Arc::new(FakeDocuments::with_slides(&[]));
        for kind in OperationKind::ALL {
            let schema = tool(kind, docs.clone()).parameters_schema();
            assert_eq!(schema["required"][0], "presentation_id", "{}", kind);
            assert!(schema["properties"]["presentation_id"].is_object());
        }
    }

    #[tokio::test]
    async fn test_batchable_kind_runs_as_single_call() {
        let docs = Arc::new(FakeDocuments::with_slides(&["s_0"]));
        docs.push_replies(vec![serde_json::json!({ "createSlide": { "objectId": "new_slide" } })]);
        let ctx = ToolContext::new(test_credentials());

        let output = tool(OperationKind::CreateSlide, docs.clone())
            .execute(
                serde_json::json!({ "presentation_id": "deck1", "layout": "TITLE" }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(output.result, serde_json::json!({ "object_id": "new_slide" }));
        let batches = docs.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].presentation_id, "deck1");
        assert_eq!(docs.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_insert_skips_the_call() {
        let docs = Arc::new(FakeDocuments::with_slides(&["s_0"]));
        let ctx = ToolContext::new(test_credentials());

        let output = tool(OperationKind::InsertText, docs.clone())
            .execute(
                serde_json::json!({ "presentation_id": "deck1", "object_id": "box_1", "text": "" }),
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(output.result, serde_json::json!({ "applied": false }));
        assert!(docs.batches().is_empty());
    }

    #[tokio::test]
    async fn test_missing_presentation_id() {
        let docs = Arc::new(FakeDocuments::with_slides(&[]));
        let ctx = ToolContext::new(test_credentials());

        let err = tool(OperationKind::DeleteObject, docs)
            .execute(serde_json::json!({ "object_id": "shape_1" }), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }
}
