//! Text editing, styling and translation.

use serde::Deserialize;

use crate::context::ToolContext;
use crate::ops::units::{
    Frame, created_object_id, object_id_or_new, opaque_color, replies_for, require_non_empty,
    text_range, validate_object_id,
};
use crate::ops::{
    CompileContext, CompiledRequests, OperationServices, Params, ValidationError, apply,
};
use crate::slides::document::PageElement;
use crate::tools::ToolError;

/// A table cell addressed by row and column.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CellLocation {
    pub row: u32,
    pub column: u32,
}

impl CellLocation {
    fn to_wire(self) -> serde_json::Value {
        serde_json::json!({ "rowIndex": self.row, "columnIndex": self.column })
    }
}

/// Character styling shared by `format_text` and `add_text_box`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextStyleParams {
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub strikethrough: Option<bool>,
    /// Font size in points.
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_family: Option<String>,
    /// Hex color, e.g. `#FF0000`.
    #[serde(default)]
    pub foreground_color: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
}

impl TextStyleParams {
    /// The `style` object and its field mask. Empty when nothing is set.
    fn build(&self) -> Result<(serde_json::Value, Vec<&'static str>), ValidationError> {
        let mut style = serde_json::json!({});
        let mut fields = Vec::new();

        if let Some(b) = self.bold {
            style["bold"] = serde_json::Value::Bool(b);
            fields.push("bold");
        }
        if let Some(i) = self.italic {
            style["italic"] = serde_json::Value::Bool(i);
            fields.push("italic");
        }
        if let Some(u) = self.underline {
            style["underline"] = serde_json::Value::Bool(u);
            fields.push("underline");
        }
        if let Some(s) = self.strikethrough {
            style["strikethrough"] = serde_json::Value::Bool(s);
            fields.push("strikethrough");
        }
        if let Some(size) = self.font_size {
            if !(size.is_finite() && size > 0.0) {
                return Err(ValidationError::Invalid(
                    "font_size must be a positive number".to_string(),
                ));
            }
            style["fontSize"] = serde_json::json!({ "magnitude": size, "unit": "PT" });
            fields.push("fontSize");
        }
        if let Some(family) = &self.font_family {
            require_non_empty("font_family", family)?;
            style["fontFamily"] = serde_json::Value::String(family.clone());
            fields.push("fontFamily");
        }
        if let Some(color) = &self.foreground_color {
            style["foregroundColor"] = opaque_color(color)?;
            fields.push("foregroundColor");
        }
        if let Some(url) = &self.link_url {
            require_non_empty("link_url", url)?;
            style["link"] = serde_json::json!({ "url": url });
            fields.push("link");
        }

        Ok((style, fields))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertTextParams {
    pub object_id: String,
    pub text: String,
    /// Character index to insert at. Defaults to the start.
    #[serde(default)]
    pub insertion_index: u32,
    /// Target cell when `object_id` is a table.
    #[serde(default)]
    pub cell: Option<CellLocation>,
}

impl Params for InsertTextParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)
    }
}

pub fn compile_insert_text(p: InsertTextParams) -> Result<CompiledRequests, ValidationError> {
    if p.text.is_empty() {
        return Ok(CompiledRequests::new(Vec::new(), move |_, _| {
            Ok(serde_json::json!({ "object_id": p.object_id, "inserted_characters": 0 }))
        }));
    }

    let mut request = serde_json::json!({
        "insertText": {
            "objectId": p.object_id,
            "text": p.text,
            "insertionIndex": p.insertion_index,
        }
    });
    if let Some(cell) = p.cell {
        request["insertText"]["cellLocation"] = cell.to_wire();
    }

    let inserted = p.text.chars().count();
    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({
            "object_id": p.object_id,
            "inserted_characters": inserted,
        }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTextParams {
    pub object_id: String,
    #[serde(default)]
    pub start_index: Option<i64>,
    #[serde(default)]
    pub end_index: Option<i64>,
    #[serde(default)]
    pub cell: Option<CellLocation>,
}

impl Params for DeleteTextParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)?;
        text_range(self.start_index, self.end_index).map(|_| ())
    }
}

pub fn compile_delete_text(p: DeleteTextParams) -> Result<CompiledRequests, ValidationError> {
    let mut request = serde_json::json!({
        "deleteText": {
            "objectId": p.object_id,
            "textRange": text_range(p.start_index, p.end_index)?,
        }
    });
    if let Some(cell) = p.cell {
        request["deleteText"]["cellLocation"] = cell.to_wire();
    }

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({ "object_id": p.object_id }))
    }))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceAllTextParams {
    pub find: String,
    pub replace: String,
    #[serde(default = "default_true")]
    pub match_case: bool,
    /// Restrict the replacement to these slides.
    #[serde(default)]
    pub page_object_ids: Vec<String>,
}

impl Params for ReplaceAllTextParams {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.find.is_empty() {
            return Err(ValidationError::Invalid("'find' must not be empty".to_string()));
        }
        Ok(())
    }
}

pub fn compile_replace_all_text(
    p: ReplaceAllTextParams,
) -> Result<CompiledRequests, ValidationError> {
    let mut request = serde_json::json!({
        "replaceAllText": {
            "containsText": { "text": p.find, "matchCase": p.match_case },
            "replaceText": p.replace,
        }
    });
    if !p.page_object_ids.is_empty() {
        request["replaceAllText"]["pageObjectIds"] = serde_json::json!(p.page_object_ids);
    }

    Ok(CompiledRequests::new(vec![request], |replies, offset| {
        let reply = &replies_for(replies, offset, 1)?[0];
        let occurrences = reply["replaceAllText"]["occurrencesChanged"]
            .as_i64()
            .unwrap_or(0);
        Ok(serde_json::json!({ "occurrences_changed": occurrences }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatTextParams {
    pub object_id: String,
    #[serde(default)]
    pub start_index: Option<i64>,
    #[serde(default)]
    pub end_index: Option<i64>,
    #[serde(default)]
    pub cell: Option<CellLocation>,
    #[serde(flatten)]
    pub style: TextStyleParams,
}

impl Params for FormatTextParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)?;
        text_range(self.start_index, self.end_index)?;
        let (_, fields) = self.style.build()?;
        if fields.is_empty() {
            return Err(ValidationError::Invalid(
                "no formatting options specified".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn compile_format_text(p: FormatTextParams) -> Result<CompiledRequests, ValidationError> {
    let (style, fields) = p.style.build()?;
    let fields = fields.join(",");

    let mut request = serde_json::json!({
        "updateTextStyle": {
            "objectId": p.object_id,
            "textRange": text_range(p.start_index, p.end_index)?,
            "style": style,
            "fields": fields,
        }
    });
    if let Some(cell) = p.cell {
        request["updateTextStyle"]["cellLocation"] = cell.to_wire();
    }

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({ "object_id": p.object_id, "fields": fields }))
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    Start,
    Center,
    End,
    Justified,
}

impl Alignment {
    fn as_str(&self) -> &'static str {
        match self {
            Alignment::Start => "START",
            Alignment::Center => "CENTER",
            Alignment::End => "END",
            Alignment::Justified => "JUSTIFIED",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormatParagraphParams {
    pub object_id: String,
    #[serde(default)]
    pub alignment: Option<Alignment>,
    /// Line spacing as a percentage of normal (100 = single).
    #[serde(default)]
    pub line_spacing: Option<f64>,
    #[serde(default)]
    pub start_index: Option<i64>,
    #[serde(default)]
    pub end_index: Option<i64>,
}

impl Params for FormatParagraphParams {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("object_id", &self.object_id)?;
        text_range(self.start_index, self.end_index)?;
        if self.alignment.is_none() && self.line_spacing.is_none() {
            return Err(ValidationError::Invalid(
                "one of 'alignment' or 'line_spacing' is required".to_string(),
            ));
        }
        if let Some(spacing) = self.line_spacing {
            if !(spacing.is_finite() && spacing > 0.0) {
                return Err(ValidationError::Invalid(
                    "line_spacing must be a positive number".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub fn compile_format_paragraph(
    p: FormatParagraphParams,
) -> Result<CompiledRequests, ValidationError> {
    let mut style = serde_json::json!({});
    let mut fields = Vec::new();
    if let Some(alignment) = p.alignment {
        style["alignment"] = serde_json::json!(alignment.as_str());
        fields.push("alignment");
    }
    if let Some(spacing) = p.line_spacing {
        style["lineSpacing"] = serde_json::json!(spacing);
        fields.push("lineSpacing");
    }

    let request = serde_json::json!({
        "updateParagraphStyle": {
            "objectId": p.object_id,
            "textRange": text_range(p.start_index, p.end_index)?,
            "style": style,
            "fields": fields.join(","),
        }
    });

    Ok(CompiledRequests::new(vec![request], move |replies, offset| {
        replies_for(replies, offset, 1)?;
        Ok(serde_json::json!({ "object_id": p.object_id }))
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTextBoxParams {
    pub slide_object_id: String,
    pub text: String,
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
    #[serde(flatten)]
    pub style: TextStyleParams,
}

impl Params for AddTextBoxParams {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.slide_object_id)?;
        if self.text.is_empty() {
            return Err(ValidationError::Invalid("'text' must not be empty".to_string()));
        }
        self.style.build().map(|_| ())
    }
}

pub fn compile_add_text_box(
    p: AddTextBoxParams,
    ctx: &CompileContext<'_>,
) -> Result<CompiledRequests, ValidationError> {
    let frame = Frame::resolve(ctx.document.page_size_pt(), p.x, p.y, p.width, p.height)?;
    let object_id = object_id_or_new(p.object_id.as_deref())?;

    let mut requests = vec![
        serde_json::json!({
            "createShape": {
                "objectId": object_id,
                "shapeType": "TEXT_BOX",
                "elementProperties": frame.element_properties(&p.slide_object_id),
            }
        }),
        serde_json::json!({
            "insertText": {
                "objectId": object_id,
                "text": p.text,
                "insertionIndex": 0,
            }
        }),
    ];

    let (style, fields) = p.style.build()?;
    if !fields.is_empty() {
        requests.push(serde_json::json!({
            "updateTextStyle": {
                "objectId": object_id,
                "textRange": { "type": "ALL" },
                "style": style,
                "fields": fields.join(","),
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

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateTextParams {
    /// A single shape to translate.
    #[serde(default)]
    pub object_id: Option<String>,
    /// Every text-bearing shape on this slide.
    #[serde(default)]
    pub slide_object_id: Option<String>,
    pub target_language: String,
    #[serde(default)]
    pub source_language: Option<String>,
}

impl Params for TranslateTextParams {
    fn validate(&self) -> Result<(), ValidationError> {
        match (&self.object_id, &self.slide_object_id) {
            (Some(id), None) | (None, Some(id)) => require_non_empty("object_id", id)?,
            _ => {
                return Err(ValidationError::Invalid(
                    "exactly one of 'object_id' or 'slide_object_id' is required".to_string(),
                ));
            }
        }
        require_non_empty("target_language", &self.target_language)
    }
}

fn collect_text<'a>(elements: &'a [PageElement], out: &mut Vec<(&'a str, String)>) {
    for element in elements {
        if let Some(text) = element.text() {
            out.push((element.object_id.as_str(), text));
        }
        if let Some(group) = &element.element_group {
            collect_text(&group.children, out);
        }
    }
}

/// Replace the text of one shape, or of every shape on a slide, with its
/// translation.
pub async fn translate_text(
    services: &OperationServices,
    presentation_id: &str,
    p: TranslateTextParams,
    ctx: &ToolContext,
) -> Result<serde_json::Value, ToolError> {
    let document = services
        .documents
        .fetch(&ctx.credentials, presentation_id)
        .await?;

    let mut sources: Vec<(&str, String)> = Vec::new();
    match (&p.object_id, &p.slide_object_id) {
        (Some(id), _) => {
            let (_, element) = document
                .find_element(id)
                .ok_or_else(|| ToolError::ObjectNotFound(format!("object '{}' not found", id)))?;
            if let Some(text) = element.text() {
                sources.push((element.object_id.as_str(), text));
            }
        }
        (None, Some(slide_id)) => {
            let slide = document.slide(slide_id).ok_or_else(|| {
                ToolError::ObjectNotFound(format!("slide '{}' not found", slide_id))
            })?;
            collect_text(&slide.page_elements, &mut sources);
        }
        (None, None) => {
            return Err(ToolError::InvalidParameters(
                "exactly one of 'object_id' or 'slide_object_id' is required".to_string(),
            ));
        }
    }

    // Shape text always ends with a newline the API will not let us delete.
    let texts: Vec<String> = sources
        .iter()
        .map(|(_, text)| text.strip_suffix('\n').unwrap_or(text).to_string())
        .collect();
    let (ids, texts): (Vec<&str>, Vec<String>) = sources
        .iter()
        .map(|(id, _)| *id)
        .zip(texts)
        .filter(|(_, text)| !text.trim().is_empty())
        .unzip();

    if ids.is_empty() {
        tracing::debug!("No text to translate");
        return Ok(serde_json::json!({
            "translated_objects": [],
            "target_language": p.target_language,
        }));
    }

    if ctx.is_cancelled() {
        return Err(ToolError::Cancelled);
    }
    let translated = services
        .translator
        .translate(
            &ctx.credentials,
            &texts,
            &p.target_language,
            p.source_language.as_deref(),
        )
        .await?;

    let mut requests = Vec::with_capacity(ids.len() * 2);
    for (id, text) in ids.iter().zip(&translated) {
        requests.push(serde_json::json!({
            "deleteText": { "objectId": id, "textRange": { "type": "ALL" } }
        }));
        if !text.is_empty() {
            requests.push(serde_json::json!({
                "insertText": { "objectId": id, "text": text, "insertionIndex": 0 }
            }));
        }
    }
    apply(services, presentation_id, requests, ctx).await?;

    Ok(serde_json::json!({
        "translated_objects": ids,
        "target_language": p.target_language,
    }))
}
