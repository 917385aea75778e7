use serde::Deserialize;

use crate::ops::units::{
    Frame, created_object_id, object_id_or_new, replies_for, validate_object_id,
};
use crate::ops::{CompileContext, CompiledRequests, Params, ValidationError};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTableParams {
    pub slide_object_id: String,
    pub rows: u32,
    pub columns: u32,
    /// Row-major cell text. May be shorter than the table.
    #[serde(default)]
    pub data: Vec<Vec<String>>,
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

impl Params for CreateTableParams {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_object_id(&self.slide_object_id)?;
        if self.rows == 0 || self.columns == 0 {
            return Err(ValidationError::Invalid(
                "rows and columns must be at least 1".to_string(),
            ));
        }
        if self.data.len() > self.rows as usize {
            return Err(ValidationError::Invalid(format!(
                "data has {} rows, table has {}",
                self.data.len(),
                self.rows
            )));
        }
        if let Some((i, row)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() > self.columns as usize)
        {
            return Err(ValidationError::Invalid(format!(
                "data row {} has {} cells, table has {} columns",
                i,
                row.len(),
                self.columns
            )));
        }
        Ok(())
    }
}

pub fn compile_create_table(
    p: CreateTableParams,
    ctx: &CompileContext<'_>,
) -> Result<CompiledRequests, ValidationError> {
    let frame = Frame::resolve(ctx.document.page_size_pt(), p.x, p.y, p.width, p.height)?;
    let object_id = object_id_or_new(p.object_id.as_deref())?;

    let mut requests = vec![serde_json::json!({
        "createTable": {
            "objectId": object_id,
            "elementProperties": frame.element_properties(&p.slide_object_id),
            "rows": p.rows,
            "columns": p.columns,
        }
    })];

    for (row, cells) in p.data.iter().enumerate() {
        for (column, text) in cells.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            requests.push(serde_json::json!({
                "insertText": {
                    "objectId": object_id,
                    "cellLocation": { "rowIndex": row, "columnIndex": column },
                    "text": text,
                    "insertionIndex": 0,
                }
            }));
        }
    }

    let count = requests.len();
    let (rows, columns) = (p.rows, p.columns);
    Ok(CompiledRequests::new(requests, move |replies, offset| {
        let own = replies_for(replies, offset, count)?;
        Ok(serde_json::json!({
            "object_id": created_object_id(&own[0], "createTable", &object_id),
            "rows": rows,
            "columns": columns,
        }))
    }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ops::parse_params;
    use crate::slides::Presentation;

    #[test]
    fn test_table_fills_non_empty_cells() {
        let deck = Presentation::default();
        let ctx = CompileContext {
            presentation_id: "deck1",
            document: &deck,
        };
        let compiled = compile_create_table(
            parse_params(&serde_json::json!({
                "slide_object_id": "slide_1",
                "object_id": "table_01",
                "rows": 2,
                "columns": 2,
                "data": [["Region", "Revenue"], ["", "42"]]
            }))
            .unwrap(),
            &ctx,
        )
        .unwrap();

        assert_eq!(compiled.requests.len(), 4);
        assert_eq!(
            compiled.requests[3]["insertText"]["cellLocation"],
            serde_json::json!({ "rowIndex": 1, "columnIndex": 1 })
        );

        let replies = vec![
            serde_json::json!({ "createTable": { "objectId": "table_01" } }),
            serde_json::json!({}),
            serde_json::json!({}),
            serde_json::json!({}),
        ];
        assert_eq!(
            (compiled.extractor)(&replies, 0).unwrap(),
            serde_json::json!({ "object_id": "table_01", "rows": 2, "columns": 2 })
        );
    }

    #[test]
    fn test_data_must_fit_grid() {
        let err = parse_params::<CreateTableParams>(&serde_json::json!({
            "slide_object_id": "slide_1",
            "rows": 1,
            "columns": 1,
            "data": [["a", "b"]]
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid(_)));

        assert!(
            parse_params::<CreateTableParams>(&serde_json::json!({
                "slide_object_id": "slide_1",
                "rows": 0,
                "columns": 3
            }))
            .is_err()
        );
    }
}
