pub mod collapsed;
pub mod json;

use crate::config::TreeConfig;
use crate::model::CallTree;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("json: {0}")]
    Json(#[from] json::JsonParseError),
    #[error("collapsed: {0}")]
    Collapsed(#[from] collapsed::CollapsedParseError),
    #[error("unable to detect format")]
    UnknownFormat,
}

/// Detect the input format and load a call tree from it.
///
/// A JSON object with a `roots` key is a nested call tree export; anything
/// else is tried as folded stack text.
pub fn parse_auto(data: &[u8], config: &TreeConfig) -> Result<CallTree, ParseError> {
    if let Ok(value) = json::from_slice_unbounded::<serde_json::Value>(data) {
        if value.as_object().is_some_and(|o| o.contains_key("roots")) {
            return Ok(json::parse_call_tree_json(data, config)?);
        }
        tracing::debug!("JSON input without `roots`, not a call tree export");
        return Err(ParseError::UnknownFormat);
    }

    match collapsed::parse_collapsed(data, config) {
        Ok(tree) => Ok(tree),
        Err(collapsed::CollapsedParseError::Empty) => Err(ParseError::UnknownFormat),
        Err(e) => Err(e.into()),
    }
}
