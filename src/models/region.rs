use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic / jurisdiction entity a document belongs to.
///
/// Referenced by documents but managed outside the pipeline; the query
/// API looks regions up by their short code (e.g. "UG").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

impl Region {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
        }
    }
}
