use serde::{Deserialize, Serialize};

/// One key/value pair of a slide's annotation set. Order matters and is
/// preserved by the `position` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPair {
    pub key: String,
    pub value: String,
}
