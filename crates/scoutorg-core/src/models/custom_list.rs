use serde::{Deserialize, Serialize};

use crate::store::Indexed;

/// A custom list maintained in the provider. Indexed by id and by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomList {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub member_ids: Vec<i64>,
}

impl Indexed for CustomList {
    fn id(&self) -> i64 {
        self.id
    }

    fn index_name(&self) -> &str {
        &self.title
    }
}
