use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog entry. Owned by the catalog service; orders only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    /// Text matched by catalog search.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}
