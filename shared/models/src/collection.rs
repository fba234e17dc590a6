use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::Schema;

/// Role a schema plays for a collection
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SchemaRole {
    Row,
    Insert,
    Update,
    Upsert,
    Delete,
}

/// A named tabular resource exposed by a connector
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub roles: IndexMap<SchemaRole, Schema>,
}

impl Collection {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            roles: IndexMap::new(),
        }
    }

    pub fn with_role(mut self, role: SchemaRole, schema: Schema) -> Self {
        self.roles.insert(role, schema);
        self
    }

    /// Registers the same schema under every listed role.
    pub fn with_roles(self, roles: &[SchemaRole], schema: &Schema) -> Self {
        roles
            .iter()
            .fold(self, |collection, role| collection.with_role(*role, schema.clone()))
    }

    pub fn schema(&self, role: SchemaRole) -> Option<&Schema> {
        self.roles.get(&role)
    }
}

/// Result of a discover call
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub collections: Vec<Collection>,
}

impl Catalog {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self { collections }
    }

    pub fn get(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.id.as_str()).collect()
    }
}
