use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Primitive type tag for a single field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Object,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Object => "object",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping of field name to type tag.
///
/// Insertion order is the source column order and is preserved through
/// serialization. A field name appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: IndexMap<String, FieldType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let mut schema = Self::new();
        for (name, field_type) in fields {
            schema.insert(name, field_type);
        }
        schema
    }

    /// Adds a field, or retypes it in place if the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType) {
        self.fields.insert(name.into(), field_type);
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// External JSON-Schema-like representation used on the wire.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), json!({ "type": ty.as_str() })))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
        })
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_schema().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_keeps_column_order() {
        let schema = Schema::from_fields([
            ("order_id", FieldType::Integer),
            ("product_name", FieldType::String),
            ("price", FieldType::Number),
        ]);

        let value = schema.to_json_schema();
        assert_eq!(value["type"], "object");

        let names: Vec<&String> = value["properties"].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["order_id", "product_name", "price"]);
        assert_eq!(value["properties"]["price"]["type"], "number");
    }

    #[test]
    fn test_insert_existing_field_does_not_duplicate() {
        let mut schema = Schema::new();
        schema.insert("age", FieldType::String);
        schema.insert("age", FieldType::Integer);

        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("age"), Some(FieldType::Integer));
    }

    #[test]
    fn test_empty_schema_serializes_empty_properties() {
        let value = serde_json::to_value(Schema::new()).unwrap();
        assert_eq!(value, json!({ "type": "object", "properties": {} }));
    }
}
