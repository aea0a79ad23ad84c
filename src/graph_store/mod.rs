//! Property graph storage seen through the three diagram queries.
//!
//! Query results are rows of loosely typed values, the same shape a property graph
//! driver hands back: nodes with a label set and a property map, relationships with a
//! type and endpoint ids, and nulls for unmatched optional patterns.

pub mod memory;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GraphResult;

pub use memory::InMemoryGraph;

pub const LABEL_SYSTEM: &str = "System";
pub const LABEL_COMPONENT: &str = "Component";
pub const LABEL_API: &str = "API";

pub const REL_CONTAINS: &str = "CONTAINS";
pub const REL_DEPENDS_ON: &str = "DEPENDS_ON";
pub const REL_CONSUMES: &str = "CONSUMES";
pub const REL_PROVIDES: &str = "PROVIDES";

/// Untyped node or relationship properties
pub type Properties = IndexMap<String, Value>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GraphNode {
    pub element_id: String,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl GraphNode {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Property rendered as a string; missing and null properties read as empty.
    pub fn property_string(&self, key: &str) -> String {
        property_string(&self.properties, key)
    }

    pub fn name(&self) -> String {
        self.property_string("name")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GraphRelationship {
    pub element_id: String,
    pub start_element_id: String,
    pub end_element_id: String,
    pub rel_type: String,
    pub properties: Properties,
}

impl GraphRelationship {
    /// The endpoint opposite to `element_id`, if the relationship touches it.
    pub fn other_end(&self, element_id: &str) -> Option<&str> {
        if self.start_element_id == element_id {
            Some(&self.end_element_id)
        } else if self.end_element_id == element_id {
            Some(&self.start_element_id)
        } else {
            None
        }
    }
}

/// A single value of a result row
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum GraphValue {
    Node(GraphNode),
    Relationship(GraphRelationship),
    Null,
}

pub type Row = Vec<GraphValue>;

pub fn property_string(properties: &Properties, key: &str) -> String {
    match properties.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// The queries the diagram pipeline issues against the graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// All systems, together with every relationship between two systems.
    async fn system_landscape(&self) -> GraphResult<Vec<Row>>;

    /// Component-to-component dependencies with their containing systems and the
    /// external systems and persons the contained components depend on.
    async fn system_landscape_containers(&self) -> GraphResult<Vec<Row>>;

    /// Containment, dependency and person/external edges of the system named `name`.
    async fn system_containers(&self, name: &str) -> GraphResult<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_string_reads_missing_and_null_as_empty() {
        let mut properties = Properties::new();
        properties.insert("title".to_string(), Value::Null);
        properties.insert("size".to_string(), json!(3));
        properties.insert("name".to_string(), json!("billing"));

        assert_eq!(property_string(&properties, "title"), "");
        assert_eq!(property_string(&properties, "missing"), "");
        assert_eq!(property_string(&properties, "size"), "3");
        assert_eq!(property_string(&properties, "name"), "billing");
    }

    #[test]
    fn relationship_other_end() {
        let rel = GraphRelationship {
            element_id: "r1".to_string(),
            start_element_id: "a".to_string(),
            end_element_id: "b".to_string(),
            rel_type: REL_DEPENDS_ON.to_string(),
            properties: Properties::new(),
        };

        assert_eq!(rel.other_end("a"), Some("b"));
        assert_eq!(rel.other_end("b"), Some("a"));
        assert_eq!(rel.other_end("c"), None);
    }
}
