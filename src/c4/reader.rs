//! Decodes graph result values into diagram records.
//!
//! Query shapes differ per diagram; any value that is neither a system node, a
//! component node nor a relationship is skipped.

use serde_json::Value;

use super::model::{Container, Relation, System};
use super::tables::DiagramTables;
use crate::graph_store::{GraphNode, GraphRelationship, GraphValue, LABEL_COMPONENT, LABEL_SYSTEM};

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedElement {
    System(System),
    Container(Container),
    Relation {
        relation: Relation,
        rel_type: String,
    },
    Unrecognized,
}

/// Strips the characters PlantUML does not accept in element identifiers.
pub fn as_id(element_id: &str) -> String {
    element_id.replace([':', '-'], "")
}

pub fn classify(value: &GraphValue, tables: &DiagramTables) -> DecodedElement {
    match value {
        GraphValue::Relationship(rel) => DecodedElement::Relation {
            relation: read_relation(rel, tables),
            rel_type: rel.rel_type.clone(),
        },
        GraphValue::Node(node) if node.has_label(LABEL_SYSTEM) => {
            DecodedElement::System(read_system(node))
        }
        GraphValue::Node(node) if node.has_label(LABEL_COMPONENT) => {
            DecodedElement::Container(read_container(node))
        }
        _ => DecodedElement::Unrecognized,
    }
}

pub fn read_system(node: &GraphNode) -> System {
    let mut system = System {
        id: as_id(&node.element_id),
        label: node.name(),
        title: node.property_string("title"),
        description: node.property_string("description"),
        system_type: node.property_string("type"),
        technology: node.property_string("technology"),
        ..Default::default()
    };

    if system.title.is_empty() {
        system.title = system.label.clone();
    }

    // The lifecycle always becomes a tag; the tag whitelist hides it when rendering.
    system.add_tag(node.property_string("lifecycle"));

    system
}

pub fn read_container(node: &GraphNode) -> Container {
    let mut container = Container {
        id: as_id(&node.element_id),
        label: node.name(),
        title: node.property_string("title"),
        description: node.property_string("description"),
        technology: node.property_string("technology"),
        container_type: node.property_string("type"),
        system: node.property_string("system"),
        tags: read_tags(node.property("tags")),
    };

    if container.title.is_empty() {
        container.title = container.label.clone();
    }

    container.add_tag(node.property_string("lifecycle"));

    container
}

fn read_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

pub fn read_relation(rel: &GraphRelationship, tables: &DiagramTables) -> Relation {
    Relation {
        source_id: as_id(&rel.start_element_id),
        target_id: as_id(&rel.end_element_id),
        label: tables.relation_label(&rel.rel_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_store::Properties;
    use serde_json::json;

    fn node(labels: &[&str], properties: Value) -> GraphNode {
        let properties: Properties = match properties {
            Value::Object(map) => map.into_iter().collect(),
            _ => Properties::new(),
        };
        GraphNode {
            element_id: "4:0e4c-77:12".to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties,
        }
    }

    #[test]
    fn as_id_strips_colons_and_dashes() {
        assert_eq!(as_id("4:a1b2-c3d4:17"), "4a1b2c3d417");
        assert_eq!(as_id("plain"), "plain");
    }

    #[test]
    fn reads_system_node() {
        let tables = DiagramTables::default();
        let value = GraphValue::Node(node(
            &["System"],
            json!({
                "name": "billing",
                "title": "Billing",
                "description": "Invoices customers",
                "type": "product",
                "lifecycle": "experimental",
            }),
        ));

        let DecodedElement::System(system) = classify(&value, &tables) else {
            panic!("expected a system");
        };
        assert_eq!(system.id, "40e4c7712");
        assert_eq!(system.label, "billing");
        assert_eq!(system.title, "Billing");
        assert_eq!(system.description, "Invoices customers");
        assert_eq!(system.system_type, "product");
        assert_eq!(system.tags, vec!["experimental".to_string()]);
    }

    #[test]
    fn system_title_falls_back_to_name() {
        let system = read_system(&node(&["System"], json!({"name": "billing", "title": ""})));
        assert_eq!(system.title, "billing");

        let system = read_system(&node(&["System"], json!({"name": "billing"})));
        assert_eq!(system.title, "billing");
    }

    #[test]
    fn missing_lifecycle_still_adds_a_tag() {
        let system = read_system(&node(&["System"], json!({"name": "billing"})));
        assert_eq!(system.tags, vec![String::new()]);
    }

    #[test]
    fn reads_container_node_with_tags() {
        let tables = DiagramTables::default();
        let value = GraphValue::Node(node(
            &["Component"],
            json!({
                "name": "billing-db",
                "system": "billing",
                "type": "database",
                "tags": ["oracle", "deprecated"],
                "lifecycle": "production",
            }),
        ));

        let DecodedElement::Container(container) = classify(&value, &tables) else {
            panic!("expected a container");
        };
        assert_eq!(container.label, "billing-db");
        assert_eq!(container.title, "billing-db");
        assert_eq!(container.system, "billing");
        assert!(container.is_database());
        assert_eq!(container.tags, vec!["oracle", "deprecated", "production"]);
        assert_eq!(container.as_tags(&tables), "deprecated");
        assert_eq!(container.sprite(&tables), "oracle_original");
    }

    #[test]
    fn reads_relationship_with_rewritten_label() {
        let tables = DiagramTables::default();
        let rel = GraphRelationship {
            element_id: "5:x:1".to_string(),
            start_element_id: "4:ab-cd:1".to_string(),
            end_element_id: "4:ab-cd:2".to_string(),
            rel_type: "DEPENDS_ON".to_string(),
            properties: Properties::new(),
        };

        let decoded = classify(&GraphValue::Relationship(rel), &tables);
        assert_eq!(
            decoded,
            DecodedElement::Relation {
                relation: Relation {
                    source_id: "4abcd1".to_string(),
                    target_id: "4abcd2".to_string(),
                    label: "depends on".to_string(),
                },
                rel_type: "DEPENDS_ON".to_string(),
            }
        );
    }

    #[test]
    fn unknown_values_are_unrecognized() {
        let tables = DiagramTables::default();
        let api = GraphValue::Node(node(&["API"], json!({"name": "billing-api"})));

        assert_eq!(classify(&api, &tables), DecodedElement::Unrecognized);
        assert_eq!(classify(&GraphValue::Null, &tables), DecodedElement::Unrecognized);
    }
}
