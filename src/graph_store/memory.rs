use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use super::{
    GraphNode, GraphRelationship, GraphStore, GraphValue, Properties, Row, LABEL_API,
    LABEL_COMPONENT, LABEL_SYSTEM, REL_CONTAINS, REL_DEPENDS_ON,
};
use crate::errors::{GraphError, GraphResult};

pub const SYSTEM_LANDSCAPE_ROW_LIMIT: usize = 3000;
pub const LANDSCAPE_CONTAINER_ROW_LIMIT: usize = 10000;

const KNOWN_LABELS: [&str; 3] = [LABEL_SYSTEM, LABEL_COMPONENT, LABEL_API];

/// Shared in-process property graph.
///
/// Writers take the lock for a whole import so diagram queries never observe a
/// half-linked catalog.
pub struct InMemoryGraph {
    state: RwLock<GraphState>,
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::new(Uuid::new_v4().to_string())),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().await
    }

    pub async fn reset(&self) {
        self.state.write().await.reset();
    }
}

#[derive(Debug)]
pub struct GraphState {
    graph_id: String,
    next_id: u64,
    nodes: IndexMap<String, GraphNode>,
    relationships: Vec<GraphRelationship>,
}

impl GraphState {
    fn new(graph_id: String) -> Self {
        Self {
            graph_id,
            next_id: 0,
            nodes: IndexMap::new(),
            relationships: Vec::new(),
        }
    }

    fn next_element_id(&mut self) -> String {
        self.next_id += 1;
        format!("4:{}:{}", self.graph_id, self.next_id)
    }

    pub fn reset(&mut self) {
        debug!(
            "Resetting graph ({} nodes, {} relationships)",
            self.nodes.len(),
            self.relationships.len()
        );
        self.nodes.clear();
        self.relationships.clear();
    }

    pub fn stats(&self) -> String {
        format!(
            "Nodes: {}, Relationships: {}",
            self.nodes.len(),
            self.relationships.len()
        )
    }

    pub fn node(&self, element_id: &str) -> Option<&GraphNode> {
        self.nodes.get(element_id)
    }

    pub fn nodes_with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a GraphNode> {
        self.nodes.values().filter(move |n| n.has_label(label))
    }

    pub fn find_node(&self, label: &str, name: &str) -> Option<&GraphNode> {
        self.nodes
            .values()
            .find(|n| n.has_label(label) && n.name() == name)
    }

    pub fn relationships_of_type<'a>(
        &'a self,
        rel_type: &'a str,
    ) -> impl Iterator<Item = &'a GraphRelationship> {
        self.relationships.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// Returns the node labelled `label` named `name`, creating it when missing.
    pub fn merge_node(&mut self, label: &str, name: &str) -> GraphResult<String> {
        if !KNOWN_LABELS.contains(&label) {
            return Err(GraphError::InvalidLabel(label.to_string()));
        }

        if let Some(node) = self.find_node(label, name) {
            return Ok(node.element_id.clone());
        }

        let element_id = self.next_element_id();
        let mut properties = Properties::new();
        properties.insert("name".to_string(), Value::String(name.to_string()));
        self.nodes.insert(
            element_id.clone(),
            GraphNode {
                element_id: element_id.clone(),
                labels: vec![label.to_string()],
                properties,
            },
        );
        Ok(element_id)
    }

    pub fn set_properties(&mut self, element_id: &str, properties: Properties) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(element_id)
            .ok_or_else(|| GraphError::NodeNotFound(element_id.to_string()))?;
        node.properties.extend(properties);
        Ok(())
    }

    /// Returns the `start -[rel_type]-> end` relationship, creating it when missing.
    pub fn merge_relationship(
        &mut self,
        start_element_id: &str,
        rel_type: &str,
        end_element_id: &str,
    ) -> GraphResult<String> {
        for id in [start_element_id, end_element_id] {
            if !self.nodes.contains_key(id) {
                return Err(GraphError::NodeNotFound(id.to_string()));
            }
        }

        if let Some(existing) = self.relationships.iter().find(|r| {
            r.rel_type == rel_type
                && r.start_element_id == start_element_id
                && r.end_element_id == end_element_id
        }) {
            return Ok(existing.element_id.clone());
        }

        let element_id = self.next_element_id();
        self.relationships.push(GraphRelationship {
            element_id: element_id.clone(),
            start_element_id: start_element_id.to_string(),
            end_element_id: end_element_id.to_string(),
            rel_type: rel_type.to_string(),
            properties: Properties::new(),
        });
        Ok(element_id)
    }

    pub fn set_relationship_property(
        &mut self,
        element_id: &str,
        key: &str,
        value: Value,
    ) -> GraphResult<()> {
        let rel = self
            .relationships
            .iter_mut()
            .find(|r| r.element_id == element_id)
            .ok_or_else(|| GraphError::NodeNotFound(element_id.to_string()))?;
        rel.properties.insert(key.to_string(), value);
        Ok(())
    }

    fn node_value(&self, element_id: &str) -> GraphValue {
        self.node(element_id)
            .cloned()
            .map(GraphValue::Node)
            .unwrap_or(GraphValue::Null)
    }

    fn is_system_of_type(&self, element_id: &str, system_type: &str) -> bool {
        self.node(element_id)
            .map(|n| n.has_label(LABEL_SYSTEM) && n.property_string("type") == system_type)
            .unwrap_or(false)
    }

    fn has_label(&self, element_id: &str, label: &str) -> bool {
        self.node(element_id).map(|n| n.has_label(label)).unwrap_or(false)
    }

    pub fn system_landscape_rows(&self) -> Vec<Row> {
        let system_ids: HashSet<&str> = self
            .nodes_with_label(LABEL_SYSTEM)
            .map(|n| n.element_id.as_str())
            .collect();

        let mut rows: Vec<Row> = self
            .nodes_with_label(LABEL_SYSTEM)
            .map(|s| vec![GraphValue::Node(s.clone()), GraphValue::Null])
            .collect();

        rows.extend(
            self.relationships
                .iter()
                .filter(|r| {
                    system_ids.contains(r.start_element_id.as_str())
                        && system_ids.contains(r.end_element_id.as_str())
                })
                .map(|r| vec![GraphValue::Null, GraphValue::Relationship(r.clone())]),
        );

        rows.truncate(SYSTEM_LANDSCAPE_ROW_LIMIT);
        rows
    }

    pub fn landscape_container_rows(&self) -> Vec<Row> {
        let component_dependencies: Vec<&GraphRelationship> = self
            .relationships_of_type(REL_DEPENDS_ON)
            .filter(|r| {
                self.has_label(&r.start_element_id, LABEL_COMPONENT)
                    && self.has_label(&r.end_element_id, LABEL_COMPONENT)
            })
            .collect();

        // Without a single component dependency the whole pattern has no match.
        if component_dependencies.is_empty() {
            return Vec::new();
        }

        let mut rows: Vec<Row> = component_dependencies
            .iter()
            .map(|r| {
                vec![
                    self.node_value(&r.start_element_id),
                    GraphValue::Relationship((*r).clone()),
                    self.node_value(&r.end_element_id),
                ]
            })
            .collect();

        for containment in self.relationships_of_type(REL_CONTAINS) {
            let (component_id, system_id) =
                if self.has_label(&containment.start_element_id, LABEL_COMPONENT) {
                    (&containment.start_element_id, &containment.end_element_id)
                } else {
                    (&containment.end_element_id, &containment.start_element_id)
                };
            if !self.has_label(component_id, LABEL_COMPONENT)
                || !self.has_label(system_id, LABEL_SYSTEM)
            {
                continue;
            }

            rows.push(vec![
                self.node_value(component_id),
                GraphValue::Relationship(containment.clone()),
                self.node_value(system_id),
            ]);

            for dependency in self.relationships_of_type(REL_DEPENDS_ON) {
                let Some(other) = dependency.other_end(component_id) else {
                    continue;
                };
                if self.is_system_of_type(other, "external") || self.is_system_of_type(other, "person") {
                    rows.push(vec![
                        self.node_value(component_id),
                        GraphValue::Relationship(dependency.clone()),
                        self.node_value(other),
                    ]);
                }
            }
        }

        rows.truncate(LANDSCAPE_CONTAINER_ROW_LIMIT);
        rows
    }

    pub fn system_container_rows(&self, name: &str) -> Vec<Row> {
        let Some(system) = self.find_node(LABEL_SYSTEM, name) else {
            return Vec::new();
        };

        let contained: Vec<(&GraphRelationship, &str)> = self
            .relationships_of_type(REL_CONTAINS)
            .filter_map(|r| {
                r.other_end(&system.element_id)
                    .filter(|other| self.has_label(other, LABEL_COMPONENT))
                    .map(|other| (r, other))
            })
            .collect();

        let mut rows = Vec::new();
        for (containment, component_id) in &contained {
            rows.push(vec![
                GraphValue::Node(system.clone()),
                GraphValue::Relationship((*containment).clone()),
                self.node_value(component_id),
            ]);
        }

        for (_, component_id) in &contained {
            for dependency in self.relationships_of_type(REL_DEPENDS_ON) {
                let Some(other) = dependency.other_end(component_id) else {
                    continue;
                };
                let Some(other_node) = self.node(other) else {
                    continue;
                };

                // Other systems (external systems and persons included) and sibling
                // components of the same system.
                let sibling = other_node.has_label(LABEL_COMPONENT)
                    && other_node.property_string("system") == name;
                if other_node.has_label(LABEL_SYSTEM) || sibling {
                    rows.push(vec![
                        self.node_value(component_id),
                        GraphValue::Relationship(dependency.clone()),
                        GraphValue::Node(other_node.clone()),
                    ]);
                }
            }
        }

        rows
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn system_landscape(&self) -> GraphResult<Vec<Row>> {
        Ok(self.read().await.system_landscape_rows())
    }

    async fn system_landscape_containers(&self) -> GraphResult<Vec<Row>> {
        Ok(self.read().await.landscape_container_rows())
    }

    async fn system_containers(&self, name: &str) -> GraphResult<Vec<Row>> {
        Ok(self.read().await.system_container_rows(name))
    }
}
