use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tables::DiagramTables;

pub const TYPE_EXTERNAL: &str = "external";
pub const TYPE_PERSON: &str = "person";
pub const TYPE_DATABASE: &str = "database";

/// In-memory architecture model assembled for a single diagram request.
///
/// Systems are partitioned by type into `systems`, `external_systems` and `persons`.
/// Containers are kept flat until [`C4DiagramModel::post_process`] attaches them to
/// their systems.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct C4DiagramModel {
    pub systems: Vec<System>,
    pub external_systems: Vec<System>,
    pub persons: Vec<System>,
    pub containers: Vec<Container>,
    pub relations: Vec<Relation>,
    pub scale: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct System {
    pub id: String,
    pub label: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub system_type: String,
    pub technology: String,
    pub containers: Vec<Container>,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Container {
    pub id: String,
    pub label: String,
    pub title: String,
    pub description: String,
    pub technology: String,
    #[serde(rename = "type")]
    pub container_type: String,
    /// Label of the owning system
    pub system: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Relation {
    pub source_id: String,
    pub target_id: String,
    pub label: String,
}

impl System {
    pub fn is_external(&self) -> bool {
        self.system_type == TYPE_EXTERNAL
    }

    pub fn is_person(&self) -> bool {
        self.system_type == TYPE_PERSON
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn as_tags(&self, tables: &DiagramTables) -> String {
        tables.as_tags(&self.tags)
    }
}

impl Container {
    pub fn is_database(&self) -> bool {
        self.container_type == TYPE_DATABASE
    }

    pub fn is_person(&self) -> bool {
        self.container_type == TYPE_PERSON
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn as_tags(&self, tables: &DiagramTables) -> String {
        tables.as_tags(&self.tags)
    }

    pub fn sprite(&self, tables: &DiagramTables) -> String {
        tables.sprite(&self.tags)
    }
}

impl C4DiagramModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persons and relations alone do not make a diagram.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty() && self.containers.is_empty() && self.external_systems.is_empty()
    }

    pub fn scale_formatted(&self) -> String {
        if self.scale == 0.0 {
            return "1.0".to_string();
        }
        format!("{:.2}", self.scale)
    }

    pub fn add_system(&mut self, system: System) {
        if system.is_person() {
            self.add_person(system);
            return;
        }
        if system.is_external() {
            self.add_external_system(system);
            return;
        }

        if !self.systems.iter().any(|s| s.id == system.id) {
            self.systems.push(system);
        }
    }

    /// Also used for systems that are merely referenced from the diagram's subject,
    /// which may still turn out to be persons.
    pub fn add_external_system(&mut self, system: System) {
        if system.is_person() {
            self.add_person(system);
            return;
        }

        if !self.external_systems.iter().any(|s| s.id == system.id) {
            self.external_systems.push(system);
        }
    }

    pub fn add_person(&mut self, person: System) {
        if !self.persons.iter().any(|p| p.id == person.id) {
            self.persons.push(person);
        }
    }

    pub fn add_container(&mut self, container: Container) {
        if !self.containers.iter().any(|c| c.id == container.id) {
            self.containers.push(container);
        }
    }

    /// First relation per `(source_id, target_id)` wins; later labels are ignored.
    pub fn add_relation(&mut self, relation: Relation) {
        let exists = self
            .relations
            .iter()
            .any(|r| r.source_id == relation.source_id && r.target_id == relation.target_id);
        if !exists {
            self.relations.push(relation);
        }
    }

    /// Attaches every container to each system whose label equals the container's
    /// `system` field.
    ///
    /// Call exactly once, after all inserts: a second call attaches the containers
    /// again.
    pub fn post_process(&mut self) {
        let mut systems_by_label: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, system) in self.systems.iter().enumerate() {
            systems_by_label
                .entry(system.label.clone())
                .or_default()
                .push(idx);
        }

        for container in &self.containers {
            if let Some(indices) = systems_by_label.get(&container.system) {
                for idx in indices {
                    self.systems[*idx].containers.push(container.clone());
                }
            }
        }
    }
}
