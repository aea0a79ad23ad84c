use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{Api, CatalogEntity, Container, EntityEnvelope, System};
use crate::errors::{CatalogError, CatalogResult};

/// Component types that become diagram containers.
pub const CONTAINER_TYPES: [&str; 2] = ["service", "database"];

/// A Backstage catalog entity as served by the catalog API or written in
/// `catalog-info.yaml` files.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RawEntity {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub metadata: RawMetadata,
    pub spec: RawSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RawMetadata {
    pub name: String,
    pub title: String,
    pub description: String,
    pub owner: String,
    pub domain: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RawSpec {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub system: String,
    #[serde(rename = "consumesApis")]
    pub consumes_apis: Vec<String>,
    #[serde(rename = "providesApis")]
    pub provides_apis: Vec<String>,
    pub definition: Option<Value>,
    #[serde(rename = "dependsOn")]
    pub depends_on: Vec<String>,
    pub lifecycle: String,
}

impl RawEntity {
    pub fn envelope(&self) -> EntityEnvelope {
        EntityEnvelope {
            id: String::new(),
            name: self.metadata.name.clone(),
            title: self.metadata.title.clone(),
            description: self.metadata.description.clone(),
            kind: self.kind.clone(),
            entity_type: self.spec.entity_type.clone(),
            lifecycle: self.spec.lifecycle.clone(),
            tags: self.metadata.tags.clone(),
        }
    }

    pub fn into_entity(self) -> CatalogResult<CatalogEntity> {
        let envelope = self.envelope();
        match self.kind.as_str() {
            "System" => Ok(CatalogEntity::System(System {
                envelope,
                depends_on: self.spec.depends_on,
            })),
            "Component" => {
                if !CONTAINER_TYPES.contains(&self.spec.entity_type.as_str()) {
                    return Err(CatalogError::UnsupportedComponentType(self.spec.entity_type));
                }
                Ok(CatalogEntity::Container(Container {
                    envelope,
                    system: self.spec.system,
                    consumes_apis: self.spec.consumes_apis,
                    depends_on: self.spec.depends_on,
                }))
            }
            "API" => Ok(CatalogEntity::Api(Api {
                envelope,
                system: self.spec.system,
            })),
            _ => Err(CatalogError::UnsupportedKind(self.kind)),
        }
    }
}
