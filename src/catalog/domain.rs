use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CatalogError;
use crate::graph_store::{LABEL_API, LABEL_COMPONENT, LABEL_SYSTEM};

/// Fields shared by every catalog entity.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EntityEnvelope {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub kind: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub lifecycle: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct System {
    #[serde(flatten)]
    pub envelope: EntityEnvelope,
    #[serde(rename = "dependsOn")]
    pub depends_on: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Container {
    #[serde(flatten)]
    pub envelope: EntityEnvelope,
    pub system: String,
    #[serde(rename = "consumesAPIs")]
    pub consumes_apis: Vec<String>,
    #[serde(rename = "dependsOn")]
    pub depends_on: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Api {
    #[serde(flatten)]
    pub envelope: EntityEnvelope,
    pub system: String,
}

/// A catalog entity ready to be written to the graph.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogEntity {
    System(System),
    Container(Container),
    Api(Api),
}

impl CatalogEntity {
    pub fn envelope(&self) -> &EntityEnvelope {
        match self {
            CatalogEntity::System(s) => &s.envelope,
            CatalogEntity::Container(c) => &c.envelope,
            CatalogEntity::Api(a) => &a.envelope,
        }
    }

    pub fn name(&self) -> &str {
        &self.envelope().name
    }
}

/// A `dependsOn` reference: `kind:name`, or a bare component name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependsOn {
    pub label: &'static str,
    pub name: String,
}

fn label_for_kind(kind: &str) -> Option<&'static str> {
    match kind {
        "system" => Some(LABEL_SYSTEM),
        "component" => Some(LABEL_COMPONENT),
        "api" => Some(LABEL_API),
        _ => None,
    }
}

impl FromStr for DependsOn {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, name)) => {
                let label = label_for_kind(kind)
                    .ok_or_else(|| CatalogError::UnknownDependsOn(kind.to_string()))?;
                Ok(DependsOn {
                    label,
                    name: name.to_string(),
                })
            }
            None => Ok(DependsOn {
                label: LABEL_COMPONENT,
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DependsOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.label, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_depends_on_system() {
        let d: DependsOn = "system:my-system".parse().unwrap();
        assert_eq!(d.label, "System");
        assert_eq!(d.name, "my-system");
    }

    #[test]
    fn parse_depends_on_component() {
        let d: DependsOn = "component:my-component".parse().unwrap();
        assert_eq!(d.label, "Component");
        assert_eq!(d.name, "my-component");
    }

    #[test]
    fn parse_depends_on_without_kind() {
        let d: DependsOn = "my-component".parse().unwrap();
        assert_eq!(d.label, "Component");
        assert_eq!(d.name, "my-component");
    }

    #[test]
    fn parse_depends_on_api() {
        let d: DependsOn = "api:my-api".parse().unwrap();
        assert_eq!(d.label, "API");
        assert_eq!(d.name, "my-api");
    }

    #[test]
    fn parse_depends_on_invalid() {
        let err = "invalid:my-api".parse::<DependsOn>().unwrap_err();
        assert_eq!(err.to_string(), "unknown depends on invalid");
    }

    #[test]
    fn parse_depends_on_keeps_rest_of_name() {
        let d: DependsOn = "component:default:billing".parse().unwrap();
        assert_eq!(d.name, "default:billing");
    }

    #[test]
    fn system_serializes_flat() {
        let system = System {
            envelope: EntityEnvelope {
                id: "4:abc:1".to_string(),
                name: "billing".to_string(),
                title: "Billing".to_string(),
                ..Default::default()
            },
            depends_on: vec!["system:payments".to_string()],
        };

        let value = serde_json::to_value(&system).unwrap();
        assert_eq!(value["name"], "billing");
        assert_eq!(value["title"], "Billing");
        assert_eq!(value["type"], "");
        assert_eq!(value["dependsOn"][0], "system:payments");
    }
}
