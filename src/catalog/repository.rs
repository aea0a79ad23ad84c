use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use super::domain::{Api, CatalogEntity, Container, DependsOn, EntityEnvelope, System};
use super::paged::{Page, PageParams};
use crate::c4::model::{TYPE_EXTERNAL, TYPE_PERSON};
use crate::errors::CatalogResult;
use crate::graph_store::memory::GraphState;
use crate::graph_store::{
    GraphNode, InMemoryGraph, Properties, LABEL_API, LABEL_COMPONENT, LABEL_SYSTEM, REL_CONSUMES,
    REL_CONTAINS, REL_DEPENDS_ON, REL_PROVIDES,
};

/// Persistence of catalog entities in the architecture graph.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Drops every node and relationship.
    async fn reset(&self) -> CatalogResult<()>;

    /// Internal systems: every system written with a type other than person or external.
    async fn find_systems(&self, params: PageParams) -> CatalogResult<(Vec<System>, Page)>;

    /// Writes all entities and derives the system-level dependencies.
    async fn create_all(&self, entities: Vec<CatalogEntity>) -> CatalogResult<()>;
}

pub struct GraphCatalogRepository {
    graph: Arc<InMemoryGraph>,
}

impl GraphCatalogRepository {
    pub fn new(graph: Arc<InMemoryGraph>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl CatalogRepository for GraphCatalogRepository {
    async fn reset(&self) -> CatalogResult<()> {
        self.graph.reset().await;
        Ok(())
    }

    async fn find_systems(&self, params: PageParams) -> CatalogResult<(Vec<System>, Page)> {
        let params = params.normalized();
        let graph = self.graph.read().await;

        let internal: Vec<&GraphNode> = graph
            .nodes_with_label(LABEL_SYSTEM)
            .filter(|n| match n.property("type") {
                // Systems only referenced through dependsOn or containment carry no type.
                None | Some(Value::Null) => false,
                Some(_) => {
                    let system_type = n.property_string("type");
                    system_type != TYPE_PERSON && system_type != TYPE_EXTERNAL
                }
            })
            .collect();

        let systems: Vec<System> = match params.page.checked_mul(params.size) {
            Some(offset) => internal
                .iter()
                .skip(offset)
                .take(params.size)
                .map(|n| read_system(n))
                .collect(),
            None => Vec::new(),
        };

        Ok((systems, params.page_of_total(internal.len())))
    }

    async fn create_all(&self, entities: Vec<CatalogEntity>) -> CatalogResult<()> {
        // One write lock for the whole import: readers see the old or the new catalog.
        let mut graph = self.graph.write().await;

        for entity in &entities {
            debug!("Writing catalog entity {}", entity.name());
            match entity {
                CatalogEntity::System(system) => write_system(&mut graph, system)?,
                CatalogEntity::Container(container) => write_container(&mut graph, container)?,
                CatalogEntity::Api(api) => write_api(&mut graph, api)?,
            }
        }

        link_consumed_apis(&mut graph)?;
        link_component_dependencies(&mut graph)?;
        link_outgoing_system_dependencies(&mut graph)?;
        link_incoming_system_dependencies(&mut graph)?;

        info!("Created {} catalog entities. {}", entities.len(), graph.stats());
        Ok(())
    }
}

fn read_system(node: &GraphNode) -> System {
    let mut envelope = EntityEnvelope {
        id: node.element_id.clone(),
        name: node.name(),
        title: node.property_string("title"),
        description: node.property_string("description"),
        kind: LABEL_SYSTEM.to_string(),
        entity_type: node.property_string("type"),
        lifecycle: node.property_string("lifecycle"),
        tags: Vec::new(),
    };
    if envelope.title.is_empty() {
        envelope.title = envelope.name.clone();
    }

    System {
        envelope,
        depends_on: Vec::new(),
    }
}

fn properties(pairs: &[(&str, Value)]) -> Properties {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn write_system(graph: &mut GraphState, system: &System) -> CatalogResult<()> {
    let e = &system.envelope;
    let id = graph.merge_node(LABEL_SYSTEM, &e.name)?;
    graph.set_properties(
        &id,
        properties(&[
            ("title", json!(e.title)),
            ("description", json!(e.description)),
            ("type", json!(e.entity_type)),
            ("lifecycle", json!(e.lifecycle)),
        ]),
    )?;

    write_dependencies(graph, &id, &system.depends_on)
}

fn write_container(graph: &mut GraphState, container: &Container) -> CatalogResult<()> {
    let e = &container.envelope;
    let id = graph.merge_node(LABEL_COMPONENT, &e.name)?;
    graph.set_properties(
        &id,
        properties(&[
            ("title", json!(e.title)),
            ("description", json!(e.description)),
            ("system", json!(container.system)),
            ("type", json!(e.entity_type)),
            ("lifecycle", json!(e.lifecycle)),
            ("tags", json!(e.tags)),
        ]),
    )?;

    if !container.system.is_empty() {
        let system_id = graph.merge_node(LABEL_SYSTEM, &container.system)?;
        graph.merge_relationship(&system_id, REL_CONTAINS, &id)?;
    }

    for api in &container.consumes_apis {
        let api_id = graph.merge_node(LABEL_API, api)?;
        graph.merge_relationship(&id, REL_CONSUMES, &api_id)?;
    }

    write_dependencies(graph, &id, &container.depends_on)
}

fn write_api(graph: &mut GraphState, api: &Api) -> CatalogResult<()> {
    let id = graph.merge_node(LABEL_API, &api.envelope.name)?;
    graph.set_properties(
        &id,
        properties(&[
            ("system", json!(api.system)),
            ("lifecycle", json!(api.envelope.lifecycle)),
        ]),
    )?;

    if !api.system.is_empty() {
        let system_id = graph.merge_node(LABEL_SYSTEM, &api.system)?;
        graph.merge_relationship(&system_id, REL_PROVIDES, &id)?;
    }
    Ok(())
}

fn write_dependencies(graph: &mut GraphState, source_id: &str, depends_on: &[String]) -> CatalogResult<()> {
    for reference in depends_on {
        let target: DependsOn = reference.parse()?;
        let target_id = graph.merge_node(target.label, &target.name)?;
        graph.merge_relationship(source_id, REL_DEPENDS_ON, &target_id)?;
    }
    Ok(())
}

fn system_id(graph: &GraphState, name: &str) -> Option<String> {
    graph
        .find_node(LABEL_SYSTEM, name)
        .map(|n| n.element_id.clone())
}

fn property_of(graph: &GraphState, element_id: &str, key: &str) -> String {
    graph
        .node(element_id)
        .map(|n| n.property_string(key))
        .unwrap_or_default()
}

fn is_labelled(graph: &GraphState, element_id: &str, label: &str) -> bool {
    graph
        .node(element_id)
        .map(|n| n.has_label(label))
        .unwrap_or(false)
}

/// A component consuming an API of another system depends on that system, and so
/// does the component's own system.
fn link_consumed_apis(graph: &mut GraphState) -> CatalogResult<()> {
    let mut links = Vec::new();
    for consumes in graph.relationships_of_type(REL_CONSUMES) {
        let component_id = &consumes.start_element_id;
        let api_id = &consumes.end_element_id;
        if !is_labelled(graph, component_id, LABEL_COMPONENT) || !is_labelled(graph, api_id, LABEL_API) {
            continue;
        }

        let component_system = property_of(graph, component_id, "system");
        let api_system = property_of(graph, api_id, "system");
        if component_system == api_system {
            continue;
        }
        let (Some(source_system), Some(target_system)) =
            (system_id(graph, &component_system), system_id(graph, &api_system))
        else {
            continue;
        };

        let api_name = property_of(graph, api_id, "name");
        links.push((source_system, component_id.clone(), target_system, api_name));
    }

    debug!("Linking {} API consumptions", links.len());
    for (source_system, component_id, target_system, api_name) in links {
        for source in [source_system, component_id] {
            let rel = graph.merge_relationship(&source, REL_DEPENDS_ON, &target_system)?;
            graph.set_relationship_property(&rel, "apiName", json!(api_name))?;
        }
    }
    Ok(())
}

/// A dependency between components of different systems is lifted to
/// system-to-component, component-to-system and system-to-system edges.
fn link_component_dependencies(graph: &mut GraphState) -> CatalogResult<()> {
    let mut links = Vec::new();
    for dependency in graph.relationships_of_type(REL_DEPENDS_ON) {
        let source_id = &dependency.start_element_id;
        let target_id = &dependency.end_element_id;
        if !is_labelled(graph, source_id, LABEL_COMPONENT)
            || !is_labelled(graph, target_id, LABEL_COMPONENT)
        {
            continue;
        }

        let source_system = property_of(graph, source_id, "system");
        let target_system = property_of(graph, target_id, "system");
        if source_system == target_system {
            continue;
        }
        let (Some(source_system_id), Some(target_system_id)) =
            (system_id(graph, &source_system), system_id(graph, &target_system))
        else {
            continue;
        };

        links.push((source_system_id.clone(), target_id.clone()));
        links.push((source_id.clone(), target_system_id.clone()));
        links.push((source_system_id, target_system_id));
    }

    debug!("Linking {} cross-system component dependencies", links.len() / 3);
    for (start, end) in links {
        graph.merge_relationship(&start, REL_DEPENDS_ON, &end)?;
    }
    Ok(())
}

/// A component depending on a foreign system makes its own system depend on it.
fn link_outgoing_system_dependencies(graph: &mut GraphState) -> CatalogResult<()> {
    let mut links = Vec::new();
    for dependency in graph.relationships_of_type(REL_DEPENDS_ON) {
        let component_id = &dependency.start_element_id;
        let target_id = &dependency.end_element_id;
        if !is_labelled(graph, component_id, LABEL_COMPONENT)
            || !is_labelled(graph, target_id, LABEL_SYSTEM)
        {
            continue;
        }

        let component_system = property_of(graph, component_id, "system");
        if component_system == property_of(graph, target_id, "name") {
            continue;
        }
        if let Some(source_system_id) = system_id(graph, &component_system) {
            links.push((source_system_id, target_id.clone()));
        }
    }

    for (start, end) in links {
        graph.merge_relationship(&start, REL_DEPENDS_ON, &end)?;
    }
    Ok(())
}

/// A system depending on a foreign component depends on the component's system.
fn link_incoming_system_dependencies(graph: &mut GraphState) -> CatalogResult<()> {
    let mut links = Vec::new();
    for dependency in graph.relationships_of_type(REL_DEPENDS_ON) {
        let system_id_start = &dependency.start_element_id;
        let component_id = &dependency.end_element_id;
        if !is_labelled(graph, system_id_start, LABEL_SYSTEM)
            || !is_labelled(graph, component_id, LABEL_COMPONENT)
        {
            continue;
        }

        let component_system = property_of(graph, component_id, "system");
        if component_system == property_of(graph, system_id_start, "name") {
            continue;
        }
        if let Some(target_system_id) = system_id(graph, &component_system) {
            links.push((system_id_start.clone(), target_system_id));
        }
    }

    for (start, end) in links {
        graph.merge_relationship(&start, REL_DEPENDS_ON, &end)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CatalogError;

    fn envelope(name: &str) -> EntityEnvelope {
        EntityEnvelope {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn system(name: &str, system_type: &str, depends_on: &[&str]) -> CatalogEntity {
        let mut envelope = envelope(name);
        envelope.entity_type = system_type.to_string();
        CatalogEntity::System(System {
            envelope,
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        })
    }

    fn component(name: &str, system: &str, consumes: &[&str], depends_on: &[&str]) -> CatalogEntity {
        let mut envelope = envelope(name);
        envelope.entity_type = "service".to_string();
        envelope.tags = vec!["java".to_string()];
        CatalogEntity::Container(Container {
            envelope,
            system: system.to_string(),
            consumes_apis: consumes.iter().map(|c| c.to_string()).collect(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        })
    }

    fn api(name: &str, system: &str) -> CatalogEntity {
        CatalogEntity::Api(Api {
            envelope: envelope(name),
            system: system.to_string(),
        })
    }

    fn has_dependency(graph: &GraphState, from: (&str, &str), to: (&str, &str)) -> bool {
        let (Some(start), Some(end)) = (graph.find_node(from.0, from.1), graph.find_node(to.0, to.1))
        else {
            return false;
        };
        graph.relationships_of_type(REL_DEPENDS_ON).any(|r| {
            r.start_element_id == start.element_id && r.end_element_id == end.element_id
        })
    }

    fn repository() -> (Arc<InMemoryGraph>, GraphCatalogRepository) {
        let graph = Arc::new(InMemoryGraph::new());
        (graph.clone(), GraphCatalogRepository::new(graph))
    }

    #[tokio::test]
    async fn create_all_writes_nodes_and_containment() {
        let (graph, repo) = repository();
        repo.create_all(vec![
            system("billing", "product", &[]),
            component("billing-api", "billing", &[], &[]),
        ])
        .await
        .unwrap();

        let g = graph.read().await;
        let api = g.find_node(LABEL_COMPONENT, "billing-api").unwrap();
        assert_eq!(api.property_string("system"), "billing");
        assert_eq!(api.property("tags"), Some(&json!(["java"])));
        let billing = g.find_node(LABEL_SYSTEM, "billing").unwrap();
        assert!(g.relationships_of_type(REL_CONTAINS).any(|r| {
            r.start_element_id == billing.element_id && r.end_element_id == api.element_id
        }));
    }

    #[tokio::test]
    async fn consumed_api_of_other_system_links_systems() {
        let (graph, repo) = repository();
        repo.create_all(vec![
            system("billing", "", &[]),
            system("payments", "", &[]),
            component("billing-api", "billing", &["payments-api"], &[]),
            api("payments-api", "payments"),
        ])
        .await
        .unwrap();

        let g = graph.read().await;
        assert!(has_dependency(&g, (LABEL_SYSTEM, "billing"), (LABEL_SYSTEM, "payments")));
        assert!(has_dependency(&g, (LABEL_COMPONENT, "billing-api"), (LABEL_SYSTEM, "payments")));

        let billing = g.find_node(LABEL_SYSTEM, "billing").unwrap();
        let rel = g
            .relationships_of_type(REL_DEPENDS_ON)
            .find(|r| r.start_element_id == billing.element_id)
            .unwrap();
        assert_eq!(rel.properties.get("apiName"), Some(&json!("payments-api")));
        assert!(g.relationships_of_type(REL_PROVIDES).count() == 1);
    }

    #[tokio::test]
    async fn consumed_api_of_same_system_adds_no_dependency() {
        let (graph, repo) = repository();
        repo.create_all(vec![
            component("billing-api", "billing", &["billing-internal"], &[]),
            api("billing-internal", "billing"),
        ])
        .await
        .unwrap();

        assert_eq!(graph.read().await.relationships_of_type(REL_DEPENDS_ON).count(), 0);
    }

    #[tokio::test]
    async fn cross_system_component_dependency_is_lifted() {
        let (graph, repo) = repository();
        repo.create_all(vec![
            component("billing-api", "billing", &[], &["gateway"]),
            component("gateway", "payments", &[], &[]),
        ])
        .await
        .unwrap();

        let g = graph.read().await;
        assert!(has_dependency(&g, (LABEL_SYSTEM, "billing"), (LABEL_COMPONENT, "gateway")));
        assert!(has_dependency(&g, (LABEL_COMPONENT, "billing-api"), (LABEL_SYSTEM, "payments")));
        assert!(has_dependency(&g, (LABEL_SYSTEM, "billing"), (LABEL_SYSTEM, "payments")));
        assert!(!has_dependency(&g, (LABEL_SYSTEM, "payments"), (LABEL_SYSTEM, "billing")));
    }

    #[tokio::test]
    async fn component_dependency_on_external_system_is_lifted() {
        let (graph, repo) = repository();
        repo.create_all(vec![
            system("stripe", "external", &[]),
            component("billing-api", "billing", &[], &["system:stripe"]),
        ])
        .await
        .unwrap();

        let g = graph.read().await;
        assert!(has_dependency(&g, (LABEL_SYSTEM, "billing"), (LABEL_SYSTEM, "stripe")));
    }

    #[tokio::test]
    async fn system_dependency_on_component_is_lifted() {
        let (graph, repo) = repository();
        repo.create_all(vec![
            system("clerk", "person", &["component:billing-api"]),
            component("billing-api", "billing", &[], &[]),
        ])
        .await
        .unwrap();

        let g = graph.read().await;
        assert!(has_dependency(&g, (LABEL_SYSTEM, "clerk"), (LABEL_SYSTEM, "billing")));
    }

    #[tokio::test]
    async fn create_all_is_idempotent() {
        let (graph, repo) = repository();
        let entities = vec![
            system("billing", "", &["system:payments"]),
            component("billing-api", "billing", &["payments-api"], &["gateway"]),
            component("gateway", "payments", &[], &[]),
            api("payments-api", "payments"),
        ];

        repo.create_all(entities.clone()).await.unwrap();
        let first = graph.read().await.stats();
        repo.create_all(entities).await.unwrap();

        assert_eq!(graph.read().await.stats(), first);
    }

    #[tokio::test]
    async fn unknown_dependency_kind_fails() {
        let (_, repo) = repository();
        let err = repo
            .create_all(vec![system("billing", "", &["team:core"])])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDependsOn(kind) if kind == "team"));
    }

    #[tokio::test]
    async fn find_systems_excludes_persons_and_external_systems() {
        let (_, repo) = repository();
        repo.create_all(vec![
            system("billing", "product", &[]),
            system("stripe", "external", &[]),
            system("clerk", "person", &[]),
            component("gateway", "payments", &[], &[]),
        ])
        .await
        .unwrap();

        let (systems, page) = repo.find_systems(PageParams::default()).await.unwrap();
        let names: Vec<&str> = systems.iter().map(|s| s.envelope.name.as_str()).collect();

        // payments was only referenced, so it carries no type at all.
        assert_eq!(names, vec!["billing"]);
        assert_eq!(systems[0].envelope.title, "billing");
        assert_eq!(page, Page { page: 0, size: 50, total: 1 });
    }

    #[tokio::test]
    async fn find_systems_lists_systems_with_an_empty_type() {
        let (_, repo) = repository();
        repo.create_all(vec![system("billing", "", &["system:payments"])])
            .await
            .unwrap();

        let (systems, page) = repo.find_systems(PageParams::default()).await.unwrap();
        let names: Vec<&str> = systems.iter().map(|s| s.envelope.name.as_str()).collect();
        assert_eq!(names, vec!["billing"]);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn find_systems_pages() {
        let (_, repo) = repository();
        repo.create_all(vec![
            system("a", "", &[]),
            system("b", "", &[]),
            system("c", "", &[]),
        ])
        .await
        .unwrap();

        let (systems, page) = repo.find_systems(PageParams::new(1, 2)).await.unwrap();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].envelope.name, "c");
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn find_systems_beyond_addressable_pages_is_empty() {
        let (_, repo) = repository();
        repo.create_all(vec![system("a", "", &[])]).await.unwrap();

        let (systems, page) = repo
            .find_systems(PageParams::new(usize::MAX, 50))
            .await
            .unwrap();
        assert!(systems.is_empty());
        assert_eq!(page.page, usize::MAX);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn reset_clears_the_graph() {
        let (graph, repo) = repository();
        repo.create_all(vec![system("billing", "", &[])]).await.unwrap();
        repo.reset().await.unwrap();

        assert_eq!(graph.read().await.nodes_with_label(LABEL_SYSTEM).count(), 0);
    }
}
