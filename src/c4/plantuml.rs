use handlebars::Handlebars;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

use super::model::{C4DiagramModel, Container, System};
use super::tables::DiagramTables;
use crate::errors::DiagramResult;

const CONTEXT_TEMPLATE: &str = "c4_context";
const CONTAINER_TEMPLATE: &str = "c4_container";

/// The two diagram views a model can be rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramView {
    Context,
    Container,
}

impl DiagramView {
    fn template_name(self) -> &'static str {
        match self {
            DiagramView::Context => CONTEXT_TEMPLATE,
            DiagramView::Container => CONTAINER_TEMPLATE,
        }
    }
}

/// Renders diagram models as PlantUML C4 documents.
///
/// Templates are compiled on construction; a broken template fails here, not while
/// serving a request.
pub struct PlantUmlExporter {
    handlebars: Handlebars<'static>,
    tables: Arc<DiagramTables>,
}

impl PlantUmlExporter {
    pub fn new(tables: Arc<DiagramTables>) -> DiagramResult<Self> {
        Self::with_templates(
            tables,
            include_str!("c4_context.hbs"),
            include_str!("c4_container.hbs"),
        )
    }

    pub fn with_templates(
        tables: Arc<DiagramTables>,
        context_template: &str,
        container_template: &str,
    ) -> DiagramResult<Self> {
        let mut handlebars = Handlebars::new();
        // PlantUML source, not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(CONTEXT_TEMPLATE, context_template)?;
        handlebars.register_template_string(CONTAINER_TEMPLATE, container_template)?;

        Ok(Self { handlebars, tables })
    }

    pub fn export<W: Write>(
        &self,
        view: DiagramView,
        model: &C4DiagramModel,
        writer: W,
    ) -> DiagramResult<()> {
        let data = self.template_data(model);
        self.handlebars
            .render_to_write(view.template_name(), &data, writer)?;
        Ok(())
    }

    /// Renders into memory; the templates only emit UTF-8.
    pub fn render(&self, view: DiagramView, model: &C4DiagramModel) -> DiagramResult<String> {
        let mut out = Vec::new();
        self.export(view, model, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn template_data(&self, model: &C4DiagramModel) -> Value {
        json!({
            "scale": model.scale_formatted(),
            "persons": model.persons.iter().map(|s| self.system_data(s)).collect::<Vec<_>>(),
            "external_systems": model
                .external_systems
                .iter()
                .map(|s| self.system_data(s))
                .collect::<Vec<_>>(),
            "systems": model.systems.iter().map(|s| self.system_data(s)).collect::<Vec<_>>(),
            "relations": model.relations,
        })
    }

    fn system_data(&self, system: &System) -> Value {
        // Person-typed containers come from misclassified rows and are never drawn.
        let containers: Vec<Value> = system
            .containers
            .iter()
            .filter(|c| !c.is_person())
            .map(|c| self.container_data(c))
            .collect();

        json!({
            "id": system.id,
            "title": system.title,
            "description": system.description,
            "tags": system.as_tags(&self.tables),
            "containers": containers,
        })
    }

    fn container_data(&self, container: &Container) -> Value {
        let technology = if container.technology.is_empty() {
            &container.label
        } else {
            &container.technology
        };

        json!({
            "id": container.id,
            "title": container.title,
            "technology": technology,
            "description": container.description,
            "tags": container.as_tags(&self.tables),
            "sprite": container.sprite(&self.tables),
            "is_database": container.is_database(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::c4::model::Relation;
    use crate::errors::DiagramError;

    fn exporter() -> PlantUmlExporter {
        PlantUmlExporter::new(Arc::new(DiagramTables::default())).expect("templates to compile")
    }

    fn system(id: &str, title: &str, system_type: &str) -> System {
        System {
            id: id.to_string(),
            label: title.to_string(),
            title: title.to_string(),
            description: format!("{} description", title),
            system_type: system_type.to_string(),
            ..Default::default()
        }
    }

    fn container(id: &str, system: &str, container_type: &str, tags: &[&str]) -> Container {
        Container {
            id: id.to_string(),
            label: id.to_string(),
            title: id.to_string(),
            description: format!("{} description", id),
            container_type: container_type.to_string(),
            system: system.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn landscape() -> C4DiagramModel {
        let mut m = C4DiagramModel::new();
        m.add_system(system("p1", "clerk", "person"));
        m.add_system(system("e1", "stripe", "external"));
        let mut billing = system("s1", "billing", "");
        billing.tags = vec!["deprecated".to_string(), "production".to_string()];
        m.add_system(billing);
        m.add_container(container("api", "billing", "service", &["java", "experimental"]));
        m.add_container(container("db", "billing", "database", &["oracle"]));
        m.add_container(container("ghost", "billing", "person", &[]));
        m.add_relation(Relation {
            source_id: "api".to_string(),
            target_id: "e1".to_string(),
            label: "depends on".to_string(),
        });
        m.post_process();
        m
    }

    #[test]
    fn new_plantuml_exporter() {
        exporter();
    }

    #[test]
    fn export_to_plantuml_context() {
        let e = exporter();
        let mut m = C4DiagramModel::new();
        m.add_system(System {
            title: "my-system".to_string(),
            ..Default::default()
        });

        let mut out = Vec::new();
        e.export(DiagramView::Context, &m, &mut out).expect("context to render");
        let puml = String::from_utf8(out).unwrap();

        assert!(puml.contains("my-system"));
        assert!(puml.contains("System(, \"my-system\", \"\", $tags=\"\")"));
    }

    #[test]
    fn context_renders_elements_in_order() {
        let puml = exporter().render(DiagramView::Context, &landscape()).unwrap();

        assert!(puml.starts_with("@startuml"));
        assert!(puml.trim_end().ends_with("@enduml"));
        assert!(puml.contains("scale 1.0"));
        assert!(puml.contains("Person(p1, \"clerk\", \"clerk description\")"));
        assert!(puml.contains("System_Ext(e1, \"stripe\")"));
        assert!(puml.contains("System(s1, \"billing\", \"billing description\", $tags=\"deprecated\")"));
        assert!(puml.contains("Rel(api, e1, \"depends on\")"));

        let person = puml.find("Person(").unwrap();
        let external = puml.find("System_Ext(").unwrap();
        let internal = puml.find("System(s1").unwrap();
        let relation = puml.find("Rel(").unwrap();
        assert!(person < external && external < internal && internal < relation);
    }

    #[test]
    fn container_renders_boundaries_variants_and_sprites() {
        let puml = exporter().render(DiagramView::Container, &landscape()).unwrap();

        assert!(puml.contains("System_Ext(e1, \"stripe\", \"stripe description\")"));
        assert!(puml.contains("System_Boundary(s1, \"billing\", \"billing description\") {"));
        assert!(puml.contains(
            "Container(api, \"api\", \"api\", \"api description\", $tags=\"experimental\", $sprite=\"java\")"
        ));
        assert!(puml.contains(
            "ContainerDb(db, \"db\", \"db\", \"db description\", $tags=\"\", $sprite=\"oracle_original\")"
        ));
        assert!(!puml.contains("ghost"));

        let external = puml.find("System_Ext(").unwrap();
        let person = puml.find("Person(").unwrap();
        let boundary = puml.find("System_Boundary(").unwrap();
        let relation = puml.find("Rel(").unwrap();
        assert!(external < person && person < boundary && boundary < relation);
    }

    #[test]
    fn container_prefers_explicit_technology() {
        let mut m = C4DiagramModel::new();
        m.add_system(system("s1", "billing", ""));
        let mut api = container("api", "billing", "service", &[]);
        api.technology = "Rust".to_string();
        m.add_container(api);
        m.post_process();

        let puml = exporter().render(DiagramView::Container, &m).unwrap();
        assert!(puml.contains("Container(api, \"api\", \"Rust\""));
    }

    #[test]
    fn scale_is_rendered() {
        let mut m = landscape();
        m.scale = 0.5;
        let puml = exporter().render(DiagramView::Context, &m).unwrap();
        assert!(puml.contains("scale 0.50"));
    }

    #[test]
    fn rendering_does_not_escape_markup() {
        let mut m = C4DiagramModel::new();
        m.add_system(system("s1", "<Billing & Co>", ""));
        let puml = exporter().render(DiagramView::Context, &m).unwrap();
        assert!(puml.contains("\"<Billing & Co>\""));
    }

    #[test]
    fn malformed_template_fails_on_construction() {
        let result = PlantUmlExporter::with_templates(
            Arc::new(DiagramTables::default()),
            "{{#each persons}}",
            "@startuml",
        );
        assert!(matches!(result, Err(DiagramError::Template(_))));
    }
}
