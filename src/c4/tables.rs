use std::collections::HashMap;

/// Tags that survive into the rendered diagram.
pub const TAG_WHITELIST: [&str; 2] = ["deprecated", "experimental"];

/// Technology tag to PlantUML sprite name.
pub const SPRITE_TABLE: [(&str, &str); 5] = [
    ("spring", "spring"),
    ("c", "c"),
    ("java", "java"),
    ("angular", "angular"),
    ("oracle", "oracle_original"),
];

/// Graph relationship type to diagram relation label.
pub const RELATION_LABELS: [(&str, &str); 2] =
    [("DEPENDS_ON", "depends on"), ("CONTAINS", "contains")];

/// Immutable lookup tables consulted while decoding rows and rendering diagrams.
///
/// Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct DiagramTables {
    tag_whitelist: Vec<String>,
    sprites: HashMap<String, String>,
    relation_labels: HashMap<String, String>,
}

impl Default for DiagramTables {
    fn default() -> Self {
        Self {
            tag_whitelist: TAG_WHITELIST.iter().map(|t| t.to_string()).collect(),
            sprites: SPRITE_TABLE
                .iter()
                .map(|(tag, sprite)| (tag.to_string(), sprite.to_string()))
                .collect(),
            relation_labels: RELATION_LABELS
                .iter()
                .map(|(rel_type, label)| (rel_type.to_string(), label.to_string()))
                .collect(),
        }
    }
}

impl DiagramTables {
    /// Whitelisted tags in their original order, joined with `,`.
    pub fn as_tags(&self, tags: &[String]) -> String {
        tags.iter()
            .filter(|tag| self.tag_whitelist.contains(*tag))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Sprite of the first tag that has one, or an empty string.
    pub fn sprite(&self, tags: &[String]) -> String {
        tags.iter()
            .find_map(|tag| self.sprites.get(tag))
            .cloned()
            .unwrap_or_default()
    }

    pub fn relation_label(&self, rel_type: &str) -> String {
        self.relation_labels
            .get(rel_type)
            .cloned()
            .unwrap_or_else(|| rel_type.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn as_tags_keeps_whitelisted_tags_in_order() {
        let tables = DiagramTables::default();
        assert_eq!(tables.as_tags(&tags(&["java", "deprecated"])), "deprecated");
        assert_eq!(tables.as_tags(&tags(&["other", "java"])), "");
        assert_eq!(
            tables.as_tags(&tags(&["experimental", "", "deprecated"])),
            "experimental,deprecated"
        );
    }

    #[test]
    fn sprite_uses_first_matching_tag() {
        let tables = DiagramTables::default();
        assert_eq!(tables.sprite(&tags(&["java"])), "java");
        assert_eq!(tables.sprite(&tags(&["other"])), "");
        assert_eq!(tables.sprite(&tags(&["oracle", "java"])), "oracle_original");
        assert_eq!(tables.sprite(&[]), "");
    }

    #[test]
    fn relation_label_rewrites_known_types() {
        let tables = DiagramTables::default();
        assert_eq!(tables.relation_label("DEPENDS_ON"), "depends on");
        assert_eq!(tables.relation_label("CONTAINS"), "contains");
        assert_eq!(tables.relation_label("PROVIDES"), "PROVIDES");
    }
}
