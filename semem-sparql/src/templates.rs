//! Named, parameterized SPARQL query/update templates with a seeded prefix
//! registry.

use std::collections::HashMap;

use semem_core::error::{Error, Result};

use crate::vocab::DEFAULT_PREFIXES;

/// A registered query/update template.
#[derive(Debug, Clone)]
pub struct Template {
    /// Template body containing `${placeholder}` markers.
    pub body: String,
    /// Placeholders that must be supplied to [`QueryTemplateStore::render`].
    pub required: Vec<String>,
    /// Placeholders that default to the empty string if omitted.
    pub optional: Vec<String>,
    /// Human-readable description.
    pub description: String,
}

/// Registry of named templates plus the prefix declarations prepended to
/// rendered output.
#[derive(Debug, Clone)]
pub struct QueryTemplateStore {
    templates: HashMap<String, Template>,
    prefixes: Vec<(String, String)>,
}

impl QueryTemplateStore {
    /// Construct a store seeded with the built-in templates and the default
    /// prefix registry.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            templates: HashMap::new(),
            prefixes: DEFAULT_PREFIXES
                .iter()
                .map(|(name, iri)| ((*name).to_string(), (*iri).to_string()))
                .collect(),
        };
        store.register_builtins();
        store
    }

    fn register_builtins(&mut self) {
        self.register(
            "delete_subject",
            Template {
                body: "DELETE WHERE { GRAPH <${graph}> { <${subject}> ?p ?o } }".to_string(),
                required: vec!["graph".to_string(), "subject".to_string()],
                optional: vec![],
                description: "Remove all triples for a subject within a graph.".to_string(),
            },
        );
        self.register(
            "insert_interaction",
            Template {
                body: "INSERT DATA { GRAPH <${graph}> { ${triples} } }".to_string(),
                required: vec!["graph".to_string(), "triples".to_string()],
                optional: vec![],
                description: "Insert the triples for one interaction or chunk.".to_string(),
            },
        );
        self.register(
            "select_history",
            Template {
                body: "SELECT ?subject ?label ?content ?embedding ?created ?accessCount ?decayFactor WHERE { \
                       GRAPH <${graph}> { ?subject a ragno:Element ; skos:prefLabel ?label ; ragno:content ?content ; \
                       ragno:embedding ?embedding ; dcterms:created ?created ; ragno:accessCount ?accessCount ; \
                       ragno:decayFactor ?decayFactor } }"
                    .to_string(),
                required: vec!["graph".to_string()],
                optional: vec![],
                description: "Select every persisted interaction in a graph.".to_string(),
            },
        );
        self.register(
            "select_search",
            Template {
                body: "SELECT ?subject ?label ?content ?embedding WHERE { \
                       GRAPH <${graph}> { \
                       { ?subject a ragno:Element ; ragno:content ?content ; ragno:embedding ?embedding . \
                       OPTIONAL { ?subject skos:prefLabel ?label } } \
                       UNION \
                       { ?subject a ragno:Unit ; ragno:content ?content ; ragno:hasEmbedding ?embeddingNode . \
                       ?embeddingNode ragno:vectorContent ?embedding } \
                       ${filter} } }"
                    .to_string(),
                required: vec!["graph".to_string()],
                optional: vec!["filter".to_string()],
                description: "Select candidate interactions and chunks for in-process similarity scoring.".to_string(),
            },
        );
        self.register(
            "ask_discovery",
            Template {
                body: "ASK { ?s ?p ?o }".to_string(),
                required: vec![],
                optional: vec![],
                description: "Endpoint-discovery probe.".to_string(),
            },
        );
    }

    /// Register or override a named template.
    pub fn register(&mut self, name: impl Into<String>, template: Template) {
        self.templates.insert(name.into(), template);
    }

    /// Render `name` by substituting `params` into its body. Missing
    /// required placeholders fail; missing optional placeholders substitute
    /// the empty string. If `include_prefixes`, canonical `PREFIX`
    /// declarations are prepended, deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateError`] if `name` is unregistered or a
    /// required placeholder is missing.
    pub fn render(&self, name: &str, params: &HashMap<String, String>, include_prefixes: bool) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateError(format!("unknown template: {name}")))?;

        for key in &template.required {
            if !params.contains_key(key) {
                return Err(Error::TemplateError(format!("missing required parameter: {key}")));
            }
        }

        let mut body = template.body.clone();
        for key in template.required.iter().chain(&template.optional) {
            let value = params.get(key).cloned().unwrap_or_default();
            body = body.replace(&format!("${{{key}}}"), &value);
        }

        if include_prefixes {
            let mut seen = std::collections::HashSet::new();
            let prelude: String = self
                .prefixes
                .iter()
                .filter(|(name, _)| seen.insert(name.clone()))
                .map(|(name, iri)| format!("PREFIX {name}: <{iri}>\n"))
                .collect();
            Ok(format!("{prelude}{body}"))
        } else {
            Ok(body)
        }
    }
}

impl Default for QueryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_required_placeholders() {
        let store = QueryTemplateStore::new();
        let mut params = HashMap::new();
        params.insert("graph".to_string(), "http://g".to_string());
        params.insert("subject".to_string(), "http://s".to_string());

        let rendered = store.render("delete_subject", &params, false).unwrap();
        assert!(rendered.contains("<http://g>"));
        assert!(rendered.contains("<http://s>"));
    }

    #[test]
    fn render_fails_on_missing_required_parameter() {
        let store = QueryTemplateStore::new();
        let params = HashMap::new();
        assert!(matches!(store.render("delete_subject", &params, false), Err(Error::TemplateError(_))));
    }

    #[test]
    fn render_substitutes_optional_with_empty_string_when_absent() {
        let store = QueryTemplateStore::new();
        let mut params = HashMap::new();
        params.insert("graph".to_string(), "http://g".to_string());

        let rendered = store.render("select_search", &params, false).unwrap();
        assert!(!rendered.contains("${filter}"));
        assert!(rendered.contains("ragno:Element"));
        assert!(rendered.contains("ragno:Unit"));
    }

    #[test]
    fn render_prepends_deduplicated_prefixes() {
        let store = QueryTemplateStore::new();
        let rendered = store.render("ask_discovery", &HashMap::new(), true).unwrap();
        assert_eq!(rendered.matches("PREFIX ragno:").count(), 1);
    }

    #[test]
    fn render_rejects_unknown_template() {
        let store = QueryTemplateStore::new();
        assert!(matches!(store.render("nonexistent", &HashMap::new(), false), Err(Error::TemplateError(_))));
    }
}
