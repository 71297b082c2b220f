//! RDF vocabulary used to persist [`semem_core::MemoryStore`] state.

/// `ragno:` — the memory/graph domain vocabulary.
pub const RAGNO: &str = "http://purl.org/stuff/ragno/";
/// `semem:` — this project's own vocabulary.
pub const SEMEM: &str = "http://purl.org/semem/";
/// `rdf:` — the RDF core vocabulary.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// `rdfs:` — RDF Schema.
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// `dcterms:` — Dublin Core terms.
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
/// `prov:` — the W3C provenance vocabulary.
pub const PROV: &str = "http://www.w3.org/ns/prov#";
/// `skos:` — Simple Knowledge Organization System.
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
/// `xsd:` — XML Schema datatypes.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
/// `olo:` — the Ordered List Ontology, used for chunk ordinals.
pub const OLO: &str = "http://purl.org/ontology/olo/core#";

/// The prefixes registered by default in [`crate::templates::QueryTemplateStore`],
/// in the canonical order they should appear as `PREFIX` declarations.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("ragno", RAGNO),
    ("semem", SEMEM),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("dcterms", DCTERMS),
    ("prov", PROV),
    ("skos", SKOS),
    ("xsd", XSD),
    ("olo", OLO),
];

/// `ragno:Element` — the type of a persisted interaction.
pub const CLASS_ELEMENT: &str = "ragno:Element";
/// `ragno:Unit` — the type of a persisted document chunk.
pub const CLASS_UNIT: &str = "ragno:Unit";

/// `skos:prefLabel` — holds an interaction's prompt text.
pub const PRED_PREF_LABEL: &str = "skos:prefLabel";
/// `ragno:content` — holds an interaction's response, or a chunk's content.
pub const PRED_CONTENT: &str = "ragno:content";
/// `ragno:embedding` — a canonical JSON float-array literal.
pub const PRED_EMBEDDING: &str = "ragno:embedding";
/// `dcterms:created` — an `xsd:dateTime` creation timestamp.
pub const PRED_CREATED: &str = "dcterms:created";
/// `ragno:accessCount` — an `xsd:integer` retrieval counter.
pub const PRED_ACCESS_COUNT: &str = "ragno:accessCount";
/// `ragno:decayFactor` — an `xsd:double` decay/reinforcement scalar.
pub const PRED_DECAY_FACTOR: &str = "ragno:decayFactor";
/// `ragno:concept` — zero or more concept-value literals.
pub const PRED_CONCEPT: &str = "ragno:concept";
/// `olo:index` — a chunk's zero-based ordinal within its parent document.
pub const PRED_INDEX: &str = "olo:index";
/// `ragno:hasEmbedding` — links a chunk to its embedding node.
pub const PRED_HAS_EMBEDDING: &str = "ragno:hasEmbedding";
/// `ragno:vectorContent` — the embedding literal on an embedding node.
pub const PRED_VECTOR_CONTENT: &str = "ragno:vectorContent";
/// `dcterms:isPartOf` — links a chunk to its parent document id.
pub const PRED_IS_PART_OF: &str = "dcterms:isPartOf";

/// Mint a subject IRI for an interaction or chunk id.
#[must_use]
pub fn subject_iri(base: &str, id: &str) -> String {
    format!("{base}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefixes_cover_the_minimum_set() {
        let names: Vec<&str> = DEFAULT_PREFIXES.iter().map(|(name, _)| *name).collect();
        for expected in ["ragno", "semem", "rdfs", "dcterms", "prov", "skos", "xsd", "olo"] {
            assert!(names.contains(&expected), "missing prefix {expected}");
        }
    }

    #[test]
    fn subject_iri_concatenates_base_and_id() {
        assert_eq!(subject_iri("http://example.org/mem/", "abc"), "http://example.org/mem/abc");
    }
}
