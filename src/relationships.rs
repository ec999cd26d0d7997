//! Relationship (`.rels`) parsing.

use std::collections::BTreeMap;
use std::path::Path;

/// Relationship type suffix of the main document part.
const OFFICE_DOCUMENT_TYPE_SUFFIX: &str = "/officeDocument";

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// Mapping from relationship id to target, built once per conversion.
///
/// Ordered by id so iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMap {
    by_id: BTreeMap<String, Relationship>,
}

impl RelationshipMap {
    /// Create a new empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an optional relationships part; absent input yields an
    /// empty map.
    pub fn build(xml: Option<&str>) -> Self {
        xml.map(Self::parse).unwrap_or_default()
    }

    /// Parse a relationships part.
    ///
    /// Entries missing `Id` or `Target` are skipped. Malformed XML degrades
    /// to an empty map instead of failing.
    pub fn parse(xml: &str) -> Self {
        if xml.trim().is_empty() {
            return Self::new();
        }

        let mut rels = Self::new();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Empty(ref e))
                | Ok(quick_xml::events::Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut rel_type = String::new();
                    let mut target = None;
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = match attr.unescape_value() {
                            Ok(v) => v.into_owned(),
                            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
                        };
                        match attr.key.as_ref() {
                            b"Id" => id = Some(value),
                            b"Type" => rel_type = value,
                            b"Target" => target = Some(value),
                            b"TargetMode" => external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }

                    match (id, target) {
                        (Some(id), Some(target)) if !id.is_empty() && !target.is_empty() => {
                            rels.add(
                                id,
                                Relationship {
                                    rel_type,
                                    target,
                                    external,
                                },
                            );
                        }
                        _ => {}
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => {
                    log::warn!("Ignoring malformed relationships part: {}", e);
                    return Self::new();
                }
                _ => {}
            }
        }

        rels
    }

    /// Add a relationship; a repeated id replaces the earlier entry.
    pub fn add(&mut self, id: String, rel: Relationship) {
        self.by_id.insert(id, rel);
    }

    /// Get a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Resolve an id to its target path.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|rel| rel.target.as_str())
    }

    /// Target of the main document part, if declared.
    pub fn office_document_target(&self) -> Option<&str> {
        self.by_id
            .values()
            .find(|rel| rel.rel_type.ends_with(OFFICE_DOCUMENT_TYPE_SUFFIX) && !rel.external)
            .map(|rel| rel.target.as_str())
    }

    /// Iterate relationships in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relationship)> {
        self.by_id.iter().map(|(id, rel)| (id.as_str(), rel))
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Path of the `.rels` part describing `part_path`.
///
/// `word/document.xml` maps to `word/_rels/document.xml.rels`; the package
/// root maps to `_rels/.rels`.
pub fn rels_path_for(part_path: &str) -> String {
    if part_path.is_empty() || part_path == "/" {
        return "_rels/.rels".to_string();
    }

    let path = Path::new(part_path.trim_start_matches('/'));
    let filename = path.file_name().unwrap_or_default().to_string_lossy();
    match path.parent().map(|p| p.to_string_lossy().replace('\\', "/")) {
        Some(parent) if !parent.is_empty() => format!("{}/_rels/{}.rels", parent, filename),
        _ => format!("_rels/{}.rels", filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"/>
  <Relationship Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/orphan.png"/>
</Relationships>"#;

    #[test]
    fn test_parse_relationships() {
        let rels = RelationshipMap::parse(DOCUMENT_RELS);

        assert_eq!(rels.len(), 2);
        assert_eq!(rels.resolve("rId1"), Some("media/image1.png"));
        assert!(rels.get("rId2").unwrap().external);
        assert!(rels.resolve("rId3").is_none());
        assert!(rels.resolve("rId9").is_none());
    }

    #[test]
    fn test_repeated_id_keeps_last_entry() {
        let rels = RelationshipMap::parse(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/old.png"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/new.png"/>
</Relationships>"#,
        );
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.resolve("rId1"), Some("media/new.png"));
    }

    #[test]
    fn test_iteration_is_ordered() {
        let rels = RelationshipMap::parse(DOCUMENT_RELS);
        let ids: Vec<&str> = rels.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["rId1", "rId2"]);
    }

    #[test]
    fn test_malformed_relationships_degrade_to_empty() {
        let rels = RelationshipMap::parse(r#"<Relationships><Relationship Id="rId1" Target="a.png"/></Oops>"#);
        assert!(rels.is_empty());

        assert!(RelationshipMap::build(None).is_empty());
        assert!(RelationshipMap::parse("   ").is_empty());
    }

    #[test]
    fn test_office_document_target() {
        let rels = RelationshipMap::parse(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document2.xml"/>
</Relationships>"#,
        );
        assert_eq!(rels.office_document_target(), Some("word/document2.xml"));
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for("/word/document2.xml"), "word/_rels/document2.xml.rels");
        assert_eq!(rels_path_for("document.xml"), "_rels/document.xml.rels");
        assert_eq!(rels_path_for(""), "_rels/.rels");
    }
}
