//! Flattening of a WordprocessingML tree into content items.
//!
//! The walker visits the document part depth-first and classifies each
//! element by namespace and local name. Paragraphs, runs, hyperlinks and
//! table rows and cells are plain containers, so table content lands in the
//! output exactly where the table sits among its siblings. Text boxes inside
//! drawings and VML shapes are read where the shape is anchored. A node that
//! cannot be turned into an item (dangling image reference, math that fails
//! to transform) contributes nothing; the rest of the document is unaffected.

use crate::container::Archive;
use crate::math::MathTransformer;
use crate::media::{self, ImageMode};
use crate::model::{self, ContentItem, LINE_BREAK, TAB};
use crate::relationships::RelationshipMap;
use crate::xml::{Ns, XmlChild, XmlNode};
use std::borrow::Cow;

/// WordprocessingML main namespace.
pub const W: Ns = Ns {
    uris: &[
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
        "http://purl.oclc.org/ooxml/wordprocessingml/main",
    ],
    prefix: "w",
};

/// Office Math namespace.
pub const M: Ns = Ns {
    uris: &[crate::math::OMML_NS, M_STRICT],
    prefix: "m",
};

/// DrawingML main namespace.
pub const A: Ns = Ns {
    uris: &[
        "http://schemas.openxmlformats.org/drawingml/2006/main",
        "http://purl.oclc.org/ooxml/drawingml/main",
    ],
    prefix: "a",
};

/// Relationship reference attributes (`r:embed`, `r:id`).
pub const R: Ns = Ns {
    uris: &[
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        "http://purl.oclc.org/ooxml/officeDocument/relationships",
    ],
    prefix: "r",
};

/// Legacy VML.
pub const V: Ns = Ns {
    uris: &["urn:schemas-microsoft-com:vml"],
    prefix: "v",
};

/// Markup compatibility.
pub const MC: Ns = Ns {
    uris: &["http://schemas.openxmlformats.org/markup-compatibility/2006"],
    prefix: "mc",
};

const M_STRICT: &str = "http://purl.oclc.org/ooxml/officeDocument/math";

/// Formatting containers. Their children (tab stops in `w:tabs`, for one)
/// describe layout, not content.
const PROPERTY_ELEMENTS: &[&str] = &[
    "pPr", "rPr", "sectPr", "tblPr", "tblPrEx", "tblGrid", "trPr", "tcPr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Text,
    Tab,
    Break,
    Drawing,
    Picture,
    Math,
    AlternateContent,
    Properties,
    Container,
}

fn classify(node: &XmlNode) -> NodeKind {
    let local = node.local_name();
    if node.is(&W, local) {
        return match local {
            "t" => NodeKind::Text,
            "tab" => NodeKind::Tab,
            "br" | "cr" => NodeKind::Break,
            "drawing" => NodeKind::Drawing,
            "pict" | "object" => NodeKind::Picture,
            l if PROPERTY_ELEMENTS.contains(&l) => NodeKind::Properties,
            _ => NodeKind::Container,
        };
    }
    if node.is(&M, "oMath") || node.is(&M, "oMathPara") {
        NodeKind::Math
    } else if node.is(&MC, "AlternateContent") {
        NodeKind::AlternateContent
    } else {
        NodeKind::Container
    }
}

/// Whether and how math is converted during a walk.
#[derive(Debug, Clone, Copy)]
enum MathSupport<'a> {
    Rules(&'a MathTransformer),
    Unavailable { warned: bool },
    Disabled,
}

/// Tree walker for one document part.
///
/// Holds the per-conversion context: the archive for media lookups, the
/// part's relationships and the math rules.
#[derive(Debug)]
pub struct Walker<'a> {
    archive: &'a Archive,
    part_path: &'a str,
    relationships: &'a RelationshipMap,
    image_mode: Cow<'a, ImageMode>,
    math: MathSupport<'a>,
    layout_markers: bool,
}

impl<'a> Walker<'a> {
    /// Create a walker for the part at `part_path`.
    ///
    /// Math is unavailable until [`with_math`](Self::with_math) supplies
    /// rules; images are inlined as data URIs by default.
    pub fn new(archive: &'a Archive, part_path: &'a str, relationships: &'a RelationshipMap) -> Self {
        Self {
            archive,
            part_path,
            relationships,
            image_mode: Cow::Owned(ImageMode::default()),
            math: MathSupport::Unavailable { warned: false },
            layout_markers: false,
        }
    }

    /// Use these math rules; `None` drops math blocks with a single warning.
    pub fn with_math(mut self, rules: Option<&'a MathTransformer>) -> Self {
        self.math = match rules {
            Some(rules) => MathSupport::Rules(rules),
            None => MathSupport::Unavailable { warned: false },
        };
        self
    }

    /// Drop math blocks silently.
    pub fn without_math(mut self) -> Self {
        self.math = MathSupport::Disabled;
        self
    }

    /// Set how images are emitted.
    pub fn with_image_mode(mut self, mode: &'a ImageMode) -> Self {
        self.image_mode = Cow::Borrowed(mode);
        self
    }

    /// Keep tab and line break items in the output.
    pub fn with_layout_markers(mut self, keep: bool) -> Self {
        self.layout_markers = keep;
        self
    }

    /// Flatten `root` into filtered content items in reading order.
    pub fn walk(&mut self, root: &XmlNode) -> Vec<ContentItem> {
        let mut items = Vec::new();
        self.visit(root, &mut items);
        if self.layout_markers {
            model::retain_visible_with_markers(&mut items);
        } else {
            model::retain_visible(&mut items);
        }
        items
    }

    fn keeps(&self, item: &ContentItem) -> bool {
        item.is_visible() || (self.layout_markers && item.is_layout_marker())
    }

    fn visit(&mut self, node: &XmlNode, out: &mut Vec<ContentItem>) {
        let item = match classify(node) {
            NodeKind::Text => text(node),
            NodeKind::Tab => Some(ContentItem::text(TAB)),
            NodeKind::Break => Some(ContentItem::text(LINE_BREAK)),
            kind @ (NodeKind::Drawing | NodeKind::Picture) => {
                out.extend(self.shape_image(node, kind));
                self.visit_text_boxes(node, out);
                return;
            }
            NodeKind::Math => self.math(node),
            NodeKind::Properties => None,
            NodeKind::AlternateContent => {
                self.alternate_content(node, out);
                return;
            }
            NodeKind::Container => {
                self.visit_children(node, out);
                return;
            }
        };
        out.extend(item);
    }

    fn visit_children(&mut self, node: &XmlNode, out: &mut Vec<ContentItem>) {
        for child in node.elements() {
            self.visit(child, out);
        }
    }

    /// Image of a `w:drawing` (first `a:blip`) or of a `w:pict`/`w:object`
    /// (first `v:imagedata`). Pictures inside the shape's text boxes belong
    /// to the text box content and are not considered.
    fn shape_image(&self, node: &XmlNode, kind: NodeKind) -> Option<ContentItem> {
        let id = match kind {
            NodeKind::Drawing => {
                let blip = find_in_shape(node, |n| n.is(&A, "blip"))?;
                non_empty(blip.attr_ns(&R, "embed")).or_else(|| non_empty(blip.attr_ns(&R, "link")))?
            }
            _ => {
                let data = find_in_shape(node, |n| n.is(&V, "imagedata"))?;
                non_empty(data.attr_ns(&R, "id")).or_else(|| non_empty(data.attr_ns(&R, "embed")))?
            }
        };
        self.image(id)
    }

    /// Content of every `w:txbxContent` below a shape, in document order.
    fn visit_text_boxes(&mut self, node: &XmlNode, out: &mut Vec<ContentItem>) {
        for child in node.elements() {
            if child.is(&W, "txbxContent") {
                self.visit_children(child, out);
            } else if child.is(&MC, "AlternateContent") {
                self.alternate_content(child, out);
            } else {
                self.visit_text_boxes(child, out);
            }
        }
    }

    /// The first branch of `mc:AlternateContent` that yields anything: each
    /// `mc:Choice` in order, then the `mc:Fallback`.
    fn alternate_content(&mut self, node: &XmlNode, out: &mut Vec<ContentItem>) {
        let choices = node.elements().filter(|n| n.is(&MC, "Choice"));
        let fallback = node.elements().filter(|n| n.is(&MC, "Fallback"));
        for branch in choices.chain(fallback) {
            let mut items = Vec::new();
            self.visit_children(branch, &mut items);
            if items.iter().any(|item| self.keeps(item)) {
                out.extend(items);
                return;
            }
        }
    }

    fn image(&self, id: &str) -> Option<ContentItem> {
        let Some(rel) = self.relationships.get(id) else {
            log::debug!("Image reference {} has no relationship", id);
            return None;
        };
        if rel.external {
            log::debug!("Skipping external image {}", rel.target);
            return None;
        }
        let Some(path) = media::normalize_target(self.part_path, &rel.target) else {
            log::debug!("Image target {} does not resolve inside the archive", rel.target);
            return None;
        };
        let Some(asset) = media::materialize(self.archive, &path) else {
            log::debug!("Image part {} is missing from the archive", path);
            return None;
        };
        let src = asset.encode(&self.image_mode)?;
        Some(ContentItem::image(src, asset.mime))
    }

    fn math(&mut self, node: &XmlNode) -> Option<ContentItem> {
        let rules = match &mut self.math {
            MathSupport::Rules(rules) => *rules,
            MathSupport::Disabled => return None,
            MathSupport::Unavailable { warned } => {
                if !*warned {
                    log::warn!("No math stylesheet available; math blocks are dropped");
                    *warned = true;
                }
                return None;
            }
        };

        let omml = canonical_math(node).to_standalone_xml(&[(M.prefix, M.uri()), (W.prefix, W.uri())]);
        match rules.try_transform(&omml) {
            Ok(mathml) => Some(ContentItem::math(mathml)),
            Err(e) => {
                log::warn!("Dropping math block: {}", e);
                None
            }
        }
    }
}

/// Text of a `w:t` element; empty text yields nothing.
fn text(node: &XmlNode) -> Option<ContentItem> {
    let value = node.text_content();
    (!value.is_empty()).then(|| ContentItem::text(value))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// First descendant matching `pred`, skipping text box bodies.
fn find_in_shape<F>(node: &XmlNode, pred: F) -> Option<&XmlNode>
where
    F: Fn(&XmlNode) -> bool + Copy,
{
    for child in node.elements() {
        if child.is(&W, "txbxContent") {
            continue;
        }
        if pred(child) {
            return Some(child);
        }
        if let Some(found) = find_in_shape(child, pred) {
            return Some(found);
        }
    }
    None
}

/// Math in the Strict namespace, rebound to the transitional one the
/// rules are written against.
fn canonical_math(node: &XmlNode) -> Cow<'_, XmlNode> {
    if node.namespace.as_deref() != Some(M_STRICT) {
        return Cow::Borrowed(node);
    }
    let mut owned = node.clone();
    rebind(&mut owned, M_STRICT, M.uri());
    Cow::Owned(owned)
}

fn rebind(node: &mut XmlNode, from: &str, to: &str) {
    if node.namespace.as_deref() == Some(from) {
        node.namespace = Some(to.to_string());
    }
    for attr in &mut node.attributes {
        let declaration = attr.name == "xmlns" || attr.name.starts_with("xmlns:");
        if declaration && attr.value == from {
            attr.value = to.to_string();
        } else if attr.namespace.as_deref() == Some(from) {
            attr.namespace = Some(to.to_string());
        }
    }
    for child in &mut node.children {
        if let XmlChild::Element(element) = child {
            rebind(element, from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::build_zip;
    use crate::xml;

    const NS_DECLS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math" xmlns:v="urn:schemas-microsoft-com:vml" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#;

    const IMAGE_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="https://example.com/x.png" TargetMode="External"/>
</Relationships>"#;

    fn document(body: &str) -> XmlNode {
        let xml = format!(r#"<w:document {}><w:body>{}</w:body></w:document>"#, NS_DECLS, body);
        xml::parse(&xml).unwrap().unwrap()
    }

    fn archive() -> Archive {
        Archive::from_bytes(build_zip(&[("word/media/image1.png", &b"PNGDATA"[..])])).unwrap()
    }

    fn walk(body: &str, rels: &RelationshipMap) -> Vec<ContentItem> {
        let archive = archive();
        let mut walker = Walker::new(&archive, "word/document.xml", rels).with_math(MathTransformer::bundled());
        walker.walk(&document(body))
    }

    fn drawing(id: &str) -> String {
        format!(
            r#"<w:r><w:drawing><wp:inline xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><a:graphic><a:graphicData><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
            id
        )
    }

    const TABS_AND_BREAKS: &str = r#"<w:p><w:r><w:t>One</w:t><w:tab/><w:t xml:space="preserve">two </w:t><w:br/><w:t>three</w:t><w:cr/></w:r></w:p>"#;

    #[test]
    fn test_tabs_and_breaks_filtered_by_default() {
        let items = walk(TABS_AND_BREAKS, &RelationshipMap::new());
        assert_eq!(
            items,
            vec![
                ContentItem::text("One"),
                ContentItem::text("two "),
                ContentItem::text("three"),
            ]
        );
    }

    #[test]
    fn test_layout_markers_kept_on_request() {
        let archive = archive();
        let rels = RelationshipMap::new();
        let items = Walker::new(&archive, "word/document.xml", &rels)
            .with_layout_markers(true)
            .walk(&document(TABS_AND_BREAKS));
        assert_eq!(
            items,
            vec![
                ContentItem::text("One"),
                ContentItem::text("\t"),
                ContentItem::text("two "),
                ContentItem::text("\n"),
                ContentItem::text("three"),
                ContentItem::text("\n"),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_text_is_filtered() {
        let items = walk(
            r#"<w:p><w:r><w:t xml:space="preserve">   </w:t></w:r><w:r><w:t>kept</w:t></w:r><w:r><w:t></w:t></w:r></w:p>"#,
            &RelationshipMap::new(),
        );
        assert_eq!(items, vec![ContentItem::text("kept")]);
    }

    #[test]
    fn test_tab_stops_in_properties_are_ignored() {
        let items = walk(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>A</w:t></w:r></w:p>"#,
            &RelationshipMap::new(),
        );
        assert_eq!(items, vec![ContentItem::text("A")]);
    }

    #[test]
    fn test_table_flattened_in_place() {
        let items = walk(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p>
<w:tbl><w:tblPr/><w:tr><w:tc><w:p><w:r><w:t>r1c1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>r1c2</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:tbl><w:tr><w:tc><w:p><w:r><w:t>nested</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:tc><w:tc><w:p><w:r><w:t>r2c2</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
            &RelationshipMap::new(),
        );
        let texts: Vec<&str> = items.iter().filter_map(ContentItem::as_text).collect();
        assert_eq!(texts, vec!["before", "r1c1", "r1c2", "nested", "r2c2", "after"]);
    }

    #[test]
    fn test_image_resolved_through_relationships() {
        let rels = RelationshipMap::parse(IMAGE_RELS);
        let items = walk(
            &format!(r#"<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r>{}</w:p>"#, drawing("rId1")),
            &rels,
        );
        assert_eq!(
            items,
            vec![
                ContentItem::text("Hello "),
                ContentItem::image("data:image/png;base64,UE5HREFUQQ==", "image/png"),
            ]
        );
    }

    #[test]
    fn test_unresolvable_images_are_dropped() {
        let rels = RelationshipMap::parse(IMAGE_RELS);
        let body = format!(
            r#"<w:p><w:r><w:t>a</w:t></w:r>{}<w:r><w:t>b</w:t></w:r>{}<w:r><w:t>c</w:t></w:r></w:p>"#,
            drawing("rId9"),
            drawing("rId2")
        );
        let texts: Vec<ContentItem> = walk(&body, &rels);
        assert_eq!(
            texts,
            vec![ContentItem::text("a"), ContentItem::text("b"), ContentItem::text("c")]
        );
    }

    #[test]
    fn test_vml_picture() {
        let rels = RelationshipMap::parse(IMAGE_RELS);
        let items = walk(
            r#"<w:p><w:r><w:pict><v:shape><v:imagedata r:id="rId1" o:title="" xmlns:o="urn:schemas-microsoft-com:office:office"/></v:shape></w:pict></w:r></w:p>"#,
            &rels,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), "image");
    }

    fn text_box(text: &str) -> String {
        format!(r#"<w:txbxContent><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:txbxContent>"#, text)
    }

    #[test]
    fn test_vml_text_box() {
        let body = format!(
            r#"<w:p><w:r><w:t>before</w:t></w:r><w:r><w:pict><v:shape><v:textbox>{}</v:textbox></v:shape></w:pict></w:r><w:r><w:t>after</w:t></w:r></w:p>"#,
            text_box("boxed")
        );
        let items = walk(&body, &RelationshipMap::new());
        assert_eq!(
            items,
            vec![ContentItem::text("before"), ContentItem::text("boxed"), ContentItem::text("after")]
        );
    }

    #[test]
    fn test_drawing_text_box_with_vml_fallback() {
        let body = format!(
            r#"<w:p><w:r><mc:AlternateContent><mc:Choice Requires="wps"><w:drawing><wp:anchor xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><a:graphic><a:graphicData><wps:wsp xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"><wps:txbx>{}</wps:txbx></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></mc:Choice><mc:Fallback><w:pict><v:rect><v:textbox>{}</v:textbox></v:rect></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p>"#,
            text_box("boxed"),
            text_box("boxed")
        );
        let items = walk(&body, &RelationshipMap::new());
        assert_eq!(items, vec![ContentItem::text("boxed")]);
    }

    #[test]
    fn test_alternate_content_falls_back_when_choice_is_empty() {
        let body = format!(
            r#"<w:p><w:r><mc:AlternateContent><mc:Choice Requires="wps"><w:drawing/></mc:Choice><mc:Fallback><w:pict><v:rect><v:textbox>{}</v:textbox></v:rect></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p>"#,
            text_box("legacy")
        );
        let items = walk(&body, &RelationshipMap::new());
        assert_eq!(items, vec![ContentItem::text("legacy")]);
    }

    #[test]
    fn test_picture_inside_text_box_emitted_once() {
        let rels = RelationshipMap::parse(IMAGE_RELS);
        let inner = format!(
            r#"<w:txbxContent><w:p><w:r><w:t>caption</w:t></w:r>{}</w:p></w:txbxContent>"#,
            drawing("rId1")
        );
        let body = format!(
            r#"<w:p><w:r><w:drawing><wp:anchor xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><a:graphic><a:graphicData><wps:wsp xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"><wps:txbx>{}</wps:txbx></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing></w:r></w:p>"#,
            inner
        );
        let items = walk(&body, &rels);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], ContentItem::text("caption"));
        assert_eq!(items[1].kind(), "image");
    }

    #[test]
    fn test_alternate_content_reads_first_choice_only() {
        let rels = RelationshipMap::parse(IMAGE_RELS);
        let body = format!(
            r#"<w:p><w:r><mc:AlternateContent><mc:Choice Requires="wps">{}</mc:Choice><mc:Fallback><w:pict><v:shape><v:imagedata r:id="rId1"/></v:shape></w:pict></mc:Fallback></mc:AlternateContent></w:r></w:p>"#,
            drawing("rId1")
        );
        let items = walk(&body, &rels);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_math_converted_in_place() {
        let items = walk(
            r#"<w:p><w:r><w:t xml:space="preserve">Let </w:t></w:r><m:oMath><m:r><m:t>x</m:t></m:r></m:oMath><w:r><w:t xml:space="preserve"> be</w:t></w:r></w:p>"#,
            &RelationshipMap::new(),
        );
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], ContentItem::text("Let "));
        assert_eq!(
            items[1],
            ContentItem::math(r#"<math xmlns="http://www.w3.org/1998/Math/MathML" display="inline"><mi>x</mi></math>"#)
        );
        assert_eq!(items[2], ContentItem::text(" be"));
    }

    #[test]
    fn test_math_dropped_without_rules() {
        let archive = archive();
        let rels = RelationshipMap::new();
        let root = document(
            r#"<w:p><w:r><w:t>a</w:t></w:r><m:oMath><m:r><m:t>x</m:t></m:r></m:oMath><m:oMathPara><m:oMath><m:r><m:t>y</m:t></m:r></m:oMath></m:oMathPara><w:r><w:t>b</w:t></w:r></w:p>"#,
        );

        let items = Walker::new(&archive, "word/document.xml", &rels).walk(&root);
        assert_eq!(items, vec![ContentItem::text("a"), ContentItem::text("b")]);

        let items = Walker::new(&archive, "word/document.xml", &rels)
            .without_math()
            .walk(&root);
        assert_eq!(items, vec![ContentItem::text("a"), ContentItem::text("b")]);
    }

    #[test]
    fn test_strict_math_namespace() {
        let archive = archive();
        let rels = RelationshipMap::new();
        let root = xml::parse(
            r#"<w:document xmlns:w="http://purl.oclc.org/ooxml/wordprocessingml/main" xmlns:m="http://purl.oclc.org/ooxml/officeDocument/math"><w:body><w:p><m:oMath><m:r><m:t>z</m:t></m:r></m:oMath></w:p></w:body></w:document>"#,
        )
        .unwrap()
        .unwrap();
        let items = Walker::new(&archive, "word/document.xml", &rels)
            .with_math(MathTransformer::bundled())
            .walk(&root);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind(), "math");
        assert!(matches!(&items[0], ContentItem::Math { mathml } if mathml.contains("<mi>z</mi>")));
    }

    #[test]
    fn test_undeclared_prefixes_still_classified() {
        let archive = archive();
        let rels = RelationshipMap::new();
        let root = xml::parse(
            r#"<w:document><w:body><w:p><w:r><w:t>plain</w:t><w:tab/></w:r><m:oMath><m:r><m:t>q</m:t></m:r></m:oMath></w:p></w:body></w:document>"#,
        )
        .unwrap()
        .unwrap();
        let items = Walker::new(&archive, "word/document.xml", &rels)
            .with_math(MathTransformer::bundled())
            .walk(&root);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], ContentItem::text("plain"));
        assert_eq!(items[1].kind(), "math");
    }

    #[test]
    fn test_asset_dir_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mode = ImageMode::AssetDir(dir.path().to_path_buf());
        let archive = archive();
        let rels = RelationshipMap::parse(IMAGE_RELS);
        let root = document(&format!("<w:p>{}</w:p>", drawing("rId1")));

        let items = Walker::new(&archive, "word/document.xml", &rels)
            .with_image_mode(&mode)
            .walk(&root);
        match &items[..] {
            [ContentItem::Image { src, mime }] => {
                assert!(src.ends_with("image1.png"));
                assert_eq!(mime, "image/png");
            }
            other => panic!("unexpected items: {:?}", other),
        }
        assert!(dir.path().join("image1.png").exists());
    }
}
