//! Order-preserving XML tree.
//!
//! WordprocessingML repeats sibling tags (`w:p`, `w:r`, `w:t`) whose order
//! carries meaning, so parts are parsed into a generic tree that keeps every
//! element and text child in document order, with attributes attached to the
//! node that carries them. Namespace prefixes are resolved while parsing so
//! callers can dispatch on namespace URI instead of on the prefix a
//! particular producer happened to choose.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, HashMap};

/// Namespace bound to the `xml` prefix.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xmlns` declarations.
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Deepest element nesting [`parse`] accepts.
///
/// Tree traversals recurse once per level; deeper input is rejected.
pub const MAX_DEPTH: usize = 1024;

/// A namespace as seen by node matchers: its accepted URIs plus the
/// conventional prefix used when a part omits the declaration.
#[derive(Debug, Clone, Copy)]
pub struct Ns {
    /// Accepted namespace URIs (e.g. transitional and strict OOXML)
    pub uris: &'static [&'static str],
    /// Conventional prefix
    pub prefix: &'static str,
}

impl Ns {
    /// Primary URI, used when a declaration has to be synthesized.
    pub fn uri(&self) -> &'static str {
        self.uris[0]
    }

    fn matches(&self, namespace: Option<&str>, prefix: Option<&str>) -> bool {
        match namespace {
            Some(uri) => self.uris.contains(&uri),
            None => prefix == Some(self.prefix),
        }
    }
}

/// An attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Qualified name as written (e.g. `r:embed`)
    pub name: String,
    /// Resolved namespace URI; unprefixed attributes have none
    pub namespace: Option<String>,
    /// Unescaped value
    pub value: String,
}

impl XmlAttribute {
    /// Name without prefix.
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    fn is_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// A child of an element: a nested element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChild {
    Element(XmlNode),
    Text(String),
}

/// An element with its attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified name as written (e.g. `w:p`)
    pub name: String,
    /// Resolved namespace URI, `None` when unbound
    pub namespace: Option<String>,
    /// Attributes in document order, including `xmlns` declarations
    pub attributes: Vec<XmlAttribute>,
    /// Children in document order
    pub children: Vec<XmlChild>,
}

impl XmlNode {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without prefix.
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// Whether this element is `local` in namespace `ns`.
    pub fn is(&self, ns: &Ns, local: &str) -> bool {
        self.local_name() == local && ns.matches(self.namespace.as_deref(), self.prefix())
    }

    /// Whether this element has the given namespace URI and local name.
    ///
    /// Unbound elements match on `fallback_prefix` instead.
    pub fn is_named(&self, namespace: Option<&str>, fallback_prefix: Option<&str>, local: &str) -> bool {
        if self.local_name() != local {
            return false;
        }
        match (&self.namespace, namespace) {
            (Some(own), Some(wanted)) => own == wanted,
            (None, _) => self.prefix() == fallback_prefix,
            (Some(_), None) => false,
        }
    }

    /// Value of the attribute with the given qualified name as written.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of the attribute `local` in namespace `ns`.
    pub fn attr_ns(&self, ns: &Ns, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name() == local && ns.matches(a.namespace.as_deref(), a.prefix()))
            .map(|a| a.value.as_str())
    }

    /// Element children in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.children.iter().filter_map(|child| match child {
            XmlChild::Element(node) => Some(node),
            XmlChild::Text(_) => None,
        })
    }

    /// Concatenated character data of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlChild::Text(text) => out.push_str(text),
                XmlChild::Element(node) => node.collect_text(out),
            }
        }
    }

    /// First descendant (pre-order, excluding `self`) matching `pred`.
    pub fn find_descendant<F>(&self, pred: F) -> Option<&XmlNode>
    where
        F: Fn(&XmlNode) -> bool + Copy,
    {
        for node in self.elements() {
            if pred(node) {
                return Some(node);
            }
            if let Some(found) = node.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Serialize this subtree back to XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, &[]);
        out
    }

    /// Serialize this subtree so it parses on its own.
    ///
    /// Namespace declarations inherited from ancestors are re-attached to the
    /// root. Prefixes that were never bound take their URI from `fallbacks`
    /// (`(prefix, uri)` pairs), when listed there.
    pub fn to_standalone_xml(&self, fallbacks: &[(&str, &str)]) -> String {
        let mut used = BTreeMap::new();
        self.collect_namespaces(&mut used);

        let declared: Vec<&str> = self
            .attributes
            .iter()
            .filter(|a| a.is_declaration())
            .map(|a| a.name.as_str())
            .collect();

        let mut extra = Vec::new();
        for (prefix, uri) in used {
            let decl = match prefix.as_str() {
                "" => "xmlns".to_string(),
                p => format!("xmlns:{}", p),
            };
            if declared.contains(&decl.as_str()) {
                continue;
            }
            let uri = match uri {
                Some(uri) => uri,
                None => match fallbacks.iter().find(|(p, _)| *p == prefix) {
                    Some((_, uri)) => uri.to_string(),
                    None => continue,
                },
            };
            extra.push((decl, uri));
        }

        let mut out = String::new();
        self.write_xml(&mut out, &extra);
        out
    }

    fn collect_namespaces(&self, used: &mut BTreeMap<String, Option<String>>) {
        let prefix = self.prefix().unwrap_or("");
        if prefix != "xml" && (self.namespace.is_some() || !prefix.is_empty()) {
            used.entry(prefix.to_string())
                .or_insert_with(|| self.namespace.clone());
        }
        for attr in &self.attributes {
            if attr.is_declaration() {
                continue;
            }
            if let Some(prefix) = attr.prefix() {
                if prefix != "xml" {
                    used.entry(prefix.to_string())
                        .or_insert_with(|| attr.namespace.clone());
                }
            }
        }
        for node in self.elements() {
            node.collect_namespaces(used);
        }
    }

    fn write_xml(&self, out: &mut String, extra_decls: &[(String, String)]) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in extra_decls {
            push_attr(out, name, value);
        }
        for attr in &self.attributes {
            push_attr(out, &attr.name, &attr.value);
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlChild::Text(text) => out.push_str(&quick_xml::escape::partial_escape(text)),
                XmlChild::Element(node) => node.write_xml(out, &[]),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&quick_xml::escape::escape(value));
    out.push('"');
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// In-scope namespace bindings.
///
/// Each prefix keeps a stack of the URIs bound to it; each open element
/// remembers which prefixes it declared so closing it unwinds them.
#[derive(Default)]
struct NamespaceScopes {
    bindings: HashMap<String, Vec<String>>,
    frames: Vec<Vec<String>>,
}

impl NamespaceScopes {
    fn push(&mut self, attributes: &[XmlAttribute]) {
        let mut frame = Vec::new();
        for attr in attributes.iter().filter(|a| a.is_declaration()) {
            let prefix = attr.name.strip_prefix("xmlns:").unwrap_or("").to_string();
            self.bindings
                .entry(prefix.clone())
                .or_default()
                .push(attr.value.clone());
            frame.push(prefix);
        }
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        for prefix in frame {
            if let Some(uris) = self.bindings.get_mut(&prefix) {
                uris.pop();
            }
        }
    }

    /// Resolve a prefix; `""` is the default namespace.
    fn resolve(&self, prefix: &str) -> Option<String> {
        match prefix {
            "xml" => return Some(XML_NS.to_string()),
            "xmlns" => return Some(XMLNS_NS.to_string()),
            _ => {}
        }
        // xmlns="" undeclares the default namespace
        self.bindings
            .get(prefix)
            .and_then(|uris| uris.last())
            .filter(|uri| !uri.is_empty())
            .cloned()
    }
}

/// Parse an XML document into an order-preserving tree.
///
/// Returns `Ok(None)` when the input holds no root element and
/// `Error::MalformedXml` when the markup is broken or nests deeper than
/// [`MAX_DEPTH`].
pub fn parse(xml: &str) -> Result<Option<XmlNode>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut scopes = NamespaceScopes::default();
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                check_depth(stack.len() + 1)?;
                let node = open_element(e, &mut scopes)?;
                stack.push(node);
            }
            Event::Empty(ref e) => {
                check_depth(stack.len() + 1)?;
                let node = open_element(e, &mut scopes)?;
                scopes.pop();
                close_element(node, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::MalformedXml("unexpected closing tag".to_string()))?;
                scopes.pop();
                close_element(node, &mut stack, &mut root)?;
            }
            Event::Text(ref e) => {
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::MalformedXml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    Ok(root)
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::MalformedXml(format!(
            "elements nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

fn open_element(e: &BytesStart<'_>, scopes: &mut NamespaceScopes) -> Result<XmlNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::MalformedXml(err.to_string()))?;
        attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            namespace: None,
            value: attr.unescape_value()?.into_owned(),
        });
    }

    scopes.push(&attributes);

    for attr in &mut attributes {
        attr.namespace = if attr.is_declaration() {
            Some(XMLNS_NS.to_string())
        } else {
            attr.prefix().and_then(|p| scopes.resolve(p))
        };
    }

    let namespace = scopes.resolve(split_qname(&name).0.unwrap_or(""));

    Ok(XmlNode {
        name,
        namespace,
        attributes,
        children: Vec::new(),
    })
}

fn close_element(node: XmlNode, stack: &mut [XmlNode], root: &mut Option<XmlNode>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlChild::Element(node)),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(Error::MalformedXml(format!(
                "second root element <{}>",
                node.name
            )))
        }
    }
    Ok(())
}

fn push_text(parent: &mut XmlNode, text: &str) {
    if text.is_empty() {
        return;
    }
    match parent.children.last_mut() {
        Some(XmlChild::Text(existing)) => existing.push_str(text),
        _ => parent.children.push(XmlChild::Text(text.to_string())),
    }
}
