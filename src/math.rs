//! OMML to MathML conversion.
//!
//! Office Math Markup is rewritten into presentation MathML by a small,
//! declarative template language modelled on XSLT. A stylesheet is a list of
//! `t:template` rules; each rule matches element names (optionally within a
//! mode) and its body mixes literal output elements with instructions:
//!
//! | instruction | effect |
//! |-------------|--------|
//! | `<t:apply select="p" mode="m">` | apply templates to selected nodes (default: element children); an optional `<t:between>` child is emitted between results |
//! | `<t:value-of select="p" default="x"/>` | text of the first selected node or attribute |
//! | `<t:tokens letters="split\|word"/>` | split the context text into `mi`/`mn`/`mo` tokens |
//! | `<t:if test="t">` | body when the test holds |
//! | `<t:choose>`/`<t:when test="t">`/`<t:otherwise>` | first matching branch |
//!
//! Paths are `/`-separated qualified names, `*` or `.`, optionally ending in
//! `@attr`. A test is a path (true when it selects something) or
//! `path='literal'`. Elements without a matching rule pass their children
//! through in the same mode, and the first matching rule wins.
//!
//! The bundled stylesheet lives in `resources/omml2mml.xml` and is compiled
//! once per process.

use crate::xml::{self, XmlAttribute, XmlChild, XmlNode};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Office Math Markup namespace.
pub const OMML_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";

/// Presentation MathML namespace.
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Namespace of stylesheet instructions.
pub const RULES_NS: &str = "urn:docx-items:transform";

/// Nesting limit for template application.
const MAX_DEPTH: usize = 512;

const BUNDLED_STYLESHEET: &str = include_str!("../resources/omml2mml.xml");

static BUNDLED: OnceLock<Option<MathTransformer>> = OnceLock::new();

/// Why a single math block could not be converted.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The OMML fragment did not parse.
    #[error("invalid OMML: {0}")]
    Parse(#[from] crate::error::Error),

    /// The fragment had no root element.
    #[error("empty OMML fragment")]
    EmptyInput,

    /// The rules produced no element.
    #[error("stylesheet produced no output")]
    EmptyOutput,

    /// Template application nested too deeply.
    #[error("template nesting too deep")]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QName {
    namespace: Option<String>,
    prefix: Option<String>,
    local: String,
}

impl QName {
    fn matches(&self, node: &XmlNode) -> bool {
        node.is_named(self.namespace.as_deref(), self.prefix.as_deref(), &self.local)
    }

    fn matches_attr(&self, attr: &XmlAttribute) -> bool {
        if attr.local_name() != self.local {
            return false;
        }
        match &attr.namespace {
            Some(ns) => self.namespace.as_deref() == Some(ns.as_str()),
            None => attr.prefix() == self.prefix.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
enum Pattern {
    Any,
    Name(QName),
}

impl Pattern {
    fn matches(&self, node: &XmlNode) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Name(name) => name.matches(node),
        }
    }
}

#[derive(Debug, Clone)]
enum Step {
    SelfNode,
    Child(Pattern),
}

#[derive(Debug, Clone)]
struct NodePath {
    steps: Vec<Step>,
    attribute: Option<QName>,
}

impl NodePath {
    fn select<'n>(&self, ctx: &'n XmlNode) -> Vec<&'n XmlNode> {
        let mut current = vec![ctx];
        for step in &self.steps {
            let next: Vec<&'n XmlNode> = match step {
                Step::SelfNode => current,
                Step::Child(pattern) => current
                    .into_iter()
                    .flat_map(|node| node.elements().filter(move |child| pattern.matches(child)))
                    .collect(),
            };
            current = next;
        }
        current
    }

    fn value(&self, ctx: &XmlNode) -> Option<String> {
        let node = *self.select(ctx).first()?;
        match &self.attribute {
            Some(name) => node
                .attributes
                .iter()
                .find(|a| name.matches_attr(a))
                .map(|a| a.value.clone()),
            None => Some(node.text_content()),
        }
    }

    fn exists(&self, ctx: &XmlNode) -> bool {
        match self.attribute {
            Some(_) => self.value(ctx).is_some(),
            None => !self.select(ctx).is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
enum Test {
    Exists(NodePath),
    Equals(NodePath, String),
}

impl Test {
    fn holds(&self, ctx: &XmlNode) -> bool {
        match self {
            Test::Exists(path) => path.exists(ctx),
            Test::Equals(path, literal) => path.value(ctx).as_deref() == Some(literal.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LetterGrouping {
    Split,
    Word,
}

#[derive(Debug, Clone)]
enum Instr {
    Literal {
        name: String,
        attributes: Vec<(String, String)>,
        body: Vec<Instr>,
    },
    Text(String),
    Apply {
        select: Option<NodePath>,
        mode: Option<String>,
        between: Vec<Instr>,
    },
    ValueOf {
        select: NodePath,
        default: Option<String>,
    },
    Tokens(LetterGrouping),
    If {
        test: Test,
        body: Vec<Instr>,
    },
    Choose {
        branches: Vec<(Test, Vec<Instr>)>,
        otherwise: Vec<Instr>,
    },
}

#[derive(Debug, Clone)]
struct Template {
    patterns: Vec<Pattern>,
    mode: Option<String>,
    body: Vec<Instr>,
}

/// Compiled OMML → MathML rule set.
///
/// Immutable once loaded, so one instance can serve any number of
/// concurrent conversions.
#[derive(Debug, Clone)]
pub struct MathTransformer {
    templates: Vec<Template>,
}

impl MathTransformer {
    /// Compile a stylesheet; returns `None` (with a warning) when it is not
    /// a valid rule set.
    pub fn load(stylesheet: &str) -> Option<Self> {
        match compile(stylesheet) {
            Ok(transformer) => Some(transformer),
            Err(reason) => {
                log::warn!("Math stylesheet rejected: {}", reason);
                None
            }
        }
    }

    /// Load a stylesheet from disk; `None` when missing or invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let loaded = Self::load(&text);
                if loaded.is_some() {
                    log::info!("Loaded math stylesheet from {}", path.display());
                }
                loaded
            }
            Err(e) => {
                log::warn!("Math stylesheet not found at {}: {}", path.display(), e);
                None
            }
        }
    }

    /// The bundled OMML → MathML rules, compiled on first use.
    pub fn bundled() -> Option<&'static MathTransformer> {
        BUNDLED
            .get_or_init(|| Self::load(BUNDLED_STYLESHEET))
            .as_ref()
    }

    /// Number of template rules.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Transform an OMML fragment into MathML.
    pub fn transform(&self, omml: &str) -> Option<String> {
        self.try_transform(omml).ok()
    }

    /// Transform an OMML fragment, reporting why it failed.
    pub fn try_transform(&self, omml: &str) -> Result<String, TransformError> {
        let root = xml::parse(omml)?.ok_or(TransformError::EmptyInput)?;
        self.transform_node(&root)
    }

    /// Transform an already parsed OMML element.
    pub fn transform_node(&self, root: &XmlNode) -> Result<String, TransformError> {
        let mut out = Vec::new();
        self.apply_templates(root, None, &mut out, 0)?;

        let mut mathml = String::new();
        for child in &out {
            if let XmlChild::Element(node) = child {
                mathml.push_str(&node.to_xml());
            }
        }
        if mathml.is_empty() {
            return Err(TransformError::EmptyOutput);
        }
        Ok(mathml)
    }

    fn find_template(&self, node: &XmlNode, mode: Option<&str>) -> Option<&Template> {
        self.templates
            .iter()
            .find(|t| t.mode.as_deref() == mode && t.patterns.iter().any(|p| p.matches(node)))
    }

    fn apply_templates(
        &self,
        node: &XmlNode,
        mode: Option<&str>,
        out: &mut Vec<XmlChild>,
        depth: usize,
    ) -> Result<(), TransformError> {
        if depth > MAX_DEPTH {
            return Err(TransformError::TooDeep);
        }
        match self.find_template(node, mode) {
            Some(template) => self.run(&template.body, node, out, depth + 1),
            None => {
                for child in node.elements() {
                    self.apply_templates(child, mode, out, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    fn run(
        &self,
        body: &[Instr],
        ctx: &XmlNode,
        out: &mut Vec<XmlChild>,
        depth: usize,
    ) -> Result<(), TransformError> {
        for instr in body {
            match instr {
                Instr::Literal {
                    name,
                    attributes,
                    body,
                } => {
                    let mut element = XmlNode::new(name.clone());
                    element.attributes = attributes
                        .iter()
                        .map(|(name, value)| XmlAttribute {
                            name: name.clone(),
                            namespace: None,
                            value: value.clone(),
                        })
                        .collect();
                    self.run(body, ctx, &mut element.children, depth)?;
                    out.push(XmlChild::Element(element));
                }
                Instr::Text(text) => push_text(out, text),
                Instr::Apply {
                    select,
                    mode,
                    between,
                } => {
                    let targets = match select {
                        Some(path) => path.select(ctx),
                        None => ctx.elements().collect(),
                    };
                    for (i, target) in targets.into_iter().enumerate() {
                        if i > 0 {
                            self.run(between, ctx, out, depth)?;
                        }
                        self.apply_templates(target, mode.as_deref(), out, depth + 1)?;
                    }
                }
                Instr::ValueOf { select, default } => {
                    if let Some(value) = select.value(ctx).or_else(|| default.clone()) {
                        push_text(out, &value);
                    }
                }
                Instr::Tokens(grouping) => tokenize(&ctx.text_content(), *grouping, out),
                Instr::If { test, body } => {
                    if test.holds(ctx) {
                        self.run(body, ctx, out, depth)?;
                    }
                }
                Instr::Choose {
                    branches,
                    otherwise,
                } => {
                    let branch = branches
                        .iter()
                        .find(|(test, _)| test.holds(ctx))
                        .map(|(_, body)| body)
                        .unwrap_or(otherwise);
                    self.run(branch, ctx, out, depth)?;
                }
            }
        }
        Ok(())
    }
}

fn push_text(out: &mut Vec<XmlChild>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(XmlChild::Text(existing)) => existing.push_str(text),
        _ => out.push(XmlChild::Text(text.to_string())),
    }
}

fn token(name: &str, text: String) -> XmlChild {
    let mut node = XmlNode::new(name);
    node.children.push(XmlChild::Text(text));
    XmlChild::Element(node)
}

fn is_operator(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '=' | '<' | '>' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '/' | '*'
            | ',' | ';' | ':' | '!' | '?' | '~' | '^' | '%' | '&' | '\'' | '.'
            | '\u{00B1}' | '\u{00B7}' | '\u{00D7}' | '\u{00F7}' | '\u{2032}' | '\u{2033}'
            | '\u{2061}'..='\u{2064}'
    ) || ('\u{2190}'..='\u{22FF}').contains(&c)
        || ('\u{27C0}'..='\u{27EF}').contains(&c)
        || ('\u{2980}'..='\u{2AFF}').contains(&c)
}

/// Split math run text into MathML token elements.
fn tokenize(text: &str, grouping: LetterGrouping, out: &mut Vec<XmlChild>) {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_digit()
                    || (chars[i] == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())))
            {
                i += 1;
            }
            out.push(token("mn", chars[start..i].iter().collect()));
            continue;
        }

        if is_operator(c) {
            out.push(token("mo", c.to_string()));
            i += 1;
            continue;
        }

        if grouping == LetterGrouping::Word && c.is_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_alphabetic() {
                i += 1;
            }
            out.push(token("mi", chars[start..i].iter().collect()));
            continue;
        }

        out.push(token("mi", c.to_string()));
        i += 1;
    }
}

/// Namespace bindings declared on the stylesheet root.
struct Compiler {
    bindings: Vec<(String, String)>,
}

fn compile(stylesheet: &str) -> Result<MathTransformer, String> {
    let root = xml::parse(stylesheet)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "stylesheet is empty".to_string())?;

    if !is_instruction(&root, "stylesheet") {
        return Err(format!("unexpected root element <{}>", root.name));
    }

    let compiler = Compiler {
        bindings: root
            .attributes
            .iter()
            .filter_map(|a| {
                a.name
                    .strip_prefix("xmlns:")
                    .map(|p| (p.to_string(), a.value.clone()))
            })
            .collect(),
    };

    let mut templates = Vec::new();
    for node in root.elements() {
        if !is_instruction(node, "template") {
            return Err(format!("unexpected <{}> in stylesheet", node.name));
        }
        templates.push(compiler.template(node)?);
    }

    if templates.is_empty() {
        return Err("stylesheet has no templates".to_string());
    }
    Ok(MathTransformer { templates })
}

fn is_instruction(node: &XmlNode, local: &str) -> bool {
    node.namespace.as_deref() == Some(RULES_NS) && node.local_name() == local
}

impl Compiler {
    fn qname(&self, raw: &str) -> Result<QName, String> {
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self
                    .bindings
                    .iter()
                    .find(|(p, _)| p == prefix)
                    .map(|(_, uri)| uri.clone())
                    .ok_or_else(|| format!("undeclared prefix in '{}'", raw))?;
                Ok(QName {
                    namespace: Some(namespace),
                    prefix: Some(prefix.to_string()),
                    local: local.to_string(),
                })
            }
            None => Ok(QName {
                namespace: None,
                prefix: None,
                local: raw.to_string(),
            }),
        }
    }

    fn pattern(&self, raw: &str) -> Result<Pattern, String> {
        if raw == "*" {
            Ok(Pattern::Any)
        } else {
            self.qname(raw).map(Pattern::Name)
        }
    }

    fn path(&self, raw: &str) -> Result<NodePath, String> {
        let mut steps = Vec::new();
        let mut attribute = None;
        let segments: Vec<&str> = raw.trim().split('/').collect();
        for (i, segment) in segments.iter().enumerate() {
            let segment = segment.trim();
            if let Some(attr) = segment.strip_prefix('@') {
                if i + 1 != segments.len() {
                    return Err(format!("attribute step must be last in '{}'", raw));
                }
                attribute = Some(self.qname(attr)?);
            } else if segment == "." {
                steps.push(Step::SelfNode);
            } else if segment.is_empty() {
                return Err(format!("empty step in '{}'", raw));
            } else {
                steps.push(Step::Child(self.pattern(segment)?));
            }
        }
        Ok(NodePath { steps, attribute })
    }

    fn test(&self, raw: &str) -> Result<Test, String> {
        match raw.split_once('=') {
            Some((path, literal)) => {
                let literal = literal.trim();
                let unquoted = literal
                    .strip_prefix('\'')
                    .and_then(|l| l.strip_suffix('\''))
                    .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
                    .ok_or_else(|| format!("unquoted literal in test '{}'", raw))?;
                Ok(Test::Equals(self.path(path)?, unquoted.to_string()))
            }
            None => Ok(Test::Exists(self.path(raw)?)),
        }
    }

    fn template(&self, node: &XmlNode) -> Result<Template, String> {
        let patterns = node
            .attr("match")
            .ok_or_else(|| "template without match".to_string())?
            .split_whitespace()
            .map(|p| self.pattern(p))
            .collect::<Result<Vec<_>, _>>()?;
        if patterns.is_empty() {
            return Err("template with empty match".to_string());
        }
        Ok(Template {
            patterns,
            mode: node.attr("mode").map(str::to_string),
            body: self.body(node)?,
        })
    }

    fn body(&self, node: &XmlNode) -> Result<Vec<Instr>, String> {
        let mut body = Vec::new();
        for child in &node.children {
            match child {
                XmlChild::Text(text) if text.trim().is_empty() => {}
                XmlChild::Text(text) => body.push(Instr::Text(text.clone())),
                XmlChild::Element(element) if element.namespace.as_deref() == Some(RULES_NS) => {
                    body.push(self.instruction(element)?)
                }
                XmlChild::Element(element) => body.push(Instr::Literal {
                    name: element.name.clone(),
                    attributes: element
                        .attributes
                        .iter()
                        .filter(|a| !a.name.starts_with("xmlns:"))
                        .map(|a| (a.name.clone(), a.value.clone()))
                        .collect(),
                    body: self.body(element)?,
                }),
            }
        }
        Ok(body)
    }

    fn required<'a>(&self, node: &'a XmlNode, attr: &str) -> Result<&'a str, String> {
        node.attr(attr)
            .ok_or_else(|| format!("<{}> requires '{}'", node.name, attr))
    }

    fn instruction(&self, node: &XmlNode) -> Result<Instr, String> {
        match node.local_name() {
            "apply" => {
                let mut between = Vec::new();
                for child in node.elements() {
                    if is_instruction(child, "between") {
                        between = self.body(child)?;
                    } else {
                        return Err(format!("unexpected <{}> inside <{}>", child.name, node.name));
                    }
                }
                Ok(Instr::Apply {
                    select: node.attr("select").map(|s| self.path(s)).transpose()?,
                    mode: node.attr("mode").map(str::to_string),
                    between,
                })
            }
            "value-of" => Ok(Instr::ValueOf {
                select: self.path(self.required(node, "select")?)?,
                default: node.attr("default").map(str::to_string),
            }),
            "tokens" => match node.attr("letters").unwrap_or("split") {
                "split" => Ok(Instr::Tokens(LetterGrouping::Split)),
                "word" => Ok(Instr::Tokens(LetterGrouping::Word)),
                other => Err(format!("unknown letter grouping '{}'", other)),
            },
            "if" => Ok(Instr::If {
                test: self.test(self.required(node, "test")?)?,
                body: self.body(node)?,
            }),
            "choose" => {
                let mut branches = Vec::new();
                let mut otherwise = Vec::new();
                for child in node.elements() {
                    if is_instruction(child, "when") {
                        branches.push((self.test(self.required(child, "test")?)?, self.body(child)?));
                    } else if is_instruction(child, "otherwise") {
                        otherwise = self.body(child)?;
                    } else {
                        return Err(format!("unexpected <{}> inside <{}>", child.name, node.name));
                    }
                }
                Ok(Instr::Choose {
                    branches,
                    otherwise,
                })
            }
            other => Err(format!("unknown instruction '{}'", other)),
        }
    }
}
