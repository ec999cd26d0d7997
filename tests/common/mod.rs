//! Shared fixtures: in-memory .docx packages.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:m="http://schemas.openxmlformats.org/officeDocument/2006/math" "#,
    r#"xmlns:v="urn:schemas-microsoft-com:vml" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006""#,
);

/// Bytes standing in for `word/media/image1.png`.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Builder for a minimal Word package.
#[derive(Debug, Clone, Default)]
pub struct DocxBuilder {
    body: Option<String>,
    image_rels: Vec<(String, String)>,
    media: Vec<(String, Vec<u8>)>,
    extra: Vec<(String, Vec<u8>)>,
    with_rels: bool,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self {
            with_rels: true,
            ..Default::default()
        }
    }

    /// Set the content of `w:body`.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add an image relationship `id` → `target`.
    pub fn image_rel(mut self, id: &str, target: &str) -> Self {
        self.image_rels.push((id.to_string(), target.to_string()));
        self
    }

    /// Add a media part.
    pub fn media(mut self, path: &str, bytes: &[u8]) -> Self {
        self.media.push((path.to_string(), bytes.to_vec()));
        self
    }

    /// Add an arbitrary part.
    pub fn part(mut self, path: &str, bytes: &[u8]) -> Self {
        self.extra.push((path.to_string(), bytes.to_vec()));
        self
    }

    /// Leave out `word/_rels/document.xml.rels`.
    pub fn without_rels(mut self) -> Self {
        self.with_rels = false;
        self
    }

    /// Leave out `word/document.xml`.
    pub fn without_document(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();

            let mut put = |name: &str, data: &[u8]| {
                zip.start_file(name, options).unwrap();
                zip.write_all(data).unwrap();
            };

            put("[Content_Types].xml", CONTENT_TYPES.as_bytes());
            put("_rels/.rels", PACKAGE_RELS.as_bytes());

            if let Some(body) = &self.body {
                put("word/document.xml", document_xml(body).as_bytes());
            }

            if self.with_rels {
                let mut rels = String::from(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                );
                for (id, target) in &self.image_rels {
                    rels.push_str(&format!(
                        r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{}"/>"#,
                        id, target
                    ));
                }
                rels.push_str("</Relationships>");
                put("word/_rels/document.xml.rels", rels.as_bytes());
            }

            for (path, bytes) in self.media.iter().chain(&self.extra) {
                put(path, bytes);
            }

            drop(put);
            zip.finish().unwrap();
        }
        buffer
    }
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {}><w:body>{}</w:body></w:document>"#,
        NAMESPACES, body
    )
}

pub fn paragraph(runs: &str) -> String {
    format!("<w:p>{}</w:p>", runs)
}

pub fn text_run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
}

pub fn drawing_run(rel_id: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        rel_id
    )
}

pub fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl><w:tblPr/><w:tblGrid/>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str(&format!("<w:tc>{}</w:tc>", paragraph(&text_run(cell))));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// The end-to-end "Hello + image" package.
pub fn hello_with_image() -> DocxBuilder {
    DocxBuilder::new()
        .body(paragraph(&format!("{}{}", text_run("Hello "), drawing_run("rId1"))))
        .image_rel("rId1", "media/image1.png")
        .media("word/media/image1.png", PNG_BYTES)
}
