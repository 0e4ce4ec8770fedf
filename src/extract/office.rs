//! DOCX and PPTX text extraction.
//!
//! DOCX goes through `docx-rs`, which parses the package into a typed
//! document tree. PPTX is read part by part from the zip container and
//! walked with an XML event reader; no layout is kept.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use docx_rs::{read_docx, DocumentChild, InsertChild, ParagraphChild, Run, RunChild};
use regex::Regex;
use xml::reader::{EventReader, XmlEvent};
use zip::result::ZipError;
use zip::ZipArchive;

use super::{DocumentFormat, ExtractionError, Extractor};

static SLIDE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Extracts paragraph text from Word documents.
#[derive(Debug, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = std::fs::read(path)?;
        docx_text(&bytes)
    }
}

/// Text of every body paragraph, one line each (empty paragraphs included).
fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = read_docx(bytes)
        .map_err(|e| ExtractionError::ExtractionFailed(format!("invalid DOCX: {}", e)))?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            paragraph_text(&paragraph.children, &mut text);
            text.push('\n');
        }
    }
    Ok(text)
}

fn paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => run_text(run, out),
            ParagraphChild::Hyperlink(link) => paragraph_text(&link.children, out),
            // Tracked insertions are part of the current text; deletions are not
            ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let InsertChild::Run(run) = child {
                        run_text(run, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Run text; drawings (and the text boxes inside them) are not paragraph text.
fn run_text(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Extracts shape text from PowerPoint presentations.
#[derive(Debug, Default)]
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PptxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn extract_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let slides = slide_parts(&mut archive);

        let mut text = String::new();
        for part in slides {
            let xml = read_part(&mut archive, &part)?;
            let slide = slide_text(&xml).map_err(|e| ExtractionError::Xml {
                part: part.clone(),
                message: e.to_string(),
            })?;
            text.push_str(&slide);
        }
        Ok(text)
    }
}

/// Read one XML part from the container as text.
fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<String, ExtractionError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(ExtractionError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };

    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Slide part names in presentation order.
///
/// Uses the slide list in `presentation.xml`; falls back to the numeric
/// order of `ppt/slides/slideN.xml` when that cannot be resolved.
fn slide_parts(archive: &mut ZipArchive<File>) -> Vec<String> {
    if let Some(parts) = slide_parts_from_presentation(archive) {
        if !parts.is_empty() {
            return parts;
        }
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let num = SLIDE_PART.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((num, name.to_string()))
        })
        .collect();
    numbered.sort();
    numbered.into_iter().map(|(_, name)| name).collect()
}

fn slide_parts_from_presentation(archive: &mut ZipArchive<File>) -> Option<Vec<String>> {
    let presentation = read_part(archive, "ppt/presentation.xml").ok()?;
    let rels = read_part(archive, "ppt/_rels/presentation.xml.rels").ok()?;

    let ids = slide_ids(&presentation).ok()?;
    let targets = relationship_targets(&rels).ok()?;

    ids.iter()
        .map(|id| {
            targets.get(id).map(|target| match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("ppt/{}", target),
            })
        })
        .collect()
}

/// Relationship ids of `<p:sldId>` entries, in document order.
fn slide_ids(xml: &str) -> Result<Vec<String>, xml::reader::Error> {
    let mut ids = Vec::new();
    for event in EventReader::new(xml.as_bytes()) {
        if let XmlEvent::StartElement {
            name, attributes, ..
        } = event?
        {
            if name.local_name != "sldId" {
                continue;
            }
            // The numeric `id` is unqualified; the relationship is `r:id`
            if let Some(rel) = attributes
                .into_iter()
                .find(|a| a.name.local_name == "id" && a.name.namespace.is_some())
            {
                ids.push(rel.value);
            }
        }
    }
    Ok(ids)
}

/// Relationship id to target path.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, xml::reader::Error> {
    let mut targets = HashMap::new();
    for event in EventReader::new(xml.as_bytes()) {
        if let XmlEvent::StartElement {
            name, attributes, ..
        } = event?
        {
            if name.local_name != "Relationship" {
                continue;
            }
            let attr = |key: &str| {
                attributes
                    .iter()
                    .find(|a| a.name.local_name == key)
                    .map(|a| a.value.clone())
            };
            if let (Some(id), Some(target)) = (attr("Id"), attr("Target")) {
                targets.insert(id, target);
            }
        }
    }
    Ok(targets)
}

/// Text of every text-bearing shape on a slide. A shape's paragraphs are
/// joined with `\n` and the shape is followed by `\n`; `<a:br/>` becomes a
/// vertical tab.
fn slide_text(xml: &str) -> Result<String, xml::reader::Error> {
    let mut text = String::new();
    let mut in_shape = false;
    let mut in_text_body = false;
    let mut in_run_text = false;
    let mut paragraphs: Option<Vec<String>> = None;

    for event in EventReader::new(xml.as_bytes()) {
        match event? {
            XmlEvent::StartElement { name, .. } => match name.local_name.as_str() {
                "sp" => {
                    in_shape = true;
                    paragraphs = None;
                }
                "txBody" if in_shape => {
                    in_text_body = true;
                    paragraphs.get_or_insert_with(Vec::new);
                }
                "p" if in_text_body => {
                    if let Some(ref mut paragraphs) = paragraphs {
                        paragraphs.push(String::new());
                    }
                }
                "t" if in_text_body => in_run_text = true,
                "br" if in_text_body => {
                    if let Some(current) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                        current.push('\u{b}');
                    }
                }
                _ => {}
            },
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "t" => in_run_text = false,
                "txBody" => in_text_body = false,
                "sp" => {
                    if let Some(shape) = paragraphs.take() {
                        text.push_str(&shape.join("\n"));
                        text.push('\n');
                    }
                    in_shape = false;
                }
                _ => {}
            },
            XmlEvent::Characters(s) | XmlEvent::Whitespace(s) if in_run_text => {
                if let Some(current) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                    current.push_str(&s);
                }
            }
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    /// Minimal Word package around a `<w:body>` fragment.
    fn docx_package(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"
  xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
  xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
  xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#
        );
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.to_string(),
            ),
            (
                "word/_rels/document.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#.to_string(),
            ),
            ("word/document.xml", document),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in parts {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs() {
        let body = r#"
            <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
              <w:r><w:t>NVIDIA</w:t></w:r><w:r><w:t xml:space="preserve"> Omniverse</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>Kit</w:t><w:tab/><w:t>Nucleus</w:t><w:br/><w:t>Connectors</w:t></w:r></w:p>"#;

        assert_eq!(
            docx_text(&docx_package(body)).unwrap(),
            "NVIDIA Omniverse\n\nKit\tNucleus\nConnectors\n"
        );
    }

    #[test]
    fn test_docx_tracked_changes() {
        let body = r#"<w:p>
            <w:del w:id="1" w:author="a" w:date="2024-01-01T00:00:00Z"><w:r><w:delText>old</w:delText></w:r></w:del>
            <w:ins w:id="2" w:author="a" w:date="2024-01-01T00:00:00Z"><w:r><w:t>new</w:t></w:r></w:ins>
        </w:p>"#;
        assert_eq!(docx_text(&docx_package(body)).unwrap(), "new\n");
    }

    #[test]
    fn test_docx_text_box_keeps_surrounding_runs() {
        let body = r#"<w:p>
            <w:r><w:t>Before</w:t></w:r>
            <w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">
              <wp:extent cx="914400" cy="457200"/><wp:docPr id="1" name="Text Box 1"/>
              <a:graphic><a:graphicData uri="http://schemas.microsoft.com/office/word/2010/wordprocessingShape">
                <wps:wsp><wps:txbx><w:txbxContent>
                  <w:p><w:r><w:t>Inner</w:t></w:r></w:p>
                </w:txbxContent></wps:txbx></wps:wsp>
              </a:graphicData></a:graphic>
            </wp:inline></w:drawing></w:r>
            <w:r><w:t>After</w:t></w:r>
        </w:p>
        <w:p><w:r><w:t>Next</w:t></w:r></w:p>"#;

        assert_eq!(
            docx_text(&docx_package(body)).unwrap(),
            "BeforeAfter\nNext\n"
        );
    }

    #[test]
    fn test_docx_not_a_package() {
        assert!(matches!(
            docx_text(b"definitely not a zip"),
            Err(ExtractionError::ExtractionFailed(_))
        ));
    }

    fn slide(shapes: &str) -> String {
        format!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
  xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn test_slide_shapes() {
        let xml = slide(
            r#"<p:nvGrpSpPr/><p:grpSpPr/>
            <p:sp><p:nvSpPr/><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>
              <a:p><a:r><a:rPr lang="en-US"/><a:t>vGPU</a:t></a:r><a:r><a:t xml:space="preserve"> Overview</a:t></a:r></a:p>
            </p:txBody></p:sp>
            <p:sp><p:txBody><a:bodyPr/>
              <a:p><a:pPr lvl="1"/><a:r><a:t>Remote</a:t></a:r><a:br><a:rPr/></a:br><a:r><a:t>workstation</a:t></a:r></a:p>
              <a:p><a:endParaRPr/></a:p>
              <a:p><a:r><a:t>vPC &amp; vApps</a:t></a:r></a:p>
            </p:txBody></p:sp>
            <p:sp><p:spPr/></p:sp>
            <p:pic><p:blipFill/></p:pic>"#,
        );

        assert_eq!(
            slide_text(&xml).unwrap(),
            "vGPU Overview\nRemote\u{b}workstation\n\nvPC & vApps\n"
        );
    }

    #[test]
    fn test_grouped_shape_text() {
        let xml = slide(
            r#"<p:grpSp><p:nvGrpSpPr/>
              <p:sp><p:txBody><a:p><a:r><a:t>Nucleus</a:t></a:r></a:p></p:txBody></p:sp>
            </p:grpSp>
            <p:sp><p:txBody><a:p><a:r><a:t>Kit</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        assert_eq!(slide_text(&xml).unwrap(), "Nucleus\nKit\n");
    }

    #[test]
    fn test_slide_without_text() {
        assert_eq!(slide_text(&slide("")).unwrap(), "");
        assert!(slide_text("<p:sld><unclosed>").is_err());
    }

    #[test]
    fn test_presentation_order_parts() {
        let presentation = r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldIdLst><p:sldId id="256" r:id="rId3"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        assert_eq!(slide_ids(presentation).unwrap(), vec!["rId3", "rId2"]);

        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="slide" Target="slides/slide1.xml"/>
  <Relationship Id="rId3" Type="slide" Target="slides/slide2.xml"/></Relationships>"#;
        let targets = relationship_targets(rels).unwrap();
        assert_eq!(targets["rId3"], "slides/slide2.xml");
        assert_eq!(targets.len(), 2);
    }
}
