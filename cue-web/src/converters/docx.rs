//! Word (`.docx`) writer for the cumulative standings
//!
//! Writes a minimal WordprocessingML package: one `Heading3` paragraph per
//! section followed by one numbered paragraph per rank group. Every section
//! gets its own numbering instance so numbering restarts at 1, and only the
//! number itself is bold. Players sharing a rank are joined with soft breaks.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::render::Section;
use super::ConvertError;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:lang w:val="nl-NL"/></w:rPr></w:rPrDefault></w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="0"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:color w:val="4F81BD"/></w:rPr></w:style>
</w:styles>"#;

/// Escape text for use inside an XML element or attribute
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn text_run(text: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
        xml_escape(text)
    )
}

fn numbering_xml(sections: usize) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="{}">"#,
        WORDML_NS
    );

    // All abstractNum elements must precede the num elements
    for id in 1..=sections {
        xml.push_str(&format!(
            concat!(
                r#"<w:abstractNum w:abstractNumId="{id}"><w:multiLevelType w:val="singleLevel"/>"#,
                r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/>"#,
                r#"<w:lvlText w:val="%1."/><w:suff w:val="space"/>"#,
                r#"<w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr>"#,
                r#"<w:rPr><w:b w:val="1"/></w:rPr></w:lvl></w:abstractNum>"#
            ),
            id = id
        ));
    }
    for id in 1..=sections {
        xml.push_str(&format!(
            r#"<w:num w:numId="{id}"><w:abstractNumId w:val="{id}"/></w:num>"#,
            id = id
        ));
    }

    xml.push_str("</w:numbering>");
    xml
}

fn document_xml(sections: &[Section]) -> String {
    let mut body = String::new();

    for (index, section) in sections.iter().enumerate() {
        let num_id = index + 1;
        body.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading3"/></w:pPr>{}</w:p>"#,
            text_run(&section.title)
        ));

        for group in section.groups.iter().filter(|g| !g.lines.is_empty()) {
            body.push_str(&format!(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="{}"/></w:numPr></w:pPr>"#,
                num_id
            ));
            for (i, line) in group.lines.iter().enumerate() {
                if i > 0 {
                    body.push_str("<w:r><w:br/></w:r>");
                }
                body.push_str(&text_run(line));
            }
            body.push_str("</w:p>");
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="{ns}"><w:body>{body}"#,
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>"#,
            r#"</w:sectPr></w:body></w:document>"#
        ),
        ns = WORDML_NS,
        body = body
    )
}

/// Package the sections as `.docx` bytes
pub fn write_topscorers_docx(sections: &[Section]) -> Result<Vec<u8>, ConvertError> {
    let parts: [(&str, String); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", PACKAGE_RELS_XML.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.to_string()),
        ("word/styles.xml", STYLES_XML.to_string()),
        ("word/numbering.xml", numbering_xml(sections.len())),
        ("word/document.xml", document_xml(sections)),
    ];

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content) in parts.iter() {
        writer
            .start_file(*name, options)
            .map_err(|e| ConvertError::Document(e.to_string()))?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| ConvertError::Document(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| ConvertError::Document(e.to_string()))?;
    Ok(cursor.into_inner())
}
