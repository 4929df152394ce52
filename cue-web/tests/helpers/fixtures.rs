//! Document fixtures built in memory with the `zip` crate

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Standings up to the previous round: Jansen (Heer) has 3 goals
pub const STANDINGS_TXT: &str = "Eerste klasse\n\n1. Jansen (Heer) - 3 doelpunten\n";

/// One match row of the `INVOER` sheet
pub struct MatchRow {
    pub home: &'static str,
    pub away: &'static str,
    pub goals: &'static str,
}

/// A division header followed by its match rows
pub struct RoundTable {
    pub division: &'static str,
    pub matches: Vec<MatchRow>,
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn text_cell(reference: &str, value: &str) -> String {
    format!(
        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
        reference,
        escape(value)
    )
}

fn zip_parts(parts: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

fn sheet_xml(tables: &[RoundTable]) -> String {
    let mut rows = String::new();
    let mut row = 1;

    for table in tables {
        rows.push_str(&format!(
            r#"<row r="{row}">{}{}</row>"#,
            text_cell(&format!("B{}", row), table.division),
            text_cell(&format!("F{}", row), "EINDSTAND"),
            row = row
        ));
        row += 1;

        for m in &table.matches {
            rows.push_str(&format!(
                r#"<row r="{row}">{}{}{}</row>"#,
                text_cell(&format!("B{}", row), m.home),
                text_cell(&format!("D{}", row), m.away),
                text_cell(&format!("L{}", row), m.goals),
                row = row
            ));
            row += 1;
        }

        // Blank row closes the table
        row += 1;
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        rows
    )
}

/// Minimal `.xlsx` with the tables on a sheet called `sheet_name`
pub fn round_workbook(sheet_name: &str, tables: &[RoundTable]) -> Vec<u8> {
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

    let package_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        escape(sheet_name)
    );

    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

    zip_parts(&[
        ("[Content_Types].xml", content_types.to_string()),
        ("_rels/.rels", package_rels.to_string()),
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", workbook_rels.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(tables)),
    ])
}

/// Minimal `.docx` with one paragraph per line
pub fn docx_from_paragraphs(lines: &[&str]) -> Vec<u8> {
    let body: String = lines
        .iter()
        .map(|line| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", escape(line)))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );
    zip_parts(&[("word/document.xml", document)])
}
