//! Text extraction from standings uploads (.txt, .docx, .doc)

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::{Cursor, Read};

use super::ConvertError;

/// Windows-1252 code points for bytes 0x80..=0x9F; `None` marks undefined bytes
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

static RTF_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\{\\rtf1.*?\n").expect("valid regex"));
static RTF_UNICODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u-?\d+\??").expect("valid regex"));
static RTF_CONTROL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[a-zA-Z]+\d* ?").expect("valid regex"));
static HORIZONTAL_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Paragraph ends, text runs and inline breaks inside `word/document.xml`
static DOCX_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:(br|cr|tab)\b[^>]*/>|</w:p>")
        .expect("valid regex")
});
static XML_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid regex"));

/// Extract plain text from an uploaded standings file
///
/// The declared filename selects the container: `.docx` and `.doc` get their
/// own readers, everything else is decoded as text.
pub fn extract_text_from_upload(raw: &[u8], filename: &str) -> Result<String, ConvertError> {
    let name = filename.to_lowercase();
    if name.ends_with(".docx") {
        return extract_docx_text(raw);
    }
    if name.ends_with(".doc") {
        return extract_doc_text(raw);
    }
    Ok(decode_text_best_effort(raw).trim().to_string())
}

/// UTF-8 (BOM stripped), falling back to Windows-1252
pub fn decode_text_best_effort(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(text) => text.to_string(),
        Err(_) => decode_cp1252(raw),
    }
}

/// Single-byte Windows-1252 decode; undefined bytes become U+FFFD
pub fn decode_cp1252(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize].unwrap_or('\u{FFFD}'),
            _ => b as char,
        })
        .collect()
}

/// Paragraph text of a `.docx` file, one non-empty line per paragraph
///
/// Table cells are paragraphs too, so they appear in document order.
pub fn extract_docx_text(raw: &[u8]) -> Result<String, ConvertError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(raw))
        .map_err(|e| ConvertError::Parse(format!("Kon Word-bestand niet openen: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ConvertError::Parse(format!("Word-bestand zonder documenttekst: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ConvertError::Parse(format!("Kon Word-bestand niet lezen: {}", e)))?;

    let mut lines: Vec<String> = Vec::new();
    let mut paragraph = String::new();

    for caps in DOCX_TOKEN_RE.captures_iter(&xml) {
        if let Some(text) = caps.get(1) {
            paragraph.push_str(&decode_xml_entities(text.as_str()));
        } else if let Some(kind) = caps.get(2) {
            paragraph.push(if kind.as_str() == "tab" { ' ' } else { '\n' });
        } else {
            push_lines(&mut lines, &paragraph);
            paragraph.clear();
        }
    }
    push_lines(&mut lines, &paragraph);

    Ok(lines.join("\n"))
}

fn push_lines(lines: &mut Vec<String>, paragraph: &str) {
    lines.extend(
        paragraph
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string),
    );
}

/// Decode the five predefined XML entities and numeric character references
pub fn decode_xml_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    XML_ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Best-effort reader for legacy Word `.doc` files
///
/// RTF payloads saved with a `.doc` extension are stripped of control words.
/// Binary files are decoded as UTF-16LE and as Windows-1252; the candidate with
/// the most standings vocabulary wins.
pub fn extract_doc_text(raw: &[u8]) -> Result<String, ConvertError> {
    if raw.starts_with(b"{\\rtf") {
        return Ok(strip_rtf(&decode_text_best_effort(raw)));
    }

    let utf16: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let candidates = [String::from_utf16_lossy(&utf16), decode_cp1252(raw)];

    let mut best = String::new();
    let mut best_score: Option<usize> = None;
    for candidate in candidates {
        let cleaned = clean_doc_candidate(&candidate);
        let score = doc_signal_score(&cleaned);
        if best_score.map_or(true, |s| score > s) {
            best = cleaned;
            best_score = Some(score);
        }
    }

    let best = BLANK_LINES_RE.replace_all(&best, "\n\n").trim().to_string();
    if best.is_empty() || best_score.unwrap_or(0) < 5 {
        return Err(ConvertError::UnreadableDoc);
    }
    Ok(best)
}

fn clean_doc_candidate(candidate: &str) -> String {
    candidate
        .chars()
        .filter(|&c| {
            matches!(c,
                '\t' | '\n' | '\r'
                | '\u{20}'..='\u{7E}'
                | '\u{A0}'..='\u{2FF}'
                | '\u{1E00}'..='\u{1EFF}')
        })
        .collect::<String>()
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

fn doc_signal_score(text: &str) -> usize {
    let lower = text.to_lowercase();
    lower.matches("klasse").count() * 10
        + lower.matches("divisie").count() * 10
        + lower.matches("doelpunt").count() * 4
        + lower.matches('\n').count()
}

/// Minimal RTF stripper, sufficient for flat RTF exports
pub fn strip_rtf(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = RTF_HEADER_RE.replace(&text, "");
    let text = RTF_UNICODE_RE.replace_all(&text, "");
    let text = RTF_CONTROL_RE.replace_all(&text, "");
    let text = text.replace(['{', '}'], "");
    let text = HORIZONTAL_WS_RE.replace_all(&text, " ");
    BLANK_LINES_RE.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        write!(
            writer,
            r#"<?xml version="1.0"?><w:document xmlns:w="x"><w:body>{}</w:body></w:document>"#,
            body
        )
        .unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_utf8_with_bom() {
        let raw = b"\xEF\xBB\xBFEerste klasse";
        assert_eq!(decode_text_best_effort(raw), "Eerste klasse");
    }

    #[test]
    fn test_cp1252_fallback() {
        // "Café – 3" in Windows-1252
        let raw = b"Caf\xE9 \x96 3";
        assert_eq!(decode_text_best_effort(raw), "Café – 3");
    }

    #[test]
    fn test_docx_paragraphs_and_breaks() {
        let raw = docx_with_body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading3"/></w:pPr><w:r><w:t>EERSTE KLASSE</w:t></w:r></w:p>
               <w:p><w:r><w:t xml:space="preserve">1. Jansen </w:t></w:r><w:r><w:t>(Heer) - 3 doelpunten</w:t></w:r><w:r><w:br/></w:r><w:r><w:t>Bakker (Bunde)</w:t></w:r></w:p>
               <w:p/>
               <w:p><w:r><w:t>D&amp;O&#39;s (Caesar)</w:t></w:r></w:p>"#,
        );

        let text = extract_docx_text(&raw).unwrap();

        assert_eq!(
            text,
            "EERSTE KLASSE\n1. Jansen (Heer) - 3 doelpunten\nBakker (Bunde)\nD&O's (Caesar)"
        );
    }

    #[test]
    fn test_docx_without_document_part_is_parse_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        let raw = writer.finish().unwrap().into_inner();

        let err = extract_docx_text(&raw).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn test_docx_garbage_is_parse_error() {
        let err = extract_text_from_upload(b"plain bytes", "stand.docx").unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[test]
    fn test_strip_rtf() {
        let rtf = "{\\rtf1\\ansi\\deff0\n{\\b Eerste klasse}\\par\n1. Jansen (Heer) - 3 doelpunten\\par\n}";
        let text = strip_rtf(rtf);
        assert!(text.contains("Eerste klasse"));
        assert!(text.contains("1. Jansen (Heer) - 3 doelpunten"));
        assert!(!text.contains('\\'));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_doc_utf16_heuristic() {
        let content = "Eerste klasse\n1. Jansen (Heer) - 3 doelpunten\nTweede klasse\n1. Bakker (Bunde) - 2 doelpunten\n";
        let mut raw: Vec<u8> = vec![0xD0, 0xCF, 0x11, 0xE0];
        for unit in content.encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }

        let text = extract_text_from_upload(&raw, "stand.DOC").unwrap();
        assert!(text.contains("Eerste klasse"));
        assert!(text.contains("Bakker (Bunde) - 2 doelpunten"));
    }

    #[test]
    fn test_doc_without_signal_is_unreadable() {
        let raw = vec![0u8; 64];
        assert_eq!(extract_doc_text(&raw).unwrap_err(), ConvertError::UnreadableDoc);
    }
}
