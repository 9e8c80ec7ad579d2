// Reader for annotation database documents
//
// <root>
//   <item name="foo.Bar int compute(int) 0">
//     <annotation name="androidx.annotation.IntRange">
//       <val name="from" val="0" />
//     </annotation>
//   </item>
// </root>

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedAnnotation {
    pub name: String,
    /// Attribute values with entities resolved
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedItem {
    /// The `name` attribute exactly as written, entities still escaped
    pub name: Option<String>,
    pub annotations: Vec<ImportedAnnotation>,
    /// 1-based line of the `<item>` tag
    pub line: usize,
}

impl ImportedItem {
    /// Any annotation carries an `apis` value: kept even when the API
    /// database no longer lists the member
    pub fn is_historic(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| a.attributes.iter().any(|(name, _)| name == "apis"))
    }
}

/// Why a document could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Parse one document into its items.
///
/// Elements other than `item`, `annotation` and `val` are ignored, but the
/// whole document must be well formed.
pub fn parse_document(text: &str) -> Result<Vec<ImportedItem>, ParseFailure> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut current_item: Option<ImportedItem> = None;
    let mut current_annotation: Option<ImportedAnnotation> = None;
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| failure(text, reader.buffer_position(), e.to_string()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                match e.name().as_ref() {
                    b"item" => {
                        if let Some(item) = current_item.take() {
                            items.push(item);
                        }
                        let item = ImportedItem {
                            name: raw_attribute(e, b"name"),
                            annotations: Vec::new(),
                            line: line_of(text, position),
                        };
                        if empty {
                            items.push(item);
                        } else {
                            current_item = Some(item);
                        }
                    }
                    b"annotation" => {
                        let annotation = ImportedAnnotation {
                            name: unescaped_attribute(e, b"name")
                                .map_err(|message| failure(text, position, message))?
                                .unwrap_or_default(),
                            attributes: Vec::new(),
                        };
                        match (empty, current_item.as_mut()) {
                            (true, Some(item)) => item.annotations.push(annotation),
                            (false, _) => current_annotation = Some(annotation),
                            (true, None) => {}
                        }
                    }
                    b"val" => {
                        if let Some(annotation) = current_annotation.as_mut() {
                            let name = unescaped_attribute(e, b"name")
                                .map_err(|message| failure(text, position, message))?;
                            let value = unescaped_attribute(e, b"val")
                                .map_err(|message| failure(text, position, message))?;
                            if let (Some(name), Some(value)) = (name, value) {
                                annotation.attributes.push((name, value));
                            }
                        }
                    }
                    _ => {}
                }
                if !empty {
                    depth += 1;
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match e.name().as_ref() {
                    b"annotation" => {
                        if let (Some(annotation), Some(item)) =
                            (current_annotation.take(), current_item.as_mut())
                        {
                            item.annotations.push(annotation);
                        }
                    }
                    b"item" => {
                        if let Some(item) = current_item.take() {
                            items.push(item);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(failure(
                        text,
                        text.len(),
                        format!("{} unclosed element(s) at end of document", depth),
                    ));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn raw_attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn unescaped_attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(|err| err.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn failure(text: &str, position: usize, message: String) -> ParseFailure {
    let position = position.min(text.len());
    let line = line_of(text, position);
    let line_start = text[..position].rfind('\n').map(|i| i + 1).unwrap_or(0);
    ParseFailure {
        message,
        line,
        column: text[line_start..position].chars().count() + 1,
    }
}

fn line_of(text: &str, position: usize) -> usize {
    let position = position.min(text.len());
    text.as_bytes()[..position].iter().filter(|&&b| b == b'\n').count() + 1
}
