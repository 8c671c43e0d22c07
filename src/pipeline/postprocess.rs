//! Post-processing: cut the chapters out of a full DocBook book.
//!
//! `asciidoc -b docbook -d book` renders a complete `<book>` document. The
//! book fragments we ship are just its `<chapter>` subtrees behind a fixed
//! preamble, so the enclosing book can include them. Extraction is purely
//! byte-level: each chapter is copied verbatim from the input, together with
//! its tail text (the character data between `</chapter>` and the next
//! markup), which is what a tree serializer emits for an element.
//!
//! The whole buffer must still be well-formed; anything else is reported as
//! [`BatchError::MalformedXml`] and fails the task.

use crate::error::BatchError;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// Written ahead of the extracted chapters.
pub const DOCBOOK_PREAMBLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<!DOCTYPE book PUBLIC \"-//OASIS//DTD DocBook XML V4.5//EN\" \"http://www.oasis-open.org/docbook/xml/4.5/docbookx.dtd\">\n\
<?asciidoc-toc?>\n\
<?asciidoc-numbered?>\n";

const CHAPTER: &[u8] = b"chapter";

/// Parse `xml` and return every `chapter` element, verbatim, in document order.
///
/// Nested chapters are returned both inside their ancestor and on their own,
/// the same set a `//chapter` query selects.
///
/// # Errors
/// [`BatchError::MalformedXml`] when the buffer is not a single well-formed
/// element tree: mismatched or unclosed tags, bad attributes, a second root,
/// text outside the root, or no root at all.
pub fn extract_chapters(xml: &[u8]) -> Result<Vec<&[u8]>, BatchError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().check_end_names = true;
    reader.config_mut().trim_text(false);

    let mut depth = 0usize;
    let mut seen_root = false;
    // (start, end) byte span of each chapter, tail included once closed.
    let mut spans: Vec<(usize, usize)> = Vec::new();
    // (span index, depth) of chapters still open.
    let mut open: Vec<(usize, usize)> = Vec::new();
    // Chapters whose tail text is still being read.
    let mut tails: Vec<usize> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| BatchError::MalformedXml {
            position: reader.error_position() as u64,
            detail: e.to_string(),
        })?;
        let after = reader.buffer_position() as usize;

        let is_text = matches!(
            event,
            Event::Text(_) | Event::GeneralRef(_) | Event::CData(_)
        );
        if !is_text {
            for idx in tails.drain(..) {
                spans[idx].1 = before;
            }
        }

        match event {
            Event::Start(e) => {
                check_root(&mut seen_root, depth, before)?;
                check_attributes(&e, before)?;
                depth += 1;
                if e.name().as_ref() == CHAPTER {
                    spans.push((before, after));
                    open.push((spans.len() - 1, depth));
                }
            }
            Event::Empty(e) => {
                check_root(&mut seen_root, depth, before)?;
                check_attributes(&e, before)?;
                if e.name().as_ref() == CHAPTER {
                    spans.push((before, after));
                    tails.push(spans.len() - 1);
                }
            }
            Event::End(_) => {
                if let Some(&(idx, d)) = open.last() {
                    if d == depth {
                        open.pop();
                        spans[idx].1 = after;
                        tails.push(idx);
                    }
                }
                depth = depth.checked_sub(1).ok_or_else(|| BatchError::MalformedXml {
                    position: before as u64,
                    detail: "closing tag without an open element".into(),
                })?;
            }
            Event::Text(t) if depth == 0 => {
                if !t.iter().all(|b| b.is_ascii_whitespace()) {
                    return Err(BatchError::MalformedXml {
                        position: before as u64,
                        detail: "text outside the root element".into(),
                    });
                }
            }
            Event::GeneralRef(_) | Event::CData(_) if depth == 0 => {
                return Err(BatchError::MalformedXml {
                    position: before as u64,
                    detail: "character data outside the root element".into(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(BatchError::MalformedXml {
            position: xml.len() as u64,
            detail: format!("document ended with {depth} unclosed element(s)"),
        });
    }
    if !seen_root {
        return Err(BatchError::MalformedXml {
            position: xml.len() as u64,
            detail: "document has no root element".into(),
        });
    }

    debug!("extracted {} chapter(s)", spans.len());
    Ok(spans.into_iter().map(|(s, e)| &xml[s..e]).collect())
}

/// Preamble followed by `chapters`, concatenated with nothing in between.
pub fn render_fragment(chapters: &[&[u8]]) -> Vec<u8> {
    let body: usize = chapters.iter().map(|c| c.len()).sum();
    let mut out = Vec::with_capacity(DOCBOOK_PREAMBLE.len() + body);
    out.extend_from_slice(DOCBOOK_PREAMBLE.as_bytes());
    for chapter in chapters {
        out.extend_from_slice(chapter);
    }
    out
}

/// Parse a rendered book and build its chapter fragment in one step.
pub fn book_to_fragment(xml: &[u8]) -> Result<Vec<u8>, BatchError> {
    let chapters = extract_chapters(xml)?;
    Ok(render_fragment(&chapters))
}

fn check_root(seen_root: &mut bool, depth: usize, position: usize) -> Result<(), BatchError> {
    if depth == 0 {
        if *seen_root {
            return Err(BatchError::MalformedXml {
                position: position as u64,
                detail: "extra content after the root element".into(),
            });
        }
        *seen_root = true;
    }
    Ok(())
}

fn check_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    position: usize,
) -> Result<(), BatchError> {
    for attr in e.attributes() {
        attr.map_err(|err| BatchError::MalformedXml {
            position: position as u64,
            detail: err.to_string(),
        })?;
    }
    Ok(())
}
