//! XML parsing and serialization for the document tree.
//!
//! Built on quick-xml events. Elements, attributes, text, and CDATA map
//! onto the tree model; the XML declaration is captured and re-emitted.
//! Comments and processing instructions are outside the data model and
//! are dropped on parse.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::model::{DocumentTree, NodeId, NodeKind};

/// Parse an XML string into a document tree.
pub fn parse(input: &str) -> Result<DocumentTree> {
    let parse_err = |e: &dyn std::fmt::Display| Error::XmlParse(e.to_string());

    let mut reader = Reader::from_str(input);
    let mut tree = DocumentTree::new();
    let mut stack = vec![tree.root()];

    loop {
        match reader.read_event().map_err(|e| parse_err(&e))? {
            Event::Start(e) => {
                let element = element_node(&mut tree, &e)?;
                tree.append_child(*stack.last().expect("document root"), element);
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = element_node(&mut tree, &e)?;
                tree.append_child(*stack.last().expect("document root"), element);
            }
            Event::End(_) => {
                if stack.len() <= 1 {
                    return Err(Error::XmlParse("unexpected closing tag".to_string()));
                }
                stack.pop();
            }
            Event::Text(e) => {
                let content = e.unescape().map_err(|e| parse_err(&e))?;
                if !content.is_empty() {
                    let text = tree.create_text(&content);
                    tree.append_child(*stack.last().expect("document root"), text);
                }
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                let content = std::str::from_utf8(&bytes).map_err(|e| parse_err(&e))?;
                let text = tree.create_text(content);
                tree.append_child(*stack.last().expect("document root"), text);
            }
            Event::Decl(e) => {
                tree.set_declaration(Some(declaration_text(&e)?));
            }
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if stack.len() > 1 {
        return Err(Error::XmlParse("unclosed element".to_string()));
    }
    Ok(tree)
}

fn element_node(tree: &mut DocumentTree, start: &BytesStart<'_>) -> Result<NodeId> {
    let parse_err = |e: &dyn std::fmt::Display| Error::XmlParse(e.to_string());

    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| parse_err(&e))?
        .to_string();
    let element = tree.create_element(&name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_err(&e))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| parse_err(&e))?
            .to_string();
        let value = attr.unescape_value().map_err(|e| parse_err(&e))?;
        tree.set_attribute(element, &key, &value);
    }
    Ok(element)
}

fn declaration_text(decl: &quick_xml::events::BytesDecl<'_>) -> Result<String> {
    let parse_err = |e: &dyn std::fmt::Display| Error::XmlParse(e.to_string());

    let version = decl.version().map_err(|e| parse_err(&e))?;
    let mut out = format!(
        r#"<?xml version="{}""#,
        String::from_utf8_lossy(version.as_ref())
    );
    if let Some(encoding) = decl.encoding() {
        let encoding = encoding.map_err(|e| parse_err(&e))?;
        out.push_str(&format!(
            r#" encoding="{}""#,
            String::from_utf8_lossy(encoding.as_ref())
        ));
    }
    if let Some(standalone) = decl.standalone() {
        let standalone = standalone.map_err(|e| parse_err(&e))?;
        out.push_str(&format!(
            r#" standalone="{}""#,
            String::from_utf8_lossy(standalone.as_ref())
        ));
    }
    out.push_str("?>");
    Ok(out)
}

/// Serialize a document tree back to its text representation.
pub fn serialize(tree: &DocumentTree) -> Result<String> {
    let ser_err = |e: &dyn std::fmt::Display| Error::Serialization(e.to_string());

    let mut writer = Writer::new(Vec::new());
    for &child in tree.children(tree.root()) {
        write_node(&mut writer, tree, child)?;
    }
    let body = String::from_utf8(writer.into_inner()).map_err(|e| ser_err(&e))?;

    match tree.declaration() {
        Some(decl) => Ok(format!("{decl}\n{body}")),
        None => Ok(body),
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, tree: &DocumentTree, id: NodeId) -> Result<()> {
    let ser_err = |e: &dyn std::fmt::Display| Error::Serialization(e.to_string());

    match tree.kind(id) {
        NodeKind::Text(content) => writer
            .write_event(Event::Text(BytesText::new(content)))
            .map_err(|e| ser_err(&e))?,
        NodeKind::Element { tag, attrs } => {
            let mut start = BytesStart::new(tag.as_str());
            for (key, value) in attrs {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if tree.children(id).is_empty() {
                writer
                    .write_event(Event::Empty(start))
                    .map_err(|e| ser_err(&e))?;
            } else {
                writer
                    .write_event(Event::Start(start))
                    .map_err(|e| ser_err(&e))?;
                for &child in tree.children(id) {
                    write_node(writer, tree, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(tag.as_str())))
                    .map_err(|e| ser_err(&e))?;
            }
        }
        NodeKind::Document => {
            for &child in tree.children(id) {
                write_node(writer, tree, child)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_tree() {
        let tree = parse(r#"<doc><p class="lead">Il a dit «oui»</p><hr/></doc>"#).unwrap();
        let doc = tree.children(tree.root())[0];
        assert_eq!(tree.tag(doc), Some("doc"));
        let p = tree.children(doc)[0];
        assert_eq!(tree.attribute(p, "class"), Some("lead"));
        assert_eq!(tree.text_content(p), "Il a dit «oui»");
        let hr = tree.children(doc)[1];
        assert_eq!(tree.tag(hr), Some("hr"));
        assert!(tree.children(hr).is_empty());
    }

    #[test]
    fn test_serialize_preserves_structure_and_escaping() {
        let input = r#"<doc><p class="a &amp; b">x &lt; y</p><br/></doc>"#;
        let tree = parse(input).unwrap();
        assert_eq!(serialize(&tree).unwrap(), input);
    }

    #[test]
    fn test_declaration_is_kept() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<doc><p>a</p></doc>";
        let tree = parse(input).unwrap();
        let out = serialize(&tree).unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(out.ends_with("<doc><p>a</p></doc>"));
    }

    #[test]
    fn test_whitespace_between_elements_survives() {
        let input = "<doc>\n  <p>a</p>\n  <p>b</p>\n</doc>";
        let tree = parse(input).unwrap();
        assert_eq!(serialize(&tree).unwrap(), input);
    }

    #[test]
    fn test_cdata_becomes_text() {
        let tree = parse("<p><![CDATA[«brut»]]></p>").unwrap();
        let p = tree.children(tree.root())[0];
        assert_eq!(tree.text_content(p), "«brut»");
    }

    #[test]
    fn test_malformed_input_fails() {
        assert!(matches!(parse("<doc><p>a</doc>"), Err(Error::XmlParse(_))));
        assert!(matches!(parse("<doc>"), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_comments_are_dropped() {
        let tree = parse("<doc><!-- note --><p>a</p></doc>").unwrap();
        assert_eq!(serialize(&tree).unwrap(), "<doc><p>a</p></doc>");
    }
}
