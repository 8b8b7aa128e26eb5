//! Serialization of a node tree back to SVG markup.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{NovaError, NovaResult};
use crate::tree::{NodeId, NodeKind, NodeTree, SVG_NS, XLINK_NS};

/// Prefix of the ids given to anonymous elements so the render tree can be
/// matched back to document nodes.
const LAYOUT_ID_PREFIX: &str = "__novasvg_";

pub(crate) struct WriteOptions<'a> {
    /// Extra stylesheets appended to the root as `<style>` elements.
    pub(crate) style_sheets: &'a [String],
    /// Give every element without an `id` a generated one.
    pub(crate) layout_ids: bool,
}

/// The id under which `id` appears in the render tree.
pub(crate) fn layout_key(tree: &NodeTree, id: NodeId) -> String {
    match tree[id].attribute("id") {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => format!("{LAYOUT_ID_PREFIX}{}", id.index()),
    }
}

pub(crate) fn write_svg(tree: &NodeTree, options: &WriteOptions<'_>) -> NovaResult<String> {
    let mut writer = Writer::new(Vec::with_capacity(4096));
    write_node(&mut writer, tree, tree.root(), options)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| NovaError::Export(format!("serialized SVG is not UTF-8: {e}")))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> NovaResult<()> {
    writer
        .write_event(event)
        .map_err(|e| NovaError::Export(format!("SVG serialization failed: {e}")))
}

fn text(content: &str) -> Event<'_> {
    Event::Text(BytesText::from_escaped(partial_escape(content)))
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    tree: &NodeTree,
    id: NodeId,
    options: &WriteOptions<'_>,
) -> NovaResult<()> {
    let node = &tree[id];
    let (tag, attributes) = match &node.kind {
        NodeKind::Text(content) => return emit(writer, text(content)),
        NodeKind::Element { tag, attributes } => (tag, attributes),
    };

    let is_root = id == tree.root();
    let mut start = BytesStart::new(tag.as_str());
    if is_root {
        start.push_attribute(("xmlns", SVG_NS));
        start.push_attribute(("xmlns:xlink", XLINK_NS));
    }
    for attr in attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }
    if options.layout_ids && node.attribute("id").map_or(true, str::is_empty) {
        start.push_attribute(("id", layout_key(tree, id).as_str()));
    }

    let style_sheets = if is_root { options.style_sheets } else { &[] };
    if node.children.is_empty() && style_sheets.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for &child in &node.children {
        write_node(writer, tree, child, options)?;
    }
    for css in style_sheets {
        emit(writer, Event::Start(BytesStart::new("style")))?;
        emit(writer, text(css))?;
        emit(writer, Event::End(BytesEnd::new("style")))?;
    }
    emit(writer, Event::End(BytesEnd::new(tag.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> WriteOptions<'static> {
        WriteOptions {
            style_sheets: &[],
            layout_ids: false,
        }
    }

    #[test]
    fn test_round_trip_markup() {
        let tree = NodeTree::parse(
            r#"<svg width="10" height="10"><g id="a"><rect x="1"/></g><text>A &amp; B</text></svg>"#,
        )
        .expect("parse");
        let svg = write_svg(&tree, &plain()).expect("write");
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.contains(r#"<g id="a"><rect x="1"/></g>"#));
        assert!(svg.contains("<text>A &amp; B</text>"));
        assert!(svg.ends_with("</svg>"));

        let reparsed = NodeTree::parse(&svg).expect("reparse");
        assert_eq!(reparsed.descendants(reparsed.root()).count(), 5);
    }

    #[test]
    fn test_attribute_escaping() {
        let tree = NodeTree::parse(r#"<svg><desc title="a &quot;b&quot; &lt;c&gt;"/></svg>"#)
            .expect("parse");
        let svg = write_svg(&tree, &plain()).expect("write");
        assert!(svg.contains(r#"title="a &quot;b&quot; &lt;c&gt;""#));
    }

    #[test]
    fn test_layout_ids_only_for_anonymous_elements() {
        let tree = NodeTree::parse(r#"<svg><rect id="keep"/><circle/></svg>"#).expect("parse");
        let svg = write_svg(
            &tree,
            &WriteOptions {
                style_sheets: &[],
                layout_ids: true,
            },
        )
        .expect("write");
        assert!(svg.contains(r#"<rect id="keep"/>"#));
        assert!(svg.contains(r#"<circle id="__novasvg_2"/>"#));
        assert_eq!(layout_key(&tree, NodeId(1)), "keep");
    }

    #[test]
    fn test_style_sheets_appended_to_root() {
        let tree = NodeTree::parse("<svg/>").expect("parse");
        let sheets = vec!["g > rect { fill: red }".to_string()];
        let svg = write_svg(
            &tree,
            &WriteOptions {
                style_sheets: &sheets,
                layout_ids: false,
            },
        )
        .expect("write");
        assert!(svg.ends_with("<style>g &gt; rect { fill: red }</style></svg>"));
    }

    #[test]
    fn test_character_data_keeps_quotes() {
        let tree = NodeTree::parse("<svg><text>it's \"quoted\" &amp; &lt;b&gt;</text></svg>")
            .expect("parse");
        let sheets = vec![r#"[id="a"] { fill: red }"#.to_string()];
        let svg = write_svg(
            &tree,
            &WriteOptions {
                style_sheets: &sheets,
                layout_ids: false,
            },
        )
        .expect("write");
        assert!(svg.contains(r#"<text>it's "quoted" &amp; &lt;b&gt;</text>"#));
        assert!(svg.contains(r#"<style>[id="a"] { fill: red }</style>"#));
        NodeTree::parse(&svg).expect("reparse");
    }
}
