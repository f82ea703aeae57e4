use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use std::io;

const VOID_ELEMENTS: [&str; 15] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content must reach the output byte for byte.
const VERBATIM_ELEMENTS: [&str; 5] = ["pre", "script", "style", "template", "textarea"];

/// A parsed page. Attribute updates go straight into the tree.
pub struct HtmlDocument {
    dom: RcDom,
}

/// Handle to one element of an [`HtmlDocument`].
#[derive(Clone)]
pub struct Element(Handle);

impl HtmlDocument {
    /// Parses raw page bytes; invalid UTF-8 is replaced, never rejected.
    pub fn parse(content: &[u8]) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .one(content);
        Self { dom }
    }

    /// All elements named `tag`, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<Element> {
        let mut found = Vec::new();
        collect_elements(&self.dom.document, tag, &mut found);
        found
    }

    /// Serializes the document as parsed, without added whitespace.
    pub fn to_html(&self) -> io::Result<String> {
        let document: SerializableHandle = self.dom.document.clone().into();
        let mut out = Vec::new();
        serialize(&mut out, &document, SerializeOpts::default())?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Serializes one tag per line, children indented by one space.
    pub fn to_pretty_html(&self) -> io::Result<String> {
        let mut out = String::new();
        write_pretty(&self.dom.document, 0, &mut out)?;
        Ok(out)
    }

    pub fn render(&self, prettify: bool) -> io::Result<String> {
        if prettify {
            self.to_pretty_html()
        } else {
            self.to_html()
        }
    }
}

impl Element {
    pub fn tag(&self) -> String {
        match self.0.data {
            NodeData::Element { ref name, .. } => name.local.to_string(),
            _ => String::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        match self.0.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| &*attr.name.local == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    /// Overwrites `name`, adding the attribute when the element lacks it.
    pub fn set_attr(&self, name: &str, value: &str) {
        if let NodeData::Element { ref attrs, .. } = self.0.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
                Some(attr) => attr.value = StrTendril::from_slice(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value: StrTendril::from_slice(value),
                }),
            }
        }
    }

    /// True when the whitespace-separated attribute `name` contains `token`,
    /// compared case-insensitively (as `rel` values are).
    pub fn has_attr_token(&self, name: &str, token: &str) -> bool {
        self.attr(name)
            .map(|value| {
                value
                    .split_ascii_whitespace()
                    .any(|item| item.eq_ignore_ascii_case(token))
            })
            .unwrap_or(false)
    }
}

fn collect_elements(handle: &Handle, tag: &str, found: &mut Vec<Element>) {
    if let NodeData::Element { ref name, .. } = handle.data {
        if &*name.local == tag {
            found.push(Element(handle.clone()));
        }
    }
    for child in handle.children.borrow().iter() {
        collect_elements(child, tag, found);
    }
}

fn write_pretty(handle: &Handle, depth: usize, out: &mut String) -> io::Result<()> {
    let indent = " ".repeat(depth);

    match handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                write_pretty(child, depth, out)?;
            }
        }
        NodeData::Doctype { ref name, .. } => {
            out.push_str(&format!("<!DOCTYPE {}>\n", name));
        }
        NodeData::Text { ref contents } => {
            let contents = contents.borrow();
            let text = contents.trim();
            if !text.is_empty() {
                out.push_str(&format!("{}{}\n", indent, escape(text, false)));
            }
        }
        NodeData::Comment { ref contents } => {
            out.push_str(&format!("{}<!--{}-->\n", indent, contents));
        }
        NodeData::Element { ref name, ref attrs, .. } => {
            let tag = &*name.local;

            if VERBATIM_ELEMENTS.contains(&tag) {
                out.push_str(&indent);
                out.push_str(&serialize_node(handle)?);
                out.push('\n');
                return Ok(());
            }

            out.push_str(&indent);
            out.push('<');
            out.push_str(tag);
            for attr in attrs.borrow().iter() {
                let attr_name = match attr.name.prefix {
                    Some(ref prefix) => format!("{}:{}", prefix, attr.name.local),
                    None => attr.name.local.to_string(),
                };
                out.push_str(&format!(" {}=\"{}\"", attr_name, escape(&attr.value, true)));
            }
            out.push_str(">\n");

            if VOID_ELEMENTS.contains(&tag) {
                return Ok(());
            }

            for child in handle.children.borrow().iter() {
                write_pretty(child, depth + 1, out)?;
            }
            out.push_str(&format!("{}</{}>\n", indent, tag));
        }
        NodeData::ProcessingInstruction { .. } => {}
    }

    Ok(())
}

fn serialize_node(handle: &Handle) -> io::Result<String> {
    let node: SerializableHandle = handle.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    let mut out = Vec::new();
    serialize(&mut out, &node, opts)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn escape(text: &str, attr_mode: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '\u{00A0}' => escaped.push_str("&nbsp;"),
            '"' if attr_mode => escaped.push_str("&quot;"),
            '<' if !attr_mode => escaped.push_str("&lt;"),
            '>' if !attr_mode => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}
