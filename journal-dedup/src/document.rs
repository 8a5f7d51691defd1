//! Owned XML tree for one fetched feed.
//!
//! The tree keeps everything it read (prolog, comments, whitespace, escaped
//! text) so that a document that is not modified serializes back to the same
//! markup. Entries are `item` (RSS) or `entry` (Atom) elements found either in
//! the channel or directly under the root, which covers RSS 2.0, RSS 1.0/RDF
//! and Atom layouts. The channel is the RSS `channel` element, or the root
//! itself when the root is an Atom `feed`.

use crate::namespaces::Namespaces;
use crate::types::{FeedError, Result};
use quick_xml::escape::{escape, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const ENTRY_NAMES: [&str; 2] = ["item", "entry"];
const CHANNEL_NAME: &str = "channel";
const ATOM_FEED_NAME: &str = "feed";

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Character data exactly as read, still escaped.
    Text(String),
    CData(String),
    /// Comments, processing instructions and the like, passed through untouched.
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct Element {
    /// Parse order of the element's start tag, unique within one document.
    ordinal: usize,
    start: BytesStart<'static>,
    namespace: Option<String>,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    fn new(ordinal: usize, start: BytesStart<'static>, namespace: Option<String>, self_closing: bool) -> Self {
        Self {
            ordinal,
            start,
            namespace,
            children: Vec::new(),
            self_closing,
        }
    }

    /// Qualified name as written in the source, e.g. `dc:date`.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }

    pub fn local_name(&self) -> String {
        String::from_utf8_lossy(self.start.local_name().into_inner()).into_owned()
    }

    /// Namespace URI the element was bound to when parsed.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is_entry(&self) -> bool {
        ENTRY_NAMES.contains(&self.local_name().as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Unescaped value of the first attribute with this local name.
    pub fn attribute(&self, local: &str) -> Option<String> {
        self.start
            .attributes()
            .with_checks(false)
            .flatten()
            .find(|attr| attr.key.local_name().into_inner() == local.as_bytes())
            .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
    }

    /// Character data directly inside this element, or `None` if it has none.
    pub fn text(&self) -> Option<String> {
        let mut text = String::new();
        let mut found = false;
        for child in &self.children {
            match child {
                Node::Text(raw) => {
                    found = true;
                    match unescape(raw) {
                        Ok(unescaped) => text.push_str(&unescaped),
                        Err(_) => text.push_str(raw),
                    }
                }
                Node::CData(raw) => {
                    found = true;
                    text.push_str(raw);
                }
                _ => {}
            }
        }
        found.then_some(text)
    }

    /// Replace the element's character data, keeping child elements.
    pub fn set_text(&mut self, text: &str) {
        self.children
            .retain(|child| !matches!(child, Node::Text(_) | Node::CData(_)));
        self.children.insert(0, Node::Text(escape(text).into_owned()));
        self.self_closing = false;
    }
}

/// Position of an entry in the tree: child indices from the root, plus the
/// entry's parse ordinal so a location never resolves to a different entry
/// once the tree has changed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryLocation {
    path: Vec<usize>,
    ordinal: usize,
}

impl EntryLocation {
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    fn points_at(&self, element: &Element) -> bool {
        element.is_entry() && element.ordinal == self.ordinal
    }
}

#[derive(Debug, Clone)]
pub struct FeedDocument {
    prolog: Vec<Event<'static>>,
    root: Element,
    epilog: Vec<Event<'static>>,
    /// Every `xmlns` declaration seen, as `(prefix, uri)`; the default namespace has prefix "".
    declared: Vec<(String, String)>,
}

impl FeedDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = NsReader::from_reader(bytes);
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut declared = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut ordinal = 0;

        loop {
            let position = reader.buffer_position();
            let (resolved, event) = match reader.read_resolved_event() {
                Ok(pair) => pair,
                Err(e) => {
                    return Err(FeedError::Parse(format!(
                        "XML parse error at position {}: {}",
                        position, e
                    )))
                }
            };
            let namespace = match resolved {
                ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
                _ => None,
            };

            match event {
                Event::Start(start) => {
                    collect_declarations(&start, &mut declared);
                    stack.push(Element::new(ordinal, start.into_owned(), namespace, false));
                    ordinal += 1;
                }
                Event::Empty(start) => {
                    collect_declarations(&start, &mut declared);
                    let element = Element::new(ordinal, start.into_owned(), namespace, true);
                    ordinal += 1;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        FeedError::Parse(format!("unexpected closing tag at position {}", position))
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(
                        String::from_utf8_lossy(&text.into_inner()).into_owned(),
                    )),
                    None => outside_root(&root, &mut prolog, &mut epilog, Event::Text(text.into_owned())),
                },
                Event::CData(data) => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::CData(
                        String::from_utf8_lossy(&data.into_inner()).into_owned(),
                    )),
                    None => outside_root(&root, &mut prolog, &mut epilog, Event::CData(data.into_owned())),
                },
                Event::Eof => break,
                other => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Other(other.into_owned())),
                    None => outside_root(&root, &mut prolog, &mut epilog, other.into_owned()),
                },
            }
        }

        if let Some(open) = stack.last() {
            return Err(FeedError::Parse(format!("unclosed element <{}>", open.name())));
        }
        let root = root.ok_or_else(|| FeedError::Parse("document has no root element".to_string()))?;

        debug!("Parsed feed document <{}> with {} namespace declarations", root.name(), declared.len());

        Ok(Self {
            prolog,
            root,
            epilog,
            declared,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn declared_namespaces(&self) -> &[(String, String)] {
        &self.declared
    }

    pub fn channel(&self) -> Option<&Element> {
        let path = self.channel_path()?;
        self.element_at(&path)
    }

    pub fn channel_mut(&mut self) -> Option<&mut Element> {
        let path = self.channel_path()?;
        self.element_at_mut(&path)
    }

    fn channel_path(&self) -> Option<Vec<usize>> {
        let root_name = self.root.local_name();
        if root_name == CHANNEL_NAME || root_name == ATOM_FEED_NAME {
            return Some(Vec::new());
        }
        self.root
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.local_name() == CHANNEL_NAME))
            .map(|index| vec![index])
    }

    /// Entry positions in document order.
    pub fn entry_locations(&self) -> Vec<EntryLocation> {
        let mut locations = Vec::new();
        for (i, node) in self.root.children.iter().enumerate() {
            let Node::Element(element) = node else {
                continue;
            };
            if element.is_entry() {
                locations.push(EntryLocation {
                    path: vec![i],
                    ordinal: element.ordinal,
                });
            } else if element.local_name() == CHANNEL_NAME {
                for (j, child) in element.children.iter().enumerate() {
                    if let Node::Element(entry) = child {
                        if entry.is_entry() {
                            locations.push(EntryLocation {
                                path: vec![i, j],
                                ordinal: entry.ordinal,
                            });
                        }
                    }
                }
            }
        }
        locations
    }

    pub fn entry(&self, location: &EntryLocation) -> Option<&Element> {
        self.element_at(&location.path)
            .filter(|element| location.points_at(element))
    }

    pub fn entries(&self) -> Vec<&Element> {
        self.entry_locations()
            .iter()
            .filter_map(|location| self.entry(location))
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_locations().len()
    }

    fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path {
            current = match current.children.get(index)? {
                Node::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path {
            current = match current.children.get_mut(index)? {
                Node::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Remove the entries at the given locations and return how many were removed.
    ///
    /// Locations are applied from last to first so earlier positions stay
    /// valid. A location whose entry is no longer at that position (already
    /// removed, or shifted by an earlier removal) is skipped. Removing an
    /// RSS 1.0 item also drops the channel's `rdf:li` references to it.
    pub fn remove_entries(&mut self, locations: &[EntryLocation]) -> usize {
        let mut ordered: Vec<&EntryLocation> = locations.iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut removed = 0;
        let mut removed_resources = HashSet::new();
        for location in ordered.into_iter().rev() {
            let Some((&index, parent_path)) = location.path.split_last() else {
                continue;
            };
            let Some(parent) = self.element_at_mut(parent_path) else {
                debug!("Entry parent {:?} no longer present, skipping", parent_path);
                continue;
            };
            if !matches!(parent.children.get(index), Some(Node::Element(e)) if location.points_at(e)) {
                debug!("Entry {} no longer at {:?}, skipping", location.ordinal, location.path);
                continue;
            }
            if let Node::Element(entry) = parent.children.remove(index) {
                if let Some(about) = entry.attribute("about") {
                    removed_resources.insert(about);
                }
                removed += 1;
            }
        }

        if !removed_resources.is_empty() {
            if let Some(channel) = self.channel_mut() {
                let pruned = prune_references(channel, &removed_resources);
                debug!("Pruned {} table-of-contents references", pruned);
            }
        }

        removed
    }

    /// Serialize the tree, writing namespaced names with the prefixes registered in `namespaces`.
    pub fn to_bytes(&self, namespaces: &Namespaces) -> Result<Vec<u8>> {
        let remap = namespaces.prefix_remap(&self.declared);
        let mut writer = Writer::new(Vec::new());
        for event in &self.prolog {
            writer.write_event(event.clone()).map_err(serialize_error)?;
        }
        write_element(&mut writer, &self.root, &remap)?;
        for event in &self.epilog {
            writer.write_event(event.clone()).map_err(serialize_error)?;
        }
        Ok(writer.into_inner())
    }
}

fn serialize_error(e: impl std::fmt::Display) -> FeedError {
    FeedError::Serialize(e.to_string())
}

fn collect_declarations(start: &BytesStart<'_>, declared: &mut Vec<(String, String)>) {
    for attr in start.attributes().with_checks(false).flatten() {
        let key = attr.key.as_ref();
        let prefix = if key == b"xmlns" {
            Some(String::new())
        } else {
            key.strip_prefix(b"xmlns:")
                .map(|prefix| String::from_utf8_lossy(prefix).into_owned())
        };
        if let Some(prefix) = prefix {
            let binding = (prefix, String::from_utf8_lossy(&attr.value).into_owned());
            if !declared.contains(&binding) {
                declared.push(binding);
            }
        }
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => {
            return Err(FeedError::Parse(format!(
                "second root element <{}>",
                element.name()
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn outside_root(
    root: &Option<Element>,
    prolog: &mut Vec<Event<'static>>,
    epilog: &mut Vec<Event<'static>>,
    event: Event<'static>,
) {
    if root.is_some() {
        epilog.push(event);
    } else {
        prolog.push(event);
    }
}

fn prune_references(element: &mut Element, resources: &HashSet<String>) -> usize {
    let before = element.children.len();
    element.children.retain(|child| match child {
        Node::Element(e) if e.local_name() == "li" => e
            .attribute("resource")
            .map(|resource| !resources.contains(&resource))
            .unwrap_or(true),
        _ => true,
    });
    let mut pruned = before - element.children.len();
    for child in element.child_elements_mut() {
        pruned += prune_references(child, resources);
    }
    pruned
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    remap: &HashMap<String, String>,
) -> Result<()> {
    let start = renamed_start(&element.start, remap);
    if element.self_closing && element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(serialize_error)?;
        return Ok(());
    }

    let end_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    writer.write_event(Event::Start(start)).map_err(serialize_error)?;
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(writer, child, remap)?,
            Node::Text(raw) => writer
                .write_event(Event::Text(BytesText::from_escaped(raw.as_str())))
                .map_err(serialize_error)?,
            Node::CData(raw) => writer
                .write_event(Event::CData(BytesCData::new(raw.as_str())))
                .map_err(serialize_error)?,
            Node::Other(event) => writer.write_event(event.clone()).map_err(serialize_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(end_name)))
        .map_err(serialize_error)?;
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Element,
    Attribute,
}

fn renamed_start(start: &BytesStart<'static>, remap: &HashMap<String, String>) -> BytesStart<'static> {
    if remap.is_empty() {
        return start.clone();
    }

    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut renamed = BytesStart::new(rename(&name, remap, NameKind::Element));
    for attr in start.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let key = rename(&key, remap, NameKind::Attribute);
        renamed.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: attr.value.clone(),
        });
    }
    renamed
}

fn rename(name: &str, remap: &HashMap<String, String>, kind: NameKind) -> String {
    let qualify = |prefix: &str, local: &str| {
        if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", prefix, local)
        }
    };

    if name == "xmlns" {
        return match remap.get("") {
            Some(prefix) if !prefix.is_empty() => format!("xmlns:{}", prefix),
            _ => name.to_string(),
        };
    }
    if let Some(declared) = name.strip_prefix("xmlns:") {
        return match remap.get(declared) {
            Some(prefix) if prefix.is_empty() => "xmlns".to_string(),
            Some(prefix) => format!("xmlns:{}", prefix),
            None => name.to_string(),
        };
    }
    match name.split_once(':') {
        Some((prefix, local)) => match remap.get(prefix) {
            Some(target) => qualify(target, local),
            None => name.to_string(),
        },
        None if kind == NameKind::Element => match remap.get("") {
            Some(target) => qualify(target, name),
            None => name.to_string(),
        },
        None => name.to_string(),
    }
}
