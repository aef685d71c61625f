//! Mutable model of the host page.
//!
//! A [`Document`] wraps a parsed `scraper::Html` and edits its node tree in
//! place: annotation and panel nodes are created as orphans, then appended
//! or detached through `tree.get_mut`. Queries take compiled
//! [`Selector`]s and serialization goes through `ElementRef::html`.
//!
//! Detached nodes stay in the tree but are unreachable from the root, so
//! queries never see them. Every child-list change bumps
//! [`Document::version`], which stands in for a subtree mutation observer.

use std::sync::atomic::{AtomicU64, Ordering};

use ego_tree::{NodeMut, NodeRef};
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(1);

/// Handle to a node of a [`Document`].
///
/// A handle remembers which document handed it out. Passing it to any other
/// document (for instance the page loaded after a navigation) is treated as
/// a missing node: lookups return `None` and mutations do nothing. Clones of
/// a document accept each other's handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    document: u64,
    node: ego_tree::NodeId,
}

/// An editable page
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
    tag: u64,
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::parse_html("")
    }
}

impl Document {
    /// Parse a full HTML document. Parsing never fails; malformed markup is
    /// recovered the way browsers do, and `html`, `head` and `body` are
    /// always present.
    pub fn parse_html(source: &str) -> Self {
        Self::from_html(Html::parse_document(source))
    }

    pub fn from_html(html: Html) -> Self {
        Document {
            html,
            tag: NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed),
            version: 0,
        }
    }

    /// The underlying parsed tree
    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root(&self) -> NodeId {
        self.handle(self.html.tree.root().id())
    }

    /// Structural change counter; bumped whenever a child list changes
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn body(&self) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .map(|el| self.handle(el.id()))
    }

    fn handle(&self, node: ego_tree::NodeId) -> NodeId {
        NodeId {
            document: self.tag,
            node,
        }
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        if id.document != self.tag {
            return None;
        }
        self.html.tree.get(id.node)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_, Node>> {
        if id.document != self.tag {
            return None;
        }
        self.html.tree.get_mut(id.node)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        ElementRef::wrap(self.node(id)?)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.value().name())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.value().attr(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|el| el.value().classes().any(|c| c == class))
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.rewrite_attrs(id, |attrs| {
            let value = StrTendril::from_slice(value);
            match attrs.iter_mut().find(|a| &*a.name.local == name) {
                Some(attr) => attr.value = value,
                None => attrs.push(Attribute {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value,
                }),
            }
        });
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if self.attr(id, name).is_some() {
            self.rewrite_attrs(id, |attrs| attrs.retain(|a| &*a.name.local != name));
        }
    }

    // Elements cache their id and class list, so attribute edits rebuild
    // the element value.
    fn rewrite_attrs(&mut self, id: NodeId, edit: impl FnOnce(&mut Vec<Attribute>)) {
        let Some(mut node) = self.node_mut(id) else {
            return;
        };
        let Node::Element(el) = node.value() else {
            return;
        };
        let mut attrs: Vec<Attribute> = el
            .attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        edit(&mut attrs);
        let rebuilt = Element::new(el.name.clone(), attrs);
        *node.value() = Node::Element(rebuilt);
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent().map(|p| self.handle(p.id()))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|n| n.children().map(|c| self.handle(c.id())).collect())
            .unwrap_or_default()
    }

    /// Whether `id` is still reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let root = self.html.tree.root().id();
        self.node(id)
            .is_some_and(|n| n.id() == root || n.ancestors().any(|a| a.id() == root))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.node(id)
            .map(|n| {
                n.descendants()
                    .filter_map(|d| d.value().as_text())
                    .map(|t| &*t.text)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text of `id`, leaving out every subtree whose root matches `skip`
    pub fn text_content_excluding(&self, id: NodeId, skip: &Selector) -> String {
        let mut out = String::new();
        if let Some(node) = self.node(id) {
            collect_text(node, skip, &mut out);
        }
        out
    }

    /// Replace the children of `id` with a single text node.
    ///
    /// Writing the text an element already holds is not a change and leaves
    /// the version untouched.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.value().is_element() {
            return;
        }
        let children: Vec<ego_tree::NodeId> = node.children().map(|c| c.id()).collect();
        if children.is_empty() && text.is_empty() {
            return;
        }
        if let [only] = children.as_slice() {
            let same = self
                .html
                .tree
                .get(*only)
                .and_then(|n| n.value().as_text())
                .is_some_and(|t| &*t.text == text);
            if same {
                return;
            }
        }

        for child in children {
            if let Some(mut child) = self.html.tree.get_mut(child) {
                child.detach();
            }
        }
        if !text.is_empty() {
            if let Some(mut node) = self.node_mut(id) {
                node.append(Node::Text(Text {
                    text: StrTendril::from_slice(text),
                }));
            }
        }
        self.version += 1;
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = QualName::new(
            None,
            Namespace::from(HTML_NAMESPACE),
            LocalName::from(tag.to_ascii_lowercase()),
        );
        let id = self.html.tree.orphan(Node::Element(Element::new(name, Vec::new()))).id();
        self.handle(id)
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = self
            .html
            .tree
            .orphan(Node::Text(Text {
                text: StrTendril::from_slice(text),
            }))
            .id();
        self.handle(id)
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere. Refuses to create cycles.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let (Some(parent_ref), Some(child_ref)) = (self.node(parent), self.node(child)) else {
            return;
        };
        let child_node = child_ref.id();
        if child_node == self.html.tree.root().id()
            || parent_ref.id() == child_node
            || parent_ref.ancestors().any(|a| a.id() == child_node)
        {
            return;
        }
        if let Some(mut parent) = self.node_mut(parent) {
            parent.append_id(child_node);
            self.version += 1;
        }
    }

    /// Detach `id` from its parent
    pub fn remove(&mut self, id: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        if let Some(mut node) = self.node_mut(id) {
            node.detach();
            self.version += 1;
        }
    }

    /// First attached element whose `id` attribute equals `id_attr`
    pub fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(id_attr))
            .map(|el| self.handle(el.id()))
    }

    /// Elements below `scope` matching `selector`, in document order
    pub fn select_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(scope) = self.node(scope) else {
            return Vec::new();
        };
        scope
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .map(|el| self.handle(el.id()))
            .collect()
    }

    pub fn select_first(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.node(scope)?
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el))
            .map(|el| self.handle(el.id()))
    }

    /// First direct element child of `id` matching `selector`
    pub fn child_matching(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        self.node(id)?
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el))
            .map(|el| self.handle(el.id()))
    }

    /// Serialize the whole document (the doctype is not emitted)
    pub fn to_html(&self) -> String {
        self.html
            .tree
            .root()
            .children()
            .filter_map(ElementRef::wrap)
            .map(|el| el.html())
            .collect()
    }

    /// Serialize one element and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        self.element(id).map(|el| el.html()).unwrap_or_default()
    }
}

fn collect_text(node: NodeRef<'_, Node>, skip: &Selector, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(_) => {
                if ElementRef::wrap(child).is_some_and(|el| skip.matches(&el)) {
                    continue;
                }
                collect_text(child, skip, out);
            }
            _ => {}
        }
    }
}
