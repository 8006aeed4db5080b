//! Document arena - Index allocation for DOM-like nodes.
//!
//! Nodes are NOT objects. They are indices into one arena:
//! - Free index pool for O(1) reuse when nodes are destroyed
//! - Generation per slot, so an id outliving its node never resolves again
//! - Attribute nodes with their own identity, so they can be moved intact
//! - Parent/children links and a connected `body` root
//! - Layout rectangles in document coordinates plus a scroll position

use std::cell::RefCell;
use std::rc::Rc;

use taffy::geometry::{Point, Rect, Size};

// =============================================================================
// Identities
// =============================================================================

/// Index of a node in the document arena, plus the generation of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Identity of an attribute node. Survives moves between elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(u64);

/// An attribute node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    id: AttrId,
    name: String,
    value: String,
}

impl Attr {
    pub fn id(&self) -> AttrId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

// =============================================================================
// Arena State
// =============================================================================

struct NodeData {
    tag: String,
    attributes: Vec<Attr>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    box_size: Option<Size<f32>>,
    layout: Rect<f32>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            box_size: None,
            layout: zero_rect(),
        }
    }

    fn attr_position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|attr| attr.name == name)
    }
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

struct Dom {
    nodes: Vec<Slot>,
    free_indices: Vec<usize>,
    next_attr_id: u64,
    body: NodeId,
    viewport: Size<f32>,
    scroll: Point<f32>,
}

impl Dom {
    fn allocate(&mut self, data: NodeData) -> NodeId {
        // Reuse free index or allocate new
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.nodes[index];
            slot.data = Some(data);
            NodeId { index, generation: slot.generation }
        } else {
            self.nodes.push(Slot { generation: 0, data: Some(data) });
            NodeId { index: self.nodes.len() - 1, generation: 0 }
        }
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn next_attr_id(&mut self) -> AttrId {
        let id = AttrId(self.next_attr_id);
        self.next_attr_id += 1;
        id
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|n| n.parent) else { return };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn destroy(&mut self, id: NodeId) {
        let Some(children) = self.node(id).map(|n| n.children.clone()) else { return };

        // FIRST: Destroy all children (recursive!)
        for child in children {
            self.destroy(child);
        }

        self.detach(id);
        let slot = &mut self.nodes[id.index];
        slot.data = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index);
    }
}

fn zero_rect() -> Rect<f32> {
    Rect { left: 0.0, right: 0.0, top: 0.0, bottom: 0.0 }
}

// =============================================================================
// Document Handle
// =============================================================================

/// Shared handle to a document. Cloning is cheap and yields the same document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<Dom>>,
}

impl Document {
    /// Create a document with a connected `body` root.
    pub fn new(viewport: Size<f32>) -> Self {
        let mut body = NodeData::new("body");
        body.layout = Rect { left: 0.0, right: viewport.width, top: 0.0, bottom: viewport.height };
        Self {
            inner: Rc::new(RefCell::new(Dom {
                nodes: vec![Slot { generation: 0, data: Some(body) }],
                free_indices: Vec::new(),
                next_attr_id: 0,
                body: NodeId { index: 0, generation: 0 },
                viewport,
                scroll: Point { x: 0.0, y: 0.0 },
            })),
        }
    }

    /// The `body` root. Nodes under it are connected.
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    /// Check if two handles point to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Node lifecycle
    // -------------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().allocate(NodeData::new(tag))
    }

    /// Shallow clone: tag and attributes, no children.
    ///
    /// Copied attributes get fresh identities. Returns `None` for a
    /// destroyed node.
    pub fn clone_node(&self, node: NodeId) -> Option<NodeId> {
        let mut dom = self.inner.borrow_mut();
        let (tag, attributes, box_size) = {
            let source = dom.node(node)?;
            (source.tag.clone(), source.attributes.clone(), source.box_size)
        };
        let mut data = NodeData::new(&tag);
        data.box_size = box_size;
        for attr in attributes {
            let id = dom.next_attr_id();
            data.attributes.push(Attr { id, ..attr });
        }
        Some(dom.allocate(data))
    }

    /// Destroy a node and its subtree. The body cannot be destroyed.
    pub fn destroy_node(&self, node: NodeId) {
        let mut dom = self.inner.borrow_mut();
        if node == dom.body {
            return;
        }
        dom.destroy(node);
    }

    /// Check if the node is alive.
    pub fn exists(&self, node: NodeId) -> bool {
        self.inner.borrow().node(node).is_some()
    }

    /// Number of live nodes, body included.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.iter().filter(|slot| slot.data.is_some()).count()
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.inner.borrow().node(node).map(|n| n.tag.clone())
    }

    // -------------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------------

    /// Set an attribute value. An existing attribute node keeps its identity.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut dom = self.inner.borrow_mut();
        let fresh_id = dom.next_attr_id();
        let Some(data) = dom.node_mut(node) else { return };
        match data.attr_position(name) {
            Some(pos) => data.attributes[pos].value = value.to_string(),
            None => data.attributes.push(Attr {
                id: fresh_id,
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let dom = self.inner.borrow();
        let data = dom.node(node)?;
        data.attr_position(name).map(|pos| data.attributes[pos].value.clone())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        self.remove_attribute_node(node, name).is_some()
    }

    /// Detach an attribute node from an element and hand it back.
    pub fn remove_attribute_node(&self, node: NodeId, name: &str) -> Option<Attr> {
        let mut dom = self.inner.borrow_mut();
        let data = dom.node_mut(node)?;
        let pos = data.attr_position(name)?;
        Some(data.attributes.remove(pos))
    }

    /// Attach an attribute node, replacing any attribute of the same name.
    ///
    /// Returns the replaced node, if any.
    pub fn set_attribute_node(&self, node: NodeId, attr: Attr) -> Option<Attr> {
        let mut dom = self.inner.borrow_mut();
        let data = dom.node_mut(node)?;
        match data.attr_position(&attr.name) {
            Some(pos) => Some(std::mem::replace(&mut data.attributes[pos], attr)),
            None => {
                data.attributes.push(attr);
                None
            }
        }
    }

    /// Identity of the named attribute node.
    pub fn attribute_id(&self, node: NodeId, name: &str) -> Option<AttrId> {
        let dom = self.inner.borrow();
        let data = dom.node(node)?;
        data.attr_position(name).map(|pos| data.attributes[pos].id)
    }

    /// Attribute names in insertion order.
    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.attributes.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    /// Append `child` to `parent`, moving it from any previous parent.
    ///
    /// Appending a node into its own subtree is ignored.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut dom = self.inner.borrow_mut();
        if dom.node(parent).is_none() || dom.node(child).is_none() {
            return;
        }
        if dom.is_ancestor(child, parent) {
            return;
        }
        dom.detach(child);
        if let Some(data) = dom.node_mut(parent) {
            data.children.push(child);
        }
        if let Some(data) = dom.node_mut(child) {
            data.parent = Some(parent);
        }
    }

    /// Replace `old` with `new` in `parent`. Returns `false` if `old` is not
    /// a child of `parent`.
    pub fn replace_child(&self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        let mut dom = self.inner.borrow_mut();
        if new == old {
            return dom.node(old).and_then(|n| n.parent) == Some(parent);
        }
        if dom.node(old).and_then(|n| n.parent) != Some(parent) || dom.node(new).is_none() {
            return false;
        }
        if dom.is_ancestor(new, parent) {
            return false;
        }
        dom.detach(new);
        let Some(pos) = dom
            .node(parent)
            .and_then(|p| p.children.iter().position(|&c| c == old))
        else {
            return false;
        };
        if let Some(data) = dom.node_mut(parent) {
            data.children[pos] = new;
        }
        if let Some(data) = dom.node_mut(old) {
            data.parent = None;
        }
        if let Some(data) = dom.node_mut(new) {
            data.parent = Some(parent);
        }
        true
    }

    /// Detach a node from its parent.
    pub fn remove(&self, node: NodeId) {
        self.inner.borrow_mut().detach(node);
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Check if the node is in the display tree (its ancestors reach `body`).
    pub fn is_connected(&self, node: NodeId) -> bool {
        let dom = self.inner.borrow();
        dom.node(node).is_some() && dom.is_ancestor(dom.body, node)
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// Set an explicit box size used by layout.
    pub fn set_box_size(&self, node: NodeId, size: Size<f32>) {
        if let Some(data) = self.inner.borrow_mut().node_mut(node) {
            data.box_size = Some(size);
        }
    }

    pub fn box_size(&self, node: NodeId) -> Option<Size<f32>> {
        self.inner.borrow().node(node).and_then(|n| n.box_size)
    }

    /// Set the node's rectangle in document coordinates.
    pub fn set_layout(&self, node: NodeId, rect: Rect<f32>) {
        if let Some(data) = self.inner.borrow_mut().node_mut(node) {
            data.layout = rect;
        }
    }

    pub fn layout(&self, node: NodeId) -> Option<Rect<f32>> {
        self.inner.borrow().node(node).map(|n| n.layout)
    }

    /// The node's rectangle relative to the viewport.
    pub fn bounding_client_rect(&self, node: NodeId) -> Option<Rect<f32>> {
        let dom = self.inner.borrow();
        let layout = dom.node(node)?.layout;
        let scroll = dom.scroll;
        Some(Rect {
            left: layout.left - scroll.x,
            right: layout.right - scroll.x,
            top: layout.top - scroll.y,
            bottom: layout.bottom - scroll.y,
        })
    }

    pub fn viewport(&self) -> Size<f32> {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Size<f32>) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Move the scroll position. Does not emit any event.
    pub fn scroll_to(&self, x: f32, y: f32) {
        self.inner.borrow_mut().scroll = Point { x, y };
    }

    pub fn scroll_offset(&self) -> Point<f32> {
        self.inner.borrow().scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Document {
        Document::new(Size { width: 800.0, height: 600.0 })
    }

    #[test]
    fn test_create_and_reuse_index() {
        let doc = setup();

        let a = doc.create_element("img");
        let b = doc.create_element("img");
        assert_ne!(a, b);

        doc.destroy_node(a);
        assert!(!doc.exists(a));

        // Should reuse the freed index
        let c = doc.create_element("div");
        assert_eq!(c.index(), a.index());
        assert_eq!(doc.tag(c).as_deref(), Some("div"));
    }

    #[test]
    fn test_stale_id_does_not_reach_reused_slot() {
        let doc = setup();

        let a = doc.create_element("img");
        doc.set_attribute(a, "alt", "old");
        doc.destroy_node(a);

        let b = doc.create_element("img");
        assert_eq!(b.index(), a.index());
        assert_ne!(b, a);
        assert!(doc.exists(b));
        assert!(!doc.exists(a));

        // Writes through the stale id are dropped
        doc.set_attribute(a, "alt", "stale");
        assert!(!doc.has_attribute(b, "alt"));
        doc.destroy_node(a);
        assert!(doc.exists(b));
    }

    #[test]
    fn test_clone_node_copies_attributes_with_fresh_identity() {
        let doc = setup();

        let img = doc.create_element("img");
        doc.set_attribute(img, "src", "a.png");
        let copy = doc.clone_node(img).unwrap();

        assert_eq!(doc.get_attribute(copy, "src").as_deref(), Some("a.png"));
        assert_ne!(doc.attribute_id(img, "src"), doc.attribute_id(copy, "src"));
    }

    #[test]
    fn test_attribute_node_moves_intact() {
        let doc = setup();

        let from = doc.create_element("img");
        let to = doc.create_element("img");
        doc.set_attribute(from, "alt", "x");
        let id = doc.attribute_id(from, "alt");

        let attr = doc.remove_attribute_node(from, "alt").unwrap();
        doc.set_attribute_node(to, attr);

        assert!(!doc.has_attribute(from, "alt"));
        assert_eq!(doc.get_attribute(to, "alt").as_deref(), Some("x"));
        assert_eq!(doc.attribute_id(to, "alt"), id);
    }

    #[test]
    fn test_set_attribute_keeps_identity() {
        let doc = setup();

        let img = doc.create_element("img");
        doc.set_attribute(img, "alt", "x");
        let id = doc.attribute_id(img, "alt");
        doc.set_attribute(img, "alt", "y");

        assert_eq!(doc.attribute_id(img, "alt"), id);
        assert_eq!(doc.get_attribute(img, "alt").as_deref(), Some("y"));
    }

    #[test]
    fn test_append_moves_between_parents() {
        let doc = setup();

        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("img");

        doc.append_child(a, child);
        doc.append_child(b, child);

        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), vec![child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn test_replace_child() {
        let doc = setup();

        let parent = doc.create_element("span");
        let old = doc.create_element("img");
        let new = doc.create_element("img");
        doc.append_child(parent, old);

        assert!(doc.replace_child(parent, new, old));
        assert_eq!(doc.children(parent), vec![new]);
        assert_eq!(doc.parent(old), None);

        // Old is no longer a child
        assert!(!doc.replace_child(parent, old, old));
    }

    #[test]
    fn test_is_connected() {
        let doc = setup();

        let span = doc.create_element("span");
        let img = doc.create_element("img");
        doc.append_child(span, img);
        assert!(!doc.is_connected(img));

        doc.append_child(doc.body(), span);
        assert!(doc.is_connected(img));

        doc.remove(span);
        assert!(!doc.is_connected(img));
    }

    #[test]
    fn test_cycle_is_ignored() {
        let doc = setup();

        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner);
        doc.append_child(inner, outer);

        assert_eq!(doc.parent(outer), None);
    }

    #[test]
    fn test_destroy_subtree() {
        let doc = setup();

        let span = doc.create_element("span");
        let img = doc.create_element("img");
        doc.append_child(doc.body(), span);
        doc.append_child(span, img);

        doc.destroy_node(span);
        assert!(!doc.exists(span));
        assert!(!doc.exists(img));
        assert!(doc.children(doc.body()).is_empty());

        // Body survives
        doc.destroy_node(doc.body());
        assert!(doc.exists(doc.body()));
    }

    #[test]
    fn test_bounding_rect_follows_scroll() {
        let doc = setup();

        let img = doc.create_element("img");
        doc.set_layout(img, Rect { left: 10.0, right: 110.0, top: 700.0, bottom: 800.0 });

        doc.scroll_to(0.0, 300.0);
        let rect = doc.bounding_client_rect(img).unwrap();
        assert_eq!(rect.top, 400.0);
        assert_eq!(rect.bottom, 500.0);
        assert_eq!(rect.left, 10.0);
    }
}
