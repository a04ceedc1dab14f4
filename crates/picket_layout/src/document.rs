//! Host element tree
//!
//! `Document` is the element tree a host UI layer exposes to the toolkit. It
//! answers the three questions the primitives need:
//!
//! - where two elements sit relative to each other in document order
//! - where an element currently is on screen (layout bounds minus scrolling)
//! - when any scrollable ancestor scrolls
//!
//! The handle is cheap to clone; all clones see the same tree.
//!
//! # Example
//!
//! ```ignore
//! use picket_layout::document::Document;
//!
//! let doc = Document::new();
//! let list = doc.create_element("ul");
//! doc.append_child(doc.body(), list)?;
//!
//! let a = doc.create_element("li");
//! let b = doc.create_element("li");
//! doc.append_child(list, b)?;
//! doc.insert_before(list, a, Some(b))?;
//!
//! assert_eq!(doc.compare_position(a, b), Some(Ordering::Less));
//! ```

use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use picket_core::Rect;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle to an element in a [`Document`]
    pub struct NodeId;
    /// Handle to a registered scroll listener
    pub struct ListenerId;
}

/// Errors from tree manipulation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),
    #[error("node {child:?} cannot be inserted under its own descendant {parent:?}")]
    HierarchyCycle { parent: NodeId, child: NodeId },
    #[error("node {reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
}

/// Which pass of scroll dispatch a listener runs in
///
/// Capture listeners see every scroll in the document, bubble listeners only
/// see scrolling of the body itself (element scrolls do not bubble).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerPhase {
    Capture,
    Bubble,
}

/// A scroll that happened on `target`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollEvent {
    pub target: NodeId,
    pub delta_x: f32,
    pub delta_y: f32,
}

/// Scroll listener callback
pub type ScrollCallback = Arc<dyn Fn(&Document, &ScrollEvent) + Send + Sync>;

#[derive(Debug)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Position in the parent's `children`
    index: usize,
    /// Layout bounds in unscrolled document coordinates
    bounds: Rect,
    /// Scroll offset applied to descendants
    scroll: (f32, f32),
}

struct Listener {
    phase: ListenerPhase,
    callback: ScrollCallback,
}

struct DocumentInner {
    nodes: RwLock<SlotMap<NodeId, NodeData>>,
    listeners: RwLock<SlotMap<ListenerId, Listener>>,
    body: NodeId,
}

/// Shared handle to a host element tree
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("body", &self.inner.body)
            .field("nodes", &self.read_nodes().len())
            .field("listeners", &self.read_listeners().len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only a body element
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeData {
            tag: "body".to_string(),
            parent: None,
            children: Vec::new(),
            index: 0,
            bounds: Rect::default(),
            scroll: (0.0, 0.0),
        });

        Self {
            inner: Arc::new(DocumentInner {
                nodes: RwLock::new(nodes),
                listeners: RwLock::new(SlotMap::with_key()),
                body,
            }),
        }
    }

    fn read_nodes(&self) -> RwLockReadGuard<'_, SlotMap<NodeId, NodeData>> {
        self.inner.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_nodes(&self) -> RwLockWriteGuard<'_, SlotMap<NodeId, NodeData>> {
        self.inner.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_listeners(&self) -> RwLockReadGuard<'_, SlotMap<ListenerId, Listener>> {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_listeners(&self) -> RwLockWriteGuard<'_, SlotMap<ListenerId, Listener>> {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The top-level element everything connected hangs from
    pub fn body(&self) -> NodeId {
        self.inner.body
    }

    /// Whether two handles point at the same document
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.write_nodes().insert(NodeData {
            tag: tag.into(),
            parent: None,
            children: Vec::new(),
            index: 0,
            bounds: Rect::default(),
            scroll: (0.0, 0.0),
        })
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or last when `None`)
    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        let mut nodes = self.write_nodes();

        for id in [parent, child] {
            if !nodes.contains_key(id) {
                return Err(DocumentError::NodeNotFound(id));
            }
        }
        if child == parent || is_ancestor(&nodes, child, parent) {
            return Err(DocumentError::HierarchyCycle { parent, child });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if nodes.get(reference).and_then(|n| n.parent) != Some(parent) {
                return Err(DocumentError::NotAChild { parent, reference });
            }
        }

        unlink(&mut nodes, child);

        let index = match reference {
            Some(reference) => nodes[reference].index,
            None => nodes[parent].children.len(),
        };
        nodes[parent].children.insert(index, child);
        nodes[child].parent = Some(parent);
        reindex_from(&mut nodes, parent, index);
        Ok(())
    }

    /// Remove `node` from its parent, keeping it (and its subtree) alive
    pub fn detach(&self, node: NodeId) -> Result<(), DocumentError> {
        let mut nodes = self.write_nodes();
        if !nodes.contains_key(node) {
            return Err(DocumentError::NodeNotFound(node));
        }
        unlink(&mut nodes, node);
        Ok(())
    }

    /// Remove `node` and all its descendants from the document
    pub fn destroy(&self, node: NodeId) -> Result<(), DocumentError> {
        if node == self.inner.body {
            tracing::warn!("refusing to destroy the document body");
            return Ok(());
        }

        let mut nodes = self.write_nodes();
        if !nodes.contains_key(node) {
            return Err(DocumentError::NodeNotFound(node));
        }
        unlink(&mut nodes, node);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = nodes.remove(id) {
                stack.extend(data.children);
            }
        }
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.read_nodes().contains_key(node)
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.read_nodes().get(node).map(|n| n.tag.clone())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.read_nodes().get(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.read_nodes()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether `node` is attached under the body
    pub fn is_connected(&self, node: NodeId) -> bool {
        let nodes = self.read_nodes();
        nodes.contains_key(node) && root_of(&nodes, node) == self.inner.body
    }

    /// Relative document order of two elements
    ///
    /// An ancestor precedes its descendants, siblings follow child order.
    /// Elements in different trees (one of them detached, or removed) have
    /// no defined order and yield `None`.
    pub fn compare_position(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        let nodes = self.read_nodes();
        if !nodes.contains_key(a) || !nodes.contains_key(b) {
            return None;
        }
        if a == b {
            return Some(Ordering::Equal);
        }

        let chain_a = ancestor_chain(&nodes, a);
        let chain_b = ancestor_chain(&nodes, b);
        if chain_a.last() != chain_b.last() {
            return None;
        }

        // Walk down from the shared root to where the chains fork
        let mut below_a = chain_a.iter().rev();
        let mut below_b = chain_b.iter().rev();
        loop {
            match (below_a.next(), below_b.next()) {
                (Some(x), Some(y)) if x == y => continue,
                (Some(x), Some(y)) => return Some(nodes[*x].index.cmp(&nodes[*y].index)),
                // One chain ended first: that node is the other's ancestor
                (None, Some(_)) => return Some(Ordering::Less),
                (Some(_), None) => return Some(Ordering::Greater),
                (None, None) => return Some(Ordering::Equal),
            }
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Set the layout bounds of an element (unscrolled document coordinates)
    pub fn set_bounds(&self, node: NodeId, bounds: Rect) -> Result<(), DocumentError> {
        let mut nodes = self.write_nodes();
        let data = nodes.get_mut(node).ok_or(DocumentError::NodeNotFound(node))?;
        data.bounds = bounds;
        Ok(())
    }

    /// Current on-screen rectangle of an element
    ///
    /// Layout bounds shifted by the scroll offsets of every ancestor.
    pub fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        let nodes = self.read_nodes();
        let data = nodes.get(node)?;

        let (mut dx, mut dy) = (0.0, 0.0);
        let mut current = data.parent;
        while let Some(id) = current {
            let Some(ancestor) = nodes.get(id) else {
                break;
            };
            dx += ancestor.scroll.0;
            dy += ancestor.scroll.1;
            current = ancestor.parent;
        }
        Some(data.bounds.translate(-dx, -dy))
    }

    pub fn scroll_offset(&self, node: NodeId) -> Option<(f32, f32)> {
        self.read_nodes().get(node).map(|n| n.scroll)
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Scroll an element's content and dispatch the scroll event
    ///
    /// Capture listeners run first and see every scroll; bubble listeners
    /// only run when the body itself scrolled. No lock is held while
    /// listeners run, so they may query the document.
    pub fn scroll_by(&self, node: NodeId, delta_x: f32, delta_y: f32) -> Result<(), DocumentError> {
        {
            let mut nodes = self.write_nodes();
            let data = nodes.get_mut(node).ok_or(DocumentError::NodeNotFound(node))?;
            data.scroll.0 += delta_x;
            data.scroll.1 += delta_y;
        }

        let event = ScrollEvent {
            target: node,
            delta_x,
            delta_y,
        };
        let (capture, bubble): (Vec<_>, Vec<_>) = {
            let listeners = self.read_listeners();
            let mut capture = Vec::new();
            let mut bubble = Vec::new();
            for listener in listeners.values() {
                match listener.phase {
                    ListenerPhase::Capture => capture.push(Arc::clone(&listener.callback)),
                    ListenerPhase::Bubble => bubble.push(Arc::clone(&listener.callback)),
                }
            }
            (capture, bubble)
        };

        tracing::trace!(
            "scroll on {:?} by ({:.1}, {:.1}), {} capture listener(s)",
            node,
            delta_x,
            delta_y,
            capture.len()
        );

        for callback in capture {
            callback(self, &event);
        }
        if node == self.inner.body {
            for callback in bubble {
                callback(self, &event);
            }
        }
        Ok(())
    }

    /// Register a document-level scroll listener
    pub fn add_scroll_listener<F>(&self, phase: ListenerPhase, callback: F) -> ListenerId
    where
        F: Fn(&Document, &ScrollEvent) + Send + Sync + 'static,
    {
        self.write_listeners().insert(Listener {
            phase,
            callback: Arc::new(callback),
        })
    }

    /// Remove a scroll listener; returns false if it was already gone
    pub fn remove_scroll_listener(&self, id: ListenerId) -> bool {
        self.write_listeners().remove(id).is_some()
    }

    pub fn scroll_listener_count(&self) -> usize {
        self.read_listeners().len()
    }
}

fn unlink(nodes: &mut SlotMap<NodeId, NodeData>, node: NodeId) {
    let Some(data) = nodes.get_mut(node) else {
        return;
    };
    let Some(parent) = data.parent.take() else {
        return;
    };
    let index = data.index;
    if let Some(parent_data) = nodes.get_mut(parent) {
        if parent_data.children.get(index) == Some(&node) {
            parent_data.children.remove(index);
        } else {
            parent_data.children.retain(|c| *c != node);
        }
    }
    reindex_from(nodes, parent, index);
}

/// Refresh the stored sibling index of `parent`'s children from `start` on
fn reindex_from(nodes: &mut SlotMap<NodeId, NodeData>, parent: NodeId, start: usize) {
    let Some(children) = nodes.get_mut(parent).map(|p| std::mem::take(&mut p.children)) else {
        return;
    };
    for (index, child) in children.iter().enumerate().skip(start) {
        if let Some(data) = nodes.get_mut(*child) {
            data.index = index;
        }
    }
    nodes[parent].children = children;
}

fn is_ancestor(nodes: &SlotMap<NodeId, NodeData>, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = nodes.get(node).and_then(|n| n.parent);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = nodes.get(id).and_then(|n| n.parent);
    }
    false
}

fn root_of(nodes: &SlotMap<NodeId, NodeData>, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(parent) = nodes.get(current).and_then(|n| n.parent) {
        current = parent;
    }
    current
}

/// `node` followed by its ancestors, ending at the topmost one
fn ancestor_chain(nodes: &SlotMap<NodeId, NodeData>, node: NodeId) -> SmallVec<[NodeId; 16]> {
    let mut chain = SmallVec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        chain.push(id);
        current = nodes.get(id).and_then(|n| n.parent);
    }
    chain
}
