//! Component classes and instances
//!
//! A [`ComponentClass`] is a compiled template plus its mounting point
//! table, shared by every instance. A [`Component`] owns the DOM nodes built
//! from that template. While it is not mounted anywhere those nodes live
//! under an off-tree document fragment (the holder).
//!
//! Every mounting point becomes a slot with an anchor node. Slot content is
//! always kept immediately before its anchor, so the anchor marks the end of
//! the slot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ef_dom::{Fragment, NodeId, NodeType};
use serde_json::{Map, Value};

use crate::ast::{MountKind, TemplateNode};
use crate::error::{EngineError, Result};
use crate::mounting::{MountingPoint, MountingPointTable};
use crate::render_queue::JobKey;
use crate::{Context, MountOption};

/// Component state
pub type State = Map<String, Value>;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Element tags that instantiate a component class instead of an element
#[derive(Debug, Clone, Default)]
pub struct Scope {
    classes: HashMap<String, ComponentClass>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, tag: &str, class: ComponentClass) -> Self {
        self.insert(tag, class);
        self
    }

    pub fn insert(&mut self, tag: &str, class: ComponentClass) -> Option<ComponentClass> {
        self.classes.insert(tag.to_string(), class)
    }

    pub fn get(&self, tag: &str) -> Option<&ComponentClass> {
        self.classes.get(tag)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Compiled component class
#[derive(Clone)]
pub struct ComponentClass {
    inner: Rc<ClassInner>,
}

struct ClassInner {
    template: TemplateNode,
    table: MountingPointTable,
}

impl ComponentClass {
    pub(crate) fn define(template: TemplateNode, table: MountingPointTable) -> Self {
        Self {
            inner: Rc::new(ClassInner { template, table }),
        }
    }

    pub fn template(&self) -> &TemplateNode {
        &self.inner.template
    }

    pub fn mounting_points(&self) -> &MountingPointTable {
        &self.inner.table
    }

    pub fn mounting_point(&self, name: &str) -> Option<&MountingPoint> {
        self.inner.table.get(name)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Build a new instance.
    ///
    /// Construction and the initial update run inside one render bracket;
    /// if it is the outermost one, a single flush follows.
    pub fn instantiate(
        &self,
        ctx: &Context,
        initial_state: Option<State>,
        scope: Option<Scope>,
    ) -> Result<Component> {
        let _batch = ctx.queue().batch();
        let component = Component::build(self, ctx, scope.unwrap_or_default())?;
        if let Some(state) = initial_state {
            component.update(state)?;
        }
        Ok(component)
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("mounting_points", &self.inner.table.len())
            .finish()
    }
}

/// Top-level structure of an instance
enum Layout {
    Node(NodeId),
    Slot(usize),
    Child(Component),
    Group(Vec<Layout>),
}

enum Slot {
    Single { anchor: NodeId, content: SlotContent },
    List { anchor: NodeId, items: Vec<Component> },
}

enum SlotContent {
    Empty,
    Text(NodeId),
    Component(Component),
}

/// Where a component is mounted inside another one
struct MountSite {
    parent: Weak<RefCell<ComponentInner>>,
    slot: usize,
}

struct ComponentInner {
    id: ComponentId,
    class: ComponentClass,
    ctx: Context,
    scope: Scope,
    state: State,
    holder: NodeId,
    layout: Option<Layout>,
    slots: Vec<Slot>,
    slot_names: HashMap<String, usize>,
    children: Vec<Component>,
    site: Option<MountSite>,
    /// Created from a scoped tag; placed and torn down by its parent
    owned: bool,
    destroyed: bool,
}

impl ComponentInner {
    fn fragment(&self) -> Fragment {
        let mut out = Fragment::new();
        if let Some(layout) = &self.layout {
            push_layout(&self.slots, layout, &mut out);
        }
        out
    }
}

fn push_layout(slots: &[Slot], layout: &Layout, out: &mut Fragment) {
    match layout {
        Layout::Node(id) => out.push_node(*id),
        Layout::Slot(index) => {
            if let Some(slot) = slots.get(*index) {
                out.push_fragment(slot_fragment(slot));
            }
        }
        Layout::Child(child) => out.push_fragment(child.fragment()),
        Layout::Group(items) => {
            let mut group = Fragment::new();
            for item in items {
                push_layout(slots, item, &mut group);
            }
            out.push_fragment(group);
        }
    }
}

fn slot_fragment(slot: &Slot) -> Fragment {
    let mut out = Fragment::new();
    match slot {
        Slot::Single { anchor, content } => {
            match content {
                SlotContent::Empty => {}
                SlotContent::Text(node) => out.push_node(*node),
                SlotContent::Component(child) => out.push_fragment(child.fragment()),
            }
            out.push_node(*anchor);
        }
        Slot::List { anchor, items } => {
            for item in items {
                out.push_fragment(item.fragment());
            }
            out.push_node(*anchor);
        }
    }
    out
}

/// Text written into a single slot for a state value
fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Materializes a template into DOM nodes and slots
struct Builder<'a> {
    ctx: &'a Context,
    scope: &'a Scope,
    slots: Vec<Slot>,
    slot_names: HashMap<String, usize>,
    children: Vec<Component>,
}

impl Builder<'_> {
    fn build(&mut self, node: &TemplateNode) -> Result<Layout> {
        match node {
            TemplateNode::Text(text) => Ok(Layout::Node(self.ctx.dom_mut().create_text(text))),
            TemplateNode::Element { tag, attrs, children } => {
                if let Some(class) = self.scope.get(tag) {
                    // Scoped component: static attributes become its initial state
                    let state: State = attrs
                        .iter()
                        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                        .collect();
                    let child = class.instantiate(self.ctx, Some(state), None)?;
                    child.inner.borrow_mut().owned = true;
                    self.children.push(child.clone());
                    return Ok(Layout::Child(child));
                }

                let element = {
                    let mut dom = self.ctx.dom_mut();
                    let element = dom.create_element(tag);
                    if let Some(data) = dom.get_mut(element).and_then(|n| n.as_element_mut()) {
                        for (name, value) in attrs {
                            data.set_attr(name, value);
                        }
                    }
                    element
                };
                for child in children {
                    let layout = self.build(child)?;
                    let mut fragment = Fragment::new();
                    push_layout(&self.slots, &layout, &mut fragment);
                    fragment.append_to(&mut self.ctx.dom_mut(), element)?;
                }
                Ok(Layout::Node(element))
            }
            TemplateNode::Siblings(items) => {
                let group = items.iter().map(|item| self.build(item)).collect::<Result<_>>()?;
                Ok(Layout::Group(group))
            }
            TemplateNode::MountingPoint { kind, name } => {
                let anchor = {
                    let mut dom = self.ctx.dom_mut();
                    if self.ctx.config().debug_anchors {
                        dom.create_comment(name)
                    } else {
                        dom.create_text("")
                    }
                };
                let index = self.slots.len();
                self.slots.push(match kind {
                    MountKind::Single => Slot::Single { anchor, content: SlotContent::Empty },
                    MountKind::List => Slot::List { anchor, items: Vec::new() },
                });
                self.slot_names.insert(name.clone(), index);
                Ok(Layout::Slot(index))
            }
        }
    }
}

/// Live component instance
#[derive(Clone)]
pub struct Component {
    inner: Rc<RefCell<ComponentInner>>,
}

impl Component {
    fn build(class: &ComponentClass, ctx: &Context, scope: Scope) -> Result<Self> {
        let mut builder = Builder {
            ctx,
            scope: &scope,
            slots: Vec::new(),
            slot_names: HashMap::new(),
            children: Vec::new(),
        };
        let layout = builder.build(class.template())?;
        let Builder { slots, slot_names, children, .. } = builder;

        let holder = {
            let mut dom = ctx.dom_mut();
            let holder = dom.create_document_fragment();
            let mut fragment = Fragment::new();
            push_layout(&slots, &layout, &mut fragment);
            fragment.append_to(&mut dom, holder)?;
            holder
        };

        let id = ComponentId::next();
        tracing::debug!("Built component {} with {} slot(s)", id.get(), slots.len());

        Ok(Self {
            inner: Rc::new(RefCell::new(ComponentInner {
                id,
                class: class.clone(),
                ctx: ctx.clone(),
                scope,
                state: State::new(),
                holder,
                layout: Some(layout),
                slots,
                slot_names,
                children,
                site: None,
                owned: false,
                destroyed: false,
            })),
        })
    }

    pub fn id(&self) -> ComponentId {
        self.inner.borrow().id
    }

    pub fn class(&self) -> ComponentClass {
        self.inner.borrow().class.clone()
    }

    pub fn context(&self) -> Context {
        self.inner.borrow().ctx.clone()
    }

    pub fn scope(&self) -> Scope {
        self.inner.borrow().scope.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> State {
        self.inner.borrow().state.clone()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().state.get(key).cloned()
    }

    /// Components created from scoped tags in the template
    pub fn children(&self) -> Vec<Component> {
        self.inner.borrow().children.clone()
    }

    /// Top-level nodes in document order, slot content included
    pub fn fragment(&self) -> Fragment {
        self.inner.borrow().fragment()
    }

    /// Flattened top-level nodes
    pub fn nodes(&self) -> Vec<NodeId> {
        self.fragment().flatten()
    }

    /// Text of every top-level node, anchors excluded
    pub fn text_content(&self) -> String {
        let (ctx, nodes) = {
            let inner = self.inner.borrow();
            (inner.ctx.clone(), inner.fragment().flatten())
        };
        let dom = ctx.dom();
        nodes
            .into_iter()
            .filter(|&node| dom.node_type(node) != Some(NodeType::Comment))
            .map(|node| dom.text_content(node))
            .collect()
    }

    /// Serialized top-level nodes
    pub fn html(&self) -> String {
        let (ctx, nodes) = {
            let inner = self.inner.borrow();
            (inner.ctx.clone(), inner.fragment().flatten())
        };
        let dom = ctx.dom();
        nodes.into_iter().map(|node| dom.outer_html(node)).collect()
    }

    /// Merge `state` into the component state.
    ///
    /// Keys naming a single mounting point queue a text write into that
    /// slot; repeated writes to one slot before a flush collapse into the
    /// last one.
    pub fn update(&self, state: State) -> Result<()> {
        let (queue, owner, writes) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Err(EngineError::Destroyed);
            }
            let mut writes = Vec::new();
            for (key, value) in state {
                if let Some(&index) = inner.slot_names.get(&key) {
                    if matches!(inner.slots.get(index), Some(Slot::Single { .. })) {
                        writes.push((index, display_text(&value)));
                    }
                }
                inner.state.insert(key, value);
            }
            (inner.ctx.queue().clone(), inner.id.get(), writes)
        };

        let _batch = queue.batch();
        for (slot, text) in writes {
            let target = Rc::downgrade(&self.inner);
            queue.enqueue(Some(JobKey { owner, slot }), move || {
                let Some(inner) = target.upgrade() else {
                    return;
                };
                if let Err(err) = (Component { inner }).write_text(slot, &text) {
                    tracing::error!("Failed to render slot {} of component {}: {}", slot, owner, err);
                }
            });
        }
        Ok(())
    }

    /// Put `child` into a single mounting point, or empty it with `None`.
    /// Previous content is unmounted.
    pub fn mount(&self, name: &str, child: Option<Component>) -> Result<()> {
        let index = self.slot_index(name, MountKind::Single)?;
        match child {
            Some(child) => {
                self.check_mountable(&child)?;
                self.replace_single(index, SlotContent::Component(child))
            }
            None => self.replace_single(index, SlotContent::Empty),
        }
    }

    /// Component currently in a single mounting point
    pub fn mounted(&self, name: &str) -> Result<Option<Component>> {
        let index = self.slot_index(name, MountKind::Single)?;
        let inner = self.inner.borrow();
        Ok(match inner.slots.get(index) {
            Some(Slot::Single { content: SlotContent::Component(child), .. }) => Some(child.clone()),
            _ => None,
        })
    }

    pub fn list_push(&self, name: &str, child: Component) -> Result<()> {
        let slot = self.slot_index(name, MountKind::List)?;
        self.list_insert_at(slot, None, child)
    }

    pub fn list_insert(&self, name: &str, index: usize, child: Component) -> Result<()> {
        let slot = self.slot_index(name, MountKind::List)?;
        let len = self.list_at(slot, |items| items.len())?;
        if index > len {
            return Err(EngineError::IndexOutOfBounds { name: name.to_string(), index, len });
        }
        self.list_insert_at(slot, Some(index), child)
    }

    /// Take the component at `index` out of a list mounting point
    pub fn list_remove(&self, name: &str, index: usize) -> Result<Component> {
        let slot = self.slot_index(name, MountKind::List)?;
        let ctx = self.context();
        let _batch = ctx.queue().batch();

        let child = {
            let mut inner = self.inner.borrow_mut();
            match inner.slots.get_mut(slot) {
                Some(Slot::List { items, .. }) if index < items.len() => items.remove(index),
                Some(Slot::List { items, .. }) => {
                    return Err(EngineError::IndexOutOfBounds {
                        name: name.to_string(),
                        index,
                        len: items.len(),
                    });
                }
                _ => return Err(EngineError::UnknownMountingPoint(name.to_string())),
            }
        };
        child.clear_site();
        child.park()?;
        Ok(child)
    }

    pub fn list_clear(&self, name: &str) -> Result<()> {
        let slot = self.slot_index(name, MountKind::List)?;
        let ctx = self.context();
        let _batch = ctx.queue().batch();

        let items = {
            let mut inner = self.inner.borrow_mut();
            match inner.slots.get_mut(slot) {
                Some(Slot::List { items, .. }) => std::mem::take(items),
                _ => return Err(EngineError::UnknownMountingPoint(name.to_string())),
            }
        };
        for child in items {
            child.clear_site();
            child.park()?;
        }
        Ok(())
    }

    pub fn list_len(&self, name: &str) -> Result<usize> {
        let slot = self.slot_index(name, MountKind::List)?;
        self.list_at(slot, |items| items.len())
    }

    pub fn list_items(&self, name: &str) -> Result<Vec<Component>> {
        let slot = self.slot_index(name, MountKind::List)?;
        self.list_at(slot, |items| items.to_vec())
    }

    /// Place the component relative to `target`
    pub fn mount_to(&self, target: NodeId, option: MountOption) -> Result<()> {
        self.ensure_movable()?;
        let ctx = self.context();
        let _batch = ctx.queue().batch();

        let fragment = self.fragment();
        let attached = {
            let mut dom = ctx.dom_mut();
            match option {
                MountOption::Before => fragment.insert_before_to(&mut dom, target)?,
                MountOption::After => fragment.insert_after_to(&mut dom, target)?,
                MountOption::Append => fragment.append_to(&mut dom, target)?,
                MountOption::Replace => {
                    let attached = fragment.insert_before_to(&mut dom, target)?;
                    if attached {
                        dom.detach(target)?;
                    }
                    attached
                }
            }
        };
        // Ignored target: the component stays where it was
        if !attached {
            return Ok(());
        }
        self.leave_site();
        tracing::debug!("Mounted component {} ({:?} {:?})", self.id().get(), option, target);
        Ok(())
    }

    /// Take the component out of the document (or its parent's slot) and
    /// keep its nodes for a later mount
    pub fn unmount(&self) -> Result<()> {
        self.ensure_movable()?;
        let ctx = self.context();
        let _batch = ctx.queue().batch();
        self.leave_site();
        self.park()
    }

    /// Tear the component down.
    ///
    /// Node removal is queued on the render queue; slotted and scoped child
    /// components are destroyed with it and every node the tree created is
    /// released. Calling it twice is a no-op. Scoped children go with their
    /// parent and cannot be destroyed on their own.
    pub fn destroy(&self) {
        let (destroyed, owned, id) = {
            let inner = self.inner.borrow();
            (inner.destroyed, inner.owned, inner.id)
        };
        if destroyed {
            return;
        }
        if owned {
            tracing::warn!("Component {} belongs to its parent's template, destroy the parent instead", id.get());
            return;
        }
        self.leave_site();

        let ctx = self.context();
        let mut holders = Vec::new();
        let fragment = self.tear_down(&mut holders);

        let dom = ctx.shared_dom();
        ctx.queue().enqueue(None, move || {
            let mut dom = dom.borrow_mut();
            let result = fragment
                .flatten()
                .into_iter()
                .chain(holders)
                .try_for_each(|node| dom.release_subtree(node));
            if let Err(err) = result {
                tracing::error!("Failed to release component {}: {}", id.get(), err);
            }
        });
        tracing::debug!("Destroyed component {}", id.get());
    }

    /// Mark this component and every nested one destroyed. Returns the
    /// top-level nodes; the holders of the whole tree go into `holders`.
    fn tear_down(&self, holders: &mut Vec<NodeId>) -> Fragment {
        let (fragment, nested) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return Fragment::new();
            }
            let fragment = inner.fragment();
            inner.destroyed = true;
            inner.layout = None;
            inner.slot_names.clear();
            let mut nested = std::mem::take(&mut inner.children);
            for slot in std::mem::take(&mut inner.slots) {
                match slot {
                    Slot::Single { content: SlotContent::Component(child), .. } => nested.push(child),
                    Slot::List { items, .. } => nested.extend(items),
                    Slot::Single { .. } => {}
                }
            }
            holders.push(inner.holder);
            (fragment, nested)
        };

        for child in nested {
            child.clear_site();
            child.tear_down(holders);
        }
        fragment
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(EngineError::Destroyed);
        }
        Ok(())
    }

    /// Alive and free to be placed anywhere
    fn ensure_movable(&self) -> Result<()> {
        let inner = self.inner.borrow();
        if inner.destroyed {
            return Err(EngineError::Destroyed);
        }
        if inner.owned {
            return Err(EngineError::TemplateOwned(inner.id.get()));
        }
        Ok(())
    }

    /// `child` must be movable and render into the same DOM
    fn check_mountable(&self, child: &Component) -> Result<()> {
        child.ensure_movable()?;
        let same = self.inner.borrow().ctx.same_dom(&child.inner.borrow().ctx);
        if !same {
            return Err(EngineError::ForeignContext);
        }
        Ok(())
    }

    /// Slot index of a class-level mounting point of the expected kind
    fn slot_index(&self, name: &str, expected: MountKind) -> Result<usize> {
        let inner = self.inner.borrow();
        if inner.destroyed {
            return Err(EngineError::Destroyed);
        }
        let point = inner
            .class
            .mounting_point(name)
            .ok_or_else(|| EngineError::UnknownMountingPoint(name.to_string()))?;
        if point.kind != expected {
            return Err(EngineError::MountKindMismatch {
                name: name.to_string(),
                expected,
                actual: point.kind,
            });
        }
        inner
            .slot_names
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownMountingPoint(name.to_string()))
    }

    fn list_at<R>(&self, slot: usize, f: impl FnOnce(&[Component]) -> R) -> Result<R> {
        let inner = self.inner.borrow();
        match inner.slots.get(slot) {
            Some(Slot::List { items, .. }) => Ok(f(items)),
            _ => Err(EngineError::Destroyed),
        }
    }

    fn list_insert_at(&self, slot: usize, index: Option<usize>, child: Component) -> Result<()> {
        self.check_mountable(&child)?;
        let ctx = self.context();
        let _batch = ctx.queue().batch();

        // Positions count the list without `child`, which may already be in it
        let (reference, index) = {
            let inner = self.inner.borrow();
            let Some(Slot::List { anchor, items }) = inner.slots.get(slot) else {
                return Err(EngineError::Destroyed);
            };
            let others: Vec<&Component> = items.iter().filter(|item| !item.ptr_eq(&child)).collect();
            let index = index.map_or(others.len(), |i| i.min(others.len()));
            let reference = others[index..]
                .iter()
                .find_map(|item| item.fragment().flatten().first().copied())
                .unwrap_or(*anchor);
            (reference, index)
        };

        // Nothing has moved if this fails
        child.fragment().insert_before_to(&mut ctx.dom_mut(), reference)?;

        // May shrink this very list
        child.leave_site();
        if let Some(Slot::List { items, .. }) = self.inner.borrow_mut().slots.get_mut(slot) {
            let index = index.min(items.len());
            items.insert(index, child.clone());
        }
        child.set_site(self, slot);
        Ok(())
    }

    fn replace_single(&self, index: usize, new: SlotContent) -> Result<()> {
        let (ctx, anchor) = {
            let inner = self.inner.borrow();
            match inner.slots.get(index) {
                Some(Slot::Single { anchor, content }) => {
                    if let (SlotContent::Component(old), SlotContent::Component(child)) = (content, &new) {
                        if old.ptr_eq(child) {
                            return Ok(());
                        }
                    }
                    (inner.ctx.clone(), *anchor)
                }
                _ => return Err(EngineError::Destroyed),
            }
        };
        let _batch = ctx.queue().batch();

        let mounted = match &new {
            SlotContent::Empty => None,
            SlotContent::Text(node) => {
                Fragment::from_node(*node).insert_before_to(&mut ctx.dom_mut(), anchor)?;
                None
            }
            SlotContent::Component(child) => {
                child.fragment().insert_before_to(&mut ctx.dom_mut(), anchor)?;
                child.leave_site();
                Some(child.clone())
            }
        };

        let old = {
            let mut inner = self.inner.borrow_mut();
            match inner.slots.get_mut(index) {
                Some(Slot::Single { content, .. }) => std::mem::replace(content, new),
                _ => SlotContent::Empty,
            }
        };

        match old {
            SlotContent::Empty => {}
            SlotContent::Text(node) => {
                let mut dom = ctx.dom_mut();
                dom.detach(node)?;
                dom.release(node)?;
            }
            SlotContent::Component(previous) => {
                previous.clear_site();
                previous.park()?;
            }
        }

        if let Some(child) = mounted {
            child.set_site(self, index);
        }
        Ok(())
    }

    /// Render `text` into a single slot, reusing its text node when it has one
    fn write_text(&self, index: usize, text: &str) -> Result<()> {
        let (ctx, existing) = {
            let inner = self.inner.borrow();
            if inner.destroyed {
                return Ok(());
            }
            let existing = match inner.slots.get(index) {
                Some(Slot::Single { content: SlotContent::Text(node), .. }) => Some(*node),
                _ => None,
            };
            (inner.ctx.clone(), existing)
        };

        match existing {
            Some(node) => {
                ctx.dom_mut().set_text(node, text)?;
                Ok(())
            }
            None => {
                let node = ctx.dom_mut().create_text(text);
                self.replace_single(index, SlotContent::Text(node))
            }
        }
    }

    /// Move every top-level node back under the holder
    fn park(&self) -> Result<()> {
        let (ctx, holder, fragment) = {
            let inner = self.inner.borrow();
            if inner.destroyed {
                return Ok(());
            }
            (inner.ctx.clone(), inner.holder, inner.fragment())
        };
        fragment.append_to(&mut ctx.dom_mut(), holder)?;
        Ok(())
    }

    fn set_site(&self, parent: &Component, slot: usize) {
        self.inner.borrow_mut().site = Some(MountSite {
            parent: Rc::downgrade(&parent.inner),
            slot,
        });
    }

    fn clear_site(&self) {
        self.inner.borrow_mut().site = None;
    }

    /// Drop the parent slot's reference to this component. Nodes are not
    /// moved.
    fn leave_site(&self) {
        let Some(site) = self.inner.borrow_mut().site.take() else {
            return;
        };
        let Some(parent) = site.parent.upgrade() else {
            return;
        };
        let mut parent = parent.borrow_mut();
        match parent.slots.get_mut(site.slot) {
            Some(Slot::Single { content, .. }) => {
                if matches!(content, SlotContent::Component(child) if child.ptr_eq(self)) {
                    *content = SlotContent::Empty;
                }
            }
            Some(Slot::List { items, .. }) => items.retain(|item| !item.ptr_eq(self)),
            None => {}
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Component")
                .field("id", &inner.id)
                .field("slots", &inner.slots.len())
                .field("destroyed", &inner.destroyed)
                .finish(),
            Err(_) => f.write_str("Component { <in use> }"),
        }
    }
}
