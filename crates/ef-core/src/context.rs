//! Render context
//!
//! Everything an instance needs from its surroundings: the DOM it renders
//! into, the queue that batches its work and the engine configuration.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use ef_dom::DomTree;

use crate::{Config, RenderQueue};

/// Shared DOM, render queue and configuration
#[derive(Debug, Clone)]
pub struct Context {
    dom: Rc<RefCell<DomTree>>,
    queue: RenderQueue,
    config: Rc<Config>,
}

impl Context {
    /// Default config on the thread's global queue
    pub fn new(dom: DomTree) -> Self {
        Self::with_queue(dom, RenderQueue::global(), Config::default())
    }

    /// Dedicated queue built from `config`
    pub fn with_config(dom: DomTree, config: Config) -> Self {
        let queue = RenderQueue::with_config(&config);
        Self::with_queue(dom, queue, config)
    }

    pub fn with_queue(dom: DomTree, queue: RenderQueue, config: Config) -> Self {
        Self {
            dom: Rc::new(RefCell::new(dom)),
            queue,
            config: Rc::new(config),
        }
    }

    pub fn dom(&self) -> Ref<'_, DomTree> {
        self.dom.borrow()
    }

    pub fn dom_mut(&self) -> RefMut<'_, DomTree> {
        self.dom.borrow_mut()
    }

    pub fn shared_dom(&self) -> Rc<RefCell<DomTree>> {
        Rc::clone(&self.dom)
    }

    /// Whether both contexts render into the same DOM
    pub fn same_dom(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.dom, &other.dom)
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DomTree::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_dom() {
        let ctx = Context::with_config(DomTree::new(), Config::production());
        let other = ctx.clone();

        let div = ctx.dom_mut().create_element("div");
        assert!(other.dom().get(div).is_some());
        assert!(!other.config().debug_anchors);
        assert!(Rc::ptr_eq(&ctx.shared_dom(), &other.shared_dom()));
        assert!(ctx.same_dom(&other));
        assert!(!ctx.same_dom(&Context::default()));
    }

    #[test]
    fn test_default_uses_global_queue() {
        let ctx = Context::default();
        ctx.queue().inform();
        assert!(crate::is_paused());
        ctx.queue().exec();
        assert!(!crate::is_paused());
    }
}
