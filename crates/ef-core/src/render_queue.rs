//! Render Queue
//!
//! Coalesces nested render triggers into one flush. Every `inform()` opens a
//! bracket and every `exec()` closes one; when the outermost bracket closes
//! the queue runs its pending DOM jobs, then the next-render callbacks that
//! were registered before the flush began.
//!
//! A thread-local queue backs the free functions ([`inform`], [`exec`],
//! [`bundle`], [`on_next_render`], [`is_paused`]). Separate queues can be
//! built with [`RenderQueue::new`] and handed to components through a
//! [`Context`](crate::Context).

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::Config;

type Job = Box<dyn FnOnce()>;

/// Coalescing key for queued jobs: a later job with the same key replaces
/// the earlier one in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub owner: u64,
    pub slot: usize,
}

#[derive(Default)]
struct JobList {
    jobs: Vec<Job>,
    keyed: HashMap<JobKey, usize>,
}

impl JobList {
    fn push(&mut self, key: Option<JobKey>, job: Job) {
        match key {
            Some(key) => match self.keyed.get(&key) {
                Some(&index) => self.jobs[index] = job,
                None => {
                    self.keyed.insert(key, self.jobs.len());
                    self.jobs.push(job);
                }
            },
            None => self.jobs.push(job),
        }
    }

    fn take(&mut self) -> Vec<Job> {
        self.keyed.clear();
        std::mem::take(&mut self.jobs)
    }
}

struct QueueInner {
    depth: Cell<usize>,
    paused: Cell<bool>,
    flushing: Cell<bool>,
    jobs: RefCell<JobList>,
    callbacks: RefCell<VecDeque<Job>>,
    flushes: Cell<u64>,
    max_passes: usize,
}

/// Shared handle to a render queue
#[derive(Clone)]
pub struct RenderQueue {
    inner: Rc<QueueInner>,
}

thread_local! {
    static GLOBAL: RenderQueue = RenderQueue::new();
}

impl RenderQueue {
    /// Create a queue with the default pass limit
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create a queue whose pass limit comes from `config`
    pub fn with_config(config: &Config) -> Self {
        Self {
            inner: Rc::new(QueueInner {
                depth: Cell::new(0),
                paused: Cell::new(false),
                flushing: Cell::new(false),
                jobs: RefCell::new(JobList::default()),
                callbacks: RefCell::new(VecDeque::new()),
                flushes: Cell::new(0),
                max_passes: config.max_flush_passes.max(1),
            }),
        }
    }

    /// The thread's global queue
    pub fn global() -> Self {
        GLOBAL.with(Clone::clone)
    }

    /// Open a bracket
    pub fn inform(&self) {
        self.inner.depth.set(self.inner.depth.get() + 1);
    }

    /// Close a bracket; closing the outermost one flushes
    pub fn exec(&self) {
        let depth = self.inner.depth.get();
        if depth == 0 {
            tracing::warn!("exec() without a matching inform(), ignoring");
            return;
        }
        self.inner.depth.set(depth - 1);
        if depth == 1 {
            self.flush();
        }
    }

    /// Open a bracket that closes when the guard drops
    pub fn batch(&self) -> Batch {
        self.inform();
        Batch { queue: self.clone() }
    }

    /// Run `f` inside one bracket
    pub fn bundle<R>(&self, f: impl FnOnce() -> R) -> R {
        let _batch = self.batch();
        f()
    }

    /// Run `callback` after the next flush
    pub fn on_next_render(&self, callback: impl FnOnce() + 'static) {
        self.inner.callbacks.borrow_mut().push_back(Box::new(callback));
    }

    /// Queue DOM work. Outside any bracket it runs right away.
    pub fn enqueue(&self, key: Option<JobKey>, job: impl FnOnce() + 'static) {
        self.inner.jobs.borrow_mut().push(key, Box::new(job));
        if self.inner.depth.get() == 0 {
            self.flush();
        }
    }

    /// Hold back flushes until [`resume`](Self::resume)
    pub fn pause(&self) {
        self.inner.paused.set(true);
    }

    /// Lift a [`pause`](Self::pause). Held work runs at the next outermost
    /// `exec()` or `flush()`.
    pub fn resume(&self) {
        self.inner.paused.set(false);
    }

    /// Whether a flush would be deferred right now
    pub fn is_paused(&self) -> bool {
        self.inner.depth.get() > 0 || self.inner.paused.get()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }

    /// Current bracket nesting depth
    pub fn depth(&self) -> usize {
        self.inner.depth.get()
    }

    /// Number of completed flushes
    pub fn flush_count(&self) -> u64 {
        self.inner.flushes.get()
    }

    pub fn pending_jobs(&self) -> usize {
        self.inner.jobs.borrow().jobs.len()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Flush now unless paused or already flushing
    pub fn flush(&self) {
        if self.inner.flushing.get() || self.is_paused() {
            return;
        }
        self.inner.flushing.set(true);
        let _reset = FlushingReset(&self.inner.flushing);

        let mut cycles = 0;
        loop {
            self.run_jobs();
            self.inner.flushes.set(self.inner.flushes.get() + 1);

            let callbacks: Vec<Job> = self.inner.callbacks.borrow_mut().drain(..).collect();
            if !callbacks.is_empty() {
                tracing::trace!("Running {} next-render callback(s)", callbacks.len());
            }
            for callback in callbacks {
                callback();
            }

            if self.inner.jobs.borrow().jobs.is_empty() {
                break;
            }
            cycles += 1;
            if cycles >= self.inner.max_passes {
                let dropped = self.inner.jobs.borrow_mut().take().len();
                tracing::warn!("Render callbacks keep queueing work, dropping {} job(s)", dropped);
                break;
            }
        }
        tracing::debug!("Flush {} complete", self.inner.flushes.get());
    }

    fn run_jobs(&self) {
        let mut passes = 0;
        loop {
            let jobs = self.inner.jobs.borrow_mut().take();
            if jobs.is_empty() {
                return;
            }
            if passes == self.inner.max_passes {
                tracing::warn!(
                    "Flush exceeded {} passes, dropping {} job(s)",
                    self.inner.max_passes,
                    jobs.len()
                );
                return;
            }
            passes += 1;
            for job in jobs {
                job();
            }
        }
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("depth", &self.inner.depth.get())
            .field("paused", &self.inner.paused.get())
            .field("flushing", &self.inner.flushing.get())
            .field("pending_jobs", &self.pending_jobs())
            .field("pending_callbacks", &self.pending_callbacks())
            .field("flushes", &self.inner.flushes.get())
            .finish()
    }
}

struct FlushingReset<'a>(&'a Cell<bool>);

impl Drop for FlushingReset<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Open bracket on a [`RenderQueue`], closed on drop
#[must_use = "the bracket closes as soon as the guard is dropped"]
pub struct Batch {
    queue: RenderQueue,
}

impl Drop for Batch {
    fn drop(&mut self) {
        if std::thread::panicking() {
            // Unwinding: release the bracket without running user work
            let depth = self.queue.inner.depth.get();
            self.queue.inner.depth.set(depth.saturating_sub(1));
            return;
        }
        self.queue.exec();
    }
}

/// Open a bracket on the global queue
pub fn inform() {
    GLOBAL.with(RenderQueue::inform);
}

/// Close a bracket on the global queue
pub fn exec() {
    GLOBAL.with(RenderQueue::exec);
}

/// Run `f` inside one bracket of the global queue
pub fn bundle<R>(f: impl FnOnce() -> R) -> R {
    RenderQueue::global().bundle(f)
}

/// Run `callback` after the global queue's next flush
pub fn on_next_render(callback: impl FnOnce() + 'static) {
    GLOBAL.with(|queue| queue.on_next_render(callback));
}

/// Whether the global queue is inside a bracket or paused
pub fn is_paused() -> bool {
    GLOBAL.with(RenderQueue::is_paused)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_nested_brackets_flush_once() {
        let queue = RenderQueue::new();
        queue.inform();
        queue.inform();
        queue.exec();
        assert_eq!(queue.flush_count(), 0);
        assert!(queue.is_paused());
        queue.exec();
        assert_eq!(queue.flush_count(), 1);
        assert!(!queue.is_paused());
    }

    #[test]
    fn test_unbalanced_exec_ignored() {
        let queue = RenderQueue::new();
        queue.exec();
        assert_eq!(queue.depth(), 0);
        assert_eq!(queue.flush_count(), 0);
    }

    #[test]
    fn test_keyed_jobs_coalesce() {
        let queue = RenderQueue::new();
        let seen = log();
        let key = JobKey { owner: 1, slot: 0 };

        queue.bundle(|| {
            for value in ["a", "b", "c"] {
                let seen = seen.clone();
                queue.enqueue(Some(key), move || seen.borrow_mut().push(value.to_string()));
            }
            let seen = seen.clone();
            queue.enqueue(None, move || seen.borrow_mut().push("plain".into()));
            assert_eq!(queue.pending_jobs(), 2);
        });

        assert_eq!(*seen.borrow(), vec!["c", "plain"]);
    }

    #[test]
    fn test_enqueue_outside_bracket_runs_now() {
        let queue = RenderQueue::new();
        let seen = log();
        let inner = seen.clone();
        queue.enqueue(None, move || inner.borrow_mut().push("now".into()));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(queue.flush_count(), 1);
    }

    #[test]
    fn test_callbacks_after_jobs() {
        let queue = RenderQueue::new();
        let seen = log();

        queue.bundle(|| {
            let first = seen.clone();
            queue.on_next_render(move || first.borrow_mut().push("callback".into()));
            let second = seen.clone();
            queue.enqueue(None, move || second.borrow_mut().push("job".into()));
        });

        assert_eq!(*seen.borrow(), vec!["job", "callback"]);
        assert_eq!(queue.pending_callbacks(), 0);
    }

    #[test]
    fn test_callback_registered_during_flush_waits() {
        let queue = RenderQueue::new();
        let seen = log();

        let outer_seen = seen.clone();
        let outer_queue = queue.clone();
        queue.on_next_render(move || {
            outer_seen.borrow_mut().push("first".into());
            let later = outer_seen.clone();
            outer_queue.on_next_render(move || later.borrow_mut().push("second".into()));
        });

        queue.bundle(|| {});
        assert_eq!(*seen.borrow(), vec!["first"]);
        queue.bundle(|| {});
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_callback_registered_by_job_runs_same_flush() {
        let queue = RenderQueue::new();
        let seen = log();

        queue.bundle(|| {
            let (job_seen, job_queue) = (seen.clone(), queue.clone());
            queue.enqueue(None, move || {
                job_seen.borrow_mut().push("job".into());
                let later = job_seen.clone();
                job_queue.on_next_render(move || later.borrow_mut().push("cb".into()));
            });
        });

        assert_eq!(*seen.borrow(), vec!["job", "cb"]);
        assert_eq!(queue.flush_count(), 1);
        assert_eq!(queue.pending_callbacks(), 0);
    }

    #[test]
    fn test_callback_queueing_job_starts_another_cycle() {
        let queue = RenderQueue::new();
        let seen = log();

        let (cb_seen, cb_queue) = (seen.clone(), queue.clone());
        queue.on_next_render(move || {
            cb_seen.borrow_mut().push("first".into());
            let job_seen = cb_seen.clone();
            cb_queue.enqueue(None, move || job_seen.borrow_mut().push("job".into()));
            let later = cb_seen.clone();
            cb_queue.on_next_render(move || later.borrow_mut().push("second".into()));
        });

        queue.bundle(|| {});
        // The queued job forces one more cycle, which also drains "second"
        assert_eq!(*seen.borrow(), vec!["first", "job", "second"]);
        assert_eq!(queue.flush_count(), 2);
        assert_eq!(queue.pending_jobs(), 0);
        assert_eq!(queue.pending_callbacks(), 0);
    }

    #[test]
    fn test_pause_resume() {
        let queue = RenderQueue::new();
        let seen = log();

        queue.pause();
        let inner = seen.clone();
        queue.enqueue(None, move || inner.borrow_mut().push("held".into()));
        queue.bundle(|| {});
        assert!(seen.borrow().is_empty());
        assert_eq!(queue.flush_count(), 0);

        queue.resume();
        assert!(seen.borrow().is_empty());
        queue.bundle(|| {});
        assert_eq!(*seen.borrow(), vec!["held"]);
    }

    #[test]
    fn test_runaway_jobs_bounded() {
        fn requeue(queue: RenderQueue, count: Rc<Cell<usize>>) {
            count.set(count.get() + 1);
            let next = queue.clone();
            queue.enqueue(None, move || requeue(next, count));
        }

        let queue = RenderQueue::with_config(&Config { max_flush_passes: 4, ..Config::default() });
        let count = Rc::new(Cell::new(0));
        let (q, c) = (queue.clone(), count.clone());
        queue.enqueue(None, move || requeue(q, c));

        assert_eq!(count.get(), 4);
        assert_eq!(queue.pending_jobs(), 0);
        assert!(!queue.is_flushing());
    }

    #[test]
    fn test_batch_guard() {
        let queue = RenderQueue::new();
        {
            let _outer = queue.batch();
            let _inner = queue.batch();
            assert_eq!(queue.depth(), 2);
        }
        assert_eq!(queue.depth(), 0);
        assert_eq!(queue.flush_count(), 1);
    }

    #[test]
    fn test_global_functions() {
        assert!(!is_paused());
        inform();
        assert!(is_paused());
        let flushes = RenderQueue::global().flush_count();
        exec();
        assert!(!is_paused());
        assert_eq!(RenderQueue::global().flush_count(), flushes + 1);
        assert_eq!(bundle(|| 7), 7);
    }
}
