use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Dependency graph shared by every reactive primitive of one runtime.
///
/// IDs are handed out by [`Runtime::next_id`] and mean one of three things:
/// a state cell (a mounted module's state), a derived value, or a watcher.
/// The graph records who read what, which derived values are stale, and
/// which watcher callbacks to run when a cell changes.
struct Graph {
    current_observer: Option<usize>,
    // Cell or derived ID -> observer IDs that read it
    dependents: HashMap<usize, HashSet<usize>>,
    // Observer ID -> IDs it read during its last run
    observer_reads: HashMap<usize, HashSet<usize>>,
    // Watcher ID -> callback
    watchers: HashMap<usize, Arc<dyn Fn() + Send + Sync>>,
    // Derived ID -> stale flag
    dirty: HashMap<usize, bool>,
}

impl Graph {
    fn new() -> Self {
        Self {
            current_observer: None,
            dependents: HashMap::new(),
            observer_reads: HashMap::new(),
            watchers: HashMap::new(),
            dirty: HashMap::new(),
        }
    }

    /// Forget everything `observer` read, including the reverse edges.
    fn release_reads(&mut self, observer: usize) {
        if let Some(reads) = self.observer_reads.remove(&observer) {
            for id in reads {
                if let Some(deps) = self.dependents.get_mut(&id) {
                    deps.remove(&observer);
                }
            }
        }
    }
}

/// Reactive runtime: ID allocation plus the dependency graph.
///
/// A store binds to the runtime that is current when its builder is
/// created. By default that is the process-wide runtime; tests (and any
/// code that wants isolation) can run against a fresh one with
/// [`Runtime::scope`].
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use number_place_store::create_store;
///
/// let store = create_store().unwrap();
/// assert!(store.contains("numberPlace"));
/// ```
///
/// Using a scoped runtime for isolation:
///
/// ```
/// use number_place_store::runtime::Runtime;
/// use number_place_store::create_store;
///
/// Runtime::scope(|| {
///     let store = create_store().unwrap();
///     assert!(store.contains("numberPlace"));
/// });
/// // The scoped runtime and its whole graph are dropped here.
/// ```
pub struct Runtime {
    next_id: AtomicUsize,
    graph: Mutex<Graph>,
}

// Thread-local stack of scoped runtimes; `current` falls back to the
// global runtime when the stack is empty.
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<Runtime>>> = const { RefCell::new(Vec::new()) };
}

impl Runtime {
    /// Create a fresh, isolated runtime with an empty graph.
    pub fn new() -> Arc<Self> {
        Arc::new(Runtime {
            next_id: AtomicUsize::new(0),
            graph: Mutex::new(Graph::new()),
        })
    }

    /// The process-wide default runtime, created on first use.
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// The runtime at the top of the thread-local scope stack, or the
    /// global one when no scope is active.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Self::global)
        })
    }

    /// Run `f` against a fresh isolated runtime.
    ///
    /// Everything created inside (stores, derived values, watchers) is
    /// tracked by that runtime alone, and the graph is dropped when `f`
    /// returns. Handy for keeping tests independent.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Run `f` with `runtime` as the current runtime on this thread.
    ///
    /// The previous current runtime is restored afterwards, also when `f`
    /// panics.
    ///
    /// # Examples
    ///
    /// ```
    /// use number_place_store::runtime::Runtime;
    ///
    /// let runtime = Runtime::new();
    /// let id = Runtime::with_runtime(runtime, || Runtime::current().next_id());
    /// assert_eq!(id, 0);
    /// ```
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        tracing::trace!("entering runtime scope");
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        tracing::trace!("left runtime scope");

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Allocate the next ID for a cell, derived value, or watcher.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Record that the current observer (if any) read `id`.
    pub fn track_read(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        if let Some(observer) = graph.current_observer {
            graph.dependents.entry(id).or_default().insert(observer);
            graph.observer_reads.entry(observer).or_default().insert(id);
        }
    }

    /// A cell changed: mark dependent derived values stale (transitively)
    /// and run dependent watcher callbacks.
    ///
    /// Callbacks run with no graph lock held; they may read cells and
    /// derived values freely.
    pub fn invalidate(&self, id: usize) {
        let dependents = {
            let graph = self.graph.lock().unwrap();
            graph
                .dependents
                .get(&id)
                .map(|deps| deps.iter().copied().collect::<Vec<_>>())
        };

        if let Some(dependents) = dependents {
            for observer in dependents {
                self.poke(observer);
            }
        }
    }

    /// Propagate an invalidation to one observer: stale-mark a derived
    /// value (and recurse into its dependents) or run a watcher.
    fn poke(&self, id: usize) {
        enum Next {
            Derived(Option<Vec<usize>>),
            Watcher(Arc<dyn Fn() + Send + Sync>),
            Nothing,
        }

        let next = {
            let mut graph = self.graph.lock().unwrap();
            if let Some(stale) = graph.dirty.get_mut(&id) {
                if *stale {
                    // Already stale, dependents were poked last time.
                    Next::Nothing
                } else {
                    *stale = true;
                    Next::Derived(
                        graph
                            .dependents
                            .get(&id)
                            .map(|deps| deps.iter().copied().collect()),
                    )
                }
            } else if let Some(watcher) = graph.watchers.get(&id) {
                Next::Watcher(Arc::clone(watcher))
            } else {
                Next::Nothing
            }
        };

        match next {
            Next::Derived(Some(dependents)) => {
                for dependent in dependents {
                    self.poke(dependent);
                }
            }
            Next::Derived(None) | Next::Nothing => {}
            Next::Watcher(run) => run(),
        }
    }

    /// Register a watcher callback under `id`, clearing any reads a
    /// previous registration of `id` left behind.
    pub fn register_watcher<F>(&self, id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut graph = self.graph.lock().unwrap();
        graph.release_reads(id);
        graph.watchers.insert(id, Arc::new(f));
    }

    /// Detach a watcher and its read edges.
    pub fn remove_watcher(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        graph.watchers.remove(&id);
        graph.release_reads(id);
    }

    /// Register `id` as a derived value, initially stale.
    pub fn register_derived(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        graph.dirty.insert(id, true);
    }

    /// Detach a derived value: its stale flag, read edges, and dependents.
    pub fn remove_derived(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        graph.dirty.remove(&id);
        graph.dependents.remove(&id);
        graph.release_reads(id);
    }

    /// Whether the derived value `id` must recompute. Unknown IDs count as
    /// stale.
    pub fn is_dirty(&self, id: usize) -> bool {
        let graph = self.graph.lock().unwrap();
        graph.dirty.get(&id).copied().unwrap_or(true)
    }

    /// Mark a derived value fresh after recomputation.
    pub fn mark_clean(&self, id: usize) {
        let mut graph = self.graph.lock().unwrap();
        graph.dirty.insert(id, false);
    }

    /// Run `f` with `observer` as the current observer, so that every
    /// tracked read inside becomes one of its dependencies.
    ///
    /// The observer slot is per runtime, not per thread; concurrent
    /// tracked computations belong on separate runtimes.
    pub fn with_observer<F, R>(&self, observer: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = {
            let mut graph = self.graph.lock().unwrap();
            graph.current_observer.replace(observer)
        };

        let result = f();

        let mut graph = self.graph.lock().unwrap();
        graph.current_observer = prev;

        result
    }
}
