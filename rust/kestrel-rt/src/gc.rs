//! Value tracking and cycle reclamation.
//!
//! Values are reference counted, so acyclic garbage is freed as soon as the
//! last handle drops. The collector exists for cycles (an instance whose
//! attribute points back at itself, a list that contains itself). It keeps a
//! weak handle to every tracked container and, on request, runs trial
//! deletion over them:
//!
//! 1. every live container starts with `gc_refs = strong_count`;
//! 2. references held by other tracked containers are subtracted;
//! 3. containers left with `gc_refs > 0` are held from outside the heap
//!    (Rust locals, the runtime's module table, ...) and are roots;
//! 4. everything reachable from a root survives, the rest is cleared, which
//!    breaks the cycles and lets the reference counts drop to zero.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::{debug, info};

use kestrel_core::{Function, List, MapRef, Value, WeakFunction, WeakList, WeakMap};

/// Tri-color state of a container during a collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcColor {
    /// Not proven reachable yet.
    White,
    /// Reachable, children not yet scanned.
    Gray,
    /// Reachable and scanned.
    Black,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub tracked_lists: usize,
    pub tracked_maps: usize,
    pub tracked_functions: usize,
    /// Number of `mark_reachable` announcements.
    pub marks: usize,
    pub collections: usize,
    /// Containers cleared by collection passes so far.
    pub reclaimed: usize,
}

/// Tracking/collection subsystem consumed by the runtime.
pub trait Collector {
    /// Register a freshly constructed heap value.
    fn track(&self, value: &Value);

    /// Announce that `value` is about to cross an API boundary.
    fn mark_reachable(&self, value: &Value);

    /// Reclaim unreachable cycles; returns the number of containers cleared.
    fn collect(&self) -> usize;

    fn stats(&self) -> HeapStats;
}

#[derive(Clone)]
enum Tracked {
    List(WeakList),
    Map(WeakMap),
    Function(WeakFunction),
}

impl Tracked {
    fn is_alive(&self) -> bool {
        match self {
            Tracked::List(w) => w.is_alive(),
            Tracked::Map(w) => w.is_alive(),
            Tracked::Function(w) => w.is_alive(),
        }
    }

    fn upgrade(&self) -> Option<Node> {
        match self {
            Tracked::List(w) => w.upgrade().map(Node::List),
            Tracked::Map(w) => w.upgrade().map(Node::Map),
            Tracked::Function(w) => w.upgrade().map(Node::Function),
        }
    }
}

enum Node {
    List(List),
    Map(MapRef),
    Function(Function),
}

impl Node {
    fn addr(&self) -> usize {
        match self {
            Node::List(l) => l.addr(),
            Node::Map(m) => m.addr(),
            Node::Function(f) => f.addr(),
        }
    }

    fn strong_count(&self) -> usize {
        match self {
            Node::List(l) => l.strong_count(),
            Node::Map(m) => m.strong_count(),
            Node::Function(f) => f.strong_count(),
        }
    }

    fn children(&self) -> Vec<Value> {
        match self {
            Node::List(l) => l.snapshot(),
            Node::Map(m) => {
                let mut out = Vec::with_capacity(m.len() * 2 + 1);
                for (k, v) in m.entries() {
                    out.push(k);
                    out.push(v);
                }
                if let Some(meta) = m.meta() {
                    out.push(Value::Map(meta));
                }
                out
            }
            Node::Function(f) => {
                let mut out = vec![f.globals().clone()];
                if let Some(receiver) = f.bound_self() {
                    out.push(receiver.clone());
                }
                if let kestrel_core::FuncBody::Compiled(code) = f.body() {
                    out.push(code.clone());
                }
                out
            }
        }
    }
}

fn container_addr(value: &Value) -> Option<usize> {
    match value {
        Value::List(l) => Some(l.addr()),
        Value::Map(m) => Some(m.addr()),
        Value::Function(f) => Some(f.addr()),
        _ => None,
    }
}

const INITIAL_PRUNE_THRESHOLD: usize = 1024;

/// Default collector.
pub struct Heap {
    tracked: RefCell<Vec<Tracked>>,
    stats: Cell<HeapStats>,
    prune_threshold: Cell<usize>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Self {
            tracked: RefCell::new(Vec::new()),
            stats: Cell::new(HeapStats::default()),
            prune_threshold: Cell::new(INITIAL_PRUNE_THRESHOLD),
        }
    }

    /// Number of tracked containers that are still alive.
    pub fn live_count(&self) -> usize {
        self.tracked.borrow().iter().filter(|t| t.is_alive()).count()
    }

    fn update(&self, f: impl FnOnce(&mut HeapStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn prune(&self) {
        let mut tracked = self.tracked.borrow_mut();
        tracked.retain(Tracked::is_alive);
        let threshold = (tracked.len() * 2).max(INITIAL_PRUNE_THRESHOLD);
        self.prune_threshold.set(threshold);
    }
}

impl Collector for Heap {
    fn track(&self, value: &Value) {
        let entry = match value {
            Value::List(l) => {
                self.update(|s| s.tracked_lists += 1);
                Tracked::List(l.downgrade())
            }
            Value::Map(m) => {
                self.update(|s| s.tracked_maps += 1);
                Tracked::Map(m.downgrade())
            }
            Value::Function(f) => {
                self.update(|s| s.tracked_functions += 1);
                Tracked::Function(f.downgrade())
            }
            _ => return,
        };
        let len = {
            let mut tracked = self.tracked.borrow_mut();
            tracked.push(entry);
            tracked.len()
        };
        if len > self.prune_threshold.get() {
            self.prune();
        }
    }

    fn mark_reachable(&self, _value: &Value) {
        // a returned handle is a strong reference, which makes it a root for
        // the next pass
        self.update(|s| s.marks += 1);
    }

    fn collect(&self) -> usize {
        let snapshot: Vec<Tracked> = self.tracked.borrow().clone();

        let mut nodes: Vec<Node> = Vec::new();
        let mut index: HashMap<usize, usize> = HashMap::new();
        for entry in &snapshot {
            if let Some(node) = entry.upgrade() {
                let addr = node.addr();
                if index.contains_key(&addr) {
                    continue;
                }
                index.insert(addr, nodes.len());
                nodes.push(node);
            }
        }

        // our own upgraded handle accounts for one strong reference
        let mut gc_refs: Vec<usize> = nodes.iter().map(|n| n.strong_count().saturating_sub(1)).collect();

        let children: Vec<Vec<usize>> = nodes
            .iter()
            .map(|n| {
                n.children()
                    .iter()
                    .filter_map(container_addr)
                    .filter_map(|addr| index.get(&addr).copied())
                    .collect()
            })
            .collect();

        for edges in &children {
            for &child in edges {
                gc_refs[child] = gc_refs[child].saturating_sub(1);
            }
        }

        let mut color = vec![GcColor::White; nodes.len()];
        let mut gray: Vec<usize> = Vec::new();
        for (i, refs) in gc_refs.iter().enumerate() {
            if *refs > 0 {
                color[i] = GcColor::Gray;
                gray.push(i);
            }
        }
        while let Some(i) = gray.pop() {
            color[i] = GcColor::Black;
            for &child in &children[i] {
                if color[child] == GcColor::White {
                    color[child] = GcColor::Gray;
                    gray.push(child);
                }
            }
        }

        let mut garbage_lists = Vec::new();
        let mut garbage_maps = Vec::new();
        let mut cleared = 0;
        for (i, node) in nodes.iter().enumerate() {
            if color[i] != GcColor::White {
                continue;
            }
            match node {
                Node::List(l) => {
                    if let Some(items) = l.try_clear() {
                        garbage_lists.push(items);
                        cleared += 1;
                    }
                }
                Node::Map(m) => {
                    if let Some(contents) = m.try_clear() {
                        garbage_maps.push(contents);
                        cleared += 1;
                    }
                }
                // functions are immutable; their cycles run through a list or
                // a mapping, which is cleared above
                Node::Function(_) => {}
            }
        }
        let scanned = nodes.len();
        drop(garbage_lists);
        drop(garbage_maps);
        drop(nodes);

        self.prune();
        self.update(|s| {
            s.collections += 1;
            s.reclaimed += cleared;
        });
        debug!(scanned, cleared, "collection pass finished");
        if cleared > 0 {
            info!(reclaimed = cleared, "reclaimed unreachable cycles");
        }
        cleared
    }

    fn stats(&self) -> HeapStats {
        self.stats.get()
    }
}
