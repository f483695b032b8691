//! The scoped root context the dynamic SQL is evaluated against.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::Value;

/// Name lookup as seen by an expression evaluator.
pub trait VariableScope {
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl VariableScope for IndexMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

#[derive(Debug)]
struct Frame {
    bindings: IndexMap<String, Value>,
    parent: Option<Arc<Frame>>,
}

/// Base bindings plus a chain of immutable overlay frames.
///
/// Entering a scope (`foreach` iteration, `bind`) produces a new context
/// whose innermost frame holds the scope's names; the context it was
/// derived from is untouched, so dropping the new context is all it takes
/// to leave the scope. Cloning is cheap: frames and base are shared.
#[derive(Debug, Clone)]
pub struct RootContext {
    base: Arc<IndexMap<String, Value>>,
    frames: Option<Arc<Frame>>,
}

impl RootContext {
    pub fn new(base: IndexMap<String, Value>) -> Self {
        Self {
            base: Arc::new(base),
            frames: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(IndexMap::new())
    }

    /// A child context with one more frame holding `bindings`.
    pub fn with_overlay(&self, bindings: IndexMap<String, Value>) -> Self {
        Self {
            base: Arc::clone(&self.base),
            frames: Some(Arc::new(Frame {
                bindings,
                parent: self.frames.clone(),
            })),
        }
    }

    /// A child context binding a single name.
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Self {
        let mut bindings = IndexMap::with_capacity(1);
        bindings.insert(name.into(), value);
        self.with_overlay(bindings)
    }

    /// Innermost frame first, then outer frames, then the base.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut frame = self.frames.as_deref();
        while let Some(current) = frame {
            if let Some(value) = current.bindings.get(name) {
                return Some(value);
            }
            frame = current.parent.as_deref();
        }
        self.base.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn base(&self) -> &IndexMap<String, Value> {
        &self.base
    }

    /// Number of overlay frames above the base.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.frames.as_deref();
        while let Some(current) = frame {
            depth += 1;
            frame = current.parent.as_deref();
        }
        depth
    }

    /// Every visible name with the value it currently resolves to.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut frames = Vec::new();
        let mut frame = self.frames.as_deref();
        while let Some(current) = frame {
            frames.push(&current.bindings);
            frame = current.parent.as_deref();
        }

        let mut flat = (*self.base).clone();
        for bindings in frames.into_iter().rev() {
            for (name, value) in bindings {
                flat.insert(name.clone(), value.clone());
            }
        }
        flat
    }
}

impl Default for RootContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl VariableScope for RootContext {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}
