use indexmap::IndexMap;

use crate::value::Value;

/// Index of a scope frame in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// One scope frame: a variable table, a function table, and a link to
/// the parent frame. Keys are full runtime values, not just names.
#[derive(Debug, Default)]
struct Frame {
    variables: IndexMap<Value, Value>,
    functions: IndexMap<Value, Value>,
    parent: Option<ScopeId>,
}

/// Arena of scope frames. Children reference parents by index, so
/// retaining a frame can never form an ownership cycle. Frames grown
/// for a struct literal's field scope are truncated away once the
/// literal finishes evaluating; the root frame lives for the whole run.
#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.frames.len());
        self.frames.push(Frame {
            parent: Some(parent),
            ..Frame::default()
        });
        id
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drops every frame created after `depth` was taken. The root
    /// frame is never dropped.
    pub fn release(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    /// Binds in the given frame only; ancestors are never written.
    pub fn set(&mut self, scope: ScopeId, key: Value, value: Value) {
        self.frames[scope.0].variables.insert(key, value);
    }

    /// Walks the parent chain outward; the nearest binding wins.
    pub fn get(&self, scope: ScopeId, key: &Value) -> Option<Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(value) = frame.variables.get(key) {
                return Some(value.clone());
            }
            current = frame.parent;
        }
        None
    }

    pub fn set_function(&mut self, scope: ScopeId, key: Value, body: Value) {
        self.frames[scope.0].functions.insert(key, body);
    }

    pub fn get_function(&self, scope: ScopeId, key: &Value) -> Option<Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(body) = frame.functions.get(key) {
                return Some(body.clone());
            }
            current = frame.parent;
        }
        None
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
