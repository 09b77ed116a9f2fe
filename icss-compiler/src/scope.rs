use crate::ast::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    assignments: Vec<(String, NodeId)>,
    children: Vec<ScopeId>,
    parent: Option<ScopeId>,
}

/// Lexical visibility of variable assignments during a pre-order walk.
///
/// Scopes form a tree owned by the tracker; each scope links back to its parent by id. The
/// stack holds the scopes enclosing the node currently being visited, with the root scope
/// (the stylesheet level) at the bottom.
#[derive(Debug)]
pub struct ScopeTracker {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            stack: vec![ScopeId(0)],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId(0))
    }

    /// Open a scope nested in the current one and make it current.
    pub fn enter(&mut self) -> ScopeId {
        let parent = self.current();
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.scopes[parent.0].children.push(id);
        self.stack.push(id);
        id
    }

    pub fn leave(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn register<S: Into<String>>(&mut self, name: S, assignment: NodeId) {
        let current = self.current();
        self.scopes[current.0]
            .assignments
            .push((name.into(), assignment));
    }

    /// Find the assignment `name` refers to from the current scope, searching outwards.
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        let mut scope = Some(self.current());
        while let Some(id) = scope {
            let current = &self.scopes[id.0];
            if let Some((_, assignment)) = current
                .assignments
                .iter()
                .find(|(candidate, _)| candidate == name)
            {
                return Some(*assignment);
            }
            scope = current.parent;
        }
        None
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn parent_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope.0).and_then(|scope| scope.parent)
    }

    pub fn children_of(&self, scope: ScopeId) -> &[ScopeId] {
        self.scopes
            .get(scope.0)
            .map(|scope| scope.children.as_slice())
            .unwrap_or(&[])
    }
}
