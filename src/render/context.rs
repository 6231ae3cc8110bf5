//! Per-render variable scopes

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

/// Variables visible during one render pass.
///
/// `public` holds caller-supplied variables and is shared (read-only) with
/// child contexts. `private` is the namespace directives write into, such as
/// the callables installed by `import` and `macro`.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    public: Arc<HashMap<String, Value>>,
    private: HashMap<String, Value>,
    /// Number of macro calls enclosing this scope
    depth: usize,
}

impl RenderContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with caller-supplied variables
    pub fn with_variables(variables: HashMap<String, Value>) -> Self {
        Self {
            public: Arc::new(variables),
            private: HashMap::new(),
            depth: 0,
        }
    }

    /// Scope for a macro body: same public variables, a copy of the private
    /// namespace, one level deeper
    pub fn child(&self) -> Self {
        Self {
            public: Arc::clone(&self.public),
            private: self.private.clone(),
            depth: self.depth + 1,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Look a name up, private namespace first
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.private.get(name).or_else(|| self.public.get(name))
    }

    pub fn public(&self) -> &HashMap<String, Value> {
        &self.public
    }

    pub fn private(&self) -> &HashMap<String, Value> {
        &self.private
    }

    pub fn set_public(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.public).insert(name.into(), value.into());
    }

    pub fn set_private(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.private.insert(name.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_shadows_public() {
        let mut ctx = RenderContext::new();
        ctx.set_public("title", "public");
        assert_eq!(ctx.get("title"), Some(&Value::from("public")));
        ctx.set_private("title", "private");
        assert_eq!(ctx.get("title"), Some(&Value::from("private")));
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn test_child_does_not_write_back() {
        let mut parent = RenderContext::new();
        parent.set_private("a", 1i64);
        let mut child = parent.child();
        child.set_private("b", 2i64);
        assert_eq!(child.get("a"), Some(&Value::from(1i64)));
        assert!(parent.get("b").is_none());
    }

    #[test]
    fn test_set_public_after_child_keeps_child_snapshot() {
        let mut parent = RenderContext::new();
        parent.set_public("x", "old");
        let child = parent.child();
        assert_eq!(child.depth(), 1);
        assert_eq!(child.child().depth(), 2);
        parent.set_public("x", "new");
        assert_eq!(child.get("x"), Some(&Value::from("old")));
        assert_eq!(parent.get("x"), Some(&Value::from("new")));
    }
}
