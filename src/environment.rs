//! Lexically scoped environments.
//!
//! Frames form a tree: the root holds globals, and every `@function`,
//! `@mixin`, control-flow body, and module gets a child frame.  Each frame
//! has three independent namespaces (variables, functions, mixins) keyed
//! by normalized identifiers.  Lookup walks parents; callables capture the
//! frame they were defined in.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::api::HostFunction;
use crate::ast::CallableDecl;
use crate::common::Ident;
use crate::value::Value;

struct Frame {
    vars: RefCell<HashMap<Ident, Value>>,
    mixins: RefCell<HashMap<Ident, MixinDef>>,
    functions: RefCell<HashMap<Ident, SassFunction>>,
    parent: Option<Env>,
}

/// A handle to one frame; cheap to clone, shared by closures.
#[derive(Clone)]
pub struct Env(Rc<Frame>);

/// A user mixin together with its defining environment.
#[derive(Clone)]
pub struct MixinDef {
    pub decl: Rc<CallableDecl>,
    pub env: Env,
}

/// A callable function value.
#[derive(Clone)]
pub enum SassFunction {
    UserDefined { decl: Rc<CallableDecl>, env: Env },
    Builtin(Ident),
    Host(Rc<dyn HostFunction>),
}

impl SassFunction {
    pub fn name(&self) -> String {
        match self {
            SassFunction::UserDefined { decl, .. } => decl.name.to_string(),
            SassFunction::Builtin(name) => name.to_string(),
            SassFunction::Host(host) => host.name().to_string(),
        }
    }
}

impl fmt::Debug for SassFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SassFunction({})", self.name())
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Env")
    }
}

impl Env {
    /// A fresh root frame.
    pub fn new_root() -> Env {
        Env(Rc::new(Frame {
            vars: RefCell::new(HashMap::new()),
            mixins: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// A lexical child of this frame.
    pub fn child(&self) -> Env {
        Env(Rc::new(Frame {
            vars: RefCell::new(HashMap::new()),
            mixins: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Whether two handles point at the same frame.
    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The root frame above this one.
    pub fn global(&self) -> Env {
        let mut env = self.clone();
        while let Some(parent) = env.0.parent.clone() {
            env = parent;
        }
        env
    }

    pub fn get_var(&self, name: &Ident) -> Option<Value> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            if let Some(v) = e.0.vars.borrow().get(name) {
                return Some(v.clone());
            }
            env = e.0.parent.clone();
        }
        None
    }

    /// Whether `name` is bound in this frame only.
    pub fn has_local_var(&self, name: &Ident) -> bool {
        self.0.vars.borrow().contains_key(name)
    }

    pub fn global_var_exists(&self, name: &Ident) -> bool {
        self.global().has_local_var(name)
    }

    /// Assigns `name`, updating the nearest frame that already binds it, or
    /// defining it in this frame.
    pub fn set_var(&self, name: Ident, value: Value) {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            if e.0.vars.borrow().contains_key(&name) {
                e.0.vars.borrow_mut().insert(name, value);
                return;
            }
            env = e.0.parent.clone();
        }
        self.0.vars.borrow_mut().insert(name, value);
    }

    /// `!global`: writes to the root frame.
    pub fn set_var_global(&self, name: Ident, value: Value) {
        self.global().0.vars.borrow_mut().insert(name, value);
    }

    /// `!default`: writes only if the binding is unset or null.
    pub fn set_var_default(&self, name: Ident, value: Value) {
        let unset = self.get_var(&name).map_or(true, |v| v.is_null());
        if unset {
            self.set_var(name, value);
        }
    }

    /// Defines a variable in this frame, shadowing outer bindings.  Used for
    /// loop variables and bound parameters.
    pub fn define_var(&self, name: Ident, value: Value) {
        self.0.vars.borrow_mut().insert(name, value);
    }

    pub fn get_mixin(&self, name: &Ident) -> Option<MixinDef> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            if let Some(m) = e.0.mixins.borrow().get(name) {
                return Some(m.clone());
            }
            env = e.0.parent.clone();
        }
        None
    }

    pub fn define_mixin(&self, name: Ident, mixin: MixinDef) {
        self.0.mixins.borrow_mut().insert(name, mixin);
    }

    pub fn get_fn(&self, name: &Ident) -> Option<SassFunction> {
        let mut env = Some(self.clone());
        while let Some(e) = env {
            if let Some(f) = e.0.functions.borrow().get(name) {
                return Some(f.clone());
            }
            env = e.0.parent.clone();
        }
        None
    }

    pub fn define_fn(&self, name: Ident, function: SassFunction) {
        self.0.functions.borrow_mut().insert(name, function);
    }

    /// The members defined directly in this frame, for module export.
    pub fn local_members(&self) -> ModuleMembers {
        ModuleMembers {
            vars: self.0.vars.borrow().clone(),
            mixins: self.0.mixins.borrow().clone(),
            functions: self.0.functions.borrow().clone(),
        }
    }
}

/// A snapshot of a module's exported surface.
#[derive(Clone)]
pub struct ModuleMembers {
    pub vars: HashMap<Ident, Value>,
    pub mixins: HashMap<Ident, MixinDef>,
    pub functions: HashMap<Ident, SassFunction>,
}

/// A sheet loaded by `@use`, exposing a namespaced set of members.
///
/// The environment is the module's root frame, kept live so that writes to
/// `ns.$var` from the using sheet observe the same state everywhere.
#[derive(Clone)]
pub struct Module {
    pub env: Env,
}

impl Module {
    pub fn get_var(&self, name: &Ident) -> Option<Value> {
        self.env.0.vars.borrow().get(name).cloned()
    }

    pub fn set_var(&self, name: Ident, value: Value) -> bool {
        let exists = self.env.0.vars.borrow().contains_key(&name);
        if exists {
            self.env.0.vars.borrow_mut().insert(name, value);
        }
        exists
    }

    pub fn get_mixin(&self, name: &Ident) -> Option<MixinDef> {
        self.env.0.mixins.borrow().get(name).cloned()
    }

    pub fn get_fn(&self, name: &Ident) -> Option<SassFunction> {
        self.env.0.functions.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::number::Number;

    fn num(v: f64) -> Value {
        Value::Number(Number::new(v))
    }

    #[test]
    fn lookup_walks_parents() {
        let root = Env::new_root();
        root.define_var("a".into(), num(1.0));
        let inner = root.child().child();
        assert_eq!(inner.get_var(&"a".into()), Some(num(1.0)));
        assert_eq!(inner.get_var(&"missing".into()), None);
    }

    #[test]
    fn assignment_updates_existing_binding() {
        let root = Env::new_root();
        root.define_var("a".into(), num(1.0));
        let inner = root.child();
        inner.set_var("a".into(), num(2.0));
        assert_eq!(root.get_var(&"a".into()), Some(num(2.0)));
        assert!(!inner.has_local_var(&"a".into()));
    }

    #[test]
    fn global_write_skips_locals() {
        let root = Env::new_root();
        let inner = root.child();
        inner.define_var("a".into(), num(1.0));
        inner.set_var_global("a".into(), num(9.0));
        assert_eq!(root.get_var(&"a".into()), Some(num(9.0)));
        // The local shadow is untouched.
        assert_eq!(inner.get_var(&"a".into()), Some(num(1.0)));
    }

    #[test]
    fn default_only_fills_null_or_unset() {
        let env = Env::new_root();
        env.set_var_default("a".into(), num(1.0));
        assert_eq!(env.get_var(&"a".into()), Some(num(1.0)));
        env.set_var_default("a".into(), num(2.0));
        assert_eq!(env.get_var(&"a".into()), Some(num(1.0)));
        env.define_var("b".into(), Value::Null);
        env.set_var_default("b".into(), num(3.0));
        assert_eq!(env.get_var(&"b".into()), Some(num(3.0)));
    }

    #[test]
    fn identifier_normalization_applies() {
        let env = Env::new_root();
        env.define_var("foo_bar".into(), num(1.0));
        assert_eq!(env.get_var(&"FOO-BAR".into()), Some(num(1.0)));
    }
}
