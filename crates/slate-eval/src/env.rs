//! The environment arena.
//!
//! Scope frames live in one arena owned by the evaluator and refer to
//! their parents by [`EnvId`]. This breaks the reference cycle between
//! environments and the subroutine values stored in them: a subroutine
//! value carries indices, never owning references.
//!
//! Frame 0 is always the root environment holding the built-ins. Call
//! frames are pushed per subroutine call and simply abandoned when the
//! call returns; a frame captured by a subroutine defined inside the call
//! stays valid because the arena never frees.

use slate_util::{define_idx, FxHashMap, IndexVec};

use crate::error::RuntimeError;
use crate::value::Value;

define_idx!(EnvId);

/// The root frame's id.
pub const ROOT_ENV: EnvId = EnvId(0);

/// How a binding may be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Ordinary binding.
    Norm,
    /// `const` binding; assignment through it is a value error.
    Const,
}

/// One binding cell: the value and its access flag.
#[derive(Clone, Debug)]
struct Slot {
    value: Value,
    access: Access,
}

/// A scope frame: bindings plus an optional parent.
#[derive(Debug, Default)]
struct Frame {
    bindings: FxHashMap<String, Slot>,
    parent: Option<EnvId>,
}

/// All environment frames for one program run.
#[derive(Debug)]
pub struct Environments {
    frames: IndexVec<EnvId, Frame>,
}

impl Environments {
    /// Creates the arena with an empty root frame.
    pub fn new() -> Self {
        let mut frames = IndexVec::new();
        frames.push(Frame::default());
        Self { frames }
    }

    /// Pushes a new frame chained to `parent` and returns its id.
    pub fn push_frame(&mut self, parent: EnvId) -> EnvId {
        self.frames.push(Frame {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        })
    }

    /// Declares `name` in `env` directly.
    ///
    /// Fails with a value error if the frame already binds the name.
    pub fn declare(
        &mut self,
        env: EnvId,
        name: &str,
        value: Value,
        access: Access,
    ) -> Result<(), RuntimeError> {
        let frame = &mut self.frames[env];
        if frame.bindings.contains_key(name) {
            return Err(RuntimeError::value_error(format!(
                "'{}' is already declared",
                name
            )));
        }
        frame.bindings.insert(name.to_string(), Slot { value, access });
        Ok(())
    }

    /// Assigns `name` to `value`.
    ///
    /// The name is resolved up the parent chain and written in its
    /// defining frame; if no frame binds it, it is declared in `env`
    /// (implicit declaration at first write). Writing through a `const`
    /// binding is a value error.
    pub fn assign(
        &mut self,
        env: EnvId,
        name: &str,
        value: Value,
        access: Access,
    ) -> Result<(), RuntimeError> {
        let target = self.resolve(env, name).unwrap_or(env);
        self.write(target, name, value, access)
    }

    /// Assigns `name` in the root frame, for `global` assignments.
    pub fn assign_global(
        &mut self,
        name: &str,
        value: Value,
        access: Access,
    ) -> Result<(), RuntimeError> {
        self.write(ROOT_ENV, name, value, access)
    }

    /// Binds `name` in `env` unconditionally.
    ///
    /// Used when installing built-ins into the fresh root frame, where
    /// neither duplicate-declaration nor const checks apply.
    pub(crate) fn bind(&mut self, env: EnvId, name: &str, value: Value, access: Access) {
        self.frames[env]
            .bindings
            .insert(name.to_string(), Slot { value, access });
    }

    /// Resolves `name` starting from `env` and returns its value.
    pub fn get(&self, env: EnvId, name: &str) -> Result<Value, RuntimeError> {
        let defining = self.resolve(env, name).ok_or_else(|| RuntimeError::Name {
            name: name.to_string(),
        })?;
        Ok(self.frames[defining].bindings[name].value.clone())
    }

    /// Finds the frame that binds `name`, walking the parent chain.
    fn resolve(&self, env: EnvId, name: &str) -> Option<EnvId> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = &self.frames[id];
            if frame.bindings.contains_key(name) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }

    /// Writes a slot, enforcing const protection on the existing binding.
    fn write(
        &mut self,
        env: EnvId,
        name: &str,
        value: Value,
        access: Access,
    ) -> Result<(), RuntimeError> {
        let frame = &mut self.frames[env];
        if let Some(existing) = frame.bindings.get(name) {
            if existing.access == Access::Const {
                return Err(RuntimeError::value_error(format!(
                    "cannot assign to constant '{}'",
                    name
                )));
            }
        }
        frame.bindings.insert(name.to_string(), Slot { value, access });
        Ok(())
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}
