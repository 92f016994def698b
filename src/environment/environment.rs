use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::errors::errors::ErrorImpl;

/// A single frame of bindings.
///
/// A binding holding `None` has been declared but not yet initialized.
#[derive(Debug)]
pub struct Scope<T> {
    bindings: HashMap<String, Option<T>>,
    parent: Option<Rc<RefCell<Scope<T>>>>,
    read_only: bool,
}

impl<T: Clone> Scope<T> {
    fn with_parent(parent: Option<Rc<RefCell<Scope<T>>>>) -> Self {
        Scope {
            bindings: HashMap::new(),
            parent,
            read_only: false,
        }
    }

    fn lookup(&self, name: &str) -> Result<T, ErrorImpl> {
        match self.bindings.get(name) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(ErrorImpl::SelfReferentialInit {
                symbol: name.to_string(),
            }),
            None => match &self.parent {
                Some(parent) => parent.borrow().lookup(name),
                None => Err(ErrorImpl::UndefinedSymbol {
                    symbol: name.to_string(),
                }),
            },
        }
    }

    fn assign(&mut self, name: &str, value: T) -> Result<(), ErrorImpl> {
        if let Some(slot) = self.bindings.get_mut(name) {
            if self.read_only {
                return Err(ErrorImpl::AssignToConstant {
                    symbol: name.to_string(),
                });
            }
            *slot = Some(value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(ErrorImpl::UndefinedSymbol {
                symbol: name.to_string(),
            }),
        }
    }

    fn is_read_only(&self, name: &str) -> bool {
        if self.bindings.contains_key(name) {
            return self.read_only;
        }
        match &self.parent {
            Some(parent) => parent.borrow().is_read_only(name),
            None => false,
        }
    }
}

/// A handle on the innermost frame of a chain of scopes.
///
/// Cloning the handle shares the frames; closures keep the environment they
/// were declared in alive this way.
#[derive(Debug)]
pub struct Environment<T> {
    current: Rc<RefCell<Scope<T>>>,
    depth: usize,
}

impl<T> Clone for Environment<T> {
    fn clone(&self) -> Self {
        Environment {
            current: Rc::clone(&self.current),
            depth: self.depth,
        }
    }
}

impl<T: Clone> Environment<T> {
    pub fn new() -> Self {
        Environment {
            current: Rc::new(RefCell::new(Scope::with_parent(None))),
            depth: 0,
        }
    }

    /// Builds a read-only outermost frame from `bindings` and returns an
    /// environment whose current frame is a fresh child of it.
    pub fn with_frozen_root(bindings: impl IntoIterator<Item = (String, T)>) -> Self {
        let root = Scope {
            bindings: bindings
                .into_iter()
                .map(|(name, value)| (name, Some(value)))
                .collect(),
            parent: None,
            read_only: true,
        };
        Environment {
            current: Rc::new(RefCell::new(Scope::with_parent(Some(Rc::new(
                RefCell::new(root),
            ))))),
            depth: 1,
        }
    }

    /// Number of frames above the outermost one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn push(&mut self) {
        let parent = Rc::clone(&self.current);
        self.current = Rc::new(RefCell::new(Scope::with_parent(Some(parent))));
        self.depth += 1;
    }

    pub fn pop(&mut self) -> Result<(), ErrorImpl> {
        let parent = self
            .current
            .borrow()
            .parent
            .clone()
            .ok_or(ErrorImpl::ScopeUnderflow)?;
        self.current = parent;
        self.depth -= 1;
        Ok(())
    }

    /// Returns a new environment whose current frame is a child of this one,
    /// leaving this handle untouched.
    pub fn child(&self) -> Self {
        let mut child = self.clone();
        child.push();
        child
    }

    /// Binds `name` in the current frame.
    ///
    /// Filling in a placeholder left by [`Environment::declare`] is allowed;
    /// any other existing binding in the same frame is a redefinition.
    pub fn define(&mut self, name: &str, value: T) -> Result<(), ErrorImpl> {
        let mut scope = self.current.borrow_mut();
        if scope.read_only {
            return Err(ErrorImpl::AssignToConstant {
                symbol: name.to_string(),
            });
        }
        match scope.bindings.get_mut(name) {
            Some(Some(_)) => Err(ErrorImpl::Redefinition {
                symbol: name.to_string(),
            }),
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => {
                scope.bindings.insert(name.to_string(), Some(value));
                Ok(())
            }
        }
    }

    /// Binds `name` in the current frame without a value yet.
    pub fn declare(&mut self, name: &str) -> Result<(), ErrorImpl> {
        let mut scope = self.current.borrow_mut();
        if scope.bindings.contains_key(name) {
            return Err(ErrorImpl::Redefinition {
                symbol: name.to_string(),
            });
        }
        scope.bindings.insert(name.to_string(), None);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<T, ErrorImpl> {
        self.current.borrow().lookup(name)
    }

    /// Rebinds `name` in the nearest frame that holds it.
    pub fn assign(&self, name: &str, value: T) -> Result<(), ErrorImpl> {
        self.current.borrow_mut().assign(name, value)
    }

    /// Whether the nearest binding of `name` lives in a read-only frame.
    pub fn is_read_only(&self, name: &str) -> bool {
        self.current.borrow().is_read_only(name)
    }
}

impl<T: Clone> Default for Environment<T> {
    fn default() -> Self {
        Self::new()
    }
}
