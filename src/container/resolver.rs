//! Resolution context handed to resolved parameters and factories.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use crate::container::entry::{downcast, Instance, Params, Source};
use crate::container::error::{ContainerError, ContainerResult};
use crate::container::registry::Container;

/// Addresses currently being built, outermost first.
#[derive(Debug, Default)]
pub(crate) struct ResolutionStack {
    frames: RefCell<Vec<String>>,
}

impl ResolutionStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fails if `address` is already being built further up.
    pub(crate) fn check(&self, address: &str) -> ContainerResult<()> {
        let frames = self.frames.borrow();
        if frames.iter().any(|frame| frame == address) {
            let mut chain = frames.clone();
            chain.push(address.to_string());
            return Err(ContainerError::CyclicDependency { chain });
        }
        Ok(())
    }

    pub(crate) fn enter(&self, address: &str) -> ContainerResult<()> {
        self.check(address)?;
        self.frames.borrow_mut().push(address.to_string());
        Ok(())
    }

    pub(crate) fn leave(&self) {
        self.frames.borrow_mut().pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// The `{invoke, make, from}` view of a container during one resolution.
///
/// Calls made through a resolver share the resolution stack of the build
/// that created it, so a dependency that reaches back to its own address
/// fails with [`ContainerError::CyclicDependency`] instead of recursing.
pub struct Resolver<'c> {
    container: &'c Container,
    stack: &'c ResolutionStack,
}

impl<'c> Resolver<'c> {
    pub(crate) fn new(container: &'c Container, stack: &'c ResolutionStack) -> Self {
        Self { container, stack }
    }

    /// Singleton at `address`.
    pub fn invoke(&self, address: &str) -> ContainerResult<Instance> {
        self.container.invoke_in(address, self.stack)
    }

    /// Fresh instance of `address` built with `params`.
    pub fn make(&self, address: &str, params: Params) -> ContainerResult<Instance> {
        self.container.make_in(address, params, self.stack)
    }

    /// Raw source registered at `address`.
    pub fn from(&self, address: &str) -> ContainerResult<Arc<Source>> {
        self.container.from(address)
    }

    pub fn invoke_as<T: Any + Send + Sync>(&self, address: &str) -> ContainerResult<Arc<T>> {
        downcast(address, self.invoke(address)?)
    }

    pub fn make_as<T: Any + Send + Sync>(&self, address: &str, params: Params) -> ContainerResult<Arc<T>> {
        downcast(address, self.make(address, params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_detects_reentry() {
        let stack = ResolutionStack::new();
        stack.enter("a").unwrap();
        stack.enter("b").unwrap();
        assert_eq!(stack.depth(), 2);

        match stack.enter("a") {
            Err(ContainerError::CyclicDependency { chain }) => assert_eq!(chain, ["a", "b", "a"]),
            other => panic!("expected cycle, got {:?}", other),
        }

        stack.leave();
        stack.leave();
        assert_eq!(stack.depth(), 0);
        assert!(stack.enter("a").is_ok());
    }
}
