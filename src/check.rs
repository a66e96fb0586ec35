use std::{fmt, sync::Arc};

use crate::{LabeledArray, LabeledCollection, SchemaError};

/// A custom check on a whole array. Returns a message describing the failure.
pub type ArrayCheckFn = dyn Fn(&dyn LabeledArray) -> Result<(), String> + Send + Sync;

/// A custom check on a whole collection. Returns a message describing the failure.
pub type CollectionCheckFn = dyn Fn(&dyn LabeledCollection) -> Result<(), String> + Send + Sync;

/// A custom check, named for diagnostics.
pub(crate) struct NamedCheck<F: ?Sized> {
    name: String,
    check: Arc<F>,
}

impl<F: ?Sized> NamedCheck<F> {
    pub(crate) fn new(name: String, check: Arc<F>) -> Self {
        Self { name, check }
    }

    fn failed(&self, message: String) -> SchemaError {
        SchemaError::CheckFailed {
            check: self.name.clone(),
            message,
        }
    }
}

impl NamedCheck<ArrayCheckFn> {
    pub(crate) fn run(&self, array: &dyn LabeledArray) -> Result<(), SchemaError> {
        (self.check)(array).map_err(|message| self.failed(message))
    }
}

impl NamedCheck<CollectionCheckFn> {
    pub(crate) fn run(&self, collection: &dyn LabeledCollection) -> Result<(), SchemaError> {
        (self.check)(collection).map_err(|message| self.failed(message))
    }
}

impl<F: ?Sized> Clone for NamedCheck<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            check: Arc::clone(&self.check),
        }
    }
}

impl<F: ?Sized> fmt::Debug for NamedCheck<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedCheck").field(&self.name).finish()
    }
}
