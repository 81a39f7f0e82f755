//! Closure-pair history entries.

use std::convert::Infallible;
use std::fmt;

use crate::{Command, UndoError};

type Action<S> = Box<dyn Fn(&mut S)>;

/// History entry made of two closures over the same target.
pub struct FnCommand<S: ?Sized> {
    description: String,
    undo: Action<S>,
    redo: Action<S>,
}

impl<S: ?Sized> FnCommand<S> {
    pub fn new(
        undo: impl Fn(&mut S) + 'static,
        redo: impl Fn(&mut S) + 'static,
    ) -> Self {
        Self {
            description: String::from("edit"),
            undo: Box::new(undo),
            redo: Box::new(redo),
        }
    }

    /// Builder accepting the two sides separately; `build` fails if either is
    /// missing.
    pub fn builder() -> FnCommandBuilder<S> {
        FnCommandBuilder {
            description: None,
            undo: None,
            redo: None,
        }
    }
}

impl<S: ?Sized> fmt::Debug for FnCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCommand")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> Command for FnCommand<S> {
    type Target = S;
    type Error = Infallible;

    fn undo(&self, target: &mut S) -> Result<(), Infallible> {
        (self.undo)(target);
        Ok(())
    }

    fn redo(&self, target: &mut S) -> Result<(), Infallible> {
        (self.redo)(target);
        Ok(())
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

pub struct FnCommandBuilder<S: ?Sized> {
    description: Option<String>,
    undo: Option<Action<S>>,
    redo: Option<Action<S>>,
}

impl<S: ?Sized> FnCommandBuilder<S> {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn undo(mut self, action: impl Fn(&mut S) + 'static) -> Self {
        self.undo = Some(Box::new(action));
        self
    }

    pub fn redo(mut self, action: impl Fn(&mut S) + 'static) -> Self {
        self.redo = Some(Box::new(action));
        self
    }

    pub fn build(self) -> Result<FnCommand<S>, UndoError> {
        let undo = self.undo.ok_or(UndoError::MissingAction("undo"))?;
        let redo = self.redo.ok_or(UndoError::MissingAction("redo"))?;
        Ok(FnCommand {
            description: self.description.unwrap_or_else(|| String::from("edit")),
            undo,
            redo,
        })
    }
}
