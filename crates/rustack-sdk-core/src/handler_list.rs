//! Named middleware grouped into ordered steps.
//!
//! A [`HandlerList`] keeps middleware under four [`Step`]s that always run in
//! the order `Init`, `Validate`, `Build`, `Sign`. Within a step, an entry added
//! earlier wraps the entries added after it. Every entry carries a name so that
//! callers can insert around, replace, or drop a stage of the default pipeline
//! without rebuilding it.

use std::fmt;

use tracing::debug;

use crate::error::{SdkError, SdkResult};
use crate::handler::{SharedHandler, SharedMiddleware, compose};

/// A stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Runs first; prepares the command (e.g. resolves source files).
    Init,
    /// Checks the command against the API model.
    Validate,
    /// Turns the command into a request and decorates it.
    Build,
    /// Signs and sends the request.
    Sign,
}

impl Step {
    /// Every step in execution order.
    pub const ALL: [Step; 4] = [Step::Init, Step::Validate, Step::Build, Step::Sign];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Build => "build",
            Self::Sign => "sign",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
struct Entry {
    name: String,
    middleware: SharedMiddleware,
}

/// An ordered, named collection of middleware plus the terminal handler.
#[derive(Clone, Default)]
pub struct HandlerList {
    handler: Option<SharedHandler>,
    steps: [Vec<Entry>; 4],
}

impl HandlerList {
    /// An empty list without a terminal handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the terminal handler, the innermost stage that sends the request.
    pub fn set_handler(&mut self, handler: SharedHandler) {
        self.handler = Some(handler);
    }

    /// Whether a terminal handler has been set.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Add `middleware` as the innermost entry of `step`.
    ///
    /// An existing entry with the same name is replaced.
    pub fn append(&mut self, step: Step, name: impl Into<String>, middleware: SharedMiddleware) {
        let name = name.into();
        self.remove(&name);
        self.steps[step.index()].push(Entry { name, middleware });
    }

    /// Add `middleware` as the outermost entry of `step`.
    ///
    /// An existing entry with the same name is replaced.
    pub fn prepend(&mut self, step: Step, name: impl Into<String>, middleware: SharedMiddleware) {
        let name = name.into();
        self.remove(&name);
        self.steps[step.index()].insert(0, Entry { name, middleware });
    }

    /// Insert `middleware` directly outside the entry named `target`, in the
    /// same step.
    ///
    /// # Errors
    ///
    /// Fails if no entry is named `target`.
    pub fn before(
        &mut self,
        target: &str,
        name: impl Into<String>,
        middleware: SharedMiddleware,
    ) -> SdkResult<()> {
        self.insert_relative(target, name.into(), middleware, 0)
    }

    /// Insert `middleware` directly inside the entry named `target`, in the
    /// same step.
    ///
    /// # Errors
    ///
    /// Fails if no entry is named `target`.
    pub fn after(
        &mut self,
        target: &str,
        name: impl Into<String>,
        middleware: SharedMiddleware,
    ) -> SdkResult<()> {
        self.insert_relative(target, name.into(), middleware, 1)
    }

    fn insert_relative(
        &mut self,
        target: &str,
        name: String,
        middleware: SharedMiddleware,
        offset: usize,
    ) -> SdkResult<()> {
        if name != target {
            self.remove(&name);
        }
        let (step, position) = self
            .find(target)
            .ok_or_else(|| SdkError::internal(format!("no middleware named {target}")))?;
        if name == target {
            self.steps[step][position] = Entry { name, middleware };
        } else {
            self.steps[step].insert(position + offset, Entry { name, middleware });
        }
        Ok(())
    }

    /// Remove the entry named `name`. Returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.find(name) {
            Some((step, position)) => {
                self.steps[step].remove(position);
                true
            }
            None => false,
        }
    }

    /// Whether an entry named `name` exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Entry names in invocation order, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flatten()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Fold every entry around the terminal handler.
    ///
    /// # Errors
    ///
    /// Fails if no terminal handler has been set.
    pub fn resolve(&self) -> SdkResult<SharedHandler> {
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| SdkError::internal("no terminal handler set"))?;
        let middlewares: Vec<&SharedMiddleware> = self
            .steps
            .iter()
            .flatten()
            .map(|entry| &entry.middleware)
            .collect();
        debug!(middlewares = middlewares.len(), "resolving handler list");
        Ok(compose(middlewares, handler))
    }

    fn find(&self, name: &str) -> Option<(usize, usize)> {
        self.steps.iter().enumerate().find_map(|(step, entries)| {
            entries
                .iter()
                .position(|entry| entry.name == name)
                .map(|position| (step, position))
        })
    }
}

impl fmt::Debug for HandlerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_struct("HandlerList");
        for step in Step::ALL {
            let names: Vec<&str> = self.steps[step.index()]
                .iter()
                .map(|entry| entry.name.as_str())
                .collect();
            list.field(&step.to_string(), &names);
        }
        list.field("handler", &self.handler.is_some()).finish()
    }
}
