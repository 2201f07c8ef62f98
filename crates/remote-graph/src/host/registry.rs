//! Exposed targets and the thread-affinity wrappers they run under.

use super::members::ObjectRef;
use crate::ipc::TargetKey;
use crate::{RemoteError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Work that mutates the graph.
pub type Mutation = Box<dyn FnOnce() + Send>;
/// Work that reads the graph and produces a value.
pub type Evaluation = Box<dyn FnOnce() -> Box<dyn Any + Send> + Send>;

/// Where graph access runs.
///
/// The host hands every navigation, read and call to `evaluate`, and every
/// property write to `mutate`. The defaults run inline on the dispatch thread.
/// A host whose graph is owned by one thread (a UI thread, say) supplies
/// wrappers that marshal the work there and block until it completes.
#[derive(Clone)]
pub struct Wrappers {
    mutate: Arc<dyn Fn(Mutation) + Send + Sync>,
    evaluate: Arc<dyn Fn(Evaluation) -> Box<dyn Any + Send> + Send + Sync>,
}

impl Wrappers {
    pub fn inline() -> Self {
        Self {
            mutate: Arc::new(|work: Mutation| work()),
            evaluate: Arc::new(|work: Evaluation| work()),
        }
    }

    pub fn new(
        mutate: impl Fn(Mutation) + Send + Sync + 'static,
        evaluate: impl Fn(Evaluation) -> Box<dyn Any + Send> + Send + Sync + 'static,
    ) -> Self {
        Self {
            mutate: Arc::new(mutate),
            evaluate: Arc::new(evaluate),
        }
    }

    pub fn with_mutate(mut self, mutate: impl Fn(Mutation) + Send + Sync + 'static) -> Self {
        self.mutate = Arc::new(mutate);
        self
    }

    pub fn with_evaluate(
        mut self,
        evaluate: impl Fn(Evaluation) -> Box<dyn Any + Send> + Send + Sync + 'static,
    ) -> Self {
        self.evaluate = Arc::new(evaluate);
        self
    }
}

impl Default for Wrappers {
    fn default() -> Self {
        Self::inline()
    }
}

impl fmt::Debug for Wrappers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrappers").finish_non_exhaustive()
    }
}

/// One exposed root object.
#[derive(Debug)]
pub struct HostedTarget {
    key: TargetKey,
    root: ObjectRef,
    wrappers: Wrappers,
}

impl HostedTarget {
    pub fn new(key: TargetKey, root: ObjectRef, wrappers: Wrappers) -> Self {
        Self { key, root, wrappers }
    }

    pub fn key(&self) -> &TargetKey {
        &self.key
    }

    pub fn root(&self) -> &ObjectRef {
        &self.root
    }

    /// Run `work` through the evaluate wrapper.
    pub(crate) fn evaluate<R: Send + 'static>(
        &self,
        work: impl FnOnce() -> R + Send + 'static,
    ) -> Result<R> {
        let boxed =
            (self.wrappers.evaluate)(Box::new(move || Box::new(work()) as Box<dyn Any + Send>));
        boxed.downcast::<R>().map(|value| *value).map_err(|_| {
            RemoteError::Other(format!(
                "Evaluate wrapper for {} returned a value it was not given",
                self.key
            ))
        })
    }

    /// Run `work` through the mutate wrapper. The wrapper must have run it by
    /// the time it returns.
    pub(crate) fn mutate<R: Send + 'static>(
        &self,
        work: impl FnOnce() -> R + Send + 'static,
    ) -> Result<R> {
        let slot = Arc::new(Mutex::new(None));
        let filled = slot.clone();
        (self.wrappers.mutate)(Box::new(move || {
            let value = work();
            *filled.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        }));

        let value = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        value.ok_or_else(|| {
            RemoteError::Other(format!(
                "Mutate wrapper for {} returned without running the write",
                self.key
            ))
        })
    }
}

/// All targets exposed by one host.
#[derive(Debug, Default)]
pub struct Registry {
    targets: RwLock<HashMap<TargetKey, Arc<HostedTarget>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target. Keys are never replaced.
    pub fn insert(&self, target: HostedTarget) -> Result<()> {
        let mut targets = self.targets.write().unwrap_or_else(PoisonError::into_inner);
        if targets.contains_key(&target.key) {
            return Err(RemoteError::DuplicateRegistration {
                type_identity: target.key.type_identity.clone(),
                instance_id: target.key.instance_id.clone(),
            });
        }
        targets.insert(target.key.clone(), Arc::new(target));
        Ok(())
    }

    pub fn contains(&self, key: &TargetKey) -> bool {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn get(&self, key: &TargetKey) -> Option<Arc<HostedTarget>> {
        self.targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn keys(&self) -> Vec<TargetKey> {
        let mut keys: Vec<TargetKey> = self
            .targets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort_by(|a, b| {
            (&a.type_identity, &a.instance_id).cmp(&(&b.type_identity, &b.instance_id))
        });
        keys
    }

    pub fn len(&self) -> usize {
        self.targets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
