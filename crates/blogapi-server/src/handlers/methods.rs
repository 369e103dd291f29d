//! Pluggable entity methods.
//!
//! A method is a [`EntityMethod`] trait object registered in a
//! [`MethodRegistry`] under an entity and a name. [`MethodHandler`] runs it
//! inside its own unit of work and wraps the outcome for the HTTP layer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use blogapi_storage::{BlogStore, StorageError, StoreTransaction};
use serde::Serialize;
use tracing::{error, instrument};

use super::error::{HandlerError, HandlerResult};
use super::finish;
use super::types::{BlogPost, Comment};

/// Entities that can carry methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    BlogPost,
    Comment,
}

impl EntityKind {
    /// Class name reported in invocation results.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::BlogPost => "BlogPost",
            EntityKind::Comment => "Comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value returned by a method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MethodValue {
    /// Serializes as `null`.
    Empty,
    Scalar(serde_json::Value),
    BlogPost(BlogPost),
    BlogPosts(Vec<BlogPost>),
    Comment(Comment),
    Comments(Vec<Comment>),
}

/// What a method produced: its value plus any text it wants reported.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOutcome {
    pub value: MethodValue,
    pub output: Option<String>,
}

impl MethodOutcome {
    pub fn value(value: MethodValue) -> Self {
        Self {
            value,
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Failure raised inside a method.
#[derive(Debug, thiserror::Error)]
pub enum MethodError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Failed(String),
}

/// A class-level operation bound to an entity.
#[async_trait]
pub trait EntityMethod: Send + Sync {
    /// Runs the method. Every change goes through `tx` and is discarded if
    /// the method returns an error.
    async fn call(&self, tx: &mut dyn StoreTransaction) -> Result<MethodOutcome, MethodError>;
}

/// Methods keyed by (entity, method name).
#[derive(Default, Clone)]
pub struct MethodRegistry {
    methods: HashMap<(EntityKind, String), Arc<dyn EntityMethod>>,
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .methods
            .keys()
            .map(|(entity, name)| format!("{entity}.{name}"))
            .collect();
        keys.sort();
        f.debug_struct("MethodRegistry")
            .field("methods", &keys)
            .finish()
    }
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `method` under `entity.name`, replacing any previous one.
    pub fn register<M>(&mut self, entity: EntityKind, name: impl Into<String>, method: M)
    where
        M: EntityMethod + 'static,
    {
        self.methods
            .insert((entity, name.into()), Arc::new(method));
    }

    /// Builder form of [`MethodRegistry::register`].
    pub fn with<M>(mut self, entity: EntityKind, name: impl Into<String>, method: M) -> Self
    where
        M: EntityMethod + 'static,
    {
        self.register(entity, name, method);
        self
    }

    pub fn get(&self, entity: EntityKind, name: &str) -> Option<Arc<dyn EntityMethod>> {
        self.methods.get(&(entity, name.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Result of a method invocation as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInvocation {
    pub class: &'static str,
    pub method: String,
    pub status: &'static str,
    pub result: MethodValue,
    pub output: Option<String>,
}

/// Runs registered methods, one unit of work per invocation.
pub struct MethodHandler<S: BlogStore> {
    store: Arc<S>,
    registry: Arc<MethodRegistry>,
}

impl<S: BlogStore> Clone for MethodHandler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<S: BlogStore> MethodHandler<S> {
    pub fn new(store: Arc<S>, registry: Arc<MethodRegistry>) -> Self {
        Self { store, registry }
    }

    /// The registry this handler dispatches to.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Invokes `entity.name`.
    ///
    /// Any failure, including an unknown method, is reported as
    /// [`HandlerError::Internal`] after the unit of work is rolled back.
    #[instrument(skip(self))]
    pub async fn invoke(&self, entity: EntityKind, name: &str) -> HandlerResult<MethodInvocation> {
        let Some(method) = self.registry.get(entity, name) else {
            error!(%entity, method = name, "Method is not registered");
            return Err(HandlerError::Internal {
                message: format!("{entity} has no method '{name}'"),
            });
        };

        let mut tx = self.store.begin().await.map_err(internal)?;
        let result = method.call(tx.as_mut()).await.map_err(|err| {
            error!(%entity, method = name, error = %err, "Method failed");
            HandlerError::Internal {
                message: err.to_string(),
            }
        });
        let outcome = finish(tx, result).await.map_err(|err| match err {
            HandlerError::Internal { .. } => err,
            other => internal(other),
        })?;

        Ok(MethodInvocation {
            class: entity.name(),
            method: name.to_string(),
            status: "executed",
            result: outcome.value,
            output: outcome.output,
        })
    }
}

fn internal(err: impl fmt::Display) -> HandlerError {
    HandlerError::Internal {
        message: err.to_string(),
    }
}
