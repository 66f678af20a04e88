//! Per-kind lifecycle hooks and the registry that maps kinds to them

use super::{
    surface::SurfaceHandle,
    types::{DialogKind, DialogParams},
};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Lifecycle callbacks for one dialog kind.
///
/// Every phase defaults to a no-op. An `Err` aborts the rest of the
/// current lifecycle pass and is reported as a hook error.
#[async_trait]
pub trait DialogHooks: Send + Sync {
    /// Called after the surface is attached, before it is shown
    async fn opening(&self, surface: &SurfaceHandle, params: &DialogParams) -> Result<()> {
        let _ = (surface, params);
        Ok(())
    }

    /// Called once the surface is shown and its entry animations settled
    async fn opened(&self, surface: &SurfaceHandle, params: &DialogParams) -> Result<()> {
        let _ = (surface, params);
        Ok(())
    }

    /// Called when the native close fires, before exit animations settle
    async fn closing(&self, surface: &SurfaceHandle) -> Result<()> {
        let _ = surface;
        Ok(())
    }

    /// Called after exit animations settled, before the surface is detached
    async fn closed(&self, surface: &SurfaceHandle) -> Result<()> {
        let _ = surface;
        Ok(())
    }
}

type ParamHook = Arc<dyn Fn(SurfaceHandle, DialogParams) -> BoxFuture<'static, Result<()>> + Send + Sync>;
type SurfaceHook = Arc<dyn Fn(SurfaceHandle) -> BoxFuture<'static, Result<()>> + Send + Sync>;

fn param_hook<F, Fut>(hook: F) -> ParamHook
where
    F: Fn(SurfaceHandle, DialogParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(
        move |surface: SurfaceHandle, params: DialogParams| -> BoxFuture<'static, Result<()>> {
            Box::pin(hook(surface, params))
        },
    )
}

fn surface_hook<F, Fut>(hook: F) -> SurfaceHook
where
    F: Fn(SurfaceHandle) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |surface: SurfaceHandle| -> BoxFuture<'static, Result<()>> {
        Box::pin(hook(surface))
    })
}

/// Closure-backed hook set; unset phases are skipped
#[derive(Clone, Default)]
pub struct HookSet {
    opening: Option<ParamHook>,
    opened: Option<ParamHook>,
    closing: Option<SurfaceHook>,
    closed: Option<SurfaceHook>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_opening<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SurfaceHandle, DialogParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.opening = Some(param_hook(hook));
        self
    }

    pub fn on_opened<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SurfaceHandle, DialogParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.opened = Some(param_hook(hook));
        self
    }

    pub fn on_closing<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SurfaceHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.closing = Some(surface_hook(hook));
        self
    }

    pub fn on_closed<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SurfaceHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.closed = Some(surface_hook(hook));
        self
    }
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet")
            .field("opening", &self.opening.is_some())
            .field("opened", &self.opened.is_some())
            .field("closing", &self.closing.is_some())
            .field("closed", &self.closed.is_some())
            .finish()
    }
}

#[async_trait]
impl DialogHooks for HookSet {
    async fn opening(&self, surface: &SurfaceHandle, params: &DialogParams) -> Result<()> {
        match &self.opening {
            Some(hook) => hook(surface.clone(), params.clone()).await,
            None => Ok(()),
        }
    }

    async fn opened(&self, surface: &SurfaceHandle, params: &DialogParams) -> Result<()> {
        match &self.opened {
            Some(hook) => hook(surface.clone(), params.clone()).await,
            None => Ok(()),
        }
    }

    async fn closing(&self, surface: &SurfaceHandle) -> Result<()> {
        match &self.closing {
            Some(hook) => hook(surface.clone()).await,
            None => Ok(()),
        }
    }

    async fn closed(&self, surface: &SurfaceHandle) -> Result<()> {
        match &self.closed {
            Some(hook) => hook(surface.clone()).await,
            None => Ok(()),
        }
    }
}

/// Mapping from dialog kind to its hooks, fixed at construction
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<DialogKind, Arc<dyn DialogHooks>>,
}

impl HookRegistry {
    pub fn builder() -> HookRegistryBuilder {
        HookRegistryBuilder::default()
    }

    pub fn get(&self, kind: &DialogKind) -> Option<Arc<dyn DialogHooks>> {
        self.hooks.get(kind).cloned()
    }

    pub fn contains(&self, kind: &DialogKind) -> bool {
        self.hooks.contains_key(kind)
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> Vec<DialogKind> {
        let mut kinds: Vec<_> = self.hooks.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry").field("kinds", &self.kinds()).finish()
    }
}

#[derive(Default)]
pub struct HookRegistryBuilder {
    hooks: HashMap<DialogKind, Arc<dyn DialogHooks>>,
}

impl HookRegistryBuilder {
    /// Register hooks for `kind`; a later registration replaces an earlier one
    pub fn register(mut self, kind: impl Into<DialogKind>, hooks: impl DialogHooks + 'static) -> Self {
        self.hooks.insert(kind.into(), Arc::new(hooks));
        self
    }

    pub fn register_shared(mut self, kind: impl Into<DialogKind>, hooks: Arc<dyn DialogHooks>) -> Self {
        self.hooks.insert(kind.into(), hooks);
        self
    }

    pub fn build(self) -> HookRegistry {
        HookRegistry { hooks: self.hooks }
    }
}
