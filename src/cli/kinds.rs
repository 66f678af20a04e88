use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::info;

use modal_lifecycle::dialog::{DialogHooks, DialogParams, DialogPhase, HookRegistry, HookSet, SurfaceHandle};

/// Hooks for the demo kinds; fails on purpose in `fail_on`
struct DemoHooks {
    fail_on: Option<DialogPhase>,
}

impl DemoHooks {
    fn step(&self, phase: DialogPhase, surface: &SurfaceHandle) -> Result<()> {
        if self.fail_on == Some(phase) {
            bail!("demo hook configured to fail during {}", phase);
        }
        info!(surface = %surface.id(), %phase, "demo hook ran");
        Ok(())
    }
}

#[async_trait]
impl DialogHooks for DemoHooks {
    async fn opening(&self, surface: &SurfaceHandle, params: &DialogParams) -> Result<()> {
        if let Some(title) = params.get("title").and_then(|t| t.as_str()) {
            info!(title, "rendering dialog content");
        }
        self.step(DialogPhase::Opening, surface)
    }

    async fn opened(&self, surface: &SurfaceHandle, _params: &DialogParams) -> Result<()> {
        self.step(DialogPhase::Opened, surface)
    }

    async fn closing(&self, surface: &SurfaceHandle) -> Result<()> {
        self.step(DialogPhase::Closing, surface)
    }

    async fn closed(&self, surface: &SurfaceHandle) -> Result<()> {
        self.step(DialogPhase::Closed, surface)
    }
}

/// Registry of the kinds the demo binary can open
pub fn demo_registry(fail_on: Option<DialogPhase>) -> HookRegistry {
    let alert_fails = fail_on == Some(DialogPhase::Opening);
    HookRegistry::builder()
        .register("confirm", DemoHooks { fail_on })
        .register(
            "alert",
            HookSet::new().on_opening(move |surface, _params| async move {
                if alert_fails {
                    bail!("alert content unavailable");
                }
                info!(surface = %surface.id(), "alert content rendered");
                Ok(())
            }),
        )
        .register("notice", HookSet::new())
        .build()
}
