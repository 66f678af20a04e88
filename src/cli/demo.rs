use anyhow::{anyhow, Result};
use clap::Args;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::kinds::demo_registry;
use modal_lifecycle::config::Config;
use modal_lifecycle::dialog::{
    headless::{Document, HeadlessFactory},
    styles, DialogController, DialogPhase, PointerTarget, PROGRAMMATIC_REASON,
};

/// Run one open/close lifecycle on a headless surface
#[derive(Args)]
pub struct DemoCommand {
    /// Dialog kind to open
    #[arg(short = 'k', long = "kind", default_value = "confirm")]
    pub kind: String,

    /// Title passed to the opening hook
    #[arg(short = 't', long = "title")]
    pub title: Option<String>,

    /// Return value recorded when closing programmatically
    #[arg(short = 'r', long = "reason")]
    pub reason: Option<String>,

    /// Close with a pointer-down outside the content instead
    #[arg(long = "dismiss", conflicts_with_all = ["escape", "reason"])]
    pub dismiss: bool,

    /// Close through platform dismissal (escape key) instead
    #[arg(long = "escape", conflicts_with = "reason")]
    pub escape: bool,

    /// Make the demo hooks fail in this phase
    #[arg(long = "fail", value_parser = parse_phase)]
    pub fail: Option<DialogPhase>,

    /// How long the dialog stays open, in milliseconds
    #[arg(long = "hold-ms", default_value_t = 200)]
    pub hold_ms: u64,
}

impl Default for DemoCommand {
    fn default() -> Self {
        Self {
            kind: "confirm".to_string(),
            title: None,
            reason: None,
            dismiss: false,
            escape: false,
            fail: None,
            hold_ms: 200,
        }
    }
}

fn parse_phase(value: &str) -> Result<DialogPhase, String> {
    value.parse()
}

impl DemoCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Executing demo command");
        config.validate()?;

        let document = Document::new();
        styles::install(&document);

        let factory = HeadlessFactory::new(document.clone(), config.surface_timing());
        let controller = DialogController::with_event_capacity(
            demo_registry(self.fail),
            factory.clone(),
            config.event_capacity,
        );

        let mut events = controller.subscribe();
        let printer = tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event.return_value {
                    Some(value) => println!("{:<8} {} (return value: {})", event.kind.phase(), event.id, value),
                    None => println!("{:<8} {}", event.kind.phase(), event.id),
                }
            }
        });

        let params = match &self.title {
            Some(title) => serde_json::json!({ "title": title }),
            None => serde_json::Value::Null,
        };

        if let Err(err) = controller.open(self.kind.as_str(), params).await {
            if controller.discard() {
                warn!("Discarded interrupted dialog surface");
            }
            printer.abort();
            return Err(err.into());
        }
        info!(scroll_suppressed = document.scroll_suppressed(), "dialog visible");

        tokio::time::sleep(Duration::from_millis(self.hold_ms)).await;

        if self.dismiss {
            controller.pointer_down(PointerTarget::Surface);
        } else if self.escape {
            let surface = factory
                .last()
                .ok_or_else(|| anyhow!("No dialog surface to dismiss"))?;
            surface.dismiss();
        } else {
            controller.close(self.reason.as_deref().unwrap_or(PROGRAMMATIC_REASON));
        }

        controller.closed().await;
        while controller.surface().is_some() {
            tokio::time::sleep(Duration::from_millis(config.frame_interval_ms.max(1))).await;
        }

        let close_error = controller.take_close_error();

        // Dropping the controller closes the event channel once the printer drains it
        drop(controller);
        let _ = printer.await;

        match close_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}
