use std::sync::Arc;

use crate::core::CodeDescriber;
use crate::SimConfig;

use super::Runtime;

/// Runtime builder.
///
/// The runtime builder validates the simulation configuration and attaches
/// the optional runtime services before the runtime is handed to the caller.
pub struct Builder(Runtime);

impl Builder {
    /// Construct runtime builder from configuration.
    pub(super) fn from_config(config: &SimConfig) -> super::Result<Self> {
        config.validate()?;

        Ok(Self(Runtime {
            config: config.clone(),
            shutdown: tokio::sync::broadcast::channel(1),
            describer: None,
        }))
    }

    /// Listen for termination signals.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_shutdown(self) -> Self {
        let sender = self.0.shutdown.0.clone();

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for termination signal: {}", e);
                return;
            }

            info!("Termination requested");

            sender.send(()).ok();
        });

        self
    }

    /// Resolve every new diagnostic trouble code for the log.
    pub fn with_describer(mut self, describer: impl CodeDescriber + 'static) -> Self {
        self.0.describer = Some(Arc::new(describer));
        self
    }

    pub fn build(self) -> Runtime {
        self.0
    }
}
