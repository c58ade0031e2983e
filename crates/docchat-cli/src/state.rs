use std::sync::Arc;

use docchat_sync::AppContext;

use crate::config::CliConfig;

/// Shared state passed to all command handlers
#[derive(Clone)]
pub struct CliState {
    pub config: Arc<CliConfig>,
    pub context: Arc<AppContext>,
    /// Print machine-readable JSON instead of tables
    pub json: bool,
}

impl CliState {
    pub fn new(config: CliConfig, json: bool) -> anyhow::Result<Self> {
        let context = AppContext::builder()
            .client_config(config.client_config())
            .settings(config.sync)
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            context: Arc::new(context),
            json,
        })
    }

    /// Print a listing as JSON or through `render`
    pub fn print<T, F>(&self, items: &[T], render: F) -> anyhow::Result<()>
    where
        T: serde::Serialize,
        F: Fn(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(items)?);
        } else if items.is_empty() {
            println!("(none)");
        } else {
            for item in items {
                println!("{}", render(item));
            }
        }
        Ok(())
    }
}
