use serde::Deserialize;

/// Settings for the `heartbeat` section of the configuration tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Free-form text attached to every beat.
    pub message: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            message: "keystone heartbeat".to_string(),
        }
    }
}

impl HeartbeatConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.message.trim().is_empty() {
            anyhow::bail!("heartbeat message must not be empty");
        }
        Ok(())
    }
}
