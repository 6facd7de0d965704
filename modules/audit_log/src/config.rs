use serde::Deserialize;

/// Settings for the `audit_log` section of the configuration tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditLogConfig {
    pub enabled: bool,
    /// "basic" or "detailed"
    pub level: String,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "basic".to_string(),
        }
    }
}

impl AuditLogConfig {
    /// Validated eagerly during configure so a bad section fails startup
    /// before any dependent module runs.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.level.as_str() {
            "basic" | "detailed" => Ok(()),
            other => anyhow::bail!(
                "unsupported audit level '{other}' (expected 'basic' or 'detailed')"
            ),
        }
    }
}
