//! Document-level auto-configuration from the `x-cli-config` extension.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::AutoConfigError;
use crate::ext::EXT_CLI_CONFIG;

/// A value the host should ask the user for when setting up a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptVar {
    pub description: String,
    pub example: String,
    pub default: Option<Value>,
    #[serde(rename = "enum")]
    pub enum_values: Vec<Value>,
    /// Used only while prompting, not stored in the profile
    pub exclude: bool,
}

/// Default authentication for newly configured profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSpec {
    /// Name of the security scheme
    pub name: String,
    pub params: BTreeMap<String, String>,
}

/// Auto-configuration applied when the user has not configured the API.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct AutoConfig {
    pub auth: AuthSpec,
    pub headers: BTreeMap<String, String>,
    pub prompt: BTreeMap<String, PromptVar>,
}

impl AutoConfig {
    /// Layer the declared auth params over host-supplied defaults.
    /// Declared params win.
    pub fn auth_params_over(
        &self,
        defaults: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut params = defaults.clone();
        params.extend(self.auth.params.clone());
        params
    }
}

#[derive(Debug, Deserialize)]
struct RawAutoConfig {
    #[serde(default)]
    security: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    prompt: BTreeMap<String, PromptVar>,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

/// Decode the `x-cli-config` extension of the document root.
///
/// `Ok(None)` when the extension is absent.
pub fn decode_auto_config(root: &Value) -> Result<Option<AutoConfig>, AutoConfigError> {
    let node = match root.get(EXT_CLI_CONFIG) {
        Some(node) if !node.is_null() => node,
        _ => return Ok(None),
    };

    let raw = RawAutoConfig::deserialize(node).map_err(AutoConfigError::Decode)?;

    Ok(Some(AutoConfig {
        auth: AuthSpec {
            name: raw.security,
            params: raw.params,
        },
        headers: raw.headers,
        prompt: raw.prompt,
    }))
}

/// Like [`decode_auto_config`], but a malformed block is logged and
/// treated as absent.
pub fn load_auto_config(root: &Value) -> Option<AutoConfig> {
    match decode_auto_config(root) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, cause = ?std::error::Error::source(&e), "ignoring x-cli-config");
            None
        }
    }
}
