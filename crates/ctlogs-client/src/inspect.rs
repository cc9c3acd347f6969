//! Subset of the container inspect document.
//!
//! Unknown fields are ignored so newer daemons stay compatible.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: Option<ContainerConfig>,
    #[serde(default)]
    pub state: Option<ContainerState>,
}

impl ContainerInspect {
    /// Whether the container runs with a pseudo-terminal. Missing config
    /// means no TTY.
    pub fn tty(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.tty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    #[serde(default)]
    pub tty: bool,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub open_stdin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub exit_code: i64,
    #[serde(default)]
    pub started_at: String,
}
