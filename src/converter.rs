//! Invocation of the external binary-save to JSON converter.

use crate::error::ConvertError;
use crate::save_data::SaveTree;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Turns a save file into a parse tree.
///
/// The tracker treats every error as recoverable.
pub trait SaveConverter: Send + Sync {
    fn convert(&self, save_path: &Path) -> impl Future<Output = Result<SaveTree, ConvertError>> + Send;
}

/// `uesave to-json --input <save> --output <json>`
#[derive(Debug, Clone)]
pub struct UesaveConverter {
    tool_path: PathBuf,
}

impl UesaveConverter {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Whether the tool binary exists; checked at startup for diagnostics only
    pub fn is_available(&self) -> bool {
        self.tool_path.is_file()
    }
}

impl SaveConverter for UesaveConverter {
    async fn convert(&self, save_path: &Path) -> Result<SaveTree, ConvertError> {
        if !self.is_available() {
            return Err(ConvertError::ToolMissing {
                path: self.tool_path.clone(),
            });
        }

        // removed on drop, including the error paths
        let output = tempfile::Builder::new()
            .prefix("save_")
            .suffix(".json")
            .tempfile()
            .map_err(ConvertError::TempFile)?;
        let output_path = output.path().to_path_buf();

        tracing::debug!(
            tool = %self.tool_path.display(),
            save = %save_path.display(),
            "Running save converter"
        );

        let result = Command::new(&self.tool_path)
            .arg("to-json")
            .arg("--input")
            .arg(save_path)
            .arg("--output")
            .arg(&output_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ConvertError::Spawn {
                path: self.tool_path.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ConvertError::ToolFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let json = tokio::fs::read_to_string(&output_path)
            .await
            .map_err(|source| ConvertError::ReadOutput {
                path: output_path.clone(),
                source,
            })?;

        Ok(SaveTree::from_json(&json)?)
    }
}
