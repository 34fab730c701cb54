pub mod analyze;
pub mod init;
pub mod play;
pub mod summary;
pub mod validate;

use anyhow::Result;
use verbgravity_core::model::GradingMode;

/// Parse a `--mode` argument.
pub(crate) fn parse_mode(mode: &str) -> Result<GradingMode> {
    mode.parse()
        .map_err(|e: String| anyhow::anyhow!("--mode: {e}"))
}
