pub mod cli;
pub mod companion;
pub mod discovery;
pub mod errors;
pub mod loader;

use std::path::Path;

use errors::FrontendError;
use mapsys_config::AppConfig;
use tracing::info;

/// 输出形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// 文本概览，每节最多 `limit` 行。
    Summary { limit: usize },
    Json,
}

/// 加载 `input` 指向的项目并按 `mode` 输出到标准输出。
pub fn run_cli(input: &Path, config: &AppConfig, mode: OutputMode) -> Result<(), FrontendError> {
    info!(input = %input.display(), ?mode, "启动 CLI 前端");
    let options = loader::load_options_from_config(config);
    let project = loader::load_project(input, &options)?;
    match mode {
        OutputMode::Summary { limit } => cli::print_summary(&project, limit),
        OutputMode::Json => cli::print_json(&project),
    }
}
