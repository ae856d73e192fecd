use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mapsys_config::{AppConfig, ConfigError};
use mapsys_frontend::OutputMode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 读取 MapSys 项目（`.pr5` 及其伴随表）并输出解码结果。
#[derive(Debug, Parser)]
#[command(name = "mapsys", version, about)]
struct Cli {
    /// 配置文件路径，缺省时按 `MAPSYS_CONFIG` 或 `./config/default.toml` 查找
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// 输出 debug 级日志
    #[arg(long, global = true)]
    debug: bool,
    /// 输出 trace 级日志
    #[arg(long, global = true)]
    trace: bool,
    /// 将日志写入文件而不是标准错误
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 打印项目概览
    Summary {
        /// 项目中的任意文件，或只含一个 `.pr5` 的目录
        path: PathBuf,
        /// 每一节最多列出的行数，覆盖配置中的 `output.summary_limit`
        #[arg(long)]
        limit: Option<usize>,
    },
    /// 以 JSON 输出全部解码记录
    Json { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.clone());
    init_logging(&config, &cli)?;
    info!("启动 MapSys 解码工具");

    let (path, mode) = match &cli.command {
        Command::Summary { path, limit } => (
            path,
            OutputMode::Summary {
                limit: limit.unwrap_or(config.output.summary_limit),
            },
        ),
        Command::Json { path } => (path, OutputMode::Json),
    };
    mapsys_frontend::run_cli(path, &config, mode)
        .with_context(|| format!("处理 {} 失败", path.display()))?;
    Ok(())
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn log_level(config: &AppConfig, cli: &Cli) -> String {
    if cli.trace {
        "trace".to_string()
    } else if cli.debug {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("无法创建日志文件 {}", path.display()))
}

// 标准输出留给解码结果，日志一律写到标准错误或日志文件。
fn init_logging(config: &AppConfig, cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_new(log_level(config, cli)).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    let result = match &cli.log_file {
        Some(path) => subscriber
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .try_init(),
        None => subscriber.with_writer(std::io::stderr).try_init(),
    };
    if result.is_err() {
        // 已初始化，忽略
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_flags_override_config() {
        let config = AppConfig::default();
        let cli = Cli::parse_from(["mapsys", "summary", "x.pr5", "--debug"]);
        assert_eq!(log_level(&config, &cli), "debug");
        let cli = Cli::parse_from(["mapsys", "--trace", "--debug", "json", "x.pr5"]);
        assert_eq!(log_level(&config, &cli), "trace");
        let cli = Cli::parse_from(["mapsys", "json", "x.pr5"]);
        assert_eq!(log_level(&config, &cli), "info");
    }

    #[test]
    fn summary_limit_is_optional() {
        let cli = Cli::parse_from(["mapsys", "summary", "dir", "--limit", "3"]);
        match cli.command {
            Command::Summary { path, limit } => {
                assert_eq!(path, PathBuf::from("dir"));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
