//! # 人像风格化服务 — 命令行客户端
//!
//! 用法：`stylize-client <输入图片> [输出路径]`
//!
//! 与图形界面走同一个 `SessionController`：选图 → 发起处理 → 轮询结果 → 保存。
//! 输出路径缺省为输入同目录下的 `<文件名>_stylized.png`。
//! 前置条件问题（未选图、类型不支持等）只打印提示，退出码为 2；其他错误退出码为 1。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use portrait_stylizer::client::SessionController;
use portrait_stylizer::config::StylizerConfig;
use portrait_stylizer::error::AppError;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(std::env::args().skip(1).collect()) {
        Ok(output) => {
            println!("图片已成功保存到: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => ExitCode::from(report(&err)),
    }
}

const EXIT_FAILURE: u8 = 1;
const EXIT_NOTICE: u8 = 2;

/// 前置条件问题以提示呈现，其余按错误呈现；返回进程退出码。
fn report(err: &AppError) -> u8 {
    match err {
        AppError::Client(client) if client.is_notice() => {
            eprintln!("提示：{client}");
            EXIT_NOTICE
        }
        other => {
            eprintln!("错误：{other}");
            EXIT_FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<PathBuf, AppError> {
    let (input, output) = parse_args(&args)?;
    let config = StylizerConfig::load()?;

    let mut session = SessionController::connect(&config.client)?;
    session.select(&input)?;
    session.request_processing()?;

    eprint!("正在处理图片，请稍候");
    let outcome = loop {
        if let Some(outcome) = session.poll() {
            break outcome;
        }
        eprint!(".");
        let _ = std::io::stderr().flush();
        std::thread::sleep(POLL_INTERVAL);
    };
    eprintln!();

    if let Err(failure) = outcome {
        return Err(AppError::Processing(failure.message));
    }

    session.save(&output)?;
    Ok(output)
}

fn parse_args(args: &[String]) -> Result<(PathBuf, PathBuf), AppError> {
    match args {
        [input] => {
            let input = PathBuf::from(input);
            let output = default_output_path(&input);
            Ok((input, output))
        }
        [input, output] => Ok((PathBuf::from(input), PathBuf::from(output))),
        _ => Err(AppError::Usage("stylize-client <输入图片> [输出路径]".to_string())),
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_stylized.png"))
}
