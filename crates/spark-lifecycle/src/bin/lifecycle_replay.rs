//! 生命周期回放工具：按脚本逐行驱动生命周期与数据流，输出绑定后实际送达的元素与终止结果。
//!
//! # 使用方法
//! ```bash
//! cargo run -p spark-lifecycle --features replay --bin lifecycle_replay -- script.txt \
//!     --binding fragment --output report.json
//! ```
//! - `script.txt`：逐行脚本，支持以下指令：
//!   - `lifecycle <EVENT>`：生命周期产出事件（名称大小写不敏感）；
//!   - `data <text>`：数据流产出一行文本；
//!   - `bind`：在此处建立绑定，之前的数据在通道中排队；脚本中没有 `bind` 时在开头绑定；
//!   - `complete`：生命周期流完成；
//!   - 以 `#` 开头的行与空行被忽略。
//! - `--binding`：`activity`（默认）、`fragment` 或 `until:<EVENT>`；
//! - `--host`：`until:` 形式下事件所属宿主，`activity`（默认）或 `fragment`；
//! - `--output`：可选，报告写入目标文件，否则写到标准输出。
//!
//! # 报告格式
//! `{ "emitted": [...], "outcome": "completed" | "running" | "error", "error": null | "..." }`
//!
//! 日志写到标准错误，级别由 `RUST_LOG` 控制，默认 `info`。

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use futures::{FutureExt, StreamExt, channel::mpsc};
use serde_json::json;
use spark_lifecycle::{
    ACTIVITY_LIFECYCLE, ActivityEvent, FRAGMENT_LIFECYCLE, FragmentEvent, HostKind,
    LifecycleError, LifecycleEvent, LifecycleTransformer, TerminationPolicy,
};
use spark_streams::LifecycleSubject;
use tracing_subscriber::EnvFilter;

fn main() {
    install_logging();
    if let Err(error) = run() {
        eprintln!("生命周期回放失败: {error}");
        std::process::exit(1);
    }
}

fn install_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1);

    let script_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| usage("缺少脚本路径"))?;

    let mut binding = String::from("activity");
    let mut host = HostKind::Activity;
    let mut output_path = None;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--binding" => {
                binding = args
                    .next()
                    .ok_or_else(|| usage("--binding 之后必须提供绑定方式"))?;
            }
            "--host" => {
                let value = args
                    .next()
                    .ok_or_else(|| usage("--host 之后必须提供宿主类别"))?;
                host = parse_host(&value)?;
            }
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| usage("--output 之后必须提供文件路径"))?;
                output_path = Some(PathBuf::from(value));
            }
            unknown => return Err(usage(&format!("未知参数: {unknown}"))),
        }
    }

    let script = fs::read_to_string(&script_path)
        .map_err(|error| format!("读取脚本 {} 失败: {error}", script_path.display()))?;
    let lines = parse_script(&script)?;

    let report = match binding.as_str() {
        "activity" => replay(
            &lines,
            TerminationPolicy::DynamicCorrespondence(ACTIVITY_LIFECYCLE),
        )?,
        "fragment" => replay(
            &lines,
            TerminationPolicy::DynamicCorrespondence(FRAGMENT_LIFECYCLE),
        )?,
        other => {
            let name = other
                .strip_prefix("until:")
                .ok_or_else(|| usage(&format!("未知绑定方式: {other}")))?;
            match host {
                HostKind::Activity => {
                    let event = name
                        .parse::<ActivityEvent>()
                        .map_err(|error| error.to_string())?;
                    replay(&lines, TerminationPolicy::ExplicitEvent(event))?
                }
                HostKind::Fragment => {
                    let event = name
                        .parse::<FragmentEvent>()
                        .map_err(|error| error.to_string())?;
                    replay(&lines, TerminationPolicy::ExplicitEvent(event))?
                }
            }
        }
    };

    write_report(output_path.as_ref(), &report)
        .map_err(|error| format!("写入报告失败: {error}"))
}

/// 脚本中的一条指令，`line` 为 1 起始的行号。
#[derive(Debug)]
enum Command {
    Lifecycle { line: usize, name: String },
    Data(String),
    Bind,
    Complete,
}

fn parse_script(script: &str) -> Result<Vec<Command>, String> {
    let mut commands = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let command = match keyword {
            "lifecycle" if !rest.trim().is_empty() => Command::Lifecycle {
                line: index + 1,
                name: rest.trim().to_owned(),
            },
            "data" => Command::Data(rest.trim_start().to_owned()),
            "bind" => Command::Bind,
            "complete" => Command::Complete,
            _ => return Err(format!("第 {} 行无法识别: {line}", index + 1)),
        };
        commands.push(command);
    }
    Ok(commands)
}

struct Report {
    emitted: Vec<String>,
    outcome: &'static str,
    error: Option<String>,
}

fn replay<E>(commands: &[Command], policy: TerminationPolicy<E>) -> Result<Report, String>
where
    E: LifecycleEvent + FromStr<Err = LifecycleError>,
{
    let lifecycle = LifecycleSubject::<E>::new();
    let binding = LifecycleTransformer::builder()
        .lifecycle(lifecycle.clone())
        .policy(policy)
        .build()
        .map_err(|error| error.to_string())?;
    let (data, source) = mpsc::unbounded::<String>();

    let bind_at = commands
        .iter()
        .position(|command| matches!(command, Command::Bind))
        .unwrap_or(0);
    let mut source = Some(source);
    let mut bounded = None;

    let mut report = Report {
        emitted: Vec::new(),
        outcome: "running",
        error: None,
    };

    for (index, command) in commands.iter().enumerate() {
        if index == bind_at {
            if let Some(source) = source.take() {
                tracing::info!(host = %E::HOST, policy = ?policy, "binding data stream");
                bounded = Some(binding.apply(source));
            }
        }

        match command {
            Command::Lifecycle { line, name } => {
                let event = name
                    .parse::<E>()
                    .map_err(|error| format!("第 {line} 行: {error}"))?;
                lifecycle.emit(event);
            }
            Command::Data(text) => {
                if data.unbounded_send(text.clone()).is_err() {
                    tracing::debug!(text = %text, "data stream already released, item dropped");
                }
            }
            Command::Bind => {}
            Command::Complete => lifecycle.complete(),
        }

        let Some(stream) = bounded.as_mut() else {
            continue;
        };
        if report.outcome != "running" {
            continue;
        }
        loop {
            match stream.next().now_or_never() {
                Some(Some(Ok(text))) => report.emitted.push(text),
                Some(Some(Err(error))) => {
                    tracing::warn!(%error, "bound stream terminated with error");
                    report.outcome = "error";
                    report.error = Some(error.to_string());
                    break;
                }
                Some(None) => {
                    report.outcome = "completed";
                    break;
                }
                None => break,
            }
        }
    }

    tracing::info!(
        emitted = report.emitted.len(),
        outcome = report.outcome,
        "replay finished"
    );
    Ok(report)
}

fn parse_host(value: &str) -> Result<HostKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "activity" => Ok(HostKind::Activity),
        "fragment" => Ok(HostKind::Fragment),
        other => Err(usage(&format!("未知宿主类别: {other}"))),
    }
}

fn write_report(path: Option<&PathBuf>, report: &Report) -> Result<(), io::Error> {
    let payload = json!({
        "emitted": report.emitted,
        "outcome": report.outcome,
        "error": report.error,
    });
    let mut text = serde_json::to_string_pretty(&payload)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    text.push('\n');
    match path {
        Some(path) => fs::write(path, text),
        None => io::stdout().lock().write_all(text.as_bytes()),
    }
}

fn usage(message: &str) -> String {
    format!(
        "{message}\n用法: lifecycle_replay <script> [--binding activity|fragment|until:<EVENT>] \
         [--host activity|fragment] [--output <path>]"
    )
}
