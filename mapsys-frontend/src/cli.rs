use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use mapsys_core::geometry::{Bounds2D, Point2};
use mapsys_engine::Content;
use mapsys_engine::errors::Anomaly;
use serde::Serialize;

use crate::companion::Companion;
use crate::errors::FrontendError;
use crate::loader::LoadedProject;

fn fmt_point(point: Point2) -> String {
    format!("({:.3}, {:.3})", point.x(), point.y())
}

fn write_extent<W: Write>(out: &mut W, bounds: &Bounds2D) -> io::Result<()> {
    writeln!(
        out,
        "  范围 {} - {}（宽 {:.3}，高 {:.3}）",
        fmt_point(bounds.min()),
        fmt_point(bounds.max()),
        bounds.width(),
        bounds.height()
    )
}

/// 打印项目概览，每一节最多列出 `limit` 行。
pub fn write_summary<W: Write>(
    out: &mut W,
    project: &LoadedProject,
    limit: usize,
) -> io::Result<()> {
    let content = &project.content;
    let report = &project.report;

    writeln!(out, "MapSys 项目：{}", project.files.main_file().display())?;
    let extensions: Vec<&str> = project.files.files().map(|(ext, _)| ext).collect();
    writeln!(out, "伴随文件：{}", extensions.join(", "))?;

    let loaded: Vec<&str> = report.loaded.iter().map(|kind| kind.extension()).collect();
    writeln!(out, "已加载表：{}", join_or_dash(&loaded))?;
    let missing: Vec<&str> = report.missing.iter().map(|kind| kind.extension()).collect();
    writeln!(out, "缺失表：{}", join_or_dash(&missing))?;
    for err in &report.errors {
        writeln!(out, "解码失败：{err}")?;
    }

    writeln!(out, "点：{} 个", content.points().len())?;
    if let Some(bounds) = content.extents() {
        write_extent(out, &bounds)?;
    }
    for point in content.points().iter().take(limit) {
        writeln!(
            out,
            "  - #{} 点号={} 类型={} 图层={} 位置={} 高程={:.3} 连接={}",
            point.id,
            point.number,
            point.kind,
            point.layer,
            fmt_point(point.position()),
            point.elevation,
            point.connections
        )?;
    }

    let mut anomalies: Vec<Anomaly> = report.anomalies.clone();
    let mut degenerate = 0usize;
    let mut polyline_lines = Vec::new();
    for (record, layer, resolved) in content.resolved_polylines() {
        if resolved.is_degenerate() {
            degenerate += 1;
        }
        if polyline_lines.len() < limit {
            let coords: Vec<String> = resolved.vertices.iter().copied().map(fmt_point).collect();
            polyline_lines.push(format!(
                "  - #{} 线号={} 图层={} 顶点数={} 顶点={}",
                record.line_id,
                record.line_number,
                content.layer_name(layer),
                resolved.vertices.len(),
                coords.join(" -> ")
            ));
        }
        anomalies.extend(resolved.anomalies);
    }
    writeln!(
        out,
        "多段线：{} 条（退化 {} 条）",
        content.polylines().len(),
        degenerate
    )?;
    for line in &polyline_lines {
        writeln!(out, "{line}")?;
    }

    let labels: Vec<_> = content.labels().collect();
    writeln!(
        out,
        "文字：{} 条元数据，{} 个字符串，{} 条可解析",
        content.text_meta().len(),
        content.texts().len(),
        labels.len()
    )?;
    for label in labels.iter().take(limit) {
        writeln!(
            out,
            "  - #{} 图层={} 高度={:.2} 旋转={:.1} 位置={} \"{}\"",
            label.meta.text_id,
            label.meta.layer,
            label.meta.height,
            label.meta.rotation,
            fmt_point(label.meta.position()),
            label.text
        )?;
    }

    match content.project() {
        Some(file) => {
            let header = &file.header;
            writeln!(out, "项目文件：{}", header.file_path)?;
            writeln!(
                out,
                "  比例={} 假东={:.1} 假北={:.1}",
                header.scale, header.false_east, header.false_north
            )?;
            write_extent(out, &file.bounds())?;
            if !file.database_path.is_empty() {
                writeln!(out, "  数据库：{}", file.database_path)?;
            }
            for (index, layer) in file.titled_layers().take(limit) {
                writeln!(
                    out,
                    "  - 图层 {index}: {} 颜色={} 线宽={}",
                    layer.title, layer.color, layer.weight
                )?;
            }
        }
        None => writeln!(out, "项目文件：无")?,
    }

    for (extension, companion) in &project.sidecars {
        let detail = match companion {
            Companion::Raw { size, .. } => format!("{size} 字节"),
            Companion::TextLines { lines } => format!("{} 行", lines.len()),
            Companion::KeyValue { entries } => format!("{} 个键", entries.len()),
            Companion::Csv { rows } => format!("{} 行 CSV", rows.len()),
            Companion::Skipped => "未读取".to_string(),
        };
        writeln!(out, "附属文件 {extension}：{detail}")?;
    }
    for (extension, err) in &project.sidecar_errors {
        writeln!(out, "附属文件 {extension} 读取失败：{err}")?;
    }

    writeln!(out, "结构异常：{} 个", anomalies.len())?;
    for anomaly in anomalies.iter().take(limit) {
        writeln!(out, "  - {anomaly}")?;
    }
    Ok(())
}

fn join_or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

pub fn print_summary(project: &LoadedProject, limit: usize) -> Result<(), FrontendError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, project, limit)?;
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonDump<'a> {
    main_file: &'a Path,
    stem: &'a str,
    loaded: Vec<&'static str>,
    missing: Vec<&'static str>,
    errors: Vec<String>,
    anomalies: &'a [Anomaly],
    content: &'a Content,
    sidecars: &'a BTreeMap<String, Companion>,
}

/// 将完整解码结果序列化为 JSON，供表格类导出工具使用。
pub fn write_json<W: Write>(out: W, project: &LoadedProject) -> Result<(), FrontendError> {
    let report = &project.report;
    let dump = JsonDump {
        main_file: project.files.main_file(),
        stem: project.files.stem(),
        loaded: report.loaded.iter().map(|kind| kind.extension()).collect(),
        missing: report.missing.iter().map(|kind| kind.extension()).collect(),
        errors: report.errors.iter().map(ToString::to_string).collect(),
        anomalies: &report.anomalies,
        content: &project.content,
        sidecars: &project.sidecars,
    };
    serde_json::to_writer_pretty(out, &dump)?;
    Ok(())
}

pub fn print_json(project: &LoadedProject) -> Result<(), FrontendError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json(&mut out, project)?;
    writeln!(out)?;
    Ok(())
}
