//! Output formatting and persistence for visit records and statistics.
//!
//! Supports plain-text tables, JSON serialization, and CSV export.

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::records::VisitRecord;
use crate::stats::{RankedRestaurant, Summary};

/// Logs a summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &Summary) {
    debug!("{:#?}", summary);
}

/// Serializes a summary as pretty-printed JSON.
pub fn summary_json(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Renders records as one line each: id, name, type, date, score, photo marker, comment.
pub fn render_records(records: &[VisitRecord]) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>4}  {:<20} {:<8} {:<10} {:>5}  {:<2} 评价",
        "ID", "名称", "类型", "日期", "评分", "图"
    )?;
    for r in records {
        writeln!(
            out,
            "{:>4}  {:<20} {:<8} {:<10} {:>5.1}  {:<2} {}",
            r.id,
            r.name,
            r.category,
            r.date,
            r.score,
            if r.has_image() { "✓" } else { "" },
            r.comment
        )?;
    }
    Ok(out)
}

/// Renders the full detail of the record with `id`, or a not-found line.
pub fn render_lookup(id: u64, record: Option<&VisitRecord>) -> Result<String> {
    let mut out = String::new();
    let Some(record) = record else {
        writeln!(out, "未找到记录 (ID: {id})")?;
        return Ok(out);
    };

    writeln!(out, "ID:   {}", record.id)?;
    writeln!(out, "名称: {}", record.name)?;
    writeln!(out, "类型: {}", record.category)?;
    writeln!(out, "日期: {}", record.date)?;
    writeln!(out, "评分: {:.1}", record.score)?;
    writeln!(out, "评价: {}", record.comment)?;
    writeln!(out, "图片: {}", record.image_path.as_deref().unwrap_or("无"))?;
    Ok(out)
}

/// Renders a ranking table: rank, name, type, average score.
pub fn render_ranking(rows: &[RankedRestaurant]) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>4}  {:<20} {:<8} {:>8}",
        "排名", "餐厅名称", "类型", "平均评分"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:>4}  {:<20} {:<8} {:>8.1}",
            row.rank, row.name, row.category, row.average
        )?;
    }
    Ok(out)
}

/// Full statistics report in the layout of the summary screen.
pub fn render_summary(summary: &Summary) -> Result<String> {
    let mut out = String::new();

    if let Some(range) = &summary.date_range {
        writeln!(out, "日期范围: {} ~ {}", range.start, range.end)?;
    }
    writeln!(out, "总记录数: {}", summary.total_records)?;
    writeln!(out, "平均评分: {:.1}", summary.average_score)?;
    writeln!(out, "最常打卡的类型: {}", summary.most_common_type)?;

    writeln!(out, "\n== 餐厅评分 ==")?;
    out.push_str(&render_ranking(&summary.ranking)?);

    writeln!(out, "\n== 类型分布 ==")?;
    writeln!(out, "{:<8} {:>6} {:>8} {:>8}", "类型", "数量", "占比", "平均评分")?;
    for share in &summary.types {
        writeln!(
            out,
            "{:<8} {:>6} {:>7.1}% {:>8.1}",
            share.category, share.count, share.percentage, share.average
        )?;
    }

    writeln!(out, "\n== 评分最高的餐厅 ==")?;
    out.push_str(&render_ranking(&summary.top)?);

    Ok(out)
}

/// Writes `records` to a CSV file at `path`, gzip-compressed when `gzip` is set.
pub fn export_csv(path: &Path, records: &[VisitRecord], gzip: bool) -> Result<()> {
    let file = File::create(path)?;
    debug!(path = %path.display(), gzip, count = records.len(), "Exporting CSV");

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_rows(&mut encoder, records)?;
        encoder.finish()?.flush()?;
    } else {
        write_rows(file, records)?;
    }

    info!(path = %path.display(), count = records.len(), "Export complete");
    Ok(())
}

fn write_rows<W: Write>(sink: W, records: &[VisitRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(sink);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
