use chrono::{DateTime, Local, Utc};
use colored::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::i18n::I18n;
use crate::language::flag_for;
use crate::storage::HistoryRecord;
use crate::translator::{ContentExpansion, TranslationResult};

const ELLIPSIS: &str = "...";

/// Single-line preview of `text` that fits in `width` terminal columns.
pub fn truncate_preview(text: &str, width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if UnicodeWidthStr::width(flat.as_str()) <= width {
        return flat;
    }

    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut preview = String::new();
    for c in flat.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        preview.push(c);
    }
    format!("{}{}", preview.trim_end(), ELLIPSIS)
}

pub fn format_relative_time(timestamp: &DateTime<Utc>, now: &DateTime<Utc>, i18n: &I18n) -> String {
    let elapsed = now.signed_duration_since(*timestamp);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        i18n.t("time_just_now")
    } else if minutes < 60 {
        i18n.t_format("time_minutes_ago", &[&minutes.to_string()])
    } else if hours < 24 {
        i18n.t_format("time_hours_ago", &[&hours.to_string()])
    } else if days < 7 {
        i18n.t_format("time_days_ago", &[&days.to_string()])
    } else {
        timestamp.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}

fn language_tag(source: &str, target: &str) -> String {
    format!("{} {} → {} {}", flag_for(source), source, flag_for(target), target)
}

/// One history row: flags, relative time, id and both previews.
pub fn format_record_line(record: &HistoryRecord, now: &DateTime<Utc>, width: usize, i18n: &I18n) -> String {
    format!(
        "{}  {}  {}\n  {}\n  {}",
        language_tag(&record.source_language, &record.target_language).cyan(),
        format_relative_time(&record.timestamp, now, i18n).dimmed(),
        record.id.dimmed(),
        truncate_preview(&record.original_text, width),
        truncate_preview(&record.translated_text, width).green(),
    )
}

pub fn format_record_detail(record: &HistoryRecord, i18n: &I18n) -> String {
    let local = record.timestamp.with_timezone(&Local);
    format!(
        "{}: {}\n{}: {} {}\n{}: {} {}\n{}: {}\n\n{}\n{}\n\n{}\n{}",
        i18n.t("label_id").yellow(),
        record.id,
        i18n.t("label_source").yellow(),
        flag_for(&record.source_language),
        record.source_language,
        i18n.t("label_target").yellow(),
        flag_for(&record.target_language),
        record.target_language,
        i18n.t("label_time").yellow(),
        local.format("%Y-%m-%d %H:%M:%S"),
        i18n.t("label_original").cyan().bold(),
        record.original_text,
        i18n.t("label_translation").green().bold(),
        record.translated_text,
    )
}

pub fn format_translation(result: &TranslationResult, i18n: &I18n) -> String {
    let done = i18n.t_format(
        "translation_complete",
        &[
            &format!("{} {}", flag_for(&result.detected_language), result.detected_language),
            &format!("{} {}", flag_for(&result.target_language), result.target_language),
        ],
    );
    format!("{}\n{}", done.green().bold(), result.translated_text)
}

pub fn format_expansion(expansion: &ContentExpansion, i18n: &I18n) -> String {
    format!(
        "{} {}\n{}\n\n{} {}\n{}\n\n📌 {}\n{}",
        flag_for("Vietnamese"),
        i18n.t("expanded_vietnamese").cyan().bold(),
        expansion.vietnamese_content,
        flag_for("English"),
        i18n.t("expanded_english").cyan().bold(),
        expansion.english_content,
        i18n.t("expanded_original").dimmed(),
        expansion.original_text.dimmed(),
    )
}
