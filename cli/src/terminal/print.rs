use chrono::{DateTime, Local, Utc};
use colored::*;
use lanwake_common::device::{DeviceSnapshot, DeviceStatus};
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 96;

/// Events on this target are printed verbatim, without a level prefix.
pub const PRINT_TARGET: &str = "lanwake::print";

const COLUMNS: [&str; 7] = ["#", "Name", "Address", "MAC Address", "Status", "Last checked", "Action"];

#[macro_export]
macro_rules! mprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

pub fn banner(q_level: u8) {
    if q_level > 0 {
        return;
    }

    let text_content: String = format!("⟦ LANWAKE v{} ⟧ ", env!("CARGO_PKG_VERSION"));
    let text_width: usize = UnicodeWidthStr::width(text_content.as_str());
    let text: ColoredString = text_content.bright_green().bold();
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH.saturating_sub(text_width) / 2).bright_black();
    print(&format!("{}{}{}", sep, text, sep));
}

pub fn header(msg: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }

    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();

    print(&format!("{}", line));
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).bright_black();
    print(&format!("{}", sep));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix: ColoredString = ">".color(colors::SEPARATOR);
    let message: String = format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT));
    print(&message);
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{}{}{}", space, msg, space));
}

pub fn status_label(status: DeviceStatus) -> ColoredString {
    match status {
        DeviceStatus::Unknown => "Detecting...".color(colors::UNKNOWN),
        DeviceStatus::Online => "Online".color(colors::ONLINE).bold(),
        DeviceStatus::Offline => "Offline".color(colors::OFFLINE),
        DeviceStatus::Error => "Error".color(colors::ERROR).bold(),
    }
}

fn action_label(row: &DeviceSnapshot) -> ColoredString {
    match (row.status, row.can_wake()) {
        (DeviceStatus::Unknown, _) => "Waiting".color(colors::SEPARATOR),
        (_, true) => "Wake".color(colors::ACCENT).bold(),
        (_, false) => "-".color(colors::SEPARATOR),
    }
}

pub fn format_checked(last_checked: Option<DateTime<Utc>>) -> String {
    match last_checked {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::from("never"),
    }
}

/// One table row as (plain text, coloured text) cells. Widths are measured on
/// the plain text so escape codes do not skew the alignment.
fn row_cells(row: &DeviceSnapshot) -> Vec<(String, ColoredString)> {
    let plain = |s: String, color: Color| (s.clone(), s.color(color));
    let status: ColoredString = status_label(row.status);
    let action: ColoredString = action_label(row);
    vec![
        plain(row.id.0.to_string(), colors::ACCENT),
        plain(row.device.name.clone(), colors::PRIMARY),
        plain(row.device.address.clone(), colors::TEXT_DEFAULT),
        plain(row.device.hardware_address.to_string(), colors::MAC_ADDR),
        (status.input.clone(), status),
        plain(format_checked(row.last_checked), colors::SEPARATOR),
        (action.input.clone(), action),
    ]
}

pub fn device_table(rows: &[DeviceSnapshot]) {
    if rows.is_empty() {
        no_devices();
        return;
    }

    let cells: Vec<Vec<(String, ColoredString)>> = rows.iter().map(row_cells).collect();
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| UnicodeWidthStr::width(*c)).collect();
    for row in &cells {
        for (idx, (text, _)) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(text.as_str()));
        }
    }

    let heading: String = COLUMNS
        .iter()
        .zip(&widths)
        .map(|(name, width)| format!("{:<width$}", name, width = *width).bold().to_string())
        .collect::<Vec<_>>()
        .join("  ");
    print(&heading);
    let rule: usize = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    print(&format!("{}", "─".repeat(rule).color(colors::SEPARATOR)));

    for row in cells {
        let line: String = row
            .iter()
            .zip(&widths)
            .map(|((text, colored), width)| {
                let pad: usize = width.saturating_sub(UnicodeWidthStr::width(text.as_str()));
                format!("{}{}", colored, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("  ");
        print(line.trim_end());
    }
}

pub fn no_devices() {
    print_status("No devices configured. Add them to the configuration file's \"devices\" list.");
}

pub fn end_of_program() {
    print(&format!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR)));
}
