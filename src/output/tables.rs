use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn status_cell(status: &str) -> Cell {
    let color = match status {
        "success" => TableColor::Green,
        "failure" => TableColor::Red,
        "cancelled" => TableColor::Yellow,
        "in_progress" => TableColor::Cyan,
        _ => TableColor::Grey,
    };
    Cell::new(status).fg(color)
}

pub fn color_coded_duration_cell(seconds: Option<f64>) -> Cell {
    let Some(seconds) = seconds else {
        return Cell::new("N/A").fg(TableColor::DarkGrey);
    };

    let minutes = seconds / 60.0;
    let text = format_duration(seconds);
    if minutes <= 10.0 {
        Cell::new(text).fg(TableColor::Green)
    } else if minutes <= 15.0 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}

/// Formats seconds as `42.0s`, `3m 05s` or `2h 07m 12s`.
#[allow(clippy::cast_possible_truncation)]
pub fn format_duration(seconds: f64) -> String {
    let tenths = (seconds * 10.0).round() / 10.0;
    if tenths < 60.0 {
        return format!("{tenths:.1}s");
    }

    let total = seconds.round() as i64;
    let (hours, rest) = (total / 3600, total % 3600);
    let (minutes, secs) = (rest / 60, rest % 60);

    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else {
        format!("{minutes}m {secs:02}s")
    }
}
