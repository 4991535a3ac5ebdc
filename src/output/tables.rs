use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cells<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<Cell> {
    labels
        .into_iter()
        .map(|label| Cell::new(label).fg(TableColor::Cyan))
        .collect()
}

/// Right-aligned numeric cell; `N/A` is greyed out.
pub fn metric_cell(text: &str) -> Cell {
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if text == "N/A" {
        cell.fg(TableColor::DarkGrey)
    } else {
        cell
    }
}

/// Share of open issues that went stale: green below 25%, yellow below
/// 50%, red otherwise.
pub fn stale_share_cell(text: &str) -> Cell {
    let color = match text.strip_suffix('%').and_then(|n| n.parse::<i64>().ok()) {
        Some(share) if share < 25 => TableColor::Green,
        Some(share) if share < 50 => TableColor::Yellow,
        Some(_) => TableColor::Red,
        None => TableColor::DarkGrey,
    };
    Cell::new(text)
        .set_alignment(CellAlignment::Right)
        .fg(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_share_is_color_coded() {
        assert_eq!(stale_share_cell("10%").content(), "10%");
        assert_eq!(header_cells(["a", "b"]).len(), 2);
        assert_eq!(metric_cell("N/A").content(), "N/A");
    }
}
