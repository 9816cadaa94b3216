use std::fs;
use std::path::Path;

use tracing::info;

use crate::grid::PagedEditableGrid;
use crate::record::display_value;

/// Write `content` to `filename`, creating parent directories as needed
pub fn write_string_to_file(filename: &str, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(filename).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating path: {:?}", parent);
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(filename, content)?;
    Ok(())
}

/// Tab separated rendering of the current page, followed by the page info line
pub fn render_page(grid: &PagedEditableGrid) -> String {
    let mut out = String::new();

    let mut header = Vec::new();
    if grid.show_row_number_column() {
        header.push("#".to_string());
    }
    header.extend(grid.columns().iter().map(|c| c.label.clone()));
    out.push_str(&header.join("\t"));
    out.push('\n');

    let offset = (grid.page_number() - 1) * grid.config().page_size;
    for (idx, row) in grid.page_records().iter().enumerate() {
        let mut cells = Vec::new();
        if grid.show_row_number_column() {
            cells.push((offset + idx + 1).to_string());
        }
        cells.extend(
            grid.columns()
                .iter()
                .map(|c| row.get(&c.field_name).map(display_value).unwrap_or_default()),
        );
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    out.push_str(&grid.page_info());
    out
}
