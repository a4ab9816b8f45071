use crate::domain::LocationCollection;

const COLUMNS: [&str; 3] = ["Latitude", "Longitude", "Address"];

/// Row/column view of the session's locations, in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct LocationTable {
    rows: Vec<[String; 3]>,
}

impl LocationTable {
    pub fn from_locations(locations: &LocationCollection) -> Self {
        let rows = locations
            .all()
            .iter()
            .map(|loc| {
                [
                    loc.latitude().to_string(),
                    loc.longitude().to_string(),
                    loc.label().to_string(),
                ]
            })
            .collect();
        Self { rows }
    }

    pub fn columns(&self) -> [&'static str; 3] {
        COLUMNS
    }

    pub fn rows(&self) -> &[[String; 3]] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain-text table with left-aligned columns
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "No locations yet".to_string();
        }

        let columns = self.columns();
        let mut widths = columns.map(str::len);
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header = columns.map(str::to_string);
        let rule = widths.map(|w| "-".repeat(w));

        std::iter::once(&header)
            .chain(std::iter::once(&rule))
            .chain(self.rows.iter())
            .map(|row| format_row(row, &widths))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_row(row: &[String; 3], widths: &[usize; 3]) -> String {
    // Last column is not padded so lines carry no trailing spaces
    format!(
        "{:<w0$}  {:<w1$}  {}",
        row[0],
        row[1],
        row[2],
        w0 = widths[0],
        w1 = widths[1],
    )
}
