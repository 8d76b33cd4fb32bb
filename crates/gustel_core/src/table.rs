//! Monospace tables for chat replies.

/// Render `rows` under `header` as a code block with padded columns.
///
/// Returns an empty string when there are no rows. Rows shorter than the
/// header are padded with empty cells, extra cells are ignored.
pub fn format_table<H, R, C>(header: &[H], rows: &[R]) -> String
where
    H: AsRef<str>,
    R: AsRef<[C]>,
    C: ToString,
{
    if rows.is_empty() {
        return String::new();
    }

    let mut lines: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    lines.push(header.iter().map(|h| h.as_ref().to_string()).collect());
    for row in rows {
        let row = row.as_ref();
        lines.push(
            (0..header.len())
                .map(|i| row.get(i).map(|c| c.to_string()).unwrap_or_default())
                .collect(),
        );
    }

    let mut widths = vec![0usize; header.len()];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::from("```\n");
    for line in &lines {
        let rendered: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(rendered.join(" ").trim_end());
        out.push('\n');
    }
    out.push_str("```");
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pads_columns() {
        let table = format_table(
            &["Spieler", "Welle"],
            &[vec!["anna", "20"], vec!["bartholomew", "7"]],
        );
        assert_eq!(
            table,
            "```\nSpieler     Welle\nanna        20\nbartholomew 7\n```"
        );
    }

    #[test]
    fn empty_rows_render_nothing() {
        let rows: Vec<Vec<String>> = Vec::new();
        assert_eq!(format_table(&["a"], &rows), "");
    }
}
