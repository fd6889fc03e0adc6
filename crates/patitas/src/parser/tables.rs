//! GFM table row machinery.
//!
//! A table is a head row, a delimiter row fixing the alignments, and any
//! number of body rows. Rows are split on unescaped pipes; outer pipes are
//! optional.

use crate::ast::Align;

/// Split a table row into trimmed cell strings.
pub fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Parse a delimiter row (`| --- | :--: |`) into alignments, or `None` when
/// the line is not a valid delimiter row.
pub fn parse_delimiter_row(line: &str) -> Option<Vec<Option<Align>>> {
    let trimmed = line.trim();
    if !trimmed.contains('-') {
        return None;
    }
    if !trimmed
        .chars()
        .all(|c| matches!(c, '-' | ':' | '|' | ' ' | '\t'))
    {
        return None;
    }

    let cells = split_row(trimmed);
    if cells.is_empty() {
        return None;
    }

    let mut alignments = Vec::with_capacity(cells.len());
    for cell in &cells {
        let cell = cell.trim();
        let dashes = cell.trim_start_matches(':').trim_end_matches(':');
        if dashes.is_empty() || dashes.chars().any(|c| c != '-') {
            return None;
        }
        let left = cell.starts_with(':');
        let right = cell.ends_with(':');
        alignments.push(match (left, right) {
            (true, true) => Some(Align::Center),
            (true, false) => Some(Align::Left),
            (false, true) => Some(Align::Right),
            (false, false) => None,
        });
    }
    Some(alignments)
}

/// Whether a head line could start a table: contains a pipe outside inline
/// code and is not blank.
pub fn looks_like_table_row(line: &str) -> bool {
    line.contains('|') && !line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_piped_row() {
        assert_eq!(split_row("| a | b |"), vec!["a", "b"]);
        assert_eq!(split_row("a | b"), vec!["a", "b"]);
    }

    #[test]
    fn escaped_pipe_stays_in_cell() {
        assert_eq!(split_row("| a \\| b | c |"), vec!["a | b", "c"]);
    }

    #[test]
    fn delimiter_row_alignments() {
        let alignments = parse_delimiter_row("| :--- | :--: | ---: | --- |").unwrap();
        assert_eq!(
            alignments,
            vec![
                Some(Align::Left),
                Some(Align::Center),
                Some(Align::Right),
                None
            ]
        );
    }

    #[test]
    fn delimiter_row_rejects_prose() {
        assert!(parse_delimiter_row("not a delimiter").is_none());
        assert!(parse_delimiter_row("| a | b |").is_none());
        assert!(parse_delimiter_row("::").is_none());
    }
}
