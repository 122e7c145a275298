// Quote-aware splitting of the published sheet exports.
//
// The sheets are plain comma-separated text. Names and branch labels may
// contain commas inside double quotes, so a cell boundary is only a comma
// followed by an even number of `"` on the rest of the line. Every `"`
// toggles the quote state; doubled quotes therefore cancel out and stay in
// the cell text. On a line with an odd number of quotes the scan starts
// inside quotes, so a stray quote joins cells to its left.

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Split a whole feed into rows of cells. The first line is the header and
/// is dropped; blank lines are skipped.
pub fn parse_feed(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(split_row)
        .collect()
}

/// Split one line into cells.
pub fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = line.chars().filter(|&c| c == QUOTE).count() % 2 == 1;

    for ch in line.chars() {
        match ch {
            QUOTE => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            DELIMITER if !in_quotes => {
                cells.push(clean_cell(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    cells.push(clean_cell(&current));
    cells
}

/// Drop one wrapping quote on each side, then surrounding whitespace.
fn clean_cell(raw: &str) -> String {
    let s = raw.strip_prefix(QUOTE).unwrap_or(raw);
    let s = s.strip_suffix(QUOTE).unwrap_or(s);
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_delimiter_stays_in_one_cell() {
        let cells = split_row(r#",15/03/2024,"Kochi, Central","RAJ, RAHUL",VF01,,Visit"#);
        assert_eq!(
            cells,
            vec!["", "15/03/2024", "Kochi, Central", "RAJ, RAHUL", "VF01", "", "Visit"]
        );
    }

    #[test]
    fn cells_are_trimmed_after_unquoting() {
        assert_eq!(split_row(r#"" Sandhyamol T ", vf01 ,x"#), vec!["Sandhyamol T", "vf01", "x"]);
    }

    #[test]
    fn escaped_quotes_are_kept_inside_cell() {
        let cells = split_row(r#""He said ""hi"", twice",next"#);
        assert_eq!(cells, vec![r#"He said ""hi"", twice"#, "next"]);
    }

    #[test]
    fn empty_and_trailing_cells_are_preserved() {
        assert_eq!(split_row("a,,b,"), vec!["a", "", "b", ""]);
        assert_eq!(split_row(""), vec![""]);
    }

    #[test]
    fn stray_quote_joins_cells_to_its_left() {
        assert_eq!(split_row(r#"a,"b,c"#), vec![r#"a,"b"#, "c"]);
        assert_eq!(split_row(r#"x,y,"z"#), vec![r#"x,y,"z"#]);
        assert_eq!(split_row(r#"a,b",c,d"#), vec![r#"a,b"#, "c", "d"]);
    }

    #[test]
    fn feed_drops_header_and_blank_lines() {
        let text = "Timestamp,Date,Branch\r\n,15/03/2024,Kochi\r\n\r\n,16/03/2024,\"Aluva\"\n";
        let rows = parse_feed(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["", "15/03/2024", "Kochi"]);
        assert_eq!(rows[1], vec!["", "16/03/2024", "Aluva"]);
    }

    #[test]
    fn ragged_rows_are_returned_as_is() {
        let rows = parse_feed("h1,h2,h3\na\na,b,c,d\n");
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 4);
    }

    #[test]
    fn header_only_feed_is_empty() {
        assert!(parse_feed("Date,Branch").is_empty());
        assert!(parse_feed("").is_empty());
    }
}
