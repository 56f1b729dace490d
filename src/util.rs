use crate::grid::CellPos;

/// Parse `"x,y"` (whitespace tolerated) into a cell.
pub fn parse_cell(input: &str) -> Option<CellPos> {
    let (x, y) = input.split_once(',')?;
    let x = x.trim().parse::<i32>().ok()?;
    let y = y.trim().parse::<i32>().ok()?;
    Some(CellPos::new(x, y))
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive.
pub fn parse_flag(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
