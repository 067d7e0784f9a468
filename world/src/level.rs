//! Text level parsing.

use wave_escape_core::{CellCoord, CellSymbol, LevelError, TILE_SIZE};

/// Rectangular grid of cell symbols loaded from a level source.
///
/// Every row holds the same number of cells; shorter source lines are padded
/// with floor when the grid is parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<CellSymbol>>,
    columns: u32,
}

impl Grid {
    /// Number of columns contained in every row.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub fn rows(&self) -> u32 {
        u32::try_from(self.rows.len()).unwrap_or(u32::MAX)
    }

    /// Total width of the grid measured in pixels.
    #[must_use]
    pub fn pixel_width(&self) -> f32 {
        self.columns as f32 * TILE_SIZE
    }

    /// Total height of the grid measured in pixels.
    #[must_use]
    pub fn pixel_height(&self) -> f32 {
        self.rows() as f32 * TILE_SIZE
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, CellSymbol)> + '_ {
        self.rows.iter().zip(0u32..).flat_map(|(row, y)| {
            row.iter()
                .zip(0u32..)
                .map(move |(symbol, x)| (CellCoord::new(x, y), *symbol))
        })
    }
}

/// Parses level lines into a [`Grid`].
///
/// Surrounding whitespace is stripped from every line, ragged lines are
/// right-padded with floor to the longest line, and unrecognised characters
/// are read as floor. A source without any non-empty line is malformed.
pub fn parse_level<I, S>(lines: I) -> Result<Grid, LevelError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut rows: Vec<Vec<CellSymbol>> = lines
        .into_iter()
        .map(|line| line.as_ref().trim().chars().map(CellSymbol::from_char).collect())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Err(LevelError::Malformed);
    }

    for row in &mut rows {
        row.resize(width, CellSymbol::Floor);
    }

    let columns = u32::try_from(width).map_err(|_| LevelError::Malformed)?;
    Ok(Grid { rows, columns })
}

/// Parses a complete level text, one grid row per line.
pub fn parse_level_str(source: &str) -> Result<Grid, LevelError> {
    parse_level(source.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn symbols(line: &str) -> Vec<CellSymbol> {
        line.chars().map(CellSymbol::from_char).collect()
    }

    fn rows_of(grid: &Grid) -> Vec<Vec<CellSymbol>> {
        let mut rows = vec![Vec::new(); grid.rows() as usize];
        for (cell, symbol) in grid.cells() {
            rows[cell.row() as usize].push(symbol);
        }
        rows
    }

    #[test]
    fn empty_source_is_malformed() {
        assert_eq!(parse_level_str(""), Err(LevelError::Malformed));
        assert_eq!(
            parse_level(Vec::<String>::new()),
            Err(LevelError::Malformed)
        );
        assert_eq!(parse_level_str("\n  \n"), Err(LevelError::Malformed));
    }

    #[test]
    fn ragged_rows_are_padded_with_floor() {
        let grid = parse_level_str("@..\n.#E\n#").expect("level parses");
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.rows(), 3);
        assert_eq!(
            rows_of(&grid),
            vec![symbols("@.."), symbols(".#E"), symbols("#..")]
        );
    }

    #[test]
    fn unknown_symbols_become_floor() {
        let grid = parse_level_str("@?x#").expect("level parses");
        assert_eq!(rows_of(&grid), vec![symbols("@..#")]);
    }

    #[test]
    fn cells_walk_rows_in_order() {
        let grid = parse_level_str("@..\n.#E").expect("level parses");
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (CellCoord::new(0, 0), CellSymbol::PlayerStart));
        assert_eq!(cells[4], (CellCoord::new(1, 1), CellSymbol::Wall));
        assert_eq!(cells[5], (CellCoord::new(2, 1), CellSymbol::Exit));
    }

    #[test]
    fn pixel_dimensions_follow_tile_size() {
        let grid = parse_level_str("@..\n.#E").expect("level parses");
        assert_eq!(grid.pixel_width(), 150.0);
        assert_eq!(grid.pixel_height(), 100.0);
    }

    proptest! {
        #[test]
        fn parsed_rows_share_the_longest_width(
            lines in proptest::collection::vec("[.#@E]{0,12}", 1..10)
        ) {
            prop_assume!(lines.iter().any(|line| !line.is_empty()));
            let longest = lines.iter().map(String::len).max().unwrap_or(0);
            let grid = parse_level(&lines).expect("non-empty source parses");
            let rows = rows_of(&grid);

            prop_assert_eq!(rows.len(), lines.len());
            for (row, source) in rows.iter().zip(&lines) {
                let expected = symbols(source);
                prop_assert_eq!(row.len(), longest);
                prop_assert_eq!(&row[..expected.len()], expected.as_slice());
                prop_assert!(row[expected.len()..].iter().all(|symbol| *symbol == CellSymbol::Floor));
            }
        }
    }
}
