//! Reading grids from text and drawing solved ones.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use hashiwokakero::board::Orientation;
use hashiwokakero::{PuzzleGraph, Solution};
use itertools::Itertools;

/// Read a grid file with [`parse_grid`].
pub fn load_grid<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read grid file: {}", path.as_ref().display()))?;

    parse_grid(&content)
        .with_context(|| format!("Failed to parse grid from file: {}", path.as_ref().display()))
}

/// Parse one row per line, cells separated by commas and/or whitespace, `0` for water.
/// Anything after `#` is a comment; blank lines are skipped.
///
/// Row lengths and cell values are left for [`PuzzleGraphBuilder`](hashiwokakero::PuzzleGraphBuilder) to check.
pub fn parse_grid(content: &str) -> Result<Vec<Vec<u8>>> {
    let mut rows = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let row = line.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.parse::<u8>()
                .with_context(|| format!("Line {}: \"{cell}\" is not a cell value", number + 1)))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }

    ensure!(!rows.is_empty(), "Grid file is empty or contains no valid rows");
    Ok(rows)
}

/// Draw `solution` over the grid `graph` was built from, one string per row.
///
/// Islands show their number and water `0`. Single and double bridges are `-` and `=` across, `|` and `$` down.
pub fn render(graph: &PuzzleGraph, solution: &Solution) -> Vec<String> {
    let (width, height) = graph.dims();
    let mut cells = vec![vec!['0'; width.get()]; height.get()];

    for island in graph.islands() {
        cells[island.location.row()][island.location.col()] = char::from(b'0' + island.required);
    }

    for edge in graph.edges() {
        let symbol = match (edge.orientation, solution.get(&edge.endpoints())) {
            (_, None | Some(0)) => continue,
            (Orientation::Horizontal, Some(1)) => '-',
            (Orientation::Horizontal, Some(_)) => '=',
            (Orientation::Vertical, Some(1)) => '|',
            (Orientation::Vertical, Some(_)) => '$',
        };
        for cell in &edge.span {
            cells[cell.row()][cell.col()] = symbol;
        }
    }

    cells.into_iter()
        .map(|row| row.into_iter().join(" "))
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use hashiwokakero::{PuzzleGraphBuilder, PuzzleSolver, Strategy};
    use tempfile::NamedTempFile;

    use crate::grid::{load_grid, parse_grid, render};

    #[test]
    fn parse_mixed_separators_and_comments() {
        let rows = parse_grid("# a small one\n2, 0, 2\n\n  0 0 0   # trailing\n2,0 ,2\n").unwrap();
        assert_eq!(rows, vec![vec![2, 0, 2], vec![0, 0, 0], vec![2, 0, 2]]);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_grid("1 0\n0 x\n").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
        assert!(parse_grid("# nothing here\n\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1,1").unwrap();
        assert_eq!(load_grid(file.path()).unwrap(), vec![vec![1, 1]]);
    }

    #[test]
    fn render_bridges() {
        let rows = vec![
            vec![2, 0, 2],
            vec![0, 0, 0],
            vec![2, 0, 2],
        ];
        let solved = Strategy::Sat.instantiate().solve_grid(&rows).unwrap();
        let solution = solved.result.solution.unwrap();
        assert_eq!(render(&solved.graph, &solution), vec!["2 - 2", "| 0 |", "2 - 2"]);

        let graph = PuzzleGraphBuilder::from_rows(&[[4u8, 0, 0, 4], [2, 0, 0, 2]]).build().unwrap();
        let solution = Strategy::Backtracking.instantiate().solve(&graph).solution.unwrap();
        assert_eq!(render(&graph, &solution), vec!["4 = = 4", "2 0 0 2"]);
    }
}
