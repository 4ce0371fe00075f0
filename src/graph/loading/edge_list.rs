//! Plain-text edge lists.
//!
//! One edge per line, columns separated by whitespace or commas:
//!
//! ```text
//! # comment
//! source,target,weight
//! 1,2,0.5
//! 2,3
//! ```
//!
//! A first line whose first cell is not numeric is a header naming the
//! columns; without one the columns are `source`, `target`, `weight`. A
//! missing weight cell falls back to the mapping's default.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use foldhash::{HashSet, HashSetExt};

use super::Edge;
use crate::error::{Error, Result};
use crate::property::{PropertyKey, PropertyMapping};

const DEFAULT_COLUMNS: [&str; 3] = ["source", "target", "weight"];

/// A parsed edge list: node ids in first-seen order plus edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeList {
    /// Distinct node ids in order of first appearance.
    pub nodes: Vec<u64>,
    /// Edges in file order.
    pub edges: Vec<Edge>,
    /// The weight mapping, resolved to its column index.
    pub weight: Option<PropertyMapping>,
}

impl EdgeList {
    /// Reads an edge list file.
    pub fn read(path: impl AsRef<Path>, weight: Option<&PropertyMapping>) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), weight)
    }

    /// Parses an edge list, loading weights from the column `weight` names.
    pub fn parse(reader: impl BufRead, weight: Option<&PropertyMapping>) -> Result<Self> {
        let mut columns: Option<Vec<String>> = None;
        let mut weight_column: Option<usize> = None;
        let mut resolved: Option<PropertyMapping> = None;
        let mut seen = HashSet::new();
        let mut out = EdgeList::default();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cells: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|c| !c.is_empty())
                .collect();

            if columns.is_none() {
                // Numeric but not a node id (`-1`, `1.0`) is a bad data line.
                let is_header = cells.first().is_some_and(|c| c.parse::<f64>().is_err());
                let names: Vec<String> = if is_header {
                    cells.iter().map(|c| c.to_ascii_lowercase()).collect()
                } else {
                    DEFAULT_COLUMNS.iter().map(|c| (*c).to_string()).collect()
                };
                if let Some(mapping) = weight {
                    let (column, mapping) = resolve(mapping, &names)?;
                    weight_column = Some(column);
                    resolved = Some(mapping);
                }
                columns = Some(names);
                if is_header {
                    continue;
                }
            }

            if cells.len() < 2 {
                return Err(Error::Parse {
                    line: line_no,
                    message: format!("expected at least 2 columns, found {}", cells.len()),
                });
            }
            let source = parse_id(cells[0], line_no)?;
            let target = parse_id(cells[1], line_no)?;
            let weight = match weight_column.and_then(|c| cells.get(c)) {
                Some(cell) => Some(cell.parse::<f64>().map_err(|e| Error::Parse {
                    line: line_no,
                    message: format!("invalid weight '{cell}': {e}"),
                })?),
                None => None,
            };

            for id in [source, target] {
                if seen.insert(id) {
                    out.nodes.push(id);
                }
            }
            out.edges.push(Edge {
                source,
                target,
                weight,
            });
        }

        out.weight = match (resolved, weight) {
            (Some(mapping), _) => Some(mapping),
            // Empty input: still report the mapping, resolved against the default layout.
            (None, Some(mapping)) => Some(resolve(mapping, &default_columns())?.1),
            (None, None) => None,
        };
        Ok(out)
    }

    /// Number of distinct nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| (*c).to_string()).collect()
}

fn resolve(mapping: &PropertyMapping, columns: &[String]) -> Result<(usize, PropertyMapping)> {
    let name = mapping.property_name().to_ascii_lowercase();
    let column = columns
        .iter()
        .position(|c| *c == name)
        .filter(|&c| c >= 2)
        .ok_or_else(|| {
            Error::InvalidProperty(format!(
                "no weight column named '{}' in [{}]",
                mapping.property_name(),
                columns.join(", ")
            ))
        })?;
    let key = u32::try_from(column)
        .map_err(|_| Error::InvalidProperty(format!("column index {column} too large")))?;
    let resolved = mapping.resolve_with(key)?;
    debug_assert_eq!(resolved.key(), PropertyKey::Resolved(key));
    Ok((column, resolved))
}

fn parse_id(cell: &str, line: usize) -> Result<u64> {
    cell.parse::<u64>().map_err(|e| Error::Parse {
        line,
        message: format!("invalid node id '{cell}': {e}"),
    })
}
