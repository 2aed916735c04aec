use crate::error::col_to_a1;
use crate::model::{CellValue, Sheet};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlattenStats {
    pub flattened: usize,
    /// Coordinates of formulas without a cached result that were set to 0.
    pub defaulted: Vec<(u32, u32)>,
}

/// Replace every formula cell with its cached result.
///
/// Formulas whose producing application never cached a result collapse to
/// the number 0. Nothing is evaluated here; a stale cache stays stale.
pub fn flatten(sheet: &mut Sheet) -> FlattenStats {
    let mut stats = FlattenStats::default();
    let name = sheet.name().to_string();
    for ((row, col), cell) in sheet.cells_mut() {
        if !cell.value.is_formula() {
            continue;
        }
        let result = cell.result.take();
        cell.value = match result {
            Some(value) if !value.is_empty() && !value.is_formula() => value,
            _ => {
                tracing::warn!(
                    sheet = name.as_str(),
                    cell = %format!("{}{}", col_to_a1(col), row),
                    "formula has no cached result; writing 0"
                );
                stats.defaulted.push((row, col));
                CellValue::Number(0.0)
            }
        };
        stats.flattened += 1;
    }
    stats
}
