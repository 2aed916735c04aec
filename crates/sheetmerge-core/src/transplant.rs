use crate::model::{Cell, Sheet};
use serde::{Deserialize, Serialize};

/// Whether cells that exist but hold no value are copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransplantMode {
    /// Copy every cell present in the source, including blank styled ones.
    #[default]
    IncludeEmpty,
    /// Skip cells whose value is empty.
    SkipEmpty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransplantStats {
    pub cells_written: usize,
    /// Formula cells whose cached result was written instead of the expression.
    pub formulas_resolved: usize,
    pub skipped_empty: usize,
}

/// Copy every cell of `source` into `destination` at the same `(row, col)`.
///
/// The written value is the cached result for formula cells that have one
/// and the nominal value otherwise; the style is shared verbatim. Existing
/// destination cells at other coordinates are left alone.
pub fn transplant(source: &Sheet, destination: &mut Sheet, mode: TransplantMode) -> TransplantStats {
    let mut stats = TransplantStats::default();
    for ((row, col), cell) in source.cells() {
        if mode == TransplantMode::SkipEmpty && cell.value.is_empty() {
            stats.skipped_empty += 1;
            continue;
        }
        let value = match cell.cached_result() {
            Some(result) => {
                stats.formulas_resolved += 1;
                result.clone()
            }
            None => cell.value.clone(),
        };
        let copied = Cell::new(value).with_style(cell.style.clone());
        // Source coordinates are already validated 1-based keys.
        if destination.set_cell(row, col, copied).is_ok() {
            stats.cells_written += 1;
        }
    }
    tracing::debug!(
        source = source.name(),
        destination = destination.name(),
        cells = stats.cells_written,
        "transplanted cells"
    );
    stats
}

/// Remove every cell from `sheet` ahead of a full-overwrite transplant.
pub fn clear_cells(sheet: &mut Sheet) -> usize {
    let removed = sheet.len();
    sheet.clear_cells();
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Style, Workbook};

    #[test]
    fn copies_values_and_styles_at_same_coordinates() {
        let mut src_wb = Workbook::new();
        let src = src_wb.add_sheet("Data").unwrap();
        let style = Style::from(umya_spreadsheet::Style::default());
        src.set_cell(3, 2, Cell::new("X").with_style(style.clone()))
            .unwrap();
        src.set_value(1, 1, 5.0).unwrap();

        let mut dst_wb = Workbook::new();
        let dst = dst_wb.add_sheet("Input").unwrap();
        dst.set_value(3, 2, "old").unwrap();
        dst.set_value(9, 9, "untouched").unwrap();

        let stats = transplant(src, dst, TransplantMode::IncludeEmpty);
        assert_eq!(stats.cells_written, 2);

        let copied = dst.cell(3, 2).expect("B3");
        assert_eq!(copied.value, CellValue::Text("X".into()));
        assert!(copied.style.same_as(&style));
        assert_eq!(dst.value(1, 1), Some(&CellValue::Number(5.0)));
        assert_eq!(dst.value(9, 9), Some(&CellValue::Text("untouched".into())));
    }

    #[test]
    fn formula_cells_contribute_their_cached_result() {
        let mut src_wb = Workbook::new();
        let src = src_wb.add_sheet("Data").unwrap();
        src.set_cell(1, 1, Cell::formula("=1+1", Some(CellValue::Number(2.0))))
            .unwrap();
        src.set_cell(1, 2, Cell::formula("=NOW()", None)).unwrap();

        let mut dst_wb = Workbook::new();
        let dst = dst_wb.add_sheet("Input").unwrap();
        let stats = transplant(src, dst, TransplantMode::IncludeEmpty);

        assert_eq!(stats.formulas_resolved, 1);
        let a1 = dst.cell(1, 1).unwrap();
        assert_eq!(a1.value, CellValue::Number(2.0));
        assert!(a1.result.is_none());
        // No cache: the expression itself is carried over.
        assert_eq!(dst.value(1, 2), Some(&CellValue::Formula("=NOW()".into())));
    }

    #[test]
    fn skip_empty_leaves_destination_cells() {
        let mut src_wb = Workbook::new();
        let src = src_wb.add_sheet("Data").unwrap();
        src.set_cell(2, 2, Cell::empty()).unwrap();

        let mut dst_wb = Workbook::new();
        let dst = dst_wb.add_sheet("Input").unwrap();
        dst.set_value(2, 2, 7.0).unwrap();

        let stats = transplant(src, dst, TransplantMode::SkipEmpty);
        assert_eq!(stats.skipped_empty, 1);
        assert_eq!(dst.value(2, 2), Some(&CellValue::Number(7.0)));

        let stats = transplant(src, dst, TransplantMode::IncludeEmpty);
        assert_eq!(stats.cells_written, 1);
        assert_eq!(dst.value(2, 2), Some(&CellValue::Empty));
    }

    #[test]
    fn clear_then_transplant_leaves_only_source_cells() {
        let mut src_wb = Workbook::new();
        let src = src_wb.add_sheet("Data").unwrap();
        src.set_value(1, 1, "a").unwrap();

        let mut dst_wb = Workbook::new();
        let dst = dst_wb.add_sheet("Input").unwrap();
        dst.set_value(5, 5, "stale").unwrap();
        dst.set_value(1, 1, "stale").unwrap();

        assert_eq!(clear_cells(dst), 2);
        transplant(src, dst, TransplantMode::IncludeEmpty);
        assert_eq!(dst.len(), 1);
        assert_eq!(dst.value(1, 1), Some(&CellValue::Text("a".into())));
        assert!(dst.cell(5, 5).is_none());
    }
}
