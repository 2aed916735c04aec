//! xlsx container codec backed by `umya-spreadsheet`.
//!
//! Decoding keeps the parsed package inside the [`Workbook`]; encoding patches
//! that package instead of building a new one, so sheet-level attributes the
//! model does not track survive for every sheet that is kept.

use crate::error::ComposeError;
use crate::model::{Cell, CellValue, Sheet, SheetId, Style, Workbook, datetime_to_serial};
use crate::view::SheetView;
use std::io::Cursor;
use umya_spreadsheet::{CellRawValue, Spreadsheet, Worksheet};

pub fn read_workbook(bytes: &[u8]) -> Result<Workbook, ComposeError> {
    let _span = tracing::info_span!("xlsx_read", bytes = bytes.len()).entered();
    // umya panics on some corrupt packages (dangling shared-string indices,
    // broken part XML) instead of returning an error.
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| decode_package(bytes))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::warn!(%reason, "xlsx reader panicked");
            Err(ComposeError::MalformedWorkbook(reason))
        }
    }
}

fn decode_package(bytes: &[u8]) -> Result<Workbook, ComposeError> {
    let mut book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| ComposeError::MalformedWorkbook(e.to_string()))?;
    book.read_sheet_collection();

    let mut workbook = Workbook::new();
    for ws in book.get_sheet_collection_no_check() {
        let sheet = read_sheet(ws);
        tracing::debug!(sheet = sheet.name(), cells = sheet.len(), "decoded sheet");
        workbook.push_decoded(sheet);
    }
    workbook.package = Some(Box::new(book));
    Ok(workbook)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("reader panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("reader panicked: {msg}")
    } else {
        "reader panicked".to_string()
    }
}

pub fn write_workbook(workbook: Workbook) -> Result<Vec<u8>, ComposeError> {
    let (sheets, package) = workbook.into_parts();
    if sheets.is_empty() {
        return Err(ComposeError::SerializationFailure(
            "workbook has no sheets".to_string(),
        ));
    }
    let _span = tracing::info_span!("xlsx_write", sheets = sheets.len()).entered();

    let mut book = match package {
        Some(book) => *book,
        None => umya_spreadsheet::new_file_empty_worksheet(),
    };
    book.read_sheet_collection();
    drop_stale_sheets(&mut book, &sheets)?;

    for sheet in &sheets {
        if sheet.origin.is_none() {
            book.new_sheet(sheet.name()).map_err(|e| {
                ComposeError::SerializationFailure(format!(
                    "cannot create sheet `{}`: {e}",
                    sheet.name()
                ))
            })?;
        }
        let ws = book.get_sheet_by_name_mut(sheet.name()).ok_or_else(|| {
            ComposeError::SerializationFailure(format!(
                "sheet `{}` missing from package",
                sheet.name()
            ))
        })?;
        write_sheet(ws, sheet);
    }
    // The previously active tab may have been pruned away.
    book.set_active_sheet(0);

    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf)
        .map_err(|e| ComposeError::SerializationFailure(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Remove package worksheets that no longer back a model sheet.
fn drop_stale_sheets(book: &mut Spreadsheet, sheets: &[Sheet]) -> Result<(), ComposeError> {
    let stale: Vec<String> = book
        .get_sheet_collection_no_check()
        .iter()
        .map(|ws| ws.get_name().to_string())
        .filter(|name| {
            !sheets
                .iter()
                .any(|s| s.origin.is_some() && s.name() == name.as_str())
        })
        .collect();
    for name in stale {
        book.remove_sheet_by_name(&name).map_err(|e| {
            ComposeError::SerializationFailure(format!("cannot remove sheet `{name}`: {e}"))
        })?;
    }
    Ok(())
}

fn read_sheet(ws: &Worksheet) -> Sheet {
    let mut sheet = Sheet::new(SheetId(0), ws.get_name());
    let view = read_view(ws);
    sheet.view = view;
    sheet.origin = Some(view);

    for cell in ws.get_cell_collection() {
        let coord = cell.get_coordinate();
        let col = *coord.get_col_num();
        let row = *coord.get_row_num();
        let cv = cell.get_cell_value();
        let decoded = if cv.is_formula() {
            Cell::formula(cv.get_formula(), convert_raw(cv))
        } else {
            Cell::new(convert_raw(cv).unwrap_or(CellValue::Empty))
        };
        let decoded = decoded.with_style(Style::from(cell.get_style().clone()));
        if let Err(err) = sheet.set_cell(row, col, decoded) {
            tracing::warn!(sheet = ws.get_name(), %err, "skipping cell");
        }
    }
    sheet
}

fn convert_raw(cv: &umya_spreadsheet::CellValue) -> Option<CellValue> {
    let raw = cv.get_raw_value();
    if raw.is_empty() {
        return None;
    }
    let value = match raw {
        CellRawValue::Empty => return None,
        CellRawValue::Numeric(n) => CellValue::Number(*n),
        CellRawValue::Bool(b) => CellValue::Boolean(*b),
        // Formula caches stored as `t="str"` stay text, even when numeric.
        CellRawValue::String(s) => CellValue::Text(s.to_string()),
        CellRawValue::Lazy(s) => CellValue::Text(s.to_string()),
        CellRawValue::RichText(rt) => CellValue::Text(rt.get_text().to_string()),
        CellRawValue::Error(_) => CellValue::Error(cv.get_value().into_owned()),
    };
    Some(value)
}

fn read_view(ws: &Worksheet) -> SheetView {
    let Some(view) = ws.get_sheets_views().get_sheet_view_list().first() else {
        return SheetView::default();
    };
    let zoom = *view.get_zoom_scale();
    SheetView {
        // An absent attribute reads back as `false`; only an explicit `true`
        // is unambiguous.
        show_grid_lines: view.get_show_grid_lines().then_some(true),
        tab_selected: *view.get_tab_selected(),
        zoom_scale: (zoom != 0).then_some(zoom),
    }
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) {
    let existing: Vec<(u32, u32)> = ws
        .get_cell_collection()
        .iter()
        .map(|c| {
            let coord = c.get_coordinate();
            (*coord.get_col_num(), *coord.get_row_num())
        })
        .collect();
    for coord in existing {
        ws.remove_cell(coord);
    }

    for ((row, col), cell) in sheet.cells() {
        // umya addresses cells as (col, row)
        let target = ws.get_cell_mut((col, row));
        if let Some(style) = cell.style.raw() {
            target.set_style(style.clone());
        }
        write_value(target, cell);
    }
    write_view(ws, &sheet.view, sheet.origin.as_ref());
}

fn write_value(target: &mut umya_spreadsheet::Cell, cell: &Cell) {
    match &cell.value {
        CellValue::Empty => {
            target.set_blank();
        }
        CellValue::Number(n) => {
            target.set_value_number(*n);
        }
        CellValue::Text(s) => {
            target.set_value_string(s.clone());
        }
        CellValue::Boolean(b) => {
            target.set_value_bool(*b);
        }
        CellValue::Date(dt) => {
            target.set_value_number(datetime_to_serial(dt));
        }
        CellValue::Error(e) => {
            target.set_value(e.clone());
        }
        CellValue::Formula(expr) => {
            // umya stores formulas without the leading '='
            target.set_formula(expr.strip_prefix('=').unwrap_or(expr).to_string());
            if let Some(result) = cell.cached_result() {
                target.set_formula_result_default(render_cached(result));
            }
        }
    }
}

fn render_cached(value: &CellValue) -> String {
    match value {
        CellValue::Empty | CellValue::Formula(_) => String::new(),
        CellValue::Number(n) => n.to_string(),
        CellValue::Text(s) | CellValue::Error(s) => s.clone(),
        CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Date(dt) => datetime_to_serial(dt).to_string(),
    }
}

/// Write tracked view properties that differ from what was decoded. Untouched
/// properties are left exactly as the package has them.
fn write_view(ws: &mut Worksheet, view: &SheetView, origin: Option<&SheetView>) {
    let baseline = origin.copied().unwrap_or_default();
    if *view == baseline {
        return;
    }
    let views = ws.get_sheet_views_mut();
    if views.get_sheet_view_list().is_empty() {
        views.add_sheet_view_list_mut(umya_spreadsheet::SheetView::default());
    }
    let Some(target) = views.get_sheet_view_list_mut().first_mut() else {
        return;
    };
    if view.show_grid_lines != baseline.show_grid_lines {
        if let Some(show) = view.show_grid_lines {
            target.set_show_grid_lines(show);
        }
    }
    if view.tab_selected != baseline.tab_selected {
        target.set_tab_selected(view.tab_selected);
    }
    if view.zoom_scale != baseline.zoom_scale {
        if let Some(zoom) = view.zoom_scale {
            target.set_zoom_scale(zoom);
        }
    }
}
