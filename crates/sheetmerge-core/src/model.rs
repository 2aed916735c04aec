//! In-memory workbook model.
//!
//! A [`Workbook`] is an ordered list of uniquely named [`Sheet`]s. Each sheet is
//! a sparse grid of [`Cell`]s keyed by 1-based `(row, col)` plus a small set of
//! tracked display properties ([`SheetView`]).
//!
//! Workbooks decoded from xlsx bytes also keep the decoded container package
//! around, so that attributes the model does not track (column widths, merged
//! ranges, defined names, ...) survive a decode/encode cycle untouched.

use crate::error::ComposeError;
use crate::view::SheetView;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
const EXCEL_EPOCH: NaiveDate = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();

/// Convert a timestamp to an Excel 1900-system serial number.
pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - EXCEL_EPOCH).num_days();
    // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
    let serial_days = match NaiveDate::from_ymd_opt(1900, 3, 1) {
        Some(leap_cutover) if dt.date() >= leap_cutover => days + 1,
        _ => days,
    };
    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / 86_400.0
}

/// Nominal content of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDateTime),
    /// Error literal as Excel renders it (`#DIV/0!`, `#N/A`, ...).
    Error(String),
    /// Formula expression, always stored with its leading `=`.
    Formula(String),
}

impl CellValue {
    pub fn formula(expr: impl AsRef<str>) -> Self {
        let expr = expr.as_ref();
        if expr.starts_with('=') {
            Self::Formula(expr.to_string())
        } else {
            Self::Formula(format!("={expr}"))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Self::Formula(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Empty => CellType::Empty,
            Self::Number(_) => CellType::Number,
            Self::Text(_) => CellType::String,
            Self::Boolean(_) => CellType::Boolean,
            Self::Date(_) => CellType::Date,
            Self::Error(_) => CellType::Error,
            Self::Formula(_) => CellType::Formula,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a str> for CellValue {
    fn from(value: &'a str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Empty,
    Number,
    String,
    Boolean,
    Date,
    Error,
    Formula,
}

/// Opaque per-cell formatting carried over from the container format.
///
/// Never inspected by the pipelines; cloning shares the same record, and
/// [`Style::same_as`] compares by identity.
#[derive(Clone, Default)]
pub struct Style(Option<Arc<umya_spreadsheet::Style>>);

impl Style {
    pub fn is_default(&self) -> bool {
        self.0.is_none()
    }

    pub fn same_as(&self, other: &Style) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn raw(&self) -> Option<&umya_spreadsheet::Style> {
        self.0.as_deref()
    }
}

impl From<umya_spreadsheet::Style> for Style {
    fn from(style: umya_spreadsheet::Style) -> Self {
        Self(Some(Arc::new(style)))
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("Style(default)"),
            Some(style) => write!(f, "Style({:p})", Arc::as_ptr(style)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub value: CellValue,
    /// Last computed value cached by the producing application. Only ever
    /// set for formula cells.
    pub result: Option<CellValue>,
    pub style: Style,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            result: None,
            style: Style::default(),
        }
    }

    pub fn empty() -> Self {
        Self::new(CellValue::Empty)
    }

    pub fn formula(expr: impl AsRef<str>, cached: Option<CellValue>) -> Self {
        Self {
            value: CellValue::formula(expr),
            result: cached,
            style: Style::default(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    /// Cached result of a formula cell, ignoring an explicitly empty cache.
    pub fn cached_result(&self) -> Option<&CellValue> {
        match (&self.value, &self.result) {
            (CellValue::Formula(_), Some(result)) if !result.is_empty() => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SheetId(pub u32);

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    pub view: SheetView,
    /// View as decoded, present only while the sheet is backed by the
    /// retained package worksheet of the same name.
    pub(crate) origin: Option<SheetView>,
}

impl Sheet {
    pub(crate) fn new(id: SheetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cells: BTreeMap::new(),
            view: SheetView::default(),
            origin: None,
        }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&(row, col))
    }

    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// Store `cell` at `(row, col)`, returning whatever was there before.
    pub fn set_cell(
        &mut self,
        row: u32,
        col: u32,
        cell: Cell,
    ) -> Result<Option<Cell>, ComposeError> {
        if row == 0 || col == 0 {
            return Err(ComposeError::InvalidCoordinate { row, col });
        }
        Ok(self.cells.insert((row, col), cell))
    }

    pub fn set_value(
        &mut self,
        row: u32,
        col: u32,
        value: impl Into<CellValue>,
    ) -> Result<(), ComposeError> {
        self.set_cell(row, col, Cell::new(value)).map(|_| ())
    }

    pub fn remove_cell(&mut self, row: u32, col: u32) -> Option<Cell> {
        self.cells.remove(&(row, col))
    }

    pub fn clear_cells(&mut self) {
        self.cells.clear();
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> {
        self.cells.iter().map(|(coord, cell)| (*coord, cell))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = ((u32, u32), &mut Cell)> {
        self.cells.iter_mut().map(|(coord, cell)| (*coord, cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest `(row, col)` holding a cell, or `None` for an empty sheet.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.cells
            .keys()
            .fold(None, |acc: Option<(u32, u32)>, (r, c)| match acc {
                None => Some((*r, *c)),
                Some((mr, mc)) => Some((mr.max(*r), mc.max(*c))),
            })
    }
}

#[derive(Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    next_id: u32,
    pub(crate) package: Option<Box<umya_spreadsheet::Spreadsheet>>,
}

impl fmt::Debug for Workbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workbook")
            .field("sheets", &self.sheets)
            .field("package", &self.package.is_some())
            .finish()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an xlsx byte stream.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self, ComposeError> {
        crate::xlsx::read_workbook(bytes)
    }

    /// Encode into an xlsx byte stream, consuming the workbook.
    pub fn into_xlsx_bytes(self) -> Result<Vec<u8>, ComposeError> {
        crate::xlsx::write_workbook(self)
    }

    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<&mut Sheet, ComposeError> {
        let name = name.into();
        if self.has_sheet(&name) {
            return Err(ComposeError::DuplicateSheet(name));
        }
        self.next_id += 1;
        let id = SheetId(self.next_id);
        self.sheets.push(Sheet::new(id, name));
        let idx = self.sheets.len() - 1;
        Ok(&mut self.sheets[idx])
    }

    pub fn remove_sheet(&mut self, id: SheetId) -> Option<Sheet> {
        let idx = self.sheets.iter().position(|s| s.id == id)?;
        Some(self.sheets.remove(idx))
    }

    /// Snapshot of sheet identifiers in workbook order.
    pub fn sheet_ids(&self) -> Vec<SheetId> {
        self.sheets.iter().map(|s| s.id).collect()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    pub fn sheet_mut(&mut self, id: SheetId) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.id == id)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// First sheet by position, whatever its name.
    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn set_value(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: impl Into<CellValue>,
    ) -> Result<(), ComposeError> {
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.name == sheet)
            .ok_or_else(|| {
                ComposeError::sheet_not_found(crate::error::SheetRole::Target, sheet)
            })?;
        sheet.set_value(row, col, value)
    }

    pub fn get_value(&self, sheet: &str, row: u32, col: u32) -> Option<CellValue> {
        self.sheets
            .iter()
            .find(|s| s.name == sheet)?
            .value(row, col)
            .cloned()
    }

    pub(crate) fn push_decoded(&mut self, mut sheet: Sheet) -> SheetId {
        self.next_id += 1;
        sheet.id = SheetId(self.next_id);
        let id = sheet.id;
        self.sheets.push(sheet);
        id
    }

    pub(crate) fn into_parts(self) -> (Vec<Sheet>, Option<Box<umya_spreadsheet::Spreadsheet>>) {
        (self.sheets, self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_ids_are_stable_and_not_reused() {
        let mut wb = Workbook::new();
        let a = wb.add_sheet("A").unwrap().id();
        let b = wb.add_sheet("B").unwrap().id();
        assert_ne!(a, b);

        wb.remove_sheet(a).expect("A removed");
        let c = wb.add_sheet("A").unwrap().id();
        assert_ne!(c, a, "re-added sheet must get a fresh id");
        assert_eq!(wb.sheet(b).map(|s| s.name()), Some("B"));
        assert_eq!(wb.sheet_names(), vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn duplicate_sheet_names_are_rejected() {
        let mut wb = Workbook::new();
        wb.add_sheet("Data").unwrap();
        match wb.add_sheet("Data") {
            Err(ComposeError::DuplicateSheet(name)) => assert_eq!(name, "Data"),
            other => panic!("unexpected result: {other:?}"),
        }
        // Exact match only: different case is a different sheet.
        wb.add_sheet("data").expect("case differs");
        assert_eq!(wb.sheet_count(), 2);
    }

    #[test]
    fn coordinates_are_one_based() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet("S").unwrap();
        let err = sheet.set_value(0, 1, 1.0).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidCoordinate { row: 0, col: 1 }));
        sheet.set_value(3, 2, "X").unwrap();
        assert_eq!(sheet.value(3, 2), Some(&CellValue::Text("X".into())));
        assert_eq!(sheet.dimensions(), Some((3, 2)));
    }

    #[test]
    fn dimensions_track_highest_row_and_column_independently() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet("S").unwrap();
        assert_eq!(sheet.dimensions(), None);
        sheet.set_value(10, 1, 1.0).unwrap();
        sheet.set_value(2, 7, 1.0).unwrap();
        assert_eq!(sheet.dimensions(), Some((10, 7)));
    }

    #[test]
    fn cell_type_follows_value() {
        assert_eq!(Cell::new(1.5).cell_type(), CellType::Number);
        assert_eq!(Cell::new("a").cell_type(), CellType::String);
        assert_eq!(Cell::new(true).cell_type(), CellType::Boolean);
        assert_eq!(Cell::empty().cell_type(), CellType::Empty);
        let f = Cell::formula("A1*2", Some(CellValue::Number(4.0)));
        assert_eq!(f.cell_type(), CellType::Formula);
        assert_eq!(f.value, CellValue::Formula("=A1*2".into()));
        assert_eq!(f.cached_result(), Some(&CellValue::Number(4.0)));
    }

    #[test]
    fn empty_cache_is_not_a_result() {
        let f = Cell::formula("=A1", Some(CellValue::Empty));
        assert_eq!(f.cached_result(), None);
        let plain = Cell {
            value: CellValue::Number(1.0),
            result: Some(CellValue::Number(2.0)),
            style: Style::default(),
        };
        assert_eq!(plain.cached_result(), None);
    }

    #[test]
    fn style_identity() {
        let a = Style::from(umya_spreadsheet::Style::default());
        let b = a.clone();
        let c = Style::from(umya_spreadsheet::Style::default());
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
        assert!(!a.same_as(&Style::default()));
        assert!(Style::default().same_as(&Style::default()));
    }

    #[test]
    fn serial_dates_skip_phantom_leap_day() {
        let d = NaiveDate::from_ymd_opt(1900, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(datetime_to_serial(&d), 1.0);
        let d = NaiveDate::from_ymd_opt(1900, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(datetime_to_serial(&d), 61.5);
    }
}
