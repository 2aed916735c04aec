//! Sheet lookup by exact, case-sensitive name.
//!
//! Absence is `None`; an empty sheet is still `Some`. The `require*` variants
//! turn absence into [`ComposeError::SheetNotFound`] for pipeline use.

use crate::error::{ComposeError, SheetRole};
use crate::model::{Sheet, SheetId, Workbook};

pub fn find<'a>(workbook: &'a Workbook, name: &str) -> Option<&'a Sheet> {
    workbook.sheets().find(|s| s.name() == name)
}

pub fn find_id(workbook: &Workbook, name: &str) -> Option<SheetId> {
    find(workbook, name).map(Sheet::id)
}

pub fn find_mut<'a>(workbook: &'a mut Workbook, name: &str) -> Option<&'a mut Sheet> {
    let id = find_id(workbook, name)?;
    workbook.sheet_mut(id)
}

pub fn require<'a>(
    workbook: &'a Workbook,
    name: &str,
    role: SheetRole,
) -> Result<&'a Sheet, ComposeError> {
    find(workbook, name).ok_or_else(|| ComposeError::sheet_not_found(role, name))
}

pub fn require_mut<'a>(
    workbook: &'a mut Workbook,
    name: &str,
    role: SheetRole,
) -> Result<&'a mut Sheet, ComposeError> {
    find_mut(workbook, name).ok_or_else(|| ComposeError::sheet_not_found(role, name))
}
