use crate::error::ComposeError;
use crate::model::Workbook;

/// Remove every sheet not named `survivor`; returns how many were removed.
///
/// Sheet ids are snapshotted before the first removal. When `survivor` does
/// not exist every sheet is removed and [`ComposeError::EmptyResultAfterPrune`]
/// is returned; the workbook must then be discarded.
pub fn prune_except(workbook: &mut Workbook, survivor: &str) -> Result<usize, ComposeError> {
    let snapshot = workbook.sheet_ids();
    let mut removed = 0;
    for id in snapshot {
        let keep = workbook
            .sheet(id)
            .is_some_and(|sheet| sheet.name() == survivor);
        if !keep && workbook.remove_sheet(id).is_some() {
            removed += 1;
        }
    }
    if workbook.sheet_count() == 0 {
        return Err(ComposeError::EmptyResultAfterPrune {
            survivor: survivor.to_string(),
        });
    }
    tracing::debug!(survivor, removed, "pruned workbook");
    Ok(removed)
}
