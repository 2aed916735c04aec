use crate::model::Sheet;
use serde::{Deserialize, Serialize};

/// Display properties of a sheet that the model tracks explicitly.
///
/// Everything else about a sheet's view lives in the retained container
/// package and round-trips without passing through this struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetView {
    /// `Some(false)` hides gridlines, `Some(true)` shows them. `None` leaves
    /// the container's own setting (or the application default) in place.
    pub show_grid_lines: Option<bool>,
    pub tab_selected: bool,
    pub zoom_scale: Option<u32>,
}

/// Explicit display settings forced onto the output sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOverrides {
    pub show_grid_lines: Option<bool>,
}

impl ViewOverrides {
    pub fn is_empty(&self) -> bool {
        self.show_grid_lines.is_none()
    }
}

/// Reassert `prior` onto the sheet's current view, then apply `overrides`.
///
/// Runs after all content mutation and right before serialization.
pub fn preserve_view(sheet: &mut Sheet, prior: &SheetView, overrides: &ViewOverrides) {
    let mut view = *prior;
    if overrides.show_grid_lines.is_some() {
        view.show_grid_lines = overrides.show_grid_lines;
    }
    if sheet.view != view {
        tracing::debug!(
            sheet = sheet.name(),
            show_grid_lines = ?view.show_grid_lines,
            "restoring sheet view"
        );
    }
    sheet.view = view;
}
