use crate::transplant::TransplantMode;
use crate::view::ViewOverrides;
use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT_SHEET: &str = "Input";
pub const DEFAULT_OUTPUT_SHEET: &str = "Output";

/// Knobs shared by both pipelines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Template sheet that receives the data when a request names none.
    pub input_sheet: String,
    /// Template sheet kept in the output when a request names none.
    pub output_sheet: String,
    pub transplant_mode: TransplantMode,
    /// Strip non-ASCII characters from text in the kept sheet.
    pub normalize_text: bool,
    pub view: ViewOverrides,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            input_sheet: DEFAULT_INPUT_SHEET.to_string(),
            output_sheet: DEFAULT_OUTPUT_SHEET.to_string(),
            transplant_mode: TransplantMode::IncludeEmpty,
            normalize_text: true,
            view: ViewOverrides::default(),
        }
    }
}

impl ComposeOptions {
    /// Preset that always hides gridlines on the returned sheet.
    pub fn legacy() -> Self {
        Self {
            view: ViewOverrides {
                show_grid_lines: Some(false),
            },
            ..Self::default()
        }
    }
}
