//! Template composition for xlsx workbooks.
//!
//! Two pipelines turn spreadsheet bytes into a single-sheet, formula-free
//! workbook:
//!
//! * [`Composer::extract`] keeps one named sheet of a workbook.
//! * [`Composer::merge`] pours the first sheet of a data workbook into a
//!   template's input sheet and keeps the template's output sheet.
//!
//! Formulas on the kept sheet are replaced by the results cached in the file.
//! No formula is evaluated, so the output reflects whatever the template's
//! author last computed.

pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod flatten;
pub mod locate;
pub mod model;
pub mod normalize;
pub mod prune;
pub mod transplant;
pub mod view;
mod xlsx;

pub use catalog::{MemoryCatalog, TemplateCatalog};
pub use compose::{
    ComposeReport, Composer, ExtractOutput, ExtractRequest, MergeOutput, MergeRequest,
    TemplateSource,
};
pub use config::{ComposeOptions, DEFAULT_INPUT_SHEET, DEFAULT_OUTPUT_SHEET};
pub use error::{ComposeError, SheetRole};
pub use model::{Cell, CellType, CellValue, Sheet, SheetId, Style, Workbook};
pub use transplant::TransplantMode;
pub use view::{SheetView, ViewOverrides};
