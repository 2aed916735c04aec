//! The two composition pipelines.
//!
//! * **extract**: keep one sheet of a workbook, flattened.
//! * **merge**: overwrite a template's input sheet with the first sheet of a
//!   data workbook, then keep only the template's output sheet, flattened.
//!
//! Each request decodes its own workbooks and either returns freshly encoded
//! bytes or an error; nothing partial escapes and no state is shared between
//! requests.

use crate::catalog::TemplateCatalog;
use crate::config::ComposeOptions;
use crate::error::{ComposeError, SheetRole};
use crate::flatten::{FlattenStats, flatten};
use crate::locate::require_mut;
use crate::model::{Sheet, Workbook};
use crate::normalize::normalize;
use crate::prune::prune_except;
use crate::transplant::{TransplantStats, clear_cells, transplant};
use crate::view::{SheetView, preserve_view};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub workbook: Vec<u8>,
    pub target_sheet: String,
}

impl ExtractRequest {
    pub fn new(workbook: Vec<u8>, target_sheet: impl Into<String>) -> Self {
        Self {
            workbook,
            target_sheet: target_sheet.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOutput {
    pub bytes: Vec<u8>,
    pub sheet_name: String,
    pub report: ComposeReport,
}

#[derive(Debug, Clone)]
pub enum TemplateSource {
    Bytes(Vec<u8>),
    /// Identifier resolved through the composer's [`TemplateCatalog`].
    Named(String),
}

#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub template: TemplateSource,
    pub data: Vec<u8>,
    /// Falls back to [`ComposeOptions::input_sheet`].
    pub input_sheet: Option<String>,
    /// Falls back to [`ComposeOptions::output_sheet`].
    pub output_sheet: Option<String>,
}

impl MergeRequest {
    pub fn new(template: TemplateSource, data: Vec<u8>) -> Self {
        Self {
            template,
            data,
            input_sheet: None,
            output_sheet: None,
        }
    }

    pub fn with_sheets(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.input_sheet = Some(input.into());
        self.output_sheet = Some(output.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub bytes: Vec<u8>,
    pub report: ComposeReport,
}

/// What a pipeline did to the workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposeReport {
    /// Name of the single sheet left in the output.
    pub sheet: String,
    pub cells_cleared: usize,
    pub transplant: Option<TransplantStats>,
    pub flatten: FlattenStats,
    pub normalized: usize,
    pub sheets_removed: usize,
}

impl ComposeReport {
    fn new(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            ..Self::default()
        }
    }

    /// True when some formula had no cached result and was written as 0.
    pub fn has_defaulted_formulas(&self) -> bool {
        !self.flatten.defaulted.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct Composer {
    options: ComposeOptions,
    catalog: Option<Arc<dyn TemplateCatalog>>,
}

impl Composer {
    pub fn new(options: ComposeOptions) -> Self {
        Self {
            options,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn TemplateCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    pub fn available_templates(&self) -> Vec<String> {
        self.catalog
            .as_ref()
            .map(|c| c.template_ids())
            .unwrap_or_default()
    }

    pub fn extract(&self, request: ExtractRequest) -> Result<ExtractOutput, ComposeError> {
        let _span =
            tracing::info_span!("compose_extract", sheet = request.target_sheet.as_str())
                .entered();
        let mut workbook = Workbook::from_xlsx_bytes(&request.workbook)?;
        let report = self.extract_workbook(&mut workbook, &request.target_sheet)?;
        let bytes = workbook.into_xlsx_bytes()?;
        tracing::info!(bytes = bytes.len(), "extract complete");
        Ok(ExtractOutput {
            bytes,
            sheet_name: request.target_sheet,
            report,
        })
    }

    pub fn merge(&self, request: MergeRequest) -> Result<MergeOutput, ComposeError> {
        let input = request
            .input_sheet
            .unwrap_or_else(|| self.options.input_sheet.clone());
        let output = request
            .output_sheet
            .unwrap_or_else(|| self.options.output_sheet.clone());
        let _span = tracing::info_span!(
            "compose_merge",
            input = input.as_str(),
            output = output.as_str()
        )
        .entered();

        let template_bytes = self.resolve_template(request.template)?;
        let mut template = Workbook::from_xlsx_bytes(&template_bytes)?;
        let data = Workbook::from_xlsx_bytes(&request.data)?;
        let report = self.merge_workbooks(&mut template, &data, &input, &output)?;
        let bytes = template.into_xlsx_bytes()?;
        tracing::info!(bytes = bytes.len(), "merge complete");
        Ok(MergeOutput { bytes, report })
    }

    /// Reduce `workbook` to a flattened copy of `target`.
    pub fn extract_workbook(
        &self,
        workbook: &mut Workbook,
        target: &str,
    ) -> Result<ComposeReport, ComposeError> {
        let mut report = ComposeReport::new(target);
        let sheet = require_mut(workbook, target, SheetRole::Target)?;
        let prior = sheet.view;
        self.finish_sheet(sheet, &prior, &mut report);
        report.sheets_removed = prune_except(workbook, target)?;
        Ok(report)
    }

    /// Overwrite `input` in `template` with the first sheet of `data`, then
    /// reduce `template` to a flattened copy of `output`.
    pub fn merge_workbooks(
        &self,
        template: &mut Workbook,
        data: &Workbook,
        input: &str,
        output: &str,
    ) -> Result<ComposeReport, ComposeError> {
        let mut report = ComposeReport::new(output);

        let input_sheet = require_mut(template, input, SheetRole::Input)?;
        let source = data.first_sheet().ok_or_else(|| {
            ComposeError::MalformedWorkbook("data workbook has no sheets".to_string())
        })?;
        report.cells_cleared = clear_cells(input_sheet);
        report.transplant = Some(transplant(
            source,
            input_sheet,
            self.options.transplant_mode,
        ));

        let output_sheet = require_mut(template, output, SheetRole::Output)?;
        let prior = output_sheet.view;
        self.finish_sheet(output_sheet, &prior, &mut report);
        report.sheets_removed = prune_except(template, output)?;
        Ok(report)
    }

    fn finish_sheet(&self, sheet: &mut Sheet, prior: &SheetView, report: &mut ComposeReport) {
        report.flatten = flatten(sheet);
        if report.has_defaulted_formulas() {
            tracing::warn!(
                sheet = sheet.name(),
                count = report.flatten.defaulted.len(),
                "formulas without cached results were written as 0"
            );
        }
        if self.options.normalize_text {
            report.normalized = normalize(sheet);
        }
        preserve_view(sheet, prior, &self.options.view);
    }

    fn resolve_template(&self, source: TemplateSource) -> Result<Vec<u8>, ComposeError> {
        match source {
            TemplateSource::Bytes(bytes) => Ok(bytes),
            TemplateSource::Named(id) => self
                .catalog
                .as_ref()
                .and_then(|catalog| catalog.load(&id))
                .ok_or(ComposeError::TemplateNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::find;
    use crate::model::{Cell, CellType, CellValue};

    fn template() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_sheet("Input").unwrap().set_value(3, 2, "stale").unwrap();
        let output = wb.add_sheet("Output").unwrap();
        output
            .set_cell(1, 1, Cell::formula("=Input!A1*2", Some(CellValue::Number(20.0))))
            .unwrap();
        output.set_value(2, 1, "Café").unwrap();
        wb.add_sheet("Lookup").unwrap();
        wb
    }

    fn data() -> Workbook {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet("whatever").unwrap();
        sheet.set_value(1, 1, 5.0).unwrap();
        sheet.set_value(3, 2, "X").unwrap();
        wb
    }

    #[test]
    fn merge_keeps_only_flattened_output() {
        let composer = Composer::default();
        let mut tpl = template();
        let report = composer
            .merge_workbooks(&mut tpl, &data(), "Input", "Output")
            .expect("merge");

        assert_eq!(tpl.sheet_names(), vec!["Output".to_string()]);
        let out = find(&tpl, "Output").unwrap();
        let a1 = out.cell(1, 1).unwrap();
        assert_eq!(a1.cell_type(), CellType::Number);
        // Stale cache: nothing is recomputed from the new input.
        assert_eq!(a1.value, CellValue::Number(20.0));
        assert_eq!(out.value(2, 1), Some(&CellValue::Text("Caf".into())));

        assert_eq!(report.sheet, "Output");
        assert_eq!(report.cells_cleared, 1);
        assert_eq!(report.transplant.map(|t| t.cells_written), Some(2));
        assert_eq!(report.flatten.flattened, 1);
        assert_eq!(report.normalized, 1);
        assert_eq!(report.sheets_removed, 2);
    }

    #[test]
    fn merge_overwrites_input_coordinates() {
        let composer = Composer::default();
        let mut tpl = template();
        // Keep the input sheet around to inspect it.
        composer
            .merge_workbooks(&mut tpl, &data(), "Input", "Input")
            .expect("merge");
        let input = find(&tpl, "Input").unwrap();
        assert_eq!(input.value(3, 2), Some(&CellValue::Text("X".into())));
        assert_eq!(input.value(1, 1), Some(&CellValue::Number(5.0)));
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn merge_without_output_fails() {
        let composer = Composer::default();
        let mut tpl = Workbook::new();
        tpl.add_sheet("Input").unwrap();
        match composer.merge_workbooks(&mut tpl, &data(), "Input", "Output") {
            Err(ComposeError::SheetNotFound { role, name }) => {
                assert_eq!(role, SheetRole::Output);
                assert_eq!(name, "Output");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn merge_without_input_fails() {
        let composer = Composer::default();
        let mut tpl = Workbook::new();
        tpl.add_sheet("Output").unwrap();
        let err = composer
            .merge_workbooks(&mut tpl, &data(), "Input", "Output")
            .unwrap_err();
        assert!(matches!(
            err,
            ComposeError::SheetNotFound {
                role: SheetRole::Input,
                ..
            }
        ));
    }

    #[test]
    fn extract_keeps_target_only() {
        let composer = Composer::new(ComposeOptions {
            normalize_text: false,
            ..ComposeOptions::default()
        });
        let mut wb = template();
        let report = composer.extract_workbook(&mut wb, "Output").unwrap();
        assert_eq!(report.sheets_removed, 2);
        let out = find(&wb, "Output").unwrap();
        assert_eq!(out.value(2, 1), Some(&CellValue::Text("Café".into())));
        assert_eq!(out.value(1, 1), Some(&CellValue::Number(20.0)));
    }

    #[test]
    fn extract_missing_target_fails_before_pruning() {
        let composer = Composer::default();
        let mut wb = template();
        let err = composer.extract_workbook(&mut wb, "Summary").unwrap_err();
        assert!(matches!(
            err,
            ComposeError::SheetNotFound {
                role: SheetRole::Target,
                ..
            }
        ));
    }

    #[test]
    fn gridline_override_applies_to_kept_sheet() {
        let composer = Composer::new(ComposeOptions::legacy());
        let mut wb = template();
        composer.extract_workbook(&mut wb, "Output").unwrap();
        assert_eq!(
            find(&wb, "Output").unwrap().view.show_grid_lines,
            Some(false)
        );
    }

    #[test]
    fn report_serializes_defaulted_coordinates() {
        let composer = Composer::default();
        let mut wb = Workbook::new();
        wb.add_sheet("Calc")
            .unwrap()
            .set_cell(2, 3, Cell::formula("=SUM(A1:A2)", None))
            .unwrap();
        let report = composer.extract_workbook(&mut wb, "Calc").unwrap();
        assert!(report.has_defaulted_formulas());

        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["sheet"], "Calc");
        assert_eq!(json["flatten"]["defaulted"], serde_json::json!([[2, 3]]));
        assert_eq!(json["transplant"], serde_json::Value::Null);
    }

    #[test]
    fn named_template_without_catalog_is_not_found() {
        let composer = Composer::default();
        let request = MergeRequest::new(TemplateSource::Named("q3.xlsx".into()), Vec::new());
        match composer.merge(request) {
            Err(ComposeError::TemplateNotFound(id)) => assert_eq!(id, "q3.xlsx"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
