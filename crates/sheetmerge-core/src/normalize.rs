use crate::model::{CellValue, Sheet};
use std::borrow::Cow;

/// Delete every character outside 7-bit ASCII. No transliteration is
/// attempted: `"Café"` becomes `"Caf"`.
pub fn strip_non_ascii(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(char::is_ascii).collect())
    }
}

/// Rewrite text cells containing non-ASCII characters. Returns the number of
/// cells changed. Formula expressions, numbers, booleans and dates are never
/// touched.
pub fn normalize(sheet: &mut Sheet) -> usize {
    let mut rewritten = 0;
    for (_, cell) in sheet.cells_mut() {
        let CellValue::Text(text) = &mut cell.value else {
            continue;
        };
        let stripped = match strip_non_ascii(text) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(stripped) => stripped,
        };
        *text = stripped;
        rewritten += 1;
    }
    if rewritten > 0 {
        tracing::debug!(sheet = sheet.name(), cells = rewritten, "stripped non-ascii text");
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Workbook};

    #[test]
    fn strips_rather_than_substitutes() {
        assert_eq!(strip_non_ascii("Café 100%"), "Caf 100%");
        assert_eq!(strip_non_ascii("naïve — “quoted”"), "nave  quoted");
        assert_eq!(strip_non_ascii("日本"), "");
    }

    #[test]
    fn ascii_input_is_borrowed() {
        assert!(matches!(strip_non_ascii("Hello"), Cow::Borrowed("Hello")));
        assert!(matches!(strip_non_ascii("tab\there\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn only_text_values_are_rewritten() {
        let mut wb = Workbook::new();
        let sheet = wb.add_sheet("Out").unwrap();
        sheet.set_value(1, 1, "Café 100%").unwrap();
        sheet.set_value(1, 2, "Hello").unwrap();
        sheet.set_value(1, 3, 2.5).unwrap();
        sheet
            .set_cell(1, 4, Cell::formula("=\"é\"", Some("é".into())))
            .unwrap();

        assert_eq!(normalize(sheet), 1);
        assert_eq!(sheet.value(1, 1), Some(&CellValue::Text("Caf 100%".into())));
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Text("Hello".into())));
        assert_eq!(sheet.value(1, 3), Some(&CellValue::Number(2.5)));
        assert_eq!(sheet.value(1, 4), Some(&CellValue::Formula("=\"é\"".into())));
    }
}
