use std::fmt;

/// Which part of a pipeline asked for a sheet. Carried by
/// [`ComposeError::SheetNotFound`] so callers can tell a missing `Input`
/// apart from a missing `Output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetRole {
    /// The single sheet kept by an extract request.
    Target,
    /// The template sheet overwritten with data.
    Input,
    /// The template sheet whose results are kept.
    Output,
}

impl fmt::Display for SheetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Target => "target",
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("malformed workbook: {0}")]
    MalformedWorkbook(String),

    #[error("{role} sheet `{name}` not found")]
    SheetNotFound { role: SheetRole, name: String },

    #[error("no sheets left after pruning to `{survivor}`")]
    EmptyResultAfterPrune { survivor: String },

    #[error("failed to serialize workbook: {0}")]
    SerializationFailure(String),

    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    #[error("sheet `{0}` already exists")]
    DuplicateSheet(String),

    #[error("invalid cell coordinate (row {row}, col {col}); rows and columns are 1-based")]
    InvalidCoordinate { row: u32, col: u32 },
}

impl ComposeError {
    pub(crate) fn sheet_not_found(role: SheetRole, name: &str) -> Self {
        Self::SheetNotFound {
            role,
            name: name.to_string(),
        }
    }
}

/// Render a 1-based column index as its A1 letters (`1 -> A`, `28 -> AB`).
pub fn col_to_a1(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}
