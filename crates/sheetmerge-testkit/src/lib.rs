//! Fixture helpers shared by the sheetmerge test suites.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umya_spreadsheet::Spreadsheet;

/// Build a workbook with `umya_spreadsheet` and return its xlsx bytes.
///
/// The book starts with the default `Sheet1`; callers rename or add sheets as
/// needed.
pub fn build_xlsx(f: impl FnOnce(&mut Spreadsheet)) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf).expect("write fixture xlsx");
    buf.into_inner()
}

/// Like [`build_xlsx`] but with the default `Sheet1` renamed to `first`.
pub fn build_named_xlsx(first: &str, f: impl FnOnce(&mut Spreadsheet)) -> Vec<u8> {
    build_xlsx(|book| {
        book.get_sheet_by_name_mut("Sheet1")
            .expect("default sheet")
            .set_name(first);
        f(book);
    })
}

/// Parse xlsx bytes back into a `Spreadsheet` for assertions.
pub fn read_xlsx(bytes: &[u8]) -> Spreadsheet {
    let mut book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .expect("read xlsx");
    book.read_sheet_collection();
    book
}

/// Rewrite one XML part of an xlsx package in place, copying every other
/// part unchanged. Used to hand-craft packages the writer would never emit.
pub fn rewrite_part(bytes: &[u8], part: &str, edit: impl FnOnce(String) -> String) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open xlsx package");
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let mut edit = Some(edit);
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).expect("package entry");
        let name = entry.name().to_string();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).expect("read package entry");
        if name == part {
            let xml = String::from_utf8(content).expect("utf-8 part");
            let edit = edit.take().expect("part appears once");
            content = edit(xml).into_bytes();
        }
        writer.start_file(name.as_str(), options).expect("start entry");
        writer.write_all(&content).expect("write entry");
    }
    assert!(edit.is_none(), "part `{part}` not found in package");
    writer.finish().expect("finish package").into_inner()
}

/// Sheet names in workbook order.
pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection_no_check()
        .iter()
        .map(|ws| ws.get_name().to_string())
        .collect()
}

/// Temporary directory of fixture files that lives as long as the value.
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `bytes` to `name` inside the directory and return the full path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).expect("write fixture");
        path
    }
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}
