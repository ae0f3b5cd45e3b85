use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::{ReaderBuilder, Trim};
use lopdf::Document;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::table::{Table, DATETIME_DISPLAY_FORMAT};

pub type WorkbookLoader = fn(&Path) -> EngineResult<Workbook>;
pub type DocumentLoader = fn(&Path) -> EngineResult<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Excel,
    Pdf,
    Text,
}

const EXTENSIONS: [(&str, SourceFormat); 7] = [
    ("csv", SourceFormat::Csv),
    ("xlsx", SourceFormat::Excel),
    ("xls", SourceFormat::Excel),
    ("ods", SourceFormat::Excel),
    ("pdf", SourceFormat::Pdf),
    ("txt", SourceFormat::Text),
    ("md", SourceFormat::Text),
];

impl SourceFormat {
    pub fn from_path(path: &Path) -> EngineResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        EXTENSIONS
            .iter()
            .find(|(candidate, _)| *candidate == extension)
            .map(|(_, format)| *format)
            .ok_or_else(|| EngineError::UnsupportedFormat(path.display().to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Excel => "spreadsheet",
            SourceFormat::Pdf => "PDF",
            SourceFormat::Text => "text",
        }
    }

    pub fn workbook_loader(self) -> Option<WorkbookLoader> {
        match self {
            SourceFormat::Csv => Some(read_csv),
            SourceFormat::Excel => Some(read_spreadsheet),
            SourceFormat::Pdf | SourceFormat::Text => None,
        }
    }

    pub fn document_loader(self) -> Option<DocumentLoader> {
        match self {
            SourceFormat::Pdf => Some(read_pdf),
            SourceFormat::Text => Some(read_text),
            SourceFormat::Csv | SourceFormat::Excel => None,
        }
    }
}

/// Named sheets in source order. A CSV file is a one-sheet workbook.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<(String, Table)>,
}

impl Workbook {
    pub fn new(sheets: Vec<(String, Table)>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> EngineResult<&Table> {
        self.sheets
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, table)| table)
            .ok_or_else(|| EngineError::MissingSheet(name.to_string()))
    }

    /// Take the named sheet, or the first one when no name is given.
    pub fn into_sheet(self, name: Option<&str>) -> EngineResult<Table> {
        let wanted = name.map(str::to_string);
        let mut sheets = self.sheets.into_iter();
        match wanted {
            Some(wanted) => sheets
                .find(|(candidate, _)| *candidate == wanted)
                .map(|(_, table)| table)
                .ok_or(EngineError::MissingSheet(wanted)),
            None => sheets
                .next()
                .map(|(_, table)| table)
                .ok_or_else(|| EngineError::MissingSheet("<first sheet>".to_string())),
        }
    }
}

pub fn load_workbook(path: &Path) -> EngineResult<Workbook> {
    let format = SourceFormat::from_path(path)?;
    let loader = format.workbook_loader().ok_or(EngineError::WrongSourceKind {
        format: format.name(),
        wanted: "table",
    })?;
    let workbook = loader(path)?;
    info!(
        path = %path.display(),
        sheets = workbook.sheets.len(),
        "loaded workbook"
    );
    Ok(workbook)
}

pub fn load_table(path: &Path, sheet: Option<&str>) -> EngineResult<Table> {
    load_workbook(path)?.into_sheet(sheet)
}

/// Extracted document text, pages joined by newlines.
pub fn load_document(path: &Path) -> EngineResult<String> {
    let format = SourceFormat::from_path(path)?;
    let loader = format.document_loader().ok_or(EngineError::WrongSourceKind {
        format: format.name(),
        wanted: "document",
    })?;
    let text = loader(path)?;
    info!(path = %path.display(), chars = text.len(), "loaded document");
    Ok(text)
}

pub fn parse_csv(content: &str) -> EngineResult<Table> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| EngineError::read_failure(Path::new("<csv>"), err))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|err| {
            EngineError::read_failure(Path::new("<csv>"), format!("row {}: {}", index + 1, err))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

fn read_csv(path: &Path) -> EngineResult<Workbook> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let table = parse_csv(&content).map_err(|err| match err {
        EngineError::Source { message, .. } => EngineError::read_failure(path, message),
        other => other,
    })?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Sheet1")
        .to_string();
    Ok(Workbook::new(vec![(name, table)]))
}

fn read_spreadsheet(path: &Path) -> EngineResult<Workbook> {
    let mut workbook = open_workbook_auto(path).map_err(|err| EngineError::read_failure(path, err))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|err| EngineError::read_failure(path, format!("sheet {name}: {err}")))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
        let headers = rows.next().unwrap_or_default();
        let table = Table::from_rows(headers, rows.collect());
        sheets.push((name, table));
    }

    Ok(Workbook::new(sheets))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(value) => value.trim().to_string(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|value| value.format(DATETIME_DISPLAY_FORMAT).to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
    }
}

fn read_pdf(path: &Path) -> EngineResult<String> {
    let document = Document::load(path).map_err(|err| EngineError::read_failure(path, err))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(err) => warn!(page = page_number, error = %err, "skipping unreadable PDF page"),
        }
    }

    Ok(pages.join("\n"))
}

fn read_text(path: &Path) -> EngineResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
