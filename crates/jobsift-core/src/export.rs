//! Tabular export of listings (XLSX / CSV / TSV).
//!
//! One listing becomes one row under human-readable headers. CSV files
//! start with a UTF-8 BOM so spreadsheet applications detect the encoding
//! of Cyrillic text. Workbooks get a bold header row and columns sized to
//! their content, capped at [`MAX_COLUMN_WIDTH`].

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::AppError;
use crate::models::Listing;
use crate::salary::SalaryRange;

/// Description is cut to this many characters in exports.
pub const EXPORT_DESCRIPTION_CHARS: usize = 200;

const HEADERS: [&str; 10] = [
    "Title",
    "Company",
    "Salary",
    "Salary min",
    "Salary max",
    "City",
    "Experience",
    "Published",
    "URL",
    "Description",
];

/// Salary min / max are written as numbers in workbooks.
const NUMERIC_COLUMNS: [usize; 2] = [3, 4];

/// Widest a workbook column gets, in characters.
pub const MAX_COLUMN_WIDTH: usize = 50;

const SHEET_NAME: &str = "Vacancies";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Tsv => "text/tab-separated-values; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            ExportFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(format!("Unknown export format: {other}")),
        }
    }
}

/// Write listings (with a header row) to `writer` in the given format.
pub fn write_listings<W: Write>(
    mut writer: W,
    listings: &[Listing],
    format: ExportFormat,
) -> Result<(), AppError> {
    if format == ExportFormat::Xlsx {
        let bytes = workbook(listings).map_err(|e| AppError::ExportError(e.to_string()))?;
        writer
            .write_all(&bytes)
            .and_then(|_| writer.flush())
            .map_err(|e| AppError::ExportError(e.to_string()))?;
        return Ok(());
    }

    if format == ExportFormat::Csv {
        writer
            .write_all(UTF8_BOM)
            .map_err(|e| AppError::ExportError(e.to_string()))?;
    }

    let mut csv = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    csv.write_record(HEADERS)
        .map_err(|e| AppError::ExportError(e.to_string()))?;

    for listing in listings {
        csv.write_record(row(listing))
            .map_err(|e| AppError::ExportError(e.to_string()))?;
    }

    csv.flush()
        .map_err(|e| AppError::ExportError(e.to_string()))?;
    Ok(())
}

/// Render listings into an in-memory buffer.
pub fn to_bytes(listings: &[Listing], format: ExportFormat) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    write_listings(&mut buf, listings, format)?;
    Ok(buf)
}

/// Write an export file into `dir`, creating it if needed.
///
/// The file is named `{stem}.{ext}`, or `vacancies_{timestamp}.{ext}` when
/// no stem is given. Returns `None` without touching the disk when there
/// is nothing to export.
pub fn export_to_dir(
    dir: &Path,
    listings: &[Listing],
    format: ExportFormat,
    stem: Option<&str>,
) -> Result<Option<PathBuf>, AppError> {
    if listings.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::ExportError(format!("Failed to create {}: {e}", dir.display()))
    })?;

    let stem = stem
        .map(sanitize_stem)
        .unwrap_or_else(|| format!("vacancies_{}", Local::now().format("%Y%m%d_%H%M%S")));
    let path = dir.join(format!("{stem}.{}", format.extension()));

    let file = std::fs::File::create(&path).map_err(|e| {
        AppError::ExportError(format!("Failed to create {}: {e}", path.display()))
    })?;
    write_listings(std::io::BufWriter::new(file), listings, format)?;

    tracing::info!(path = %path.display(), rows = listings.len(), "Export written");
    Ok(Some(path))
}

/// Download-friendly file name for a search export.
pub fn export_file_name(query: &str, format: ExportFormat) -> String {
    format!(
        "vacancies_{}_{}.{}",
        sanitize_stem(query),
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

fn workbook(listings: &[Listing]) -> Result<Vec<u8>, XlsxError> {
    let rows: Vec<[String; 10]> = listings.iter().map(row).collect();
    let widths = column_widths(&rows);
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (index, cells) in rows.iter().enumerate() {
        let line = index as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(number) if NUMERIC_COLUMNS.contains(&col) => {
                    sheet.write_number(line, col as u16, number)?;
                }
                _ => {
                    sheet.write_string(line, col as u16, cell.as_str())?;
                }
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width as f64)?;
    }

    workbook.save_to_buffer()
}

/// Longest cell of each column (header included) plus padding, capped.
fn column_widths(rows: &[[String; 10]]) -> [usize; 10] {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths.map(|w| (w + 2).min(MAX_COLUMN_WIDTH))
}

fn row(listing: &Listing) -> [String; 10] {
    let range = SalaryRange::parse(&listing.salary);
    [
        listing.title.clone(),
        listing.company.clone(),
        listing.salary.clone(),
        range.min.map(|v| v.to_string()).unwrap_or_default(),
        range.max.map(|v| v.to_string()).unwrap_or_default(),
        listing.city.clone(),
        listing.experience.clone(),
        listing.published_at.format("%d.%m.%Y").to_string(),
        listing.url.clone(),
        truncate_description(&listing.description),
    ]
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() > EXPORT_DESCRIPTION_CHARS {
        let cut: String = description.chars().take(EXPORT_DESCRIPTION_CHARS).collect();
        format!("{cut}...")
    } else {
        description.to_string()
    }
}

fn sanitize_stem(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "vacancies".to_string()
    } else {
        cleaned
    }
}
