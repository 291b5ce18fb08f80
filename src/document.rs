use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to execute {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} returned non-zero exit status for {}: {stderr}", path.display())]
    ToolFailed {
        program: String,
        path: PathBuf,
        stderr: String,
    },

    #[error("unsupported document type: {}", path.display())]
    Unsupported { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTable {
    pub page: u32,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    pub source: String,
    pub pages: Vec<PageText>,
    pub tables: Vec<PageTable>,
}

impl DocumentText {
    /// Page texts with each page's tables appended as ` | `-joined rows.
    /// Rows already present on the page as pipe-delimited lines are not repeated.
    pub fn pages_with_tables(&self) -> Vec<PageText> {
        self.pages
            .iter()
            .map(|page| {
                let existing = page
                    .text
                    .lines()
                    .map(|line| split_pipe_cells(line).join(" | "))
                    .filter(|row| !row.is_empty())
                    .collect::<HashSet<String>>();

                let mut text = page.text.clone();
                for table in self.tables.iter().filter(|table| table.page == page.page) {
                    for row in &table.rows {
                        let joined = row.join(" | ");
                        if existing.contains(&joined) {
                            continue;
                        }
                        text.push('\n');
                        text.push_str(&joined);
                    }
                }
                PageText {
                    page: page.page,
                    text,
                }
            })
            .collect()
    }
}

pub trait DocumentReader: Send + Sync {
    fn read(&self, path: &Path, with_tables: bool) -> Result<DocumentText, DocumentError>;
}

pub fn reader_for(path: &Path) -> Result<Box<dyn DocumentReader>, DocumentError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => Ok(Box::new(PdftotextReader::default())),
        Some("txt") => Ok(Box::new(PlainTextReader)),
        _ => Err(DocumentError::Unsupported {
            path: path.to_path_buf(),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct PdftotextReader {
    program: String,
}

impl Default for PdftotextReader {
    fn default() -> Self {
        Self {
            program: "pdftotext".to_string(),
        }
    }
}

impl PdftotextReader {
    fn run(&self, path: &Path, extra_args: &[String]) -> Result<String, DocumentError> {
        let output = Command::new(&self.program)
            .arg("-enc")
            .arg("UTF-8")
            .args(extra_args)
            .arg(path)
            .arg("-")
            .output()
            .map_err(|source| DocumentError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocumentError::ToolFailed {
                program: self.program.clone(),
                path: path.to_path_buf(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn layout_page(&self, path: &Path, page: u32) -> Result<String, DocumentError> {
        let page = page.to_string();
        self.run(
            path,
            &[
                "-layout".to_string(),
                "-f".to_string(),
                page.clone(),
                "-l".to_string(),
                page,
            ],
        )
    }

    fn extract_tables(&self, path: &Path, pages: &[PageText]) -> Vec<PageTable> {
        let mut tables = Vec::new();
        for page in pages {
            match self.layout_page(path, page.page) {
                Ok(layout) => tables.extend(tables_from_lines(
                    page.page,
                    &layout,
                    split_layout_cells,
                )),
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        page = page.page,
                        error = %error,
                        "table extraction failed; page contributes no tables"
                    );
                }
            }
        }
        tables
    }
}

impl DocumentReader for PdftotextReader {
    fn read(&self, path: &Path, with_tables: bool) -> Result<DocumentText, DocumentError> {
        if !path.is_file() {
            return Err(DocumentError::Missing {
                path: path.to_path_buf(),
            });
        }

        let raw = self.run(path, &["-f".to_string(), "1".to_string()])?;
        let pages = split_pages(&raw);
        let tables = if with_tables {
            self.extract_tables(path, &pages)
        } else {
            Vec::new()
        };

        debug!(
            path = %path.display(),
            pages = pages.len(),
            tables = tables.len(),
            "extracted pdf text layer"
        );

        Ok(DocumentText {
            source: path.display().to_string(),
            pages,
            tables,
        })
    }
}

/// Plain-text documents with form-feed page breaks and pipe-delimited table rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn read(&self, path: &Path, with_tables: bool) -> Result<DocumentText, DocumentError> {
        if !path.is_file() {
            return Err(DocumentError::Missing {
                path: path.to_path_buf(),
            });
        }

        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let pages = split_pages(&raw);
        let tables = if with_tables {
            pages
                .iter()
                .flat_map(|page| tables_from_lines(page.page, &page.text, split_pipe_cells))
                .collect()
        } else {
            Vec::new()
        };

        Ok(DocumentText {
            source: path.display().to_string(),
            pages,
            tables,
        })
    }
}

fn split_pages(raw: &str) -> Vec<PageText> {
    let mut chunks: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = chunks.last() {
        if last_page.trim().is_empty() {
            chunks.pop();
            continue;
        }
        break;
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, text)| PageText {
            page: (index + 1) as u32,
            text,
        })
        .collect()
}

/// Groups consecutive lines with at least two cells into tables of two or more rows.
fn tables_from_lines(page: u32, text: &str, split: fn(&str) -> Vec<String>) -> Vec<PageTable> {
    let mut tables = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut flush = |rows: &mut Vec<Vec<String>>| {
        if rows.len() >= 2 {
            tables.push(PageTable {
                page,
                rows: std::mem::take(rows),
            });
        } else {
            rows.clear();
        }
    };

    for line in text.lines() {
        let cells = split(line);
        if cells.len() >= 2 {
            rows.push(cells);
        } else {
            flush(&mut rows);
        }
    }
    flush(&mut rows);

    tables
}

fn split_layout_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut pending_spaces = 0usize;

    for character in line.trim().chars() {
        match character {
            '\t' => {
                push_cell(&mut cells, &mut current);
                pending_spaces = 0;
            }
            ' ' => pending_spaces += 1,
            _ => {
                if pending_spaces >= 2 {
                    push_cell(&mut cells, &mut current);
                } else if pending_spaces == 1 {
                    current.push(' ');
                }
                pending_spaces = 0;
                current.push(character);
            }
        }
    }
    push_cell(&mut cells, &mut current);

    cells
}

fn split_pipe_cells(line: &str) -> Vec<String> {
    if !line.contains('|') {
        return Vec::new();
    }

    line.trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn push_cell(cells: &mut Vec<String>, current: &mut String) {
    let cell = current.trim();
    if !cell.is_empty() {
        cells.push(cell.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn split_pages_numbers_from_one_and_drops_trailing_blank_pages() {
        let pages = split_pages("first page\u{000C}second\u{0000} page\u{000C}  \n\u{000C}");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[1].page, 2);
        assert_eq!(pages[1].text, "second page");
    }

    #[test]
    fn split_layout_cells_breaks_on_tabs_and_wide_gaps() {
        let cells = split_layout_cells("  Medical expenses whilst overseas    SGD 100,000\tper trip ");
        assert_eq!(
            cells,
            vec!["Medical expenses whilst overseas", "SGD 100,000", "per trip"]
        );
    }

    #[test]
    fn tables_from_lines_requires_two_multi_cell_rows() {
        let layout = "Schedule of Benefits\n\
                      Section     Benefit            Limit\n\
                      1           Medical expenses   SGD 100,000\n\
                      \n\
                      Lonely    row\n";
        let tables = tables_from_lines(4, layout, split_layout_cells);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 4);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[1], vec!["1", "Medical expenses", "SGD 100,000"]);
    }

    #[test]
    fn pages_with_tables_appends_rows_to_their_page() {
        let document = DocumentText {
            source: "policy.txt".to_string(),
            pages: vec![
                PageText {
                    page: 1,
                    text: "intro".to_string(),
                },
                PageText {
                    page: 2,
                    text: "schedule".to_string(),
                },
            ],
            tables: vec![PageTable {
                page: 2,
                rows: vec![
                    vec!["Benefit".to_string(), "Limit".to_string()],
                    vec!["Medical".to_string(), "SGD 50,000".to_string()],
                ],
            }],
        };

        let pages = document.pages_with_tables();
        assert_eq!(pages[0].text, "intro");
        assert_eq!(pages[1].text, "schedule\nBenefit | Limit\nMedical | SGD 50,000");
    }

    #[test]
    fn plain_text_reader_splits_pages_and_pipe_tables() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file should be created");
        write!(
            file,
            "Policy wording\u{000C}Plan | Classic | Elite\nMedical | SGD 100,000 | SGD 250,000\n"
        )
        .expect("temp file should be writable");

        let reader = reader_for(file.path()).expect("txt should be supported");
        let document = reader.read(file.path(), true).expect("document should read");

        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.tables.len(), 1);
        assert_eq!(document.tables[0].page, 2);
        assert_eq!(document.tables[0].rows[1][2], "SGD 250,000");
    }

    #[test]
    fn pipe_rows_already_in_page_text_are_not_appended_twice() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file should be created");
        write!(file, "Plan | Classic\nMedical | SGD 100,000\n").expect("temp file should be writable");

        let document = PlainTextReader
            .read(file.path(), true)
            .expect("document should read");
        let pages = document.pages_with_tables();

        assert_eq!(document.tables.len(), 1);
        assert_eq!(pages[0].text, "Plan | Classic\nMedical | SGD 100,000\n");
        assert_eq!(pages[0].text.matches("SGD 100,000").count(), 1);
    }

    #[test]
    fn table_failure_on_a_page_is_swallowed() {
        let reader = PdftotextReader {
            program: "/nonexistent/pdftotext".to_string(),
        };
        let pages = vec![
            PageText {
                page: 1,
                text: "intro".to_string(),
            },
            PageText {
                page: 2,
                text: "schedule".to_string(),
            },
        ];

        let tables = reader.extract_tables(Path::new("policy.pdf"), &pages);
        assert!(tables.is_empty());
    }

    #[test]
    fn missing_and_unsupported_documents_are_hard_failures() {
        let missing = PlainTextReader.read(Path::new("/nonexistent/policy.txt"), false);
        assert!(matches!(missing, Err(DocumentError::Missing { .. })));

        let unsupported = reader_for(Path::new("policy.docx"));
        assert!(matches!(unsupported, Err(DocumentError::Unsupported { .. })));
    }
}
