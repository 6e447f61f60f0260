// ABOUTME: CSV decoding and row grouping for todo imports
// ABOUTME: Turns the flat row stream into ordered todo groups with their subtasks

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use tasklane_core::{validate_title, Status};

use crate::error::{ImportError, ImportResult};

/// One data row. The legacy two-column layout leaves the subtask fields empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    pub line: u64,
    pub title: String,
    pub status: String,
    pub subtask_title: String,
    pub subtask_status: String,
}

impl CsvRow {
    pub fn new(title: &str, status: &str, subtask_title: &str, subtask_status: &str) -> Self {
        Self {
            line: 0,
            title: title.to_string(),
            status: status.to_string(),
            subtask_title: subtask_title.to_string(),
            subtask_status: subtask_status.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubTask {
    pub title: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoGroup {
    pub title: String,
    pub status: Status,
    pub subtasks: Vec<ParsedSubTask>,
}

/// Decode `title,status[,subtask_title,subtask_status]` rows, skipping the header
pub fn read_rows<R: Read>(reader: R) -> ImportResult<Vec<CsvRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();

        match record.len() {
            2 | 4 => rows.push(CsvRow {
                line,
                title: field(0),
                status: field(1),
                subtask_title: field(2),
                subtask_status: field(3),
            }),
            n => {
                return Err(ImportError::parse(
                    line,
                    format!("expected 2 or 4 columns, found {n}"),
                ))
            }
        }
    }
    Ok(rows)
}

/// Group rows positionally: a titled row opens a todo, an untitled row adds a
/// subtask to the most recent todo.
pub fn group_rows(rows: Vec<CsvRow>) -> ImportResult<Vec<TodoGroup>> {
    let mut groups: Vec<TodoGroup> = Vec::new();

    for row in rows {
        if !row.title.is_empty() {
            let mut group = TodoGroup {
                title: checked_title(row.line, row.title)?,
                status: parse_status(row.line, &row.status)?,
                subtasks: Vec::new(),
            };
            if !row.subtask_title.is_empty() {
                group.subtasks.push(parse_subtask(row.line, row.subtask_title, &row.subtask_status)?);
            }
            groups.push(group);
        } else {
            let subtask = parse_subtask(row.line, row.subtask_title, &row.subtask_status)?;
            match groups.last_mut() {
                Some(group) => group.subtasks.push(subtask),
                None => {
                    return Err(ImportError::parse(
                        row.line,
                        "subtask row appears before any todo row",
                    ))
                }
            }
        }
    }

    Ok(groups)
}

fn parse_subtask(line: u64, title: String, status: &str) -> ImportResult<ParsedSubTask> {
    Ok(ParsedSubTask {
        title: checked_title(line, title)?,
        status: parse_status(line, status)?,
    })
}

fn checked_title(line: u64, title: String) -> ImportResult<String> {
    validate_title(&title).map_err(|e| ImportError::parse(line, e.to_string()))?;
    Ok(title)
}

fn parse_status(line: u64, value: &str) -> ImportResult<Status> {
    value
        .parse::<Status>()
        .map_err(|e| ImportError::parse(line, e.to_string()))
}
