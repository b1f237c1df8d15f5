//! Line format of the bookmark file: `url,date_added,too_large`, one record per line.
//!
//! Fields are not escaped, so a URL containing a comma cannot be represented.

use chrono::NaiveDateTime;

use crate::domain::BookmarkRecord;

use super::StoreError;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_document(text: &str) -> Result<Vec<BookmarkRecord>, StoreError> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| {
            parse_line(line.trim()).ok_or_else(|| StoreError::Corrupt {
                line: idx + 1,
                content: line.to_string(),
            })
        })
        .collect()
}

pub fn render_document(records: &[BookmarkRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format_record(record));
        out.push('\n');
    }
    out
}

fn parse_line(line: &str) -> Option<BookmarkRecord> {
    let mut fields = line.split(',');
    let (url, date_added, too_large) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() || url.is_empty() {
        return None;
    }

    let date_added = NaiveDateTime::parse_from_str(date_added, DATE_FORMAT).ok()?;
    let too_large = match too_large {
        "true" => true,
        "false" => false,
        _ => return None,
    };

    Some(BookmarkRecord {
        url: url.to_string(),
        date_added,
        too_large,
    })
}

fn format_record(record: &BookmarkRecord) -> String {
    format!(
        "{},{},{}",
        record.url,
        record.date_added.format(DATE_FORMAT),
        record.too_large
    )
}
