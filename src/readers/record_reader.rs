use crate::error::{ProcessingError, Result};
use crate::models::ObservationRecord;
use chrono::NaiveDate;
use std::io::BufRead;

/// Parse one GHCN-Daily by-year line:
/// `ID,YYYYMMDD,ELEMENT,VALUE,MFLAG,QFLAG,SFLAG,OBSTIME`
///
/// Blank lines, header lines and lines with fewer than four columns yield `None`.
pub fn parse_record_line(line: &str) -> Result<Option<ObservationRecord>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
    if parts.len() < 4 {
        return Ok(None); // Skip malformed lines
    }
    if parts[0].eq_ignore_ascii_case("ID") {
        return Ok(None); // Header
    }

    if parts[1].len() != 8 || !parts[1].bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProcessingError::InvalidFormat(format!(
            "Invalid date: '{}'",
            parts[1]
        )));
    }
    let date = NaiveDate::parse_from_str(parts[1], "%Y%m%d")?;

    let value = parts[3].parse::<i64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid value: '{}'", parts[3]))
    })?;

    let quality_flag = parts.get(5).and_then(|q| q.chars().next());

    Ok(Some(
        ObservationRecord::new(parts[0].to_uppercase(), date, parts[2], value)
            .with_quality_flag(quality_flag),
    ))
}

/// Streams observation records from a by-year archive without holding the
/// whole file in memory.
pub struct RecordIterator<R: BufRead> {
    reader: R,
    line: String,
    line_number: usize,
}

impl<R: BufRead> RecordIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for RecordIterator<R> {
    type Item = Result<ObservationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();

            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_number += 1;

                    match parse_record_line(&self.line) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(e) => {
                            return Some(Err(ProcessingError::InvalidFormat(format!(
                                "line {}: {}",
                                self.line_number, e
                            ))))
                        }
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
