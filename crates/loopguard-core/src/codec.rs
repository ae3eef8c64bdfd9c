//! Line codec for the history store.
//!
//! Each record is one line: `timestamp|category|name|duplicate_key|status`.
//! Fields are not escaped; callers never pass a `|` inside a field.

use crate::{
  Error, Result,
  record::{HistoryRecord, Status, StoreLine},
};

pub const DELIMITER: char = '|';

const FIELD_COUNT: usize = 5;

/// Encode a record as a single terminated line.
pub fn encode(record: &HistoryRecord) -> String {
  format!(
    "{ts}{d}{cat}{d}{name}{d}{key}{d}{status}\n",
    ts = record.timestamp,
    cat = record.category,
    name = record.name,
    key = record.duplicate_key,
    status = record.status,
    d = DELIMITER,
  )
}

/// Decode one line (with or without its terminator).
///
/// Fields after the fifth are ignored.
pub fn decode(line: &str) -> Result<HistoryRecord> {
  let line = strip_terminator(line);
  let parts: Vec<&str> = line.split(DELIMITER).collect();
  if parts.len() < FIELD_COUNT {
    return Err(Error::FieldCount(parts.len()));
  }

  let timestamp = parts[0]
    .trim()
    .parse::<i64>()
    .map_err(|_| Error::Timestamp(parts[0].to_owned()))?;

  Ok(HistoryRecord {
    timestamp,
    category:      parts[1].to_owned(),
    name:          parts[2].to_owned(),
    duplicate_key: parts[3].to_owned(),
    status:        Status::from(parts[4].trim()),
  })
}

/// Classify a raw line, keeping its text as-is.
pub fn parse_line(line: &str) -> StoreLine {
  match decode(line) {
    Ok(record) => StoreLine::Record { record, raw: Some(line.to_owned()) },
    Err(_) => StoreLine::Malformed(line.to_owned()),
  }
}

/// Split a whole store file into lines, each keeping its own terminator. A
/// trailing newline does not produce an extra empty line.
pub fn parse_store(contents: &str) -> Vec<StoreLine> {
  contents.split_inclusive('\n').map(parse_line).collect()
}

/// Render lines back to file contents.
///
/// Lines read from disk are written exactly as read; only records without
/// raw text are encoded. Every line ends up terminated.
pub fn render_store(lines: &[StoreLine]) -> String {
  let mut out = String::new();
  for line in lines {
    match line {
      StoreLine::Record { raw: Some(raw), .. } | StoreLine::Malformed(raw) => {
        out.push_str(raw);
        if !raw.ends_with('\n') {
          out.push('\n');
        }
      }
      StoreLine::Record { record, raw: None } => out.push_str(&encode(record)),
    }
  }
  out
}

fn strip_terminator(line: &str) -> &str {
  line
    .strip_suffix('\n')
    .map(|l| l.strip_suffix('\r').unwrap_or(l))
    .unwrap_or(line)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> HistoryRecord {
    HistoryRecord {
      timestamp:     1_700_000_000,
      category:      "movies".into(),
      name:          "Some Film (2021) 1080p".into(),
      duplicate_key: "some film 2021".into(),
      status:        Status::Pending,
    }
  }

  #[test]
  fn encode_layout() {
    assert_eq!(
      encode(&sample()),
      "1700000000|movies|Some Film (2021) 1080p|some film 2021|PENDING\n"
    );
  }

  #[test]
  fn decode_inverts_encode() {
    let mut records = vec![sample()];
    records.push(HistoryRecord {
      category: String::new(),
      duplicate_key: String::new(),
      status: Status::Failed,
      ..sample()
    });
    records.push(HistoryRecord { status: Status::Other("WEIRD".into()), ..sample() });

    for r in records {
      assert_eq!(decode(&encode(&r)).unwrap(), r);
    }
  }

  #[test]
  fn decode_accepts_crlf() {
    let r = decode("10|tv|Show|key|SUCCESS\r\n").unwrap();
    assert_eq!(r.status, Status::Success);
    assert_eq!(r.duplicate_key, "key");
  }

  #[test]
  fn too_few_fields_is_malformed() {
    assert!(matches!(decode("10|tv|Show|PENDING"), Err(Error::FieldCount(4))));
    assert!(matches!(decode(""), Err(Error::FieldCount(1))));
  }

  #[test]
  fn non_integer_timestamp_is_malformed() {
    assert!(matches!(decode("yesterday|tv|Show||PENDING"), Err(Error::Timestamp(_))));
  }

  #[test]
  fn extra_fields_are_ignored() {
    let r = decode("10|tv|Show|key|PENDING|trailing").unwrap();
    assert_eq!(r.status, Status::Pending);
  }

  #[test]
  fn malformed_lines_render_verbatim() {
    let contents = "garbage line\n10|tv|Show||PENDING\n";
    let lines = parse_store(contents);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], StoreLine::Malformed("garbage line\n".into()));
    assert_eq!(render_store(&lines), contents);
  }

  #[test]
  fn untouched_records_render_as_read() {
    let contents = "10|tv|Show||SUCCESS|extra\r\n 11 |tv|Other|| PENDING\n12|tv|Last||FAILED";
    let lines = parse_store(contents);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1].as_record().unwrap().timestamp, 11);
    assert_eq!(render_store(&lines), format!("{contents}\n"));
  }

  #[test]
  fn new_records_are_encoded() {
    let mut lines = parse_store("10|tv|Show||SUCCESS\r\n");
    lines.push(StoreLine::new(sample()));
    assert_eq!(
      render_store(&lines),
      "10|tv|Show||SUCCESS\r\n1700000000|movies|Some Film (2021) 1080p|some film 2021|PENDING\n"
    );
  }
}
