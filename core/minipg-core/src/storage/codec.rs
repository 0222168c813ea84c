//! Binary row codec.
//!
//! A schema-derived record encoding in the Avro binary style: integer
//! columns are zigzag variable-length integers, text columns are
//! length-prefixed UTF-8. Records in the row log are each followed by a
//! single 0x0A separator byte; the recorded (offset, length) of a row covers
//! the record only, never the separator.

use crate::error::{MinipgError, MinipgResult};
use crate::storage::schema::{ColumnKind, Schema};
use crate::storage::{Field, Row};

/// Byte appended after every record in the row log.
pub const ROW_SEPARATOR: u8 = 0x0A;

/// Encode one row against the schema's column order.
///
/// Int fields must parse as 32-bit decimal integers; text fields are taken
/// verbatim (quote stripping happens on ingestion).
pub fn encode_row(schema: &Schema, row: &Row) -> MinipgResult<Vec<u8>> {
    if row.len() != schema.columns.len() {
        return Err(MinipgError::ValuesIncomplete);
    }
    let mut buf = Vec::new();
    for (column, field) in schema.columns.iter().zip(row) {
        match column.kind {
            ColumnKind::Int => {
                let value: i32 = field
                    .as_str()
                    .parse()
                    .map_err(|_| MinipgError::ConvertIntFailed(field.as_str().to_string()))?;
                write_varint(&mut buf, zigzag(value as i64));
            }
            ColumnKind::Text | ColumnKind::Unknown => {
                let bytes = field.as_str().as_bytes();
                write_varint(&mut buf, zigzag(bytes.len() as i64));
                buf.extend_from_slice(bytes);
            }
        }
    }
    Ok(buf)
}

/// Decode exactly one record (without its trailing separator).
pub fn decode_row(schema: &Schema, bytes: &[u8]) -> MinipgResult<Row> {
    let mut pos = 0;
    let row = decode_record(schema, bytes, &mut pos)?;
    if pos != bytes.len() {
        return Err(MinipgError::ConvertRecordFailed(format!(
            "{} trailing bytes after record",
            bytes.len() - pos
        )));
    }
    Ok(row)
}

/// Decode a whole row log: records separated by 0x0A until the end.
pub fn decode_rows(schema: &Schema, bytes: &[u8]) -> MinipgResult<Vec<Row>> {
    let mut rows = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        rows.push(decode_record(schema, bytes, &mut pos)?);
        if bytes.get(pos) != Some(&ROW_SEPARATOR) {
            return Err(MinipgError::ConvertRecordFailed(format!(
                "missing record separator at byte {pos}"
            )));
        }
        pos += 1;
    }
    Ok(rows)
}

fn decode_record(schema: &Schema, bytes: &[u8], pos: &mut usize) -> MinipgResult<Row> {
    let mut row = Row::with_capacity(schema.columns.len());
    for column in &schema.columns {
        match column.kind {
            ColumnKind::Int => {
                let value = unzigzag(read_varint(bytes, pos)?);
                let value = i32::try_from(value).map_err(|_| {
                    MinipgError::ConvertIntFailed(format!("{value} out of 32-bit range"))
                })?;
                row.push(Field::new(&value.to_string()));
            }
            ColumnKind::Text | ColumnKind::Unknown => {
                let len = unzigzag(read_varint(bytes, pos)?);
                let len = usize::try_from(len).map_err(|_| {
                    MinipgError::ConvertTextFailed(format!("negative string length {len}"))
                })?;
                let end = pos.checked_add(len).filter(|&e| e <= bytes.len()).ok_or_else(
                    || MinipgError::ConvertTextFailed(format!("string of {len} bytes truncated")),
                )?;
                let text = std::str::from_utf8(&bytes[*pos..end])
                    .map_err(|e| MinipgError::ConvertTextFailed(e.to_string()))?;
                row.push(Field::purified(text));
                *pos = end;
            }
        }
    }
    Ok(row)
}

fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn unzigzag(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> MinipgResult<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *bytes.get(*pos).ok_or_else(|| {
            MinipgError::ConvertRecordFailed("record truncated inside varint".to_string())
        })?;
        *pos += 1;
        if shift >= 64 {
            return Err(MinipgError::ConvertRecordFailed(
                "varint longer than 64 bits".to_string(),
            ));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}
