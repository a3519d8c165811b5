//! The row transformer: one [`SourceRow`] in, one [`PostRecord`] out.
//!
//! Pure and stateless; safe to call concurrently and in any order across
//! rows. Any missing cell, invalid UTF-8, or unparseable float is a hard
//! error for that row, never a partially populated record.

use crate::error::RecordError;
use crate::record::PostRecord;
use crate::row::{
    SourceRow, FAMILY_LOCATION, FAMILY_POST, QUALIFIER_LAT, QUALIFIER_LON, QUALIFIER_MESSAGE,
    QUALIFIER_USER,
};

/// Transform one source row into the flat destination record.
///
/// The row key and the two `post` cells are decoded as UTF-8 with no
/// trimming or normalization; the two `location` cells are decoded then
/// parsed as base-10 floats.
pub fn transform_row(row: &SourceRow) -> Result<PostRecord, RecordError> {
    let post_id = decode_utf8(row.key(), "postId")?;
    let user = string_cell(row, FAMILY_POST, QUALIFIER_USER)?;
    let message = string_cell(row, FAMILY_POST, QUALIFIER_MESSAGE)?;
    let lat = float_cell(row, FAMILY_LOCATION, QUALIFIER_LAT)?;
    let lon = float_cell(row, FAMILY_LOCATION, QUALIFIER_LON)?;

    Ok(PostRecord {
        post_id,
        user,
        message,
        lat,
        lon,
    })
}

fn decode_utf8(bytes: &[u8], field: &str) -> Result<String, RecordError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| RecordError::invalid_utf8(field))
}

fn string_cell(row: &SourceRow, family: &str, qualifier: &str) -> Result<String, RecordError> {
    let bytes = row
        .cell(family, qualifier)
        .ok_or_else(|| RecordError::missing_cell(family, qualifier))?;
    decode_utf8(bytes, qualifier)
}

fn float_cell(row: &SourceRow, family: &str, qualifier: &str) -> Result<f64, RecordError> {
    let text = string_cell(row, family, qualifier)?;
    text.parse::<f64>()
        .map_err(|_| RecordError::invalid_float(qualifier, &text))
}
