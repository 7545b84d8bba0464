use redb::{Database, ReadableTable, Table};

use super::{decode, encode, tables};
use crate::error::{AppError, Result};
use crate::models::record::new_id;
use crate::models::RecordRow;

/// Read a `Vec<String>` index entry, empty when absent
fn read_index<T: ReadableTable<&'static str, &'static [u8]>>(
    table: &T,
    key: &str,
) -> Result<Vec<String>> {
    Ok(table
        .get(key)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?
        .unwrap_or_default())
}

fn push_index(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    record_id: &str,
) -> Result<()> {
    let mut ids = read_index(table, key)?;
    ids.push(record_id.to_string());
    let bytes = encode(&ids)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

/// Load a record by ID
pub fn get_record(db: &Database, record_id: &str) -> Result<Option<RecordRow>> {
    let read_txn = db.begin_read()?;
    let records = read_txn.open_table(tables::RECORDS)?;

    let row = records
        .get(record_id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?;
    Ok(row)
}

/// Find the record a user already anchored for this hash
pub fn find_user_record_by_hash(
    db: &Database,
    user_id: &str,
    data_hash: &str,
) -> Result<Option<(String, RecordRow)>> {
    let read_txn = db.begin_read()?;
    let by_hash = read_txn.open_table(tables::RECORDS_BY_HASH)?;
    let records = read_txn.open_table(tables::RECORDS)?;

    for id in read_index(&by_hash, data_hash)? {
        if let Some(bytes) = records.get(id.as_str())? {
            let row: RecordRow = decode(bytes.value())?;
            if row.user_id == user_id {
                return Ok(Some((id, row)));
            }
        }
    }
    Ok(None)
}

/// Find the oldest record with this hash, regardless of owner
pub fn find_record_by_hash(db: &Database, data_hash: &str) -> Result<Option<(String, RecordRow)>> {
    let read_txn = db.begin_read()?;
    let by_hash = read_txn.open_table(tables::RECORDS_BY_HASH)?;
    let records = read_txn.open_table(tables::RECORDS)?;

    for id in read_index(&by_hash, data_hash)? {
        if let Some(bytes) = records.get(id.as_str())? {
            return Ok(Some((id, decode(bytes.value())?)));
        }
    }
    Ok(None)
}

/// Insert a new record and its index entries
///
/// The `(user_id, data_hash)` uniqueness is re-checked inside the write
/// transaction, so two racing submissions cannot both be stored.
pub fn insert_record(db: &Database, row: &RecordRow) -> Result<String> {
    let record_id = new_id();

    let write_txn = db.begin_write()?;
    {
        let mut records = write_txn.open_table(tables::RECORDS)?;
        let mut by_hash = write_txn.open_table(tables::RECORDS_BY_HASH)?;
        let mut user_records = write_txn.open_table(tables::USER_RECORDS)?;

        for id in read_index(&by_hash, &row.data_hash)? {
            if let Some(bytes) = records.get(id.as_str())? {
                let existing: RecordRow = decode(bytes.value())?;
                if existing.user_id == row.user_id {
                    return Err(AppError::DuplicateSubmission {
                        record_id: id,
                        tx_hash: existing.tx_hash,
                    });
                }
            }
        }

        let bytes = encode(row)?;
        records.insert(record_id.as_str(), bytes.as_slice())?;
        push_index(&mut by_hash, &row.data_hash, &record_id)?;
        push_index(&mut user_records, &row.user_id, &record_id)?;
    }
    write_txn.commit()?;

    Ok(record_id)
}

/// One page of a user's records, newest first, plus the user's total count
pub fn list_user_records(
    db: &Database,
    user_id: &str,
    offset: usize,
    limit: usize,
) -> Result<(Vec<(String, RecordRow)>, usize)> {
    let read_txn = db.begin_read()?;
    let user_records = read_txn.open_table(tables::USER_RECORDS)?;
    let records = read_txn.open_table(tables::RECORDS)?;

    let ids = read_index(&user_records, user_id)?;
    let total = ids.len();

    let mut page = Vec::with_capacity(limit.min(total));
    for id in ids.into_iter().rev().skip(offset).take(limit) {
        if let Some(bytes) = records.get(id.as_str())? {
            let row: RecordRow = decode(bytes.value())?;
            page.push((id, row));
        }
    }

    Ok((page, total))
}
