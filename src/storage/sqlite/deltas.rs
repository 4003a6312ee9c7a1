use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::rows::{fmt_ts, json_col, to_json, ts_col};
use crate::domain::{DeltaSet, DeltaSetRecord, NewPerson, PersonDelta, PersonRetirement, PullStatus};
use crate::error::Result;

const DELTA_SET_COLUMNS: &str = "id, name, pr_url, pr_status, created_by, created_at";

fn delta_set_from_row(row: &Row<'_>) -> rusqlite::Result<DeltaSet> {
    let code: String = row.get(3)?;
    let pr_status = PullStatus::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown pull status '{code}'").into(),
        )
    })?;
    Ok(DeltaSet {
        id: row.get(0)?,
        name: row.get(1)?,
        pr_url: row.get(2)?,
        pr_status,
        created_by: row.get(4)?,
        created_at: ts_col(row, 5)?,
    })
}

/// Insert the set and everything it carries in one transaction. Ids and status on the
/// input are ignored: the set starts out `NotCreated`. Returns the new set id.
pub(super) fn save_delta_set(conn: &mut Connection, record: &DeltaSetRecord) -> Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO delta_sets (name, pr_url, pr_status, created_by, created_at)
         VALUES (?1, '', ?2, ?3, ?4)",
        params![
            record.delta_set.name,
            PullStatus::NotCreated.code(),
            record.delta_set.created_by,
            fmt_ts(&Utc::now()),
        ],
    )?;
    let id = tx.last_insert_rowid();

    for delta in &record.person_deltas {
        tx.execute(
            "INSERT INTO person_deltas (delta_set_id, person_id, data_changes) VALUES (?1, ?2, ?3)",
            params![id, delta.person_id, to_json(&delta.data_changes)?],
        )?;
    }
    for retirement in &record.person_retirements {
        tx.execute(
            "INSERT INTO person_retirements (delta_set_id, person_id, date, reason, is_dead, vacant_seat)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                retirement.person_id,
                retirement.date,
                retirement.reason,
                retirement.is_dead,
                retirement.vacant_seat,
            ],
        )?;
    }
    for person in &record.new_people {
        tx.execute(
            "INSERT INTO new_people (delta_set_id, name, state, district, chamber)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, person.name, person.state, person.district, person.chamber],
        )?;
    }
    tx.commit()?;
    Ok(id)
}

pub(super) fn get_delta_set(conn: &Connection, id: i64) -> Result<Option<DeltaSetRecord>> {
    let sql = format!("SELECT {DELTA_SET_COLUMNS} FROM delta_sets WHERE id = ?1");
    let Some(delta_set) = conn.query_row(&sql, params![id], delta_set_from_row).optional()? else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT id, person_id, data_changes FROM person_deltas WHERE delta_set_id = ?1 ORDER BY id",
    )?;
    let person_deltas = stmt
        .query_map(params![id], |row| {
            Ok(PersonDelta {
                id: row.get(0)?,
                person_id: row.get(1)?,
                data_changes: json_col(row, 2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, person_id, date, reason, is_dead, vacant_seat FROM person_retirements
         WHERE delta_set_id = ?1 ORDER BY id",
    )?;
    let person_retirements = stmt
        .query_map(params![id], |row| {
            Ok(PersonRetirement {
                id: row.get(0)?,
                person_id: row.get(1)?,
                date: row.get(2)?,
                reason: row.get(3)?,
                is_dead: row.get(4)?,
                vacant_seat: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, name, state, district, chamber FROM new_people WHERE delta_set_id = ?1 ORDER BY id",
    )?;
    let new_people = stmt
        .query_map(params![id], |row| {
            Ok(NewPerson {
                id: row.get(0)?,
                name: row.get(1)?,
                state: row.get(2)?,
                district: row.get(3)?,
                chamber: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(DeltaSetRecord {
        delta_set,
        person_deltas,
        person_retirements,
        new_people,
    }))
}

/// Newest first.
pub(super) fn list_delta_sets(conn: &Connection, status: Option<PullStatus>) -> Result<Vec<DeltaSet>> {
    let sql = format!(
        "SELECT {DELTA_SET_COLUMNS} FROM delta_sets
         WHERE (?1 IS NULL OR pr_status = ?1)
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![status.map(|s| s.code())], delta_set_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// `false` when there is no such set. A `None` url leaves the stored one alone.
pub(super) fn set_pull_status(
    conn: &Connection,
    id: i64,
    status: PullStatus,
    pr_url: Option<&str>,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE delta_sets SET pr_status = ?2, pr_url = COALESCE(?3, pr_url) WHERE id = ?1",
        params![id, status.code(), pr_url],
    )?;
    Ok(changed > 0)
}
