use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};

use crate::domain::{NameStatus, NameTally, UnmatchedName};
use crate::error::Result;
use crate::storage::SyncOutcome;

const NAME_COLUMNS: &str =
    "id, session_id, name, sponsorships_count, votes_count, status, matched_person_id";

fn name_from_row(row: &Row<'_>) -> rusqlite::Result<UnmatchedName> {
    let code: String = row.get(5)?;
    let status = NameStatus::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown name status '{code}'").into(),
        )
    })?;
    Ok(UnmatchedName {
        id: row.get(0)?,
        session_id: row.get(1)?,
        name: row.get(2)?,
        sponsorships_count: row.get(3)?,
        votes_count: row.get(4)?,
        status,
        matched_person_id: row.get(6)?,
    })
}

fn tally(conn: &Connection, sql: &str, session_id: i64) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<HashMap<String, i64>>>()?)
}

/// Person sponsorships in the session that are not linked to a person, counted by name.
pub(super) fn unmatched_sponsor_names(conn: &Connection, session_id: i64) -> Result<HashMap<String, i64>> {
    tally(
        conn,
        "SELECT sp.name, COUNT(*) FROM bill_sponsorships sp
         JOIN bills b ON b.id = sp.bill_id
         WHERE b.legislative_session_id = ?1 AND sp.person_id IS NULL AND sp.entity_type = 'person'
         GROUP BY sp.name",
        session_id,
    )
}

/// Individual votes in the session without a linked voter, counted by name.
pub(super) fn unmatched_voter_names(conn: &Connection, session_id: i64) -> Result<HashMap<String, i64>> {
    tally(
        conn,
        "SELECT pv.voter_name, COUNT(*) FROM person_votes pv
         JOIN vote_events v ON v.id = pv.vote_event_id
         WHERE v.legislative_session_id = ?1 AND pv.voter_id IS NULL
         GROUP BY pv.voter_name",
        session_id,
    )
}

pub(super) fn list_unmatched_names(conn: &Connection, session_id: i64) -> Result<Vec<UnmatchedName>> {
    let sql = format!(
        "SELECT {NAME_COLUMNS} FROM unmatched_names WHERE session_id = ?1
         ORDER BY sponsorships_count + votes_count DESC, name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![session_id], name_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Make the session's unmatched-name rows mirror `tallies`: counts are
/// overwritten, review status survives, names no longer present are removed.
pub(super) fn sync_unmatched_names(
    conn: &mut Connection,
    session_id: i64,
    tallies: &[NameTally],
) -> Result<SyncOutcome> {
    let tx = conn.transaction()?;
    let mut outcome = SyncOutcome::default();

    for t in tallies {
        tx.execute(
            "INSERT INTO unmatched_names (session_id, name, sponsorships_count, votes_count, status)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(session_id, name) DO UPDATE SET
                 sponsorships_count=excluded.sponsorships_count, votes_count=excluded.votes_count",
            params![
                session_id,
                t.name,
                t.sponsorships_count,
                t.votes_count,
                NameStatus::Unmatched.code()
            ],
        )?;
        outcome.upserted += 1;
    }

    let keep: HashSet<&str> = tallies.iter().map(|t| t.name.as_str()).collect();
    let stale: Vec<i64> = {
        let mut stmt = tx.prepare("SELECT id, name FROM unmatched_names WHERE session_id = ?1")?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut stale = Vec::new();
        for row in rows {
            let (id, name) = row?;
            if !keep.contains(name.as_str()) {
                stale.push(id);
            }
        }
        stale
    };
    for id in &stale {
        tx.execute("DELETE FROM unmatched_names WHERE id = ?1", params![id])?;
    }
    outcome.removed = stale.len();

    tx.commit()?;
    Ok(outcome)
}

pub(super) fn get_unmatched_name(conn: &Connection, id: i64) -> Result<Option<UnmatchedName>> {
    let sql = format!("SELECT {NAME_COLUMNS} FROM unmatched_names WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], name_from_row).optional()?)
}

pub(super) fn set_unmatched_status(
    conn: &Connection,
    id: i64,
    status: NameStatus,
    matched_person_id: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE unmatched_names SET status = ?2, matched_person_id = ?3 WHERE id = ?1",
        params![id, status.code(), matched_person_id],
    )?;
    Ok(())
}

/// Link every unmatched sponsorship and vote carrying the name in its session to
/// `person_id` and mark the name matched, all in one transaction. Returns the number
/// of records linked, or `None` when there is no such name.
pub(super) fn match_unmatched_name(conn: &mut Connection, id: i64, person_id: &str) -> Result<Option<usize>> {
    let tx = conn.transaction()?;
    let Some(name) = get_unmatched_name(&tx, id)? else {
        return Ok(None);
    };
    let sponsorships = tx.execute(
        "UPDATE bill_sponsorships SET person_id = ?3
         WHERE name = ?2 AND person_id IS NULL AND entity_type = 'person'
           AND bill_id IN (SELECT id FROM bills WHERE legislative_session_id = ?1)",
        params![name.session_id, name.name, person_id],
    )?;
    let votes = tx.execute(
        "UPDATE person_votes SET voter_id = ?3
         WHERE voter_name = ?2 AND voter_id IS NULL
           AND vote_event_id IN (SELECT id FROM vote_events WHERE legislative_session_id = ?1)",
        params![name.session_id, name.name, person_id],
    )?;
    set_unmatched_status(&tx, id, NameStatus::MatchedPerson, Some(person_id))?;
    tx.commit()?;
    Ok(Some(sponsorships + votes))
}
