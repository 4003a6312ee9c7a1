use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

use super::rows::{fmt_ts, json_col, placeholders, to_json, ts_col};
use crate::domain::{Link, PersonVote, VoteCount, VoteEvent, VoteEventRecord};
use crate::error::Result;

const VOTE_COLUMNS: &str = "v.id, v.identifier, v.motion_text, v.motion_classification, \
     v.start_date, v.result, v.organization_id, v.legislative_session_id, v.bill_id, \
     v.bill_action_id, v.created_at, v.updated_at";

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<VoteEvent> {
    Ok(VoteEvent {
        id: row.get(0)?,
        identifier: row.get(1)?,
        motion_text: row.get(2)?,
        motion_classification: json_col(row, 3)?,
        start_date: row.get(4)?,
        result: row.get(5)?,
        organization_id: row.get(6)?,
        legislative_session_id: row.get(7)?,
        bill_id: row.get(8)?,
        bill_action_id: row.get(9)?,
        created_at: ts_col(row, 10)?,
        updated_at: ts_col(row, 11)?,
    })
}

fn person_vote_from_row(row: &Row<'_>) -> rusqlite::Result<PersonVote> {
    Ok(PersonVote {
        id: row.get(0)?,
        vote_event_id: row.get(1)?,
        option: row.get(2)?,
        voter_name: row.get(3)?,
        voter_id: row.get(4)?,
        note: row.get(5)?,
    })
}

const CHILD_TABLES: [&str; 3] = ["vote_counts", "person_votes", "vote_sources"];

/// Upsert a vote event, replacing its counts, individual votes and sources.
pub(super) fn save_vote_event(conn: &mut Connection, record: &VoteEventRecord) -> Result<()> {
    let tx = conn.transaction()?;
    let vote = &record.vote;
    tx.execute(
        "INSERT INTO vote_events (id, identifier, motion_text, motion_classification, start_date,
             result, organization_id, legislative_session_id, bill_id, bill_action_id,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET identifier=excluded.identifier,
             motion_text=excluded.motion_text, motion_classification=excluded.motion_classification,
             start_date=excluded.start_date, result=excluded.result,
             organization_id=excluded.organization_id,
             legislative_session_id=excluded.legislative_session_id, bill_id=excluded.bill_id,
             bill_action_id=excluded.bill_action_id, updated_at=excluded.updated_at",
        params![
            vote.id,
            vote.identifier,
            vote.motion_text,
            to_json(&vote.motion_classification)?,
            vote.start_date,
            vote.result,
            vote.organization_id,
            vote.legislative_session_id,
            vote.bill_id,
            vote.bill_action_id,
            fmt_ts(&vote.created_at),
            fmt_ts(&vote.updated_at)
        ],
    )?;

    for table in CHILD_TABLES {
        tx.execute(&format!("DELETE FROM {table} WHERE vote_event_id = ?1"), params![vote.id])?;
    }
    for (pos, count) in record.counts.iter().enumerate() {
        tx.execute(
            "INSERT INTO vote_counts (vote_event_id, position, option, value) VALUES (?1, ?2, ?3, ?4)",
            params![vote.id, pos as i64, count.option, count.value],
        )?;
    }
    for pv in &record.votes {
        tx.execute(
            "INSERT INTO person_votes (vote_event_id, option, voter_name, voter_id, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![vote.id, pv.option, pv.voter_name, pv.voter_id, pv.note],
        )?;
    }
    for (pos, source) in record.sources.iter().enumerate() {
        tx.execute(
            "INSERT INTO vote_sources (vote_event_id, position, url, note) VALUES (?1, ?2, ?3, ?4)",
            params![vote.id, pos as i64, source.url, source.note],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Delete every vote event recorded against a bill. Returns how many went.
pub(super) fn delete_votes_for_bill(conn: &mut Connection, bill_id: &str) -> Result<usize> {
    let tx = conn.transaction()?;
    for table in CHILD_TABLES {
        tx.execute(
            &format!(
                "DELETE FROM {table} WHERE vote_event_id IN (SELECT id FROM vote_events WHERE bill_id = ?1)"
            ),
            params![bill_id],
        )?;
    }
    let removed = tx.execute("DELETE FROM vote_events WHERE bill_id = ?1", params![bill_id])?;
    tx.commit()?;
    Ok(removed)
}

pub(super) fn get_vote_events_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<VoteEvent>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {VOTE_COLUMNS} FROM vote_events v WHERE v.id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), vote_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn get_vote_records(conn: &Connection, ids: &[String]) -> Result<Vec<VoteEventRecord>> {
    let votes = get_vote_events_by_ids(conn, ids)?;
    if votes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = votes.iter().map(|v| v.id.clone()).collect();
    let marks = placeholders(ids.len());

    let mut counts: HashMap<String, Vec<VoteCount>> = HashMap::new();
    let mut stmt = conn.prepare(&format!(
        "SELECT vote_event_id, option, value FROM vote_counts
         WHERE vote_event_id IN ({marks}) ORDER BY vote_event_id, position"
    ))?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;
    while let Some(row) = rows.next()? {
        counts.entry(row.get(0)?).or_default().push(VoteCount {
            option: row.get(1)?,
            value: row.get(2)?,
        });
    }

    let mut person_votes: HashMap<String, Vec<PersonVote>> = HashMap::new();
    let mut stmt = conn.prepare(&format!(
        "SELECT id, vote_event_id, option, voter_name, voter_id, note FROM person_votes
         WHERE vote_event_id IN ({marks}) ORDER BY vote_event_id, id"
    ))?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), person_vote_from_row)?;
    for pv in rows {
        let pv = pv?;
        person_votes.entry(pv.vote_event_id.clone()).or_default().push(pv);
    }

    let mut sources: HashMap<String, Vec<Link>> = HashMap::new();
    let mut stmt = conn.prepare(&format!(
        "SELECT vote_event_id, url, note FROM vote_sources
         WHERE vote_event_id IN ({marks}) ORDER BY vote_event_id, position"
    ))?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;
    while let Some(row) = rows.next()? {
        sources.entry(row.get(0)?).or_default().push(Link {
            url: row.get(1)?,
            note: row.get(2)?,
        });
    }

    Ok(votes
        .into_iter()
        .map(|vote| VoteEventRecord {
            counts: counts.remove(&vote.id).unwrap_or_default(),
            votes: person_votes.remove(&vote.id).unwrap_or_default(),
            sources: sources.remove(&vote.id).unwrap_or_default(),
            vote,
        })
        .collect())
}

pub(super) fn count_votes_for_bill(conn: &Connection, bill_id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM vote_events WHERE bill_id = ?1",
        params![bill_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// A bill's votes, oldest first.
pub(super) fn votes_for_bill(conn: &Connection, bill_id: &str, offset: usize, limit: usize) -> Result<Vec<VoteEvent>> {
    let sql = format!(
        "SELECT {VOTE_COLUMNS} FROM vote_events v WHERE v.bill_id = ?1
         ORDER BY v.start_date, v.id LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![bill_id, limit as i64, offset as i64], vote_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn votes_for_bills(conn: &Connection, bill_ids: &[String]) -> Result<Vec<VoteEvent>> {
    if bill_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {VOTE_COLUMNS} FROM vote_events v WHERE v.bill_id IN ({})
         ORDER BY v.bill_id, v.start_date, v.id",
        placeholders(bill_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bill_ids.iter()), vote_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn count_votes_by_person(conn: &Connection, person_id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM person_votes WHERE voter_id = ?1",
        params![person_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// A person's individual votes, most recent vote event first.
pub(super) fn votes_by_person(
    conn: &Connection,
    person_id: &str,
    offset: usize,
    limit: usize,
) -> Result<Vec<PersonVote>> {
    let mut stmt = conn.prepare(
        "SELECT pv.id, pv.vote_event_id, pv.option, pv.voter_name, pv.voter_id, pv.note
         FROM person_votes pv JOIN vote_events v ON v.id = pv.vote_event_id
         WHERE pv.voter_id = ?1 ORDER BY v.start_date DESC, pv.id LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(params![person_id, limit as i64, offset as i64], person_vote_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
