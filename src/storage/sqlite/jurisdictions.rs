use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::rows::{extras_json, json_col, placeholders, text_values, to_json};
use crate::domain::{Jurisdiction, JurisdictionRecord, LegislativeSession, Organization};
use crate::error::Result;

const JURISDICTION_COLUMNS: &str = "id, name, url, classification, division_id";
const SESSION_COLUMNS: &str =
    "id, jurisdiction_id, identifier, name, classification, start_date, end_date";
pub(super) const ORGANIZATION_COLUMNS: &str =
    "id, name, classification, parent_id, jurisdiction_id, links, sources, extras";

fn jurisdiction_from_row(row: &Row<'_>) -> rusqlite::Result<Jurisdiction> {
    Ok(Jurisdiction {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        classification: row.get(3)?,
        division_id: row.get(4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<LegislativeSession> {
    Ok(LegislativeSession {
        id: row.get(0)?,
        jurisdiction_id: row.get(1)?,
        identifier: row.get(2)?,
        name: row.get(3)?,
        classification: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
    })
}

pub(super) fn organization_from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        classification: row.get(2)?,
        parent_id: row.get(3)?,
        jurisdiction_id: row.get(4)?,
        links: json_col(row, 5)?,
        sources: json_col(row, 6)?,
        extras: json_col(row, 7)?,
    })
}

/// Upsert a jurisdiction with its division, sessions, organizations and posts.
/// Returns the stored sessions with their database ids.
pub(super) fn save_jurisdiction(
    conn: &mut Connection,
    record: &JurisdictionRecord,
) -> Result<Vec<LegislativeSession>> {
    let tx = conn.transaction()?;
    let jurisdiction = &record.jurisdiction;

    if let Some(division) = &record.division {
        tx.execute(
            "INSERT INTO divisions (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name=excluded.name",
            params![division.id, division.name],
        )?;
    }

    tx.execute(
        "INSERT INTO jurisdictions (id, name, url, classification, division_id)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET name=excluded.name, url=excluded.url,
             classification=excluded.classification, division_id=excluded.division_id",
        params![
            jurisdiction.id,
            jurisdiction.name,
            jurisdiction.url,
            jurisdiction.classification,
            jurisdiction.division_id
        ],
    )?;

    for session in &record.sessions {
        tx.execute(
            "INSERT INTO legislative_sessions
                 (jurisdiction_id, identifier, name, classification, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(jurisdiction_id, identifier) DO UPDATE SET name=excluded.name,
                 classification=excluded.classification, start_date=excluded.start_date,
                 end_date=excluded.end_date",
            params![
                jurisdiction.id,
                session.identifier,
                session.name,
                session.classification,
                session.start_date,
                session.end_date
            ],
        )?;
    }

    for org in &record.organizations {
        let jurisdiction_id = org.jurisdiction_id.as_deref().unwrap_or(&jurisdiction.id);
        tx.execute(
            "INSERT INTO organizations
                 (id, name, classification, parent_id, jurisdiction_id, links, sources, extras)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET name=excluded.name,
                 classification=excluded.classification, parent_id=excluded.parent_id,
                 jurisdiction_id=excluded.jurisdiction_id, links=excluded.links,
                 sources=excluded.sources, extras=excluded.extras",
            params![
                org.id,
                org.name,
                org.classification,
                org.parent_id,
                jurisdiction_id,
                to_json(&org.links)?,
                to_json(&org.sources)?,
                extras_json(&org.extras)?
            ],
        )?;
    }

    for post in &record.posts {
        tx.execute(
            "INSERT INTO posts (id, organization_id, label, role, division_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET organization_id=excluded.organization_id,
                 label=excluded.label, role=excluded.role, division_id=excluded.division_id",
            params![post.id, post.organization_id, post.label, post.role, post.division_id],
        )?;
    }

    tx.commit()?;
    sessions_for_jurisdiction(conn, &jurisdiction.id)
}

/// Look a jurisdiction up by OCD id or by display name.
pub(super) fn get_jurisdiction(conn: &Connection, id_or_name: &str) -> Result<Option<Jurisdiction>> {
    let sql = format!(
        "SELECT {JURISDICTION_COLUMNS} FROM jurisdictions WHERE id = ?1 OR name = ?1
         ORDER BY id = ?1 DESC LIMIT 1"
    );
    let jurisdiction = conn
        .query_row(&sql, params![id_or_name], jurisdiction_from_row)
        .optional()?;
    Ok(jurisdiction)
}

pub(super) fn list_jurisdictions(conn: &Connection, classification: Option<&str>) -> Result<Vec<Jurisdiction>> {
    let sql = format!(
        "SELECT {JURISDICTION_COLUMNS} FROM jurisdictions
         WHERE ?1 IS NULL OR classification = ?1 ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![classification], jurisdiction_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn get_jurisdictions_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<Jurisdiction>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {JURISDICTION_COLUMNS} FROM jurisdictions WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), jurisdiction_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Sessions of a jurisdiction, most recent first.
pub(super) fn sessions_for_jurisdiction(
    conn: &Connection,
    jurisdiction_id: &str,
) -> Result<Vec<LegislativeSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM legislative_sessions WHERE jurisdiction_id = ?1
         ORDER BY start_date DESC, identifier DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![jurisdiction_id], session_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn get_session(
    conn: &Connection,
    jurisdiction_id: &str,
    identifier: &str,
) -> Result<Option<LegislativeSession>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM legislative_sessions
         WHERE jurisdiction_id = ?1 AND identifier = ?2"
    );
    let session = conn
        .query_row(&sql, params![jurisdiction_id, identifier], session_from_row)
        .optional()?;
    Ok(session)
}

pub(super) fn get_sessions_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<LegislativeSession>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM legislative_sessions WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), session_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn organizations_for_jurisdiction(
    conn: &Connection,
    jurisdiction_id: &str,
    classification: Option<&str>,
) -> Result<Vec<Organization>> {
    let mut sql = format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE jurisdiction_id = ?");
    let mut values = vec![Value::Text(jurisdiction_id.to_string())];
    if let Some(classification) = classification {
        sql.push_str(" AND classification = ?");
        values.push(Value::Text(classification.to_string()));
    }
    sql.push_str(" ORDER BY name, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), organization_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn child_organizations(conn: &Connection, parent_id: &str) -> Result<Vec<Organization>> {
    let sql = format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE parent_id = ?1 ORDER BY name, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![parent_id], organization_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn get_organizations_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<Organization>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(text_values(ids).iter()), organization_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
