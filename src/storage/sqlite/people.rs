use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use uuid::Uuid;

use super::rows::{fmt_ts, int, opt_json_col, placeholders, to_json, ts_col};
use crate::constants::PARTY;
use crate::domain::{Membership, MembershipPost, Person, PersonRecord};
use crate::error::Result;
use crate::storage::PersonFilter;

const PERSON_COLUMNS: &str = "p.id, p.name, p.sort_name, p.given_name, p.family_name, p.image, \
     p.email, p.primary_party, p.current_jurisdiction_id, p.current_role, p.created_at, p.updated_at";
const MEMBERSHIP_COLUMNS: &str = "m.id, m.person_id, m.organization_id, m.post_id, m.role, \
     m.start_date, m.end_date, po.id, po.label, po.role, po.division_id";

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        sort_name: row.get(2)?,
        given_name: row.get(3)?,
        family_name: row.get(4)?,
        image: row.get(5)?,
        email: row.get(6)?,
        primary_party: row.get(7)?,
        current_jurisdiction_id: row.get(8)?,
        current_role: opt_json_col(row, 9)?,
        created_at: ts_col(row, 10)?,
        updated_at: ts_col(row, 11)?,
    })
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    let post_id: Option<String> = row.get(7)?;
    let post = match post_id {
        Some(id) => Some(MembershipPost {
            id,
            label: row.get(8)?,
            role: row.get(9)?,
            division_id: row.get(10)?,
        }),
        None => None,
    };
    Ok(Membership {
        id: row.get(0)?,
        person_id: row.get(1)?,
        organization_id: row.get(2)?,
        post_id: row.get(3)?,
        post,
        role: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
    })
}

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

pub(super) fn save_person(conn: &mut Connection, record: &PersonRecord) -> Result<()> {
    let tx = conn.transaction()?;
    let person = &record.person;
    let current_role = person.current_role.as_ref().map(to_json).transpose()?;

    tx.execute(
        "INSERT INTO people (id, name, sort_name, given_name, family_name, image, email,
             primary_party, current_jurisdiction_id, current_role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET name=excluded.name, sort_name=excluded.sort_name,
             given_name=excluded.given_name, family_name=excluded.family_name,
             image=excluded.image, email=excluded.email, primary_party=excluded.primary_party,
             current_jurisdiction_id=excluded.current_jurisdiction_id,
             current_role=excluded.current_role, updated_at=excluded.updated_at",
        params![
            person.id,
            person.name,
            person.sort_name,
            person.given_name,
            person.family_name,
            person.image,
            person.email,
            person.primary_party,
            person.current_jurisdiction_id,
            current_role,
            fmt_ts(&person.created_at),
            fmt_ts(&person.updated_at)
        ],
    )?;

    tx.execute("DELETE FROM memberships WHERE person_id = ?1", params![person.id])?;
    for membership in &record.memberships {
        insert_membership(&tx, &person.id, membership)?;
    }
    for party in &record.party_memberships {
        let organization_id = party_organization(&tx, party)?;
        let membership = Membership {
            id: String::new(),
            person_id: person.id.clone(),
            organization_id,
            post_id: None,
            post: None,
            role: "member".to_string(),
            start_date: String::new(),
            end_date: String::new(),
        };
        insert_membership(&tx, &person.id, &membership)?;
    }

    tx.commit()?;
    Ok(())
}

fn insert_membership(tx: &Transaction<'_>, person_id: &str, membership: &Membership) -> Result<()> {
    let id = if membership.id.is_empty() {
        format!("ocd-membership/{}", Uuid::new_v4())
    } else {
        membership.id.clone()
    };
    tx.execute(
        "INSERT INTO memberships (id, person_id, organization_id, post_id, role, start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET person_id=excluded.person_id,
             organization_id=excluded.organization_id, post_id=excluded.post_id, role=excluded.role,
             start_date=excluded.start_date, end_date=excluded.end_date",
        params![
            id,
            person_id,
            membership.organization_id,
            membership.post_id,
            membership.role,
            membership.start_date,
            membership.end_date
        ],
    )?;
    Ok(())
}

/// Party organizations are shared across jurisdictions and created on first use.
fn party_organization(tx: &Transaction<'_>, name: &str) -> Result<String> {
    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM organizations WHERE classification = ?1 AND name = ?2",
            params![PARTY, name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let id = format!("ocd-organization/{}", Uuid::new_v4());
    tx.execute(
        "INSERT INTO organizations (id, name, classification) VALUES (?1, ?2, ?3)",
        params![id, name, PARTY],
    )?;
    Ok(id)
}

pub(super) fn get_people_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<Person>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {PERSON_COLUMNS} FROM people p WHERE p.id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), person_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Membership subquery restricted to one organization (by id or name) and,
/// optionally, to current memberships and a district label.
fn membership_clause(
    org: &str,
    current: bool,
    district: Option<&str>,
    values: &mut Vec<Value>,
) -> String {
    let mut clause = String::from(
        "EXISTS (SELECT 1 FROM memberships m JOIN organizations o ON o.id = m.organization_id \
         LEFT JOIN posts po ON po.id = m.post_id \
         WHERE m.person_id = p.id AND (o.id = ? OR o.name = ?)",
    );
    values.push(Value::Text(org.to_string()));
    values.push(Value::Text(org.to_string()));
    if current {
        clause.push_str(" AND (m.end_date = '' OR m.end_date >= ?)");
        values.push(Value::Text(today()));
    }
    if let Some(district) = district {
        clause.push_str(" AND po.label = ?");
        values.push(Value::Text(district.to_string()));
    }
    clause.push(')');
    clause
}

fn person_where(filter: &PersonFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(name) = &filter.name {
        clauses.push("p.name LIKE ?".to_string());
        values.push(Value::Text(format!("%{name}%")));
    }
    if let Some(jurisdiction_id) = &filter.jurisdiction_id {
        clauses.push("p.current_jurisdiction_id = ?".to_string());
        values.push(Value::Text(jurisdiction_id.clone()));
    }
    let district = filter.district.as_deref();
    if let Some(org) = &filter.member_of {
        clauses.push(membership_clause(org, true, district, &mut values));
    }
    if let Some(org) = &filter.ever_member_of {
        let district = if filter.member_of.is_some() { None } else { district };
        clauses.push(membership_clause(org, false, district, &mut values));
    }
    if let Some(division_id) = &filter.division_id {
        clauses.push(
            "EXISTS (SELECT 1 FROM memberships m JOIN posts po ON po.id = m.post_id \
             WHERE m.person_id = p.id AND po.division_id = ? \
             AND (m.end_date = '' OR m.end_date >= ?))"
                .to_string(),
        );
        values.push(Value::Text(division_id.clone()));
        values.push(Value::Text(today()));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

pub(super) fn count_people(conn: &Connection, filter: &PersonFilter) -> Result<usize> {
    let (where_sql, values) = person_where(filter);
    let sql = format!("SELECT COUNT(*) FROM people p {where_sql}");
    let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(count as usize)
}

pub(super) fn search_people(
    conn: &Connection,
    filter: &PersonFilter,
    offset: usize,
    limit: usize,
) -> Result<Vec<Person>> {
    let (where_sql, mut values) = person_where(filter);
    let sql = format!("SELECT {PERSON_COLUMNS} FROM people p {where_sql} ORDER BY p.name, p.id LIMIT ? OFFSET ?");
    values.push(int(limit));
    values.push(int(offset));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), person_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn memberships_for_people(conn: &Connection, person_ids: &[String]) -> Result<Vec<Membership>> {
    if person_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN posts po ON po.id = m.post_id
         WHERE m.person_id IN ({}) ORDER BY m.person_id, m.start_date, m.id",
        placeholders(person_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(person_ids.iter()), membership_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn memberships_for_organization(conn: &Connection, organization_id: &str) -> Result<Vec<Membership>> {
    let sql = format!(
        "SELECT {MEMBERSHIP_COLUMNS} FROM memberships m LEFT JOIN posts po ON po.id = m.post_id
         WHERE m.organization_id = ?1 ORDER BY m.start_date, m.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![organization_id], membership_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
