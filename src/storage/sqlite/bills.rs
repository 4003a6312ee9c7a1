use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashMap;
use tracing::debug;

use super::rows::{extras_json, fmt_ts, fts_query, int, json_col, placeholders, to_json, ts_col};
use crate::computed::update_bill_fields;
use crate::constants::{
    ACTION_BECAME_LAW, ACTION_PASSAGE, ACTION_SIGNATURE, ACTION_VETO, CHAMBER_LOWER, CHAMBER_UPPER,
};
use crate::domain::{
    Bill, BillAbstract, BillAction, BillDocument, BillIdentifier, BillRecord, BillSponsorship,
    BillTitle, DocumentLink, Link, RelatedBill, RelatedEntity,
};
use crate::error::Result;
use crate::storage::{BillFilter, BillSort, BillStatus};

const BILL_COLUMNS: &str = "b.id, b.legislative_session_id, b.identifier, b.title, \
     b.from_organization_id, b.classification, b.subject, b.first_action_date, \
     b.latest_action_date, b.latest_action_description, b.latest_passage_date, b.extras, \
     b.created_at, b.updated_at";
const BILL_FROM: &str = "FROM bills b \
     JOIN legislative_sessions s ON s.id = b.legislative_session_id \
     LEFT JOIN organizations o ON o.id = b.from_organization_id";

const DOC_VERSION: &str = "version";
const DOC_DOCUMENT: &str = "document";

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    Ok(Bill {
        id: row.get(0)?,
        legislative_session_id: row.get(1)?,
        identifier: row.get(2)?,
        title: row.get(3)?,
        from_organization_id: row.get(4)?,
        classification: json_col(row, 5)?,
        subject: json_col(row, 6)?,
        first_action_date: row.get(7)?,
        latest_action_date: row.get(8)?,
        latest_action_description: row.get(9)?,
        latest_passage_date: row.get(10)?,
        extras: json_col(row, 11)?,
        created_at: ts_col(row, 12)?,
        updated_at: ts_col(row, 13)?,
    })
}

/// Upsert a bill and replace every child collection. Computed fields and the
/// search index are refreshed from the record.
pub(super) fn save_bill(conn: &mut Connection, record: &BillRecord) -> Result<Bill> {
    let mut bill = record.bill.clone();
    update_bill_fields(&mut bill, &record.actions);

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO bills (id, legislative_session_id, identifier, title, from_organization_id,
             classification, subject, first_action_date, latest_action_date,
             latest_action_description, latest_passage_date, extras, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(id) DO UPDATE SET legislative_session_id=excluded.legislative_session_id,
             identifier=excluded.identifier, title=excluded.title,
             from_organization_id=excluded.from_organization_id,
             classification=excluded.classification, subject=excluded.subject,
             first_action_date=excluded.first_action_date,
             latest_action_date=excluded.latest_action_date,
             latest_action_description=excluded.latest_action_description,
             latest_passage_date=excluded.latest_passage_date, extras=excluded.extras,
             updated_at=excluded.updated_at",
        params![
            bill.id,
            bill.legislative_session_id,
            bill.identifier,
            bill.title,
            bill.from_organization_id,
            to_json(&bill.classification)?,
            to_json(&bill.subject)?,
            bill.first_action_date,
            bill.latest_action_date,
            bill.latest_action_description,
            bill.latest_passage_date,
            extras_json(&bill.extras)?,
            fmt_ts(&bill.created_at),
            fmt_ts(&bill.updated_at)
        ],
    )?;

    clear_children(&tx, &bill.id)?;
    insert_children(&tx, &bill, record)?;

    tx.execute("DELETE FROM bill_search WHERE bill_id = ?1", params![bill.id])?;
    tx.execute(
        "INSERT INTO bill_search (bill_id, all_titles, raw_text) VALUES (?1, ?2, ?3)",
        params![bill.id, record.all_titles(), record.full_text.clone().unwrap_or_default()],
    )?;

    tx.commit()?;
    debug!(bill_id = %bill.id, identifier = %bill.identifier, "Saved bill");
    Ok(bill)
}

fn clear_children(tx: &Transaction<'_>, bill_id: &str) -> Result<()> {
    tx.execute(
        "DELETE FROM bill_action_entities
         WHERE action_id IN (SELECT id FROM bill_actions WHERE bill_id = ?1)",
        params![bill_id],
    )?;
    tx.execute(
        "DELETE FROM bill_document_links
         WHERE document_id IN (SELECT id FROM bill_documents WHERE bill_id = ?1)",
        params![bill_id],
    )?;
    for table in [
        "bill_abstracts",
        "bill_titles",
        "bill_identifiers",
        "bill_actions",
        "bill_sponsorships",
        "bill_documents",
        "bill_sources",
        "related_bills",
    ] {
        tx.execute(&format!("DELETE FROM {table} WHERE bill_id = ?1"), params![bill_id])?;
    }
    Ok(())
}

fn insert_children(tx: &Transaction<'_>, bill: &Bill, record: &BillRecord) -> Result<()> {
    for (pos, a) in record.abstracts.iter().enumerate() {
        tx.execute(
            "INSERT INTO bill_abstracts (bill_id, position, abstract, note, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![bill.id, pos as i64, a.abstract_text, a.note, a.date],
        )?;
    }
    for (pos, t) in record.other_titles.iter().enumerate() {
        tx.execute(
            "INSERT INTO bill_titles (bill_id, position, title, note) VALUES (?1, ?2, ?3, ?4)",
            params![bill.id, pos as i64, t.title, t.note],
        )?;
    }
    for (pos, i) in record.other_identifiers.iter().enumerate() {
        tx.execute(
            "INSERT INTO bill_identifiers (bill_id, position, identifier, scheme, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![bill.id, pos as i64, i.identifier, i.scheme, i.note],
        )?;
    }

    for (idx, action) in record.actions.iter().enumerate() {
        let action_id = if action.id.is_empty() {
            format!("{}/action/{}", bill.id, idx)
        } else {
            action.id.clone()
        };
        tx.execute(
            "INSERT INTO bill_actions
                 (id, bill_id, organization_id, description, date, classification, action_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                action_id,
                bill.id,
                action.organization_id,
                action.description,
                action.date,
                to_json(&action.classification)?,
                action.order
            ],
        )?;
        for (pos, entity) in action.related_entities.iter().enumerate() {
            tx.execute(
                "INSERT INTO bill_action_entities
                     (action_id, position, name, entity_type, organization_id, person_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    action_id,
                    pos as i64,
                    entity.name,
                    entity.entity_type,
                    entity.organization_id,
                    entity.person_id
                ],
            )?;
        }
    }

    for s in &record.sponsorships {
        tx.execute(
            "INSERT INTO bill_sponsorships
                 (bill_id, name, entity_type, organization_id, person_id, is_primary, classification)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                bill.id,
                s.name,
                s.entity_type,
                s.organization_id,
                s.person_id,
                s.primary,
                s.classification
            ],
        )?;
    }

    insert_documents(tx, &bill.id, DOC_VERSION, &record.versions)?;
    insert_documents(tx, &bill.id, DOC_DOCUMENT, &record.documents)?;

    for (pos, source) in record.sources.iter().enumerate() {
        tx.execute(
            "INSERT INTO bill_sources (bill_id, position, url, note) VALUES (?1, ?2, ?3, ?4)",
            params![bill.id, pos as i64, source.url, source.note],
        )?;
    }

    for (pos, related) in record.related_bills.iter().enumerate() {
        let related_bill_id = match &related.related_bill_id {
            Some(id) => Some(id.clone()),
            None => resolve_related_bill(tx, bill, related)?,
        };
        tx.execute(
            "INSERT INTO related_bills
                 (bill_id, position, related_bill_id, identifier, legislative_session, relation_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                bill.id,
                pos as i64,
                related_bill_id,
                related.identifier,
                related.legislative_session,
                related.relation_type
            ],
        )?;
    }
    Ok(())
}

fn insert_documents(tx: &Transaction<'_>, bill_id: &str, kind: &str, documents: &[BillDocument]) -> Result<()> {
    for (pos, doc) in documents.iter().enumerate() {
        tx.execute(
            "INSERT INTO bill_documents (bill_id, kind, position, note, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![bill_id, kind, pos as i64, doc.note, doc.date],
        )?;
        let document_id = tx.last_insert_rowid();
        for (link_pos, link) in doc.links.iter().enumerate() {
            tx.execute(
                "INSERT INTO bill_document_links (document_id, position, url, media_type, text)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![document_id, link_pos as i64, link.url, link.media_type, link.text],
            )?;
        }
    }
    Ok(())
}

/// Find the stored bill a related-bill reference points at, within the same jurisdiction.
fn resolve_related_bill(tx: &Transaction<'_>, bill: &Bill, related: &RelatedBill) -> Result<Option<String>> {
    let id = tx
        .query_row(
            "SELECT b2.id FROM bills b2
             JOIN legislative_sessions s2 ON s2.id = b2.legislative_session_id
             WHERE s2.jurisdiction_id =
                   (SELECT jurisdiction_id FROM legislative_sessions WHERE id = ?1)
               AND s2.identifier = ?2 AND b2.identifier = ?3",
            params![bill.legislative_session_id, related.legislative_session, related.identifier],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn action_classification_clause(classification: &str, chamber: Option<&str>, values: &mut Vec<Value>) -> String {
    let mut clause = String::from(
        "EXISTS (SELECT 1 FROM bill_actions a \
         JOIN organizations ao ON ao.id = a.organization_id, json_each(a.classification) ac \
         WHERE a.bill_id = b.id AND ac.value = ?",
    );
    values.push(Value::Text(classification.to_string()));
    if let Some(chamber) = chamber {
        clause.push_str(" AND ao.classification = ?");
        values.push(Value::Text(chamber.to_string()));
    }
    clause.push(')');
    clause
}

fn bill_where(filter: &BillFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(jurisdiction_id) = &filter.jurisdiction_id {
        clauses.push("s.jurisdiction_id = ?".into());
        values.push(Value::Text(jurisdiction_id.clone()));
    }
    if let Some(session) = &filter.session {
        clauses.push("s.identifier = ?".into());
        values.push(Value::Text(session.clone()));
    }
    if let Some(chamber) = &filter.chamber {
        clauses.push("o.classification = ?".into());
        values.push(Value::Text(chamber.clone()));
    }
    if let Some(classification) = &filter.classification {
        clauses.push("EXISTS (SELECT 1 FROM json_each(b.classification) WHERE value = ?)".into());
        values.push(Value::Text(classification.clone()));
    }
    for subject in &filter.subjects {
        clauses.push("EXISTS (SELECT 1 FROM json_each(b.subject) WHERE value = ?)".into());
        values.push(Value::Text(subject.clone()));
    }
    if let Some(sponsor) = &filter.sponsor {
        let mut clause =
            String::from("EXISTS (SELECT 1 FROM bill_sponsorships sp WHERE sp.bill_id = b.id");
        if let Some(name) = &sponsor.name {
            clause.push_str(" AND sp.name = ?");
            values.push(Value::Text(name.clone()));
        }
        if let Some(primary) = sponsor.primary {
            clause.push_str(" AND sp.is_primary = ?");
            values.push(Value::Integer(primary as i64));
        }
        if let Some(person_id) = &sponsor.person_id {
            clause.push_str(" AND sp.person_id = ?");
            values.push(Value::Text(person_id.clone()));
        }
        clause.push(')');
        clauses.push(clause);
    }
    if let Some(updated_since) = &filter.updated_since {
        clauses.push("b.updated_at >= ?".into());
        values.push(Value::Text(fmt_ts(updated_since)));
    }
    if let Some(action_since) = &filter.action_since {
        clauses.push("b.latest_action_date >= ?".into());
        values.push(Value::Text(action_since.clone()));
    }
    if let Some(query) = filter.search_query.as_deref().and_then(fts_query) {
        clauses.push("b.id IN (SELECT bill_id FROM bill_search WHERE bill_search MATCH ?)".into());
        values.push(Value::Text(query));
    }
    if let Some(text) = filter.text_query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        match fts_query(text) {
            Some(query) => {
                clauses.push(
                    "(b.title LIKE ? OR b.id IN \
                     (SELECT bill_id FROM bill_search WHERE bill_search MATCH ?))"
                        .into(),
                );
                values.push(Value::Text(format!("%{text}%")));
                values.push(Value::Text(query));
            }
            None => {
                clauses.push("b.title LIKE ?".into());
                values.push(Value::Text(format!("%{text}%")));
            }
        }
    }
    if let Some(identifier) = &filter.identifier {
        clauses.push("b.identifier = ?".into());
        values.push(Value::Text(identifier.clone()));
    }
    if let Some(status) = filter.status {
        let clause = match status {
            BillStatus::PassedLowerChamber => {
                action_classification_clause(ACTION_PASSAGE, Some(CHAMBER_LOWER), &mut values)
            }
            BillStatus::PassedUpperChamber => {
                action_classification_clause(ACTION_PASSAGE, Some(CHAMBER_UPPER), &mut values)
            }
            BillStatus::Signed => action_classification_clause(ACTION_SIGNATURE, None, &mut values),
            BillStatus::BecameLaw => action_classification_clause(ACTION_BECAME_LAW, None, &mut values),
            BillStatus::Vetoed => action_classification_clause(ACTION_VETO, None, &mut values),
        };
        clauses.push(clause);
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), values)
    }
}

fn order_by(sort: BillSort) -> &'static str {
    match sort {
        BillSort::UpdatedDesc => "b.updated_at DESC, b.id",
        BillSort::LatestActionAsc => "b.latest_action_date ASC, b.id",
        BillSort::LatestActionDesc => "b.latest_action_date DESC, b.id",
        BillSort::FirstActionAsc => "b.first_action_date ASC, b.id",
        BillSort::FirstActionDesc => "b.first_action_date DESC, b.id",
    }
}

pub(super) fn count_bills(conn: &Connection, filter: &BillFilter) -> Result<usize> {
    let (where_sql, values) = bill_where(filter);
    let sql = format!("SELECT COUNT(*) {BILL_FROM} {where_sql}");
    let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(count as usize)
}

pub(super) fn search_bills(
    conn: &Connection,
    filter: &BillFilter,
    sort: BillSort,
    offset: usize,
    limit: usize,
) -> Result<Vec<Bill>> {
    let (where_sql, mut values) = bill_where(filter);
    let sql = format!(
        "SELECT {BILL_COLUMNS} {BILL_FROM} {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        order_by(sort)
    );
    values.push(int(limit));
    values.push(int(offset));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), bill_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn get_bills_by_ids(conn: &Connection, ids: &[String]) -> Result<Vec<Bill>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {BILL_COLUMNS} FROM bills b WHERE b.id IN ({})",
        placeholders(ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(ids.iter()), bill_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(super) fn find_bill(
    conn: &Connection,
    jurisdiction_id: &str,
    session: &str,
    identifier: &str,
) -> Result<Option<Bill>> {
    let sql = format!(
        "SELECT {BILL_COLUMNS} {BILL_FROM}
         WHERE s.jurisdiction_id = ?1 AND s.identifier = ?2 AND b.identifier = ?3"
    );
    let bill = conn
        .query_row(&sql, params![jurisdiction_id, session, identifier], bill_from_row)
        .optional()?;
    Ok(bill)
}

/// Distinct values of a JSON array column across a jurisdiction's bills.
pub(super) fn distinct_json_values(
    conn: &Connection,
    jurisdiction_id: &str,
    column: &'static str,
) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT j.value FROM bills b
         JOIN legislative_sessions s ON s.id = b.legislative_session_id, json_each(b.{column}) j
         WHERE s.jurisdiction_id = ?1 ORDER BY j.value"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![jurisdiction_id], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Run `sql` (which takes the id list as its only parameters) and group rows by
/// the key the mapper returns.
fn grouped<K, T, F>(conn: &Connection, sql: &str, ids: &[String], mut map_row: F) -> Result<HashMap<K, Vec<T>>>
where
    K: std::hash::Hash + Eq,
    F: FnMut(&Row<'_>) -> rusqlite::Result<(K, T)>,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(ids.iter()))?;
    let mut map: HashMap<K, Vec<T>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let (key, item) = map_row(row)?;
        map.entry(key).or_default().push(item);
    }
    Ok(map)
}

/// Load bills with every child collection. Missing ids are skipped.
pub(super) fn get_bill_records(conn: &Connection, ids: &[String]) -> Result<Vec<BillRecord>> {
    let bills = get_bills_by_ids(conn, ids)?;
    if bills.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = bills.iter().map(|b| b.id.clone()).collect();
    let marks = placeholders(ids.len());

    let mut abstracts = grouped(
        conn,
        &format!("SELECT bill_id, abstract, note, date FROM bill_abstracts WHERE bill_id IN ({marks}) ORDER BY bill_id, position"),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                BillAbstract {
                    abstract_text: row.get(1)?,
                    note: row.get(2)?,
                    date: row.get(3)?,
                },
            ))
        },
    )?;
    let mut titles = grouped(
        conn,
        &format!("SELECT bill_id, title, note FROM bill_titles WHERE bill_id IN ({marks}) ORDER BY bill_id, position"),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                BillTitle {
                    title: row.get(1)?,
                    note: row.get(2)?,
                },
            ))
        },
    )?;
    let mut identifiers = grouped(
        conn,
        &format!("SELECT bill_id, identifier, scheme, note FROM bill_identifiers WHERE bill_id IN ({marks}) ORDER BY bill_id, position"),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                BillIdentifier {
                    identifier: row.get(1)?,
                    scheme: row.get(2)?,
                    note: row.get(3)?,
                },
            ))
        },
    )?;

    let mut entities = grouped(
        conn,
        &format!(
            "SELECT e.action_id, e.name, e.entity_type, e.organization_id, e.person_id
             FROM bill_action_entities e JOIN bill_actions a ON a.id = e.action_id
             WHERE a.bill_id IN ({marks}) ORDER BY e.action_id, e.position"
        ),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                RelatedEntity {
                    name: row.get(1)?,
                    entity_type: row.get(2)?,
                    organization_id: row.get(3)?,
                    person_id: row.get(4)?,
                },
            ))
        },
    )?;
    let mut actions = grouped(
        conn,
        &format!(
            "SELECT a.bill_id, a.id, a.organization_id, a.description, a.date, a.classification,
                    a.action_order,
                    (SELECT v.id FROM vote_events v WHERE v.bill_action_id = a.id ORDER BY v.id LIMIT 1)
             FROM bill_actions a WHERE a.bill_id IN ({marks}) ORDER BY a.bill_id, a.action_order"
        ),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                BillAction {
                    id: row.get(1)?,
                    organization_id: row.get(2)?,
                    description: row.get(3)?,
                    date: row.get(4)?,
                    classification: json_col(row, 5)?,
                    order: row.get(6)?,
                    related_entities: Vec::new(),
                    vote_id: row.get(7)?,
                },
            ))
        },
    )?;
    for action in actions.values_mut().flatten() {
        action.related_entities = entities.remove(&action.id).unwrap_or_default();
    }

    let mut sponsorships = grouped(
        conn,
        &format!(
            "SELECT bill_id, name, entity_type, organization_id, person_id, is_primary, classification
             FROM bill_sponsorships WHERE bill_id IN ({marks}) ORDER BY bill_id, id"
        ),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                BillSponsorship {
                    name: row.get(1)?,
                    entity_type: row.get(2)?,
                    organization_id: row.get(3)?,
                    person_id: row.get(4)?,
                    primary: row.get(5)?,
                    classification: row.get(6)?,
                },
            ))
        },
    )?;

    let mut links = grouped(
        conn,
        &format!(
            "SELECT l.document_id, l.url, l.media_type, l.text
             FROM bill_document_links l JOIN bill_documents d ON d.id = l.document_id
             WHERE d.bill_id IN ({marks}) ORDER BY l.document_id, l.position"
        ),
        &ids,
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                DocumentLink {
                    url: row.get(1)?,
                    media_type: row.get(2)?,
                    text: row.get(3)?,
                },
            ))
        },
    )?;
    let mut documents = grouped(
        conn,
        &format!(
            "SELECT bill_id, kind, id, note, date FROM bill_documents
             WHERE bill_id IN ({marks}) ORDER BY bill_id, kind, position"
        ),
        &ids,
        |row| {
            let bill_id: String = row.get(0)?;
            let kind: String = row.get(1)?;
            let document_id: i64 = row.get(2)?;
            Ok((
                (bill_id, kind),
                (
                    document_id,
                    BillDocument {
                        note: row.get(3)?,
                        date: row.get(4)?,
                        links: Vec::new(),
                    },
                ),
            ))
        },
    )?;
    let mut take_documents = |bill_id: &str, kind: &str| -> Vec<BillDocument> {
        documents
            .remove(&(bill_id.to_string(), kind.to_string()))
            .unwrap_or_default()
            .into_iter()
            .map(|(document_id, mut doc)| {
                doc.links = links.remove(&document_id).unwrap_or_default();
                doc
            })
            .collect()
    };

    let mut sources = grouped(
        conn,
        &format!("SELECT bill_id, url, note FROM bill_sources WHERE bill_id IN ({marks}) ORDER BY bill_id, position"),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                Link {
                    url: row.get(1)?,
                    note: row.get(2)?,
                },
            ))
        },
    )?;
    let mut related = grouped(
        conn,
        &format!(
            "SELECT bill_id, identifier, legislative_session, relation_type, related_bill_id
             FROM related_bills WHERE bill_id IN ({marks}) ORDER BY bill_id, position"
        ),
        &ids,
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                RelatedBill {
                    identifier: row.get(1)?,
                    legislative_session: row.get(2)?,
                    relation_type: row.get(3)?,
                    related_bill_id: row.get(4)?,
                },
            ))
        },
    )?;
    let mut full_text: HashMap<String, String> = grouped(
        conn,
        &format!("SELECT bill_id, raw_text FROM bill_search WHERE bill_id IN ({marks})"),
        &ids,
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )?
    .into_iter()
    .filter_map(|(id, mut texts)| texts.pop().map(|text| (id, text)))
    .collect();

    let records = bills
        .into_iter()
        .map(|bill| {
            let id = bill.id.clone();
            BillRecord {
                abstracts: abstracts.remove(&id).unwrap_or_default(),
                other_titles: titles.remove(&id).unwrap_or_default(),
                other_identifiers: identifiers.remove(&id).unwrap_or_default(),
                actions: actions.remove(&id).unwrap_or_default(),
                sponsorships: sponsorships.remove(&id).unwrap_or_default(),
                documents: take_documents(&id, DOC_DOCUMENT),
                versions: take_documents(&id, DOC_VERSION),
                sources: sources.remove(&id).unwrap_or_default(),
                related_bills: related.remove(&id).unwrap_or_default(),
                full_text: full_text.remove(&id).filter(|text| !text.is_empty()),
                bill,
            }
        })
        .collect();
    Ok(records)
}
