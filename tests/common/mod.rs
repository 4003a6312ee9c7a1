//! Shared fixture: two small legislatures (Alaska and Wyoming) with people, a pair of
//! fully populated bills and a couple dozen plain ones, plus Kansas helpers for the
//! name reconciliation tests.
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use openstates_web::domain::*;
use openstates_web::graphql::{create_schema, GraphQLSchema};
use openstates_web::storage::{SqliteStorage, Storage};

pub const AK: &str = "ocd-jurisdiction/country:us/state:ak/government";
pub const WY: &str = "ocd-jurisdiction/country:us/state:wy/government";
pub const KS: &str = "ocd-jurisdiction/country:us/state:ks/government";

pub const HB1_VOTE_UUID: &str = "11111111-1111-4111-8111-111111111111";
pub const SITE_URL: &str = "https://openstates.org";

pub const TOTAL_BILLS: usize = 26;
pub const ALASKA_BILLS: usize = 12;

pub struct Fixture {
    pub storage: Arc<dyn Storage>,
    /// The same store, for its call counter
    pub sqlite: Arc<SqliteStorage>,
    /// Session ids keyed by `(jurisdiction_id, identifier)`
    pub sessions: HashMap<(String, String), i64>,
}

impl Fixture {
    pub fn session(&self, jurisdiction_id: &str, identifier: &str) -> i64 {
        self.sessions[&(jurisdiction_id.to_string(), identifier.to_string())]
    }

    pub fn schema(&self) -> GraphQLSchema {
        create_schema(self.storage.clone(), SITE_URL)
    }
}

pub fn org_id(abbr: &str, classification: &str) -> String {
    format!("ocd-organization/{abbr}-{classification}")
}

pub fn person_id(slug: &str) -> String {
    format!("ocd-person/{slug}")
}

fn ts(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
}

fn jurisdiction_record(abbr: &str, name: &str, sessions: &[&str], chambers: &[(&str, &str)]) -> JurisdictionRecord {
    let jid = format!("ocd-jurisdiction/country:us/state:{abbr}/government");
    let division_id = format!("ocd-division/country:us/state:{abbr}");
    let legislature = Organization {
        id: org_id(abbr, "legislature"),
        name: format!("{name} Legislature"),
        classification: "legislature".into(),
        parent_id: None,
        jurisdiction_id: Some(jid.clone()),
        links: vec![],
        sources: vec![],
        extras: serde_json::Value::Null,
    };
    let mut organizations = vec![legislature];
    for (classification, chamber_name) in chambers {
        organizations.push(Organization {
            id: org_id(abbr, classification),
            name: format!("{name} {chamber_name}"),
            classification: classification.to_string(),
            parent_id: Some(org_id(abbr, "legislature")),
            jurisdiction_id: Some(jid.clone()),
            links: vec![],
            sources: vec![],
            extras: serde_json::Value::Null,
        });
    }

    JurisdictionRecord {
        jurisdiction: Jurisdiction {
            id: jid.clone(),
            name: name.into(),
            url: format!("https://{abbr}.example.gov"),
            classification: "state".into(),
            division_id: Some(division_id.clone()),
        },
        division: Some(Division {
            id: division_id,
            name: name.into(),
        }),
        sessions: sessions
            .iter()
            .map(|s| LegislativeSession {
                id: 0,
                jurisdiction_id: jid.clone(),
                identifier: s.to_string(),
                name: s.to_string(),
                classification: "primary".into(),
                start_date: format!("{s}-01-01"),
                end_date: String::new(),
            })
            .collect(),
        organizations,
        posts: vec![],
    }
}

pub struct Seat<'a> {
    pub abbr: &'a str,
    pub chamber: &'a str,
    pub district: &'a str,
}

impl Seat<'_> {
    pub fn post(&self) -> Post {
        let letter = if self.chamber == "lower" { "l" } else { "u" };
        Post {
            id: format!("ocd-post/{}-{}-{}", self.abbr, self.chamber, self.district),
            organization_id: org_id(self.abbr, self.chamber),
            label: self.district.to_string(),
            role: if self.chamber == "lower" { "Representative" } else { "Senator" }.into(),
            division_id: Some(format!(
                "ocd-division/country:us/state:{}/sld{}:{}",
                self.abbr,
                letter,
                self.district.to_lowercase()
            )),
        }
    }
}

pub fn make_person(slug: &str, name: &str, jid: &str, seat: &Seat<'_>, party: &str) -> PersonRecord {
    let post = seat.post();
    PersonRecord {
        person: Person {
            id: person_id(slug),
            name: name.into(),
            sort_name: name.into(),
            given_name: String::new(),
            family_name: String::new(),
            image: String::new(),
            email: String::new(),
            primary_party: party.into(),
            current_jurisdiction_id: Some(jid.into()),
            current_role: Some(CurrentRole {
                title: post.role.clone(),
                org_classification: seat.chamber.into(),
                district: seat.district.into(),
                division_id: post.division_id.clone(),
            }),
            created_at: ts(0),
            updated_at: ts(0),
        },
        memberships: vec![Membership {
            id: format!("ocd-membership/{slug}-seat"),
            person_id: person_id(slug),
            organization_id: org_id(seat.abbr, seat.chamber),
            post_id: Some(post.id),
            post: None,
            role: post.role,
            start_date: String::new(),
            end_date: String::new(),
        }],
        party_memberships: vec![party.into()],
    }
}

fn bill(id: &str, session_id: i64, identifier: &str, title: &str, org: String, classification: &[&str], subject: Vec<String>, updated: DateTime<Utc>) -> Bill {
    Bill {
        id: id.into(),
        legislative_session_id: session_id,
        identifier: identifier.into(),
        title: title.into(),
        from_organization_id: org,
        classification: classification.iter().map(|c| c.to_string()).collect(),
        subject,
        first_action_date: String::new(),
        latest_action_date: String::new(),
        latest_action_description: String::new(),
        latest_passage_date: String::new(),
        extras: serde_json::Value::Null,
        created_at: updated,
        updated_at: updated,
    }
}

fn action(order: i64, date: &str, description: &str, org: String, classification: &[&str]) -> BillAction {
    BillAction {
        id: String::new(),
        organization_id: org,
        description: description.into(),
        date: date.into(),
        classification: classification.iter().map(|c| c.to_string()).collect(),
        order,
        related_entities: vec![],
        vote_id: None,
    }
}

fn link(url: &str, media_type: &str) -> DocumentLink {
    DocumentLink {
        url: url.into(),
        media_type: media_type.into(),
        text: String::new(),
    }
}

fn source(url: &str) -> Link {
    Link {
        url: url.into(),
        note: String::new(),
    }
}

fn person_vote(option: &str, name: &str, voter: Option<String>) -> PersonVote {
    PersonVote {
        id: 0,
        vote_event_id: String::new(),
        option: option.into(),
        voter_name: name.into(),
        voter_id: voter,
        note: String::new(),
    }
}

fn vote_event(id: String, bill_id: &str, session_id: i64, org: String, motion: &str, result: &str) -> VoteEvent {
    VoteEvent {
        id,
        identifier: String::new(),
        motion_text: motion.into(),
        motion_classification: vec!["passage".into()],
        start_date: "2018-03-01".into(),
        result: result.into(),
        organization_id: org,
        legislative_session_id: session_id,
        bill_id: Some(bill_id.into()),
        bill_action_id: None,
        created_at: ts(0),
        updated_at: ts(0),
    }
}

async fn save_jurisdiction(storage: &dyn Storage, record: JurisdictionRecord, sessions: &mut HashMap<(String, String), i64>) -> Result<()> {
    for s in storage.save_jurisdiction(&record).await? {
        sessions.insert((s.jurisdiction_id.clone(), s.identifier.clone()), s.id);
    }
    Ok(())
}

/// Alaska and Wyoming with 26 bills between them, 12 of which are Alaskan.
pub async fn populate() -> Result<Fixture> {
    let sqlite = Arc::new(SqliteStorage::open_in_memory()?);
    let storage: Arc<dyn Storage> = sqlite.clone();
    let mut sessions = HashMap::new();

    let people: Vec<(&str, &str, Seat, &str)> = vec![
        ("amanda", "Amanda Adams", Seat { abbr: "ak", chamber: "lower", district: "1" }, "Republican"),
        ("bob", "Bob Birch", Seat { abbr: "ak", chamber: "lower", district: "2" }, "Republican"),
        ("carrie", "Carrie Carr", Seat { abbr: "ak", chamber: "lower", district: "3" }, "Democratic"),
        ("don", "Don Dingle", Seat { abbr: "ak", chamber: "lower", district: "4" }, "Republican"),
        ("ellen", "Ellen Evil", Seat { abbr: "ak", chamber: "upper", district: "A" }, "Independent"),
        ("frank", "Frank Fur", Seat { abbr: "ak", chamber: "upper", district: "B" }, "Democratic"),
        ("rhonda", "Rhonda Retired", Seat { abbr: "ak", chamber: "upper", district: "B" }, "Democratic"),
        ("greta", "Greta Gonzalez", Seat { abbr: "wy", chamber: "lower", district: "1" }, "Democratic"),
        ("hank", "Hank Horn", Seat { abbr: "wy", chamber: "lower", district: "1" }, "Republican"),
    ];

    let chambers = [("lower", "House"), ("upper", "Senate")];
    let mut alaska = jurisdiction_record("ak", "Alaska", &["2017", "2018"], &chambers);
    let mut wyoming = jurisdiction_record("wy", "Wyoming", &["2017", "2018"], &chambers);
    let former_seat = Seat { abbr: "ak", chamber: "lower", district: "5" };
    alaska.posts.push(former_seat.post());
    for (_, _, seat, _) in &people {
        let post = seat.post();
        let target = if seat.abbr == "ak" { &mut alaska } else { &mut wyoming };
        if !target.posts.iter().any(|p| p.id == post.id) {
            target.posts.push(post);
        }
    }
    save_jurisdiction(storage.as_ref(), alaska, &mut sessions).await?;
    save_jurisdiction(storage.as_ref(), wyoming, &mut sessions).await?;

    for (slug, name, seat, party) in &people {
        let jid = if seat.abbr == "ak" { AK } else { WY };
        let mut record = make_person(slug, name, jid, seat, party);
        match *slug {
            "ellen" => record.memberships.push(Membership {
                id: "ocd-membership/ellen-former".into(),
                person_id: person_id("ellen"),
                organization_id: org_id("ak", "lower"),
                post_id: Some(former_seat.post().id),
                post: None,
                role: "Representative".into(),
                start_date: String::new(),
                end_date: "2017-01-01".into(),
            }),
            "rhonda" => {
                for m in &mut record.memberships {
                    m.end_date = "2017-01-01".into();
                }
                record.party_memberships.clear();
                record.person.current_role = None;
            }
            _ => {}
        }
        storage.save_person(&record).await?;
    }

    let ak_2018 = sessions[&(AK.to_string(), "2018".to_string())];
    let mut updated = 0;

    // SB 9 first so HB 1 can link to it as a companion
    let mut sb9 = BillRecord::new(bill(
        "ocd-bill/3",
        ak_2018,
        "SB 9",
        "Alces alces Freedom Act",
        org_id("ak", "upper"),
        &["bill", "constitutional amendment"],
        vec!["nature".into()],
        ts(updated),
    ));
    sb9.sponsorships.push(BillSponsorship {
        name: "Beth Two".into(),
        entity_type: "person".into(),
        organization_id: None,
        person_id: Some(person_id("amanda")),
        primary: false,
        classification: "cosponsor".into(),
    });
    storage.save_bill(&sb9).await?;
    updated += 1;

    let house = org_id("ak", "lower");
    let mut hb1 = BillRecord::new(bill(
        "ocd-bill/1",
        ak_2018,
        "HB 1",
        "Moose Freedom Act",
        house.clone(),
        &["bill", "constitutional amendment"],
        vec!["nature".into()],
        ts(updated),
    ));
    hb1.abstracts = vec![
        BillAbstract {
            abstract_text: "Grants all moose equal rights under the law.".into(),
            ..Default::default()
        },
        BillAbstract {
            abstract_text: "Ensure moose freedom.".into(),
            ..Default::default()
        },
    ];
    hb1.other_titles = ["Moosemendment", "Moose & Reindeer Freedom Act", "M.O.O.S.E."]
        .iter()
        .map(|t| BillTitle {
            title: t.to_string(),
            note: String::new(),
        })
        .collect();
    hb1.other_identifiers = ["HCA 1", "SB 1"]
        .iter()
        .map(|i| BillIdentifier {
            identifier: i.to_string(),
            ..Default::default()
        })
        .collect();
    let mut introduced = action(10, "2018-01-01", "Introduced", house.clone(), &[]);
    introduced.related_entities.push(RelatedEntity {
        name: "Amanda Adams".into(),
        entity_type: "person".into(),
        organization_id: None,
        person_id: Some(person_id("amanda")),
    });
    let mut passed = action(30, "2018-03-01", "Passed House", house.clone(), &["passage"]);
    passed.related_entities.push(RelatedEntity {
        name: "House".into(),
        entity_type: "organization".into(),
        organization_id: Some(house.clone()),
        person_id: None,
    });
    hb1.actions = vec![
        introduced,
        action(20, "2018-02-01", "Amended", house.clone(), &[]),
        passed,
    ];
    hb1.sponsorships = vec![
        BillSponsorship {
            name: "Adam One".into(),
            entity_type: "person".into(),
            organization_id: None,
            person_id: None,
            primary: true,
            classification: "sponsor".into(),
        },
        BillSponsorship {
            name: "Beth Two".into(),
            entity_type: "person".into(),
            organization_id: None,
            person_id: Some(person_id("amanda")),
            primary: false,
            classification: "cosponsor".into(),
        },
    ];
    hb1.documents = vec![
        BillDocument {
            note: "Fiscal Note".into(),
            date: String::new(),
            links: vec![link("https://example.com/fn", "")],
        },
        BillDocument {
            note: "Legal Justification".into(),
            date: String::new(),
            links: vec![link("https://example.com/lj", "")],
        },
    ];
    hb1.versions = vec![
        BillDocument {
            note: "First Draft".into(),
            date: "2017-01-01".into(),
            links: vec![
                link("https://example.com/1.txt", "text/plain"),
                link("https://example.com/1.pdf", "application/pdf"),
            ],
        },
        BillDocument {
            note: "Final Draft".into(),
            date: "2017-06-01".into(),
            links: vec![
                link("https://example.com/f.txt", "text/plain"),
                link("https://example.com/f.pdf", "application/pdf"),
            ],
        },
    ];
    hb1.sources = ["https://example.com/s1", "https://example.com/s2", "https://example.com/s3"]
        .iter()
        .map(|u| source(u))
        .collect();
    hb1.related_bills = vec![RelatedBill {
        identifier: "SB 9".into(),
        legislative_session: "2018".into(),
        relation_type: "companion".into(),
        related_bill_id: None,
    }];
    hb1.full_text = Some("shove some text in here and include a weird word like gorgonzola".into());
    storage.save_bill(&hb1).await?;
    updated += 1;

    let mut hb1_vote = VoteEventRecord::new(vote_event(
        format!("ocd-vote/{HB1_VOTE_UUID}"),
        "ocd-bill/1",
        ak_2018,
        house.clone(),
        "Vote on House Passage",
        "failed",
    ));
    hb1_vote.counts = vec![
        VoteCount { option: "yes".into(), value: 1 },
        VoteCount { option: "no".into(), value: 4 },
    ];
    hb1_vote.votes = vec![
        person_vote("yes", "Amanda Adams", Some(person_id("amanda"))),
        person_vote("no", "Birch", Some(person_id("bob"))),
        person_vote("no", "Carr", Some(person_id("carrie"))),
        person_vote("no", "Dingle", Some(person_id("don"))),
        person_vote("no", "Speaker", None),
    ];
    storage.save_vote_event(&hb1_vote).await?;

    // plain bills: 10 in Alaska, 14 in Wyoming
    let prefixes = ["HB", "SB", "HR", "SR"];
    let mut vote_seq = 0;
    for (abbr, jid, count) in [("ak", AK, 10), ("wy", WY, 14)] {
        for i in 0..count {
            let session = if i % 2 == 0 { "2017" } else { "2018" };
            let chamber = if (i / 2) % 2 == 0 { "lower" } else { "upper" };
            let classification = if i % 3 == 0 { "resolution" } else { "bill" };
            let subjects = (0..10)
                .map(|k| ((b'a' + ((7 * i + 3 * k) % 26) as u8) as char).to_string())
                .collect();
            let session_id = sessions[&(jid.to_string(), session.to_string())];
            let id = format!("ocd-bill/{abbr}-{i}");
            let mut record = BillRecord::new(bill(
                &id,
                session_id,
                &format!("{} {}", prefixes[i % 4], 1000 + i),
                "Bill Title",
                org_id(abbr, chamber),
                &[classification],
                subjects,
                ts(updated),
            ));
            record.actions.push(action(10, "2018-01-01", "Introduced", org_id(abbr, chamber), &[]));
            storage.save_bill(&record).await?;
            updated += 1;

            for n in 0..(i % 2 + 1) {
                vote_seq += 1;
                let mut vote = VoteEventRecord::new(vote_event(
                    format!("ocd-vote/00000000-0000-4000-8000-{vote_seq:012}"),
                    &id,
                    session_id,
                    org_id(abbr, chamber),
                    "Motion Text",
                    if n == 0 { "passed" } else { "failed" },
                ));
                vote.counts = vec![
                    VoteCount { option: "yes".into(), value: (i % 10) as i64 },
                    VoteCount { option: "no".into(), value: (n % 10) as i64 },
                ];
                vote.votes = (0..(i % 5 + 1))
                    .map(|m| person_vote(if m % 2 == 0 { "yes" } else { "no" }, "Voter", None))
                    .collect();
                storage.save_vote_event(&vote).await?;
            }
        }
    }

    Ok(Fixture { storage, sqlite, sessions })
}

/// Kansas with a 2020 session and both chambers, for the reconciliation tests.
pub async fn kansas() -> Result<Fixture> {
    let sqlite = Arc::new(SqliteStorage::open_in_memory()?);
    let storage: Arc<dyn Storage> = sqlite.clone();
    let mut sessions = HashMap::new();
    let record = jurisdiction_record("ks", "Kansas", &["2020"], &[("lower", "House"), ("upper", "Senate")]);
    save_jurisdiction(storage.as_ref(), record, &mut sessions).await?;
    Ok(Fixture { storage, sqlite, sessions })
}

/// Save a legislator holding `seat`, returning their id.
pub async fn add_person(fixture: &Fixture, jid: &str, slug: &str, name: &str, seat: Seat<'_>) -> Result<String> {
    let record = make_person(slug, name, jid, &seat, "Republican");
    fixture.storage.save_person(&record).await?;
    Ok(record.person.id)
}

/// A lower chamber bill with the given identifier, e.g. one with a `-A` suffix.
pub async fn create_named_bill(fixture: &Fixture, jid: &str, session: &str, identifier: &str) -> Result<String> {
    let abbr = openstates_web::jurisdictions::jid_to_abbr(jid).unwrap_or_default();
    let id = format!("ocd-bill/{abbr}-{}", identifier.replace(' ', "").to_lowercase());
    let record = BillRecord::new(bill(
        &id,
        fixture.session(jid, session),
        identifier,
        "Named Bill",
        org_id(&abbr, "lower"),
        &["bill"],
        vec![],
        ts(0),
    ));
    fixture.storage.save_bill(&record).await?;
    Ok(id)
}

/// A bill in `session` with `sponsors` unmatched sponsorships named "Someone".
pub async fn create_test_bill(fixture: &Fixture, jid: &str, session: &str, chamber: &str, sponsors: usize) -> Result<String> {
    let abbr = openstates_web::jurisdictions::jid_to_abbr(jid).unwrap_or_default();
    let session_id = fixture.session(jid, session);
    let n = fixture
        .storage
        .count_bills(&openstates_web::storage::BillFilter {
            jurisdiction_id: Some(jid.into()),
            ..Default::default()
        })
        .await?;
    let id = format!("ocd-bill/{abbr}-test-{n}");
    let mut record = BillRecord::new(bill(
        &id,
        session_id,
        &format!("HB {}", 100 + n),
        "Test Bill",
        org_id(&abbr, chamber),
        &["bill"],
        vec![],
        ts(n as i64),
    ));
    record.sponsorships = (0..sponsors)
        .map(|_| BillSponsorship {
            name: "Someone".into(),
            entity_type: "person".into(),
            organization_id: None,
            person_id: None,
            primary: true,
            classification: "sponsor".into(),
        })
        .collect();
    fixture.storage.save_bill(&record).await?;
    Ok(id)
}

/// A vote on `bill_id` where every voter is unmatched.
pub async fn create_test_vote(fixture: &Fixture, bill_id: &str, yes_votes: &[&str], no_votes: &[&str]) -> Result<String> {
    let bill = fixture
        .storage
        .get_bills_by_ids(&[bill_id.to_string()])
        .await?
        .into_iter()
        .next()
        .expect("bill exists");
    let existing = fixture.storage.count_votes_for_bill(bill_id).await?;
    let id = format!("ocd-vote/{}-{}", bill_id.trim_start_matches("ocd-bill/"), existing);
    let mut record = VoteEventRecord::new(vote_event(
        id.clone(),
        bill_id,
        bill.legislative_session_id,
        bill.from_organization_id.clone(),
        "Test Vote",
        "passed",
    ));
    record.counts = vec![
        VoteCount { option: "yes".into(), value: yes_votes.len() as i64 },
        VoteCount { option: "no".into(), value: no_votes.len() as i64 },
    ];
    record.votes = yes_votes
        .iter()
        .map(|n| person_vote("yes", n, None))
        .chain(no_votes.iter().map(|n| person_vote("no", n, None)))
        .collect();
    fixture.storage.save_vote_event(&record).await?;
    Ok(id)
}

/// Three Kansas bills whose action dates order differently by first and latest action.
pub async fn sortable_bills(fixture: &Fixture) -> Result<()> {
    let session_id = fixture.session(KS, "2020");
    let house = org_id("ks", "lower");
    let specs = [
        ("A", [("2020-01-01", 1), ("2020-04-01", 2)]),
        ("B", [("2020-02-01", 1), ("2020-02-15", 2)]),
        ("C", [("2020-03-01", 1), ("2020-03-15", 2)]),
    ];
    for (n, (identifier, actions)) in specs.iter().enumerate() {
        let mut record = BillRecord::new(bill(
            &format!("ocd-bill/ks-sort-{identifier}"),
            session_id,
            identifier,
            "Sortable",
            house.clone(),
            &["bill"],
            vec![],
            ts(n as i64),
        ));
        record.actions = actions
            .iter()
            .map(|(date, order)| action(*order, date, "Action", house.clone(), &[]))
            .collect();
        fixture.storage.save_bill(&record).await?;
    }
    Ok(())
}

/// Run a query, returning the `data` member as JSON and the error messages.
pub async fn run(schema: &GraphQLSchema, query: &str) -> Result<(serde_json::Value, Vec<String>)> {
    let response = schema.execute(query).await;
    let errors = response.errors.iter().map(|e| e.message.clone()).collect();
    Ok((response.data.into_json()?, errors))
}
