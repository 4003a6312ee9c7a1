mod common;

use anyhow::Result;
use common::{create_test_bill, create_test_vote, kansas, KS};
use openstates_web::admin;
use openstates_web::admin::changes::{self, NewPersonRequest, PersonDeltaRequest, RetirementRequest};
use openstates_web::domain::{NameStatus, PullStatus, UnmatchedName};
use openstates_web::error::AppError;
use serde_json::json;
use openstates_web::storage::Storage;

async fn names_by_name(storage: &dyn Storage) -> Result<Vec<UnmatchedName>> {
    let mut names = admin::unmatched_names(storage, "ks", "2020").await?;
    names.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(names)
}

#[tokio::test]
async fn test_check_sponsorships() -> Result<()> {
    let ks = kansas().await?;
    create_test_bill(&ks, KS, "2020", "upper", 0).await?;
    create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_bill(&ks, KS, "2020", "upper", 1).await?;

    let session = admin::find_session(ks.storage.as_ref(), "ks", "2020").await?;
    let missing = admin::check_sponsorships(ks.storage.as_ref(), &session).await?;
    assert_eq!(missing.len(), 1);
    assert_eq!(missing["Someone"], 2);
    Ok(())
}

#[tokio::test]
async fn test_check_votes() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 0).await?;
    create_test_vote(&ks, &b, &[], &[]).await?;
    create_test_vote(&ks, &b, &["A", "Someone"], &["C"]).await?;
    let b2 = create_test_bill(&ks, KS, "2020", "upper", 0).await?;
    create_test_vote(&ks, &b2, &[], &["A", "C"]).await?;

    let session = admin::find_session(ks.storage.as_ref(), "ks", "2020").await?;
    let missing = admin::check_votes(ks.storage.as_ref(), &session).await?;
    assert_eq!(missing.len(), 3);
    assert_eq!(missing["A"], 2);
    assert_eq!(missing["Someone"], 1);
    assert_eq!(missing["C"], 2);
    Ok(())
}

#[tokio::test]
async fn test_update_unmatched() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_vote(&ks, &b, &["Someone"], &["Someone Else"]).await?;

    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    assert_eq!(unmatched.len(), 2);
    assert_eq!(unmatched[0].name, "Someone");
    assert_eq!(unmatched[0].sponsorships_count, 1);
    assert_eq!(unmatched[0].votes_count, 1);
    assert_eq!(unmatched[1].name, "Someone Else");
    assert_eq!(unmatched[1].sponsorships_count, 0);
    assert_eq!(unmatched[1].votes_count, 1);
    assert_eq!(unmatched[0].status, NameStatus::Unmatched);
    Ok(())
}

#[tokio::test]
async fn test_update_unmatched_keeps_review_status() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_vote(&ks, &b, &["Someone"], &["Someone Else"]).await?;
    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    admin::set_status(ks.storage.as_ref(), unmatched[0].id, NameStatus::Ignored).await?;
    admin::set_status(ks.storage.as_ref(), unmatched[1].id, NameStatus::SourceError).await?;

    let outcome = admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;
    assert_eq!(outcome.removed, 0);

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    assert_eq!(unmatched.len(), 2);
    assert_eq!(unmatched[0].status, NameStatus::Ignored);
    assert_eq!(unmatched[1].status, NameStatus::SourceError);
    Ok(())
}

#[tokio::test]
async fn test_update_unmatched_removes_vanished_names() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_vote(&ks, &b, &["Someone"], &["Someone Else"]).await?;
    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;

    ks.storage.delete_votes_for_bill(&b).await?;
    let outcome = admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;
    assert_eq!(outcome.removed, 1);

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].name, "Someone");
    assert_eq!(unmatched[0].votes_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_set_status_refuses_matched_person() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_vote(&ks, &b, &["Someone"], &[]).await?;
    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    let result = admin::set_status(ks.storage.as_ref(), unmatched[0].id, NameStatus::MatchedPerson).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_not_found() -> Result<()> {
    let ks = kansas().await?;
    let err = admin::update_unmatched(ks.storage.as_ref(), "ks", "1999").await.unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    Ok(())
}

#[tokio::test]
async fn test_apply_match_links_sponsorships_and_votes() -> Result<()> {
    let ks = kansas().await?;
    let senator = common::add_person(
        &ks,
        KS,
        "someone",
        "Someone Senator",
        common::Seat { abbr: "ks", chamber: "upper", district: "1" },
    )
    .await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_vote(&ks, &b, &["Someone"], &["Someone Else"]).await?;
    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    let linked = admin::apply_match(ks.storage.as_ref(), unmatched[0].id, &senator).await?;
    assert_eq!(linked, 2);

    let name = ks.storage.get_unmatched_name(unmatched[0].id).await?.unwrap();
    assert_eq!(name.status, NameStatus::MatchedPerson);
    assert_eq!(name.matched_person_id.as_deref(), Some(senator.as_str()));

    let session = admin::find_session(ks.storage.as_ref(), "ks", "2020").await?;
    assert!(admin::check_sponsorships(ks.storage.as_ref(), &session).await?.is_empty());
    let votes = admin::check_votes(ks.storage.as_ref(), &session).await?;
    assert_eq!(votes.len(), 1);
    assert_eq!(votes["Someone Else"], 1);
    Ok(())
}

#[tokio::test]
async fn test_apply_match_requires_existing_person() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 1).await?;
    create_test_vote(&ks, &b, &[], &[]).await?;
    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;

    let unmatched = names_by_name(ks.storage.as_ref()).await?;
    let result = admin::apply_match(ks.storage.as_ref(), unmatched[0].id, "ocd-person/nobody").await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_match_unmatched_name_links_and_marks_together() -> Result<()> {
    let ks = kansas().await?;
    let b = create_test_bill(&ks, KS, "2020", "upper", 2).await?;
    create_test_vote(&ks, &b, &["Someone"], &[]).await?;
    admin::update_unmatched(ks.storage.as_ref(), "ks", "2020").await?;
    let someone = names_by_name(ks.storage.as_ref()).await?.remove(0);

    let linked = ks
        .storage
        .match_unmatched_name(someone.id, "ocd-person/someone")
        .await?;
    assert_eq!(linked, Some(3));
    let name = ks.storage.get_unmatched_name(someone.id).await?.unwrap();
    assert_eq!(name.status, NameStatus::MatchedPerson);
    assert_eq!(name.matched_person_id.as_deref(), Some("ocd-person/someone"));

    // unknown names touch nothing
    assert_eq!(ks.storage.match_unmatched_name(someone.id + 100, "ocd-person/x").await?, None);
    Ok(())
}

async fn senator(ks: &common::Fixture) -> Result<String> {
    common::add_person(
        ks,
        KS,
        "sen-smith",
        "Sam Smith",
        common::Seat { abbr: "ks", chamber: "upper", district: "1" },
    )
    .await
}

fn retirement(person_id: &str, date: &str) -> RetirementRequest {
    RetirementRequest {
        person_id: person_id.to_string(),
        date: date.to_string(),
        reason: "resigned".into(),
        is_dead: false,
        vacant_seat: true,
    }
}

#[tokio::test]
async fn test_retire_person_records_change_set() -> Result<()> {
    let ks = kansas().await?;
    let person_id = senator(&ks).await?;

    let record = changes::retire_person(ks.storage.as_ref(), retirement(&person_id, "2021-01-04"), "staff").await?;
    assert_eq!(record.delta_set.name, "retire Sam Smith");
    assert_eq!(record.delta_set.pr_status, PullStatus::NotCreated);
    assert_eq!(record.delta_set.created_by, "staff");
    assert_eq!(record.person_retirements.len(), 1);
    assert_eq!(record.person_retirements[0].person_id, person_id);
    assert_eq!(record.person_retirements[0].date, "2021-01-04");
    assert!(record.person_retirements[0].vacant_seat);

    let bad_date = changes::retire_person(ks.storage.as_ref(), retirement(&person_id, "Jan 4"), "staff").await;
    assert!(matches!(bad_date, Err(AppError::Validation(_))));
    let nobody = changes::retire_person(ks.storage.as_ref(), retirement("ocd-person/nobody", "2021-01-04"), "staff").await;
    assert!(matches!(nobody, Err(AppError::NotFound(_))));
    assert_eq!(changes::list_delta_sets(ks.storage.as_ref(), None).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_propose_new_person() -> Result<()> {
    let ks = kansas().await?;
    let request = NewPersonRequest {
        name: " Pat Doe ".into(),
        state: "KS".into(),
        district: "12".into(),
        chamber: "lower".into(),
    };
    let record = changes::propose_new_person(ks.storage.as_ref(), request.clone(), "staff").await?;
    assert_eq!(record.delta_set.name, "add Pat Doe");
    assert_eq!(record.new_people.len(), 1);
    assert_eq!(record.new_people[0].name, "Pat Doe");
    assert_eq!(record.new_people[0].state, "ks");
    assert_eq!(record.new_people[0].chamber, "lower");

    let unknown_state = NewPersonRequest { state: "zz".into(), ..request.clone() };
    assert!(matches!(
        changes::propose_new_person(ks.storage.as_ref(), unknown_state, "staff").await,
        Err(AppError::Validation(_))
    ));
    let unknown_chamber = NewPersonRequest { chamber: "house".into(), ..request.clone() };
    assert!(matches!(
        changes::propose_new_person(ks.storage.as_ref(), unknown_chamber, "staff").await,
        Err(AppError::Validation(_))
    ));
    let no_district = NewPersonRequest { district: " ".into(), ..request };
    assert!(matches!(
        changes::propose_new_person(ks.storage.as_ref(), no_district, "staff").await,
        Err(AppError::Validation(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_propose_person_changes() -> Result<()> {
    let ks = kansas().await?;
    let person_id = senator(&ks).await?;
    let deltas = vec![PersonDeltaRequest {
        person_id: person_id.clone(),
        data_changes: json!({"email": "sam@example.com"}),
    }];
    let record = changes::propose_person_changes(ks.storage.as_ref(), "fix email", deltas, "staff").await?;
    assert_eq!(record.person_deltas.len(), 1);
    assert_eq!(record.person_deltas[0].data_changes["email"], "sam@example.com");

    let empty = vec![PersonDeltaRequest {
        person_id: person_id.clone(),
        data_changes: json!({}),
    }];
    assert!(matches!(
        changes::propose_person_changes(ks.storage.as_ref(), "nothing", empty, "staff").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        changes::propose_person_changes(ks.storage.as_ref(), "none", vec![], "staff").await,
        Err(AppError::Validation(_))
    ));
    // a rejected request leaves nothing behind
    assert_eq!(changes::list_delta_sets(ks.storage.as_ref(), None).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_pull_status_moves_forward_only() -> Result<()> {
    let ks = kansas().await?;
    let person_id = senator(&ks).await?;
    let id = changes::retire_person(ks.storage.as_ref(), retirement(&person_id, "2021-01-04"), "staff")
        .await?
        .delta_set
        .id;

    // opening a pull request needs its url
    assert!(matches!(
        changes::update_pull_status(ks.storage.as_ref(), id, PullStatus::Created, None).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        changes::update_pull_status(ks.storage.as_ref(), id, PullStatus::Merged, None).await,
        Err(AppError::Validation(_))
    ));

    let url = "https://github.com/openstates/people/pull/1";
    let created = changes::update_pull_status(ks.storage.as_ref(), id, PullStatus::Created, Some(url)).await?;
    assert_eq!(created.pr_status, PullStatus::Created);
    assert_eq!(created.pr_url, url);

    let merged = changes::update_pull_status(ks.storage.as_ref(), id, PullStatus::Merged, None).await?;
    assert_eq!(merged.pr_status, PullStatus::Merged);
    assert_eq!(merged.pr_url, url);
    assert!(matches!(
        changes::update_pull_status(ks.storage.as_ref(), id, PullStatus::Rejected, None).await,
        Err(AppError::Validation(_))
    ));

    assert!(changes::list_delta_sets(ks.storage.as_ref(), Some(PullStatus::NotCreated)).await?.is_empty());
    assert_eq!(changes::list_delta_sets(ks.storage.as_ref(), Some(PullStatus::Merged)).await?.len(), 1);
    assert!(matches!(
        changes::update_pull_status(ks.storage.as_ref(), id + 1, PullStatus::Created, Some(url)).await,
        Err(AppError::NotFound(_))
    ));
    Ok(())
}
