mod common;

use anyhow::Result;
use common::{create_named_bill, kansas, populate, sortable_bills, HB1_VOTE_UUID, KS, SITE_URL};
use openstates_web::error::AppError;
use openstates_web::storage::Storage;
use openstates_web::web::views::bill::{bill_detail, Stage};
use openstates_web::web::views::bills::{bill_list, BillListContext, BillListParams};
use openstates_web::web::views::feed::bills_feed;
use openstates_web::web::views::vote::vote_detail;

async fn list(storage: &dyn Storage, abbr: &str, params: BillListParams) -> Result<BillListContext> {
    Ok(bill_list(storage, abbr, params).await?)
}

fn identifiers(ctx: &BillListContext) -> Vec<String> {
    ctx.bills.iter().map(|b| b.bill.identifier.clone()).collect()
}

#[tokio::test]
async fn test_bills_view_basics() -> Result<()> {
    let fixture = populate().await?;
    let ctx = list(fixture.storage.as_ref(), "ak", BillListParams::default()).await?;

    assert_eq!(ctx.chambers.len(), 2);
    assert_eq!(ctx.sessions.len(), 2);
    assert!(ctx.subjects.iter().any(|s| s == "nature"));
    assert!(ctx.subjects.len() > 10);
    assert_eq!(ctx.sponsors.len(), 7);
    assert_eq!(ctx.classifications.len(), 3);
    assert_eq!(ctx.bills.len(), 12);
    assert_eq!(ctx.pagination.total, 12);
    assert_eq!(ctx.pagination.num_pages, 1);
    assert!(ctx.bills.iter().all(|b| b.url.starts_with("/ak/bills/")));
    Ok(())
}

#[tokio::test]
async fn test_bills_view_uppercase_state() -> Result<()> {
    let fixture = populate().await?;
    let ctx = list(fixture.storage.as_ref(), "AK", BillListParams::default()).await?;
    assert_eq!(ctx.page_info.state, "ak");
    Ok(())
}

#[tokio::test]
async fn test_bills_view_query() -> Result<()> {
    let fixture = populate().await?;
    for query in ["moose", "gorgonzola", "HB 1", "hb 1"] {
        let params = BillListParams {
            query: Some(query.into()),
            ..Default::default()
        };
        let ctx = list(fixture.storage.as_ref(), "ak", params).await?;
        assert_eq!(identifiers(&ctx), vec!["HB 1"], "query {query}");
    }
    Ok(())
}

#[tokio::test]
async fn test_bills_view_chamber_and_session() -> Result<()> {
    let fixture = populate().await?;
    let storage = fixture.storage.as_ref();

    let lower = list(storage, "ak", BillListParams { chamber: Some("lower".into()), ..Default::default() }).await?;
    let upper = list(storage, "ak", BillListParams { chamber: Some("upper".into()), ..Default::default() }).await?;
    assert_eq!(lower.bills.len() + upper.bills.len(), 12);
    assert!(lower.bills.iter().all(|b| b.chamber == "lower"));

    let s2017 = list(storage, "ak", BillListParams { session: Some("2017".into()), ..Default::default() }).await?;
    let s2018 = list(storage, "ak", BillListParams { session: Some("2018".into()), ..Default::default() }).await?;
    assert_eq!(s2017.bills.len() + s2018.bills.len(), 12);
    assert!(s2018.bills.iter().all(|b| b.session == "2018"));
    Ok(())
}

#[tokio::test]
async fn test_bills_view_sponsor() -> Result<()> {
    let fixture = populate().await?;
    let params = BillListParams {
        sponsor: Some("ocd-person/amanda".into()),
        ..Default::default()
    };
    let ctx = list(fixture.storage.as_ref(), "ak", params).await?;
    assert_eq!(ctx.bills.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_bills_view_classification_subject_status() -> Result<()> {
    let fixture = populate().await?;
    let storage = fixture.storage.as_ref();

    let params = BillListParams {
        classification: Some("constitutional amendment".into()),
        ..Default::default()
    };
    assert_eq!(list(storage, "ak", params).await?.bills.len(), 2);

    let params = BillListParams {
        subjects: Some("nature".into()),
        ..Default::default()
    };
    assert_eq!(list(storage, "ak", params).await?.bills.len(), 2);

    let params = BillListParams {
        status: Some("passed-lower-chamber".into()),
        ..Default::default()
    };
    assert_eq!(identifiers(&list(storage, "ak", params).await?), vec!["HB 1"]);

    let params = BillListParams {
        status: Some("napping".into()),
        ..Default::default()
    };
    assert!(bill_list(storage, "ak", params).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_bills_view_bad_page() -> Result<()> {
    let fixture = populate().await?;
    for page in ["A", "0", "9"] {
        let params = BillListParams {
            page: Some(page.into()),
            ..Default::default()
        };
        let result = bill_list(fixture.storage.as_ref(), "ak", params).await;
        assert!(matches!(result, Err(AppError::NotFound(_))), "page {page}");
    }
    Ok(())
}

#[tokio::test]
async fn test_bills_view_unknown_state() -> Result<()> {
    let fixture = populate().await?;
    let result = bill_list(fixture.storage.as_ref(), "zz", BillListParams::default()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    let result = bill_list(fixture.storage.as_ref(), "a1", BillListParams::default()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_bills_view_sort() -> Result<()> {
    let ks = kansas().await?;
    sortable_bills(&ks).await?;
    let storage = ks.storage.as_ref();

    let sorted = |sort: &str| BillListParams {
        sort: Some(sort.into()),
        ..Default::default()
    };
    assert_eq!(identifiers(&list(storage, "ks", sorted("latest_action")).await?), vec!["B", "C", "A"]);
    assert_eq!(identifiers(&list(storage, "ks", sorted("-latest_action")).await?), vec!["A", "C", "B"]);
    assert_eq!(identifiers(&list(storage, "ks", sorted("first_action")).await?), vec!["A", "B", "C"]);
    assert_eq!(identifiers(&list(storage, "ks", sorted("-first_action")).await?), vec!["C", "B", "A"]);
    // unknown sorts fall back to most recent action first
    assert_eq!(identifiers(&list(storage, "ks", sorted("bogus")).await?), vec!["A", "C", "B"]);
    Ok(())
}

#[tokio::test]
async fn test_bill_view() -> Result<()> {
    let fixture = populate().await?;
    let ctx = bill_detail(fixture.storage.as_ref(), SITE_URL, "ak", "2018", "HB1").await?;

    assert_eq!(ctx.bill.identifier, "HB 1");
    assert_eq!(ctx.chamber, "Alaska House");
    assert_eq!(ctx.sponsorships.len(), 2);
    assert!(ctx.sponsorships[0].primary);

    assert_eq!(ctx.actions.len(), 3);
    assert_eq!(ctx.actions[0].action.description, "Passed House");
    assert_eq!(ctx.actions[2].action.description, "Introduced");
    assert_eq!(ctx.actions[0].organization, "Alaska House");

    assert_eq!(ctx.votes.len(), 1);
    assert_eq!(ctx.votes[0].url, format!("/vote/{HB1_VOTE_UUID}/"));
    assert_eq!(ctx.versions.len(), 2);
    assert_eq!(ctx.documents.len(), 2);
    assert_eq!(ctx.read_link.as_deref(), Some("https://example.com/f.pdf"));
    assert_eq!(ctx.openstates_url, "https://openstates.org/ak/bills/2018/HB1");

    assert_eq!(ctx.stages[0].text, "Introduced");
    assert_eq!(
        ctx.stages[1],
        Stage {
            date: "2018-03-01".into(),
            stage: "Alaska House".into(),
            text: "Passed Alaska House".into(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_bill_view_accepts_spaced_identifier() -> Result<()> {
    let fixture = populate().await?;
    let ctx = bill_detail(fixture.storage.as_ref(), SITE_URL, "ak", "2018", "hb 1").await?;
    assert_eq!(ctx.bill.title, "Moose Freedom Act");
    Ok(())
}

#[tokio::test]
async fn test_bill_view_suffixed_identifier() -> Result<()> {
    let ks = kansas().await?;
    create_named_bill(&ks, KS, "2020", "LB 1-A").await?;
    let ctx = bill_detail(ks.storage.as_ref(), SITE_URL, "ks", "2020", "LB1-A").await?;
    assert_eq!(ctx.bill.identifier, "LB 1-A");
    assert_eq!(ctx.openstates_url, "https://openstates.org/ks/bills/2020/LB1-A");
    Ok(())
}

#[tokio::test]
async fn test_bill_view_missing() -> Result<()> {
    let fixture = populate().await?;
    let storage = fixture.storage.as_ref();
    let result = bill_detail(storage, SITE_URL, "ak", "2018", "HB404").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    let result = bill_detail(storage, SITE_URL, "ak", "1999", "HB1").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_vote_view() -> Result<()> {
    let fixture = populate().await?;
    let ctx = vote_detail(fixture.storage.as_ref(), HB1_VOTE_UUID).await?;

    assert_eq!(ctx.vote.motion_text, "Vote on House Passage");
    assert_eq!(ctx.organization, "Alaska House");
    assert_eq!(ctx.bill_url.as_deref(), Some("/ak/bills/2018/HB1/"));
    assert_eq!(ctx.person_votes.len(), 5);

    let counts: Vec<(&str, i64)> = ctx.vote_counts.iter().map(|c| (c.option.as_str(), c.value)).collect();
    assert_eq!(counts, vec![("yes", 1), ("no", 4)]);

    let parties: Vec<(&str, i64, i64)> = ctx
        .party_votes
        .iter()
        .map(|p| (p.party.as_str(), p.count("yes"), p.count("no")))
        .collect();
    assert_eq!(
        parties,
        vec![("Democratic", 0, 1), ("Republican", 1, 2), ("Unknown", 0, 1)]
    );
    Ok(())
}

#[tokio::test]
async fn test_vote_view_missing() -> Result<()> {
    let fixture = populate().await?;
    let result = vote_detail(fixture.storage.as_ref(), "00000000-0000-0000-0000-000000000000").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_bills_feed() -> Result<()> {
    let fixture = populate().await?;
    let ctx = bills_feed(fixture.storage.as_ref(), SITE_URL, "ak").await?;
    assert_eq!(ctx.items.len(), 12);
    assert_eq!(ctx.items[0].title, "HB 1: Moose Freedom Act");
    assert_eq!(ctx.items[0].link, "https://openstates.org/ak/bills/2018/HB1");
    let pub_date = chrono::DateTime::parse_from_rfc2822(&ctx.items[0].pub_date)?;
    assert_eq!(pub_date.date_naive(), chrono::NaiveDate::from_ymd_opt(2018, 3, 1).unwrap());
    Ok(())
}
