pub mod bill;
pub mod common;
pub mod jurisdiction;
pub mod organization;
pub mod person;
pub mod vote;

pub use bill::Bill;
pub use jurisdiction::Jurisdiction;
pub use organization::Organization;
pub use person::Person;
pub use vote::VoteEvent;

use crate::graphql::schema::context;
use async_graphql::{Context, Result};

// Optional foreign keys resolve to `null` when the id is unset or dangling.

pub(crate) async fn load_organization(ctx: &Context<'_>, id: Option<&str>) -> Result<Option<Organization>> {
    let Some(id) = id else { return Ok(None) };
    let context = context(ctx)?;
    let org = context.loaders.organizations.load_one(id.to_string()).await?;
    Ok(org.map(Organization::from))
}

pub(crate) async fn load_person(ctx: &Context<'_>, id: Option<&str>) -> Result<Option<Person>> {
    let Some(id) = id else { return Ok(None) };
    let context = context(ctx)?;
    let person = context.loaders.people.load_one(id.to_string()).await?;
    Ok(person.map(Person::from))
}

pub(crate) async fn load_bill(ctx: &Context<'_>, id: Option<&str>) -> Result<Option<Bill>> {
    let Some(id) = id else { return Ok(None) };
    let context = context(ctx)?;
    let bill = context.loaders.bills.load_one(id.to_string()).await?;
    Ok(bill.map(Bill::from))
}

pub(crate) async fn load_jurisdiction(ctx: &Context<'_>, id: Option<&str>) -> Result<Option<Jurisdiction>> {
    let Some(id) = id else { return Ok(None) };
    let context = context(ctx)?;
    let jurisdiction = context.loaders.jurisdictions.load_one(id.to_string()).await?;
    Ok(jurisdiction.map(Jurisdiction::from))
}

pub(crate) async fn load_vote_event(ctx: &Context<'_>, id: Option<&str>) -> Result<Option<VoteEvent>> {
    let Some(id) = id else { return Ok(None) };
    let context = context(ctx)?;
    let vote = context.loaders.vote_events.load_one(id.to_string()).await?;
    Ok(vote.map(VoteEvent::from))
}
