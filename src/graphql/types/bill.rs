use crate::domain::{
    Bill as DomainBill, BillAbstract, BillAction, BillDocument, BillIdentifier, BillRecord,
    BillSponsorship, BillTitle, DocumentLink, LegislativeSession, Link, RelatedBill, RelatedEntity,
};
use crate::graphql::pagination::{connection_from_vec, OffsetConnection, PageArgs};
use crate::graphql::schema::{context, GraphQLContext};
use crate::graphql::types::{
    load_bill, load_organization, load_person, load_vote_event, Organization, Person, VoteEvent,
};
use crate::jurisdictions::{bill_url, jid_to_abbr};
use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// GraphQL representation of a Bill
#[derive(Clone)]
pub struct Bill {
    pub inner: DomainBill,
    record: Arc<OnceCell<Arc<BillRecord>>>,
}

impl From<DomainBill> for Bill {
    fn from(bill: DomainBill) -> Self {
        Self {
            inner: bill,
            record: Arc::new(OnceCell::new()),
        }
    }
}

async fn load_record(context: &GraphQLContext, id: &str) -> Result<Arc<BillRecord>> {
    context
        .loaders
        .bill_records
        .load_one(id.to_string())
        .await?
        .ok_or_else(|| format!("Bill {id} could not be loaded").into())
}

impl Bill {
    /// Child collections are fetched once per bill, batched across every bill in the response.
    async fn record(&self, ctx: &Context<'_>) -> Result<Arc<BillRecord>> {
        let context = context(ctx)?;
        let record = self
            .record
            .get_or_try_init(|| load_record(context, &self.inner.id))
            .await?;
        Ok(record.clone())
    }
}

#[Object]
impl Bill {
    async fn id(&self) -> &str {
        &self.inner.id
    }

    async fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    async fn title(&self) -> &str {
        &self.inner.title
    }

    async fn classification(&self) -> &[String] {
        &self.inner.classification
    }

    async fn subject(&self) -> &[String] {
        &self.inner.subject
    }

    async fn legislative_session(&self, ctx: &Context<'_>) -> Result<LegislativeSession> {
        let context = context(ctx)?;
        let session = context
            .loaders
            .sessions
            .load_one(self.inner.legislative_session_id)
            .await?
            .ok_or("legislative session not found")?;
        Ok(session)
    }

    async fn from_organization(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, Some(&self.inner.from_organization_id)).await
    }

    async fn abstracts(&self, ctx: &Context<'_>) -> Result<Vec<BillAbstract>> {
        Ok(self.record(ctx).await?.abstracts.clone())
    }

    async fn other_titles(&self, ctx: &Context<'_>) -> Result<Vec<BillTitle>> {
        Ok(self.record(ctx).await?.other_titles.clone())
    }

    async fn other_identifiers(&self, ctx: &Context<'_>) -> Result<Vec<BillIdentifier>> {
        Ok(self.record(ctx).await?.other_identifiers.clone())
    }

    async fn actions(&self, ctx: &Context<'_>) -> Result<Vec<BillAction>> {
        Ok(self.record(ctx).await?.actions.clone())
    }

    async fn sponsorships(&self, ctx: &Context<'_>) -> Result<Vec<BillSponsorship>> {
        Ok(self.record(ctx).await?.sponsorships.clone())
    }

    async fn documents(&self, ctx: &Context<'_>) -> Result<Vec<BillDocument>> {
        Ok(self.record(ctx).await?.documents.clone())
    }

    async fn versions(&self, ctx: &Context<'_>) -> Result<Vec<BillDocument>> {
        Ok(self.record(ctx).await?.versions.clone())
    }

    async fn sources(&self, ctx: &Context<'_>) -> Result<Vec<Link>> {
        Ok(self.record(ctx).await?.sources.clone())
    }

    async fn related_bills(&self, ctx: &Context<'_>) -> Result<Vec<RelatedBill>> {
        Ok(self.record(ctx).await?.related_bills.clone())
    }

    /// Vote events taken on this bill, oldest first
    async fn votes(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<VoteEvent>> {
        let context = context(ctx)?;
        let votes = context
            .loaders
            .votes_by_bill
            .load_one(self.inner.id.clone())
            .await?
            .unwrap_or_default();
        Ok(connection_from_vec(
            votes.into_iter().map(VoteEvent::from).collect(),
            &PageArgs::new(after, before, first, last),
            None,
        )?)
    }

    async fn first_action_date(&self) -> &str {
        &self.inner.first_action_date
    }

    async fn latest_action_date(&self) -> &str {
        &self.inner.latest_action_date
    }

    async fn latest_action_description(&self) -> &str {
        &self.inner.latest_action_description
    }

    async fn latest_passage_date(&self) -> &str {
        &self.inner.latest_passage_date
    }

    /// Free-form source data, as a JSON string
    async fn extras(&self) -> String {
        self.inner.extras.to_string()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }

    /// Public page of this bill, e.g. `https://openstates.org/ak/bills/2018/HB1`
    async fn openstates_url(&self, ctx: &Context<'_>) -> Result<String> {
        let context = context(ctx)?;
        let session = context
            .loaders
            .sessions
            .load_one(self.inner.legislative_session_id)
            .await?
            .ok_or("legislative session not found")?;
        let abbr = jid_to_abbr(&session.jurisdiction_id).unwrap_or_default();
        Ok(bill_url(
            &context.site_url,
            &abbr,
            &session.identifier,
            &self.inner.identifier,
        ))
    }
}

#[Object]
impl BillAbstract {
    #[graphql(name = "abstract")]
    async fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    async fn note(&self) -> &str {
        &self.note
    }

    async fn date(&self) -> &str {
        &self.date
    }
}

#[Object]
impl BillTitle {
    async fn title(&self) -> &str {
        &self.title
    }

    async fn note(&self) -> &str {
        &self.note
    }
}

#[Object]
impl BillIdentifier {
    async fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn scheme(&self) -> &str {
        &self.scheme
    }

    async fn note(&self) -> &str {
        &self.note
    }
}

#[Object]
impl BillAction {
    async fn organization(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, Some(&self.organization_id)).await
    }

    async fn description(&self) -> &str {
        &self.description
    }

    async fn date(&self) -> &str {
        &self.date
    }

    async fn classification(&self) -> &[String] {
        &self.classification
    }

    async fn order(&self) -> i64 {
        self.order
    }

    async fn related_entities(&self) -> &[RelatedEntity] {
        &self.related_entities
    }

    /// The vote event recorded against this action, if any
    async fn vote(&self, ctx: &Context<'_>) -> Result<Option<VoteEvent>> {
        load_vote_event(ctx, self.vote_id.as_deref()).await
    }
}

#[Object]
impl RelatedEntity {
    async fn name(&self) -> &str {
        &self.name
    }

    async fn entity_type(&self) -> &str {
        &self.entity_type
    }

    async fn organization(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, self.organization_id.as_deref()).await
    }

    async fn person(&self, ctx: &Context<'_>) -> Result<Option<Person>> {
        load_person(ctx, self.person_id.as_deref()).await
    }
}

#[Object]
impl BillSponsorship {
    async fn name(&self) -> &str {
        &self.name
    }

    async fn entity_type(&self) -> &str {
        &self.entity_type
    }

    async fn organization(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, self.organization_id.as_deref()).await
    }

    async fn person(&self, ctx: &Context<'_>) -> Result<Option<Person>> {
        load_person(ctx, self.person_id.as_deref()).await
    }

    async fn primary(&self) -> bool {
        self.primary
    }

    async fn classification(&self) -> &str {
        &self.classification
    }
}

#[Object]
impl BillDocument {
    async fn note(&self) -> &str {
        &self.note
    }

    async fn date(&self) -> &str {
        &self.date
    }

    async fn links(&self) -> &[DocumentLink] {
        &self.links
    }
}

#[Object]
impl DocumentLink {
    async fn media_type(&self) -> &str {
        &self.media_type
    }

    async fn url(&self) -> &str {
        &self.url
    }

    async fn text(&self) -> &str {
        &self.text
    }
}

#[Object]
impl RelatedBill {
    async fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn legislative_session(&self) -> &str {
        &self.legislative_session
    }

    async fn relation_type(&self) -> &str {
        &self.relation_type
    }

    async fn related_bill(&self, ctx: &Context<'_>) -> Result<Option<Bill>> {
        load_bill(ctx, self.related_bill_id.as_deref()).await
    }
}
