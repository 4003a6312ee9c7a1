use crate::domain::{
    BillAction, LegislativeSession, Link, PersonVote, VoteCount, VoteEvent as DomainVoteEvent,
    VoteEventRecord,
};
use crate::graphql::schema::{context, GraphQLContext};
use crate::graphql::types::{load_bill, load_organization, load_person, load_vote_event, Bill, Organization, Person};
use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// GraphQL representation of a VoteEvent
#[derive(Clone)]
pub struct VoteEvent {
    pub inner: DomainVoteEvent,
    record: Arc<OnceCell<Arc<VoteEventRecord>>>,
}

impl From<DomainVoteEvent> for VoteEvent {
    fn from(vote: DomainVoteEvent) -> Self {
        Self {
            inner: vote,
            record: Arc::new(OnceCell::new()),
        }
    }
}

async fn load_record(context: &GraphQLContext, id: &str) -> Result<Arc<VoteEventRecord>> {
    context
        .loaders
        .vote_records
        .load_one(id.to_string())
        .await?
        .ok_or_else(|| format!("Vote event {id} could not be loaded").into())
}

impl VoteEvent {
    async fn record(&self, ctx: &Context<'_>) -> Result<Arc<VoteEventRecord>> {
        let context = context(ctx)?;
        let record = self
            .record
            .get_or_try_init(|| load_record(context, &self.inner.id))
            .await?;
        Ok(record.clone())
    }
}

#[Object]
impl VoteEvent {
    async fn id(&self) -> &str {
        &self.inner.id
    }

    async fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    async fn motion_text(&self) -> &str {
        &self.inner.motion_text
    }

    async fn motion_classification(&self) -> &[String] {
        &self.inner.motion_classification
    }

    async fn start_date(&self) -> &str {
        &self.inner.start_date
    }

    async fn result(&self) -> &str {
        &self.inner.result
    }

    async fn organization(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, Some(&self.inner.organization_id)).await
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

    async fn bill(&self, ctx: &Context<'_>) -> Result<Option<Bill>> {
        load_bill(ctx, self.inner.bill_id.as_deref()).await
    }

    /// The bill action this vote was taken on
    async fn bill_action(&self, ctx: &Context<'_>) -> Result<Option<BillAction>> {
        let (Some(bill_id), Some(action_id)) = (&self.inner.bill_id, &self.inner.bill_action_id) else {
            return Ok(None);
        };
        let context = context(ctx)?;
        let record = context.loaders.bill_records.load_one(bill_id.clone()).await?;
        Ok(record.and_then(|r| r.actions.iter().find(|a| &a.id == action_id).cloned()))
    }

    async fn votes(&self, ctx: &Context<'_>) -> Result<Vec<PersonVote>> {
        Ok(self.record(ctx).await?.votes.clone())
    }

    async fn counts(&self, ctx: &Context<'_>) -> Result<Vec<VoteCount>> {
        Ok(self.record(ctx).await?.counts.clone())
    }

    async fn sources(&self, ctx: &Context<'_>) -> Result<Vec<Link>> {
        Ok(self.record(ctx).await?.sources.clone())
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

#[Object]
impl VoteCount {
    async fn option(&self) -> &str {
        &self.option
    }

    async fn value(&self) -> i64 {
        self.value
    }
}

#[Object]
impl PersonVote {
    async fn option(&self) -> &str {
        &self.option
    }

    async fn voter_name(&self) -> &str {
        &self.voter_name
    }

    async fn voter(&self, ctx: &Context<'_>) -> Result<Option<Person>> {
        load_person(ctx, self.voter_id.as_deref()).await
    }

    async fn note(&self) -> &str {
        &self.note
    }

    async fn vote_event(&self, ctx: &Context<'_>) -> Result<Option<VoteEvent>> {
        load_vote_event(ctx, Some(&self.vote_event_id)).await
    }
}
