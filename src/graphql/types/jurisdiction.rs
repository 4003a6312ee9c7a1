use crate::domain::{Jurisdiction as DomainJurisdiction, LegislativeSession};
use crate::graphql::pagination::{connection_from_vec, OffsetConnection, PageArgs};
use crate::graphql::schema::context;
use crate::graphql::types::{load_jurisdiction, Organization};
use async_graphql::{Context, Object, Result};

/// GraphQL representation of a Jurisdiction
#[derive(Clone)]
pub struct Jurisdiction {
    pub inner: DomainJurisdiction,
}

impl From<DomainJurisdiction> for Jurisdiction {
    fn from(jurisdiction: DomainJurisdiction) -> Self {
        Self {
            inner: jurisdiction,
        }
    }
}

#[Object]
impl Jurisdiction {
    async fn id(&self) -> &str {
        &self.inner.id
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn url(&self) -> &str {
        &self.inner.url
    }

    async fn classification(&self) -> &str {
        &self.inner.classification
    }

    async fn division_id(&self) -> Option<&str> {
        self.inner.division_id.as_deref()
    }

    /// Sessions, most recent first
    async fn legislative_sessions(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<LegislativeSession>> {
        let context = context(ctx)?;
        let sessions = context
            .storage
            .sessions_for_jurisdiction(&self.inner.id)
            .await?;
        Ok(connection_from_vec(
            sessions,
            &PageArgs::new(after, before, first, last),
            None,
        )?)
    }

    async fn organizations(
        &self,
        ctx: &Context<'_>,
        classification: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<Organization>> {
        let context = context(ctx)?;
        let orgs = context
            .storage
            .organizations_for_jurisdiction(&self.inner.id, classification.as_deref())
            .await?;
        Ok(connection_from_vec(
            orgs.into_iter().map(Organization::from).collect(),
            &PageArgs::new(after, before, first, last),
            None,
        )?)
    }
}

#[Object]
impl LegislativeSession {
    async fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn classification(&self) -> &str {
        &self.classification
    }

    async fn start_date(&self) -> &str {
        &self.start_date
    }

    async fn end_date(&self) -> &str {
        &self.end_date
    }

    async fn jurisdiction(&self, ctx: &Context<'_>) -> Result<Option<Jurisdiction>> {
        load_jurisdiction(ctx, Some(&self.jurisdiction_id)).await
    }
}
