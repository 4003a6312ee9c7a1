use crate::domain::{Link, Membership, Organization as DomainOrganization};
use crate::graphql::schema::context;
use crate::graphql::types::{load_jurisdiction, load_organization, Jurisdiction};
use async_graphql::{Context, Object, Result};
use chrono::Utc;

/// GraphQL representation of an Organization (chamber, legislature, party, ...)
#[derive(Clone)]
pub struct Organization {
    pub inner: DomainOrganization,
}

impl From<DomainOrganization> for Organization {
    fn from(org: DomainOrganization) -> Self {
        Self { inner: org }
    }
}

#[Object]
impl Organization {
    async fn id(&self) -> &str {
        &self.inner.id
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn classification(&self) -> &str {
        &self.inner.classification
    }

    async fn parent(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, self.inner.parent_id.as_deref()).await
    }

    async fn children(
        &self,
        ctx: &Context<'_>,
        classification: Option<String>,
    ) -> Result<Vec<Organization>> {
        let context = context(ctx)?;
        let children = context.storage.child_organizations(&self.inner.id).await?;
        Ok(children
            .into_iter()
            .filter(|o| classification.as_ref().map_or(true, |c| &o.classification == c))
            .map(Organization::from)
            .collect())
    }

    async fn links(&self) -> &[Link] {
        &self.inner.links
    }

    async fn sources(&self) -> &[Link] {
        &self.inner.sources
    }

    /// Free-form source data, as a JSON string
    async fn extras(&self) -> String {
        self.inner.extras.to_string()
    }

    async fn jurisdiction(&self, ctx: &Context<'_>) -> Result<Option<Jurisdiction>> {
        load_jurisdiction(ctx, self.inner.jurisdiction_id.as_deref()).await
    }

    async fn current_memberships(&self, ctx: &Context<'_>) -> Result<Vec<Membership>> {
        let context = context(ctx)?;
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let memberships = context
            .storage
            .memberships_for_organization(&self.inner.id)
            .await?;
        Ok(memberships
            .into_iter()
            .filter(|m| m.is_current(&today))
            .collect())
    }
}
