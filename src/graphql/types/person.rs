use crate::domain::{CurrentRole, Membership, MembershipPost, Person as DomainPerson, PersonVote};
use crate::graphql::pagination::{build_connection, OffsetConnection, PageArgs};
use crate::graphql::schema::context;
use crate::graphql::types::{load_jurisdiction, load_organization, load_person, Jurisdiction, Organization};
use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

/// GraphQL representation of a Person
#[derive(Clone)]
pub struct Person {
    pub inner: DomainPerson,
}

impl From<DomainPerson> for Person {
    fn from(person: DomainPerson) -> Self {
        Self { inner: person }
    }
}

impl Person {
    async fn memberships(&self, ctx: &Context<'_>, current: bool) -> Result<Vec<Membership>> {
        let context = context(ctx)?;
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let memberships = context
            .loaders
            .memberships
            .load_one(self.inner.id.clone())
            .await?
            .unwrap_or_default();
        Ok(memberships
            .into_iter()
            .filter(|m| m.is_current(&today) == current)
            .collect())
    }
}

#[Object]
impl Person {
    async fn id(&self) -> &str {
        &self.inner.id
    }

    async fn name(&self) -> &str {
        &self.inner.name
    }

    async fn sort_name(&self) -> &str {
        &self.inner.sort_name
    }

    async fn given_name(&self) -> &str {
        &self.inner.given_name
    }

    async fn family_name(&self) -> &str {
        &self.inner.family_name
    }

    async fn image(&self) -> &str {
        &self.inner.image
    }

    async fn email(&self) -> &str {
        &self.inner.email
    }

    async fn primary_party(&self) -> &str {
        &self.inner.primary_party
    }

    async fn current_role(&self) -> Option<&CurrentRole> {
        self.inner.current_role.as_ref()
    }

    async fn current_jurisdiction(&self, ctx: &Context<'_>) -> Result<Option<Jurisdiction>> {
        load_jurisdiction(ctx, self.inner.current_jurisdiction_id.as_deref()).await
    }

    async fn current_memberships(&self, ctx: &Context<'_>) -> Result<Vec<Membership>> {
        self.memberships(ctx, true).await
    }

    async fn old_memberships(&self, ctx: &Context<'_>) -> Result<Vec<Membership>> {
        self.memberships(ctx, false).await
    }

    /// Individual votes cast by this person, most recent first
    async fn votes(
        &self,
        ctx: &Context<'_>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<PersonVote>> {
        let context = context(ctx)?;
        let args = PageArgs::new(after, before, first, last);
        let total = context.storage.count_votes_by_person(&self.inner.id).await?;
        let window = args.window(total, None)?;
        let votes = if window.limit == 0 {
            Vec::new()
        } else {
            context
                .storage
                .votes_by_person(&self.inner.id, window.offset, window.limit)
                .await?
        };
        Ok(build_connection(window, total, votes))
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.inner.updated_at
    }
}

#[Object]
impl CurrentRole {
    async fn title(&self) -> &str {
        &self.title
    }

    async fn org_classification(&self) -> &str {
        &self.org_classification
    }

    async fn district(&self) -> &str {
        &self.district
    }

    async fn division_id(&self) -> Option<&str> {
        self.division_id.as_deref()
    }
}

#[Object]
impl Membership {
    async fn id(&self) -> &str {
        &self.id
    }

    async fn person(&self, ctx: &Context<'_>) -> Result<Option<Person>> {
        load_person(ctx, Some(&self.person_id)).await
    }

    async fn organization(&self, ctx: &Context<'_>) -> Result<Option<Organization>> {
        load_organization(ctx, Some(&self.organization_id)).await
    }

    async fn post(&self) -> Option<&MembershipPost> {
        self.post.as_ref()
    }

    async fn role(&self) -> &str {
        &self.role
    }

    async fn start_date(&self) -> &str {
        &self.start_date
    }

    async fn end_date(&self) -> &str {
        &self.end_date
    }
}

#[Object(name = "Post")]
impl MembershipPost {
    async fn id(&self) -> &str {
        &self.id
    }

    async fn label(&self) -> &str {
        &self.label
    }

    async fn role(&self) -> &str {
        &self.role
    }

    async fn division_id(&self) -> Option<&str> {
        self.division_id.as_deref()
    }
}
