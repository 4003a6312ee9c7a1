use crate::error::AppError;
use crate::graphql::pagination::{build_connection, connection_from_vec, OffsetConnection, PageArgs};
use crate::graphql::schema::context;
use crate::graphql::types::{Bill, Jurisdiction, Organization, Person};
use crate::jurisdictions::{is_jurisdiction_id, parse_bill_url};
use crate::storage::{BillFilter, BillSort, PersonFilter, SponsorFilter, Storage};
use async_graphql::{Context, InputObject, Object, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Restrict bills to those with a matching sponsorship
#[derive(InputObject, Debug, Default)]
pub struct SponsorInput {
    pub name: Option<String>,
    pub primary: Option<bool>,
    /// Person id
    pub person: Option<String>,
}

impl From<SponsorInput> for SponsorFilter {
    fn from(input: SponsorInput) -> Self {
        Self {
            name: input.name,
            primary: input.primary,
            person_id: input.person,
        }
    }
}

/// Root query object for GraphQL
pub struct Query;

/// Accept a jurisdiction by OCD id or by name. Unknown names are passed
/// through so they filter down to nothing.
async fn resolve_jurisdiction(storage: &dyn Storage, value: &str) -> Result<String> {
    if is_jurisdiction_id(value) {
        return Ok(value.to_string());
    }
    Ok(storage
        .get_jurisdiction(value)
        .await?
        .map(|j| j.id)
        .unwrap_or_else(|| value.to_string()))
}

/// `updatedSince` takes a date or a datetime; naive values are UTC.
pub(crate) fn parse_updated_since(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts.and_utc());
        }
    }
    Err(AppError::validation(format!(
        "updatedSince must be a date or an ISO 8601 datetime, got \"{raw}\""
    )))
}

#[Object]
impl Query {
    /// Get a jurisdiction by id or name
    async fn jurisdiction(
        &self,
        ctx: &Context<'_>,
        id: Option<String>,
        name: Option<String>,
    ) -> Result<Jurisdiction> {
        let context = context(ctx)?;
        let key = id
            .or(name)
            .ok_or("must either pass 'id' or 'name'")?;
        match context.storage.get_jurisdiction(&key).await? {
            Some(jurisdiction) => Ok(jurisdiction.into()),
            None => Err(AppError::not_found("Jurisdiction").into()),
        }
    }

    /// All jurisdictions, optionally restricted to one classification
    async fn jurisdictions(
        &self,
        ctx: &Context<'_>,
        classification: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<Jurisdiction>> {
        let context = context(ctx)?;
        let jurisdictions = context
            .storage
            .list_jurisdictions(classification.as_deref())
            .await?;
        Ok(connection_from_vec(
            jurisdictions.into_iter().map(Jurisdiction::from).collect(),
            &PageArgs::new(after, before, first, last),
            None,
        )?)
    }

    /// Search people
    #[allow(clippy::too_many_arguments)]
    async fn people(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Substring of the person's name")] name: Option<String>,
        #[graphql(desc = "Current jurisdiction, by id or name")] jurisdiction: Option<String>,
        #[graphql(desc = "Organization id or name with a current membership")] member_of: Option<String>,
        #[graphql(desc = "Organization id or name with any membership")] ever_member_of: Option<String>,
        #[graphql(desc = "District label; requires memberOf or everMemberOf")] district: Option<String>,
        division: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<Person>> {
        let context = context(ctx)?;
        if district.is_some() && member_of.is_none() && ever_member_of.is_none() {
            return Err("'district' parameter requires specifying 'memberOf' or 'everMemberOf'".into());
        }

        let jurisdiction_id = match jurisdiction {
            Some(j) => Some(resolve_jurisdiction(context.storage.as_ref(), &j).await?),
            None => None,
        };
        let filter = PersonFilter {
            name,
            jurisdiction_id,
            member_of,
            ever_member_of,
            district,
            division_id: division,
        };

        let args = PageArgs::new(after, before, first, last);
        let total = context.storage.count_people(&filter).await?;
        let window = args.window(total, Some(context.max_page_size))?;
        let people = if window.limit == 0 {
            Vec::new()
        } else {
            context
                .storage
                .search_people(&filter, window.offset, window.limit)
                .await?
        };
        Ok(build_connection(
            window,
            total,
            people.into_iter().map(Person::from).collect(),
        ))
    }

    /// Get a person by id
    async fn person(&self, ctx: &Context<'_>, id: String) -> Result<Person> {
        let context = context(ctx)?;
        let person = context.loaders.people.load_one(id).await?;
        person
            .map(Person::from)
            .ok_or_else(|| AppError::not_found("Person").into())
    }

    /// Get an organization by id
    async fn organization(&self, ctx: &Context<'_>, id: String) -> Result<Organization> {
        let context = context(ctx)?;
        let org = context.loaders.organizations.load_one(id).await?;
        org.map(Organization::from)
            .ok_or_else(|| AppError::not_found("Organization").into())
    }

    /// Search bills, most recently updated first
    #[allow(clippy::too_many_arguments)]
    async fn bills(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Jurisdiction id or name")] jurisdiction: Option<String>,
        #[graphql(desc = "Chamber classification, e.g. upper or lower")] chamber: Option<String>,
        #[graphql(desc = "Session identifier")] session: Option<String>,
        #[graphql(desc = "Date or datetime; only bills updated since then")] updated_since: Option<String>,
        classification: Option<String>,
        subject: Option<String>,
        #[graphql(desc = "Full-text search over titles and bill text")] search_query: Option<String>,
        sponsor: Option<SponsorInput>,
        #[graphql(desc = "Partial date; only bills with an action since then")] action_since: Option<String>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<OffsetConnection<Bill>> {
        let context = context(ctx)?;
        let args = PageArgs::new(after, before, first, last);

        let jurisdiction_id = match jurisdiction {
            Some(j) => Some(resolve_jurisdiction(context.storage.as_ref(), &j).await?),
            None => None,
        };
        let updated_since = updated_since
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_updated_since)
            .transpose()?;

        let filter = BillFilter {
            jurisdiction_id,
            session,
            chamber,
            classification,
            subjects: subject.into_iter().collect(),
            sponsor: sponsor.map(SponsorFilter::from),
            updated_since,
            action_since,
            search_query,
            ..Default::default()
        };

        let total = context.storage.count_bills(&filter).await?;
        let window = args.window(total, Some(context.max_page_size))?;
        debug!(total, offset = window.offset, limit = window.limit, "bills query");
        let bills = if window.limit == 0 {
            Vec::new()
        } else {
            context
                .storage
                .search_bills(&filter, BillSort::UpdatedDesc, window.offset, window.limit)
                .await?
        };
        Ok(build_connection(
            window,
            total,
            bills.into_iter().map(Bill::from).collect(),
        ))
    }

    /// Get a single bill by id, by public URL, or by jurisdiction + session + identifier
    async fn bill(
        &self,
        ctx: &Context<'_>,
        id: Option<String>,
        jurisdiction: Option<String>,
        session: Option<String>,
        identifier: Option<String>,
        openstates_url: Option<String>,
    ) -> Result<Bill> {
        let context = context(ctx)?;
        let storage = context.storage.as_ref();

        let bill = if let Some(id) = id {
            storage.get_bills_by_ids(&[id]).await?.into_iter().next()
        } else if let Some(url) = openstates_url {
            let parts = parse_bill_url(&url)
                .ok_or_else(|| AppError::validation(format!("Invalid openstatesUrl \"{url}\"")))?;
            storage
                .find_bill(&parts.jurisdiction_id, &parts.session, &parts.identifier)
                .await?
        } else if let (Some(jurisdiction), Some(session), Some(identifier)) =
            (jurisdiction, session, identifier)
        {
            let jurisdiction_id = resolve_jurisdiction(storage, &jurisdiction).await?;
            storage
                .find_bill(&jurisdiction_id, &session, &identifier)
                .await?
        } else {
            return Err(
                "must either pass 'id' or 'openstatesUrl', or 'jurisdiction', 'session', 'identifier' together"
                    .into(),
            );
        };

        bill.map(Bill::from)
            .ok_or_else(|| AppError::not_found("Bill").into())
    }
}
