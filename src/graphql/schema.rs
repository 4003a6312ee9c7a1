use crate::constants::MAX_PAGE_SIZE;
use crate::graphql::loaders::Loaders;
use crate::graphql::resolvers::Query;
use crate::storage::Storage;
use async_graphql::{Context, EmptyMutation, EmptySubscription, Schema};
use std::sync::Arc;

/// GraphQL context containing shared application state
pub struct GraphQLContext {
    pub storage: Arc<dyn Storage>,
    pub loaders: Loaders,
    /// Base URL used for `openstatesUrl`
    pub site_url: String,
    /// Cap on `first`/`last` for the top-level `bills` and `people` connections
    pub max_page_size: usize,
}

/// The complete GraphQL schema
pub type GraphQLSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Create a new GraphQL schema with the given storage
pub fn create_schema(storage: Arc<dyn Storage>, site_url: &str) -> GraphQLSchema {
    let loaders = Loaders::new(storage.clone());

    Schema::build(Query, EmptyMutation, EmptySubscription)
        .data(GraphQLContext {
            storage,
            loaders,
            site_url: site_url.trim_end_matches('/').to_string(),
            max_page_size: MAX_PAGE_SIZE,
        })
        .finish()
}

/// Shorthand used by every resolver.
pub(crate) fn context<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a GraphQLContext> {
    ctx.data::<GraphQLContext>()
}
