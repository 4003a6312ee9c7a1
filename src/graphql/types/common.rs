use crate::domain::Link;
use async_graphql::Object;

#[Object]
impl Link {
    async fn url(&self) -> &str {
        &self.url
    }

    async fn note(&self) -> &str {
        &self.note
    }
}
