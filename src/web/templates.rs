use askama::Template;

use crate::web::views::bill::BillDetailContext;
use crate::web::views::bills::BillListContext;
use crate::web::views::feed::FeedContext;
use crate::web::views::vote::VoteDetailContext;

#[derive(Template)]
#[template(path = "bills.html")]
pub struct BillListPage<'a> {
    pub ctx: &'a BillListContext,
}

#[derive(Template)]
#[template(path = "bill.html")]
pub struct BillDetailPage<'a> {
    pub ctx: &'a BillDetailContext,
}

#[derive(Template)]
#[template(path = "vote.html")]
pub struct VoteDetailPage<'a> {
    pub ctx: &'a VoteDetailContext,
}

#[derive(Template)]
#[template(path = "bills_feed.xml")]
pub struct BillsFeed<'a> {
    pub ctx: &'a FeedContext,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage<'a> {
    pub message: &'a str,
}
