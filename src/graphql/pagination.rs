//! Offset-based Relay connections.
//!
//! Cursors are opaque base64 strings wrapping `arrayconnection:<offset>`, so the same
//! cursor can be used to page forward (`after`) or backward (`before`).

use async_graphql::connection::{Connection, CursorType, Edge};
use async_graphql::{OutputType, SimpleObject};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const CURSOR_PREFIX: &str = "arrayconnection:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCursor(pub usize);

impl CursorType for OffsetCursor {
    type Error = String;

    fn decode_cursor(s: &str) -> Result<Self, Self::Error> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| format!("Invalid cursor \"{s}\""))?;
        let raw = String::from_utf8(bytes).map_err(|_| format!("Invalid cursor \"{s}\""))?;
        raw.strip_prefix(CURSOR_PREFIX)
            .and_then(|offset| offset.parse().ok())
            .map(OffsetCursor)
            .ok_or_else(|| format!("Invalid cursor \"{s}\""))
    }

    fn encode_cursor(&self) -> String {
        STANDARD.encode(format!("{CURSOR_PREFIX}{}", self.0))
    }
}

/// Extra fields every connection exposes next to `edges` and `pageInfo`.
#[derive(SimpleObject)]
pub struct ConnectionFields {
    pub total_count: i64,
}

pub type OffsetConnection<T> = Connection<OffsetCursor, T, ConnectionFields>;

/// The Relay arguments of a connection field.
#[derive(Debug, Clone, Default)]
pub struct PageArgs {
    pub after: Option<String>,
    pub before: Option<String>,
    pub first: Option<i32>,
    pub last: Option<i32>,
}

/// The slice of an ordered result set one connection page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

fn decode_optional(cursor: Option<&str>) -> Result<Option<usize>, String> {
    match cursor {
        None | Some("") => Ok(None),
        Some(raw) => OffsetCursor::decode_cursor(raw).map(|c| Some(c.0)),
    }
}

fn non_negative(name: &str, value: Option<i32>) -> Result<Option<usize>, String> {
    match value {
        Some(v) if v < 0 => Err(format!("Argument '{name}' must be a non-negative integer.")),
        Some(v) => Ok(Some(v as usize)),
        None => Ok(None),
    }
}

impl PageArgs {
    pub fn new(after: Option<String>, before: Option<String>, first: Option<i32>, last: Option<i32>) -> Self {
        Self {
            after,
            before,
            first,
            last,
        }
    }

    /// Resolve the arguments against a result set of `total` rows.
    ///
    /// With `max_items` set the connection is capped: `first` or `last` must be
    /// given and may not exceed the cap.
    pub fn window(&self, total: usize, max_items: Option<usize>) -> Result<PageWindow, String> {
        let first = non_negative("first", self.first)?;
        let last = non_negative("last", self.last)?;

        if let Some(max) = max_items {
            if first.is_none() && last.is_none() {
                return Err(format!(
                    "You must provide a `first` or `last` value to properly paginate the connection (at most {max})."
                ));
            }
            if let Some(first) = first.filter(|f| *f > max) {
                return Err(format!(
                    "Requesting {first} records on the connection exceeds the `first` limit of {max} records."
                ));
            }
            if let Some(last) = last.filter(|l| *l > max) {
                return Err(format!(
                    "Requesting {last} records on the connection exceeds the `last` limit of {max} records (use `first` or a smaller `last`)."
                ));
            }
        }

        let after = decode_optional(self.after.as_deref())?;
        let before = decode_optional(self.before.as_deref())?;

        let lower = after.map(|a| a + 1).unwrap_or(0).min(total);
        let upper = before.unwrap_or(total).min(total);

        let mut start = lower;
        let mut end = upper.max(start);
        if let Some(first) = first {
            end = end.min(start + first);
        }
        if let Some(last) = last {
            start = start.max(end.saturating_sub(last));
        }

        Ok(PageWindow {
            offset: start,
            limit: end - start,
            has_previous_page: last.is_some() && start > lower,
            has_next_page: first.is_some() && end < upper,
        })
    }
}

/// Build a connection from the rows of `window`, numbering cursors from its offset.
pub fn build_connection<T: OutputType>(
    window: PageWindow,
    total: usize,
    nodes: Vec<T>,
) -> OffsetConnection<T> {
    let mut connection = Connection::with_additional_fields(
        window.has_previous_page,
        window.has_next_page,
        ConnectionFields {
            total_count: total as i64,
        },
    );
    connection.edges.extend(
        nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| Edge::new(OffsetCursor(window.offset + i), node)),
    );
    connection
}

/// Page over rows that are already in memory.
pub fn connection_from_vec<T: OutputType>(
    items: Vec<T>,
    args: &PageArgs,
    max_items: Option<usize>,
) -> Result<OffsetConnection<T>, String> {
    let total = items.len();
    let window = args.window(total, max_items)?;
    let nodes = items
        .into_iter()
        .skip(window.offset)
        .take(window.limit)
        .collect();
    Ok(build_connection(window, total, nodes))
}
