//! Cursor-based pagination over GraphQL connections.

use std::{cell::Cell, time::Duration};

use serde::Deserialize;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::github::ClientError;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub(crate) has_next_page: bool,
    #[serde(default)]
    pub(crate) end_cursor: Option<String>,
}

/// One page of a GraphQL connection, e.g. `organizations(first: 100)`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Connection<N> {
    pub(crate) page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub(crate) nodes: Vec<N>,
}

impl<N> Default for Connection<N> {
    fn default() -> Self {
        Self {
            page_info: PageInfo::default(),
            nodes: vec![],
        }
    }
}

/// Drive `fetch` from the first page (`None`) to the last, collecting
/// every node in page order.
///
/// `fetch` is handed the previous page's `endCursor`. `delay` is slept
/// between pages, but not after the last one. Errors abort the walk.
pub(crate) async fn paginate<N, F, Fut>(
    label: &str,
    delay: Duration,
    mut fetch: F,
) -> Result<Vec<N>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Connection<N>, ClientError>>,
{
    let mut nodes = vec![];
    let mut cursor = None;
    let mut page = 1;

    loop {
        Span::current().pb_set_message(&format!("{label} (page {page})"));
        tracing::debug!("fetching {label}, page {page}");

        let connection = fetch(cursor.take()).await?;
        nodes.extend(connection.nodes);

        if !connection.page_info.has_next_page {
            break;
        }

        cursor = Some(
            connection
                .page_info
                .end_cursor
                .ok_or_else(|| ClientError::MissingCursor {
                    label: label.into(),
                })?,
        );
        page += 1;

        tokio::time::sleep(delay).await;
    }

    Ok(nodes)
}

/// Like [`paginate`], for a connection under a node that may not exist,
/// e.g. `organization(login: $owner)`.
///
/// `fetch` yields `None` when the node is missing, which ends the walk
/// with `Ok(None)`.
pub(crate) async fn paginate_optional<N, F, Fut>(
    label: &str,
    delay: Duration,
    mut fetch: F,
) -> Result<Option<Vec<N>>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Option<Connection<N>>, ClientError>>,
{
    let missing = Cell::new(false);

    let nodes = paginate(label, delay, |cursor| {
        let page = fetch(cursor);
        let missing = &missing;
        async move {
            Ok(page.await?.unwrap_or_else(|| {
                missing.set(true);
                Connection::default()
            }))
        }
    })
    .await?;

    Ok((!missing.get()).then_some(nodes))
}
