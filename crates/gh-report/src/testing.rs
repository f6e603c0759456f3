//! Test doubles.

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::github::{ClientError, GitHubApi};

#[derive(Debug)]
enum Request {
    GraphQl { operation: String, variables: Value },
    Rest { path: String },
}

/// A [`GitHubApi`] that answers from canned responses and records
/// every request it sees.
///
/// GraphQL responses are queued per operation and handed out in order.
/// A request with nothing canned for it fails.
#[derive(Default)]
pub(crate) struct FakeApi {
    graphql: RefCell<HashMap<String, VecDeque<Value>>>,
    rest: HashMap<String, Value>,
    log: RefCell<Vec<Request>>,
}

impl FakeApi {
    /// Queue the `data` payload of one response to `operation`.
    pub(crate) fn graphql_page(mut self, operation: &str, data: Value) -> Self {
        self.graphql
            .get_mut()
            .entry(operation.into())
            .or_default()
            .push_back(data);
        self
    }

    /// Answer every `GET` of `path` with `body`.
    pub(crate) fn rest_body(mut self, path: &str, body: Value) -> Self {
        self.rest.insert(path.into(), body);
        self
    }

    /// The variables of every request made to `operation`, in order.
    pub(crate) fn graphql_requests(&self, operation: &str) -> Vec<Value> {
        self.log
            .borrow()
            .iter()
            .filter_map(|req| match req {
                Request::GraphQl {
                    operation: op,
                    variables,
                } if op == operation => Some(variables.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every request made, as GraphQL operation names or REST paths.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .map(|req| match req {
                Request::GraphQl { operation, .. } => operation.clone(),
                Request::Rest { path } => path.clone(),
            })
            .collect()
    }
}

impl GitHubApi for FakeApi {
    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        _query: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        self.log.borrow_mut().push(Request::GraphQl {
            operation: operation.into(),
            variables,
        });

        let data = self
            .graphql
            .borrow_mut()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| ClientError::NoData {
                operation: operation.into(),
            })?;

        serde_json::from_value(data).map_err(|source| ClientError::Decode {
            context: operation.into(),
            source,
        })
    }

    async fn rest<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.log
            .borrow_mut()
            .push(Request::Rest { path: path.into() });

        let body = self.rest.get(path).cloned().ok_or_else(|| ClientError::NoData {
            operation: path.into(),
        })?;

        serde_json::from_value(body).map_err(|source| ClientError::Decode {
            context: path.into(),
            source,
        })
    }
}
