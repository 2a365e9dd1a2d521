// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the backend REST API.
//!
//! Each entity type maps to one collection:
//!
//! | call     | request                          |
//! |----------|----------------------------------|
//! | create   | `POST   {base}/{collection}`     |
//! | update   | `PATCH  {base}/{collection}/{id}`|
//! | delete   | `DELETE {base}/{collection}/{id}`|
//! | list     | `GET    {base}/{collection}?...` |

use std::time::Duration;

use hatch_core::EntityType;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;

use crate::config::RemoteConfig;
use crate::connectivity::{ProbeFuture, ReachabilityProbe};
use crate::error::{RemoteError, RemoteResult, SyncError, SyncResult};
use crate::remote::{ListFilter, RemoteApi, RemoteFuture};

/// [`RemoteApi`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRemoteApi {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRemoteApi {
    /// Build a client from configuration. Fails if the base URL is unusable.
    pub fn new(config: &RemoteConfig) -> SyncResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {}", e)))?;
        Ok(HttpRemoteApi {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn collection_url(&self, entity: EntityType) -> String {
        format!("{}/{}", self.base_url, entity.collection())
    }

    pub fn record_url(&self, entity: EntityType, id: &str) -> String {
        format!("{}/{}", self.collection_url(entity), id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// A probe that reports the API reachable when its base URL answers.
    pub fn probe(&self) -> HttpProbe {
        HttpProbe {
            client: self.client.clone(),
            url: self.base_url.clone(),
        }
    }
}

fn map_send_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Transport(e.to_string())
    }
}

async fn send(builder: RequestBuilder) -> RemoteResult<Response> {
    let response = builder.send().await.map_err(map_send_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn send_json(builder: RequestBuilder) -> RemoteResult<Value> {
    let response = send(builder).await?;
    if response.status() == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    response.json().await.map_err(map_send_error)
}

/// Accepts either a bare array or an object wrapping one under `data`.
pub(crate) fn records_from(body: Value) -> RemoteResult<Vec<Value>> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(RemoteError::Decode("expected a list of records".to_string())),
        },
        _ => Err(RemoteError::Decode("expected a list of records".to_string())),
    }
}

impl RemoteApi for HttpRemoteApi {
    fn create(&self, entity: EntityType, payload: Value) -> RemoteFuture<'_, Value> {
        Box::pin(async move {
            let url = self.collection_url(entity);
            send_json(self.request(Method::POST, &url).json(&payload)).await
        })
    }

    fn update(&self, entity: EntityType, id: String, patch: Value) -> RemoteFuture<'_, Value> {
        Box::pin(async move {
            let url = self.record_url(entity, &id);
            send_json(self.request(Method::PATCH, &url).json(&patch)).await
        })
    }

    fn delete(&self, entity: EntityType, id: String) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let url = self.record_url(entity, &id);
            send(self.request(Method::DELETE, &url)).await?;
            Ok(())
        })
    }

    fn list(&self, entity: EntityType, filter: ListFilter) -> RemoteFuture<'_, Vec<Value>> {
        Box::pin(async move {
            let url = self.collection_url(entity);
            let body = send_json(self.request(Method::GET, &url).query(&filter)).await?;
            records_from(body)
        })
    }
}

/// Reachability probe backed by an HTTP GET.
///
/// Any response, including an error status, counts as reachable; only a
/// failure to get a response at all counts as offline.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl ReachabilityProbe for HttpProbe {
    fn check(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            match self.client.get(&self.url).send().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(url = %self.url, error = %e, "reachability probe failed");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
