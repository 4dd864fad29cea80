//! The cloud client facade.
//!
//! One `CloudClient` owns one HTTP handle and speaks both planes of the
//! protocol: OAuth-signed JSON-RPC for control operations (login,
//! listing, file creation) and the binary parts protocol for content.
//! Every operation is a single blocking round-trip; the client is
//! deliberately `&mut self` throughout — callers needing concurrency use
//! one client per thread.

use serde_json::{json, Value};

use cumulus_core::{pack_parts, parse_parts_reply, PartDescriptor};

use crate::config::ClientConfig;
use crate::error::{ClientError, ErrorKind};
use crate::jsonrpc;
use crate::list::{get_u64, CloudObject, ListQuery, Listing};
use crate::transport::{self, HttpBackend, HttpClient, HttpReply};

/// Everything the cloud reports about the logged-in account.
#[derive(Debug, Clone, Default)]
pub struct AccountInfo {
    pub user_id: u64,
    pub push_url: String,
    pub auth_token: String,
    pub emails: Vec<String>,
}

impl AccountInfo {
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            user_id: get_u64(value, "user_id")?,
            push_url: value
                .get("push_url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            auth_token: value.get("auth_token")?.as_str()?.to_string(),
            emails: value
                .get("emails")
                .and_then(Value::as_array)
                .map(|emails| {
                    emails
                        .iter()
                        .filter_map(|e| e.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

pub struct CloudClient {
    config: ClientConfig,
    auth_token: Option<String>,
    http: Box<dyn HttpBackend>,
}

impl CloudClient {
    /// Build a client over the production HTTP backend.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        transport::global_init();
        let http = Box::new(HttpClient::new()?);
        Ok(Self::with_backend(config, http))
    }

    /// Build a client over a caller-supplied backend.
    pub fn with_backend(config: ClientConfig, http: Box<dyn HttpBackend>) -> Self {
        let auth_token = (!config.auth_token.is_empty()).then(|| config.auth_token.clone());
        Self {
            config,
            auth_token,
            http,
        }
    }

    /// The auth token in effect, if any.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    // ── Control plane ─────────────────────────────────────────────────────────

    /// Log in with username and password, adopting the returned auth
    /// token for subsequent requests.
    pub fn login(&mut self, username: &str, password: &str) -> Result<AccountInfo, ClientError> {
        let params = json!({
            "username": username,
            "password": password,
            "host_uuid": self.config.host_uuid,
            "host_name": self.config.host_name,
        });
        let result = self.process_request("login", params)?;
        let info = AccountInfo::from_value(&result)
            .ok_or_else(|| ClientError::Protocol("login result missing account fields".into()))?;
        self.auth_token = Some(info.auth_token.clone());
        Ok(info)
    }

    /// Resume a session from a previously issued auth token.
    pub fn authenticate(&mut self, auth_token: &str) -> Result<AccountInfo, ClientError> {
        let params = json!({
            "auth_token": auth_token,
            "host_uuid": self.config.host_uuid,
        });
        let result = self.process_request("authenticate", params)?;
        let info = AccountInfo::from_value(&result).ok_or_else(|| {
            ClientError::Protocol("authenticate result missing account fields".into())
        })?;
        self.auth_token = Some(info.auth_token.clone());
        Ok(info)
    }

    /// List one page of objects at `query.path`, advancing
    /// `query.watermark` for the next page.
    pub fn list_path(&mut self, query: &mut ListQuery) -> Result<Listing, ClientError> {
        let first_page = query.watermark == 0;

        let mut params = serde_json::Map::new();
        params.insert("path".into(), query.path.clone().into());
        if query.max_items != 0 {
            params.insert("max_items".into(), query.max_items.to_string().into());
        }
        params.insert("list_watermark".into(), query.watermark.to_string().into());
        params.insert("include_total_items".into(), "0".into());
        params.insert("recurse".into(), flag(query.recurse).into());
        params.insert("include_parts".into(), flag(query.include_parts).into());
        params.insert(
            "include_child_counts".into(),
            flag(query.include_child_counts).into(),
        );
        params.insert("include_attributes".into(), "1".into());
        params.insert("include_sync_filters".into(), "0".into());
        if !query.filter_name.is_empty() {
            params.insert("filter_name".into(), query.filter_name.clone().into());
        }
        if !query.group_by_dir {
            params.insert("group_by_dir".into(), "0".into());
        }
        if !query.sort_field.is_empty() {
            params.insert("sort_field".into(), query.sort_field.clone().into());
        }
        if !query.sort_direction.is_empty() {
            params.insert(
                "sort_direction".into(),
                query.sort_direction.clone().into(),
            );
        }

        let result = self.process_request("list_objects", Value::Object(params))?;

        query.watermark = get_u64(&result, "list_watermark").unwrap_or(0);
        // Force the cursor forward so pagination terminates even against
        // a server that keeps answering watermark zero.
        if query.watermark == 0 {
            query.watermark = 1;
        }

        let mut listing = Listing {
            root: None,
            children: Vec::new(),
            more: get_u64(&result, "more_items").unwrap_or(0) != 0,
        };

        let Some(children) = result.get("children").and_then(Value::as_array) else {
            return Ok(listing);
        };

        if first_page {
            listing.root = result.get("object").and_then(CloudObject::from_value);
        }
        listing.children = children
            .iter()
            .filter_map(CloudObject::from_value)
            .collect();

        Ok(listing)
    }

    /// Create or update the file at `cloud_path` from an already-uploaded
    /// part list.
    pub fn create_file(
        &mut self,
        cloud_path: &str,
        parts: &[PartDescriptor],
    ) -> Result<(), ClientError> {
        let size: u64 = parts.iter().map(|p| u64::from(p.size)).sum();
        let part_items: Vec<Value> = parts
            .iter()
            .map(|p| {
                json!({
                    "fingerprint": p.fingerprint,
                    "offset": p.offset.to_string(),
                    "size": p.size.to_string(),
                })
            })
            .collect();

        let params = json!({
            "meta": [{
                "action": "create",
                "object_type": "file",
                "path": cloud_path,
                "size": size.to_string(),
                "parts": part_items,
            }],
        });

        self.process_request("update_objects", params)?;
        Ok(())
    }

    // ── Parts data plane ──────────────────────────────────────────────────────

    /// Ask the cloud which of `parts` it already has; returns the ones it
    /// is missing.
    pub fn has_parts(
        &mut self,
        parts: &[PartDescriptor],
    ) -> Result<Vec<PartDescriptor>, ClientError> {
        let reply = self.exchange_parts("has_object_parts", parts, 0, false)?;

        let mut records = Vec::new();
        parse_parts_reply(&reply, None, Some(&mut records))?;

        let mut missing = Vec::new();
        for record in &records {
            if record.error_code() == 0 {
                continue;
            }
            let fingerprint = record.fingerprint_text();
            if let Some(part) = parts.iter().find(|p| p.fingerprint == fingerprint) {
                missing.push(part.clone());
            }
        }
        Ok(missing)
    }

    /// Download content for `parts`, filling payloads in place and
    /// verifying each against its fingerprint. Returns the number of
    /// parts recovered; parts the cloud could not produce keep an empty
    /// payload.
    pub fn get_parts(&mut self, parts: &mut [PartDescriptor]) -> Result<u32, ClientError> {
        let reply = self.exchange_parts("get_object_parts", parts, 0, false)?;
        Ok(parse_parts_reply(&reply, Some(parts), None)?)
    }

    /// Upload whichever of `parts` the cloud is missing. Payloads are
    /// released once the batch is on the wire. Returns the number of
    /// parts actually sent.
    pub fn send_needed_parts(&mut self, parts: &mut [PartDescriptor]) -> Result<u32, ClientError> {
        let needed = self.has_parts(parts)?;
        if needed.is_empty() {
            for part in parts.iter_mut() {
                part.release_payload();
            }
            return Ok(0);
        }

        let reply = self.exchange_parts("send_object_parts", &needed, 0, true)?;

        let mut records = Vec::new();
        let accepted = parse_parts_reply(&reply, None, Some(&mut records))?;
        for record in &records {
            if record.error_code() != 0 {
                tracing::warn!(
                    fingerprint = %record.fingerprint_text(),
                    code = record.error_code(),
                    "cloud rejected an uploaded part"
                );
            }
        }

        for part in parts.iter_mut() {
            part.release_payload();
        }
        Ok(accepted)
    }

    /// One binary parts exchange: pack, post, return the raw reply bytes
    /// unparsed. Callers follow up with
    /// [`cumulus_core::parse_parts_reply`] under the flags their
    /// operation needs.
    pub fn exchange_parts(
        &mut self,
        method: &str,
        parts: &[PartDescriptor],
        share_id: u32,
        send_payload: bool,
    ) -> Result<Vec<u8>, ClientError> {
        let packed = pack_parts(parts, send_payload, share_id);
        tracing::debug!(
            method,
            records = packed.record_count,
            payload_bytes = packed.payload_bytes,
            "binary parts exchange"
        );

        let url = self.url_for(method);
        let headers = self.common_headers(method);
        let reply = self.http.post(&url, &headers, &packed.buffer)?;
        Ok(reply.body)
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    fn url_for(&self, method: &str) -> String {
        format!("{}/{}", self.config.address, method)
    }

    fn common_headers(&self, method: &str) -> Vec<(String, String)> {
        let credentials = self.config.oauth.credentials();
        let mut headers = vec![
            (
                "Authorization".to_string(),
                credentials.authorization_header("POST", &self.url_for(method)),
            ),
            ("X-Api-Version".to_string(), self.config.api_version.clone()),
            ("X-Client-Type".to_string(), self.config.client_type.clone()),
            (
                "X-Client-Version".to_string(),
                self.config.client_version.clone(),
            ),
            ("X-Client-Time".to_string(), unix_time().to_string()),
        ];
        if let Some(token) = &self.auth_token {
            headers.push(("X-Auth-Token".to_string(), token.clone()));
        }
        // OAuth signing covers only the URL for binary payloads.
        if matches!(
            method,
            "has_object_parts" | "send_object_parts" | "get_object_parts"
        ) {
            headers.push((
                "Content-Type".to_string(),
                "application/octet-stream".to_string(),
            ));
        }
        headers
    }

    /// One JSON-RPC round-trip: encode, post, decode, surface cloud
    /// errors, return the result member.
    fn process_request(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let request = jsonrpc::Request::new(method, params);
        let body = serde_json::to_vec(&request)
            .map_err(|e| ClientError::Protocol(format!("unencodable request: {e}")))?;
        tracing::debug!(method, "requesting");

        let url = self.url_for(method);
        let headers = self.common_headers(method);
        let reply = self.http.post(&url, &headers, &body)?;

        let response: jsonrpc::Response = serde_json::from_slice(&reply.body)
            .map_err(|e| ClientError::Protocol(format!("undecodable reply: {e}")))?;
        if !response.is_valid() {
            return Err(ClientError::Protocol(
                "reply is not a valid JSON-RPC response".into(),
            ));
        }

        Self::check_cloud_error(&response, &reply)?;
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn check_cloud_error(
        response: &jsonrpc::Response,
        reply: &HttpReply,
    ) -> Result<(), ClientError> {
        if reply.header("X-Request-Result") == Some("success") {
            return Ok(());
        }
        let Some(error) = response.error() else {
            return Ok(());
        };

        let code = get_u64(error, "code").unwrap_or(9999) as u32;
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Err(ClientError::Cloud {
            kind: ErrorKind::from_code(code),
            code,
            message,
        })
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn unix_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
