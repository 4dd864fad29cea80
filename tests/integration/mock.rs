//! An in-process cloud speaking both protocol planes.
//!
//! Control requests get canned JSON-RPC envelopes; binary parts
//! requests are decoded with the real scanner and answered with replies
//! built from the real wire structs, so the client under test cannot
//! tell it apart from the service.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{AsBytes, FromBytes};

use cumulus_client::transport::{HttpBackend, HttpReply, TransportError};
use cumulus_client::{ClientConfig, CloudClient, PART_NOT_FOUND_CODE};
use cumulus_core::scanner::{Framing, RecordScanner};
use cumulus_core::wire::{
    PartRecord, PartsHeader, HEADER_SIGNATURE, HEADER_SIZE, RECORD_SIZE, RECORD_SIZE_FIELD_OFFSET,
};

#[derive(Default)]
pub struct MockCloud {
    /// Part content by fingerprint.
    pub store: HashMap<String, Vec<u8>>,
    /// Fingerprints the cloud pretends it cannot produce.
    pub fail_fingerprints: HashSet<String>,
    /// Watermark returned from every default list_objects page.
    pub list_watermark: u64,
    /// Canned list_objects results, served in order; an empty page is
    /// served once exhausted.
    pub listing_pages: Vec<Value>,
    /// Corrupt the header signature of the next binary reply.
    pub corrupt_next_reply: bool,
    /// Exact body to serve for the next control request.
    pub raw_json_reply: Option<String>,
    /// Error envelope for the next control request.
    pub rpc_error: Option<(u32, String)>,
    /// Fail the next request at the transport layer.
    pub fail_transport: bool,
    /// Control requests seen, by method.
    pub rpc_requests: Vec<(String, Value)>,
    /// Fingerprints received via send_object_parts, in order.
    pub received_uploads: Vec<String>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn post(
        &mut self,
        url: &str,
        body: &[u8],
    ) -> Result<HttpReply, TransportError> {
        if self.fail_transport {
            self.fail_transport = false;
            return Err(TransportError::Status(503));
        }

        let method = url.rsplit('/').next().unwrap_or_default().to_string();
        match method.as_str() {
            "has_object_parts" => Ok(self.handle_has(body)),
            "get_object_parts" => Ok(self.handle_get(body)),
            "send_object_parts" => Ok(self.handle_send(body)),
            _ => Ok(self.handle_rpc(&method, body)),
        }
    }

    // ── Binary plane ──────────────────────────────────────────────────────────

    fn handle_has(&mut self, body: &[u8]) -> HttpReply {
        let records = parse_request(body);
        let reply: Vec<_> = records
            .iter()
            .map(|(record, _)| {
                let fingerprint = record.fingerprint_text();
                if self.store.contains_key(&fingerprint) {
                    (PartRecord::new(0, &fingerprint, record.declared_size(), 0), Vec::new())
                } else {
                    error_record(&fingerprint, record.declared_size())
                }
            })
            .collect();
        self.binary_reply(reply)
    }

    fn handle_get(&mut self, body: &[u8]) -> HttpReply {
        let records = parse_request(body);
        let reply: Vec<_> = records
            .iter()
            .map(|(record, _)| {
                let fingerprint = record.fingerprint_text();
                let failed = self.fail_fingerprints.contains(&fingerprint);
                match self.store.get(&fingerprint) {
                    Some(content) if !failed => {
                        let record =
                            PartRecord::new(0, &fingerprint, content.len() as u32, content.len() as u32);
                        (record, content.clone())
                    }
                    _ => error_record(&fingerprint, record.declared_size()),
                }
            })
            .collect();
        self.binary_reply(reply)
    }

    fn handle_send(&mut self, body: &[u8]) -> HttpReply {
        let records = parse_request(body);
        let reply: Vec<_> = records
            .into_iter()
            .map(|(record, payload)| {
                let fingerprint = record.fingerprint_text();
                self.received_uploads.push(fingerprint.clone());
                self.store.insert(fingerprint.clone(), payload);
                (PartRecord::new(0, &fingerprint, record.declared_size(), 0), Vec::new())
            })
            .collect();
        self.binary_reply(reply)
    }

    fn binary_reply(&mut self, records: Vec<(PartRecord, Vec<u8>)>) -> HttpReply {
        let mut body = Vec::new();
        for (record, payload) in &records {
            body.extend_from_slice(record.as_bytes());
            body.extend_from_slice(payload);
        }
        let header = PartsHeader::new(body.len() as u32, records.len() as u32);
        let mut buffer = header.as_bytes().to_vec();
        buffer.extend_from_slice(&body);

        if self.corrupt_next_reply {
            self.corrupt_next_reply = false;
            buffer[0] ^= 0xFF;
        }

        reply_with(buffer, "success")
    }

    // ── Control plane ─────────────────────────────────────────────────────────

    fn handle_rpc(&mut self, method: &str, body: &[u8]) -> HttpReply {
        let request: Value =
            serde_json::from_slice(body).expect("mock received a non-JSON control request");
        self.rpc_requests.push((method.to_string(), request));

        if let Some(raw) = self.raw_json_reply.take() {
            return reply_with(raw.into_bytes(), "success");
        }
        if let Some((code, message)) = self.rpc_error.take() {
            let envelope = json!({
                "jsonrpc": "2.0",
                "id": "0",
                "error": {"code": code, "message": message},
            });
            return reply_with(serde_json::to_vec(&envelope).unwrap(), "error");
        }

        let result = match method {
            "login" | "authenticate" => json!({
                "user_id": 7,
                "auth_token": "tok-123",
                "push_url": "wss://push.test",
                "emails": ["dev@example.com"],
            }),
            "list_objects" => {
                if self.listing_pages.is_empty() {
                    json!({
                        "list_watermark": self.list_watermark,
                        "more_items": 0,
                        "children": [],
                    })
                } else {
                    self.listing_pages.remove(0)
                }
            }
            "update_objects" => json!({}),
            other => panic!("mock has no handler for method {other}"),
        };

        let envelope = json!({"jsonrpc": "2.0", "id": "0", "result": result});
        reply_with(serde_json::to_vec(&envelope).unwrap(), "success")
    }
}

/// Decode a binary parts request the way the service would.
fn parse_request(body: &[u8]) -> Vec<(PartRecord, Vec<u8>)> {
    let header = PartsHeader::read_from_prefix(body).expect("truncated request header");
    assert_eq!(header.signature(), HEADER_SIGNATURE, "bad request signature");

    let request_body = &body[HEADER_SIZE..HEADER_SIZE + header.body_size() as usize];
    let mut scanner = RecordScanner::new(
        request_body,
        Framing::Variable {
            size_field_offset: RECORD_SIZE_FIELD_OFFSET,
            big_endian: true,
        },
    )
    .expect("unscannable request body");

    let mut records = Vec::new();
    while let Some(offset) = scanner.next_offset() {
        let record = PartRecord::read_from_prefix(&request_body[offset..])
            .expect("truncated request record");
        let start = offset + RECORD_SIZE;
        let payload = request_body[start..start + record.payload_size() as usize].to_vec();
        records.push((record, payload));
    }
    records
}

fn error_record(fingerprint: &str, declared_size: u32) -> (PartRecord, Vec<u8>) {
    let text = b"part not found".to_vec();
    let mut record = PartRecord::new(0, fingerprint, declared_size, text.len() as u32);
    record.error_code = U32::<BigEndian>::new(PART_NOT_FOUND_CODE);
    (record, text)
}

fn reply_with(body: Vec<u8>, result: &str) -> HttpReply {
    let mut headers = HashMap::new();
    headers.insert("x-request-result".to_string(), result.to_string());
    HttpReply {
        status: 200,
        headers,
        body,
    }
}

// ── Sharing with the client under test ────────────────────────────────────────

/// Handle kept by the test while the client owns the backend box.
#[derive(Clone, Default)]
pub struct SharedMock(Arc<Mutex<MockCloud>>);

impl SharedMock {
    pub fn new(mock: MockCloud) -> Self {
        Self(Arc::new(Mutex::new(mock)))
    }

    pub fn lock(&self) -> MutexGuard<'_, MockCloud> {
        self.0.lock().unwrap()
    }
}

impl HttpBackend for SharedMock {
    fn post(
        &mut self,
        url: &str,
        _headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportError> {
        self.0.lock().unwrap().post(url, body)
    }
}

/// A client wired to `mock` with default config.
pub fn client_over(mock: &SharedMock) -> CloudClient {
    CloudClient::with_backend(ClientConfig::default(), Box::new(mock.clone()))
}
