//! End-to-end tests for the binary parts operations.

use cumulus_client::ClientError;
use cumulus_core::PartDescriptor;

use crate::mock::{client_over, MockCloud, SharedMock};

fn parts_from(contents: &[&[u8]]) -> Vec<PartDescriptor> {
    let mut offset = 0u64;
    contents
        .iter()
        .map(|content| {
            let part = PartDescriptor::from_content(offset, content.to_vec());
            offset += content.len() as u64;
            part
        })
        .collect()
}

#[test]
fn send_then_get_round_trip() {
    let mock = SharedMock::new(MockCloud::new());
    let mut client = client_over(&mock);

    let mut parts = parts_from(&[b"alpha chunk", b"beta chunk", b"gamma"]);
    let fingerprints: Vec<String> = parts.iter().map(|p| p.fingerprint.clone()).collect();

    let uploaded = client.send_needed_parts(&mut parts).unwrap();
    assert_eq!(uploaded, 3);
    // Payloads are released once the batch is on the wire.
    assert!(parts.iter().all(|p| p.payload.is_none()));
    {
        let mock = mock.lock();
        assert_eq!(mock.received_uploads, fingerprints);
        assert_eq!(mock.store[&fingerprints[0]], b"alpha chunk");
    }

    // A fresh descriptor set — fingerprint, size, offset only — recovers
    // every byte.
    let mut fetch = parts.clone();
    let recovered = client.get_parts(&mut fetch).unwrap();
    assert_eq!(recovered, 3);
    assert_eq!(fetch[0].payload.as_deref(), Some(&b"alpha chunk"[..]));
    assert_eq!(fetch[1].payload.as_deref(), Some(&b"beta chunk"[..]));
    assert_eq!(fetch[2].payload.as_deref(), Some(&b"gamma"[..]));
}

#[test]
fn send_skips_parts_the_cloud_already_has() {
    let mock = SharedMock::new(MockCloud::new());
    let existing = PartDescriptor::from_content(0, &b"already there"[..]);
    mock.lock()
        .store
        .insert(existing.fingerprint.clone(), b"already there".to_vec());

    let mut client = client_over(&mock);
    let mut parts = vec![
        existing.clone(),
        PartDescriptor::from_content(13, &b"new content"[..]),
    ];

    let uploaded = client.send_needed_parts(&mut parts).unwrap();
    assert_eq!(uploaded, 1);

    let mock = mock.lock();
    assert_eq!(mock.received_uploads, vec![parts[1].fingerprint.clone()]);
}

#[test]
fn sending_nothing_uploads_nothing() {
    let mock = SharedMock::new(MockCloud::new());
    let mut client = client_over(&mock);
    let mut parts = Vec::new();
    assert_eq!(client.send_needed_parts(&mut parts).unwrap(), 0);
    assert!(mock.lock().received_uploads.is_empty());
}

#[test]
fn has_parts_reports_only_missing() {
    let mock = SharedMock::new(MockCloud::new());
    let parts = parts_from(&[b"kept", b"lost"]);
    mock.lock()
        .store
        .insert(parts[0].fingerprint.clone(), b"kept".to_vec());

    let mut client = client_over(&mock);
    let missing = client.has_parts(&parts).unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].fingerprint, parts[1].fingerprint);
}

#[test]
fn per_part_failure_is_isolated_end_to_end() {
    let mock = SharedMock::new(MockCloud::new());
    let mut client = client_over(&mock);

    let mut parts = parts_from(&[b"one", b"two", b"three"]);
    client.send_needed_parts(&mut parts).unwrap();

    // The second part vanishes server-side.
    mock.lock()
        .fail_fingerprints
        .insert(parts[1].fingerprint.clone());

    let mut fetch = parts.clone();
    let recovered = client.get_parts(&mut fetch).unwrap();

    // The batch survives: two parts recovered, the failed one left
    // empty, and the part after the failure still lands correctly.
    assert_eq!(recovered, 2);
    assert_eq!(fetch[0].payload.as_deref(), Some(&b"one"[..]));
    assert!(fetch[1].payload.is_none());
    assert_eq!(fetch[2].payload.as_deref(), Some(&b"three"[..]));
}

#[test]
fn corrupted_reply_header_is_malformed() {
    let mock = SharedMock::new(MockCloud::new());
    let parts = parts_from(&[b"content"]);
    mock.lock().corrupt_next_reply = true;

    let mut client = client_over(&mock);
    let err = client.has_parts(&parts).unwrap_err();
    assert!(matches!(err, ClientError::Malformed(_)));
}
