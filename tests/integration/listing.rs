//! Directory listing and pagination against the mock cloud.

use serde_json::json;

use cumulus_client::{ListQuery, ObjectKind};

use crate::mock::{client_over, MockCloud, SharedMock};

#[test]
fn pagination_always_terminates_on_zero_watermark() {
    // A misbehaving server that answers watermark 0 forever.
    let mock = SharedMock::new(MockCloud::new());
    mock.lock().list_watermark = 0;
    let mut client = client_over(&mock);

    let mut query = ListQuery::new("/");
    client.list_path(&mut query).unwrap();
    assert_eq!(query.watermark, 1);
    client.list_path(&mut query).unwrap();
    assert_eq!(query.watermark, 1);

    // The second page was requested at the forced cursor, never zero.
    let mock = mock.lock();
    let (_, second_request) = &mock.rpc_requests[1];
    assert_eq!(second_request["params"]["list_watermark"], "1");
}

#[test]
fn first_page_carries_root_and_children() {
    let page = json!({
        "list_watermark": 10,
        "more_items": 0,
        "object": {"path": "/photos", "type": "dir"},
        "children": [
            {
                "path": "/photos/a.jpg",
                "type": "file",
                "size": 4,
                "revisions": [{"parts": [{"fingerprint": "aa", "offset": 0, "size": 4}]}],
            },
            {"path": "/photos/sub", "type": "dir"},
            {"path": "/photos/ghost", "type": "wormhole"},
        ],
    });
    let mock = SharedMock::new(MockCloud::new());
    mock.lock().listing_pages.push(page);
    let mut client = client_over(&mock);

    let mut query = ListQuery::new("/photos");
    query.include_parts = true;
    let listing = client.list_path(&mut query).unwrap();

    assert_eq!(query.watermark, 10);
    assert!(!listing.more);
    assert_eq!(listing.root.unwrap().kind, ObjectKind::Dir);
    // Unknown object types are skipped, not fatal.
    assert_eq!(listing.children.len(), 2);
    assert_eq!(listing.children[0].kind, ObjectKind::File);
    assert_eq!(listing.children[0].parts.len(), 1);
    assert_eq!(listing.children[0].parts[0].size, 4);
}

#[test]
fn later_pages_do_not_reparse_root() {
    let mock = SharedMock::new(MockCloud::new());
    {
        let mut mock = mock.lock();
        mock.listing_pages.push(json!({
            "list_watermark": 5,
            "more_items": 1,
            "object": {"path": "/", "type": "dir"},
            "children": [],
        }));
        mock.listing_pages.push(json!({
            "list_watermark": 9,
            "more_items": 0,
            "object": {"path": "/", "type": "dir"},
            "children": [],
        }));
    }
    let mut client = client_over(&mock);

    let mut query = ListQuery::new("/");
    let first = client.list_path(&mut query).unwrap();
    assert!(first.root.is_some());
    assert!(first.more);

    let second = client.list_path(&mut query).unwrap();
    assert!(second.root.is_none());
    assert!(!second.more);
    assert_eq!(query.watermark, 9);
}
