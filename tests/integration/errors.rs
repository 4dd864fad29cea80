//! Error taxonomy behavior across the facade.

use cumulus_client::{ClientError, ErrorKind, ListQuery, TransportError};

use crate::mock::{client_over, MockCloud, SharedMock};

#[test]
fn cloud_error_codes_map_to_named_kinds() {
    let mock = SharedMock::new(MockCloud::new());
    mock.lock().rpc_error = Some((1008, "incorrect login".into()));
    let mut client = client_over(&mock);

    match client.login("user", "bad").unwrap_err() {
        ClientError::Cloud {
            kind,
            code,
            message,
        } => {
            assert_eq!(kind, ErrorKind::IncorrectLoginCredentials);
            assert_eq!(code, 1008);
            assert_eq!(message, "incorrect login");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_cloud_codes_fall_back_to_the_generic_kind() {
    let mock = SharedMock::new(MockCloud::new());
    mock.lock().rpc_error = Some((5555, "novel failure".into()));
    let mut client = client_over(&mock);

    match client.login("user", "pw").unwrap_err() {
        ClientError::Cloud { kind, code, .. } => {
            assert_eq!(kind, ErrorKind::ResponseFailure);
            assert_eq!(code, 5555);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_envelope_is_a_protocol_failure() {
    let mock = SharedMock::new(MockCloud::new());
    mock.lock().raw_json_reply = Some("{\"result\": {}}".into());
    let mut client = client_over(&mock);

    let err = client.login("user", "pw").unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)));
}

#[test]
fn transport_failures_propagate_unchanged() {
    let mock = SharedMock::new(MockCloud::new());
    mock.lock().fail_transport = true;
    let mut client = client_over(&mock);

    let mut query = ListQuery::new("/");
    match client.list_path(&mut query).unwrap_err() {
        ClientError::Transport(TransportError::Status(status)) => assert_eq!(status, 503),
        other => panic!("unexpected error: {other}"),
    }
}
