//! Common test utilities for reader client integration tests.
//!
//! Frame builders produce messages in the wire shape pushed by the reader
//! service; the wait helpers bound every await so a regression fails the
//! test instead of hanging it.

#![allow(dead_code)]

use cardlink_core::ReadId;
use cardlink_network::{ConnectionState, ConnectionStatus, ReadState};
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;

/// Upper bound for any single wait in these tests.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Full card message for a holder with the given surname.
pub fn profile_frame(surname: &str) -> String {
    json!({
        "result": {
            "E004": ["ID1", surname, "Jean", "15/06/1985", "M", "",
                     "CampX", "Djibouti", "Rep. Djibouti", "12345", "01/01/2020", "DOC123", "",
                     "Arr1", "", "ComA"],
            "E006": [{"Nom": "Dupont Marie", "Sexe": "F", "Date_Naissance": "02/03/2010"}],
            "E007": "iVBORw0KGgo"
        },
        "time_taken": "120ms"
    })
    .to_string()
}

/// Reference message, holder "Dupont".
pub fn reference_frame() -> String {
    profile_frame("Dupont")
}

/// Wait until the state leaves `Loading`.
pub async fn settled(states: &mut watch::Receiver<ReadState>) -> ReadState {
    wait_state(states, |state| !state.is_loading() && *state != ReadState::Idle).await
}

/// Wait for a state matching `predicate`.
pub async fn wait_state(
    states: &mut watch::Receiver<ReadState>,
    predicate: impl FnMut(&ReadState) -> bool,
) -> ReadState {
    tokio::time::timeout(WAIT_LIMIT, states.wait_for(predicate))
        .await
        .expect("timed out waiting for read state")
        .expect("read state channel closed")
        .clone()
}

/// Wait until the connection of `read_id` reaches `state`.
pub async fn wait_connection(
    connections: &mut watch::Receiver<ConnectionStatus>,
    read_id: ReadId,
    state: ConnectionState,
) {
    tokio::time::timeout(
        WAIT_LIMIT,
        connections.wait_for(|status| status.read_id == Some(read_id) && status.state == state),
    )
    .await
    .expect("timed out waiting for connection state")
    .expect("connection state channel closed");
}
