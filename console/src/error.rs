use common::WasId;
use thiserror::Error;

/// Requests the controller refuses before anything reaches the backend.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Unknown WAS: {0}")]
    UnknownWas(WasId),
    #[error("No such server in the current list: {0}")]
    UnknownServer(String),
    #[error("Action {0} cannot be scheduled")]
    NotSchedulable(common::Action),
}
