use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinematch_collab::RoomError;
use log::error;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: String,
    },
    #[error("{0}")]
    InvalidInput(String),
    #[error("Room is full")]
    RoomFull,
    #[error("Not a participant in this room")]
    NotAParticipant,
    #[error("{0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::RoomFull => StatusCode::CONFLICT,
            Self::NotAParticipant => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}

impl From<RoomError> for ServerError {
    fn from(value: RoomError) -> Self {
        match value {
            RoomError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            RoomError::InvalidInput(reason) => Self::InvalidInput(reason),
            RoomError::RoomFull => Self::RoomFull,
            RoomError::NotAParticipant => Self::NotAParticipant,
            e @ RoomError::Conflict(_) => Self::Conflict(e.to_string()),
            e @ RoomError::ServiceUnavailable => Self::Unavailable(e.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_errors_map_to_status_codes() {
        let cases = [
            (RoomError::not_found("room", "AB12"), StatusCode::NOT_FOUND),
            (RoomError::InvalidInput("name is empty".into()), StatusCode::BAD_REQUEST),
            (RoomError::RoomFull, StatusCode::CONFLICT),
            (RoomError::NotAParticipant, StatusCode::FORBIDDEN),
            (RoomError::ServiceUnavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (error, status) in cases {
            assert_eq!(ServerError::from(error).as_status_code(), status);
        }
    }
}
