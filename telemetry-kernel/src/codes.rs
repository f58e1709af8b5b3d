use serde::{Serialize, Serializer};

/// Codes retournés dans le champ `errorcode` des réponses JSON.
/// Le statut HTTP reste 200, le client ne lit que ce code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success,
    WrongId,
    WrongVesselType,
    #[allow(dead_code)]
    Unauthorized,
    #[allow(dead_code)]
    NotFound,
    #[allow(dead_code)]
    ServerError,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::Success => -1,
            ErrorCode::WrongId => 1201,
            ErrorCode::WrongVesselType => 1202,
            ErrorCode::Unauthorized => 12401,
            ErrorCode::NotFound => 12404,
            ErrorCode::ServerError => 12500,
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}
