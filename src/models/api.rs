use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Envelope JSON que devuelve cada endpoint de stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// `success: false` o un payload ausente es un fallo
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Decode("envelope has no data".to_string()))
    }

    /// Para endpoints cuyo payload no importa (deletes)
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_envelope_is_rejected() {
        let envelope: ApiEnvelope<i64> =
            serde_json::from_str(r#"{"success":false,"error":"duplicate name"}"#).unwrap();
        assert_eq!(
            envelope.into_data(),
            Err(ApiError::Rejected("duplicate name".into()))
        );
    }

    #[test]
    fn successful_envelope_yields_data() {
        let envelope: ApiEnvelope<i64> = serde_json::from_str(r#"{"success":true,"data":4}"#).unwrap();
        assert_eq!(envelope.into_data(), Ok(4));

        let ack: ApiEnvelope<serde_json::Value> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(ack.into_ack(), Ok(()));
    }
}
