use serde::Serialize;

/// JSON envelope shared by every API endpoint: `{ success, data?, error? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_error() {
        let value = serde_json::to_value(ApiResponse::ok(serde_json::json!({ "count": 3 }))).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "data": { "count": 3 } }));
    }

    #[test]
    fn error_envelope_omits_data() {
        let value = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(value, serde_json::json!({ "success": false, "error": "nope" }));
    }
}
