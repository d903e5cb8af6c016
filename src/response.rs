use axum::Json;
use serde::Serialize;

/// Unified `{code, msg, data}` envelope applied at the handler boundary.
#[derive(Debug, Serialize)]
pub struct ResponseModel<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Json<ResponseModel<T>> {
    Json(ResponseModel {
        code: 200,
        msg: "Success".into(),
        data: Some(data),
    })
}

pub fn ok_empty() -> Json<ResponseModel<serde_json::Value>> {
    Json(ResponseModel {
        code: 200,
        msg: "Success".into(),
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_code_msg_data() {
        let Json(body) = ok(serde_json::json!({"k": "v"}));
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"code\":200"));
        assert!(json.contains("\"msg\":\"Success\""));
        assert!(json.contains("\"k\":\"v\""));
    }

    #[test]
    fn empty_envelope_has_null_data() {
        let Json(body) = ok_empty();
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"data\":null"));
    }
}
