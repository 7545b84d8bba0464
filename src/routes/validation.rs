use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::constants::{
    DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, ERR_EXTRACTED_DATA_EMPTY, ERR_EXTRACTED_DATA_NOT_OBJECT,
    ERR_INVALID_PAGINATION, ERR_MISSING_EXTRACTED_DATA, MAX_PAGE_LIMIT,
};
use crate::error::AppError;

/// JSON body extractor whose rejections use the API error shape
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(AppError::PayloadTooLarge)
            }
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(AppError::InvalidInput(
                    "Invalid JSON in request body".to_string(),
                ))
            }
        }
    }
}

/// `null`, `false`, `0` and `""`, the values a client treats as absent
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Pull `extractedData` out of a request body
///
/// It must be present and truthy, a JSON object (arrays rejected) and non-empty.
pub fn extracted_data(body: &Value) -> Result<&Value, AppError> {
    let data = match body.get("extractedData") {
        Some(data) if !is_falsy(data) => data,
        _ => return Err(AppError::InvalidInput(ERR_MISSING_EXTRACTED_DATA.to_string())),
    };

    match data.as_object() {
        None => Err(AppError::InvalidInput(
            ERR_EXTRACTED_DATA_NOT_OBJECT.to_string(),
        )),
        Some(fields) if fields.is_empty() => {
            Err(AppError::InvalidInput(ERR_EXTRACTED_DATA_EMPTY.to_string()))
        }
        Some(_) => Ok(data),
    }
}

/// Leading integer of a query value, like JavaScript's `parseInt`
///
/// `"12abc"` is 12, `"-3"` is -3, `"abc"` and `""` are `None`.
fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;

    Some(if negative { -value } else { value })
}

/// Query value or the default when absent, unparseable or zero
fn int_or_default(raw: Option<&str>, default: u64) -> i64 {
    match raw.and_then(leading_int) {
        Some(0) | None => default as i64,
        Some(n) => n,
    }
}

/// Resolve `page` and `limit` query values into a validated `(page, limit)`
pub fn pagination(page: Option<&str>, limit: Option<&str>) -> Result<(u64, u64), AppError> {
    let page = int_or_default(page, DEFAULT_PAGE);
    let limit = int_or_default(limit, DEFAULT_PAGE_LIMIT);

    if page < 1 || limit < 1 || limit > MAX_PAGE_LIMIT as i64 {
        return Err(AppError::InvalidInput(ERR_INVALID_PAGINATION.to_string()));
    }

    Ok((page as u64, limit as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_message(err: AppError) -> String {
        match err {
            AppError::InvalidInput(msg) => msg,
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_extracted_data_accepts_object() {
        let body = json!({ "extractedData": { "pan": "ABCDE1234F" } });
        assert_eq!(extracted_data(&body).unwrap(), &json!({ "pan": "ABCDE1234F" }));
    }

    #[test]
    fn test_extracted_data_missing_or_null() {
        for body in [
            json!({}),
            json!({ "extractedData": null }),
            json!({ "extractedData": false }),
            json!({ "extractedData": 0 }),
            json!({ "extractedData": 0.0 }),
            json!({ "extractedData": "" }),
            json!([1, 2]),
        ] {
            let err = extracted_data(&body).unwrap_err();
            assert_eq!(error_message(err), ERR_MISSING_EXTRACTED_DATA);
        }
    }

    #[test]
    fn test_extracted_data_must_be_object() {
        for data in [json!([1]), json!([]), json!("text"), json!(42), json!(true)] {
            let err = extracted_data(&json!({ "extractedData": data })).unwrap_err();
            assert_eq!(error_message(err), ERR_EXTRACTED_DATA_NOT_OBJECT);
        }
    }

    #[test]
    fn test_extracted_data_cannot_be_empty() {
        let err = extracted_data(&json!({ "extractedData": {} })).unwrap_err();
        assert_eq!(error_message(err), ERR_EXTRACTED_DATA_EMPTY);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("12"), Some(12));
        assert_eq!(leading_int("12abc"), Some(12));
        assert_eq!(leading_int(" 7"), Some(7));
        assert_eq!(leading_int("-3"), Some(-3));
        assert_eq!(leading_int("2.5"), Some(2));
        assert_eq!(leading_int("abc"), None);
        assert_eq!(leading_int(""), None);
        assert_eq!(leading_int("-"), None);
    }

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(pagination(None, None).unwrap(), (1, 10));
        assert_eq!(pagination(Some("0"), Some("0")).unwrap(), (1, 10));
        assert_eq!(pagination(Some("abc"), Some("")).unwrap(), (1, 10));
        assert_eq!(pagination(Some("3"), Some("25")).unwrap(), (3, 25));
        assert_eq!(pagination(Some("1"), Some("100")).unwrap(), (1, 100));
    }

    #[test]
    fn test_pagination_out_of_range() {
        assert!(pagination(Some("-1"), None).is_err());
        assert!(pagination(None, Some("101")).is_err());
        assert!(pagination(None, Some("-5")).is_err());
    }
}
