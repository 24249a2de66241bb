//! 以 reqwest 實作的 Sailthru REST 客戶端
//!
//! 每次呼叫都送出 `api_key`、`format=json`、JSON 內容與 `sig` 參數；
//! `sig` 是 secret 接上排序後參數值的 md5。

use crate::config::MarketingConfig;
use crate::domain::model::SailthruResponse;
use crate::domain::ports::SailthruApi;
use crate::utils::error::{Result, SettingsError};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct HttpSailthruClient {
    client: Client,
    api_key: String,
    secret: String,
    api_url: String,
}

impl HttpSailthruClient {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let secret = secret.into();
        if api_key.is_empty() || secret.is_empty() {
            return Err(SettingsError::ConfigError {
                message: "Sailthru key and secret are required".to_string(),
            });
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            secret,
            api_url: crate::config::toml_config::DEFAULT_SAILTHRU_API_URL.to_string(),
        })
    }

    pub fn from_config(config: &MarketingConfig) -> Result<Self> {
        Ok(Self::new(&config.sailthru_key, &config.sailthru_secret)?
            .with_api_url(&config.sailthru_api_url))
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn signed_params(&self, data: &Value) -> Result<Vec<(&'static str, String)>> {
        let payload = serde_json::to_string(data)?;
        let sig = signature_hash(&self.secret, &[self.api_key.as_str(), "json", payload.as_str()]);
        Ok(vec![
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("json", payload),
            ("sig", sig),
        ])
    }

    async fn request(&self, method: Method, action: &str, data: &Value) -> Result<SailthruResponse> {
        let url = format!("{}/{}", self.api_url.trim_end_matches('/'), action);
        let params = self.signed_params(data)?;

        tracing::debug!("Sailthru {} {}", method, url);
        let request = if method == Method::GET {
            self.client.get(&url).query(&params)
        } else {
            self.client.request(method, &url).form(&params)
        };
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Sailthru response status: {}", status);
        Ok(parse_response(status, &body))
    }
}

/// `secret` 接上排序後參數值的 md5 (十六進位)
pub fn signature_hash(secret: &str, values: &[&str]) -> String {
    let mut sorted: Vec<&str> = values.to_vec();
    sorted.sort_unstable();
    let signature_string = format!("{}{}", secret, sorted.concat());
    format!("{:x}", md5::compute(signature_string.as_bytes()))
}

fn parse_response(status: StatusCode, body: &str) -> SailthruResponse {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => {
            let code = if status.is_success() { 0 } else { i64::from(status.as_u16()) };
            return SailthruResponse::failed(code, format!("Invalid JSON response: {}", e));
        }
    };

    if let Some(code) = json.get("error") {
        let message = json
            .get("errormsg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut response = SailthruResponse::failed(code.as_i64().unwrap_or_default(), message);
        response.json = json;
        return response;
    }

    if !status.is_success() {
        let mut response =
            SailthruResponse::failed(i64::from(status.as_u16()), format!("HTTP {}", status));
        response.json = json;
        return response;
    }

    SailthruResponse::ok(json)
}

#[async_trait]
impl SailthruApi for HttpSailthruClient {
    async fn api_get(&self, action: &str, data: Value) -> Result<SailthruResponse> {
        self.request(Method::GET, action, &data).await
    }

    async fn api_post(&self, action: &str, data: Value) -> Result<SailthruResponse> {
        self.request(Method::POST, action, &data).await
    }

    async fn purchase(
        &self,
        email: &str,
        items: Vec<Value>,
        options: Map<String, Value>,
    ) -> Result<SailthruResponse> {
        let mut data = options;
        data.insert("email".to_string(), Value::String(email.to_string()));
        data.insert("items".to_string(), Value::Array(items));
        self.api_post("purchase", Value::Object(data)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_sorts_values() {
        let a = signature_hash("secret", &["key", "json", "{}"]);
        let b = signature_hash("secret", &["{}", "key", "json"]);

        assert_eq!(a, b);
        assert_eq!(a, format!("{:x}", md5::compute("secretjsonkey{}")));
    }

    #[test]
    fn test_parse_error_body() {
        let response = parse_response(
            StatusCode::BAD_REQUEST,
            r#"{"error": 43, "errormsg": "Too many requests"}"#,
        );

        let error = response.error.unwrap();
        assert_eq!(error.code, 43);
        assert_eq!(error.message, "Too many requests");
    }

    #[test]
    fn test_parse_success_and_http_failures() {
        let ok = parse_response(StatusCode::OK, r#"{"ok": true}"#);
        assert!(ok.is_ok());
        assert_eq!(ok.json, json!({"ok": true}));

        let unavailable = parse_response(StatusCode::SERVICE_UNAVAILABLE, "<html>");
        assert_eq!(unavailable.error.unwrap().code, 503);

        let server_error = parse_response(StatusCode::INTERNAL_SERVER_ERROR, "{}");
        assert_eq!(server_error.error.unwrap().code, 500);
    }

    #[test]
    fn test_client_requires_credentials() {
        assert!(HttpSailthruClient::new("", "secret").is_err());
        assert!(HttpSailthruClient::new("key", "").is_err());
        assert!(HttpSailthruClient::new("key", "secret").is_ok());
    }
}
