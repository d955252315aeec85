use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::models::{ApiResponse, ConfigHistoryEntry, HostOverride, Lease, NewHostOverride};
use crate::config::{Auth, PfSenseConfig};

/// Path templates under `/api/v1/` consumed by this client.
pub mod urls {
    pub const GATEWAY_STATUS: &str = "/api/v1/status/gateway";
    pub const INTERFACE_STATUS: &str = "/api/v1/status/interface";
    pub const DHCPD_LEASES: &str = "/api/v1/services/dhcpd/lease";
    pub const UNBOUND_ACCESS_LIST: &str = "/api/v1/services/unbound/access_list";
    pub const UNBOUND_HOST_OVERRIDE: &str = "/api/v1/services/unbound/host_override";
    pub const FIREWALL_LOG: &str = "/api/v1/status/log/firewall";
    pub const DHCP_LOG: &str = "/api/v1/status/log/dhcp";
    pub const CONFIG_HISTORY_LOG: &str = "/api/v1/status/log/config_history";
    pub const SYSTEM_LOG: &str = "/api/v1/status/log/system";
    pub const OPENVPN_STATUS: &str = "/api/v1/status/openvpn";
    pub const SYSTEM_STATUS: &str = "/api/v1/status/system";
    pub const API_VERSION: &str = "/api/v1/system/api/version";
}

/// The Unbound endpoints the reconciler depends on, as a seam so the
/// reconciliation logic can be exercised against a test double.
#[async_trait]
pub trait UnboundApi {
    /// Fetch the full host-override list, in server order. No pagination.
    async fn fetch_host_overrides(&self) -> Result<Vec<HostOverride>>;

    async fn create_host_override(&self, payload: &NewHostOverride) -> Result<Value>;

    /// Delete one record by its positional id. The id must come from the
    /// same fetch the caller is still holding.
    async fn delete_host_override(&self, id: usize, apply: bool) -> Result<Value>;
}

/// Authenticated client for the pfSense REST API.
pub struct PfSenseClient {
    client: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl PfSenseClient {
    pub fn new(config: &PfSenseConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            auth: config.auth()?,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base(base_url: String, auth: Auth) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.auth {
            Auth::Token {
                client_id,
                client_token,
            } => {
                let value = HeaderValue::from_str(&format!("{client_id} {client_token}"))
                    .context("client_id/client_token contain invalid header characters")?;
                Ok(req.header(AUTHORIZATION, value))
            }
            Auth::Jwt(jwt) => Ok(req.bearer_auth(jwt)),
            Auth::Basic { username, password } => Ok(req.basic_auth(username, Some(password))),
        }
    }

    async fn send<T>(&self, url: String, req: RequestBuilder) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .apply_auth(req)?
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        if !status.is_success() {
            return Err(ApiError::RequestFailed {
                url,
                status,
                body: text,
            }
            .into());
        }

        let parsed: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            anyhow::anyhow!("Failed to parse API response: {}. Response: {}", e, text)
        })?;
        parsed.check_code()?;
        Ok(parsed)
    }

    async fn get<T>(&self, path: &str) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("GET {}", url);
        self.send(url.clone(), self.client.get(&url)).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        self.send(url.clone(), self.client.post(&url).json(body))
            .await
    }

    async fn delete<T>(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("DELETE {} params={:?}", url, params);
        self.send(url.clone(), self.client.delete(&url).query(params))
            .await
    }

    pub async fn gateway_status(&self) -> Result<Value> {
        Ok(self.get::<Value>(urls::GATEWAY_STATUS).await?.data)
    }

    pub async fn interface_status(&self) -> Result<Value> {
        Ok(self.get::<Value>(urls::INTERFACE_STATUS).await?.data)
    }

    pub async fn system_status(&self) -> Result<Value> {
        Ok(self.get::<Value>(urls::SYSTEM_STATUS).await?.data)
    }

    pub async fn openvpn_status(&self) -> Result<Value> {
        Ok(self.get::<Value>(urls::OPENVPN_STATUS).await?.data)
    }

    /// Current API version plus available version updates.
    pub async fn api_version(&self) -> Result<Value> {
        Ok(self.get::<Value>(urls::API_VERSION).await?.data)
    }

    pub async fn dhcpd_leases(&self) -> Result<Vec<Lease>> {
        Ok(self.get::<Vec<Lease>>(urls::DHCPD_LEASES).await?.data)
    }

    pub async fn unbound_access_list(&self) -> Result<Value> {
        Ok(self.get::<Value>(urls::UNBOUND_ACCESS_LIST).await?.data)
    }

    pub async fn firewall_log(&self) -> Result<Vec<Value>> {
        Ok(self.get::<Vec<Value>>(urls::FIREWALL_LOG).await?.data)
    }

    pub async fn dhcp_log(&self) -> Result<Vec<Value>> {
        Ok(self.get::<Vec<Value>>(urls::DHCP_LOG).await?.data)
    }

    pub async fn system_log(&self) -> Result<Vec<Value>> {
        Ok(self.get::<Vec<Value>>(urls::SYSTEM_LOG).await?.data)
    }

    pub async fn config_history_log(&self) -> Result<Vec<ConfigHistoryEntry>> {
        Ok(self
            .get::<Vec<ConfigHistoryEntry>>(urls::CONFIG_HISTORY_LOG)
            .await?
            .data)
    }
}

#[async_trait]
impl UnboundApi for PfSenseClient {
    async fn fetch_host_overrides(&self) -> Result<Vec<HostOverride>> {
        Ok(self
            .get::<Vec<HostOverride>>(urls::UNBOUND_HOST_OVERRIDE)
            .await?
            .data)
    }

    async fn create_host_override(&self, payload: &NewHostOverride) -> Result<Value> {
        Ok(self
            .post::<Value, _>(urls::UNBOUND_HOST_OVERRIDE, payload)
            .await?
            .data)
    }

    async fn delete_host_override(&self, id: usize, apply: bool) -> Result<Value> {
        let params = [
            ("id", id.to_string()),
            ("apply", apply.to_string()),
        ];
        Ok(self
            .delete::<Value>(urls::UNBOUND_HOST_OVERRIDE, &params)
            .await?
            .data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_auth() -> Auth {
        Auth::Token {
            client_id: "admin".to_string(),
            client_token: "secret".to_string(),
        }
    }

    fn envelope(data: serde_json::Value) -> serde_json::Value {
        json!({
            "status": "ok",
            "code": 200,
            "return": 0,
            "message": "",
            "data": data,
        })
    }

    #[tokio::test]
    async fn sends_schemeless_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(urls::SYSTEM_STATUS))
            .and(header("Authorization", "admin secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"cpu": 1}))))
            .expect(1)
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), token_auth());
        let data = client.system_status().await.unwrap();
        assert_eq!(data["cpu"], json!(1));
    }

    #[tokio::test]
    async fn sends_bearer_header_for_jwt_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(urls::API_VERSION))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
            .expect(1)
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), Auth::Jwt("tok".to_string()));
        client.api_version().await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_fails_with_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(urls::DHCPD_LEASES))
            .respond_with(ResponseTemplate::new(401).set_body_string("auth required"))
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), token_auth());
        let err = client.dhcpd_leases().await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("401"));
        assert!(message.contains("auth required"));
    }

    #[tokio::test]
    async fn undocumented_envelope_code_is_rejected_before_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(urls::UNBOUND_HOST_OVERRIDE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "code": 302,
                "return": 0,
                "message": "",
                "data": [],
            })))
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), token_auth());
        let err = client.fetch_host_overrides().await.unwrap_err();
        assert!(format!("{err:#}").contains("invalid status code"));
    }

    #[tokio::test]
    async fn fetch_host_overrides_parses_string_and_list_ips() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(urls::UNBOUND_HOST_OVERRIDE))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
                {"host": "web", "domain": "example.com", "ip": "10.0.0.1,10.0.0.2", "aliases": ""},
                {"host": "db", "domain": "example.com", "ip": ["10.0.0.3"], "descr": "primary"},
            ]))))
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), token_auth());
        let records = client.fetch_host_overrides().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip.0, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(records[1].ip.0, vec!["10.0.0.3"]);
        assert_eq!(records[1].descr.as_deref(), Some("primary"));
    }

    #[tokio::test]
    async fn create_host_override_posts_json_body() {
        let server = MockServer::start().await;
        let payload = NewHostOverride {
            host: "web".to_string(),
            domain: "example.com".to_string(),
            ip: crate::api::models::IpList(vec!["10.0.0.1".to_string()]),
            descr: None,
            apply: true,
        };
        Mock::given(method("POST"))
            .and(path(urls::UNBOUND_HOST_OVERRIDE))
            .and(body_json(json!({
                "host": "web",
                "domain": "example.com",
                "ip": ["10.0.0.1"],
                "apply": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .expect(1)
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), token_auth());
        client.create_host_override(&payload).await.unwrap();
    }

    #[tokio::test]
    async fn delete_host_override_sends_id_and_apply_as_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(urls::UNBOUND_HOST_OVERRIDE))
            .and(query_param("id", "3"))
            .and(query_param("apply", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
            .expect(1)
            .mount(&server)
            .await;

        let client = PfSenseClient::with_base(server.uri(), token_auth());
        client.delete_host_override(3, false).await.unwrap();
    }
}
