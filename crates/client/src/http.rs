use std::time::Duration;

use async_trait::async_trait;
use caiyun_types::{
    CloudBalance, Declared, FileEntry, FilePage, ShareLink, SignInStatus, TokenChain,
    UploadRequest, PARTNER_SOURCE_ID,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::wire::{
    out_link_request, upload_request_xml, FileListRequest, FileListResponse, MarketResponse,
    OutLinkResponse, PortalLoginResponse, ReceiveInfo, SignInInfo, SpecTokenRequest,
    SpecTokenResponse,
};
use crate::{ApiError, CloudApi, Endpoints, UploadReceipt};

/// Per-request bound when the caller does not pick one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.159 Safari/537.36";

/// Client identification the upload gateway insists on
const UPLOAD_CLIENT_HEADERS: &[(&str, &str)] = &[
    ("x-huawei-uploadSrc", "1"),
    ("x-huawei-channelSrc", "10200153"),
    ("x-ClientOprType", "11"),
    ("x-NetType", "6"),
    (
        "x-DeviceInfo",
        "||11|8.2.1.20241205|PC|V0lOLUVQSUxVNjE1TUlI|D1EA1E8B761492DFF34B18F05A5876E0|| Windows 10 (10.0)|1366X738|RW5nbGlzaA==|||",
    ),
    ("x-MM-Source", "032"),
    ("x-SvcType", "1"),
    ("Content-Type", "text/xml;UTF-8"),
    ("Accept", "*/*"),
];

/// Client identification the file service insists on
const FILE_CLIENT_HEADERS: &[(&str, &str)] = &[
    ("x-yun-op-type", "1"),
    ("x-yun-net-type", "1"),
    ("x-yun-module-type", "100"),
    ("x-yun-app-channel", "10214200"),
    (
        "x-yun-client-info",
        "1||8|5.10.1|microsoft|microsoft|306d1d1c-016c-4251-9ea6-951dca||windows 10 x64|||||",
    ),
    ("x-yun-api-version", "v1"),
    ("xweb_xhr", "1"),
    ("Content-Type", "application/json"),
];

/// HTTP implementation of [`CloudApi`] against the production service
pub struct CaiyunClient {
    endpoints: Endpoints,
    http_client: reqwest::Client,
}

impl CaiyunClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, ApiError> {
        Self::with_timeout(endpoints, DEFAULT_TIMEOUT)
    }

    /// Build a client whose every request is bounded by `timeout`
    pub fn with_timeout(endpoints: Endpoints, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DESKTOP_USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            endpoints,
            http_client,
        })
    }

    /// Headers for calls authenticated by the execution token
    fn task_headers(&self, tokens: &TokenChain) -> Result<HeaderMap, ApiError> {
        header_map(tokens.auth_headers().into_iter().chain([
            ("Content-Type", "application/json".to_string()),
            ("Accept", "*/*".to_string()),
            ("Cookie", tokens.cookie_header()),
        ]))
    }

    fn client_headers(
        tokens: &TokenChain,
        fixed: &[(&'static str, &'static str)],
    ) -> Result<HeaderMap, ApiError> {
        header_map(
            fixed
                .iter()
                .map(|(name, value)| (*name, value.to_string()))
                .chain([
                    ("Authorization", tokens.basic_authorization()),
                    ("Cookie", tokens.cookie_header()),
                ]),
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T, ApiError> {
        debug!(url = %url, "GET");
        let response = self.http_client.get(url).headers(headers).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(url = %url, "POST");
        let response = self
            .http_client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "unexpected HTTP status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

fn header_map<'a>(
    pairs: impl IntoIterator<Item = (&'a str, String)>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[async_trait]
impl CloudApi for CaiyunClient {
    async fn fetch_session_token(&self, tokens: &TokenChain) -> Result<Declared<String>, ApiError> {
        let url = format!("{}/user/querySpecToken", self.endpoints.identity);
        let headers = header_map([
            ("Authorization", tokens.basic_authorization()),
            ("Content-Type", "application/json".to_string()),
            ("Accept", "*/*".to_string()),
        ])?;
        let request = SpecTokenRequest {
            phone_number: tokens.account_id(),
            to_source_id: PARTNER_SOURCE_ID,
        };

        let reply: SpecTokenResponse = self.post_json(&url, headers, &request).await?;
        reply.into_declared()
    }

    async fn fetch_execution_token(
        &self,
        tokens: &TokenChain,
        session_token: &str,
    ) -> Result<Declared<String>, ApiError> {
        let url = format!("{}/portal/auth/tyrzLogin.action", self.endpoints.portal);
        let headers = self.task_headers(tokens)?;

        debug!(url = %url, "GET");
        let response = self
            .http_client
            .get(&url)
            .query(&[("ssoToken", session_token)])
            .headers(headers)
            .send()
            .await?;
        let reply: PortalLoginResponse = Self::read_json(response).await?;
        reply.into_declared()
    }

    async fn sign_in_status(
        &self,
        tokens: &TokenChain,
    ) -> Result<Declared<SignInStatus>, ApiError> {
        let url = format!(
            "{}/market/signin/page/infoV2?client=mini",
            self.endpoints.market
        );
        let reply: MarketResponse<SignInInfo> =
            self.get_json(&url, self.task_headers(tokens)?).await?;
        Ok(reply.into_status())
    }

    async fn sign_in(&self, tokens: &TokenChain) -> Result<Declared<()>, ApiError> {
        let url = format!(
            "{}/market/manager/commonMarketconfig/getByMarketRuleName?marketName=sign_in_3",
            self.endpoints.market
        );
        let reply: MarketResponse<Value> = self.get_json(&url, self.task_headers(tokens)?).await?;
        Ok(reply.into_ack())
    }

    async fn upload(
        &self,
        tokens: &TokenChain,
        request: &UploadRequest,
    ) -> Result<UploadReceipt, ApiError> {
        let url = format!(
            "{}/richlifeApp/devapp/IUploadAndDownload",
            self.endpoints.upload
        );
        let headers = Self::client_headers(tokens, UPLOAD_CLIENT_HEADERS)?;
        let body = upload_request_xml(&request.envelope);

        debug!(url = %url, size = request.envelope.content_size, "POST upload");
        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(UploadReceipt { status, body })
    }

    async fn list_files(
        &self,
        tokens: &TokenChain,
        directory_id: &str,
        cursor: Option<&str>,
    ) -> Result<Declared<FilePage>, ApiError> {
        let url = format!("{}/hcy/file/list", self.endpoints.files);
        let headers = Self::client_headers(tokens, FILE_CLIENT_HEADERS)?;
        let request = FileListRequest::new(directory_id, cursor);

        let reply: FileListResponse = self.post_json(&url, headers, &request).await?;
        Ok(reply.into_page())
    }

    async fn create_share_link(
        &self,
        tokens: &TokenChain,
        file: &FileEntry,
    ) -> Result<Declared<ShareLink>, ApiError> {
        let url = format!(
            "{}/orchestration/personalCloud-rebuild/outlink/v1.0/getOutLink",
            self.endpoints.share
        );
        let request = out_link_request(tokens.account_id(), file);

        let reply: OutLinkResponse = self
            .post_json(&url, self.task_headers(tokens)?, &request)
            .await?;
        reply.into_declared()
    }

    async fn cloud_balance(&self, tokens: &TokenChain) -> Result<CloudBalance, ApiError> {
        let url = format!("{}/market/signin/page/receive", self.endpoints.market);
        let reply: MarketResponse<ReceiveInfo> =
            self.get_json(&url, self.task_headers(tokens)?).await?;
        reply.into_balance()
    }
}
