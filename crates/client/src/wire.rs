//! Request and response shapes of the vendor endpoints

use caiyun_types::{
    CloudBalance, Declared, FileEntry, FilePage, ShareLink, SignInStatus, UploadEnvelope,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::ApiError;

const MARKET_SUCCESS: &str = "success";

/// Page size the desktop client uses for listings
pub(crate) const LIST_PAGE_SIZE: u32 = 40;

// ============================================================================
// Credential exchange
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpecTokenRequest<'a> {
    pub phone_number: &'a str,
    pub to_source_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpecTokenResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<TokenData>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: String,
}

impl SpecTokenResponse {
    pub fn into_declared(self) -> Result<Declared<String>, ApiError> {
        if !self.success {
            return Ok(Declared::rejected(
                self.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        self.data
            .map(|d| Declared::Accepted(d.token))
            .ok_or_else(|| ApiError::Parse("missing data.token".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PortalLoginResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    result: Option<TokenData>,
}

impl PortalLoginResponse {
    pub fn into_declared(self) -> Result<Declared<String>, ApiError> {
        if self.code != 0 {
            return Ok(Declared::rejected(
                self.msg
                    .unwrap_or_else(|| format!("portal returned code {}", self.code)),
            ));
        }
        self.result
            .map(|r| Declared::Accepted(r.token))
            .ok_or_else(|| ApiError::Parse("missing result.token".to_string()))
    }
}

// ============================================================================
// Market service
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct MarketResponse<T> {
    msg: Option<String>,
    result: Option<T>,
}

impl<T> MarketResponse<T> {
    fn declared_message(&self) -> Option<String> {
        match self.msg.as_deref() {
            Some(MARKET_SUCCESS) => None,
            Some(msg) => Some(msg.to_string()),
            None => Some("missing msg".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignInInfo {
    #[serde(rename = "todaySignIn", default)]
    today_sign_in: bool,
}

impl MarketResponse<SignInInfo> {
    pub fn into_status(self) -> Declared<SignInStatus> {
        if let Some(message) = self.declared_message() {
            return Declared::rejected(message);
        }
        Declared::Accepted(SignInStatus {
            signed_in_today: self.result.map(|r| r.today_sign_in).unwrap_or(false),
        })
    }
}

impl MarketResponse<Value> {
    pub fn into_ack(self) -> Declared<()> {
        match self.declared_message() {
            Some(message) => Declared::rejected(message),
            None => Declared::Accepted(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReceiveInfo {
    #[serde(default, deserialize_with = "lenient_count")]
    receive: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    total: u64,
}

impl MarketResponse<ReceiveInfo> {
    pub fn into_balance(self) -> Result<CloudBalance, ApiError> {
        self.result
            .map(|r| CloudBalance {
                claimable: r.receive,
                total: r.total,
            })
            .ok_or_else(|| ApiError::Parse("missing result in receive reply".to_string()))
    }
}

/// Counts arrive as numbers, numeric strings or empty strings depending on the day
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("count out of range: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s.trim().parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected a count, got {}", other))),
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Render the `pcUploadFileRequest` document for an envelope
pub(crate) fn upload_request_xml(envelope: &UploadEnvelope) -> String {
    format!(
        "<pcUploadFileRequest>\
<ownerMSISDN>{owner}</ownerMSISDN>\
<fileCount>1</fileCount>\
<totalSize>{size}</totalSize>\
<uploadContentList length=\"1\">\
<uploadContentInfo>\
<contentName><![CDATA[{name}]]></contentName>\
<contentSize>{size}</contentSize>\
<contentDesc></contentDesc>\
<contentTAGList></contentTAGList>\
<comlexFlag>0</comlexFlag>\
<comlexCID></comlexCID>\
<resCID length=\"0\"></resCID>\
<digest>{digest}</digest>\
<extInfo length=\"1\"><entry><key>modifyTime</key><vaule>{modify_time}</vaule></entry></extInfo>\
</uploadContentInfo>\
</uploadContentList>\
<newCatalogName></newCatalogName>\
<parentCatalogID>{parent}</parentCatalogID>\
<operation>0</operation>\
<path></path>\
<manualRename>2</manualRename>\
</pcUploadFileRequest>",
        owner = xml_escape(&envelope.owner_account),
        size = envelope.content_size,
        name = cdata_escape(&envelope.content_name),
        digest = xml_escape(&envelope.digest),
        modify_time = xml_escape(&envelope.modify_time),
        parent = xml_escape(&envelope.parent_catalog_id),
    )
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn cdata_escape(value: &str) -> String {
    value.replace("]]>", "]]]]><![CDATA[>")
}

// ============================================================================
// File listing
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileListRequest<'a> {
    pub parent_file_id: &'a str,
    pub page_info: PageInfo<'a>,
    pub image_thumbnail_style_list: [&'static str; 2],
    pub order_direction: &'static str,
    pub order_by: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo<'a> {
    pub page_size: u32,
    pub page_cursor: &'a str,
}

impl<'a> FileListRequest<'a> {
    pub fn new(parent_file_id: &'a str, cursor: Option<&'a str>) -> Self {
        Self {
            parent_file_id,
            page_info: PageInfo {
                page_size: LIST_PAGE_SIZE,
                page_cursor: cursor.unwrap_or(""),
            },
            image_thumbnail_style_list: ["Big", "Small"],
            order_direction: "DESC",
            order_by: "updated_at",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<FileListData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListData {
    #[serde(default)]
    items: Vec<FileItem>,
    #[serde(default)]
    next_page_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileItem {
    file_id: String,
    #[serde(default)]
    name: String,
}

impl FileListResponse {
    pub fn into_page(self) -> Declared<FilePage> {
        if !self.success {
            return Declared::rejected(
                self.message
                    .unwrap_or_else(|| "file listing failed".to_string()),
            );
        }
        let data = self.data.unwrap_or_default();
        Declared::Accepted(FilePage {
            items: data
                .items
                .into_iter()
                .map(|item| FileEntry::new(item.file_id, item.name))
                .collect(),
            next_cursor: data.next_page_cursor.filter(|c| !c.is_empty()),
        })
    }
}

// ============================================================================
// Share link
// ============================================================================

pub(crate) fn out_link_request(account: &str, file: &FileEntry) -> Value {
    json!({
        "getOutLinkReq": {
            "subLinkType": 0,
            "encrypt": 1,
            "coIDLst": [file.file_id],
            "caIDLst": [],
            "pubType": 1,
            "dedicatedName": file.name,
            "periodUnit": 1,
            "viewerLst": [],
            "extInfo": {
                "isWatermark": 0,
                "shareChannel": "3001"
            },
            "period": 1,
            "commonAccountInfo": {
                "account": account,
                "accountType": 1
            }
        }
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutLinkResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<OutLinkData>,
}

#[derive(Debug, Deserialize)]
struct OutLinkData {
    #[serde(rename = "getOutLinkRes")]
    result: OutLinkResult,
}

#[derive(Debug, Deserialize)]
struct OutLinkResult {
    #[serde(rename = "getOutLinkResSet", default)]
    links: Vec<OutLinkItem>,
}

#[derive(Debug, Deserialize)]
struct OutLinkItem {
    #[serde(rename = "linkUrl")]
    link_url: String,
}

impl OutLinkResponse {
    pub fn into_declared(self) -> Result<Declared<ShareLink>, ApiError> {
        if !self.success {
            return Ok(Declared::rejected(
                self.message
                    .unwrap_or_else(|| "share link creation failed".to_string()),
            ));
        }
        self.data
            .and_then(|d| d.result.links.into_iter().next())
            .map(|item| Declared::Accepted(ShareLink { url: item.link_url }))
            .ok_or_else(|| ApiError::Parse("missing getOutLinkResSet[0].linkUrl".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_token_success() {
        let reply: SpecTokenResponse = serde_json::from_str(
            r#"{"success": true, "code": "0", "message": "", "data": {"token": "STuid00001"}}"#,
        )
        .unwrap();
        assert_eq!(
            reply.into_declared().unwrap(),
            Declared::Accepted("STuid00001".to_string())
        );
    }

    #[test]
    fn test_spec_token_declared_failure() {
        let reply: SpecTokenResponse =
            serde_json::from_str(r#"{"success": false, "message": "authorization invalid"}"#)
                .unwrap();
        assert_eq!(
            reply.into_declared().unwrap(),
            Declared::rejected("authorization invalid")
        );
    }

    #[test]
    fn test_spec_token_success_without_token_is_parse_error() {
        let reply: SpecTokenResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(reply.into_declared(), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_portal_login_nonzero_code() {
        let reply: PortalLoginResponse =
            serde_json::from_str(r#"{"code": 1001, "msg": "sso token expired"}"#).unwrap();
        assert_eq!(
            reply.into_declared().unwrap(),
            Declared::rejected("sso token expired")
        );

        let reply: PortalLoginResponse =
            serde_json::from_str(r#"{"code": 0, "msg": "ok", "result": {"token": "jwt"}}"#)
                .unwrap();
        assert_eq!(
            reply.into_declared().unwrap(),
            Declared::Accepted("jwt".to_string())
        );
    }

    #[test]
    fn test_sign_in_info() {
        let reply: MarketResponse<SignInInfo> = serde_json::from_str(
            r#"{"code": 0, "msg": "success", "result": {"todaySignIn": true, "total": 3}}"#,
        )
        .unwrap();
        assert_eq!(
            reply.into_status(),
            Declared::Accepted(SignInStatus {
                signed_in_today: true
            })
        );

        let reply: MarketResponse<SignInInfo> =
            serde_json::from_str(r#"{"msg": "jwtToken invalid"}"#).unwrap();
        assert_eq!(reply.into_status(), Declared::rejected("jwtToken invalid"));
    }

    #[test]
    fn test_market_ack() {
        let reply: MarketResponse<Value> =
            serde_json::from_str(r#"{"msg": "success", "result": {"id": 9}}"#).unwrap();
        assert_eq!(reply.into_ack(), Declared::Accepted(()));

        let reply: MarketResponse<Value> =
            serde_json::from_str(r#"{"msg": "activity closed"}"#).unwrap();
        assert_eq!(reply.into_ack(), Declared::rejected("activity closed"));
    }

    #[test]
    fn test_receive_counts_accept_numbers_and_strings() {
        let reply: MarketResponse<ReceiveInfo> =
            serde_json::from_str(r#"{"msg": "success", "result": {"receive": "15", "total": 230}}"#)
                .unwrap();
        assert_eq!(
            reply.into_balance().unwrap(),
            CloudBalance {
                claimable: 15,
                total: 230
            }
        );

        let reply: MarketResponse<ReceiveInfo> =
            serde_json::from_str(r#"{"result": {"receive": ""}}"#).unwrap();
        assert_eq!(reply.into_balance().unwrap(), CloudBalance::default());
    }

    #[test]
    fn test_receive_without_result_is_parse_error() {
        let reply: MarketResponse<ReceiveInfo> =
            serde_json::from_str(r#"{"msg": "success"}"#).unwrap();
        assert!(matches!(reply.into_balance(), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_file_list_page() {
        let reply: FileListResponse = serde_json::from_str(
            r#"{
                "success": true,
                "data": {
                    "items": [
                        {"fileId": "F1", "name": "report", "type": "file"},
                        {"fileId": "F2", "name": "target-7"}
                    ],
                    "nextPageCursor": ""
                }
            }"#,
        )
        .unwrap();

        let page = reply.into_page().into_result().unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1], FileEntry::new("F2", "target-7"));
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_file_list_request_shape() {
        let body = serde_json::to_value(FileListRequest::new("dir-1", Some("c2"))).unwrap();
        assert_eq!(body["parentFileId"], "dir-1");
        assert_eq!(body["pageInfo"]["pageSize"], 40);
        assert_eq!(body["pageInfo"]["pageCursor"], "c2");
        assert_eq!(body["orderBy"], "updated_at");
    }

    #[test]
    fn test_out_link_reply() {
        let reply: OutLinkResponse = serde_json::from_str(
            r#"{"success": true, "data": {"getOutLinkRes": {"getOutLinkResSet": [{"linkUrl": "https://caiyun.139.com/m/i?abc"}]}}}"#,
        )
        .unwrap();
        assert_eq!(
            reply.into_declared().unwrap(),
            Declared::Accepted(ShareLink {
                url: "https://caiyun.139.com/m/i?abc".to_string()
            })
        );

        let reply: OutLinkResponse =
            serde_json::from_str(r#"{"success": false, "message": "file under review"}"#).unwrap();
        assert_eq!(
            reply.into_declared().unwrap(),
            Declared::rejected("file under review")
        );
    }

    #[test]
    fn test_out_link_request_embeds_file() {
        let body = out_link_request("13800000000", &FileEntry::new("F2", "target-7"));
        assert_eq!(body["getOutLinkReq"]["coIDLst"][0], "F2");
        assert_eq!(body["getOutLinkReq"]["dedicatedName"], "target-7");
        assert_eq!(
            body["getOutLinkReq"]["commonAccountInfo"]["account"],
            "13800000000"
        );
    }

    #[test]
    fn test_upload_xml_carries_envelope() {
        let envelope = UploadEnvelope {
            owner_account: "13800000000".to_string(),
            content_name: "a]]>b".to_string(),
            content_size: 1024,
            digest: "ABCDEF".to_string(),
            modify_time: "20240101080000".to_string(),
            parent_catalog_id: "dir&1".to_string(),
        };
        let xml = upload_request_xml(&envelope);

        assert!(xml.contains("<ownerMSISDN>13800000000</ownerMSISDN>"));
        assert!(xml.contains("<contentSize>1024</contentSize>"));
        assert!(xml.contains("<digest>ABCDEF</digest>"));
        assert!(xml.contains("<vaule>20240101080000</vaule>"));
        assert!(xml.contains("<parentCatalogID>dir&amp;1</parentCatalogID>"));
        assert!(xml.contains("<![CDATA[a]]]]><![CDATA[>b]]>"));
    }
}
