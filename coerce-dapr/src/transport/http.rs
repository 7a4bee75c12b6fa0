use crate::config::SidecarConfig;
use crate::transport::{ActorTransport, Metadata, PubSubTransport, TransportErr};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::Value;
use uuid::Uuid;

const API_TOKEN_HEADER: &str = "dapr-api-token";
const USER_AGENT: &str = concat!("coerce-dapr/", env!("CARGO_PKG_VERSION"));
const JSON_CONTENT_TYPE: &str = "application/json";

/// [`ActorTransport`] and [`PubSubTransport`] backed by the Dapr sidecar's HTTP API.
///
/// Requests are not retried, a failed request is reported straight back to the caller.
#[derive(Clone)]
pub struct SidecarClient {
    http: Client,
    base_url: Url,
    api_token: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BulkPublishEntry {
    entry_id: String,
    event: Value,
    content_type: &'static str,
}

impl SidecarClient {
    pub fn new(config: &SidecarConfig) -> Result<SidecarClient, TransportErr> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportErr::Connection(e.to_string()))?;

        Self::with_client(http, &config.base_url(), config.api_token.clone())
    }

    pub fn with_client(
        http: Client,
        base_url: &str,
        api_token: Option<String>,
    ) -> Result<SidecarClient, TransportErr> {
        let base_url =
            Url::parse(base_url).map_err(|e| TransportErr::InvalidEndpoint(e.to_string()))?;

        if base_url.cannot_be_a_base() {
            return Err(TransportErr::InvalidEndpoint(base_url.to_string()));
        }

        Ok(SidecarClient {
            http,
            base_url,
            api_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.api_token {
            Some(token) => request.header(API_TOKEN_HEADER, token),
            None => request,
        }
    }
}

#[async_trait]
impl PubSubTransport for SidecarClient {
    async fn publish(
        &self,
        name: &str,
        topic: &str,
        payload: Value,
        metadata: Option<Metadata>,
    ) -> Result<(), TransportErr> {
        let url = publish_url(&self.base_url, name, topic, metadata.as_ref())?;
        trace!(target: "SidecarClient", %url, "publish");

        let response = self
            .request(Method::POST, url)
            .json(&payload)
            .send()
            .await
            .map_err(connection_err)?;

        check_status(response).await.map(|_| ())
    }

    async fn publish_bulk(
        &self,
        name: &str,
        topic: &str,
        payloads: Vec<Value>,
        metadata: Option<Metadata>,
    ) -> Result<(), TransportErr> {
        let url = publish_bulk_url(&self.base_url, name, topic, metadata.as_ref())?;
        trace!(target: "SidecarClient", %url, entries = payloads.len(), "publish bulk");

        let entries: Vec<BulkPublishEntry> = payloads
            .into_iter()
            .map(|event| BulkPublishEntry {
                entry_id: Uuid::new_v4().to_string(),
                event,
                content_type: JSON_CONTENT_TYPE,
            })
            .collect();

        let response = self
            .request(Method::POST, url)
            .json(&entries)
            .send()
            .await
            .map_err(connection_err)?;

        check_status(response).await.map(|_| ())
    }
}

#[async_trait]
impl ActorTransport for SidecarClient {
    async fn invoke(
        &self,
        actor_type: &str,
        actor_id: &str,
        method: &str,
        body: Option<Vec<Value>>,
    ) -> Result<Value, TransportErr> {
        let url = actor_method_url(&self.base_url, actor_type, actor_id, method)?;
        trace!(target: "SidecarClient", %url, "invoke actor");

        let request = match &body {
            Some(args) => self.request(Method::PUT, url).json(args),
            None => self.request(Method::PUT, url),
        };

        let response = request.send().await.map_err(connection_err)?;
        let response = check_status(response).await?;
        let bytes = response.bytes().await.map_err(connection_err)?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportErr::Deserialisation(e.to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response, TransportErr> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(TransportErr::Status {
        code: status.as_u16(),
        body,
    })
}

fn connection_err(e: reqwest::Error) -> TransportErr {
    if e.is_decode() {
        TransportErr::Deserialisation(e.to_string())
    } else {
        TransportErr::Connection(e.to_string())
    }
}

fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, TransportErr> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| TransportErr::InvalidEndpoint(base_url.to_string()))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

fn with_metadata(mut url: Url, metadata: Option<&Metadata>) -> Url {
    if let Some(metadata) = metadata.filter(|m| !m.is_empty()) {
        let mut entries: Vec<_> = metadata.iter().collect();
        entries.sort();

        let mut query = url.query_pairs_mut();
        for (key, value) in entries {
            query.append_pair(&format!("metadata.{}", key), value);
        }
    }

    url
}

pub(crate) fn publish_url(
    base_url: &Url,
    name: &str,
    topic: &str,
    metadata: Option<&Metadata>,
) -> Result<Url, TransportErr> {
    let url = endpoint(base_url, &["v1.0", "publish", name, topic])?;
    Ok(with_metadata(url, metadata))
}

pub(crate) fn publish_bulk_url(
    base_url: &Url,
    name: &str,
    topic: &str,
    metadata: Option<&Metadata>,
) -> Result<Url, TransportErr> {
    let url = endpoint(base_url, &["v1.0-alpha1", "publish", "bulk", name, topic])?;
    Ok(with_metadata(url, metadata))
}

pub(crate) fn actor_method_url(
    base_url: &Url,
    actor_type: &str,
    actor_id: &str,
    method: &str,
) -> Result<Url, TransportErr> {
    endpoint(
        base_url,
        &["v1.0", "actors", actor_type, actor_id, "method", method],
    )
}
