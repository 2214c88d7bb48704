// XML-RPC weblogUpdates pings

use crate::error::ConfigError;
use crate::outcome::{BroadcastResult, Outcome, PingResult, ResultCallback};
use crate::site::SiteConfig;
use indexcast_scanner::resolver::{DEFAULT_TIMEOUT_SECS, USER_AGENT};
use quick_xml::escape::escape;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};

/// Services whose names contain one of these speak `weblogUpdates.extendedPing`.
pub const EXTENDED_PING_PROVIDERS: &[&str] = &["Twingly", "Bitacoras"];

/// Marker of an XML-RPC fault response.
pub const FAULT_MARKER: &str = "<fault>";

/// Pause between two services of the same site.
pub const DEFAULT_PING_DELAY: Duration = Duration::from_secs(1);

const DETAIL_LIMIT: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingPayload {
    Simple {
        title: String,
        url: String,
    },
    Extended {
        title: String,
        url: String,
        feed_url: String,
    },
}

impl PingPayload {
    /// Extended when the service is a known extended provider and the site has a feed.
    pub fn for_service(service_name: &str, site: &SiteConfig) -> Self {
        let title = site.display_name().to_string();
        let url = site.site_url();

        match site.feed_url() {
            Some(feed_url) if uses_extended_ping(service_name) => PingPayload::Extended {
                title,
                url,
                feed_url: feed_url.to_string(),
            },
            _ => PingPayload::Simple { title, url },
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            PingPayload::Simple { .. } => "weblogUpdates.ping",
            PingPayload::Extended { .. } => "weblogUpdates.extendedPing",
        }
    }

    pub fn params(&self) -> Vec<&str> {
        match self {
            PingPayload::Simple { title, url } => vec![title.as_str(), url.as_str()],
            PingPayload::Extended {
                title,
                url,
                feed_url,
            } => vec![title.as_str(), url.as_str(), feed_url.as_str()],
        }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?>\n<methodCall>\n");
        xml.push_str(&format!(
            "   <methodName>{}</methodName>\n   <params>\n",
            self.method_name()
        ));
        for param in self.params() {
            xml.push_str(&format!(
                "      <param><value><string>{}</string></value></param>\n",
                escape(param)
            ));
        }
        xml.push_str("   </params>\n</methodCall>");
        xml
    }
}

pub fn uses_extended_ping(service_name: &str) -> bool {
    EXTENDED_PING_PROVIDERS
        .iter()
        .any(|provider| service_name.contains(provider))
}

/// Non-2xx or a fault body is a `Fault`; anything else answered is a `Success`.
pub fn classify(status: u16, body: &str) -> Outcome {
    if (200..300).contains(&status) && !body.contains(FAULT_MARKER) {
        Outcome::Success
    } else {
        Outcome::Fault
    }
}

/// Cut a response body down to something that fits in a log line.
pub fn truncate_detail(body: &str) -> String {
    match body.char_indices().nth(DETAIL_LIMIT) {
        Some((idx, _)) => format!("{}... (truncated)", &body[..idx]),
        None => body.to_string(),
    }
}

/// Posts pings for a site to each of its services, one at a time.
pub struct PingBroadcaster {
    client: Client,
    delay: Duration,
    result_callback: Option<ResultCallback>,
}

impl PingBroadcaster {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            delay: DEFAULT_PING_DELAY,
            result_callback: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Pause between two services of the same site
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Ping every service configured for `site`. Failed pings are reported, not retried.
    pub async fn broadcast(&self, site: &SiteConfig) -> Result<Vec<PingResult>, ConfigError> {
        let services = site.ping_services()?;
        let subject = site.site_url();
        let mut results = Vec::with_capacity(services.len());

        for (idx, (service, endpoint)) in services.iter().enumerate() {
            if idx > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let payload = PingPayload::for_service(service, site);
            debug!(
                service = %service,
                endpoint = %endpoint,
                method = payload.method_name(),
                payload = %payload.to_xml(),
                "Sending ping"
            );

            let result = self.ping(service, endpoint, &payload, &subject).await;
            if let Some(ref callback) = self.result_callback {
                callback(&result);
            }
            results.push(result);
        }

        Ok(results)
    }

    pub async fn ping(
        &self,
        service: &str,
        endpoint: &str,
        payload: &PingPayload,
        subject: &str,
    ) -> PingResult {
        let response = match self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header(ACCEPT, "text/xml")
            .body(payload.to_xml())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(service = %service, endpoint = %endpoint, error = %e, "Ping failed");
                return BroadcastResult::transport_error(service, subject, e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(service = %service, status, error = %e, "Failed to read ping response");
                let mut result = BroadcastResult::transport_error(service, subject, e.to_string());
                result.http_status = Some(status);
                return result;
            }
        };
        let body = body.trim();

        match classify(status, body) {
            Outcome::Success => BroadcastResult::success(service, subject, status),
            _ => {
                warn!(service = %service, status, "Ping answered with a fault");
                BroadcastResult::fault(service, subject, status, truncate_detail(body))
            }
        }
    }
}
