use std::thread::sleep;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::Value;
use url::Url;
use url::form_urlencoded;

use crate::error::{Error, Result};

pub const DEFAULT_RETRY_BUDGET: u32 = 5;
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "http://{language}.wikipedia.org/w/api.php";
pub const DEFAULT_STATS_TEMPLATE: &str = "http://stats.grok.se/json/{language}/{month}";

/// Connection settings for [`WikiClient`].
///
/// `endpoint_template` and `stats_template` hold `{language}` (and `{month}`)
/// placeholders substituted per request, so tests and mirrors can point the
/// client elsewhere.
#[derive(Debug, Clone)]
pub struct WikiClientConfig {
    pub language: String,
    pub endpoint_template: String,
    pub stats_template: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub retry_budget: u32,
    pub retry_wait: Duration,
}

impl Default for WikiClientConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            stats_template: DEFAULT_STATS_TEMPLATE.to_string(),
            user_agent: format!("wikiquery/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            retry_budget: DEFAULT_RETRY_BUDGET,
            retry_wait: DEFAULT_RETRY_WAIT,
        }
    }
}

/// Raw HTTP seam. Implementations return the response body text; connection
/// level failures map to [`Error::Connection`], which is the only class the
/// executor retries.
pub trait Transport {
    fn post_form(&self, url: &Url, body: &str) -> Result<String>;
    fn get(&self, url: &Url) -> Result<String>;
}

/// Blocking [`Transport`] over reqwest.
pub struct HttpTransport {
    client: Client,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &WikiClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| Error::Http(error.to_string()))?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    fn read_body(response: reqwest::blocking::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            if is_retryable_status(status) {
                return Err(Error::Connection(format!("transient HTTP {status}")));
            }
            return Err(Error::Status(status.as_u16()));
        }
        response.text().map_err(transport_error)
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, url: &Url, body: &str) -> Result<String> {
        let response = self
            .client
            .post(url.clone())
            .header("User-Agent", self.user_agent.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .map_err(transport_error)?;
        Self::read_body(response)
    }

    fn get(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", self.user_agent.clone())
            .send()
            .map_err(transport_error)?;
        Self::read_body(response)
    }
}

/// Continuation descriptor for one paginated list. The token is read from
/// `query-continue.<section>.<param>` in each response and sent back under
/// `<param>` in the next request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Continuation {
    pub(crate) section: &'static str,
    pub(crate) param: &'static str,
}

/// Client for one language edition of the encyclopedia.
///
/// All query methods take `&self`; the client holds no state beyond its
/// configuration and transport, so a single instance can serve any number of
/// sequential calls.
pub struct WikiClient<T: Transport = HttpTransport> {
    config: WikiClientConfig,
    transport: T,
}

impl WikiClient {
    pub fn new(config: WikiClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Client for a language edition with default settings.
    pub fn for_language(language: &str) -> Result<Self> {
        let config = WikiClientConfig {
            language: language.to_string(),
            ..WikiClientConfig::default()
        };
        Self::new(config)
    }
}

impl<T: Transport> WikiClient<T> {
    /// Builds a client over a caller-supplied transport.
    pub fn with_transport(config: WikiClientConfig, transport: T) -> Result<Self> {
        validate_language(&config.language)?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &WikiClientConfig {
        &self.config
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn request_json(&self, params: &[(&str, String)]) -> Result<Value> {
        self.request_json_for(&self.config.language, params)
    }

    /// Runs an API request against a specific language edition. Appends
    /// `format=json` and form-encodes the parameters as the POST body.
    pub(crate) fn request_json_for(&self, language: &str, params: &[(&str, String)]) -> Result<Value> {
        validate_language(language)?;
        let url = self.api_url(language)?;

        let mut pairs = Vec::with_capacity(params.len() + 1);
        pairs.push(("format", "json".to_string()));
        for (key, value) in params {
            pairs.push((*key, value.clone()));
        }
        let body = encode_form(&pairs);

        log::debug!("POST {url} ({} parameters)", pairs.len());
        self.execute(|| self.transport.post_form(&url, &body))
    }

    /// Runs a plain GET for a non-API JSON resource through the same retry
    /// loop.
    pub(crate) fn fetch_json(&self, url: &Url) -> Result<Value> {
        log::debug!("GET {url}");
        self.execute(|| self.transport.get(url))
    }

    fn execute(&self, send: impl Fn() -> Result<String>) -> Result<Value> {
        for attempt in 0..=self.config.retry_budget {
            match send() {
                Ok(body) => {
                    let payload: Value = serde_json::from_str(&body)?;
                    if let Some(error) = payload.get("error") {
                        let code = error
                            .get("code")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown_error");
                        let info = error
                            .get("info")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown info");
                        return Err(Error::Api {
                            code: code.to_string(),
                            info: info.to_string(),
                        });
                    }
                    return Ok(payload);
                }
                Err(Error::Connection(message)) => {
                    if attempt < self.config.retry_budget {
                        log::warn!(
                            "request failed ({message}); retry {} of {} in {:?}",
                            attempt + 1,
                            self.config.retry_budget,
                            self.config.retry_wait,
                        );
                        sleep(self.config.retry_wait);
                        continue;
                    }
                    return Err(Error::Connection(message));
                }
                Err(other) => return Err(other),
            }
        }

        Err(Error::Connection("retry budget exhausted".to_string()))
    }

    /// Drives a `query-continue` pagination loop. The loop keeps fetching
    /// while the response carries a token and the accumulated count has not
    /// passed `limit`; the count is inspected before the next fetch, so one
    /// page past the limit is fetched and the result truncated afterwards.
    pub(crate) fn paginate<I>(
        &self,
        params: &[(&str, String)],
        continuation: Continuation,
        limit: Option<usize>,
        mut extract: impl FnMut(&Value) -> Vec<I>,
    ) -> Result<Vec<I>> {
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut pairs = Vec::with_capacity(params.len() + 1);
            for (key, value) in params {
                pairs.push((*key, value.clone()));
            }
            if let Some(token) = &continue_token {
                pairs.push((continuation.param, token.clone()));
            }

            let payload = self.request_json(&pairs)?;
            items.extend(extract(&payload));

            continue_token = payload
                .get("query-continue")
                .and_then(|blocks| blocks.get(continuation.section))
                .and_then(|block| block.get(continuation.param))
                .and_then(Value::as_str)
                .map(ToString::to_string);

            if continue_token.is_none() {
                break;
            }
            if let Some(limit) = limit
                && items.len() > limit
            {
                break;
            }
        }

        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }

    fn api_url(&self, language: &str) -> Result<Url> {
        let raw = self.config.endpoint_template.replace("{language}", language);
        Ok(Url::parse(&raw)?)
    }

    /// Statistics service URL for one month; the title rides as a dedicated
    /// path segment so it is percent-encoded on the way in.
    pub(crate) fn stats_url(&self, month: &str, title: &str) -> Result<Url> {
        let raw = self
            .config
            .stats_template
            .replace("{language}", &self.config.language)
            .replace("{month}", month);
        let mut url = Url::parse(&raw)?;
        url.path_segments_mut()
            .map_err(|_| Error::Http(format!("stats url cannot take a path segment: {raw}")))?
            .push(title);
        Ok(url)
    }
}

/// Form-encodes parameter pairs for a request body. Values are encoded as
/// their UTF-8 bytes. Empty values are kept; `redirects` is an empty-valued
/// parameter whose mere presence the API honors.
pub(crate) fn encode_form(params: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn validate_language(language: &str) -> Result<()> {
    let well_formed = !language.is_empty()
        && language
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-');
    if well_formed {
        Ok(())
    } else {
        Err(Error::Language(language.to_string()))
    }
}

fn transport_error(error: reqwest::Error) -> Error {
    if is_retryable_error(&error) {
        Error::Connection(error.to_string())
    } else {
        Error::Http(error.to_string())
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::Value;
    use url::Url;

    use super::Transport;
    use crate::error::{Error, Result};

    /// Transport fake that replays a scripted sequence of responses and
    /// records every request it sees.
    pub(crate) struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<String>>>,
        requests: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn from_values(values: Vec<Value>) -> Self {
            Self::new(values.into_iter().map(|value| Ok(value.to_string())).collect())
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }

        pub(crate) fn request(&self, index: usize) -> String {
            self.requests.borrow()[index].clone()
        }

        fn next_response(&self, detail: String) -> Result<String> {
            self.requests.borrow_mut().push(detail);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Connection("script exhausted".to_string())))
        }
    }

    impl Transport for ScriptedTransport {
        fn post_form(&self, url: &Url, body: &str) -> Result<String> {
            self.next_response(format!("{url} {body}"))
        }

        fn get(&self, url: &Url) -> Result<String> {
            self.next_response(url.to_string())
        }
    }

    /// Client over a scripted transport, with retries disabled.
    pub(crate) fn client_with(transport: ScriptedTransport) -> super::WikiClient<ScriptedTransport> {
        let config = super::WikiClientConfig {
            retry_budget: 0,
            retry_wait: std::time::Duration::ZERO,
            ..super::WikiClientConfig::default()
        };
        super::WikiClient::with_transport(config, transport).expect("test client")
    }
}
