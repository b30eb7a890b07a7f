//! Remote stylesheet retrieval
//!
//! URLs are fetched in two fixed rounds. The first round retrieves every
//! given URL; a CSS response is kept as-is, an HTML response contributes its
//! `<style>` texts and schedules its `<link rel="stylesheet">` targets for the
//! second round. Second-round responses are taken as stylesheets without
//! looking for further links.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use futures::future::try_join_all;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use scraper::{Html, Selector};
use url::Url;

use crate::error::{Error, Result, TransportError};
use crate::options::RequestOptions;
use crate::parser::looks_like_css;

static STYLESHEET_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"link[rel="stylesheet"][href]"#).expect("valid link selector")
});

static STYLE_ELEMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("valid style selector"));

/// What the pipeline needs from an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    /// Address after redirects
    pub final_url: Url,
}

/// Performs GET requests
pub trait HttpClient {
    fn get(&self, url: &Url) -> impl Future<Output = std::result::Result<HttpResponse, TransportError>>;
}

/// [`HttpClient`] backed by `reqwest`, configured from [`RequestOptions`]
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(options: &RequestOptions) -> std::result::Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(
                options
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| format!("stylestats/{}", env!("CARGO_PKG_VERSION"))),
            );
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(Duration::from_millis(timeout));
        }
        if let Some(proxy) = &options.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, TransportError> {
        let response = self.inner.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
            final_url,
        })
    }
}

/// A successful response, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Css(String),
    Html(HtmlStyles),
}

/// Stylesheets referenced from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlStyles {
    /// `<link rel="stylesheet">` targets, resolved against the page URL
    pub links: Vec<Url>,
    /// Text of each `<style>` element
    pub styles: Vec<String>,
}

/// Result of both fetch rounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStyles {
    /// First-round fragments in URL order, then linked stylesheets in discovery order
    pub fragments: Vec<String>,
    /// Remote stylesheets: CSS responses plus stylesheet links found in pages
    pub stylesheets: usize,
    pub style_elements: usize,
}

/// Decide whether a response is CSS or HTML
pub fn classify_response(response: HttpResponse) -> std::result::Result<FetchResult, TransportError> {
    let content_type = response.content_type.as_deref().unwrap_or_default();

    if content_type.contains("css") || looks_like_css(&response.body) {
        return Ok(FetchResult::Css(response.body));
    }
    if content_type.contains("html") {
        return discover_styles(&response.body, &response.final_url).map(FetchResult::Html);
    }
    Err(TransportError::UnsupportedContentType(content_type.to_string()))
}

/// Collect stylesheet links and `<style>` texts from an HTML document
pub fn discover_styles(html: &str, base: &Url) -> std::result::Result<HtmlStyles, TransportError> {
    let document = Html::parse_document(html);

    let links = document
        .select(&STYLESHEET_LINK)
        .filter_map(|link| link.value().attr("href"))
        .map(|href| {
            base.join(href).map_err(|source| TransportError::InvalidLink {
                href: href.to_string(),
                source,
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let styles = document
        .select(&STYLE_ELEMENT)
        .map(|style| style.text().collect::<String>())
        .collect();

    Ok(HtmlStyles { links, styles })
}

async fn get_ok<H: HttpClient>(client: &H, url: &Url) -> Result<HttpResponse> {
    tracing::debug!(%url, "Fetching");
    let response = client
        .get(url)
        .await
        .map_err(|source| Error::transport(url.as_str(), source))?;
    if !(200..300).contains(&response.status) {
        return Err(Error::transport(
            url.as_str(),
            TransportError::Status(response.status),
        ));
    }
    Ok(response)
}

async fn fetch_and_classify<H: HttpClient>(client: &H, url: &Url) -> Result<FetchResult> {
    let response = get_ok(client, url).await?;
    classify_response(response).map_err(|source| Error::transport(url.as_str(), source))
}

/// Fetch `urls` and every stylesheet linked from the HTML among them
///
/// Each round runs its requests concurrently and fails on the first error.
pub async fn fetch_all<H: HttpClient>(urls: &[Url], client: &H) -> Result<RemoteStyles> {
    let mut remote = RemoteStyles::default();
    if urls.is_empty() {
        return Ok(remote);
    }

    let first_round = try_join_all(urls.iter().map(|url| fetch_and_classify(client, url))).await?;

    let mut links = Vec::new();
    for result in first_round {
        match result {
            FetchResult::Css(css) => {
                remote.stylesheets += 1;
                remote.fragments.push(css);
            }
            FetchResult::Html(page) => {
                remote.stylesheets += page.links.len();
                remote.style_elements += page.styles.len();
                remote.fragments.extend(page.styles);
                links.extend(page.links);
            }
        }
    }
    tracing::info!(
        urls = urls.len(),
        links = links.len(),
        style_elements = remote.style_elements,
        "Fetched first round"
    );

    if !links.is_empty() {
        let second_round = try_join_all(links.iter().map(|url| get_ok(client, url))).await?;
        remote
            .fragments
            .extend(second_round.into_iter().map(|response| response.body));
        tracing::info!(links = links.len(), "Fetched linked stylesheets");
    }

    Ok(remote)
}
