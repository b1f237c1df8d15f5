use dom_smoothie::{Config as ReadabilityConfig, Readability, TextMode};
use futures::{future::BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use url::Url;

use crate::{
    config::WebContentConfig,
    domain::PageContent,
    pipeline::{ContentFetcher, FetchError},
};

const MISSING_DESCRIPTION: &str = "No Description";

static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta tag regex"));
static TAG_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
        .expect("valid attribute regex")
});

pub struct WebContentFetcher {
    client: Client,
    config: WebContentConfig,
}

impl WebContentFetcher {
    pub fn new(client: Client, config: WebContentConfig) -> Self {
        Self { client, config }
    }

    async fn fetch_page(&self, raw_url: &str) -> Result<PageContent, FetchError> {
        let url = parse_http_url(raw_url)?;

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .timeout(self.config.fetch_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let page = extract_page(&body, &url)?;
        tracing::debug!(
            target: "web",
            url = %url,
            title = %page.title,
            description = %page.meta_description,
            chars = page.content.chars().count(),
            "page extracted"
        );
        Ok(page)
    }
}

impl ContentFetcher for WebContentFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<PageContent, FetchError>> {
        self.fetch_page(url).boxed()
    }
}

fn parse_http_url(raw_url: &str) -> Result<Url, FetchError> {
    match Url::parse(raw_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(FetchError::UnsupportedUrl(raw_url.to_string())),
    }
}

fn extract_page(html: &str, url: &Url) -> Result<PageContent, FetchError> {
    let smoothie_cfg = ReadabilityConfig {
        text_mode: TextMode::Formatted,
        ..Default::default()
    };

    let mut readability = Readability::new(html, Some(url.as_str()), Some(smoothie_cfg))
        .map_err(|err| FetchError::Extract(err.to_string()))?;
    let article = readability
        .parse()
        .map_err(|err| FetchError::Extract(err.to_string()))?;

    let title = clean_str(Some(article.title)).unwrap_or_else(|| url.to_string());
    let meta_description =
        clean_str(meta_description(html)).unwrap_or_else(|| MISSING_DESCRIPTION.to_string());
    let content = article.text_content.to_string().trim().to_string();

    Ok(PageContent {
        title,
        meta_description,
        content,
    })
}

/// Content of the first `<meta name="description">` tag, if any. Readability excerpts are not
/// used because they fall back to the first paragraph of the body.
fn meta_description(html: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut is_description = false;
        let mut content = None;
        for attr in TAG_ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            match attr[1].to_ascii_lowercase().as_str() {
                "name" => is_description = value.trim().eq_ignore_ascii_case("description"),
                "content" => content = Some(decode_entities(value)),
                _ => {}
            }
        }
        if is_description {
            content
        } else {
            None
        }
    })
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn clean_str(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
