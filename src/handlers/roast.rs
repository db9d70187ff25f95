use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::admit;
use crate::error::AppError;
use crate::metrics::REQUEST_LATENCY;
use crate::models::RoastRequest;
use crate::prompts;
use crate::state::AppState;
use crate::util::clip;

const ROASTER_USER_AGENT: &str = "Helliduck-Roaster/1.0 (https://helliduck.com)";

pub async fn roast_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RoastRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = admit(&state, &headers).await?;

    let mut url = payload
        .url
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Please provide a URL".to_string()))?;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        url = format!("https://{url}");
    }
    if reqwest::Url::parse(&url).is_err() {
        return Err(AppError::BadRequest("Invalid URL".to_string()));
    }

    let fetch_start = Instant::now();
    let response = state
        .http
        .get(&url)
        .header(reqwest::header::USER_AGENT, ROASTER_USER_AGENT)
        .timeout(Duration::from_secs(state.config.roast_timeout_secs))
        .send()
        .await
        .map_err(|_| {
            AppError::BadRequest(
                "Couldn't fetch that website. It might be blocking us, or it's just that bad."
                    .to_string(),
            )
        })?;

    if !response.status().is_success() {
        return Err(AppError::BadRequest(format!(
            "Website returned {}. Can't roast what we can't reach.",
            response.status().as_u16()
        )));
    }

    let html = response.text().await.map_err(|_| {
        AppError::BadRequest(
            "Couldn't fetch that website. It might be blocking us, or it's just that bad."
                .to_string(),
        )
    })?;
    let load_time_ms = fetch_start.elapsed().as_millis() as u64;

    let metrics = json!({
        "title": page_title(&html).unwrap_or_else(|| "(none)".to_string()),
        "htmlSizeKB": html.len() / 1024,
        "loadTimeMs": load_time_ms,
    });

    let prompt = prompts::roast(&url, clip(&html, 3000), &metrics);

    let start = Instant::now();
    let mut result = state.ai.generate_json(&prompt).await?;
    let elapsed = start.elapsed();

    if let Value::Object(map) = &mut result {
        map.insert("metrics".to_string(), metrics);
    }

    state.audit.log(
        &ip,
        "/api/v1/roast",
        json!({ "url": url }),
        result.clone(),
        elapsed.as_millis() as u64,
    );
    REQUEST_LATENCY.observe(elapsed.as_secs_f64());

    Ok(Json(result))
}

// Just enough to give the model something concrete. Deep scraping heuristics
// are not this service's business.
fn page_title(html: &str) -> Option<String> {
    let start = html.find("<title")?;
    let rest = &html[start..];
    let open_end = rest.find('>')?;
    let after_open = &rest[open_end + 1..];
    let close = after_open.find("</title>").or_else(|| after_open.find("</TITLE>"))?;
    let title = after_open[..close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_simple_title() {
        let html = "<html><head><title>Quack Industries</title></head></html>";
        assert_eq!(page_title(html).as_deref(), Some("Quack Industries"));
    }

    #[test]
    fn handles_title_attributes_and_whitespace() {
        let html = r#"<title data-x="1">  padded  </title>"#;
        assert_eq!(page_title(html).as_deref(), Some("padded"));
    }

    #[test]
    fn missing_or_empty_title_is_none() {
        assert_eq!(page_title("<html></html>"), None);
        assert_eq!(page_title("<title></title>"), None);
    }
}
