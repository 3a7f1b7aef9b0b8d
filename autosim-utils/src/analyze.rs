use autosim::core::Summary;
use chrono::{DateTime, Utc};

/// ThingSpeak channel feed.
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct FeedResponse {
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// Single channel entry as written by the simulator.
#[derive(Debug, Default, serde_derive::Deserialize)]
pub(crate) struct FeedEntry {
    pub created_at: Option<DateTime<Utc>>,
    pub field1: Option<String>,
    pub field2: Option<String>,
    pub field3: Option<String>,
    pub field4: Option<String>,
    pub field5: Option<String>,
}

fn parse_field<T: std::str::FromStr>(field: &Option<String>) -> Option<T> {
    field.as_deref().and_then(|value| value.trim().parse().ok())
}

/// Build a trip summary from channel entries.
///
/// Entries without an engine speed or temperature above zero do not count
/// toward those statistics. Any non-empty code field counts as a fault entry.
pub(crate) fn summarize(entries: &[FeedEntry]) -> Summary {
    let mut summary = Summary::default();

    for entry in entries {
        if let Some(rpm) = parse_field::<i64>(&entry.field1).filter(|v| *v > 0) {
            summary.rpm.push(rpm as f64);
        }
        if let Some(speed) = parse_field::<i64>(&entry.field2).filter(|v| *v >= 0) {
            summary.speed.push(speed as f64);
        }
        if let Some(fuel) = parse_field::<f64>(&entry.field3).filter(|v| v.is_finite()) {
            summary.fuel.push(fuel);
        }
        if let Some(temperature) = parse_field::<i64>(&entry.field4).filter(|v| *v > 0) {
            summary.engine_temperature.push(temperature as f64);
        }

        if let Some(code) = entry.field5.as_deref().map(str::trim) {
            if !code.is_empty() {
                summary.dtc_count += 1;
                match code.parse() {
                    Ok(code) => summary.last_dtc = Some(code),
                    Err(_) => log::debug!("Ignoring unknown code format '{}'", code),
                }
            }
        }
    }

    summary
}

/// Channel feed query.
pub(crate) struct FeedQuery {
    pub url: String,
    pub channel: u64,
    pub read_key: Option<String>,
    pub results: Option<u32>,
    pub days: Option<u32>,
}

impl FeedQuery {
    fn label(&self) -> String {
        match (self.results, self.days) {
            (Some(results), _) => format!("last {} entries", results),
            (None, Some(1)) => "last 24 hours".to_string(),
            (None, Some(days)) => format!("last {} days", days),
            (None, None) => "all entries".to_string(),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![];

        if let Some(read_key) = &self.read_key {
            params.push(("api_key", read_key.clone()));
        }
        if let Some(results) = self.results {
            params.push(("results", results.to_string()));
        }
        if let Some(days) = self.days {
            params.push(("days", days.to_string()));
        }

        params
    }
}

async fn fetch(query: &FeedQuery) -> anyhow::Result<FeedResponse> {
    let url = format!(
        "{}/channels/{}/feeds.json",
        query.url.trim_end_matches('/'),
        query.channel
    );

    log::debug!("Fetching channel feed from {}", url);

    let client = reqwest::Client::builder()
        .user_agent(format!("autosim/{}", autosim::consts::VERSION))
        .build()?;

    let response = client
        .get(url)
        .query(&query.params())
        .send()
        .await?
        .error_for_status()?;

    Ok(response.json().await?)
}

/// Fetch the channel feed and print the summary.
pub(crate) async fn analyze(query: FeedQuery) -> anyhow::Result<()> {
    let label = query.label();

    let feed = fetch(&query).await?;
    if feed.feeds.is_empty() {
        println!("No data available for {}.", label);
        return Ok(());
    }

    let summary = summarize(&feed.feeds);

    println!("=== ThingSpeak summary for {} ===", label);
    println!("Entries: {}", feed.feeds.len());

    let first = feed.feeds.first().and_then(|entry| entry.created_at);
    let last = feed.feeds.last().and_then(|entry| entry.created_at);
    if let (Some(first), Some(last)) = (first, last) {
        println!(
            "Time range: {} -> {}",
            first.format("%Y-%m-%d %H:%M:%SZ"),
            last.format("%Y-%m-%d %H:%M:%SZ")
        );
    }

    println!("{}", summary);

    Ok(())
}
