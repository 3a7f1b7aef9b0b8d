use std::{io, time::Duration};

use autosim::core::Reading;
use autosim::net::Publisher;

/// ThingSpeak API base address.
pub const DEFAULT_URL: &str = "https://api.thingspeak.com";

/// Publisher writing readings to a ThingSpeak channel.
///
/// Fields are mapped as follows: `field1` RPM, `field2` speed, `field3` fuel,
/// `field4` engine temperature, `field5` the active code and `field6` whether
/// a code is active. The position is sent as channel location.
pub struct ThingSpeak {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl ThingSpeak {
    pub fn new(url: impl ToString, api_key: impl ToString) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("autosim/{}", autosim::consts::VERSION))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.to_string().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Query parameters for a channel update.
fn update_query(api_key: &str, reading: &Reading) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("api_key", api_key.to_string()),
        ("field1", reading.rpm.to_string()),
        ("field2", reading.speed.to_string()),
        ("field3", format!("{:.2}", reading.fuel)),
        ("field4", reading.engine_temperature.to_string()),
    ];

    if let Some(code) = reading.dtc {
        query.push(("field5", code.to_string()));
    }

    query.push(("field6", if reading.has_fault() { "1" } else { "0" }.to_string()));
    query.push((
        "status",
        match reading.dtc {
            Some(code) => format!("DTC: {}", code),
            None => "OK".to_string(),
        },
    ));
    query.push(("lat", format!("{:.6}", reading.position.latitude)));
    query.push(("long", format!("{:.6}", reading.position.longitude)));
    query.push(("elevation", format!("{:.1}", reading.position.altitude)));

    query
}

fn io_error(e: reqwest::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[async_trait::async_trait]
impl Publisher for ThingSpeak {
    async fn publish(&mut self, reading: &Reading) -> io::Result<()> {
        let query = update_query(&self.api_key, reading);

        log::trace!(
            "ThingSpeak request: {}",
            query
                .iter()
                .skip(1)
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join("&")
        );

        let response = self
            .client
            .get(format!("{}/update", self.url))
            .query(&query)
            .send()
            .await
            .map_err(io_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("ThingSpeak responded with status {}", status),
            ));
        }

        let body = response.text().await.map_err(io_error)?;

        // The channel answers with the new entry id, or zero when the update
        // was rejected.
        match body.trim() {
            "0" | "" => Err(io::Error::new(
                io::ErrorKind::Other,
                "ThingSpeak rejected the update",
            )),
            entry => {
                log::debug!("ThingSpeak entry {} created", entry);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosim::core::Position;

    fn reading(dtc: Option<&str>) -> Reading {
        Reading {
            offset: Duration::from_secs(90),
            rpm: 3_412,
            speed: 61,
            fuel: 99.5,
            engine_temperature: 91,
            dtc: dtc.map(|code| code.parse().unwrap()),
            position: Position::new(59.362_893, 17.972_157, 4.0),
        }
    }

    fn get<'a>(query: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_update_query() {
        let query = update_query("KEY", &reading(None));

        assert_eq!(get(&query, "api_key"), Some("KEY"));
        assert_eq!(get(&query, "field1"), Some("3412"));
        assert_eq!(get(&query, "field2"), Some("61"));
        assert_eq!(get(&query, "field3"), Some("99.50"));
        assert_eq!(get(&query, "field4"), Some("91"));
        assert_eq!(get(&query, "field5"), None);
        assert_eq!(get(&query, "field6"), Some("0"));
        assert_eq!(get(&query, "status"), Some("OK"));
        assert_eq!(get(&query, "lat"), Some("59.362893"));
        assert_eq!(get(&query, "long"), Some("17.972157"));
        assert_eq!(get(&query, "elevation"), Some("4.0"));
    }

    #[test]
    fn test_update_query_with_code() {
        let query = update_query("KEY", &reading(Some("P0455")));

        assert_eq!(get(&query, "field5"), Some("P0455"));
        assert_eq!(get(&query, "field6"), Some("1"));
        assert_eq!(get(&query, "status"), Some("DTC: P0455"));
    }

    #[test]
    fn test_url_trimmed() {
        let thingspeak = ThingSpeak::new("https://api.thingspeak.com/", "KEY").unwrap();

        assert_eq!(thingspeak.url, DEFAULT_URL);
    }
}
