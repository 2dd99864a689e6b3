//! IP geolocation and per-country crisis hotline tables.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::AppError;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Coarse location reported by the lookup service. Missing fields stay empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoLocation {
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub timezone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrisisContact {
    pub name: &'static str,
    pub phone: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'static str>,
}

const fn line(name: &'static str, phone: &'static str) -> CrisisContact {
    CrisisContact {
        name,
        phone,
        text: None,
    }
}

const fn line_with_text(
    name: &'static str,
    phone: &'static str,
    text: &'static str,
) -> CrisisContact {
    CrisisContact {
        name,
        phone,
        text: Some(text),
    }
}

/// The US lifeline, always listed in the safety message.
pub const LIFELINE_988: CrisisContact =
    line_with_text("988 Suicide & Crisis Lifeline", "988", "Text 988");

const US: &[CrisisContact] = &[
    LIFELINE_988,
    line_with_text("Crisis Text Line", "", "Text HOME to 741741"),
    line("Emergency services", "911"),
];
const CA: &[CrisisContact] = &[
    line_with_text("9-8-8 Suicide Crisis Helpline", "988", "Text 988"),
    line("Emergency services", "911"),
];
const GB: &[CrisisContact] = &[
    line("Samaritans", "116 123"),
    line_with_text("Shout", "", "Text SHOUT to 85258"),
    line("Emergency services", "999"),
];
const IE: &[CrisisContact] = &[
    line("Samaritans", "116 123"),
    line_with_text("Text About It", "", "Text HELLO to 50808"),
    line("Emergency services", "112"),
];
const AU: &[CrisisContact] = &[
    line("Lifeline", "13 11 14"),
    line("Beyond Blue", "1300 22 4636"),
    line("Emergency services", "000"),
];
const NZ: &[CrisisContact] = &[
    line_with_text("Need to talk?", "1737", "Text 1737"),
    line("Lifeline Aotearoa", "0800 543 354"),
    line("Emergency services", "111"),
];
const IN: &[CrisisContact] = &[
    line("Tele-MANAS", "14416"),
    line("KIRAN Mental Health Helpline", "1800-599-0019"),
    line("Emergency services", "112"),
];
const DE: &[CrisisContact] = &[
    line("TelefonSeelsorge", "0800 111 0 111"),
    line("TelefonSeelsorge", "0800 111 0 222"),
    line("Emergency services", "112"),
];
const FR: &[CrisisContact] = &[
    line("3114 Prévention du suicide", "3114"),
    line("SOS Amitié", "09 72 39 40 50"),
    line("Emergency services", "112"),
];

fn table(country: &str) -> Option<&'static [CrisisContact]> {
    match country.trim().to_ascii_uppercase().as_str() {
        "US" => Some(US),
        "CA" => Some(CA),
        "GB" | "UK" => Some(GB),
        "IE" => Some(IE),
        "AU" => Some(AU),
        "NZ" => Some(NZ),
        "IN" => Some(IN),
        "DE" => Some(DE),
        "FR" => Some(FR),
        _ => None,
    }
}

/// Hotlines for `country`, then `default_country`, then the US table.
pub fn hotlines_for(country: &str, default_country: &str) -> &'static [CrisisContact] {
    table(country).or_else(|| table(default_country)).unwrap_or(US)
}

/// Looks up the client's country over HTTP.
pub struct GeoLocator {
    client: Client,
    url: String,
    default_country: String,
}

impl GeoLocator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.geolocation_url.clone(),
            default_country: config.default_country.clone(),
        }
    }

    pub async fn locate(&self) -> Result<GeoLocation, AppError> {
        let url = Url::parse(&self.url)?;
        let res = tokio::time::timeout(LOOKUP_TIMEOUT, self.client.get(url).send()).await??;
        let status = res.status();
        if !status.is_success() {
            return Err(AppError::Actor(format!(
                "Geolocation lookup failed with status {}",
                status
            )));
        }
        let location: GeoLocation = res
            .json()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed geolocation body: {}", e)))?;
        if location.country.is_empty() {
            return Err(AppError::Validation(
                "Geolocation response has no country".to_string(),
            ));
        }
        Ok(location)
    }

    /// Country code and hotline table for this client. Never fails.
    pub async fn crisis_contacts(&self) -> (String, &'static [CrisisContact]) {
        match self.locate().await {
            Ok(location) => {
                info!(country = %location.country, "Resolved client location");
                let country = location.country.to_ascii_uppercase();
                (
                    country.clone(),
                    hotlines_for(&country, &self.default_country),
                )
            }
            Err(e) => {
                warn!(
                    "Geolocation failed, using {} hotlines: {}",
                    self.default_country, e
                );
                (
                    self.default_country.clone(),
                    hotlines_for(&self.default_country, "US"),
                )
            }
        }
    }
}
