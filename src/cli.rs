use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::{home_assistant::HomeAssistant, influx::Influx, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[clap(flatten)]
    pub influx: InfluxArgs,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantArgs,

    /// Per-sensor polling cadence in seconds.
    #[clap(long = "poll-interval-secs", default_value = "20", env = "ENPAL_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: u64,

    /// Run a single discovery and update cycle, then exit.
    #[clap(long)]
    pub once: bool,
}

impl Args {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Parser)]
pub struct InfluxArgs {
    /// Base URL of the Enpal box's InfluxDB. For example: `http://192.168.42.2:8086`.
    #[clap(long = "influx-url", env = "ENPAL_INFLUX_URL")]
    pub url: Url,

    /// InfluxDB API token.
    #[clap(long = "influx-token", env = "ENPAL_INFLUX_TOKEN")]
    pub token: String,
}

impl InfluxArgs {
    #[must_use]
    pub fn new_client(&self) -> Influx {
        Influx::new(self.url.as_str(), &self.token)
    }
}

#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Home Assistant API access token.
    #[clap(long = "hass-access-token", env = "HASS_ACCESS_TOKEN")]
    pub access_token: String,

    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    #[clap(long = "hass-base-url", env = "HASS_BASE_URL")]
    pub base_url: Url,
}

impl HomeAssistantArgs {
    pub fn try_new_client(&self) -> Result<HomeAssistant> {
        HomeAssistant::try_new(&self.access_token, self.base_url.clone())
    }
}
