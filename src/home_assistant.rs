//! Home Assistant REST API client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::{
    Client,
    ClientBuilder,
    Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize};

use crate::{
    classify::DeviceClass,
    prelude::*,
    registry::Registry,
    sensor::{ENTITY_ID_PREFIX, SensorDefinition, SensorState, StateClass},
};

pub struct HomeAssistant {
    client: Client,
    base_url: Url,
}

impl HomeAssistant {
    pub fn try_new(access_token: &str, base_url: Url) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {access_token}"))?,
        )]);
        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    fn states_url(&self, entity_id: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments =
                url.path_segments_mut().map_err(|()| anyhow!("invalid base URL"))?;
            segments.push("states");
            if let Some(entity_id) = entity_id {
                segments.push(entity_id);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Registry for HomeAssistant {
    #[instrument(skip_all, name = "list_entities")]
    async fn list_entity_ids(&self) -> Result<Vec<String>> {
        let states: Vec<EntityState> = self
            .client
            .get(self.states_url(None)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(states
            .into_iter()
            .map(|state| state.entity_id)
            .filter(|entity_id| entity_id.starts_with(ENTITY_ID_PREFIX))
            .collect())
    }

    #[instrument(skip_all, fields(entity_id = entity_id))]
    async fn remove(&self, entity_id: &str) -> Result {
        self.client
            .delete(self.states_url(Some(entity_id))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    #[instrument(skip_all, fields(entity_id = %definition.entity_id()))]
    async fn publish(&self, definition: &SensorDefinition, state: &SensorState) -> Result {
        self.client
            .post(self.states_url(Some(&definition.entity_id()))?)
            .json(&StatePayload::new(definition, state))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct EntityState {
    entity_id: String,
}

#[derive(Serialize)]
struct StatePayload<'a> {
    state: String,
    attributes: Attributes<'a>,
}

impl<'a> StatePayload<'a> {
    fn new(definition: &'a SensorDefinition, state: &SensorState) -> Self {
        Self {
            state: state.value.map_or_else(|| "unknown".to_string(), |value| value.to_string()),
            attributes: Attributes {
                friendly_name: &definition.name,
                icon: state.icon,
                unit_of_measurement: &definition.unit,
                device_class: definition.device_class,
                state_class: state.state_class,
                last_check: state.last_check,
                field: &definition.field,
                measurement: &definition.measurement,
                unique_id: definition.unique_id(),
                last_reset: state.last_reset,
            },
        }
    }
}

#[derive(Serialize)]
struct Attributes<'a> {
    friendly_name: &'a str,
    icon: &'a str,

    #[serde(skip_serializing_if = "str::is_empty")]
    unit_of_measurement: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<DeviceClass>,

    state_class: StateClass,
    last_check: DateTime<Local>,
    field: &'a str,
    measurement: &'a str,
    unique_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    last_reset: Option<DateTime<Utc>>,
}
