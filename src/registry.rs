//! The host platform's entity registry boundary.

use async_trait::async_trait;

use crate::{
    prelude::*,
    sensor::{SensorDefinition, SensorState},
};

/// Sensor registry of the host platform.
///
/// Discovery re-creates entities through this seam with [`purge`] followed by
/// one [`Registry::publish`] per sensor, so a schema change between runs never
/// leaves a stale entity behind.
#[async_trait]
pub trait Registry {
    /// List entity ids previously registered by this bridge.
    async fn list_entity_ids(&self) -> Result<Vec<String>>;

    /// Remove one entity.
    async fn remove(&self, entity_id: &str) -> Result;

    /// Publish the state of one sensor, creating the entity when missing.
    async fn publish(&self, definition: &SensorDefinition, state: &SensorState) -> Result;
}

/// Remove every previously registered entity and return the removed count.
pub async fn purge<R: Registry + Sync + ?Sized>(registry: &R) -> Result<usize> {
    let entity_ids = registry.list_entity_ids().await?;
    for entity_id in &entity_ids {
        registry.remove(entity_id).await?;
    }
    Ok(entity_ids.len())
}

#[cfg(test)]
pub mod tests {
    use std::{collections::BTreeMap, sync::Mutex};

    use super::*;
    use crate::sensor::ENTITY_ID_PREFIX;

    /// In-memory registry standing in for Home Assistant.
    #[derive(Default)]
    pub struct MockRegistry {
        pub states: Mutex<BTreeMap<String, Option<f64>>>,
    }

    #[async_trait]
    impl Registry for MockRegistry {
        async fn list_entity_ids(&self) -> Result<Vec<String>> {
            Ok(self.states.lock().unwrap().keys().cloned().collect())
        }

        async fn remove(&self, entity_id: &str) -> Result {
            ensure!(self.states.lock().unwrap().remove(entity_id).is_some());
            Ok(())
        }

        async fn publish(&self, definition: &SensorDefinition, state: &SensorState) -> Result {
            self.states.lock().unwrap().insert(definition.entity_id(), state.value);
            Ok(())
        }
    }

    fn definition(measurement: &str, field: &str) -> SensorDefinition {
        SensorDefinition {
            measurement: measurement.to_string(),
            field: field.to_string(),
            icon: "mdi:solar-power",
            name: format!("Enpal Solar {field}"),
            unit: "W".to_string(),
            device_class: None,
        }
    }

    #[tokio::test]
    async fn test_purge_removes_everything_ok() -> Result {
        let registry = MockRegistry::default();
        let old = definition("inverter", "Power.DC.Total");
        registry.publish(&old, &old.to_state(Ok(Some(1.0)))).await?;

        let n_removed = purge(&registry).await?;

        assert_eq!(n_removed, 1);
        assert!(registry.states.lock().unwrap().is_empty());
        Ok(())
    }

    /// Re-running discovery with a changed field set fully replaces the old sensors.
    #[tokio::test]
    async fn test_rediscovery_replaces_ok() -> Result {
        let registry = MockRegistry::default();
        let old = definition("inverter", "Power.DC.Total");
        registry.publish(&old, &old.to_state(Ok(Some(1.0)))).await?;

        purge(&registry).await?;
        let new = definition("inverter", "Power.House.Total");
        registry.publish(&new, &new.to_state(Ok(Some(2.0)))).await?;

        let states = registry.states.lock().unwrap();
        assert!(!states.contains_key(&old.entity_id()));
        assert!(states.contains_key(&new.entity_id()));
        assert_eq!(states.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_empty_ok() -> Result {
        assert_eq!(purge(&MockRegistry::default()).await?, 0);
        Ok(())
    }

    #[test]
    fn test_entity_id_prefixed_ok() {
        assert!(definition("inverter", "Power.DC.Total").entity_id().starts_with(ENTITY_ID_PREFIX));
    }
}
