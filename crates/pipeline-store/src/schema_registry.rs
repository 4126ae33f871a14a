//! Maps `(artifact_type, schema_version)` to a validated payload shape.
//!
//! The source keeps a runtime registry of Pydantic models and validates
//! lazily at insertion time. We get the same effect for free from
//! `ArtifactPayload`'s tagged-enum `Deserialize` impl, so the registry here
//! reduces to what schema versions currently exist and dispatching
//! deserialization against the payload's declared type — it never
//! constructs a `(type, version)` schema table of its own.

use std::collections::HashMap;

use pipeline_models::{ArtifactPayload, ArtifactType};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Current schema version for each known artifact type. Registration of a
/// version that already exists is an error, matching the source's
/// `SchemaRegistry.register`.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    versions: HashMap<ArtifactType, u32>,
}

impl SchemaRegistry {
    /// The registry every pipeline process starts with: one schema version
    /// per artifact type, matching `pipeline_models::payload`'s `V1` shapes.
    pub fn with_builtin_schemas() -> Self {
        let mut versions = HashMap::new();
        for artifact_type in ArtifactType::ALL {
            versions.insert(artifact_type, 1);
        }
        Self { versions }
    }

    pub fn register(&mut self, artifact_type: ArtifactType, schema_version: u32) -> StoreResult<()> {
        if self.versions.get(&artifact_type) == Some(&schema_version) {
            return Err(StoreError::SchemaAlreadyRegistered {
                artifact_type: artifact_type.as_str().to_string(),
                schema_version,
            });
        }
        self.versions.insert(artifact_type, schema_version);
        Ok(())
    }

    pub fn is_registered(&self, artifact_type: ArtifactType, schema_version: u32) -> bool {
        self.versions.get(&artifact_type) == Some(&schema_version)
    }

    /// Parses and validates a raw JSON payload against the schema for
    /// `(artifact_type, schema_version)`. Validation failure aborts the
    /// caller's insertion (spec.md §4.3: "no partial writes").
    pub fn validate(
        &self,
        artifact_type: ArtifactType,
        schema_version: u32,
        payload: &Value,
    ) -> StoreResult<ArtifactPayload> {
        if !self.is_registered(artifact_type, schema_version) {
            return Err(StoreError::SchemaNotFound {
                artifact_type: artifact_type.as_str().to_string(),
                schema_version,
            });
        }

        serde_json::from_value(payload.clone()).map_err(|e| StoreError::PayloadValidation {
            artifact_type: artifact_type.as_str().to_string(),
            schema_version,
            reason: e.to_string(),
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_builtin_schemas()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_every_artifact_type() {
        let registry = SchemaRegistry::with_builtin_schemas();
        for artifact_type in ArtifactType::ALL {
            assert!(registry.is_registered(artifact_type, 1));
        }
    }

    #[test]
    fn registering_the_same_version_twice_fails() {
        let mut registry = SchemaRegistry::with_builtin_schemas();
        let err = registry.register(ArtifactType::Scene, 1).unwrap_err();
        assert!(matches!(err, StoreError::SchemaAlreadyRegistered { .. }));
    }

    #[test]
    fn validate_rejects_malformed_payload() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let bad = serde_json::json!({"payload_type": "scene", "scene_index": "not-a-number"});
        let err = registry.validate(ArtifactType::Scene, 1, &bad).unwrap_err();
        assert!(matches!(err, StoreError::PayloadValidation { .. }));
    }

    #[test]
    fn validate_accepts_well_formed_payload() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let good = serde_json::json!({
            "payload_type": "scene",
            "scene_index": 3,
            "start_ms": 1000,
            "end_ms": 4000,
            "duration_ms": 3000,
        });
        let parsed = registry.validate(ArtifactType::Scene, 1, &good).unwrap();
        assert!(matches!(parsed, ArtifactPayload::Scene(_)));
    }
}
