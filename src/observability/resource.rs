//! Service identity as an OpenTelemetry resource.

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::attribute::SERVICE_VERSION;

use crate::config::ServiceConfig;

/// Resource key for the deployment environment.
pub const ENVIRONMENT: &str = "environment";

/// Build the process resource: SDK defaults (telemetry.sdk.*, env
/// detectors) merged with the configured service identity.
pub fn build_resource(service: &ServiceConfig) -> Resource {
    Resource::builder()
        .with_service_name(service.name.clone())
        .with_attributes([
            KeyValue::new(SERVICE_VERSION, service.version.clone()),
            KeyValue::new(ENVIRONMENT, service.environment.clone()),
        ])
        .build()
}
