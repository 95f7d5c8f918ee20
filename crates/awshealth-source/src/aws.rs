//! `HealthApi` backed by the AWS SDK.
//!
//! The Health API is served from a single endpoint region (`us-east-1`
//! for the commercial partition) regardless of which regions the events
//! concern; the event filter's region list selects those.

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_health::Client;
use aws_sdk_health::error::DisplayErrorContext;
use aws_sdk_health::primitives::DateTime as AwsDateTime;
use aws_sdk_health::types::{
    DateTimeRange, EntityFilter, EventStatusCode, EventTypeCategory,
    EventFilter as AwsEventFilter,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use awshealth_types::*;

use crate::api::{EntityPage, EventPage, HealthApi};

/// Upper bound the Health API accepts for `maxResults`.
const PAGE_SIZE: i32 = 100;

/// Health API client built from the default AWS credential chain.
#[derive(Debug, Clone)]
pub struct AwsHealthApi {
    client: Client,
}

impl AwsHealthApi {
    /// Load the default AWS configuration pinned to `api_region` and
    /// verify that credentials can actually be resolved.
    ///
    /// Fails with `ConfigError::Credentials` when no provider in the chain
    /// yields credentials, so a misconfigured deployment exits at startup
    /// instead of failing every cycle.
    pub async fn connect(api_region: &str) -> Result<Self, ConfigError> {
        if api_region.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_region",
                reason: "must not be empty".to_string(),
            });
        }

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(api_region.to_string()))
            .load()
            .await;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| ConfigError::Credentials("no provider configured".to_string()))?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| ConfigError::Credentials(DisplayErrorContext(&e).to_string()))?;

        info!(region = %api_region, "AWS Health client initialized");
        Ok(Self::from_client(Client::new(&sdk_config)))
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthApi for AwsHealthApi {
    async fn describe_events(
        &self,
        filter: &EventFilter,
        next_token: Option<String>,
    ) -> TransportResult<EventPage> {
        let output = self
            .client
            .describe_events()
            .filter(to_aws_filter(filter))
            .max_results(PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| TransportError::api("DescribeEvents", DisplayErrorContext(&e)))?;

        let events: Vec<HealthEvent> = output.events().iter().map(convert_event).collect();
        debug!(events = events.len(), more = output.next_token().is_some(), "described events page");

        Ok(EventPage {
            events,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_affected_entities(
        &self,
        event_arns: &[String],
        next_token: Option<String>,
    ) -> TransportResult<EntityPage> {
        let filter = EntityFilter::builder()
            .set_event_arns(Some(event_arns.to_vec()))
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let output = self
            .client
            .describe_affected_entities()
            .filter(filter)
            .max_results(PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| {
                TransportError::api("DescribeAffectedEntities", DisplayErrorContext(&e))
            })?;

        let entities: Vec<AffectedEntity> =
            output.entities().iter().map(convert_entity).collect();
        debug!(entities = entities.len(), more = output.next_token().is_some(), "described entities page");

        Ok(EntityPage {
            entities,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

fn to_aws_filter(filter: &EventFilter) -> AwsEventFilter {
    AwsEventFilter::builder()
        .set_regions(Some(filter.regions.clone()))
        .last_updated_times(
            DateTimeRange::builder()
                .from(to_aws_time(filter.from))
                .to(to_aws_time(filter.to))
                .build(),
        )
        .set_event_type_categories(Some(
            filter
                .categories
                .iter()
                .map(|c| EventTypeCategory::from(c.as_str()))
                .collect(),
        ))
        .set_event_status_codes(Some(
            filter
                .statuses
                .iter()
                .map(|s| EventStatusCode::from(s.as_str()))
                .collect(),
        ))
        .build()
}

fn convert_event(event: &aws_sdk_health::types::Event) -> HealthEvent {
    HealthEvent {
        arn: event.arn().map(str::to_string),
        region: event.region().map(str::to_string),
        category: event.event_type_category().and_then(|c| match c.as_str() {
            "issue" => Some(EventCategory::Issue),
            "scheduledChange" => Some(EventCategory::ScheduledChange),
            "accountNotification" => Some(EventCategory::AccountNotification),
            "investigation" => Some(EventCategory::Investigation),
            _ => None,
        }),
        status: event.status_code().and_then(|s| match s.as_str() {
            "open" => Some(EventStatus::Open),
            "closed" => Some(EventStatus::Closed),
            "upcoming" => Some(EventStatus::Upcoming),
            _ => None,
        }),
        last_updated_time: event.last_updated_time().and_then(from_aws_time),
    }
}

fn convert_entity(entity: &aws_sdk_health::types::AffectedEntity) -> AffectedEntity {
    AffectedEntity {
        event_arn: entity.event_arn().map(str::to_string),
        entity_arn: entity.entity_arn().map(str::to_string),
        entity_value: entity.entity_value().map(str::to_string),
        status_code: entity.status_code().map(|s| s.as_str().to_string()),
        last_updated_time: entity.last_updated_time().and_then(from_aws_time),
        aws_account_id: entity.aws_account_id().map(str::to_string),
    }
}

fn to_aws_time(t: DateTime<Utc>) -> AwsDateTime {
    AwsDateTime::from_secs(t.timestamp())
}

fn from_aws_time(t: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos())
}
