use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use crate::error::AuditResult;
use crate::query_hydrator::QueryHydrator;
use crate::types::AuditRequest;

/// Stamps the run with the current UTC time if the caller left it blank.
pub struct RunContextQueryHydrator;

#[async_trait]
impl QueryHydrator<AuditRequest> for RunContextQueryHydrator {
    async fn hydrate(&self, query: &AuditRequest) -> AuditResult<AuditRequest> {
        if query.run_timestamp.trim().is_empty() {
            Ok(AuditRequest {
                run_timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                ..query.clone()
            })
        } else {
            Ok(query.clone())
        }
    }

    fn update(&self, query: &mut AuditRequest, hydrated: AuditRequest) {
        query.run_timestamp = hydrated.run_timestamp;
    }
}
