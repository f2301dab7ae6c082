use chrono::{DateTime, Utc};
use common::PrincipalId;
use policy::AuditRecord;

/// Builder for filtering audit records.
///
/// Every filter is optional; an empty query matches everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Filter by principal.
    pub principal_id: Option<PrincipalId>,

    /// Filter by resource type.
    pub resource_type: Option<String>,

    /// Filter by action.
    pub action: Option<String>,

    /// Filter by outcome.
    pub allowed: Option<bool>,

    /// Filter by records at or after this timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter by records at or before this timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,

    /// Number of matching records to skip.
    pub offset: Option<usize>,
}

impl AuditQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one principal's decisions.
    pub fn for_principal(principal_id: impl Into<PrincipalId>) -> Self {
        Self {
            principal_id: Some(principal_id.into()),
            ..Default::default()
        }
    }

    /// Creates a query for denied decisions only.
    pub fn denials() -> Self {
        Self {
            allowed: Some(false),
            ..Default::default()
        }
    }

    /// Filters by principal.
    pub fn principal_id(mut self, principal_id: impl Into<PrincipalId>) -> Self {
        self.principal_id = Some(principal_id.into());
        self
    }

    /// Filters by resource type.
    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Filters by action.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Filters by outcome.
    pub fn allowed(mut self, allowed: bool) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Filters to records at or after this timestamp.
    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    /// Filters to records at or before this timestamp.
    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    /// Limits the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many matching records.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the record passes every filter (limit and offset aside).
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(ref id) = self.principal_id
            && &record.principal_id != id
        {
            return false;
        }
        if let Some(ref resource_type) = self.resource_type
            && &record.resource_type != resource_type
        {
            return false;
        }
        if let Some(ref action) = self.action
            && &record.action != action
        {
            return false;
        }
        if let Some(allowed) = self.allowed
            && record.allowed != allowed
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && record.recorded_at < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && record.recorded_at > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ResourceId;
    use policy::{Decision, Rule};

    fn record(principal: &str, resource_type: &str, action: &str, allowed: bool) -> AuditRecord {
        let decision = if allowed {
            Decision::allow(resource_type, action, 0, &Rule::role("admin"))
        } else {
            Decision::deny(resource_type, action)
        };
        AuditRecord::new(PrincipalId::new(principal), ResourceId::new("1"), &decision)
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(AuditQuery::new().matches(&record("1", "Order", "view", true)));
        assert!(AuditQuery::new().matches(&record("2", "Product", "approve", false)));
    }

    #[test]
    fn query_for_principal() {
        let query = AuditQuery::for_principal("1");
        assert!(query.matches(&record("1", "Order", "view", true)));
        assert!(!query.matches(&record("2", "Order", "view", true)));
    }

    #[test]
    fn denials_filter_on_outcome() {
        let query = AuditQuery::denials();
        assert!(query.matches(&record("1", "Order", "view", false)));
        assert!(!query.matches(&record("1", "Order", "view", true)));
    }

    #[test]
    fn query_builder_chain() {
        let query = AuditQuery::new()
            .principal_id("7")
            .resource_type("Provider")
            .action("verify")
            .allowed(true)
            .limit(10)
            .offset(5);

        assert_eq!(query.principal_id, Some(PrincipalId::new("7")));
        assert_eq!(query.resource_type.as_deref(), Some("Provider"));
        assert_eq!(query.action.as_deref(), Some("verify"));
        assert_eq!(query.allowed, Some(true));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));

        assert!(query.matches(&record("7", "Provider", "verify", true)));
        assert!(!query.matches(&record("7", "Provider", "approve", true)));
    }

    #[test]
    fn time_range_is_inclusive() {
        let rec = record("1", "Order", "view", true);
        let query = AuditQuery::new()
            .from_timestamp(rec.recorded_at)
            .to_timestamp(rec.recorded_at);
        assert!(query.matches(&rec));

        let later = AuditQuery::new().from_timestamp(rec.recorded_at + chrono::Duration::seconds(1));
        assert!(!later.matches(&rec));
    }
}
