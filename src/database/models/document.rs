use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contract::ContractStatus;
use super::macros::string_enum;

string_enum! {
    pub enum DocumentClassification {
        Normal => "normal",
        NearExpired => "near_expired",
        Expired => "expired_document",
    }
}

string_enum! {
    /// Whose agreement the document is; decides which principal gets deactivated.
    pub enum ContractType {
        Manager => "manager",
        Guard => "guard",
        Customer => "customer",
    }
}

string_enum! {
    pub enum PrincipalRole {
        Manager => "manager",
        Guard => "guard",
        Customer => "customer",
    }
}

impl From<ContractType> for PrincipalRole {
    fn from(contract_type: ContractType) -> Self {
        match contract_type {
            ContractType::Manager => PrincipalRole::Manager,
            ContractType::Guard => PrincipalRole::Guard,
            ContractType::Customer => PrincipalRole::Customer,
        }
    }
}

/// A time-bound document joined with the status of its contract.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringDocument {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub contract_status: ContractStatus,
    pub contract_type: ContractType,
    pub classification: DocumentClassification,
    pub end_date: NaiveDate,
    pub principal_email: String,
    pub principal_id: Option<Uuid>,
    pub document_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Where a document's end date falls relative to the sweep's local "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStanding {
    Expired,
    NearExpired,
    Current,
}

impl DocumentStanding {
    pub fn classify(end_date: NaiveDate, today: NaiveDate, horizon: NaiveDate) -> Self {
        if end_date <= today {
            DocumentStanding::Expired
        } else if end_date <= horizon {
            DocumentStanding::NearExpired
        } else {
            DocumentStanding::Current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn classifies_against_today_and_horizon() {
        let today = date(10);
        let horizon = date(17);
        assert_eq!(
            DocumentStanding::classify(date(9), today, horizon),
            DocumentStanding::Expired
        );
        assert_eq!(
            DocumentStanding::classify(date(10), today, horizon),
            DocumentStanding::Expired
        );
        assert_eq!(
            DocumentStanding::classify(date(17), today, horizon),
            DocumentStanding::NearExpired
        );
        assert_eq!(
            DocumentStanding::classify(date(18), today, horizon),
            DocumentStanding::Current
        );
    }

    #[test]
    fn expired_classification_keeps_its_stored_literal() {
        assert_eq!(DocumentClassification::Expired.as_str(), "expired_document");
    }
}
