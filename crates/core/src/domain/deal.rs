use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealId(pub String);

impl DealId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for DealId {
    fn default() -> Self {
        Self(String::new())
    }
}

/// Deal properties the proposal flow reads. Numeric properties arrive as raw
/// strings from the record store; parsing and zero-coercion happen in
/// [`crate::domain::proposal::resolve_inputs`], not here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DealSnapshot {
    pub id: DealId,
    pub name: Option<String>,
    pub monthly_order_volume: Option<String>,
    pub yearly_turnover: Option<String>,
    pub proposal_link: Option<String>,
}

impl DealSnapshot {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Deal properties the proposal computation depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealField {
    MonthlyOrderVolume,
    YearlyTurnover,
}

impl DealField {
    /// Property name as it exists on the external deal record.
    pub fn property_name(&self) -> &'static str {
        match self {
            Self::MonthlyOrderVolume => "monthly_order_volume",
            Self::YearlyTurnover => "yearly_turnover",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DealField, DealId, DealSnapshot};

    #[test]
    fn display_name_prefers_deal_name() {
        let deal = DealSnapshot {
            id: DealId::new("901"),
            name: Some("Acme Logistics".to_owned()),
            ..DealSnapshot::default()
        };
        assert_eq!(deal.display_name(), "Acme Logistics");
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let deal = DealSnapshot { id: DealId::new("901"), ..DealSnapshot::default() };
        assert_eq!(deal.display_name(), "901");
    }

    #[test]
    fn field_property_names_match_record_schema() {
        assert_eq!(DealField::MonthlyOrderVolume.property_name(), "monthly_order_volume");
        assert_eq!(DealField::YearlyTurnover.property_name(), "yearly_turnover");
    }
}
