use crate::{
    contract::ContractParties,
    resolver::Variant,
    risk::OfflineFilter,
    snapshot::ContractFilter,
    subscription::SubscriptionOptions,
    types::Horizon,
};
use serde::{Deserialize, Serialize};

/// Everything a caller chooses for one forecast run.
/// Missing keys take their defaults: variant `O`, 12 months, no filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastRequest {
    pub variant:      Variant,
    #[serde(rename = "months")]
    pub horizon:      Horizon,
    /// Customer name, or "All".
    pub customer:     Option<String>,
    pub contract:     ContractFilter,
    pub offline:      OfflineFilter,
    pub subscription: SubscriptionOptions,
    /// When present, the report carries a contract document payload.
    pub parties:      Option<ContractParties>,
}

impl ForecastRequest {
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_months(mut self, months: u32) -> Self {
        self.horizon = Horizon::new(months);
        self
    }
}

/// Commands accepted on the runner's JSON-lines channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum RunnerCommand {
    Forecast(ForecastRequest),
    /// List the snapshot's customers.
    Customers,
    Quit,
}
