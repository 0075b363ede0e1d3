use super::{run_single, RunOptions};
use crate::core::client::LogHubClient;
use crate::core::operation::{InputTable, Operation};
use crate::core::schema::TableSchema;
use crate::domain::model::ColumnType::{self, Date, Float, Str};
use crate::domain::model::Table;
use crate::utils::error::Result;

const IMPACT_FACTORS: &[(&str, ColumnType)] = &[
    ("futureImpactFactor1", Str),
    ("futureImpactFactor2", Str),
    ("futureImpactFactor3", Str),
];

/// The forecasting application takes no parameter object and never saves scenarios.
pub fn demand_forecasting_operation() -> Operation {
    Operation::new("demand_forecasting", "demandforecasting", "demand forecasting")
        .input(InputTable::new(
            TableSchema::new("pastDemandData")
                .mandatory(&[("sku", Str), ("date", Date), ("demand", Float)])
                .optional(IMPACT_FACTORS),
        ))
        .input(InputTable::new(
            TableSchema::new("futureImpactFactors")
                .optional(&[("sku", Str), ("date", Date)])
                .optional(IMPACT_FACTORS),
        ))
        .input(InputTable::new(
            TableSchema::new("skuParameters")
                .mandatory(&[("sku", Str), ("forecastPeriods", Float)])
                .optional(&[
                    ("demandFrequency", Str),
                    ("lowerTrendLimit", Str),
                    ("upperTrendLimit", Str),
                    ("seasonality", Str),
                    ("seasonalityType", Str),
                    ("confidenceInterval", Str),
                ])
                .optional(IMPACT_FACTORS),
        ))
        .returns(&["prediction"])
        .without_save_scenario()
}

pub async fn demand_forecasting(
    client: &LogHubClient,
    past_demand_data: Table,
    future_impact_factors: Table,
    sku_parameters: Table,
) -> Result<Table> {
    run_single(
        client,
        demand_forecasting_operation(),
        vec![
            ("pastDemandData", past_demand_data),
            ("futureImpactFactors", future_impact_factors),
            ("skuParameters", sku_parameters),
        ],
        RunOptions::default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OperationRequest;
    use serde_json::json;

    #[test]
    fn test_payload_formats_dates_without_scenario() {
        let request = OperationRequest::new()
            .table(
                "pastDemandData",
                Table::from_json(&json!([{"sku": 1001, "date": "2024-01-31 00:00:00", "demand": "12"}]))
                    .unwrap(),
            )
            .table("futureImpactFactors", Table::default())
            .table(
                "skuParameters",
                Table::from_json(&json!([{"sku": "1001", "forecastPeriods": 6}])).unwrap(),
            );

        let payload = demand_forecasting_operation().build_payload(&request).unwrap();
        assert_eq!(
            payload["pastDemandData"],
            json!([{"sku": "1001", "date": "2024-01-31", "demand": 12.0}])
        );
        assert_eq!(payload["futureImpactFactors"], json!([]));
        assert!(payload.get("saveScenarioParameters").is_none());
        assert!(payload.get("parameters").is_none());
    }
}
