//! Loyalty programme ROI calculator used by the marketing site.

use serde::{Deserialize, Serialize};
use validator::Validate;

const MONTHS_PER_YEAR: f64 = 12.0;

fn default_partners_fee() -> f64 {
    2.5
}
fn default_retention_uplift() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInput {
    #[validate(range(min = 0.0, max = 10_000_000.0, message = "Monthly customers must be between 0 and 10,000,000"))]
    pub monthly_customers: f64,

    #[validate(range(min = 0.0, max = 1_000_000.0, message = "Average spend must be between 0 and 1,000,000"))]
    pub average_spend: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Visits per month must be between 0 and 100"))]
    pub visits_per_month: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Current fee must be a percentage between 0 and 100"))]
    pub current_fee_percent: f64,

    #[serde(default = "default_partners_fee")]
    #[validate(range(min = 0.0, max = 100.0, message = "Partners fee must be a percentage between 0 and 100"))]
    pub partners_fee_percent: f64,

    #[serde(default = "default_retention_uplift")]
    #[validate(range(min = 0.0, max = 500.0, message = "Retention uplift must be between 0 and 500 percent"))]
    pub retention_uplift_percent: f64,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 100_000_000.0, message = "Setup cost is out of range"))]
    pub setup_cost: f64,

    #[serde(default)]
    #[validate(range(min = 0.0, max = 10_000_000.0, message = "Monthly subscription is out of range"))]
    pub monthly_subscription: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorResult {
    pub monthly_revenue: f64,
    pub projected_monthly_revenue: f64,
    pub incremental_revenue: f64,
    pub current_monthly_fees: f64,
    pub partners_monthly_fees: f64,
    pub monthly_fee_savings: f64,
    pub net_monthly_benefit: f64,
    pub annual_benefit: f64,
    pub first_year_cost: f64,
    pub roi_percent: f64,
    /// `None` when the programme never pays back its setup cost.
    pub payback_months: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Runs the fixed sequence of revenue, fee and ROI steps. Intermediate values
/// are kept at full precision and rounded only on output.
pub fn calculate(input: &CalculatorInput) -> CalculatorResult {
    let monthly_revenue = input.monthly_customers * input.average_spend * input.visits_per_month;
    let projected = monthly_revenue * (1.0 + input.retention_uplift_percent / 100.0);
    let incremental = projected - monthly_revenue;

    let current_fees = monthly_revenue * input.current_fee_percent / 100.0;
    let partners_fees = projected * input.partners_fee_percent / 100.0 + input.monthly_subscription;
    let fee_savings = current_fees - partners_fees;

    let net_monthly = incremental + fee_savings;
    let annual_benefit = net_monthly * MONTHS_PER_YEAR;
    let first_year_cost = input.setup_cost + partners_fees * MONTHS_PER_YEAR;

    let roi_percent = if first_year_cost > 0.0 {
        (annual_benefit - input.setup_cost) / first_year_cost * 100.0
    } else {
        0.0
    };

    let payback_months = if input.setup_cost <= 0.0 {
        Some(0.0)
    } else if net_monthly > 0.0 {
        Some(round2(input.setup_cost / net_monthly))
    } else {
        None
    };

    CalculatorResult {
        monthly_revenue: round2(monthly_revenue),
        projected_monthly_revenue: round2(projected),
        incremental_revenue: round2(incremental),
        current_monthly_fees: round2(current_fees),
        partners_monthly_fees: round2(partners_fees),
        monthly_fee_savings: round2(fee_savings),
        net_monthly_benefit: round2(net_monthly),
        annual_benefit: round2(annual_benefit),
        first_year_cost: round2(first_year_cost),
        roi_percent: round2(roi_percent),
        payback_months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cafe() -> CalculatorInput {
        CalculatorInput {
            monthly_customers: 1000.0,
            average_spend: 50.0,
            visits_per_month: 2.0,
            current_fee_percent: 3.0,
            partners_fee_percent: 2.5,
            retention_uplift_percent: 10.0,
            setup_cost: 1200.0,
            monthly_subscription: 100.0,
        }
    }

    #[test]
    fn typical_business() {
        let result = calculate(&cafe());

        assert_eq!(result.monthly_revenue, 100_000.0);
        assert_eq!(result.projected_monthly_revenue, 110_000.0);
        assert_eq!(result.incremental_revenue, 10_000.0);
        assert_eq!(result.current_monthly_fees, 3_000.0);
        assert_eq!(result.partners_monthly_fees, 2_850.0);
        assert_eq!(result.monthly_fee_savings, 150.0);
        assert_eq!(result.net_monthly_benefit, 10_150.0);
        assert_eq!(result.annual_benefit, 121_800.0);
        assert_eq!(result.first_year_cost, 35_400.0);
        assert_eq!(result.roi_percent, 340.68);
        assert_eq!(result.payback_months, Some(0.12));
    }

    #[test]
    fn no_setup_cost_pays_back_immediately() {
        let input = CalculatorInput { setup_cost: 0.0, ..cafe() };
        assert_eq!(calculate(&input).payback_months, Some(0.0));
    }

    #[test]
    fn negative_benefit_never_pays_back() {
        let input = CalculatorInput {
            retention_uplift_percent: 0.0,
            current_fee_percent: 0.0,
            ..cafe()
        };
        let result = calculate(&input);
        assert!(result.net_monthly_benefit < 0.0);
        assert_eq!(result.payback_months, None);
    }

    #[test]
    fn zero_cost_gives_zero_roi() {
        let input = CalculatorInput {
            monthly_customers: 0.0,
            setup_cost: 0.0,
            monthly_subscription: 0.0,
            ..cafe()
        };
        let result = calculate(&input);
        assert_eq!(result.first_year_cost, 0.0);
        assert_eq!(result.roi_percent, 0.0);
    }

    #[test]
    fn defaults_apply_for_optional_fields() {
        let input: CalculatorInput = serde_json::from_value(serde_json::json!({
            "monthlyCustomers": 10,
            "averageSpend": 20,
            "visitsPerMonth": 1,
            "currentFeePercent": 3
        }))
        .unwrap();

        assert_eq!(input.partners_fee_percent, 2.5);
        assert_eq!(input.retention_uplift_percent, 10.0);
        assert_eq!(input.setup_cost, 0.0);
    }

    #[test]
    fn out_of_range_input_fails_validation() {
        let input = CalculatorInput { current_fee_percent: 140.0, ..cafe() };
        assert!(input.validate().is_err());
    }
}
