//! Indian personal income tax: old vs new regime, capital gains and FD interest.

use serde::{Deserialize, Serialize};

use crate::format::{group_thousands, plain_float, round_dp, round_int};

const STANDARD_DEDUCTION_OLD: f64 = 50_000.0;
const STANDARD_DEDUCTION_NEW: f64 = 75_000.0;
const SECTION_80C_CAP: f64 = 150_000.0;
const SECTION_80D_CAP: f64 = 25_000.0;
const CESS_RATE: f64 = 0.04;
const NEW_REGIME_REBATE_LIMIT: f64 = 1_200_000.0;
const EQUITY_LTCG_EXEMPTION: f64 = 125_000.0;

/// `(width, rate)` pairs; the last slab is open-ended.
const NEW_REGIME_SLABS: [(f64, f64); 6] = [
    (300_000.0, 0.0),
    (300_000.0, 0.05),
    (300_000.0, 0.10),
    (300_000.0, 0.15),
    (300_000.0, 0.20),
    (f64::INFINITY, 0.30),
];

#[derive(Debug, Clone, Deserialize)]
pub struct TaxCompareInput {
    pub income: f64,
    #[serde(default)]
    pub deductions_80c: f64,
    #[serde(default)]
    pub deductions_80d: f64,
    #[serde(default)]
    pub hra_exemption: f64,
    #[serde(default)]
    pub other_deductions: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeTax {
    pub taxable_income: i64,
    pub tax: i64,
    pub cess: i64,
    pub total: i64,
    pub effective_rate: f64,
    pub deductions: i64,
}

fn effective_rate(total_tax: f64, income: f64) -> f64 {
    if income > 0.0 {
        round_dp(total_tax / income * 100.0, 2)
    } else {
        0.0
    }
}

pub fn old_regime(
    income: f64,
    deductions_80c: f64,
    deductions_80d: f64,
    hra_exemption: f64,
    other_deductions: f64,
) -> RegimeTax {
    let deductions = deductions_80c.min(SECTION_80C_CAP)
        + deductions_80d.min(SECTION_80D_CAP)
        + hra_exemption
        + other_deductions
        + STANDARD_DEDUCTION_OLD;
    let taxable = (income - deductions).max(0.0);

    let mut tax = 0.0;
    let mut remaining = taxable;
    if remaining > 1_000_000.0 {
        tax += (remaining - 1_000_000.0) * 0.30;
        remaining = 1_000_000.0;
    }
    if remaining > 500_000.0 {
        tax += (remaining - 500_000.0) * 0.20;
        remaining = 500_000.0;
    }
    if remaining > 250_000.0 {
        tax += (remaining - 250_000.0) * 0.05;
    }

    let cess = tax * CESS_RATE;
    let total = tax + cess;
    RegimeTax {
        taxable_income: round_int(taxable),
        tax: round_int(tax),
        cess: round_int(cess),
        total: round_int(total),
        effective_rate: effective_rate(total, income),
        deductions: round_int(deductions),
    }
}

/// No deductions beyond the standard one; full rebate up to 12L taxable.
pub fn new_regime(income: f64) -> RegimeTax {
    let taxable = (income - STANDARD_DEDUCTION_NEW).max(0.0);

    let mut tax = 0.0;
    let mut remaining = taxable;
    for (width, rate) in NEW_REGIME_SLABS {
        if remaining <= 0.0 {
            break;
        }
        let chunk = remaining.min(width);
        tax += chunk * rate;
        remaining -= chunk;
    }
    if taxable <= NEW_REGIME_REBATE_LIMIT {
        tax = 0.0;
    }

    let cess = tax * CESS_RATE;
    let total = tax + cess;
    RegimeTax {
        taxable_income: round_int(taxable),
        tax: round_int(tax),
        cess: round_int(cess),
        total: round_int(total),
        effective_rate: effective_rate(total, income),
        deductions: STANDARD_DEDUCTION_NEW as i64,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxComparison {
    pub old_regime: RegimeTax,
    pub new_regime: RegimeTax,
    pub recommended: String,
    pub savings: i64,
    pub explanation: String,
}

pub fn compare(input: &TaxCompareInput) -> TaxComparison {
    let old = old_regime(
        input.income,
        input.deductions_80c,
        input.deductions_80d,
        input.hra_exemption,
        input.other_deductions,
    );
    let new = new_regime(input.income);

    // Ties go to the new regime.
    let old_wins = old.total < new.total;
    let savings = (old.total - new.total).abs();
    TaxComparison {
        old_regime: old,
        new_regime: new,
        recommended: if old_wins { "old" } else { "new" }.to_string(),
        savings,
        explanation: format!(
            "The {} regime saves you Rs.{} more.",
            if old_wins { "Old" } else { "New" },
            group_thousands(savings)
        ),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainsInput {
    pub buy_price: f64,
    pub sell_price: f64,
    pub quantity: i64,
    pub holding_months: i64,
    #[serde(default = "CapitalGainsInput::default_asset_type")]
    pub asset_type: String,
}

impl CapitalGainsInput {
    fn default_asset_type() -> String {
        "equity".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapitalGains {
    pub gain: i64,
    pub gain_pct: f64,
    pub tax_type: String,
    pub tax: i64,
    pub net_gain: i64,
    pub explanation: String,
}

/// Anything other than `"equity"` is taxed as a non-equity asset.
pub fn capital_gains(
    buy_price: f64,
    sell_price: f64,
    quantity: i64,
    holding_months: i64,
    asset_type: &str,
) -> CapitalGains {
    let gain = (sell_price - buy_price) * quantity as f64;
    let gain_pct = if buy_price > 0.0 {
        (sell_price - buy_price) / buy_price * 100.0
    } else {
        0.0
    };

    let (tax, tax_type) = if asset_type == "equity" {
        if holding_months >= 12 {
            ((gain - EQUITY_LTCG_EXEMPTION).max(0.0) * 0.125, "LTCG")
        } else {
            (gain.max(0.0) * 0.20, "STCG")
        }
    } else if holding_months >= 24 {
        (gain.max(0.0) * 0.20, "LTCG")
    } else {
        (gain.max(0.0) * 0.30, "STCG")
    };
    let tax = tax.max(0.0);

    CapitalGains {
        gain: round_int(gain),
        gain_pct: round_dp(gain_pct, 2),
        tax_type: tax_type.to_string(),
        tax: round_int(tax),
        net_gain: round_int(gain - tax),
        explanation: format!(
            "{tax_type} of Rs.{} on {asset_type} held {holding_months} months.",
            group_thousands(round_int(tax))
        ),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdTaxInput {
    pub principal: f64,
    pub rate: f64,
    pub years: i64,
    pub tax_bracket: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdTax {
    pub total_interest: i64,
    pub tax_per_year: i64,
    pub total_tax: i64,
    pub post_tax_return: i64,
    pub effective_rate: f64,
    pub explanation: String,
}

/// Simple (non-compounding) interest taxed at the holder's slab rate.
pub fn fd_tax(principal: f64, rate: f64, years: i64, tax_bracket: f64) -> FdTax {
    let interest_per_year = principal * rate / 100.0;
    let total_interest = interest_per_year * years as f64;
    let tax_per_year = interest_per_year * tax_bracket / 100.0;
    let total_tax = tax_per_year * years as f64;
    let post_tax_return = total_interest - total_tax;
    let effective = if years > 0 {
        post_tax_return / (principal * years as f64) * 100.0
    } else {
        0.0
    };

    FdTax {
        total_interest: round_int(total_interest),
        tax_per_year: round_int(tax_per_year),
        total_tax: round_int(total_tax),
        post_tax_return: round_int(post_tax_return),
        effective_rate: round_dp(effective, 2),
        explanation: format!(
            "At {}% bracket, effective FD rate: {:.2}% (pre-tax: {}%).",
            plain_float(tax_bracket),
            effective,
            plain_float(rate)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn old_regime_applies_capped_deductions() {
        let result = old_regime(1_200_000.0, 200_000.0, 25_000.0, 0.0, 0.0);
        assert_eq!(result.deductions, 225_000);
        assert_eq!(result.taxable_income, 975_000);
        assert_eq!(result.tax, 107_500);
        assert_eq!(result.cess, 4_300);
        assert_eq!(result.total, 111_800);
        assert_relative_eq!(result.effective_rate, 9.32);
    }

    #[test]
    fn old_regime_zero_income() {
        let result = old_regime(0.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(result.taxable_income, 0);
        assert_eq!(result.total, 0);
        assert_eq!(result.effective_rate, 0.0);
    }

    #[test]
    fn new_regime_rebate_up_to_twelve_lakh() {
        let result = new_regime(1_275_000.0);
        assert_eq!(result.taxable_income, 1_200_000);
        assert_eq!(result.total, 0);
        assert_eq!(result.deductions, 75_000);
    }

    #[test]
    fn new_regime_slabs_above_rebate() {
        let result = new_regime(2_000_000.0);
        assert_eq!(result.taxable_income, 1_925_000);
        assert_eq!(result.tax, 277_500);
        assert_eq!(result.cess, 11_100);
        assert_eq!(result.total, 288_600);
        assert_relative_eq!(result.effective_rate, 14.43);
    }

    #[test]
    fn comparison_prefers_cheaper_regime() {
        let input = TaxCompareInput {
            income: 1_200_000.0,
            deductions_80c: 150_000.0,
            deductions_80d: 25_000.0,
            hra_exemption: 0.0,
            other_deductions: 0.0,
        };
        let result = compare(&input);
        assert_eq!(result.recommended, "new");
        assert_eq!(result.savings, 111_800);
        assert_eq!(result.explanation, "The New regime saves you Rs.111,800 more.");
    }

    #[test]
    fn equity_ltcg_uses_exemption() {
        let result = capital_gains(100.0, 250.0, 1000, 14, "equity");
        assert_eq!(result.gain, 150_000);
        assert_relative_eq!(result.gain_pct, 150.0);
        assert_eq!(result.tax_type, "LTCG");
        assert_eq!(result.tax, 3_125);
        assert_eq!(result.net_gain, 146_875);
        assert_eq!(result.explanation, "LTCG of Rs.3,125 on equity held 14 months.");
    }

    #[test]
    fn losses_are_not_taxed() {
        let result = capital_gains(100.0, 90.0, 10, 3, "equity");
        assert_eq!(result.tax_type, "STCG");
        assert_eq!(result.gain, -100);
        assert_eq!(result.tax, 0);
        assert_eq!(result.net_gain, -100);
    }

    #[test]
    fn non_equity_holding_periods() {
        assert_eq!(capital_gains(100.0, 200.0, 10, 30, "gold").tax, 200);
        assert_eq!(capital_gains(100.0, 200.0, 10, 12, "gold").tax, 300);
        assert_eq!(capital_gains(100.0, 200.0, 10, 12, "gold").tax_type, "STCG");
    }

    #[test]
    fn fd_post_tax_yield() {
        let result = fd_tax(100_000.0, 7.0, 3, 30.0);
        assert_eq!(result.total_interest, 21_000);
        assert_eq!(result.tax_per_year, 2_100);
        assert_eq!(result.total_tax, 6_300);
        assert_eq!(result.post_tax_return, 14_700);
        assert_relative_eq!(result.effective_rate, 4.9);
        assert_eq!(
            result.explanation,
            "At 30.0% bracket, effective FD rate: 4.90% (pre-tax: 7.0%)."
        );
    }

    #[test]
    fn fd_zero_years() {
        let result = fd_tax(100_000.0, 7.0, 0, 30.0);
        assert_eq!(result.total_interest, 0);
        assert_eq!(result.effective_rate, 0.0);
    }
}
