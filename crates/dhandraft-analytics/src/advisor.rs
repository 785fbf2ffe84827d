//! Rule-based portfolio advice.

use dhandraft_core::{Advice, Asset};

use crate::{
    financial::risk_personality,
    format::rupees,
    portfolio::{equity_ratio, total_value, value_by},
};

const VOLATILE_SECTORS: [&str; 2] = ["Technology", "Pharma"];

fn starter_advice() -> Advice {
    Advice {
        strategy: "Start building your portfolio with a diversified mix of equity and fixed income."
            .to_string(),
        tax_suggestion: "Consider ELSS for Section 80C benefits (up to Rs.1.5L deduction)."
            .to_string(),
        risk_alert: "No portfolio detected. Begin with low-risk instruments like PPF or FDs."
            .to_string(),
        sector_warning: "N/A".to_string(),
        explanation: "Without a portfolio, the advisor recommends starting with a balanced approach based on your risk tolerance.".to_string(),
    }
}

pub fn generate_advice(assets: &[Asset]) -> Advice {
    if assets.is_empty() {
        return starter_advice();
    }

    let value = total_value(assets);
    let sectors = value_by(assets, |a| a.sector.clone());
    let ratio = equity_ratio(assets);

    let strategy = if ratio > 0.8 {
        "Portfolio is heavily equity-weighted. Consider adding fixed income (bonds, FDs) to reduce volatility."
    } else if ratio < 0.3 {
        "Low equity exposure may limit growth. Consider adding blue-chip stocks for long-term wealth creation."
    } else {
        "Good equity-debt balance. Consider quarterly rebalancing to maintain target allocation."
    };

    let share = |v: f64| if value > 0.0 { v / value * 100.0 } else { 0.0 };

    let mut sector_warnings: Vec<String> = sectors
        .iter()
        .filter(|(_, v)| share(*v) > 40.0)
        .map(|(sector, v)| {
            format!(
                "High concentration ({:.0}%) in {sector}. Diversify to reduce sector-specific risk.",
                share(*v)
            )
        })
        .collect();
    if sector_warnings.is_empty() {
        sector_warnings
            .push("Sector diversification looks healthy across your portfolio.".to_string());
    }

    let profile = risk_personality(assets);
    let tax_suggestion = if profile.personality.favours_equity() {
        "Consider ELSS funds for 80C benefit with equity exposure."
    } else {
        "PPF and NSC offer guaranteed returns with tax benefits for conservative investors."
    };

    let mut risk_alerts = Vec::new();
    let unrealized: f64 = assets
        .iter()
        .map(|a| (a.current_price - a.buy_price) * a.quantity as f64)
        .sum();
    if unrealized < 0.0 {
        risk_alerts.push(format!(
            "Portfolio showing unrealized loss of {}. Review underperforming holdings.",
            rupees(unrealized.abs())
        ));
    }

    let volatile: f64 = sectors
        .iter()
        .filter(|(sector, _)| VOLATILE_SECTORS.contains(&sector.as_str()))
        .map(|(_, v)| *v)
        .sum();
    let volatile_exposure = share(volatile);
    if volatile_exposure > 30.0 {
        risk_alerts.push(format!(
            "High exposure ({volatile_exposure:.0}%) to volatile sectors (Tech, Pharma)."
        ));
    }
    if risk_alerts.is_empty() {
        risk_alerts.push("No significant risk alerts at this time.".to_string());
    }

    Advice {
        strategy: strategy.to_string(),
        tax_suggestion: tax_suggestion.to_string(),
        risk_alert: risk_alerts.join(" "),
        sector_warning: sector_warnings.join(" "),
        explanation: format!(
            "Analysis based on {} portfolio across {} sectors with {:.0}% equity allocation. Risk profile: {}.",
            rupees(value),
            sectors.len(),
            ratio * 100.0,
            profile.personality
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::tests::{asset, demo_portfolio};
    use dhandraft_core::AssetKind;

    #[test]
    fn empty_portfolio_gets_starter_advice() {
        let advice = generate_advice(&[]);
        assert_eq!(advice.sector_warning, "N/A");
        assert!(advice.strategy.starts_with("Start building"));
    }

    #[test]
    fn demo_portfolio_advice() {
        let advice = generate_advice(&demo_portfolio());
        assert_eq!(
            advice.strategy,
            "Low equity exposure may limit growth. Consider adding blue-chip stocks for long-term wealth creation."
        );
        assert_eq!(
            advice.tax_suggestion,
            "PPF and NSC offer guaranteed returns with tax benefits for conservative investors."
        );
        assert_eq!(advice.risk_alert, "No significant risk alerts at this time.");
        assert_eq!(
            advice.sector_warning,
            "High concentration (43%) in Banking. Diversify to reduce sector-specific risk. \
             High concentration (43%) in Commodities. Diversify to reduce sector-specific risk."
        );
        assert_eq!(
            advice.explanation,
            "Analysis based on Rs.611,428 portfolio across 4 sectors with 22% equity allocation. Risk profile: Conservative."
        );
    }

    #[test]
    fn losing_tech_position_raises_alerts() {
        let advice = generate_advice(&[asset(
            "TCS",
            AssetKind::Equity,
            "Technology",
            10,
            4000.0,
            3000.0,
        )]);
        assert_eq!(
            advice.risk_alert,
            "Portfolio showing unrealized loss of Rs.10,000. Review underperforming holdings. \
             High exposure (100%) to volatile sectors (Tech, Pharma)."
        );
        assert_eq!(
            advice.tax_suggestion,
            "Consider ELSS funds for 80C benefit with equity exposure."
        );
        assert!(advice.strategy.starts_with("Portfolio is heavily equity-weighted."));
    }

    #[test]
    fn worthless_holdings_do_not_divide_by_zero() {
        let advice = generate_advice(&[asset("X", AssetKind::Equity, "Pharma", 5, 10.0, 0.0)]);
        assert_eq!(
            advice.sector_warning,
            "Sector diversification looks healthy across your portfolio."
        );
        assert!(advice.risk_alert.contains("Rs.50"));
    }
}
