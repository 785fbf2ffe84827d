use std::fmt;

use dhandraft_core::Asset;
use serde::Serialize;

use crate::portfolio::{equity_ratio, total_cost, total_value, value_by};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScore {
    pub score: u32,
    pub confidence: u32,
    pub explanation: String,
}

/// Four 25-point components: sector spread, returns, asset-type spread, return band.
pub fn financial_health(assets: &[Asset]) -> HealthScore {
    if assets.is_empty() {
        return HealthScore {
            score: 45,
            confidence: 60,
            explanation: "Add assets to your portfolio for a personalized health score."
                .to_string(),
        };
    }

    let value = total_value(assets);
    let cost = total_cost(assets);
    if value == 0.0 {
        return HealthScore {
            score: 30,
            confidence: 50,
            explanation: "Portfolio has no current value.".to_string(),
        };
    }

    let sectors = value_by(assets, |a| a.sector.clone());
    let max_concentration = sectors.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max) / value;
    let num_sectors = sectors.len();

    let diversification = ((num_sectors as f64 / 5.0).min(1.0)
        * (1.0 - max_concentration + 0.5)
        * 25.0)
        .clamp(0.0, 25.0);

    let return_pct = if cost > 0.0 {
        (value - cost) / cost * 100.0
    } else {
        0.0
    };
    let returns = (return_pct / 20.0).clamp(0.0, 1.0) * 25.0;

    let num_types = value_by(assets, |a| a.kind).len();
    let type_spread = (num_types as f64 / 3.0).min(1.0) * 25.0;

    let band = if return_pct > 10.0 {
        25.0
    } else if return_pct > 5.0 {
        20.0
    } else if return_pct > 0.0 {
        17.0
    } else if return_pct < -10.0 {
        5.0
    } else {
        15.0
    };

    let score = (diversification + returns + type_spread + band).clamp(0.0, 100.0) as u32;
    let confidence = (70 + num_sectors as u32 * 5 + assets.len() as u32 * 2).min(95);

    let mut notes = Vec::new();
    if max_concentration > 0.5 {
        notes.push(format!(
            "High sector concentration ({:.0}%).",
            max_concentration * 100.0
        ));
    }
    if return_pct < 0.0 {
        notes.push(format!("Portfolio is down {:.1}%.", return_pct.abs()));
    }
    if num_sectors < 3 {
        notes.push("Diversify across more sectors.".to_string());
    }
    if return_pct > 10.0 {
        notes.push(format!("Strong returns of {return_pct:.1}%."));
    }
    if notes.is_empty() {
        notes.push("Portfolio is well-balanced.".to_string());
    }

    HealthScore {
        score,
        confidence,
        explanation: notes.join(" "),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskPersonality {
    Aggressive,
    Growth,
    Moderate,
    Conservative,
    Undetermined,
}

impl RiskPersonality {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskPersonality::Aggressive => "Aggressive",
            RiskPersonality::Growth => "Growth",
            RiskPersonality::Moderate => "Moderate",
            RiskPersonality::Conservative => "Conservative",
            RiskPersonality::Undetermined => "Undetermined",
        }
    }

    pub fn favours_equity(&self) -> bool {
        matches!(self, RiskPersonality::Aggressive | RiskPersonality::Growth)
    }
}

impl fmt::Display for RiskPersonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskProfile {
    pub personality: RiskPersonality,
    pub confidence: u32,
    pub explanation: String,
}

impl RiskProfile {
    fn new(personality: RiskPersonality, confidence: u32, explanation: &str) -> Self {
        Self {
            personality,
            confidence,
            explanation: explanation.to_string(),
        }
    }
}

/// Classifies the investor by the equity share of their holdings.
pub fn risk_personality(assets: &[Asset]) -> RiskProfile {
    if assets.is_empty() {
        return RiskProfile::new(
            RiskPersonality::Undetermined,
            30,
            "Add assets to determine risk personality.",
        );
    }
    if total_value(assets) == 0.0 {
        return RiskProfile::new(RiskPersonality::Undetermined, 30, "Portfolio empty.");
    }

    let ratio = equity_ratio(assets);
    if ratio > 0.8 {
        RiskProfile::new(
            RiskPersonality::Aggressive,
            88,
            "Heavy equity allocation signals high risk tolerance.",
        )
    } else if ratio > 0.6 {
        RiskProfile::new(
            RiskPersonality::Growth,
            85,
            "Equity-tilted portfolio with growth focus.",
        )
    } else if ratio > 0.4 {
        RiskProfile::new(
            RiskPersonality::Moderate,
            85,
            "Balanced equity-debt allocation.",
        )
    } else {
        RiskProfile::new(
            RiskPersonality::Conservative,
            85,
            "Preference for stable, low-risk instruments.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::tests::{asset, demo_portfolio};
    use dhandraft_core::AssetKind;

    #[test]
    fn empty_and_worthless_portfolios() {
        let empty = financial_health(&[]);
        assert_eq!((empty.score, empty.confidence), (45, 60));

        let worthless = vec![asset("X", AssetKind::Equity, "Energy", 10, 5.0, 0.0)];
        let health = financial_health(&worthless);
        assert_eq!((health.score, health.confidence), (30, 50));
        assert_eq!(health.explanation, "Portfolio has no current value.");
        assert_eq!(
            risk_personality(&worthless).personality,
            RiskPersonality::Undetermined
        );
    }

    #[test]
    fn demo_portfolio_is_balanced() {
        let health = financial_health(&demo_portfolio());
        assert_eq!(health.score, 75);
        assert_eq!(health.confidence, 95);
        assert_eq!(health.explanation, "Portfolio is well-balanced.");

        let profile = risk_personality(&demo_portfolio());
        assert_eq!(profile.personality, RiskPersonality::Conservative);
        assert_eq!(profile.confidence, 85);
    }

    #[test]
    fn concentrated_losing_portfolio() {
        let assets = vec![asset("TCS", AssetKind::Equity, "Technology", 10, 4000.0, 3000.0)];
        let health = financial_health(&assets);
        assert_eq!(health.score, 15);
        assert_eq!(health.confidence, 77);
        assert_eq!(
            health.explanation,
            "High sector concentration (100%). Portfolio is down 25.0%. Diversify across more sectors."
        );

        let profile = risk_personality(&assets);
        assert_eq!(profile.personality, RiskPersonality::Aggressive);
        assert_eq!(profile.confidence, 88);
        assert_eq!(serde_json::to_value(&profile).unwrap()["personality"], "Aggressive");
    }

    #[test]
    fn equity_bands() {
        let mix = |equity: f64, debt: f64| {
            vec![
                asset("EQ", AssetKind::Equity, "Energy", 1, equity, equity),
                asset("FD", AssetKind::FixedDeposit, "Banking", 1, debt, debt),
            ]
        };
        assert_eq!(risk_personality(&mix(70.0, 30.0)).personality, RiskPersonality::Growth);
        assert_eq!(risk_personality(&mix(50.0, 50.0)).personality, RiskPersonality::Moderate);
        assert_eq!(risk_personality(&mix(40.0, 60.0)).personality, RiskPersonality::Conservative);
    }
}
