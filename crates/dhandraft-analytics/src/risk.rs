//! Transaction risk scoring and scam-text detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const SUSPICIOUS_KEYWORDS: [&str; 8] = [
    "urgent",
    "immediately",
    "wire",
    "crypto",
    "bitcoin",
    "lottery",
    "prize",
    "free",
];

const HIGH_RISK_TYPES: [&str; 2] = ["international_transfer", "wire_transfer"];

/// Phrase weights, checked in this order.
const FRAUD_KEYWORDS: [(&str, u32); 21] = [
    ("urgent", 15),
    ("lottery", 25),
    ("winner", 20),
    ("click here", 20),
    ("wire transfer", 20),
    ("otp", 15),
    ("verify account", 20),
    ("limited time", 15),
    ("free money", 25),
    ("congratulations", 10),
    ("prize", 20),
    ("act now", 15),
    ("bank details", 20),
    ("password", 25),
    ("pin number", 25),
    ("suspended", 20),
    ("account blocked", 20),
    ("inheritance", 20),
    ("transfer fee", 20),
    ("advance payment", 20),
    ("guaranteed return", 20),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub recipient_new: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRisk {
    pub risk_score: u32,
    pub reasons: Vec<String>,
    pub recommendation: String,
    pub delay: String,
    pub confidence: u32,
}

pub fn transaction_risk(
    amount: f64,
    kind: &str,
    description: &str,
    recipient_new: bool,
) -> TransactionRisk {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    if amount > 100_000.0 {
        score += 30;
        reasons.push("High-value transaction (>Rs.1,00,000)".to_string());
    } else if amount > 50_000.0 {
        score += 15;
        reasons.push("Significant transaction amount".to_string());
    }

    if recipient_new {
        score += 20;
        reasons.push("New/unknown recipient".to_string());
    }

    let description = description.to_lowercase();
    let found: Vec<&str> = SUSPICIOUS_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| description.contains(kw))
        .collect();
    if !found.is_empty() {
        score += found.len() as u32 * 15;
        reasons.push(format!("Suspicious keywords: {}", found.join(", ")));
    }

    if HIGH_RISK_TYPES.contains(&kind) {
        score += 20;
        reasons.push("High-risk transaction type".to_string());
    }

    let score = score.min(100);
    let (recommendation, delay) = if score > 70 {
        ("Block transaction. High fraud probability.", "24-hour hold recommended")
    } else if score > 40 {
        ("Proceed with additional verification.", "OTP verification recommended")
    } else {
        ("Transaction appears safe.", "No delay needed")
    };

    TransactionRisk {
        risk_score: score,
        confidence: (60 + reasons.len() as u32 * 10).min(95),
        reasons,
        recommendation: recommendation.to_string(),
        delay: delay.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub keyword: String,
    /// Character offsets into the lower-cased text.
    pub start: usize,
    pub end: usize,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FraudReport {
    pub probability: u32,
    pub verdict: String,
    pub keywords_found: BTreeMap<String, u32>,
    pub highlights: Vec<Highlight>,
    pub recommendation: String,
    pub confidence: u32,
}

pub fn detect_fraud(text: &str) -> FraudReport {
    let lowered = text.to_lowercase();
    let mut keywords_found = BTreeMap::new();
    let mut highlights = Vec::new();
    let mut total = 0u32;

    for (keyword, weight) in FRAUD_KEYWORDS {
        if let Some(byte_idx) = lowered.find(keyword) {
            let start = lowered[..byte_idx].chars().count();
            keywords_found.insert(keyword.to_string(), weight);
            highlights.push(Highlight {
                keyword: keyword.to_string(),
                start,
                end: start + keyword.chars().count(),
                weight,
            });
            total += weight;
        }
    }

    let probability = total.min(100);
    let (verdict, recommendation) = if probability > 70 {
        (
            "High Risk",
            "Strong fraud indicators detected. Do not respond or share personal information.",
        )
    } else if probability > 40 {
        (
            "Suspicious",
            "Concerning elements found. Verify sender through official channels.",
        )
    } else if probability > 15 {
        (
            "Low Risk",
            "Minor suspicious elements. Exercise normal caution.",
        )
    } else {
        ("Safe", "No significant fraud indicators detected.")
    };

    FraudReport {
        probability,
        verdict: verdict.to_string(),
        confidence: (50 + keywords_found.len() as u32 * 10).min(95),
        keywords_found,
        highlights,
        recommendation: recommendation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risky_wire_transfer_is_blocked() {
        let result = transaction_risk(150_000.0, "wire_transfer", "URGENT crypto payment", true);
        assert_eq!(result.risk_score, 100);
        assert_eq!(result.reasons.len(), 4);
        assert_eq!(result.reasons[2], "Suspicious keywords: urgent, crypto");
        assert_eq!(result.recommendation, "Block transaction. High fraud probability.");
        assert_eq!(result.delay, "24-hour hold recommended");
        assert_eq!(result.confidence, 95);
    }

    #[test]
    fn mid_band_requires_verification() {
        let result = transaction_risk(60_000.0, "upi", "rent", true);
        assert_eq!(result.risk_score, 35);
        assert_eq!(result.recommendation, "Transaction appears safe.");

        let result = transaction_risk(60_000.0, "upi", "free gift", true);
        assert_eq!(result.risk_score, 50);
        assert_eq!(result.delay, "OTP verification recommended");
        assert_eq!(result.confidence, 90);
    }

    #[test]
    fn small_known_payment_is_safe() {
        let result = transaction_risk(500.0, "upi", "groceries", false);
        assert_eq!(result.risk_score, 0);
        assert!(result.reasons.is_empty());
        assert_eq!(result.confidence, 60);
        assert_eq!(result.delay, "No delay needed");
    }

    #[test]
    fn lottery_scam_is_high_risk() {
        let report = detect_fraud(
            "Congratulations! You are a lottery winner. Click here to claim your prize",
        );
        assert_eq!(report.probability, 95);
        assert_eq!(report.verdict, "High Risk");
        assert_eq!(report.keywords_found.len(), 5);
        assert_eq!(report.keywords_found["lottery"], 25);
        assert_eq!(report.confidence, 95);

        let keywords: Vec<&str> = report.highlights.iter().map(|h| h.keyword.as_str()).collect();
        assert_eq!(
            keywords,
            vec!["lottery", "winner", "click here", "congratulations", "prize"]
        );
        let lottery = &report.highlights[0];
        assert_eq!((lottery.start, lottery.end), (27, 34));
        let congrats = &report.highlights[3];
        assert_eq!((congrats.start, congrats.end), (0, 15));
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let report = detect_fraud("₹₹ urgent");
        assert_eq!(report.highlights[0].start, 3);
        assert_eq!(report.highlights[0].end, 9);
        assert_eq!(report.verdict, "Safe");
    }

    #[test]
    fn verdict_bands() {
        assert_eq!(detect_fraud("hello there").verdict, "Safe");
        assert_eq!(detect_fraud("your account blocked").verdict, "Low Risk");
        assert_eq!(detect_fraud("urgent: share your otp and password").verdict, "Suspicious");
    }
}
