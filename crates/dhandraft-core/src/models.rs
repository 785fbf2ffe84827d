//! Documents persisted by the service. Field names follow the JSON wire format
//! the web client already speaks, hence the camelCase renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::storage::Document;

/// Time-ordered ids, so a collection scan returns documents in insertion order.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub risk_personality: String,
    pub financial_health_score: u32,
    pub created_at: DateTime<Utc>,
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    fn id(&self) -> &str {
        &self.id
    }
}

/// A user as returned to clients: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub risk_personality: String,
    pub financial_health_score: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            risk_personality: user.risk_personality.clone(),
            financial_health_score: user.financial_health_score,
            created_at: user.created_at,
        }
    }
}

/// Unique index entry: keyed by the normalized email, points at the owning user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEmail {
    pub email: String,
    pub user_id: String,
}

impl Document for UserEmail {
    const COLLECTION: &'static str = "user_emails";
    fn id(&self) -> &str {
        &self.email
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub current_price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub market_cap: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub historical_data: Vec<Candle>,
}

impl Stock {
    pub fn without_history(&self) -> Self {
        Self {
            historical_data: Vec::new(),
            ..self.clone()
        }
    }
}

impl Document for Stock {
    const COLLECTION: &'static str = "stocks";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Equity,
    FixedDeposit,
    Gold,
    Bond,
    MutualFund,
    #[serde(other)]
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Equity => "equity",
            AssetKind::FixedDeposit => "fixed_deposit",
            AssetKind::Gold => "gold",
            AssetKind::Bond => "bond",
            AssetKind::MutualFund => "mutual_fund",
            AssetKind::Other => "other",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub sector: String,
    pub quantity: i64,
    pub buy_price: f64,
    pub current_price: f64,
}

impl Asset {
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.buy_price
    }
}

impl Document for Asset {
    const COLLECTION: &'static str = "assets";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub order: u32,
    pub content: String,
    pub quiz: Vec<QuizQuestion>,
}

impl Document for Lesson {
    const COLLECTION: &'static str = "lessons";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub id: String,
    pub user_id: String,
    pub lesson_id: String,
    pub lesson_title: String,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub answers: Vec<i64>,
    pub completed_at: DateTime<Utc>,
}

impl Document for QuizScore {
    const COLLECTION: &'static str = "quiz_scores";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub id: String,
    pub user_id: String,
    pub stock_symbol: String,
    pub predicted_direction: String,
    pub ai_direction: Direction,
    pub ai_confidence: u32,
    pub correct: bool,
    pub explanation: String,
    pub timestamp: DateTime<Utc>,
}

impl Document for PredictionRecord {
    const COLLECTION: &'static str = "predictions";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub sector: String,
    pub date: String,
}

impl Document for NewsItem {
    const COLLECTION: &'static str = "news";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub impact_score: u32,
    pub impacted_sectors: Vec<String>,
    pub severity: Severity,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Document for Alert {
    const COLLECTION: &'static str = "alerts";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advice {
    pub strategy: String,
    pub tax_suggestion: String,
    pub risk_alert: String,
    pub sector_warning: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorRecord {
    pub id: String,
    pub user_id: String,
    pub query: String,
    pub response: Advice,
    pub timestamp: DateTime<Utc>,
}

impl Document for AdvisorRecord {
    const COLLECTION: &'static str = "advisor_history";
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Document for ChatMessage {
    const COLLECTION: &'static str = "community_chat";
    fn id(&self) -> &str {
        &self.id
    }
}
