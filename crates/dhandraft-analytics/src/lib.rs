//! Pure finance rules over domain documents. No storage or network access.

pub mod advisor;
pub mod financial;
pub mod format;
pub mod market;
pub mod portfolio;
pub mod risk;
pub mod tax;

pub use advisor::generate_advice;
pub use financial::{financial_health, risk_personality, HealthScore, RiskPersonality, RiskProfile};
pub use market::{
    analyze_sentiment, generate_stock_history, heatmap, impact_score, predict_direction,
    sector_sentiment, Prediction, SectorHeat, SectorSentiment, Sentiment, SentimentLabel,
};
pub use portfolio::{
    allocation_by_type, summarize, tax_optimization_score, total_value, AllocationSlice,
    PortfolioSummary, Volatility,
};
pub use risk::{
    detect_fraud, transaction_risk, FraudReport, Highlight, TransactionInput, TransactionRisk,
};
pub use tax::{
    capital_gains, compare, fd_tax, new_regime, old_regime, CapitalGains, CapitalGainsInput,
    FdTax, FdTaxInput, RegimeTax, TaxComparison, TaxCompareInput,
};
