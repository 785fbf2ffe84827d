use dhandraft_analytics::{detect_fraud, transaction_risk, FraudReport, TransactionInput, TransactionRisk};
use serde::Deserialize;

use crate::{auth::AuthUser, extract::ApiJson, response::ApiResponse};

pub async fn check_transaction(
    _user: AuthUser,
    ApiJson(tx): ApiJson<TransactionInput>,
) -> ApiResponse<TransactionRisk> {
    ApiResponse::ok(transaction_risk(
        tx.amount,
        &tx.kind,
        &tx.description,
        tx.recipient_new,
    ))
}

#[derive(Debug, Deserialize)]
pub struct FraudCheck {
    pub text: String,
}

pub async fn check_fraud(
    _user: AuthUser,
    ApiJson(check): ApiJson<FraudCheck>,
) -> ApiResponse<FraudReport> {
    ApiResponse::ok(detect_fraud(&check.text))
}
