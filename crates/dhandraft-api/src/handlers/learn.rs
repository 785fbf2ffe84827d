use std::collections::HashMap;

use axum::extract::{Path, State};
use chrono::Utc;
use dhandraft_analytics::{compare, format::round_int, TaxComparison, TaxCompareInput};
use dhandraft_core::{new_id, Lesson, QuizScore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::ApiJson,
    response::ApiResponse,
    state::AppState,
};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub best_score: Option<u32>,
    pub completed: bool,
}

pub async fn list_lessons(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<LessonView>>> {
    let mut lessons = state.db.lessons().all().await?;
    lessons.sort_by_key(|l| l.order);

    let uid = user.id();
    let mut best: HashMap<String, u32> = HashMap::new();
    for score in state.db.quiz_scores().find(|s| s.user_id == uid).await? {
        let entry = best.entry(score.lesson_id).or_insert(score.score);
        *entry = (*entry).max(score.score);
    }

    let views = lessons
        .into_iter()
        .map(|lesson| {
            let best_score = best.get(&lesson.id).copied();
            LessonView {
                lesson,
                best_score,
                completed: best_score.is_some(),
            }
        })
        .collect();
    Ok(ApiResponse::ok(views))
}

pub async fn get_lesson(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(lesson_id): Path<String>,
) -> ApiResult<ApiResponse<Lesson>> {
    let lesson = state
        .db
        .lessons()
        .get(&lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
    Ok(ApiResponse::ok(lesson))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub lesson_id: String,
    pub answers: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    /// The correct option index of every question.
    pub answers: Vec<usize>,
}

/// Number of answers matching the key, and the rounded percentage.
fn grade(lesson: &Lesson, answers: &[i64]) -> (usize, u32) {
    let correct = lesson
        .quiz
        .iter()
        .zip(answers)
        .filter(|(question, answer)| i64::try_from(question.correct).ok() == Some(**answer))
        .count();
    let score = round_int(correct as f64 / lesson.quiz.len() as f64 * 100.0) as u32;
    (correct, score)
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(submission): ApiJson<QuizSubmission>,
) -> ApiResult<ApiResponse<QuizResult>> {
    let lesson = state
        .db
        .lessons()
        .get(&submission.lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let total = lesson.quiz.len();
    if total == 0 {
        return Err(ApiError::BadRequest("Lesson has no quiz".to_string()));
    }
    if submission.answers.len() != total {
        return Err(ApiError::BadRequest(format!(
            "Expected {total} answers, got {}",
            submission.answers.len()
        )));
    }

    let (correct, score) = grade(&lesson, &submission.answers);
    let record = QuizScore {
        id: new_id(),
        user_id: user.id().to_string(),
        lesson_id: lesson.id.clone(),
        lesson_title: lesson.title.clone(),
        score,
        correct,
        total,
        answers: submission.answers,
        completed_at: Utc::now(),
    };
    state.db.quiz_scores().insert(&record).await?;
    info!(user_id = %user.id(), lesson_id = %lesson.id, score, "quiz submitted");

    Ok(ApiResponse::with_message(
        QuizResult {
            score,
            correct,
            total,
            answers: lesson.quiz.iter().map(|q| q.correct).collect(),
        },
        format!("Quiz completed! Score: {score}%"),
    ))
}

pub async fn quiz_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<Vec<QuizScore>>> {
    let uid = user.id();
    let mut scores = state.db.quiz_scores().find(|s| s.user_id == uid).await?;
    scores.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    scores.truncate(HISTORY_LIMIT);
    Ok(ApiResponse::ok(scores))
}

pub async fn tax_compare(
    _user: AuthUser,
    ApiJson(input): ApiJson<TaxCompareInput>,
) -> ApiResponse<TaxComparison> {
    ApiResponse::ok(compare(&input))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankProduct {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub rate: &'static str,
    pub min_balance: &'static str,
    pub taxable: &'static str,
    pub liquidity: &'static str,
}

pub const BANK_RATES: [BankProduct; 6] = [
    BankProduct {
        kind: "Savings Account",
        rate: "2.5% - 4.0%",
        min_balance: "Rs.1,000 - Rs.10,000",
        taxable: "Yes (above Rs.10,000)",
        liquidity: "High",
    },
    BankProduct {
        kind: "Fixed Deposit (FD)",
        rate: "5.0% - 7.5%",
        min_balance: "Rs.1,000",
        taxable: "Yes (TDS above Rs.40,000)",
        liquidity: "Low (penalty on early withdrawal)",
    },
    BankProduct {
        kind: "Recurring Deposit (RD)",
        rate: "5.5% - 6.5%",
        min_balance: "Rs.100/month",
        taxable: "Yes",
        liquidity: "Low",
    },
    BankProduct {
        kind: "Current Account",
        rate: "0%",
        min_balance: "Rs.10,000+",
        taxable: "N/A",
        liquidity: "High",
    },
    BankProduct {
        kind: "PPF",
        rate: "7.1%",
        min_balance: "Rs.500/year",
        taxable: "Exempt (EEE)",
        liquidity: "Low (15-year lock-in)",
    },
    BankProduct {
        kind: "NPS",
        rate: "8% - 10% (market-linked)",
        min_balance: "Rs.500/year",
        taxable: "Partial (60% exempt at maturity)",
        liquidity: "Very Low (till 60 years)",
    },
];

pub async fn bank_rates(_user: AuthUser) -> ApiResponse<[BankProduct; 6]> {
    ApiResponse::ok(BANK_RATES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhandraft_core::QuizQuestion;

    fn lesson(keys: &[usize]) -> Lesson {
        Lesson {
            id: "l1".into(),
            title: "Basics".into(),
            description: String::new(),
            category: "basics".into(),
            difficulty: "beginner".into(),
            order: 1,
            content: String::new(),
            quiz: keys
                .iter()
                .map(|&correct| QuizQuestion {
                    question: "?".into(),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct,
                })
                .collect(),
        }
    }

    #[test]
    fn grades_against_answer_key() {
        let lesson = lesson(&[1, 0, 1, 2]);
        assert_eq!(grade(&lesson, &[1, 0, 1, 2]), (4, 100));
        assert_eq!(grade(&lesson, &[1, 1, 1, 1]), (2, 50));
        assert_eq!(grade(&lesson, &[-1, 9, 0, 0]), (0, 0));
    }

    #[test]
    fn lesson_view_flattens_lesson_fields() {
        let view = LessonView {
            lesson: lesson(&[0]),
            best_score: None,
            completed: false,
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["title"], "Basics");
        assert_eq!(value["bestScore"], serde_json::Value::Null);
        assert_eq!(value["completed"], false);
        assert_eq!(value["quiz"][0]["correct"], 0);
    }

    #[test]
    fn bank_rates_use_wire_names() {
        let value = serde_json::to_value(BANK_RATES[4]).unwrap();
        assert_eq!(value["type"], "PPF");
        assert_eq!(value["minBalance"], "Rs.500/year");
    }
}
