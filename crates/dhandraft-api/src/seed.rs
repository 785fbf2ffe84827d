//! Demo dataset inserted on first start.

use chrono::{Duration, Utc};
use dhandraft_analytics::{generate_stock_history, market::DEFAULT_HISTORY_DAYS};
use dhandraft_core::{
    new_id, AlertsConfig, Asset, AssetKind, ChatMessage, Database, Lesson, NewsItem,
    PasswordHasher, QuizQuestion, Stock, User,
};
use tracing::info;

use crate::handlers::alerts::assess_news;

pub const DEMO_EMAIL: &str = "demo@dhandraft.com";
pub const DEMO_PASSWORD: &str = "Demo123!";
const DEMO_NAME: &str = "Arjun Mehta";

/// Seeds the demo dataset unless the demo user already exists. Returns whether anything was written.
pub async fn seed_demo_data(
    db: &Database,
    passwords: &PasswordHasher,
    alerts: &AlertsConfig,
) -> anyhow::Result<bool> {
    if db.find_user_by_email(DEMO_EMAIL).await?.is_some() {
        info!("Seed data already exists, skipping");
        return Ok(false);
    }
    info!("Seeding demo data");

    let demo = User {
        id: new_id(),
        name: DEMO_NAME.to_string(),
        email: DEMO_EMAIL.to_string(),
        password: passwords.hash(DEMO_PASSWORD)?,
        risk_personality: "Moderate".to_string(),
        financial_health_score: 72,
        created_at: Utc::now(),
    };
    if !db.create_user(&demo).await? {
        return Ok(false);
    }

    db.stocks().insert_many(&stocks()).await?;
    db.assets().insert_many(&assets(&demo.id)).await?;
    db.lessons().insert_many(&lessons()).await?;

    let news = news();
    db.news().insert_many(&news).await?;

    let mut alert_count = 0;
    for item in &news {
        if let Some(assessment) = assess_news(item, alerts) {
            let explanation = format!(
                "{} sentiment in {} sector. Confidence: {}%.",
                assessment.sentiment.label.as_str(),
                item.sector,
                assessment.sentiment.confidence
            );
            db.alerts()
                .insert(&assessment.into_alert(item, explanation))
                .await?;
            alert_count += 1;
        }
    }

    db.community_chat()
        .insert_many(&chat_messages(&demo.id))
        .await?;

    info!(alerts = alert_count, "Seed data created");
    Ok(true)
}

fn stocks() -> Vec<Stock> {
    let today = Utc::now().date_naive();
    [
        ("RELIANCE", "Reliance Industries", "Energy", 2450.75, 1.2, "16.5L Cr"),
        ("TCS", "Tata Consultancy Services", "Technology", 3890.50, -0.5, "14.2L Cr"),
        ("HDFCBANK", "HDFC Bank", "Banking", 1650.25, 0.8, "12.4L Cr"),
        ("INFY", "Infosys", "Technology", 1520.00, -1.1, "6.3L Cr"),
        ("ITC", "ITC Limited", "FMCG", 465.30, 0.3, "5.8L Cr"),
        ("BHARTIARTL", "Bharti Airtel", "Telecom", 1680.00, 2.1, "9.4L Cr"),
        ("SBIN", "State Bank of India", "Banking", 780.50, -0.3, "7.0L Cr"),
        ("SUNPHARMA", "Sun Pharma", "Pharma", 1820.00, 1.5, "4.4L Cr"),
    ]
    .into_iter()
    .map(|(symbol, name, sector, price, change, cap)| Stock {
        id: new_id(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        sector: sector.to_string(),
        current_price: price,
        change,
        market_cap: cap.to_string(),
        historical_data: generate_stock_history(price, DEFAULT_HISTORY_DAYS, today),
    })
    .collect()
}

fn assets(user_id: &str) -> Vec<Asset> {
    [
        ("Reliance Industries", "RELIANCE", AssetKind::Equity, "Energy", 20, 2300.0, 2450.75),
        ("HDFC Bank", "HDFCBANK", AssetKind::Equity, "Banking", 30, 1550.0, 1650.25),
        ("TCS", "TCS", AssetKind::Equity, "Technology", 10, 3700.0, 3890.50),
        ("SBI Fixed Deposit", "SBIFD", AssetKind::FixedDeposit, "Banking", 1, 200000.0, 214000.0),
        ("Gold ETF", "GOLDBEES", AssetKind::Gold, "Commodities", 50, 4800.0, 5200.0),
    ]
    .into_iter()
    .map(|(name, symbol, kind, sector, quantity, buy, current)| Asset {
        id: new_id(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        kind,
        sector: sector.to_string(),
        quantity,
        buy_price: buy,
        current_price: current,
    })
    .collect()
}

fn question(question: &str, options: [&str; 4], correct: usize) -> QuizQuestion {
    QuizQuestion {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct,
    }
}

fn lesson(
    order: u32,
    title: &str,
    description: &str,
    category: &str,
    difficulty: &str,
    content: &str,
    quiz: Vec<QuizQuestion>,
) -> Lesson {
    Lesson {
        id: new_id(),
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        difficulty: difficulty.to_string(),
        order,
        content: content.to_string(),
        quiz,
    }
}

fn lessons() -> Vec<Lesson> {
    vec![
        lesson(
            1,
            "Introduction to Stock Market",
            "Learn how the stock market works and why companies list their shares.",
            "basics",
            "beginner",
            "The stock market is a marketplace where shares of publicly listed companies are bought and sold. When you buy a share, you own a small part of that company. Stock prices fluctuate based on supply and demand, company performance, and market sentiment. Key concepts include: BSE and NSE are India's primary exchanges. SEBI regulates the market. Investors can trade through demat accounts. Stock indices like Sensex and Nifty track overall market performance.",
            vec![
                question("What is a stock?", ["A type of bond", "Ownership share in a company", "A government loan", "An insurance product"], 1),
                question("What does IPO stand for?", ["Initial Public Offering", "Internal Price Option", "Instant Profit Order", "Investment Portfolio Optimization"], 0),
                question("Who regulates the Indian stock market?", ["RBI", "SEBI", "IRDA", "PFRDA"], 1),
                question("Which is an Indian stock exchange?", ["NASDAQ", "NYSE", "BSE", "LSE"], 2),
            ],
        ),
        lesson(
            2,
            "Understanding Mutual Funds",
            "Explore how mutual funds pool money and diversify investments.",
            "investing",
            "beginner",
            "Mutual funds pool money from many investors to invest in stocks, bonds, or other securities. A fund manager makes investment decisions. Types include: Equity funds invest in stocks. Debt funds invest in bonds. Hybrid funds mix both. ELSS funds offer tax benefits under Section 80C. SIP (Systematic Investment Plan) allows regular small investments. NAV (Net Asset Value) represents the per-unit value of the fund.",
            vec![
                question("What is a mutual fund?", ["A single stock", "Pooled investment vehicle", "Bank deposit", "Insurance policy"], 1),
                question("What is SIP?", ["Single Investment Plan", "Systematic Investment Plan", "Stock Index Price", "Savings Interest Plan"], 1),
                question("Which fund type offers 80C tax benefit?", ["Liquid Fund", "ELSS", "Debt Fund", "Index Fund"], 1),
                question("What does NAV represent?", ["Total fund value", "Per-unit fund value", "Annual returns", "Fund manager fee"], 1),
            ],
        ),
        lesson(
            3,
            "Risk Management Essentials",
            "Learn to assess and manage investment risks effectively.",
            "risk",
            "intermediate",
            "Investment risk is the probability of losing money. Key risk types: Market risk affects all investments due to economic changes. Credit risk is the chance a borrower defaults. Liquidity risk means difficulty selling an investment. Inflation risk erodes purchasing power. Diversification across asset classes reduces overall portfolio risk. Risk tolerance depends on age, income, goals, and temperament. The risk-return tradeoff means higher potential returns come with higher risk.",
            vec![
                question("What is diversification?", ["Buying one stock", "Spreading investments across assets", "Timing the market", "Short selling"], 1),
                question("What is market risk?", ["Risk of a single company", "Risk affecting all investments", "Currency risk only", "Inflation only"], 1),
                question("Higher returns generally mean:", ["Lower risk", "Higher risk", "No risk", "Guaranteed profits"], 1),
                question("What reduces portfolio risk?", ["Concentration", "Leverage", "Diversification", "Day trading"], 2),
            ],
        ),
        lesson(
            4,
            "Tax Planning for Investors",
            "Master tax-saving strategies for your investments.",
            "tax",
            "intermediate",
            "India has two tax regimes: Old and New. Old regime allows deductions like 80C (up to Rs.1.5L), 80D (health insurance), and HRA. New regime has lower rates but fewer deductions. Key tax concepts: LTCG on equity above Rs.1.25L is taxed at 12.5%. STCG on equity is taxed at 20%. FD interest is fully taxable. ELSS provides 80C benefit with 3-year lock-in. Tax-loss harvesting offsets gains with losses.",
            vec![
                question("Maximum 80C deduction limit?", ["Rs.1,00,000", "Rs.1,50,000", "Rs.2,00,000", "Rs.2,50,000"], 1),
                question("LTCG tax rate on equity?", ["10%", "12.5%", "15%", "20%"], 1),
                question("ELSS lock-in period?", ["1 year", "3 years", "5 years", "No lock-in"], 1),
                question("Which regime has lower rates but fewer deductions?", ["Old Regime", "New Regime", "Both same", "Neither"], 1),
            ],
        ),
        lesson(
            5,
            "Portfolio Diversification Strategy",
            "Build a well-balanced portfolio across asset classes.",
            "strategy",
            "advanced",
            "A well-diversified portfolio spreads risk across asset classes. Asset allocation strategies: Conservative (30% equity, 50% debt, 20% gold). Moderate (50% equity, 30% debt, 20% alternatives). Aggressive (70% equity, 20% debt, 10% alternatives). Rebalancing quarterly maintains target allocation. Sector diversification avoids concentration risk. Geographic diversification includes international funds. Age-based rule: Equity % = 100 minus your age.",
            vec![
                question("Conservative portfolio has most allocation in?", ["Equity", "Debt", "Gold", "Real Estate"], 1),
                question("How often should you rebalance?", ["Daily", "Weekly", "Quarterly", "Never"], 2),
                question("Age-based equity rule: Equity % =", ["Age", "100 - Age", "Age x 2", "50% always"], 1),
                question("Sector diversification helps with:", ["Higher returns guaranteed", "Reducing concentration risk", "Tax savings", "Lower fees"], 1),
            ],
        ),
    ]
}

fn news() -> Vec<NewsItem> {
    [
        (
            "Reliance Energy Division Reports Strong Growth",
            "Reliance Industries energy division shows strong profit growth driven by robust demand and strategic expansion in green energy initiatives.",
            "Energy",
            "2024-01-15",
        ),
        (
            "IT Sector Faces Global Headwinds",
            "Indian IT companies facing decline and weakness due to global economic slowdown and reduced client spending in key markets.",
            "Technology",
            "2024-01-14",
        ),
        (
            "Banking Sector Maintains Stability",
            "Banks maintain steady positive performance with strong loan growth despite RBI rate adjustments and regulatory changes.",
            "Banking",
            "2024-01-13",
        ),
        (
            "FMCG Rural Recovery Continues",
            "FMCG sector reports positive growth and strong rally driven by rural demand surge and volume recovery across categories.",
            "FMCG",
            "2024-01-12",
        ),
        (
            "Pharma Exports Face Challenges",
            "Pharmaceutical companies dealing with risk of regulatory decline in export markets affecting revenue growth.",
            "Pharma",
            "2024-01-11",
        ),
        (
            "Telecom Sector Record Growth",
            "India telecom companies report record data consumption growth and strong subscriber gain with positive revenue trends.",
            "Telecom",
            "2024-01-10",
        ),
    ]
    .into_iter()
    .map(|(title, content, sector, date)| NewsItem {
        id: new_id(),
        title: title.to_string(),
        content: content.to_string(),
        sector: sector.to_string(),
        date: date.to_string(),
    })
    .collect()
}

fn chat_messages(demo_user_id: &str) -> Vec<ChatMessage> {
    let now = Utc::now();
    [
        (
            Some(demo_user_id),
            DEMO_NAME,
            "Has anyone looked at Reliance's energy division results? Impressive numbers!",
            Duration::hours(3),
        ),
        (
            None,
            "Priya Sharma",
            "IT sector seems weak this quarter. TCS and Infy both under pressure.",
            Duration::hours(2),
        ),
        (
            None,
            "Rahul Verma",
            "Banking sector is holding steady. HDFC Bank looks solid for long term.",
            Duration::hours(1),
        ),
        (
            None,
            "Sneha Patel",
            "Anyone investing in pharma? Sun Pharma has been doing well.",
            Duration::minutes(30),
        ),
    ]
    .into_iter()
    .map(|(user_id, username, message, age)| ChatMessage {
        id: new_id(),
        user_id: user_id.map(str::to_string).unwrap_or_else(new_id),
        username: username.to_string(),
        message: message.to_string(),
        timestamp: now - age,
    })
    .collect()
}
