//! Test Prediction Client
//!
//! Generates review sentences and posts them to a running sentiment service.

use rand::Rng;
use sentiment_service::types::{ErrorBody, PredictionRequest, PredictionResponse, Sentiment};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const SUBJECTS: &[&str] = &[
    "this product",
    "the delivery",
    "customer support",
    "the battery life",
    "the packaging",
    "this phone",
];

const POSITIVE: &[&str] = &[
    "I love {}",
    "{} is absolutely fantastic",
    "really happy with {}",
    "{} exceeded my expectations",
    "great value, {} works perfectly",
];

const NEGATIVE: &[&str] = &[
    "I hate {}",
    "{} is terrible and broke after a day",
    "very disappointed with {}",
    "{} was a complete waste of money",
    "awful experience, {} never worked",
];

/// Review generator for testing
struct ReviewGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ReviewGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a review sentence, positive with probability `positive_rate`
    fn generate(&mut self, positive_rate: f64) -> (Sentiment, String) {
        let (expected, templates) = if self.rng.gen_bool(positive_rate) {
            (Sentiment::Positive, POSITIVE)
        } else {
            (Sentiment::Negative, NEGATIVE)
        };
        let template = self.random_choice(templates);
        let subject = self.random_choice(SUBJECTS);
        (expected, template.replace("{}", subject))
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Share of positive reviews to send; defaults to 0.5
fn parse_positive_rate(arg: Option<&str>) -> anyhow::Result<f64> {
    let Some(raw) = arg else {
        return Ok(0.5);
    };
    let rate: f64 = raw
        .parse()
        .map_err(|e| anyhow::anyhow!("positive rate {raw:?} is not a number: {e}"))?;
    if !(0.0..=1.0).contains(&rate) {
        anyhow::bail!("positive rate must be between 0 and 1, got {rate}");
    }
    Ok(rate)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("predict_client=info".parse()?),
        )
        .init();

    info!("Starting Test Prediction Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("http://localhost:8080");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let positive_rate = parse_positive_rate(args.get(3).map(|s| s.as_str()))?;
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        positive_rate = positive_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();
    let url = format!("{}/predict", base_url.trim_end_matches('/'));
    let mut generator = ReviewGenerator::new();

    let mut agreed = 0_u64;
    let mut failed = 0_u64;
    let mut total_latency = Duration::ZERO;

    for i in 0..count {
        let (expected, text) = generator.generate(positive_rate);
        let start = Instant::now();

        let response = client
            .post(&url)
            .json(&PredictionRequest { text: text.clone() })
            .send()
            .await?;
        total_latency += start.elapsed();

        if response.status().is_success() {
            let prediction: PredictionResponse = response.json().await?;
            if prediction.sentiment == expected {
                agreed += 1;
            }
            if i == 0 || (i + 1) % 10 == 0 {
                info!(
                    text = %text,
                    expected = expected.as_str(),
                    sentiment = prediction.sentiment.as_str(),
                    probability = prediction.probability,
                    "Sample prediction {}/{}",
                    i + 1,
                    count
                );
            }
        } else {
            failed += 1;
            let status = response.status();
            let body: Option<ErrorBody> = response.json().await.ok();
            warn!(
                status = status.as_u16(),
                error = ?body,
                text = %text,
                "Prediction request failed"
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let succeeded = count - failed;
    let mean_latency_ms = if count > 0 {
        total_latency.as_secs_f64() * 1000.0 / count as f64
    } else {
        0.0
    };
    info!(
        "Completed! {} requests ({} failed), {} of {} labels matched the template, mean latency {:.1} ms",
        count, failed, agreed, succeeded, mean_latency_ms
    );

    Ok(())
}
