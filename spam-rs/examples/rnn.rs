//! Train a small recurrent network on the built-in corpus and score a few
//! messages.
//!
//! ```bash
//! RUST_LOG=spam_rs=debug cargo run --example rnn
//! ```

use spam_rs::classifiers::{FitParams, RnnClassifier, RnnConfig};
use spam_rs::corpus::TrainingSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spam_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Small enough to train in a few seconds on CPU
    let config = RnnConfig {
        max_words: 500,
        max_len: 20,
        embedding_dim: 16,
        hidden_units: 16,
        fit: FitParams {
            epochs: 100,
            batch_size: 4,
            learning_rate: 1e-2,
            seed: 42,
        },
    };

    let training = TrainingSet::sample();
    let model = RnnClassifier::fit(training.pairs(), &config)?;
    println!(
        "Trained on {} messages, vocabulary of {} tokens",
        training.len(),
        model.vocabulary_size()
    );

    let messages = [
        "Win a free vacation, claim your prize now",
        "Can we move the design review to Thursday?",
        "Limited offer: cash reward, click the link",
        "Coffee tomorrow with the team?",
    ];

    for message in messages {
        let p = model.spam_probability(message)?;
        let label = if p >= 0.5 { "spam" } else { "ham" };
        println!("{:>5} ({:.3})  {}", label, p, message);
    }

    Ok(())
}
