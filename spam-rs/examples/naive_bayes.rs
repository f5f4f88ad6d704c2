//! Train the Naive Bayes classifier on the built-in corpus and score a few
//! messages.
//!
//! ```bash
//! cargo run --example naive_bayes
//! ```

use spam_rs::classifiers::NaiveBayes;
use spam_rs::corpus::TrainingSet;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let training = TrainingSet::sample();
    let model = NaiveBayes::fit(training.pairs())?;

    println!(
        "Trained on {} spam / {} ham messages, {} distinct tokens",
        training.spam_count(),
        training.ham_count(),
        model.vocabulary_size()
    );

    let messages = [
        "Win a free iPhone now!",
        "Let's meet for lunch tomorrow.",
        "Claim your cash reward, limited time offer",
        "Notes from the project review are attached",
    ];

    for message in messages {
        let p = model.spam_probability(message)?;
        let label = if p >= 0.5 { "spam" } else { "ham" };
        println!("{:>5} ({:.3})  {}", label, p, message);
    }

    Ok(())
}
