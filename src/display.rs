//! Plain-text projection of a tally.

use crate::consts::BAR_WIDTH;
use crate::poll::{OptionTally, Tally};

/// `▓` cells proportional to `count / quota`, rounded to the nearest cell.
pub fn progress_bar(count: u32, quota: u32) -> String {
    let filled = if quota == 0 {
        BAR_WIDTH
    } else {
        ((count as f64 / quota as f64) * BAR_WIDTH as f64).round() as usize
    };
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "▓".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn voter_names(option: &OptionTally) -> String {
    option
        .voters
        .iter()
        .map(|name| name.as_deref().unwrap_or("Anonymous"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the full poll: question, numbered options, bars, voters.
pub fn render(tally: &Tally) -> String {
    let mut out = format!("📊 {}\n\n", tally.poll.question);

    for (i, option) in tally.options.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, option.option.text));
        out.push_str(&format!(
            "   {} {}/{}",
            progress_bar(option.count, option.option.quota),
            option.count,
            option.option.quota
        ));
        out.push_str(if option.is_full() { " ✅ FULL\n" } else { "\n" });
        if !option.voters.is_empty() {
            out.push_str(&format!("   👥 {}\n", voter_names(option)));
        }
        out.push('\n');
    }

    if !tally.poll.state.is_open() {
        out.push_str("🔒 This poll is closed\n");
    }
    out
}

/// Labels for the per-option controls, plus the retract control while open.
pub fn action_labels(tally: &Tally) -> Vec<String> {
    let mut labels: Vec<String> = tally
        .options
        .iter()
        .map(|option| {
            if option.is_full() {
                format!("❌ {} (FULL)", option.option.text)
            } else {
                format!("{} ({} left)", option.option.text, option.remaining())
            }
        })
        .collect();
    if tally.poll.state.is_open() {
        labels.push("🔄 Retract my vote".to_string());
    }
    labels
}
