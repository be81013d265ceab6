use crate::channels::Channel;
use rand::Rng;
use std::time::Duration;

/// Random pause between fragments, like someone typing the next line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentPacing {
    pub min: Duration,
    pub max: Duration,
}

impl FragmentPacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn next_pause(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

/// Split a reply into texting-sized pieces: one per line and per sentence,
/// trailing `.`/`,` dropped, `?`/`!` kept.
pub fn split_fragments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(split_sentences)
        .map(|sentence| sentence.trim().trim_end_matches(['.', ',']).to_string())
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Break after `.`, `!` or `?` when whitespace follows.
fn split_sentences(line: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?')
            && let Some(&(next_idx, next)) = chars.peek()
            && next.is_whitespace()
        {
            sentences.push(&line[start..next_idx]);
            while chars.peek().is_some_and(|(_, c)| c.is_whitespace()) {
                chars.next();
            }
            start = chars.peek().map_or(line.len(), |&(i, _)| i);
        }
    }
    if start < line.len() {
        sentences.push(&line[start..]);
    }
    sentences
}

/// Send fragments in order with a typing indicator and a pause between them.
/// Stops at the first failed send.
pub async fn send_fragments(
    channel: &dyn Channel,
    recipient: &str,
    fragments: &[String],
    pacing: FragmentPacing,
) -> anyhow::Result<()> {
    for (i, fragment) in fragments.iter().enumerate() {
        channel.send(fragment, recipient).await?;
        if i + 1 < fragments.len() {
            if let Err(error) = channel.send_typing(recipient).await {
                tracing::debug!(%error, "typing indicator failed");
            }
            let pause = pacing.next_pause();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
    }
    Ok(())
}
