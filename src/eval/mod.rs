//! Rule-based scoring of a finished training conversation.
//!
//! Five categories, each 0-20, summed into an overall score out of 100.
//! The heuristics are keyword counts over the trainee's lines; scoring
//! the same transcript twice always yields the same report.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::transcript::Speaker;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z']+").expect("static regex"));

const FILLER_WORDS: &[&str] = &[
    "um", "uh", "erm", "like", "basically", "literally", "kinda", "sorta", "y'know",
];

const POSITIVE_WORDS: &[&str] = &[
    "great", "wonderful", "happy", "glad", "love", "perfect", "absolutely", "definitely",
    "excellent", "fantastic",
];

const EMPATHY_PHRASES: &[&str] = &[
    "i understand",
    "i hear you",
    "that makes sense",
    "i appreciate",
    "that's a fair",
    "good question",
    "i know how",
];

const OBJECTION_MARKERS: &[&str] = &[
    "expensive",
    "too much",
    "not sure",
    "doubt",
    "worried",
    "skeptical",
    "didn't work",
    "don't trust",
    "cheaper",
];

const HANDLING_PHRASES: &[&str] = &[
    "i understand",
    "that's fair",
    "many customers",
    "let me explain",
    "what i can do",
    "compared to",
    "money-back",
    "guarantee",
];

const VALUE_PHRASES: &[&str] = &[
    "because",
    "which means",
    "benefit",
    "ingredient",
    "results",
    "guarantee",
    "dermatologist",
    "clinically",
    "designed to",
];

const CLOSING_PHRASES: &[&str] = &[
    "would you like",
    "shall we",
    "can i get you started",
    "how does that sound",
    "ready to",
    "today i can offer",
    "get started",
];

/// One line of the conversation as submitted for scoring.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptTurn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub transcripts: Vec<TranscriptTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub name: &'static str,
    pub score: u8,
    pub commentary: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub id: String,
    pub overall_score: u8,
    pub categories: Vec<CategoryScore>,
    pub summary: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("Transcript contains no trainee speech")]
    EmptyTranscript,
}

fn words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|phrase| lower.contains(phrase))
}

fn to_twenty(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 20.0).round() as u8
}

fn grammar_and_clarity(trainee: &[&str]) -> u8 {
    let all_words: Vec<String> = trainee.iter().flat_map(|t| words(t)).collect();
    if all_words.is_empty() {
        return 0;
    }
    let fillers = all_words
        .iter()
        .filter(|w| FILLER_WORDS.contains(&w.as_str()))
        .count();
    let filler_ratio = fillers as f64 / all_words.len() as f64;
    to_twenty(1.0 - filler_ratio * 4.0)
}

fn tone_and_empathy(trainee: &[&str]) -> u8 {
    let warm = trainee
        .iter()
        .filter(|t| {
            contains_any(t, EMPATHY_PHRASES)
                || words(t)
                    .iter()
                    .any(|w| POSITIVE_WORDS.contains(&w.as_str()))
        })
        .count();
    to_twenty(warm as f64 / trainee.len() as f64 * 1.5)
}

fn product_knowledge(trainee: &[&str]) -> u8 {
    let informative = trainee
        .iter()
        .filter(|t| contains_any(t, VALUE_PHRASES))
        .count();
    to_twenty(informative as f64 / trainee.len() as f64 * 2.0)
}

fn response_strategy(turns: &[TranscriptTurn]) -> u8 {
    let mut objections = 0usize;
    let mut handled = 0usize;
    let mut pending_objection = false;

    for turn in turns {
        match turn.speaker {
            Speaker::Customer => {
                if contains_any(&turn.text, OBJECTION_MARKERS) {
                    objections += 1;
                    pending_objection = true;
                }
            }
            Speaker::Trainee => {
                if pending_objection && contains_any(&turn.text, HANDLING_PHRASES) {
                    handled += 1;
                }
                pending_objection = false;
            }
        }
    }

    if objections == 0 {
        // Nothing to push back against; score the middle of the band.
        return to_twenty(0.7);
    }
    to_twenty(handled as f64 / objections as f64)
}

fn sales_effectiveness(trainee: &[&str]) -> u8 {
    let closing = trainee
        .iter()
        .filter(|t| contains_any(t, CLOSING_PHRASES))
        .count();
    let value = trainee
        .iter()
        .filter(|t| contains_any(t, VALUE_PHRASES))
        .count();
    let closing_part = if closing > 0 { 0.6 } else { 0.0 };
    let value_part = (value as f64 / trainee.len() as f64).min(1.0) * 0.4;
    to_twenty(closing_part + value_part)
}

fn commentary(name: &str, score: u8) -> String {
    let tier = match score {
        17..=20 => "a clear strength in this conversation",
        13..=16 => "solid, with room to sharpen",
        9..=12 => "adequate but inconsistent",
        _ => "the area most in need of practice",
    };
    format!("{name} was {tier}.")
}

/// Score a finished conversation. Fails only when the trainee never
/// said anything.
pub fn evaluate(request: &EvaluationRequest) -> Result<EvaluationReport, EvaluationError> {
    let trainee: Vec<&str> = request
        .transcripts
        .iter()
        .filter(|turn| turn.speaker == Speaker::Trainee && !turn.text.trim().is_empty())
        .map(|turn| turn.text.as_str())
        .collect();

    if trainee.is_empty() {
        return Err(EvaluationError::EmptyTranscript);
    }

    let scores = [
        ("Grammar & Clarity", grammar_and_clarity(&trainee)),
        ("Tone & Empathy", tone_and_empathy(&trainee)),
        ("Product Knowledge", product_knowledge(&trainee)),
        ("Response Strategy", response_strategy(&request.transcripts)),
        ("Sales Effectiveness", sales_effectiveness(&trainee)),
    ];

    let categories: Vec<CategoryScore> = scores
        .iter()
        .map(|&(name, score)| CategoryScore {
            name,
            score,
            commentary: commentary(name, score),
        })
        .collect();

    let overall_score: u8 = scores.iter().map(|(_, score)| score).sum();

    let best = scores
        .iter()
        .max_by_key(|(_, score)| *score)
        .map(|(name, _)| *name)
        .unwrap_or_default();
    let worst = scores
        .iter()
        .min_by_key(|(_, score)| *score)
        .map(|(name, _)| *name)
        .unwrap_or_default();
    let summary = format!(
        "Overall score {overall_score}/100. Strongest area: {best}. Biggest opportunity: {worst}."
    );

    Ok(EvaluationReport {
        id: Uuid::new_v4().to_string(),
        overall_score,
        categories,
        summary,
    })
}
