//! Quiz generation, answer checking and scoring.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use crate::database::models::{Card, Chat, QuizState, Vocabulary};
use crate::error::BotError;

/// Result of one submitted answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// The word that was just answered
    pub question: String,
    /// Its correct article
    pub answer: String,
    /// `false` once the last question has been answered
    pub has_next: bool,
}

/// Score band shown with the final result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    KeepTrying,
    GoodJob,
    Excellent,
    Perfect,
    Neutral,
}

impl Rating {
    pub fn message(&self) -> &'static str {
        match self {
            Rating::KeepTrying => ", keep trying!",
            Rating::GoodJob => ", good job!",
            Rating::Excellent => ", excellent!",
            Rating::Perfect => ", perfeKt!",
            Rating::Neutral => ".",
        }
    }
}

/// Scales `correctly / length` to 0..=10, rounding to nearest, and picks the band
pub fn rate(correctly: u32, length: u32) -> Rating {
    if length == 0 {
        return Rating::Neutral;
    }
    let score = (f64::from(correctly) / f64::from(length) * 10.0).round() as i64;
    match score {
        0..=3 => Rating::KeepTrying,
        4..=6 => Rating::GoodJob,
        7..=9 => Rating::Excellent,
        10 => Rating::Perfect,
        _ => Rating::Neutral,
    }
}

#[derive(Clone)]
pub struct QuizEngine {
    vocabulary: Arc<Vocabulary>,
}

impl QuizEngine {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    /// Starts a new quiz, replacing any quiz already in progress
    pub fn start(&self, chat: &mut Chat, length: u32) -> Result<(), BotError> {
        self.start_with_rng(chat, length, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        &self,
        chat: &mut Chat,
        length: u32,
        rng: &mut R,
    ) -> Result<(), BotError> {
        let needed = length as usize;
        let available = self.vocabulary.len();
        if needed == 0 || available < needed {
            return Err(BotError::InsufficientVocabulary { needed, available });
        }

        let mut pending: Vec<Card> = self
            .vocabulary
            .cards()
            .choose_multiple(rng, needed)
            .cloned()
            .collect();
        // choose_multiple does not promise a random order
        pending.shuffle(rng);

        let first = pending.remove(0);
        chat.quiz = Some(QuizState {
            length,
            pos: 1,
            question: first.word,
            answer: first.article,
            correctly: 0,
            pending,
            finished: false,
        });
        Ok(())
    }

    /// Text of the current question
    pub fn current_prompt(&self, chat: &Chat) -> Result<String, BotError> {
        let quiz = chat.active_quiz().ok_or(BotError::NoActiveQuiz(chat.id))?;
        Ok(format!(
            "{}/{}. What's the article for {}?",
            quiz.pos, quiz.length, quiz.question
        ))
    }

    /// Scores `given` against the current question and moves to the next one.
    ///
    /// `given` must already be one of the recognized labels.
    pub fn submit_answer(&self, chat: &mut Chat, given: &str) -> Result<AnswerOutcome, BotError> {
        let chat_id = chat.id;
        let quiz = chat
            .quiz
            .as_mut()
            .filter(|q| !q.finished)
            .ok_or(BotError::NoActiveQuiz(chat_id))?;

        if !quiz.is_consistent() {
            return Err(BotError::CorruptRecord(format!(
                "quiz of chat {} at {}/{} has {} cards left",
                chat_id,
                quiz.pos,
                quiz.length,
                quiz.pending.len()
            )));
        }

        let correct = given == quiz.answer;
        if correct {
            quiz.correctly += 1;
        }

        let mut outcome = AnswerOutcome {
            correct,
            question: quiz.question.clone(),
            answer: quiz.answer.clone(),
            has_next: false,
        };

        if quiz.pos < quiz.length && !quiz.pending.is_empty() {
            let next = quiz.pending.remove(0);
            quiz.pos += 1;
            quiz.question = next.word;
            quiz.answer = next.article;
            outcome.has_next = true;
        } else {
            quiz.finished = true;
        }

        Ok(outcome)
    }

    pub fn clear(&self, chat: &mut Chat) {
        chat.quiz = None;
    }
}
