use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::artifact::ArtifactSelection;

/// How many answers complete an interview.
pub const INTERVIEW_ROUNDS: usize = 5;

/// Percentage reported while questioning is capped here; completion is 100.
const PROGRESS_CAP: usize = 90;
const PROGRESS_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Questioning,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// One caller's run through the fixed-length interview.
///
/// The round counter equals the number of accepted answers and only ever
/// moves forward, one step per answer. The pending question is the one the
/// next answer will be paired with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: String,
    pub requirements: String,
    pub credential: String,
    pub answers: Vec<QuestionAnswer>,
    pub round: usize,
    pub artifacts: ArtifactSelection,
    pub phase: SessionPhase,
    pub pending_question: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewSession {
    pub fn new(
        id: String,
        requirements: String,
        credential: String,
        artifacts: ArtifactSelection,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            requirements,
            credential,
            answers: Vec::new(),
            round: 0,
            artifacts,
            phase: SessionPhase::Questioning,
            pending_question: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pairs the answer with the pending question and advances the round.
    pub fn record_answer(&mut self, answer: String) {
        let question = self.pending_question.take().unwrap_or_default();
        self.answers.push(QuestionAnswer { question, answer });
        self.round += 1;
        self.updated_at = Utc::now();
    }

    pub fn set_pending_question(&mut self, question: String) {
        self.pending_question = Some(question);
        self.updated_at = Utc::now();
    }

    pub fn mark_complete(&mut self) {
        self.phase = SessionPhase::Complete;
        self.pending_question = None;
        self.updated_at = Utc::now();
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    pub fn rounds_finished(&self) -> bool {
        self.round >= INTERVIEW_ROUNDS
    }

    pub fn progress(&self) -> u8 {
        match self.phase {
            SessionPhase::Complete => 100,
            SessionPhase::Questioning => {
                let percent = (self.round + 1).saturating_mul(PROGRESS_STEP).min(PROGRESS_CAP);
                u8::try_from(percent).unwrap_or(100)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> InterviewSession {
        InterviewSession::new(
            "session-1".into(),
            "a photo sharing app".into(),
            "sk-test".into(),
            ArtifactSelection::default(),
        )
    }

    #[test]
    fn test_round_advances_by_one_per_answer() {
        let mut session = session();
        assert_eq!(session.round, 0);

        session.set_pending_question("How many users?".into());
        session.record_answer("about a thousand".into());

        assert_eq!(session.round, 1);
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.answers[0].question, "How many users?");
        assert_eq!(session.answers[0].answer, "about a thousand");
    }

    #[test]
    fn test_progress_climbs_then_caps_at_ninety() {
        let mut session = session();
        let mut seen = Vec::new();

        for round in 0..INTERVIEW_ROUNDS {
            seen.push(session.progress());
            session.set_pending_question(format!("question {round}"));
            session.record_answer(format!("answer {round}"));
        }

        assert_eq!(seen, vec![20, 40, 60, 80, 90]);

        session.mark_complete();
        assert_eq!(session.progress(), 100);
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut session = session();
        let mut last = 0;

        for round in 0..INTERVIEW_ROUNDS {
            let progress = session.progress();
            assert!(progress >= last);
            last = progress;
            session.set_pending_question(format!("question {round}"));
            session.record_answer(format!("answer {round}"));
        }
        session.mark_complete();
        assert!(session.progress() >= last);
    }

    #[test]
    fn test_rounds_finished_after_five_answers() {
        let mut session = session();
        for round in 0..INTERVIEW_ROUNDS {
            assert!(!session.rounds_finished());
            session.set_pending_question(format!("question {round}"));
            session.record_answer(format!("answer {round}"));
        }
        assert!(session.rounds_finished());
    }
}
