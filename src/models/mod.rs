pub mod plan;
pub mod question;
pub mod subtopic;
pub mod syllabus;

pub use plan::{PlanStatus, PlannedQuestion, QuestionPlan};
pub use question::{Question, QuestionChoice, QuestionMetadata, QuestionSolution, QuestionsResponse};
pub use subtopic::{Subtopic, SubtopicsResponse};
pub use syllabus::{SyllabusElement, SyllabusTopic};
