mod answer;
mod ids;
mod question;
mod session;
mod user;

pub use ids::{ParseIdError, QuestionId, UserId};

pub use answer::{AnswerEvent, AnswerSet};
pub use question::{LoadedQuestion, Question, QuestionDraft, QuestionError};
pub use session::{Session, SessionError, SessionProgress, SessionState, Submission};
pub use user::{User, UserError, UserName};
