#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod error;
pub mod question_bank;
pub mod sessions;
pub mod stats_service;
pub mod user_service;

pub use quiz_core::Clock;

pub use app_services::{AppConfig, AppServices};
pub use auth::{Authenticator, MasterPassword};
pub use error::{
    AppServicesError, ErrorKind, QuestionBankError, SessionError, StatsError, UserServiceError,
};
pub use question_bank::{LoadMode, QuestionBank};
pub use sessions::{ActiveTest, SessionLoopService, SubmissionFeedback};
pub use stats_service::StatsService;
pub use user_service::UserService;
