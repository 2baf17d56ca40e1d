use std::path::PathBuf;
use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::auth::{Authenticator, MasterPassword};
use crate::error::AppServicesError;
use crate::question_bank::QuestionBank;
use crate::sessions::SessionLoopService;
use crate::stats_service::StatsService;
use crate::user_service::UserService;

/// Where the quiz keeps its data and how it behaves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub questions_dir: PathBuf,
    pub seed: Option<u64>,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    users: Arc<UserService>,
    question_bank: Arc<QuestionBank>,
    session_loop: Arc<SessionLoopService>,
    stats: Arc<StatsService>,
    auth: Arc<dyn Authenticator>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: AppConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            &storage,
            clock,
            config,
            Arc::new(MasterPassword::from_env()),
        ))
    }

    /// Build services over an existing backend.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        config: AppConfig,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        let users = UserService::new(Arc::clone(&storage.users));
        let question_bank = Arc::new(
            QuestionBank::new(config.questions_dir, Arc::clone(&storage.question_index))
                .with_seed(config.seed),
        );
        let session_loop = Arc::new(SessionLoopService::new(
            clock,
            Arc::clone(&question_bank),
            Arc::clone(&storage.answers),
        ));
        let stats = Arc::new(StatsService::new(
            users.clone(),
            Arc::clone(&storage.answers),
        ));

        Self {
            users: Arc::new(users),
            question_bank,
            session_loop,
            stats,
            auth,
        }
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.question_bank)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<dyn Authenticator> {
        Arc::clone(&self.auth)
    }
}
