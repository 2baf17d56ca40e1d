use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use quiz_core::model::{LoadedQuestion, QuestionDraft};
use storage::repository::{QuestionIndexEntry, QuestionIndexRepository};

use crate::error::QuestionBankError;

//
// ─── LOAD MODE ─────────────────────────────────────────────────────────────────
//

/// Order in which loaded questions are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Uniform shuffle of the whole concatenation.
    #[default]
    Random,
    /// File order, then within-file order.
    Ordered,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Random => f.write_str("random"),
            LoadMode::Ordered => f.write_str("ordered"),
        }
    }
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(LoadMode::Random),
            "ordered" => Ok(LoadMode::Ordered),
            other => Err(format!("unknown load mode: {other} (expected random or ordered)")),
        }
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Reads question files from one directory and records their provenance.
#[derive(Clone)]
pub struct QuestionBank {
    dir: PathBuf,
    index: Arc<dyn QuestionIndexRepository>,
    seed: Option<u64>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, index: Arc<dyn QuestionIndexRepository>) -> Self {
        Self {
            dir: dir.into(),
            index,
            seed: None,
        }
    }

    /// Make `Random` loads reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Regular files in the questions directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Directory` if the directory cannot be read.
    pub fn available_files(&self) -> Result<Vec<String>, QuestionBankError> {
        let dir_err = |source: io::Error| QuestionBankError::Directory {
            dir: self.dir.display().to_string(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(dir_err)? {
            let entry = entry.map_err(dir_err)?;
            if !entry.file_type().map_err(dir_err)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                files.push(name.to_owned());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parse one question file, tagging every question with `file_name`.
    ///
    /// # Errors
    ///
    /// Returns a `QuestionBankError` naming the file if it is missing,
    /// unreadable, malformed, holds an invalid question, or repeats an id.
    pub fn read_file(&self, file_name: &str) -> Result<Vec<LoadedQuestion>, QuestionBankError> {
        let path = self.resolve(file_name)?;
        let raw = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                QuestionBankError::Missing {
                    file: file_name.to_owned(),
                }
            } else {
                QuestionBankError::Unreadable {
                    file: file_name.to_owned(),
                    source,
                }
            }
        })?;
        parse_questions(file_name, &raw)
    }

    /// Load `files` in `mode` and register their provenance.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` for unusable files (nothing is registered
    /// then) or when the provenance batch cannot be written.
    pub async fn load(
        &self,
        files: &[String],
        mode: LoadMode,
    ) -> Result<Vec<LoadedQuestion>, QuestionBankError> {
        let questions = match self.seed {
            Some(seed) => self.assemble(files, mode, &mut StdRng::seed_from_u64(seed))?,
            None => self.assemble(files, mode, &mut rand::rng())?,
        };
        self.register(&questions).await?;
        Ok(questions)
    }

    /// Like [`QuestionBank::load`], shuffling with the caller's generator.
    ///
    /// # Errors
    ///
    /// Same as [`QuestionBank::load`].
    pub async fn load_with_rng<R: Rng + ?Sized>(
        &self,
        files: &[String],
        mode: LoadMode,
        rng: &mut R,
    ) -> Result<Vec<LoadedQuestion>, QuestionBankError> {
        let questions = self.assemble(files, mode, rng)?;
        self.register(&questions).await?;
        Ok(questions)
    }

    fn assemble<R: Rng + ?Sized>(
        &self,
        files: &[String],
        mode: LoadMode,
        rng: &mut R,
    ) -> Result<Vec<LoadedQuestion>, QuestionBankError> {
        let mut questions = Vec::new();
        for file in files {
            questions.extend(self.read_file(file)?);
        }
        if mode == LoadMode::Random {
            questions.shuffle(rng);
        }
        Ok(questions)
    }

    async fn register(&self, questions: &[LoadedQuestion]) -> Result<(), QuestionBankError> {
        let entries: Vec<QuestionIndexEntry> = questions
            .iter()
            .map(|q| QuestionIndexEntry::new(q.id(), q.source_file()))
            .collect();
        let inserted = self.index.register_sources(&entries).await?;
        tracing::info!(
            questions = questions.len(),
            new_sources = inserted,
            "questions loaded"
        );
        Ok(())
    }

    /// File names are plain names inside the questions directory.
    fn resolve(&self, file_name: &str) -> Result<PathBuf, QuestionBankError> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(file_name)),
            _ => Err(QuestionBankError::InvalidFileName {
                file: file_name.to_owned(),
            }),
        }
    }
}

fn parse_questions(file_name: &str, raw: &str) -> Result<Vec<LoadedQuestion>, QuestionBankError> {
    let drafts: Vec<QuestionDraft> =
        serde_json::from_str(raw).map_err(|source| QuestionBankError::Malformed {
            file: file_name.to_owned(),
            source,
        })?;

    let mut seen = BTreeSet::new();
    let mut questions = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if !seen.insert(draft.id) {
            return Err(QuestionBankError::DuplicateId {
                file: file_name.to_owned(),
                id: draft.id,
            });
        }
        let question = draft
            .validate()
            .map_err(|source| QuestionBankError::InvalidQuestion {
                file: file_name.to_owned(),
                source,
            })?;
        questions.push(LoadedQuestion::new(question, file_name));
    }
    tracing::debug!(file = file_name, count = questions.len(), "parsed question file");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use quiz_core::model::QuestionId;
    use storage::repository::InMemoryRepository;

    const TWO: &str = r#"[
        {"id": 1, "pregunta": "2+2?", "respuestas": ["3", "4"], "respuestas_correctas": ["4"]},
        {"id": 2, "pregunta": "Primes?", "respuestas": ["2", "4", "5"],
         "respuestas_correctas": ["2", "5"], "explicacion": "4 = 2*2"}
    ]"#;

    #[test]
    fn parses_question_file_shape() {
        let loaded = parse_questions("math.json", TWO).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id(), QuestionId::new(1));
        assert_eq!(loaded[1].source_file(), "math.json");
        assert!(loaded[1].question().is_multi_select());
        assert_eq!(loaded[1].question().explanation(), Some("4 = 2*2"));
    }

    #[test]
    fn missing_field_is_a_data_error_naming_the_file() {
        let raw = r#"[{"id": 1, "respuestas": ["a"], "respuestas_correctas": ["a"]}]"#;
        let err = parse_questions("broken.json", raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataError);
        assert_eq!(err.file(), Some("broken.json"));
    }

    #[test]
    fn non_array_file_is_malformed() {
        let err = parse_questions("obj.json", r#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, QuestionBankError::Malformed { .. }));
    }

    #[test]
    fn unknown_correct_option_is_rejected() {
        let raw = r#"[
            {"id": 1, "pregunta": "?", "respuestas": ["a"], "respuestas_correctas": ["b"]}
        ]"#;
        let err = parse_questions("bad.json", raw).unwrap_err();
        assert!(matches!(err, QuestionBankError::InvalidQuestion { .. }));
    }

    #[test]
    fn duplicate_ids_in_one_file_are_rejected() {
        let raw = r#"[
            {"id": 7, "pregunta": "a", "respuestas": ["x"], "respuestas_correctas": ["x"]},
            {"id": 7, "pregunta": "b", "respuestas": ["y"], "respuestas_correctas": ["y"]}
        ]"#;
        let err = parse_questions("dup.json", raw).unwrap_err();
        let QuestionBankError::DuplicateId { file, id } = err else {
            panic!("expected a duplicate id error, got {err:?}");
        };
        assert_eq!(file, "dup.json");
        assert_eq!(id, QuestionId::new(7));
    }

    #[test]
    fn path_like_file_names_are_rejected() {
        let bank = QuestionBank::new("/tmp", Arc::new(InMemoryRepository::new()));
        for name in ["../secrets.json", "a/b.json", "", "/etc/passwd"] {
            let err = bank.read_file(name).unwrap_err();
            assert!(matches!(err, QuestionBankError::InvalidFileName { .. }), "{name}");
        }
    }

    #[test]
    fn load_mode_parses_case_insensitively() {
        assert_eq!("Ordered".parse::<LoadMode>().unwrap(), LoadMode::Ordered);
        assert_eq!(" random ".parse::<LoadMode>().unwrap(), LoadMode::Random);
        assert!("sorted".parse::<LoadMode>().is_err());
        assert_eq!(LoadMode::Ordered.to_string(), "ordered");
    }
}
