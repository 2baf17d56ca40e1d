//! Line-oriented front end: password gate, user selection and the quiz loop.

use std::io::{self, BufRead, Write};

use quiz_core::model::{AnswerSet, Question, UserId};
use quiz_core::stats::Accuracy;
use services::{ActiveTest, AppServices, Authenticator, LoadMode, SubmissionFeedback};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Prompt/response over any reader and writer.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    /// Trimmed reply, `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }
}

#[derive(Debug)]
pub struct AccessDenied;

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("incorrect master password")
    }
}

impl std::error::Error for AccessDenied {}

/// Check `preset` (from the environment) or ask for the master password.
pub fn unlock<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    auth: &dyn Authenticator,
    preset: Option<String>,
) -> AppResult<()> {
    let secret = match preset {
        Some(secret) => secret,
        None => term.ask("Master password: ")?.unwrap_or_default(),
    };
    if auth.authenticate(&secret) {
        Ok(())
    } else {
        Err(AccessDenied.into())
    }
}

/// Use `preset` if given, otherwise offer the registered users or a new name.
pub async fn choose_user<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    app: &AppServices,
    preset: Option<String>,
) -> AppResult<Option<(String, UserId)>> {
    let users = app.users();
    let name = match preset {
        Some(name) => name,
        None => {
            let known = users.list_users().await?;
            if !known.is_empty() {
                term.say("Registered users:")?;
                for (i, name) in known.iter().enumerate() {
                    term.say(format_args!("  {}. {name}", i + 1))?;
                }
            }
            loop {
                let Some(reply) = term.ask("User (number or new name): ")? else {
                    return Ok(None);
                };
                if reply.is_empty() {
                    continue;
                }
                // Numbers always pick from the list; they are never new names.
                match reply.parse::<usize>() {
                    Ok(n) if (1..=known.len()).contains(&n) => break known[n - 1].clone(),
                    Ok(_) => term.say("No user with that number.")?,
                    Err(_) => break reply,
                }
            }
        }
    };
    let id = users.register(&name).await?;
    Ok(Some((name.trim().to_owned(), id)))
}

/// Turn `"1,3"` into the options at those 1-based positions.
///
/// Single-answer questions accept exactly one number.
pub fn parse_selection(question: &Question, reply: &str) -> Option<AnswerSet> {
    let mut picked = Vec::new();
    for part in reply.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part.parse().ok()?;
        let option = question.options().get(n.checked_sub(1)?)?;
        picked.push(option.as_str());
    }
    if picked.is_empty() || (!question.is_multi_select() && picked.len() != 1) {
        return None;
    }
    Some(picked.into_iter().collect())
}

fn show_question<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    test: &ActiveTest,
    question: &Question,
) -> io::Result<()> {
    let session = test.session();
    term.say("")?;
    term.say(format_args!(
        "Question {} of {}: {}",
        session.current_index() + 1,
        session.total(),
        question.prompt()
    ))?;
    for (i, option) in question.options().iter().enumerate() {
        term.say(format_args!("  {}. {option}", i + 1))?;
    }
    Ok(())
}

fn show_feedback<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    feedback: &SubmissionFeedback,
) -> io::Result<()> {
    if feedback.correct {
        term.say("Correct")?;
    } else {
        term.say(format_args!(
            "Incorrect: {}",
            feedback.correct_options.join(", ")
        ))?;
    }
    if let Some(explanation) = &feedback.explanation {
        term.say(explanation)?;
    }
    Ok(())
}

/// Running totals line shown after a test.
pub fn accuracy_line(accuracy: Accuracy) -> String {
    match accuracy {
        Accuracy::NoData => "No responses yet.".to_owned(),
        Accuracy::Scored(score) => format!(
            "Correct: {} / {} ({:.1}% accuracy)",
            score.correct,
            score.total,
            score.percentage().unwrap_or_default()
        ),
    }
}

/// Run one test for `user_id` until it completes or the user quits.
pub async fn run_quiz<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    app: &AppServices,
    user_id: UserId,
    files: &[String],
    mode: LoadMode,
) -> AppResult<()> {
    let session_loop = app.session_loop();
    let mut test = session_loop.start_test(user_id, files, mode).await?;
    if test.session().is_complete() {
        term.say("No questions in the selected files.")?;
    }

    'questions: while !test.session().is_complete() {
        let question = session_loop.current(&test)?.clone();
        show_question(term, &test, &question)?;

        let hint = if question.is_multi_select() {
            "Answers (comma-separated numbers, q to quit): "
        } else {
            "Answer (number, q to quit): "
        };
        let answers = loop {
            let Some(reply) = term.ask(hint)? else {
                break 'questions;
            };
            if reply.eq_ignore_ascii_case("q") {
                break 'questions;
            }
            match parse_selection(&question, &reply) {
                Some(answers) => break answers,
                None => term.say("Please pick from the listed numbers.")?,
            }
        };

        let feedback = session_loop.submit(&mut test, &answers).await?;
        show_feedback(term, &feedback)?;

        let prompt = if feedback.is_last {
            "Press Enter to finish: "
        } else {
            "Press Enter for the next question (q to quit): "
        };
        let reply = term.ask(prompt)?;
        session_loop.advance(&mut test)?;
        if matches!(reply.as_deref(), None | Some("q" | "Q")) {
            break;
        }
    }

    let progress = test.session().progress();
    tracing::info!(
        user_id = %user_id,
        answered = progress.answered,
        total = progress.total,
        finished = progress.is_complete,
        "quiz closed"
    );

    term.say("")?;
    let accuracy = app.stats().per_user(user_id).await?;
    term.say(accuracy_line(accuracy))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionDraft, QuestionId};
    use quiz_core::time::fixed_clock;
    use services::{AppConfig, MasterPassword};
    use std::io::Cursor;
    use std::sync::Arc;
    use storage::repository::Storage;

    fn question(correct: &[&str]) -> Question {
        QuestionDraft {
            id: QuestionId::new(1),
            prompt: "Pick".into(),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_options: correct.iter().map(|c| (*c).to_owned()).collect(),
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(term: Terminal<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(term.output).unwrap()
    }

    #[test]
    fn selection_maps_numbers_to_options() {
        let single = question(&["b"]);
        assert_eq!(parse_selection(&single, "2"), Some(AnswerSet::single("b")));
        assert_eq!(parse_selection(&single, "1,2"), None);
        assert_eq!(parse_selection(&single, "0"), None);
        assert_eq!(parse_selection(&single, "4"), None);
        assert_eq!(parse_selection(&single, "x"), None);
        assert_eq!(parse_selection(&single, ""), None);

        let multi = question(&["a", "c"]);
        let picked = parse_selection(&multi, "3, 1").unwrap();
        assert!(multi.grade(&picked));
    }

    #[test]
    fn accuracy_line_formats_both_cases() {
        assert_eq!(accuracy_line(Accuracy::NoData), "No responses yet.");
        let scored = Accuracy::from_outcomes([true, true, false]);
        assert_eq!(accuracy_line(scored), "Correct: 2 / 3 (66.7% accuracy)");
    }

    #[test]
    fn wrong_password_is_denied() {
        let gate = MasterPassword::new("letmein");
        let mut term = terminal("nope\n");
        assert!(unlock(&mut term, &gate, None).is_err());
        assert!(unlock(&mut term, &gate, Some("letmein".into())).is_ok());
    }

    #[tokio::test]
    async fn quiz_loop_grades_and_reports_totals() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("q.json"),
            r#"[
                {"id": 1, "pregunta": "2+2?", "respuestas": ["3", "4"],
                 "respuestas_correctas": ["4"], "explicacion": "Basic sum."},
                {"id": 2, "pregunta": "Primes?", "respuestas": ["2", "4", "5"],
                 "respuestas_correctas": ["2", "5"]}
            ]"#,
        )
        .unwrap();
        let app = AppServices::from_storage(
            &Storage::in_memory(),
            fixed_clock(),
            AppConfig {
                questions_dir: dir.path().to_path_buf(),
                seed: None,
            },
            Arc::new(MasterPassword::default()),
        );

        let mut term = terminal("ana\n9\n2\n\n2\n\n");
        let (name, user) = choose_user(&mut term, &app, None).await.unwrap().unwrap();
        assert_eq!(name, "ana");
        run_quiz(
            &mut term,
            &app,
            user,
            &["q.json".to_owned()],
            LoadMode::Ordered,
        )
        .await
        .unwrap();

        let text = output(term);
        assert!(text.contains("Question 1 of 2: 2+2?"));
        assert!(text.contains("Please pick from the listed numbers."));
        assert!(text.contains("Correct\nBasic sum."));
        assert!(text.contains("Incorrect: 2, 5"));
        assert!(text.contains("Correct: 1 / 2 (50.0% accuracy)"));
    }

    #[tokio::test]
    async fn user_prompt_repeats_on_blank_or_unlisted_number() {
        let app = AppServices::from_storage(
            &Storage::in_memory(),
            fixed_clock(),
            AppConfig {
                questions_dir: std::env::temp_dir(),
                seed: None,
            },
            Arc::new(MasterPassword::default()),
        );
        let ana = app.users().register("ana").await.unwrap();

        let mut term = terminal("\n7\n1\n");
        let (name, id) = choose_user(&mut term, &app, None).await.unwrap().unwrap();
        assert_eq!((name.as_str(), id), ("ana", ana));
        assert_eq!(app.users().list_users().await.unwrap(), vec!["ana"]);
        assert!(output(term).contains("No user with that number."));

        let mut term = terminal("\n");
        assert!(choose_user(&mut term, &app, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn quitting_early_keeps_recorded_answers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("q.json"),
            r#"[
                {"id": 1, "pregunta": "A?", "respuestas": ["x", "y"],
                 "respuestas_correctas": ["x"]},
                {"id": 2, "pregunta": "B?", "respuestas": ["x", "y"],
                 "respuestas_correctas": ["y"]}
            ]"#,
        )
        .unwrap();
        let app = AppServices::from_storage(
            &Storage::in_memory(),
            fixed_clock(),
            AppConfig {
                questions_dir: dir.path().to_path_buf(),
                seed: None,
            },
            Arc::new(MasterPassword::default()),
        );
        let user = app.users().register("bo").await.unwrap();

        let mut term = terminal("1\nq\n");
        run_quiz(&mut term, &app, user, &["q.json".to_owned()], LoadMode::Ordered)
            .await
            .unwrap();
        assert!(output(term).contains("Correct: 1 / 1 (100.0% accuracy)"));
    }
}
