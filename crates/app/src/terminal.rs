//! Line-oriented front end: one command per line on stdin.

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use assessment_core::model::AnswerValue;
use services::{Advance, AssessmentSession, SessionCursor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    List,
    /// Zero-based category index; typed one-based.
    Select(usize),
    Next,
    Answer(AnswerValue),
    Submit,
    Skip,
    Prev,
    Back,
    Logout,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "empty input"),
            InputError::Unknown(word) => write!(f, "unknown command: {word} (try `help`)"),
            InputError::MissingArgument(cmd) => write!(f, "{cmd} requires a value"),
            InputError::InvalidNumber(raw) => write!(f, "not a category number: {raw}"),
        }
    }
}

/// Parse one line. A bare number answers the current question.
pub(crate) fn parse_input(line: &str) -> Result<Input, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(InputError::Empty);
    };
    let arg = words.next();

    match head.to_ascii_lowercase().as_str() {
        "list" | "status" | "ls" => Ok(Input::List),
        "select" | "open" => {
            let raw = arg.ok_or(InputError::MissingArgument("select"))?;
            let number: usize = raw
                .parse()
                .map_err(|_| InputError::InvalidNumber(raw.to_string()))?;
            number
                .checked_sub(1)
                .map(Input::Select)
                .ok_or_else(|| InputError::InvalidNumber(raw.to_string()))
        }
        "next" | "start" => Ok(Input::Next),
        "answer" | "a" => arg
            .map(|raw| Input::Answer(AnswerValue::from(raw)))
            .ok_or(InputError::MissingArgument("answer")),
        "submit" | "n" => Ok(Input::Submit),
        "skip" | "s" => Ok(Input::Skip),
        "prev" | "p" => Ok(Input::Prev),
        "back" | "b" => Ok(Input::Back),
        "logout" | "quit" | "exit" | "q" => Ok(Input::Logout),
        "help" | "?" => Ok(Input::Help),
        _ if head.chars().all(|c| c.is_ascii_digit()) => Ok(Input::Answer(AnswerValue::from(head))),
        _ => Err(InputError::Unknown(head.to_string())),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  list              show categories and progress");
    println!("  select <n>        open category n");
    println!("  next              open the first incomplete category");
    println!("  <value>           answer the current question and move on");
    println!("  answer <value>    same as <value>");
    println!("  submit | skip     move on (submit requires an answer)");
    println!("  prev | back       previous question / category list");
    println!("  logout            save and quit");
}

fn render_selection(session: &AssessmentSession) {
    println!();
    for (index, (category, progress)) in session
        .catalog()
        .iter()
        .zip(session.categories_progress())
        .enumerate()
    {
        let marker = progress.status.as_str();
        println!(
            "  {}. {:<32} {:>3}/{:<3} {:>5.1}%  [{marker}]",
            index + 1,
            category.name(),
            progress.answered,
            progress.total,
            progress.percent(),
        );
    }
    let overall = session.overall_progress();
    println!(
        "  Overall: {}/{} ({:.1}%)",
        overall.answered,
        overall.total,
        overall.percent()
    );
    if session.all_submitted() {
        println!("  All assessments submitted. Thank you! (`next` to review)");
    } else if session.has_any_progress() {
        println!("  `next` to continue, `select <n>` to pick a category.");
    } else {
        println!("  `next` to start, `select <n>` to pick a category.");
    }
}

fn render_question(session: &AssessmentSession, category: usize, question: usize) {
    let (Some(meta), Some(current)) = (session.current_category(), session.current_question())
    else {
        return;
    };
    let total = session.questions().total(category);

    println!();
    if question == 0 {
        println!("{}", meta.name());
        if let Some(subtitle) = meta.subtitle() {
            println!("  {subtitle}");
        }
        println!("  {}", meta.description());
        for line in meta.instructions() {
            println!("  {line}");
        }
    }
    println!("[{}/{}] {}", question + 1, total, current.prompt);
    let scale = meta
        .scale()
        .iter()
        .map(|option| format!("{}={}", option.value(), option.label()))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {scale}");
    if let Some(answer) = session.current_answer() {
        println!("  current answer: {answer}");
    }
    if session.statuses().is_submitted(meta.key()) {
        println!("  (submitted, read only)");
    }
}

fn render(session: &AssessmentSession) {
    match session.cursor() {
        SessionCursor::CategorySelection => render_selection(session),
        SessionCursor::Answering { category, question } => {
            render_question(session, category, question);
        }
        SessionCursor::Closed => println!("Session closed."),
    }
}

fn report_advance(advance: Advance) {
    match advance {
        Advance::Unanswered => println!("Answer this question first, or `skip` it."),
        Advance::NextQuestion(_) => {}
        Advance::Submitted { .. } => println!("Category submitted."),
        Advance::ReviewFinished { .. } => println!("End of submitted category."),
    }
}

async fn apply(session: &mut AssessmentSession, input: Input) -> Result<(), services::SessionError> {
    match input {
        Input::List | Input::Help => {}
        Input::Select(index) => {
            session.select_category(index).await?;
        }
        Input::Next => {
            session.start_next_category().await?;
        }
        Input::Answer(value) => {
            let rejected = session
                .current_category()
                .filter(|meta| !meta.allows(&value))
                .map(|meta| {
                    meta.allowed_values()
                        .map(AnswerValue::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                });
            if let Some(allowed) = rejected {
                println!("Please answer one of: {allowed}");
                return Ok(());
            }
            session.answer(value)?;
            report_advance(session.submit_answer().await?);
        }
        Input::Submit => report_advance(session.submit_answer().await?),
        Input::Skip => report_advance(session.skip().await?),
        Input::Prev => {
            session.previous().await?;
        }
        Input::Back => session.back_to_category_selection().await?,
        Input::Logout => session.logout().await,
    }
    Ok(())
}

/// Run commands from `input` until logout or end of input. End of input
/// logs out as well.
pub(crate) async fn drive<R>(session: &mut AssessmentSession, input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    render(session);

    while let Some(line) = lines.next_line().await? {
        let command = match parse_input(&line) {
            Ok(command) => command,
            Err(InputError::Empty) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        if command == Input::Help {
            print_help();
            continue;
        }

        if let Err(err) = apply(session, command).await {
            println!("error: {err}");
        }
        render(session);

        if session.is_closed() {
            return Ok(());
        }
    }

    session.logout().await;
    Ok(())
}
