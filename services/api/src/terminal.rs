use crate::infra::{build_generator, load_slider_assessment, parse_inventory};
use carecheck::collaborators::Responder;
use carecheck::config::AppConfig;
use carecheck::error::AppError;
use carecheck::screening::{
    classify, crisis_protocol, AssessmentRun, KeywordCounts, Rejection, ScreeningEvent,
    ScreeningMachine, SliderInventory, Step, StepView, SymptomSignal, TestId, TestSelection,
    Transition, SLIDER_DEFAULT, SLIDER_MAX,
};
use carecheck::telemetry;
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

#[derive(Args, Debug, Default)]
pub(crate) struct ScreenArgs {
    /// Directory the exported report is written to. Without it the report is only printed.
    #[arg(long)]
    pub(crate) report_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Message to classify
    #[arg(required = true, num_args = 1..)]
    pub(crate) text: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Inventory to answer: stress or depression
    #[arg(long, value_parser = parse_inventory)]
    pub(crate) kind: SliderInventory,
    /// Ten comma-separated answers from 0 (never) to 4 (always). Omit to be
    /// asked each question in turn.
    #[arg(long, value_delimiter = ',')]
    pub(crate) answers: Vec<u8>,
}

pub(crate) async fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let responder = Responder::new(
        build_generator(&config.responder),
        config.responder.timeout,
    );
    let machine = ScreeningMachine::new(responder);

    let mut run = AssessmentRun::new();
    let mut pending = Some(ScreeningEvent::Start);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let Some(event) = pending.take() {
            match machine.handle(run, event).await {
                Ok(Transition { run: next, view }) => {
                    run = next;
                    println!("\n{}", render(&view));
                    if let StepView::Report { file_name, content } = &view {
                        save_report(args.report_dir.as_deref(), file_name, content)?;
                    }
                    if matches!(view, StepView::Welcome { .. }) {
                        pending = Some(ScreeningEvent::Start);
                        continue;
                    }
                }
                Err(Rejection {
                    run: previous,
                    error,
                }) => {
                    run = *previous;
                    println!("  {error}");
                }
            }
        }

        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if matches!(input.to_ascii_lowercase().as_str(), "q" | "quit" | "exit") {
            break;
        }

        pending = event_for(run.step, input);
        if pending.is_none() && !input.is_empty() {
            println!("  {}", hint(run.step));
        }
    }

    Ok(())
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let text = args.text.join(" ");
    let counts = KeywordCounts::scan(&text);

    match classify(&text) {
        SymptomSignal::Crisis => {
            let protocol = crisis_protocol();
            println!("Crisis language detected");
            println!("{}", protocol.headline);
            for contact in protocol.contacts {
                println!("  - {}: {}", contact.label, contact.destination);
            }
        }
        SymptomSignal::Test(test) => {
            println!("Suggested screening: {} ({})", test.display_name(), test);
            println!(
                "  keyword hits - depression {} | anxiety {} | stress {}",
                counts.depression, counts.anxiety, counts.stress
            );
        }
    }
    Ok(())
}

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let assessment = load_slider_assessment(&config.predictor)?;

    println!("{}", args.kind.title());
    let answers = if args.answers.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        ask_slider_answers(args.kind, &mut lines).await?
    } else {
        args.answers
    };
    let outcome = assessment.assess(args.kind, &answers)?;

    println!("{}", outcome.headline);
    println!("{}", outcome.advice);
    println!("\nSummary");
    println!("{}", outcome.summary);
    Ok(())
}

/// Ask every slider question in order. An empty line keeps the default.
pub(crate) async fn ask_slider_answers<R>(
    kind: SliderInventory,
    lines: &mut Lines<R>,
) -> Result<Vec<u8>, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let form = kind.form();
    println!(
        "Answer from {} ({}) to {} ({}). Press enter to keep {}.",
        form.min, form.scale[0], form.max, form.scale[1], form.default
    );

    let mut answers = Vec::with_capacity(form.questions.len());
    for (index, question) in form.questions.iter().enumerate() {
        loop {
            print!("{}. {question} [{}] > ", index + 1, form.default);
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed before every question was answered",
                )
                .into());
            };
            match slider_answer(&line) {
                Some(value) => {
                    answers.push(value);
                    break;
                }
                None => println!("  Enter a whole number from {} to {}.", form.min, form.max),
            }
        }
    }
    Ok(answers)
}

fn slider_answer(input: &str) -> Option<u8> {
    let input = input.trim();
    if input.is_empty() {
        return Some(SLIDER_DEFAULT);
    }
    input.parse::<u8>().ok().filter(|value| *value <= SLIDER_MAX)
}

/// Map a typed line to the event it stands for at the given step.
pub(crate) fn event_for(step: Step, input: &str) -> Option<ScreeningEvent> {
    let lowered = input.to_ascii_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if matches!(lowered.as_str(), "reset" | "new") {
        return Some(ScreeningEvent::Reset);
    }

    match step {
        Step::Welcome => Some(ScreeningEvent::Start),
        Step::Selection => Some(match lowered.as_str() {
            "1" => ScreeningEvent::select(TestSelection::Single(TestId::Phq9)),
            "2" => ScreeningEvent::select(TestSelection::Single(TestId::Gad7)),
            "3" => ScreeningEvent::select(TestSelection::Single(TestId::Dass)),
            "4" => ScreeningEvent::select(TestSelection::AllThree),
            _ if input.parse::<TestSelection>().is_ok() => ScreeningEvent::SelectTest {
                test: input.to_string(),
            },
            _ => ScreeningEvent::free_text(input),
        }),
        Step::Screening => Some(ScreeningEvent::Answer {
            choice: input.to_string(),
        }),
        Step::Results => match lowered.as_str() {
            "r" | "report" => Some(ScreeningEvent::ExportReport),
            "d" | "dashboard" => Some(ScreeningEvent::OpenDashboard),
            _ => None,
        },
        Step::Dashboard | Step::Crisis => None,
    }
}

fn hint(step: Step) -> &'static str {
    match step {
        Step::Results => "Type 'report', 'dashboard', or 'new' to start over.",
        _ => "Type 'new' to start over or 'quit' to leave.",
    }
}

pub(crate) fn render(view: &StepView) -> String {
    let mut lines = Vec::new();
    match view {
        StepView::Welcome { message } => lines.push(message.to_string()),
        StepView::Greeting { message, options } => {
            lines.push(message.to_string());
            lines.push(String::new());
            for (index, option) in options.iter().enumerate() {
                lines.push(format!("  {}. {}", index + 1, option.label));
            }
            lines.push("Or just tell me how you've been feeling.".to_string());
        }
        StepView::Question {
            display_name,
            number,
            total,
            prompt,
            scale,
            preface,
            ..
        } => {
            if let Some(preface) = preface {
                lines.push(preface.clone());
                lines.push(String::new());
            }
            lines.push(format!("{display_name} - Question {number}/{total}"));
            lines.push(prompt.to_string());
            for (value, label) in scale.iter().enumerate() {
                lines.push(format!("  {value}. {label}"));
            }
        }
        StepView::Results {
            result,
            summary,
            guidance,
            ..
        } => {
            lines.push(format!("{}: {summary}", result.test.display_name()));
            lines.extend(guidance.iter().map(|line| format!("  - {line}")));
            lines.push(String::new());
            lines.push(hint(Step::Results).to_string());
        }
        StepView::Crisis {
            preface,
            result,
            guidance,
            protocol,
            ..
        } => {
            if let Some(preface) = preface {
                lines.push(preface.clone());
                lines.push(String::new());
            }
            lines.push(protocol.headline.to_string());
            if let Some(result) = result {
                lines.push(format!("{}: {result}", result.test.display_name()));
            }
            lines.extend(guidance.iter().map(|line| format!("  - {line}")));
            for contact in protocol.contacts {
                lines.push(format!("  {}: {}", contact.label, contact.destination));
            }
            lines.push(protocol.confidentiality_notice.to_string());
        }
        StepView::Dashboard { entries } => {
            lines.push("Assessment dashboard".to_string());
            for entry in entries {
                lines.push(format!("  {}: {}", entry.display_name, entry.summary));
            }
        }
        StepView::Report { content, .. } => lines.push(content.clone()),
    }
    lines.join("\n")
}

fn save_report(dir: Option<&Path>, file_name: &str, content: &str) -> Result<(), AppError> {
    let Some(dir) = dir else {
        return Ok(());
    };
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, content)?;
    println!("Report saved to {}", path.display());
    Ok(())
}
