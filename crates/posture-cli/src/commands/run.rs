//! The `posture run` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use posture_core::error::{FormError, WizardError};
use posture_core::model::Pillar;
use posture_core::report::AssessmentReport;
use posture_core::sanitize::WelcomeForm;
use posture_core::{Step, Submitter, Wizard, WizardConfig};
use posture_submit::{create_submitter, load_config_from};

use crate::console::{Console, Input, HELP};

/// Options for `posture run`.
pub struct RunOptions {
    pub catalog: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub provider: Option<String>,
}

/// Welcome-form values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct WelcomeFlags {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub provider: Option<String>,
}

impl WelcomeFlags {
    /// With any flag present the optional fields are not prompted for.
    fn any(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.company.is_some() || self.provider.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn execute(options: RunOptions) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;
    let catalog = super::load_catalog(options.catalog.as_deref(), &config)?;
    let store = super::open_store(&config, catalog.clone());
    let mut wizard = Wizard::new(
        catalog,
        store,
        WizardConfig {
            submission_timeout: config.submission_timeout(),
        },
    );
    let submitter = create_submitter(&config.submitter)?;
    tracing::debug!(
        catalog = wizard.catalog().id(),
        storage = %config.storage_dir.display(),
        submitter = submitter.name(),
        "session configured"
    );
    let flags = WelcomeFlags {
        name: options.name,
        email: options.email,
        company: options.company,
        provider: options.provider,
    };

    let stdin = std::io::stdin();
    let mut console = Console::new(stdin.lock(), std::io::stdout());
    let Some(report) = run_session(&mut wizard, submitter.as_ref(), &mut console, &flags).await?
    else {
        return Ok(());
    };

    let output = options.output.unwrap_or(config.output_dir);
    let written = super::write_reports(&report, &output, &options.format)?;

    println!("\n{}", super::summary_table(&report));
    println!(
        "Overall maturity: {}% ({})",
        report.percent(),
        report.band.label()
    );
    for path in written {
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

/// Drive one session to `Results` or until the user stops.
///
/// Returns the results report, or `None` when the session ended early with
/// its progress left in the store.
pub(crate) async fn run_session<R: BufRead, W: Write>(
    wizard: &mut Wizard,
    submitter: &dyn Submitter,
    console: &mut Console<R, W>,
    flags: &WelcomeFlags,
) -> Result<Option<AssessmentReport>> {
    if wizard.check_recovery() && !recover(wizard, console)? {
        return Ok(None);
    }

    loop {
        let flow = match wizard.step() {
            Step::Welcome => welcome(wizard, console, flags)?,
            Step::Assessment => assess(wizard, submitter, console).await?,
            Step::Results => return Ok(wizard.report()),
        };
        if flow == Flow::Quit {
            return Ok(None);
        }
    }
}

/// Ask whether to restore saved progress. `false` when input ran out.
fn recover<R: BufRead, W: Write>(wizard: &mut Wizard, console: &mut Console<R, W>) -> Result<bool> {
    if let Some(snapshot) = wizard.pending_recovery() {
        let line = format!(
            "Saved progress found for {}: {}/{} questions answered, saved {}.",
            snapshot.client_info.company,
            snapshot.responses.len(),
            wizard.catalog().question_count(),
            snapshot.saved_at.format("%Y-%m-%d %H:%M UTC")
        );
        console.say(line)?;
    }

    loop {
        let Some(answer) = console.prompt("[r]estore or [d]iscard? ")? else {
            return Ok(false);
        };
        match answer.trim().to_lowercase().as_str() {
            "r" | "restore" => {
                wizard.restore()?;
                console.say("Progress restored.")?;
                return Ok(true);
            }
            "d" | "discard" => {
                wizard.discard()?;
                console.say("Saved progress discarded.")?;
                return Ok(true);
            }
            _ => console.say("Please answer r or d.")?,
        }
    }
}

fn welcome<R: BufRead, W: Write>(
    wizard: &mut Wizard,
    console: &mut Console<R, W>,
    flags: &WelcomeFlags,
) -> Result<Flow> {
    let mut name = flags.name.clone();
    let mut company = flags.company.clone();
    let (mut email, mut provider) = if flags.any() {
        (
            Some(flags.email.clone().unwrap_or_default()),
            Some(flags.provider.clone().unwrap_or_default()),
        )
    } else {
        console.say("Welcome. Who is being assessed?")?;
        (None, None)
    };

    loop {
        for (slot, label) in [
            (&mut name, "Name: "),
            (&mut email, "Email (optional): "),
            (&mut company, "Company: "),
            (&mut provider, "Cloud provider [gcp/aws/azure/hybrid] (default gcp): "),
        ] {
            if slot.is_none() {
                match console.prompt(label)? {
                    Some(value) => *slot = Some(value),
                    None => return Ok(Flow::Quit),
                }
            }
        }

        let form = WelcomeForm {
            name: name.clone().unwrap_or_default(),
            email: email.clone().unwrap_or_default(),
            company: company.clone().unwrap_or_default(),
            cloud_provider: provider.clone().unwrap_or_default(),
        };
        match form.accept() {
            Ok(info) => {
                wizard.set_client_info(info)?;
                wizard.start_assessment()?;
                let catalog = wizard.catalog();
                let intro = format!(
                    "\n{}: {} pillars, {} questions. Answer with 1-{}, :help for commands.",
                    catalog.name(),
                    catalog.pillar_count(),
                    catalog.question_count(),
                    catalog.max_level()
                );
                console.say(intro)?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                console.say(format!("  {e}"))?;
                match e {
                    FormError::MissingName => name = None,
                    FormError::MissingCompany => company = None,
                    FormError::InvalidEmail(_) => email = None,
                    FormError::UnknownProvider(_) => provider = None,
                }
            }
        }
    }
}

async fn assess<R: BufRead, W: Write>(
    wizard: &mut Wizard,
    submitter: &dyn Submitter,
    console: &mut Console<R, W>,
) -> Result<Flow> {
    let mut shown = None;
    // Set when the last open question of a pillar was just answered.
    let mut advance = false;

    while wizard.step() == Step::Assessment {
        let index = wizard.state().current_pillar_index;
        if shown != Some(index) {
            let header = format!(
                "\n[{}/{}] {} ({:.0}%)",
                index + 1,
                wizard.catalog().pillar_count(),
                wizard.current_pillar().name,
                wizard.progress_percent()
            );
            console.say(header)?;
            shown = Some(index);
        }

        let pillar = wizard.current_pillar().clone();
        let pending = pillar
            .questions
            .iter()
            .enumerate()
            .find(|(_, q)| !wizard.state().responses.contains(&q.id));

        let line = match pending {
            Some((n, question)) => {
                console.say(format!("\n  Q{}. {}", n + 1, question.text))?;
                console.say(level_menu(wizard))?;
                console.prompt("> ")?
            }
            None if advance => {
                advance = false;
                if wizard.is_last_pillar() {
                    submit(wizard, submitter, console).await?;
                } else {
                    wizard.next_pillar()?;
                }
                continue;
            }
            None => {
                console.say(review(&pillar, wizard))?;
                let action = if wizard.is_last_pillar() {
                    "submit"
                } else {
                    "continue"
                };
                console.prompt(&format!(
                    "Pillar complete. Enter to {action}, N L to change an answer: "
                ))?
            }
        };

        let Some(line) = line else {
            return quit(wizard, console);
        };
        let input = match Input::parse(&line) {
            Ok(input) => input,
            Err(message) => {
                console.say(format!("  {message}"))?;
                continue;
            }
        };

        match input {
            Input::Empty => advance = pending.is_none(),
            Input::Level(level) => match pending {
                Some((_, question)) => {
                    if answer(wizard, console, &question.id, level)? {
                        advance = wizard.completion().is_pillar_complete(index);
                    }
                }
                None => console.say("  Every question here is answered. Use N L to change one.")?,
            },
            Input::Change { question, level } => match pillar.questions.get(question - 1) {
                Some(q) => {
                    answer(wizard, console, &q.id, level)?;
                }
                None => console.say(format!(
                    "  This pillar has {} questions.",
                    pillar.questions.len()
                ))?,
            },
            Input::Back => show_error(console, wizard.prev_pillar())?,
            Input::Next => show_error(console, wizard.next_pillar())?,
            Input::Goto(n) => goto(wizard, console, n)?,
            Input::Finish => submit(wizard, submitter, console).await?,
            Input::Quit => return quit(wizard, console),
            Input::Reset => {
                wizard.reset();
                console.say("Session reset. Starting over.")?;
            }
            Input::Help => console.say(HELP)?,
        }
    }

    Ok(Flow::Continue)
}

/// Record an answer, reporting a rejected level. `true` when it was stored.
fn answer<R: BufRead, W: Write>(
    wizard: &mut Wizard,
    console: &mut Console<R, W>,
    question_id: &str,
    level: u8,
) -> Result<bool> {
    match wizard.record_response(question_id, level) {
        Ok(()) => Ok(true),
        Err(e @ WizardError::InvalidLevel { .. }) => {
            console.say(format!("  {e}"))?;
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Submit; validation and delivery failures are shown and leave the
/// session in place for another try.
async fn submit<R: BufRead, W: Write>(
    wizard: &mut Wizard,
    submitter: &dyn Submitter,
    console: &mut Console<R, W>,
) -> Result<()> {
    console.say(format!("\nSubmitting via {}...", submitter.name()))?;
    match wizard.finish(submitter).await {
        Ok(receipt) => {
            let reference = receipt
                .reference
                .map(|r| format!(" (reference {r})"))
                .unwrap_or_default();
            console.say(format!("Assessment submitted{reference}."))?;
        }
        Err(WizardError::Validation(e)) => {
            console.say(format!("  {e}"))?;
            if let Some(first) = wizard.completion().first_incomplete_pillar() {
                let hint = format!(
                    "  First incomplete pillar: {} {}. Use :goto {}.",
                    first + 1,
                    wizard.catalog().pillars()[first].name,
                    first + 1
                );
                console.say(hint)?;
            }
        }
        Err(WizardError::Submission(_)) => {
            let message = wizard
                .state()
                .validation_error
                .clone()
                .unwrap_or_default();
            console.say(format!("  {message}"))?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn quit<R: BufRead, W: Write>(wizard: &Wizard, console: &mut Console<R, W>) -> Result<Flow> {
    let answered = wizard.completion().answered_count();
    if answered == 0 {
        console.say("Nothing answered yet, nothing to resume.")?;
    } else {
        console.say(format!(
            "Progress saved ({answered}/{} answered). Run `posture run` again to resume.",
            wizard.catalog().question_count()
        ))?;
    }
    Ok(Flow::Quit)
}

fn show_error<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    result: std::result::Result<(), WizardError>,
) -> Result<()> {
    if let Err(e) = result {
        console.say(format!("  {e}"))?;
    }
    Ok(())
}

/// Jump to 1-based pillar `n`, reporting locks in the same numbering.
fn goto<R: BufRead, W: Write>(
    wizard: &mut Wizard,
    console: &mut Console<R, W>,
    n: usize,
) -> Result<()> {
    match wizard.navigate_to_pillar(n - 1) {
        Err(WizardError::PillarLocked { gate, .. }) => console.say(format!(
            "  Pillar {n} is locked until pillar {} ({}) is complete.",
            gate + 1,
            wizard.catalog().pillars()[gate].name
        )),
        Err(WizardError::PillarOutOfRange { count, .. }) => {
            console.say(format!("  There are only {count} pillars."))
        }
        result => show_error(console, result),
    }
}

fn level_menu(wizard: &Wizard) -> String {
    wizard
        .catalog()
        .levels()
        .iter()
        .map(|l| format!("     {}) {}: {}", l.value, l.label, l.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn review(pillar: &Pillar, wizard: &Wizard) -> String {
    let responses = &wizard.state().responses;
    pillar
        .questions
        .iter()
        .enumerate()
        .map(|(n, q)| {
            let level = responses
                .get(&q.id)
                .and_then(|v| wizard.catalog().level(v))
                .map(|l| format!("{} {}", l.value, l.label))
                .unwrap_or_else(|| "-".into());
            format!("  {}. [{level}] {}", n + 1, q.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
