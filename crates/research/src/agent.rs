//! Report orchestration.
//!
//! ```text
//!   INITIAL ──topic──▶ CLARIFYING ──answers──▶ GENERATING ──▶ INITIAL
//!      ▲                                          │
//!      └──────── failure / stream dropped ────────┘
//! ```
//!
//! Each [`ReportAgent::submit`] returns a stream of [`ReportEvent`]s. The
//! stream owns a [`RunLease`] until it yields its terminal event; until then
//! every other submission is refused.

use crate::citations::{remap_citations, MasterBibliography};
use crate::plan::{Planner, Section};
use crate::writer::{SectionDraft, SectionWriter};
use dossier_core::{AppError, AppResult};
use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where the agent is in the report cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Initial,
    Clarifying,
    Generating,
}

/// One snapshot of a run's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Clarification { questions: String },
    BriefConstructed { brief: String },
    PlanningOutline,
    OutlineReady { titles: Vec<String> },
    SectionStarted { index: usize, total: usize, title: String },
    SectionQueries { queries: Vec<String> },
    /// Cumulative report after a section was appended.
    Progress { report: String },
    /// Final report, bibliography included.
    Completed { report: String },
    Failed { message: String },
}

impl ReportEvent {
    /// Markdown shown to the user for this snapshot.
    pub fn render(&self) -> String {
        match self {
            ReportEvent::Clarification { questions } => format!(
                "To give you the best report, could you answer these questions for me?\n\n{}",
                questions
            ),
            ReportEvent::BriefConstructed { brief } => {
                format!("### Research Brief Constructed\n> {}\n\n---\n", brief)
            }
            ReportEvent::PlanningOutline => "### Generating Report Outline...".to_string(),
            ReportEvent::OutlineReady { titles } => {
                let mut text = String::from("### Report Outline\n");
                for (i, title) in titles.iter().enumerate() {
                    text.push_str(&format!("{}. **{}**\n", i + 1, title));
                }
                text.push_str("\n---\n");
                text
            }
            ReportEvent::SectionStarted { index, total, title } => {
                format!("### Processing Section {}/{}: {}...\n", index, total, title)
            }
            ReportEvent::SectionQueries { queries } => {
                let list = queries
                    .iter()
                    .map(|q| format!("- `{}`", q))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("-> Searching with queries:\n{}\n", list)
            }
            ReportEvent::Progress { report } | ReportEvent::Completed { report } => report.clone(),
            ReportEvent::Failed { message } => format!("# Report Generation Failed\n{}", message),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReportEvent::Clarification { .. } | ReportEvent::Completed { .. } | ReportEvent::Failed { .. }
        )
    }
}

/// Stream returned by [`ReportAgent::submit`].
pub type ReportStream = Pin<Box<dyn Stream<Item = ReportEvent> + Send>>;

#[derive(Debug)]
struct Cycle {
    state: AgentState,
    topic: Option<String>,
}

#[derive(Debug)]
struct Shared {
    running: AtomicBool,
    cycle: Mutex<Cycle>,
}

impl Shared {
    fn cycle(&self) -> MutexGuard<'_, Cycle> {
        self.cycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reset(&self) {
        let mut cycle = self.cycle();
        cycle.state = AgentState::Initial;
        cycle.topic = None;
    }
}

/// Exclusive right to run one submission.
///
/// Released just before the terminal event, or on drop. A run cut short
/// mid-generation also resets the agent to [`AgentState::Initial`].
#[derive(Debug)]
pub struct RunLease {
    shared: Arc<Shared>,
}

impl RunLease {
    fn acquire(shared: &Arc<Shared>) -> Option<Self> {
        shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                shared: Arc::clone(shared),
            })
    }
}

impl Drop for RunLease {
    fn drop(&mut self) {
        {
            let mut cycle = self.shared.cycle();
            if cycle.state == AgentState::Generating {
                tracing::warn!("Report run ended early; resetting");
                cycle.state = AgentState::Initial;
                cycle.topic = None;
            }
        }
        self.shared.running.store(false, Ordering::Release);
    }
}

/// Per-run accumulator: the report so far and its bibliography.
struct RunContext {
    report: String,
    bibliography: MasterBibliography,
}

impl RunContext {
    fn new(brief: &str) -> Self {
        Self {
            report: format!("# Deep Research Report: {}\n\n", brief),
            bibliography: MasterBibliography::new(),
        }
    }

    fn finish(mut self) -> String {
        self.report.push_str(&self.bibliography.render());
        self.report
    }
}

/// Drives the clarify, plan and write cycle.
#[derive(Clone)]
pub struct ReportAgent {
    planner: Arc<Planner>,
    writer: Arc<SectionWriter>,
    shared: Arc<Shared>,
}

impl ReportAgent {
    pub fn new(planner: Planner, writer: SectionWriter) -> Self {
        Self {
            planner: Arc::new(planner),
            writer: Arc::new(writer),
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                cycle: Mutex::new(Cycle {
                    state: AgentState::Initial,
                    topic: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> AgentState {
        self.shared.cycle().state
    }

    /// Whether a submission is still running.
    pub fn is_busy(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Feed user input to the agent.
    ///
    /// In `Initial` the input is a topic and the stream yields clarifying
    /// questions. In `Clarifying` it is the user's answers and the stream
    /// yields the report. Returns `None`, changing nothing, while an earlier
    /// submission has not reached its terminal event.
    pub fn submit(&self, input: impl Into<String>) -> Option<ReportStream> {
        let Some(lease) = RunLease::acquire(&self.shared) else {
            tracing::debug!("Submission ignored: a run is in progress");
            return None;
        };

        let input = input.into();
        let pending = {
            let mut cycle = self.shared.cycle();
            let topic = match cycle.state {
                AgentState::Clarifying => cycle.topic.take(),
                _ => None,
            };
            if topic.is_some() {
                cycle.state = AgentState::Generating;
            }
            topic
        };

        let stream = match pending {
            Some(topic) => self.generate(lease, topic, input),
            None => self.clarify(lease, input),
        };
        Some(stream)
    }

    fn clarify(&self, lease: RunLease, topic: String) -> ReportStream {
        let planner = Arc::clone(&self.planner);
        let shared = Arc::clone(&self.shared);

        Box::pin(async_stream::stream! {
            if topic.trim().is_empty() {
                drop(lease);
                yield ReportEvent::Failed { message: "Please enter a research topic.".to_string() };
                return;
            }

            match planner.clarifying_questions(&topic).await {
                Ok(questions) => {
                    {
                        let mut cycle = shared.cycle();
                        cycle.state = AgentState::Clarifying;
                        cycle.topic = Some(topic);
                    }
                    drop(lease);
                    yield ReportEvent::Clarification { questions };
                }
                Err(e) => {
                    tracing::error!(error = %e, "Could not ask clarifying questions");
                    drop(lease);
                    yield ReportEvent::Failed { message: e.to_string() };
                }
            }
        })
    }

    fn generate(&self, lease: RunLease, topic: String, answers: String) -> ReportStream {
        let planner = Arc::clone(&self.planner);
        let writer = Arc::clone(&self.writer);
        let shared = Arc::clone(&self.shared);

        Box::pin(async_stream::stream! {
            let brief = match planner.construct_brief(&topic, &answers).await {
                Ok(brief) => brief,
                Err(e) => {
                    shared.reset();
                    drop(lease);
                    yield failed(e);
                    return;
                }
            };
            yield ReportEvent::BriefConstructed { brief: brief.clone() };

            yield ReportEvent::PlanningOutline;
            let sections = match plan(&planner, &brief).await {
                Ok(sections) if sections.is_empty() => {
                    shared.reset();
                    drop(lease);
                    yield ReportEvent::Failed {
                        message: "Could not create a valid report outline.".to_string(),
                    };
                    return;
                }
                Ok(sections) => sections,
                Err(e) => {
                    shared.reset();
                    drop(lease);
                    yield failed(e);
                    return;
                }
            };
            yield ReportEvent::OutlineReady {
                titles: sections.iter().map(|s| s.title().to_string()).collect(),
            };

            let mut run = RunContext::new(&brief);
            let total = sections.len();

            for (i, section) in sections.iter().enumerate() {
                yield ReportEvent::SectionStarted {
                    index: i + 1,
                    total,
                    title: section.title().to_string(),
                };

                let draft = match writer.write_section(&brief, section, &run.report).await {
                    Ok(draft) => draft,
                    Err(e) => {
                        tracing::warn!(section = section.title(), error = %e, "Section could not be written");
                        SectionDraft::failed(section.title(), &e)
                    }
                };
                if !draft.queries.is_empty() {
                    yield ReportEvent::SectionQueries { queries: draft.queries.clone() };
                }

                let text = remap_citations(&draft.text, &draft.citations, &mut run.bibliography);
                run.report.push_str(&text);
                run.report.push_str("\n\n");
                yield ReportEvent::Progress { report: run.report.clone() };
            }

            tracing::info!(
                sections = total,
                sources = run.bibliography.len(),
                "Report complete"
            );
            shared.reset();
            drop(lease);
            yield ReportEvent::Completed { report: run.finish() };
        })
    }
}

async fn plan(planner: &Planner, brief: &str) -> AppResult<Vec<Section>> {
    let sections = planner.plan_outline(brief).await?;
    if sections.is_empty() {
        return Ok(sections);
    }
    planner.expand_outline(sections).await
}

fn failed(error: AppError) -> ReportEvent {
    tracing::error!(error = %error, "Report run failed");
    ReportEvent::Failed {
        message: error.to_string(),
    }
}
