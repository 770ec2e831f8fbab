//! Higher-level signals derived from a recency history snapshot.
//!
//! Everything here is a pure function of its inputs; nothing is cached between calls.

use crate::{WindowIdentity, WindowSnapshot};
use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const MOST_USED_LIMIT: usize = 5;
const ACTION_SUGGESTION_LIMIT: usize = 5;
const HIGH_LOAD_PERCENT: f32 = 80.0;

const DOCUMENT_ACTIONS: &[&str] = &["edit_document", "format_text", "save_file"];
const BROWSER_ACTIONS: &[&str] = &["web_search", "read_content", "translate_page"];
const FILE_MANAGER_ACTIONS: &[&str] = &["organize_files", "create_folder", "search_files"];

const WORD_NEXT_STEPS: &[&str] = &[
    "Summarise the current document",
    "Export the document as PDF",
    "Check spelling and grammar",
    "Extract the key points of the document",
];
const EXCEL_NEXT_STEPS: &[&str] = &[
    "Analyse the data in the current sheet",
    "Chart the selected data",
    "Run calculations and statistics on the data",
    "Export the data to another format",
];
const BROWSER_NEXT_STEPS: &[&str] = &[
    "Summarise the current page",
    "Translate the current page",
    "Extract the important information from the page",
    "Save the page as Markdown",
];
const FILE_MANAGER_NEXT_STEPS: &[&str] = &[
    "Analyse the folder structure",
    "Tidy up the files in this folder",
    "Rename files in bulk",
    "Create a new folder layout",
];

/// Coarse part of the day, from the local wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    MorningWork,
    AfternoonWork,
    EveningLeisure,
    NightRest,
}

impl TimeBucket {
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            9..=12 => TimeBucket::MorningWork,
            13..=17 => TimeBucket::AfternoonWork,
            18..=22 => TimeBucket::EveningLeisure,
            _ => TimeBucket::NightRest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTag {
    Development,
    Office,
    Multimedia,
    Browsing,
}

impl WorkflowTag {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowTag::Development => "development",
            WorkflowTag::Office => "office_work",
            WorkflowTag::Multimedia => "multimedia",
            WorkflowTag::Browsing => "web_browsing",
        }
    }
}

/// Process stems (lower case, `.exe` stripped) per workflow.
const WORKFLOW_TABLE: &[(WorkflowTag, &[&str])] = &[
    (
        WorkflowTag::Development,
        &[
            "pycharm64",
            "pycharm",
            "code",
            "idea64",
            "devenv",
            "chrome",
            "firefox",
        ],
    ),
    (
        WorkflowTag::Office,
        &[
            "winword",
            "excel",
            "powerpnt",
            "outlook",
            "soffice",
            "libreoffice",
        ],
    ),
    (
        WorkflowTag::Multimedia,
        &["vlc", "mpc-hc64", "spotify", "cloudmusic", "mpv"],
    ),
    (
        WorkflowTag::Browsing,
        &["chrome", "firefox", "msedge", "opera", "brave"],
    ),
];

/// Lower-cases a process name and strips a trailing `.exe`.
#[must_use]
pub fn process_stem(process_name: &str) -> String {
    let lower = process_name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_owned(),
        None => lower,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUsage {
    pub process_name: String,
    pub count: usize,
}

/// Machine-wide utilisation sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemLoad {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPattern {
    pub most_used_apps: Vec<AppUsage>,
    pub time_bucket: TimeBucket,
    pub switching_frequency: usize,
    pub workflows: Vec<WorkflowTag>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntentPrediction {
    pub predicted_actions: Vec<String>,
    pub confidence: f32,
    pub reasoning: String,
    pub context_factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReport {
    pub generated_at: DateTime<Utc>,
    pub active_window: Option<WindowIdentity>,
    pub recent_windows: Vec<WindowIdentity>,
    pub system_load: Option<SystemLoad>,
    pub pattern: ActivityPattern,
    pub suggestions: Vec<String>,
    pub action_suggestions: Vec<String>,
    pub intent: IntentPrediction,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSynthesizer;

impl ContextSynthesizer {
    /// Frequency of each process name, descending; ties go to the name seen
    /// most recently. Truncated to the top five.
    #[must_use]
    pub fn most_used_apps(&self, history: &[WindowSnapshot]) -> Vec<AppUsage> {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, snapshot) in history.iter().enumerate() {
            let name = snapshot.identity.process_name.as_str();
            if name.is_empty() {
                continue;
            }
            counts.entry(name).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(&str, usize, usize)> = counts
            .into_iter()
            .map(|(name, (count, first_seen))| (name, count, first_seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(MOST_USED_LIMIT)
            .map(|(name, count, _)| AppUsage {
                process_name: name.to_owned(),
                count,
            })
            .collect()
    }

    /// Tags in table order, each reported once.
    #[must_use]
    pub fn workflows(&self, history: &[WindowSnapshot]) -> Vec<WorkflowTag> {
        let stems: HashSet<String> = history
            .iter()
            .map(|snapshot| process_stem(&snapshot.identity.process_name))
            .collect();

        WORKFLOW_TABLE
            .iter()
            .filter(|(_, members)| members.iter().any(|member| stems.contains(*member)))
            .map(|(tag, _)| *tag)
            .collect()
    }

    #[must_use]
    pub fn time_bucket(&self, hour: u32) -> TimeBucket {
        TimeBucket::from_hour(hour)
    }

    #[must_use]
    pub fn analyze(&self, history: &[WindowSnapshot], hour: u32) -> ActivityPattern {
        ActivityPattern {
            most_used_apps: self.most_used_apps(history),
            time_bucket: self.time_bucket(hour),
            switching_frequency: if history.len() > 1 { history.len() } else { 0 },
            workflows: self.workflows(history),
        }
    }

    /// Advisory hints for the host; never acted upon by the tracker.
    #[must_use]
    pub fn suggestions(
        &self,
        active: Option<&WindowIdentity>,
        pattern: &ActivityPattern,
        load: Option<&SystemLoad>,
    ) -> Vec<String> {
        let mut suggestions = Vec::new();

        if let Some(active) = active {
            let stem = process_stem(&active.process_name);
            let hint = match stem.as_str() {
                "winword" => Some(
                    "Word is active: document editing, formatting and content analysis are available",
                ),
                "excel" => Some(
                    "Excel is active: data processing, charting and formula help are available",
                ),
                "chrome" | "firefox" | "msedge" => Some(
                    "A browser is active: page extraction, translation and summaries are available",
                ),
                "code" | "pycharm64" | "pycharm" => Some(
                    "A code editor is active: code explanation, optimisation and refactoring are available",
                ),
                _ => None,
            };
            if let Some(hint) = hint {
                suggestions.push(hint.to_owned());
            }
        }

        if let Some(load) = load {
            if load.memory_percent > HIGH_LOAD_PERCENT {
                suggestions
                    .push("Memory usage is high, consider closing unused applications".to_owned());
            }
            if load.cpu_percent > HIGH_LOAD_PERCENT {
                suggestions.push("CPU usage is high, interaction may feel sluggish".to_owned());
            }
        }

        match pattern.time_bucket {
            TimeBucket::MorningWork => {
                suggestions.push("Good morning, this is usually a focused work period".to_owned());
            }
            TimeBucket::EveningLeisure => {
                suggestions.push("Good evening, you may be winding down".to_owned());
            }
            TimeBucket::AfternoonWork | TimeBucket::NightRest => {}
        }

        if !pattern.workflows.is_empty() {
            let names: Vec<&str> = pattern.workflows.iter().map(WorkflowTag::as_str).collect();
            suggestions.push(format!("Frequent workflows: {}", names.join(", ")));
        }

        suggestions
    }

    /// Concrete next steps for the active application, a memory cleanup hint
    /// and one workflow hint, at most five in total.
    #[must_use]
    pub fn action_suggestions(
        &self,
        active: Option<&WindowIdentity>,
        pattern: &ActivityPattern,
        load: Option<&SystemLoad>,
    ) -> Vec<String> {
        let next_steps: &[&str] = match active.map(|a| process_stem(&a.process_name)).as_deref() {
            Some("winword") => WORD_NEXT_STEPS,
            Some("excel") => EXCEL_NEXT_STEPS,
            Some("chrome" | "firefox" | "msedge") => BROWSER_NEXT_STEPS,
            Some("explorer" | "nautilus" | "dolphin") => FILE_MANAGER_NEXT_STEPS,
            _ => &[],
        };
        let mut actions: Vec<String> = next_steps.iter().map(|s| (*s).to_owned()).collect();

        if load.is_some_and(|load| load.memory_percent > HIGH_LOAD_PERCENT) {
            actions.push("Free up memory by closing unneeded programs".to_owned());
        }

        if pattern.workflows.contains(&WorkflowTag::Development) {
            actions.push("Start the development tools".to_owned());
        } else if pattern.workflows.contains(&WorkflowTag::Office) {
            actions.push("Prepare the office document tools".to_owned());
        }

        actions.truncate(ACTION_SUGGESTION_LIMIT);
        actions
    }

    #[must_use]
    pub fn predict_intent(
        &self,
        active: Option<&WindowIdentity>,
        history: &[WindowSnapshot],
        hour: u32,
    ) -> IntentPrediction {
        let mut prediction = IntentPrediction::default();
        let mut reasons: Vec<String> = Vec::new();

        if let Some(active) = active.filter(|a| !a.process_name.is_empty()) {
            prediction
                .context_factors
                .push(format!("active application: {}", active.process_name));

            let guess: Option<(&[&str], f32, &str)> =
                match process_stem(&active.process_name).as_str() {
                    "winword" => Some((
                        DOCUMENT_ACTIONS,
                        0.8,
                        "a word processor is in use",
                    )),
                    "chrome" | "firefox" | "msedge" => Some((
                        BROWSER_ACTIONS,
                        0.7,
                        "a browser is in use",
                    )),
                    "explorer" | "nautilus" | "dolphin" => Some((
                        FILE_MANAGER_ACTIONS,
                        0.6,
                        "a file manager is in use",
                    )),
                    _ => None,
                };

            if let Some((actions, confidence, reason)) = guess {
                prediction.predicted_actions = actions.iter().map(|a| (*a).to_owned()).collect();
                prediction.confidence = confidence;
                reasons.push(reason.to_owned());
            }
        }

        let recent_apps: Vec<&str> = history
            .iter()
            .take(3)
            .map(|s| s.identity.process_name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        if recent_apps.len() >= 2 {
            prediction
                .context_factors
                .push(format!("recent applications: {}", recent_apps.join(", ")));

            let distinct: HashSet<&str> = recent_apps.iter().copied().collect();
            if distinct.len() > 2 {
                prediction
                    .predicted_actions
                    .push("multitask_support".to_owned());
                reasons.push("switching between several applications".to_owned());
            }
        }

        match TimeBucket::from_hour(hour) {
            TimeBucket::MorningWork => {
                prediction
                    .context_factors
                    .push("working hours: morning".to_owned());
                reasons.push("morning is suited to important tasks".to_owned());
            }
            TimeBucket::EveningLeisure => {
                prediction
                    .context_factors
                    .push("leisure hours: evening".to_owned());
                reasons.push("evening activity leans towards leisure".to_owned());
            }
            TimeBucket::AfternoonWork | TimeBucket::NightRest => {}
        }

        prediction.reasoning = reasons.join("; ");
        prediction
    }

    /// Builds the full report; `history[0]` is taken as the active window.
    #[must_use]
    pub fn synthesize(
        &self,
        history: &[WindowSnapshot],
        now: DateTime<Local>,
        load: Option<SystemLoad>,
    ) -> ContextReport {
        let hour = now.hour();
        let active = history.first().map(|s| &s.identity);
        let pattern = self.analyze(history, hour);
        let suggestions = self.suggestions(active, &pattern, load.as_ref());
        let action_suggestions = self.action_suggestions(active, &pattern, load.as_ref());
        let intent = self.predict_intent(active, history, hour);

        ContextReport {
            generated_at: now.with_timezone(&Utc),
            active_window: active.cloned(),
            recent_windows: history
                .iter()
                .filter(|s| !s.identity.process_name.is_empty())
                .map(|s| s.identity.clone())
                .collect(),
            system_load: load,
            pattern,
            suggestions,
            action_suggestions,
            intent,
        }
    }
}
