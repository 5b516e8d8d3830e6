//! Signals read from the operator's free-text campaign objective.

const SENSITIVE_TERMS: &[&str] = &[
    "eleição",
    "eleições",
    "eleicao",
    "eleicoes",
    "election",
    "política",
    "politica",
    "politics",
    "tragédia",
    "tragedia",
    "tragedy",
    "guerra",
    "pandemia",
    "pandemic",
];

const HOT_TOPIC_TERMS: &[&str] = &[
    "tema quente",
    "hot topic",
    "urgente",
    "breaking",
    "plantão",
    "plantao",
    "última hora",
    "ultima hora",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectiveSignals {
    /// The campaign touches a sensitive subject; copy must stay sober.
    pub sensitive: bool,
    /// The campaign rides a trending subject.
    pub hot_topic: bool,
}

impl ObjectiveSignals {
    pub fn from_notes(notes: &str) -> Self {
        let normalized = notes.to_lowercase();
        let sensitive = SENSITIVE_TERMS.iter().any(|term| normalized.contains(term));
        // Sensitive subjects count as hot topics.
        let hot_topic =
            sensitive || HOT_TOPIC_TERMS.iter().any(|term| normalized.contains(term));
        Self { sensitive, hot_topic }
    }
}
