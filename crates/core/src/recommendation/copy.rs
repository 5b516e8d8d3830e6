//! Message composition.
//!
//! Copy is assembled from fixed phrase tables and then fitted into the
//! channel's length window. Every path out of [`compose_message`] returns a
//! message whose character count sits inside [`Channel::message_bounds`].

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::domain::campaign::Channel;
use crate::domain::segment::{AgeBracket, Interest, SegmentRecord};

use super::objective::ObjectiveSignals;
use super::offer::Offer;

const PUSH_FILLERS: &[&str] = &["Disponível no app.", "Aproveite.", "Confira."];
const EMAIL_FILLERS: &[&str] = &["no app", "hoje"];

/// Voice of the copy, picked from the age bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// 18-24. The only tone allowed to use exclamation marks.
    Energetic,
    /// 25-44 and audiences without a bracket.
    Practical,
    /// 45-64.
    Credible,
    /// 65 and over.
    Simple,
    /// Sensitive news coverage, regardless of age.
    Calm,
}

impl Tone {
    pub fn select(record: &SegmentRecord, signals: ObjectiveSignals) -> Self {
        if signals.sensitive && record.interest == Interest::News {
            return Self::Calm;
        }

        match record.age_bracket() {
            Some(AgeBracket::Young) => Self::Energetic,
            Some(AgeBracket::Adult) | None => Self::Practical,
            Some(AgeBracket::Mature) => Self::Credible,
            Some(AgeBracket::Senior) => Self::Simple,
        }
    }

    fn phrases(&self) -> TonePhrases {
        match self {
            Self::Energetic => TonePhrases {
                benefit: "tudo direto no app",
                push_cta: "Veja agora!",
                email_cta: "corre!",
            },
            Self::Practical => TonePhrases {
                benefit: "entenda em poucos minutos",
                push_cta: "Comece hoje.",
                email_cta: "comece hoje",
            },
            Self::Credible => TonePhrases {
                benefit: "com curadoria de especialistas",
                push_cta: "Confira agora.",
                email_cta: "confira",
            },
            Self::Simple => TonePhrases {
                benefit: "passo a passo e com acesso fácil",
                push_cta: "Toque para abrir.",
                email_cta: "acesso fácil",
            },
            Self::Calm => TonePhrases {
                benefit: "informação clara e verificada",
                push_cta: "Saiba mais.",
                email_cta: "saiba mais",
            },
        }
    }
}

struct TonePhrases {
    benefit: &'static str,
    push_cta: &'static str,
    email_cta: &'static str,
}

fn hook(interest: &Interest, channel: Channel) -> &'static str {
    match (interest, channel) {
        (Interest::Sports, Channel::Push) => "Melhores momentos da rodada e jogos ao vivo",
        (Interest::Sports, Channel::Email) => "Melhores momentos da rodada",
        (Interest::News, Channel::Push) => "Análise exclusiva e guia prático do dia",
        (Interest::News, Channel::Email) => "Análise exclusiva do dia",
        (Interest::Recipes, Channel::Push) => "Cardápio da semana com lista de compras pronta",
        (Interest::Recipes, Channel::Email) => "Cardápio da semana",
        (Interest::Other(_), Channel::Push) => "Conteúdos selecionados para você",
        (Interest::Other(_), Channel::Email) => "Seleção da semana para você",
    }
}

/// Everything the composer needs to write one message.
#[derive(Clone, Copy, Debug)]
pub struct MessageBrief<'a> {
    pub record: &'a SegmentRecord,
    pub channel: Channel,
    pub offer: Offer,
    pub tone: Tone,
    pub signals: ObjectiveSignals,
}

pub fn compose_message(brief: &MessageBrief<'_>) -> String {
    let candidates = candidates(brief);
    let fillers = match brief.channel {
        Channel::Push => PUSH_FILLERS,
        Channel::Email => EMAIL_FILLERS,
    };

    let message = fit_to_bounds(&candidates, brief.channel.message_bounds(), fillers);
    if brief.signals.sensitive {
        message.replace('!', ".")
    } else {
        message
    }
}

/// Candidate copy in preference order. Non-subscribers always see the offer.
fn candidates(brief: &MessageBrief<'_>) -> Vec<String> {
    let hook = hook(&brief.record.interest, brief.channel);
    let phrases = brief.tone.phrases();
    let offer_optional = brief.record.is_subscriber;

    match brief.channel {
        Channel::Push => {
            let tag = capitalize(brief.offer.tag);
            let benefit = phrases.benefit;
            let cta = phrases.push_cta;
            let mut out = vec![
                format!("{hook}, {benefit}. {tag}. {cta}"),
                format!("{hook}. {tag}. {cta}"),
                format!("{hook}, {benefit}. {tag}."),
                format!("{hook}. {tag}."),
            ];
            if offer_optional {
                out.push(format!("{hook}, {benefit}. {cta}"));
                out.push(format!("{hook}. {cta}"));
            }
            out
        }
        Channel::Email => {
            let tag = brief.offer.tag;
            let cta = phrases.email_cta;
            let mut out = vec![format!("{hook}: {tag}, {cta}"), format!("{hook}: {tag}")];
            if offer_optional {
                out.push(format!("{hook}, {cta}"));
                out.push(hook.to_string());
            }
            out
        }
    }
}

fn fit_to_bounds(candidates: &[String], bounds: RangeInclusive<usize>, fillers: &[&str]) -> String {
    let (min, max) = (*bounds.start(), *bounds.end());

    if let Some(fit) = candidates.iter().find(|candidate| bounds.contains(&char_len(candidate))) {
        return fit.clone();
    }

    let longest_short = candidates
        .iter()
        .filter(|candidate| char_len(candidate) < min)
        .max_by_key(|candidate| char_len(candidate));
    if let Some(short) = longest_short {
        return pad(short, min, max, fillers);
    }

    let shortest = candidates.iter().min_by_key(|candidate| char_len(candidate));
    let text = shortest.map(String::as_str).unwrap_or_default();
    clamp(text.to_string(), min, max, fillers)
}

/// Appends whole fillers while they fit, then falls back to [`clamp`].
fn pad(text: &str, min: usize, max: usize, fillers: &[&str]) -> String {
    let mut out = text.to_string();
    for filler in fillers {
        if char_len(&out) >= min {
            break;
        }
        if char_len(&out) + 1 + char_len(filler) <= max {
            out.push(' ');
            out.push_str(filler);
        }
    }
    clamp(out, min, max, fillers)
}

/// Grows past the minimum, then cuts back under the maximum.
fn clamp(mut out: String, min: usize, max: usize, fillers: &[&str]) -> String {
    let mut cycle = fillers.iter().cycle();
    while char_len(&out) < min {
        match cycle.next() {
            Some(filler) => {
                out.push(' ');
                out.push_str(filler);
            }
            None => out.push('.'),
        }
    }
    truncate(&out, min, max)
}

fn truncate(text: &str, min: usize, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }

    let head: String = text.chars().take(max).collect();
    if let Some(cut) = head.rfind(' ') {
        let at_word = head[..cut].trim_end_matches([',', ':', ';', '-', ' ']);
        if char_len(at_word) >= min {
            return at_word.to_string();
        }
    }

    let trimmed = head.trim_end();
    if char_len(trimmed) >= min {
        trimmed.to_string()
    } else {
        head
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}
