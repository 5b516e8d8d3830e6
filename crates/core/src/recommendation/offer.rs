//! Offer table keyed by subscription status, interest and objective signals.

use crate::domain::segment::{Interest, SegmentRecord};

use super::objective::ObjectiveSignals;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offer {
    /// Full offer text returned to the caller.
    pub label: &'static str,
    /// Short form that fits inside message copy.
    pub tag: &'static str,
}

const SPORTS_TRIAL: Offer =
    Offer { label: "7 dias grátis do streaming esportivo", tag: "7 dias grátis" };
const PREMIUM_DAY_PASS: Offer =
    Offer { label: "Acesso gratuito por 24h a conteúdos premium", tag: "24h premium grátis" };
const WEEKLY_COLLECTION: Offer =
    Offer { label: "Ebook da coleção da semana", tag: "ebook da coleção" };
const FREE_TRIAL: Offer = Offer { label: "Teste gratuito", tag: "teste grátis" };
const EXCLUSIVE_CONTENT: Offer = Offer { label: "Conteúdo exclusivo", tag: "conteúdo exclusivo" };
const SPECIAL_SERIES: Offer = Offer { label: "Série especial", tag: "série especial" };
const LOYALTY_BENEFIT: Offer =
    Offer { label: "Benefício de fidelidade", tag: "benefício de fidelidade" };

pub fn select_offer(record: &SegmentRecord, signals: ObjectiveSignals) -> Offer {
    match (&record.interest, record.is_subscriber) {
        (Interest::Recipes, _) => WEEKLY_COLLECTION,
        (Interest::Sports, false) => SPORTS_TRIAL,
        (Interest::News, false) if signals.hot_topic => PREMIUM_DAY_PASS,
        (Interest::News, false) | (Interest::Other(_), false) => FREE_TRIAL,
        (Interest::News, true) => EXCLUSIVE_CONTENT,
        (Interest::Sports, true) => SPECIAL_SERIES,
        (Interest::Other(_), true) => LOYALTY_BENEFIT,
    }
}
