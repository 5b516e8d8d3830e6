pub mod config;
pub mod domain;
pub mod errors;
pub mod filters;
pub mod recommendation;

pub use domain::campaign::{CampaignRecommendation, Channel};
pub use domain::row::SegmentRow;
pub use domain::segment::{
    AgeBracket, ClusterId, DeviceType, EngagementChannel, Interest, SegmentRecord,
};
pub use errors::{ApplicationError, DomainError, InterfaceError, InvalidInputError};
pub use filters::{selectable_cluster_ids, FacetOptions, FilterConfig};
pub use recommendation::{
    recommend, recommend_with_trace, DecisionTrace, DeterministicRecommendationEngine,
    RecommendationEngine,
};
