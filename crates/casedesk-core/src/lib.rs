//! Casedesk Core - the pure decision logic of the intake platform.
//!
//! - **priority**: keyword-driven, tier-adjusted ticket priority classifier
//! - **sla**: remaining-time-or-breached evaluation against an SLA rule set
//! - **notification**: resolution notices and the delivery side channel
//! - **config**: shared configuration paths

pub mod config;
pub mod notification;
pub mod priority;
pub mod sla;

pub use config::{config_dir, data_dir, ensure_all_dirs, env_file, state_dir};
pub use notification::{
    deliver, render_resolution_notice, LogNotifier, Notification, Notifier, ResolutionDetails,
};
pub use priority::{classify, ClassificationInput, KeywordRule, PriorityClassifier};
pub use sla::{default_rules, evaluate, select_rule, SlaStatus};
