// zcl-core/src/model/mod.rs
// ============================================================================
// Module: ZCL Data Model
// Description: Campaign/suite/attempt/gate/run entity definitions.
// Purpose: Central typed representation shared by every downstream crate.
// ============================================================================

//! ## Overview
//! Submodules mirror the natural lifecycle of a campaign: declare it
//! ([`campaign`]), resolve the suites it runs ([`suite`]), execute attempts
//! ([`attempt`]), gate them ([`gate`]), and fold the results into a run ledger
//! ([`run`]).

pub mod attempt;
pub mod campaign;
pub mod gate;
pub mod run;
pub mod suite;

pub use attempt::Attempt;
pub use attempt::AttemptIntegrity;
pub use attempt::AttemptMetrics;
pub use attempt::AttemptReport;
pub use attempt::AttemptState;
pub use attempt::AttemptStatus;
pub use attempt::Feedback;
pub use campaign::Campaign;
pub use campaign::EvaluationConfig;
pub use campaign::EvaluationMode;
pub use campaign::FinalizationConfig;
pub use campaign::FinalizationMode;
pub use campaign::Flow;
pub use campaign::FlowMode;
pub use campaign::GateConfig;
pub use campaign::HooksConfig;
pub use campaign::InvalidRunPolicy;
pub use campaign::IsolationModel;
pub use campaign::MissionSelection;
pub use campaign::MissionSourceConfig;
pub use campaign::OraclePolicy;
pub use campaign::PairGatePolicy;
pub use campaign::PlaceholderRule;
pub use campaign::PromptMode;
pub use campaign::ResultChannelConfig;
pub use campaign::ResultChannelKind;
pub use campaign::RunnerType;
pub use campaign::SemanticRules;
pub use campaign::TimeoutStart;
pub use campaign::TimeoutsConfig;
pub use campaign::ToolPolicy;
pub use campaign::ToolPolicyEntry;
pub use campaign::TraceProfile;
pub use gate::GateReason;
pub use gate::MissionGate;
pub use run::CampaignRunState;
pub use run::FlowRunSummary;
pub use run::ProgressEvent;
pub use run::ProgressEventKind;
pub use run::RunStatus;
pub use run::status_for_timeout_class;
pub use suite::Mission;
pub use suite::Suite;
pub use suite::SuiteDefaults;
