//! Autonomy: policy gate, critic parsing, feedback aggregation, convergence loop.

pub mod critic;
pub mod feedback;
pub mod loop_;
pub mod policy;

pub use critic::{parse_critic_json, CriticVerdict};
pub use feedback::build_feedback;
pub use loop_::{
    build_mission_milestones, AutonomousPlanResult, AutonomousPlanner, AutonomyIteration,
    MissionMilestone,
};
pub use policy::{evaluate_plan_policy, PlanPolicy, PolicyCheck, VALIDATE_FIRST_TOOL};
