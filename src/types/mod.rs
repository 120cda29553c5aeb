pub mod chat;
pub mod response;
pub mod session;
pub mod trend;

pub use chat::{ChatMessage, InterviewMode, Role, SkillGap, SkillGaps};
pub use session::{InterviewSession, SessionStatus, VideoInterviewSession, VideoStatus};
pub use trend::{DemandLevel, TrendRecord};
