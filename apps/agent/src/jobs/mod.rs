// Job records and the collaborators around them: persistence, relevance scoring,
// scraped sources and LLM insights.

pub mod insights;
pub mod matcher;
pub mod models;
pub mod source;
pub mod store;

pub use models::{JobPosting, JobStatus};
