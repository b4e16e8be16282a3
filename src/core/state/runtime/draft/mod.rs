pub mod draft_session;
pub mod draft_session_repository;
pub mod draft_session_repository_trait;
