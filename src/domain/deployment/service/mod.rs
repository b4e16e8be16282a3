pub mod deployment_draft_service;
