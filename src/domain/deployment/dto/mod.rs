pub mod draft_request;
pub mod draft_view;
pub mod field_edit_request;
