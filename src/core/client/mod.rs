// Yatai REST API client
pub mod yatai_api_trait;
pub mod yatai_client;
