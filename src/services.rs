pub mod lead_service;
pub use lead_service::LeadService;
pub mod messaging;
pub use messaging::MessagingClient;
pub mod normalize;
pub mod scoring;
