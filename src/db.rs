pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod event_repo;
pub use event_repo::EventRepository;
pub mod historico_repo;
pub use historico_repo::HistoricoRepository;
