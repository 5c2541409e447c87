pub mod event;
pub mod historico;
pub mod lead;
